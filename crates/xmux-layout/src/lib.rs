// ABOUTME: Panel layout management for the terminal multiplexer.
// ABOUTME: Persistent split tree plus the tab/focus state machine that edits it.

mod store;
mod tree;

pub use store::{PanelClosed, PanelStore, SessionTeardown, Tab};
pub use tree::{
    make_leaf, Direction, LayoutNode, LayoutTree, Leaf, Rect, Sizes, Split, Zone, EVEN_SIZES,
};
