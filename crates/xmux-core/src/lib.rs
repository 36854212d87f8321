// ABOUTME: Shared types and configuration for xmux.
// ABOUTME: Defines identifiers, grid geometry, settings, themes and the settings store.

pub mod color;
pub mod config;
pub mod geometry;
pub mod ids;
pub mod store;
pub mod theme;

pub use color::Color;
pub use config::{
    AppearanceConfig, CursorStyle, GeneralConfig, Settings, SettingsError, ShortcutConfig,
};
pub use geometry::{CellMetrics, GridSize, Viewport};
pub use ids::{NodeId, PanelId, TabId};
pub use store::SettingsStore;
pub use theme::{resolve_theme, TerminalTheme, ThemeChoice};
