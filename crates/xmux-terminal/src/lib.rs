// ABOUTME: Terminal emulation and PTY handling.
// ABOUTME: Wraps alacritty_terminal and portable-pty behind a session registry keyed by panel.

pub mod bridge;
pub mod emulator;
pub mod pty;
pub mod registry;

pub use bridge::{
    event_channel, BridgeError, PtyBridge, PtyEvent, PtyEventKind, PtyEventReceiver,
    PtyEventSender,
};
pub use emulator::Emulator;
pub use pty::PtyProcessManager;
pub use registry::{SessionEntry, SessionRegistry, Subscription, EXIT_MARKER, RESIZE_DEBOUNCE};
