// ABOUTME: Boundary between session state and the component that owns OS processes.
// ABOUTME: Calls flow in through PtyBridge; output and exits flow back on one multiplexed channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use xmux_core::{GridSize, PanelId};

/// What a process reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtyEventKind {
    /// Output bytes, in the order the process produced them
    Data(Vec<u8>),
    /// The process ended. Sent at most once per session.
    Exit(Option<i32>),
}

/// Process-side event tagged with the panel it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtyEvent {
    pub panel_id: PanelId,
    pub kind: PtyEventKind,
}

impl PtyEvent {
    pub fn data(panel_id: PanelId, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            panel_id,
            kind: PtyEventKind::Data(bytes.into()),
        }
    }

    pub fn exit(panel_id: PanelId, code: Option<i32>) -> Self {
        Self {
            panel_id,
            kind: PtyEventKind::Exit(code),
        }
    }
}

pub type PtyEventSender = mpsc::UnboundedSender<PtyEvent>;
pub type PtyEventReceiver = mpsc::UnboundedReceiver<PtyEvent>;

/// Channel carrying every session's output and exit notifications
pub fn event_channel() -> (PtyEventSender, PtyEventReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("No process for panel {0}")]
    UnknownSession(PanelId),

    #[error("Failed to spawn process for panel {panel_id}: {reason}")]
    Spawn { panel_id: PanelId, reason: String },

    #[error("Failed to resize process for panel {panel_id}: {reason}")]
    Resize { panel_id: PanelId, reason: String },

    #[error("PTY I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Operations the session registry may request of the process owner.
///
/// None of them block on the process. Callers treat every error as
/// best-effort and log it.
pub trait PtyBridge: Send {
    /// Spawn one process bound to `panel_id`
    fn create(&self, panel_id: PanelId, size: GridSize) -> Result<(), BridgeError>;

    fn write(&self, panel_id: PanelId, bytes: &[u8]) -> Result<(), BridgeError>;

    fn resize(&self, panel_id: PanelId, size: GridSize) -> Result<(), BridgeError>;

    /// Terminate the process. Unknown ids are not an error.
    fn destroy(&self, panel_id: PanelId) -> Result<(), BridgeError>;
}

/// Lets the owner keep a handle to the process manager (for shutdown) while
/// the registry holds another
impl<T: PtyBridge + Sync + ?Sized> PtyBridge for Arc<T> {
    fn create(&self, panel_id: PanelId, size: GridSize) -> Result<(), BridgeError> {
        (**self).create(panel_id, size)
    }

    fn write(&self, panel_id: PanelId, bytes: &[u8]) -> Result<(), BridgeError> {
        (**self).write(panel_id, bytes)
    }

    fn resize(&self, panel_id: PanelId, size: GridSize) -> Result<(), BridgeError> {
        (**self).resize(panel_id, size)
    }

    fn destroy(&self, panel_id: PanelId) -> Result<(), BridgeError> {
        (**self).destroy(panel_id)
    }
}
