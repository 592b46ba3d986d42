// ── Command types ──
//
// Writes requested by the host or the CLI. They travel over an mpsc channel
// to the platform's command processor task, which turns each one into a
// gateway invocation.

use tokio::sync::oneshot;

use crate::error::CoreError;
use crate::model::{LockState, NodeId};

/// A write against one lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Lock mechanism ───────────────────────────────────────────────
    SetLockTarget { node_id: NodeId, target: LockState },

    // ── Lock management ──────────────────────────────────────────────
    SetAudioFeedback { node_id: NodeId, enabled: bool },
}

impl Command {
    pub fn node_id(&self) -> NodeId {
        match self {
            Self::SetLockTarget { node_id, .. } | Self::SetAudioFeedback { node_id, .. } => {
                *node_id
            }
        }
    }
}

/// Command plus an optional reply slot. Host writes are acknowledged
/// optimistically and carry no reply; CLI writes wait for the gateway.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: Option<oneshot::Sender<Result<(), CoreError>>>,
}
