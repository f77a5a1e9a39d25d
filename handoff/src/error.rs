//! Error taxonomy for the hand-off runtime.

use crate::sync::Role;

/// Errors surfaced by the slot, the worker loops and the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    /// The role was interrupted while waiting and the slot's policy is
    /// [`crate::sync::InterruptPolicy::Abort`].
    #[error("{role} interrupted while waiting on the slot")]
    Interrupted { role: Role },

    /// The peer closed the slot; no further hand-off is possible.
    #[error("slot closed by peer")]
    Closed,

    /// The OS refused to create a worker thread.
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: Role,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked before finishing its loop.
    #[error("{role} thread panicked")]
    Panicked { role: Role },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },
}

impl HandoffError {
    /// Returns `true` for the error a loop sees when its peer gave up first.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
