use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SwitchboardError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("action error: {0}")]
    Action(#[from] ActionError),

    #[error("delegation error: {0}")]
    Delegation(#[from] DelegationError),
}

/// Failures of the model backend. These abort the turn.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("invalid backend response: {reason}")]
    InvalidResponse { reason: String },
}

/// Action-level failures. The registry degrades these to failed results
/// instead of aborting the turn.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("unknown action: {name}")]
    UnknownAction { name: String },

    #[error("invalid arguments for {name}: {reason}")]
    InvalidArguments { name: String, reason: String },
}

/// Terminal rejections of a delegated call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DelegationError {
    #[error("delegated call {execution_id} timed out after {deadline:?}")]
    Timeout {
        execution_id: String,
        deadline: Duration,
    },

    #[error("peer disconnected while call {execution_id} was outstanding")]
    PeerDisconnected { execution_id: String },
}

/// The outbound side of the peer channel is gone.
#[derive(Debug, thiserror::Error)]
#[error("peer channel closed: {0}")]
pub struct ChannelClosed(pub String);
