//! Wire messages exchanged with the remote execution peer.
//!
//! The peer is a UI process speaking JSON over a duplex channel, so field
//! names stay camelCase on the wire.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PeerMessage {
    /// Outbound: ask the peer to execute a delegated action.
    #[serde(rename_all = "camelCase")]
    ExecuteAction {
        execution_id: String,
        action_name: String,
        args: serde_json::Value,
    },

    /// Inbound: the peer's result for a previously requested execution.
    /// The peer must echo the exact execution id it was given.
    #[serde(rename_all = "camelCase")]
    ActionResult {
        execution_id: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}
