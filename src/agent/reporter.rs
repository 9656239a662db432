//! Uniform success/failure lines for the conversation.

use serde::Serialize;

use crate::error::ErrorKind;
use crate::registry::ChainProfile;

/// Fallback reply when a failure carries nothing displayable.
pub const GENERIC_FAILURE: &str = "An error has occurred";

/// Outcome of one submitted transaction (or of a failed attempt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    Success {
        tx_hash: String,
        explorer_url: String,
    },
    Failure {
        kind: ErrorKind,
        message: Option<String>,
    },
}

impl ExecutionResult {
    /// Success for `tx_hash`, linked to the chain's explorer.
    pub fn success(profile: &ChainProfile, tx_hash: impl Into<String>) -> Self {
        let tx_hash = tx_hash.into();
        Self::Success {
            explorer_url: profile.explorer_tx_url(&tx_hash),
            tx_hash,
        }
    }

    pub fn failure(kind: ErrorKind, message: Option<String>) -> Self {
        Self::Failure { kind, message }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Render a result as one chat line.
pub fn format(result: &ExecutionResult) -> String {
    match result {
        ExecutionResult::Success {
            tx_hash,
            explorer_url,
        } => format!("{tx_hash} executed. View on Block Explorer: {explorer_url}"),
        ExecutionResult::Failure {
            message: Some(message),
            ..
        } if !message.trim().is_empty() => message.clone(),
        ExecutionResult::Failure { .. } => GENERIC_FAILURE.to_string(),
    }
}
