//! Execution strategies, one per executable action.
//!
//! Strategies are chain-agnostic: everything chain-specific arrives through
//! the [`ChainSession`] and the profile inside it.

mod swap;
mod transfer;
mod wrap;

use alloy_primitives::TxHash;
use async_trait::async_trait;

use crate::agent::{Action, ValidatedIntent};
use crate::chain::ChainSession;
use crate::error::ExecutionError;

pub use swap::SwapStrategy;
pub use transfer::TransferStrategy;
pub use wrap::WrapStrategy;

/// What a strategy run produced.
#[derive(Debug)]
pub struct StrategyOutcome {
    /// Hash of the transaction that carried out the action.
    pub tx_hash: TxHash,
    /// Separately reported follow-up step, such as delivering swap output.
    pub follow_up: Option<Result<TxHash, ExecutionError>>,
}

impl StrategyOutcome {
    pub fn single(tx_hash: TxHash) -> Self {
        Self {
            tx_hash,
            follow_up: None,
        }
    }
}

/// Builds and submits the transactions for one action.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn action(&self) -> Action;

    async fn execute(
        &self,
        session: &ChainSession,
        intent: &ValidatedIntent,
    ) -> Result<StrategyOutcome, ExecutionError>;
}
