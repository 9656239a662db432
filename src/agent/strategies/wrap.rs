use async_trait::async_trait;

use crate::agent::strategies::{ExecutionStrategy, StrategyOutcome};
use crate::agent::{Action, ValidatedIntent};
use crate::chain::abi::IWETH9;
use crate::chain::{ChainSession, TxRequest};
use crate::error::ExecutionError;

/// `deposit()` on the wrapped-native contract, paying `amount` as value.
#[derive(Debug, Default)]
pub struct WrapStrategy;

impl WrapStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionStrategy for WrapStrategy {
    fn action(&self) -> Action {
        Action::Wrap
    }

    async fn execute(
        &self,
        session: &ChainSession,
        intent: &ValidatedIntent,
    ) -> Result<StrategyOutcome, ExecutionError> {
        let wrapped = intent
            .target_token()
            .and_then(|token| token.contract())
            .ok_or_else(|| ExecutionError::Unsupported {
                reason: format!(
                    "{} has no wrapped native token configured.",
                    session.profile.canonical_name
                ),
            })?;

        tracing::info!(
            intent_id = %intent.intent().intent_id,
            chain = %session.profile.canonical_name,
            amount = %intent.amount_units(),
            "Submitting wrap"
        );
        let tx = TxRequest::contract_call(wrapped, &IWETH9::depositCall {})
            .with_value(intent.amount_units());
        let receipt = session
            .send_and_confirm(tx)
            .await
            .map_err(ExecutionError::failed("wrap"))?;
        Ok(StrategyOutcome::single(receipt.tx_hash))
    }
}
