use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::agent::strategies::{ExecutionStrategy, StrategyOutcome};
use crate::agent::{Action, ValidatedIntent};
use crate::chain::abi::IERC20;
use crate::chain::{ChainSession, TxRequest};
use crate::error::ExecutionError;
use crate::registry::{TokenAddress, TokenSpec};

/// Native value transfer or ERC-20 `transfer`.
#[derive(Debug, Default)]
pub struct TransferStrategy;

impl TransferStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// Send `amount` base units of `token` to `recipient` and wait for the receipt.
pub(crate) async fn send_token(
    session: &ChainSession,
    token: &TokenSpec,
    recipient: Address,
    amount: U256,
    step: &'static str,
) -> Result<TxHash, ExecutionError> {
    let tx = match token.address {
        TokenAddress::Native => TxRequest::value_transfer(recipient, amount),
        TokenAddress::Contract(contract) => TxRequest::contract_call(
            contract,
            &IERC20::transferCall {
                to: recipient,
                amount,
            },
        ),
    };
    let receipt = session
        .send_and_confirm(tx)
        .await
        .map_err(ExecutionError::failed(step))?;
    Ok(receipt.tx_hash)
}

#[async_trait]
impl ExecutionStrategy for TransferStrategy {
    fn action(&self) -> Action {
        Action::Transfer
    }

    async fn execute(
        &self,
        session: &ChainSession,
        intent: &ValidatedIntent,
    ) -> Result<StrategyOutcome, ExecutionError> {
        let token = intent.source_token();
        tracing::info!(
            intent_id = %intent.intent().intent_id,
            chain = %session.profile.canonical_name,
            token = %token.symbol,
            recipient = %intent.recipient(),
            amount = %intent.amount_units(),
            "Submitting transfer"
        );
        let tx_hash = send_token(
            session,
            token,
            intent.recipient(),
            intent.amount_units(),
            "transfer",
        )
        .await?;
        Ok(StrategyOutcome::single(tx_hash))
    }
}
