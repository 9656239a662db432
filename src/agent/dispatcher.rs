//! Routes validated intents to their execution strategy.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::agent::reporter::ExecutionResult;
use crate::agent::strategies::{
    ExecutionStrategy, StrategyOutcome, SwapStrategy, TransferStrategy, WrapStrategy,
};
use crate::agent::{Action, ValidatedIntent};
use crate::chain::{ChainConnector, ChainSession};
use crate::error::{DispatchError, ExecutionError};

/// One async lock per (chain, account) pair.
///
/// Held for a whole strategy run so two commands never race on the same
/// account nonce.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<(u64, Address), Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, chain_id: u64, account: Address) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry((chain_id, account)).or_default())
        };
        lock.lock_owned().await
    }
}

/// Binds the chain session for an intent and runs the matching strategy.
pub struct ChainDispatcher {
    connector: Arc<dyn ChainConnector>,
    transfer: Arc<dyn ExecutionStrategy>,
    swap: Arc<dyn ExecutionStrategy>,
    wrap: Arc<dyn ExecutionStrategy>,
    locks: AccountLocks,
}

impl ChainDispatcher {
    pub fn new(connector: Arc<dyn ChainConnector>) -> Self {
        Self {
            connector,
            transfer: Arc::new(TransferStrategy::new()),
            swap: Arc::new(SwapStrategy::new()),
            wrap: Arc::new(WrapStrategy::new()),
            locks: AccountLocks::new(),
        }
    }

    /// Replace the strategy registered for its action.
    pub fn with_strategy(mut self, strategy: Arc<dyn ExecutionStrategy>) -> Self {
        match strategy.action() {
            Action::Transfer => self.transfer = strategy,
            Action::Swap => self.swap = strategy,
            Action::Wrap => self.wrap = strategy,
            action @ (Action::Ask | Action::Receive | Action::Help) => {
                tracing::error!(%action, "Ignoring strategy for a non-executable action");
            }
        }
        self
    }

    /// Execute a validated intent.
    ///
    /// Execution failures come back as `Failure` results. An `Err` means the
    /// intent should never have reached dispatch.
    pub async fn dispatch(
        &self,
        validated: ValidatedIntent,
    ) -> Result<Vec<ExecutionResult>, DispatchError> {
        let action = validated.action();
        let strategy = match action {
            Action::Transfer => &self.transfer,
            Action::Swap => &self.swap,
            Action::Wrap => &self.wrap,
            Action::Ask | Action::Receive | Action::Help => {
                tracing::error!(
                    intent_id = %validated.intent().intent_id,
                    %action,
                    "No execution strategy for action"
                );
                return Err(DispatchError::NoStrategy { action });
            }
        };

        let profile = validated.profile();
        let client = match self.connector.connect(profile) {
            Ok(client) => client,
            Err(cause) => {
                let err = ExecutionError::Unavailable {
                    chain: profile.canonical_name.clone(),
                    cause,
                };
                tracing::warn!(chain = %profile.canonical_name, "Chain connection failed: {}", err);
                return Ok(vec![failure(&err)]);
            }
        };
        let session = ChainSession {
            profile: profile.clone(),
            client,
            account: *validated.account(),
        };

        let _guard = self
            .locks
            .acquire(session.account.chain_id, session.account.address)
            .await;
        tracing::info!(
            intent_id = %validated.intent().intent_id,
            chain = %profile.canonical_name,
            %action,
            "Dispatching intent"
        );

        let results = match strategy.execute(&session, &validated).await {
            Ok(StrategyOutcome { tx_hash, follow_up }) => {
                let mut results = vec![ExecutionResult::success(profile, tx_hash.to_string())];
                match follow_up {
                    Some(Ok(hash)) => {
                        results.push(ExecutionResult::success(profile, hash.to_string()));
                    }
                    Some(Err(err)) => {
                        tracing::warn!(
                            intent_id = %validated.intent().intent_id,
                            "Follow-up step failed: {}",
                            err
                        );
                        results.push(failure(&err));
                    }
                    None => {}
                }
                results
            }
            Err(err) => {
                tracing::warn!(
                    intent_id = %validated.intent().intent_id,
                    chain = %profile.canonical_name,
                    kind = %err.kind(),
                    "Execution failed: {}",
                    err
                );
                vec![failure(&err)]
            }
        };
        Ok(results)
    }
}

fn failure(err: &ExecutionError) -> ExecutionResult {
    ExecutionResult::failure(err.kind(), err.user_message())
}
