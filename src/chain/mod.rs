//! Chain access: the [`ChainClient`] seam, transaction types, and helpers
//! shared by the balance validator, ENS resolver and execution strategies.

pub mod abi;
pub mod account;
pub mod rpc;
pub mod units;

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;

use crate::error::ChainError;
use crate::registry::ChainProfile;

pub use account::{Account, AccountKind, FundingAccount};

/// A transaction to submit from the funding account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl TxRequest {
    /// Plain value transfer with no calldata.
    pub fn value_transfer(to: Address, value: U256) -> Self {
        Self {
            to,
            value,
            data: Bytes::new(),
        }
    }

    /// Contract call carrying ABI-encoded calldata.
    pub fn contract_call<C: SolCall>(to: Address, call: &C) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data: Bytes::from(call.abi_encode()),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Mined transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
}

/// Low-level access to one chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain ID reported by the endpoint.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Native asset balance of `owner` in base units.
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;

    /// Read-only contract call.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Submit a transaction from `from` and return its hash.
    async fn send_transaction(&self, from: &Account, tx: TxRequest) -> Result<TxHash, ChainError>;

    /// Wait until the transaction is mined.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError>;
}

/// Builds chain clients for registry profiles.
pub trait ChainConnector: Send + Sync {
    fn connect(&self, profile: &ChainProfile) -> Result<Arc<dyn ChainClient>, ChainError>;
}

/// A chain-bound client and funding account for one interaction.
#[derive(Clone)]
pub struct ChainSession {
    pub profile: ChainProfile,
    pub client: Arc<dyn ChainClient>,
    pub account: Account,
}

impl std::fmt::Debug for ChainSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSession")
            .field("chain", &self.profile.canonical_name)
            .field("account", &self.account)
            .finish()
    }
}

impl ChainSession {
    /// Submit a transaction and wait for a successful receipt.
    pub async fn send_and_confirm(&self, tx: TxRequest) -> Result<TxReceipt, ChainError> {
        let tx_hash = self.client.send_transaction(&self.account, tx).await?;
        tracing::debug!(chain = %self.profile.canonical_name, %tx_hash, "Transaction submitted");
        let receipt = self.client.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            return Err(ChainError::Reverted {
                tx_hash: tx_hash.to_string(),
            });
        }
        Ok(receipt)
    }

    /// Read-only typed contract call.
    pub async fn read<C: SolCall + Send + Sync>(
        &self,
        to: Address,
        call: &C,
    ) -> Result<C::Return, ChainError> {
        read_contract(self.client.as_ref(), to, call).await
    }
}

/// Encode `call`, run it against `to`, and decode the return data.
pub async fn read_contract<C: SolCall>(
    client: &dyn ChainClient,
    to: Address,
    call: &C,
) -> Result<C::Return, ChainError> {
    let output = client.call(to, Bytes::from(call.abi_encode())).await?;
    C::abi_decode_returns(&output).map_err(|e| ChainError::Decode(e.to_string()))
}

/// ERC-20 balance of `owner` in base units.
pub async fn token_balance(
    client: &dyn ChainClient,
    token: Address,
    owner: Address,
) -> Result<U256, ChainError> {
    read_contract(client, token, &abi::IERC20::balanceOfCall { owner }).await
}
