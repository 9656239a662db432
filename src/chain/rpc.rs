//! JSON-RPC chain client over HTTP.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash, U64, U256};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::chain::{Account, ChainClient, ChainConnector, TxReceipt, TxRequest};
use crate::error::ChainError;
use crate::registry::ChainProfile;

/// Resolved RPC endpoints keyed by chain ID.
#[derive(Debug, Clone, Default)]
pub struct ChainRpcConfig {
    pub endpoints: BTreeMap<u64, SecretString>,
    pub request_timeout: Duration,
    pub receipt_poll_interval: Duration,
}

/// JSON-RPC client bound to one chain endpoint.
pub struct RpcClient {
    http: reqwest::Client,
    // Endpoint URLs routinely embed provider API keys.
    endpoint: SecretString,
    chain: String,
    poll_interval: Duration,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptBody {
    transaction_hash: TxHash,
    #[serde(default)]
    status: Option<U64>,
    #[serde(default)]
    block_number: Option<U64>,
}

impl RpcClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: SecretString,
        chain: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http,
            endpoint,
            chain: chain.into(),
            poll_interval,
            next_id: AtomicU64::new(1),
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<Option<T>, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(self.endpoint.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Http(e.without_url()))?
            .error_for_status()
            .map_err(|e| ChainError::Http(e.without_url()))?;

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse {
                method,
                reason: e.without_url().to_string(),
            })?;

        if let Some(error) = parsed.error {
            tracing::warn!(
                chain = %self.chain,
                method,
                code = error.code,
                "RPC call returned an error: {}",
                error.message
            );
            return Err(ChainError::Rpc {
                method,
                code: error.code,
                message: error.message,
            });
        }
        Ok(parsed.result)
    }

    async fn request_required<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, ChainError> {
        self.request(method, params)
            .await?
            .ok_or_else(|| ChainError::InvalidResponse {
                method,
                reason: "missing result".to_string(),
            })
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        let id: U64 = self.request_required("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.request_required("eth_getBalance", json!([owner, "latest"]))
            .await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.request_required("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn send_transaction(&self, from: &Account, tx: TxRequest) -> Result<TxHash, ChainError> {
        let mut params = json!({
            "from": from.address,
            "to": tx.to,
            "value": tx.value,
        });
        if !tx.data.is_empty() {
            params["data"] = json!(tx.data);
        }
        self.request_required("eth_sendTransaction", json!([params]))
            .await
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError> {
        loop {
            let receipt: Option<ReceiptBody> = self
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(receipt) = receipt {
                return Ok(TxReceipt {
                    tx_hash: receipt.transaction_hash,
                    // Pre-Byzantium receipts carry no status; treat as success.
                    success: receipt.status.is_none_or(|s| s != U64::ZERO),
                    block_number: receipt.block_number.map(|n| n.to::<u64>()),
                });
            }
            tracing::trace!(chain = %self.chain, %tx_hash, "Receipt not yet available");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Connector that builds [`RpcClient`]s from resolved endpoint config.
pub struct RpcConnector {
    http: reqwest::Client,
    config: ChainRpcConfig,
}

impl RpcConnector {
    pub fn new(config: ChainRpcConfig) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ChainError::Http)?;
        Ok(Self { http, config })
    }
}

impl ChainConnector for RpcConnector {
    fn connect(&self, profile: &ChainProfile) -> Result<Arc<dyn ChainClient>, ChainError> {
        let endpoint = self.config.endpoints.get(&profile.chain_id).ok_or_else(|| {
            ChainError::MissingEndpoint {
                chain: profile.canonical_name.clone(),
                key: profile.rpc_endpoint_key.clone(),
            }
        })?;
        Ok(Arc::new(RpcClient::new(
            self.http.clone(),
            endpoint.clone(),
            profile.canonical_name.clone(),
            self.config.receipt_poll_interval,
        )))
    }
}
