//! ENS resolution through the registry and public resolver contracts.

use std::sync::Arc;

use alloy_primitives::{Address, B256, address};
use async_trait::async_trait;
use sha3::{Digest, Keccak256};

use crate::chain::abi::{IEnsRegistry, IEnsResolver};
use crate::chain::{ChainClient, read_contract};
use crate::error::ChainError;
use crate::identity::IdentityResolver;

/// ENS registry deployment shared by mainnet and Sepolia.
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// Resolves `.eth` names with `resolver(node)` followed by `addr(node)`.
pub struct EnsResolver {
    client: Arc<dyn ChainClient>,
    registry: Address,
}

impl EnsResolver {
    pub fn new(client: Arc<dyn ChainClient>, registry: Address) -> Self {
        Self { client, registry }
    }
}

#[async_trait]
impl IdentityResolver for EnsResolver {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ChainError> {
        let node = namehash(name);
        let resolver = read_contract(
            self.client.as_ref(),
            self.registry,
            &IEnsRegistry::resolverCall { node },
        )
        .await?;
        if resolver == Address::ZERO {
            return Ok(None);
        }

        let resolved =
            read_contract(self.client.as_ref(), resolver, &IEnsResolver::addrCall { node }).await?;
        Ok((resolved != Address::ZERO).then_some(resolved))
    }
}

/// EIP-137 namehash. Labels are lowercased; full UTS-46 mapping is not applied.
pub fn namehash(name: &str) -> B256 {
    let mut node = [0u8; 32];
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return B256::from(node);
    }
    for label in name.rsplit('.') {
        let label_hash = Keccak256::digest(label.as_bytes());
        let mut hasher = Keccak256::new();
        hasher.update(node);
        hasher.update(label_hash);
        node.copy_from_slice(&hasher.finalize());
    }
    B256::from(node)
}
