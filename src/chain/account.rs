//! Funding account derivation.
//!
//! The account is rebuilt per chain interaction from [`FundingAccount`]; no
//! signer state lives at module level.

use alloy_primitives::{Address, hex};
use k256::ecdsa::SigningKey;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::ConfigError;

/// Smart-account flavor fronting the funding key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    #[default]
    Simple,
    Safe,
    Kernel,
}

impl AccountKind {
    pub fn parse(value: &str, key: &str) -> Result<Self, ConfigError> {
        match normalize_variant(value).as_str() {
            "simple" | "eoa" => Ok(Self::Simple),
            "safe" => Ok(Self::Safe),
            "kernel" => Ok(Self::Kernel),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("must be one of: simple, safe, kernel (got '{value}')"),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Safe => "safe",
            Self::Kernel => "kernel",
        }
    }
}

fn normalize_variant(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// The funding source for one chain interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Account {
    pub kind: AccountKind,
    pub address: Address,
    pub owner: Address,
    pub chain_id: u64,
}

/// Configured funding identity, independent of any chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingAccount {
    pub kind: AccountKind,
    pub owner: Address,
    pub smart_account: Option<Address>,
    pub entry_point: Address,
    pub entry_point_version: String,
}

impl FundingAccount {
    /// Address that holds funds and receives swap output.
    pub fn address(&self) -> Address {
        self.smart_account.unwrap_or(self.owner)
    }

    /// Bind the funding identity to a chain.
    pub fn for_chain(&self, chain_id: u64) -> Account {
        Account {
            kind: self.kind,
            address: self.address(),
            owner: self.owner,
            chain_id,
        }
    }
}

/// Derive the EOA address controlled by a hex-encoded secp256k1 private key.
pub fn derive_owner_address(private_key: &SecretString) -> Result<Address, ConfigError> {
    let raw = private_key.expose_secret().trim();
    let bytes = hex::decode(raw.strip_prefix("0x").unwrap_or(raw)).map_err(|_| {
        ConfigError::InvalidValue {
            key: "PRIVATE_KEY".to_string(),
            message: "must be a hex-encoded 32-byte key".to_string(),
        }
    })?;
    let signing_key = SigningKey::from_slice(&bytes).map_err(|_| ConfigError::InvalidValue {
        key: "PRIVATE_KEY".to_string(),
        message: "is not a valid secp256k1 private key".to_string(),
    })?;

    let point = signing_key.verifying_key().to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    Ok(Address::from_slice(&hash[12..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn derives_known_owner_address() {
        let key = SecretString::from(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        );
        assert_eq!(
            derive_owner_address(&key).unwrap(),
            address!("2c7536E3605D9C16a7a3D7b1898e529396a65c23")
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        let err = derive_owner_address(&SecretString::from("not-hex")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PRIVATE_KEY"));

        let zero = SecretString::from(format!("0x{}", "0".repeat(64)));
        assert!(derive_owner_address(&zero).is_err());
    }

    #[test]
    fn smart_account_overrides_owner() {
        let owner = address!("2c7536E3605D9C16a7a3D7b1898e529396a65c23");
        let smart = address!("1111111111111111111111111111111111111111");
        let mut funding = FundingAccount {
            kind: AccountKind::Kernel,
            owner,
            smart_account: Some(smart),
            entry_point: Address::ZERO,
            entry_point_version: "0.6".to_string(),
        };
        let account = funding.for_chain(84532);
        assert_eq!(account.address, smart);
        assert_eq!(account.owner, owner);
        assert_eq!(account.chain_id, 84532);

        funding.smart_account = None;
        assert_eq!(funding.address(), owner);
    }

    #[test]
    fn accounts_are_keyed_per_chain() {
        let funding = FundingAccount {
            kind: AccountKind::Safe,
            owner: address!("2c7536E3605D9C16a7a3D7b1898e529396a65c23"),
            smart_account: None,
            entry_point: Address::ZERO,
            entry_point_version: "0.7".to_string(),
        };
        let accounts: std::collections::HashSet<Account> = [84532, 84532, 11155111]
            .into_iter()
            .map(|chain_id| funding.for_chain(chain_id))
            .collect();
        assert_eq!(accounts.len(), 2);
    }

    #[test]
    fn account_kind_parses_variants() {
        assert_eq!(AccountKind::parse("Kernel", "ACCOUNT_TYPE").unwrap(), AccountKind::Kernel);
        assert_eq!(AccountKind::parse(" safe ", "ACCOUNT_TYPE").unwrap(), AccountKind::Safe);
        assert!(AccountKind::parse("light", "ACCOUNT_TYPE").is_err());
    }
}
