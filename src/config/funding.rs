use alloy_primitives::{Address, address};
use secrecy::SecretString;

use crate::chain::account::{AccountKind, FundingAccount, derive_owner_address};
use crate::config::helpers::{optional_env, parse_address};
use crate::error::ConfigError;
use crate::settings::Settings;

/// ERC-4337 v0.6 entry point, deployed at the same address on every chain.
pub const DEFAULT_ENTRY_POINT: Address = address!("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

/// Funding account configuration.
#[derive(Debug, Clone)]
pub struct FundingConfig {
    pub private_key: SecretString,
    pub account_kind: AccountKind,
    pub entry_point: Address,
    pub entry_point_version: String,
    pub smart_account: Option<Address>,
}

impl FundingConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let private_key = optional_env("PRIVATE_KEY")?
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "PRIVATE_KEY".to_string(),
                hint: "Set it in the environment or in ~/.onchain-agent/.env.".to_string(),
            })?;

        let account_kind = AccountKind::parse(
            &optional_env("ACCOUNT_TYPE")?.unwrap_or_else(|| settings.account.account_type.clone()),
            "ACCOUNT_TYPE",
        )?;

        let entry_point = match optional_env("ENTRY_POINT_ADDRESS")?
            .or_else(|| settings.account.entry_point.clone())
        {
            Some(value) => parse_address(&value, "ENTRY_POINT_ADDRESS")?,
            None => DEFAULT_ENTRY_POINT,
        };

        let entry_point_version = optional_env("ENTRY_POINT_VERSION")?
            .unwrap_or_else(|| settings.account.entry_point_version.clone());

        let smart_account = optional_env("SMART_ACCOUNT_ADDRESS")?
            .or_else(|| settings.account.smart_account_address.clone())
            .map(|value| parse_address(&value, "SMART_ACCOUNT_ADDRESS"))
            .transpose()?;

        Ok(Self {
            private_key,
            account_kind,
            entry_point,
            entry_point_version,
            smart_account,
        })
    }

    /// Derive the owner address and build the funding identity.
    pub fn account(&self) -> Result<FundingAccount, ConfigError> {
        Ok(FundingAccount {
            kind: self.account_kind,
            owner: derive_owner_address(&self.private_key)?,
            smart_account: self.smart_account,
            entry_point: self.entry_point,
            entry_point_version: self.entry_point_version.clone(),
        })
    }
}
