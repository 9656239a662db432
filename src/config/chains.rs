use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use alloy_primitives::Address;
use secrecy::SecretString;

use crate::chain::rpc::ChainRpcConfig;
use crate::config::helpers::{optional_env, parse_address, parse_env_or};
use crate::error::{ConfigError, RegistryError};
use crate::identity::ens::ENS_REGISTRY;
use crate::registry::CapabilityRegistry;
use crate::settings::Settings;

/// Public mainnet endpoint used for ENS when none is configured.
pub const DEFAULT_ENS_RPC_URL: &str = "https://eth.llamarpc.com";

/// Chain access configuration.
///
/// Endpoints are resolved against a loaded registry because each profile
/// names its own RPC env var.
#[derive(Debug, Clone)]
pub struct ChainsConfig {
    pub registry_file: Option<PathBuf>,
    pub rpc_overrides: BTreeMap<String, String>,
    pub request_timeout: Duration,
    pub receipt_poll_interval: Duration,
}

impl ChainsConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let registry_file = optional_env("CHAIN_REGISTRY_FILE")?
            .map(PathBuf::from)
            .or_else(|| settings.chains.registry_file.clone());

        let timeout_secs = parse_env_or("HTTP_TIMEOUT_SECS", settings.chains.http_timeout_secs)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_TIMEOUT_SECS".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        let poll_ms = parse_env_or(
            "RECEIPT_POLL_INTERVAL_MS",
            settings.chains.receipt_poll_interval_ms,
        )?;
        if poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RECEIPT_POLL_INTERVAL_MS".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        Ok(Self {
            registry_file,
            rpc_overrides: settings.chains.rpc_urls.clone(),
            request_timeout: Duration::from_secs(timeout_secs),
            receipt_poll_interval: Duration::from_millis(poll_ms),
        })
    }

    /// Load the configured registry, or the built-in one.
    pub fn load_registry(&self) -> Result<CapabilityRegistry, RegistryError> {
        match &self.registry_file {
            Some(path) => {
                tracing::debug!("Loading chain registry from {}", path.display());
                CapabilityRegistry::load(path)
            }
            None => CapabilityRegistry::builtin(),
        }
    }

    /// Resolve one endpoint per chain.
    ///
    /// Priority: the profile's env var > settings override > the profile's
    /// default URL. Chains with none are left out and fail at connect time.
    pub fn rpc_config(&self, registry: &CapabilityRegistry) -> Result<ChainRpcConfig, ConfigError> {
        let mut overrides = BTreeMap::new();
        for (name, url) in &self.rpc_overrides {
            let profile = registry
                .resolve_chain(name)
                .map_err(|_| ConfigError::InvalidValue {
                    key: format!("chains.rpc_urls.{name}"),
                    message: "does not name a supported chain".to_string(),
                })?;
            overrides.insert(profile.chain_id, url.clone());
        }

        let mut endpoints = BTreeMap::new();
        for profile in registry.profiles() {
            let url = optional_env(&profile.rpc_endpoint_key)?
                .or_else(|| overrides.remove(&profile.chain_id))
                .or_else(|| profile.default_rpc_url.clone());
            match url {
                Some(url) => {
                    endpoints.insert(profile.chain_id, SecretString::from(url));
                }
                None => tracing::debug!(
                    chain = %profile.canonical_name,
                    key = %profile.rpc_endpoint_key,
                    "No RPC endpoint configured"
                ),
            }
        }

        Ok(ChainRpcConfig {
            endpoints,
            request_timeout: self.request_timeout,
            receipt_poll_interval: self.receipt_poll_interval,
        })
    }
}

/// ENS lookup configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub rpc_url: SecretString,
    pub registry: Address,
}

impl IdentityConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let rpc_url = optional_env("ENS_RPC_URL")?
            .or_else(|| settings.identity.ens_rpc_url.clone())
            .unwrap_or_else(|| DEFAULT_ENS_RPC_URL.to_string());

        let registry = match optional_env("ENS_REGISTRY_ADDRESS")?
            .or_else(|| settings.identity.ens_registry.clone())
        {
            Some(value) => parse_address(&value, "ENS_REGISTRY_ADDRESS")?,
            None => ENS_REGISTRY,
        };

        Ok(Self {
            rpc_url: SecretString::from(rpc_url),
            registry,
        })
    }
}
