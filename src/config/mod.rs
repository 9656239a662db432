//! Configuration for onchain-agent.
//!
//! Settings are loaded with priority: env var > config.toml >
//! settings.json > default. Secrets come from env vars only; `./.env` and
//! `~/.onchain-agent/.env` are loaded via dotenvy early in startup.

mod channels;
mod chains;
mod funding;
pub(crate) mod helpers;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::brian::{DEFAULT_BASE_URL, DEFAULT_KNOWLEDGE_BOX};
use crate::llm::ExtractorConfig;
use crate::settings::Settings;

pub use self::chains::{ChainsConfig, DEFAULT_ENS_RPC_URL, IdentityConfig};
pub use self::channels::ReplConfig;
pub use self::funding::{DEFAULT_ENTRY_POINT, FundingConfig};

/// Main configuration for the agent.
#[derive(Debug, Clone)]
pub struct Config {
    pub funding: FundingConfig,
    pub extractor: ExtractorConfig,
    pub identity: IdentityConfig,
    pub chains: ChainsConfig,
    pub repl: ReplConfig,
}

impl ExtractorConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let api_key = helpers::optional_env("BRIAN_API_KEY")?
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "BRIAN_API_KEY".to_string(),
                hint: "Get a key at https://brianknows.org and set it in the environment."
                    .to_string(),
            })?;

        let base_url = helpers::optional_env("BRIAN_API_URL")?
            .or_else(|| settings.extractor.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                key: "BRIAN_API_URL".to_string(),
                message: format!("must be an http(s) URL, got '{base_url}'"),
            });
        }

        let knowledge_box = helpers::optional_env("BRIAN_KNOWLEDGE_BOX")?
            .or_else(|| settings.extractor.knowledge_box.clone())
            .unwrap_or_else(|| DEFAULT_KNOWLEDGE_BOX.to_string());

        let timeout_secs =
            helpers::parse_env_or("HTTP_TIMEOUT_SECS", settings.chains.http_timeout_secs)?;

        Ok(Self {
            api_key,
            base_url,
            knowledge_box,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }
}

impl Config {
    /// Load configuration from env vars and the default settings files.
    ///
    /// Loads both `./.env` (higher priority) and `~/.onchain-agent/.env`
    /// via dotenvy, which never overwrites existing vars.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_toml(None)
    }

    /// Load from env with an optional TOML config file overlay.
    pub fn from_env_with_toml(toml_path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = Self::load_settings(toml_path)?;
        Self::build(&settings)
    }

    /// Load env files and layered settings without resolving typed config.
    pub fn load_settings(toml_path: Option<&Path>) -> Result<Settings, ConfigError> {
        let _ = dotenvy::dotenv();
        crate::bootstrap::load_agent_env();
        let mut settings = Settings::load();

        // TOML values win over JSON settings
        Self::apply_toml_overlay(&mut settings, toml_path)?;
        Ok(settings)
    }

    /// Load and merge a TOML config file into settings.
    ///
    /// If `explicit_path` is `Some`, loads from that path (errors are fatal).
    /// If `None`, tries `~/.onchain-agent/config.toml` (missing file is
    /// silently ignored).
    fn apply_toml_overlay(
        settings: &mut Settings,
        explicit_path: Option<&Path>,
    ) -> Result<(), ConfigError> {
        let path = explicit_path
            .map(PathBuf::from)
            .unwrap_or_else(Settings::default_toml_path);

        match Settings::load_toml(&path) {
            Ok(Some(toml_settings)) => {
                settings.merge_from(&toml_settings);
                tracing::debug!("Loaded TOML config from {}", path.display());
            }
            Ok(None) => {
                if explicit_path.is_some() {
                    return Err(ConfigError::ParseError(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
            }
            Err(e) => {
                if explicit_path.is_some() {
                    return Err(ConfigError::ParseError(format!(
                        "Failed to load config file {}: {}",
                        path.display(),
                        e
                    )));
                }
                tracing::warn!("Failed to load default config file: {}", e);
            }
        }
        Ok(())
    }

    /// Build config from already-layered settings.
    pub fn build(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            funding: FundingConfig::resolve(settings)?,
            extractor: ExtractorConfig::resolve(settings)?,
            identity: IdentityConfig::resolve(settings)?,
            chains: ChainsConfig::resolve(settings)?,
            repl: ReplConfig::resolve(settings)?,
        })
    }
}
