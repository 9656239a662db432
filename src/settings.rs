//! User settings persistence.
//!
//! Non-secret preferences live in `~/.onchain-agent/settings.json` and
//! `~/.onchain-agent/config.toml`. Priority: env var > config.toml >
//! settings.json > default. Keys and RPC credentials belong in env vars.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bootstrap::onchain_agent_dir;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub account: AccountSettings,

    #[serde(default)]
    pub chains: ChainSettings,

    #[serde(default)]
    pub extractor: ExtractorSettings,

    #[serde(default)]
    pub identity: IdentitySettings,

    #[serde(default)]
    pub repl: ReplSettings,
}

/// Funding account preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSettings {
    /// `simple`, `safe` or `kernel`.
    #[serde(default = "default_account_type")]
    pub account_type: String,

    #[serde(default)]
    pub entry_point: Option<String>,

    #[serde(default = "default_entry_point_version")]
    pub entry_point_version: String,

    /// Deployed smart-account address. The owner EOA is used when unset.
    #[serde(default)]
    pub smart_account_address: Option<String>,
}

fn default_account_type() -> String {
    "simple".to_string()
}

fn default_entry_point_version() -> String {
    "0.6".to_string()
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            account_type: default_account_type(),
            entry_point: None,
            entry_point_version: default_entry_point_version(),
            smart_account_address: None,
        }
    }
}

/// Chain access preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainSettings {
    /// Capability registry replacing the built-in chain table.
    #[serde(default)]
    pub registry_file: Option<PathBuf>,

    /// RPC URL per chain name or alias. Env vars still win.
    #[serde(default)]
    pub rpc_urls: BTreeMap<String, String>,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_receipt_poll_interval_ms() -> u64 {
    2_000
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            registry_file: None,
            rpc_urls: BTreeMap::new(),
            http_timeout_secs: default_http_timeout_secs(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
        }
    }
}

/// Parameter extraction service preferences.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExtractorSettings {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub knowledge_box: Option<String>,
}

/// Name resolution preferences.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IdentitySettings {
    /// Mainnet RPC used for ENS lookups.
    #[serde(default)]
    pub ens_rpc_url: Option<String>,

    #[serde(default)]
    pub ens_registry: Option<String>,
}

/// Terminal channel preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplSettings {
    #[serde(default = "default_true")]
    pub show_banner: bool,

    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for ReplSettings {
    fn default() -> Self {
        Self {
            show_banner: true,
            history_file: None,
        }
    }
}

impl Settings {
    /// Get the default settings file path (~/.onchain-agent/settings.json).
    pub fn default_path() -> PathBuf {
        onchain_agent_dir().join("settings.json")
    }

    /// Load settings from disk, returning default if not found.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Default TOML config file path (~/.onchain-agent/config.toml).
    pub fn default_toml_path() -> PathBuf {
        onchain_agent_dir().join("config.toml")
    }

    /// Load settings from a TOML file.
    ///
    /// Returns `None` if the file doesn't exist. Returns an error only
    /// if the file exists but can't be parsed.
    pub fn load_toml(path: &Path) -> Result<Option<Self>, String> {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("failed to read {}: {}", path.display(), e)),
        };

        let settings: Self = toml::from_str(&data)
            .map_err(|e| format!("invalid TOML in {}: {}", path.display(), e))?;
        Ok(Some(settings))
    }

    /// Merge values from `other` into `self`, preferring `other` for
    /// fields that differ from the default.
    ///
    /// Only fields the overlay explicitly changed are applied, so a TOML
    /// file that sets one key leaves the JSON base intact.
    pub fn merge_from(&mut self, other: &Self) {
        let default_json = match serde_json::to_value(Self::default()) {
            Ok(v) => v,
            Err(_) => return,
        };
        let other_json = match serde_json::to_value(other) {
            Ok(v) => v,
            Err(_) => return,
        };
        let mut self_json = match serde_json::to_value(&*self) {
            Ok(v) => v,
            Err(_) => return,
        };

        merge_non_default(&mut self_json, &other_json, &default_json);

        if let Ok(merged) = serde_json::from_value(self_json) {
            *self = merged;
        }
    }
}

fn merge_non_default(
    target: &mut serde_json::Value,
    other: &serde_json::Value,
    defaults: &serde_json::Value,
) {
    match (target, other, defaults) {
        (
            serde_json::Value::Object(t),
            serde_json::Value::Object(o),
            serde_json::Value::Object(d),
        ) => {
            for (key, other_val) in o {
                let default_val = d.get(key).cloned().unwrap_or(serde_json::Value::Null);
                if let Some(target_val) = t.get_mut(key) {
                    merge_non_default(target_val, other_val, &default_val);
                } else if other_val != &default_val {
                    t.insert(key.clone(), other_val.clone());
                }
            }
        }
        (target, other, defaults) => {
            if other != defaults {
                *target = other.clone();
            }
        }
    }
}
