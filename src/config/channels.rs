use std::path::PathBuf;

use crate::bootstrap::onchain_agent_dir;
use crate::config::helpers::optional_env;
use crate::error::ConfigError;
use crate::settings::Settings;

/// Terminal channel configuration.
#[derive(Debug, Clone)]
pub struct ReplConfig {
    pub history_file: PathBuf,
    pub show_banner: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            show_banner: true,
        }
    }
}

fn default_history_file() -> PathBuf {
    onchain_agent_dir().join("history")
}

impl ReplConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let history_file = optional_env("REPL_HISTORY_FILE")?
            .map(PathBuf::from)
            .or_else(|| settings.repl.history_file.clone())
            .unwrap_or_else(default_history_file);

        let show_banner = optional_env("REPL_SHOW_BANNER")?
            .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
            .unwrap_or(settings.repl.show_banner);

        Ok(Self {
            history_file,
            show_banner,
        })
    }
}
