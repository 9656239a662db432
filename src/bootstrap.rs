//! Bootstrap helpers for onchain-agent.
//!
//! Secrets (funding key, RPC URLs, extractor API key) are read from env vars.
//! Besides the process environment and `./.env`, they may live in
//! `~/.onchain-agent/.env` (standard dotenvy format).

use std::path::{Path, PathBuf};

/// Base directory for agent state: `~/.onchain-agent`.
pub fn onchain_agent_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".onchain-agent")
}

/// Path to the agent-specific `.env` file: `~/.onchain-agent/.env`.
pub fn env_path() -> PathBuf {
    onchain_agent_dir().join(".env")
}

/// Load env vars from `~/.onchain-agent/.env` (in addition to the standard
/// `.env`).
///
/// Call this **after** `dotenvy::dotenv()` so that the standard `./.env`
/// takes priority. dotenvy never overwrites existing env vars, so the
/// effective priority is:
///
///   explicit env vars > `./.env` > `~/.onchain-agent/.env`
pub fn load_agent_env() {
    load_env_file(&env_path());
}

fn load_env_file(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = dotenvy::from_path(path) {
        tracing::warn!("Failed to load {}: {}", path.display(), e);
    }
}
