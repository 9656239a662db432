//! `onchain-agent chains` - print the capability matrix.

use std::path::Path;

use crate::agent::Action;
use crate::config::{ChainsConfig, Config};
use crate::registry::CapabilityRegistry;

pub fn run_chains_command(toml_path: Option<&Path>) -> anyhow::Result<()> {
    let settings = Config::load_settings(toml_path)?;
    let registry = ChainsConfig::resolve(&settings)?.load_registry()?;
    print!("{}", render_capability_matrix(&registry));
    Ok(())
}

/// One row per chain: id, executable actions, tokens and explorer.
pub fn render_capability_matrix(registry: &CapabilityRegistry) -> String {
    let name_width = registry
        .profiles()
        .iter()
        .map(|p| p.canonical_name.len())
        .max()
        .unwrap_or(5)
        .max("Chain".len());

    let mut out = format!("{:<name_width$}  {:>9}", "Chain", "Chain ID");
    for action in Action::EXECUTABLE {
        out.push_str(&format!("  {:<8}", action.label()));
    }
    out.push_str("  Tokens\n");

    for profile in registry.profiles() {
        out.push_str(&format!(
            "{:<name_width$}  {:>9}",
            profile.canonical_name, profile.chain_id
        ));
        for action in Action::EXECUTABLE {
            let mark = if profile.supports_action(action) { "yes" } else { "-" };
            out.push_str(&format!("  {:<8}", mark));
        }
        out.push_str(&format!("  {}\n", profile.token_symbols().join(", ")));
    }
    out
}
