//! `onchain-agent doctor` - active health diagnostics.
//!
//! Validates configuration and probes every configured RPC endpoint. Each
//! check reports pass/fail with actionable guidance on failures.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::chain::rpc::{ChainRpcConfig, RpcClient, RpcConnector};
use crate::chain::{ChainClient, ChainConnector};
use crate::config::{ChainsConfig, Config, FundingConfig, IdentityConfig};
use crate::llm::ExtractorConfig;
use crate::registry::ChainProfile;
use crate::settings::Settings;

const ETHEREUM_MAINNET_ID: u64 = 1;
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Run diagnostic checks and print results.
pub async fn run_doctor_command(toml_path: Option<&Path>, strict: bool) -> anyhow::Result<()> {
    println!("onchain-agent doctor");
    println!("====================\n");

    let mut passed = 0u32;
    let mut failed = 0u32;

    let settings = match Config::load_settings(toml_path) {
        Ok(settings) => {
            check(
                "Settings",
                CheckResult::Pass("loaded".into()),
                &mut passed,
                &mut failed,
            );
            settings
        }
        Err(e) => {
            check(
                "Settings",
                CheckResult::Fail(e.to_string()),
                &mut passed,
                &mut failed,
            );
            Settings::default()
        }
    };

    // ── Configuration checks ──────────────────────────────────

    check(
        "Funding account",
        check_funding(&settings),
        &mut passed,
        &mut failed,
    );

    check(
        "Extractor API key",
        check_extractor(&settings),
        &mut passed,
        &mut failed,
    );

    let registry = match ChainsConfig::resolve(&settings) {
        Ok(chains) => match chains.load_registry() {
            Ok(registry) => {
                check(
                    "Capability registry",
                    CheckResult::Pass(format!(
                        "{} chains ({})",
                        registry.profiles().len(),
                        registry.supported_chain_names().join(", ")
                    )),
                    &mut passed,
                    &mut failed,
                );
                Some((chains, registry))
            }
            Err(e) => {
                check(
                    "Capability registry",
                    CheckResult::Fail(e.to_string()),
                    &mut passed,
                    &mut failed,
                );
                None
            }
        },
        Err(e) => {
            check(
                "Capability registry",
                CheckResult::Fail(format!("chain config invalid: {e}")),
                &mut passed,
                &mut failed,
            );
            None
        }
    };

    // ── RPC reachability ──────────────────────────────────────

    if let Some((chains, registry)) = &registry {
        match chains.rpc_config(registry) {
            Ok(rpc) => {
                for profile in registry.profiles() {
                    check(
                        &format!("RPC {}", profile.canonical_name),
                        check_chain_rpc(&rpc, profile).await,
                        &mut passed,
                        &mut failed,
                    );
                }
            }
            Err(e) => check(
                "RPC endpoints",
                CheckResult::Fail(e.to_string()),
                &mut passed,
                &mut failed,
            ),
        }
    }

    check(
        "ENS RPC",
        check_ens_rpc(&settings).await,
        &mut passed,
        &mut failed,
    );

    // ── Summary ───────────────────────────────────────────────

    println!();
    println!("  {passed} passed, {failed} failed");

    if failed > 0 {
        println!("\n  Commands on chains with failed checks will be rejected at execution.");
        if strict {
            anyhow::bail!("doctor strict mode failed with {failed} check(s)");
        }
    }

    Ok(())
}

// ── Individual checks ───────────────────────────────────────

fn check(name: &str, result: CheckResult, passed: &mut u32, failed: &mut u32) {
    match result {
        CheckResult::Pass(detail) => {
            *passed += 1;
            println!("  [pass] {name}: {detail}");
        }
        CheckResult::Fail(detail) => {
            *failed += 1;
            println!("  [FAIL] {name}: {detail}");
        }
        CheckResult::Skip(reason) => {
            println!("  [skip] {name}: {reason}");
        }
    }
}

enum CheckResult {
    Pass(String),
    Fail(String),
    Skip(String),
}

fn check_funding(settings: &Settings) -> CheckResult {
    let funding = match FundingConfig::resolve(settings).and_then(|config| config.account()) {
        Ok(funding) => funding,
        Err(e) => return CheckResult::Fail(e.to_string()),
    };

    let mut detail = format!(
        "{} account {} (owner {})",
        funding.kind.as_str(),
        funding.address(),
        funding.owner
    );
    if funding.smart_account.is_some() {
        detail.push_str(&format!(
            ", entry point {} v{}",
            funding.entry_point, funding.entry_point_version
        ));
    }
    CheckResult::Pass(detail)
}

fn check_extractor(settings: &Settings) -> CheckResult {
    match ExtractorConfig::resolve(settings) {
        Ok(config) => CheckResult::Pass(format!("configured for {}", config.base_url)),
        Err(e) => CheckResult::Fail(e.to_string()),
    }
}

async fn check_chain_rpc(rpc: &ChainRpcConfig, profile: &ChainProfile) -> CheckResult {
    if !rpc.endpoints.contains_key(&profile.chain_id) {
        return CheckResult::Skip(format!("set {} to enable", profile.rpc_endpoint_key));
    }

    let connector = match RpcConnector::new(ChainRpcConfig {
        request_timeout: PROBE_TIMEOUT,
        ..rpc.clone()
    }) {
        Ok(connector) => connector,
        Err(e) => return CheckResult::Fail(e.public_reason()),
    };
    let client = match connector.connect(profile) {
        Ok(client) => client,
        Err(e) => return CheckResult::Fail(e.public_reason()),
    };

    compare_chain_id(profile.chain_id, probe_chain_id(client.as_ref()).await)
}

async fn check_ens_rpc(settings: &Settings) -> CheckResult {
    let identity = match IdentityConfig::resolve(settings) {
        Ok(identity) => identity,
        Err(e) => return CheckResult::Fail(e.to_string()),
    };
    let http = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(http) => http,
        Err(e) => return CheckResult::Fail(format!("HTTP client init failed: {e}")),
    };
    let client: Arc<dyn ChainClient> = Arc::new(RpcClient::new(
        http,
        identity.rpc_url,
        "Ethereum",
        Duration::from_secs(1),
    ));

    compare_chain_id(ETHEREUM_MAINNET_ID, probe_chain_id(client.as_ref()).await)
}

async fn probe_chain_id(client: &dyn ChainClient) -> Result<u64, String> {
    match tokio::time::timeout(PROBE_TIMEOUT, client.chain_id()).await {
        Ok(Ok(chain_id)) => Ok(chain_id),
        Ok(Err(e)) => Err(e.public_reason()),
        Err(_) => Err(format!("no response within {}s", PROBE_TIMEOUT.as_secs())),
    }
}

fn compare_chain_id(expected: u64, reported: Result<u64, String>) -> CheckResult {
    match reported {
        Ok(chain_id) if chain_id == expected => {
            CheckResult::Pass(format!("reachable, chain id {chain_id}"))
        }
        Ok(chain_id) => CheckResult::Fail(format!(
            "endpoint reports chain id {chain_id}, expected {expected}; check the configured URL"
        )),
        Err(reason) => CheckResult::Fail(format!("unreachable: {reason}")),
    }
}

#[cfg(test)]
fn format_result(result: &CheckResult) -> String {
    match result {
        CheckResult::Pass(s) => format!("Pass({s})"),
        CheckResult::Fail(s) => format!("Fail({s})"),
        CheckResult::Skip(s) => format!("Skip({s})"),
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::doctor::*;
    use crate::registry::CapabilityRegistry;

    #[test]
    fn matching_chain_id_passes() {
        match compare_chain_id(84532, Ok(84532)) {
            CheckResult::Pass(detail) => assert!(detail.contains("84532")),
            other => panic!("expected Pass, got: {}", format_result(&other)),
        }
    }

    #[test]
    fn mismatched_chain_id_fails() {
        match compare_chain_id(84532, Ok(8453)) {
            CheckResult::Fail(detail) => {
                assert!(detail.contains("8453"));
                assert!(detail.contains("expected 84532"));
            }
            other => panic!("expected Fail, got: {}", format_result(&other)),
        }
    }

    #[test]
    fn unreachable_endpoint_fails() {
        match compare_chain_id(1, Err("connection refused".into())) {
            CheckResult::Fail(detail) => assert!(detail.contains("connection refused")),
            other => panic!("expected Fail, got: {}", format_result(&other)),
        }
    }

    #[tokio::test]
    async fn chain_without_endpoint_is_skipped() {
        let registry = CapabilityRegistry::builtin().unwrap();
        let profile = registry.resolve_chain("base").unwrap();

        match check_chain_rpc(&ChainRpcConfig::default(), profile).await {
            CheckResult::Skip(reason) => assert!(reason.contains("BASE_RPC_URL")),
            other => panic!("expected Skip, got: {}", format_result(&other)),
        }
    }
}
