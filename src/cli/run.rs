//! `onchain-agent run` - wire the agent and serve the REPL.

use std::path::Path;
use std::sync::Arc;

use crate::agent::{Agent, AgentDeps, ChainDispatcher, IntentValidator};
use crate::chain::rpc::{RpcClient, RpcConnector};
use crate::chain::{ChainClient, ChainConnector};
use crate::channels::{Channel, ReplChannel};
use crate::config::Config;
use crate::identity::IdentityResolver;
use crate::identity::ens::EnsResolver;
use crate::llm::BrianClient;

pub async fn run_agent(toml_path: Option<&Path>, message: Option<String>) -> anyhow::Result<()> {
    let config = Config::from_env_with_toml(toml_path)?;

    let registry = Arc::new(config.chains.load_registry()?);
    let rpc = config.chains.rpc_config(&registry)?;
    tracing::info!(
        chains = registry.profiles().len(),
        endpoints = rpc.endpoints.len(),
        "Capability registry loaded"
    );
    let connector: Arc<dyn ChainConnector> = Arc::new(RpcConnector::new(rpc)?);

    let ens_http = reqwest::Client::builder()
        .timeout(config.chains.request_timeout)
        .build()?;
    let ens_client: Arc<dyn ChainClient> = Arc::new(RpcClient::new(
        ens_http,
        config.identity.rpc_url.clone(),
        "Ethereum",
        config.chains.receipt_poll_interval,
    ));
    let resolver: Arc<dyn IdentityResolver> =
        Arc::new(EnsResolver::new(ens_client, config.identity.registry));

    let brian = Arc::new(BrianClient::new(config.extractor.clone())?);
    let funding = config.funding.account()?;
    tracing::info!(
        account = %funding.address(),
        kind = funding.kind.as_str(),
        "Funding account ready"
    );

    let agent = Agent::new(AgentDeps {
        validator: IntentValidator::new(
            Arc::clone(&registry),
            resolver,
            Arc::clone(&connector),
            funding.clone(),
        ),
        dispatcher: ChainDispatcher::new(connector),
        extractor: brian.clone(),
        knowledge: brian,
        registry,
        funding,
    });

    let channel: Arc<dyn Channel> = match message {
        Some(message) => Arc::new(ReplChannel::with_message(&config.repl, message)),
        None => Arc::new(ReplChannel::new(&config.repl)),
    };
    agent.run(channel).await?;
    Ok(())
}
