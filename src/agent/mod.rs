//! Core agent: intent parsing, validation, dispatch and reporting.

pub mod balance;
mod commands;
pub mod dispatcher;
pub mod intent;
pub mod reporter;
pub mod router;
pub mod strategies;
pub mod validator;

use std::sync::Arc;

use futures::StreamExt;

use crate::chain::account::FundingAccount;
use crate::channels::{Channel, StatusUpdate};
use crate::error::Error;
use crate::llm::{IntentExtractor, KnowledgeBase};
use crate::registry::CapabilityRegistry;

pub use balance::BalanceSnapshot;
pub use dispatcher::ChainDispatcher;
pub use intent::{Action, Intent, IntentInput};
pub use reporter::ExecutionResult;
pub use router::{MessageIntent, Router};
pub use validator::{IntentValidator, ValidatedIntent};

/// Collaborators the agent needs to handle commands.
pub struct AgentDeps {
    pub registry: Arc<CapabilityRegistry>,
    pub extractor: Arc<dyn IntentExtractor>,
    pub knowledge: Arc<dyn KnowledgeBase>,
    pub validator: IntentValidator,
    pub dispatcher: ChainDispatcher,
    pub funding: FundingAccount,
}

/// Conversational trading agent.
///
/// Each message is handled to completion before the next one is read.
pub struct Agent {
    router: Router,
    deps: AgentDeps,
}

impl Agent {
    pub fn new(deps: AgentDeps) -> Self {
        Self {
            router: Router::new(),
            deps,
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.deps.registry
    }

    pub fn funding(&self) -> &FundingAccount {
        &self.deps.funding
    }

    /// Read messages from the channel until it closes, replying to each.
    pub async fn run(&self, channel: Arc<dyn Channel>) -> Result<(), Error> {
        let mut stream = channel.start().await?;
        tracing::info!(channel = channel.name(), "Agent started");

        while let Some(message) = stream.next().await {
            let preview: String = message.content.chars().take(60).collect();
            if let Err(e) = channel
                .send_status(StatusUpdate::Thinking(format!("Processing {preview}")))
                .await
            {
                tracing::debug!("Status update failed: {}", e);
            }

            let replies = self.process_message(&message, Some(channel.as_ref())).await;
            for reply in replies {
                if let Err(e) = channel.respond(&message, reply).await {
                    tracing::warn!(channel = channel.name(), "Failed to deliver reply: {}", e);
                }
            }
        }

        tracing::info!(channel = channel.name(), "Channel closed, shutting down");
        channel.shutdown().await?;
        Ok(())
    }
}
