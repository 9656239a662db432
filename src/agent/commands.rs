//! Command handlers for the agent.
//!
//! Turns each routed command into reply lines. User errors become replies
//! here; nothing below this layer talks to the channel.

use std::cmp::max;

use crate::agent::reporter::{self, ExecutionResult, GENERIC_FAILURE};
use crate::agent::{Action, Agent, Intent, MessageIntent};
use crate::channels::{Channel, IncomingMessage, OutgoingResponse, StatusUpdate};
use crate::error::ErrorKind;

const COMMAND_SUGGESTIONS: &[&str] = &[
    "help",
    "transfer",
    "swap",
    "wrap",
    "transaction",
    "receive",
    "ask",
];

const EMPTY_QUERY_REPLY: &str = "Please provide a valid query.";
const NO_ANSWER_REPLY: &str = "I don't know the answer to that question.";
const ASK_FAILED_REPLY: &str = "An error occurred while processing your request.";
const EMPTY_PROMPT_REPLY: &str = "Please provide a valid prompt.";

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, a_ch) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, b_ch) in b_chars.iter().enumerate() {
            let cost = usize::from(a_ch != b_ch);
            curr[j + 1] = (curr[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

fn command_suggestions(command: &str) -> Vec<&'static str> {
    let normalized = command.trim().trim_start_matches('/').to_lowercase();
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(&'static str, usize)> = COMMAND_SUGGESTIONS
        .iter()
        .map(|candidate| (*candidate, levenshtein_distance(&normalized, candidate)))
        .collect();
    ranked.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let threshold = if normalized.len() <= 4 {
        1
    } else if normalized.len() <= 8 {
        2
    } else {
        max(3, normalized.len() / 3)
    };

    ranked
        .into_iter()
        .filter(|(candidate, distance)| {
            *distance <= threshold
                || candidate.starts_with(&normalized)
                || normalized.starts_with(*candidate)
        })
        .take(3)
        .map(|(candidate, _)| candidate)
        .collect()
}

fn unknown_command_message(command: &str) -> String {
    let suggestions = command_suggestions(command);
    if suggestions.is_empty() {
        return format!("Unknown command: /{}. Try /help", command);
    }

    if suggestions.len() == 1 {
        return format!(
            "Unknown command: /{}. Did you mean /{}? Try /help",
            command, suggestions[0]
        );
    }

    let formatted = suggestions
        .iter()
        .map(|suggestion| format!("/{}", suggestion))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Unknown command: /{}. Did you mean one of: {}? Try /help",
        command, formatted
    )
}

fn failure_reply(kind: ErrorKind, message: Option<String>) -> String {
    reporter::format(&ExecutionResult::failure(kind, message))
}

async fn report_stage(status: Option<&dyn Channel>, stage: &str, success: bool) {
    if let Some(channel) = status
        && let Err(e) = channel
            .send_status(StatusUpdate::StageCompleted {
                stage: stage.to_string(),
                success,
            })
            .await
    {
        tracing::debug!("Status update failed: {}", e);
    }
}

impl Agent {
    /// Handle one incoming message and return the replies, in order.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Vec<OutgoingResponse> {
        self.process_message(message, None).await
    }

    /// Like [`Agent::handle_message`], reporting pipeline stages to `status`.
    pub(super) async fn process_message(
        &self,
        message: &IncomingMessage,
        status: Option<&dyn Channel>,
    ) -> Vec<OutgoingResponse> {
        let replies = match self.router.route_command(message) {
            Some(routed) => self.handle_command(routed, status).await,
            None => vec![self.help_message()],
        };
        replies.into_iter().map(OutgoingResponse::text).collect()
    }

    async fn handle_command(
        &self,
        routed: MessageIntent,
        status: Option<&dyn Channel>,
    ) -> Vec<String> {
        match routed {
            MessageIntent::Transaction { prompt } => {
                self.handle_transaction(&prompt, None, status).await
            }
            MessageIntent::Action { action, payload } => match action {
                Action::Transfer | Action::Swap | Action::Wrap => {
                    self.handle_transaction(&payload, Some(action), status).await
                }
                Action::Ask => vec![self.handle_ask(&payload).await],
                Action::Receive => vec![self.receive_message()],
                Action::Help => vec![self.help_message()],
            },
            MessageIntent::Unknown { command } => {
                tracing::debug!(%command, "Unknown command");
                vec![unknown_command_message(&command)]
            }
        }
    }

    async fn handle_transaction(
        &self,
        prompt: &str,
        command_action: Option<Action>,
        status: Option<&dyn Channel>,
    ) -> Vec<String> {
        if prompt.trim().is_empty() {
            return vec![EMPTY_PROMPT_REPLY.to_string()];
        }

        let input = match self.deps.extractor.extract(prompt).await {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!("Parameter extraction failed: {}", e);
                report_stage(status, "extract", false).await;
                return vec![failure_reply(e.kind(), e.user_message())];
            }
        };
        report_stage(status, "extract", true).await;

        let intent = match Intent::from_input(input, command_action) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::info!(kind = %e.kind(), "Extracted parameters rejected: {}", e);
                report_stage(status, "validate", false).await;
                return vec![failure_reply(e.kind(), e.user_message())];
            }
        };

        let validated = match self.deps.validator.validate(&intent).await {
            Ok(validated) => validated,
            Err(e) => {
                report_stage(status, "validate", false).await;
                return vec![failure_reply(e.kind(), e.user_message())];
            }
        };
        report_stage(status, "validate", true).await;

        match self.deps.dispatcher.dispatch(validated).await {
            Ok(results) => {
                let success = results.iter().all(ExecutionResult::is_success);
                report_stage(status, "execute", success).await;
                results.iter().map(reporter::format).collect()
            }
            Err(e) => {
                tracing::error!(
                    intent_id = %intent.intent_id,
                    kind = %e.kind(),
                    "Dispatch rejected a validated intent: {}",
                    e
                );
                report_stage(status, "execute", false).await;
                vec![GENERIC_FAILURE.to_string()]
            }
        }
    }

    async fn handle_ask(&self, query: &str) -> String {
        if query.trim().is_empty() {
            return EMPTY_QUERY_REPLY.to_string();
        }

        match self.deps.knowledge.ask(query).await {
            Ok(Some(answer)) => answer,
            Ok(None) => NO_ANSWER_REPLY.to_string(),
            Err(e) => {
                tracing::warn!("Knowledge query failed: {}", e);
                ASK_FAILED_REPLY.to_string()
            }
        }
    }

    fn receive_message(&self) -> String {
        format!(
            "Send your money to the account {}",
            self.deps.funding.address()
        )
    }

    fn help_message(&self) -> String {
        let chains = self.deps.registry.supported_chain_names().join(", ");
        format!(
            concat!(
                "Hello! Here are the commands you can use:\n",
                "\n",
                "1. **/ask**: Ask me any question and I will provide an answer.\n",
                "   - Example: `/ask What is the blockchain?`\n",
                "\n",
                "2. **/receive**: Get the address that funds your transactions.\n",
                "   - Example: `/receive`\n",
                "\n",
                "3. **/transfer**: Send a token to an address or ENS name.\n",
                "   - Example: `/transfer 0.01 ETH to vitalik.eth on Base Sepolia`\n",
                "\n",
                "4. **/swap**: Swap one token for another.\n",
                "   - Example: `/swap 0.01 WETH for USDC on Sepolia`\n",
                "\n",
                "5. **/wrap**: Wrap the native token.\n",
                "   - Example: `/wrap 0.01 ETH on Sepolia`\n",
                "\n",
                "6. **/transaction**: Describe any of the above in plain words.\n",
                "   - Example: `/transaction Transfer 0.000002 ETH to ",
                "0x20c6F9006d563240031A1388f4f25726029a6368 on Base Sepolia`\n",
                "\n",
                "Supported chains: {}\n",
                "\n",
                "How can I assist you today?"
            ),
            chains
        )
    }
}
