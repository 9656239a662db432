//! Message routing to command handlers.
//!
//! Only explicit commands (starting with `/`) are routed. Free text gets the
//! help reply.

use crate::agent::Action;
use crate::channels::IncomingMessage;

/// What a command asks the agent to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageIntent {
    /// A verb that fixes the action: `/transfer`, `/swap`, `/wrap`, `/ask`,
    /// `/receive`, `/help`.
    Action { action: Action, payload: String },
    /// `/transaction`: the action is taken from extraction.
    Transaction { prompt: String },
    /// Unrecognized command word.
    Unknown { command: String },
}

/// Routes messages to handlers based on explicit commands.
pub struct Router {
    /// Command prefix (e.g., "/" or "!")
    command_prefix: String,
}

impl Router {
    pub fn new() -> Self {
        Self {
            command_prefix: "/".to_string(),
        }
    }

    /// Set the command prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    pub fn is_command(&self, message: &IncomingMessage) -> bool {
        message.content.trim().starts_with(&self.command_prefix)
    }

    /// Route an explicit command.
    ///
    /// Returns `None` if the message is not a command.
    pub fn route_command(&self, message: &IncomingMessage) -> Option<MessageIntent> {
        let content = message.content.trim();

        if content.starts_with(&self.command_prefix) {
            Some(self.parse_command(content))
        } else {
            None
        }
    }

    fn parse_command(&self, content: &str) -> MessageIntent {
        let without_prefix = content
            .strip_prefix(&self.command_prefix)
            .unwrap_or(content)
            .trim_start();
        let (verb, payload) = match without_prefix.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim().to_string()),
            None => (without_prefix, String::new()),
        };
        let verb = verb.to_lowercase();

        if verb == "transaction" {
            return MessageIntent::Transaction { prompt: payload };
        }
        match Action::parse(&verb) {
            Some(action) => MessageIntent::Action { action, payload },
            None => MessageIntent::Unknown { command: verb },
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
