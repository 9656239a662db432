//! Error types for the onchain agent.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::agent::Action;

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Intent error: {0}")]
    Intent(#[from] IntentError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Failure taxonomy reported back to the conversation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ExtractionFailed,
    UnsupportedChain,
    UnsupportedActionForChain,
    UnsupportedToken,
    UnresolvedRecipient,
    InsufficientFunds,
    InvalidAmount,
    ZeroQuote,
    ExecutionFailed,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractionFailed => "extraction_failed",
            Self::UnsupportedChain => "unsupported_chain",
            Self::UnsupportedActionForChain => "unsupported_action_for_chain",
            Self::UnsupportedToken => "unsupported_token",
            Self::UnresolvedRecipient => "unresolved_recipient",
            Self::InsufficientFunds => "insufficient_funds",
            Self::InvalidAmount => "invalid_amount",
            Self::ZeroQuote => "zero_quote",
            Self::ExecutionFailed => "execution_failed",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability registry load/integrity errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to parse chain registry: {0}")]
    Parse(String),

    #[error("Chain alias '{alias}' is claimed by both {first} and {second}")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Invalid chain profile {chain}: {reason}")]
    InvalidProfile { chain: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Channel {name} disconnected: {reason}")]
    Disconnected { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// Chain client errors (RPC transport, node errors, reverted transactions).
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC {method} failed with code {code}: {message}")]
    Rpc {
        method: &'static str,
        code: i64,
        message: String,
    },

    #[error("Invalid response from {method}: {reason}")]
    InvalidResponse { method: &'static str, reason: String },

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Failed to decode contract return data: {0}")]
    Decode(String),

    #[error("No RPC endpoint configured for {chain} (set {key})")]
    MissingEndpoint { chain: String, key: String },
}

impl ChainError {
    /// Reason that is safe to show in a chat reply.
    ///
    /// Transport errors can carry endpoint URLs with embedded API keys, so
    /// they collapse into a generic sentence.
    pub fn public_reason(&self) -> String {
        match self {
            Self::Http(_) => "the RPC endpoint could not be reached".to_string(),
            Self::Rpc { message, .. } => message.clone(),
            Self::InvalidResponse { .. } | Self::Decode(_) => {
                "the RPC endpoint returned an unexpected response".to_string()
            }
            Self::Reverted { tx_hash } => format!("transaction {tx_hash} reverted"),
            Self::MissingEndpoint { chain, .. } => {
                format!("no RPC endpoint is configured for {chain}")
            }
        }
    }
}

/// Natural-language extraction service errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("I was unable to process your request")]
    NoCompletion,

    #[error("Extractor request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Extractor authentication failed")]
    AuthFailed,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ExtractionFailed
    }

    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::NoCompletion => Some(self.to_string()),
            Self::AuthFailed | Self::RequestFailed { .. } | Self::Http(_) => {
                Some("I was unable to process your request".to_string())
            }
        }
    }
}

/// Amount parsing and unit conversion errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("'{0}' is not a decimal number")]
    Malformed(String),

    #[error("amount must be greater than zero")]
    NotPositive,

    #[error("{symbol} supports at most {decimals} decimal places")]
    TooPrecise { symbol: String, decimals: u8 },

    #[error("amount is too large")]
    Overflow,
}

/// Intent construction and validation failures.
///
/// Every message is a complete sentence fit for a chat reply.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("Your prompt is missing required fields: {}.", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("I don't know how to '{action}'. Supported actions: transfer, swap, wrap.")]
    UnknownAction { action: String },

    #[error("The amount '{amount}' is not valid: {source}.")]
    InvalidAmount {
        amount: String,
        #[source]
        source: AmountError,
    },

    #[error("The chain '{chain}' is not supported. Supported chains: {}.", .supported.join(", "))]
    UnsupportedChain {
        chain: String,
        supported: Vec<String>,
    },

    #[error("{}", unsupported_action_message(.action, .chain, .chain_actions, .chains_for_action))]
    UnsupportedActionForChain {
        action: Action,
        chain: String,
        chain_actions: Vec<Action>,
        chains_for_action: Vec<String>,
    },

    #[error("{}", unsupported_token_message(.token, .chain, .supported, .reason.as_deref()))]
    UnsupportedToken {
        token: String,
        chain: String,
        supported: Vec<String>,
        reason: Option<String>,
    },

    #[error("I could not resolve the recipient '{reference}' to an address.")]
    UnresolvedRecipient { reference: String },

    #[error(
        "Insufficient {token} balance on {chain}: the funding account holds {have} {token} but this needs more than {need} {token} to leave room for fees."
    )]
    InsufficientFunds {
        token: String,
        chain: String,
        have: Decimal,
        need: Decimal,
    },

    #[error("Could not read the funding balance on {chain}: {}.", .source.public_reason())]
    BalanceUnavailable {
        chain: String,
        #[source]
        source: ChainError,
    },
}

fn unsupported_action_message(
    action: &Action,
    chain: &str,
    chain_actions: &[Action],
    chains_for_action: &[String],
) -> String {
    let mut message = format!("{} is not supported on {}.", action.label(), chain);
    if chain_actions.is_empty() {
        message.push_str(&format!(" {chain} has no supported actions."));
    } else {
        let actions: Vec<&str> = chain_actions.iter().map(|a| a.as_str()).collect();
        message.push_str(&format!(" {} supports: {}.", chain, actions.join(", ")));
    }
    if !chains_for_action.is_empty() {
        message.push_str(&format!(
            " {} is available on: {}.",
            action.label(),
            chains_for_action.join(", ")
        ));
    }
    message
}

fn unsupported_token_message(
    token: &str,
    chain: &str,
    supported: &[String],
    reason: Option<&str>,
) -> String {
    let mut message = format!("The token '{token}' is not supported on {chain}");
    match reason {
        Some(reason) => message.push_str(&format!(": {reason}.")),
        None => message.push('.'),
    }
    if !supported.is_empty() {
        message.push_str(&format!(" Supported tokens: {}.", supported.join(", ")));
    }
    message
}

impl IntentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingFields { .. } | Self::UnknownAction { .. } => ErrorKind::ExtractionFailed,
            Self::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            Self::UnsupportedChain { .. } => ErrorKind::UnsupportedChain,
            Self::UnsupportedActionForChain { .. } => ErrorKind::UnsupportedActionForChain,
            Self::UnsupportedToken { .. } => ErrorKind::UnsupportedToken,
            Self::UnresolvedRecipient { .. } => ErrorKind::UnresolvedRecipient,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::BalanceUnavailable { .. } => ErrorKind::ExecutionFailed,
        }
    }

    pub fn user_message(&self) -> Option<String> {
        Some(self.to_string())
    }
}

/// Execution strategy failures.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("The quote for swapping {token_in} to {token_out} returned zero; the pool may be empty.")]
    ZeroQuote { token_in: String, token_out: String },

    #[error("No {token_in}/{token_out} pool with fee tier {fee} exists on {chain}.")]
    PoolNotFound {
        token_in: String,
        token_out: String,
        fee: u32,
        chain: String,
    },

    #[error("The {step} transaction failed: {}.", .cause.public_reason())]
    Failed {
        step: &'static str,
        #[source]
        cause: ChainError,
    },

    #[error("Could not reach {chain}: {}.", .cause.public_reason())]
    Unavailable {
        chain: String,
        #[source]
        cause: ChainError,
    },

    #[error("{reason}")]
    Unsupported { reason: String },
}

impl ExecutionError {
    pub fn failed(step: &'static str) -> impl FnOnce(ChainError) -> Self {
        move |cause| Self::Failed { step, cause }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroQuote { .. } => ErrorKind::ZeroQuote,
            Self::PoolNotFound { .. }
            | Self::Failed { .. }
            | Self::Unavailable { .. }
            | Self::Unsupported { .. } => ErrorKind::ExecutionFailed,
        }
    }

    pub fn user_message(&self) -> Option<String> {
        Some(self.to_string())
    }
}

/// Registry-integrity failures in the dispatcher. These are programmer
/// errors, not user errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("No execution strategy registered for action {action}")]
    NoStrategy { action: Action },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoStrategy { .. } => ErrorKind::UnknownError,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Extraction(e) => e.kind(),
            Self::Intent(e) => e.kind(),
            Self::Execution(e) => e.kind(),
            Self::Dispatch(e) => e.kind(),
            Self::Config(_) | Self::Registry(_) | Self::Channel(_) | Self::Chain(_) => {
                ErrorKind::UnknownError
            }
        }
    }

    /// Message safe to display to the end user, if any.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Extraction(e) => e.user_message(),
            Self::Intent(e) => e.user_message(),
            Self::Execution(e) => e.user_message(),
            Self::Config(_)
            | Self::Registry(_)
            | Self::Channel(_)
            | Self::Chain(_)
            | Self::Dispatch(_) => None,
        }
    }
}
