//! Parsed user intents.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chain::units;
use crate::error::IntentError;

/// Closed set of conversational actions.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Transfer,
    Swap,
    Wrap,
    Ask,
    Receive,
    Help,
}

impl Action {
    pub const EXECUTABLE: [Action; 3] = [Action::Transfer, Action::Swap, Action::Wrap];

    /// Case-insensitive parse; unknown strings are rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "transfer" => Some(Self::Transfer),
            "swap" => Some(Self::Swap),
            "wrap" => Some(Self::Wrap),
            "ask" => Some(Self::Ask),
            "receive" => Some(Self::Receive),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Swap => "swap",
            Self::Wrap => "wrap",
            Self::Ask => "ask",
            Self::Receive => "receive",
            Self::Help => "help",
        }
    }

    /// Capitalized form for the start of a sentence.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transfer => "Transfer",
            Self::Swap => "Swap",
            Self::Wrap => "Wrap",
            Self::Ask => "Ask",
            Self::Receive => "Receive",
            Self::Help => "Help",
        }
    }

    /// Whether the action produces an on-chain transaction.
    pub fn is_executable(&self) -> bool {
        matches!(self, Self::Transfer | Self::Swap | Self::Wrap)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw fields produced by the natural-language extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntentInput {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub token1: Option<String>,
    #[serde(default)]
    pub token2: Option<String>,
    #[serde(default)]
    pub chain: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

/// A parsed user request. Never mutated after construction.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Intent {
    pub intent_id: Uuid,
    pub action: Action,
    pub source_token: Option<String>,
    pub target_token: Option<String>,
    pub chain: String,
    pub recipient_ref: Option<String>,
    pub amount: String,
}

impl Intent {
    /// Build an intent from extractor output.
    ///
    /// `command_action` is the action fixed by the command verb, if any; it
    /// takes precedence over the extracted action.
    pub fn from_input(
        input: IntentInput,
        command_action: Option<Action>,
    ) -> Result<Self, IntentError> {
        let IntentInput {
            action,
            token1,
            token2,
            chain,
            address,
            amount,
        } = input;
        let token1 = non_empty(token1);
        let token2 = non_empty(token2);
        let chain = non_empty(chain);
        let address = non_empty(address);
        let amount = non_empty(amount);

        let action = match (command_action, non_empty(action)) {
            (Some(action), _) => action,
            (None, Some(raw)) => Action::parse(&raw)
                .ok_or(IntentError::UnknownAction { action: raw })?,
            (None, None) => {
                return Err(IntentError::MissingFields {
                    fields: vec!["action"],
                });
            }
        };
        if !action.is_executable() {
            return Err(IntentError::UnknownAction {
                action: action.as_str().to_string(),
            });
        }

        let mut missing = Vec::new();
        let token1_required = !matches!(action, Action::Wrap);
        if token1_required && token1.is_none() {
            missing.push("token1");
        }
        if action == Action::Swap && token2.is_none() {
            missing.push("token2");
        }
        if chain.is_none() {
            missing.push("chain");
        }
        if action == Action::Transfer && address.is_none() {
            missing.push("address");
        }
        if amount.is_none() {
            missing.push("amount");
        }

        let (Some(chain), Some(amount)) = (chain, amount) else {
            return Err(IntentError::MissingFields { fields: missing });
        };
        if !missing.is_empty() {
            return Err(IntentError::MissingFields { fields: missing });
        }

        units::parse_amount(&amount).map_err(|source| IntentError::InvalidAmount {
            amount: amount.clone(),
            source,
        })?;

        Ok(Self {
            intent_id: Uuid::new_v4(),
            action,
            source_token: token1,
            target_token: if action == Action::Swap { token2 } else { None },
            chain,
            recipient_ref: address,
            amount,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
