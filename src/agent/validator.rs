//! Ordered, short-circuiting validation of parsed intents.
//!
//! Steps run in a fixed order: chain, action, tokens and amount, recipient,
//! balance. The first failing step decides the error, so later steps never
//! touch the network for an intent that fails early.

use std::sync::Arc;

use alloy_primitives::{Address, U256};

use crate::agent::balance::{self, BalanceSnapshot};
use crate::agent::{Action, Intent};
use crate::chain::{Account, ChainConnector, FundingAccount, units};
use crate::error::IntentError;
use crate::identity::{self, IdentityResolver};
use crate::registry::{CapabilityRegistry, ChainProfile, TokenSpec};

/// An intent that passed every validation step.
///
/// Only [`IntentValidator::validate`] can build one, and the dispatcher
/// consumes it by value.
#[derive(Debug, Clone)]
pub struct ValidatedIntent {
    intent: Intent,
    profile: ChainProfile,
    account: Account,
    recipient: Address,
    source: TokenSpec,
    target: Option<TokenSpec>,
    amount_units: U256,
    balance: BalanceSnapshot,
}

impl ValidatedIntent {
    pub fn intent(&self) -> &Intent {
        &self.intent
    }

    pub fn action(&self) -> Action {
        self.intent.action
    }

    pub fn profile(&self) -> &ChainProfile {
        &self.profile
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Resolved recipient. For wraps and undelivered swaps this is the
    /// funding account itself.
    pub fn recipient(&self) -> Address {
        self.recipient
    }

    pub fn source_token(&self) -> &TokenSpec {
        &self.source
    }

    pub fn target_token(&self) -> Option<&TokenSpec> {
        self.target.as_ref()
    }

    /// Amount in the source token's base units.
    pub fn amount_units(&self) -> U256 {
        self.amount_units
    }

    pub fn balance(&self) -> &BalanceSnapshot {
        &self.balance
    }
}

/// Composes the registry, identity resolver and balance check into one gate.
pub struct IntentValidator {
    registry: Arc<CapabilityRegistry>,
    resolver: Arc<dyn IdentityResolver>,
    connector: Arc<dyn ChainConnector>,
    funding: FundingAccount,
}

struct TokenSelection {
    source: TokenSpec,
    target: Option<TokenSpec>,
}

impl IntentValidator {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        resolver: Arc<dyn IdentityResolver>,
        connector: Arc<dyn ChainConnector>,
        funding: FundingAccount,
    ) -> Self {
        Self {
            registry,
            resolver,
            connector,
            funding,
        }
    }

    pub async fn validate(&self, intent: &Intent) -> Result<ValidatedIntent, IntentError> {
        let result = self.run(intent).await;
        match &result {
            Ok(validated) => tracing::info!(
                intent_id = %intent.intent_id,
                action = %intent.action,
                chain = %validated.profile.canonical_name,
                recipient = %validated.recipient,
                "Intent validated"
            ),
            Err(e) => tracing::warn!(
                intent_id = %intent.intent_id,
                action = %intent.action,
                chain = %intent.chain,
                kind = %e.kind(),
                "Intent rejected: {}",
                e
            ),
        }
        result
    }

    async fn run(&self, intent: &Intent) -> Result<ValidatedIntent, IntentError> {
        let profile = self.registry.resolve_chain(&intent.chain)?;

        if !self.registry.is_action_supported(profile, intent.action) {
            return Err(self.unsupported_action(profile, intent.action));
        }

        let tokens = self.select_tokens(profile, intent)?;
        let amount_units =
            units::to_base_units(&intent.amount, tokens.source.decimals, &tokens.source.symbol)
                .map_err(|source| IntentError::InvalidAmount {
                    amount: intent.amount.clone(),
                    source,
                })?;

        let account = self.funding.for_chain(profile.chain_id);
        let recipient = self.resolve_recipient(intent, &account).await?;

        let client = self
            .connector
            .connect(profile)
            .map_err(|source| IntentError::BalanceUnavailable {
                chain: profile.canonical_name.clone(),
                source,
            })?;
        let balance = balance::check_sufficient(
            client.as_ref(),
            profile,
            &account,
            &tokens.source,
            &intent.amount,
        )
        .await?;

        Ok(ValidatedIntent {
            intent: intent.clone(),
            profile: profile.clone(),
            account,
            recipient,
            source: tokens.source,
            target: tokens.target,
            amount_units,
            balance,
        })
    }

    fn unsupported_action(&self, profile: &ChainProfile, action: Action) -> IntentError {
        IntentError::UnsupportedActionForChain {
            action,
            chain: profile.canonical_name.clone(),
            chain_actions: profile.supported_actions.iter().copied().collect(),
            chains_for_action: self.registry.chains_supporting(action),
        }
    }

    fn select_tokens(
        &self,
        profile: &ChainProfile,
        intent: &Intent,
    ) -> Result<TokenSelection, IntentError> {
        match intent.action {
            Action::Transfer => {
                let symbol = intent
                    .source_token
                    .as_deref()
                    .ok_or(IntentError::MissingFields {
                        fields: vec!["token1"],
                    })?;
                Ok(TokenSelection {
                    source: lookup_token(profile, symbol)?.clone(),
                    target: None,
                })
            }
            Action::Wrap => {
                let symbol = intent
                    .source_token
                    .as_deref()
                    .unwrap_or(&profile.native_symbol);
                let source = lookup_token(profile, symbol)?;
                if !source.is_native() {
                    return Err(token_error(
                        profile,
                        symbol,
                        format!("only the native asset {} can be wrapped", profile.native_symbol),
                    ));
                }
                let target = profile.wrapped_native_token().ok_or_else(|| {
                    token_error(profile, symbol, "no wrapped native token is configured".to_string())
                })?;
                Ok(TokenSelection {
                    source: source.clone(),
                    target: Some(target.clone()),
                })
            }
            Action::Swap => {
                if profile.swap_venue.is_none() {
                    return Err(self.unsupported_action(profile, Action::Swap));
                }
                let (Some(source_symbol), Some(target_symbol)) =
                    (intent.source_token.as_deref(), intent.target_token.as_deref())
                else {
                    let mut fields = Vec::new();
                    if intent.source_token.is_none() {
                        fields.push("token1");
                    }
                    if intent.target_token.is_none() {
                        fields.push("token2");
                    }
                    return Err(IntentError::MissingFields { fields });
                };
                let source = swap_token(profile, source_symbol)?;
                let target = swap_token(profile, target_symbol)?;
                if source.symbol == target.symbol {
                    return Err(token_error(
                        profile,
                        target_symbol,
                        "a token cannot be swapped for itself".to_string(),
                    ));
                }
                Ok(TokenSelection {
                    source: source.clone(),
                    target: Some(target.clone()),
                })
            }
            Action::Ask | Action::Receive | Action::Help => {
                Err(self.unsupported_action(profile, intent.action))
            }
        }
    }

    async fn resolve_recipient(
        &self,
        intent: &Intent,
        account: &Account,
    ) -> Result<Address, IntentError> {
        match (intent.action, intent.recipient_ref.as_deref()) {
            (Action::Transfer, Some(reference)) | (Action::Swap, Some(reference)) => {
                identity::resolve_recipient(self.resolver.as_ref(), reference).await
            }
            (Action::Transfer, None) => Err(IntentError::MissingFields {
                fields: vec!["address"],
            }),
            _ => Ok(account.address),
        }
    }
}

fn lookup_token<'a>(profile: &'a ChainProfile, symbol: &str) -> Result<&'a TokenSpec, IntentError> {
    profile.token(symbol).ok_or_else(|| IntentError::UnsupportedToken {
        token: symbol.trim().to_string(),
        chain: profile.canonical_name.clone(),
        supported: profile.token_symbols(),
        reason: None,
    })
}

/// Token for one swap leg. The native asset trades as its wrapped token.
fn swap_token<'a>(profile: &'a ChainProfile, symbol: &str) -> Result<&'a TokenSpec, IntentError> {
    let token = lookup_token(profile, symbol)?;
    if !token.is_native() {
        return Ok(token);
    }
    profile
        .wrapped_native_token()
        .ok_or_else(|| IntentError::UnsupportedToken {
            token: symbol.trim().to_string(),
            chain: profile.canonical_name.clone(),
            supported: profile
                .tokens
                .values()
                .filter(|token| !token.is_native())
                .map(|token| token.symbol.clone())
                .collect(),
            reason: Some("swaps use ERC-20 tokens".to_string()),
        })
}

fn token_error(profile: &ChainProfile, symbol: &str, reason: String) -> IntentError {
    IntentError::UnsupportedToken {
        token: symbol.trim().to_string(),
        chain: profile.canonical_name.clone(),
        supported: profile.token_symbols(),
        reason: Some(reason),
    }
}
