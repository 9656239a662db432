//! Recipient identity resolution.
//!
//! A recipient reference is either a hex address or a name. Names are
//! normalized into the name-service namespace (`bob` becomes `bob.eth`) and
//! handed to an [`IdentityResolver`].

pub mod ens;

use std::str::FromStr;

use alloy_primitives::Address;
use async_trait::async_trait;

use crate::error::{ChainError, IntentError};

pub use ens::EnsResolver;

/// Suffix of the name-service namespace.
pub const NAME_SUFFIX: &str = ".eth";

/// Looks up the address registered for a canonical name.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` means the name has no address record.
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ChainError>;
}

/// Canonical lookup key for a recipient reference.
///
/// Hex references and names already in the namespace pass through unchanged.
pub fn normalize(reference: &str) -> String {
    let trimmed = reference.trim();
    if trimmed.starts_with("0x") || trimmed.to_ascii_lowercase().ends_with(NAME_SUFFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{NAME_SUFFIX}")
    }
}

/// Resolve a recipient reference to an address.
///
/// Hex references are parsed locally and never reach the resolver.
pub async fn resolve_recipient(
    resolver: &dyn IdentityResolver,
    reference: &str,
) -> Result<Address, IntentError> {
    let unresolved = || IntentError::UnresolvedRecipient {
        reference: reference.trim().to_string(),
    };
    if reference.trim().is_empty() {
        return Err(unresolved());
    }

    let canonical = normalize(reference);
    if canonical.starts_with("0x") {
        return Address::from_str(&canonical).map_err(|_| unresolved());
    }

    match resolver.resolve_name(&canonical).await {
        Ok(Some(address)) if address != Address::ZERO => {
            tracing::debug!(name = %canonical, %address, "Resolved recipient name");
            Ok(address)
        }
        Ok(_) => {
            tracing::info!(name = %canonical, "Recipient name has no address record");
            Err(unresolved())
        }
        Err(e) => {
            tracing::warn!(name = %canonical, "Recipient lookup failed: {}", e);
            Err(unresolved())
        }
    }
}
