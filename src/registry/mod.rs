//! Capability registry: which chains, tokens and actions the agent supports.
//!
//! The registry is pure data. It ships as an embedded TOML document and can
//! be replaced by a file named in settings. It is built once at startup and
//! shared read-only behind an `Arc`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use alloy_primitives::Address;
use serde::Deserialize;

use crate::agent::Action;
use crate::error::{IntentError, RegistryError};

const BUILTIN_REGISTRY: &str = include_str!("default_chains.toml");

/// Highest fee tier accepted for a swap venue (100% in hundredths of a bip).
const MAX_POOL_FEE: u32 = 1_000_000;

/// Where a token lives on a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAddress {
    Native,
    Contract(Address),
}

/// A token known to a chain profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpec {
    pub symbol: String,
    pub address: TokenAddress,
    pub decimals: u8,
}

impl TokenSpec {
    pub fn is_native(&self) -> bool {
        matches!(self.address, TokenAddress::Native)
    }

    pub fn contract(&self) -> Option<Address> {
        match self.address {
            TokenAddress::Native => None,
            TokenAddress::Contract(address) => Some(address),
        }
    }
}

/// Uniswap V3 style swap venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SwapVenue {
    pub factory: Address,
    pub quoter: Address,
    pub router: Address,
    pub pool_fee: u32,
}

/// Static descriptor of one supported chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainProfile {
    pub chain_id: u64,
    pub canonical_name: String,
    pub aliases: Vec<String>,
    pub explorer_base_url: String,
    pub rpc_endpoint_key: String,
    pub default_rpc_url: Option<String>,
    pub native_symbol: String,
    pub supported_actions: BTreeSet<Action>,
    /// Keyed by upper-case symbol.
    pub tokens: BTreeMap<String, TokenSpec>,
    pub wrapped_native: Option<String>,
    pub swap_venue: Option<SwapVenue>,
}

impl ChainProfile {
    pub fn supports_action(&self, action: Action) -> bool {
        self.supported_actions.contains(&action)
    }

    /// Case-insensitive token lookup.
    pub fn token(&self, symbol: &str) -> Option<&TokenSpec> {
        self.tokens.get(&symbol.trim().to_ascii_uppercase())
    }

    pub fn native_token(&self) -> Option<&TokenSpec> {
        self.token(&self.native_symbol)
    }

    pub fn wrapped_native_token(&self) -> Option<&TokenSpec> {
        self.wrapped_native.as_deref().and_then(|s| self.token(s))
    }

    pub fn token_symbols(&self) -> Vec<String> {
        self.tokens.values().map(|t| t.symbol.clone()).collect()
    }

    /// Explorer link for a transaction hash.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_base_url, tx_hash)
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    chains: Vec<ChainEntry>,
}

#[derive(Debug, Deserialize)]
struct ChainEntry {
    chain_id: u64,
    canonical_name: String,
    #[serde(default)]
    aliases: Vec<String>,
    explorer_base_url: String,
    rpc_endpoint_key: String,
    #[serde(default)]
    default_rpc_url: Option<String>,
    native_symbol: String,
    #[serde(default)]
    supported_actions: Vec<Action>,
    #[serde(default)]
    tokens: BTreeMap<String, TokenEntry>,
    #[serde(default)]
    wrapped_native: Option<String>,
    #[serde(default)]
    swap_venue: Option<SwapVenue>,
}

#[derive(Debug, Deserialize)]
struct TokenEntry {
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    native: bool,
    decimals: u8,
}

/// Lookup table of supported chains.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    profiles: Vec<ChainProfile>,
    /// Normalized alias (spaced and compact) -> index into `profiles`.
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    /// The registry shipped with the binary.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_toml_str(BUILTIN_REGISTRY)
    }

    /// Load a registry document from disk.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile =
            toml::from_str(content).map_err(|e| RegistryError::Parse(e.to_string()))?;
        let profiles = file
            .chains
            .into_iter()
            .map(build_profile)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_profiles(profiles)
    }

    /// Build the alias index, rejecting any name that maps to two chains.
    pub fn from_profiles(profiles: Vec<ChainProfile>) -> Result<Self, RegistryError> {
        if profiles.is_empty() {
            return Err(RegistryError::Parse("registry defines no chains".to_string()));
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut chain_ids: HashMap<u64, usize> = HashMap::new();

        for (position, profile) in profiles.iter().enumerate() {
            if let Some(&other) = chain_ids.get(&profile.chain_id) {
                return Err(RegistryError::InvalidProfile {
                    chain: profile.canonical_name.clone(),
                    reason: format!(
                        "chain id {} is already used by {}",
                        profile.chain_id, profiles[other].canonical_name
                    ),
                });
            }
            chain_ids.insert(profile.chain_id, position);

            let names = std::iter::once(&profile.canonical_name).chain(profile.aliases.iter());
            for name in names {
                let spaced = normalize_chain_name(name);
                if spaced.is_empty() {
                    return Err(RegistryError::InvalidProfile {
                        chain: profile.canonical_name.clone(),
                        reason: "empty chain alias".to_string(),
                    });
                }
                let compact = spaced.replace(' ', "");
                for key in [spaced, compact] {
                    match index.get(&key) {
                        Some(&existing) if existing != position => {
                            return Err(RegistryError::DuplicateAlias {
                                alias: key,
                                first: profiles[existing].canonical_name.clone(),
                                second: profile.canonical_name.clone(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            index.insert(key, position);
                        }
                    }
                }
            }
        }

        Ok(Self { profiles, index })
    }

    /// Resolve a free-form chain name to exactly one profile.
    pub fn resolve_chain(&self, name: &str) -> Result<&ChainProfile, IntentError> {
        self.index
            .get(&normalize_chain_name(name))
            .map(|&i| &self.profiles[i])
            .ok_or_else(|| IntentError::UnsupportedChain {
                chain: name.trim().to_string(),
                supported: self.supported_chain_names().into_iter().map(String::from).collect(),
            })
    }

    pub fn is_action_supported(&self, profile: &ChainProfile, action: Action) -> bool {
        profile.supports_action(action)
    }

    pub fn is_token_supported(&self, profile: &ChainProfile, symbol: &str) -> bool {
        profile.token(symbol).is_some()
    }

    pub fn supported_chain_names(&self) -> Vec<&str> {
        self.profiles
            .iter()
            .map(|p| p.canonical_name.as_str())
            .collect()
    }

    /// Canonical names of the chains that support `action`.
    pub fn chains_supporting(&self, action: Action) -> Vec<String> {
        self.profiles
            .iter()
            .filter(|p| p.supports_action(action))
            .map(|p| p.canonical_name.clone())
            .collect()
    }

    pub fn by_chain_id(&self, chain_id: u64) -> Option<&ChainProfile> {
        self.profiles.iter().find(|p| p.chain_id == chain_id)
    }

    pub fn profiles(&self) -> &[ChainProfile] {
        &self.profiles
    }
}

/// Lowercase and collapse runs of whitespace to a single space.
pub fn normalize_chain_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_profile(entry: ChainEntry) -> Result<ChainProfile, RegistryError> {
    let chain = entry.canonical_name.trim().to_string();
    let invalid = |reason: String| RegistryError::InvalidProfile {
        chain: chain.clone(),
        reason,
    };

    let explorer = url::Url::parse(&entry.explorer_base_url)
        .map_err(|e| invalid(format!("invalid explorer_base_url: {e}")))?;
    if !matches!(explorer.scheme(), "http" | "https") {
        return Err(invalid("explorer_base_url must be http(s)".to_string()));
    }
    if entry.rpc_endpoint_key.trim().is_empty() {
        return Err(invalid("rpc_endpoint_key cannot be empty".to_string()));
    }

    let mut tokens = BTreeMap::new();
    for (symbol, token) in entry.tokens {
        let symbol = symbol.trim().to_ascii_uppercase();
        let address = match (token.native, token.address) {
            (true, None) => TokenAddress::Native,
            (false, Some(address)) if address != Address::ZERO => TokenAddress::Contract(address),
            (true, Some(_)) => {
                return Err(invalid(format!("token {symbol} is both native and a contract")));
            }
            (false, _) => {
                return Err(invalid(format!("token {symbol} needs a contract address")));
            }
        };
        if token.decimals > 28 {
            return Err(invalid(format!("token {symbol} has too many decimals")));
        }
        tokens.insert(
            symbol.clone(),
            TokenSpec {
                symbol,
                address,
                decimals: token.decimals,
            },
        );
    }

    let native_symbol = entry.native_symbol.trim().to_ascii_uppercase();
    match tokens.get(&native_symbol) {
        Some(token) if token.is_native() => {}
        _ => {
            return Err(invalid(format!(
                "native symbol {native_symbol} must be listed as a native token"
            )));
        }
    }

    let wrapped_native = entry.wrapped_native.map(|s| s.trim().to_ascii_uppercase());
    if let Some(wrapped) = &wrapped_native {
        match tokens.get(wrapped) {
            Some(token) if !token.is_native() => {}
            _ => {
                return Err(invalid(format!(
                    "wrapped native {wrapped} must be listed as a contract token"
                )));
            }
        }
    }

    if let Some(venue) = &entry.swap_venue
        && venue.pool_fee > MAX_POOL_FEE
    {
        return Err(invalid(format!("pool_fee {} is out of range", venue.pool_fee)));
    }

    let supported_actions: BTreeSet<Action> = entry.supported_actions.into_iter().collect();
    for action in &supported_actions {
        match action {
            Action::Transfer => {}
            Action::Swap if entry.swap_venue.is_none() => {
                return Err(invalid("swap requires a swap_venue".to_string()));
            }
            Action::Wrap if wrapped_native.is_none() => {
                return Err(invalid("wrap requires wrapped_native".to_string()));
            }
            Action::Swap | Action::Wrap => {}
            Action::Ask | Action::Receive | Action::Help => {
                return Err(invalid(format!("{} is not an on-chain action", action.as_str())));
            }
        }
    }

    Ok(ChainProfile {
        chain_id: entry.chain_id,
        canonical_name: chain.clone(),
        aliases: entry.aliases,
        explorer_base_url: entry.explorer_base_url.trim_end_matches('/').to_string(),
        rpc_endpoint_key: entry.rpc_endpoint_key.trim().to_string(),
        default_rpc_url: entry.default_rpc_url,
        native_symbol,
        supported_actions,
        tokens,
        wrapped_native,
        swap_venue: entry.swap_venue,
    })
}
