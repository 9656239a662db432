//! onchain-agent: a conversational agent that turns free-text trading
//! instructions into validated, chain-specific EVM transactions.
//!
//! The core is the intent pipeline in [`agent`]: extracted parameters are
//! checked against the [`registry`], recipients are resolved through
//! [`identity`], balances are verified, and the validated intent is routed
//! to a transfer, wrap or swap strategy over a [`chain`] client.

pub mod agent;
pub mod bootstrap;
pub mod chain;
pub mod channels;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
pub mod registry;
pub mod settings;

pub use config::Config;
pub use error::{Error, ErrorKind};
