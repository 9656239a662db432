//! Command-line interface.

mod chains;
mod doctor;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use chains::{render_capability_matrix, run_chains_command};
pub use doctor::run_doctor_command;
pub use run::run_agent;

#[derive(Parser, Debug)]
#[command(name = "onchain-agent")]
#[command(about = "Conversational agent that validates trading intents and executes them on EVM chains")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// TOML config file (default: ~/.onchain-agent/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the interactive agent (default)
    Run {
        /// Handle a single message and exit
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Check configuration and RPC reachability
    Doctor {
        /// Exit non-zero if any check fails
        #[arg(long)]
        strict: bool,
    },

    /// Print supported chains, actions and tokens
    Chains,
}
