use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use onchain_agent::cli::{Cli, Command, run_agent, run_chains_command, run_doctor_command};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("onchain_agent=info"));

    // Logs go to stderr so replies on stdout stay readable.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let toml_path = cli.config.as_deref();
    match cli.command.unwrap_or(Command::Run { message: None }) {
        Command::Run { message } => run_agent(toml_path, message).await,
        Command::Doctor { strict } => run_doctor_command(toml_path, strict).await,
        Command::Chains => run_chains_command(toml_path),
    }
}
