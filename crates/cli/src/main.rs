//! Kube query agent CLI
//!
//! Asks the agent questions about the cluster and checks its health.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{ask, health};

/// Kube Query Agent CLI
#[derive(Parser)]
#[command(name = "kubeqa")]
#[command(author, version, about = "CLI for the Kube Query Agent", long_about = None)]
pub struct Cli {
    /// Agent URL (can also be set via KUBEQA_API_URL env var)
    #[arg(long, env = "KUBEQA_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a question about the cluster
    Ask {
        /// The question, e.g. "How many pods are in the default namespace?"
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Show agent health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    let result = match cli.command {
        Commands::Ask { question } => ask::ask(&client, &question, cli.format).await,
        Commands::Health => health::show_health(&client, cli.format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
