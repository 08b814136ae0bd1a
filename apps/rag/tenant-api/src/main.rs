//! Tenant API - Entry Point
//!
//! `serve` runs the HTTP API; `demo` runs the two-tenant isolation walkthrough.

use clap::{Parser, Subcommand};
use core_config::tracing::install_color_eyre;

#[derive(Parser)]
#[command(name = "tenant-api")]
#[command(about = "Tenant-isolated document collections over a vector database")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve,

    /// Store one document per tenant and show what each tenant can see
    Demo {
        /// Text to query both tenants with
        #[arg(short, long, default_value = "confidential")]
        query: String,

        /// Number of results per tenant
        #[arg(short, long, default_value_t = 1)]
        k: usize,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => tenant_api::run().await,
        Commands::Demo { query, k } => tenant_api::run_demo(&query, k).await,
    }
}
