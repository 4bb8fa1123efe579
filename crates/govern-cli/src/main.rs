mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use govern_core::Strategy;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::RuntimeArgs;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "govern")]
#[command(version, about = "Data contract governance validation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a contract against the governance catalogs
    Validate {
        /// Path to the contract file (YAML or JSON)
        contract: String,

        /// Validation strategy: fast, balanced, thorough, adaptive
        #[arg(short, long, default_value_t = Strategy::Adaptive)]
        strategy: Strategy,

        #[command(flatten)]
        runtime: RuntimeArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the risk and complexity analysis of a contract
    Analyze {
        /// Path to the contract file (YAML or JSON)
        contract: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the strategy ADAPTIVE would choose, without validating
    Recommend {
        /// Path to the contract file (YAML or JSON)
        contract: String,

        #[command(flatten)]
        runtime: RuntimeArgs,
    },

    /// List the models the configured backend serves
    Models {
        /// Runtime configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Load and check policy catalogs
    CheckCatalog {
        /// Rule-based catalog (defaults to the built-in catalog)
        #[arg(long)]
        rules: Option<String>,

        /// Semantic catalog (defaults to the built-in catalog)
        #[arg(long)]
        semantic: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; -v raises the default to debug
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .init();

    match cli.command {
        Commands::Validate {
            contract,
            strategy,
            runtime,
            format,
        } => commands::validate::execute(&contract, strategy, &runtime, format).await,

        Commands::Analyze { contract, format } => commands::analyze::execute(&contract, format),

        Commands::Recommend { contract, runtime } => {
            commands::recommend::execute(&contract, &runtime).await
        }

        Commands::Models { config } => commands::models::execute(config.as_deref()).await,

        Commands::CheckCatalog { rules, semantic } => {
            commands::catalog::execute(rules.as_deref(), semantic.as_deref())
        }
    }
}
