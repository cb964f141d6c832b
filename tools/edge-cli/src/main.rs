//! Edge CLI - deploy-time driver for on-demand regeneration.
//!
//! Commands:
//! - `edge routes` - Compile the route manifest
//! - `edge templates` - Derive fallback templates from build output
//! - `edge deploy` - Provision the store and upload everything
//! - `edge resolve` - Run the decision function against the local store
//! - `edge teardown` - Remove the store
//! - `edge config` - Manage configuration

mod commands;
mod context;
mod output;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use commands::{ConfigArgs, DeployArgs, ResolveArgs, RoutesArgs, TeardownArgs, TemplatesArgs};

/// Edge CLI - Regenerate statically exported pages on demand
#[derive(Parser)]
#[command(name = "edge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the route manifest and optionally store it
    Routes(RoutesArgs),

    /// Derive fallback templates from build output
    Templates(TemplatesArgs),

    /// Provision the store and upload build output, manifest and templates
    Deploy(DeployArgs),

    /// Resolve a request path as the edge would
    Resolve(ResolveArgs),

    /// Remove the store and everything in it
    Teardown(TeardownArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    let mut logging = ctx.config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    edge_observability::init_logging(&logging).context("Failed to initialise logging")?;

    let result = match cli.command {
        Commands::Routes(args) => commands::routes::run(args, &ctx).await,
        Commands::Templates(args) => commands::templates::run(args, &ctx).await,
        Commands::Deploy(args) => commands::deploy::run(args, &ctx).await,
        Commands::Resolve(args) => commands::resolve::run(args, &ctx).await,
        Commands::Teardown(args) => commands::teardown::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
