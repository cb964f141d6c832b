//! CLI command implementations.

pub mod config;
pub mod deploy;
pub mod resolve;
pub mod routes;
pub mod teardown;
pub mod templates;

use clap::{Args, Subcommand};

/// Arguments for the routes command.
#[derive(Args)]
pub struct RoutesArgs {
    /// Write the compiled manifest to the store.
    #[arg(short, long)]
    pub write: bool,
}

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    /// Static-export build directory.
    #[arg(short, long, default_value = "out")]
    pub build_dir: String,

    /// Derive templates without storing them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the deploy command.
#[derive(Args)]
pub struct DeployArgs {
    /// Static-export build directory.
    #[arg(short, long, default_value = "out")]
    pub build_dir: String,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,

    /// Dry run (don't actually deploy).
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the resolve command.
#[derive(Args)]
pub struct ResolveArgs {
    /// Request path, e.g. /product/42.
    pub path: String,

    /// JSON file mapping route patterns to metadata documents.
    #[arg(short, long)]
    pub metadata: String,

    /// Send the request this many times.
    #[arg(long, default_value = "1")]
    pub repeat: usize,
}

/// Arguments for the teardown command.
#[derive(Args)]
pub struct TeardownArgs {
    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
