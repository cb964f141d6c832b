//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use edge_core::generate_default_config;

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }
    println!();
    print!("{}", ctx.config.to_toml()?);

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("edge.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    match ctx.config.validate() {
        Ok(manifest) if manifest.is_empty() => {
            warnings.push("routes.patterns is empty; nothing will be rendered".to_string())
        }
        Ok(manifest) => ctx
            .output
            .kv("routes", &format!("{} compiled", manifest.len())),
        Err(e) => errors.push(e.to_string()),
    }

    if ctx.config.render.timeout_ms == 0 {
        errors.push("render.timeout_ms must be greater than 0".to_string());
    }

    if ctx.config.edge.manifest_ttl_secs == 0 {
        warnings.push("edge.manifest_ttl_secs is 0; every request reads the manifest".to_string());
    }

    if ctx.config.edge.document_extensions.is_empty() {
        warnings.push(
            "edge.document_extensions is empty; only extensionless paths are treated as pages"
                .to_string(),
        );
    }

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
