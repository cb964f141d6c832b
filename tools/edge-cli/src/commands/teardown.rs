//! Remove the store.

use anyhow::{Context as _, Result};
use dialoguer::Confirm;
use edge_store::DeployBackend;

use super::TeardownArgs;
use crate::context::Context;

/// Run the teardown command.
pub async fn run(args: TeardownArgs, ctx: &Context) -> Result<()> {
    let backend = ctx.backend();
    let root = ctx.store_root();

    if !backend.exists().await? {
        ctx.output
            .info(&format!("Nothing to remove: {} does not exist", root.display()));
        return Ok(());
    }

    ctx.output.header("Tearing down store");
    ctx.output.kv("Store", &root.display().to_string());
    ctx.output.kv("Bucket", &ctx.config.store.bucket);

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete the store and every artifact in it?")
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Teardown cancelled");
            return Ok(());
        }
    }

    backend.teardown().await.context("Failed to remove store")?;
    ctx.output.success(&format!("Removed: {}", root.display()));

    Ok(())
}
