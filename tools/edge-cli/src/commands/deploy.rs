//! Provision the store and upload a build.

use anyhow::{bail, Context as _, Result};
use chrono::Utc;
use dialoguer::Confirm;
use edge_store::DeployBackend;
use serde::{Deserialize, Serialize};

use super::DeployArgs;
use crate::context::Context;
use crate::output::format_bytes;

/// Run the deploy command.
pub async fn run(args: DeployArgs, ctx: &Context) -> Result<()> {
    ctx.output.header("Deploying build output");

    // Step 1: Validate configuration
    ctx.output.step(1, 5, "Validating configuration");
    let manifest = ctx.config.validate().context("Invalid configuration")?;
    let build_dir = ctx.resolve_path(&args.build_dir);
    if !build_dir.is_dir() {
        bail!("Build directory not found: {}", build_dir.display());
    }

    let store_root = ctx.store_root();
    ctx.output.kv("Build", &build_dir.display().to_string());
    ctx.output.kv("Store", &store_root.display().to_string());
    ctx.output.kv("Bucket", &ctx.config.store.bucket);
    ctx.output.kv("Routes", &manifest.len().to_string());

    if !args.yes && !args.dry_run {
        ctx.output.info("");
        let confirmed = Confirm::new()
            .with_prompt("Proceed with deployment?")
            .default(true)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Deployment cancelled");
            return Ok(());
        }
    }

    if args.dry_run {
        ctx.output.step(2, 5, "Dry run - skipping provisioning");
        ctx.output.step(3, 5, "Dry run - skipping upload");
        super::routes::print_manifest(&manifest, ctx);
        ctx.output.success("Dry run completed successfully");
        return Ok(());
    }

    // Step 2: Provision
    ctx.output.step(2, 5, "Provisioning store");
    let backend = ctx.backend();
    backend.setup().await.context("Failed to provision store")?;

    // Step 3: Upload build output
    ctx.output.step(3, 5, "Uploading build output");
    let spinner = ctx.output.spinner("Uploading...");
    let uploaded = backend.deploy(&build_dir).await;
    spinner.finish_and_clear();
    let uploaded = uploaded.context("Failed to upload build output")?;
    ctx.output.kv(
        "Uploaded",
        &format!("{} objects, {}", uploaded.objects, format_bytes(uploaded.bytes)),
    );

    // Step 4: Manifest and templates
    ctx.output.step(4, 5, "Writing manifest and fallback templates");
    super::routes::write_manifest(&manifest, ctx).await?;
    let report = super::templates::generate(&build_dir, &manifest, ctx).await?;
    super::templates::print_report(&report, ctx);

    // Step 5: Record
    ctx.output.step(5, 5, "Recording deployment");
    let record = DeploymentRecord {
        timestamp: Utc::now().to_rfc3339(),
        bucket: ctx.config.store.bucket.clone(),
        build_dir: build_dir.display().to_string(),
        objects: uploaded.objects,
        bytes: uploaded.bytes,
        routes: manifest.routes().iter().map(|r| r.pattern().to_string()).collect(),
        templates: report.written.clone(),
        skipped: report.skipped.clone(),
    };
    save_deployment_record(&record, ctx)?;

    if ctx.output.is_json() {
        ctx.output.json(&record);
    }
    ctx.output.success("Deployment successful!");

    Ok(())
}

#[derive(Serialize, Deserialize)]
struct DeploymentRecord {
    timestamp: String,
    bucket: String,
    build_dir: String,
    objects: usize,
    bytes: u64,
    routes: Vec<String>,
    templates: Vec<String>,
    skipped: Vec<String>,
}

fn save_deployment_record(record: &DeploymentRecord, ctx: &Context) -> Result<()> {
    let deployments_dir = ctx.cwd.join(".edge").join("deployments");
    std::fs::create_dir_all(&deployments_dir)?;

    let filename = format!("{}-{}.json", record.bucket, Utc::now().format("%Y%m%d%H%M%S"));
    let path = deployments_dir.join(&filename);

    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(&path, json)?;

    ctx.output.debug(&format!("Saved deployment record: {}", path.display()));

    Ok(())
}
