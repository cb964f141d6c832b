//! Derive fallback templates from build output.

use anyhow::{bail, Context as _, Result};
use edge_core::RouteManifest;
use edge_template::{GenerationReport, TemplateGenerator};

use super::TemplatesArgs;
use crate::context::Context;

/// Run the templates command.
pub async fn run(args: TemplatesArgs, ctx: &Context) -> Result<()> {
    let manifest = ctx.config.validate().context("Invalid route configuration")?;
    let build_dir = ctx.resolve_path(&args.build_dir);
    if !build_dir.is_dir() {
        bail!("Build directory not found: {}", build_dir.display());
    }

    if args.dry_run {
        return preview(&build_dir, &manifest, ctx);
    }

    let report = generate(&build_dir, &manifest, ctx).await?;
    print_report(&report, ctx);
    Ok(())
}

pub(crate) async fn generate(
    build_dir: &std::path::Path,
    manifest: &RouteManifest,
    ctx: &Context,
) -> Result<GenerationReport> {
    let spinner = ctx.output.spinner("Generating fallback templates...");
    let store = ctx.store();
    let result = TemplateGenerator::new(&ctx.config.template)
        .generate_all(build_dir, manifest, &*store)
        .await;
    spinner.finish_and_clear();
    result.context("Failed to generate fallback templates")
}

fn preview(build_dir: &std::path::Path, manifest: &RouteManifest, ctx: &Context) -> Result<()> {
    let generator = TemplateGenerator::new(&ctx.config.template);
    ctx.output.header("Fallback templates (dry run)");
    for route in manifest.routes() {
        match generator.generate(build_dir, route)? {
            Some(template) => {
                ctx.output.kv(route.pattern(), &template.key);
                ctx.output
                    .debug(&format!("reference instance: {}", template.info.reference_path));
            }
            None => ctx
                .output
                .warn(&format!("{}: no example page found", route.pattern())),
        }
    }
    Ok(())
}

pub(crate) fn print_report(report: &GenerationReport, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "written": report.written,
            "skipped": report.skipped,
            "overwritten": report.overwritten,
        }));
        return;
    }

    for key in &report.written {
        ctx.output.list_item(key);
    }
    for pattern in &report.skipped {
        ctx.output
            .warn(&format!("{}: no example page found, skipped", pattern));
    }
    for key in &report.overwritten {
        ctx.output.warn(&format!(
            "{}: shared by several routes, the last one processed was kept",
            key
        ));
    }
    ctx.output.success(&format!(
        "Stored {} template(s)",
        report.written.len() - report.overwritten.len()
    ));
}
