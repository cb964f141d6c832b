//! Compile and publish the route manifest.

use anyhow::{Context as _, Result};
use edge_core::{template_key, RouteManifest};
use edge_store::ObjectStoreExt;
use serde::Serialize;

use super::RoutesArgs;
use crate::context::Context;

#[derive(Serialize)]
struct RouteSummary<'a> {
    pattern: &'a str,
    params: &'a [String],
    template: String,
}

/// Run the routes command.
pub async fn run(args: RoutesArgs, ctx: &Context) -> Result<()> {
    let manifest = ctx.config.validate().context("Invalid route configuration")?;

    print_manifest(&manifest, ctx);

    if args.write {
        write_manifest(&manifest, ctx).await?;
    }

    Ok(())
}

pub(crate) fn print_manifest(manifest: &RouteManifest, ctx: &Context) {
    let summaries: Vec<RouteSummary<'_>> = manifest
        .routes()
        .iter()
        .map(|route| RouteSummary {
            pattern: route.pattern(),
            params: route.param_names(),
            template: template_key(route, &ctx.config.template.filename),
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&summaries);
        return;
    }

    ctx.output.header(&format!("Routes ({})", summaries.len()));
    let width = summaries
        .iter()
        .map(|s| s.pattern.len())
        .max()
        .unwrap_or(0)
        .max("PATTERN".len());
    ctx.output.table_row(&["PATTERN", "PARAMS", "TEMPLATE"], &[width, 12, 0]);
    for summary in &summaries {
        ctx.output.table_row(
            &[summary.pattern, &summary.params.join(","), &summary.template],
            &[width, 12, 0],
        );
    }
}

pub(crate) async fn write_manifest(manifest: &RouteManifest, ctx: &Context) -> Result<()> {
    let key = &ctx.config.routes.manifest_key;
    ctx.store()
        .put_string(key, &manifest.to_json()?)
        .await
        .with_context(|| format!("Failed to write manifest to {}", key))?;
    ctx.output.success(&format!("Wrote manifest: {}", key));
    Ok(())
}
