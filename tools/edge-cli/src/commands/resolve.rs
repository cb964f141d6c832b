//! Run the decision function locally.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use edge_decision::EdgeDecision;
use edge_render::{Renderer, RouteRegistry};

use super::ResolveArgs;
use crate::context::Context;
use crate::output::reason_badge;

/// Run the resolve command.
pub async fn run(args: ResolveArgs, ctx: &Context) -> Result<()> {
    let metadata_path = ctx.resolve_path(&args.metadata);
    let bytes = std::fs::read(&metadata_path)
        .with_context(|| format!("Failed to read {}", metadata_path.display()))?;
    let routes = RouteRegistry::from_metadata_json(&bytes)
        .with_context(|| format!("Invalid metadata file: {}", metadata_path.display()))?;

    let store = ctx.store();
    let renderer = Arc::new(Renderer::with_config(
        store.clone(),
        routes,
        ctx.config.render.clone(),
        ctx.config.template.filename.clone(),
    ));
    let edge = EdgeDecision::new(store, renderer, &ctx.config);

    let mut decisions = Vec::with_capacity(args.repeat);
    for _ in 0..args.repeat.max(1) {
        let request = http::Request::get(args.path.as_str()).body(())?;
        let decision = edge.decide(&request).await;

        if !ctx.output.is_json() {
            ctx.output.header(&format!("{} [{}]", args.path, decision.request_id));
            ctx.output.kv("Decision", &reason_badge(decision.reason.as_str()));
            if let Some(key) = &decision.key {
                ctx.output.kv("Key", key);
            }
            if let Some(pattern) = &decision.pattern {
                ctx.output.kv("Route", pattern);
            }
            if let Some(render) = &decision.render {
                ctx.output
                    .kv("Render", &format!("{} {}", render.status_code, render.body));
            }
            ctx.output
                .kv("Elapsed", &format!("{:.2}ms", decision.elapsed.as_secs_f64() * 1000.0));
        }

        decisions.push(serde_json::json!({
            "requestId": decision.request_id.to_string(),
            "reason": decision.reason,
            "key": decision.key,
            "pattern": decision.pattern,
            "render": decision.render,
            "elapsedUs": decision.elapsed.as_micros() as u64,
        }));
    }

    let snapshot = edge.metrics().snapshot();
    if ctx.output.is_json() {
        ctx.output
            .json(&serde_json::json!({ "decisions": decisions, "metrics": snapshot }));
    } else {
        ctx.output.info("");
        for line in snapshot.to_summary().lines() {
            ctx.output.info(line);
        }
    }

    Ok(())
}
