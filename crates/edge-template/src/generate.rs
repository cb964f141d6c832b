//! Template derivation.

use std::collections::BTreeMap;
use std::path::Path;

use edge_core::{placeholder, template_key, RouteManifest, RouteParams, RoutePattern, TemplateConfig};
use edge_patch::{
    patch_document, replace_primary_content, templatize_params, Document, DocumentPatch,
};
use edge_store::{ObjectStore, ObjectStoreExt};
use tracing::{debug, info, warn};

use crate::discover::find_example;
use crate::error::{TemplateError, TemplateResult};
use crate::info::TemplateInfo;

/// A derived template, ready to store.
#[derive(Debug, Clone)]
pub struct GeneratedTemplate {
    /// Store key of the template.
    pub key: String,
    /// Sidecar describing the reference instance.
    pub info: TemplateInfo,
    /// Template document.
    pub html: String,
}

/// Outcome of generating templates for a manifest.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Template keys written, in processing order.
    pub written: Vec<String>,
    /// Patterns with no example page in the build output.
    pub skipped: Vec<String>,
    /// Template keys written more than once; the last route processed wins.
    pub overwritten: Vec<String>,
}

/// Derives fallback templates from build output.
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    filename: String,
    loading_title: String,
    loading_markup: String,
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new(&TemplateConfig::default())
    }
}

impl TemplateGenerator {
    /// Create a generator from configuration.
    pub fn new(config: &TemplateConfig) -> Self {
        Self {
            filename: config.filename.clone(),
            loading_title: config.loading_title.clone(),
            loading_markup: config.loading_markup.clone(),
        }
    }

    /// Template key for a route.
    pub fn key_for(&self, route: &RoutePattern) -> String {
        template_key(route, &self.filename)
    }

    /// Turn an instance page into a template.
    ///
    /// The title becomes the loading title, managed tags are removed, the
    /// primary content becomes the loading markup, parameter values in the
    /// payload become placeholders, and the payload metadata entry is
    /// reduced to the loading title.
    pub fn templatize(
        &self,
        html: &str,
        route: &RoutePattern,
        params: &RouteParams,
    ) -> TemplateResult<String> {
        let html = patch_document(html, &DocumentPatch::loading(&self.loading_title))?;
        let html = replace_primary_content(&html, &self.loading_markup);

        let mut doc = Document::parse(&html)?;
        let rows = doc.edit_payload_rows(|_, value| templatize_params(value, route, params))?;
        let template = doc.render();

        for name in route.param_names() {
            if !template.contains(&placeholder(name)) {
                warn!(
                    pattern = route.pattern(),
                    param = %name,
                    "parameter value not found in payload"
                );
            }
        }
        debug!(pattern = route.pattern(), rows, "templatized payload rows");
        Ok(template)
    }

    /// Derive the template for one route, or `None` if the build output
    /// has no instance of it.
    pub fn generate(
        &self,
        build_dir: &Path,
        route: &RoutePattern,
    ) -> TemplateResult<Option<GeneratedTemplate>> {
        if !build_dir.is_dir() {
            return Err(TemplateError::BuildDirMissing(build_dir.to_path_buf()));
        }
        let Some(example) = find_example(build_dir, route) else {
            return Ok(None);
        };

        let html = std::fs::read_to_string(&example.file).map_err(|source| TemplateError::Read {
            path: example.file.clone(),
            source,
        })?;
        let html = self.templatize(&html, route, &example.params)?;

        Ok(Some(GeneratedTemplate {
            key: self.key_for(route),
            info: TemplateInfo {
                pattern: route.pattern().to_string(),
                param_names: route.param_names().to_vec(),
                reference_path: example.path,
                reference_params: example.params,
            },
            html,
        }))
    }

    /// Generate and store templates for every route in the manifest.
    ///
    /// Routes without an example are skipped with a warning. Routes that
    /// share a template key overwrite each other; the last one wins.
    pub async fn generate_all(
        &self,
        build_dir: &Path,
        manifest: &RouteManifest,
        store: &dyn ObjectStore,
    ) -> TemplateResult<GenerationReport> {
        let mut report = GenerationReport::default();
        let mut owners: BTreeMap<String, String> = BTreeMap::new();

        for route in manifest.routes() {
            let Some(template) = self.generate(build_dir, route)? else {
                warn!(pattern = route.pattern(), "no example page found, skipping template");
                report.skipped.push(route.pattern().to_string());
                continue;
            };

            if let Some(previous) = owners.insert(template.key.clone(), route.pattern().to_string())
            {
                warn!(
                    key = %template.key,
                    previous = %previous,
                    pattern = route.pattern(),
                    "routes share a template location, last processed wins"
                );
                report.overwritten.push(template.key.clone());
            }

            store.put_string(&template.key, &template.html).await?;
            store
                .put_string(&TemplateInfo::key_for(&template.key), &template.info.to_json()?)
                .await?;
            info!(
                key = %template.key,
                pattern = route.pattern(),
                reference = %template.info.reference_path,
                "stored fallback template"
            );
            report.written.push(template.key);
        }
        Ok(report)
    }
}
