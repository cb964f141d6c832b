//! Template sidecar.

use edge_core::{template_info_key, RouteParams};
use serde::{Deserialize, Serialize};

/// Describes the build-time instance a template was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    /// Route pattern the template serves.
    pub pattern: String,
    /// Parameter names, in pattern order.
    pub param_names: Vec<String>,
    /// Request path of the reference instance, e.g. `/product/42`.
    pub reference_path: String,
    /// Parameter values of the reference instance.
    pub reference_params: RouteParams,
}

impl TemplateInfo {
    /// Sidecar key for a template key.
    pub fn key_for(template_key: &str) -> String {
        template_info_key(template_key)
    }

    /// Parse a stored sidecar.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Serialize for storage.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
