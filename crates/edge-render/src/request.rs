//! Renderer invocation contract.

use edge_core::{RouteMatch, RouteParams};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{NotFoundReason, RenderError};

/// A request to materialize one route instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Request path, e.g. `/product/42`.
    pub path: String,
    /// Store identifier.
    pub bucket: String,
    /// Matched route pattern.
    pub pattern: String,
    /// Bound parameter values.
    pub params: RouteParams,
}

impl RenderRequest {
    /// Create a request.
    pub fn new(
        path: impl Into<String>,
        bucket: impl Into<String>,
        pattern: impl Into<String>,
        params: RouteParams,
    ) -> Self {
        Self {
            path: path.into(),
            bucket: bucket.into(),
            pattern: pattern.into(),
            params,
        }
    }

    /// Create a request from a route match.
    pub fn from_match(path: impl Into<String>, bucket: impl Into<String>, m: &RouteMatch) -> Self {
        Self::new(path, bucket, m.pattern(), m.to_params())
    }
}

/// Renderer reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    /// HTTP-style status: 200 rendered or already present, 404 not found,
    /// 500 render failure.
    pub status_code: u16,
    /// Short human-readable outcome.
    pub body: String,
    /// The stored document, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl RenderResponse {
    fn new(status: StatusCode, body: impl Into<String>, html: Option<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            body: body.into(),
            html,
        }
    }

    /// Whether the artifact now exists in the store.
    pub fn is_success(&self) -> bool {
        StatusCode::from_u16(self.status_code)
            .map(|s| s.is_success())
            .unwrap_or(false)
    }
}

/// Detailed result of a render.
#[derive(Debug)]
pub enum RenderOutcome {
    /// A new artifact was written.
    Rendered { key: String, html: String },
    /// The artifact already existed and was returned unchanged.
    Existing { key: String, html: String },
    /// Nothing to render for these parameters.
    NotFound(NotFoundReason),
    /// The render failed; nothing was written at the artifact key.
    Failed(RenderError),
}

impl RenderOutcome {
    /// Convert to the wire response.
    pub fn into_response(self) -> RenderResponse {
        match self {
            Self::Rendered { key, html } => {
                RenderResponse::new(StatusCode::OK, format!("rendered {}", key), Some(html))
            }
            Self::Existing { key, html } => {
                RenderResponse::new(StatusCode::OK, format!("already rendered {}", key), Some(html))
            }
            Self::NotFound(reason) => {
                RenderResponse::new(StatusCode::NOT_FOUND, reason.to_string(), None)
            }
            Self::Failed(err) => {
                RenderResponse::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None)
            }
        }
    }
}
