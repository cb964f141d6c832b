//! Metadata model.
//!
//! Mirrors the shape metadata generators return. Every family is optional
//! and independent; only `title` is required.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured page metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Page title.
    pub title: String,

    /// Template applied to `title`; `%s` is replaced by the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,

    /// Web app manifest URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robots: Option<Robots>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternates: Option<Alternates>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons: Option<Icons>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_graph: Option<OpenGraph>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<Twitter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apple_web_app: Option<AppleWebApp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_detection: Option<FormatDetection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itunes: Option<Itunes>,

    /// Arbitrary `<meta name=.. content=..>` pairs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, OneOrMany>,
}

impl Metadata {
    /// Metadata with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the canonical URL.
    pub fn with_canonical(mut self, url: impl Into<String>) -> Self {
        self.alternates.get_or_insert_with(Default::default).canonical = Some(url.into());
        self
    }

    /// Title after applying `title_template`.
    pub fn resolved_title(&self) -> String {
        match &self.title_template {
            Some(template) if template.contains("%s") => template.replace("%s", &self.title),
            _ => self.title.clone(),
        }
    }
}

/// A single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Values in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(v) => vec![v.as_str()],
            Self::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

/// Page author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Crawler directives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Robots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nocache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noarchive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nosnippet: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noimageindex: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_snippet: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_image_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_video_preview: Option<i64>,
    /// Directives for Google's crawler specifically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_bot: Option<Box<Robots>>,
}

impl Robots {
    /// Directive list as written into the `content` attribute.
    pub fn content(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(index) = self.index {
            parts.push(if index { "index" } else { "noindex" }.to_string());
        }
        if let Some(follow) = self.follow {
            parts.push(if follow { "follow" } else { "nofollow" }.to_string());
        }
        for (flag, name) in [
            (self.nocache, "nocache"),
            (self.noarchive, "noarchive"),
            (self.nosnippet, "nosnippet"),
            (self.noimageindex, "noimageindex"),
        ] {
            if flag == Some(true) {
                parts.push(name.to_string());
            }
        }
        if let Some(n) = self.max_snippet {
            parts.push(format!("max-snippet:{}", n));
        }
        if let Some(v) = &self.max_image_preview {
            parts.push(format!("max-image-preview:{}", v));
        }
        if let Some(n) = self.max_video_preview {
            parts.push(format!("max-video-preview:{}", n));
        }
        parts.join(", ")
    }
}

/// Canonical and alternate links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    /// hreflang -> URL.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub languages: BTreeMap<String, String>,
    /// media query -> URL.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub media: BTreeMap<String, String>,
    /// MIME type -> URL.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, String>,
}

/// Icon links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icons {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icon: Vec<Icon>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortcut: Vec<Icon>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apple: Vec<Icon>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub url: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

/// Primary social preview (`og:*`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<OgImage>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub og_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OgImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Secondary social preview (`twitter:*`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Twitter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Site ownership verification tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub google: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub yandex: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub yahoo: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub me: Vec<String>,
    /// Verification meta name -> tokens.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleWebApp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_bar_style: Option<String>,
}

/// Which strings the browser may auto-link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDetection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itunes {
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_argument: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_only() {
        let meta: Metadata = serde_json::from_str(r#"{"title":"Widget"}"#).unwrap();
        assert_eq!(meta, Metadata::new("Widget"));
    }

    #[test]
    fn test_camel_case_fields() {
        let meta: Metadata = serde_json::from_str(
            r#"{
                "title": "T",
                "openGraph": {"siteName": "Shop", "type": "website", "images": [{"url": "/a.png", "width": 10}]},
                "appleWebApp": {"statusBarStyle": "black"},
                "other": {"theme": "dark", "tags": ["a", "b"]}
            }"#,
        )
        .unwrap();
        let og = meta.open_graph.unwrap();
        assert_eq!(og.site_name.as_deref(), Some("Shop"));
        assert_eq!(og.og_type.as_deref(), Some("website"));
        assert_eq!(og.images[0].width, Some(10));
        assert_eq!(meta.other["tags"].values(), vec!["a", "b"]);
        assert_eq!(meta.other["theme"].values(), vec!["dark"]);
    }

    #[test]
    fn test_resolved_title() {
        let mut meta = Metadata::new("Widget");
        assert_eq!(meta.resolved_title(), "Widget");
        meta.title_template = Some("%s | Shop".to_string());
        assert_eq!(meta.resolved_title(), "Widget | Shop");
    }

    #[test]
    fn test_robots_content() {
        let robots = Robots {
            index: Some(false),
            follow: Some(true),
            nocache: Some(true),
            max_image_preview: Some("large".to_string()),
            ..Default::default()
        };
        assert_eq!(robots.content(), "noindex, follow, nocache, max-image-preview:large");
    }
}
