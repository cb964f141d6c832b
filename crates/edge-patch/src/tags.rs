//! Descriptive tag families.
//!
//! Each family turns one part of [`Metadata`] into `<meta>`/`<link>` tags.
//! [`metadata_tags`] emits the families in a fixed order:
//!
//! basic -> robots -> alternates -> icons -> OpenGraph -> Twitter ->
//! verification -> platform -> other
//!
//! The same tags are rendered as markup ([`Tag::to_html`]) and as payload
//! elements ([`Tag::to_element`]).

use serde_json::{json, Map, Value};

use crate::escape::escape_html;
use crate::metadata::{Metadata, OneOrMany};

/// Element name of a descriptive tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Meta,
    Link,
}

impl TagKind {
    /// Element name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Link => "link",
        }
    }

    /// Parse an element name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("meta") {
            Some(Self::Meta)
        } else if name.eq_ignore_ascii_case("link") {
            Some(Self::Link)
        } else {
            None
        }
    }
}

/// One descriptive tag: element kind plus attributes in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    pub attrs: Vec<(String, String)>,
}

/// HTML attribute name -> payload prop name, where they differ.
const PROP_NAMES: &[(&str, &str)] = &[
    ("hreflang", "hrefLang"),
    ("charset", "charSet"),
    ("http-equiv", "httpEquiv"),
    ("crossorigin", "crossOrigin"),
];

fn prop_name(attr: &str) -> &str {
    PROP_NAMES
        .iter()
        .find(|(a, _)| *a == attr)
        .map(|(_, p)| *p)
        .unwrap_or(attr)
}

fn attr_name(prop: &str) -> String {
    PROP_NAMES
        .iter()
        .find(|(_, p)| *p == prop)
        .map(|(a, _)| a.to_string())
        .unwrap_or_else(|| prop.to_ascii_lowercase())
}

impl Tag {
    /// Empty tag of a kind.
    pub fn new(kind: TagKind) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
        }
    }

    /// `<meta name=.. content=..>`.
    pub fn meta_name(name: &str, content: &str) -> Self {
        Self::new(TagKind::Meta)
            .with_attr("name", name)
            .with_attr("content", content)
    }

    /// `<meta property=.. content=..>`.
    pub fn meta_property(property: &str, content: &str) -> Self {
        Self::new(TagKind::Meta)
            .with_attr("property", property)
            .with_attr("content", content)
    }

    /// `<link rel=.. href=..>`.
    pub fn link(rel: &str, href: &str) -> Self {
        Self::new(TagKind::Link)
            .with_attr("rel", rel)
            .with_attr("href", href)
    }

    /// Append an attribute.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Append an attribute if present.
    pub fn with_opt_attr(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with_attr(name, v),
            None => self,
        }
    }

    /// Attribute value by (case-insensitive) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Render as markup.
    pub fn to_html(&self) -> String {
        let mut out = format!("<{}", self.kind.as_str());
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_html(value));
            out.push('"');
        }
        out.push_str("/>");
        out
    }

    /// Render as a payload element `["$", kind, key, props]`.
    pub fn to_element(&self, key: &str) -> Value {
        let mut props = Map::new();
        for (name, value) in &self.attrs {
            props.insert(prop_name(name).to_string(), Value::String(value.clone()));
        }
        json!(["$", self.kind.as_str(), key, props])
    }

    /// Read a payload element back into a tag. Non-string props are skipped.
    pub fn from_element(element: &Value) -> Option<Self> {
        let items = element.as_array()?;
        if items.first()?.as_str()? != "$" {
            return None;
        }
        let kind = TagKind::from_name(items.get(1)?.as_str()?)?;
        let props = items.get(3)?.as_object()?;
        let attrs = props
            .iter()
            .filter_map(|(k, v)| Some((attr_name(k), v.as_str()?.to_string())))
            .collect();
        Some(Self { kind, attrs })
    }
}

/// `<meta name>` values this crate owns.
const MANAGED_META_NAMES: &[&str] = &[
    "description",
    "application-name",
    "author",
    "generator",
    "keywords",
    "referrer",
    "creator",
    "publisher",
    "category",
    "classification",
    "robots",
    "googlebot",
    "google-site-verification",
    "yandex-verification",
    "y_key",
    "me",
    "mobile-web-app-capable",
    "apple-mobile-web-app-capable",
    "apple-mobile-web-app-title",
    "apple-mobile-web-app-status-bar-style",
    "format-detection",
    "apple-itunes-app",
];

/// `<link rel>` values this crate owns.
const MANAGED_LINK_RELS: &[&str] = &[
    "canonical",
    "alternate",
    "icon",
    "shortcut icon",
    "apple-touch-icon",
    "manifest",
    "author",
];

/// Whether a tag belongs to the managed set. `extra_names` adds
/// `<meta name>` values emitted from free-form metadata.
///
/// Identity depends only on attribute values, never on their order.
pub fn is_managed_tag(tag: &Tag, extra_names: &[String]) -> bool {
    match tag.kind {
        TagKind::Meta => {
            if let Some(name) = tag.attr("name") {
                let name = name.to_ascii_lowercase();
                return name.starts_with("twitter:")
                    || MANAGED_META_NAMES.contains(&name.as_str())
                    || extra_names.iter().any(|n| n.eq_ignore_ascii_case(&name));
            }
            if let Some(property) = tag.attr("property") {
                let property = property.to_ascii_lowercase();
                return property.starts_with("og:") || property.starts_with("twitter:");
            }
            false
        }
        TagKind::Link => tag
            .attr("rel")
            .map(|rel| MANAGED_LINK_RELS.contains(&rel.to_ascii_lowercase().as_str()))
            .unwrap_or(false),
    }
}

/// Free-form `<meta name>` values a metadata value emits, beyond the fixed
/// managed set.
pub fn extra_managed_names(meta: &Metadata) -> Vec<String> {
    let mut names: Vec<String> = meta.other.keys().cloned().collect();
    if let Some(verification) = &meta.verification {
        names.extend(verification.other.keys().cloned());
    }
    names
}

/// Description, authors, keywords and the other single-value fields.
pub fn basic_tags(meta: &Metadata) -> Vec<Tag> {
    let mut tags = Vec::new();
    let named = |tags: &mut Vec<Tag>, name: &str, value: &Option<String>| {
        if let Some(v) = value {
            tags.push(Tag::meta_name(name, v));
        }
    };

    named(&mut tags, "description", &meta.description);
    named(&mut tags, "application-name", &meta.application_name);
    for author in &meta.authors {
        if let Some(url) = &author.url {
            tags.push(Tag::link("author", url));
        }
        if let Some(name) = &author.name {
            tags.push(Tag::meta_name("author", name));
        }
    }
    if let Some(manifest) = &meta.manifest {
        tags.push(Tag::link("manifest", manifest));
    }
    named(&mut tags, "generator", &meta.generator);
    if !meta.keywords.is_empty() {
        tags.push(Tag::meta_name("keywords", &meta.keywords.join(",")));
    }
    named(&mut tags, "referrer", &meta.referrer);
    named(&mut tags, "creator", &meta.creator);
    named(&mut tags, "publisher", &meta.publisher);
    named(&mut tags, "category", &meta.category);
    named(&mut tags, "classification", &meta.classification);
    tags
}

/// `robots` and `googlebot`.
pub fn robots_tags(meta: &Metadata) -> Vec<Tag> {
    let Some(robots) = &meta.robots else {
        return Vec::new();
    };
    let mut tags = Vec::new();
    let content = robots.content();
    if !content.is_empty() {
        tags.push(Tag::meta_name("robots", &content));
    }
    if let Some(google_bot) = &robots.google_bot {
        let content = google_bot.content();
        if !content.is_empty() {
            tags.push(Tag::meta_name("googlebot", &content));
        }
    }
    tags
}

/// Canonical and alternate links.
pub fn alternate_tags(meta: &Metadata) -> Vec<Tag> {
    let Some(alternates) = &meta.alternates else {
        return Vec::new();
    };
    let mut tags = Vec::new();
    if let Some(canonical) = &alternates.canonical {
        tags.push(Tag::link("canonical", canonical));
    }
    for (lang, href) in &alternates.languages {
        tags.push(
            Tag::new(TagKind::Link)
                .with_attr("rel", "alternate")
                .with_attr("hreflang", lang)
                .with_attr("href", href),
        );
    }
    for (media, href) in &alternates.media {
        tags.push(
            Tag::new(TagKind::Link)
                .with_attr("rel", "alternate")
                .with_attr("media", media)
                .with_attr("href", href),
        );
    }
    for (mime, href) in &alternates.types {
        tags.push(
            Tag::new(TagKind::Link)
                .with_attr("rel", "alternate")
                .with_attr("type", mime)
                .with_attr("href", href),
        );
    }
    tags
}

/// Icon links.
pub fn icon_tags(meta: &Metadata) -> Vec<Tag> {
    let Some(icons) = &meta.icons else {
        return Vec::new();
    };
    let families = [
        ("shortcut icon", &icons.shortcut),
        ("icon", &icons.icon),
        ("apple-touch-icon", &icons.apple),
    ];
    families
        .into_iter()
        .flat_map(|(rel, list)| {
            list.iter().map(move |icon| {
                Tag::link(rel, &icon.url)
                    .with_opt_attr("type", icon.mime_type.as_deref())
                    .with_opt_attr("sizes", icon.sizes.as_deref())
                    .with_opt_attr("media", icon.media.as_deref())
            })
        })
        .collect()
}

/// `og:*` properties.
pub fn open_graph_tags(meta: &Metadata) -> Vec<Tag> {
    let Some(og) = &meta.open_graph else {
        return Vec::new();
    };
    let mut tags = Vec::new();
    let mut prop = |name: &str, value: Option<&str>| {
        if let Some(v) = value {
            tags.push(Tag::meta_property(name, v));
        }
    };
    prop("og:title", og.title.as_deref());
    prop("og:description", og.description.as_deref());
    prop("og:url", og.url.as_deref());
    prop("og:site_name", og.site_name.as_deref());
    prop("og:locale", og.locale.as_deref());
    for image in &og.images {
        prop("og:image", Some(&image.url));
        prop("og:image:width", image.width.map(|w| w.to_string()).as_deref());
        prop("og:image:height", image.height.map(|h| h.to_string()).as_deref());
        prop("og:image:alt", image.alt.as_deref());
    }
    prop("og:type", og.og_type.as_deref());
    tags
}

/// `twitter:*` names.
pub fn twitter_tags(meta: &Metadata) -> Vec<Tag> {
    let Some(twitter) = &meta.twitter else {
        return Vec::new();
    };
    let mut tags = Vec::new();
    let mut named = |name: &str, value: Option<&str>| {
        if let Some(v) = value {
            tags.push(Tag::meta_name(name, v));
        }
    };
    named("twitter:card", twitter.card.as_deref());
    named("twitter:site", twitter.site.as_deref());
    named("twitter:site:id", twitter.site_id.as_deref());
    named("twitter:creator", twitter.creator.as_deref());
    named("twitter:creator:id", twitter.creator_id.as_deref());
    named("twitter:title", twitter.title.as_deref());
    named("twitter:description", twitter.description.as_deref());
    for image in &twitter.images {
        named("twitter:image", Some(image));
    }
    tags
}

/// Ownership verification tokens.
pub fn verification_tags(meta: &Metadata) -> Vec<Tag> {
    let Some(v) = &meta.verification else {
        return Vec::new();
    };
    let fixed = [
        ("google-site-verification", &v.google),
        ("yandex-verification", &v.yandex),
        ("y_key", &v.yahoo),
        ("me", &v.me),
    ];
    let mut tags: Vec<Tag> = fixed
        .into_iter()
        .flat_map(|(name, tokens)| tokens.iter().map(move |t| Tag::meta_name(name, t)))
        .collect();
    for (name, tokens) in &v.other {
        tags.extend(tokens.iter().map(|t| Tag::meta_name(name, t)));
    }
    tags
}

/// Apple web app, format detection and iTunes app banner.
pub fn platform_tags(meta: &Metadata) -> Vec<Tag> {
    let mut tags = Vec::new();
    if let Some(app) = &meta.apple_web_app {
        if app.capable == Some(true) {
            tags.push(Tag::meta_name("mobile-web-app-capable", "yes"));
        }
        if let Some(title) = &app.title {
            tags.push(Tag::meta_name("apple-mobile-web-app-title", title));
        }
        if let Some(style) = &app.status_bar_style {
            tags.push(Tag::meta_name("apple-mobile-web-app-status-bar-style", style));
        }
    }
    if let Some(fd) = &meta.format_detection {
        let disabled: Vec<String> = [
            ("telephone", fd.telephone),
            ("date", fd.date),
            ("address", fd.address),
            ("email", fd.email),
            ("url", fd.url),
        ]
        .into_iter()
        .filter(|(_, allowed)| *allowed == Some(false))
        .map(|(name, _)| format!("{}=no", name))
        .collect();
        if !disabled.is_empty() {
            tags.push(Tag::meta_name("format-detection", &disabled.join(", ")));
        }
    }
    if let Some(itunes) = &meta.itunes {
        let mut content = format!("app-id={}", itunes.app_id);
        if let Some(arg) = &itunes.app_argument {
            content.push_str(&format!(", app-argument={}", arg));
        }
        tags.push(Tag::meta_name("apple-itunes-app", &content));
    }
    tags
}

/// Free-form `<meta name>` pairs.
pub fn other_tags(meta: &Metadata) -> Vec<Tag> {
    meta.other
        .iter()
        .flat_map(|(name, values)| match values {
            OneOrMany::One(v) => vec![Tag::meta_name(name, v)],
            OneOrMany::Many(vs) => vs.iter().map(|v| Tag::meta_name(name, v)).collect(),
        })
        .collect()
}

/// Every tag for a metadata value, in emission order.
pub fn metadata_tags(meta: &Metadata) -> Vec<Tag> {
    let families: [fn(&Metadata) -> Vec<Tag>; 9] = [
        basic_tags,
        robots_tags,
        alternate_tags,
        icon_tags,
        open_graph_tags,
        twitter_tags,
        verification_tags,
        platform_tags,
        other_tags,
    ];
    families.iter().flat_map(|family| family(meta)).collect()
}
