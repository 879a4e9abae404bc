//! Client bootstrap: global layout registration and static `<head>` data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::debug;

const GOOGLE_FONTS: &str =
    "https://fonts.googleapis.com/css?family=Roboto:400,700|IBM+Plex+Mono:300i";

/// A component made available to every page under `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub name: String,
    pub path: PathBuf,
}

/// A `<link>` tag injected into the document head
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTag {
    pub rel: String,
    pub href: String,
}

/// What the bootstrap applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadConfig {
    pub layout: ComponentSpec,
    pub html_attrs: IndexMap<String, String>,
    pub body_attrs: IndexMap<String, String>,
    pub links: Vec<LinkTag>,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            layout: ComponentSpec {
                name: "Layout".to_string(),
                path: PathBuf::from("~/layouts/Default.vue"),
            },
            html_attrs: IndexMap::from([
                ("lang".to_string(), "en".to_string()),
                ("class".to_string(), "h-full".to_string()),
            ]),
            body_attrs: IndexMap::from([(
                "class".to_string(),
                "antialiased font-sans".to_string(),
            )]),
            links: vec![LinkTag {
                rel: "stylesheet".to_string(),
                href: GOOGLE_FONTS.to_string(),
            }],
        }
    }
}

/// Globally registered components
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: IndexMap<String, PathBuf>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` under `name`, returning the previous registration
    pub fn register(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.components.insert(name.into(), path.into())
    }

    pub fn get(&self, name: &str) -> Option<&PathBuf> {
        self.components.get(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Mutable document head state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Head {
    pub html_attrs: IndexMap<String, String>,
    pub body_attrs: IndexMap<String, String>,
    pub link: Vec<LinkTag>,
}

impl Head {
    pub fn render_html_attrs(&self) -> String {
        render_attrs(&self.html_attrs)
    }

    pub fn render_body_attrs(&self) -> String {
        render_attrs(&self.body_attrs)
    }

    /// One `<link>` tag per line
    pub fn render_links(&self) -> String {
        self.link
            .iter()
            .map(|link| {
                format!(
                    "<link rel=\"{}\" href=\"{}\">",
                    escape_attr(&link.rel),
                    escape_attr(&link.href)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Run the one-time bootstrap: register the layout, replace the html/body
/// attributes and append the configured links.
pub fn bootstrap(config: &HeadConfig, registry: &mut ComponentRegistry, head: &mut Head) {
    if let Some(previous) = registry.register(config.layout.name.clone(), config.layout.path.clone()) {
        debug!(
            "Component '{}' re-registered (was {})",
            config.layout.name,
            previous.display()
        );
    }
    head.html_attrs = config.html_attrs.clone();
    head.body_attrs = config.body_attrs.clone();
    head.link.extend(config.links.iter().cloned());
}

fn render_attrs(attrs: &IndexMap<String, String>) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!("{}=\"{}\"", name, escape_attr(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
