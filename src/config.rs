use crate::errors::{Result, RouteError, SiteError};
use crate::head::HeadConfig;
use crate::pipeline::CssPipeline;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Build mode, normally taken from `NODE_ENV`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    /// `production` (any case) selects a production build; every other
    /// value, `test` and `staging` included, is a development build.
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            BuildMode::Production
        } else {
            BuildMode::Development
        }
    }
}

impl std::str::FromStr for BuildMode {
    type Err = Infallible;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_env_value(value))
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Development => write!(f, "development"),
            BuildMode::Production => write!(f, "production"),
        }
    }
}

/// Site configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site_name: String,
    pub site_description: String,
    pub site_url: String,

    /// `%s` is replaced by the page title
    pub title_template: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<PathBuf>,

    pub transformers: Transformers,
    pub plugins: Vec<Plugin>,
    pub css: CssPipeline,
    pub head: HeadConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "v-bind".to_string(),
            site_description: "A blog about Vue.js".to_string(),
            site_url: "https://v-bind.com".to_string(),
            title_template: "%s | v-bind".to_string(),
            icon: None,
            transformers: Transformers::default(),
            plugins: vec![
                Plugin::SourceFilesystem(SourceFilesystemOptions::default()),
                Plugin::GoogleAnalytics(AnalyticsOptions::default()),
                Plugin::Sitemap(SitemapOptions::default()),
                Plugin::Rss(RssOptions::default()),
            ],
            css: CssPipeline::default(),
            head: HeadConfig::default(),
        }
    }
}

/// Content transformers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transformers {
    pub remark: RemarkConfig,
}

/// Markdown transformer options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemarkConfig {
    pub external_links_target: String,
    pub external_links_rel: Vec<String>,
    pub plugins: Vec<RemarkPlugin>,
}

impl Default for RemarkConfig {
    fn default() -> Self {
        let mut options = serde_json::Map::new();
        options.insert(
            "theme".to_string(),
            serde_json::Value::String("Material-Theme-Palenight".to_string()),
        );
        Self {
            external_links_target: "_blank".to_string(),
            external_links_rel: vec![
                "nofollow".to_string(),
                "noopener".to_string(),
                "noreferrer".to_string(),
            ],
            plugins: vec![RemarkPlugin {
                name: "gridsome-plugin-remark-shiki".to_string(),
                options,
            }],
        }
    }
}

impl RemarkConfig {
    /// Attributes added to links that leave the site
    pub fn external_link_attrs(&self) -> Vec<(&'static str, String)> {
        let mut attrs = Vec::new();
        if !self.external_links_target.is_empty() {
            attrs.push(("target", self.external_links_target.clone()));
        }
        if !self.external_links_rel.is_empty() {
            attrs.push(("rel", self.external_links_rel.join(" ")));
        }
        attrs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemarkPlugin {
    pub name: String,
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// Build plugins, tagged by the package they configure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "use", content = "options")]
pub enum Plugin {
    #[serde(rename = "@gridsome/source-filesystem")]
    SourceFilesystem(SourceFilesystemOptions),
    #[serde(rename = "@gridsome/plugin-google-analytics")]
    GoogleAnalytics(AnalyticsOptions),
    #[serde(rename = "@gridsome/plugin-sitemap")]
    Sitemap(SitemapOptions),
    #[serde(rename = "gridsome-plugin-rss")]
    Rss(RssOptions),
}

/// A route such as `/tag/:id`; `:name` segments are parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTemplate(String);

impl RouteTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parameter names in order of appearance
    pub fn params(&self) -> Vec<&str> {
        self.0
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
            .collect()
    }

    pub fn validate(&self) -> std::result::Result<(), RouteError> {
        if self.0.starts_with('/') {
            Ok(())
        } else {
            Err(RouteError::NotAbsolute(self.0.clone()))
        }
    }

    /// Substitute every `:name` segment from `values`
    pub fn render(&self, values: &[(&str, &str)]) -> std::result::Result<String, RouteError> {
        self.validate()?;
        let segments = self
            .0
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => values
                    .iter()
                    .find(|(name, _)| *name == param)
                    .map(|(_, value)| value.to_string())
                    .ok_or_else(|| RouteError::MissingParam {
                        route: self.0.clone(),
                        param: param.to_string(),
                    }),
                None => Ok(segment.to_string()),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(segments.join("/"))
    }
}

/// Markdown posts read from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFilesystemOptions {
    pub path: String,
    pub type_name: String,
    pub route: RouteTemplate,
    pub refs: IndexMap<String, TaxonomyRef>,
}

impl Default for SourceFilesystemOptions {
    fn default() -> Self {
        Self {
            path: "content/posts/**/*.md".to_string(),
            type_name: "Post".to_string(),
            route: RouteTemplate::new("/:slug"),
            refs: IndexMap::from([
                (
                    "tags".to_string(),
                    TaxonomyRef {
                        type_name: "Tag".to_string(),
                        route: RouteTemplate::new("/tag/:id"),
                        create: true,
                    },
                ),
                (
                    "author".to_string(),
                    TaxonomyRef {
                        type_name: "Author".to_string(),
                        route: RouteTemplate::new("/author/:id"),
                        create: true,
                    },
                ),
            ]),
        }
    }
}

/// A field of a post that links to another content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRef {
    pub type_name: String,
    pub route: RouteTemplate,
    /// Create the referenced nodes when they do not exist yet
    #[serde(default)]
    pub create: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsOptions {
    pub id: String,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            id: "UA-135781014-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapOptions {
    /// Milliseconds
    pub cache_time: u64,
}

impl Default for SitemapOptions {
    fn default() -> Self {
        Self { cache_time: 600_000 }
    }
}

impl SitemapOptions {
    pub fn cache_duration(&self) -> Duration {
        Duration::from_millis(self.cache_time)
    }
}

/// Feed generation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RssOptions {
    pub content_type_name: String,
    pub feed_options: FeedOptions,
    pub output: FeedOutput,
}

impl Default for RssOptions {
    fn default() -> Self {
        Self {
            content_type_name: "Post".to_string(),
            feed_options: FeedOptions::default(),
            output: FeedOutput::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedOptions {
    pub title: String,
    pub feed_url: String,
    pub site_url: String,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            title: "A blog about Vue.js".to_string(),
            feed_url: "https://v-bind.com/feed.xml".to_string(),
            site_url: "https://v-bind.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedOutput {
    pub dir: PathBuf,
    pub name: String,
}

impl Default for FeedOutput {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./static"),
            name: "feed.xml".to_string(),
        }
    }
}

/// The parts of a post the feed reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostNode {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub fields: PostFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFields {
    pub description: Option<String>,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// One entry of the RSS feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl RssOptions {
    /// Map a post to its feed entry; the URL is the site URL plus the slug
    pub fn feed_item(&self, node: &PostNode) -> FeedItem {
        FeedItem {
            title: node.title.clone(),
            description: node.fields.description.clone(),
            url: format!(
                "{}/{}",
                self.feed_options.site_url.trim_end_matches('/'),
                node.slug.trim_start_matches('/')
            ),
            author: node.fields.author.clone(),
            date: node.fields.date,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.name)
    }
}

impl SiteConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = read_config(path)?;
        serde_yaml::from_str(&content).map_err(|e| SiteError::ConfigError {
            message: format!("Failed to parse YAML config: {}", e),
        })
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = read_config(path)?;
        serde_json::from_str(&content).map_err(|e| SiteError::ConfigError {
            message: format!("Failed to parse JSON config: {}", e),
        })
    }

    /// Load configuration from a file (auto-detect format)
    pub fn from_file(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(SiteError::ConfigError {
                message: format!(
                    "Unsupported config file format: {}. Use .yaml, .yml, or .json",
                    path.display()
                ),
            }),
        }
    }

    /// The file's configuration when a path is given, the defaults otherwise;
    /// validated either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.site_url.starts_with("http://") || self.site_url.starts_with("https://")) {
            return Err(config_error(format!(
                "site_url must be an http(s) URL, got '{}'",
                self.site_url
            )));
        }
        if !self.title_template.contains("%s") {
            return Err(config_error(format!(
                "title_template '{}' has no %s placeholder",
                self.title_template
            )));
        }
        self.css.purge.keep_patterns().map_err(|e| {
            config_error(format!("invalid whitelist pattern: {}", e))
        })?;
        if let Some(source) = self.source_filesystem() {
            let routes = std::iter::once(&source.route)
                .chain(source.refs.values().map(|r| &r.route));
            for route in routes {
                route.validate()?;
            }
        }
        Ok(())
    }

    pub fn page_title(&self, title: &str) -> String {
        self.title_template.replace("%s", title)
    }

    pub fn source_filesystem(&self) -> Option<&SourceFilesystemOptions> {
        self.plugins.iter().find_map(|plugin| match plugin {
            Plugin::SourceFilesystem(options) => Some(options),
            _ => None,
        })
    }

    pub fn rss(&self) -> Option<&RssOptions> {
        self.plugins.iter().find_map(|plugin| match plugin {
            Plugin::Rss(options) => Some(options),
            _ => None,
        })
    }

    pub fn sitemap(&self) -> Option<&SitemapOptions> {
        self.plugins.iter().find_map(|plugin| match plugin {
            Plugin::Sitemap(options) => Some(options),
            _ => None,
        })
    }

    pub fn analytics(&self) -> Option<&AnalyticsOptions> {
        self.plugins.iter().find_map(|plugin| match plugin {
            Plugin::GoogleAnalytics(options) => Some(options),
            _ => None,
        })
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| SiteError::ConfigError {
        message: format!("Failed to read config file {}: {}", path.display(), e),
    })
}

fn config_error(message: String) -> SiteError {
    SiteError::ConfigError { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_mode_from_env_value() {
        assert_eq!(BuildMode::from_env_value("production"), BuildMode::Production);
        assert_eq!(BuildMode::from_env_value("Production"), BuildMode::Production);
        assert_eq!(BuildMode::from_env_value("development"), BuildMode::Development);
        assert_eq!(BuildMode::from_env_value("test"), BuildMode::Development);
        assert_eq!(BuildMode::from_env_value(""), BuildMode::Development);
        assert_eq!("staging".parse::<BuildMode>(), Ok(BuildMode::Development));
    }

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_title("Hello"), "Hello | v-bind");
        assert_eq!(config.analytics().unwrap().id, "UA-135781014-1");
        assert_eq!(
            config.sitemap().unwrap().cache_duration(),
            Duration::from_secs(600)
        );
        assert_eq!(
            config.rss().unwrap().output_path(),
            PathBuf::from("./static/feed.xml")
        );
    }

    #[test]
    fn test_external_link_attrs() {
        let attrs = RemarkConfig::default().external_link_attrs();
        assert_eq!(
            attrs,
            vec![
                ("target", "_blank".to_string()),
                ("rel", "nofollow noopener noreferrer".to_string()),
            ]
        );
    }

    #[test]
    fn test_route_rendering() {
        let source = SourceFilesystemOptions::default();
        assert_eq!(source.route.render(&[("slug", "vue-3")]).unwrap(), "/vue-3");
        let tags = &source.refs["tags"];
        assert_eq!(tags.route.params(), vec!["id"]);
        assert_eq!(tags.route.render(&[("id", "vuex")]).unwrap(), "/tag/vuex");
    }

    #[test]
    fn test_route_missing_param() {
        let route = RouteTemplate::new("/author/:id");
        assert_eq!(
            route.render(&[("slug", "x")]),
            Err(RouteError::MissingParam {
                route: "/author/:id".to_string(),
                param: "id".to_string(),
            })
        );
        assert!(RouteTemplate::new("tag/:id").validate().is_err());
    }

    #[test]
    fn test_feed_item_mapping() {
        let rss = RssOptions::default();
        let date = Utc.with_ymd_and_hms(2019, 3, 1, 9, 0, 0).unwrap();
        let node = PostNode {
            title: "Renderless components".to_string(),
            slug: "renderless-components".to_string(),
            fields: PostFields {
                description: Some("Logic without markup".to_string()),
                author: Some("v-bind".to_string()),
                date: Some(date),
            },
        };
        let item = rss.feed_item(&node);
        assert_eq!(item.url, "https://v-bind.com/renderless-components");
        assert_eq!(item.title, "Renderless components");
        assert_eq!(item.description.as_deref(), Some("Logic without markup"));
        assert_eq!(item.date, Some(date));
    }

    #[test]
    fn test_yaml_config_loading() {
        let yaml_content = r##"
site_name: "my-blog"
site_url: "https://example.org"
title_template: "%s - my-blog"
plugins:
  - use: "@gridsome/plugin-google-analytics"
    options:
      id: "UA-1"
  - use: "gridsome-plugin-rss"
    options:
      feed_options:
        site_url: "https://example.org/"
css:
  purge:
    whitelist_patterns: ["shiki", "^\\.token"]
"##;
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(yaml_content.as_bytes()).unwrap();

        let config = SiteConfig::from_file(file.path()).unwrap();
        assert_eq!(config.site_name, "my-blog");
        assert_eq!(config.site_description, "A blog about Vue.js");
        assert_eq!(config.plugins.len(), 2);
        assert!(config.source_filesystem().is_none());
        assert_eq!(config.css.purge.whitelist_patterns.len(), 2);
        assert_eq!(config.css.purge.content.len(), 3);

        let node = PostNode {
            title: "t".to_string(),
            slug: "post".to_string(),
            ..PostNode::default()
        };
        assert_eq!(config.rss().unwrap().feed_item(&node).url, "https://example.org/post");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_config_loading() {
        let json_content = r#"{
  "site_name": "json-blog",
  "head": { "html_attrs": { "lang": "fr" } }
}"#;
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(json_content.as_bytes()).unwrap();

        let config = SiteConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.site_name, "json-blog");
        assert_eq!(config.head.html_attrs.get("lang"), Some(&"fr".to_string()));
        assert_eq!(config.head.layout.name, "Layout");
    }

    #[test]
    fn test_unsupported_format() {
        let file = NamedTempFile::with_suffix(".toml").unwrap();
        let err = SiteConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = SiteConfig::default();
        config.site_url = "v-bind.com".to_string();
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.title_template = "v-bind".to_string();
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.css.purge.whitelist_patterns = vec!["[".to_string()];
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        if let Some(Plugin::SourceFilesystem(source)) = config.plugins.first_mut() {
            source.route = RouteTemplate::new(":slug");
        }
        assert!(matches!(
            config.validate(),
            Err(SiteError::RouteError(RouteError::NotAbsolute(_)))
        ));
    }

    #[test]
    fn test_roundtrip_through_yaml() {
        let config = SiteConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: SiteConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
