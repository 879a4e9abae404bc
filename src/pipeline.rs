use crate::config::BuildMode;
use crate::purge::PurgeConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A postcss plugin in the stylesheet loader chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plugin")]
pub enum PostcssPlugin {
    #[serde(rename = "postcss-import")]
    Import,
    #[serde(rename = "postcss-nested")]
    Nested,
    #[serde(rename = "tailwindcss")]
    Tailwind { config: PathBuf },
    #[serde(rename = "@fullhuman/postcss-purgecss")]
    Purgecss(PurgeConfig),
    #[serde(rename = "other")]
    Other { name: String },
}

impl PostcssPlugin {
    /// npm package name of the plugin
    pub fn name(&self) -> &str {
        match self {
            PostcssPlugin::Import => "postcss-import",
            PostcssPlugin::Nested => "postcss-nested",
            PostcssPlugin::Tailwind { .. } => "tailwindcss",
            PostcssPlugin::Purgecss(_) => "@fullhuman/postcss-purgecss",
            PostcssPlugin::Other { name } => name,
        }
    }
}

/// How the `css` loader's postcss options are customized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CssPipeline {
    /// Tailwind configuration file handed to the tailwindcss plugin
    pub tailwind_config: PathBuf,

    /// Purge options, used in production builds only
    pub purge: PurgeConfig,
}

impl Default for CssPipeline {
    fn default() -> Self {
        Self {
            tailwind_config: PathBuf::from("tailwind.js"),
            purge: PurgeConfig::default(),
        }
    }
}

impl CssPipeline {
    pub fn purge_enabled(&self, mode: BuildMode) -> bool {
        mode == BuildMode::Production
    }

    /// Plugin list after customization: import, nested and tailwind go in
    /// front of `existing` (in that order), purgecss goes last in production.
    pub fn apply(&self, existing: Vec<PostcssPlugin>, mode: BuildMode) -> Vec<PostcssPlugin> {
        let mut plugins = Vec::with_capacity(existing.len() + 4);
        plugins.push(PostcssPlugin::Import);
        plugins.push(PostcssPlugin::Nested);
        plugins.push(PostcssPlugin::Tailwind {
            config: self.tailwind_config.clone(),
        });
        plugins.extend(existing);
        if self.purge_enabled(mode) {
            plugins.push(PostcssPlugin::Purgecss(self.purge.clone()));
        }
        plugins
    }
}
