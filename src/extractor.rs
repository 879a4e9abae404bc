use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Characters that may appear in a utility-class token.
///
/// Wider than CSS class-name syntax: variants (`md:flex`) and fractions
/// (`w-1/2`) stay whole. The scan may over-extract but never under-extracts.
const TOKEN_PATTERN: &str = r"[A-Za-z0-9_:/-]+";

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("token pattern is a valid regex"));

/// Something that turns a file's contents into candidate class names.
///
/// Implementations must be total over all inputs and free of side effects;
/// the purge step calls them from many threads at once.
pub trait Extractor: Send + Sync {
    fn extract(&self, content: &str) -> Vec<String>;
}

/// Regex-based token scanner used for CSS, Vue single-file components and
/// plain JavaScript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailwindExtractor;

impl TailwindExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for TailwindExtractor {
    fn extract(&self, content: &str) -> Vec<String> {
        extract(content)
    }
}

/// Known extractors that a configuration file can refer to by name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    #[default]
    Tailwind,
}

impl ExtractorKind {
    pub fn build(self) -> Box<dyn Extractor> {
        match self {
            ExtractorKind::Tailwind => Box::new(TailwindExtractor),
        }
    }
}

/// Borrowing scan over `content`, yielding each maximal token run in order.
pub fn tokens(content: &str) -> impl Iterator<Item = &str> {
    TOKEN_RE.find_iter(content).map(|m| m.as_str())
}

/// Extract every candidate class token from `content`.
///
/// Tokens come back in order of appearance, duplicates included. Anything
/// outside `[A-Za-z0-9_:/-]` (non-ASCII letters too) is a separator.
pub fn extract(content: &str) -> Vec<String> {
    tokens(content).map(str::to_owned).collect()
}
