use crate::css::{purge_css, PurgeOutcome};
use crate::errors::Result;
use crate::extractor::{Extractor, ExtractorKind};
use indexmap::IndexMap;
use indicatif::ProgressBar;
use rayon::prelude::*;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Options handed to the purge step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurgeConfig {
    /// Glob patterns of files to scan for class names
    pub content: Vec<String>,

    /// Which extractor handles which file extensions
    pub extractors: Vec<ExtractorBinding>,

    /// Regular expressions; a selector matching any of them is never removed
    pub whitelist_patterns: Vec<String>,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            content: vec![
                "src/assets/**/*.css".to_string(),
                "src/**/*.vue".to_string(),
                "src/**/*.js".to_string(),
            ],
            extractors: vec![ExtractorBinding::default()],
            whitelist_patterns: vec!["shiki".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorBinding {
    pub extractor: ExtractorKind,
    pub extensions: Vec<String>,
}

impl Default for ExtractorBinding {
    fn default() -> Self {
        Self {
            extractor: ExtractorKind::Tailwind,
            extensions: vec!["css".to_string(), "vue".to_string(), "js".to_string()],
        }
    }
}

impl PurgeConfig {
    /// Compile the always-keep patterns
    pub fn keep_patterns(&self) -> Result<RegexSet> {
        Ok(RegexSet::new(&self.whitelist_patterns)?)
    }

    /// Instantiate the configured extractors
    pub fn extractors(&self) -> Extractors {
        Extractors {
            bindings: self
                .extractors
                .iter()
                .map(|binding| {
                    let extensions = binding
                        .extensions
                        .iter()
                        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                        .collect();
                    (binding.extractor.build(), extensions)
                })
                .collect(),
        }
    }
}

/// Extractors keyed by file extension
pub struct Extractors {
    bindings: Vec<(Box<dyn Extractor>, Vec<String>)>,
}

impl Extractors {
    /// The first extractor bound to the file's extension, if any
    pub fn for_path(&self, path: &Path) -> Option<&dyn Extractor> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.bindings
            .iter()
            .find(|(_, extensions)| extensions.contains(&ext))
            .map(|(extractor, _)| extractor.as_ref())
    }
}

/// Tokens pulled out of a single file
#[derive(Debug, Clone)]
pub struct FileTokens {
    pub path: PathBuf,
    pub tokens: Vec<String>,
}

/// The union of all tokens found in the content corpus
#[derive(Debug, Clone, Default)]
pub struct UsedClasses {
    /// Every distinct token with its occurrence count, in first-seen order
    pub classes: IndexMap<String, usize>,

    /// Token count per scanned file
    pub per_file: IndexMap<String, usize>,

    /// Files that had no extractor bound to their extension
    pub files_skipped: usize,

    /// Bytes read from disk
    pub bytes_scanned: u64,
}

impl UsedClasses {
    /// Fold per-file results into one set. Files are merged in slice order,
    /// so the result does not depend on how the scan was scheduled.
    pub fn from_files(files: Vec<FileTokens>) -> Self {
        let mut used = Self::default();
        for file in files {
            used.per_file
                .insert(file.path.display().to_string(), file.tokens.len());
            for token in file.tokens {
                *used.classes.entry(token).or_insert(0) += 1;
            }
        }
        used
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn unique_count(&self) -> usize {
        self.classes.len()
    }

    pub fn total_tokens(&self) -> usize {
        self.classes.values().sum()
    }

    pub fn files_scanned(&self) -> usize {
        self.per_file.len()
    }

    /// Remove unused rules from `css` using this set and `keep`
    pub fn purge(&self, css: &str, keep: &RegexSet) -> PurgeOutcome {
        purge_css(css, &self.classes, keep)
    }
}

/// Read one file and run its extractor once over the whole contents.
///
/// Returns `Ok(None)` when no extractor handles the file's extension.
pub fn scan_file(path: &Path, extractors: &Extractors) -> Result<Option<FileTokens>> {
    let Some(extractor) = extractors.for_path(path) else {
        debug!("No extractor for {}, skipping", path.display());
        return Ok(None);
    };
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let tokens = extractor.extract(&content);
    debug!("{}: {} tokens", path.display(), tokens.len());
    Ok(Some(FileTokens {
        path: path.to_path_buf(),
        tokens,
    }))
}

/// Scan `files` in parallel and union their tokens
pub fn collect_used_classes(
    files: &[PathBuf],
    config: &PurgeConfig,
    progress_bar: Option<&ProgressBar>,
) -> Result<UsedClasses> {
    let extractors = config.extractors();
    let bytes = AtomicU64::new(0);

    let results: Result<Vec<Option<FileTokens>>> = files
        .par_iter()
        .map(|path| {
            let scanned = scan_file(path, &extractors);
            if let Ok(Some(_)) = &scanned {
                let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                bytes.fetch_add(size, Ordering::Relaxed);
            }
            if let Some(pb) = progress_bar {
                pb.inc(1);
                pb.set_message(format!(
                    "Scanning: {}",
                    path.file_name().unwrap_or_default().to_string_lossy()
                ));
            }
            scanned
        })
        .collect();

    let results = results?;
    let skipped = results.iter().filter(|r| r.is_none()).count();
    let mut used = UsedClasses::from_files(results.into_iter().flatten().collect());
    used.files_skipped = skipped;
    used.bytes_scanned = bytes.into_inner();
    Ok(used)
}
