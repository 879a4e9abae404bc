use crate::config::BuildMode;
use crate::css::PurgeStats;
use crate::purge::UsedClasses;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Metadata for the purge report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Version of the report format
    pub version: String,

    /// Timestamp when the report was generated
    pub generated_at: DateTime<Utc>,

    pub mode: BuildMode,

    /// Number of files whose contents went through an extractor
    pub files_scanned: usize,

    /// Total tokens before deduplication
    pub tokens_extracted: usize,

    /// Distinct tokens, i.e. the size of the used-class set
    pub unique_classes: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
}

/// Statistics about the purge itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStatistics {
    pub rules_kept: usize,
    pub rules_removed: usize,
    pub selectors_removed: usize,

    /// Stylesheet size before purging
    pub input_size_bytes: usize,

    /// Stylesheet size after purging
    pub output_size_bytes: usize,

    /// Content bytes read by the scan
    pub bytes_scanned: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,

    /// Time spent reading and tokenizing content files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_time_ms: Option<u64>,

    /// Time spent purging the stylesheet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge_time_ms: Option<u64>,

    /// Most frequent tokens
    pub top_tokens: Vec<TopToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopToken {
    pub name: String,
    pub count: usize,
}

/// Complete report structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub metadata: ManifestMetadata,

    /// Token count per scanned file
    pub files: IndexMap<String, usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ManifestStatistics>,
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            metadata: ManifestMetadata {
                version: "1.0.0".to_string(),
                generated_at: Utc::now(),
                mode: BuildMode::default(),
                files_scanned: 0,
                tokens_extracted: 0,
                unique_classes: 0,
                tool_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
            files: IndexMap::new(),
            statistics: None,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder pattern for creating reports
pub struct ManifestBuilder {
    manifest: Manifest,
    top_tokens: Vec<TopToken>,
    bytes_scanned: u64,
    start_time: Option<Instant>,
    timings: Option<(Duration, Duration)>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            manifest: Manifest::new(),
            top_tokens: Vec::new(),
            bytes_scanned: 0,
            start_time: Some(Instant::now()),
            timings: None,
        }
    }

    /// Measure processing time from `start` instead of from `new()`
    pub fn started_at(mut self, start: Instant) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.manifest.metadata.mode = mode;
        self
    }

    /// Take file and token counts from the scan result
    pub fn with_used_classes(mut self, used: &UsedClasses) -> Self {
        let metadata = &mut self.manifest.metadata;
        metadata.files_scanned = used.files_scanned();
        metadata.tokens_extracted = used.total_tokens();
        metadata.unique_classes = used.unique_count();
        self.manifest.files = used.per_file.clone();
        self.bytes_scanned = used.bytes_scanned;

        let mut ranked: Vec<TopToken> = used
            .classes
            .iter()
            .map(|(name, &count)| TopToken {
                name: name.clone(),
                count,
            })
            .collect();
        // Stable sort keeps first-seen order among equal counts
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(10);
        self.top_tokens = ranked;
        self
    }

    /// Record how long the scan and the purge took
    pub fn with_timings(mut self, scan: Duration, purge: Duration) -> Self {
        self.timings = Some((scan, purge));
        self
    }

    /// Build the final report with purge statistics
    pub fn build(self, stats: PurgeStats, input_size: usize, output_size: usize) -> Manifest {
        let mut manifest = self.manifest;
        manifest.statistics = Some(ManifestStatistics {
            rules_kept: stats.rules_kept,
            rules_removed: stats.rules_removed,
            selectors_removed: stats.selectors_removed,
            input_size_bytes: input_size,
            output_size_bytes: output_size,
            bytes_scanned: self.bytes_scanned,
            processing_time_ms: self.start_time.map(|t| t.elapsed().as_millis() as u64),
            scan_time_ms: self.timings.map(|(scan, _)| scan.as_millis() as u64),
            purge_time_ms: self.timings.map(|(_, purge)| purge.as_millis() as u64),
            top_tokens: self.top_tokens,
        });
        manifest
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
