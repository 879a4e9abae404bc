pub mod args;
pub mod config;
pub mod css;
pub mod errors;
pub mod extractor;
pub mod head;
pub mod manifest;
pub mod pipeline;
pub mod purge;

pub use args::{Cli, Commands, ConfigArgs, ExtractArgs, HeadArgs, OutputFormat, PurgeArgs};
pub use config::{BuildMode, SiteConfig};
pub use css::{purge_css, PurgeOutcome, PurgeStats};
pub use errors::{Result, RouteError, SiteError};
pub use extractor::{extract, Extractor, TailwindExtractor};
pub use head::{bootstrap, ComponentRegistry, Head, HeadConfig};
pub use manifest::{Manifest, ManifestBuilder};
pub use pipeline::{CssPipeline, PostcssPlugin};
pub use purge::{collect_used_classes, PurgeConfig, UsedClasses};

use indexmap::IndexSet;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Security configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Maximum file size in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Allow symbolic links
    pub allow_symlinks: bool,
    /// Working directory for path traversal checks
    pub working_directory: PathBuf,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            allow_symlinks: false,
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl SecurityConfig {
    fn rooted_at(root: Option<&Path>, allow_symlinks: bool) -> Self {
        let mut security = Self {
            allow_symlinks,
            ..Self::default()
        };
        if let Some(root) = root {
            security.working_directory = root.to_path_buf();
        }
        security
    }
}

/// Result of the purge process
#[derive(Debug)]
pub struct PurgeResult {
    pub css_content: String,
    pub manifest: Manifest,
    pub mode: BuildMode,
    pub stats: PurgeStats,
    pub total_classes: usize,
    pub total_files_scanned: usize,
}

/// Purge the stylesheet named in `args` against the content corpus.
///
/// In development mode the stylesheet is passed through unchanged and no
/// content is scanned.
pub fn purge(args: PurgeArgs) -> Result<PurgeResult> {
    let start_time = Instant::now();
    let mut scan_duration = Duration::ZERO;
    let mut purge_duration = Duration::ZERO;

    args.validate().map_err(SiteError::InvalidInput)?;

    let config = SiteConfig::load(args.config.as_deref())?;
    let security = SecurityConfig::rooted_at(args.root.as_deref(), args.allow_symlinks);

    validate_output_path(&args.output, &security)?;
    if let Some(manifest) = &args.manifest {
        validate_output_path(manifest, &security)?;
    }

    validate_input_file(&args.css, &security)?;
    let input_css = fs::read_to_string(&args.css).map_err(|e| SiteError::ReadError {
        path: args.css.display().to_string(),
        message: e.to_string(),
    })?;

    info!("Purging {} in {} mode", args.css.display(), args.mode);

    let pipeline = &config.css;
    let (css_content, stats, used) = if pipeline.purge_enabled(args.mode) {
        let keep = pipeline.purge.keep_patterns()?;
        let patterns = if args.input.is_empty() {
            pipeline.purge.content.clone()
        } else {
            args.input.clone()
        };
        let patterns = resolve_patterns(&patterns, args.root.as_deref());
        debug!("Content patterns: {:?}", patterns);

        let excludes = resolve_patterns(&args.exclude, args.root.as_deref());
        let files = collect_files_with_security(&patterns, &excludes, &security)?;
        if files.is_empty() {
            return Err(SiteError::NoFilesFound);
        }
        let total_size: u64 = files.iter().map(|f| f.1).sum();
        debug!(
            "Found {} files to scan ({:.2} MB)",
            files.len(),
            total_size as f64 / (1024.0 * 1024.0)
        );

        let progress_bar = (!args.no_progress).then(|| new_progress_bar(files.len() as u64));
        let file_paths: Vec<PathBuf> = files.into_iter().map(|(path, _)| path).collect();

        let scan_start = Instant::now();
        let used = match args.jobs {
            Some(jobs) => rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()?
                .install(|| collect_used_classes(&file_paths, &pipeline.purge, progress_bar.as_ref()))?,
            None => collect_used_classes(&file_paths, &pipeline.purge, progress_bar.as_ref())?,
        };
        scan_duration = scan_start.elapsed();

        if let Some(pb) = &progress_bar {
            pb.set_message("Purging stylesheet...");
        }
        let purge_start = Instant::now();
        let outcome = used.purge(&input_css, &keep);
        purge_duration = purge_start.elapsed();

        if let Some(pb) = progress_bar {
            pb.finish_with_message(format!(
                "✓ {} rules removed, {} kept",
                outcome.stats.rules_removed, outcome.stats.rules_kept
            ));
        }
        (outcome.css, outcome.stats, used)
    } else {
        debug!("Purge disabled in {} mode, passing stylesheet through", args.mode);
        (input_css.clone(), PurgeStats::default(), UsedClasses::default())
    };

    let manifest = ManifestBuilder::new()
        .started_at(start_time)
        .with_mode(args.mode)
        .with_used_classes(&used)
        .with_timings(scan_duration, purge_duration)
        .build(stats, input_css.len(), css_content.len());

    let result = PurgeResult {
        css_content,
        manifest,
        mode: args.mode,
        stats,
        total_classes: used.unique_count(),
        total_files_scanned: used.files_scanned(),
    };

    if !args.dry_run {
        write_output_files(&args, &result)?;
    }

    info!(
        "Scanned {} files, {} unique classes, removed {} of {} rules in {:.2}s",
        result.total_files_scanned,
        result.total_classes,
        stats.rules_removed,
        stats.rules_removed + stats.rules_kept,
        start_time.elapsed().as_secs_f64()
    );

    Ok(result)
}

fn new_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    pb.set_message("Starting scan...");
    pb
}

/// Join relative patterns onto `root`
fn resolve_patterns(patterns: &[String], root: Option<&Path>) -> Vec<String> {
    match root {
        Some(root) => patterns
            .iter()
            .map(|pattern| {
                if Path::new(pattern).is_absolute() {
                    pattern.clone()
                } else {
                    root.join(pattern.trim_start_matches("./"))
                        .display()
                        .to_string()
                }
            })
            .collect(),
        None => patterns.to_vec(),
    }
}

/// Validate that a path is safe (no path traversal)
fn validate_output_path(path: &Path, security: &SecurityConfig) -> Result<()> {
    use std::path::Component;

    if path.is_absolute() {
        return Ok(());
    }

    // Resolve `..` lexically; the target may not exist yet
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::ParentDir if depth == 0 => {
                return Err(SiteError::SecurityError(format!(
                    "Output path '{}' appears to use path traversal outside {}",
                    path.display(),
                    security.working_directory.display()
                )));
            }
            Component::ParentDir => depth -= 1,
            Component::Normal(_) => depth += 1,
            _ => {}
        }
    }

    Ok(())
}

/// Check if a file is safe to read
fn validate_input_file(path: &Path, security: &SecurityConfig) -> Result<()> {
    if !security.allow_symlinks && path.is_symlink() {
        return Err(SiteError::SecurityError(format!(
            "Symbolic link not allowed: {}",
            path.display()
        )));
    }

    if security.allow_symlinks && path.is_symlink() {
        let target = fs::canonicalize(path).map_err(|e| {
            SiteError::SecurityError(format!(
                "Cannot resolve symlink target for '{}': {}",
                path.display(),
                e
            ))
        })?;
        let working_dir = security
            .working_directory
            .canonicalize()
            .unwrap_or_else(|_| security.working_directory.clone());

        if !target.starts_with(&working_dir) {
            return Err(SiteError::SecurityError(format!(
                "Symlink target '{}' is outside working directory",
                target.display()
            )));
        }
    }

    let metadata = fs::metadata(path).map_err(|e| SiteError::ReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    if metadata.len() > security.max_file_size {
        return Err(SiteError::SecurityError(format!(
            "File '{}' exceeds maximum size limit ({} MB > {} MB)",
            path.display(),
            metadata.len() / (1024 * 1024),
            security.max_file_size / (1024 * 1024)
        )));
    }

    Ok(())
}

/// Collect files matching the given patterns with security checks
fn collect_files_with_security(
    patterns: &[String],
    exclude_patterns: &[String],
    security: &SecurityConfig,
) -> Result<Vec<(PathBuf, u64)>> {
    let excludes = exclude_patterns
        .iter()
        .map(String::as_str)
        .map(glob::Pattern::new)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut files = Vec::new();
    let mut seen = IndexSet::new();
    let mut skipped_count = 0;

    for pattern in patterns {
        for entry in glob::glob(pattern)? {
            let path = entry?;

            if excludes.iter().any(|exclude| exclude.matches_path(&path)) {
                continue;
            }

            if path.is_dir() {
                continue;
            }

            if let Err(e) = validate_input_file(&path, security) {
                warn!("Skipping file - {}", e);
                skipped_count += 1;
                continue;
            }

            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

            if seen.insert(path.clone()) {
                files.push((path, size));
            }
        }
    }

    if skipped_count > 0 {
        warn!("Skipped {} files due to security constraints", skipped_count);
    }

    Ok(files)
}

/// Write the purge results to output files with atomic writes
fn write_output_files(args: &PurgeArgs, result: &PurgeResult) -> Result<()> {
    write_atomic(&args.output, &result.css_content).map_err(|e| SiteError::OutputError {
        path: args.output.display().to_string(),
        message: e.to_string(),
    })?;

    if let Some(manifest_path) = &args.manifest {
        let manifest_content = result.manifest.to_pretty_json()?;
        write_atomic(manifest_path, &manifest_content).map_err(|e| SiteError::OutputError {
            path: manifest_path.display().to_string(),
            message: e.to_string(),
        })?;
    }

    Ok(())
}

/// Write file atomically by writing to temp file then renaming
fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> std::io::Result<()> {
    use std::io::Write;

    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Tokens of `input`, one per line; `unique` keeps first occurrences only
pub fn format_tokens(input: &str, unique: bool) -> String {
    let mut out = String::new();
    if unique {
        let seen: IndexSet<&str> = extractor::tokens(input).collect();
        for token in seen {
            out.push_str(token);
            out.push('\n');
        }
    } else {
        for token in extractor::tokens(input) {
            out.push_str(token);
            out.push('\n');
        }
    }
    out
}

/// Serialize the configuration in the requested format
pub fn render_config(config: &SiteConfig, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(config)?,
        OutputFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Run the bootstrap against an empty head and render the result
pub fn render_head(config: &SiteConfig) -> String {
    let mut registry = ComponentRegistry::new();
    let mut head = Head::default();
    bootstrap(&config.head, &mut registry, &mut head);
    format!(
        "<html {}>\n<body {}>\n{}",
        head.render_html_attrs(),
        head.render_body_attrs(),
        head.render_links()
    )
}

/// Handle extract command - read text from stdin, print tokens to stdout
#[cfg(feature = "cli")]
pub async fn handle_extract_command(args: ExtractArgs) -> Result<()> {
    use tokio::io::{self, AsyncReadExt, AsyncWriteExt};

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .await
        .map_err(|e| SiteError::InputError(format!("Failed to read from stdin: {}", e)))?;

    let output = format_tokens(&input, args.unique);

    let mut stdout = io::stdout();
    stdout
        .write_all(output.as_bytes())
        .await
        .map_err(|e| SiteError::OutputError {
            path: "stdout".to_string(),
            message: e.to_string(),
        })?;
    stdout.flush().await.map_err(|e| SiteError::OutputError {
        path: "stdout".to_string(),
        message: e.to_string(),
    })?;

    Ok(())
}
