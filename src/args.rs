use crate::config::BuildMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::convert::Infallible;
use std::path::PathBuf;

/// v-bind site tooling - configuration and unused-CSS purging
#[derive(Parser, Debug)]
#[command(name = "vbind-site")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove CSS rules whose classes never appear in the content files
    Purge(PurgeArgs),
    /// Read text from stdin and print the class tokens it contains
    Extract(ExtractArgs),
    /// Print the resolved site configuration
    Config(ConfigArgs),
    /// Print the html/body attributes and link tags added by the bootstrap
    Head(HeadArgs),
}

/// Arguments for the purge command
#[derive(Parser, Debug, Clone)]
pub struct PurgeArgs {
    /// Stylesheet to purge
    #[arg(
        short = 'c',
        long = "css",
        value_name = "PATH",
        required = true,
        help = "Stylesheet to purge"
    )]
    pub css: PathBuf,

    /// Content patterns (defaults to the configured purge content globs)
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATTERN",
        num_args = 1..,
        help = "Content file patterns to scan for class names"
    )]
    pub input: Vec<String>,

    /// Exclude patterns (glob patterns to exclude)
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "PATTERN",
        num_args = 0..,
        help = "Patterns to exclude from scanning"
    )]
    pub exclude: Vec<String>,

    /// Output CSS file path
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        required = true,
        help = "Path where the purged CSS will be written"
    )]
    pub output: PathBuf,

    /// Report file path (JSON)
    #[arg(
        short = 'm',
        long = "manifest",
        value_name = "PATH",
        help = "Path where the JSON purge report will be written"
    )]
    pub manifest: Option<PathBuf>,

    /// Site configuration file (YAML or JSON)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root that relative content patterns are resolved against
    #[arg(short = 'r', long = "root", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Build mode; purging only happens in production
    #[arg(
        long = "mode",
        env = "NODE_ENV",
        value_name = "MODE",
        value_parser = parse_build_mode,
        default_value_t = BuildMode::Development,
        help = "Build mode; only `production` purges, any other value is a development build"
    )]
    pub mode: BuildMode,

    /// Number of parallel threads to use
    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "NUM",
        help = "Number of parallel threads to use (defaults to number of CPU cores)"
    )]
    pub jobs: Option<usize>,

    /// Show progress details in the log instead of a progress bar
    #[arg(long = "no-progress", default_value_t = false)]
    pub no_progress: bool,

    /// Follow symlinked content files whose target stays inside the root
    #[arg(long = "allow-symlinks", default_value_t = false)]
    pub allow_symlinks: bool,

    /// Dry run (don't write output files)
    #[arg(
        long = "dry-run",
        default_value_t = false,
        help = "Perform the purge but don't write output files"
    )]
    pub dry_run: bool,
}

/// Arguments for the extract command
#[derive(Parser, Debug, Clone)]
pub struct ExtractArgs {
    /// Print each token once, in order of first appearance
    #[arg(short = 'u', long = "unique", default_value_t = false)]
    pub unique: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Arguments for the config command
#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Arguments for the head command
#[derive(Parser, Debug, Clone)]
pub struct HeadArgs {
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

fn parse_build_mode(value: &str) -> Result<BuildMode, Infallible> {
    Ok(BuildMode::from_env_value(value))
}

impl PurgeArgs {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.input.iter().any(|pattern| pattern.trim().is_empty()) {
            return Err("Input patterns must not be empty".to_string());
        }

        if self.manifest.as_ref() == Some(&self.output) {
            return Err("Output CSS and manifest paths must be different".to_string());
        }

        if self.css == self.output {
            return Err("Output CSS must not overwrite the input stylesheet".to_string());
        }

        if let Some(jobs) = self.jobs {
            if jobs == 0 {
                return Err("Number of jobs must be at least 1".to_string());
            }
        }

        Ok(())
    }
}
