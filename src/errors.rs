use thiserror::Error;

/// Main error type for the vbind-site crate
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Invalid always-keep pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("No files found matching the provided patterns")]
    NoFilesFound,

    #[error("Failed to read file {path}: {message}")]
    ReadError { path: String, message: String },

    #[error("Failed to write output to {path}: {message}")]
    OutputError { path: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Route error: {0}")]
    RouteError(#[from] RouteError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("Security violation: {0}")]
    SecurityError(String),
}

/// Failures when expanding a route template such as `/tag/:id`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route '{route}' is missing a value for ':{param}'")]
    MissingParam { route: String, param: String },

    #[error("route '{0}' must start with '/'")]
    NotAbsolute(String),
}

pub type Result<T> = std::result::Result<T, SiteError>;
