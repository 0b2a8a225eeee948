use std::path::PathBuf;

/// Errors raised at the edges of the engine: decoding log snapshots,
/// loading configuration and installing the log subscriber.
///
/// The cycle computations themselves never fail; missing data is
/// represented by `None` or empty collections.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("invalid date key {key:?}, expected yyyy-MM-dd")]
    InvalidDateKey { key: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("config file not found: {path}")]
    ConfigNotFound { path: PathBuf },
    #[error("config directory not found")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config parse error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("config encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, CycleError>;
