use thiserror::Error;

pub type Result<T> = std::result::Result<T, SqlportError>;

#[derive(Debug, Error)]
pub enum SqlportError {
    #[error("unsupported dialect: {0}")]
    UnsupportedDialect(String),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("invalid column reference: {0}")]
    InvalidColumn(String),
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
