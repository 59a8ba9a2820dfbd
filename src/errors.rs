use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("http client error: {0}")]
    Client(String),
    #[error("request failed for {url}: {message}")]
    Request { url: String, message: String },
    #[error("failed to load {url}: status {status}")]
    Status { url: String, status: u16 },
    #[error("unable to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("invalid json in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("config mutex poisoned")]
    Poisoned,
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
