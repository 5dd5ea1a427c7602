use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Worker pool is closed")]
    PoolClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Log sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Serde JSON error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

impl Error {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::PoolClosed => "pool_closed",
            Error::Config(_) => "config_error",
            Error::SinkUnavailable(_) => "sink_unavailable",
            Error::Network(_) | Error::Http(_) => "network_failure",
            Error::Parse(_) | Error::Serde(_) => "parse_failure",
            Error::Rpc { .. } => "rpc_error",
            Error::IO(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
