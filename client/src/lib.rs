pub mod client;
pub mod events;
pub mod opening;

pub use client::Client;
pub use client::RetryPolicy;
pub use events::Stream;
pub use opening::{FlowError, OpeningFlow, Phase};
use thiserror::Error;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("failed: {0}")]
    Failed(reqwest::StatusCode),
    #[error("too many transactions in one submission: {got} (max {max})")]
    TooManyTransactions { max: usize, got: usize },
    #[error("invalid data: {0}")]
    InvalidData(#[from] commonware_codec::Error),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("dial timeout")]
    DialTimeout,
    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
