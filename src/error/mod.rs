use thiserror::Error;

use crate::session::HopId;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Session state machine errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Query is empty after trimming")]
    EmptyQuery,

    #[error("No box with id {hop_id}")]
    UnknownHop { hop_id: HopId },

    #[error("Box {hop_id} is not a valid target (existing box or {next_id} expected)")]
    InvalidTargetHop { hop_id: HopId, next_id: HopId },

    #[error("Box {hop_id} already has a request in flight")]
    HopBusy { hop_id: HopId },

    #[error("Box {hop_id} has {count} results, feedback needs a full set of 3")]
    IncompleteResults { hop_id: HopId, count: usize },

    #[error("Result index {index} is out of range (0-2)")]
    ResultIndexOutOfRange { index: usize },

    #[error("Box {hop_id} is read-only history, only the latest box takes input")]
    HistoryReadOnly { hop_id: HopId },
}

/// Search gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Search backend unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("{operation} returned {got} results, expected {expected}")]
    UnexpectedResultCount {
        operation: String,
        expected: String,
        got: usize,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
