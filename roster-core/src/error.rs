//! Error types for ROSTER operations

use thiserror::Error;

/// Paging transport errors.
///
/// None of these are fatal to a session: the partition is left untouched and
/// the caller retries through `load_more`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Failed to decode page: {reason}")]
    Decode { reason: String },

    #[error("Request cancelled")]
    Cancelled,
}

/// Configuration validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}


/// A continuation token was empty where a cursor was required.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Cursor must not be empty")]
pub struct EmptyCursor;
