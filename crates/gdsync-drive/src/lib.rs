//! gdsync Drive - Google Drive v3 adapters
//!
//! Provides:
//! - A typed HTTP client for the handful of Drive endpoints gdsync needs
//! - The remote state oracle, comparing Drive metadata to the sync baseline
//! - The remote writer, applying local changes to Drive
//! - The identity allocator, reserving Drive file IDs for new local files
//!
//! ## Modules
//!
//! - [`client`] - [`DriveClient`](client::DriveClient), bearer-authenticated
//! - [`oracle`] - [`DriveOracle`](oracle::DriveOracle) (`IRemoteOracle`)
//! - [`writer`] - [`DriveWriter`](writer::DriveWriter) (`IRemoteWriter`)
//! - [`allocator`] - [`DriveIdentityAllocator`](allocator::DriveIdentityAllocator)
//!
//! The client takes an already-issued access token. Token acquisition and
//! refresh, and retry/backoff, are left to the caller.

pub mod allocator;
pub mod client;
pub mod oracle;
pub mod writer;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the Drive API
#[derive(Debug, Error)]
pub enum DriveError {
    /// The access token is missing, invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The token lacks the scope or the user lacks access
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The file ID is already in use
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Quota or rate limit exceeded
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DriveError {
    /// Classifies a non-success status code
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let detail = if body.is_empty() {
            status.to_string()
        } else {
            format!("{status}: {body}")
        };

        match status {
            StatusCode::UNAUTHORIZED => DriveError::Unauthorized(detail),
            StatusCode::FORBIDDEN => DriveError::Forbidden(detail),
            StatusCode::NOT_FOUND => DriveError::NotFound(detail),
            StatusCode::CONFLICT => DriveError::Conflict(detail),
            StatusCode::TOO_MANY_REQUESTS => DriveError::TooManyRequests(detail),
            s if s.is_server_error() => DriveError::ServerError(detail),
            _ => DriveError::InvalidResponse(detail),
        }
    }

    /// Returns true if a later attempt may succeed without any change on our side
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DriveError::Unauthorized(_)
                | DriveError::Forbidden(_)
                | DriveError::TooManyRequests(_)
                | DriveError::ServerError(_)
                | DriveError::NetworkError(_)
        )
    }
}
