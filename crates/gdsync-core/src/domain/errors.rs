//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! validation failures for newtypes, and the classified failures a
//! remote state oracle may report.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote file identity
    #[error("Invalid file identity: {0}")]
    InvalidIdentity(String),

    /// Invalid content checksum
    #[error("Invalid checksum: {0}")]
    InvalidChecksum(String),

    /// Invalid relative path inside the sync root
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Failures reported by a remote state oracle
///
/// Oracles classify their failures so that the reconciliation engine can
/// tell a transient outage (retry on the next pass) from a response that
/// cannot be interpreted at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The remote service could not be reached or refused the request
    /// (network, authentication, throttling, server errors)
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote answered, but the answer cannot be turned into a change
    #[error("Unusable remote response: {0}")]
    Protocol(String),
}
