// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the hierarchical error system for the file bundler
//! domain. Errors are categorized so that the edges of the system (workers,
//! the job tracker, the HTTP layer) can apply a uniform policy to each
//! category instead of matching on free-form messages.
//!
//! ## Error Categories
//!
//! - **Request errors** - `InvalidRequest`, `ValidationError`: the submission
//!   itself is unusable. Jobs affected by these are persisted with the
//!   `INVALID_REQUEST` state and never spawn workers.
//! - **Filesystem errors** - `NotFound`, `PermissionDenied`, `TransientIo`,
//!   `SchemeUnsupported`: surfaced by the path/URI adapters. Inside a worker
//!   these mark the affected archive `ERROR`; they never cross into another
//!   worker.
//! - **Processing errors** - `ArchiveError`, `HashError`: the archive stream
//!   or the digest pass failed. Same per-archive policy as filesystem errors.
//! - **Infrastructure errors** - `DatabaseError`, `SerializationError`,
//!   `ConfigurationError`, `InternalError`: repository and wiring failures.
//!   Observers swallow `DatabaseError` (logged) so that in-flight archive
//!   work is never aborted by a persistence hiccup.
//!
//! ## Propagation Policy
//!
//! Failures inside a worker never propagate into another worker or into the
//! HTTP layer; a job's terminal state is derivable entirely from its archive
//! rows. Errors carry their context as text because they cross task and
//! thread boundaries and must stay `Clone + Send`.

use thiserror::Error;

/// Domain-specific errors for the file bundler.
///
/// Each variant carries a descriptive message. Variants are grouped by the
/// policy applied to them (see the module documentation); `category()` and
/// `is_recoverable()` expose that grouping to callers.
#[derive(Error, Debug, Clone)]
pub enum BundlerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    TransientIo(String),

    #[error("Unsupported scheme: {0}")]
    SchemeUnsupported(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Hash error: {0}")]
    HashError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl BundlerError {
    /// Creates a new invalid-request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Creates a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a new transient IO error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::TransientIo(msg.into())
    }

    /// Creates a new archive error
    pub fn archive_error(msg: impl Into<String>) -> Self {
        Self::ArchiveError(msg.into())
    }

    /// Creates a new hash error
    pub fn hash_error(msg: impl Into<String>) -> Self {
        Self::HashError(msg.into())
    }

    /// Creates a new database error
    pub fn database_error(msg: impl Into<String>) -> Self {
        Self::DatabaseError(msg.into())
    }

    /// Creates a new configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Creates a new internal error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Checks if the error indicates a retriable condition.
    ///
    /// The core performs no retries itself; this classification exists for
    /// operators reading logs and for future retry layers.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BundlerError::TransientIo(_) | BundlerError::DatabaseError(_))
    }

    /// Checks if the error invalidates the submission rather than a single
    /// archive.
    pub fn is_request_error(&self) -> bool {
        matches!(self, BundlerError::InvalidRequest(_) | BundlerError::ValidationError(_))
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            BundlerError::InvalidRequest(_) => "request",
            BundlerError::ValidationError(_) => "request",
            BundlerError::NotFound(_) => "filesystem",
            BundlerError::PermissionDenied(_) => "filesystem",
            BundlerError::TransientIo(_) => "filesystem",
            BundlerError::SchemeUnsupported(_) => "filesystem",
            BundlerError::ArchiveError(_) => "archive",
            BundlerError::HashError(_) => "hash",
            BundlerError::DatabaseError(_) => "database",
            BundlerError::SerializationError(_) => "serialization",
            BundlerError::ConfigurationError(_) => "configuration",
            BundlerError::InternalError(_) => "internal",
        }
    }
}

// Filesystem failures keep their kind so the worker error policy can tell a
// missing source from a transient stream failure.
impl From<std::io::Error> for BundlerError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => BundlerError::NotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => BundlerError::PermissionDenied(err.to_string()),
            _ => BundlerError::TransientIo(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for BundlerError {
    fn from(err: serde_json::Error) -> Self {
        BundlerError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kind_mapping() {
        let nf = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(BundlerError::from(nf), BundlerError::NotFound(_)));

        let pd = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        assert!(matches!(BundlerError::from(pd), BundlerError::PermissionDenied(_)));

        let other = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert!(matches!(BundlerError::from(other), BundlerError::TransientIo(_)));
    }

    #[test]
    fn test_categories() {
        assert_eq!(BundlerError::invalid_request("x").category(), "request");
        assert_eq!(BundlerError::hash_error("x").category(), "hash");
        assert_eq!(BundlerError::database_error("x").category(), "database");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(BundlerError::io_error("x").is_recoverable());
        assert!(BundlerError::database_error("x").is_recoverable());
        assert!(!BundlerError::invalid_request("x").is_recoverable());
    }
}
