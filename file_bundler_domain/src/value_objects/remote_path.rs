// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Remote Path
//!
//! A scheme-qualified file location. Every source file, output artifact, and
//! hash file in the system is addressed by a `RemotePath`; the scheme
//! (`file`, `s3`, and whatever else a deployment registers) selects the
//! filesystem provider that can actually open it.
//!
//! A bare path with no `scheme://` prefix is treated as `file`, which keeps
//! plain POSIX paths in requests and configuration working unchanged.
//!
//! The canonical text form (`scheme://path`) is what gets persisted and what
//! appears in logs; parsing and rendering round-trip exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::BundlerError;

/// Default scheme assumed for bare paths.
pub const DEFAULT_SCHEME: &str = "file";

/// A scheme-qualified location understood by the filesystem registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath {
    scheme: String,
    path: String,
}

impl RemotePath {
    /// Parses a location from either `scheme://path` or a bare path.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an empty input or an empty path
    /// component.
    pub fn parse(value: &str) -> Result<Self, BundlerError> {
        if value.is_empty() {
            return Err(BundlerError::ValidationError(
                "path must not be empty".to_string(),
            ));
        }

        let (scheme, path) = match value.split_once("://") {
            Some((scheme, path)) => (scheme.to_ascii_lowercase(), path.to_string()),
            None => (DEFAULT_SCHEME.to_string(), value.to_string()),
        };

        if scheme.is_empty() || path.is_empty() {
            return Err(BundlerError::ValidationError(format!(
                "malformed location '{}'",
                value
            )));
        }

        Ok(RemotePath { scheme, path })
    }

    /// Builds a `file` location from a filesystem path.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        RemotePath {
            scheme: DEFAULT_SCHEME.to_string(),
            path: path.into().to_string_lossy().replace('\\', "/"),
        }
    }

    /// The scheme component, always lowercase.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The path component (everything after `scheme://`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// True when the location resolves through the local provider.
    pub fn is_local(&self) -> bool {
        self.scheme == DEFAULT_SCHEME
    }

    /// The path as a local filesystem path. Meaningful only for `file`
    /// locations; the local provider is the only caller.
    pub fn to_local_path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    /// Joins a relative path onto this location with exactly one separator.
    pub fn join(&self, rel: &str) -> Self {
        let rel = rel.trim_start_matches('/');
        let mut path = self.path.trim_end_matches('/').to_string();
        path.push('/');
        path.push_str(rel);
        RemotePath {
            scheme: self.scheme.clone(),
            path,
        }
    }

    /// The final path segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path)
    }
}

impl TryFrom<String> for RemotePath {
    type Error = BundlerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RemotePath::parse(&value)
    }
}

impl From<RemotePath> for String {
    fn from(value: RemotePath) -> Self {
        value.to_string()
    }
}
