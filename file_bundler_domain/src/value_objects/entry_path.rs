// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Entry Path
//!
//! The path a source file is stored under inside an archive. Entry paths are
//! capped at [`EntryPath::MAX_LEN`] characters and never start with a
//! separator; the cap keeps entries compatible with the most restrictive of
//! the supported containers, so it is enforced here once rather than in each
//! archiver.
//!
//! Construction only validates. The normalization that produces conforming
//! paths from arbitrary source locations (prefix exclusions, base-dir
//! stripping, segment dropping) lives in
//! [`crate::services::entry_path_normalizer`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BundlerError;

/// Validated in-archive path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryPath(String);

impl EntryPath {
    /// Maximum length of an entry path, in bytes.
    pub const MAX_LEN: usize = 100;

    /// Validates and wraps an already-normalized path.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the path is empty, longer than
    /// [`Self::MAX_LEN`], or carries a leading separator.
    pub fn new(path: impl Into<String>) -> Result<Self, BundlerError> {
        let path = path.into();
        if path.is_empty() {
            return Err(BundlerError::ValidationError(
                "entry path must not be empty".to_string(),
            ));
        }
        if path.len() > Self::MAX_LEN {
            return Err(BundlerError::ValidationError(format!(
                "entry path exceeds {} characters: '{}'",
                Self::MAX_LEN,
                path
            )));
        }
        if path.starts_with('/') {
            return Err(BundlerError::ValidationError(format!(
                "entry path must be relative: '{}'",
                path
            )));
        }
        Ok(EntryPath(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntryPath {
    type Error = BundlerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EntryPath::new(value)
    }
}

impl From<EntryPath> for String {
    fn from(value: EntryPath) -> Self {
        value.0
    }
}
