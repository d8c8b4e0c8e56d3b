// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Entry Path Normalizer
//!
//! Computes the in-archive path for a source file. The normalization runs in
//! a fixed order:
//!
//! 1. Start from the source location's path component.
//! 2. For each configured prefix exclusion, strip exactly one leading
//!    occurrence.
//! 3. Strip a supplied base directory from the front.
//! 4. Prepend a supplied replacement prefix with exactly one separator.
//! 5. Strip any leading separator.
//! 6. While the result is longer than [`EntryPath::MAX_LEN`]: drop the
//!    leftmost segment if a separator remains, else truncate the filename
//!    preserving its extension (the dot-suffix after the last `.` when it
//!    sits after the last `/` and not at position 0).
//!
//! The output never exceeds the cap, never starts with a separator, and
//! keeps the input's extension whenever it had one. Normalization is
//! idempotent. It is *not* injective: distinct sources can normalize to the
//! same entry path, and callers must not rely on uniqueness within an
//! archive.

use crate::error::BundlerError;
use crate::value_objects::{EntryPath, RemotePath};

/// Upper bound on configured prefix exclusions; extras are ignored.
pub const MAX_NUM_EXCLUSIONS: usize = 10;

/// Source-path to entry-path normalization with configured prefix
/// exclusions. Built once at startup from configuration and shared.
#[derive(Debug, Clone)]
pub struct EntryPathNormalizer {
    exclusions: Vec<String>,
}

impl EntryPathNormalizer {
    /// Creates a normalizer with the configured prefix exclusions. Empty
    /// exclusions are dropped; at most [`MAX_NUM_EXCLUSIONS`] are honored.
    pub fn new(exclusions: Vec<String>) -> Self {
        let exclusions = exclusions
            .into_iter()
            .filter(|e| !e.is_empty())
            .take(MAX_NUM_EXCLUSIONS)
            .collect();
        EntryPathNormalizer { exclusions }
    }

    /// Normalizer with no exclusions.
    pub fn without_exclusions() -> Self {
        EntryPathNormalizer { exclusions: Vec::new() }
    }

    /// Computes the entry path for `source`.
    ///
    /// `base_dir` is stripped from the front when present; `archive_prefix`
    /// is the replacement prefix a request can supply per file.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the source path normalizes to nothing
    /// (for example a bare `/`).
    pub fn normalize(
        &self,
        source: &RemotePath,
        base_dir: Option<&str>,
        archive_prefix: Option<&str>,
    ) -> Result<EntryPath, BundlerError> {
        let mut path = source.path().to_string();

        for exclusion in &self.exclusions {
            if let Some(stripped) = path.strip_prefix(exclusion.as_str()) {
                path = stripped.to_string();
            }
        }

        if let Some(base) = base_dir.filter(|b| !b.is_empty()) {
            if let Some(stripped) = path.strip_prefix(base) {
                path = stripped.to_string();
            }
        }

        if let Some(prefix) = archive_prefix.filter(|p| !p.is_empty()) {
            path = format!(
                "{}/{}",
                prefix.trim_end_matches('/'),
                path.trim_start_matches('/')
            );
        }

        let mut path = path.trim_start_matches('/').to_string();
        if path.is_empty() {
            return Err(BundlerError::ValidationError(format!(
                "source '{}' normalizes to an empty entry path",
                source
            )));
        }

        while path.len() > EntryPath::MAX_LEN {
            match path.find('/') {
                Some(slash) => {
                    path = path[slash + 1..].trim_start_matches('/').to_string();
                    if path.is_empty() {
                        return Err(BundlerError::ValidationError(format!(
                            "source '{}' normalizes to an empty entry path",
                            source
                        )));
                    }
                }
                None => {
                    path = truncate_preserving_extension(&path);
                    break;
                }
            }
        }

        EntryPath::new(path)
    }
}

/// Truncates a single filename to the cap, keeping the extension when the
/// name has one and it fits.
fn truncate_preserving_extension(name: &str) -> String {
    let extension = match name.rfind('.') {
        // A dot at position 0 is a hidden file, not an extension.
        Some(dot) if dot > 0 => &name[dot..],
        _ => "",
    };

    if extension.is_empty() || extension.len() >= EntryPath::MAX_LEN {
        return take_bytes(name, EntryPath::MAX_LEN);
    }

    let stem_budget = EntryPath::MAX_LEN - extension.len();
    let stem = take_bytes(&name[..name.len() - extension.len()], stem_budget);
    format!("{}{}", stem, extension)
}

/// Longest prefix of `s` that fits in `max_bytes` without splitting a
/// character.
fn take_bytes(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = 0;
    for (idx, ch) in s.char_indices() {
        if idx + ch.len_utf8() > max_bytes {
            break;
        }
        end = idx + ch.len_utf8();
    }
    s[..end].to_string()
}
