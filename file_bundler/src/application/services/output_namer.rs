// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Output Namer
//!
//! Derives artifact locations and their HTTP URLs. The layout is
//! `<staging>/<job_id>/<template>_<archive_id>.<ext>` with the sibling hash
//! file at the same path plus the algorithm's extension. URLs are the
//! on-disk path with the staging root replaced by the configured base URL
//! and backslashes normalized to forward slashes.
//!
//! Constructed once at startup from configuration and injected wherever
//! names are needed - there is no global name generator.

use file_bundler_domain::{ArchiveType, BundlerError, HashAlgorithm, JobId, RemotePath};

/// Fallback template when a request does not name its output.
pub const DEFAULT_TEMPLATE: &str = "bundle";

/// Artifact naming and URL mapping.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    staging_root: RemotePath,
    base_url: String,
}

impl OutputNamer {
    pub fn new(staging_directory: &str, base_url: &str) -> Result<Self, BundlerError> {
        Ok(OutputNamer {
            staging_root: RemotePath::parse(staging_directory)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The staging directory owned by one job.
    pub fn job_directory(&self, job_id: &JobId) -> RemotePath {
        self.staging_root.join(job_id.as_str())
    }

    /// Normalizes a client-supplied template: strips a recognized archive
    /// extension if the client sent one, falls back to the default when
    /// empty.
    pub fn clean_template(template: Option<&str>) -> String {
        let raw = template.unwrap_or("").trim();
        if raw.is_empty() {
            return DEFAULT_TEMPLATE.to_string();
        }
        // Longest extensions first so "x.tar.gz" does not leave "x.tar".
        let mut extensions: Vec<&str> = ArchiveType::all().iter().map(|t| t.extension()).collect();
        extensions.sort_by_key(|e| std::cmp::Reverse(e.len()));
        for extension in extensions {
            if let Some(stem) = raw.strip_suffix(&format!(".{}", extension)) {
                if !stem.is_empty() {
                    return stem.to_string();
                }
            }
        }
        raw.to_string()
    }

    /// Output artifact path for one archive.
    pub fn archive_path(
        &self,
        job_id: &JobId,
        template: &str,
        archive_id: u32,
        archive_type: ArchiveType,
    ) -> RemotePath {
        self.job_directory(job_id).join(&format!(
            "{}_{}.{}",
            template,
            archive_id,
            archive_type.extension()
        ))
    }

    /// Sibling hash file path for an artifact.
    pub fn hash_path(&self, archive_path: &RemotePath, algorithm: HashAlgorithm) -> RemotePath {
        RemotePath::parse(&format!("{}.{}", archive_path, algorithm.extension()))
            .unwrap_or_else(|_| archive_path.join(algorithm.extension()))
    }

    /// HTTP URL of a staged artifact.
    pub fn to_url(&self, path: &RemotePath) -> String {
        let normalized = path.path().replace('\\', "/");
        let root = self.staging_root.path().trim_end_matches('/');
        match normalized.strip_prefix(root) {
            Some(rest) => format!("{}{}", self.base_url, rest),
            None => normalized,
        }
    }
}
