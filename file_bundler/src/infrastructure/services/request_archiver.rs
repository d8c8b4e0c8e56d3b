// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Request Debug Archival
//!
//! Best-effort dump of raw submission bodies to a configured directory, one
//! `<job_id>.json` per request. Pure debugging aid: failures are logged and
//! swallowed, and an empty configuration disables the feature entirely.

use std::path::PathBuf;

use tracing::{debug, warn};

use file_bundler_domain::JobId;

/// Writes raw request bodies for post-mortem debugging.
pub struct RequestArchiver {
    directory: Option<PathBuf>,
}

impl RequestArchiver {
    /// Creates the archiver; an empty directory string disables it.
    pub fn new(directory: &str) -> Self {
        let directory = if directory.is_empty() {
            None
        } else {
            Some(PathBuf::from(directory))
        };
        RequestArchiver { directory }
    }

    /// Disabled archiver.
    pub fn disabled() -> Self {
        RequestArchiver { directory: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.directory.is_some()
    }

    /// Archives one raw request body under the job's id. Never fails the
    /// caller.
    pub async fn archive(&self, job_id: &JobId, body: &str) {
        let Some(directory) = &self.directory else {
            return;
        };

        let target = directory.join(format!("{}.json", job_id));
        let result = async {
            tokio::fs::create_dir_all(directory).await?;
            tokio::fs::write(&target, body).await
        }
        .await;

        match result {
            Ok(()) => debug!(job_id = %job_id, path = %target.display(), "archived request body"),
            Err(e) => warn!(job_id = %job_id, "failed to archive request body: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_archives_body_under_job_id() {
        let dir = TempDir::new().unwrap();
        let archiver = RequestArchiver::new(dir.path().to_str().unwrap());
        let job_id = JobId::generate();

        archiver.archive(&job_id, "{\"files\":[]}").await;

        let written = std::fs::read_to_string(dir.path().join(format!("{}.json", job_id))).unwrap();
        assert_eq!(written, "{\"files\":[]}");
    }

    #[tokio::test]
    async fn test_disabled_archiver_writes_nothing() {
        let archiver = RequestArchiver::new("");
        assert!(!archiver.is_enabled());
        // must not panic or create anything
        archiver.archive(&JobId::generate(), "body").await;
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_swallowed() {
        let archiver = RequestArchiver::new("/proc/definitely/not/writable");
        archiver.archive(&JobId::generate(), "body").await;
    }
}
