// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archive Job
//!
//! One output archive artifact of a job: its location, its HTTP-visible URLs,
//! the worker identity that produced it, timing, and the file entries it
//! owns. Archive ids are 0-based and contiguous within a job.
//!
//! ## Lifecycle
//!
//! ```text
//! NOT_STARTED ──claim──▶ IN_PROGRESS ──stream──▶ (all entries written)
//!                            │                         │
//!                            │                         ├─hash ok──▶ COMPLETE
//!                            │                         └─hash fail─▶ ERROR
//!                            └─archive-io-fail──▶ ERROR
//! ```
//!
//! `begin` records the claiming worker; `complete` and `fail` stamp the end
//! time. Once a terminal state is reached the entity is not transitioned
//! again - the job tracker checks `is_terminal` before any coercion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::FileEntry;
use crate::error::BundlerError;
use crate::value_objects::{ArchiveType, JobId, JobState, RemotePath};

/// One output archive artifact and the file entries it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveJob {
    // Identity fields (always first)
    job_id: JobId,
    archive_id: u32,

    // Core business fields
    archive_type: ArchiveType,
    output_path: RemotePath,
    hash_path: RemotePath,
    output_url: String,
    hash_url: String,
    host_name: String,
    num_files: u64,
    size: u64,
    state: JobState,
    files: Vec<FileEntry>,

    // Metadata fields (always last)
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

/// Construction record for [`ArchiveJob::new`], assembled by the dispatcher.
#[derive(Debug, Clone)]
pub struct ArchiveJobConfig {
    pub job_id: JobId,
    pub archive_id: u32,
    pub archive_type: ArchiveType,
    pub output_path: RemotePath,
    pub hash_path: RemotePath,
    pub output_url: String,
    pub hash_url: String,
    pub files: Vec<FileEntry>,
}

impl ArchiveJob {
    /// Creates a new archive job in the `NOT_STARTED` state.
    ///
    /// The uncompressed size and file count are derived from the owned
    /// entries; the entries must belong to this archive.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the entry list is empty or an entry
    /// carries a foreign `(job_id, archive_id)`.
    pub fn new(config: ArchiveJobConfig) -> Result<Self, BundlerError> {
        if config.files.is_empty() {
            return Err(BundlerError::ValidationError(format!(
                "archive {} of job {} has no files",
                config.archive_id, config.job_id
            )));
        }
        for file in &config.files {
            if file.job_id() != &config.job_id || file.archive_id() != config.archive_id {
                return Err(BundlerError::ValidationError(format!(
                    "file entry '{}' does not belong to archive {} of job {}",
                    file.source(),
                    config.archive_id,
                    config.job_id
                )));
            }
        }

        let size = config.files.iter().map(FileEntry::size).sum();
        let num_files = config.files.len() as u64;

        Ok(ArchiveJob {
            job_id: config.job_id,
            archive_id: config.archive_id,
            archive_type: config.archive_type,
            output_path: config.output_path,
            hash_path: config.hash_path,
            output_url: config.output_url,
            hash_url: config.hash_url,
            host_name: String::new(),
            num_files,
            size,
            state: JobState::NotStarted,
            files: config.files,
            start_time: None,
            end_time: None,
        })
    }

    /// Restores an archive from persisted fields. Intended for repository
    /// implementations only.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        job_id: JobId,
        archive_id: u32,
        archive_type: ArchiveType,
        output_path: RemotePath,
        hash_path: RemotePath,
        output_url: String,
        hash_url: String,
        host_name: String,
        num_files: u64,
        size: u64,
        state: JobState,
        files: Vec<FileEntry>,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        ArchiveJob {
            job_id,
            archive_id,
            archive_type,
            output_path,
            hash_path,
            output_url,
            hash_url,
            host_name,
            num_files,
            size,
            state,
            files,
            start_time,
            end_time,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn archive_id(&self) -> u32 {
        self.archive_id
    }

    pub fn archive_type(&self) -> ArchiveType {
        self.archive_type
    }

    pub fn output_path(&self) -> &RemotePath {
        &self.output_path
    }

    pub fn hash_path(&self) -> &RemotePath {
        &self.hash_path
    }

    pub fn output_url(&self) -> &str {
        &self.output_url
    }

    pub fn hash_url(&self) -> &str {
        &self.hash_url
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn num_files(&self) -> u64 {
        self.num_files
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Complete | JobState::Error)
    }

    /// Count of entries already streamed into the archive.
    pub fn completed_file_count(&self) -> u64 {
        self.files.iter().filter(|f| f.is_complete()).count() as u64
    }

    /// Bytes of entries already streamed into the archive.
    pub fn completed_bytes(&self) -> u64 {
        self.files.iter().filter(|f| f.is_complete()).map(FileEntry::size).sum()
    }

    /// Claims the archive for a worker: identity, start time, `IN_PROGRESS`.
    pub fn begin(&mut self, host_name: impl Into<String>, now: DateTime<Utc>) {
        self.host_name = host_name.into();
        self.start_time = Some(now);
        self.state = JobState::InProgress;
    }

    /// Marks the archive `COMPLETE` and records the artifact size as written
    /// to stable storage.
    pub fn complete(&mut self, artifact_size: u64, now: DateTime<Utc>) {
        self.size = artifact_size;
        self.end_time = Some(now);
        self.state = JobState::Complete;
    }

    /// Marks the archive `ERROR`.
    pub fn fail(&mut self, now: DateTime<Utc>) {
        self.end_time = Some(now);
        self.state = JobState::Error;
    }

    /// Mutable access to the owned entries (tracker aggregation tests and
    /// repository assembly).
    pub fn files_mut(&mut self) -> &mut [FileEntry] {
        &mut self.files
    }
}
