// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Repository Port
//!
//! Durable storage for the `Job → ArchiveJob → FileEntry` tree. The store is
//! the only shared mutable resource between workers; every mutation flows
//! through this port, and each call is its own transactional unit - there is
//! no cross-call transaction to hold open across streaming I/O.
//!
//! The port is async: database access is genuinely asynchronous I/O, unlike
//! the sync streaming ports (see the note in [`crate::services`]).
//! Implementations translate their backend failures into
//! [`BundlerError::DatabaseError`] so observers can apply the
//! swallow-and-log policy uniformly.

use async_trait::async_trait;

use crate::entities::{ArchiveJob, FileEntry, Job};
use crate::error::BundlerError;
use crate::value_objects::{JobId, JobState, RemotePath};

/// Persistence contract for bundle jobs.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Loads a job with its full archive and file-entry tree.
    async fn get_job(&self, job_id: &JobId) -> Result<Option<Job>, BundlerError>;

    /// Loads one archive of a job, with its file entries.
    async fn get_archive(
        &self,
        job_id: &JobId,
        archive_id: u32,
    ) -> Result<Option<ArchiveJob>, BundlerError>;

    /// Loads one file entry by its `(job_id, archive_id, source)` key.
    async fn get_file_entry(
        &self,
        job_id: &JobId,
        archive_id: u32,
        source: &RemotePath,
    ) -> Result<Option<FileEntry>, BundlerError>;

    /// All known job ids.
    async fn list_job_ids(&self) -> Result<Vec<JobId>, BundlerError>;

    /// Persists a new job and its entire tree.
    async fn persist_job(&self, job: &Job) -> Result<(), BundlerError>;

    /// Updates the job row (counters, state, timestamps). Owned archives are
    /// updated through [`Self::update_archive`].
    async fn update_job(&self, job: &Job) -> Result<(), BundlerError>;

    /// Updates one archive row (worker identity, state, timestamps, size).
    /// Owned file entries are updated through
    /// [`Self::update_file_entry_state`].
    async fn update_archive(&self, archive: &ArchiveJob) -> Result<(), BundlerError>;

    /// Updates the state of one file entry.
    async fn update_file_entry_state(
        &self,
        job_id: &JobId,
        archive_id: u32,
        source: &RemotePath,
        state: JobState,
    ) -> Result<(), BundlerError>;
}
