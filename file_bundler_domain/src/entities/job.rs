// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job
//!
//! The root entity of one client submission. A job owns its archives, which
//! own their file entries; the aggregate counters (`num_files_complete`,
//! `total_size_complete`, `num_archives_complete`) are always recomputed from
//! the owned tree, never incremented blindly, which is what makes the job
//! tracker correct under any interleaving of archive completions.
//!
//! ## Invariants
//!
//! Whenever a job is read:
//!
//! 1. `num_archives_complete <= num_archives`, `num_files_complete <=
//!    num_files`, `total_size_complete <= total_size`.
//! 2. `total_size == Σ archive.size` and `num_files == Σ archive.num_files`
//!    at submission time.
//! 3. Archive ids are `0..num_archives`, contiguous.
//!
//! `recompute_progress` additionally clamps the completion counters into
//! their declared maxima and reports when it had to, so callers can warn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::ArchiveJob;
use crate::error::BundlerError;
use crate::value_objects::{ArchiveType, JobId, JobState, TargetSize};

/// Fallback user name when a submission does not carry one.
pub const DEFAULT_USER_NAME: &str = "unavailable";

/// One client submission and the archives it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    // Identity fields (always first)
    job_id: JobId,
    user_name: String,

    // Core business fields
    archive_type: ArchiveType,
    target_size: TargetSize,
    total_size: u64,
    total_size_complete: u64,
    num_files: u64,
    num_files_complete: u64,
    num_archives: u64,
    num_archives_complete: u64,
    state: JobState,
    archives: Vec<ArchiveJob>,

    // Metadata fields (always last)
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

/// Result of a progress recomputation, reported so the tracker can log
/// clamps and persist terminal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressRecompute {
    /// `num_files_complete` had to be clamped to `num_files`.
    pub clamped_files: bool,
    /// `total_size_complete` had to be clamped to `total_size`.
    pub clamped_size: bool,
    /// The recomputation drove the job into its terminal state.
    pub job_complete: bool,
}

impl Job {
    /// Creates a new job in the `NOT_STARTED` state from its planned
    /// archives.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the archive list is empty, archive ids
    /// are not `0..n` contiguous, or an archive belongs to a different job.
    pub fn new(
        job_id: JobId,
        user_name: impl Into<String>,
        archive_type: ArchiveType,
        target_size: TargetSize,
        archives: Vec<ArchiveJob>,
    ) -> Result<Self, BundlerError> {
        if archives.is_empty() {
            return Err(BundlerError::ValidationError(format!(
                "job {} has no archives",
                job_id
            )));
        }
        for (index, archive) in archives.iter().enumerate() {
            if archive.job_id() != &job_id {
                return Err(BundlerError::ValidationError(format!(
                    "archive {} does not belong to job {}",
                    archive.archive_id(),
                    job_id
                )));
            }
            if archive.archive_id() as usize != index {
                return Err(BundlerError::ValidationError(format!(
                    "archive ids of job {} are not contiguous: expected {}, found {}",
                    job_id,
                    index,
                    archive.archive_id()
                )));
            }
        }

        let total_size = archives.iter().map(ArchiveJob::size).sum();
        let num_files = archives.iter().map(ArchiveJob::num_files).sum();
        let num_archives = archives.len() as u64;
        let user_name = non_empty_user(user_name.into());

        Ok(Job {
            job_id,
            user_name,
            archive_type,
            target_size,
            total_size,
            total_size_complete: 0,
            num_files,
            num_files_complete: 0,
            num_archives,
            num_archives_complete: 0,
            state: JobState::NotStarted,
            archives,
            start_time: None,
            end_time: None,
        })
    }

    /// Creates the terminal record of a rejected submission. No archives, no
    /// workers; the job exists only so the client can query what happened.
    pub fn invalid_request(
        job_id: JobId,
        user_name: impl Into<String>,
        archive_type: ArchiveType,
        target_size: TargetSize,
    ) -> Self {
        Job {
            job_id,
            user_name: non_empty_user(user_name.into()),
            archive_type,
            target_size,
            total_size: 0,
            total_size_complete: 0,
            num_files: 0,
            num_files_complete: 0,
            num_archives: 0,
            num_archives_complete: 0,
            state: JobState::InvalidRequest,
            archives: Vec::new(),
            start_time: None,
            end_time: None,
        }
    }

    /// Restores a job from persisted fields. Intended for repository
    /// implementations only.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        job_id: JobId,
        user_name: String,
        archive_type: ArchiveType,
        target_size: TargetSize,
        total_size: u64,
        total_size_complete: u64,
        num_files: u64,
        num_files_complete: u64,
        num_archives: u64,
        num_archives_complete: u64,
        state: JobState,
        archives: Vec<ArchiveJob>,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        Job {
            job_id,
            user_name,
            archive_type,
            target_size,
            total_size,
            total_size_complete,
            num_files,
            num_files_complete,
            num_archives,
            num_archives_complete,
            state,
            archives,
            start_time,
            end_time,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn archive_type(&self) -> ArchiveType {
        self.archive_type
    }

    pub fn target_size(&self) -> TargetSize {
        self.target_size
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn total_size_complete(&self) -> u64 {
        self.total_size_complete
    }

    pub fn num_files(&self) -> u64 {
        self.num_files
    }

    pub fn num_files_complete(&self) -> u64 {
        self.num_files_complete
    }

    pub fn num_archives(&self) -> u64 {
        self.num_archives
    }

    pub fn num_archives_complete(&self) -> u64 {
        self.num_archives_complete
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn archives(&self) -> &[ArchiveJob] {
        &self.archives
    }

    pub fn archive(&self, archive_id: u32) -> Option<&ArchiveJob> {
        self.archives.iter().find(|a| a.archive_id() == archive_id)
    }

    pub fn archive_mut(&mut self, archive_id: u32) -> Option<&mut ArchiveJob> {
        self.archives.iter_mut().find(|a| a.archive_id() == archive_id)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Marks the job dispatched: workers exist, progress is observable.
    pub fn begin(&mut self, now: DateTime<Utc>) {
        self.start_time = Some(now);
        self.state = JobState::InProgress;
    }

    /// Marks the job failed at the job level (dispatch-time faults only;
    /// archive-level failures flow through `recompute_progress`).
    pub fn fail(&mut self, now: DateTime<Utc>) {
        self.end_time = Some(now);
        self.state = JobState::Error;
    }

    /// Elapsed wall-clock time in milliseconds, per the snapshot contract:
    /// `(end_time or now) - start_time`, and 0 for a job that never started.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        match self.start_time {
            Some(start) => {
                let end = self.end_time.unwrap_or(now);
                (end - start).num_milliseconds().max(0) as u64
            }
            None => 0,
        }
    }

    /// Recomputes the aggregate completion counters from the owned archives
    /// and drives the job to `COMPLETE` when every archive is terminal.
    ///
    /// Completion counters count only `COMPLETE` entries and archives;
    /// termination counts terminal archives (`COMPLETE` or `ERROR`), so a job
    /// with a failed archive still terminates while its archive states reveal
    /// the partial failure.
    pub fn recompute_progress(&mut self, now: DateTime<Utc>) -> ProgressRecompute {
        let mut files_complete: u64 = 0;
        let mut size_complete: u64 = 0;
        let mut archives_terminal: u64 = 0;

        for archive in &self.archives {
            files_complete += archive.completed_file_count();
            size_complete += archive.completed_bytes();
            if archive.is_terminal() {
                archives_terminal += 1;
            }
        }

        let clamped_files = files_complete > self.num_files;
        let clamped_size = size_complete > self.total_size;

        self.num_files_complete = files_complete.min(self.num_files);
        self.total_size_complete = size_complete.min(self.total_size);
        self.num_archives_complete = archives_terminal.min(self.num_archives);

        let job_complete =
            self.num_archives > 0 && self.num_archives_complete == self.num_archives;
        if job_complete {
            self.state = JobState::Complete;
            self.end_time = Some(now);
        }

        ProgressRecompute {
            clamped_files,
            clamped_size,
            job_complete,
        }
    }
}

fn non_empty_user(user_name: String) -> String {
    if user_name.trim().is_empty() {
        DEFAULT_USER_NAME.to_string()
    } else {
        user_name
    }
}
