// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Snapshot Service
//!
//! The read side of the job tracker: a pure projection of the persisted job
//! into the progress snapshot the HTTP contract exposes. No caching, no
//! mutation - every call reads the repository and derives the answer.
//!
//! Field names on the DTOs are the wire contract (`threads` is the archive
//! count; the name predates this implementation) and must not be renamed.
//! Hash files are one-to-one with archives, so `hashes_complete` mirrors
//! `threads_complete`. Only terminal archives appear in `archives`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use file_bundler_domain::entities::ArchiveJob;
use file_bundler_domain::{BundlerError, Job, JobId, JobRepository, JobState};

/// One terminal archive in a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSnapshot {
    pub archive_id: u32,
    pub state: JobState,
    pub output_url: String,
    pub hash_url: String,
    pub num_files: u64,
    pub size: u64,
    pub host: String,
    pub start_time: u64,
    pub end_time: u64,
}

/// Progress snapshot of one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub job_id: String,
    pub user_name: String,
    pub state: JobState,
    pub threads: u64,
    pub threads_complete: u64,
    pub hashes_complete: u64,
    pub num_files: u64,
    pub files_complete: u64,
    pub size: u64,
    pub size_complete: u64,
    pub elapsed_time: u64,
    pub archives: Vec<ArchiveSnapshot>,
}

/// Read-side projection service.
pub struct SnapshotService {
    repository: Arc<dyn JobRepository>,
}

impl SnapshotService {
    pub fn new(repository: Arc<dyn JobRepository>) -> Self {
        SnapshotService { repository }
    }

    /// Snapshot of a job. An unknown id yields the `NOT_AVAILABLE` shape
    /// rather than an error, so pollers can start before the submission
    /// lands.
    pub async fn snapshot(&self, job_id: &JobId) -> Result<JobSnapshot, BundlerError> {
        match self.repository.get_job(job_id).await? {
            Some(job) => Ok(project(&job, Utc::now())),
            None => Ok(not_available(job_id)),
        }
    }

    /// All known job ids (diagnostic surface).
    pub async fn known_job_ids(&self) -> Result<Vec<JobId>, BundlerError> {
        self.repository.list_job_ids().await
    }
}

fn epoch_ms(time: Option<DateTime<Utc>>) -> u64 {
    time.map(|t| t.timestamp_millis().max(0) as u64).unwrap_or(0)
}

fn project(job: &Job, now: DateTime<Utc>) -> JobSnapshot {
    let archives = job
        .archives()
        .iter()
        .filter(|archive| archive.is_terminal())
        .map(project_archive)
        .collect();

    JobSnapshot {
        job_id: job.job_id().to_string(),
        user_name: job.user_name().to_string(),
        state: job.state(),
        threads: job.num_archives(),
        threads_complete: job.num_archives_complete(),
        hashes_complete: job.num_archives_complete(),
        num_files: job.num_files(),
        files_complete: job.num_files_complete(),
        size: job.total_size(),
        size_complete: job.total_size_complete(),
        elapsed_time: job.elapsed_ms(now),
        archives,
    }
}

fn project_archive(archive: &ArchiveJob) -> ArchiveSnapshot {
    ArchiveSnapshot {
        archive_id: archive.archive_id(),
        state: archive.state(),
        output_url: archive.output_url().to_string(),
        hash_url: archive.hash_url().to_string(),
        num_files: archive.num_files(),
        size: archive.size(),
        host: archive.host_name().to_string(),
        start_time: epoch_ms(archive.start_time()),
        end_time: epoch_ms(archive.end_time()),
    }
}

fn not_available(job_id: &JobId) -> JobSnapshot {
    JobSnapshot {
        job_id: job_id.to_string(),
        user_name: String::new(),
        state: JobState::NotAvailable,
        threads: 0,
        threads_complete: 0,
        hashes_complete: 0,
        num_files: 0,
        files_complete: 0,
        size: 0,
        size_complete: 0,
        elapsed_time: 0,
        archives: Vec::new(),
    }
}
