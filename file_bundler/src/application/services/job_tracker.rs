// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Tracker
//!
//! The job-completion observer. One tracker exists per job; every worker
//! holds the same `Arc` and calls [`JobTracker::notify`] when its archive
//! reaches a terminal state. Notifications are serialized behind an async
//! mutex, so the load → recompute → persist cycle runs atomically per
//! notification and the final persisted job is identical under any
//! completion interleaving.
//!
//! ## Safety Net
//!
//! A notification can arrive before the archive's own terminal update is
//! visible through the repository. In that case - and only when the loaded
//! row is still non-terminal - the tracker coerces the archive to
//! `COMPLETE` with the current time and persists it, logging a warning.
//! Rows already terminal are authoritative: an `ERROR` archive is never
//! rewritten by its completion signal.
//!
//! ## Termination Policy
//!
//! `num_archives_complete` counts terminal archives, so a job whose
//! archives all reached `COMPLETE` or `ERROR` terminates with job state
//! `COMPLETE`; the per-archive states expose the partial failure.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use file_bundler_domain::{BundlerError, JobId, JobRepository};

/// Serialized per-job completion sink.
pub struct JobTracker {
    job_id: JobId,
    repository: Arc<dyn JobRepository>,
    gate: Mutex<()>,
}

impl JobTracker {
    pub fn new(job_id: JobId, repository: Arc<dyn JobRepository>) -> Self {
        JobTracker {
            job_id,
            repository,
            gate: Mutex::new(()),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Processes one archive-terminal notification. Never fails the caller:
    /// repository trouble is logged and the notification dropped (the next
    /// one recomputes from scratch).
    pub async fn notify(&self, archive_id: u32) {
        let _serialized = self.gate.lock().await;
        if let Err(e) = self.process(archive_id).await {
            warn!(
                job_id = %self.job_id,
                archive_id,
                "dropping completion notification: {}",
                e
            );
        }
    }

    async fn process(&self, archive_id: u32) -> Result<(), BundlerError> {
        let Some(mut job) = self.repository.get_job(&self.job_id).await? else {
            warn!(job_id = %self.job_id, archive_id, "notified for unknown job");
            return Ok(());
        };

        let now = Utc::now();

        let needs_coercion = match job.archive(archive_id) {
            None => {
                warn!(job_id = %self.job_id, archive_id, "notified for unknown archive");
                return Ok(());
            }
            Some(archive) => !archive.is_terminal(),
        };

        if needs_coercion {
            // Write-visibility lag: the worker says terminal, the row does
            // not. Complete it here; a row already ERROR is left alone.
            warn!(
                job_id = %self.job_id,
                archive_id,
                "archive not terminal at notification time, coercing to COMPLETE"
            );
            if let Some(archive) = job.archive_mut(archive_id) {
                let artifact_size = archive.size();
                archive.complete(artifact_size, now);
            }
            if let Some(archive) = job.archive(archive_id) {
                self.repository.update_archive(archive).await?;
            }
        }

        let progress = job.recompute_progress(now);
        if progress.clamped_files {
            warn!(job_id = %self.job_id, "files-complete exceeded num_files, clamped");
        }
        if progress.clamped_size {
            warn!(job_id = %self.job_id, "size-complete exceeded total_size, clamped");
        }
        if progress.job_complete {
            info!(
                job_id = %self.job_id,
                archives = job.num_archives(),
                files = job.num_files_complete(),
                bytes = job.total_size_complete(),
                "job complete"
            );
        }

        self.repository.update_job(&job).await
    }
}
