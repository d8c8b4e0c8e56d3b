// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archive Worker
//!
//! Runs one archive end-to-end: claim the row, stream the elements through
//! the type's archiver, hash the artifact, persist the terminal state, and
//! notify the job tracker. Workers within a job run concurrently and share
//! nothing but the repository and the tracker.
//!
//! ## Blocking Section
//!
//! Streaming and hashing are synchronous and run inside
//! `tokio::task::spawn_blocking`. The per-entry completion callback fires in
//! that blocking context and persists each entry's `COMPLETE` state through
//! the captured runtime handle; persistence failures in the callback are
//! logged and swallowed - they never abort the archive.
//!
//! ## Failure Policy
//!
//! Any stream, hash, or filesystem failure marks the archive `ERROR`. The
//! tracker is notified on every terminal outcome, success or not, because
//! termination accounting needs terminal archives, not successful ones. The
//! one case that skips notification is a repository that cannot record the
//! terminal state: notifying then would let the tracker's safety net coerce
//! a possibly-failed archive to `COMPLETE`.

use std::sync::Arc;

use chrono::Utc;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::application::services::JobTracker;
use crate::infrastructure::archivers::archiver_for;
use file_bundler_domain::{
    ArchiveElement, BundlerError, FileSystem, HashAlgorithm, HashService, JobId, JobRepository,
    JobState,
};

/// Worker for a single `(job_id, archive_id)`.
pub struct ArchiveWorker {
    job_id: JobId,
    archive_id: u32,
    host_name: String,
    hash_algorithm: HashAlgorithm,
    repository: Arc<dyn JobRepository>,
    file_system: Arc<dyn FileSystem>,
    hasher: Arc<dyn HashService>,
    tracker: Arc<JobTracker>,
}

impl ArchiveWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_id: JobId,
        archive_id: u32,
        host_name: String,
        hash_algorithm: HashAlgorithm,
        repository: Arc<dyn JobRepository>,
        file_system: Arc<dyn FileSystem>,
        hasher: Arc<dyn HashService>,
        tracker: Arc<JobTracker>,
    ) -> Self {
        ArchiveWorker {
            job_id,
            archive_id,
            host_name,
            hash_algorithm,
            repository,
            file_system,
            hasher,
            tracker,
        }
    }

    /// Runs the archive to a terminal state. Errors never escape: every
    /// outcome is recorded in the archive row and logged.
    pub async fn run(self) {
        // Load the claimed row. Without it no state change is possible.
        let mut archive = match self.repository.get_archive(&self.job_id, self.archive_id).await {
            Ok(Some(archive)) => archive,
            Ok(None) => {
                error!(
                    job_id = %self.job_id,
                    archive_id = self.archive_id,
                    "archive row missing, worker exiting"
                );
                return;
            }
            Err(e) => {
                error!(
                    job_id = %self.job_id,
                    archive_id = self.archive_id,
                    "cannot load archive row: {}",
                    e
                );
                return;
            }
        };

        // Claim: worker identity, start time, IN_PROGRESS. A failed claim
        // write is logged and the work continues; the terminal write will
        // carry the same fields.
        archive.begin(&self.host_name, Utc::now());
        if let Err(e) = self.repository.update_archive(&archive).await {
            warn!(
                job_id = %self.job_id,
                archive_id = self.archive_id,
                "claim not persisted, continuing: {}",
                e
            );
        }
        debug!(
            job_id = %self.job_id,
            archive_id = self.archive_id,
            files = archive.num_files(),
            output = %archive.output_path(),
            "worker claimed archive"
        );

        let outcome = self.bundle_and_hash(&archive).await;

        let now = Utc::now();
        match outcome {
            Ok(artifact_size) => {
                info!(
                    job_id = %self.job_id,
                    archive_id = self.archive_id,
                    artifact_size,
                    "archive complete"
                );
                archive.complete(artifact_size, now);
            }
            Err(e) => {
                error!(
                    job_id = %self.job_id,
                    archive_id = self.archive_id,
                    category = e.category(),
                    "archive failed: {}",
                    e
                );
                archive.fail(now);
            }
        }

        if let Err(e) = self.repository.update_archive(&archive).await {
            // Cannot record the terminal state; notifying now would let the
            // tracker coerce this row based on a signal alone.
            error!(
                job_id = %self.job_id,
                archive_id = self.archive_id,
                "terminal state not persisted, skipping notification: {}",
                e
            );
            return;
        }

        self.tracker.notify(self.archive_id).await;
    }

    /// The blocking section: archiver, hasher, artifact size.
    async fn bundle_and_hash(
        &self,
        archive: &file_bundler_domain::ArchiveJob,
    ) -> Result<u64, BundlerError> {
        let elements: Vec<ArchiveElement> = archive
            .files()
            .iter()
            .map(|entry| {
                ArchiveElement::new(
                    entry.source().clone(),
                    entry.entry_path().clone(),
                    entry.size(),
                )
            })
            .collect();

        let archive_type = archive.archive_type();
        let output = archive.output_path().clone();
        let hash_output = archive.hash_path().clone();
        let algorithm = self.hash_algorithm;
        let job_id = self.job_id.clone();
        let archive_id = self.archive_id;
        let repository = self.repository.clone();
        let file_system = self.file_system.clone();
        let hasher = self.hasher.clone();
        let handle = Handle::current();

        let joined = tokio::task::spawn_blocking(move || {
            let archiver = archiver_for(archive_type, file_system.clone());

            // The file-completion observer: persist each entry as COMPLETE
            // when its bytes are in the container. Failures are logged and
            // swallowed.
            let mut on_entry = |element: &ArchiveElement| {
                let persisted = handle.block_on(repository.update_file_entry_state(
                    &job_id,
                    archive_id,
                    &element.source,
                    JobState::Complete,
                ));
                if let Err(e) = persisted {
                    warn!(
                        job_id = %job_id,
                        archive_id,
                        source = %element.source,
                        "entry completion not persisted: {}",
                        e
                    );
                }
            };

            archiver.bundle(&elements, &output, &mut on_entry)?;
            hasher.digest_to_file(&output, &hash_output, algorithm)?;
            file_system.size(&output)
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(e) => Err(BundlerError::InternalError(format!(
                "archive task panicked: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::OutputNamer;
    use crate::infrastructure::adapters::{LocalFileSystem, StreamingHasher};
    use crate::infrastructure::repositories::SqliteJobRepository;
    use file_bundler_domain::entities::{ArchiveJob, ArchiveJobConfig, FileEntry, Job};
    use file_bundler_domain::value_objects::{ArchiveType, EntryPath, RemotePath, TargetSize};
    use file_bundler_domain::HashService as _;
    use std::io::Read as _;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        repo: Arc<SqliteJobRepository>,
        file_system: Arc<dyn FileSystem>,
        hasher: Arc<StreamingHasher>,
        job: Job,
    }

    async fn fixture(contents: &[&[u8]], sabotage_source: Option<usize>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let file_system: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new());
        let hasher = Arc::new(StreamingHasher::new(file_system.clone()));
        let namer = OutputNamer::new(dir.path().to_str().unwrap(), "http://host/data").unwrap();

        let job_id = JobId::generate();
        let mut files = Vec::new();
        for (i, content) in contents.iter().enumerate() {
            let source = dir.path().join(format!("src_{}.bin", i));
            if sabotage_source != Some(i) {
                std::fs::write(&source, content).unwrap();
            }
            files.push(FileEntry::new(
                job_id.clone(),
                0,
                RemotePath::local(&source),
                EntryPath::new(format!("src_{}.bin", i)).unwrap(),
                content.len() as u64,
            ));
        }

        let output = namer.archive_path(&job_id, "bundle", 0, ArchiveType::Tar);
        let hash_path = namer.hash_path(&output, HashAlgorithm::Sha1);
        let archive = ArchiveJob::new(ArchiveJobConfig {
            job_id: job_id.clone(),
            archive_id: 0,
            archive_type: ArchiveType::Tar,
            output_path: output,
            hash_path,
            output_url: String::new(),
            hash_url: String::new(),
            files,
        })
        .unwrap();

        let mut job = Job::new(
            job_id,
            "tester",
            ArchiveType::Tar,
            TargetSize::from_bytes(1024 * 1024),
            vec![archive],
        )
        .unwrap();
        job.begin(Utc::now());

        let repo = Arc::new(SqliteJobRepository::in_memory().await.unwrap());
        repo.persist_job(&job).await.unwrap();

        Fixture {
            _dir: dir,
            repo,
            file_system,
            hasher,
            job,
        }
    }

    fn worker(f: &Fixture, tracker: Arc<JobTracker>) -> ArchiveWorker {
        ArchiveWorker::new(
            f.job.job_id().clone(),
            0,
            "test-host".to_string(),
            HashAlgorithm::Sha1,
            f.repo.clone(),
            f.file_system.clone(),
            f.hasher.clone(),
            tracker,
        )
    }

    #[tokio::test]
    async fn test_successful_run_completes_archive_and_job() {
        let f = fixture(&[b"alpha", b"bravo"], None).await;
        let tracker = Arc::new(JobTracker::new(f.job.job_id().clone(), f.repo.clone()));

        worker(&f, tracker).run().await;

        let loaded = f.repo.get_job(f.job.job_id()).await.unwrap().unwrap();
        let archive = &loaded.archives()[0];
        assert_eq!(archive.state(), JobState::Complete);
        assert_eq!(archive.host_name(), "test-host");
        assert!(archive.size() > 0);
        assert!(archive.end_time().is_some());

        // every entry persisted COMPLETE by the observer
        assert_eq!(archive.completed_file_count(), 2);

        // the job aggregated to COMPLETE through the tracker
        assert_eq!(loaded.state(), JobState::Complete);
        assert_eq!(loaded.num_files_complete(), 2);

        // the artifact and its hash file exist, and the hash matches
        assert!(f.file_system.exists(archive.output_path()).unwrap());
        let mut written = String::new();
        f.file_system
            .open(archive.hash_path())
            .unwrap()
            .read_to_string(&mut written)
            .unwrap();
        let recomputed = f
            .hasher
            .digest(archive.output_path(), HashAlgorithm::Sha1)
            .unwrap();
        assert_eq!(written, recomputed);
    }

    #[tokio::test]
    async fn test_missing_source_marks_error_and_still_notifies() {
        let f = fixture(&[b"ok", b"never-written"], Some(1)).await;
        let tracker = Arc::new(JobTracker::new(f.job.job_id().clone(), f.repo.clone()));

        worker(&f, tracker).run().await;

        let loaded = f.repo.get_job(f.job.job_id()).await.unwrap().unwrap();
        let archive = &loaded.archives()[0];
        assert_eq!(archive.state(), JobState::Error);
        assert!(archive.end_time().is_some());

        // the tracker still accounted for the terminal archive
        assert_eq!(loaded.num_archives_complete(), 1);
        assert_eq!(loaded.state(), JobState::Complete);
        // and kept the ERROR state authoritative
        assert_eq!(loaded.archives()[0].state(), JobState::Error);
    }

    #[tokio::test]
    async fn test_worker_without_row_exits_quietly() {
        let f = fixture(&[b"x"], None).await;
        let tracker = Arc::new(JobTracker::new(f.job.job_id().clone(), f.repo.clone()));

        let stranger = ArchiveWorker::new(
            JobId::generate(),
            7,
            "test-host".to_string(),
            HashAlgorithm::Sha1,
            f.repo.clone(),
            f.file_system.clone(),
            f.hasher.clone(),
            tracker,
        );
        stranger.run().await;

        // the real job is untouched
        let loaded = f.repo.get_job(f.job.job_id()).await.unwrap().unwrap();
        assert_eq!(loaded.archives()[0].state(), JobState::NotStarted);
    }
}
