// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bundle Service
//!
//! The job factory and dispatcher: the single entry point that turns a
//! client submission into a running job.
//!
//! ```text
//! validate → expand (walk) → normalize paths → bin-pack → persist Job
//!          → ensure staging dir → mark IN_PROGRESS → spawn one worker
//!            per archive, all attached to one JobTracker
//! ```
//!
//! Any validation failure - empty file list, unknown archive type, a source
//! that cannot be expanded - persists the job with `INVALID_REQUEST` and
//! spawns nothing; the client still receives a receipt and can query the
//! state. Only repository failures propagate to the caller (the HTTP layer
//! maps them to 500).
//!
//! The job is marked `IN_PROGRESS` and persisted *before* the workers are
//! spawned: a worker that finishes instantly must never race a later
//! job-row write that would overwrite the tracker's aggregation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::application::services::{ArchiveWorker, JobTracker, OutputNamer};
use file_bundler_domain::entities::{ArchiveJob, ArchiveJobConfig, FileEntry, Job};
use file_bundler_domain::services::{ArchivePlanner, EntryPathNormalizer};
use file_bundler_domain::{
    ArchiveElement, ArchiveType, BundlerError, FileSystem, HashAlgorithm, HashService, JobId,
    JobRepository, JobState, RemotePath, TargetSize,
};

/// One file (or directory) of a submission.
#[derive(Debug, Clone)]
pub struct RequestedFile {
    pub path: String,
    /// Replacement prefix for the in-archive path.
    pub archive_path: Option<String>,
}

/// A validated-enough submission, as translated by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct BundleRequest {
    pub files: Vec<RequestedFile>,
    pub archive_type: Option<String>,
    pub max_size_mb: Option<u64>,
    pub output_filename: Option<String>,
    pub user_name: Option<String>,
}

/// What the client gets back immediately.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub job_id: JobId,
    pub user_name: String,
    pub state: JobState,
}

/// Deployment-level settings the service needs at submission time.
#[derive(Debug, Clone)]
pub struct BundleServiceSettings {
    pub min_size_mb: u64,
    pub max_size_mb: u64,
    pub default_size_mb: u64,
    pub hash_algorithm: HashAlgorithm,
    pub host_name: String,
}

/// The job factory and dispatcher.
pub struct BundleService {
    repository: Arc<dyn JobRepository>,
    file_system: Arc<dyn FileSystem>,
    hasher: Arc<dyn HashService>,
    planner: Arc<ArchivePlanner>,
    normalizer: Arc<EntryPathNormalizer>,
    namer: OutputNamer,
    settings: BundleServiceSettings,
}

impl BundleService {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        file_system: Arc<dyn FileSystem>,
        hasher: Arc<dyn HashService>,
        planner: Arc<ArchivePlanner>,
        normalizer: Arc<EntryPathNormalizer>,
        namer: OutputNamer,
        settings: BundleServiceSettings,
    ) -> Self {
        BundleService {
            repository,
            file_system,
            hasher,
            planner,
            normalizer,
            namer,
            settings,
        }
    }

    /// Submits a new job under a fresh id.
    pub async fn submit(&self, request: BundleRequest) -> Result<SubmissionReceipt, BundlerError> {
        self.submit_with_id(JobId::generate(), request).await
    }

    /// Submits a new job under the given id. Returns the receipt once the
    /// job is persisted and its workers are running (or the job is recorded
    /// as `INVALID_REQUEST`).
    pub async fn submit_with_id(
        &self,
        job_id: JobId,
        request: BundleRequest,
    ) -> Result<SubmissionReceipt, BundlerError> {
        let user_name = request.user_name.clone().unwrap_or_default();

        // Archive type: absent means the default container; unknown is a
        // rejection the client can query.
        let archive_type = match request.archive_type.as_deref() {
            None | Some("") => ArchiveType::Zip,
            Some(raw) => match raw.parse::<ArchiveType>() {
                Ok(archive_type) => archive_type,
                Err(reason) => return self.reject(job_id, &user_name, ArchiveType::Zip, reason).await,
            },
        };

        let requested_mb = request.max_size_mb.unwrap_or(self.settings.default_size_mb);
        let (target, clamped) = TargetSize::clamped_mb(
            requested_mb,
            self.settings.min_size_mb,
            self.settings.max_size_mb,
        );
        if clamped {
            warn!(
                job_id = %job_id,
                requested_mb,
                clamped_mb = target.megabytes(),
                "target archive size clamped"
            );
        }

        if request.files.is_empty() {
            return self
                .reject(
                    job_id,
                    &user_name,
                    archive_type,
                    BundlerError::invalid_request("empty file list"),
                )
                .await;
        }

        // Expansion touches filesystems (possibly remote) and must run on a
        // blocking thread.
        let expansion = {
            let file_system = self.file_system.clone();
            let normalizer = self.normalizer.clone();
            let files = request.files.clone();
            tokio::task::spawn_blocking(move || expand_request(&*file_system, &normalizer, files))
                .await
                .map_err(|e| BundlerError::InternalError(format!("expansion task panicked: {}", e)))?
        };

        let elements = match expansion {
            Ok(elements) if !elements.is_empty() => elements,
            Ok(_) => {
                return self
                    .reject(
                        job_id,
                        &user_name,
                        archive_type,
                        BundlerError::invalid_request("file list expands to nothing"),
                    )
                    .await
            }
            Err(reason) => return self.reject(job_id, &user_name, archive_type, reason).await,
        };

        let plan = self.planner.plan(elements, archive_type, target);
        let template = OutputNamer::clean_template(request.output_filename.as_deref());

        let mut archives = Vec::with_capacity(plan.len());
        for (index, planned) in plan.into_iter().enumerate() {
            let archive_id = index as u32;
            let output_path = self
                .namer
                .archive_path(&job_id, &template, archive_id, archive_type);
            let hash_path = self.namer.hash_path(&output_path, self.settings.hash_algorithm);
            let files = planned
                .elements
                .into_iter()
                .map(|element| {
                    FileEntry::new(
                        job_id.clone(),
                        archive_id,
                        element.source,
                        element.entry_path,
                        element.size,
                    )
                })
                .collect();
            archives.push(ArchiveJob::new(ArchiveJobConfig {
                job_id: job_id.clone(),
                archive_id,
                archive_type,
                output_url: self.namer.to_url(&output_path),
                hash_url: self.namer.to_url(&hash_path),
                output_path,
                hash_path,
                files,
            })?);
        }

        let mut job = Job::new(job_id.clone(), user_name, archive_type, target, archives)?;
        self.repository.persist_job(&job).await?;

        self.file_system
            .create_dir_all(&self.namer.job_directory(&job_id))?;

        info!(
            job_id = %job_id,
            user = job.user_name(),
            archive_type = %archive_type,
            archives = job.num_archives(),
            files = job.num_files(),
            bytes = job.total_size(),
            "job accepted"
        );

        // Flip to IN_PROGRESS before dispatch; see the module docs.
        job.begin(Utc::now());
        self.repository.update_job(&job).await?;

        let tracker = Arc::new(JobTracker::new(job_id.clone(), self.repository.clone()));
        for archive in job.archives() {
            let worker = ArchiveWorker::new(
                job_id.clone(),
                archive.archive_id(),
                self.settings.host_name.clone(),
                self.settings.hash_algorithm,
                self.repository.clone(),
                self.file_system.clone(),
                self.hasher.clone(),
                tracker.clone(),
            );
            tokio::spawn(worker.run());
        }

        Ok(SubmissionReceipt {
            job_id,
            user_name: job.user_name().to_string(),
            state: JobState::NotStarted,
        })
    }

    /// Persists the terminal record of a rejected submission.
    async fn reject(
        &self,
        job_id: JobId,
        user_name: &str,
        archive_type: ArchiveType,
        reason: BundlerError,
    ) -> Result<SubmissionReceipt, BundlerError> {
        warn!(job_id = %job_id, "rejecting submission: {}", reason);
        let (target, _) = TargetSize::clamped_mb(
            self.settings.default_size_mb,
            self.settings.min_size_mb,
            self.settings.max_size_mb,
        );
        let job = Job::invalid_request(job_id.clone(), user_name, archive_type, target);
        self.repository.persist_job(&job).await?;
        Ok(SubmissionReceipt {
            job_id,
            user_name: job.user_name().to_string(),
            state: JobState::InvalidRequest,
        })
    }
}

/// Expands the requested files into archive elements: walks directories,
/// sizes every file, and computes its in-archive path.
///
/// Every failure here invalidates the submission as a whole - a file list
/// that cannot be fully resolved is an invalid request, not a partial job.
fn expand_request(
    file_system: &dyn FileSystem,
    normalizer: &EntryPathNormalizer,
    files: Vec<RequestedFile>,
) -> Result<Vec<ArchiveElement>, BundlerError> {
    let mut elements = Vec::new();

    for requested in files {
        let root = RemotePath::parse(&requested.path).map_err(|e| {
            BundlerError::InvalidRequest(format!("bad path '{}': {}", requested.path, e))
        })?;
        let walked = file_system.walk(&root).map_err(|e| {
            BundlerError::InvalidRequest(format!("cannot expand '{}': {}", root, e))
        })?;
        let directory_expansion = walked.len() != 1 || walked[0] != root;

        for file in walked {
            let size = file_system.size(&file).map_err(|e| {
                BundlerError::InvalidRequest(format!("cannot size '{}': {}", file, e))
            })?;

            // Directory requests strip the requested root; a single file
            // with a replacement prefix strips its parent so the prefix
            // replaces the directory part.
            let base_dir = if directory_expansion {
                Some(root.path().to_string())
            } else if requested.archive_path.is_some() {
                parent_of(file.path())
            } else {
                None
            };

            let entry_path = normalizer.normalize(
                &file,
                base_dir.as_deref(),
                requested.archive_path.as_deref(),
            )?;
            elements.push(ArchiveElement::new(file, entry_path, size));
        }
    }

    Ok(elements)
}

fn parent_of(path: &str) -> Option<String> {
    path.rfind('/')
        .map(|idx| path[..idx].to_string())
        .filter(|parent| !parent.is_empty())
}
