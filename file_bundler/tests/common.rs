// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Common Test Helpers
//!
//! Shared fixture assembly for integration and end-to-end tests: the full
//! service stack over a temp staging area and an in-memory repository.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use file_bundler::application::services::{
    BundleService, BundleServiceSettings, OutputNamer, SnapshotService,
};
use file_bundler::infrastructure::adapters::{LocalFileSystem, StreamingHasher};
use file_bundler::infrastructure::repositories::SqliteJobRepository;
use file_bundler_domain::services::{ArchivePlanner, EntryPathNormalizer, RatioEstimator};
use file_bundler_domain::{FileSystem, HashAlgorithm, Job, JobId, JobRepository};

/// Whole-stack fixture: staging area, repository, services.
pub struct TestStack {
    pub dir: TempDir,
    pub repo: Arc<SqliteJobRepository>,
    pub file_system: Arc<dyn FileSystem>,
    pub hasher: Arc<StreamingHasher>,
    pub bundle_service: BundleService,
    pub snapshot_service: SnapshotService,
}

/// Builds the full stack with a 1 MB minimum target size (so tests can
/// exercise bin-packing with small files) and a flat estimator percentage.
pub async fn test_stack(average_compression_percentage: u8) -> TestStack {
    let dir = TempDir::new().unwrap();
    let staging = dir.path().join("staging");
    std::fs::create_dir_all(&staging).unwrap();

    let repo = Arc::new(SqliteJobRepository::in_memory().await.unwrap());
    let file_system: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new());
    let hasher = Arc::new(StreamingHasher::new(file_system.clone()));
    let planner = Arc::new(ArchivePlanner::new(Arc::new(
        RatioEstimator::new(average_compression_percentage).unwrap(),
    )));
    let normalizer = Arc::new(EntryPathNormalizer::without_exclusions());
    let namer = OutputNamer::new(staging.to_str().unwrap(), "http://host/data").unwrap();

    let bundle_service = BundleService::new(
        repo.clone(),
        file_system.clone(),
        hasher.clone(),
        planner,
        normalizer,
        namer,
        BundleServiceSettings {
            min_size_mb: 1,
            max_size_mb: 2048,
            default_size_mb: 100,
            hash_algorithm: HashAlgorithm::Sha1,
            host_name: "test-host".to_string(),
        },
    );
    let snapshot_service = SnapshotService::new(repo.clone());

    TestStack {
        dir,
        repo,
        file_system,
        hasher,
        bundle_service,
        snapshot_service,
    }
}

/// Writes an input file under the fixture's `input/` tree and returns its
/// absolute path.
pub fn write_input(stack: &TestStack, rel: &str, content: &[u8]) -> String {
    let path = stack.dir.path().join("input").join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

/// Polls until the job reaches a terminal state.
pub async fn wait_for_terminal(repo: &SqliteJobRepository, job_id: &JobId) -> Job {
    for _ in 0..500 {
        if let Some(job) = repo.get_job(job_id).await.unwrap() {
            if job.state().is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached a terminal state", job_id);
}

/// The universal invariants every persisted job must satisfy.
pub fn assert_invariants(job: &Job) {
    assert!(job.num_files_complete() <= job.num_files());
    assert!(job.total_size_complete() <= job.total_size());
    assert!(job.num_archives_complete() <= job.num_archives());

    let mut file_sum = 0u64;
    let mut size_sum = 0u64;
    for (index, archive) in job.archives().iter().enumerate() {
        assert_eq!(archive.archive_id() as usize, index, "archive ids contiguous");
        assert_eq!(
            archive.files().len() as u64,
            archive.num_files(),
            "archive file count matches entries"
        );
        for entry in archive.files() {
            assert!(entry.entry_path().len() <= 100, "entry path capped");
        }
        file_sum += archive.num_files();
        size_sum += archive.files().iter().map(|e| e.size()).sum::<u64>();
    }
    assert_eq!(file_sum, job.num_files(), "file counts add up");
    assert_eq!(size_sum, job.total_size(), "sizes add up");
}

/// SHA-1 of a byte slice, for independent hash verification.
pub fn sha1_hex(data: &[u8]) -> String {
    use sha1::{Digest, Sha1};
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
