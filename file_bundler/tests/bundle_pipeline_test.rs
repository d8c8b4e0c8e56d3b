// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bundle Pipeline End-to-End Tests
//!
//! Whole-stack scenarios over the real services: submission, expansion,
//! bin-packing, concurrent workers, hashing, tracking, snapshots. Every
//! terminal job is checked against the universal invariants.

mod common;

use std::sync::Arc;

use common::{assert_invariants, sha1_hex, test_stack, wait_for_terminal, write_input};
use file_bundler::application::services::{ArchiveWorker, BundleRequest, JobTracker, RequestedFile};
use file_bundler_domain::entities::{ArchiveJob, ArchiveJobConfig, FileEntry, Job};
use file_bundler_domain::value_objects::{
    ArchiveType, EntryPath, HashAlgorithm, JobId, JobState, RemotePath, TargetSize,
};
use file_bundler_domain::JobRepository as _;

const KB: usize = 1024;

fn request(files: Vec<RequestedFile>, archive_type: &str) -> BundleRequest {
    BundleRequest {
        files,
        archive_type: Some(archive_type.to_string()),
        max_size_mb: Some(1),
        output_filename: None,
        user_name: Some("tester".to_string()),
    }
}

fn plain(path: String) -> RequestedFile {
    RequestedFile {
        path,
        archive_path: None,
    }
}

// S1: a single small file into a ZIP runs to COMPLETE with a matching hash
// file.
#[tokio::test]
async fn test_single_small_file_zip() {
    let stack = test_stack(40).await;
    let path = write_input(&stack, "a.bin", &[0xAB; 10]);

    let receipt = stack
        .bundle_service
        .submit(request(vec![plain(path)], "ZIP"))
        .await
        .unwrap();
    assert_eq!(receipt.state, JobState::NotStarted);

    let job = wait_for_terminal(&stack.repo, &receipt.job_id).await;
    assert_invariants(&job);
    assert_eq!(job.state(), JobState::Complete);
    assert_eq!(job.num_archives(), 1);
    assert_eq!(job.num_files(), 1);
    assert_eq!(job.num_files_complete(), 1);

    let archive = &job.archives()[0];
    assert_eq!(archive.num_files(), 1);
    assert_eq!(archive.state(), JobState::Complete);

    // the hash file holds the SHA-1 of the zip bytes
    let artifact = std::fs::read(archive.output_path().to_local_path()).unwrap();
    let written = std::fs::read_to_string(archive.hash_path().to_local_path()).unwrap();
    assert_eq!(written, sha1_hex(&artifact));
}

// S2: packing across the target boundary, no reordering.
#[tokio::test]
async fn test_bin_packing_across_target_boundary() {
    let stack = test_stack(0).await;
    // 0.4 MB each against a 1 MB target: [a, b] then [c].
    let paths: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|name| write_input(&stack, &format!("{}.bin", name), &vec![1u8; 400 * KB]))
        .collect();

    let receipt = stack
        .bundle_service
        .submit(request(paths.into_iter().map(plain).collect(), "TAR"))
        .await
        .unwrap();

    let job = wait_for_terminal(&stack.repo, &receipt.job_id).await;
    assert_invariants(&job);
    assert_eq!(job.state(), JobState::Complete);
    assert_eq!(job.num_archives(), 2);
    assert_eq!(job.archives()[0].num_files(), 2);
    assert_eq!(job.archives()[1].num_files(), 1);

    // membership follows input order
    let first: Vec<_> = job.archives()[0]
        .files()
        .iter()
        .map(|e| e.entry_path().as_str().to_string())
        .collect();
    assert!(first[0].ends_with("a.bin"));
    assert!(first[1].ends_with("b.bin"));
}

// S3: a single file larger than the target still forms its own archive.
#[tokio::test]
async fn test_oversize_single_file() {
    let stack = test_stack(0).await;
    let path = write_input(&stack, "big.bin", &vec![2u8; 2 * 1024 * KB]);

    let receipt = stack
        .bundle_service
        .submit(request(vec![plain(path)], "TAR"))
        .await
        .unwrap();

    let job = wait_for_terminal(&stack.repo, &receipt.job_id).await;
    assert_invariants(&job);
    assert_eq!(job.state(), JobState::Complete);
    assert_eq!(job.num_archives(), 1);
    assert_eq!(job.archives()[0].num_files(), 1);
    assert!(job.total_size() > job.target_size().bytes());
}

// S4: an empty file list is rejected, persisted, and spawns nothing.
#[tokio::test]
async fn test_empty_file_list() {
    let stack = test_stack(0).await;

    let receipt = stack
        .bundle_service
        .submit(request(vec![], "ZIP"))
        .await
        .unwrap();
    assert_eq!(receipt.state, JobState::InvalidRequest);

    let job = stack.repo.get_job(&receipt.job_id).await.unwrap().unwrap();
    assert_eq!(job.state(), JobState::InvalidRequest);
    assert_eq!(job.num_archives(), 0);
    assert_invariants(&job);

    let snapshot = stack.snapshot_service.snapshot(&receipt.job_id).await.unwrap();
    assert_eq!(snapshot.state, JobState::InvalidRequest);
    assert_eq!(snapshot.threads, 0);
}

// S5: one failing archive out of three; the job still terminates, the
// failed archive keeps its ERROR state, and all three count as terminal.
#[tokio::test]
async fn test_mid_job_archive_error() {
    let stack = test_stack(0).await;
    let job_id = JobId::generate();
    let staging = stack.dir.path().join("staging").join(job_id.as_str());
    std::fs::create_dir_all(&staging).unwrap();

    let mut archives = Vec::new();
    for archive_id in 0..3u32 {
        let source_path = stack
            .dir
            .path()
            .join("input")
            .join(format!("s{}.bin", archive_id));
        std::fs::create_dir_all(source_path.parent().unwrap()).unwrap();
        // archive 1's source never exists: its worker must fail
        if archive_id != 1 {
            std::fs::write(&source_path, vec![archive_id as u8; 64]).unwrap();
        }

        let files = vec![FileEntry::new(
            job_id.clone(),
            archive_id,
            RemotePath::local(&source_path),
            EntryPath::new(format!("s{}.bin", archive_id)).unwrap(),
            64,
        )];
        let output =
            RemotePath::local(staging.join(format!("bundle_{}.tar", archive_id)));
        let hash = RemotePath::local(staging.join(format!("bundle_{}.tar.sha1", archive_id)));
        archives.push(
            ArchiveJob::new(ArchiveJobConfig {
                job_id: job_id.clone(),
                archive_id,
                archive_type: ArchiveType::Tar,
                output_path: output,
                hash_path: hash,
                output_url: String::new(),
                hash_url: String::new(),
                files,
            })
            .unwrap(),
        );
    }

    let mut job = Job::new(
        job_id.clone(),
        "tester",
        ArchiveType::Tar,
        TargetSize::from_bytes(1024 * 1024),
        archives,
    )
    .unwrap();
    job.begin(chrono::Utc::now());
    stack.repo.persist_job(&job).await.unwrap();

    let tracker = Arc::new(JobTracker::new(job_id.clone(), stack.repo.clone()));
    let mut handles = Vec::new();
    for archive_id in 0..3u32 {
        let worker = ArchiveWorker::new(
            job_id.clone(),
            archive_id,
            "test-host".to_string(),
            HashAlgorithm::Sha1,
            stack.repo.clone(),
            stack.file_system.clone(),
            stack.hasher.clone(),
            tracker.clone(),
        );
        handles.push(tokio::spawn(worker.run()));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let job = stack.repo.get_job(&job_id).await.unwrap().unwrap();
    assert_invariants(&job);
    assert_eq!(job.state(), JobState::Complete);
    assert_eq!(job.num_archives_complete(), 3);
    assert_eq!(job.archives()[0].state(), JobState::Complete);
    assert_eq!(job.archives()[1].state(), JobState::Error);
    assert_eq!(job.archives()[2].state(), JobState::Complete);
    // only the successful archives contributed completed files
    assert_eq!(job.num_files_complete(), 2);
}

// S6: many archives completing in overlapping windows lose nothing.
#[tokio::test]
async fn test_concurrent_completions() {
    let stack = test_stack(0).await;
    // six ~0.6 MB files against a 1 MB target: one archive each
    let paths: Vec<String> = (0..6)
        .map(|i| write_input(&stack, &format!("c{}.bin", i), &vec![i as u8; 600 * KB]))
        .collect();

    let receipt = stack
        .bundle_service
        .submit(request(paths.into_iter().map(plain).collect(), "TAR"))
        .await
        .unwrap();

    let job = wait_for_terminal(&stack.repo, &receipt.job_id).await;
    assert_invariants(&job);
    assert_eq!(job.state(), JobState::Complete);
    assert_eq!(job.num_archives(), 6);
    assert_eq!(job.num_archives_complete(), 6);
    assert_eq!(job.num_files_complete(), 6);
    assert_eq!(job.total_size_complete(), 6 * 600 * KB as u64);
    assert!(job.end_time().is_some());
}

// S7: a long source filename is truncated to the cap with its extension
// preserved.
#[tokio::test]
async fn test_entry_path_length_cap() {
    let stack = test_stack(0).await;
    let long_name = format!("{}.bin", "x".repeat(133));
    let path = write_input(&stack, &long_name, b"payload");

    let receipt = stack
        .bundle_service
        .submit(request(vec![plain(path)], "TAR"))
        .await
        .unwrap();

    let job = wait_for_terminal(&stack.repo, &receipt.job_id).await;
    assert_invariants(&job);
    assert_eq!(job.state(), JobState::Complete);

    let entry = &job.archives()[0].files()[0];
    assert_eq!(entry.entry_path().len(), 100);
    assert!(entry.entry_path().as_str().ends_with(".bin"));
}

// The snapshot read side reflects the terminal job exactly.
#[tokio::test]
async fn test_snapshot_after_completion() {
    let stack = test_stack(40).await;
    let path = write_input(&stack, "snap.bin", &[9u8; 100]);

    let receipt = stack
        .bundle_service
        .submit(request(vec![plain(path)], "GZIP"))
        .await
        .unwrap();
    let job = wait_for_terminal(&stack.repo, &receipt.job_id).await;
    assert_eq!(job.state(), JobState::Complete);

    let snapshot = stack.snapshot_service.snapshot(&receipt.job_id).await.unwrap();
    assert_eq!(snapshot.state, JobState::Complete);
    assert_eq!(snapshot.threads, 1);
    assert_eq!(snapshot.threads_complete, 1);
    assert_eq!(snapshot.hashes_complete, 1);
    assert_eq!(snapshot.files_complete, 1);
    assert_eq!(snapshot.size_complete, 100);
    assert_eq!(snapshot.archives.len(), 1);
    assert!(snapshot.archives[0].output_url.ends_with(".tar.gz"));
    assert!(snapshot.archives[0].hash_url.ends_with(".tar.gz.sha1"));
    assert_eq!(snapshot.archives[0].host, "test-host");
}

// Determinism: identical submissions produce identical archive membership.
#[tokio::test]
async fn test_plan_determinism_across_submissions() {
    let stack = test_stack(30).await;
    let paths: Vec<String> = (0..8)
        .map(|i| write_input(&stack, &format!("d{}.bin", i), &vec![i as u8; (i + 1) * 100 * KB]))
        .collect();
    let files: Vec<RequestedFile> = paths.into_iter().map(plain).collect();

    let first = stack
        .bundle_service
        .submit(request(files.clone(), "ZIP"))
        .await
        .unwrap();
    let second = stack
        .bundle_service
        .submit(request(files, "ZIP"))
        .await
        .unwrap();

    let job_a = wait_for_terminal(&stack.repo, &first.job_id).await;
    let job_b = wait_for_terminal(&stack.repo, &second.job_id).await;

    assert_eq!(job_a.num_archives(), job_b.num_archives());
    for (a, b) in job_a.archives().iter().zip(job_b.archives().iter()) {
        let paths_a: Vec<_> = a.files().iter().map(|e| e.entry_path().as_str()).collect();
        let paths_b: Vec<_> = b.files().iter().map(|e| e.entry_path().as_str()).collect();
        assert_eq!(paths_a, paths_b);
    }
}
