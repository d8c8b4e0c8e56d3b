// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archive Format Tests
//!
//! End-to-end validity of every container the bundler produces: each type
//! is submitted through the real service, and the resulting artifact is
//! read back with an independent decoder (or checked structurally for the
//! hand-written formats). Hash files are verified against recomputed
//! digests.

mod common;

use std::io::Read;

use common::{test_stack, wait_for_terminal, write_input};
use file_bundler::application::services::{BundleRequest, RequestedFile};
use file_bundler_domain::{HashService as _, HashAlgorithm, JobState};

fn submit_request(paths: Vec<String>, archive_type: &str) -> BundleRequest {
    BundleRequest {
        files: paths
            .into_iter()
            .map(|path| RequestedFile {
                path,
                archive_path: Some("payload".to_string()),
            })
            .collect(),
        archive_type: Some(archive_type.to_string()),
        max_size_mb: Some(1),
        output_filename: Some("format".to_string()),
        user_name: Some("tester".to_string()),
    }
}

async fn bundle_two_files(archive_type: &str) -> (common::TestStack, std::path::PathBuf) {
    let stack = test_stack(40).await;
    let paths = vec![
        write_input(&stack, "one.txt", b"first payload"),
        write_input(&stack, "two.txt", b"second payload, longer"),
    ];

    let receipt = stack
        .bundle_service
        .submit(submit_request(paths, archive_type))
        .await
        .unwrap();
    let job = wait_for_terminal(&stack.repo, &receipt.job_id).await;
    assert_eq!(job.state(), JobState::Complete, "{} job failed", archive_type);

    let artifact = job.archives()[0].output_path().to_local_path();
    assert!(artifact.exists());
    (stack, artifact)
}

fn tar_entry_names<R: Read>(reader: R) -> Vec<String> {
    let mut archive = tar::Archive::new(reader);
    archive
        .entries()
        .unwrap()
        .map(|entry| entry.unwrap().path().unwrap().to_string_lossy().to_string())
        .collect()
}

#[tokio::test]
async fn test_zip_artifact_is_readable() {
    let (_stack, artifact) = bundle_two_files("ZIP").await;

    let mut archive = zip::ZipArchive::new(std::fs::File::open(&artifact).unwrap()).unwrap();
    assert_eq!(archive.len(), 2);

    let mut body = String::new();
    archive
        .by_name("payload/one.txt")
        .unwrap()
        .read_to_string(&mut body)
        .unwrap();
    assert_eq!(body, "first payload");
}

#[tokio::test]
async fn test_tar_artifact_is_readable() {
    let (_stack, artifact) = bundle_two_files("TAR").await;
    let names = tar_entry_names(std::fs::File::open(&artifact).unwrap());
    assert_eq!(names, vec!["payload/one.txt", "payload/two.txt"]);
}

#[tokio::test]
async fn test_gzip_artifact_is_readable() {
    let (_stack, artifact) = bundle_two_files("GZIP").await;
    assert!(artifact.to_string_lossy().ends_with(".tar.gz"));

    let decoder = flate2::read::GzDecoder::new(std::fs::File::open(&artifact).unwrap());
    let names = tar_entry_names(decoder);
    assert_eq!(names, vec!["payload/one.txt", "payload/two.txt"]);

    // the intermediate tar was cleaned up
    let intermediate = artifact.with_extension("");
    assert!(!intermediate.exists());
}

#[tokio::test]
async fn test_bzip2_artifact_is_readable() {
    let (_stack, artifact) = bundle_two_files("BZIP2").await;
    assert!(artifact.to_string_lossy().ends_with(".tar.bz2"));

    let decoder = bzip2::read::BzDecoder::new(std::fs::File::open(&artifact).unwrap());
    let names = tar_entry_names(decoder);
    assert_eq!(names, vec!["payload/one.txt", "payload/two.txt"]);
}

#[tokio::test]
async fn test_ar_artifact_structure() {
    let (_stack, artifact) = bundle_two_files("AR").await;

    let bytes = std::fs::read(&artifact).unwrap();
    assert!(bytes.starts_with(b"!<arch>\n"));
    // both member names travel BSD-style in front of their data
    let haystack = String::from_utf8_lossy(&bytes);
    assert!(haystack.contains("payload/one.txt"));
    assert!(haystack.contains("payload/two.txt"));
    assert!(haystack.contains("first payload"));
}

#[tokio::test]
async fn test_cpio_artifact_structure() {
    let (_stack, artifact) = bundle_two_files("CPIO").await;

    let bytes = std::fs::read(&artifact).unwrap();
    assert!(bytes.starts_with(b"070701"));
    let haystack = String::from_utf8_lossy(&bytes);
    assert!(haystack.contains("payload/one.txt"));
    assert!(haystack.contains("payload/two.txt"));
    assert!(haystack.contains("TRAILER!!!"));
}

// The hash file always matches an independently recomputed digest (the
// service default is SHA-1; the hasher itself is checked on every
// algorithm).
#[tokio::test]
async fn test_hash_files_match_recomputation() {
    let (stack, artifact) = bundle_two_files("ZIP").await;

    let written =
        std::fs::read_to_string(artifact.with_extension("zip.sha1")).unwrap();
    let recomputed = common::sha1_hex(&std::fs::read(&artifact).unwrap());
    assert_eq!(written, recomputed);

    // every supported algorithm produces a digest of the right shape
    let location = file_bundler_domain::RemotePath::local(&artifact);
    for algorithm in [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ] {
        let digest = stack.hasher.digest(&location, algorithm).unwrap();
        assert_eq!(digest.len(), algorithm.hex_len());
    }
}
