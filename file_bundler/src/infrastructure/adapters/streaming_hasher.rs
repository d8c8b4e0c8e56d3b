// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Streaming Hasher
//!
//! The digest engine behind the [`HashService`] port: one pass over the
//! artifact through the filesystem port with an 8 KiB buffer, so archives of
//! any size hash in constant memory. Digests render as lowercase hex;
//! `digest_to_file` writes the hex string as a single UTF-8 line with no
//! trailing newline.

use std::io::{Read, Write};
use std::sync::Arc;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use file_bundler_domain::services::COPY_BUFFER_SIZE;
use file_bundler_domain::{BundlerError, FileSystem, HashAlgorithm, HashService, RemotePath};

/// Streaming digest engine over the filesystem port.
pub struct StreamingHasher {
    file_system: Arc<dyn FileSystem>,
}

impl StreamingHasher {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        StreamingHasher { file_system }
    }
}

fn digest_stream<D: Digest>(mut reader: Box<dyn Read + Send>) -> Result<String, BundlerError> {
    let mut hasher = D::new();
    let mut buffer = [0u8; COPY_BUFFER_SIZE];
    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| BundlerError::HashError(format!("reading artifact: {}", e)))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

impl HashService for StreamingHasher {
    fn digest(&self, input: &RemotePath, algorithm: HashAlgorithm) -> Result<String, BundlerError> {
        let reader = self
            .file_system
            .open(input)
            .map_err(|e| BundlerError::HashError(format!("opening {}: {}", input, e)))?;

        match algorithm {
            HashAlgorithm::Md5 => digest_stream::<Md5>(reader),
            HashAlgorithm::Sha1 => digest_stream::<Sha1>(reader),
            HashAlgorithm::Sha256 => digest_stream::<Sha256>(reader),
            HashAlgorithm::Sha384 => digest_stream::<Sha384>(reader),
            HashAlgorithm::Sha512 => digest_stream::<Sha512>(reader),
        }
    }

    fn digest_to_file(
        &self,
        input: &RemotePath,
        output: &RemotePath,
        algorithm: HashAlgorithm,
    ) -> Result<String, BundlerError> {
        let digest = self.digest(input, algorithm)?;

        let mut writer = self
            .file_system
            .create(output)
            .map_err(|e| BundlerError::HashError(format!("creating {}: {}", output, e)))?;
        writer
            .write_all(digest.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| BundlerError::HashError(format!("writing {}: {}", output, e)))?;

        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::LocalFileSystem;
    use tempfile::TempDir;

    fn hasher() -> StreamingHasher {
        StreamingHasher::new(Arc::new(LocalFileSystem::new()))
    }

    fn fixture(dir: &TempDir, content: &[u8]) -> RemotePath {
        let path = dir.path().join("artifact.bin");
        std::fs::write(&path, content).unwrap();
        RemotePath::local(path)
    }

    #[test]
    fn test_known_digests() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, b"abc");

        // Reference vectors for "abc".
        assert_eq!(
            hasher().digest(&path, HashAlgorithm::Md5).unwrap(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(
            hasher().digest(&path, HashAlgorithm::Sha1).unwrap(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            hasher().digest(&path, HashAlgorithm::Sha256).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_lengths() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, b"content");

        for algorithm in [
            HashAlgorithm::Md5,
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            let digest = hasher().digest(&path, algorithm).unwrap();
            assert_eq!(digest.len(), algorithm.hex_len(), "{}", algorithm);
            assert!(digest.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_digest_to_file_writes_single_line() {
        let dir = TempDir::new().unwrap();
        let input = fixture(&dir, b"hash me");
        let output = RemotePath::local(dir.path().join("artifact.bin.sha1"));

        let digest = hasher()
            .digest_to_file(&input, &output, HashAlgorithm::Sha1)
            .unwrap();

        let written = std::fs::read_to_string(output.to_local_path()).unwrap();
        assert_eq!(written, digest);
        assert!(!written.contains('\n'));
    }

    #[test]
    fn test_missing_input_is_hash_error() {
        let dir = TempDir::new().unwrap();
        let missing = RemotePath::local(dir.path().join("missing.bin"));
        let err = hasher().digest(&missing, HashAlgorithm::Sha1).unwrap_err();
        assert!(matches!(err, BundlerError::HashError(_)));
    }
}
