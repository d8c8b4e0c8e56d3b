// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Local Filesystem Provider
//!
//! The `file` scheme provider over `std::fs`. Streams are buffered; `walk`
//! uses a depth-first traversal with a stable name order so that directory
//! expansion - and therefore bin-packing - is deterministic across runs.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};

use walkdir::WalkDir;

use file_bundler_domain::services::file_system::{FileSystem, WriteSeek};
use file_bundler_domain::{BundlerError, RemotePath};

/// `file` scheme provider.
#[derive(Debug, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        LocalFileSystem
    }

    fn require_local(path: &RemotePath) -> Result<std::path::PathBuf, BundlerError> {
        if !path.is_local() {
            return Err(BundlerError::SchemeUnsupported(format!(
                "local provider cannot serve '{}'",
                path
            )));
        }
        Ok(path.to_local_path())
    }
}

fn io_error(path: &RemotePath, err: std::io::Error) -> BundlerError {
    match err.kind() {
        std::io::ErrorKind::NotFound => BundlerError::NotFound(format!("{}: {}", path, err)),
        std::io::ErrorKind::PermissionDenied => {
            BundlerError::PermissionDenied(format!("{}: {}", path, err))
        }
        _ => BundlerError::TransientIo(format!("{}: {}", path, err)),
    }
}

impl FileSystem for LocalFileSystem {
    fn open(&self, path: &RemotePath) -> Result<Box<dyn Read + Send>, BundlerError> {
        let local = Self::require_local(path)?;
        let file = File::open(&local).map_err(|e| io_error(path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn create(&self, path: &RemotePath) -> Result<Box<dyn Write + Send>, BundlerError> {
        let local = Self::require_local(path)?;
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
        }
        let file = File::create(&local).map_err(|e| io_error(path, e))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn create_seekable(&self, path: &RemotePath) -> Result<Box<dyn WriteSeek + Send>, BundlerError> {
        let local = Self::require_local(path)?;
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
        }
        let file = File::create(&local).map_err(|e| io_error(path, e))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn size(&self, path: &RemotePath) -> Result<u64, BundlerError> {
        let local = Self::require_local(path)?;
        let metadata = fs::metadata(&local).map_err(|e| io_error(path, e))?;
        Ok(metadata.len())
    }

    fn exists(&self, path: &RemotePath) -> Result<bool, BundlerError> {
        let local = Self::require_local(path)?;
        match fs::metadata(&local) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(path, e)),
        }
    }

    fn delete(&self, path: &RemotePath) -> Result<(), BundlerError> {
        let local = Self::require_local(path)?;
        match fs::remove_file(&local) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(path, e)),
        }
    }

    fn walk(&self, path: &RemotePath) -> Result<Vec<RemotePath>, BundlerError> {
        let local = Self::require_local(path)?;
        let metadata = fs::metadata(&local).map_err(|e| io_error(path, e))?;
        if metadata.is_file() {
            return Ok(vec![path.clone()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&local).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                BundlerError::TransientIo(format!("walking {}: {}", path, e))
            })?;
            if entry.file_type().is_file() {
                files.push(RemotePath::local(entry.path()));
            }
        }
        Ok(files)
    }

    fn create_dir_all(&self, path: &RemotePath) -> Result<(), BundlerError> {
        let local = Self::require_local(path)?;
        fs::create_dir_all(&local).map_err(|e| io_error(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, rel: &str, content: &[u8]) -> RemotePath {
        let full = dir.path().join(rel);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, content).unwrap();
        RemotePath::local(full)
    }

    #[test]
    fn test_open_and_size() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.bin", b"hello");

        assert_eq!(LocalFileSystem::new().size(&path).unwrap(), 5);

        let mut content = Vec::new();
        LocalFileSystem::new()
            .open(&path)
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"hello");
    }

    #[test]
    fn test_open_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = RemotePath::local(dir.path().join("missing.bin"));
        let err = match LocalFileSystem::new().open(&path) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, BundlerError::NotFound(_)));
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = RemotePath::local(dir.path().join("deep/nested/out.bin"));

        let mut writer = LocalFileSystem::new().create(&path).unwrap();
        writer.write_all(b"data").unwrap();
        writer.flush().unwrap();
        drop(writer);

        assert_eq!(LocalFileSystem::new().size(&path).unwrap(), 4);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "victim.bin", b"x");

        let fs_provider = LocalFileSystem::new();
        fs_provider.delete(&path).unwrap();
        assert!(!fs_provider.exists(&path).unwrap());
        fs_provider.delete(&path).unwrap(); // second delete is a no-op
    }

    #[test]
    fn test_walk_returns_files_in_stable_order() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "b/two.bin", b"2");
        write_file(&dir, "a/one.bin", b"1");
        write_file(&dir, "top.bin", b"t");

        let root = RemotePath::local(dir.path());
        let first = LocalFileSystem::new().walk(&root).unwrap();
        let second = LocalFileSystem::new().walk(&root).unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert!(first.iter().all(|p| p.path().ends_with(".bin")));
    }

    #[test]
    fn test_walk_of_file_is_identity() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "solo.bin", b"s");
        let walked = LocalFileSystem::new().walk(&path).unwrap();
        assert_eq!(walked, vec![path]);
    }

    #[test]
    fn test_rejects_foreign_scheme() {
        let s3 = RemotePath::parse("s3://bucket/key").unwrap();
        let err = match LocalFileSystem::new().open(&s3) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, BundlerError::SchemeUnsupported(_)));
    }
}
