// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # TAR Archiver
//!
//! Streams elements into a POSIX tar container via the `tar` crate. Also the
//! workhorse behind the compressed variants, which produce their
//! intermediate `.tar` through this type.

use std::io::Write;
use std::sync::Arc;

use file_bundler_domain::services::archive_service::OnEntryComplete;
use file_bundler_domain::{
    ArchiveElement, ArchiveType, Archiver, BundlerError, FileSystem, RemotePath,
};

/// TAR container archiver.
pub struct TarArchiver {
    file_system: Arc<dyn FileSystem>,
}

impl TarArchiver {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        TarArchiver { file_system }
    }
}

impl Archiver for TarArchiver {
    fn bundle(
        &self,
        elements: &[ArchiveElement],
        output: &RemotePath,
        on_entry: &mut OnEntryComplete<'_>,
    ) -> Result<(), BundlerError> {
        super::require_extension(output, ArchiveType::Tar)?;
        self.file_system.delete(output)?;

        let writer = self.file_system.create(output)?;
        let mut builder = tar::Builder::new(writer);
        let mtime = chrono::Utc::now().timestamp().max(0) as u64;

        for element in elements {
            let mut reader = self.file_system.open(&element.source)?;

            let mut header = tar::Header::new_gnu();
            header.set_size(element.size);
            header.set_mode(0o644);
            header.set_mtime(mtime);

            builder
                .append_data(&mut header, element.entry_path.as_str(), &mut reader)
                .map_err(|e| {
                    BundlerError::ArchiveError(format!(
                        "appending '{}' to {}: {}",
                        element.entry_path, output, e
                    ))
                })?;

            on_entry(element);
        }

        let mut inner = builder
            .into_inner()
            .map_err(|e| BundlerError::ArchiveError(format!("finishing {}: {}", output, e)))?;
        inner
            .flush()
            .map_err(|e| BundlerError::ArchiveError(format!("flushing {}: {}", output, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::LocalFileSystem;
    use file_bundler_domain::EntryPath;
    use std::io::Read;
    use tempfile::TempDir;

    fn element(dir: &TempDir, name: &str, content: &[u8]) -> ArchiveElement {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        ArchiveElement::new(
            RemotePath::local(path),
            EntryPath::new(format!("in/{}", name)).unwrap(),
            content.len() as u64,
        )
    }

    #[test]
    fn test_bundle_round_trips_through_tar_crate() {
        let dir = TempDir::new().unwrap();
        let elements = vec![
            element(&dir, "a.txt", b"alpha"),
            element(&dir, "b.txt", b"bravo!"),
        ];
        let output = RemotePath::local(dir.path().join("out.tar"));

        let mut seen = Vec::new();
        TarArchiver::new(Arc::new(LocalFileSystem::new()))
            .bundle(&elements, &output, &mut |e: &ArchiveElement| {
                seen.push(e.entry_path.as_str().to_string())
            })
            .unwrap();

        assert_eq!(seen, vec!["in/a.txt", "in/b.txt"]);

        let mut archive = tar::Archive::new(std::fs::File::open(output.to_local_path()).unwrap());
        let mut names = Vec::new();
        let mut contents = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            names.push(entry.path().unwrap().to_string_lossy().to_string());
            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            contents.push(body);
        }
        assert_eq!(names, vec!["in/a.txt", "in/b.txt"]);
        assert_eq!(contents, vec!["alpha", "bravo!"]);
    }

    #[test]
    fn test_bundle_replaces_existing_output() {
        let dir = TempDir::new().unwrap();
        let elements = vec![element(&dir, "a.txt", b"fresh")];
        let output_path = dir.path().join("out.tar");
        std::fs::write(&output_path, b"stale bytes that are not a tar").unwrap();
        let output = RemotePath::local(&output_path);

        TarArchiver::new(Arc::new(LocalFileSystem::new()))
            .bundle(&elements, &output, &mut |_| {})
            .unwrap();

        let mut archive = tar::Archive::new(std::fs::File::open(&output_path).unwrap());
        assert_eq!(archive.entries().unwrap().count(), 1);
    }

    #[test]
    fn test_missing_source_aborts_without_callback() {
        let dir = TempDir::new().unwrap();
        let missing = ArchiveElement::new(
            RemotePath::local(dir.path().join("missing.bin")),
            EntryPath::new("missing.bin").unwrap(),
            4,
        );
        let output = RemotePath::local(dir.path().join("out.tar"));

        let mut calls = 0usize;
        let result = TarArchiver::new(Arc::new(LocalFileSystem::new())).bundle(
            &[missing],
            &output,
            &mut |_| calls += 1,
        );

        assert!(result.is_err());
        assert_eq!(calls, 0);
    }
}
