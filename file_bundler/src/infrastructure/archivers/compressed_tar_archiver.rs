// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Compressed TAR Archiver
//!
//! The GZIP and BZIP2 variants: a two-pass engine that first streams the
//! elements into an intermediate `.tar` next to the final artifact, then
//! pipes that tar through the compressor into the final `.tar.gz` /
//! `.tar.bz2`, and finally deletes the intermediate. Entry-completion
//! callbacks fire during the tar pass, when each element's bytes are on
//! stable storage.

use std::io::{Read, Write};
use std::sync::Arc;

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;

use crate::infrastructure::archivers::TarArchiver;
use file_bundler_domain::services::archive_service::OnEntryComplete;
use file_bundler_domain::services::COPY_BUFFER_SIZE;
use file_bundler_domain::{
    ArchiveElement, ArchiveType, Archiver, BundlerError, FileSystem, RemotePath,
};

/// GZIP / BZIP2 over an intermediate tar.
pub struct CompressedTarArchiver {
    file_system: Arc<dyn FileSystem>,
    archive_type: ArchiveType,
}

impl CompressedTarArchiver {
    pub fn gzip(file_system: Arc<dyn FileSystem>) -> Self {
        CompressedTarArchiver {
            file_system,
            archive_type: ArchiveType::Gzip,
        }
    }

    pub fn bzip2(file_system: Arc<dyn FileSystem>) -> Self {
        CompressedTarArchiver {
            file_system,
            archive_type: ArchiveType::Bzip2,
        }
    }

    /// The intermediate tar path: the final artifact minus the compressor
    /// suffix (`bundle_0.tar.gz` → `bundle_0.tar`).
    fn intermediate_path(&self, output: &RemotePath) -> Result<RemotePath, BundlerError> {
        let suffix = match self.archive_type {
            ArchiveType::Gzip => ".gz",
            ArchiveType::Bzip2 => ".bz2",
            _ => {
                return Err(BundlerError::InternalError(format!(
                    "compressed tar archiver constructed for {}",
                    self.archive_type
                )))
            }
        };
        let path = output.path();
        let trimmed = path.strip_suffix(suffix).ok_or_else(|| {
            BundlerError::ArchiveError(format!(
                "output '{}' does not end with '{}'",
                output, suffix
            ))
        })?;
        RemotePath::parse(&format!("{}://{}", output.scheme(), trimmed))
    }

    fn compress(&self, intermediate: &RemotePath, output: &RemotePath) -> Result<(), BundlerError> {
        let mut reader = self.file_system.open(intermediate)?;
        let writer = self.file_system.create(output)?;

        // finish() writes the stream footer; relying on Drop would swallow
        // its errors.
        match self.archive_type {
            ArchiveType::Gzip => {
                let mut encoder = GzEncoder::new(writer, GzCompression::default());
                pipe(&mut reader, &mut encoder, intermediate, output)?;
                let mut inner = encoder.finish().map_err(|e| {
                    BundlerError::ArchiveError(format!("finishing {}: {}", output, e))
                })?;
                inner.flush().map_err(|e| {
                    BundlerError::ArchiveError(format!("flushing {}: {}", output, e))
                })?;
            }
            ArchiveType::Bzip2 => {
                let mut encoder = BzEncoder::new(writer, bzip2::Compression::best());
                pipe(&mut reader, &mut encoder, intermediate, output)?;
                let mut inner = encoder.finish().map_err(|e| {
                    BundlerError::ArchiveError(format!("finishing {}: {}", output, e))
                })?;
                inner.flush().map_err(|e| {
                    BundlerError::ArchiveError(format!("flushing {}: {}", output, e))
                })?;
            }
            _ => {
                return Err(BundlerError::InternalError(format!(
                    "compressed tar archiver constructed for {}",
                    self.archive_type
                )))
            }
        }
        Ok(())
    }
}

fn pipe(
    reader: &mut (dyn Read + Send),
    encoder: &mut impl Write,
    intermediate: &RemotePath,
    output: &RemotePath,
) -> Result<(), BundlerError> {
    let mut buffer = [0u8; COPY_BUFFER_SIZE];
    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| BundlerError::ArchiveError(format!("reading {}: {}", intermediate, e)))?;
        if n == 0 {
            return Ok(());
        }
        encoder.write_all(&buffer[..n]).map_err(|e| {
            BundlerError::ArchiveError(format!("compressing into {}: {}", output, e))
        })?;
    }
}

impl Archiver for CompressedTarArchiver {
    fn bundle(
        &self,
        elements: &[ArchiveElement],
        output: &RemotePath,
        on_entry: &mut OnEntryComplete<'_>,
    ) -> Result<(), BundlerError> {
        super::require_extension(output, self.archive_type)?;
        self.file_system.delete(output)?;

        let intermediate = self.intermediate_path(output)?;
        let tar = TarArchiver::new(self.file_system.clone());
        tar.bundle(elements, &intermediate, on_entry)?;

        let result = self.compress(&intermediate, output);
        // The intermediate is removed on success and on compressor failure.
        self.file_system.delete(&intermediate)?;
        result
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
            EntryPath::new(name).unwrap(),
            content.len() as u64,
        )
    }

    fn read_tar_names<R: Read>(reader: R) -> Vec<String> {
        let mut archive = tar::Archive::new(reader);
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_gzip_round_trip_and_intermediate_cleanup() {
        let dir = TempDir::new().unwrap();
        let elements = vec![
            element(&dir, "a.txt", b"alpha"),
            element(&dir, "b.txt", b"bravo"),
        ];
        let output = RemotePath::local(dir.path().join("out.tar.gz"));

        let mut seen = 0usize;
        CompressedTarArchiver::gzip(Arc::new(LocalFileSystem::new()))
            .bundle(&elements, &output, &mut |_| seen += 1)
            .unwrap();
        assert_eq!(seen, 2);

        // intermediate tar removed
        assert!(!dir.path().join("out.tar").exists());

        let file = std::fs::File::open(output.to_local_path()).unwrap();
        let names = read_tar_names(flate2::read::GzDecoder::new(file));
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_bzip2_round_trip() {
        let dir = TempDir::new().unwrap();
        let elements = vec![element(&dir, "only.txt", b"payload")];
        let output = RemotePath::local(dir.path().join("out.tar.bz2"));

        CompressedTarArchiver::bzip2(Arc::new(LocalFileSystem::new()))
            .bundle(&elements, &output, &mut |_| {})
            .unwrap();

        let file = std::fs::File::open(output.to_local_path()).unwrap();
        let names = read_tar_names(bzip2::read::BzDecoder::new(file));
        assert_eq!(names, vec!["only.txt"]);
    }

    #[test]
    fn test_intermediate_path_derivation() {
        let archiver = CompressedTarArchiver::gzip(Arc::new(LocalFileSystem::new()));
        let output = RemotePath::parse("file:///staging/j/bundle_3.tar.gz").unwrap();
        assert_eq!(
            archiver.intermediate_path(&output).unwrap().path(),
            "/staging/j/bundle_3.tar"
        );
    }
}
