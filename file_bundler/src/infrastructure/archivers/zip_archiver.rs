// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ZIP Archiver
//!
//! Streams elements into a deflate-compressed ZIP via the `zip` crate. ZIP
//! rewrites local headers when an entry closes, so this is the one archiver
//! that needs the seekable write stream - which in turn pins ZIP outputs to
//! the local staging area.

use std::io::Write;
use std::sync::Arc;

use zip::write::FileOptions;
use zip::CompressionMethod;

use file_bundler_domain::services::archive_service::OnEntryComplete;
use file_bundler_domain::{
    ArchiveElement, ArchiveType, Archiver, BundlerError, FileSystem, RemotePath,
};

/// ZIP container archiver.
pub struct ZipArchiver {
    file_system: Arc<dyn FileSystem>,
}

impl ZipArchiver {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        ZipArchiver { file_system }
    }
}

impl Archiver for ZipArchiver {
    fn bundle(
        &self,
        elements: &[ArchiveElement],
        output: &RemotePath,
        on_entry: &mut OnEntryComplete<'_>,
    ) -> Result<(), BundlerError> {
        super::require_extension(output, ArchiveType::Zip)?;
        self.file_system.delete(output)?;

        let writer = self.file_system.create_seekable(output)?;
        let mut zip = zip::ZipWriter::new(writer);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644)
            .large_file(true);

        for element in elements {
            let mut reader = self.file_system.open(&element.source)?;

            zip.start_file(element.entry_path.as_str(), options).map_err(|e| {
                BundlerError::ArchiveError(format!(
                    "starting entry '{}' in {}: {}",
                    element.entry_path, output, e
                ))
            })?;
            std::io::copy(&mut reader, &mut zip).map_err(|e| {
                BundlerError::ArchiveError(format!(
                    "streaming '{}' into {}: {}",
                    element.entry_path, output, e
                ))
            })?;

            on_entry(element);
        }

        let mut inner = zip
            .finish()
            .map_err(|e| BundlerError::ArchiveError(format!("finishing {}: {}", output, e)))?;
        inner
            .flush()
            .map_err(|e| BundlerError::ArchiveError(format!("flushing {}: {}", output, e)))?;
        Ok(())
    }
}
