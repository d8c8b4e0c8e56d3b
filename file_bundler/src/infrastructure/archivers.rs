// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archive Engines
//!
//! One streaming [`Archiver`] implementation per [`ArchiveType`], all built
//! on the filesystem port:
//!
//! - [`tar_archiver::TarArchiver`] - TAR via the `tar` crate
//! - [`zip_archiver::ZipArchiver`] - ZIP (deflate) via the `zip` crate
//! - [`ar_archiver::ArArchiver`] - Unix `ar`, written at byte level
//! - [`cpio_archiver::CpioArchiver`] - CPIO `newc`, written at byte level
//! - [`compressed_tar_archiver::CompressedTarArchiver`] - GZIP / BZIP2 over
//!   an intermediate tar
//!
//! [`archiver_for`] is the single construction point the worker uses; the
//! `Archiver` trait object it returns is the one piece of dynamic dispatch
//! in the streaming path.

pub mod ar_archiver;
pub mod compressed_tar_archiver;
pub mod cpio_archiver;
pub mod tar_archiver;
pub mod zip_archiver;

pub use ar_archiver::ArArchiver;
pub use compressed_tar_archiver::CompressedTarArchiver;
pub use cpio_archiver::CpioArchiver;
pub use tar_archiver::TarArchiver;
pub use zip_archiver::ZipArchiver;

use std::sync::Arc;

use file_bundler_domain::{ArchiveType, Archiver, BundlerError, FileSystem, RemotePath};

/// Constructs the archiver for an archive type.
pub fn archiver_for(
    archive_type: ArchiveType,
    file_system: Arc<dyn FileSystem>,
) -> Box<dyn Archiver> {
    match archive_type {
        ArchiveType::Zip => Box::new(ZipArchiver::new(file_system)),
        ArchiveType::Tar => Box::new(TarArchiver::new(file_system)),
        ArchiveType::Ar => Box::new(ArArchiver::new(file_system)),
        ArchiveType::Cpio => Box::new(CpioArchiver::new(file_system)),
        ArchiveType::Gzip => Box::new(CompressedTarArchiver::gzip(file_system)),
        ArchiveType::Bzip2 => Box::new(CompressedTarArchiver::bzip2(file_system)),
    }
}

/// Verifies the output carries the extension of its variant. The name
/// generator always produces conforming paths, so a mismatch is a wiring
/// fault, surfaced before any bytes are written.
pub(crate) fn require_extension(
    output: &RemotePath,
    archive_type: ArchiveType,
) -> Result<(), BundlerError> {
    let suffix = format!(".{}", archive_type.extension());
    if output.path().ends_with(&suffix) {
        Ok(())
    } else {
        Err(BundlerError::ArchiveError(format!(
            "output '{}' does not carry the {} extension '{}'",
            output,
            archive_type,
            suffix
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_extension() {
        let good = RemotePath::parse("file:///staging/bundle_0.tar.gz").unwrap();
        require_extension(&good, ArchiveType::Gzip).unwrap();

        let bad = RemotePath::parse("file:///staging/bundle_0.tgz").unwrap();
        assert!(require_extension(&bad, ArchiveType::Gzip).is_err());
    }
}
