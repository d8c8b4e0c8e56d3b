// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archive Type
//!
//! The supported archive containers. The type determines three things
//! downstream: which archiver implementation streams the entries, whether a
//! separate compression pass runs after the container is written (GZIP and
//! BZIP2 wrap an intermediate tar), and which file extension the output
//! artifact is forced to carry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BundlerError;

/// Output container for a bundle job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveType {
    #[serde(rename = "ZIP")]
    Zip,
    #[serde(rename = "TAR")]
    Tar,
    #[serde(rename = "AR")]
    Ar,
    #[serde(rename = "CPIO")]
    Cpio,
    #[serde(rename = "GZIP")]
    Gzip,
    #[serde(rename = "BZIP2")]
    Bzip2,
}

impl ArchiveType {
    /// Canonical text form used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveType::Zip => "ZIP",
            ArchiveType::Tar => "TAR",
            ArchiveType::Ar => "AR",
            ArchiveType::Cpio => "CPIO",
            ArchiveType::Gzip => "GZIP",
            ArchiveType::Bzip2 => "BZIP2",
        }
    }

    /// Extension enforced on the final output artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveType::Zip => "zip",
            ArchiveType::Tar => "tar",
            ArchiveType::Ar => "ar",
            ArchiveType::Cpio => "cpio",
            ArchiveType::Gzip => "tar.gz",
            ArchiveType::Bzip2 => "tar.bz2",
        }
    }

    /// True when entries end up compressed in the final artifact.
    ///
    /// The estimator only discounts sizes for these types; TAR, AR, and CPIO
    /// store entries verbatim.
    pub fn is_compressed(&self) -> bool {
        matches!(self, ArchiveType::Zip | ArchiveType::Gzip | ArchiveType::Bzip2)
    }

    /// True when the variant is produced by compressing an intermediate tar.
    pub fn uses_compression_pass(&self) -> bool {
        matches!(self, ArchiveType::Gzip | ArchiveType::Bzip2)
    }

    /// All supported types, in contract order.
    pub fn all() -> [ArchiveType; 6] {
        [
            ArchiveType::Zip,
            ArchiveType::Tar,
            ArchiveType::Ar,
            ArchiveType::Cpio,
            ArchiveType::Gzip,
            ArchiveType::Bzip2,
        ]
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveType {
    type Err = BundlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ZIP" => Ok(ArchiveType::Zip),
            "TAR" => Ok(ArchiveType::Tar),
            "AR" => Ok(ArchiveType::Ar),
            "CPIO" => Ok(ArchiveType::Cpio),
            "GZIP" => Ok(ArchiveType::Gzip),
            "BZIP2" => Ok(ArchiveType::Bzip2),
            other => Err(BundlerError::InvalidRequest(format!(
                "unknown archive type '{}'",
                other
            ))),
        }
    }
}
