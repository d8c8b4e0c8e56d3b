// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Compression Estimator
//!
//! Estimates the compressed size a file will occupy inside an archive of a
//! given type. The estimate exists only to feed the bin-packer; nothing else
//! may depend on it, and callers must not assume any particular estimation
//! strategy (a future implementation may key the ratio off file extension).

use crate::error::BundlerError;
use crate::value_objects::ArchiveType;

/// Port for compressed-size estimation during bin-packing.
pub trait CompressionEstimator: Send + Sync {
    /// Estimated bytes `size` will occupy inside an archive of `archive_type`.
    fn estimate(&self, size: u64, archive_type: ArchiveType) -> u64;
}

/// Flat-ratio estimator: a configured average compression percentage applied
/// to every file. Uncompressed container types pass the size through
/// unchanged.
#[derive(Debug, Clone, Copy)]
pub struct RatioEstimator {
    average_compression_percent: u8,
}

impl RatioEstimator {
    /// Creates an estimator from the configured average compression
    /// percentage.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for percentages above 100.
    pub fn new(average_compression_percent: u8) -> Result<Self, BundlerError> {
        if average_compression_percent > 100 {
            return Err(BundlerError::ConfigurationError(format!(
                "average compression percentage must be 0-100, got {}",
                average_compression_percent
            )));
        }
        Ok(RatioEstimator {
            average_compression_percent,
        })
    }
}

impl CompressionEstimator for RatioEstimator {
    fn estimate(&self, size: u64, archive_type: ArchiveType) -> u64 {
        if !archive_type.is_compressed() {
            return size;
        }
        // u128 keeps the multiplication exact for any file size.
        let remaining = (100 - self.average_compression_percent) as u128;
        ((size as u128 * remaining) / 100) as u64
    }
}
