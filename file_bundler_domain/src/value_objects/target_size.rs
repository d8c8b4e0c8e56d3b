// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Target Archive Size
//!
//! The bin-packer's soft upper bound on an archive's estimated content size.
//! Requests specify the bound in megabytes; the value is clamped into the
//! deployment's `[min, max]` window rather than rejected, because a caller
//! asking for a 1 MB or a 100 GB archive almost always means "small" or
//! "large", not "fail".
//!
//! The bound is *soft* in exactly one case: a single file whose estimated
//! size already exceeds the bound still forms its own archive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes per megabyte, the unit of the request and configuration surface.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Clamped target archive size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    bytes: u64,
}

impl TargetSize {
    /// Clamps a requested size in megabytes into `[min_mb, max_mb]` and
    /// converts to bytes.
    ///
    /// Returns the clamped size together with a flag telling the caller
    /// whether clamping occurred, so the submission path can log it.
    pub fn clamped_mb(requested_mb: u64, min_mb: u64, max_mb: u64) -> (Self, bool) {
        let clamped = requested_mb.clamp(min_mb, max_mb);
        (
            TargetSize {
                bytes: clamped * BYTES_PER_MB,
            },
            clamped != requested_mb,
        )
    }

    /// Constructs an exact byte bound (tests and internal callers).
    pub fn from_bytes(bytes: u64) -> Self {
        TargetSize { bytes }
    }

    /// The bound in bytes.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// The bound in whole megabytes.
    pub fn megabytes(&self) -> u64 {
        self.bytes / BYTES_PER_MB
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MB", self.megabytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_is_unchanged() {
        let (size, clamped) = TargetSize::clamped_mb(400, 100, 2048);
        assert_eq!(size.megabytes(), 400);
        assert_eq!(size.bytes(), 400 * BYTES_PER_MB);
        assert!(!clamped);
    }

    #[test]
    fn test_clamps_below_min() {
        let (size, clamped) = TargetSize::clamped_mb(1, 100, 2048);
        assert_eq!(size.megabytes(), 100);
        assert!(clamped);
    }

    #[test]
    fn test_clamps_above_max() {
        let (size, clamped) = TargetSize::clamped_mb(1_000_000, 100, 2048);
        assert_eq!(size.megabytes(), 2048);
        assert!(clamped);
    }
}
