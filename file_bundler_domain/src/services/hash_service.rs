// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Hash Service Port
//!
//! Digest computation over completed archive artifacts. Implementations
//! stream in a single pass - an archive can be far larger than memory - and
//! render digests as lowercase hex. `digest_to_file` writes the hex string
//! as one UTF-8 line to the sibling hash file.

use crate::error::BundlerError;
use crate::value_objects::{HashAlgorithm, RemotePath};

/// Streaming digest port.
pub trait HashService: Send + Sync {
    /// Computes the lowercase-hex digest of `input`.
    fn digest(&self, input: &RemotePath, algorithm: HashAlgorithm) -> Result<String, BundlerError>;

    /// Computes the digest of `input` and writes it to `output` as a single
    /// UTF-8 line. Returns the digest.
    fn digest_to_file(
        &self,
        input: &RemotePath,
        output: &RemotePath,
        algorithm: HashAlgorithm,
    ) -> Result<String, BundlerError>;
}
