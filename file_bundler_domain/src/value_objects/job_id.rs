// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Identifier
//!
//! Typed identifier for bundle jobs. A job id is 16 bytes drawn from a
//! cryptographically secure random source, rendered as 32 lowercase hex
//! characters. The hex form is the canonical representation everywhere: the
//! database key, the staging directory name, and the `job_id` field of the
//! HTTP contract.
//!
//! ## Why a Newtype
//!
//! Job ids, archive ids, and user names all travel together through the
//! pipeline; a dedicated type prevents one string from standing in for
//! another and centralizes the format validation that the repository and the
//! staging layout both rely on.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BundlerError;

/// Unique identifier for a bundle job.
///
/// Always exactly [`JobId::LENGTH`] lowercase hex characters. Generated ids
/// come from the thread-local CSPRNG; parsed ids are validated so that a
/// malformed id can never reach the repository or the staging directory
/// layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Number of random bytes backing an id.
    pub const BYTES: usize = 16;

    /// Length of the canonical hex form.
    pub const LENGTH: usize = Self::BYTES * 2;

    /// Generates a new random job id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::BYTES];
        rand::rng().fill_bytes(&mut bytes);
        JobId(hex::encode(bytes))
    }

    /// Parses an id from its canonical hex form.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the input is not exactly 32 lowercase hex
    /// characters.
    pub fn parse(value: &str) -> Result<Self, BundlerError> {
        if value.len() != Self::LENGTH {
            return Err(BundlerError::ValidationError(format!(
                "job id must be {} hex characters, got {} ('{}')",
                Self::LENGTH,
                value.len(),
                value
            )));
        }
        if !value.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            return Err(BundlerError::ValidationError(format!(
                "job id must be lowercase hex: '{}'",
                value
            )));
        }
        Ok(JobId(value.to_string()))
    }

    /// Returns the canonical hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobId {
    type Err = BundlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
