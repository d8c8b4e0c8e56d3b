// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Processing State
//!
//! The shared state machine for jobs, archives, and file entries. One enum
//! covers all three levels because the levels share the lifecycle
//! `NOT_STARTED → IN_PROGRESS → {COMPLETE | ERROR}`; only jobs additionally
//! use `INVALID_REQUEST` (a rejected submission) and `NOT_AVAILABLE` (the
//! snapshot answer for an unknown job id).
//!
//! The screaming-snake text forms are part of the persistence and HTTP
//! contracts and must not be renamed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BundlerError;

/// Lifecycle state of a job, an archive, or a file entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    #[serde(rename = "NOT_STARTED")]
    NotStarted,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETE")]
    Complete,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "INVALID_REQUEST")]
    InvalidRequest,
    #[serde(rename = "NOT_AVAILABLE")]
    NotAvailable,
}

impl JobState {
    /// Canonical text form used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::NotStarted => "NOT_STARTED",
            JobState::InProgress => "IN_PROGRESS",
            JobState::Complete => "COMPLETE",
            JobState::Error => "ERROR",
            JobState::InvalidRequest => "INVALID_REQUEST",
            JobState::NotAvailable => "NOT_AVAILABLE",
        }
    }

    /// True for states from which no further transition happens.
    ///
    /// `INVALID_REQUEST` is terminal for a job; archives and file entries
    /// never carry it.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Complete | JobState::Error | JobState::InvalidRequest
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = BundlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_STARTED" => Ok(JobState::NotStarted),
            "IN_PROGRESS" => Ok(JobState::InProgress),
            "COMPLETE" => Ok(JobState::Complete),
            "ERROR" => Ok(JobState::Error),
            "INVALID_REQUEST" => Ok(JobState::InvalidRequest),
            "NOT_AVAILABLE" => Ok(JobState::NotAvailable),
            other => Err(BundlerError::ValidationError(format!(
                "unknown job state '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_forms_round_trip() {
        for state in [
            JobState::NotStarted,
            JobState::InProgress,
            JobState::Complete,
            JobState::Error,
            JobState::InvalidRequest,
            JobState::NotAvailable,
        ] {
            assert_eq!(state.as_str().parse::<JobState>().unwrap(), state);
        }
    }

    #[test]
    fn test_serde_uses_contract_names() {
        assert_eq!(
            serde_json::to_string(&JobState::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<JobState>("\"INVALID_REQUEST\"").unwrap(),
            JobState::InvalidRequest
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Complete.is_terminal());
        assert!(JobState::Error.is_terminal());
        assert!(JobState::InvalidRequest.is_terminal());
        assert!(!JobState::NotStarted.is_terminal());
        assert!(!JobState::InProgress.is_terminal());
    }
}
