// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Entry
//!
//! One source file inside one archive. Entries are created when the job is
//! persisted, flipped to `COMPLETE` by the per-entry completion callback as
//! the archiver finishes streaming them, and read back by the job tracker
//! when it recomputes job-level progress. The repository key is
//! `(job_id, archive_id, source)`.

use serde::{Deserialize, Serialize};

use crate::value_objects::{EntryPath, JobId, JobState, RemotePath};

/// One source file recorded inside one archive of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    // Identity fields (always first)
    job_id: JobId,
    archive_id: u32,
    source: RemotePath,

    // Core business fields
    entry_path: EntryPath,
    size: u64,
    state: JobState,
}

impl FileEntry {
    /// Creates a new entry in the `NOT_STARTED` state.
    pub fn new(
        job_id: JobId,
        archive_id: u32,
        source: RemotePath,
        entry_path: EntryPath,
        size: u64,
    ) -> Self {
        FileEntry {
            job_id,
            archive_id,
            source,
            entry_path,
            size,
            state: JobState::NotStarted,
        }
    }

    /// Restores an entry from persisted fields. Intended for repository
    /// implementations only.
    pub fn restore(
        job_id: JobId,
        archive_id: u32,
        source: RemotePath,
        entry_path: EntryPath,
        size: u64,
        state: JobState,
    ) -> Self {
        FileEntry {
            job_id,
            archive_id,
            source,
            entry_path,
            size,
            state,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn archive_id(&self) -> u32 {
        self.archive_id
    }

    pub fn source(&self) -> &RemotePath {
        &self.source
    }

    pub fn entry_path(&self) -> &EntryPath {
        &self.entry_path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == JobState::Complete
    }

    /// Transitions the entry to a new state.
    pub fn set_state(&mut self, state: JobState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> FileEntry {
        FileEntry::new(
            JobId::generate(),
            0,
            RemotePath::parse("file:///data/a.bin").unwrap(),
            EntryPath::new("data/a.bin").unwrap(),
            10,
        )
    }

    #[test]
    fn test_new_entry_starts_not_started() {
        let e = entry();
        assert_eq!(e.state(), JobState::NotStarted);
        assert!(!e.is_complete());
    }

    #[test]
    fn test_completion_transition() {
        let mut e = entry();
        e.set_state(JobState::Complete);
        assert!(e.is_complete());
    }
}
