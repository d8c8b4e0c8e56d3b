// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archiver Port
//!
//! The shared contract of the archiver family. One implementation exists per
//! [`ArchiveType`](crate::value_objects::ArchiveType); the single point of
//! dynamic dispatch in the streaming path is the `Archiver` trait object the
//! worker selects for its archive's type.
//!
//! `bundle` deletes a pre-existing output, writes every element in input
//! order, and invokes the entry callback after each element is fully
//! streamed. Completion notification is an explicit function value - there
//! is no listener registry to guard.

use crate::error::BundlerError;
use crate::value_objects::{EntryPath, RemotePath};

/// Streaming copy buffer size shared by archivers and the hasher.
pub const COPY_BUFFER_SIZE: usize = 8 * 1024;

/// The unit an archiver consumes: one source file and the entry path and
/// size it is recorded under. Transient; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveElement {
    pub source: RemotePath,
    pub entry_path: EntryPath,
    pub size: u64,
}

impl ArchiveElement {
    pub fn new(source: RemotePath, entry_path: EntryPath, size: u64) -> Self {
        ArchiveElement {
            source,
            entry_path,
            size,
        }
    }
}

/// Per-entry completion callback. Invoked once per element, after the
/// element's bytes are fully written to the container.
pub type OnEntryComplete<'a> = dyn FnMut(&ArchiveElement) + Send + 'a;

/// Streaming archiver contract.
///
/// An error aborts the current archive; the caller owns the consequences
/// (marking the archive `ERROR` and notifying the tracker). Implementations
/// release the output stream on every exit path.
pub trait Archiver: Send + Sync {
    /// Streams `elements` into a new archive at `output`, in order, deleting
    /// any existing artifact first and enforcing the type's extension.
    fn bundle(
        &self,
        elements: &[ArchiveElement],
        output: &RemotePath,
        on_entry: &mut OnEntryComplete<'_>,
    ) -> Result<(), BundlerError>;
}
