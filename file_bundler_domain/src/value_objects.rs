// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Value Objects
//!
//! Immutable, validated values of the bundler domain. Each type enforces its
//! invariant at construction so that entities never carry unchecked data:
//!
//! - [`JobId`] - 16 random bytes as 32 lowercase hex characters.
//! - [`JobState`] - the shared state machine for jobs, archives, and file
//!   entries, with the canonical text forms used in JSON and persistence.
//! - [`ArchiveType`] - the supported archive containers and their file
//!   extensions.
//! - [`HashAlgorithm`] - the digest algorithms and their hash-file extensions.
//! - [`RemotePath`] - a scheme-qualified file location (`file`, `s3`, ...).
//! - [`EntryPath`] - an in-archive path, at most 100 characters.
//! - [`TargetSize`] - the bin-packer's clamped soft size bound.

pub mod archive_type;
pub mod entry_path;
pub mod hash_algorithm;
pub mod job_id;
pub mod job_state;
pub mod remote_path;
pub mod target_size;

pub use archive_type::ArchiveType;
pub use entry_path::EntryPath;
pub use hash_algorithm::HashAlgorithm;
pub use job_id::JobId;
pub use job_state::JobState;
pub use remote_path::RemotePath;
pub use target_size::TargetSize;
