// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Bundler Domain
//!
//! The domain layer of the file bundler: the business logic of packaging an
//! arbitrary set of input files, drawn from pluggable filesystems, into one
//! or more bounded-size archive artifacts with sibling digest files, while a
//! durable job tracker exposes progress.
//!
//! ## What Lives Here
//!
//! - **Entities** - the `Job → ArchiveJob → FileEntry` owning tree with its
//!   aggregate invariants and state machines.
//! - **Value objects** - validated ids, states, archive and hash types,
//!   scheme-qualified paths, in-archive entry paths, clamped target sizes.
//! - **Domain services** - the bin-packer, the entry-path normalizer, the
//!   compression estimator, and the ports (filesystem, archiver, hasher)
//!   infrastructure implements.
//! - **Repository port** - the persistence contract any backing store can
//!   satisfy.
//!
//! ## What Does Not Live Here
//!
//! Workers, the job tracker, HTTP, SQLite, and the concrete archive and
//! filesystem engines live in the application and infrastructure layers of
//! the `file-bundler` crate. The domain has no tokio, no tracing, and no
//! database - it can be exercised entirely with plain unit tests.
//!
//! ## Concurrency Contract
//!
//! Domain types are not synchronized. The application layer guarantees that
//! a job's aggregate recomputation runs serialized per job (the tracker's
//! notification sink), and that entities cross thread boundaries only by
//! value or behind the repository.

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Re-export commonly used types for convenient access
// These exports provide a clean API surface for consumers of the domain layer
pub use entities::{ArchiveJob, FileEntry, Job, ProgressRecompute};
pub use error::BundlerError;
pub use repositories::JobRepository;
pub use services::{ArchiveElement, Archiver, FileSystem, HashService};
pub use value_objects::{
    ArchiveType, EntryPath, HashAlgorithm, JobId, JobState, RemotePath, TargetSize,
};
