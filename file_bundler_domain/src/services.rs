// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Services
//!
//! Stateless domain logic and the ports infrastructure implements.
//!
//! Domain services are synchronous. Archive streaming, hashing, and
//! filesystem access run on blocking worker threads; async execution is an
//! infrastructure concern, and the application layer bridges the two with
//! `spawn_blocking`. The one async port is the repository
//! (see [`crate::repositories`]), which fronts genuinely async database I/O.
//!
//! - [`file_system::FileSystem`] - the path/URI port (`file`, `s3`, ...).
//! - [`size_estimator::CompressionEstimator`] - estimated compressed sizes
//!   for bin-packing.
//! - [`entry_path_normalizer::EntryPathNormalizer`] - source path to
//!   in-archive path.
//! - [`archive_planner::ArchivePlanner`] - first-fit grouping of files into
//!   bounded archives.
//! - [`archive_service::Archiver`] - the per-container streaming port.
//! - [`hash_service::HashService`] - the digest port.

pub mod archive_planner;
pub mod archive_service;
pub mod entry_path_normalizer;
pub mod file_system;
pub mod hash_service;
pub mod size_estimator;

pub use archive_planner::{ArchivePlanner, PlannedArchive};
pub use archive_service::{ArchiveElement, Archiver, COPY_BUFFER_SIZE};
pub use entry_path_normalizer::{EntryPathNormalizer, MAX_NUM_EXCLUSIONS};
pub use file_system::{FileSystem, WriteSeek};
pub use hash_service::HashService;
pub use size_estimator::{CompressionEstimator, RatioEstimator};
