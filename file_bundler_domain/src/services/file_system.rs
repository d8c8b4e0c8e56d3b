// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filesystem Port
//!
//! The path/URI adapter contract. Everything that touches bytes - source
//! expansion, archive streaming, hashing, artifact sizing - goes through this
//! port, which is what makes the scheme set pluggable: the infrastructure
//! layer provides one implementation per scheme plus a registry that
//! dispatches on [`RemotePath::scheme`] and itself implements the trait, so
//! callers never know which provider serves them.
//!
//! ## Why Synchronous
//!
//! Archive containers are written by synchronous encoders, and the workers
//! that drive them run on blocking threads. A sync port means providers hand
//! back plain `Read`/`Write` streams that the archivers can copy through
//! without an async bridge in the hot loop. Providers backed by async SDKs
//! (the `s3` provider) do their own bridging internally and document that
//! they must be called from a blocking context.
//!
//! ## Failure Taxonomy
//!
//! Implementations surface failures as `NotFound`, `PermissionDenied`,
//! `TransientIo`, or `SchemeUnsupported` - the worker error policy depends
//! on this mapping, not on provider-specific messages.

use std::io::{Read, Seek, Write};

use crate::error::BundlerError;
use crate::value_objects::RemotePath;

/// Combined write + seek stream, needed by containers with a trailing
/// central directory (ZIP rewrites entry headers on finish).
pub trait WriteSeek: Write + Seek {}

impl<T: Write + Seek> WriteSeek for T {}

/// Pluggable filesystem provider contract.
///
/// A provider serves every location of the scheme it was registered under.
/// All streams are owned: dropping them releases the underlying resource on
/// every exit path.
pub trait FileSystem: Send + Sync {
    /// Opens a location for reading.
    fn open(&self, path: &RemotePath) -> Result<Box<dyn Read + Send>, BundlerError>;

    /// Opens a location for writing, truncating any existing content.
    /// Parent directories are created as needed.
    fn create(&self, path: &RemotePath) -> Result<Box<dyn Write + Send>, BundlerError>;

    /// Opens a location for seekable writing. Providers that cannot seek
    /// (object stores) return `SchemeUnsupported`; only archive containers
    /// that rewrite their own headers need this.
    fn create_seekable(&self, path: &RemotePath) -> Result<Box<dyn WriteSeek + Send>, BundlerError>;

    /// Size of the object in bytes.
    fn size(&self, path: &RemotePath) -> Result<u64, BundlerError>;

    /// Whether the location exists.
    fn exists(&self, path: &RemotePath) -> Result<bool, BundlerError>;

    /// Removes the object. Removing a missing object is not an error.
    fn delete(&self, path: &RemotePath) -> Result<(), BundlerError>;

    /// Walks a location depth-first and returns the files below it. A plain
    /// file walks to itself.
    fn walk(&self, path: &RemotePath) -> Result<Vec<RemotePath>, BundlerError>;

    /// Creates a directory and its ancestors. A no-op for flat-namespace
    /// providers.
    fn create_dir_all(&self, path: &RemotePath) -> Result<(), BundlerError>;
}
