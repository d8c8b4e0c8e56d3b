// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Adapters
//!
//! Concrete implementations of the domain's streaming ports:
//!
//! - [`local_file_system::LocalFileSystem`] - `file` scheme over `std::fs`
//! - [`s3_file_system::S3FileSystem`] - `s3` scheme over `object_store`,
//!   bridged to the sync port
//! - [`scheme_registry::SchemeRegistry`] - scheme dispatch, itself a
//!   [`FileSystem`](file_bundler_domain::FileSystem)
//! - [`streaming_hasher::StreamingHasher`] - the digest engine

pub mod local_file_system;
pub mod s3_file_system;
pub mod scheme_registry;
pub mod streaming_hasher;

pub use local_file_system::LocalFileSystem;
pub use s3_file_system::S3FileSystem;
pub use scheme_registry::SchemeRegistry;
pub use streaming_hasher::StreamingHasher;
