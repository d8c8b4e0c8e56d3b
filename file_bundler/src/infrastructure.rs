// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Concrete implementations of the domain ports plus process-level plumbing:
//!
//! - `adapters` - filesystem providers (`file`, `s3`), the scheme registry,
//!   and the streaming hasher
//! - `archivers` - one streaming archive engine per archive type
//! - `config` - the deployment configuration surface
//! - `logging` - tracing subscriber installation
//! - `repositories` - SQLite persistence and schema management
//! - `services` - side features (request debug archival)

pub mod adapters;
pub mod archivers;
pub mod config;
pub mod logging;
pub mod repositories;
pub mod services;
