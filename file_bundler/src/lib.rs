// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Bundler
//!
//! Implementation crate of the file bundler: application services
//! (submission, workers, tracker, snapshots), infrastructure (filesystem
//! providers, archive engines, hashing, SQLite persistence, configuration,
//! logging), and the HTTP presentation surface.
//!
//! ## Layering
//!
//! ```text
//! presentation  → application → domain ← infrastructure
//! ```
//!
//! The application layer depends on domain ports only; `main` wires the
//! infrastructure implementations in at startup. The presentation layer is a
//! thin translation from HTTP to application calls and owns no business
//! logic.

pub mod application;
pub mod infrastructure;
pub mod presentation;
