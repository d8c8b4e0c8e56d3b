// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain error system for the file bundler.
//!
//! See [`bundler_error::BundlerError`] for the error taxonomy and the
//! propagation policy between workers, observers, and the HTTP edge.

pub mod bundler_error;

pub use bundler_error::BundlerError;
