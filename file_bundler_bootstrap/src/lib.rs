// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Module
//!
//! The bootstrap layer sits **outside** the enterprise application layers
//! (domain, application, infrastructure) and provides:
//!
//! - **Exit codes** - BSD sysexits mapping for scripting integration
//! - **Signal handling** - graceful shutdown on SIGTERM / SIGINT
//! - **Bootstrap logging** - minimal logging before the real subscriber is
//!   installed
//!
//! Bootstrap can reach every layer; no enterprise layer reaches back into
//! bootstrap. The `file_bundler` binary is the only consumer: it parses the
//! CLI, wires dependencies, runs the server under the shutdown coordinator,
//! and maps the final result through [`result_to_exit_code`].
//!
//! ## Module Structure
//!
//! - `exit_code` - Unix exit code enumeration and error mapping
//! - `shutdown` - shutdown coordination and cancellation tokens
//! - `logger` - bootstrap-specific logging abstraction

pub mod exit_code;
pub mod logger;
pub mod shutdown;

// Re-export commonly used types
pub use exit_code::{result_to_exit_code, ExitCode};
pub use logger::{BootstrapLogger, ConsoleLogger, NoOpLogger};
pub use shutdown::{CancellationToken, ShutdownCoordinator};
