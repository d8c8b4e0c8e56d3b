// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Setup
//!
//! Installs the process-wide tracing subscriber. Library code logs through
//! the `tracing` macros only; this is the single place a subscriber is
//! configured, called once from `main` before any service is constructed.
//!
//! The filter honors `RUST_LOG` and falls back to `info` for the bundler
//! crates. `LogFormat::Json` emits one JSON object per event for log
//! shippers; `LogFormat::Pretty` is the human default.

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{fmt, EnvFilter};

/// Output format for the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Installs the global tracing subscriber.
///
/// `verbose` lowers the default filter to `debug` for the bundler crates;
/// an explicit `RUST_LOG` always wins.
pub fn init_tracing(format: LogFormat, verbose: bool) -> Result<(), SetGlobalDefaultError> {
    let default_filter = if verbose {
        "info,file_bundler=debug,file_bundler_domain=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    match format {
        LogFormat::Pretty => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Json => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent_enough_for_tests() {
        // The second install fails (a global default already exists); both
        // outcomes are fine for callers that ignore the result.
        let first = init_tracing(LogFormat::Pretty, false);
        let second = init_tracing(LogFormat::Json, true);
        assert!(first.is_ok() || second.is_err());
    }
}
