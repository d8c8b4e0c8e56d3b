// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Codes
//!
//! Unix exit codes following the BSD `sysexits.h` convention, restricted to
//! the codes the bundler binary can actually produce. Build systems and
//! service managers key off these values, so the mapping from error text to
//! code is conservative: anything unrecognized becomes the generic error
//! code rather than guessing a specific one.

use std::fmt;

/// Exit codes for the bundler binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful termination (0)
    Success = 0,

    /// General error (1)
    Error = 1,

    /// Command line usage error (64)
    UsageError = 64,

    /// Data format error (65)
    /// - Malformed configuration
    /// - Parse errors
    DataError = 65,

    /// Cannot open input (66)
    NoInput = 66,

    /// Service unavailable (69)
    /// - Database not reachable
    Unavailable = 69,

    /// Cannot create output file (73)
    CantCreate = 73,

    /// I/O error (74)
    IoError = 74,

    /// Permission denied (77)
    NoPerm = 77,

    /// Configuration error (78)
    Config = 78,

    /// Interrupted by signal (SIGINT - Ctrl+C) (130)
    Interrupted = 130,

    /// Terminated by signal (SIGTERM) (143)
    Terminated = 143,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create ExitCode from error type
    ///
    /// Maps common error text to appropriate exit codes:
    /// - Permission errors → NoPerm (77)
    /// - Not found errors → NoInput (66)
    /// - Configuration errors → Config (78)
    /// - Database errors → Unavailable (69)
    /// - I/O errors → IoError (74)
    /// - Parse errors → DataError (65)
    /// - Other errors → Error (1)
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let error_string = error.to_string().to_lowercase();

        if error_string.contains("permission") || error_string.contains("access denied") {
            ExitCode::NoPerm
        } else if error_string.contains("not found") || error_string.contains("no such") {
            ExitCode::NoInput
        } else if error_string.contains("configuration") || error_string.contains("config") {
            ExitCode::Config
        } else if error_string.contains("database") {
            ExitCode::Unavailable
        } else if error_string.contains("parse") || error_string.contains("format") {
            ExitCode::DataError
        } else if error_string.contains("io") || error_string.contains("read") || error_string.contains("write") {
            ExitCode::IoError
        } else {
            ExitCode::Error
        }
    }

    /// Get human-readable description of exit code
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::CantCreate => "Cannot create output file",
            ExitCode::IoError => "I/O error",
            ExitCode::NoPerm => "Permission denied",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    /// Check if this is a success exit code
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Check if this represents a signal interruption
    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

/// Maps an application result to a process exit code.
pub fn result_to_exit_code<E: std::error::Error>(result: Result<(), E>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => {
            tracing::error!("fatal: {}", error);
            ExitCode::from_error(&error).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestError(String);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl std::error::Error for TestError {}

    #[test]
    fn test_error_text_mapping() {
        let cases = [
            ("permission denied on staging", ExitCode::NoPerm),
            ("file not found: /tmp/x", ExitCode::NoInput),
            ("invalid configuration: staging missing", ExitCode::Config),
            ("database error: locked", ExitCode::Unavailable),
            ("something else entirely", ExitCode::Error),
        ];
        for (text, expected) in cases {
            assert_eq!(
                ExitCode::from_error(&TestError(text.to_string())),
                expected,
                "for '{}'",
                text
            );
        }
    }

    #[test]
    fn test_numeric_values_follow_sysexits() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::UsageError.as_i32(), 64);
        assert_eq!(ExitCode::Config.as_i32(), 78);
        assert_eq!(ExitCode::Terminated.as_i32(), 143);
    }

    #[test]
    fn test_signal_classification() {
        assert!(ExitCode::Interrupted.is_signal());
        assert!(ExitCode::Terminated.is_signal());
        assert!(!ExitCode::Error.is_signal());
    }
}
