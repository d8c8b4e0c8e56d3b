// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration Service
//!
//! The deployment configuration surface of the bundler, loaded once at
//! startup from a TOML file and treated as immutable thereafter. Every
//! section has working defaults so a missing file yields a usable local
//! setup; validation is eager so a bad deployment fails at boot, not on the
//! first job.
//!
//! ```toml
//! [staging]
//! directory = "/var/tmp/bundler/staging"
//! base_url = "http://localhost:8080/data"
//!
//! [archive]
//! min_size_mb = 100
//! max_size_mb = 2048
//! default_size_mb = 400
//! average_compression_percentage = 40
//! hash_algorithm = "SHA1"
//!
//! [entry_paths]
//! exclusions = ["/mnt/raid"]
//!
//! [s3]
//! endpoint = ""
//! iam_role = ""
//! access_key = ""
//! secret_key = ""
//!
//! [server]
//! bind = "127.0.0.1"
//! port = 8080
//!
//! [database]
//! url = "sqlite://./bundler.db"
//!
//! [debug]
//! request_directory = ""
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, warn};

use file_bundler_domain::value_objects::HashAlgorithm;
use file_bundler_domain::BundlerError;

/// Top-level bundler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundlerConfig {
    #[serde(default)]
    pub staging: StagingSettings,
    #[serde(default)]
    pub archive: ArchiveSettings,
    #[serde(default)]
    pub entry_paths: EntryPathSettings,
    #[serde(default)]
    pub s3: S3Settings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub debug: DebugSettings,
}

/// Staging area and URL mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingSettings {
    /// Root under which `<job_id>/` output directories are created.
    pub directory: String,
    /// Prefix replacing the staging root when artifact paths are rendered as
    /// HTTP URLs.
    pub base_url: String,
}

/// Archive sizing, estimation, and hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSettings {
    pub min_size_mb: u64,
    pub max_size_mb: u64,
    pub default_size_mb: u64,
    /// Estimator constant: average share of a file the compressor removes.
    pub average_compression_percentage: u8,
    /// Digest algorithm for the sibling hash files.
    pub hash_algorithm: String,
}

/// Entry-path normalization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryPathSettings {
    /// Leading substrings stripped from entry paths, in order.
    #[serde(default)]
    pub exclusions: Vec<String>,
}

/// S3 provider credentials. Either an IAM role or both keys must be present
/// when the provider is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Settings {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub iam_role: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

/// Debug side features.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugSettings {
    /// Directory for raw request archival; empty disables the feature.
    #[serde(default)]
    pub request_directory: String,
}

impl Default for StagingSettings {
    fn default() -> Self {
        Self {
            directory: "/var/tmp/bundler/staging".to_string(),
            base_url: "http://localhost:8080/data".to_string(),
        }
    }
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            min_size_mb: 100,
            max_size_mb: 2048,
            default_size_mb: 400,
            average_compression_percentage: 40,
            hash_algorithm: "SHA1".to_string(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://./bundler.db".to_string(),
        }
    }
}

impl BundlerConfig {
    /// Loads configuration from a TOML file, falling back to defaults when
    /// the file is absent.
    pub async fn load(path: Option<&Path>) -> Result<Self, BundlerError> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).await.map_err(|e| {
                    BundlerError::ConfigurationError(format!(
                        "cannot read config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                let config: BundlerConfig = toml::from_str(&content).map_err(|e| {
                    BundlerError::ConfigurationError(format!(
                        "cannot parse config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                debug!("loaded configuration from {}", path.display());
                config
            }
            None => {
                warn!("no config file supplied, using built-in defaults");
                BundlerConfig::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field rules eagerly.
    pub fn validate(&self) -> Result<(), BundlerError> {
        if self.staging.directory.is_empty() {
            return Err(BundlerError::ConfigurationError(
                "staging.directory must not be empty".to_string(),
            ));
        }
        if self.archive.min_size_mb == 0 || self.archive.min_size_mb > self.archive.max_size_mb {
            return Err(BundlerError::ConfigurationError(format!(
                "archive size bounds invalid: min {} MB, max {} MB",
                self.archive.min_size_mb, self.archive.max_size_mb
            )));
        }
        if self.archive.default_size_mb < self.archive.min_size_mb
            || self.archive.default_size_mb > self.archive.max_size_mb
        {
            return Err(BundlerError::ConfigurationError(format!(
                "archive.default_size_mb {} outside [{}, {}]",
                self.archive.default_size_mb, self.archive.min_size_mb, self.archive.max_size_mb
            )));
        }
        if self.archive.average_compression_percentage > 100 {
            return Err(BundlerError::ConfigurationError(format!(
                "archive.average_compression_percentage must be 0-100, got {}",
                self.archive.average_compression_percentage
            )));
        }
        self.hash_algorithm()?;
        Ok(())
    }

    /// The configured hash algorithm, parsed.
    pub fn hash_algorithm(&self) -> Result<HashAlgorithm, BundlerError> {
        HashAlgorithm::from_str(&self.archive.hash_algorithm)
    }
}

impl S3Settings {
    /// True when any credential material is configured.
    pub fn is_configured(&self) -> bool {
        !self.iam_role.is_empty() || !self.access_key.is_empty() || !self.secret_key.is_empty()
    }

    /// Enforces the credential rule: either an IAM role, or both keys.
    pub fn validate_credentials(&self) -> Result<(), BundlerError> {
        if !self.iam_role.is_empty() {
            return Ok(());
        }
        if !self.access_key.is_empty() && !self.secret_key.is_empty() {
            return Ok(());
        }
        Err(BundlerError::ConfigurationError(
            "s3 provider needs either iam_role or both access_key and secret_key".to_string(),
        ))
    }
}
