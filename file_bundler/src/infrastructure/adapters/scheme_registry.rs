// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Scheme Registry
//!
//! Maps URI schemes to filesystem providers and itself implements the
//! [`FileSystem`] port by dispatching on [`RemotePath::scheme`], so every
//! consumer - archivers, hasher, dispatcher - holds one `Arc<dyn
//! FileSystem>` and never knows which provider serves a location.
//!
//! Registration happens exactly once, at startup, before the registry is
//! shared: `main` builds it mutably, registers providers, and only then
//! wraps it in an `Arc`. There is no post-publication mutation, which is
//! what makes the at-most-once initialization guarantee trivial.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use file_bundler_domain::services::file_system::{FileSystem, WriteSeek};
use file_bundler_domain::{BundlerError, RemotePath};

use crate::infrastructure::adapters::LocalFileSystem;

/// Scheme-dispatching filesystem front.
pub struct SchemeRegistry {
    providers: HashMap<String, Arc<dyn FileSystem>>,
}

impl SchemeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        SchemeRegistry {
            providers: HashMap::new(),
        }
    }

    /// Registry with the `file` provider pre-registered.
    pub fn with_local() -> Self {
        let mut registry = Self::new();
        registry.register("file", Arc::new(LocalFileSystem::new()));
        registry
    }

    /// Registers a provider for a scheme, replacing any previous one.
    pub fn register(&mut self, scheme: &str, provider: Arc<dyn FileSystem>) {
        self.providers.insert(scheme.to_ascii_lowercase(), provider);
    }

    /// The registered schemes, for startup logging.
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    fn provider(&self, path: &RemotePath) -> Result<&Arc<dyn FileSystem>, BundlerError> {
        self.providers.get(path.scheme()).ok_or_else(|| {
            BundlerError::SchemeUnsupported(format!(
                "no filesystem provider registered for scheme '{}' ({})",
                path.scheme(),
                path
            ))
        })
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::with_local()
    }
}

impl FileSystem for SchemeRegistry {
    fn open(&self, path: &RemotePath) -> Result<Box<dyn Read + Send>, BundlerError> {
        self.provider(path)?.open(path)
    }

    fn create(&self, path: &RemotePath) -> Result<Box<dyn Write + Send>, BundlerError> {
        self.provider(path)?.create(path)
    }

    fn create_seekable(&self, path: &RemotePath) -> Result<Box<dyn WriteSeek + Send>, BundlerError> {
        self.provider(path)?.create_seekable(path)
    }

    fn size(&self, path: &RemotePath) -> Result<u64, BundlerError> {
        self.provider(path)?.size(path)
    }

    fn exists(&self, path: &RemotePath) -> Result<bool, BundlerError> {
        self.provider(path)?.exists(path)
    }

    fn delete(&self, path: &RemotePath) -> Result<(), BundlerError> {
        self.provider(path)?.delete(path)
    }

    fn walk(&self, path: &RemotePath) -> Result<Vec<RemotePath>, BundlerError> {
        self.provider(path)?.walk(path)
    }

    fn create_dir_all(&self, path: &RemotePath) -> Result<(), BundlerError> {
        self.provider(path)?.create_dir_all(path)
    }
}
