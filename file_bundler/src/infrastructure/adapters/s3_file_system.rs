// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # S3 Filesystem Provider
//!
//! The `s3` scheme provider over the `object_store` crate. An `s3://` path
//! carries the bucket as its first segment; stores are built per bucket on
//! first use and cached for the life of the process, all with the single
//! credential set fixed at startup.
//!
//! ## Sync Bridging
//!
//! `object_store` is async; the domain port is sync. The provider captures
//! the runtime `Handle` at construction and bridges with `block_on`, which
//! means its methods MUST be called from a blocking context - the archive
//! workers' `spawn_blocking` sections and the dispatcher's expansion phase.
//! Calling them from an async task would panic inside tokio.
//!
//! Reads stream chunk-by-chunk (an object is never materialized in memory);
//! writes buffer and upload on `flush`, which only hash files use - archive
//! artifacts live in the local staging area.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::infrastructure::config::S3Settings;
use file_bundler_domain::services::file_system::{FileSystem, WriteSeek};
use file_bundler_domain::{BundlerError, RemotePath};

/// `s3` scheme provider with per-bucket store caching.
pub struct S3FileSystem {
    settings: S3Settings,
    handle: Handle,
    stores: RwLock<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl S3FileSystem {
    /// Creates the provider, validating the credential rule eagerly: either
    /// an IAM role, or both access and secret keys.
    pub fn new(settings: S3Settings, handle: Handle) -> Result<Self, BundlerError> {
        settings.validate_credentials()?;
        if settings.access_key.is_empty() {
            info!(role = %settings.iam_role, "s3 provider using IAM role credentials");
        }
        Ok(S3FileSystem {
            settings,
            handle,
            stores: RwLock::new(HashMap::new()),
        })
    }

    fn split(path: &RemotePath) -> Result<(String, ObjectPath), BundlerError> {
        if path.scheme() != "s3" {
            return Err(BundlerError::SchemeUnsupported(format!(
                "s3 provider cannot serve '{}'",
                path
            )));
        }
        match path.path().split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok((bucket.to_string(), ObjectPath::from(key)))
            }
            _ => Err(BundlerError::ValidationError(format!(
                "s3 location '{}' must be s3://bucket/key",
                path
            ))),
        }
    }

    fn store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, BundlerError> {
        if let Some(store) = self.stores.read().get(bucket) {
            return Ok(store.clone());
        }

        let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
        if !self.settings.endpoint.is_empty() {
            builder = builder
                .with_endpoint(&self.settings.endpoint)
                .with_allow_http(true);
        }
        let region = if self.settings.region.is_empty() {
            "us-east-1"
        } else {
            &self.settings.region
        };
        builder = builder.with_region(region);
        if !self.settings.access_key.is_empty() {
            builder = builder
                .with_access_key_id(&self.settings.access_key)
                .with_secret_access_key(&self.settings.secret_key);
        }
        // With no explicit keys the builder falls back to the instance
        // credentials of the configured IAM role.

        let store: Arc<dyn ObjectStore> = Arc::new(builder.build().map_err(|e| {
            BundlerError::ConfigurationError(format!("cannot build s3 store for '{}': {}", bucket, e))
        })?);

        debug!(bucket, "built s3 store");
        self.stores.write().insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

fn s3_error(path: &RemotePath, err: object_store::Error) -> BundlerError {
    match err {
        object_store::Error::NotFound { .. } => {
            BundlerError::NotFound(format!("{}: {}", path, err))
        }
        _ => BundlerError::TransientIo(format!("{}: {}", path, err)),
    }
}

/// Sync `Read` over an async byte stream, pulling one chunk at a time.
struct BlockingStreamReader {
    handle: Handle,
    stream: BoxStream<'static, object_store::Result<Bytes>>,
    current: Bytes,
}

impl Read for BlockingStreamReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.current.is_empty() {
            match self.handle.block_on(self.stream.next()) {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(std::io::Error::other(e)),
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len());
        let chunk = self.current.split_to(n);
        buf[..n].copy_from_slice(&chunk);
        Ok(n)
    }
}

/// Buffering writer that uploads the object on `flush`.
struct S3ObjectWriter {
    handle: Handle,
    store: Arc<dyn ObjectStore>,
    path: RemotePath,
    key: ObjectPath,
    buffer: Vec<u8>,
    dirty: bool,
}

impl Write for S3ObjectWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.dirty = true;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let payload = PutPayload::from(std::mem::take(&mut self.buffer));
        self.handle
            .block_on(self.store.put(&self.key, payload))
            .map_err(|e| std::io::Error::other(format!("putting {}: {}", self.path, e)))?;
        self.dirty = false;
        Ok(())
    }
}

impl FileSystem for S3FileSystem {
    fn open(&self, path: &RemotePath) -> Result<Box<dyn Read + Send>, BundlerError> {
        let (bucket, key) = Self::split(path)?;
        let store = self.store(&bucket)?;
        let result = self
            .handle
            .block_on(store.get(&key))
            .map_err(|e| s3_error(path, e))?;
        Ok(Box::new(BlockingStreamReader {
            handle: self.handle.clone(),
            stream: result.into_stream(),
            current: Bytes::new(),
        }))
    }

    fn create(&self, path: &RemotePath) -> Result<Box<dyn Write + Send>, BundlerError> {
        let (bucket, key) = Self::split(path)?;
        let store = self.store(&bucket)?;
        Ok(Box::new(S3ObjectWriter {
            handle: self.handle.clone(),
            store,
            path: path.clone(),
            key,
            buffer: Vec::new(),
            dirty: false,
        }))
    }

    fn create_seekable(&self, path: &RemotePath) -> Result<Box<dyn WriteSeek + Send>, BundlerError> {
        Err(BundlerError::SchemeUnsupported(format!(
            "'{}': object stores cannot seek; stage seekable outputs on a file path",
            path
        )))
    }

    fn size(&self, path: &RemotePath) -> Result<u64, BundlerError> {
        let (bucket, key) = Self::split(path)?;
        let store = self.store(&bucket)?;
        let meta = self
            .handle
            .block_on(store.head(&key))
            .map_err(|e| s3_error(path, e))?;
        Ok(meta.size as u64)
    }

    fn exists(&self, path: &RemotePath) -> Result<bool, BundlerError> {
        let (bucket, key) = Self::split(path)?;
        let store = self.store(&bucket)?;
        match self.handle.block_on(store.head(&key)) {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(s3_error(path, e)),
        }
    }

    fn delete(&self, path: &RemotePath) -> Result<(), BundlerError> {
        let (bucket, key) = Self::split(path)?;
        let store = self.store(&bucket)?;
        match self.handle.block_on(store.delete(&key)) {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(s3_error(path, e)),
        }
    }

    fn walk(&self, path: &RemotePath) -> Result<Vec<RemotePath>, BundlerError> {
        let (bucket, key) = Self::split(path)?;
        let store = self.store(&bucket)?;
        let metas: Vec<object_store::ObjectMeta> = self
            .handle
            .block_on(store.list(Some(&key)).try_collect())
            .map_err(|e| s3_error(path, e))?;

        let mut files: Vec<RemotePath> = metas
            .into_iter()
            .map(|meta| RemotePath::parse(&format!("s3://{}/{}", bucket, meta.location)))
            .collect::<Result<_, _>>()?;
        // Stable order for deterministic bin-packing.
        files.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(files)
    }

    fn create_dir_all(&self, _path: &RemotePath) -> Result<(), BundlerError> {
        // Object stores have a flat namespace.
        Ok(())
    }
}
