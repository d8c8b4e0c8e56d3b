// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bundle HTTP Server
//!
//! Lightweight HTTP server for job submission and progress queries, built
//! directly on `tokio::net::TcpListener` with hand-parsed requests - the
//! endpoint surface is four fixed routes, which does not justify a web
//! framework.
//!
//! ## Endpoints
//!
//! - `POST /BundleFilesJSON`, `POST /BundleFiles`, `POST /BundleFilesText`
//!   - submit a bundle request. The routes differ only in the
//!   content-type the original clients send; all three carry the same JSON
//!   body. Responds `200 OK` with a tracker `{job_id, user_name, state}`,
//!   `400` on a non-deserializable body, `500` on persistence failure.
//! - `GET /GetState?job_id=<id>` - the progress snapshot.
//! - `GET /isAlive` - liveness probe.
//! - `GET /DataSourceTest` - the set of known job ids.
//!
//! Each connection is served by its own task; request handling failures are
//! logged and never take the accept loop down.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::application::services::{
    BundleRequest, BundleService, RequestedFile, SnapshotService,
};
use crate::infrastructure::services::RequestArchiver;
use file_bundler_domain::{BundlerError, JobId, JobState};
use file_bundler_bootstrap::CancellationToken;

/// Largest accepted request head (request line + headers).
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// One file of the submission body: either a bare path string or an object
/// with an optional in-archive prefix. Both forms may be mixed in one list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileSpecDto {
    Plain(String),
    Detailed {
        path: String,
        #[serde(default)]
        archive_path: Option<String>,
    },
}

/// The submission body.
#[derive(Debug, Deserialize)]
struct BundleRequestDto {
    #[serde(default)]
    files: Vec<FileSpecDto>,
    #[serde(default, rename = "type")]
    archive_type: Option<String>,
    #[serde(default)]
    max_size: Option<u64>,
    #[serde(default)]
    output_filename: Option<String>,
    #[serde(default)]
    user_name: Option<String>,
}

impl From<BundleRequestDto> for BundleRequest {
    fn from(dto: BundleRequestDto) -> Self {
        BundleRequest {
            files: dto
                .files
                .into_iter()
                .map(|spec| match spec {
                    FileSpecDto::Plain(path) => RequestedFile {
                        path,
                        archive_path: None,
                    },
                    FileSpecDto::Detailed { path, archive_path } => RequestedFile {
                        path,
                        archive_path,
                    },
                })
                .collect(),
            archive_type: dto.archive_type,
            max_size_mb: dto.max_size,
            output_filename: dto.output_filename,
            user_name: dto.user_name,
        }
    }
}

/// The immediate submission answer.
#[derive(Debug, Serialize)]
struct TrackerDto {
    job_id: String,
    user_name: String,
    state: JobState,
}

/// HTTP server for the bundler.
pub struct BundleServer {
    bundle_service: Arc<BundleService>,
    snapshot_service: Arc<SnapshotService>,
    request_archiver: Arc<RequestArchiver>,
}

impl BundleServer {
    pub fn new(
        bundle_service: Arc<BundleService>,
        snapshot_service: Arc<SnapshotService>,
        request_archiver: Arc<RequestArchiver>,
    ) -> Self {
        BundleServer {
            bundle_service,
            snapshot_service,
            request_archiver,
        }
    }

    /// Binds and serves until the cancellation token trips.
    pub async fn start(
        self: Arc<Self>,
        bind: &str,
        port: u16,
        shutdown: CancellationToken,
    ) -> Result<(), BundlerError> {
        let addr = format!("{}:{}", bind, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| BundlerError::InternalError(format!("cannot bind {}: {}", addr, e)))?;
        info!("bundle endpoint started on http://{}", addr);
        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serves an already-bound listener (tests bind their own port).
    pub async fn serve(self: Arc<Self>, listener: TcpListener, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("bundle endpoint stopping");
                    return;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!(%peer, "accepted connection");
                            let server = self.clone();
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream).await {
                                    warn!(%peer, "error handling request: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("error accepting connection: {}", e);
                        }
                    }
                }
            }
        }
    }

    async fn handle_connection(
        &self,
        mut stream: TcpStream,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (head, body) = read_request(&mut stream).await?;

        let mut lines = head.lines();
        let request_line = lines.next().unwrap_or_default();
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default();
        let target = parts.next().unwrap_or_default();
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        debug!(method, target, "handling request");

        let response = match (method, path) {
            ("POST", "/BundleFilesJSON") | ("POST", "/BundleFiles") | ("POST", "/BundleFilesText") => {
                self.handle_submit(&body).await
            }
            ("GET", "/GetState") => self.handle_get_state(query).await,
            ("GET", "/isAlive") => text_response("200 OK", "Alive"),
            ("GET", "/DataSourceTest") => self.handle_data_source_test().await,
            _ => text_response("404 Not Found", "Not Found"),
        };

        stream.write_all(response.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn handle_submit(&self, body: &[u8]) -> String {
        let raw = String::from_utf8_lossy(body);
        let dto: BundleRequestDto = match serde_json::from_str(&raw) {
            Ok(dto) => dto,
            Err(e) => {
                warn!("non-deserializable submission body: {}", e);
                return text_response("400 Bad Request", &format!("cannot parse request: {}", e));
            }
        };

        let job_id = JobId::generate();
        self.request_archiver.archive(&job_id, &raw).await;

        match self.bundle_service.submit_with_id(job_id, dto.into()).await {
            Ok(receipt) => {
                let tracker = TrackerDto {
                    job_id: receipt.job_id.to_string(),
                    user_name: receipt.user_name,
                    state: receipt.state,
                };
                json_response("200 OK", &tracker)
            }
            Err(e) => {
                error!("submission failed: {}", e);
                text_response(
                    "500 Internal Server Error",
                    &format!("submission failed: {}", e),
                )
            }
        }
    }

    async fn handle_get_state(&self, query: Option<&str>) -> String {
        let job_id = query
            .and_then(|q| {
                q.split('&')
                    .find_map(|pair| pair.strip_prefix("job_id="))
            })
            .and_then(|raw| JobId::parse(raw).ok());

        let Some(job_id) = job_id else {
            return text_response("400 Bad Request", "missing or malformed job_id");
        };

        match self.snapshot_service.snapshot(&job_id).await {
            Ok(snapshot) => json_response("200 OK", &snapshot),
            Err(e) => {
                error!(job_id = %job_id, "snapshot failed: {}", e);
                text_response("500 Internal Server Error", &format!("snapshot failed: {}", e))
            }
        }
    }

    async fn handle_data_source_test(&self) -> String {
        match self.snapshot_service.known_job_ids().await {
            Ok(ids) => {
                let ids: Vec<String> = ids.iter().map(JobId::to_string).collect();
                json_response("200 OK", &ids)
            }
            Err(e) => {
                error!("listing job ids failed: {}", e);
                text_response("500 Internal Server Error", &format!("listing failed: {}", e))
            }
        }
    }
}

/// Reads one HTTP request: head until the blank line, then exactly
/// `Content-Length` body bytes.
async fn read_request(
    stream: &mut TcpStream,
) -> Result<(String, Vec<u8>), Box<dyn std::error::Error + Send + Sync>> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find_subsequence(&buffer, b"\r\n\r\n") {
            break pos;
        }
        if buffer.len() > MAX_HEAD_BYTES {
            return Err("request head too large".into());
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err("connection closed before request head".into());
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    if content_length > MAX_BODY_BYTES {
        return Err("request body too large".into());
    }

    let mut body = buffer[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err("connection closed before request body".into());
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok((head, body))
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn text_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

fn json_response<T: Serialize>(status: &str, value: &T) -> String {
    let body = serde_json::to_string(value).unwrap_or_else(|e| {
        error!("response serialization failed: {}", e);
        "{}".to_string()
    });
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_file_forms_deserialize() {
        let dto: BundleRequestDto = serde_json::from_str(
            r#"{
                "files": [
                    "/data/plain.bin",
                    {"path": "/data/dir", "archive_path": "renamed"}
                ],
                "type": "TAR",
                "max_size": 250,
                "user_name": "alice"
            }"#,
        )
        .unwrap();

        let request: BundleRequest = dto.into();
        assert_eq!(request.files.len(), 2);
        assert_eq!(request.files[0].path, "/data/plain.bin");
        assert!(request.files[0].archive_path.is_none());
        assert_eq!(request.files[1].archive_path.as_deref(), Some("renamed"));
        assert_eq!(request.archive_type.as_deref(), Some("TAR"));
        assert_eq!(request.max_size_mb, Some(250));
    }

    #[test]
    fn test_find_subsequence() {
        assert_eq!(find_subsequence(b"abc\r\n\r\nbody", b"\r\n\r\n"), Some(3));
        assert_eq!(find_subsequence(b"abc", b"\r\n\r\n"), None);
    }

    #[test]
    fn test_response_framing() {
        let response = text_response("200 OK", "Alive");
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("\r\n\r\nAlive"));
        assert!(response.contains("Content-Length: 5"));
    }
}
