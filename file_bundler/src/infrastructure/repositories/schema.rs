// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Database Schema
//!
//! Schema creation and migration for the bundler's SQLite store. The job
//! tree is normalized into three tables keyed the way the repository
//! contract looks things up: `jobs` by id, `archive_jobs` by
//! `(job_id, archive_id)`, `file_entries` by `(job_id, archive_id, source)`.
//!
//! `ensure_schema` is idempotent; `initialize_database` combines database
//! creation and migration for application startup.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::debug;

/// DDL for the three job-tree tables.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    job_id                TEXT PRIMARY KEY,
    user_name             TEXT NOT NULL,
    archive_type          TEXT NOT NULL,
    target_size           INTEGER NOT NULL,
    total_size            INTEGER NOT NULL,
    total_size_complete   INTEGER NOT NULL DEFAULT 0,
    num_files             INTEGER NOT NULL,
    num_files_complete    INTEGER NOT NULL DEFAULT 0,
    num_archives          INTEGER NOT NULL,
    num_archives_complete INTEGER NOT NULL DEFAULT 0,
    state                 TEXT NOT NULL,
    start_time            TEXT,
    end_time              TEXT,
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS archive_jobs (
    job_id       TEXT NOT NULL,
    archive_id   INTEGER NOT NULL,
    archive_type TEXT NOT NULL,
    output_path  TEXT NOT NULL,
    hash_path    TEXT NOT NULL,
    output_url   TEXT NOT NULL,
    hash_url     TEXT NOT NULL,
    host_name    TEXT NOT NULL DEFAULT '',
    num_files    INTEGER NOT NULL,
    size         INTEGER NOT NULL,
    state        TEXT NOT NULL,
    start_time   TEXT,
    end_time     TEXT,
    PRIMARY KEY (job_id, archive_id),
    FOREIGN KEY (job_id) REFERENCES jobs(job_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS file_entries (
    job_id     TEXT NOT NULL,
    archive_id INTEGER NOT NULL,
    source     TEXT NOT NULL,
    position   INTEGER NOT NULL,
    entry_path TEXT NOT NULL,
    size       INTEGER NOT NULL,
    state      TEXT NOT NULL,
    PRIMARY KEY (job_id, archive_id, source),
    FOREIGN KEY (job_id, archive_id) REFERENCES archive_jobs(job_id, archive_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_file_entries_archive ON file_entries(job_id, archive_id);
"#;

/// Applies the schema. Safe to run repeatedly.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("database schema ensured");
    Ok(())
}

/// Connects to the database (creating the file when missing) and ensures
/// the schema. The URL accepts the `sqlite://` forms sqlx understands,
/// including `sqlite::memory:`.
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // An in-memory database exists per connection; pin the pool to a single
    // long-lived connection so every caller sees the same store.
    let mut pool_options = SqlitePoolOptions::new();
    if database_url.contains(":memory:") {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}
