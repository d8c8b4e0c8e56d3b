// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Job Repository
//!
//! [`JobRepository`] over a SQLite pool. The tree is stored normalized
//! (`jobs`, `archive_jobs`, `file_entries`), entities are reassembled on
//! read, and `persist_job` writes the whole tree in one transaction so a new
//! job becomes visible atomically. Every other call is its own transactional
//! unit, per the repository contract.
//!
//! All backend failures surface as [`BundlerError::DatabaseError`]; the
//! observers upstream rely on that single category for their
//! swallow-and-log policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use file_bundler_domain::entities::{ArchiveJob, FileEntry, Job};
use file_bundler_domain::value_objects::{
    ArchiveType, JobId, JobState, RemotePath, TargetSize,
};
use file_bundler_domain::{BundlerError, JobRepository};

/// SQLite-backed job repository.
pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    /// Creates a repository over an initialized pool (see
    /// [`super::schema::initialize_database`]).
    pub fn new(pool: SqlitePool) -> Self {
        SqliteJobRepository { pool }
    }

    /// Creates a repository over a fresh in-memory database. Test support.
    pub async fn in_memory() -> Result<Self, BundlerError> {
        let pool = super::schema::initialize_database("sqlite::memory:")
            .await
            .map_err(|e| BundlerError::DatabaseError(format!("creating in-memory store: {}", e)))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_entries(
        &self,
        job_id: &JobId,
        archive_id: u32,
    ) -> Result<Vec<FileEntry>, BundlerError> {
        let rows = sqlx::query(
            "SELECT source, entry_path, size, state FROM file_entries \
             WHERE job_id = ? AND archive_id = ? ORDER BY position",
        )
        .bind(job_id.as_str())
        .bind(archive_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| entry_from_row(job_id, archive_id, row))
            .collect()
    }

    async fn load_archive_row(
        &self,
        job_id: &JobId,
        archive_id: u32,
    ) -> Result<Option<ArchiveJob>, BundlerError> {
        let row = sqlx::query(
            "SELECT archive_id, archive_type, output_path, hash_path, output_url, hash_url, \
             host_name, num_files, size, state, start_time, end_time \
             FROM archive_jobs WHERE job_id = ? AND archive_id = ?",
        )
        .bind(job_id.as_str())
        .bind(archive_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => {
                let files = self.load_entries(job_id, archive_id).await?;
                Ok(Some(archive_from_row(job_id, &row, files)?))
            }
            None => Ok(None),
        }
    }
}

fn db_error(err: sqlx::Error) -> BundlerError {
    BundlerError::DatabaseError(err.to_string())
}

fn to_db_time(time: Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.to_rfc3339())
}

fn from_db_time(value: Option<String>, what: &str) -> Result<Option<DateTime<Utc>>, BundlerError> {
    match value {
        Some(text) => DateTime::parse_from_rfc3339(&text)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| {
                BundlerError::DatabaseError(format!("malformed {} timestamp '{}': {}", what, text, e))
            }),
        None => Ok(None),
    }
}

fn entry_from_row(
    job_id: &JobId,
    archive_id: u32,
    row: &sqlx::sqlite::SqliteRow,
) -> Result<FileEntry, BundlerError> {
    let source: String = row.get("source");
    let entry_path: String = row.get("entry_path");
    let size: i64 = row.get("size");
    let state: String = row.get("state");

    Ok(FileEntry::restore(
        job_id.clone(),
        archive_id,
        RemotePath::parse(&source)?,
        file_bundler_domain::EntryPath::new(entry_path)?,
        size as u64,
        JobState::from_str(&state)?,
    ))
}

fn archive_from_row(
    job_id: &JobId,
    row: &sqlx::sqlite::SqliteRow,
    files: Vec<FileEntry>,
) -> Result<ArchiveJob, BundlerError> {
    let archive_id: i64 = row.get("archive_id");
    let archive_type: String = row.get("archive_type");
    let output_path: String = row.get("output_path");
    let hash_path: String = row.get("hash_path");
    let output_url: String = row.get("output_url");
    let hash_url: String = row.get("hash_url");
    let host_name: String = row.get("host_name");
    let num_files: i64 = row.get("num_files");
    let size: i64 = row.get("size");
    let state: String = row.get("state");
    let start_time: Option<String> = row.get("start_time");
    let end_time: Option<String> = row.get("end_time");

    Ok(ArchiveJob::restore(
        job_id.clone(),
        archive_id as u32,
        ArchiveType::from_str(&archive_type)?,
        RemotePath::parse(&output_path)?,
        RemotePath::parse(&hash_path)?,
        output_url,
        hash_url,
        host_name,
        num_files as u64,
        size as u64,
        JobState::from_str(&state)?,
        files,
        from_db_time(start_time, "archive start")?,
        from_db_time(end_time, "archive end")?,
    ))
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn get_job(&self, job_id: &JobId) -> Result<Option<Job>, BundlerError> {
        let row = sqlx::query(
            "SELECT user_name, archive_type, target_size, total_size, total_size_complete, \
             num_files, num_files_complete, num_archives, num_archives_complete, state, \
             start_time, end_time FROM jobs WHERE job_id = ?",
        )
        .bind(job_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let archive_rows = sqlx::query(
            "SELECT archive_id, archive_type, output_path, hash_path, output_url, hash_url, \
             host_name, num_files, size, state, start_time, end_time \
             FROM archive_jobs WHERE job_id = ? ORDER BY archive_id",
        )
        .bind(job_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut archives = Vec::with_capacity(archive_rows.len());
        for archive_row in &archive_rows {
            let archive_id: i64 = archive_row.get("archive_id");
            let files = self.load_entries(job_id, archive_id as u32).await?;
            archives.push(archive_from_row(job_id, archive_row, files)?);
        }

        let user_name: String = row.get("user_name");
        let archive_type: String = row.get("archive_type");
        let target_size: i64 = row.get("target_size");
        let total_size: i64 = row.get("total_size");
        let total_size_complete: i64 = row.get("total_size_complete");
        let num_files: i64 = row.get("num_files");
        let num_files_complete: i64 = row.get("num_files_complete");
        let num_archives: i64 = row.get("num_archives");
        let num_archives_complete: i64 = row.get("num_archives_complete");
        let state: String = row.get("state");
        let start_time: Option<String> = row.get("start_time");
        let end_time: Option<String> = row.get("end_time");

        Ok(Some(Job::restore(
            job_id.clone(),
            user_name,
            ArchiveType::from_str(&archive_type)?,
            TargetSize::from_bytes(target_size as u64),
            total_size as u64,
            total_size_complete as u64,
            num_files as u64,
            num_files_complete as u64,
            num_archives as u64,
            num_archives_complete as u64,
            JobState::from_str(&state)?,
            archives,
            from_db_time(start_time, "job start")?,
            from_db_time(end_time, "job end")?,
        )))
    }

    async fn get_archive(
        &self,
        job_id: &JobId,
        archive_id: u32,
    ) -> Result<Option<ArchiveJob>, BundlerError> {
        self.load_archive_row(job_id, archive_id).await
    }

    async fn get_file_entry(
        &self,
        job_id: &JobId,
        archive_id: u32,
        source: &RemotePath,
    ) -> Result<Option<FileEntry>, BundlerError> {
        let row = sqlx::query(
            "SELECT source, entry_path, size, state FROM file_entries \
             WHERE job_id = ? AND archive_id = ? AND source = ?",
        )
        .bind(job_id.as_str())
        .bind(archive_id as i64)
        .bind(source.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(|row| entry_from_row(job_id, archive_id, &row)).transpose()
    }

    async fn list_job_ids(&self) -> Result<Vec<JobId>, BundlerError> {
        let rows = sqlx::query("SELECT job_id FROM jobs ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("job_id");
                JobId::parse(&id)
            })
            .collect()
    }

    async fn persist_job(&self, job: &Job) -> Result<(), BundlerError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO jobs (job_id, user_name, archive_type, target_size, total_size, \
             total_size_complete, num_files, num_files_complete, num_archives, \
             num_archives_complete, state, start_time, end_time, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.job_id().as_str())
        .bind(job.user_name())
        .bind(job.archive_type().as_str())
        .bind(job.target_size().bytes() as i64)
        .bind(job.total_size() as i64)
        .bind(job.total_size_complete() as i64)
        .bind(job.num_files() as i64)
        .bind(job.num_files_complete() as i64)
        .bind(job.num_archives() as i64)
        .bind(job.num_archives_complete() as i64)
        .bind(job.state().as_str())
        .bind(to_db_time(job.start_time()))
        .bind(to_db_time(job.end_time()))
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        for archive in job.archives() {
            sqlx::query(
                "INSERT INTO archive_jobs (job_id, archive_id, archive_type, output_path, \
                 hash_path, output_url, hash_url, host_name, num_files, size, state, \
                 start_time, end_time) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(job.job_id().as_str())
            .bind(archive.archive_id() as i64)
            .bind(archive.archive_type().as_str())
            .bind(archive.output_path().to_string())
            .bind(archive.hash_path().to_string())
            .bind(archive.output_url())
            .bind(archive.hash_url())
            .bind(archive.host_name())
            .bind(archive.num_files() as i64)
            .bind(archive.size() as i64)
            .bind(archive.state().as_str())
            .bind(to_db_time(archive.start_time()))
            .bind(to_db_time(archive.end_time()))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            for (position, entry) in archive.files().iter().enumerate() {
                sqlx::query(
                    "INSERT INTO file_entries (job_id, archive_id, source, position, \
                     entry_path, size, state) VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(job.job_id().as_str())
                .bind(archive.archive_id() as i64)
                .bind(entry.source().to_string())
                .bind(position as i64)
                .bind(entry.entry_path().as_str())
                .bind(entry.size() as i64)
                .bind(entry.state().as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            }
        }

        tx.commit().await.map_err(db_error)
    }

    async fn update_job(&self, job: &Job) -> Result<(), BundlerError> {
        let result = sqlx::query(
            "UPDATE jobs SET user_name = ?, total_size_complete = ?, num_files_complete = ?, \
             num_archives_complete = ?, state = ?, start_time = ?, end_time = ?, updated_at = ? \
             WHERE job_id = ?",
        )
        .bind(job.user_name())
        .bind(job.total_size_complete() as i64)
        .bind(job.num_files_complete() as i64)
        .bind(job.num_archives_complete() as i64)
        .bind(job.state().as_str())
        .bind(to_db_time(job.start_time()))
        .bind(to_db_time(job.end_time()))
        .bind(Utc::now().to_rfc3339())
        .bind(job.job_id().as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(BundlerError::DatabaseError(format!(
                "job {} not found for update",
                job.job_id()
            )));
        }
        Ok(())
    }

    async fn update_archive(&self, archive: &ArchiveJob) -> Result<(), BundlerError> {
        let result = sqlx::query(
            "UPDATE archive_jobs SET host_name = ?, num_files = ?, size = ?, state = ?, \
             start_time = ?, end_time = ? WHERE job_id = ? AND archive_id = ?",
        )
        .bind(archive.host_name())
        .bind(archive.num_files() as i64)
        .bind(archive.size() as i64)
        .bind(archive.state().as_str())
        .bind(to_db_time(archive.start_time()))
        .bind(to_db_time(archive.end_time()))
        .bind(archive.job_id().as_str())
        .bind(archive.archive_id() as i64)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(BundlerError::DatabaseError(format!(
                "archive {} of job {} not found for update",
                archive.archive_id(),
                archive.job_id()
            )));
        }
        Ok(())
    }

    async fn update_file_entry_state(
        &self,
        job_id: &JobId,
        archive_id: u32,
        source: &RemotePath,
        state: JobState,
    ) -> Result<(), BundlerError> {
        let result = sqlx::query(
            "UPDATE file_entries SET state = ? WHERE job_id = ? AND archive_id = ? AND source = ?",
        )
        .bind(state.as_str())
        .bind(job_id.as_str())
        .bind(archive_id as i64)
        .bind(source.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(BundlerError::DatabaseError(format!(
                "file entry '{}' of job {} archive {} not found for update",
                source, job_id, archive_id
            )));
        }
        Ok(())
    }
}
