// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # AR Archiver
//!
//! Streams elements into a Unix `ar` container, written at byte level: the
//! format is a fixed 8-byte global header plus 60-byte ASCII member headers,
//! which is simpler to emit directly than to pull in a dependency for.
//!
//! Member names longer than the classic 16-character field (or containing
//! spaces) use the BSD `#1/<len>` convention: the real name is prepended to
//! the member data and included in its size. Member data is padded to even
//! length with a newline, per the format.

use std::io::{Read, Write};
use std::sync::Arc;

use file_bundler_domain::services::archive_service::OnEntryComplete;
use file_bundler_domain::services::COPY_BUFFER_SIZE;
use file_bundler_domain::{
    ArchiveElement, ArchiveType, Archiver, BundlerError, FileSystem, RemotePath,
};

const GLOBAL_HEADER: &[u8] = b"!<arch>\n";
const HEADER_TERMINATOR: &[u8] = b"`\n";
const NAME_FIELD_LEN: usize = 16;

/// Unix `ar` container archiver.
pub struct ArArchiver {
    file_system: Arc<dyn FileSystem>,
}

impl ArArchiver {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        ArArchiver { file_system }
    }
}

/// Writes one fixed-width ASCII header field, space padded.
fn write_field(out: &mut Vec<u8>, value: &str, width: usize) -> Result<(), BundlerError> {
    if value.len() > width {
        return Err(BundlerError::ArchiveError(format!(
            "ar header field '{}' exceeds {} bytes",
            value, width
        )));
    }
    out.extend_from_slice(value.as_bytes());
    out.resize(out.len() + (width - value.len()), b' ');
    Ok(())
}

fn member_header(name: &str, data_size: u64, mtime: u64) -> Result<(Vec<u8>, bool), BundlerError> {
    let bsd_name = name.len() > NAME_FIELD_LEN || name.contains(' ');
    let (name_field, total_size) = if bsd_name {
        (format!("#1/{}", name.len()), data_size + name.len() as u64)
    } else {
        (name.to_string(), data_size)
    };

    let mut header = Vec::with_capacity(60);
    write_field(&mut header, &name_field, NAME_FIELD_LEN)?;
    write_field(&mut header, &mtime.to_string(), 12)?;
    write_field(&mut header, "0", 6)?; // uid
    write_field(&mut header, "0", 6)?; // gid
    write_field(&mut header, "100644", 8)?; // mode, octal
    write_field(&mut header, &total_size.to_string(), 10)?;
    header.extend_from_slice(HEADER_TERMINATOR);
    Ok((header, bsd_name))
}

impl Archiver for ArArchiver {
    fn bundle(
        &self,
        elements: &[ArchiveElement],
        output: &RemotePath,
        on_entry: &mut OnEntryComplete<'_>,
    ) -> Result<(), BundlerError> {
        super::require_extension(output, ArchiveType::Ar)?;
        self.file_system.delete(output)?;

        let mut writer = self.file_system.create(output)?;
        let stream_error =
            |what: &str, e: std::io::Error| BundlerError::ArchiveError(format!("{}: {}", what, e));

        writer
            .write_all(GLOBAL_HEADER)
            .map_err(|e| stream_error("writing ar global header", e))?;

        let mtime = chrono::Utc::now().timestamp().max(0) as u64;

        for element in elements {
            let name = element.entry_path.as_str();
            let (header, bsd_name) = member_header(name, element.size, mtime)?;
            writer
                .write_all(&header)
                .map_err(|e| stream_error("writing ar member header", e))?;
            if bsd_name {
                writer
                    .write_all(name.as_bytes())
                    .map_err(|e| stream_error("writing ar member name", e))?;
            }

            let mut reader = self.file_system.open(&element.source)?;
            let mut buffer = [0u8; COPY_BUFFER_SIZE];
            let mut written: u64 = 0;
            loop {
                let n = reader
                    .read(&mut buffer)
                    .map_err(|e| stream_error("reading source", e))?;
                if n == 0 {
                    break;
                }
                writer
                    .write_all(&buffer[..n])
                    .map_err(|e| stream_error("writing ar member data", e))?;
                written += n as u64;
            }

            // Members are padded to even length with a newline.
            let total = written + if bsd_name { name.len() as u64 } else { 0 };
            if total % 2 == 1 {
                writer
                    .write_all(b"\n")
                    .map_err(|e| stream_error("padding ar member", e))?;
            }

            on_entry(element);
        }

        writer
            .flush()
            .map_err(|e| stream_error("flushing ar archive", e))?;
        Ok(())
    }
}
