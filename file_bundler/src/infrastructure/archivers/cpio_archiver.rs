// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CPIO Archiver
//!
//! Streams elements into a CPIO archive in the portable `newc` (SVR4)
//! format, written at byte level: a 110-byte ASCII-hex header per entry,
//! NUL-terminated name, 4-byte alignment for both name and data, and the
//! `TRAILER!!!` end record.
//!
//! `newc` carries file sizes as 32-bit fields, so an element larger than
//! 4 GiB cannot be represented and aborts the archive.

use std::io::{Read, Write};
use std::sync::Arc;

use file_bundler_domain::services::archive_service::OnEntryComplete;
use file_bundler_domain::services::COPY_BUFFER_SIZE;
use file_bundler_domain::{
    ArchiveElement, ArchiveType, Archiver, BundlerError, FileSystem, RemotePath,
};

const MAGIC: &[u8] = b"070701";
const HEADER_LEN: usize = 110;
const TRAILER_NAME: &str = "TRAILER!!!";
const REGULAR_FILE_MODE: u32 = 0o100644;

/// CPIO `newc` container archiver.
pub struct CpioArchiver {
    file_system: Arc<dyn FileSystem>,
}

impl CpioArchiver {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        CpioArchiver { file_system }
    }
}

fn pad4(len: u64) -> usize {
    ((4 - (len % 4)) % 4) as usize
}

/// Renders one `newc` header. All thirteen fields are 8-digit uppercase hex.
fn header(ino: u32, mode: u32, nlink: u32, mtime: u32, file_size: u32, name_size: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN);
    out.extend_from_slice(MAGIC);
    for field in [
        ino, mode, 0, /* uid */
        0, /* gid */
        nlink, mtime, file_size, 0, /* devmajor */
        0, /* devminor */
        0, /* rdevmajor */
        0, /* rdevminor */
        name_size, 0, /* check */
    ] {
        out.extend_from_slice(format!("{:08X}", field).as_bytes());
    }
    out
}

impl Archiver for CpioArchiver {
    fn bundle(
        &self,
        elements: &[ArchiveElement],
        output: &RemotePath,
        on_entry: &mut OnEntryComplete<'_>,
    ) -> Result<(), BundlerError> {
        super::require_extension(output, ArchiveType::Cpio)?;
        self.file_system.delete(output)?;

        let mut writer = self.file_system.create(output)?;
        let stream_error =
            |what: &str, e: std::io::Error| BundlerError::ArchiveError(format!("{}: {}", what, e));
        let mtime = chrono::Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;

        for (index, element) in elements.iter().enumerate() {
            if element.size > u32::MAX as u64 {
                return Err(BundlerError::ArchiveError(format!(
                    "'{}' is {} bytes; cpio newc entries are limited to 4 GiB",
                    element.entry_path, element.size
                )));
            }
            let name = element.entry_path.as_str();
            let name_size = name.len() as u32 + 1; // includes NUL

            writer
                .write_all(&header(
                    index as u32 + 1,
                    REGULAR_FILE_MODE,
                    1,
                    mtime,
                    element.size as u32,
                    name_size,
                ))
                .map_err(|e| stream_error("writing cpio header", e))?;
            writer
                .write_all(name.as_bytes())
                .and_then(|()| writer.write_all(&[0]))
                .map_err(|e| stream_error("writing cpio name", e))?;
            writer
                .write_all(&vec![0u8; pad4((HEADER_LEN as u32 + name_size) as u64)])
                .map_err(|e| stream_error("padding cpio name", e))?;

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
                    .map_err(|e| stream_error("writing cpio data", e))?;
                written += n as u64;
            }
            writer
                .write_all(&vec![0u8; pad4(written)])
                .map_err(|e| stream_error("padding cpio data", e))?;

            on_entry(element);
        }

        // End-of-archive record.
        let trailer_name_size = TRAILER_NAME.len() as u32 + 1;
        writer
            .write_all(&header(0, 0, 1, 0, 0, trailer_name_size))
            .and_then(|()| writer.write_all(TRAILER_NAME.as_bytes()))
            .and_then(|()| writer.write_all(&[0]))
            .map_err(|e| stream_error("writing cpio trailer", e))?;
        writer
            .write_all(&vec![0u8; pad4((HEADER_LEN as u32 + trailer_name_size) as u64)])
            .map_err(|e| stream_error("padding cpio trailer", e))?;

        writer
            .flush()
            .map_err(|e| stream_error("flushing cpio archive", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::LocalFileSystem;
    use file_bundler_domain::EntryPath;
    use tempfile::TempDir;

    fn element(dir: &TempDir, name: &str, entry: &str, content: &[u8]) -> ArchiveElement {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        ArchiveElement::new(
            RemotePath::local(path),
            EntryPath::new(entry).unwrap(),
            content.len() as u64,
        )
    }

    #[test]
    fn test_pad4() {
        assert_eq!(pad4(0), 0);
        assert_eq!(pad4(1), 3);
        assert_eq!(pad4(4), 0);
        assert_eq!(pad4(110), 2);
    }

    #[test]
    fn test_archive_layout_and_trailer() {
        let dir = TempDir::new().unwrap();
        let elements = vec![element(&dir, "a.bin", "dir/a.bin", b"hello")];
        let output = RemotePath::local(dir.path().join("out.cpio"));

        CpioArchiver::new(Arc::new(LocalFileSystem::new()))
            .bundle(&elements, &output, &mut |_| {})
            .unwrap();

        let bytes = std::fs::read(output.to_local_path()).unwrap();
        assert!(bytes.starts_with(b"070701"));

        // name follows the 110-byte header, NUL-terminated
        let name_end = HEADER_LEN + "dir/a.bin".len();
        assert_eq!(&bytes[HEADER_LEN..name_end], b"dir/a.bin");
        assert_eq!(bytes[name_end], 0);

        // data starts 4-aligned and carries the content
        let data_start = name_end + 1 + pad4((HEADER_LEN + "dir/a.bin".len() + 1) as u64);
        assert_eq!(&bytes[data_start..data_start + 5], b"hello");

        // the trailer record is present
        let trailer_pos = bytes
            .windows(TRAILER_NAME.len())
            .position(|w| w == TRAILER_NAME.as_bytes());
        assert!(trailer_pos.is_some());

        // file size field (field 7: offset 6 + 6*8) says 5
        let size_field = std::str::from_utf8(&bytes[6 + 48..6 + 56]).unwrap();
        assert_eq!(u32::from_str_radix(size_field, 16).unwrap(), 5);
    }

    #[test]
    fn test_callback_order_matches_input() {
        let dir = TempDir::new().unwrap();
        let elements = vec![
            element(&dir, "1.bin", "one.bin", b"1"),
            element(&dir, "2.bin", "two.bin", b"22"),
            element(&dir, "3.bin", "three.bin", b"333"),
        ];
        let output = RemotePath::local(dir.path().join("out.cpio"));

        let mut seen = Vec::new();
        CpioArchiver::new(Arc::new(LocalFileSystem::new()))
            .bundle(&elements, &output, &mut |e: &ArchiveElement| {
                seen.push(e.entry_path.as_str().to_string())
            })
            .unwrap();
        assert_eq!(seen, vec!["one.bin", "two.bin", "three.bin"]);
    }
}
