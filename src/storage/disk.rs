//! # Disk Manager Abstraction
//!
//! This module provides the [`DiskManager`] trait, the copy-based I/O
//! primitive the buffer pool is built over, plus the two backends the crate
//! ships:
//!
//! | Backend             | Storage          | Intended use            |
//! |---------------------|------------------|-------------------------|
//! | `FileDiskManager`   | one regular file | durable page storage    |
//! | `MemoryDiskManager` | in-memory map    | tests and benchmarks    |
//!
//! ## Copy-Based Interface
//!
//! The interface deliberately mirrors the shape of the request buffers used
//! by the disk scheduler:
//!
//! ```text
//! fn read_page(&self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<()>;
//! fn write_page(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()>;
//! ```
//!
//! Pages are addressed by id; the file offset of page `p` is
//! `p * PAGE_SIZE`. Reading a page that was never written yields zeroed
//! bytes on both backends, so a fresh database file behaves as an infinite
//! run of zero pages.
//!
//! ## Thread Safety
//!
//! Implementations must be `Send + Sync`: the disk scheduler's worker thread
//! owns no manager of its own and shares one with the rest of the process.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use eyre::{Result, WrapErr};
use hashbrown::HashMap;
use parking_lot::Mutex;

use super::page::{PageBuf, PageId};
use crate::config::PAGE_SIZE;

/// The I/O primitive consumed by the disk scheduler.
pub trait DiskManager: Send + Sync {
    /// Reads page `page_id` into `buf`. Unwritten pages read as zeroes.
    fn read_page(&self, page_id: PageId, buf: &mut PageBuf) -> Result<()>;

    /// Writes `data` as page `page_id`, extending the backing store if
    /// needed.
    fn write_page(&self, page_id: PageId, data: &PageBuf) -> Result<()>;
}

/// File-backed disk manager storing pages at `page_id * PAGE_SIZE` offsets.
pub struct FileDiskManager {
    file: Mutex<File>,
}

impl FileDiskManager {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .wrap_err_with(|| format!("failed to open database file {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn offset(page_id: PageId) -> u64 {
        page_id as u64 * PAGE_SIZE as u64
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut PageBuf) -> Result<()> {
        let mut file = self.file.lock();
        let len = file
            .metadata()
            .wrap_err("failed to stat database file")?
            .len();
        let offset = Self::offset(page_id);

        // Past-EOF reads see the zero pages a fresh file would contain.
        if offset >= len {
            buf.fill(0);
            return Ok(());
        }

        file.seek(SeekFrom::Start(offset))
            .wrap_err_with(|| format!("failed to seek to page {page_id}"))?;

        let available = ((len - offset) as usize).min(PAGE_SIZE);
        file.read_exact(&mut buf[..available])
            .wrap_err_with(|| format!("failed to read page {page_id}"))?;
        buf[available..].fill(0);
        Ok(())
    }

    fn write_page(&self, page_id: PageId, data: &PageBuf) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(Self::offset(page_id)))
            .wrap_err_with(|| format!("failed to seek to page {page_id}"))?;
        file.write_all(data)
            .wrap_err_with(|| format!("failed to write page {page_id}"))?;
        Ok(())
    }
}

/// In-memory disk manager for tests and benchmarks.
#[derive(Default)]
pub struct MemoryDiskManager {
    pages: Mutex<HashMap<PageId, Box<PageBuf>>>,
}

impl MemoryDiskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages that have ever been written.
    pub fn page_count(&self) -> usize {
        self.pages.lock().len()
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut PageBuf) -> Result<()> {
        match self.pages.lock().get(&page_id) {
            Some(stored) => buf.copy_from_slice(&stored[..]),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, data: &PageBuf) -> Result<()> {
        let mut stored: Box<PageBuf> = Box::new([0u8; PAGE_SIZE]);
        stored.copy_from_slice(data);
        self.pages.lock().insert(page_id, stored);
        Ok(())
    }
}
