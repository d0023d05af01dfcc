//! # Page Frames
//!
//! A [`Page`] is one frame of the buffer pool: a fixed-size byte buffer plus
//! the metadata the pool needs to manage residency.
//!
//! ## Metadata Discipline
//!
//! ```text
//! Page {
//!     page_id:   AtomicU32,              // INVALID_PAGE_ID while free
//!     pin_count: AtomicU32,              // outstanding borrows
//!     is_dirty:  AtomicBool,             // in-memory bytes differ from disk
//!     data:      Arc<RwLock<[u8; 4096]>> // the rw latch IS this lock
//! }
//! ```
//!
//! The metadata fields are atomics so that page guards can observe them
//! without taking the pool latch, but they are only ever *written* while the
//! `BufferPoolManager` latch is held. The data latch is independent of the
//! pool latch: it is acquired and released exclusively by page guards, and
//! may be held long after the pool latch was dropped.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::PAGE_SIZE;

/// Identifier of an on-disk page. Allocated monotonically by the pool.
pub type PageId = u32;

/// Index of a frame inside the buffer pool's page array.
pub type FrameId = usize;

/// Sentinel id carried by frames that hold no page.
pub const INVALID_PAGE_ID: PageId = PageId::MAX;

/// The raw bytes of one page.
pub type PageBuf = [u8; PAGE_SIZE];

/// One buffer pool frame: a page-sized buffer and its residency metadata.
pub struct Page {
    frame_id: FrameId,
    page_id: AtomicU32,
    pin_count: AtomicU32,
    is_dirty: AtomicBool,
    data: Arc<RwLock<Box<PageBuf>>>,
}

impl Page {
    pub(crate) fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: AtomicU32::new(INVALID_PAGE_ID),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
            data: Arc::new(RwLock::new(Box::new([0u8; PAGE_SIZE]))),
        }
    }

    /// The frame slot this page occupies. Fixed for the pool's lifetime.
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// The id of the resident page, or [`INVALID_PAGE_ID`] for a free frame.
    pub fn page_id(&self) -> PageId {
        self.page_id.load(Ordering::Acquire)
    }

    /// Number of outstanding pins. A pinned page cannot be evicted.
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Whether the in-memory bytes have diverged from the on-disk copy.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Acquire)
    }

    /// Acquires the page's shared latch and returns the bytes.
    pub fn read(&self) -> RwLockReadGuard<'_, Box<PageBuf>> {
        self.data.read()
    }

    /// Acquires the page's exclusive latch and returns the bytes mutably.
    ///
    /// Writing through this latch does not mark the page dirty; callers
    /// report dirtiness when they unpin (or use a [`WritePageGuard`], which
    /// does both).
    ///
    /// [`WritePageGuard`]: crate::buffer::WritePageGuard
    pub fn write(&self) -> RwLockWriteGuard<'_, Box<PageBuf>> {
        self.data.write()
    }

    /// The latch itself, for guards that need an owned (`Arc`-backed) lock.
    pub(crate) fn latch(&self) -> &Arc<RwLock<Box<PageBuf>>> {
        &self.data
    }

    pub(crate) fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id, Ordering::Release);
    }

    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.is_dirty.store(dirty, Ordering::Release);
    }

    pub(crate) fn set_pin_count(&self, count: u32) {
        self.pin_count.store(count, Ordering::Release);
    }

    /// Increments the pin count and returns the new value.
    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    pub(crate) fn unpin(&self) -> u32 {
        let prev = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "unpin on a page with pin count 0");
        prev - 1
    }

    /// Copies the page bytes out, for write-back through the disk scheduler.
    pub(crate) fn snapshot(&self) -> Box<PageBuf> {
        let guard = self.data.read();
        let mut buf: Box<PageBuf> = Box::new([0u8; PAGE_SIZE]);
        buf.copy_from_slice(&guard[..]);
        buf
    }

    /// Replaces the page bytes with a buffer filled by the disk scheduler.
    pub(crate) fn install(&self, buf: Box<PageBuf>) {
        *self.data.write() = buf;
    }

    /// Zeroes the bytes and clears all metadata back to the free state.
    pub(crate) fn reset(&self) {
        self.data.write().fill(0);
        self.page_id.store(INVALID_PAGE_ID, Ordering::Release);
        self.pin_count.store(0, Ordering::Release);
        self.is_dirty.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_page_is_free_and_zeroed() {
        let page = Page::new(3);
        assert_eq!(page.frame_id(), 3);
        assert_eq!(page.page_id(), INVALID_PAGE_ID);
        assert_eq!(page.pin_count(), 0);
        assert!(!page.is_dirty());
        assert!(page.read().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reset_clears_contents_and_metadata() {
        let page = Page::new(0);
        page.set_page_id(7);
        page.set_pin_count(1);
        page.set_dirty(true);
        page.write()[0] = 0xAB;

        page.reset();

        assert_eq!(page.page_id(), INVALID_PAGE_ID);
        assert_eq!(page.pin_count(), 0);
        assert!(!page.is_dirty());
        assert_eq!(page.read()[0], 0);
    }

    #[test]
    fn test_snapshot_copies_current_bytes() {
        let page = Page::new(0);
        page.write()[..4].copy_from_slice(b"opal");
        let snap = page.snapshot();
        assert_eq!(&snap[..4], b"opal");

        // The snapshot is a copy, not a view.
        page.write()[0] = b'X';
        assert_eq!(&snap[..4], b"opal");
    }

    #[test]
    fn test_pin_unpin_round_trip() {
        let page = Page::new(0);
        assert_eq!(page.pin(), 1);
        assert_eq!(page.pin(), 2);
        assert_eq!(page.unpin(), 1);
        assert_eq!(page.unpin(), 0);
    }
}
