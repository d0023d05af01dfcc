//! # Page Guards
//!
//! RAII handles over pinned pages. Every guard owns one pin and gives it
//! back on drop; the latched variants additionally hold the page's
//! reader-writer latch for their whole lifetime:
//!
//! | Guard            | Latch     | On drop                               |
//! |------------------|-----------|---------------------------------------|
//! | [`PageGuard`]      | none      | unpin (dirty if `mark_dirty` called) |
//! | [`ReadPageGuard`]  | shared    | release latch, then unpin            |
//! | [`WritePageGuard`] | exclusive | mark dirty, release latch, unpin     |
//!
//! Guards are move-only. Dropping a guard early with `drop(guard)` is the
//! explicit release; a guard that was upgraded or moved out of releases
//! nothing.
//!
//! The latch guards are `Arc`-backed (`parking_lot`'s `arc_lock`), so a
//! latched guard is a self-contained value that can be returned from the
//! function that fetched it.

use std::sync::Arc;

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::RawRwLock;

use super::pool::BufferPoolManager;
use super::replacer::AccessType;
use crate::storage::{Page, PageBuf, PageId};

type ReadLatch = ArcRwLockReadGuard<RawRwLock, Box<PageBuf>>;
type WriteLatch = ArcRwLockWriteGuard<RawRwLock, Box<PageBuf>>;

/// Unlatched guard over a pinned page. Dropping it unpins the page,
/// reporting it dirty only if [`mark_dirty`](Self::mark_dirty) was called.
pub struct PageGuard {
    bpm: Option<Arc<BufferPoolManager>>,
    page: Option<Arc<Page>>,
    is_dirty: bool,
}

impl PageGuard {
    pub(crate) fn new(bpm: Arc<BufferPoolManager>, page: Arc<Page>) -> Self {
        Self {
            bpm: Some(bpm),
            page: Some(page),
            is_dirty: false,
        }
    }

    /// The guarded page.
    pub fn page(&self) -> &Arc<Page> {
        self.page.as_ref().expect("guard holds a page until dropped")
    }

    pub fn page_id(&self) -> PageId {
        self.page().page_id()
    }

    /// Records that the caller modified the page, so the pin is released
    /// with the dirty flag set.
    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    /// Trades this guard for one holding the page's shared latch. The pin
    /// is carried over, not re-acquired.
    pub fn upgrade_read(self) -> ReadPageGuard {
        let latch = self.page().latch().read_arc();
        ReadPageGuard {
            latch: Some(latch),
            guard: self,
        }
    }

    /// Trades this guard for one holding the page's exclusive latch.
    pub fn upgrade_write(self) -> WritePageGuard {
        let latch = self.page().latch().write_arc();
        WritePageGuard {
            latch: Some(latch),
            guard: self,
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let (Some(bpm), Some(page)) = (self.bpm.take(), self.page.take()) {
            bpm.unpin_page(page.page_id(), self.is_dirty, AccessType::Unknown);
        }
    }
}

/// Guard holding a pin and the page's shared latch.
pub struct ReadPageGuard {
    guard: PageGuard,
    latch: Option<ReadLatch>,
}

impl ReadPageGuard {
    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    /// The page bytes, readable for the guard's lifetime.
    pub fn data(&self) -> &[u8] {
        &self.latch.as_ref().expect("latch held until dropped")[..]
    }
}

impl Drop for ReadPageGuard {
    fn drop(&mut self) {
        // Latch first, then the inner guard unpins.
        self.latch = None;
    }
}

/// Guard holding a pin and the page's exclusive latch. Dropping it marks
/// the page dirty: taking the exclusive latch declares intent to write.
pub struct WritePageGuard {
    guard: PageGuard,
    latch: Option<WriteLatch>,
}

impl WritePageGuard {
    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn data(&self) -> &[u8] {
        &self.latch.as_ref().expect("latch held until dropped")[..]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.latch.as_mut().expect("latch held until dropped")[..]
    }
}

impl Drop for WritePageGuard {
    fn drop(&mut self) {
        self.guard.mark_dirty();
        self.latch = None;
    }
}
