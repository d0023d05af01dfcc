//! # Buffer Pool Manager
//!
//! Owns the page array and coordinates the free list, the page table, the
//! LRU-K replacer and the disk scheduler.
//!
//! ## Frame Acquisition
//!
//! `new_page` and `fetch_page` (on a miss) share one protocol:
//!
//! ```text
//! 1. pop a frame off the free list            (back-pop)
//! 2. otherwise ask the replacer for a victim  (fail if every frame pinned)
//! 3. dirty victim: write back through the scheduler and wait
//! 4. erase the victim's page-table entry
//! ```
//!
//! ## Locking
//!
//! One mutex (`state`) guards the page table and the free list; frame
//! metadata atomics are only written while it is held, and the replacer is
//! only consulted under it. The mutex is deliberately held across disk
//! completion waits: this serializes the pool, but the replacer and page
//! table then observe every disk operation atomically, which keeps the
//! invariants trivial to state. The per-page data latches are independent
//! and never taken while holding the pool mutex, except to copy bytes for
//! write-back.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use eyre::Result;
use hashbrown::HashMap;
use parking_lot::Mutex;

use super::guard::{PageGuard, ReadPageGuard, WritePageGuard};
use super::replacer::{AccessType, LruKReplacer};
use crate::config::PAGE_SIZE;
use crate::storage::{
    DiskManager, DiskRequest, DiskScheduler, FrameId, Page, PageId, INVALID_PAGE_ID,
};

struct PoolState {
    /// Maps resident page ids to the frames that hold them.
    page_table: HashMap<PageId, FrameId>,
    /// Frames holding no page. Disjoint from the page table's values.
    free_list: Vec<FrameId>,
}

/// Fixed-capacity cache of disk pages with LRU-K eviction.
pub struct BufferPoolManager {
    pool_size: usize,
    pages: Vec<Arc<Page>>,
    state: Mutex<PoolState>,
    replacer: LruKReplacer,
    scheduler: DiskScheduler,
    next_page_id: AtomicU32,
}

impl BufferPoolManager {
    /// Creates a pool of `pool_size` frames with an LRU-K window of `k`,
    /// backed by `disk_manager`. Fails only if the scheduler's worker
    /// thread cannot be spawned.
    pub fn new(pool_size: usize, k: usize, disk_manager: Arc<dyn DiskManager>) -> Result<Self> {
        let pages = (0..pool_size).map(|i| Arc::new(Page::new(i))).collect();
        Ok(Self {
            pool_size,
            pages,
            state: Mutex::new(PoolState {
                page_table: HashMap::with_capacity(pool_size),
                free_list: (0..pool_size).collect(),
            }),
            replacer: LruKReplacer::new(pool_size, k),
            scheduler: DiskScheduler::new(disk_manager)?,
            next_page_id: AtomicU32::new(0),
        })
    }

    /// Number of frames the pool manages.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Allocates a fresh page on disk and pins it into a frame, or `None`
    /// when the free list is empty and every frame is pinned.
    ///
    /// The returned page is zeroed, pinned once, clean, and non-evictable
    /// until unpinned.
    pub fn new_page(&self) -> Option<Arc<Page>> {
        let mut state = self.state.lock();
        let frame_id = self.acquire_frame(&mut state)?;
        let page_id = self.allocate_page();

        let page = &self.pages[frame_id];
        page.reset();
        page.set_page_id(page_id);
        page.set_pin_count(1);

        self.replacer.record_access(frame_id, AccessType::Unknown);
        self.replacer.set_evictable(frame_id, false);
        state.page_table.insert(page_id, frame_id);
        log::debug!("page {page_id} created in frame {frame_id}");
        Some(Arc::clone(page))
    }

    /// Returns the requested page pinned into a frame, reading it from disk
    /// on a miss. `None` when the pool is exhausted.
    pub fn fetch_page(&self, page_id: PageId, access_type: AccessType) -> Option<Arc<Page>> {
        let mut state = self.state.lock();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let page = &self.pages[frame_id];
            page.pin();
            self.replacer.record_access(frame_id, access_type);
            self.replacer.set_evictable(frame_id, false);
            return Some(Arc::clone(page));
        }

        let frame_id = self.acquire_frame(&mut state)?;
        let page = &self.pages[frame_id];
        page.reset();
        page.set_page_id(page_id);
        page.set_pin_count(1);

        let (request, done) = DiskRequest::read(page_id, Box::new([0u8; PAGE_SIZE]));
        self.scheduler.schedule(request);
        match done.wait() {
            Ok(data) => page.install(data),
            Err(err) => {
                log::error!("fetch of page {page_id} failed: {err:#}");
                page.reset();
                state.free_list.push(frame_id);
                return None;
            }
        }

        self.replacer.record_access(frame_id, access_type);
        self.replacer.set_evictable(frame_id, false);
        state.page_table.insert(page_id, frame_id);
        log::debug!("page {page_id} read into frame {frame_id}");
        Some(Arc::clone(page))
    }

    /// Releases one pin on `page_id`, OR-ing in `is_dirty`. Fails if the
    /// page is not resident or was not pinned. A page whose pin count
    /// reaches zero becomes eligible for eviction.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool, _access_type: AccessType) -> bool {
        let state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };
        let page = &self.pages[frame_id];
        if page.pin_count() == 0 {
            return false;
        }
        if is_dirty {
            page.set_dirty(true);
        }
        if page.unpin() == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Synchronously writes `page_id` out and clears its dirty bit. Fails
    /// on [`INVALID_PAGE_ID`], a non-resident page, or an I/O error. Pin
    /// count and residency are unaffected.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        if page_id == INVALID_PAGE_ID {
            return false;
        }
        let state = self.state.lock();
        self.flush_resident(&state, page_id)
    }

    /// Flushes every resident page, dirty or not.
    pub fn flush_all_pages(&self) {
        let state = self.state.lock();
        let resident: Vec<PageId> = state.page_table.keys().copied().collect();
        for page_id in resident {
            self.flush_resident(&state, page_id);
        }
    }

    /// Drops `page_id` from the pool and frees its frame. A page that is
    /// not resident counts as already deleted; a pinned page cannot be
    /// deleted. The page is *not* written back: callers wanting durability
    /// flush first.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return true;
        };
        let page = &self.pages[frame_id];
        if page.pin_count() > 0 {
            return false;
        }
        self.replacer.remove(frame_id);
        state.page_table.remove(&page_id);
        state.free_list.push(frame_id);
        page.reset();
        self.deallocate_page(page_id);
        log::debug!("page {page_id} deleted, frame {frame_id} freed");
        true
    }

    /// Pin count of a resident page, for tests and observability.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(self.pages[frame_id].pin_count())
    }

    /// Fetches `page_id` wrapped in an unpinning guard, without latching.
    pub fn fetch_page_basic(self: &Arc<Self>, page_id: PageId) -> Option<PageGuard> {
        let page = self.fetch_page(page_id, AccessType::Unknown)?;
        Some(PageGuard::new(Arc::clone(self), page))
    }

    /// Fetches `page_id` under the page's shared latch.
    pub fn fetch_page_read(self: &Arc<Self>, page_id: PageId) -> Option<ReadPageGuard> {
        Some(self.fetch_page_basic(page_id)?.upgrade_read())
    }

    /// Fetches `page_id` under the page's exclusive latch. The guard marks
    /// the page dirty when dropped.
    pub fn fetch_page_write(self: &Arc<Self>, page_id: PageId) -> Option<WritePageGuard> {
        Some(self.fetch_page_basic(page_id)?.upgrade_write())
    }

    /// Allocates a fresh page wrapped in an unpinning guard.
    pub fn new_page_guarded(self: &Arc<Self>) -> Option<PageGuard> {
        let page = self.new_page()?;
        Some(PageGuard::new(Arc::clone(self), page))
    }

    /// Frame acquisition shared by `new_page` and `fetch_page` misses:
    /// free list first, then eviction with synchronous write-back of dirty
    /// victims. The pool mutex is held throughout, completion wait
    /// included.
    fn acquire_frame(&self, state: &mut PoolState) -> Option<FrameId> {
        if let Some(frame_id) = state.free_list.pop() {
            return Some(frame_id);
        }

        let frame_id = self.replacer.evict()?;
        let page = &self.pages[frame_id];
        let victim_id = page.page_id();

        if page.is_dirty() {
            let (request, done) = DiskRequest::write(victim_id, page.snapshot());
            self.scheduler.schedule(request);
            if let Err(err) = done.wait() {
                log::error!("write-back of page {victim_id} during eviction failed: {err:#}");
                // The page keeps its frame; re-track it so it stays reachable
                // by future evictions.
                self.replacer.record_access(frame_id, AccessType::Unknown);
                return None;
            }
        }

        state.page_table.remove(&victim_id);
        log::debug!("page {victim_id} evicted from frame {frame_id}");
        Some(frame_id)
    }

    fn flush_resident(&self, state: &PoolState, page_id: PageId) -> bool {
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };
        let page = &self.pages[frame_id];
        let (request, done) = DiskRequest::write(page_id, page.snapshot());
        self.scheduler.schedule(request);
        if let Err(err) = done.wait() {
            log::error!("flush of page {page_id} failed: {err:#}");
            return false;
        }
        page.set_dirty(false);
        true
    }

    /// Monotonic page-id allocation. Reclamation of deleted ids is left to
    /// a disk-space allocator outside this layer.
    fn allocate_page(&self) -> PageId {
        self.next_page_id.fetch_add(1, Ordering::Relaxed)
    }

    fn deallocate_page(&self, _page_id: PageId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDiskManager;

    fn pool(pool_size: usize, k: usize) -> Arc<BufferPoolManager> {
        let bpm = BufferPoolManager::new(pool_size, k, Arc::new(MemoryDiskManager::new()));
        Arc::new(bpm.unwrap())
    }

    #[test]
    fn test_new_page_starts_pinned_and_clean() {
        let bpm = pool(4, 2);
        let page = bpm.new_page().unwrap();
        assert_eq!(page.page_id(), 0);
        assert_eq!(page.pin_count(), 1);
        assert!(!page.is_dirty());
        assert!(page.read().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fetch_hit_returns_same_frame_and_pins() {
        let bpm = pool(4, 2);
        let page = bpm.new_page().unwrap();
        let page_id = page.page_id();

        let again = bpm.fetch_page(page_id, AccessType::Lookup).unwrap();
        assert_eq!(again.frame_id(), page.frame_id());
        assert_eq!(bpm.get_pin_count(page_id), Some(2));
    }

    #[test]
    fn test_pool_exhaustion_fails_new_page() {
        let bpm = pool(3, 2);
        let pages: Vec<_> = (0..3).map(|_| bpm.new_page().unwrap()).collect();
        assert!(bpm.new_page().is_none());

        // Unpinning one page frees up a victim.
        assert!(bpm.unpin_page(pages[0].page_id(), false, AccessType::Unknown));
        assert!(bpm.new_page().is_some());
    }

    #[test]
    fn test_eviction_writes_back_dirty_page() {
        let manager = Arc::new(MemoryDiskManager::new());
        let bpm = Arc::new(BufferPoolManager::new(1, 2, Arc::clone(&manager) as Arc<dyn DiskManager>).unwrap());

        let page = bpm.new_page().unwrap();
        let page_id = page.page_id();
        page.write()[..2].copy_from_slice(b"hi");
        assert!(bpm.unpin_page(page_id, true, AccessType::Unknown));

        // Forces the dirty page out of the single frame.
        let other = bpm.new_page().unwrap();
        assert_ne!(other.page_id(), page_id);
        assert_eq!(manager.page_count(), 1);

        assert!(bpm.unpin_page(other.page_id(), false, AccessType::Unknown));
        let reread = bpm.fetch_page(page_id, AccessType::Lookup).unwrap();
        assert_eq!(&reread.read()[..2], b"hi");
    }

    #[test]
    fn test_unpin_failures() {
        let bpm = pool(4, 2);
        assert!(!bpm.unpin_page(99, false, AccessType::Unknown));

        let page = bpm.new_page().unwrap();
        let page_id = page.page_id();
        assert!(bpm.unpin_page(page_id, false, AccessType::Unknown));
        // Pin count is already zero.
        assert!(!bpm.unpin_page(page_id, false, AccessType::Unknown));
    }

    #[test]
    fn test_unpin_dirty_flag_is_sticky() {
        let bpm = pool(4, 2);
        let page = bpm.new_page().unwrap();
        let page_id = page.page_id();
        bpm.fetch_page(page_id, AccessType::Unknown).unwrap();

        assert!(bpm.unpin_page(page_id, true, AccessType::Unknown));
        // A later clean unpin must not clear the dirty bit.
        assert!(bpm.unpin_page(page_id, false, AccessType::Unknown));
        assert!(page.is_dirty());
    }

    #[test]
    fn test_flush_page_clears_dirty() {
        let manager = Arc::new(MemoryDiskManager::new());
        let bpm = Arc::new(BufferPoolManager::new(4, 2, Arc::clone(&manager) as Arc<dyn DiskManager>).unwrap());

        let page = bpm.new_page().unwrap();
        let page_id = page.page_id();
        page.write()[0] = 1;
        bpm.unpin_page(page_id, true, AccessType::Unknown);

        assert!(bpm.flush_page(page_id));
        assert!(!page.is_dirty());
        assert_eq!(manager.page_count(), 1);

        assert!(!bpm.flush_page(INVALID_PAGE_ID));
        assert!(!bpm.flush_page(12345));
    }

    #[test]
    fn test_flush_all_pages_covers_every_resident_page() {
        let manager = Arc::new(MemoryDiskManager::new());
        let bpm = Arc::new(BufferPoolManager::new(4, 2, Arc::clone(&manager) as Arc<dyn DiskManager>).unwrap());
        for _ in 0..3 {
            let page = bpm.new_page().unwrap();
            bpm.unpin_page(page.page_id(), true, AccessType::Unknown);
        }
        bpm.flush_all_pages();
        assert_eq!(manager.page_count(), 3);
    }

    #[test]
    fn test_delete_page_rules() {
        let bpm = pool(4, 2);
        let page = bpm.new_page().unwrap();
        let page_id = page.page_id();

        // Pinned pages cannot be deleted.
        assert!(!bpm.delete_page(page_id));

        bpm.unpin_page(page_id, false, AccessType::Unknown);
        assert!(bpm.delete_page(page_id));
        assert_eq!(bpm.get_pin_count(page_id), None);

        // Deleting an absent page is vacuous success.
        assert!(bpm.delete_page(page_id));
    }

    #[test]
    fn test_deleted_frame_is_reusable() {
        let bpm = pool(1, 2);
        let page = bpm.new_page().unwrap();
        let page_id = page.page_id();
        bpm.unpin_page(page_id, false, AccessType::Unknown);
        assert!(bpm.delete_page(page_id));

        // The single frame went back to the free list.
        let next = bpm.new_page().unwrap();
        assert_ne!(next.page_id(), page_id);
        assert_eq!(next.pin_count(), 1);
    }
}
