//! # OpalDB Configuration Constants
//!
//! This module centralizes the configuration constants of the storage core.
//! Constants that depend on each other are co-located to prevent mismatch
//! bugs, and the derivations are enforced with compile-time assertions.
//!
//! ## Dependency Graph
//!
//! ```text
//! PAGE_SIZE (4096 bytes)
//!       │
//!       └─> Every frame buffer, disk request buffer, and on-disk page
//!           is exactly this many bytes. The disk manager computes file
//!           offsets as page_id * PAGE_SIZE.
//!
//! DEFAULT_POOL_SIZE (64 frames)
//!       │
//!       └─> Upper bound on simultaneously pinned pages. A workload that
//!           pins more pages than this will see new_page/fetch_page fail
//!           once the free list and every evictable frame are exhausted.
//!
//! DEFAULT_REPLACER_K (2)
//!       │
//!       └─> Frames with fewer than k recorded accesses are evicted FIFO;
//!           frames at or above k fall back to classical LRU.
//! ```
//!
//! ## Modifying Constants
//!
//! Before changing any constant:
//! 1. Check the dependency graph above
//! 2. Run `cargo build` to verify the compile-time assertions
//! 3. Run the full test suite

// ============================================================================
// PAGE LAYOUT
// ============================================================================

/// Size of each database page in bytes (4KB).
/// This is the fundamental unit of I/O and caching.
pub const PAGE_SIZE: usize = 4096;

const _: () = assert!(PAGE_SIZE.is_power_of_two(), "PAGE_SIZE must be a power of two");

// ============================================================================
// BUFFER POOL
// ============================================================================

/// Default number of frames in the buffer pool.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Default history window of the LRU-K replacer.
pub const DEFAULT_REPLACER_K: usize = 2;

const _: () = assert!(DEFAULT_POOL_SIZE >= 1, "pool must hold at least one frame");

const _: () = assert!(
    DEFAULT_REPLACER_K >= 1,
    "a zero history window would never promote a frame out of the FIFO list"
);
