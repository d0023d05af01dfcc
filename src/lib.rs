//! # OpalDB - Storage Core of a Teaching Database
//!
//! OpalDB implements the two storage-management subsystems that carry the
//! classical systems disciplines:
//!
//! - **Copy-on-write trie** (`trie`): an immutable byte-string-keyed map.
//!   Mutations return new versions sharing untouched structure; any number
//!   of readers hold any set of versions with no synchronization.
//! - **Buffered page cache** (`buffer` + `storage`): a fixed set of
//!   in-memory frames over a disk file, with LRU-K eviction, pin-count
//!   protection, one background I/O worker, and RAII page guards for
//!   read/write latching.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use opaldb::{AccessType, BufferPoolManager, FileDiskManager, Trie};
//!
//! let disk = Arc::new(FileDiskManager::open("./opal.db")?);
//! let pool = Arc::new(BufferPoolManager::new(64, 2, disk)?);
//!
//! let mut guard = pool.new_page_guarded().expect("pool exhausted");
//! let page_id = guard.page_id();
//! let mut writer = guard.upgrade_write();
//! writer.data_mut()[..5].copy_from_slice(b"hello");
//! drop(writer); // marks dirty, unlatches, unpins
//!
//! let versioned = Trie::new().put(b"answer", 42u32);
//! assert_eq!(versioned.get::<u32>(b"answer"), Some(&42));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  PageGuard / ReadPageGuard / Write  │   RAII pins + latches
//! ├─────────────────────────────────────┤
//! │  BufferPoolManager                  │   page table · free list
//! │    └ LruKReplacer                   │   eviction policy
//! ├─────────────────────────────────────┤
//! │  DiskScheduler                      │   single ordered I/O worker
//! ├─────────────────────────────────────┤
//! │  DiskManager (file / in-memory)     │   read_page / write_page
//! └─────────────────────────────────────┘
//!
//! Trie ── independent, purely in-memory ── no I/O
//! ```
//!
//! ## Module Overview
//!
//! - [`trie`]: copy-on-write trie with typed, type-erased payloads
//! - [`buffer`]: buffer pool manager, LRU-K replacer, page guards
//! - [`storage`]: page frames, disk manager abstraction, disk scheduler
//! - [`config`]: page size and pool defaults with compile-time checks

pub mod buffer;
pub mod config;
pub mod storage;
pub mod trie;

pub use buffer::{
    AccessType, BufferPoolManager, LruKReplacer, PageGuard, ReadPageGuard, WritePageGuard,
};
pub use config::{DEFAULT_POOL_SIZE, DEFAULT_REPLACER_K, PAGE_SIZE};
pub use storage::{
    DiskManager, DiskRequest, DiskScheduler, FileDiskManager, FrameId, MemoryDiskManager, Page,
    PageId, INVALID_PAGE_ID,
};
pub use trie::Trie;
