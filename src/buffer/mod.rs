//! # Buffer Module
//!
//! The buffered page cache: a fixed set of in-memory frames fronting the
//! disk, with LRU-K eviction and pin-count protection.
//!
//! ## Data Flow
//!
//! ```text
//! caller ──fetch_page(id)──► BufferPoolManager
//!                              │ hit: pin++, record access
//!                              │ miss: free frame / evict victim
//!                              │       (dirty victim written back)
//!                              │       read page via DiskScheduler
//!                              ▼
//!                            Page (pinned) ──wrap──► PageGuard family
//! ```
//!
//! ## Module Organization
//!
//! - `replacer`: the [`LruKReplacer`] eviction policy
//! - `pool`: the [`BufferPoolManager`]
//! - `guard`: RAII [`PageGuard`]/[`ReadPageGuard`]/[`WritePageGuard`]
//!   handles that unpin (and unlatch) on drop

mod guard;
mod pool;
mod replacer;

pub use guard::{PageGuard, ReadPageGuard, WritePageGuard};
pub use pool::BufferPoolManager;
pub use replacer::{AccessType, LruKReplacer};
