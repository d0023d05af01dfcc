//! # Storage Module
//!
//! The foundational storage layer of OpalDB: page frames, the disk manager
//! abstraction, and the background disk scheduler.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │   BufferPoolManager (buffer)     │
//! ├──────────────────────────────────┤
//! │   Page frames (page)             │   fixed-size buffers + metadata
//! ├──────────────────────────────────┤
//! │   DiskScheduler (scheduler)      │   single worker, ordered I/O
//! ├──────────────────────────────────┤
//! │   DiskManager (disk)             │   read_page / write_page primitive
//! └──────────────────────────────────┘
//! ```
//!
//! All I/O moves whole pages of [`PAGE_SIZE`] bytes. The scheduler is the
//! only component that touches a [`DiskManager`]; the pool above it only
//! ever sees completions.
//!
//! ## Module Organization
//!
//! - `page`: the [`Page`] frame type and page/frame id aliases
//! - `disk`: the [`DiskManager`] trait plus file-backed and in-memory
//!   implementations
//! - `scheduler`: the [`DiskScheduler`] worker and its completion primitive

mod disk;
mod page;
mod scheduler;

pub use disk::{DiskManager, FileDiskManager, MemoryDiskManager};
pub use page::{FrameId, Page, PageBuf, PageId, INVALID_PAGE_ID};
pub use scheduler::{Completion, CompletionWaiter, DiskRequest, DiskScheduler};

pub use crate::config::PAGE_SIZE;
