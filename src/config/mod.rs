//! Configuration constants for the storage core.
//!
//! The `constants` submodule documents the full dependency graph between
//! values; everything is re-exported here.

mod constants;

pub use constants::{DEFAULT_POOL_SIZE, DEFAULT_REPLACER_K, PAGE_SIZE};
