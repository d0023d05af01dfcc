//! # LRU-K Frame Replacer
//!
//! Eviction policy for the buffer pool. The replacer tracks every frame
//! that has been accessed and splits them by recorded access count:
//!
//! ```text
//! probation (count < k)          history (count >= k)
//! ┌───────────────────┐          ┌───────────────────┐
//! │ FIFO by first use │  ──k──►  │ LRU by last use   │
//! └───────────────────┘          └───────────────────┘
//!        evict scans here first        then here
//! ```
//!
//! A frame with fewer than `k` recorded accesses has an infinite backward
//! k-distance, so the probationary FIFO list is always scanned before the
//! promoted LRU list. Only after every probationary frame is pinned does
//! the policy fall back to classical LRU among the promoted frames.
//!
//! Pinning is expressed through evictability: the pool marks a frame
//! non-evictable while any caller holds a pin, and evictable again when the
//! pin count drops to zero. [`LruKReplacer::size`] counts evictable frames
//! only.
//!
//! All state lives behind one mutex; every public method is atomic.

use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::storage::FrameId;

/// Workload hint recorded together with each page access. The current
/// policy does not differentiate by it, but it is part of the recorded
/// interface and travels from the pool into every `record_access` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessType {
    #[default]
    Unknown,
    Lookup,
    Scan,
    Index,
}

#[derive(Default)]
struct ReplacerState {
    /// Frames with fewer than `k` accesses, oldest first access at the front.
    probation: VecDeque<FrameId>,
    /// Frames with at least `k` accesses, least recently used at the front.
    history: VecDeque<FrameId>,
    /// Total recorded accesses per tracked frame.
    counts: HashMap<FrameId, usize>,
    /// Frames currently exempt from eviction.
    non_evictable: HashSet<FrameId>,
    /// Tracked frames minus non-evictable ones.
    curr_size: usize,
}

fn remove_from(queue: &mut VecDeque<FrameId>, frame_id: FrameId) {
    if let Some(pos) = queue.iter().position(|&f| f == frame_id) {
        queue.remove(pos);
    }
}

/// LRU-K replacer over a fixed range of frame ids `0..num_frames`.
pub struct LruKReplacer {
    num_frames: usize,
    k: usize,
    state: Mutex<ReplacerState>,
}

impl LruKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "history window k must be at least 1");
        Self {
            num_frames,
            k,
            state: Mutex::new(ReplacerState::default()),
        }
    }

    fn check_frame(&self, frame_id: FrameId) {
        assert!(
            frame_id < self.num_frames,
            "frame id {frame_id} out of replacer range {}",
            self.num_frames
        );
    }

    /// Records one access to `frame_id`, promoting it to the LRU list once
    /// its count reaches `k`. A frame's first access makes it tracked and
    /// evictable.
    ///
    /// Aborts if `frame_id` is outside `0..num_frames`.
    pub fn record_access(&self, frame_id: FrameId, _access_type: AccessType) {
        self.check_frame(frame_id);
        let mut state = self.state.lock();

        let Some(&count) = state.counts.get(&frame_id) else {
            // First access. With a window of one the frame is already at k
            // and goes straight to the LRU list.
            if self.k == 1 {
                state.history.push_back(frame_id);
            } else {
                state.probation.push_back(frame_id);
            }
            state.counts.insert(frame_id, 1);
            state.curr_size += 1;
            return;
        };

        if count >= self.k {
            // Already promoted: LRU touch.
            remove_from(&mut state.history, frame_id);
            state.history.push_back(frame_id);
        } else if count + 1 == self.k {
            // Crosses the window: graduates from FIFO to LRU.
            remove_from(&mut state.probation, frame_id);
            state.history.push_back(frame_id);
        }
        state.counts.insert(frame_id, count + 1);
        log::trace!("frame {frame_id} access count now {}", count + 1);
    }

    /// Evicts the frame with the largest backward k-distance: the oldest
    /// evictable probationary frame if any, otherwise the least recently
    /// used evictable promoted frame. The chosen frame is forgotten
    /// entirely, history included.
    pub fn evict(&self) -> Option<FrameId> {
        let mut state = self.state.lock();
        if state.curr_size == 0 {
            return None;
        }

        let victim = state
            .probation
            .iter()
            .chain(state.history.iter())
            .copied()
            .find(|f| !state.non_evictable.contains(f))?;

        remove_from(&mut state.probation, victim);
        remove_from(&mut state.history, victim);
        state.counts.remove(&victim);
        state.curr_size -= 1;
        log::debug!("evicting frame {victim}");
        Some(victim)
    }

    /// Toggles whether `frame_id` may be evicted. Unknown frames and
    /// no-op toggles are ignored.
    ///
    /// Aborts if `frame_id` is outside `0..num_frames`.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        self.check_frame(frame_id);
        let mut state = self.state.lock();
        if !state.counts.contains_key(&frame_id) {
            return;
        }
        if evictable && state.non_evictable.remove(&frame_id) {
            state.curr_size += 1;
        } else if !evictable && state.non_evictable.insert(frame_id) {
            state.curr_size -= 1;
        }
    }

    /// Forgets `frame_id` and its history. Silent no-op on untracked or
    /// non-evictable frames; the pool only calls this after the pin count
    /// has reached zero (page deletion).
    ///
    /// Aborts if `frame_id` is outside `0..num_frames`.
    pub fn remove(&self, frame_id: FrameId) {
        self.check_frame(frame_id);
        let mut state = self.state.lock();
        if !state.counts.contains_key(&frame_id) || state.non_evictable.contains(&frame_id) {
            return;
        }
        remove_from(&mut state.probation, frame_id);
        remove_from(&mut state.history, frame_id);
        state.counts.remove(&frame_id);
        state.curr_size -= 1;
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.state.lock().curr_size
    }
}
