//! # Disk Scheduler
//!
//! A single background worker that serializes all disk traffic for the
//! buffer pool. Callers build a [`DiskRequest`], keep its
//! [`CompletionWaiter`], and hand the request to [`DiskScheduler::schedule`],
//! which never blocks. The worker drains the queue in submission order, so
//! two requests against the same page are always applied in the order they
//! were scheduled.
//!
//! ## Request Flow
//!
//! ```text
//! caller                    queue                worker thread
//!   │  schedule(request) ──► mpsc ──► recv ──► read_page / write_page
//!   │                                              │
//!   └──────── waiter.wait() ◄── completion ◄── settle(buffer)
//! ```
//!
//! The page buffer travels *inside* the request and comes back through the
//! completion: reads hand the worker a scratch buffer and receive it back
//! filled, writes hand over the bytes to persist. No buffer is ever shared
//! mutably between threads.
//!
//! ## Shutdown
//!
//! Dropping the scheduler posts a `None` sentinel and joins the worker. The
//! queue is drained first (the channel is FIFO), so every request scheduled
//! before the drop still settles its completion.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::JoinHandle;
use std::{sync::Arc, thread};

use eyre::{eyre, Result, WrapErr};

use super::disk::DiskManager;
use super::page::{PageBuf, PageId};

/// One disk operation. `data` is the full page buffer: the payload for a
/// write, a scratch buffer to be filled for a read.
pub struct DiskRequest {
    pub is_write: bool,
    pub data: Box<PageBuf>,
    pub page_id: PageId,
    pub completion: Completion,
}

impl DiskRequest {
    /// Builds a read request for `page_id` together with its waiter.
    pub fn read(page_id: PageId, buf: Box<PageBuf>) -> (Self, CompletionWaiter) {
        let (completion, waiter) = Completion::pair();
        (
            Self {
                is_write: false,
                data: buf,
                page_id,
                completion,
            },
            waiter,
        )
    }

    /// Builds a write request persisting `data` as `page_id`.
    pub fn write(page_id: PageId, data: Box<PageBuf>) -> (Self, CompletionWaiter) {
        let (completion, waiter) = Completion::pair();
        (
            Self {
                is_write: true,
                data,
                page_id,
                completion,
            },
            waiter,
        )
    }
}

/// The settle half of a one-shot completion signal. Consumed by `settle`,
/// so a request can only ever be fulfilled once.
pub struct Completion {
    tx: SyncSender<Result<Box<PageBuf>>>,
}

/// The await half of a one-shot completion signal.
pub struct CompletionWaiter {
    rx: Receiver<Result<Box<PageBuf>>>,
}

impl Completion {
    /// Creates a connected settle/wait pair.
    pub fn pair() -> (Completion, CompletionWaiter) {
        // Capacity 1 so the worker never blocks on settle.
        let (tx, rx) = mpsc::sync_channel(1);
        (Completion { tx }, CompletionWaiter { rx })
    }

    /// Fulfills the completion, handing the request buffer (or the I/O
    /// error) back to the waiter. A vanished waiter is not an error.
    pub fn settle(self, result: Result<Box<PageBuf>>) {
        let _ = self.tx.send(result);
    }
}

impl CompletionWaiter {
    /// Blocks until the worker settles the request, yielding the buffer.
    pub fn wait(self) -> Result<Box<PageBuf>> {
        self.rx
            .recv()
            .map_err(|_| eyre!("disk scheduler dropped a request without settling it"))?
    }
}

/// Owns the request queue and the background I/O worker.
pub struct DiskScheduler {
    queue: mpsc::Sender<Option<DiskRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    /// Spawns the worker thread over the given disk manager. Fails if the
    /// OS refuses the thread.
    pub fn new(manager: Arc<dyn DiskManager>) -> Result<Self> {
        let (queue, requests) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("opaldb-disk-io".into())
            .spawn(move || Self::worker_loop(requests, manager))
            .wrap_err("failed to spawn disk scheduler worker")?;
        Ok(Self {
            queue,
            worker: Some(worker),
        })
    }

    /// Enqueues a request. Never blocks; the caller synchronizes with disk
    /// state through the request's completion.
    pub fn schedule(&self, request: DiskRequest) {
        // Cannot fail by construction: the worker owns the receiver and
        // only exits on the `None` sentinel, which is sent nowhere but in
        // `Drop` (after which no `&self` can call this).
        self.queue
            .send(Some(request))
            .expect("disk scheduler worker terminated early");
    }

    fn worker_loop(requests: Receiver<Option<DiskRequest>>, manager: Arc<dyn DiskManager>) {
        while let Ok(Some(request)) = requests.recv() {
            let DiskRequest {
                is_write,
                mut data,
                page_id,
                completion,
            } = request;

            let result = if is_write {
                manager.write_page(page_id, &data)
            } else {
                manager.read_page(page_id, &mut data)
            };

            match result {
                Ok(()) => completion.settle(Ok(data)),
                Err(err) => {
                    log::error!(
                        "disk {} for page {page_id} failed: {err:#}",
                        if is_write { "write" } else { "read" }
                    );
                    completion.settle(Err(err));
                }
            }
        }
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        // Sentinel terminates the worker loop after the queue drains.
        let _ = self.queue.send(None);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
