//! Outstanding stream data accounting
//!
//! Every frame handed to the channel is counted here until the last
//! client holding it has finished sending it. The producer watches these
//! numbers to throttle capture.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Frames queued towards clients and not yet released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStat {
    pub num_items: u32,
    pub size_bytes: u64,
}

impl QueueStat {
    pub fn is_empty(&self) -> bool {
        self.num_items == 0 && self.size_bytes == 0
    }
}

/// Producer notification fired after every enqueue and dequeue
pub type QueueStatCallback = Box<dyn FnMut(QueueStat) + Send>;

/// Queue occupancy counter shared by the channel and its data buffers
///
/// Data buffers may be released from whichever task finishes sending
/// them last. Counters and callback share one mutex and the callback runs
/// with it held, so notifications are delivered in the order the changes
/// happened and the last one always matches [`current`](Self::current).
/// The callback must not call back into the accumulator or drop stream
/// data.
#[derive(Default)]
pub struct QueueStatAccumulator {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    stat: QueueStat,
    callback: Option<QueueStatCallback>,
}

impl Inner {
    fn notify(&mut self) {
        let stat = self.stat;
        if let Some(callback) = self.callback.as_mut() {
            callback(stat);
        }
    }
}

impl QueueStatAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the producer callback, replacing any previous one
    pub fn set_callback(&self, callback: QueueStatCallback) {
        lock(&self.inner).callback = Some(callback);
    }

    /// Current occupancy
    pub fn current(&self) -> QueueStat {
        lock(&self.inner).stat
    }

    /// Account for a new data item of `size` bytes
    pub fn enqueue(&self, size: u64) {
        let mut inner = lock(&self.inner);
        inner.stat.num_items += 1;
        inner.stat.size_bytes += size;
        tracing::trace!(
            items = inner.stat.num_items,
            bytes = inner.stat.size_bytes,
            added = size,
            "Queue stat: item added"
        );
        inner.notify();
    }

    /// Account for the release of a data item of `size` bytes
    pub fn dequeue(&self, size: u64) {
        let mut inner = lock(&self.inner);
        let stat = inner.stat;
        match (stat.num_items.checked_sub(1), stat.size_bytes.checked_sub(size)) {
            (Some(items), Some(bytes)) => {
                inner.stat = QueueStat {
                    num_items: items,
                    size_bytes: bytes,
                };
            }
            _ => {
                tracing::error!(
                    items = stat.num_items,
                    bytes = stat.size_bytes,
                    released = size,
                    "Queue stat underflow, release without matching enqueue"
                );
                return;
            }
        }
        tracing::trace!(
            items = inner.stat.num_items,
            bytes = inner.stat.size_bytes,
            removed = size,
            "Queue stat: item released"
        );
        inner.notify();
    }
}

impl std::fmt::Debug for QueueStatAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueStatAccumulator")
            .field("stat", &self.current())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
