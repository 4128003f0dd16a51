//! Shared stream data buffers
//!
//! One [`StreamData`] is created per frame and cloned into every client
//! pipe. Clones share the same allocation; when the last clone is dropped
//! the frame is released from the queue statistics.

use std::sync::Arc;

use bytes::Bytes;

use crate::protocol::StreamId;
use crate::stats::QueueStatAccumulator;

struct DataInner {
    stream_id: StreamId,
    mm_time: u32,
    payload: Bytes,
    queue: Arc<QueueStatAccumulator>,
}

impl Drop for DataInner {
    fn drop(&mut self) {
        self.queue.dequeue(self.payload.len() as u64);
    }
}

/// One encoded frame shared across all client pipes
///
/// Cheap to clone. The frame counts as queued from construction until the
/// last clone is dropped.
#[derive(Clone)]
pub struct StreamData {
    inner: Arc<DataInner>,
}

impl StreamData {
    /// Wrap `payload` and account for it in `queue`
    pub(crate) fn new(
        stream_id: StreamId,
        mm_time: u32,
        payload: Bytes,
        queue: Arc<QueueStatAccumulator>,
    ) -> Self {
        queue.enqueue(payload.len() as u64);
        Self {
            inner: Arc::new(DataInner {
                stream_id,
                mm_time,
                payload,
                queue,
            }),
        }
    }

    /// Stream this frame belongs to
    pub fn stream_id(&self) -> StreamId {
        self.inner.stream_id
    }

    /// Multimedia timestamp in milliseconds
    pub fn mm_time(&self) -> u32 {
        self.inner.mm_time
    }

    /// Encoded payload
    pub fn data(&self) -> &Bytes {
        &self.inner.payload
    }

    pub fn len(&self) -> usize {
        self.inner.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.payload.is_empty()
    }

    /// Number of live references to this frame
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl std::fmt::Debug for StreamData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamData")
            .field("stream_id", &self.inner.stream_id)
            .field("mm_time", &self.inner.mm_time)
            .field("len", &self.inner.payload.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_on_last_drop() {
        let queue = Arc::new(QueueStatAccumulator::new());
        let data = StreamData::new(
            StreamId::FIRST,
            1234,
            Bytes::from_static(&[1, 2, 3, 4]),
            Arc::clone(&queue),
        );
        assert_eq!(queue.current().num_items, 1);
        assert_eq!(queue.current().size_bytes, 4);

        let a = data.clone();
        let b = data.clone();
        assert_eq!(data.holders(), 3);

        drop(data);
        drop(a);
        assert_eq!(queue.current().num_items, 1);

        drop(b);
        assert!(queue.current().is_empty());
    }

    #[test]
    fn test_clones_share_payload() {
        let queue = Arc::new(QueueStatAccumulator::new());
        let data = StreamData::new(
            StreamId::FIRST,
            0,
            Bytes::from(vec![7u8; 1024]),
            Arc::clone(&queue),
        );
        let clone = data.clone();

        assert_eq!(data.data().as_ptr(), clone.data().as_ptr());
        assert_eq!(clone.len(), 1024);
        assert_eq!(clone.mm_time(), 0);
    }
}
