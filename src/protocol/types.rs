//! Identity and geometry types shared by the channel and its clients

use super::codec::VideoCodec;
use super::constants::NUM_STREAMS;

/// Identity of one encoded stream, always below [`NUM_STREAMS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u32);

impl StreamId {
    /// Id given to the first stream of a channel
    pub const FIRST: StreamId = StreamId(0);

    /// Build an id from its wire value, `None` when out of range
    pub fn new(id: u32) -> Option<Self> {
        (id < NUM_STREAMS).then_some(StreamId(id))
    }

    /// Id following `current`, or the first id when there is none
    pub fn after(current: Option<StreamId>) -> StreamId {
        match current {
            Some(StreamId(id)) => StreamId((id + 1) % NUM_STREAMS),
            None => StreamId::FIRST,
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Size of the primary surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A geometry with a zero side describes no surface at all
    pub fn non_empty(width: u32, height: u32) -> Option<Self> {
        (width != 0 && height != 0).then_some(Self { width, height })
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Format the producer announces for a new stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub width: u32,
    pub height: u32,
    pub codec: VideoCodec,
}

impl StreamFormat {
    pub fn new(width: u32, height: u32, codec: VideoCodec) -> Self {
        Self {
            width,
            height,
            codec,
        }
    }

    pub fn geometry(&self) -> Option<Geometry> {
        Geometry::non_empty(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_wraps() {
        let mut id = StreamId::after(None);
        assert_eq!(id, StreamId::FIRST);
        for _ in 0..NUM_STREAMS {
            id = StreamId::after(Some(id));
        }
        assert_eq!(id, StreamId::FIRST);
        assert_eq!(StreamId::after(StreamId::new(NUM_STREAMS - 1)), StreamId::FIRST);
    }

    #[test]
    fn test_stream_id_range() {
        assert!(StreamId::new(NUM_STREAMS - 1).is_some());
        assert!(StreamId::new(NUM_STREAMS).is_none());
    }

    #[test]
    fn test_empty_geometry() {
        assert!(Geometry::non_empty(0, 600).is_none());
        assert!(Geometry::non_empty(800, 0).is_none());
        assert_eq!(Geometry::non_empty(800, 600), Some(Geometry::new(800, 600)));
    }
}
