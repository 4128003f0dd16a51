//! Client playback metrics
//!
//! Clients report bucketed counters (frames or bytes seen over a duration)
//! for the stream they are playing. The server normalizes them to
//! per-second rates before smoothing.

/// Kind of metric carried by a metric report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MetricKind {
    FramesReceivedPerSecond = 1,
    FramesDecodedPerSecond = 2,
    FramesDisplayedPerSecond = 3,
    FramesDroppedPerSecond = 4,
    BytesReceivedPerSecond = 5,
    BytesDecodedPerSecond = 6,
    BytesDisplayedPerSecond = 7,
    BytesDroppedPerSecond = 8,
    DecoderQueueLength = 9,
}

/// Groups of metrics handled alike by smart streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFamily {
    /// Received, decoded and displayed frames per second
    FrameRate,
    /// Received, decoded and displayed bytes per second
    ByteRate,
    DroppedFrames,
    DroppedBytes,
    QueueLength,
}

impl MetricKind {
    /// Number of known metric kinds
    pub const COUNT: usize = 9;

    /// Every known kind in id order
    pub const ALL: [MetricKind; Self::COUNT] = [
        MetricKind::FramesReceivedPerSecond,
        MetricKind::FramesDecodedPerSecond,
        MetricKind::FramesDisplayedPerSecond,
        MetricKind::FramesDroppedPerSecond,
        MetricKind::BytesReceivedPerSecond,
        MetricKind::BytesDecodedPerSecond,
        MetricKind::BytesDisplayedPerSecond,
        MetricKind::BytesDroppedPerSecond,
        MetricKind::DecoderQueueLength,
    ];

    /// Look up a kind by its wire id; `0` (invalid) and ids past the last
    /// known metric yield `None`
    pub fn from_id(id: u32) -> Option<Self> {
        let index = id.checked_sub(1)? as usize;
        Self::ALL.get(index).copied()
    }

    /// Wire id
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Dense index, `0..COUNT`
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn family(self) -> MetricFamily {
        match self {
            MetricKind::FramesReceivedPerSecond
            | MetricKind::FramesDecodedPerSecond
            | MetricKind::FramesDisplayedPerSecond => MetricFamily::FrameRate,
            MetricKind::FramesDroppedPerSecond => MetricFamily::DroppedFrames,
            MetricKind::BytesReceivedPerSecond
            | MetricKind::BytesDecodedPerSecond
            | MetricKind::BytesDisplayedPerSecond => MetricFamily::ByteRate,
            MetricKind::BytesDroppedPerSecond => MetricFamily::DroppedBytes,
            MetricKind::DecoderQueueLength => MetricFamily::QueueLength,
        }
    }

    /// Name used in log output
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::FramesReceivedPerSecond => "received_fps",
            MetricKind::FramesDecodedPerSecond => "decoded_fps",
            MetricKind::FramesDisplayedPerSecond => "displayed_fps",
            MetricKind::FramesDroppedPerSecond => "dropped_fps",
            MetricKind::BytesReceivedPerSecond => "received_bps",
            MetricKind::BytesDecodedPerSecond => "decoded_bps",
            MetricKind::BytesDisplayedPerSecond => "displayed_bps",
            MetricKind::BytesDroppedPerSecond => "dropped_bps",
            MetricKind::DecoderQueueLength => "queue_length",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A metric report as received from a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricReport {
    /// Stream the client measured
    pub stream_id: u32,
    /// Raw metric id, may be unknown to this server
    pub metric_id: u32,
    /// Bucketed counter value
    pub value: u32,
    /// Bucket duration in milliseconds
    pub duration_ms: u32,
}

impl MetricReport {
    pub fn new(stream_id: u32, kind: MetricKind, value: u32, duration_ms: u32) -> Self {
        Self {
            stream_id,
            metric_id: kind.id(),
            value,
            duration_ms,
        }
    }

    pub fn kind(&self) -> Option<MetricKind> {
        MetricKind::from_id(self.metric_id)
    }
}
