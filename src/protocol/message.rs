//! Display channel messages
//!
//! These are the typed forms of the messages exchanged with a client.
//! Marshalling them to bytes is the transport's job.

use bitflags::bitflags;

use crate::channel::StreamData;

use super::codec::VideoCodec;
use super::metric::MetricReport;
use super::types::{Geometry, StreamFormat, StreamId};

bitflags! {
    /// Primary surface flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SurfaceFlags: u32 {
        const PRIMARY = 1 << 0;
        /// Hint that the surface only ever carries a video stream
        const STREAMING_MODE = 1 << 1;
    }
}

bitflags! {
    /// Stream creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StreamFlags: u8 {
        const TOP_DOWN = 1 << 0;
    }
}

/// Pixel format of the primary surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SurfaceFormat {
    Xrgb32 = 32,
}

/// Raster operation of a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RopDescriptor {
    Put,
}

/// Axis-aligned rectangle, edges exclusive on the right and bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    pub fn covering(geometry: Geometry) -> Self {
        Self {
            left: 0,
            top: 0,
            right: geometry.width,
            bottom: geometry.height,
        }
    }
}

/// One monitor head mapped onto a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorHead {
    pub monitor_id: u32,
    pub surface_id: u32,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceCreate {
    pub surface_id: u32,
    pub width: u32,
    pub height: u32,
    pub format: SurfaceFormat,
    pub flags: SurfaceFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorsConfig {
    pub max_allowed: u16,
    pub heads: Vec<MonitorHead>,
}

/// Solid color fill of a surface area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawFill {
    pub surface_id: u32,
    pub area: Rect,
    /// Solid brush color, 0 is black
    pub color: u32,
    pub rop: RopDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamCreate {
    pub id: StreamId,
    pub flags: StreamFlags,
    pub codec: VideoCodec,
    pub stream_width: u32,
    pub stream_height: u32,
    pub src_width: u32,
    pub src_height: u32,
    pub dest: Rect,
}

impl StreamCreate {
    /// Full-surface stream of `format`
    pub fn new(id: StreamId, format: StreamFormat) -> Self {
        Self {
            id,
            flags: StreamFlags::TOP_DOWN,
            codec: format.codec,
            stream_width: format.width,
            stream_height: format.height,
            src_width: format.width,
            src_height: format.height,
            dest: Rect::covering(Geometry::new(format.width, format.height)),
        }
    }
}

/// Parameters of a report or metrics activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamActivation {
    pub stream_id: StreamId,
    pub unique_id: u32,
    pub max_window_size: u32,
    pub timeout_ms: u32,
}

/// Messages sent from the channel to a client
#[derive(Debug, Clone)]
pub enum ServerMessage {
    SurfaceCreate(SurfaceCreate),
    SurfaceDestroy { surface_id: u32 },
    MonitorsConfig(MonitorsConfig),
    DrawFill(DrawFill),
    /// Surface content is complete and may be shown
    Mark,
    StreamCreate(StreamCreate),
    /// One encoded frame; the payload is shared with every other client
    StreamData(StreamData),
    StreamDestroy { id: StreamId },
    StreamActivateReport(StreamActivation),
    StreamActivateMetrics {
        activation: StreamActivation,
        last_known_metric: u32,
    },
}

impl ServerMessage {
    /// Short message name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ServerMessage::SurfaceCreate(_) => "surface_create",
            ServerMessage::SurfaceDestroy { .. } => "surface_destroy",
            ServerMessage::MonitorsConfig(_) => "monitors_config",
            ServerMessage::DrawFill(_) => "draw_fill",
            ServerMessage::Mark => "mark",
            ServerMessage::StreamCreate(_) => "stream_create",
            ServerMessage::StreamData(_) => "stream_data",
            ServerMessage::StreamDestroy { .. } => "stream_destroy",
            ServerMessage::StreamActivateReport(_) => "stream_activate_report",
            ServerMessage::StreamActivateMetrics { .. } => "stream_activate_metrics",
        }
    }
}

/// Messages a client sends to the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Init,
    PreferredCompression(u8),
    PreferredVideoCodecs(Vec<u8>),
    /// Playback progress report
    StreamReport {
        stream_id: u32,
        unique_id: u32,
        start_frame_mm_time: u32,
        end_frame_mm_time: u32,
        num_frames: u32,
        num_drops: u32,
        last_frame_delay: i32,
        audio_delay: u32,
    },
    StreamMetric(MetricReport),
    /// Only ever sent by the server; a client sending it is a violation
    GlDrawDone,
    Unknown(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_create_covers_format() {
        let id = StreamId::FIRST;
        let msg = StreamCreate::new(id, StreamFormat::new(800, 600, VideoCodec::H264));
        assert_eq!(msg.flags, StreamFlags::TOP_DOWN);
        assert_eq!((msg.stream_width, msg.stream_height), (800, 600));
        assert_eq!((msg.src_width, msg.src_height), (800, 600));
        assert_eq!(msg.dest.right, 800);
        assert_eq!(msg.dest.bottom, 600);
    }

    #[test]
    fn test_message_names() {
        assert_eq!(ServerMessage::Mark.name(), "mark");
        let msg = ServerMessage::StreamDestroy {
            id: StreamId::FIRST,
        };
        assert_eq!(msg.name(), "stream_destroy");
    }
}
