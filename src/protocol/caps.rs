//! Display channel capability bits
//!
//! Clients advertise these during the capability handshake. The channel
//! uses them to gate optional messages and to negotiate codecs.

use bitflags::bitflags;

bitflags! {
    /// Remote display capabilities, one bit per capability index
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DisplayCaps: u32 {
        const SIZED_STREAM = 1 << 0;
        const MONITORS_CONFIG = 1 << 1;
        const COMPOSITE = 1 << 2;
        const A8_SURFACE = 1 << 3;
        const STREAM_REPORT = 1 << 4;
        const LZ4_COMPRESSION = 1 << 5;
        const PREF_COMPRESSION = 1 << 6;
        const GL_SCANOUT = 1 << 7;
        const MULTI_CODEC = 1 << 8;
        const CODEC_MJPEG = 1 << 9;
        const CODEC_VP8 = 1 << 10;
        const CODEC_H264 = 1 << 11;
        const PREF_VIDEO_CODEC_TYPE = 1 << 12;
        const CODEC_VP9 = 1 << 13;
        const CODEC_H265 = 1 << 14;
        const METRICS = 1 << 15;
    }
}

impl DisplayCaps {
    /// Capabilities the stream channel itself advertises
    pub const fn server() -> Self {
        DisplayCaps::MONITORS_CONFIG.union(DisplayCaps::STREAM_REPORT)
    }
}
