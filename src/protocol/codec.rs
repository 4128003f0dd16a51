//! Video codec ids and codec negotiation
//!
//! The producer is asked to encode with a codec every connected client can
//! decode. MJPEG is the baseline: it is always offered, even when a client
//! does not advertise it.

use super::caps::DisplayCaps;

/// Video codecs known to the display protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum VideoCodec {
    Mjpeg = 1,
    Vp8 = 2,
    H264 = 3,
    Vp9 = 4,
    H265 = 5,
}

impl VideoCodec {
    /// Every known codec in id order
    pub const ALL: [VideoCodec; 5] = [
        VideoCodec::Mjpeg,
        VideoCodec::Vp8,
        VideoCodec::H264,
        VideoCodec::Vp9,
        VideoCodec::H265,
    ];

    /// Codec every client is assumed to decode
    pub const BASELINE: VideoCodec = VideoCodec::Mjpeg;

    /// Look up a codec by its wire id
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Wire id
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Capability bit a client sets to announce support for this codec
    pub fn cap(self) -> DisplayCaps {
        match self {
            VideoCodec::Mjpeg => DisplayCaps::CODEC_MJPEG,
            VideoCodec::Vp8 => DisplayCaps::CODEC_VP8,
            VideoCodec::H264 => DisplayCaps::CODEC_H264,
            VideoCodec::Vp9 => DisplayCaps::CODEC_VP9,
            VideoCodec::H265 => DisplayCaps::CODEC_H265,
        }
    }

    /// Short codec name
    pub fn name(self) -> &'static str {
        match self {
            VideoCodec::Mjpeg => "mjpeg",
            VideoCodec::Vp8 => "vp8",
            VideoCodec::H264 => "h264",
            VideoCodec::Vp9 => "vp9",
            VideoCodec::H265 => "h265",
        }
    }
}

impl std::fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Codecs decodable by every client in `clients`, lowest id first
///
/// An empty client set yields every known codec.
pub fn supported_codecs<I>(clients: I) -> Vec<VideoCodec>
where
    I: IntoIterator<Item = DisplayCaps>,
{
    let mut supported = [true; VideoCodec::ALL.len()];

    for caps in clients {
        for (slot, codec) in supported.iter_mut().zip(VideoCodec::ALL) {
            if !caps.contains(codec.cap()) {
                *slot = false;
            }
        }
    }

    VideoCodec::ALL
        .into_iter()
        .zip(supported)
        .filter(|&(codec, ok)| ok || codec == VideoCodec::BASELINE)
        .map(|(codec, _)| codec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_clients_yields_all_codecs() {
        let codecs = supported_codecs(std::iter::empty());
        assert_eq!(codecs, VideoCodec::ALL.to_vec());
    }

    #[test]
    fn test_baseline_only_client() {
        let codecs = supported_codecs([DisplayCaps::CODEC_MJPEG]);
        assert_eq!(codecs, vec![VideoCodec::Mjpeg]);
    }

    #[test]
    fn test_baseline_forced_without_advertisement() {
        let codecs = supported_codecs([DisplayCaps::CODEC_H264]);
        assert_eq!(codecs, vec![VideoCodec::Mjpeg, VideoCodec::H264]);
    }

    #[test]
    fn test_intersection_across_clients() {
        let a = DisplayCaps::CODEC_VP8 | DisplayCaps::CODEC_H264 | DisplayCaps::CODEC_VP9;
        let b = DisplayCaps::CODEC_MJPEG | DisplayCaps::CODEC_H264 | DisplayCaps::CODEC_VP9;
        let codecs = supported_codecs([a, b]);
        assert_eq!(
            codecs,
            vec![VideoCodec::Mjpeg, VideoCodec::H264, VideoCodec::Vp9]
        );
    }

    #[test]
    fn test_codec_ids() {
        assert_eq!(VideoCodec::from_id(3), Some(VideoCodec::H264));
        assert_eq!(VideoCodec::from_id(0), None);
        assert_eq!(VideoCodec::from_id(6), None);
        assert_eq!(VideoCodec::H265.to_string(), "h265");
    }
}
