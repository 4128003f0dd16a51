//! Encoder parameters communicated to the producer

/// Encoder parameter the producer can be asked to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderParam {
    FramesPerSecond,
    MaxBytesPerSecond,
    AverageBytesPerSecond,
    GroupOfPictureSize,
    Quality,
}

impl std::fmt::Display for EncoderParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EncoderParam::FramesPerSecond => "fps",
            EncoderParam::MaxBytesPerSecond => "max_bps",
            EncoderParam::AverageBytesPerSecond => "avg_bps",
            EncoderParam::GroupOfPictureSize => "gop_length",
            EncoderParam::Quality => "quality",
        };
        f.write_str(name)
    }
}

/// Last encoder settings sent to the producer
///
/// Starts all zero: nothing has been communicated yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderParams {
    pub frames_per_second: u32,
    pub max_bytes_per_second: u32,
    pub average_bytes_per_second: u32,
    pub gop_length: u32,
    pub quality: u32,
}

impl EncoderParams {
    pub fn get(&self, param: EncoderParam) -> u32 {
        match param {
            EncoderParam::FramesPerSecond => self.frames_per_second,
            EncoderParam::MaxBytesPerSecond => self.max_bytes_per_second,
            EncoderParam::AverageBytesPerSecond => self.average_bytes_per_second,
            EncoderParam::GroupOfPictureSize => self.gop_length,
            EncoderParam::Quality => self.quality,
        }
    }

    pub fn set(&mut self, param: EncoderParam, value: u32) {
        let slot = match param {
            EncoderParam::FramesPerSecond => &mut self.frames_per_second,
            EncoderParam::MaxBytesPerSecond => &mut self.max_bytes_per_second,
            EncoderParam::AverageBytesPerSecond => &mut self.average_bytes_per_second,
            EncoderParam::GroupOfPictureSize => &mut self.gop_length,
            EncoderParam::Quality => &mut self.quality,
        };
        *slot = value;
    }

    /// Fields of `self` that differ from `previous`, one entry per changed
    /// parameter in notification order
    pub fn changes_from(&self, previous: &EncoderParams) -> Vec<(EncoderParam, u32)> {
        const ORDER: [EncoderParam; 5] = [
            EncoderParam::FramesPerSecond,
            EncoderParam::MaxBytesPerSecond,
            EncoderParam::AverageBytesPerSecond,
            EncoderParam::GroupOfPictureSize,
            EncoderParam::Quality,
        ];

        ORDER
            .into_iter()
            .filter(|&p| self.get(p) != previous.get(p))
            .map(|p| (p, self.get(p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_changes() {
        let params = EncoderParams::default();
        assert!(params.changes_from(&params).is_empty());
    }

    #[test]
    fn test_changes_in_order() {
        let before = EncoderParams::default();
        let mut after = before;
        after.set(EncoderParam::Quality, 80);
        after.set(EncoderParam::FramesPerSecond, 30);

        assert_eq!(
            after.changes_from(&before),
            vec![
                (EncoderParam::FramesPerSecond, 30),
                (EncoderParam::Quality, 80)
            ]
        );
    }
}
