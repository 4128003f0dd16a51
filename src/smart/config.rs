//! Smart streaming tunables

use std::ops::RangeInclusive;

use crate::protocol::MetricKind;

/// Target and bounds for one encoder parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateTuning {
    /// Ideal value to recover towards
    pub target: u32,
    /// Lowest value ever sent to the encoder
    pub min: u32,
    /// Highest value ever sent to the encoder
    pub max: u32,
    /// Percentage of the distance to the target covered per adjustment
    pub adjust_pct: u32,
}

impl RateTuning {
    /// Move `current` `adjust_pct` percent of the way to `target`, clamped
    /// to `[min, max]`
    pub fn step(&self, current: u32, target: u32) -> u32 {
        let pct = u64::from(self.adjust_pct.min(100));
        let val = (pct * u64::from(target) + (100 - pct) * u64::from(current)) / 100;
        // bounded by max(current, target), so it fits back into u32
        (val as u32).clamp(self.min, self.max.max(self.min))
    }

    pub fn range(&self) -> RangeInclusive<u32> {
        self.min..=self.max
    }
}

/// Smart streaming configuration
///
/// Passed explicitly to the metrics store and the policy so both stay
/// deterministic and testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartStreamingConfig {
    /// Weight in percent of a new sample in the running average
    pub metric_percent: u32,

    /// Frames per second
    pub fps: RateTuning,

    /// Average bytes per second
    pub bps: RateTuning,

    /// Accepted dropped frames per second
    pub dropped_fps: RangeInclusive<u32>,

    /// Accepted decoder queue length
    pub queue_length: RangeInclusive<u32>,
}

impl Default for SmartStreamingConfig {
    fn default() -> Self {
        Self {
            metric_percent: 10,
            fps: RateTuning {
                target: 60,
                min: 2,
                max: 60,
                adjust_pct: 10,
            },
            bps: RateTuning {
                target: 80_000,
                min: 2_000,
                max: 10_000_000,
                adjust_pct: 10,
            },
            dropped_fps: 0..=120,
            queue_length: 0..=32_000_000,
        }
    }
}

impl SmartStreamingConfig {
    /// Normalized values of `kind` outside this range are kept out of the
    /// running average
    pub fn acceptance_range(&self, kind: MetricKind) -> RangeInclusive<u32> {
        match kind {
            MetricKind::FramesReceivedPerSecond
            | MetricKind::FramesDecodedPerSecond
            | MetricKind::FramesDisplayedPerSecond => self.fps.range(),
            MetricKind::FramesDroppedPerSecond => self.dropped_fps.clone(),
            MetricKind::BytesReceivedPerSecond
            | MetricKind::BytesDecodedPerSecond
            | MetricKind::BytesDisplayedPerSecond => self.bps.range(),
            MetricKind::BytesDroppedPerSecond => 0..=self.bps.max,
            MetricKind::DecoderQueueLength => self.queue_length.clone(),
        }
    }

    /// Set the smoothing weight of new samples (capped at 100)
    pub fn metric_percent(mut self, percent: u32) -> Self {
        self.metric_percent = percent.min(100);
        self
    }

    /// Set the frame rate target and bounds
    pub fn fps(mut self, target: u32, min: u32, max: u32) -> Self {
        self.fps = RateTuning {
            target,
            min,
            max,
            ..self.fps
        };
        self
    }

    /// Set the bitrate target and bounds
    pub fn bps(mut self, target: u32, min: u32, max: u32) -> Self {
        self.bps = RateTuning {
            target,
            min,
            max,
            ..self.bps
        };
        self
    }

    /// Set how far each adjustment moves towards its target, in percent
    pub fn adjust_pct(mut self, fps_pct: u32, bps_pct: u32) -> Self {
        self.fps.adjust_pct = fps_pct.min(100);
        self.bps.adjust_pct = bps_pct.min(100);
        self
    }

    pub fn dropped_fps_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.dropped_fps = range;
        self
    }

    pub fn queue_length_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.queue_length = range;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SmartStreamingConfig::default();

        assert_eq!(config.metric_percent, 10);
        assert_eq!(config.fps.target, 60);
        assert_eq!(config.fps.range(), 2..=60);
        assert_eq!(config.bps.target, 80_000);
        assert_eq!(config.bps.range(), 2_000..=10_000_000);
    }

    #[test]
    fn test_acceptance_ranges() {
        let config = SmartStreamingConfig::default();

        assert_eq!(
            config.acceptance_range(MetricKind::FramesDecodedPerSecond),
            2..=60
        );
        assert_eq!(
            config.acceptance_range(MetricKind::FramesDroppedPerSecond),
            0..=120
        );
        assert_eq!(
            config.acceptance_range(MetricKind::BytesDroppedPerSecond),
            0..=10_000_000
        );
        assert_eq!(
            config.acceptance_range(MetricKind::DecoderQueueLength),
            0..=32_000_000
        );
    }

    #[test]
    fn test_step_moves_towards_target() {
        let fps = SmartStreamingConfig::default().fps;

        // (10 * 5 + 90 * 10) / 100 = 9
        assert_eq!(fps.step(10, 5), 9);
        // (10 * 60 + 90 * 30) / 100 = 33
        assert_eq!(fps.step(30, 60), 33);
        // clamped to min
        assert_eq!(fps.step(0, 0), 2);
    }

    #[test]
    fn test_step_no_overflow() {
        let bps = SmartStreamingConfig::default().bps;
        assert_eq!(bps.step(u32::MAX, u32::MAX), 10_000_000);
    }

    #[test]
    fn test_builder_chaining() {
        let config = SmartStreamingConfig::default()
            .metric_percent(250)
            .fps(30, 5, 30)
            .bps(100_000, 1_000, 1_000_000)
            .adjust_pct(20, 50)
            .queue_length_range(0..=100);

        assert_eq!(config.metric_percent, 100);
        assert_eq!(config.fps.target, 30);
        assert_eq!(config.fps.adjust_pct, 20);
        assert_eq!(config.bps.max, 1_000_000);
        assert_eq!(config.bps.adjust_pct, 50);
        assert_eq!(config.queue_length, 0..=100);
    }
}
