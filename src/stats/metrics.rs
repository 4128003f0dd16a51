//! Running client metrics
//!
//! One slot per [`MetricKind`] holding the latest accepted value, a
//! smoothed average and whether any sample has been accepted yet.

use std::ops::RangeInclusive;

use crate::protocol::MetricKind;

/// State kept for a single metric kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricSlot {
    /// Latest accepted per-second value
    pub last_value: u32,
    /// Smoothed per-second value
    pub average: u32,
    /// Whether a sample was ever accepted
    pub has_sample: bool,
}

/// Result of recording one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Per-second value derived from the raw report
    pub value: u32,
    /// Average after the sample; unchanged when it was rejected
    pub average: u32,
    /// Whether the value fell inside the acceptance range
    pub accepted: bool,
}

/// Per-metric running values and averages
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsStore {
    slots: [MetricSlot; MetricKind::COUNT],
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw bucketed count to a per-second rate
    pub fn normalize(raw_value: u32, duration_ms: u32) -> u32 {
        let value = u64::from(raw_value) * u64::from(duration_ms) / 1000;
        u32::try_from(value).unwrap_or(u32::MAX)
    }

    /// Record a sample for `kind`
    ///
    /// Values outside `range` leave the slot untouched. The first accepted
    /// sample becomes the average; later ones are blended in with a
    /// weight of `percent`.
    pub fn record_sample(
        &mut self,
        kind: MetricKind,
        raw_value: u32,
        duration_ms: u32,
        range: RangeInclusive<u32>,
        percent: u32,
    ) -> Sample {
        let value = Self::normalize(raw_value, duration_ms);
        let slot = &mut self.slots[kind.index()];

        if !range.contains(&value) {
            return Sample {
                value,
                average: slot.average,
                accepted: false,
            };
        }

        let percent = if slot.has_sample {
            u64::from(percent.min(100))
        } else {
            100
        };
        let blended =
            (percent * u64::from(value) + (100 - percent) * u64::from(slot.average)) / 100;

        slot.average = blended as u32;
        slot.last_value = value;
        slot.has_sample = true;

        Sample {
            value,
            average: slot.average,
            accepted: true,
        }
    }

    /// Copy of every slot, indexed by [`MetricKind::index`]
    pub fn snapshot(&self) -> [MetricSlot; MetricKind::COUNT] {
        self.slots
    }

    pub fn slot(&self, kind: MetricKind) -> &MetricSlot {
        &self.slots[kind.index()]
    }

    pub fn average(&self, kind: MetricKind) -> u32 {
        self.slot(kind).average
    }

    pub fn last_value(&self, kind: MetricKind) -> u32 {
        self.slot(kind).last_value
    }

    pub fn has_sample(&self, kind: MetricKind) -> bool {
        self.slot(kind).has_sample
    }

    /// Forget every sample
    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPS: MetricKind = MetricKind::FramesDisplayedPerSecond;

    #[test]
    fn test_normalize() {
        assert_eq!(MetricsStore::normalize(30, 1000), 30);
        assert_eq!(MetricsStore::normalize(30, 500), 15);
        assert_eq!(MetricsStore::normalize(7, 999), 6);
        assert_eq!(MetricsStore::normalize(u32::MAX, u32::MAX), u32::MAX);
    }

    #[test]
    fn test_first_sample_sets_average() {
        let mut store = MetricsStore::new();
        let sample = store.record_sample(FPS, 30, 1000, 2..=60, 10);

        assert!(sample.accepted);
        assert_eq!(sample.value, 30);
        assert_eq!(sample.average, 30);
        assert!(store.has_sample(FPS));
        assert_eq!(store.last_value(FPS), 30);
    }

    #[test]
    fn test_smoothing() {
        let mut store = MetricsStore::new();
        store.record_sample(FPS, 30, 1000, 2..=60, 10);
        let sample = store.record_sample(FPS, 50, 1000, 2..=60, 10);

        // (10 * 50 + 90 * 30) / 100 = 32
        assert_eq!(sample.average, 32);
        assert_eq!(store.average(FPS), 32);
        assert_eq!(store.last_value(FPS), 50);
    }

    #[test]
    fn test_out_of_range_discarded() {
        let mut store = MetricsStore::new();
        store.record_sample(FPS, 30, 1000, 2..=60, 10);
        let before = store.clone();

        let sample = store.record_sample(FPS, 500, 1000, 2..=60, 10);

        assert!(!sample.accepted);
        assert_eq!(sample.value, 500);
        assert_eq!(sample.average, 30);
        assert_eq!(store, before);
    }

    #[test]
    fn test_rejected_first_sample_keeps_slot_invalid() {
        let mut store = MetricsStore::new();
        let sample = store.record_sample(FPS, 1, 1000, 2..=60, 10);

        assert!(!sample.accepted);
        assert!(!store.has_sample(FPS));
        assert_eq!(sample.average, 0);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut store = MetricsStore::new();
        store.record_sample(FPS, 30, 1000, 2..=60, 10);

        assert!(!store.has_sample(MetricKind::FramesDecodedPerSecond));
        assert_eq!(store.average(MetricKind::FramesDecodedPerSecond), 0);

        let slots = store.snapshot();
        assert!(slots[FPS.index()].has_sample);
        assert_eq!(slots.iter().filter(|s| s.has_sample).count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut store = MetricsStore::new();
        store.record_sample(FPS, 30, 1000, 2..=60, 10);
        store.clear();
        assert_eq!(store, MetricsStore::new());
    }
}
