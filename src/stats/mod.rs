//! Channel statistics: client playback metrics and queue occupancy

pub mod metrics;
pub mod queue;

pub use metrics::{MetricSlot, MetricsStore, Sample};
pub use queue::{QueueStat, QueueStatAccumulator, QueueStatCallback};
