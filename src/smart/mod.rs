//! Smart streaming: retuning the encoder from client telemetry
//!
//! Metric reports are smoothed by the [`MetricsStore`](crate::stats::MetricsStore),
//! then [`evaluate`] picks at most one change to the frame rate or the
//! average bitrate. The channel forwards each changed [`EncoderParam`] to
//! the producer.

pub mod config;
pub mod params;
pub mod policy;

pub use config::{RateTuning, SmartStreamingConfig};
pub use params::{EncoderParam, EncoderParams};
pub use policy::{evaluate, Adjustment, TunedParam};
