//! Smart streaming policy
//!
//! Maps one metric update to at most one encoder parameter change. Each
//! metric family has an ordered list of rules; the first rule that holds
//! and actually moves its parameter wins.
//!
//! ```text
//!   metric report ──► MetricsStore ──► evaluate() ──► Adjustment?
//!                                          │
//!                          fps rules ──────┤ (frame-rate, dropped frames,
//!                                          │  decoder queue length)
//!                          bps rules ──────┘ (byte-rate, dropped bytes)
//! ```

use crate::protocol::{MetricFamily, MetricKind};
use crate::stats::MetricsStore;

use super::config::{RateTuning, SmartStreamingConfig};
use super::params::{EncoderParam, EncoderParams};

/// Parameter smart streaming is allowed to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunedParam {
    FramesPerSecond,
    AverageBytesPerSecond,
}

impl TunedParam {
    pub fn encoder_param(self) -> EncoderParam {
        match self {
            TunedParam::FramesPerSecond => EncoderParam::FramesPerSecond,
            TunedParam::AverageBytesPerSecond => EncoderParam::AverageBytesPerSecond,
        }
    }

    fn tuning(self, config: &SmartStreamingConfig) -> &RateTuning {
        match self {
            TunedParam::FramesPerSecond => &config.fps,
            TunedParam::AverageBytesPerSecond => &config.bps,
        }
    }
}

/// A single parameter change chosen by [`evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    pub param: TunedParam,
    /// Value before the change
    pub from: u32,
    /// Value after the change, already clamped
    pub to: u32,
    /// Value the rule was steering towards
    pub target: u32,
    /// Name of the rule that fired
    pub reason: &'static str,
}

impl Adjustment {
    /// `params` with this adjustment applied
    pub fn apply(&self, params: &EncoderParams) -> EncoderParams {
        let mut adjusted = *params;
        adjusted.set(self.param.encoder_param(), self.to);
        adjusted
    }
}

struct Rule {
    param: TunedParam,
    reason: &'static str,
    holds: bool,
    target: u32,
}

impl Rule {
    fn fps(reason: &'static str, holds: bool, target: u32) -> Self {
        Self {
            param: TunedParam::FramesPerSecond,
            reason,
            holds,
            target,
        }
    }

    fn bps(reason: &'static str, holds: bool, target: u32) -> Self {
        Self {
            param: TunedParam::AverageBytesPerSecond,
            reason,
            holds,
            target,
        }
    }

    fn adjust(&self, params: &EncoderParams, config: &SmartStreamingConfig) -> Option<Adjustment> {
        if !self.holds {
            return None;
        }
        let from = params.get(self.param.encoder_param());
        let to = self.param.tuning(config).step(from, self.target);
        (to != from).then_some(Adjustment {
            param: self.param,
            from,
            to,
            target: self.target,
            reason: self.reason,
        })
    }
}

/// Decide how the encoder should react to a new sample of `kind`
///
/// `value` is the sample's per-second value and `average` the running
/// average after it was recorded. `metrics` already contains the sample
/// when it was accepted.
pub fn evaluate(
    kind: MetricKind,
    value: u32,
    average: u32,
    metrics: &MetricsStore,
    params: &EncoderParams,
    config: &SmartStreamingConfig,
) -> Option<Adjustment> {
    let fps = params.frames_per_second;
    let bps = params.average_bytes_per_second;

    let rules = match kind.family() {
        MetricFamily::FrameRate => {
            let rec = metrics.average(MetricKind::FramesReceivedPerSecond);
            let dec = metrics.average(MetricKind::FramesDecodedPerSecond);
            let dis = metrics.average(MetricKind::FramesDisplayedPerSecond);
            let cur_dis = metrics.last_value(MetricKind::FramesDisplayedPerSecond);
            let has_rec = metrics.has_sample(MetricKind::FramesReceivedPerSecond);
            let has_dec = metrics.has_sample(MetricKind::FramesDecodedPerSecond);
            let has_dis = metrics.has_sample(MetricKind::FramesDisplayedPerSecond);

            vec![
                // client is already behind us
                Rule::fps("low metric", average < fps, average),
                // display is the bottleneck
                Rule::fps("display lag", has_dec && has_dis && dis < dec, dis),
                Rule::fps("decoder lag", has_rec && has_dec && dec < rec, dec),
                // no decoder metric to blame
                Rule::fps("pipeline lag", has_dis && has_rec && dis < rec, dis),
                Rule::fps(
                    "return to last fps",
                    has_dis && (fps < cur_dis || dis < cur_dis),
                    cur_dis,
                ),
                Rule::fps("return to average fps", has_dis && fps < dis, dis),
                Rule::fps(
                    "return to target fps",
                    fps < config.fps.target,
                    config.fps.target,
                ),
            ]
        }
        MetricFamily::ByteRate => vec![
            Rule::bps("network usage going down", average < bps, average),
            Rule::bps("network usage going up", average > bps, average),
            Rule::bps("return to target bandwidth", true, config.bps.target),
        ],
        MetricFamily::DroppedFrames => vec![Rule::fps(
            "dropped frames",
            average != 0 && fps > average,
            fps.saturating_sub(average),
        )],
        MetricFamily::DroppedBytes => vec![Rule::bps(
            "dropped bytes",
            average != 0 && bps > average,
            bps.saturating_sub(average),
        )],
        MetricFamily::QueueLength => vec![Rule::fps(
            "decoder queue diverging",
            value > average,
            fps.saturating_sub(1),
        )],
    };

    rules.iter().find_map(|rule| rule.adjust(params, config))
}
