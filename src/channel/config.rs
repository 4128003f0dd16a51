//! Channel configuration

use crate::protocol::constants::{CLIENT_REPORT_TIMEOUT_MS, CLIENT_REPORT_WINDOW};
use crate::smart::SmartStreamingConfig;

/// Stream channel configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Window size advertised in report and metrics activations
    pub report_window: u32,

    /// Timeout advertised in report and metrics activations
    pub report_timeout_ms: u32,

    /// Smart streaming tunables
    pub smart: SmartStreamingConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            report_window: CLIENT_REPORT_WINDOW,
            report_timeout_ms: CLIENT_REPORT_TIMEOUT_MS,
            smart: SmartStreamingConfig::default(),
        }
    }
}

impl ChannelConfig {
    /// Set the advertised report window
    pub fn report_window(mut self, window: u32) -> Self {
        self.report_window = window;
        self
    }

    /// Set the advertised report timeout
    pub fn report_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.report_timeout_ms = timeout_ms;
        self
    }

    /// Replace the smart streaming tunables
    pub fn smart_streaming(mut self, smart: SmartStreamingConfig) -> Self {
        self.smart = smart;
        self
    }
}
