//! Producer callback registrations
//!
//! The producer is the capture/encode source feeding the channel. It gets
//! told when to start or stop and how to retune its encoder. Each
//! registration replaces the previous one; closures capture whatever
//! context they need.

use crate::protocol::VideoCodec;
use crate::smart::EncoderParam;

/// Start streaming with one of these codecs; an empty list means stop
pub type StartStopCallback = Box<dyn FnMut(&[VideoCodec]) + Send>;

/// Change one encoder parameter to a new value
pub type EncoderAdjustCallback = Box<dyn FnMut(EncoderParam, u32) + Send>;

#[derive(Default)]
pub(crate) struct ProducerCallbacks {
    start_stop: Option<StartStopCallback>,
    adjust: Option<EncoderAdjustCallback>,
}

impl ProducerCallbacks {
    pub(crate) fn set_start_stop(&mut self, callback: StartStopCallback) {
        self.start_stop = Some(callback);
    }

    pub(crate) fn set_adjust(&mut self, callback: EncoderAdjustCallback) {
        self.adjust = Some(callback);
    }

    pub(crate) fn has_adjust(&self) -> bool {
        self.adjust.is_some()
    }

    pub(crate) fn request_start_stop(&mut self, codecs: &[VideoCodec]) {
        if let Some(callback) = self.start_stop.as_mut() {
            callback(codecs);
        }
    }

    pub(crate) fn adjust(&mut self, param: EncoderParam, value: u32) {
        if let Some(callback) = self.adjust.as_mut() {
            callback(param, value);
        }
    }
}

impl std::fmt::Debug for ProducerCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerCallbacks")
            .field("start_stop", &self.start_stop.is_some())
            .field("adjust", &self.adjust.is_some())
            .finish()
    }
}
