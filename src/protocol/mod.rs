//! Display protocol vocabulary
//!
//! Capability bits, codec ids, metric kinds and the typed messages that
//! flow between the stream channel and its clients.

pub mod caps;
pub mod codec;
pub mod constants;
pub mod message;
pub mod metric;
pub mod types;

pub use caps::DisplayCaps;
pub use codec::{supported_codecs, VideoCodec};
pub use message::{ClientMessage, ServerMessage};
pub use metric::{MetricFamily, MetricKind, MetricReport};
pub use types::{Geometry, StreamFormat, StreamId};
