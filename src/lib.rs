//! Adaptive video stream channel for remote display servers
//!
//! A [`StreamChannel`] multiplexes one encoded video stream to any number of
//! connected clients. It manages the primary surface and stream lifecycle,
//! shares every frame across client pipes without copying, reports queue
//! occupancy back to the producer, and retunes the encoder from client
//! playback metrics ("smart streaming").
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use stream_channel::protocol::{DisplayCaps, StreamFormat, VideoCodec};
//! use stream_channel::{ChannelDriver, DriverConfig, StreamChannel};
//!
//! # async fn run() -> stream_channel::Result<()> {
//! let mut channel = StreamChannel::new();
//! channel.on_stream_start_stop(Box::new(|codecs| println!("start with {codecs:?}")));
//! channel.on_encoder_adjust(Box::new(|param, value| println!("{param} -> {value}")));
//!
//! let (handle, _task) = ChannelDriver::spawn(channel, &DriverConfig::default());
//! let (_client, mut messages) = handle.connect(DisplayCaps::METRICS).await?;
//!
//! handle
//!     .change_format(StreamFormat::new(1280, 720, VideoCodec::H264))
//!     .await?;
//! handle.send_data(Bytes::from_static(b"frame"), 0).await?;
//!
//! while let Some(msg) = messages.recv().await {
//!     println!("{}", msg.name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod smart;
pub mod stats;

pub use channel::{
    ChannelConfig, ChannelState, MetricOutcome, RejectReason, StreamChannel, StreamData,
};
pub use error::{Error, ProtocolError, Result};
pub use server::{ChannelDriver, ChannelHandle, ChannelLink, DriverConfig};
pub use session::{ClientId, ClientLink};
pub use smart::{EncoderParam, EncoderParams, SmartStreamingConfig};
pub use stats::{QueueStat, QueueStatCallback};
