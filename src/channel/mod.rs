//! Video stream channel
//!
//! The channel sits between one producer (capture + encoder) and any number
//! of connected clients. It owns the stream identity and surface geometry,
//! queues protocol items per client, and feeds client telemetry back into
//! the encoder.
//!
//! # Architecture
//!
//! ```text
//!        [Producer]
//!   change_format() / send_data()
//!            │            ▲  start/stop, encoder adjust,
//!            ▼            │  queue stat
//!   ┌─────────────────────┴───┐
//!   │ StreamChannel           │
//!   │   stream_id, geometry   │
//!   │   MetricsStore          │
//!   │   EncoderParams         │
//!   └───────────┬─────────────┘
//!               │ PipeItem
//!     ┌─────────┼─────────┐
//!     ▼         ▼         ▼
//!  [Client]  [Client]  [Client]
//!  SendPipe  SendPipe  SendPipe ──► ClientLink
//! ```
//!
//! # Shared frames
//!
//! A frame is wrapped once in [`StreamData`] and cloned into every pipe.
//! Clones share one `bytes::Bytes` allocation; the queue statistics drop
//! the frame when the last clone goes away.

pub mod config;
pub mod data;
pub mod producer;
pub mod stream_channel;

pub use config::ChannelConfig;
pub use data::StreamData;
pub use producer::{EncoderAdjustCallback, StartStopCallback};
pub use stream_channel::{ChannelState, MetricOutcome, RejectReason, StreamChannel};
