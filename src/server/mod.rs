//! Async plumbing around the stream channel
//!
//! [`ChannelDriver`] runs the channel on one tokio task; [`ChannelHandle`]
//! is how producers and transports reach it. [`ChannelLink`] is an
//! in-process client link for tests and embedders without a wire transport.

pub mod config;
pub mod driver;
pub mod link;

pub use config::DriverConfig;
pub use driver::{ChannelCommand, ChannelDriver, ChannelHandle};
pub use link::ChannelLink;
