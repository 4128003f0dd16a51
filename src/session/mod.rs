//! Connected client sessions
//!
//! Each client owns a [`SendPipe`] of pending items and a [`ClientLink`]
//! to its transport. The channel pushes items; the client decides at
//! drain time what it can actually send.

pub mod client;
pub mod link;
pub mod pipe;

pub use client::{ClientId, ClientSession, DrainSummary};
pub use link::ClientLink;
pub use pipe::{PipeItem, PipeItemKind, SendPipe};
