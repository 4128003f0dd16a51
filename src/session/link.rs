//! Outbound link to a connected client
//!
//! The transport (connection handling, authentication, wire marshalling)
//! lives outside this crate. The channel only needs somewhere to hand each
//! message to.

use crate::error::Result;
use crate::protocol::ServerMessage;

/// Transport endpoint of one client
///
/// A message carrying stream data keeps its frame queued until the link
/// drops it, so implementations should release messages as soon as their
/// transfer completes.
pub trait ClientLink: Send {
    fn send(&mut self, msg: ServerMessage) -> Result<()>;
}

impl<F> ClientLink for F
where
    F: FnMut(ServerMessage) -> Result<()> + Send,
{
    fn send(&mut self, msg: ServerMessage) -> Result<()> {
        self(msg)
    }
}
