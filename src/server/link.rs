//! In-process client link over a tokio channel

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::ServerMessage;
use crate::session::{ClientId, ClientLink};

/// [`ClientLink`] forwarding messages to an unbounded receiver
///
/// The receiving side plays the transport: a frame stays counted in the
/// queue statistics until the receiver drops the message carrying it.
#[derive(Debug)]
pub struct ChannelLink {
    client: ClientId,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ChannelLink {
    /// Create a link for `client` and the receiver its messages go to
    pub fn new(client: ClientId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { client, tx }, rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl ClientLink for ChannelLink {
    fn send(&mut self, msg: ServerMessage) -> Result<()> {
        self.tx.send(msg).map_err(|_| Error::LinkClosed(self.client))
    }
}
