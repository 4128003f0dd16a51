//! Error types
//!
//! Only protocol violations and transport failures are errors. Stale
//! references and out-of-range telemetry are reported through
//! [`MetricOutcome`](crate::channel::MetricOutcome) and logged instead.

use thiserror::Error;

use crate::session::ClientId;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Client broke the display protocol; its connection must be torn down
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The client's outbound link is gone
    #[error("link to client {0} closed")]
    LinkClosed(ClientId),

    /// No client with this id is connected
    #[error("unknown client {0}")]
    UnknownClient(ClientId),

    /// The channel driver task has stopped
    #[error("channel driver closed")]
    DriverClosed,
}

/// Display protocol violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A message the client must never originate
    #[error("unexpected message: {0}")]
    UnexpectedMessage(&'static str),

    /// Message type not understood by this channel
    #[error("unknown message type {0}")]
    UnknownMessageType(u16),
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::DriverClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::DriverClosed
    }
}
