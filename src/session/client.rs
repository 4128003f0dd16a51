//! Per-client session state
//!
//! Tracks the stream id the client has been told about and turns queued
//! pipe items into messages for its link.

use std::time::Instant;

use crate::channel::ChannelConfig;
use crate::error::{Error, Result};
use crate::protocol::constants::{METRIC_LAST, PRIMARY_SURFACE_ID, REPORT_UNIQUE_ID};
use crate::protocol::message::{
    DrawFill, MonitorHead, MonitorsConfig, Rect, RopDescriptor, StreamActivation, StreamCreate,
    SurfaceCreate, SurfaceFlags, SurfaceFormat,
};
use crate::protocol::{DisplayCaps, ServerMessage, StreamId};

use super::link::ClientLink;
use super::pipe::{PipeItem, SendPipe};

/// Identity of a connected client, unique for the channel's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of draining a pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainSummary {
    /// Items handed to the link
    pub sent: usize,
    /// Items dropped because the client could not use them
    pub skipped: usize,
}

/// One connected client
pub struct ClientSession {
    id: ClientId,
    caps: DisplayCaps,
    /// Stream the client was last told about
    local_stream_id: Option<StreamId>,
    pipe: SendPipe,
    link: Box<dyn ClientLink>,
    connected_at: Instant,
}

impl ClientSession {
    pub fn new(id: ClientId, caps: DisplayCaps, link: Box<dyn ClientLink>) -> Self {
        Self {
            id,
            caps,
            local_stream_id: None,
            pipe: SendPipe::new(),
            link,
            connected_at: Instant::now(),
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn caps(&self) -> DisplayCaps {
        self.caps
    }

    pub fn has_cap(&self, cap: DisplayCaps) -> bool {
        self.caps.contains(cap)
    }

    pub fn local_stream_id(&self) -> Option<StreamId> {
        self.local_stream_id
    }

    pub fn pipe(&self) -> &SendPipe {
        &self.pipe
    }

    pub fn push(&mut self, item: PipeItem) {
        self.pipe.push(item);
    }

    /// Time since the client connected
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }

    /// Send every pending item, oldest first
    ///
    /// Stops at the first link failure; items behind it stay queued.
    pub fn drain(&mut self, config: &ChannelConfig) -> Result<DrainSummary> {
        let mut summary = DrainSummary::default();

        while let Some(item) = self.pipe.pop() {
            let kind = item.kind();
            let Some(msg) = self.marshal(item, config) else {
                tracing::trace!(client = %self.id, item = ?kind, "Pipe item skipped");
                summary.skipped += 1;
                continue;
            };

            tracing::trace!(client = %self.id, msg = msg.name(), "Sending message");
            self.link.send(msg).map_err(|e| {
                tracing::debug!(client = %self.id, error = %e, "Client link send failed");
                Error::LinkClosed(self.id)
            })?;
            summary.sent += 1;
        }

        Ok(summary)
    }

    /// Build the message for `item`, or `None` when this client cannot use it
    fn marshal(&mut self, item: PipeItem, config: &ChannelConfig) -> Option<ServerMessage> {
        let msg = match item {
            PipeItem::SurfaceCreate(geometry) => {
                let mut flags = SurfaceFlags::PRIMARY;
                if self.has_cap(DisplayCaps::MULTI_CODEC) {
                    flags |= SurfaceFlags::STREAMING_MODE;
                }
                ServerMessage::SurfaceCreate(SurfaceCreate {
                    surface_id: PRIMARY_SURFACE_ID,
                    width: geometry.width,
                    height: geometry.height,
                    format: SurfaceFormat::Xrgb32,
                    flags,
                })
            }
            PipeItem::MonitorsConfig(geometry) => {
                if !self.has_cap(DisplayCaps::MONITORS_CONFIG) {
                    return None;
                }
                ServerMessage::MonitorsConfig(MonitorsConfig {
                    max_allowed: 1,
                    heads: vec![MonitorHead {
                        monitor_id: 0,
                        surface_id: PRIMARY_SURFACE_ID,
                        width: geometry.width,
                        height: geometry.height,
                        x: 0,
                        y: 0,
                        flags: 0,
                    }],
                })
            }
            PipeItem::SurfaceDestroy => ServerMessage::SurfaceDestroy {
                surface_id: PRIMARY_SURFACE_ID,
            },
            PipeItem::FillSurface(geometry) => ServerMessage::DrawFill(DrawFill {
                surface_id: PRIMARY_SURFACE_ID,
                area: Rect::covering(geometry),
                color: 0,
                rop: RopDescriptor::Put,
            }),
            PipeItem::Mark => ServerMessage::Mark,
            PipeItem::StreamCreate { id, format } => {
                self.local_stream_id = Some(id);
                ServerMessage::StreamCreate(StreamCreate::new(id, format))
            }
            PipeItem::StreamActivateReport => {
                let stream_id = self.local_stream_id?;
                if !self.has_cap(DisplayCaps::STREAM_REPORT) {
                    return None;
                }
                tracing::debug!(client = %self.id, stream_id = %stream_id, "Activating stream reports");
                ServerMessage::StreamActivateReport(activation(stream_id, config))
            }
            PipeItem::StreamActivateMetrics => {
                let stream_id = self.local_stream_id?;
                if !self.has_cap(DisplayCaps::METRICS) {
                    return None;
                }
                tracing::debug!(client = %self.id, stream_id = %stream_id, "Activating stream metrics");
                ServerMessage::StreamActivateMetrics {
                    activation: activation(stream_id, config),
                    last_known_metric: METRIC_LAST,
                }
            }
            PipeItem::StreamData(data) => ServerMessage::StreamData(data),
            PipeItem::StreamDestroy => {
                let id = self.local_stream_id.take()?;
                ServerMessage::StreamDestroy { id }
            }
        };

        Some(msg)
    }
}

fn activation(stream_id: StreamId, config: &ChannelConfig) -> StreamActivation {
    StreamActivation {
        stream_id,
        unique_id: REPORT_UNIQUE_ID,
        max_window_size: config.report_window,
        timeout_ms: config.report_timeout_ms,
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("id", &self.id)
            .field("caps", &self.caps)
            .field("local_stream_id", &self.local_stream_id)
            .field("pending", &self.pipe.len())
            .finish_non_exhaustive()
    }
}
