//! Per-client send pipe
//!
//! Items are queued when the channel changes state and turned into
//! messages only when the client drains its pipe. Whether an item is
//! actually sent is decided at that point, from the client's capabilities
//! and the stream it currently knows about.

use std::collections::VecDeque;

use crate::channel::StreamData;
use crate::protocol::{Geometry, StreamFormat, StreamId};

/// One pending outbound protocol item
#[derive(Debug, Clone)]
pub enum PipeItem {
    SurfaceCreate(Geometry),
    SurfaceDestroy,
    /// Solid background over the whole surface
    FillSurface(Geometry),
    MonitorsConfig(Geometry),
    /// Surface is ready to be shown
    Mark,
    StreamCreate { id: StreamId, format: StreamFormat },
    StreamData(StreamData),
    StreamDestroy,
    StreamActivateReport,
    StreamActivateMetrics,
}

/// Payload-free view of a [`PipeItem`], handy for logs and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeItemKind {
    SurfaceCreate,
    SurfaceDestroy,
    FillSurface,
    MonitorsConfig,
    Mark,
    StreamCreate,
    StreamData,
    StreamDestroy,
    StreamActivateReport,
    StreamActivateMetrics,
}

impl PipeItem {
    pub fn kind(&self) -> PipeItemKind {
        match self {
            PipeItem::SurfaceCreate(_) => PipeItemKind::SurfaceCreate,
            PipeItem::SurfaceDestroy => PipeItemKind::SurfaceDestroy,
            PipeItem::FillSurface(_) => PipeItemKind::FillSurface,
            PipeItem::MonitorsConfig(_) => PipeItemKind::MonitorsConfig,
            PipeItem::Mark => PipeItemKind::Mark,
            PipeItem::StreamCreate { .. } => PipeItemKind::StreamCreate,
            PipeItem::StreamData(_) => PipeItemKind::StreamData,
            PipeItem::StreamDestroy => PipeItemKind::StreamDestroy,
            PipeItem::StreamActivateReport => PipeItemKind::StreamActivateReport,
            PipeItem::StreamActivateMetrics => PipeItemKind::StreamActivateMetrics,
        }
    }
}

/// FIFO of items waiting to be sent to one client
#[derive(Debug, Default)]
pub struct SendPipe {
    items: VecDeque<PipeItem>,
}

impl SendPipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: PipeItem) {
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<PipeItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PipeItem> {
        self.items.iter()
    }

    /// Kinds of the pending items, oldest first
    pub fn kinds(&self) -> Vec<PipeItemKind> {
        self.items.iter().map(PipeItem::kind).collect()
    }

    /// Drop every pending item, releasing any data they hold
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
