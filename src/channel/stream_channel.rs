//! Stream channel implementation
//!
//! The controller owning the stream identity and surface geometry. It
//! queues protocol items into every client's pipe as the producer changes
//! format, fans out frames, and turns client metrics into encoder
//! adjustments.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{
    supported_codecs, ClientMessage, DisplayCaps, Geometry, MetricReport, StreamFormat, StreamId,
    VideoCodec,
};
use crate::session::{
    ClientId, ClientLink, ClientSession, DrainSummary, PipeItem, PipeItemKind, SendPipe,
};
use crate::smart::{evaluate, EncoderParam, EncoderParams};
use crate::stats::{MetricsStore, QueueStat, QueueStatAccumulator, QueueStatCallback};

use super::config::ChannelConfig;
use super::data::StreamData;
use super::producer::{EncoderAdjustCallback, ProducerCallbacks, StartStopCallback};

/// Lifecycle state of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No surface, no stream
    Idle,
    /// Primary surface exists, no stream yet
    SurfaceUp,
    /// A stream is active, with or without a surface
    ///
    /// A zero-size format creates a stream but no primary surface.
    Streaming,
}

/// Why a metric report was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Report refers to a stream that is no longer live
    StaleStream {
        reported: u32,
        live: Option<StreamId>,
    },
    /// Nobody is listening for encoder adjustments
    NoAdjustCallback,
    /// Metric id not understood by this server
    UnknownMetric(u32),
}

/// Result of handling a metric report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricOutcome {
    Rejected(RejectReason),
    /// Sample processed, encoder left alone
    Unchanged,
    /// Parameters sent to the producer, in notification order
    Adjusted(Vec<(EncoderParam, u32)>),
}

/// Video stream channel multiplexing one stream to many clients
///
/// All methods take `&mut self`: the channel is driven from a single task
/// (see [`ChannelDriver`](crate::server::ChannelDriver)) and never locks its
/// own state.
pub struct StreamChannel {
    config: ChannelConfig,

    /// Active stream, `None` when not streaming
    stream_id: Option<StreamId>,

    /// Primary surface size, `None` when there is no surface
    geometry: Option<Geometry>,

    /// Connected clients in connection order
    clients: Vec<ClientSession>,

    next_client_id: u64,

    /// Shared with every outstanding [`StreamData`]
    queue: Arc<QueueStatAccumulator>,

    metrics: MetricsStore,

    /// Last parameters communicated to the producer
    encoder_params: EncoderParams,

    producer: ProducerCallbacks,
}

impl StreamChannel {
    /// Create a new channel with default configuration
    pub fn new() -> Self {
        Self::with_config(ChannelConfig::default())
    }

    /// Create a new channel with custom configuration
    pub fn with_config(config: ChannelConfig) -> Self {
        Self {
            config,
            stream_id: None,
            geometry: None,
            clients: Vec::new(),
            next_client_id: 1,
            queue: Arc::new(QueueStatAccumulator::new()),
            metrics: MetricsStore::new(),
            encoder_params: EncoderParams::default(),
            producer: ProducerCallbacks::default(),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Register the producer's start/stop handler
    pub fn on_stream_start_stop(&mut self, callback: StartStopCallback) {
        self.producer.set_start_stop(callback);
    }

    /// Register the producer's queue statistics handler
    pub fn on_queue_stat_changed(&mut self, callback: QueueStatCallback) {
        self.queue.set_callback(callback);
    }

    /// Register the producer's encoder adjustment handler
    pub fn on_encoder_adjust(&mut self, callback: EncoderAdjustCallback) {
        self.producer.set_adjust(callback);
    }

    pub fn state(&self) -> ChannelState {
        match (self.geometry, self.stream_id) {
            // zero-size formats stream without a surface
            (_, Some(_)) => ChannelState::Streaming,
            (Some(_), None) => ChannelState::SurfaceUp,
            (None, None) => ChannelState::Idle,
        }
    }

    pub fn stream_id(&self) -> Option<StreamId> {
        self.stream_id
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    pub fn queue_stat(&self) -> QueueStat {
        self.queue.current()
    }

    pub fn metrics(&self) -> &MetricsStore {
        &self.metrics
    }

    pub fn encoder_params(&self) -> &EncoderParams {
        &self.encoder_params
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_connected(&self) -> bool {
        !self.clients.is_empty()
    }

    /// Capabilities this channel advertises to clients
    pub fn server_caps(&self) -> DisplayCaps {
        DisplayCaps::server()
    }

    pub fn client(&self, id: ClientId) -> Option<&ClientSession> {
        self.clients.iter().find(|c| c.id() == id)
    }

    /// Pending items of one client
    pub fn pipe(&self, id: ClientId) -> Option<&SendPipe> {
        self.client(id).map(ClientSession::pipe)
    }

    /// Kinds of the items pending for one client, oldest first
    pub fn pipe_items(&self, id: ClientId) -> Option<Vec<PipeItemKind>> {
        self.pipe(id).map(SendPipe::kinds)
    }

    /// Codecs every connected client can decode
    pub fn supported_codecs(&self) -> Vec<VideoCodec> {
        supported_codecs(self.clients.iter().map(ClientSession::caps))
    }

    /// Accept a new client
    ///
    /// The producer is always asked to (re)start with the codecs all
    /// clients now share. If a surface is up, the new client alone gets it
    /// created and cleared.
    pub fn connect(&mut self, caps: DisplayCaps, link: Box<dyn ClientLink>) -> ClientId {
        self.connect_with(caps, |_| link)
    }

    /// Like [`connect`](Self::connect), for links that need to know their
    /// client id
    pub fn connect_with<F>(&mut self, caps: DisplayCaps, make_link: F) -> ClientId
    where
        F: FnOnce(ClientId) -> Box<dyn ClientLink>,
    {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;
        self.clients.push(ClientSession::new(id, caps, make_link(id)));

        tracing::info!(
            client = %id,
            clients = self.clients.len(),
            caps = ?caps,
            "Client connected"
        );

        self.request_stream_start();

        if let Some(geometry) = self.geometry {
            if let Some(client) = self.clients.last_mut() {
                client.push(PipeItem::SurfaceCreate(geometry));
                client.push(PipeItem::MonitorsConfig(geometry));
                client.push(PipeItem::FillSurface(geometry));
                client.push(PipeItem::Mark);
            }
        }

        id
    }

    /// Remove a client
    ///
    /// Anything still queued for it is released. When the last client
    /// leaves, the channel goes idle and the producer is told to stop.
    pub fn disconnect(&mut self, id: ClientId) -> Result<()> {
        let index = self
            .clients
            .iter()
            .position(|c| c.id() == id)
            .ok_or(Error::UnknownClient(id))?;
        let client = self.clients.remove(index);

        tracing::info!(
            client = %id,
            clients = self.clients.len(),
            pending = client.pipe().len(),
            connected_secs = client.duration().as_secs(),
            "Client disconnected"
        );
        drop(client);

        if self.is_connected() {
            return Ok(());
        }

        self.stream_id = None;
        self.geometry = None;
        tracing::info!("Last client gone, stopping stream");
        self.producer.request_start_stop(&[]);
        Ok(())
    }

    /// Switch to a new stream format
    ///
    /// The old stream is always destroyed. The surface is recreated only
    /// when the size changes.
    pub fn change_format(&mut self, format: StreamFormat) {
        self.push_all(|| PipeItem::StreamDestroy);

        let geometry = format.geometry();
        if geometry != self.geometry {
            if self.geometry.is_some() {
                self.push_all(|| PipeItem::SurfaceDestroy);
            }
            self.geometry = geometry;
            if let Some(geometry) = geometry {
                self.push_all(|| PipeItem::SurfaceCreate(geometry));
                self.push_all(|| PipeItem::MonitorsConfig(geometry));
                self.push_all(|| PipeItem::Mark);
            }
        }

        let id = StreamId::after(self.stream_id);
        self.stream_id = Some(id);

        tracing::info!(
            stream_id = %id,
            width = format.width,
            height = format.height,
            codec = %format.codec,
            "Stream format changed"
        );

        self.push_all(|| PipeItem::StreamCreate { id, format });
        self.push_all(|| PipeItem::StreamActivateMetrics);
    }

    /// Tear down the stream and surface
    ///
    /// With clients still connected the producer is asked to start a fresh
    /// stream, so streaming resumes without a reconnect.
    pub fn reset(&mut self) {
        self.push_all(|| PipeItem::StreamDestroy);
        if self.geometry.is_some() {
            self.push_all(|| PipeItem::SurfaceDestroy);
        }

        self.stream_id = None;
        self.geometry = None;

        tracing::info!(clients = self.clients.len(), "Stream channel reset");

        if !self.is_connected() {
            return;
        }
        self.request_stream_start();
    }

    /// Fan an encoded frame out to every client
    ///
    /// Returns `false` when there is no active stream; this happens when
    /// the producer has not yet seen a stop request and is not an error.
    pub fn send_data(&mut self, payload: Bytes, mm_time: u32) -> bool {
        let Some(stream_id) = self.stream_id else {
            tracing::trace!(
                size = payload.len(),
                mm_time = mm_time,
                "Data received without active stream, dropped"
            );
            return false;
        };

        tracing::trace!(
            stream_id = %stream_id,
            size = payload.len(),
            mm_time = mm_time,
            clients = self.clients.len(),
            "Sending stream data"
        );

        let data = StreamData::new(stream_id, mm_time, payload, Arc::clone(&self.queue));
        self.push_all(|| PipeItem::StreamData(data.clone()));
        true
    }

    /// Ask every client to start sending playback reports
    pub fn request_stream_report(&mut self) {
        self.push_all(|| PipeItem::StreamActivateReport);
    }

    /// Forget all smart streaming state
    pub fn clear_smart_streaming(&mut self) {
        self.metrics.clear();
        self.encoder_params = EncoderParams::default();
        tracing::debug!("Smart streaming state cleared");
    }

    /// Dispatch a message received from a client
    ///
    /// An error means the client broke the protocol and its connection
    /// should be closed.
    pub fn handle_message(&mut self, id: ClientId, msg: ClientMessage) -> Result<()> {
        if self.client(id).is_none() {
            return Err(Error::UnknownClient(id));
        }

        match msg {
            ClientMessage::Init
            | ClientMessage::PreferredCompression(_)
            | ClientMessage::PreferredVideoCodecs(_) => Ok(()),
            ClientMessage::StreamReport {
                stream_id,
                num_frames,
                num_drops,
                last_frame_delay,
                ..
            } => {
                tracing::debug!(
                    client = %id,
                    stream_id = stream_id,
                    frames = num_frames,
                    drops = num_drops,
                    last_frame_delay = last_frame_delay,
                    "Stream report"
                );
                Ok(())
            }
            ClientMessage::StreamMetric(report) => {
                self.handle_metric(&report);
                Ok(())
            }
            ClientMessage::GlDrawDone => {
                tracing::warn!(client = %id, "Client sent gl draw done");
                Err(ProtocolError::UnexpectedMessage("gl draw done").into())
            }
            ClientMessage::Unknown(msg_type) => {
                tracing::warn!(client = %id, msg_type = msg_type, "Unknown message type");
                Err(ProtocolError::UnknownMessageType(msg_type).into())
            }
        }
    }

    /// Feed a metric report into smart streaming
    pub fn handle_metric(&mut self, report: &MetricReport) -> MetricOutcome {
        if self.stream_id.map(StreamId::get) != Some(report.stream_id) {
            tracing::warn!(
                reported = report.stream_id,
                live = ?self.stream_id,
                "Metric for invalid stream id"
            );
            return MetricOutcome::Rejected(RejectReason::StaleStream {
                reported: report.stream_id,
                live: self.stream_id,
            });
        }
        if !self.producer.has_adjust() {
            tracing::warn!(stream_id = report.stream_id, "No adjust callback for metric");
            return MetricOutcome::Rejected(RejectReason::NoAdjustCallback);
        }
        let Some(kind) = report.kind() else {
            tracing::warn!(metric_id = report.metric_id, "Unknown metric");
            return MetricOutcome::Rejected(RejectReason::UnknownMetric(report.metric_id));
        };

        let smart = &self.config.smart;
        let sample = self.metrics.record_sample(
            kind,
            report.value,
            report.duration_ms,
            smart.acceptance_range(kind),
            smart.metric_percent,
        );

        tracing::debug!(
            metric = %kind,
            value = sample.value,
            average = sample.average,
            raw = report.value,
            duration_ms = report.duration_ms,
            accepted = sample.accepted,
            "Metric received"
        );

        let Some(adjustment) = evaluate(
            kind,
            sample.value,
            sample.average,
            &self.metrics,
            &self.encoder_params,
            smart,
        ) else {
            return MetricOutcome::Unchanged;
        };

        tracing::info!(
            param = %adjustment.param.encoder_param(),
            from = adjustment.from,
            to = adjustment.to,
            target = adjustment.target,
            reason = adjustment.reason,
            "Smart streaming adjustment"
        );

        let adjusted = adjustment.apply(&self.encoder_params);
        let changes = adjusted.changes_from(&self.encoder_params);
        for &(param, value) in &changes {
            self.producer.adjust(param, value);
        }
        self.encoder_params = adjusted;

        MetricOutcome::Adjusted(changes)
    }

    /// Send everything queued for one client
    pub fn drain_client(&mut self, id: ClientId) -> Result<DrainSummary> {
        let config = &self.config;
        let client = self
            .clients
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(Error::UnknownClient(id))?;
        client.drain(config)
    }

    /// Send everything queued for every client
    ///
    /// Returns the clients whose link failed; they are left connected so
    /// the caller can decide how to tear them down.
    pub fn drain_all(&mut self) -> Vec<ClientId> {
        let config = &self.config;
        self.clients
            .iter_mut()
            .filter_map(|client| client.drain(config).err().map(|_| client.id()))
            .collect()
    }

    fn push_all<F>(&mut self, mut item: F)
    where
        F: FnMut() -> PipeItem,
    {
        for client in &mut self.clients {
            client.push(item());
        }
    }

    fn request_stream_start(&mut self) {
        let codecs = self.supported_codecs();
        tracing::debug!(codecs = ?codecs, "Requesting stream start");
        self.producer.request_start_stop(&codecs);
    }
}

impl Default for StreamChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamChannel")
            .field("stream_id", &self.stream_id)
            .field("geometry", &self.geometry)
            .field("clients", &self.clients)
            .field("queue", &self.queue)
            .field("encoder_params", &self.encoder_params)
            .field("producer", &self.producer)
            .finish_non_exhaustive()
    }
}
