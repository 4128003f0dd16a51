//! Single-task channel driver
//!
//! The [`StreamChannel`] is not shared between tasks. One driver task owns
//! it and applies commands in arrival order; producers and client
//! transports talk to it through cloneable [`ChannelHandle`]s. After every
//! command all client pipes are flushed to their links.

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::channel::{ChannelState, StreamChannel};
use crate::error::{Error, Result};
use crate::protocol::{ClientMessage, DisplayCaps, ServerMessage, StreamFormat};
use crate::session::{ClientId, ClientLink};
use crate::smart::EncoderParams;
use crate::stats::QueueStat;

use super::config::DriverConfig;
use super::link::ChannelLink;

type Reply<T> = oneshot::Sender<T>;

/// Requests applied by the driver task
#[derive(Debug)]
pub enum ChannelCommand {
    Connect {
        caps: DisplayCaps,
        reply: Reply<(ClientId, mpsc::UnboundedReceiver<ServerMessage>)>,
    },
    Disconnect {
        client: ClientId,
        reply: Reply<Result<()>>,
    },
    ChangeFormat(StreamFormat),
    Reset,
    SendData {
        payload: Bytes,
        mm_time: u32,
    },
    Message {
        client: ClientId,
        msg: ClientMessage,
        reply: Reply<Result<()>>,
    },
    RequestStreamReport,
    ClearSmartStreaming,
    QueueStat(Reply<QueueStat>),
    State(Reply<ChannelState>),
    EncoderParams(Reply<EncoderParams>),
    Shutdown,
}

/// Task owning a [`StreamChannel`]
pub struct ChannelDriver {
    channel: StreamChannel,
    commands: mpsc::Receiver<ChannelCommand>,
}

impl ChannelDriver {
    /// Create a driver for `channel` and the first handle to it
    ///
    /// Producer callbacks must be registered on `channel` beforehand.
    pub fn new(channel: StreamChannel, config: &DriverConfig) -> (Self, ChannelHandle) {
        let (tx, rx) = mpsc::channel(config.command_capacity.max(1));
        (
            Self {
                channel,
                commands: rx,
            },
            ChannelHandle { tx },
        )
    }

    /// Spawn the driver on the current runtime
    pub fn spawn(channel: StreamChannel, config: &DriverConfig) -> (ChannelHandle, JoinHandle<()>) {
        let (driver, handle) = Self::new(channel, config);
        let task = tokio::spawn(driver.run());
        (handle, task)
    }

    /// Apply commands until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        tracing::info!("Channel driver started");

        while let Some(command) = self.commands.recv().await {
            if !self.apply(command) {
                break;
            }
            self.flush();
        }

        tracing::info!(clients = self.channel.client_count(), "Channel driver stopped");
    }

    /// Returns `false` on shutdown
    fn apply(&mut self, command: ChannelCommand) -> bool {
        match command {
            ChannelCommand::Connect { caps, reply } => {
                let mut rx = None;
                let client = self.channel.connect_with(caps, |client| {
                    let (link, link_rx) = ChannelLink::new(client);
                    rx = Some(link_rx);
                    Box::new(link) as Box<dyn ClientLink>
                });
                if let Some(rx) = rx {
                    if reply.send((client, rx)).is_err() {
                        tracing::debug!(client = %client, "Connect caller went away");
                        let _ = self.channel.disconnect(client);
                    }
                }
            }
            ChannelCommand::Disconnect { client, reply } => {
                let _ = reply.send(self.channel.disconnect(client));
            }
            ChannelCommand::ChangeFormat(format) => self.channel.change_format(format),
            ChannelCommand::Reset => self.channel.reset(),
            ChannelCommand::SendData { payload, mm_time } => {
                self.channel.send_data(payload, mm_time);
            }
            ChannelCommand::Message { client, msg, reply } => {
                let result = self.channel.handle_message(client, msg);
                if let Err(Error::Protocol(e)) = &result {
                    tracing::warn!(client = %client, error = %e, "Disconnecting client");
                    let _ = self.channel.disconnect(client);
                }
                let _ = reply.send(result);
            }
            ChannelCommand::RequestStreamReport => self.channel.request_stream_report(),
            ChannelCommand::ClearSmartStreaming => self.channel.clear_smart_streaming(),
            ChannelCommand::QueueStat(reply) => {
                let _ = reply.send(self.channel.queue_stat());
            }
            ChannelCommand::State(reply) => {
                let _ = reply.send(self.channel.state());
            }
            ChannelCommand::EncoderParams(reply) => {
                let _ = reply.send(*self.channel.encoder_params());
            }
            ChannelCommand::Shutdown => {
                tracing::debug!("Channel driver shutdown requested");
                return false;
            }
        }
        true
    }

    /// Send pending items, dropping clients whose link is gone
    fn flush(&mut self) {
        for client in self.channel.drain_all() {
            tracing::info!(client = %client, "Client link closed");
            let _ = self.channel.disconnect(client);
        }
    }
}

/// Cloneable front end of a running [`ChannelDriver`]
///
/// Every method fails with [`Error::DriverClosed`] once the driver task
/// has stopped.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    tx: mpsc::Sender<ChannelCommand>,
}

impl ChannelHandle {
    /// Connect a client advertising `caps`
    ///
    /// Messages for the client arrive on the returned receiver; dropping
    /// it disconnects the client at the next flush.
    pub async fn connect(
        &self,
        caps: DisplayCaps,
    ) -> Result<(ClientId, mpsc::UnboundedReceiver<ServerMessage>)> {
        self.request(|reply| ChannelCommand::Connect { caps, reply })
            .await
    }

    pub async fn disconnect(&self, client: ClientId) -> Result<()> {
        self.request(|reply| ChannelCommand::Disconnect { client, reply })
            .await?
    }

    pub async fn change_format(&self, format: StreamFormat) -> Result<()> {
        self.send(ChannelCommand::ChangeFormat(format)).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(ChannelCommand::Reset).await
    }

    pub async fn send_data(&self, payload: Bytes, mm_time: u32) -> Result<()> {
        self.send(ChannelCommand::SendData { payload, mm_time })
            .await
    }

    /// Deliver a message received from `client`
    ///
    /// A protocol error disconnects the client before it is returned.
    pub async fn client_message(&self, client: ClientId, msg: ClientMessage) -> Result<()> {
        self.request(|reply| ChannelCommand::Message { client, msg, reply })
            .await?
    }

    pub async fn request_stream_report(&self) -> Result<()> {
        self.send(ChannelCommand::RequestStreamReport).await
    }

    pub async fn clear_smart_streaming(&self) -> Result<()> {
        self.send(ChannelCommand::ClearSmartStreaming).await
    }

    pub async fn queue_stat(&self) -> Result<QueueStat> {
        self.request(ChannelCommand::QueueStat).await
    }

    pub async fn state(&self) -> Result<ChannelState> {
        self.request(ChannelCommand::State).await
    }

    pub async fn encoder_params(&self) -> Result<EncoderParams> {
        self.request(ChannelCommand::EncoderParams).await
    }

    /// Stop the driver; connected clients are dropped with it
    pub async fn shutdown(&self) -> Result<()> {
        self.send(ChannelCommand::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, command: ChannelCommand) -> Result<()> {
        self.tx.send(command).await?;
        Ok(())
    }

    async fn request<T, F>(&self, command: F) -> Result<T>
    where
        F: FnOnce(Reply<T>) -> ChannelCommand,
    {
        let (reply, rx) = oneshot::channel();
        self.send(command(reply)).await?;
        Ok(rx.await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio_test::{assert_err, assert_ok};

    use crate::error::ProtocolError;
    use crate::protocol::{MetricKind, MetricReport, VideoCodec};

    use super::*;

    fn spawn(channel: StreamChannel) -> (ChannelHandle, JoinHandle<()>) {
        ChannelDriver::spawn(channel, &DriverConfig::default())
    }

    async fn next_name(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> &'static str {
        rx.recv().await.map(|m| m.name()).unwrap_or("closed")
    }

    #[tokio::test]
    async fn test_connect_and_stream() {
        let (handle, _task) = spawn(StreamChannel::new());
        let (_client, mut rx) = handle.connect(DisplayCaps::METRICS).await.unwrap();

        assert_ok!(
            handle
                .change_format(StreamFormat::new(640, 480, VideoCodec::Vp8))
                .await
        );

        assert_eq!(next_name(&mut rx).await, "surface_create");
        assert_eq!(next_name(&mut rx).await, "mark");
        assert_eq!(next_name(&mut rx).await, "stream_create");
        assert_eq!(next_name(&mut rx).await, "stream_activate_metrics");
        assert_eq!(handle.state().await.unwrap(), ChannelState::Streaming);
    }

    #[tokio::test]
    async fn test_queue_released_when_receiver_drops_message() {
        let (handle, _task) = spawn(StreamChannel::new());
        let (_client, mut rx) = handle.connect(DisplayCaps::empty()).await.unwrap();
        handle
            .change_format(StreamFormat::new(320, 240, VideoCodec::Mjpeg))
            .await
            .unwrap();
        handle
            .send_data(Bytes::from_static(b"frame"), 7)
            .await
            .unwrap();

        let stat = handle.queue_stat().await.unwrap();
        assert_eq!(stat.num_items, 1);
        assert_eq!(stat.size_bytes, 5);

        let mut data = None;
        while let Some(msg) = rx.recv().await {
            if let ServerMessage::StreamData(frame) = msg {
                data = Some(frame);
                break;
            }
        }
        let data = data.unwrap();
        assert_eq!(data.mm_time(), 7);
        drop(data);

        assert!(handle.queue_stat().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_link_disconnects_client() {
        let stops = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&stops);
        let mut channel = StreamChannel::new();
        channel.on_stream_start_stop(Box::new(move |codecs| {
            if codecs.is_empty() {
                *sink.lock().unwrap() += 1;
            }
        }));

        let (handle, _task) = spawn(channel);
        let (client, rx) = handle.connect(DisplayCaps::empty()).await.unwrap();
        drop(rx);

        handle
            .change_format(StreamFormat::new(320, 240, VideoCodec::Mjpeg))
            .await
            .unwrap();

        assert_eq!(handle.state().await.unwrap(), ChannelState::Idle);
        assert_eq!(*stops.lock().unwrap(), 1);
        assert!(matches!(
            handle.disconnect(client).await,
            Err(Error::UnknownClient(_))
        ));
    }

    #[tokio::test]
    async fn test_protocol_error_disconnects_client() {
        let (handle, _task) = spawn(StreamChannel::new());
        let (client, mut rx) = handle.connect(DisplayCaps::empty()).await.unwrap();

        let err = handle
            .client_message(client, ClientMessage::GlDrawDone)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnexpectedMessage(_))
        ));

        assert_eq!(next_name(&mut rx).await, "closed");
        assert_err!(handle.client_message(client, ClientMessage::Init).await);
    }

    #[tokio::test]
    async fn test_metric_adjusts_through_driver() {
        let mut channel = StreamChannel::new();
        channel.on_encoder_adjust(Box::new(|_, _| {}));
        let (handle, _task) = spawn(channel);
        let (client, _rx) = handle.connect(DisplayCaps::METRICS).await.unwrap();
        handle
            .change_format(StreamFormat::new(640, 480, VideoCodec::H264))
            .await
            .unwrap();

        let report = MetricReport::new(0, MetricKind::FramesReceivedPerSecond, 30, 1000);
        assert_ok!(
            handle
                .client_message(client, ClientMessage::StreamMetric(report))
                .await
        );

        // no sample says the client is behind: head for the 60 fps target
        let params = handle.encoder_params().await.unwrap();
        assert_eq!(params.frames_per_second, 6);

        handle.clear_smart_streaming().await.unwrap();
        assert_eq!(
            handle.encoder_params().await.unwrap(),
            EncoderParams::default()
        );
    }

    #[tokio::test]
    async fn test_shutdown() {
        let (handle, task) = spawn(StreamChannel::new());
        let (_client, mut rx) = handle.connect(DisplayCaps::empty()).await.unwrap();

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(handle.is_closed());
        assert!(matches!(handle.state().await, Err(Error::DriverClosed)));
        assert_eq!(next_name(&mut rx).await, "closed");
    }
}
