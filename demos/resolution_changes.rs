//! Resolution changes - recreate the primary surface endlessly
//!
//! Run with: cargo run --example resolution_changes -- [ITERATIONS]
//!
//! Every 100ms the producer tears the stream down and announces a new
//! format whose size follows a circle around 800x600. A single in-process
//! client logs what it receives, and metric reports are fed back so the
//! smart streaming adjustments show up in the log.
//!
//! ```text
//!   producer loop ──► ChannelHandle ──► ChannelDriver ──► client task
//!       ▲                                   │                 │
//!       └──── start/stop, encoder adjust ───┘ ◄── metrics ────┘
//! ```
//!
//! Use `RUST_LOG=stream_channel=trace` to see every pipe item.

use std::time::Duration;

use bytes::Bytes;
use stream_channel::protocol::{
    ClientMessage, DisplayCaps, MetricKind, MetricReport, ServerMessage, StreamFormat, VideoCodec,
};
use stream_channel::{ChannelDriver, DriverConfig, StreamChannel};

const DEFAULT_ITERATIONS: u32 = 60;
const TICK: Duration = Duration::from_millis(100);

/// Surface size for step `count`
fn primary_size(count: u32) -> (u32, u32) {
    let phase = count as f32 / 6.0;
    let width = 800.0 + phase.sin() * 200.0;
    let height = 600.0 + phase.cos() * 200.0;
    (width as u32, height as u32)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stream_channel=info".parse()?),
        )
        .init();

    let iterations = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => DEFAULT_ITERATIONS,
    };

    let mut channel = StreamChannel::new();
    channel.on_stream_start_stop(Box::new(|codecs| {
        if codecs.is_empty() {
            tracing::info!("Producer: stop");
        } else {
            tracing::info!(codecs = ?codecs, "Producer: start");
        }
    }));
    channel.on_encoder_adjust(Box::new(|param, value| {
        tracing::info!(param = %param, value = value, "Producer: encoder adjusted");
    }));
    channel.on_queue_stat_changed(Box::new(|stat| {
        tracing::trace!(items = stat.num_items, bytes = stat.size_bytes, "Producer: queue");
    }));

    let (handle, driver) = ChannelDriver::spawn(channel, &DriverConfig::default());

    let caps = DisplayCaps::MONITORS_CONFIG
        | DisplayCaps::METRICS
        | DisplayCaps::CODEC_MJPEG
        | DisplayCaps::CODEC_VP8;
    let (client, mut messages) = handle.connect(caps).await?;

    let client_handle = handle.clone();
    let client_task = tokio::spawn(async move {
        let mut frames = 0u32;
        while let Some(msg) = messages.recv().await {
            match msg {
                ServerMessage::StreamCreate(create) => {
                    tracing::info!(
                        stream_id = %create.id,
                        width = create.stream_width,
                        height = create.stream_height,
                        "Client: stream created"
                    );
                    frames = 0;
                }
                ServerMessage::StreamData(data) => {
                    frames += 1;
                    let report = MetricReport::new(
                        data.stream_id().get(),
                        MetricKind::FramesDisplayedPerSecond,
                        frames * 10,
                        1000,
                    );
                    let msg = ClientMessage::StreamMetric(report);
                    if client_handle.client_message(client, msg).await.is_err() {
                        break;
                    }
                }
                other => tracing::debug!(msg = other.name(), "Client: received"),
            }
        }
    });

    let mut ticker = tokio::time::interval(TICK);
    for count in 0..iterations {
        ticker.tick().await;

        let (width, height) = primary_size(count);
        handle.reset().await?;
        handle
            .change_format(StreamFormat::new(width, height, VideoCodec::Vp8))
            .await?;
        handle
            .send_data(Bytes::from(vec![0u8; (width * height / 100) as usize]), count)
            .await?;
    }

    let stat = handle.queue_stat().await?;
    tracing::info!(items = stat.num_items, bytes = stat.size_bytes, "Done");

    handle.disconnect(client).await?;
    handle.shutdown().await?;
    driver.await?;
    client_task.await?;

    Ok(())
}
