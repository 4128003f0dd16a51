//! End-to-end channel scenarios driven through the public API

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use stream_channel::protocol::constants::NUM_STREAMS;
use stream_channel::protocol::{
    ClientMessage, DisplayCaps, MetricKind, MetricReport, ServerMessage, StreamFormat, StreamId,
    VideoCodec,
};
use stream_channel::session::{PipeItem, PipeItemKind};
use stream_channel::{
    ChannelState, ClientLink, EncoderParam, MetricOutcome, QueueStat, Result, StreamChannel,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

type Sent = Arc<Mutex<Vec<ServerMessage>>>;

fn recording_link() -> (Box<dyn ClientLink>, Sent) {
    let sent: Sent = Arc::default();
    let sink = Arc::clone(&sent);
    let link = move |msg: ServerMessage| -> Result<()> {
        sink.lock().unwrap().push(msg);
        Ok(())
    };
    (Box::new(link), sent)
}

fn null_link() -> Box<dyn ClientLink> {
    Box::new(|_msg: ServerMessage| -> Result<()> { Ok(()) })
}

#[test]
fn test_two_client_lifecycle() {
    init_tracing();

    let start_stop = Arc::new(Mutex::new(Vec::<Vec<VideoCodec>>::new()));
    let sink = Arc::clone(&start_stop);

    let mut channel = StreamChannel::new();
    channel.on_stream_start_stop(Box::new(move |codecs| {
        sink.lock().unwrap().push(codecs.to_vec())
    }));
    let caps = DisplayCaps::MONITORS_CONFIG | DisplayCaps::METRICS | DisplayCaps::CODEC_VP8;

    let (link_a, _) = recording_link();
    let a = channel.connect(caps, link_a);
    let format = StreamFormat::new(800, 600, VideoCodec::Vp8);
    channel.change_format(format);

    assert_eq!(
        channel.pipe_items(a).unwrap(),
        vec![
            PipeItemKind::StreamDestroy,
            PipeItemKind::SurfaceCreate,
            PipeItemKind::MonitorsConfig,
            PipeItemKind::Mark,
            PipeItemKind::StreamCreate,
            PipeItemKind::StreamActivateMetrics,
        ]
    );
    let created = channel
        .pipe(a)
        .unwrap()
        .iter()
        .find_map(|item| match item {
            PipeItem::StreamCreate { id, format } => Some((*id, *format)),
            _ => None,
        });
    assert_eq!(created, Some((StreamId::FIRST, format)));

    let (link_b, _) = recording_link();
    let b = channel.connect(caps, link_b);
    assert_eq!(
        channel.pipe_items(b).unwrap(),
        vec![
            PipeItemKind::SurfaceCreate,
            PipeItemKind::MonitorsConfig,
            PipeItemKind::FillSurface,
            PipeItemKind::Mark,
        ]
    );

    channel.disconnect(a).unwrap();
    assert_eq!(channel.state(), ChannelState::Streaming);
    channel.disconnect(b).unwrap();
    assert_eq!(channel.state(), ChannelState::Idle);

    let start_stop = start_stop.lock().unwrap();
    assert_eq!(start_stop.len(), 3);
    assert!(start_stop[0].contains(&VideoCodec::Vp8));
    assert_eq!(start_stop.last(), Some(&Vec::new()));
}

#[test]
fn test_late_client_gets_surface_before_next_stream() {
    init_tracing();

    let mut channel = StreamChannel::new();
    channel.connect(DisplayCaps::empty(), null_link());
    channel.change_format(StreamFormat::new(640, 480, VideoCodec::Mjpeg));
    channel.drain_all();

    let (link_b, sent_b) = recording_link();
    let b = channel.connect(DisplayCaps::empty(), link_b);
    channel.send_data(Bytes::from_static(b"ignored by no one"), 10);
    channel.drain_client(b).unwrap();

    let names: Vec<_> = sent_b.lock().unwrap().iter().map(ServerMessage::name).collect();
    assert_eq!(names, vec!["surface_create", "draw_fill", "mark", "stream_data"]);
}

#[test]
fn test_queue_stat_balances_across_clients() {
    init_tracing();

    let history = Arc::new(Mutex::new(Vec::<QueueStat>::new()));
    let sink = Arc::clone(&history);

    let mut channel = StreamChannel::new();
    channel.on_queue_stat_changed(Box::new(move |stat| sink.lock().unwrap().push(stat)));

    let (link_b, sent_b) = recording_link();
    let a = channel.connect(DisplayCaps::empty(), null_link());
    let b = channel.connect(DisplayCaps::empty(), link_b);
    channel.change_format(StreamFormat::new(320, 240, VideoCodec::Mjpeg));

    for (i, size) in [10usize, 20, 30].into_iter().enumerate() {
        channel.send_data(Bytes::from(vec![0u8; size]), i as u32);
    }
    assert_eq!(
        channel.queue_stat(),
        QueueStat {
            num_items: 3,
            size_bytes: 60
        }
    );

    channel.drain_client(a).unwrap();
    channel.drain_client(b).unwrap();
    // client b's transport still holds the frames it was handed
    assert_eq!(channel.queue_stat().num_items, 3);

    sent_b.lock().unwrap().clear();
    assert!(channel.queue_stat().is_empty());

    let history = history.lock().unwrap();
    assert_eq!(history.len(), 6);
    assert_eq!(history.last(), Some(&QueueStat::default()));
    let peak = history.iter().map(|s| s.size_bytes).max();
    assert_eq!(peak, Some(60));
}

#[test]
fn test_stream_ids_wrap() {
    let mut channel = StreamChannel::new();
    let mut seen = Vec::new();

    for _ in 0..=NUM_STREAMS {
        channel.change_format(StreamFormat::new(800, 600, VideoCodec::H264));
        seen.push(channel.stream_id().map(StreamId::get));
    }

    assert_eq!(seen[0], Some(0));
    assert_eq!(seen[NUM_STREAMS as usize - 1], Some(NUM_STREAMS - 1));
    assert_eq!(seen[NUM_STREAMS as usize], Some(0));
}

#[test]
fn test_metric_feedback_loop() {
    init_tracing();

    let adjustments = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&adjustments);

    let mut channel = StreamChannel::new();
    channel.on_encoder_adjust(Box::new(move |param, value| {
        sink.lock().unwrap().push((param, value))
    }));
    let client = channel.connect(DisplayCaps::METRICS, null_link());
    channel.change_format(StreamFormat::new(800, 600, VideoCodec::Vp9));

    for _ in 0..20 {
        let report = MetricReport::new(0, MetricKind::BytesReceivedPerSecond, 80_000, 1000);
        channel
            .handle_message(client, ClientMessage::StreamMetric(report))
            .unwrap();
    }

    let bps = channel.encoder_params().average_bytes_per_second;
    assert!(bps > 60_000 && bps <= 80_000, "bps = {bps}");
    assert!(adjustments
        .lock()
        .unwrap()
        .iter()
        .all(|(param, _)| *param == EncoderParam::AverageBytesPerSecond));

    // a report for the previous stream is ignored
    channel.change_format(StreamFormat::new(800, 600, VideoCodec::Vp9));
    let stale = MetricReport::new(0, MetricKind::BytesReceivedPerSecond, 10_000, 1000);
    assert!(matches!(
        channel.handle_metric(&stale),
        MetricOutcome::Rejected(_)
    ));
    assert_eq!(channel.encoder_params().average_bytes_per_second, bps);
}
