//! Bridge event loop tests on the real clock.

use std::sync::Arc;
use std::time::Duration;

use relay_cover_bridge::{Bridge, BridgeOptions};
use relay_cover_common::channel::RecordingChannel;
use relay_cover_common::config::parse_config;
use relay_cover_common::cover::Position;
use relay_cover_engine::MonotonicClock;
use tokio::io::{AsyncWriteExt, BufReader};

const CONFIG: &str = r#"
    [runtime]
    report_interval_ms = 50

    [covers.hall]
    opening_time = 60
    closing_time = 60
    mqtt_command_topic = "relay/hall/set"
    mqtt_payload_open = "OPEN"
    mqtt_payload_close = "CLOSE"
    mqtt_payload_stop = "STOP"

    [covers.attic]
    opening_time = 600000
    mqtt_command_topic = "relay/attic/set"
    mqtt_payload_open = "OPEN"
    mqtt_payload_close = "CLOSE"
    mqtt_payload_stop = "STOP"
"#;

fn bridge(
    state_file: Option<std::path::PathBuf>,
) -> (Bridge<MonotonicClock>, RecordingChannel) {
    let config = parse_config(CONFIG).unwrap();
    let channel = RecordingChannel::new();
    let options = BridgeOptions {
        report_interval: config.runtime.report_interval(),
        state_file,
    };
    let bridge = Bridge::new(config.covers, options, MonotonicClock, Arc::new(channel.clone()));
    (bridge, channel)
}

fn relay(channel: &RecordingChannel, topic: &str) -> Vec<String> {
    channel
        .published()
        .into_iter()
        .filter(|p| p.topic == topic)
        .map(|p| p.payload)
        .collect()
}

#[tokio::test]
async fn eof_stops_moving_covers() {
    let (mut bridge, channel) = bridge(None);
    let input = BufReader::new(&b"attic open\n# done\n"[..]);
    bridge
        .run(input, std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(relay(&channel, "relay/attic/set"), vec!["OPEN", "STOP"]);
    assert!(!bridge.runtime().any_moving());
    assert_eq!(bridge.runtime().stats().commands, 1);
}

#[tokio::test]
async fn timer_settles_cover_while_input_open() {
    let (mut bridge, channel) = bridge(None);
    let (mut writer, reader) = tokio::io::duplex(256);
    writer.write_all(b"hall open\nnope open\n").await.unwrap();

    bridge
        .run(
            BufReader::new(reader),
            tokio::time::sleep(Duration::from_millis(400)),
        )
        .await
        .unwrap();
    drop(writer);

    assert_eq!(relay(&channel, "relay/hall/set"), vec!["OPEN", "STOP"]);
    let hall = bridge.runtime().cover("hall").unwrap();
    assert_eq!(hall.position(), Position::OPEN);
    assert_eq!(bridge.runtime().stats().timers_fired, 1);
    assert_eq!(bridge.runtime().stats().refused, 1);
}

#[tokio::test]
async fn shutdown_saves_positions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("positions.bin");

    let (mut first, _) = bridge(Some(path.clone()));
    let input = BufReader::new(&b"attic calibrate 40\n"[..]);
    first
        .run(input, std::future::pending::<()>())
        .await
        .unwrap();

    let (restored, _) = bridge(Some(path));
    let attic = restored.runtime().cover("attic").unwrap();
    assert!((attic.position().value() - 0.4).abs() < 1e-9);
}
