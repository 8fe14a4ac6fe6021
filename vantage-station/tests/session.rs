use std::time::Duration;

use tokio::time::timeout;

use vantage_station::station::{LinkState, Station, StationError};
use vantage_station::transport::mock::MockTransport;

fn put_u16_le(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// 99-byte LOOP frame with a known value at every documented offset.
fn crafted_frame() -> Vec<u8> {
    let mut frame = vec![0u8; 99];
    frame[..3].copy_from_slice(b"LOO");
    put_u16_le(&mut frame, 7, 29_000); // 29.000 inHg
    put_u16_le(&mut frame, 9, 720); // 72.0 °F
    frame[11] = 45;
    put_u16_le(&mut frame, 12, 320); // 32.0 °F
    frame[14] = 10; // mph
    put_u16_le(&mut frame, 16, 270);
    frame[33] = 80;
    put_u16_le(&mut frame, 41, 10); // rain rate clicks
    put_u16_le(&mut frame, 50, 5); // day rain clicks
    frame[89] = 6;
    put_u16_le(&mut frame, 97, 0xBEEF);
    frame
}

#[tokio::test]
async fn end_to_end_reading_is_converted_and_stamped() {
    let transport = MockTransport::silent();
    let handle = transport.handle();
    let mut station = Station::new(transport, Duration::ZERO);
    let mut loop_rx = station.subscribe_loop().await;

    let before = jiff::Timestamp::now();
    station.open().await.unwrap();
    handle.inject(&crafted_frame()).await;

    let reading = timeout(Duration::from_secs(1), loop_rx.recv())
        .await
        .expect("reading should arrive")
        .expect("stream should stay open");
    let after = jiff::Timestamp::now();

    assert!((reading.barometer_hpa - 982.0525664).abs() < 1e-9);
    assert!((reading.in_temperature_c - 200.0 / 9.0).abs() < 1e-9);
    assert_eq!(reading.in_humidity_pct, 45);
    assert_eq!(reading.out_temperature_c, 0.0);
    assert!((reading.wind_speed_kmh - 16.09344).abs() < 1e-9);
    assert_eq!(reading.wind_direction_deg, 270);
    assert_eq!(reading.out_humidity_pct, 80);
    assert_eq!(reading.day_rain_mm, 1.0);
    assert_eq!(reading.rain_rate_mm, 2.0);
    assert_eq!(reading.forecast, 6);
    assert!(reading.timestamp >= before && reading.timestamp <= after);
}

#[tokio::test]
async fn ack_prefixed_first_frame_decodes_identically() {
    let transport = MockTransport::silent();
    let handle = transport.handle();
    let mut station = Station::new(transport, Duration::ZERO);
    let mut loop_rx = station.subscribe_loop().await;

    station.open().await.unwrap();

    let mut coalesced = vec![0x06];
    coalesced.extend_from_slice(&crafted_frame());
    handle.inject(&coalesced).await;

    let reading = timeout(Duration::from_secs(1), loop_rx.recv())
        .await
        .expect("reading should arrive")
        .expect("stream should stay open");
    assert_eq!(reading.out_temperature_c, 0.0);
    assert_eq!(reading.wind_direction_deg, 270);
}

#[tokio::test]
async fn readings_preserve_delivery_order() {
    let transport = MockTransport::silent();
    let handle = transport.handle();
    let mut station = Station::new(transport, Duration::ZERO);
    let mut loop_rx = station.subscribe_loop().await;

    station.open().await.unwrap();

    let mut first = crafted_frame();
    put_u16_le(&mut first, 16, 10);
    let mut second = crafted_frame();
    put_u16_le(&mut second, 16, 20);
    let mut chunk = first;
    chunk.extend_from_slice(&second);
    handle.inject(&chunk).await;

    let a = timeout(Duration::from_secs(1), loop_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let b = timeout(Duration::from_secs(1), loop_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a.wind_direction_deg, 10);
    assert_eq!(b.wind_direction_deg, 20);
}

#[tokio::test]
async fn garbage_chunks_emit_nothing() {
    let transport = MockTransport::silent();
    let handle = transport.handle();
    let mut station = Station::new(transport, Duration::ZERO);
    let mut loop_rx = station.subscribe_loop().await;

    station.open().await.unwrap();
    handle.inject(&[0xDE; 120]).await;
    handle.inject(b"garbage that is not a packet").await;

    let result = timeout(Duration::from_millis(100), loop_rx.recv()).await;
    assert!(result.is_err(), "no reading should be emitted for noise");
}

#[tokio::test]
async fn commands_require_an_open_link() {
    let station = Station::new(MockTransport::silent(), Duration::ZERO);
    assert!(matches!(
        station.send_command("LOOP 1").await,
        Err(StationError::NotConnected)
    ));
    assert!(matches!(
        station.request_loop().await,
        Err(StationError::NotConnected)
    ));
}

#[tokio::test]
async fn commands_are_newline_terminated() {
    let transport = MockTransport::silent();
    let handle = transport.handle();
    let mut station = Station::new(transport, Duration::ZERO);

    station.open().await.unwrap();
    station.request_loop().await.unwrap();
    station.set_lamp(true).await.unwrap();
    station.set_lamp(false).await.unwrap();
    station.request_dump().await.unwrap();

    let written = handle.written().await;
    assert_eq!(written[0], b"LOOP 1\n");
    assert_eq!(written[1], b"LAMPS 1\n");
    assert_eq!(written[2], b"LAMPS 0\n");
    assert_eq!(written[3], b"DMP\n");
}

#[tokio::test]
async fn failed_open_reports_the_error() {
    let mut station = Station::new(MockTransport::failing("bridge down"), Duration::ZERO);
    let mut connect_rx = station.subscribe_connect().await;

    let result = station.open().await;
    assert!(matches!(result, Err(StationError::Transport(_))));
    assert_eq!(station.state().await, LinkState::Disconnected);

    let event = timeout(Duration::from_secs(1), connect_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let error = event.error.expect("connect event should carry the error");
    assert!(error.contains("bridge down"));
}

#[tokio::test]
async fn successful_open_reports_no_error() {
    let mut station = Station::new(MockTransport::silent(), Duration::ZERO);
    let mut connect_rx = station.subscribe_connect().await;

    station.open().await.unwrap();
    assert_eq!(station.state().await, LinkState::Connected);

    let event = timeout(Duration::from_secs(1), connect_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(event.error.is_none());
}

#[tokio::test]
async fn reopening_a_connected_station_fails() {
    let mut station = Station::new(MockTransport::silent(), Duration::ZERO);
    station.open().await.unwrap();
    assert!(matches!(
        station.open().await,
        Err(StationError::AlreadyConnected)
    ));
}

#[tokio::test(start_paused = true)]
async fn poller_issues_loop_requests_until_close() {
    let transport = MockTransport::silent();
    let handle = transport.handle();
    let mut station = Station::new(transport, Duration::from_millis(50));

    station.open().await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;

    let polled = handle.written().await.len();
    assert!(polled >= 2, "expected repeated polls, saw {polled}");
    assert!(
        handle.written().await.iter().all(|w| w == b"LOOP 1\n"),
        "poller should only issue LOOP 1"
    );

    station.close().await;
    // Let any in-flight tick settle before taking the baseline.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let baseline = handle.written().await.len();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        handle.written().await.len(),
        baseline,
        "no polls may be issued after close"
    );
}

#[tokio::test]
async fn auto_polling_round_trip_with_mock_console() {
    let mut station = Station::new(MockTransport::new(), Duration::from_millis(20));
    let mut loop_rx = station.subscribe_loop().await;

    station.open().await.unwrap();

    let reading = timeout(Duration::from_secs(2), loop_rx.recv())
        .await
        .expect("poller should trigger a synthesized packet")
        .expect("stream should stay open");

    // Synthesized raw values stay inside plausible instrument ranges.
    assert!(reading.barometer_hpa > 900.0 && reading.barometer_hpa < 1100.0);
    assert!(reading.out_humidity_pct >= 20 && reading.out_humidity_pct < 95);
    assert!(reading.wind_speed_kmh >= 0.0);

    station.close().await;
}
