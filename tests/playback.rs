//! Playback engine tests over a fake audio sink

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{FakeSink, engine_with, tone_base64};
use radiant_compass::{Error, playback_rate};

#[tokio::test]
async fn test_tone_plays_with_rate_fix() {
    let sink = Arc::new(FakeSink::new(48_000));
    let (engine, _) = engine_with(Arc::clone(&sink));

    let report = engine.play(&tone_base64(100)).await.unwrap();

    assert!(report.completed);
    assert_eq!(report.decoded_rate, 22_050);
    assert_eq!(report.device_rate, 48_000);
    assert!((report.playback_rate - 0.436_406_25).abs() < 1e-12);

    // 2205 decoded frames, stretched to the device rate and slowed
    let expected = 2205.0 * 48_000.0 / (22_050.0 * playback_rate(48_000));
    #[allow(clippy::cast_precision_loss)]
    let frames = report.frames as f64;
    assert!(
        (frames - expected).abs() <= expected * 0.01,
        "expected about {expected} frames, got {frames}"
    );
    assert_eq!(sink.played.lock().unwrap().as_slice(), [report.frames]);
    assert!(!engine.is_playing());
}

#[tokio::test]
async fn test_nominal_device_only_damps() {
    let sink = Arc::new(FakeSink::new(22_050));
    let (engine, _) = engine_with(sink);

    let report = engine.play(&tone_base64(100)).await.unwrap();

    assert!((report.playback_rate - 0.95).abs() < 1e-12);
    #[allow(clippy::cast_precision_loss)]
    let frames = report.frames as f64;
    let expected = 2205.0 / 0.95;
    assert!((frames - expected).abs() <= expected * 0.01);
}

#[tokio::test]
async fn test_second_play_is_rejected() {
    let sink = Arc::new(FakeSink::holding(48_000, Duration::from_secs(30)));
    let (engine, _) = engine_with(sink);
    let engine = Arc::new(engine);

    let first = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.play(&tone_base64(50)).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.is_playing());

    let err = engine.play(&tone_base64(50)).await.unwrap_err();
    assert!(matches!(err, Error::Playback(_)));

    assert!(engine.stop());
    let report = first.await.unwrap().unwrap();
    assert!(!report.completed);
}

#[tokio::test]
async fn test_stop_resolves_pending_play() {
    let sink = Arc::new(FakeSink::holding(48_000, Duration::from_secs(30)));
    let (engine, _) = engine_with(sink);
    let engine = Arc::new(engine);

    let pending = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.play(&tone_base64(50)).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(engine.stop());
    let report = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .expect("stopped playback should resolve")
        .unwrap()
        .unwrap();

    assert!(!report.completed);
    assert!(!engine.is_playing());
    assert!(!engine.stop());
}

#[tokio::test]
async fn test_sink_opened_lazily_and_reused() {
    let sink = Arc::new(FakeSink::new(44_100));
    let (engine, opens) = engine_with(sink);
    assert_eq!(opens.load(Ordering::SeqCst), 0);

    engine.play(&tone_base64(20)).await.unwrap();
    engine.play(&tone_base64(20)).await.unwrap();
    assert_eq!(opens.load(Ordering::SeqCst), 1);

    engine.close().await;
    engine.play(&tone_base64(20)).await.unwrap();
    assert_eq!(opens.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_bad_payload_releases_slot() {
    let sink = Arc::new(FakeSink::new(48_000));
    let (engine, _) = engine_with(Arc::clone(&sink));

    let err = engine.play("%%% definitely not base64").await.unwrap_err();
    assert!(matches!(err, Error::Playback(_)));

    let err = engine.play("aGVsbG8gd29ybGQ=").await.unwrap_err();
    assert!(matches!(err, Error::Playback(_)));

    assert!(!engine.is_playing());
    engine.play(&tone_base64(20)).await.unwrap();
    assert_eq!(sink.played.lock().unwrap().len(), 1);
}
