//! Integration tests for the async session driver

use super::common::fixtures::{memory_store, props, TEST_PORT};
use super::common::messages::{debug, init_debug};
use preview_host::config::parse_key_notation;
use preview_host::preview::mock::MockFrameFactory;
use preview_host::preview::{
    FocusTarget, HostEffect, Intent, KeyDisposition, KeyInput, PreviewSession, SessionDriver,
    SessionMode,
};
use preview_host::Config;
use serde_json::json;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_recording_through_driver() {
    let frame = MockFrameFactory::new();
    let (session, inbound) = PreviewSession::new(
        props("docA", TEST_PORT),
        &Config::default(),
        memory_store(),
        Box::new(frame.clone()),
    );
    let (effect_tx, _effect_rx) = mpsc::unbounded_channel();
    let handle = SessionDriver::spawn(session, inbound, effect_tx);

    handle.dispatch(Intent::ToggleRecording);
    frame.post(init_debug(json!({})));
    for n in 0..10 {
        frame.post(debug(json!(n)));
    }
    handle.dispatch(Intent::ToggleRecording);

    let view = handle.view().await.unwrap();
    assert_eq!(view.mode, SessionMode::DebugReview);
    assert_eq!(view.recorded_actions, 10);
    handle.shutdown();
}

#[tokio::test]
async fn test_run_returns_session_when_handles_drop() {
    let frame = MockFrameFactory::new();
    let (session, inbound) = PreviewSession::new(
        props("docA", TEST_PORT),
        &Config::default(),
        memory_store(),
        Box::new(frame.clone()),
    );
    let (effect_tx, mut effect_rx) = mpsc::unbounded_channel();
    let handle = SessionDriver::spawn(session, inbound, effect_tx);

    handle.dispatch(Intent::UpdateSettings {
        settings: json!([{ "name": "theme" }]),
    });
    assert_eq!(
        effect_rx.recv().await,
        Some(HostEffect::UpdateSettings {
            settings: json!([{ "name": "theme" }])
        })
    );

    drop(handle);
    // Driver task exits and drops its effect sender
    assert_eq!(effect_rx.recv().await, None);
}

#[tokio::test]
async fn test_hidden_session_ignores_shortcut() {
    let frame = MockFrameFactory::new();
    let (session, inbound) = PreviewSession::new(
        props("docA", TEST_PORT),
        &Config::default(),
        memory_store(),
        Box::new(frame.clone()),
    );
    let (effect_tx, _effect_rx) = mpsc::unbounded_channel();
    let handle = SessionDriver::spawn(session, inbound, effect_tx);
    let press = KeyInput::new(parse_key_notation("D-r").unwrap(), FocusTarget::Document);

    handle.dispatch(Intent::SetVisible { visible: false });
    assert_eq!(handle.handle_key(press.clone()).await, KeyDisposition::Ignored);

    handle.dispatch(Intent::SetVisible { visible: true });
    assert_eq!(handle.handle_key(press).await, KeyDisposition::Consumed);
    assert_eq!(frame.reload_count(), 1);
}
