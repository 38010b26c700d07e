//! Integration tests for the preview session protocol
//!
//! Drives a session through recording, review and navigation with a mock
//! frame on the other end of the channel.

use super::common::fixtures::{memory_store, props, TestSession, TEST_PORT};
use super::common::messages::{change_url, debug, init_debug};
use preview_host::preview::mock::{FrameCall, MockFrameFactory};
use preview_host::preview::{
    ActionLogEntry, ActionSequenceGraph, ConnectionKey, ControlMessage, HostEffect, Intent, Page,
    PreviewSession, RecordingTape, SearchBy, SessionMode,
};
use preview_host::Config;
use serde_json::json;
use tempfile::TempDir;

/// Full recording workflow: record, capture, stop into review, inspect, back to live
#[test]
fn test_record_review_cycle() {
    let mut t = TestSession::new(props("docA", TEST_PORT));

    t.session.dispatch(Intent::ToggleRecording);
    assert_eq!(t.session.mode(), SessionMode::Recording);

    t.frame_posts(init_debug(json!({ "main": { "onSubmit": ["validate", "save"] } })));
    t.frame_posts(debug(json!({ "name": "validate" })));
    t.frame_posts(debug(json!({ "name": "save" })));

    t.session.dispatch(Intent::ToggleRecording);
    assert_eq!(t.session.mode(), SessionMode::DebugReview);
    assert_eq!(
        t.frame.sent(),
        vec![ControlMessage::StartListening, ControlMessage::StopListening]
    );

    let snapshot = t.session.snapshot();
    assert_eq!(
        snapshot.entries,
        &[
            ActionLogEntry(json!({ "name": "validate" })),
            ActionLogEntry(json!({ "name": "save" })),
        ]
    );

    t.session.dispatch(Intent::SelectDebugNode {
        title: Some("save".to_string()),
        class_name: Some("OrderStore".to_string()),
    });
    let effects = t.session.dispatch(Intent::SearchSelection { by: SearchBy::Name });
    assert_eq!(
        effects,
        vec![HostEffect::SearchRequest {
            text: "save".to_string()
        }]
    );

    t.session.dispatch(Intent::ToggleDebugFlow);
    assert_eq!(t.session.mode(), SessionMode::Live);
    assert!(t.session.debug_selection().is_empty());
    assert_eq!(t.session.snapshot().entries.len(), 2);
}

/// A new INIT_DEBUG starts a fresh epoch regardless of mode
#[test]
fn test_init_debug_resets_log_during_review() {
    let mut t = TestSession::new(props("docA", TEST_PORT));
    t.session.dispatch(Intent::ToggleRecording);
    t.frame_posts(init_debug(json!({ "v": 1 })));
    t.frame_posts(debug(json!(1)));
    t.session.dispatch(Intent::ToggleRecording);

    t.frame_posts(init_debug(json!({ "v": 2 })));

    let snapshot = t.session.snapshot();
    assert!(snapshot.entries.is_empty());
    assert_eq!(snapshot.graph, &ActionSequenceGraph(json!({ "v": 2 })));
    assert_eq!(t.session.view().init_count, 2);
    assert_eq!(t.session.mode(), SessionMode::DebugReview);
}

#[test]
fn test_configured_index_page() {
    let config = Config::default().with_index_page("cart");
    let frame = MockFrameFactory::new();
    let (session, _inbound) = PreviewSession::new(
        props("docA", TEST_PORT),
        &config,
        memory_store(),
        Box::new(frame.clone()),
    );
    assert_eq!(session.navigation().active_url, "/cart");
    assert_eq!(
        frame.calls(),
        vec![FrameCall::Mounted {
            connection: ConnectionKey::new(TEST_PORT, 0),
            url: "http://localhost:3000/cart".to_string(),
        }]
    );
}

#[test]
fn test_select_page_loads_on_server_port() {
    let mut t = TestSession::new(props("docA", 5173));
    t.session.dispatch(Intent::SelectPage {
        page: Some(Page::new("checkout")),
    });

    assert_eq!(t.session.navigation().active_url, "/checkout");
    assert_eq!(t.frame.loads(), vec!["http://localhost:5173/checkout".to_string()]);
}

#[test]
fn test_direct_url_then_ready() {
    let mut t = TestSession::new(props("docA", TEST_PORT));
    t.session.dispatch(Intent::NavigateTo {
        url: "/cart".to_string(),
    });
    t.frame_ready("http://localhost:3000/cart");

    let nav = t.session.navigation();
    assert_eq!(nav.frame_reported_url.as_deref(), Some("/cart"));
    assert_eq!(nav.active_url, "/cart");
    // Direct navigation leaves the selected page alone
    assert_eq!(nav.active_page, Some(Page::new("main")));
    assert!(!t.session.view().page_matches_url);
}

#[test]
fn test_frame_navigation_is_last_write_wins() {
    let mut t = TestSession::new(props("docA", TEST_PORT));
    t.session.dispatch(Intent::NavigateTo {
        url: "/checkout".to_string(),
    });
    // A CHANGE_URL emitted before the frame saw the load arrives afterwards
    t.frame_posts(change_url("/main"));
    assert_eq!(t.session.navigation().active_url, "/main");

    t.frame_posts(change_url("/checkout"));
    assert_eq!(t.session.navigation().active_url, "/checkout");
}

#[test]
fn test_reload_rules() {
    let mut t = TestSession::new(props("docA", TEST_PORT));

    t.session.dispatch(Intent::Reload);
    assert_eq!(t.frame.reload_count(), 1);

    t.session.dispatch(Intent::ToggleRecording);
    t.session.dispatch(Intent::Reload);
    assert_eq!(t.frame.reload_count(), 1);

    t.session.dispatch(Intent::ToggleRecording);
    assert_eq!(t.session.mode(), SessionMode::DebugReview);
    t.session.dispatch(Intent::Reload);
    assert_eq!(t.frame.reload_count(), 2);
}

#[test]
fn test_port_change_discards_old_frame_traffic() {
    let mut t = TestSession::new(props("docA", TEST_PORT));
    let old = t.frame.last_sink().unwrap();

    t.session.dispatch(Intent::SetServerPort { port: 3001 });
    assert_eq!(
        t.frame.calls().last(),
        Some(&FrameCall::Mounted {
            connection: ConnectionKey::new(3001, 1),
            url: "http://localhost:3001/main".to_string(),
        })
    );

    old.post_message(debug(json!("from old frame")));
    t.frame_posts(debug(json!("from new frame")));

    assert_eq!(
        t.session.snapshot().entries,
        &[ActionLogEntry(json!("from new frame"))]
    );
}

#[test]
fn test_remounted_port_discards_old_frame_traffic() {
    let mut t = TestSession::new(props("docA", TEST_PORT));
    t.session.dispatch(Intent::ToggleRecording);
    t.frame_posts(init_debug(json!({ "epoch": 1 })));
    let old = t.frame.last_sink().unwrap();

    t.session.dispatch(Intent::SetServerPort { port: 3001 });
    t.session.dispatch(Intent::SetServerPort { port: TEST_PORT });
    assert_eq!(
        t.frame.calls().last(),
        Some(&FrameCall::Mounted {
            connection: ConnectionKey::new(TEST_PORT, 2),
            url: "http://localhost:3000/main".to_string(),
        })
    );

    t.frame_posts(debug(json!("current")));
    old.post_message(init_debug(json!({ "epoch": 0 })));
    old.post_message(change_url("/stale"));
    t.pump();

    let snapshot = t.session.snapshot();
    assert_eq!(snapshot.graph, &ActionSequenceGraph(json!({ "epoch": 1 })));
    assert_eq!(snapshot.entries, &[ActionLogEntry(json!("current"))]);
    assert_eq!(t.session.navigation().active_url, "/main");
}

#[test]
fn test_session_without_server_is_usable() {
    let mut t = TestSession::new(props("docA", 0));
    t.session.dispatch(Intent::Reload);
    t.session.dispatch(Intent::SelectPage {
        page: Some(Page::new("cart")),
    });
    t.session.dispatch(Intent::ToggleRecording);

    assert!(t.frame.calls().is_empty());
    assert_eq!(t.session.navigation().active_url, "/cart");
    assert!(!t.session.view().frame_mounted);

    t.session.dispatch(Intent::SetServerPort { port: 4000 });
    assert_eq!(
        t.frame.calls(),
        vec![FrameCall::Mounted {
            connection: ConnectionKey::new(4000, 0),
            url: "http://localhost:4000/cart".to_string(),
        }]
    );
}

#[test]
fn test_export_then_read_recording() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("checkout.jsonl");
    let mut t = TestSession::new(props("docA", TEST_PORT));

    t.session.dispatch(Intent::ToggleRecording);
    t.frame_posts(init_debug(json!({ "g": true })));
    for n in 0..5 {
        t.frame.post(debug(json!({ "n": n })));
    }
    t.pump();
    t.session.dispatch(Intent::ToggleRecording);

    assert!(t
        .session
        .dispatch(Intent::ExportRecording { path: path.clone() })
        .is_empty());

    let tape = RecordingTape::read_jsonl_from_path(&path).unwrap();
    assert_eq!(tape.document_id, "docA");
    assert_eq!(tape.graph, ActionSequenceGraph(json!({ "g": true })));
    let order: Vec<i64> = tape
        .entries
        .iter()
        .map(|e| e.0["n"].as_i64().unwrap())
        .collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}
