//! Property-based tests for the session state machine and action capture
//!
//! 1. Mode transitions follow the documented graph for any toggle sequence
//! 2. DEBUG entries are kept in arrival order
//! 3. INIT_DEBUG always leaves an empty log and the new graph
//! 4. Reload reaches the frame exactly when not recording

use super::common::fixtures::{props, TestSession, TEST_PORT};
use super::common::messages::{debug, init_debug};
use preview_host::preview::{ActionLogEntry, ActionSequenceGraph, Intent, SessionMode};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone, Copy)]
enum Op {
    ToggleRecording,
    ToggleDebugFlow,
    Reload,
    Action(u16),
    Init(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::ToggleRecording),
        Just(Op::ToggleDebugFlow),
        Just(Op::Reload),
        any::<u16>().prop_map(Op::Action),
        any::<u8>().prop_map(Op::Init),
    ]
}

/// Reference transition function
fn next_mode(mode: SessionMode, op: Op) -> SessionMode {
    match (mode, op) {
        (SessionMode::Live, Op::ToggleRecording) => SessionMode::Recording,
        (SessionMode::Recording, Op::ToggleRecording) => SessionMode::DebugReview,
        (SessionMode::DebugReview, Op::ToggleRecording) => SessionMode::Recording,
        (SessionMode::Live, Op::ToggleDebugFlow) => SessionMode::DebugReview,
        (SessionMode::DebugReview, Op::ToggleDebugFlow) => SessionMode::Live,
        (mode, _) => mode,
    }
}

proptest! {
    #[test]
    fn mode_follows_transition_graph(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut t = TestSession::new(props("docA", TEST_PORT));
        let mut expected = SessionMode::Live;
        let mut expected_reloads = 0;

        for op in ops {
            let before = t.session.mode();
            match op {
                Op::ToggleRecording => { t.session.dispatch(Intent::ToggleRecording); }
                Op::ToggleDebugFlow => { t.session.dispatch(Intent::ToggleDebugFlow); }
                Op::Reload => {
                    if before != SessionMode::Recording {
                        expected_reloads += 1;
                    }
                    t.session.dispatch(Intent::Reload);
                }
                Op::Action(n) => t.frame_posts(debug(json!(n))),
                Op::Init(n) => t.frame_posts(init_debug(json!({ "epoch": n }))),
            }
            expected = next_mode(expected, op);
            let after = t.session.mode();
            prop_assert_eq!(after, expected);

            if after == SessionMode::DebugReview && before != SessionMode::DebugReview {
                let entered_by_stop =
                    before == SessionMode::Recording && matches!(op, Op::ToggleRecording);
                let entered_manually =
                    before == SessionMode::Live && matches!(op, Op::ToggleDebugFlow);
                prop_assert!(entered_by_stop || entered_manually);
            }
        }

        prop_assert_eq!(t.frame.reload_count(), expected_reloads);
    }

    #[test]
    fn debug_entries_keep_arrival_order(payloads in prop::collection::vec(any::<i64>(), 0..100)) {
        let mut t = TestSession::new(props("docA", TEST_PORT));
        t.session.dispatch(Intent::ToggleRecording);
        t.frame_posts(init_debug(json!({})));
        for p in &payloads {
            t.frame.post(debug(json!(p)));
        }
        t.pump();

        let expected: Vec<ActionLogEntry> =
            payloads.iter().map(|p| ActionLogEntry(json!(p))).collect();
        prop_assert_eq!(t.session.snapshot().entries, expected.as_slice());
    }

    #[test]
    fn init_debug_always_clears(before in 0usize..50, epoch in any::<u32>(), toggles in 0usize..4) {
        let mut t = TestSession::new(props("docA", TEST_PORT));
        for _ in 0..toggles {
            t.session.dispatch(Intent::ToggleRecording);
        }
        for n in 0..before {
            t.frame.post(debug(json!(n)));
        }
        t.frame.post(init_debug(json!({ "epoch": epoch })));
        t.pump();

        let snapshot = t.session.snapshot();
        prop_assert!(snapshot.entries.is_empty());
        prop_assert_eq!(snapshot.graph, &ActionSequenceGraph(json!({ "epoch": epoch })));
    }
}
