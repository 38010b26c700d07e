//! Integration tests for per-document view preferences
//!
//! Preferences written by one session must be visible to the next session
//! for the same document, through the SQLite-backed record.

use super::common::fixtures::{props, sqlite_store, TestSession, TEST_PORT};
use preview_host::data::AppStateStore;
use preview_host::preview::{
    Intent, PreferenceRecordStore, Splitter, ViewStateStore, STORAGE_RECORD_LIVE_PREVIEW_FLAGS,
};
use serde_json::{json, Value};

#[test]
fn test_preferences_survive_new_session() {
    let (store, _db, _dir) = sqlite_store();

    let mut first = TestSession::with_store(props("docA", TEST_PORT), store.clone());
    first.session.dispatch(Intent::TogglePagesList);
    first.session.dispatch(Intent::ToggleSettingsEditor);
    first.session.dispatch(Intent::SetViewportWidth { index: 3 });
    first.session.dispatch(Intent::SplitterDragStarted);
    first.session.dispatch(Intent::SplitterDragFinished {
        splitter: Splitter::SettingsEditor,
        size: 333,
    });
    drop(first);

    let second = TestSession::with_store(props("docA", TEST_PORT), store);
    let prefs = second.session.preferences();
    assert!(prefs.show_pages_list);
    assert!(prefs.show_settings_editor);
    assert_eq!(prefs.width_index, 3);
    assert_eq!(prefs.settings_editor_splitter_size, 333);
    assert_eq!(prefs.pages_list_splitter_size, 300);
    assert_eq!(second.session.view().viewport_width.width, Some(768));
}

#[test]
fn test_store_then_fresh_session_reads_flag() {
    let (store, _db, _dir) = sqlite_store();
    store.set("docA", "showPagesList", &true);

    let session = TestSession::with_store(props("docA", TEST_PORT), store.clone());
    assert!(session.session.preferences().show_pages_list);

    let ephemeral = TestSession::with_store(props("", TEST_PORT), store);
    assert!(!ephemeral.session.preferences().show_pages_list);
}

#[test]
fn test_ephemeral_session_never_writes() {
    let (store, db, _dir) = sqlite_store();
    let mut t = TestSession::with_store(props("", TEST_PORT), store);
    t.session.dispatch(Intent::TogglePagesList);
    assert!(t.session.preferences().show_pages_list);

    let raw = AppStateStore::new(db.connection())
        .get(STORAGE_RECORD_LIVE_PREVIEW_FLAGS)
        .unwrap();
    assert_eq!(raw, None);
}

#[test]
fn test_record_is_shared_across_documents() {
    let (store, db, _dir) = sqlite_store();
    let mut a = TestSession::with_store(props("docA", TEST_PORT), store.clone());
    let mut b = TestSession::with_store(props("docB", TEST_PORT), store);
    a.session.dispatch(Intent::TogglePagesList);
    b.session.dispatch(Intent::SetViewportWidth { index: 1 });

    let record_store = PreferenceRecordStore::new(AppStateStore::new(db.connection()));
    let record = Value::Object(record_store.load_record());
    assert_eq!(
        record,
        json!({
            "docA": { "showPagesList": true },
            "docB": { "iFrameWidthIndex": 1 }
        })
    );
}

#[test]
fn test_stale_width_index_falls_back_to_first_entry() {
    let (store, _db, _dir) = sqlite_store();
    store.set("docA", "iFrameWidthIndex", &42);

    let t = TestSession::with_store(props("docA", TEST_PORT), store);
    assert_eq!(t.session.preferences().width_index, 0);
    assert_eq!(t.session.view().viewport_width.label, "Auto");
}
