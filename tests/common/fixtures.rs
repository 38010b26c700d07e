//! Session fixtures
//!
//! Builds a [`PreviewSession`] around a [`MockFrameFactory`] and keeps the
//! inbound queue so tests can play the frame's side.

use std::sync::Arc;

use preview_host::data::{AppStateStore, Database};
use preview_host::preview::mock::MockFrameFactory;
use preview_host::preview::{
    InboundEnvelope, MemoryBackend, Page, PreferenceRecordStore, PreviewSession, SessionProps,
    ViewStateStore,
};
use preview_host::Config;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;

pub const TEST_PORT: i32 = 3000;

pub fn pages(paths: &[&str]) -> Vec<Page> {
    paths.iter().map(|p| Page::new(*p)).collect()
}

pub fn props(document_id: &str, port: i32) -> SessionProps {
    SessionProps {
        document_id: document_id.to_string(),
        pages: pages(&["main", "checkout", "cart"]),
        settings: json!([]),
        server_port: port,
    }
}

pub fn memory_store() -> Arc<dyn ViewStateStore> {
    Arc::new(PreferenceRecordStore::new(MemoryBackend::new()))
}

/// SQLite-backed store in a temp dir. Keep the `TempDir` alive.
pub fn sqlite_store() -> (Arc<dyn ViewStateStore>, Database, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open(dir.path().join("test.db")).expect("Failed to open database");
    let store = Arc::new(PreferenceRecordStore::new(AppStateStore::new(db.connection())));
    (store, db, dir)
}

pub struct TestSession {
    pub session: PreviewSession,
    pub inbound: mpsc::UnboundedReceiver<InboundEnvelope>,
    pub frame: MockFrameFactory,
}

impl TestSession {
    pub fn new(props: SessionProps) -> Self {
        Self::with_store(props, memory_store())
    }

    pub fn with_store(props: SessionProps, store: Arc<dyn ViewStateStore>) -> Self {
        Self::with_factory(props, store, MockFrameFactory::new())
    }

    pub fn with_factory(
        props: SessionProps,
        store: Arc<dyn ViewStateStore>,
        frame: MockFrameFactory,
    ) -> Self {
        let (session, inbound) =
            PreviewSession::new(props, &Config::default(), store, Box::new(frame.clone()));
        Self {
            session,
            inbound,
            frame,
        }
    }

    /// Post from the current frame and deliver everything queued
    pub fn frame_posts(&mut self, raw: Value) {
        self.frame.post(raw);
        self.pump();
    }

    pub fn frame_ready(&mut self, url: &str) {
        if let Some(sink) = self.frame.last_sink() {
            sink.ready(Some(url.to_string()));
        }
        self.pump();
    }

    pub fn pump(&mut self) {
        while let Ok(envelope) = self.inbound.try_recv() {
            self.session.handle_frame_event(envelope);
        }
    }
}
