//! Mock frame for deterministic testing
//!
//! Implements [`FrameFactory`] and [`Frame`] without rendering anything.
//! Every call made by the host is captured in order so tests can assert on
//! exactly what reached the frame. Mounted sinks are kept so tests can play
//! the frame's side of the conversation.
//!
//! # Example
//! ```no_run
//! use preview_host::preview::mock::{FrameCall, MockFrameFactory};
//!
//! let factory = MockFrameFactory::new().with_ready_on_mount(true);
//! // hand `Box::new(factory.clone())` to a session, then:
//! assert!(factory.calls().iter().all(|c| *c != FrameCall::Reload));
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::frame::{ConnectionKey, Frame, FrameEventSink, FrameFactory};
use super::messages::ControlMessage;

/// One host-to-frame interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameCall {
    Mounted { connection: ConnectionKey, url: String },
    Load(String),
    Reload,
    Send(ControlMessage),
}

/// Mock frame factory for testing
///
/// Clones share captured state, so keep one clone in the test and hand
/// another to the code under test.
#[derive(Clone, Default)]
pub struct MockFrameFactory {
    calls: Arc<Mutex<Vec<FrameCall>>>,
    sinks: Arc<Mutex<Vec<FrameEventSink>>>,
    ready_on_mount: bool,
}

impl MockFrameFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `ready(url)` immediately when a frame is mounted
    pub fn with_ready_on_mount(mut self, ready: bool) -> Self {
        self.ready_on_mount = ready;
        self
    }

    /// All captured calls, in order
    pub fn calls(&self) -> Vec<FrameCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn reload_count(&self) -> usize {
        self.count(|c| matches!(c, FrameCall::Reload))
    }

    pub fn mount_count(&self) -> usize {
        self.count(|c| matches!(c, FrameCall::Mounted { .. }))
    }

    /// URLs passed to `load_url`, in order
    pub fn loads(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                FrameCall::Load(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn sent(&self) -> Vec<ControlMessage> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                FrameCall::Send(message) => Some(*message),
                _ => None,
            })
            .collect()
    }

    /// Sink of the most recently mounted frame
    pub fn last_sink(&self) -> Option<FrameEventSink> {
        self.sinks.lock().last().cloned()
    }

    /// Post a raw message as the most recently mounted frame
    pub fn post(&self, raw: Value) {
        if let Some(sink) = self.last_sink() {
            sink.post_message(raw);
        }
    }

    fn count(&self, pred: impl Fn(&FrameCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }
}

impl FrameFactory for MockFrameFactory {
    fn mount(
        &mut self,
        connection: &ConnectionKey,
        url: &str,
        sink: FrameEventSink,
    ) -> Box<dyn Frame> {
        self.calls.lock().push(FrameCall::Mounted {
            connection: connection.clone(),
            url: url.to_string(),
        });
        if self.ready_on_mount {
            sink.ready(Some(url.to_string()));
        }
        self.sinks.lock().push(sink);
        Box::new(MockFrame {
            calls: self.calls.clone(),
        })
    }
}

/// Frame instance handed out by [`MockFrameFactory`]
pub struct MockFrame {
    calls: Arc<Mutex<Vec<FrameCall>>>,
}

impl Frame for MockFrame {
    fn load_url(&mut self, url: &str) {
        self.calls.lock().push(FrameCall::Load(url.to_string()));
    }

    fn reload(&mut self) {
        self.calls.lock().push(FrameCall::Reload);
    }

    fn send_message(&mut self, message: &ControlMessage) {
        self.calls.lock().push(FrameCall::Send(*message));
    }
}
