//! Seam to the external frame collaborator.
//!
//! The host never renders anything itself. It mounts a frame through a
//! [`FrameFactory`], drives it through [`Frame`], and receives everything the
//! frame emits as [`InboundEnvelope`]s on a single ordered queue.

use std::fmt;

use serde_json::Value;
use tokio::sync::mpsc;

use super::messages::ControlMessage;

/// Identity of one mounted frame instance.
///
/// The generation is bumped on every mount, so a frame mounted again on a
/// port used earlier still gets a key distinct from the replaced instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    port: i32,
    generation: u64,
}

impl ConnectionKey {
    pub fn new(port: i32, generation: u64) -> Self {
        Self { port, generation }
    }

    pub fn port(&self) -> i32 {
        self.port
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "live-preview-{}#{}", self.port, self.generation)
    }
}

/// Something the frame emitted
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// Raw posted message, not yet decoded
    Message(Value),
    /// Initial load finished; carries the frame's full URL if it has one
    Ready(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundEnvelope {
    pub connection: ConnectionKey,
    pub event: FrameEvent,
}

impl InboundEnvelope {
    pub fn message(connection: ConnectionKey, raw: Value) -> Self {
        Self {
            connection,
            event: FrameEvent::Message(raw),
        }
    }

    pub fn ready(connection: ConnectionKey, url: Option<String>) -> Self {
        Self {
            connection,
            event: FrameEvent::Ready(url),
        }
    }
}

/// Handle a frame uses to post events back to the host.
///
/// Every event is stamped with the connection key the frame was mounted
/// under. Sends after the host has gone away are dropped.
#[derive(Debug, Clone)]
pub struct FrameEventSink {
    connection: ConnectionKey,
    tx: mpsc::UnboundedSender<InboundEnvelope>,
}

impl FrameEventSink {
    pub fn new(connection: ConnectionKey, tx: mpsc::UnboundedSender<InboundEnvelope>) -> Self {
        Self { connection, tx }
    }

    pub fn connection(&self) -> &ConnectionKey {
        &self.connection
    }

    pub fn post_message(&self, raw: Value) {
        self.emit(FrameEvent::Message(raw));
    }

    pub fn ready(&self, url: Option<String>) {
        self.emit(FrameEvent::Ready(url));
    }

    fn emit(&self, event: FrameEvent) {
        let envelope = InboundEnvelope {
            connection: self.connection.clone(),
            event,
        };
        if self.tx.send(envelope).is_err() {
            tracing::debug!(connection = %self.connection, "Frame event dropped, host closed");
        }
    }
}

/// A live frame instance
pub trait Frame: Send {
    /// Navigate to a fully-qualified URL
    fn load_url(&mut self, url: &str);

    /// Reload whatever is currently shown
    fn reload(&mut self);

    /// Post a control message into the frame
    fn send_message(&mut self, message: &ControlMessage);
}

/// Creates frame instances
pub trait FrameFactory: Send {
    /// Mount a new frame showing `url`. The frame reports back through `sink`.
    fn mount(&mut self, connection: &ConnectionKey, url: &str, sink: FrameEventSink)
        -> Box<dyn Frame>;
}

/// Frame that renders nothing and only logs what it is asked to do.
///
/// Used for replaying tapes from the command line.
#[derive(Debug, Default, Clone)]
pub struct HeadlessFrameFactory;

struct HeadlessFrame {
    connection: ConnectionKey,
}

impl FrameFactory for HeadlessFrameFactory {
    fn mount(
        &mut self,
        connection: &ConnectionKey,
        url: &str,
        _sink: FrameEventSink,
    ) -> Box<dyn Frame> {
        tracing::info!(connection = %connection, url, "Headless frame mounted");
        Box::new(HeadlessFrame {
            connection: connection.clone(),
        })
    }
}

impl Frame for HeadlessFrame {
    fn load_url(&mut self, url: &str) {
        tracing::info!(connection = %self.connection, url, "Headless frame load");
    }

    fn reload(&mut self) {
        tracing::info!(connection = %self.connection, "Headless frame reload");
    }

    fn send_message(&mut self, message: &ControlMessage) {
        tracing::info!(connection = %self.connection, ?message, "Headless frame message");
    }
}
