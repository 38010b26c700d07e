//! Frame message channel.
//!
//! Owns at most one mounted frame. Outbound calls are no-ops while nothing
//! is mounted. Inbound envelopes are accepted only from the current
//! connection and are decoded in arrival order, one at a time.

use tokio::sync::mpsc;

use super::error::PreviewError;
use super::frame::{ConnectionKey, Frame, FrameEvent, FrameEventSink, FrameFactory, InboundEnvelope};
use super::messages::{ControlMessage, FrameMessage};

/// A decoded inbound event from the current frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Message(FrameMessage),
    Ready(Option<String>),
}

struct MountedFrame {
    connection: ConnectionKey,
    frame: Box<dyn Frame>,
}

pub struct FrameMessageChannel {
    factory: Box<dyn FrameFactory>,
    mounted: Option<MountedFrame>,
    next_generation: u64,
    inbound_tx: mpsc::UnboundedSender<InboundEnvelope>,
}

impl FrameMessageChannel {
    pub fn new(
        factory: Box<dyn FrameFactory>,
        inbound_tx: mpsc::UnboundedSender<InboundEnvelope>,
    ) -> Self {
        Self {
            factory,
            mounted: None,
            next_generation: 0,
            inbound_tx,
        }
    }

    /// Replace the current frame (if any) with a fresh instance on `port`.
    ///
    /// Mounting on the port already shown is a no-op. Every new instance gets
    /// its own connection key, even when a port is mounted again later.
    pub fn mount(&mut self, port: i32, url: &str) {
        if self.connection().map(ConnectionKey::port) == Some(port) {
            return;
        }
        let connection = ConnectionKey::new(port, self.next_generation);
        self.next_generation += 1;
        if let Some(old) = self.mounted.take() {
            tracing::info!(old = %old.connection, new = %connection, "Replacing frame");
        }
        let sink = FrameEventSink::new(connection.clone(), self.inbound_tx.clone());
        let frame = self.factory.mount(&connection, url, sink);
        tracing::debug!(connection = %connection, url, "Frame mounted");
        self.mounted = Some(MountedFrame { connection, frame });
    }

    pub fn unmount(&mut self) {
        if let Some(old) = self.mounted.take() {
            tracing::info!(connection = %old.connection, "Frame unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn connection(&self) -> Option<&ConnectionKey> {
        self.mounted.as_ref().map(|m| &m.connection)
    }

    fn is_current(&self, connection: &ConnectionKey) -> bool {
        self.connection() == Some(connection)
    }

    pub fn load(&mut self, url: &str) {
        match self.mounted.as_mut() {
            Some(mounted) => mounted.frame.load_url(url),
            None => tracing::debug!(url, "No frame mounted, load skipped"),
        }
    }

    pub fn reload(&mut self) {
        match self.mounted.as_mut() {
            Some(mounted) => mounted.frame.reload(),
            None => tracing::debug!("No frame mounted, reload skipped"),
        }
    }

    pub fn send(&mut self, message: ControlMessage) {
        match self.mounted.as_mut() {
            Some(mounted) => mounted.frame.send_message(&message),
            None => tracing::debug!(?message, "No frame mounted, control message skipped"),
        }
    }

    /// Filter and decode one inbound envelope.
    ///
    /// Returns `None` for envelopes from a replaced frame and for messages
    /// that fail to decode. Both are logged and otherwise ignored.
    pub fn accept(&self, envelope: InboundEnvelope) -> Option<Inbound> {
        match self.decode(envelope) {
            Ok(inbound) => Some(inbound),
            Err(PreviewError::StaleConnection(connection)) => {
                tracing::debug!(connection = %connection, "Dropping event from stale frame");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping frame message");
                None
            }
        }
    }

    fn decode(&self, envelope: InboundEnvelope) -> Result<Inbound, PreviewError> {
        if !self.is_current(&envelope.connection) {
            return Err(PreviewError::StaleConnection(envelope.connection.to_string()));
        }
        match envelope.event {
            FrameEvent::Ready(url) => Ok(Inbound::Ready(url)),
            FrameEvent::Message(raw) => FrameMessage::decode(&raw).map(Inbound::Message),
        }
    }
}

impl std::fmt::Debug for FrameMessageChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameMessageChannel")
            .field("connection", &self.connection())
            .finish()
    }
}
