//! Async event loop owning one [`PreviewSession`].
//!
//! Operator commands and frame events are both funnelled into a single task,
//! so every session mutation runs to completion before the next one starts.

use tokio::sync::{mpsc, oneshot};

use super::frame::InboundEnvelope;
use super::keyboard::{KeyDisposition, KeyInput};
use super::session::{HostEffect, Intent, PreviewSession, SessionView};

/// Commands to the session task
#[derive(Debug)]
pub enum SessionCommand {
    Dispatch(Intent),
    Key {
        input: KeyInput,
        reply: oneshot::Sender<KeyDisposition>,
    },
    View {
        reply: oneshot::Sender<SessionView>,
    },
    Shutdown,
}

/// Handle to control a running session
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub fn dispatch(&self, intent: Intent) {
        if self.cmd_tx.send(SessionCommand::Dispatch(intent)).is_err() {
            tracing::debug!("Session task gone, intent dropped");
        }
    }

    /// Route a key press. A stopped session never consumes keys.
    pub async fn handle_key(&self, input: KeyInput) -> KeyDisposition {
        let (reply, rx) = oneshot::channel();
        if self.cmd_tx.send(SessionCommand::Key { input, reply }).is_err() {
            return KeyDisposition::Ignored;
        }
        rx.await.unwrap_or(KeyDisposition::Ignored)
    }

    /// Current combined state, or `None` once the session has stopped
    pub async fn view(&self) -> Option<SessionView> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx.send(SessionCommand::View { reply }).ok()?;
        rx.await.ok()
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown);
    }
}

pub struct SessionDriver {
    session: PreviewSession,
    inbound_rx: mpsc::UnboundedReceiver<InboundEnvelope>,
    cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    effect_tx: mpsc::UnboundedSender<HostEffect>,
}

impl SessionDriver {
    /// Spawn the session task. Host effects are delivered on `effect_tx`.
    pub fn spawn(
        session: PreviewSession,
        inbound_rx: mpsc::UnboundedReceiver<InboundEnvelope>,
        effect_tx: mpsc::UnboundedSender<HostEffect>,
    ) -> SessionHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let driver = Self {
            session,
            inbound_rx,
            cmd_rx,
            effect_tx,
        };
        tokio::spawn(driver.run());
        SessionHandle { cmd_tx }
    }

    /// Main loop; returns the session once shut down or all handles are dropped
    pub async fn run(mut self) -> PreviewSession {
        loop {
            tokio::select! {
                biased;

                // Frame events already queued are applied before the next command
                Some(envelope) = self.inbound_rx.recv() => {
                    self.session.handle_frame_event(envelope);
                }
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        None | Some(SessionCommand::Shutdown) => break,
                        Some(SessionCommand::Dispatch(intent)) => {
                            for effect in self.session.dispatch(intent) {
                                if self.effect_tx.send(effect).is_err() {
                                    tracing::debug!("Host effect dropped, receiver closed");
                                }
                            }
                        }
                        Some(SessionCommand::Key { input, reply }) => {
                            let _ = reply.send(self.session.handle_key(&input));
                        }
                        Some(SessionCommand::View { reply }) => {
                            let _ = reply.send(self.session.view());
                        }
                    }
                }
            }
        }
        tracing::info!(document_id = %self.session.document_id(), "Preview session stopped");
        self.session
    }
}
