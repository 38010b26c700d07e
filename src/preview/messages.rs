//! Message contract between the host and the embedded frame.
//!
//! Inbound messages are JSON objects tagged by `type` with the body in
//! `payload`. Outbound control messages carry only a `type`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{PreviewError, Result};

/// Static action wiring of the previewed application. Opaque to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSequenceGraph(pub Value);

/// One runtime action event observed inside the frame. Opaque to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionLogEntry(pub Value);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitDebugPayload {
    #[serde(rename = "actionSequences", default)]
    pub action_sequences: ActionSequenceGraph,
}

/// Messages emitted by the frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameMessage {
    /// A new recording epoch begins
    InitDebug(InitDebugPayload),
    /// One action event
    Debug(ActionLogEntry),
    /// The frame navigated on its own; payload is a relative path
    ChangeUrl(String),
}

const KNOWN_KINDS: [&str; 3] = ["INIT_DEBUG", "DEBUG", "CHANGE_URL"];

impl FrameMessage {
    /// Decode a raw message, distinguishing untagged, unknown and malformed input.
    pub fn decode(raw: &Value) -> Result<Self> {
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or(PreviewError::UntaggedMessage)?;

        if !KNOWN_KINDS.contains(&kind) {
            return Err(PreviewError::UnknownMessageType(kind.to_string()));
        }

        // INIT_DEBUG without a payload still starts an epoch with an empty graph
        let normalized;
        let raw = if kind == "INIT_DEBUG" && raw.get("payload").map_or(true, Value::is_null) {
            normalized = serde_json::json!({ "type": kind, "payload": {} });
            &normalized
        } else {
            raw
        };

        serde_json::from_value(raw.clone()).map_err(|source| PreviewError::MalformedMessage {
            kind: kind.to_string(),
            source,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FrameMessage::InitDebug(_) => "INIT_DEBUG",
            FrameMessage::Debug(_) => "DEBUG",
            FrameMessage::ChangeUrl(_) => "CHANGE_URL",
        }
    }
}

/// Control messages sent into the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    StartListening,
    StopListening,
}
