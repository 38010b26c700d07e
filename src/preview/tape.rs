//! JSONL tapes.
//!
//! A recording tape holds one exported recording: a header with the graph,
//! then one line per action in arrival order. A frame tape holds a scripted
//! session (frame events, intents, key presses) that can be replayed
//! headlessly.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{parse_key_notation, Config};

use super::error::{PreviewError, Result};
use super::frame::{FrameFactory, InboundEnvelope};
use super::keyboard::{FocusTarget, KeyInput};
use super::messages::{ActionLogEntry, ActionSequenceGraph};
use super::recorder::ActionLogSnapshot;
use super::session::{HostEffect, Intent, PreviewSession, SessionProps, SessionView};
use super::view_state::ViewStateStore;

pub const RECORDING_TAPE_SCHEMA_VERSION: u32 = 1;
pub const FRAME_TAPE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RecordingJsonlLine {
    Header {
        schema_version: u32,
        created_at_ms: u64,
        recording_id: Uuid,
        document_id: String,
        init_count: u64,
        graph: ActionSequenceGraph,
    },
    Action {
        seq: u64,
        entry: ActionLogEntry,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingTape {
    pub schema_version: u32,
    pub created_at_ms: u64,
    pub recording_id: Uuid,
    pub document_id: String,
    pub init_count: u64,
    pub graph: ActionSequenceGraph,
    pub entries: Vec<ActionLogEntry>,
}

impl RecordingTape {
    pub fn from_snapshot(document_id: &str, snapshot: ActionLogSnapshot<'_>) -> Self {
        Self {
            schema_version: RECORDING_TAPE_SCHEMA_VERSION,
            created_at_ms: now_ms(),
            recording_id: Uuid::new_v4(),
            document_id: document_id.to_string(),
            init_count: snapshot.init_count,
            graph: snapshot.graph.clone(),
            entries: snapshot.entries.to_vec(),
        }
    }

    pub fn write_jsonl_to_path(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        let header = RecordingJsonlLine::Header {
            schema_version: self.schema_version,
            created_at_ms: self.created_at_ms,
            recording_id: self.recording_id,
            document_id: self.document_id.clone(),
            init_count: self.init_count,
            graph: self.graph.clone(),
        };
        writeln!(writer, "{}", serde_json::to_string(&header)?)?;
        for (seq, entry) in (1u64..).zip(&self.entries) {
            let line = RecordingJsonlLine::Action {
                seq,
                entry: entry.clone(),
            };
            writeln!(writer, "{}", serde_json::to_string(&line)?)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_jsonl_from_path(path: &Path) -> Result<Self> {
        let mut lines = read_jsonl_lines::<RecordingJsonlLine>(path)?.into_iter();

        let Some((_, header)) = lines.next() else {
            return Err(PreviewError::Tape {
                line: 1,
                reason: "missing tape header".to_string(),
            });
        };
        let RecordingJsonlLine::Header {
            schema_version,
            created_at_ms,
            recording_id,
            document_id,
            init_count,
            graph,
        } = header
        else {
            return Err(PreviewError::Tape {
                line: 1,
                reason: "tape header must be the first JSONL line".to_string(),
            });
        };

        let mut entries = Vec::new();
        let mut expected_seq = 1u64;
        for (line, parsed) in lines {
            match parsed {
                RecordingJsonlLine::Action { seq, entry } => {
                    if seq != expected_seq {
                        return Err(PreviewError::Tape {
                            line,
                            reason: format!("expected action {expected_seq}, found {seq}"),
                        });
                    }
                    expected_seq += 1;
                    entries.push(entry);
                }
                RecordingJsonlLine::Header { .. } => {
                    return Err(PreviewError::Tape {
                        line,
                        reason: "duplicate tape header".to_string(),
                    });
                }
            }
        }

        Ok(Self {
            schema_version,
            created_at_ms,
            recording_id,
            document_id,
            init_count,
            graph,
            entries,
        })
    }
}

/// One scripted step of a frame tape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FrameTapeEntry {
    /// Raw message posted by the current frame
    Message { message: Value },
    /// Current frame finished loading
    Ready {
        #[serde(default)]
        url: Option<String>,
    },
    Intent { intent: Intent },
    /// Key press in vim-style notation
    Key {
        key: String,
        #[serde(default = "default_focus")]
        target: FocusTarget,
    },
}

fn default_focus() -> FocusTarget {
    FocusTarget::Document
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FrameJsonlLine {
    Header {
        schema_version: u32,
        created_at_ms: u64,
        props: SessionProps,
    },
    Step {
        step: FrameTapeEntry,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameTape {
    pub schema_version: u32,
    pub created_at_ms: u64,
    pub props: SessionProps,
    pub entries: Vec<FrameTapeEntry>,
}

/// Result of replaying a frame tape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub view: SessionView,
    pub effects: Vec<HostEffect>,
    pub consumed_keys: usize,
}

impl FrameTape {
    pub fn new(props: SessionProps) -> Self {
        Self {
            schema_version: FRAME_TAPE_SCHEMA_VERSION,
            created_at_ms: now_ms(),
            props,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: FrameTapeEntry) {
        self.entries.push(entry);
    }

    pub fn write_jsonl_to_path(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        let header = FrameJsonlLine::Header {
            schema_version: self.schema_version,
            created_at_ms: self.created_at_ms,
            props: self.props.clone(),
        };
        writeln!(writer, "{}", serde_json::to_string(&header)?)?;
        for entry in &self.entries {
            let line = FrameJsonlLine::Step { step: entry.clone() };
            writeln!(writer, "{}", serde_json::to_string(&line)?)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_jsonl_from_path(path: &Path) -> Result<Self> {
        let mut header = None;
        let mut entries = Vec::new();

        for (line, parsed) in read_jsonl_lines::<FrameJsonlLine>(path)? {
            match parsed {
                FrameJsonlLine::Header {
                    schema_version,
                    created_at_ms,
                    props,
                } => {
                    if header.is_some() || !entries.is_empty() {
                        return Err(PreviewError::Tape {
                            line,
                            reason: "tape header must be the first JSONL line".to_string(),
                        });
                    }
                    header = Some((schema_version, created_at_ms, props));
                }
                FrameJsonlLine::Step { step } => {
                    if let FrameTapeEntry::Key { key, .. } = &step {
                        parse_key_notation(key).map_err(|e| PreviewError::Tape {
                            line,
                            reason: e.to_string(),
                        })?;
                    }
                    entries.push(step);
                }
            }
        }

        let (schema_version, created_at_ms, props) = header.ok_or_else(|| PreviewError::Tape {
            line: 1,
            reason: "missing tape header".to_string(),
        })?;

        Ok(Self {
            schema_version,
            created_at_ms,
            props,
            entries,
        })
    }

    /// Run every step through a fresh session and report where it ended up.
    ///
    /// Frame events are attributed to whichever frame is mounted when the
    /// step runs; with no frame mounted they are dropped.
    pub fn replay(
        &self,
        config: &Config,
        store: Arc<dyn ViewStateStore>,
        factory: Box<dyn FrameFactory>,
    ) -> Result<ReplayOutcome> {
        let (mut session, mut inbound) =
            PreviewSession::new(self.props.clone(), config, store, factory);
        let mut effects = Vec::new();
        let mut consumed_keys = 0;

        for (idx, entry) in self.entries.iter().enumerate() {
            // Anything the frame emitted on its own goes first
            while let Ok(envelope) = inbound.try_recv() {
                session.handle_frame_event(envelope);
            }

            match entry {
                FrameTapeEntry::Message { message } => {
                    if let Some(connection) = session.connection().cloned() {
                        session.handle_frame_event(InboundEnvelope::message(
                            connection,
                            message.clone(),
                        ));
                    } else {
                        tracing::debug!(step = idx, "No frame mounted, message skipped");
                    }
                }
                FrameTapeEntry::Ready { url } => {
                    if let Some(connection) = session.connection().cloned() {
                        session.handle_frame_event(InboundEnvelope::ready(connection, url.clone()));
                    } else {
                        tracing::debug!(step = idx, "No frame mounted, ready skipped");
                    }
                }
                FrameTapeEntry::Intent { intent } => {
                    effects.extend(session.dispatch(intent.clone()));
                }
                FrameTapeEntry::Key { key, target } => {
                    let combo = parse_key_notation(key).map_err(|e| PreviewError::ReplayStep {
                        step: idx + 1,
                        reason: e.to_string(),
                    })?;
                    if session.handle_key(&KeyInput::new(combo, *target)).is_consumed() {
                        consumed_keys += 1;
                    }
                }
            }
        }

        while let Ok(envelope) = inbound.try_recv() {
            session.handle_frame_event(envelope);
        }

        Ok(ReplayOutcome {
            view: session.view(),
            effects,
            consumed_keys,
        })
    }
}

/// Parse non-blank JSONL lines, keeping 1-based line numbers
fn read_jsonl_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<(usize, T)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut parsed = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line).map_err(|e| PreviewError::Tape {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        parsed.push((idx + 1, value));
    }
    Ok(parsed)
}

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
