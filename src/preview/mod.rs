//! Live preview session protocol
//!
//! Supervises one embedded frame running the user's application: the message
//! contract with the frame, Live / Recording / Debug-Review modes, ordered
//! action capture, and per-document view preferences.

pub mod channel;
pub mod driver;
pub mod error;
pub mod frame;
pub mod keyboard;
pub mod messages;
pub mod mock;
pub mod navigation;
pub mod preferences;
pub mod recorder;
pub mod session;
pub mod tape;
pub mod view_state;

pub use channel::{FrameMessageChannel, Inbound};
pub use driver::{SessionCommand, SessionDriver, SessionHandle};
pub use error::PreviewError;
pub use frame::{
    ConnectionKey, Frame, FrameEvent, FrameEventSink, FrameFactory, HeadlessFrameFactory,
    InboundEnvelope,
};
pub use keyboard::{FocusTarget, KeyDisposition, KeyInput};
pub use messages::{
    ActionLogEntry, ActionSequenceGraph, ControlMessage, FrameMessage, InitDebugPayload,
};
pub use navigation::{NavigationController, NavigationState, Page, PreviewOrigin, UrlSource};
pub use preferences::{Splitter, ViewPreferences};
pub use recorder::{ActionLogRecorder, ActionLogSnapshot};
pub use session::{
    DebugSelection, HostEffect, Intent, PreviewSession, SearchBy, SearchMenuItem, SessionMode,
    SessionProps, SessionView,
};
pub use tape::{FrameTape, FrameTapeEntry, RecordingTape, ReplayOutcome};
pub use view_state::{
    KeyValueBackend, MemoryBackend, PreferenceRecordStore, ViewStateStore,
    STORAGE_RECORD_LIVE_PREVIEW_FLAGS,
};
