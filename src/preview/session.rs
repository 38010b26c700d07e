//! Preview session orchestrator.
//!
//! Every operator intent and every frame event goes through one
//! `&mut PreviewSession` call, run to completion before the next one. The
//! mode is a single [`SessionMode`] value, so recording and review can never
//! both be active.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::{Config, KeybindingConfig, ShortcutAction, ViewportWidth};

use super::channel::{FrameMessageChannel, Inbound};
use super::frame::{ConnectionKey, FrameFactory, InboundEnvelope};
use super::keyboard::{KeyDisposition, KeyInput};
use super::messages::{ControlMessage, FrameMessage};
use super::navigation::{NavigationController, NavigationState, Page, PreviewOrigin, UrlSource};
use super::preferences::{PreferenceWriter, Splitter, ViewPreferences};
use super::recorder::{ActionLogRecorder, ActionLogSnapshot};
use super::tape::RecordingTape;
use super::view_state::ViewStateStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Live,
    Recording,
    DebugReview,
}

/// Node highlighted in the flow diagram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSelection {
    pub title: Option<String>,
    pub class_name: Option<String>,
}

impl DebugSelection {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.class_name.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchBy {
    Name,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMenuItem {
    pub label: String,
    pub by: SearchBy,
    pub text: String,
}

/// What the host document supplies when a session starts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProps {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub pages: Vec<Page>,
    /// Opaque property list shown in the settings editor
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub server_port: i32,
}

/// Operator intents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    Reload,
    SelectPage {
        page: Option<Page>,
    },
    NavigateTo {
        url: String,
    },
    ToggleRecording,
    ToggleDebugFlow,
    SelectDebugNode {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        class_name: Option<String>,
    },
    SearchSelection {
        by: SearchBy,
    },
    OpenExternal,
    SetViewportWidth {
        index: usize,
    },
    TogglePagesList,
    ToggleSettingsEditor,
    SplitterDragStarted,
    SplitterDragFinished {
        splitter: Splitter,
        size: u32,
    },
    UpdateSettings {
        settings: Value,
    },
    SetSettings {
        settings: Value,
    },
    SetVisible {
        visible: bool,
    },
    SetServerPort {
        port: i32,
    },
    ExportRecording {
        path: PathBuf,
    },
}

/// Requests the session makes of the host document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum HostEffect {
    OpenUrl { url: String },
    SearchRequest { text: String },
    UpdateSettings { settings: Value },
    Error { message: String },
}

/// Everything the presentation layer needs to draw the preview
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub document_id: String,
    pub mode: SessionMode,
    pub navigation: NavigationState,
    pub page_matches_url: bool,
    pub pages: Vec<Page>,
    pub server_port: i32,
    pub frame_mounted: bool,
    pub visible: bool,
    pub viewport_width: ViewportWidth,
    pub preferences: ViewPreferences,
    pub panel_cover: bool,
    pub debug_selection: DebugSelection,
    pub search_menu: Vec<SearchMenuItem>,
    pub can_reload: bool,
    pub can_open_external: bool,
    pub recorded_actions: usize,
    pub init_count: u64,
    pub settings: Value,
}

pub struct PreviewSession {
    document_id: String,
    mode: SessionMode,
    selection: DebugSelection,
    channel: FrameMessageChannel,
    navigation: NavigationController,
    recorder: ActionLogRecorder,
    prefs: ViewPreferences,
    writer: PreferenceWriter,
    viewport_widths: Vec<ViewportWidth>,
    keybindings: KeybindingConfig,
    settings: Value,
    panel_cover: bool,
    visible: bool,
}

impl PreviewSession {
    /// Build a session and mount its frame if the server port is usable.
    ///
    /// The returned receiver carries every event the frame emits; feed each
    /// one back through [`PreviewSession::handle_frame_event`].
    pub fn new(
        props: SessionProps,
        config: &Config,
        store: Arc<dyn ViewStateStore>,
        factory: Box<dyn FrameFactory>,
    ) -> (Self, mpsc::UnboundedReceiver<InboundEnvelope>) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let channel = FrameMessageChannel::new(factory, inbound_tx);
        let navigation = NavigationController::new(
            props.pages,
            PreviewOrigin::new(config.preview_host.clone(), props.server_port),
            &config.index_page,
        );

        let defaults = ViewPreferences {
            pages_list_splitter_size: config.pages_list_size,
            settings_editor_splitter_size: config.settings_editor_size,
            ..ViewPreferences::default()
        };
        let writer = PreferenceWriter::new(store, props.document_id.clone());
        let prefs = writer.load(&defaults, config.viewport_widths.len());

        let mut session = Self {
            document_id: props.document_id,
            mode: SessionMode::Live,
            selection: DebugSelection::default(),
            channel,
            navigation,
            recorder: ActionLogRecorder::new(),
            prefs,
            writer,
            viewport_widths: config.viewport_widths.clone(),
            keybindings: config.keybindings.clone(),
            settings: props.settings,
            panel_cover: false,
            visible: true,
        };
        session.mount_frame();

        tracing::info!(
            document_id = %session.document_id,
            port = props.server_port,
            url = %session.navigation.state().active_url,
            "Preview session started"
        );
        (session, inbound_rx)
    }

    fn mount_frame(&mut self) {
        let origin = self.navigation.origin();
        if origin.is_mountable() {
            let url = self.navigation.active_address();
            self.channel.mount(origin.port, &url);
        } else {
            self.channel.unmount();
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn navigation(&self) -> &NavigationState {
        self.navigation.state()
    }

    pub fn preferences(&self) -> &ViewPreferences {
        &self.prefs
    }

    pub fn debug_selection(&self) -> &DebugSelection {
        &self.selection
    }

    /// Current recording, read-only
    pub fn snapshot(&self) -> ActionLogSnapshot<'_> {
        self.recorder.snapshot()
    }

    pub fn connection(&self) -> Option<&ConnectionKey> {
        self.channel.connection()
    }

    pub fn can_reload(&self) -> bool {
        self.mode != SessionMode::Recording
    }

    pub fn can_open_external(&self) -> bool {
        self.mode != SessionMode::Recording && self.navigation.external_url().is_some()
    }

    /// Apply one operator intent
    pub fn dispatch(&mut self, intent: Intent) -> Vec<HostEffect> {
        let mut effects = Vec::new();
        match intent {
            Intent::Reload => self.reload(),
            Intent::SelectPage { page } => self.navigation.select_page(page, &mut self.channel),
            Intent::NavigateTo { url } => {
                self.navigation
                    .set_url_direct(&url, UrlSource::Operator, &mut self.channel)
            }
            Intent::ToggleRecording => self.toggle_recording(),
            Intent::ToggleDebugFlow => self.toggle_debug_flow(),
            Intent::SelectDebugNode { title, class_name } => {
                self.select_debug_node(DebugSelection { title, class_name })
            }
            Intent::SearchSelection { by } => {
                if let Some(text) = self.search_text(by) {
                    effects.push(HostEffect::SearchRequest { text });
                }
            }
            Intent::OpenExternal => {
                if self.can_open_external() {
                    if let Some(url) = self.navigation.external_url() {
                        effects.push(HostEffect::OpenUrl { url });
                    }
                } else {
                    tracing::debug!(mode = ?self.mode, "Open external not available");
                }
            }
            Intent::SetViewportWidth { index } => {
                if index < self.viewport_widths.len() {
                    self.writer.set_width_index(&mut self.prefs, index);
                } else {
                    tracing::warn!(index, "Viewport width index out of range");
                }
            }
            Intent::TogglePagesList => {
                let show = !self.prefs.show_pages_list;
                self.writer.set_show_pages_list(&mut self.prefs, show);
            }
            Intent::ToggleSettingsEditor => {
                let show = !self.prefs.show_settings_editor;
                self.writer.set_show_settings_editor(&mut self.prefs, show);
            }
            Intent::SplitterDragStarted => self.panel_cover = true,
            Intent::SplitterDragFinished { splitter, size } => {
                self.panel_cover = false;
                self.writer.set_splitter_size(&mut self.prefs, splitter, size);
            }
            Intent::UpdateSettings { settings } => {
                effects.push(HostEffect::UpdateSettings { settings });
            }
            Intent::SetSettings { settings } => self.settings = settings,
            Intent::SetVisible { visible } => self.visible = visible,
            Intent::SetServerPort { port } => self.set_server_port(port),
            Intent::ExportRecording { path } => {
                if let Err(e) = self.export_recording(&path) {
                    tracing::error!(path = %path.display(), error = %e, "Recording export failed");
                    effects.push(HostEffect::Error {
                        message: format!("Failed to export recording: {e}"),
                    });
                }
            }
        }
        effects
    }

    fn reload(&mut self) {
        if self.can_reload() {
            self.channel.reload();
        } else {
            tracing::debug!("Reload ignored while recording");
        }
    }

    fn toggle_recording(&mut self) {
        match self.mode {
            SessionMode::Live | SessionMode::DebugReview => {
                self.channel.send(ControlMessage::StartListening);
                self.selection = DebugSelection::default();
                self.mode = SessionMode::Recording;
            }
            SessionMode::Recording => {
                self.channel.send(ControlMessage::StopListening);
                self.selection = DebugSelection::default();
                self.mode = SessionMode::DebugReview;
            }
        }
        tracing::debug!(mode = ?self.mode, "Recording toggled");
    }

    fn toggle_debug_flow(&mut self) {
        self.mode = match self.mode {
            SessionMode::Live => SessionMode::DebugReview,
            SessionMode::DebugReview => SessionMode::Live,
            SessionMode::Recording => {
                tracing::debug!("Debug flow toggle ignored while recording");
                return;
            }
        };
        self.selection = DebugSelection::default();
    }

    fn select_debug_node(&mut self, selection: DebugSelection) {
        if self.mode == SessionMode::DebugReview {
            self.selection = selection;
        } else {
            tracing::debug!(mode = ?self.mode, "Debug node selection outside review");
        }
    }

    fn search_text(&self, by: SearchBy) -> Option<String> {
        if self.mode != SessionMode::DebugReview {
            return None;
        }
        match by {
            SearchBy::Name => self.selection.title.clone(),
            SearchBy::Class => self.selection.class_name.clone(),
        }
    }

    /// Search menu entries for the current selection; empty outside review
    pub fn search_menu(&self) -> Vec<SearchMenuItem> {
        if self.mode != SessionMode::DebugReview {
            return Vec::new();
        }
        let mut items = Vec::new();
        if let Some(title) = &self.selection.title {
            items.push(SearchMenuItem {
                label: format!("By name: \"{title}\""),
                by: SearchBy::Name,
                text: title.clone(),
            });
        }
        if let Some(class_name) = &self.selection.class_name {
            items.push(SearchMenuItem {
                label: format!("By class: \"{class_name}\""),
                by: SearchBy::Class,
                text: class_name.clone(),
            });
        }
        items
    }

    fn set_server_port(&mut self, port: i32) {
        if port == self.navigation.origin().port {
            return;
        }
        let host = self.navigation.origin().host.clone();
        self.navigation.set_origin(PreviewOrigin::new(host, port));
        self.mount_frame();
    }

    /// Write the current recording to a JSONL tape
    pub fn export_recording(&self, path: &std::path::Path) -> super::error::Result<()> {
        let tape = RecordingTape::from_snapshot(&self.document_id, self.recorder.snapshot());
        tape.write_jsonl_to_path(path)?;
        tracing::info!(path = %path.display(), entries = tape.entries.len(), "Recording exported");
        Ok(())
    }

    /// Route one frame event. Stale or malformed events are dropped.
    pub fn handle_frame_event(&mut self, envelope: InboundEnvelope) {
        let Some(inbound) = self.channel.accept(envelope) else {
            return;
        };
        match inbound {
            Inbound::Message(FrameMessage::InitDebug(payload)) => {
                self.recorder.on_init(payload.action_sequences);
            }
            Inbound::Message(FrameMessage::Debug(entry)) => self.recorder.on_action(entry),
            Inbound::Message(FrameMessage::ChangeUrl(url)) => {
                self.navigation
                    .set_url_direct(&url, UrlSource::Frame, &mut self.channel);
            }
            Inbound::Ready(url) => self.navigation.on_frame_ready(url.as_deref()),
        }
    }

    /// Handle a key press. Only the reload binding is ever consumed.
    pub fn handle_key(&mut self, input: &KeyInput) -> KeyDisposition {
        if !self.visible || input.target.is_text_entry() {
            return KeyDisposition::Ignored;
        }
        match self.keybindings.get_action(&input.combo) {
            Some(ShortcutAction::Reload) => {
                self.reload();
                KeyDisposition::Consumed
            }
            None => KeyDisposition::Ignored,
        }
    }

    pub fn view(&self) -> SessionView {
        let viewport_width = self
            .viewport_widths
            .get(self.prefs.width_index)
            .or_else(|| self.viewport_widths.first())
            .cloned()
            .unwrap_or_else(|| ViewportWidth {
                label: "Auto".to_string(),
                icon: "Fullscreen".to_string(),
                tooltip: String::new(),
                width: None,
            });
        let navigation = self.navigation.state().clone();

        SessionView {
            document_id: self.document_id.clone(),
            mode: self.mode,
            page_matches_url: navigation.page_matches_url(),
            navigation,
            pages: self.navigation.pages().to_vec(),
            server_port: self.navigation.origin().port,
            frame_mounted: self.channel.is_mounted(),
            visible: self.visible,
            viewport_width,
            preferences: self.prefs.clone(),
            panel_cover: self.panel_cover,
            debug_selection: self.selection.clone(),
            search_menu: self.search_menu(),
            can_reload: self.can_reload(),
            can_open_external: self.can_open_external(),
            recorded_actions: self.recorder.len(),
            init_count: self.recorder.init_count(),
            settings: self.settings.clone(),
        }
    }
}

impl std::fmt::Debug for PreviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSession")
            .field("document_id", &self.document_id)
            .field("mode", &self.mode)
            .field("channel", &self.channel)
            .finish()
    }
}
