//! Typed per-document view preferences.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::view_state::ViewStateStore;

pub const PREF_WIDTH_INDEX: &str = "iFrameWidthIndex";
pub const PREF_SHOW_PAGES_LIST: &str = "showPagesList";
pub const PREF_SHOW_SETTINGS_EDITOR: &str = "showSettingsEditor";
pub const PREF_PAGES_LIST_SPLITTER_SIZE: &str = "pagesListSplitterSize";
pub const PREF_SETTINGS_EDITOR_SPLITTER_SIZE: &str = "settingsEditorSplitterSize";

/// Resizable panes beside the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Splitter {
    PagesList,
    SettingsEditor,
}

impl Splitter {
    pub fn preference_name(self) -> &'static str {
        match self {
            Splitter::PagesList => PREF_PAGES_LIST_SPLITTER_SIZE,
            Splitter::SettingsEditor => PREF_SETTINGS_EDITOR_SPLITTER_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPreferences {
    pub width_index: usize,
    pub show_pages_list: bool,
    pub show_settings_editor: bool,
    pub pages_list_splitter_size: u32,
    pub settings_editor_splitter_size: u32,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        Self {
            width_index: 0,
            show_pages_list: false,
            show_settings_editor: false,
            pages_list_splitter_size: 300,
            settings_editor_splitter_size: 250,
        }
    }
}

impl ViewPreferences {
    /// Read every preference for `document_id`, falling back to `defaults`.
    ///
    /// A width index outside `0..width_count` falls back to 0.
    pub fn load(
        store: &dyn ViewStateStore,
        document_id: &str,
        defaults: &ViewPreferences,
        width_count: usize,
    ) -> Self {
        let width_index = store.get(document_id, PREF_WIDTH_INDEX, defaults.width_index);
        Self {
            width_index: if width_index < width_count { width_index } else { 0 },
            show_pages_list: store.get(document_id, PREF_SHOW_PAGES_LIST, defaults.show_pages_list),
            show_settings_editor: store.get(
                document_id,
                PREF_SHOW_SETTINGS_EDITOR,
                defaults.show_settings_editor,
            ),
            pages_list_splitter_size: store.get(
                document_id,
                PREF_PAGES_LIST_SPLITTER_SIZE,
                defaults.pages_list_splitter_size,
            ),
            settings_editor_splitter_size: store.get(
                document_id,
                PREF_SETTINGS_EDITOR_SPLITTER_SIZE,
                defaults.settings_editor_splitter_size,
            ),
        }
    }

    pub fn splitter_size(&self, splitter: Splitter) -> u32 {
        match splitter {
            Splitter::PagesList => self.pages_list_splitter_size,
            Splitter::SettingsEditor => self.settings_editor_splitter_size,
        }
    }
}

/// Writes preference changes through to the store for one document
pub struct PreferenceWriter {
    store: Arc<dyn ViewStateStore>,
    document_id: String,
}

impl PreferenceWriter {
    pub fn new(store: Arc<dyn ViewStateStore>, document_id: impl Into<String>) -> Self {
        Self {
            store,
            document_id: document_id.into(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn load(&self, defaults: &ViewPreferences, width_count: usize) -> ViewPreferences {
        ViewPreferences::load(self.store.as_ref(), &self.document_id, defaults, width_count)
    }

    pub fn set_width_index(&self, prefs: &mut ViewPreferences, index: usize) {
        prefs.width_index = index;
        self.store.set(&self.document_id, PREF_WIDTH_INDEX, &index);
    }

    pub fn set_show_pages_list(&self, prefs: &mut ViewPreferences, show: bool) {
        prefs.show_pages_list = show;
        self.store.set(&self.document_id, PREF_SHOW_PAGES_LIST, &show);
    }

    pub fn set_show_settings_editor(&self, prefs: &mut ViewPreferences, show: bool) {
        prefs.show_settings_editor = show;
        self.store.set(&self.document_id, PREF_SHOW_SETTINGS_EDITOR, &show);
    }

    pub fn set_splitter_size(&self, prefs: &mut ViewPreferences, splitter: Splitter, size: u32) {
        match splitter {
            Splitter::PagesList => prefs.pages_list_splitter_size = size,
            Splitter::SettingsEditor => prefs.settings_editor_splitter_size = size,
        }
        self.store.set(&self.document_id, splitter.preference_name(), &size);
    }
}
