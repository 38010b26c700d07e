use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::paths::config_path;

use super::default_keys::default_keybindings;
use super::keys::{parse_key_notation, KeybindingConfig, ShortcutAction};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// One entry of the viewport width menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportWidth {
    pub label: String,
    pub icon: String,
    pub tooltip: String,
    /// Frame width in pixels; `None` fills the available pane
    #[serde(default)]
    pub width: Option<u32>,
}

impl ViewportWidth {
    fn new(label: &str, icon: &str, tooltip: &str, width: Option<u32>) -> Self {
        Self {
            label: label.to_string(),
            icon: icon.to_string(),
            tooltip: tooltip.to_string(),
            width,
        }
    }
}

/// Built-in viewport widths. Index 0 must stay the full-width entry since
/// it is the fallback for unknown persisted indices.
pub fn default_viewport_widths() -> Vec<ViewportWidth> {
    vec![
        ViewportWidth::new("Auto", "Fullscreen", "Fill the available space", None),
        ViewportWidth::new("1200px", "DesktopWindows", "Large desktop screen", Some(1200)),
        ViewportWidth::new("992px", "LaptopMac", "Desktop screen", Some(992)),
        ViewportWidth::new("768px", "TabletMac", "Tablet screen", Some(768)),
        ViewportWidth::new("576px", "PhoneIphone", "Phone screen in landscape", Some(576)),
        ViewportWidth::new("375px", "PhoneIphone", "Phone screen in portrait", Some(375)),
    ]
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host the preview server listens on
    pub preview_host: String,
    /// Page path treated as the application's entry page
    pub index_page: String,
    /// Default pages list pane size when nothing is persisted
    pub pages_list_size: u32,
    /// Default settings editor pane size when nothing is persisted
    pub settings_editor_size: u32,
    /// Viewport width menu, first entry is the default
    pub viewport_widths: Vec<ViewportWidth>,
    /// Keybinding configuration
    pub keybindings: KeybindingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preview_host: "localhost".to_string(),
            index_page: "main".to_string(),
            pages_list_size: 300,
            settings_editor_size: 250,
            viewport_widths: default_viewport_widths(),
            keybindings: default_keybindings(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlPreviewConfig {
    pub host: Option<String>,
    pub index_page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlLayoutConfig {
    pub pages_list_size: Option<u32>,
    pub settings_editor_size: Option<u32>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub preview: Option<TomlPreviewConfig>,
    pub layout: Option<TomlLayoutConfig>,
    pub viewport_widths: Option<Vec<ViewportWidth>>,
    /// Action name -> key notation
    pub keys: Option<HashMap<String, String>>,
}

/// Convert the `[keys]` table into bindings, skipping entries that do not parse
fn parse_keys_table(keys: &HashMap<String, String>) -> KeybindingConfig {
    let mut config = KeybindingConfig::new();
    for (action_name, key_str) in keys {
        match (parse_key_notation(key_str), ShortcutAction::parse(action_name)) {
            (Ok(combo), Some(action)) => {
                config.bindings.insert(combo, action);
            }
            (Err(e), _) => {
                tracing::warn!(action = %action_name, key = %key_str, error = %e, "Ignoring keybinding");
            }
            (_, None) => {
                tracing::warn!(action = %action_name, "Unknown keybinding action");
            }
        }
    }
    config
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        match fs::read_to_string(&config_file) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) => {
                tracing::warn!(path = %config_file.display(), error = %e, "Using default config");
                Config::default()
            }
        }
    }

    /// Build a config from TOML text. Invalid TOML yields the defaults.
    pub fn from_toml_str(contents: &str) -> Self {
        let mut config = Config::default();

        let toml_config = match toml::from_str::<TomlConfig>(contents) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse config, using defaults");
                return config;
            }
        };

        if let Some(preview) = toml_config.preview {
            if let Some(host) = preview.host {
                config.preview_host = host;
            }
            if let Some(index_page) = preview.index_page {
                config.index_page = index_page;
            }
        }

        if let Some(layout) = toml_config.layout {
            if let Some(size) = layout.pages_list_size {
                config.pages_list_size = size;
            }
            if let Some(size) = layout.settings_editor_size {
                config.settings_editor_size = size;
            }
        }

        // An empty table would leave no valid width index at all
        if let Some(widths) = toml_config.viewport_widths.filter(|w| !w.is_empty()) {
            config.viewport_widths = widths;
        }

        // Merge user keybindings on top of defaults
        if let Some(keys) = toml_config.keys {
            config.keybindings.merge(parse_keys_table(&keys));
        }

        config
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(error = %e, "Failed to create config directory");
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }

    pub fn with_index_page(mut self, page: impl Into<String>) -> Self {
        self.index_page = page.into();
        self
    }
}
