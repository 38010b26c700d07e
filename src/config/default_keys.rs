//! Default keybindings
//!
//! This module defines the default keybindings that are used
//! when no user configuration is present.

use std::collections::HashMap;

use super::keys::{KeyCombo, KeybindingConfig, ShortcutAction};

/// Helper to insert a keybinding
fn bind(map: &mut HashMap<KeyCombo, ShortcutAction>, key: &str, action: ShortcutAction) {
    if let Ok(combo) = key.parse() {
        map.insert(combo, action);
    }
}

/// Create the default keybindings configuration
pub fn default_keybindings() -> KeybindingConfig {
    let mut config = KeybindingConfig::new();

    // Ctrl+R everywhere, Cmd+R on macOS keyboards, with or without Shift
    for notation in ["C-r", "D-r", "C-S-r", "D-S-r"] {
        bind(&mut config.bindings, notation, ShortcutAction::Reload);
    }

    config
}
