pub mod default_keys;
pub mod keys;
mod settings;

pub use default_keys::default_keybindings;
pub use keys::{parse_key_notation, KeyCombo, KeyParseError, KeybindingConfig, ShortcutAction};
pub use settings::{default_viewport_widths, Config, ViewportWidth, EXAMPLE_CONFIG};
