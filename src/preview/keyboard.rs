//! Keyboard surface of the preview.

use serde::{Deserialize, Serialize};

use crate::config::KeyCombo;

/// Where keyboard focus was when a key went down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    Document,
    TextInput,
    TextArea,
}

impl FocusTarget {
    /// Classify by element tag name (`INPUT`, `TEXTAREA`, anything else)
    pub fn from_tag_name(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("input") {
            FocusTarget::TextInput
        } else if tag.eq_ignore_ascii_case("textarea") {
            FocusTarget::TextArea
        } else {
            FocusTarget::Document
        }
    }

    /// Typing targets keep their keys
    pub fn is_text_entry(self) -> bool {
        matches!(self, FocusTarget::TextInput | FocusTarget::TextArea)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub combo: KeyCombo,
    pub target: FocusTarget,
}

impl KeyInput {
    pub fn new(combo: KeyCombo, target: FocusTarget) -> Self {
        Self { combo, target }
    }
}

/// Whether the host should stop propagation and default handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Consumed,
    Ignored,
}

impl KeyDisposition {
    pub fn is_consumed(self) -> bool {
        self == KeyDisposition::Consumed
    }
}
