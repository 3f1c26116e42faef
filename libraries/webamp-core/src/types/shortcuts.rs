/// Keyboard shortcut configuration
use serde::{Deserialize, Serialize};

/// Playback actions reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
    /// Play or pause playback
    PlayPause,
    /// Skip to next track
    Next,
    /// Skip to previous track
    Previous,
    /// Toggle shuffle mode
    ToggleShuffle,
    /// Toggle repeat mode
    ToggleRepeat,
}

impl ShortcutAction {
    /// Convert action to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayPause => "play_pause",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::ToggleShuffle => "toggle_shuffle",
            Self::ToggleRepeat => "toggle_repeat",
        }
    }
}

/// Key names bound to each shortcut action
///
/// Keys use DOM `KeyboardEvent.key` naming (`" "`, `"ArrowRight"`, `"s"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyBindings {
    /// Toggles between play and pause
    pub play_pause: String,
    /// Skips forward
    pub next: String,
    /// Skips back
    pub previous: String,
    /// Toggles shuffle
    pub shuffle: String,
    /// Toggles repeat
    pub repeat: String,
}

impl KeyBindings {
    /// Find the action bound to `key`, if any
    ///
    /// When two actions share a key the first in declaration order wins.
    pub fn action_for(&self, key: &str) -> Option<ShortcutAction> {
        [
            (&self.play_pause, ShortcutAction::PlayPause),
            (&self.next, ShortcutAction::Next),
            (&self.previous, ShortcutAction::Previous),
            (&self.shuffle, ShortcutAction::ToggleShuffle),
            (&self.repeat, ShortcutAction::ToggleRepeat),
        ]
        .into_iter()
        .find(|(bound, _)| bound.as_str() == key)
        .map(|(_, action)| action)
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            play_pause: " ".to_string(),
            next: "ArrowRight".to_string(),
            previous: "ArrowLeft".to_string(),
            shuffle: "s".to_string(),
            repeat: "r".to_string(),
        }
    }
}
