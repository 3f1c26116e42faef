//! Keyboard shortcut dispatch
//!
//! Maps key presses to playback verbs using the configured [`KeyBindings`].
//! Presses while a text field has focus belong to the field, never to the
//! player.

use crate::controller::PlaybackController;
use crate::error::Result;
use crate::types::PlaybackPhase;
use webamp_core::{KeyBindings, ShortcutAction};

/// What had focus when the key was pressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusTarget {
    #[default]
    Document,
    /// Text input, textarea or other editable element
    TextInput,
}

/// A single key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    /// Key name (DOM `KeyboardEvent.key` style)
    pub key: String,
    pub focus: FocusTarget,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            focus: FocusTarget::Document,
        }
    }

    pub fn in_text_input(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            focus: FocusTarget::TextInput,
        }
    }
}

/// Action bound to `press`, if it should reach the player at all
pub fn resolve_shortcut(bindings: &KeyBindings, press: &KeyPress) -> Option<ShortcutAction> {
    if press.focus == FocusTarget::TextInput {
        return None;
    }
    bindings.action_for(&press.key)
}

impl PlaybackController {
    /// Run the playback verb behind a shortcut
    ///
    /// Play/pause pauses while playing and resumes otherwise.
    pub async fn dispatch_shortcut(&self, action: ShortcutAction) -> Result<()> {
        tracing::debug!("Shortcut: {}", action.as_str());

        match action {
            ShortcutAction::PlayPause => {
                if self.snapshot().phase == PlaybackPhase::Playing {
                    self.pause().await
                } else {
                    self.resume().await
                }
            }
            ShortcutAction::Next => self.play_next().await.map(|_| ()),
            ShortcutAction::Previous => self.play_previous().await.map(|_| ()),
            ShortcutAction::ToggleShuffle => self.toggle_shuffle().await.map(|_| ()),
            ShortcutAction::ToggleRepeat => self.toggle_repeat().await.map(|_| ()),
        }
    }

    /// Resolve and dispatch a key press; returns whether it was handled
    pub async fn handle_key_press(&self, bindings: &KeyBindings, press: &KeyPress) -> Result<bool> {
        match resolve_shortcut(bindings, press) {
            Some(action) => {
                self.dispatch_shortcut(action).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings_resolve() {
        let bindings = KeyBindings::default();

        assert_eq!(
            resolve_shortcut(&bindings, &KeyPress::new(" ")),
            Some(ShortcutAction::PlayPause)
        );
        assert_eq!(
            resolve_shortcut(&bindings, &KeyPress::new("ArrowLeft")),
            Some(ShortcutAction::Previous)
        );
        assert_eq!(resolve_shortcut(&bindings, &KeyPress::new("q")), None);
    }

    #[test]
    fn test_text_input_swallows_shortcuts() {
        let bindings = KeyBindings::default();
        assert_eq!(
            resolve_shortcut(&bindings, &KeyPress::in_text_input("s")),
            None
        );
    }

    #[test]
    fn test_custom_binding() {
        let bindings = KeyBindings {
            next: "n".to_string(),
            ..KeyBindings::default()
        };

        assert_eq!(
            resolve_shortcut(&bindings, &KeyPress::new("n")),
            Some(ShortcutAction::Next)
        );
        assert_eq!(resolve_shortcut(&bindings, &KeyPress::new("ArrowRight")), None);
    }
}
