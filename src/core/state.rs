//! Per-line session state shared by the renderer and the key state machine.

use crate::core::input::KeyEvent;
use crate::core::terminal::ScreenPos;

/// Everything one input line needs to translate logical positions to the screen.
///
/// Created fresh for every line; the anchor is the screen cell right after the prompt
/// at the moment the line started, and moves up when the renderer scrolls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub prompt_width: usize,
    pub anchor: ScreenPos,
    pub cursor: usize,
    pub last_key: Option<KeyEvent>,
}

impl SessionState {
    pub fn new(prompt_width: usize, anchor_row: usize) -> Self {
        Self {
            prompt_width,
            anchor: ScreenPos::new(prompt_width, anchor_row),
            cursor: 0,
            last_key: None,
        }
    }

    /// Whether the previously processed key was the same physical key as `key`.
    pub fn repeated(&self, key: &KeyEvent) -> bool {
        self.last_key.is_some_and(|last| last.same_key(key))
    }
}
