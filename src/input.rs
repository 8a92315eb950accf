//! Keyboard and mouse state with frame-to-frame edge detection.
//!
//! Window events write the *current* state as they arrive. Once per frame,
//! before the new events are applied, [`InputState::end_frame`] snapshots the
//! current state as the *previous* state, so pushes and releases can be
//! detected by comparing the two.

use std::collections::HashSet;

use cgmath::Vector2;
pub use winit::{event::MouseButton, keyboard::KeyCode};

/// A key or a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Key(KeyCode),
    Mouse(MouseButton),
}

impl From<KeyCode> for Button {
    fn from(key: KeyCode) -> Self {
        Button::Key(key)
    }
}

impl From<MouseButton> for Button {
    fn from(button: MouseButton) -> Self {
        Button::Mouse(button)
    }
}

/// Tracks the state of all buttons and the cursor for this and the previous frame.
#[derive(Debug)]
pub struct InputState {
    current: HashSet<Button>,
    previous: HashSet<Button>,
    cursor: Vector2<f64>,
    cursor_previous: Vector2<f64>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            current: HashSet::new(),
            previous: HashSet::new(),
            cursor: Vector2::new(0.0, 0.0),
            cursor_previous: Vector2::new(0.0, 0.0),
        }
    }

    /// Snapshots the current state as the previous frame's state.
    pub fn end_frame(&mut self) {
        self.previous.clone_from(&self.current);
        self.cursor_previous = self.cursor;
    }

    /// Records a button press or release.
    pub fn set_button(&mut self, button: impl Into<Button>, pressed: bool) {
        let button = button.into();
        if pressed {
            self.current.insert(button);
        } else {
            self.current.remove(&button);
        }
    }

    /// Records the cursor position in physical pixels.
    pub fn set_cursor_position(&mut self, x: f64, y: f64) {
        self.cursor = Vector2::new(x, y);
    }

    /// Forgets everything that is currently pressed.
    ///
    /// Used when the window loses focus, since the matching release events
    /// will never arrive.
    pub fn release_all(&mut self) {
        self.current.clear();
    }

    /// True only on the frame the button went down.
    pub fn is_pushed(&self, button: impl Into<Button>) -> bool {
        let button = button.into();
        self.current.contains(&button) && !self.previous.contains(&button)
    }

    /// True if the button was down in the previous frame.
    pub fn is_held(&self, button: impl Into<Button>) -> bool {
        self.previous.contains(&button.into())
    }

    /// True only on the frame the button went up.
    pub fn is_released(&self, button: impl Into<Button>) -> bool {
        let button = button.into();
        !self.current.contains(&button) && self.previous.contains(&button)
    }

    /// True while the button is down in the current frame.
    pub fn is_down(&self, button: impl Into<Button>) -> bool {
        self.current.contains(&button.into())
    }

    pub fn cursor_position(&self) -> Vector2<f64> {
        self.cursor
    }

    pub fn cursor_position_previous_frame(&self) -> Vector2<f64> {
        self.cursor_previous
    }

    /// True if any of the given buttons is down.
    pub fn any_down(&self, buttons: &[Button]) -> bool {
        buttons.iter().any(|button| self.current.contains(button))
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
