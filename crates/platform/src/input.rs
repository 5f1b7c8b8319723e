//! Keyboard and mouse state, fed from winit window events.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::PhysicalKey;

pub use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }
}

/// Held keys and buttons plus per-frame edges and cursor motion.
///
/// Call [`InputState::end_frame`] once per tick after the frame has read
/// the state.
#[derive(Debug, Default)]
pub struct InputState {
    held_keys: HashSet<KeyCode>,
    pressed_this_frame: HashSet<KeyCode>,
    held_buttons: HashSet<MouseButton>,
    cursor_position: Option<Vec2>,
    /// Summed over every cursor event since the last `end_frame`.
    cursor_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the input-related part of a window event. Other events are
    /// ignored.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.on_key_pressed(code),
                        ElementState::Released => self.on_key_released(code),
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.on_mouse_pressed((*button).into()),
                ElementState::Released => self.on_mouse_released((*button).into()),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::Focused(false) => self.clear(),
            _ => {}
        }
    }

    pub fn on_key_pressed(&mut self, key: KeyCode) {
        if self.held_keys.insert(key) {
            self.pressed_this_frame.insert(key);
        }
    }

    pub fn on_key_released(&mut self, key: KeyCode) {
        self.held_keys.remove(&key);
    }

    pub fn on_mouse_pressed(&mut self, button: MouseButton) {
        self.held_buttons.insert(button);
    }

    pub fn on_mouse_released(&mut self, button: MouseButton) {
        self.held_buttons.remove(&button);
    }

    /// The first position after a focus change only establishes the anchor.
    pub fn on_cursor_moved(&mut self, position: Vec2) {
        if let Some(previous) = self.cursor_position {
            self.cursor_delta += position - previous;
        }
        self.cursor_position = Some(position);
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.held_keys.contains(&key)
    }

    /// True only on the tick the key went down.
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.pressed_this_frame.contains(&key)
    }

    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.held_buttons.contains(&button)
    }

    /// -1, 0 or 1 depending on which of the two keys is held.
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.is_key_pressed(positive) {
            value += 1.0;
        }
        if self.is_key_pressed(negative) {
            value -= 1.0;
        }
        value
    }

    /// Cursor movement in pixels since the last `end_frame`.
    pub fn cursor_delta(&self) -> Vec2 {
        self.cursor_delta
    }

    pub fn end_frame(&mut self) {
        self.pressed_this_frame.clear();
        self.cursor_delta = Vec2::ZERO;
    }

    /// Releases everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held_keys.clear();
        self.pressed_this_frame.clear();
        self.held_buttons.clear();
        self.cursor_position = None;
        self.cursor_delta = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_edges() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyW);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(input.is_key_just_pressed(KeyCode::KeyW));

        input.end_frame();
        // Key repeat must not produce a second edge.
        input.on_key_pressed(KeyCode::KeyW);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(!input.is_key_just_pressed(KeyCode::KeyW));

        input.on_key_released(KeyCode::KeyW);
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_axis() {
        let mut input = InputState::new();
        assert_eq!(input.axis(KeyCode::KeyS, KeyCode::KeyW), 0.0);
        input.on_key_pressed(KeyCode::KeyW);
        assert_eq!(input.axis(KeyCode::KeyS, KeyCode::KeyW), 1.0);
        input.on_key_pressed(KeyCode::KeyS);
        assert_eq!(input.axis(KeyCode::KeyS, KeyCode::KeyW), 0.0);
        input.on_key_released(KeyCode::KeyW);
        assert_eq!(input.axis(KeyCode::KeyS, KeyCode::KeyW), -1.0);
    }

    #[test]
    fn test_cursor_delta_accumulates() {
        let mut input = InputState::new();
        input.on_cursor_moved(Vec2::new(10.0, 10.0));
        assert_eq!(input.cursor_delta(), Vec2::ZERO);

        input.on_cursor_moved(Vec2::new(15.0, 8.0));
        input.on_cursor_moved(Vec2::new(20.0, 9.0));
        assert_eq!(input.cursor_delta(), Vec2::new(10.0, -1.0));

        input.end_frame();
        assert_eq!(input.cursor_delta(), Vec2::ZERO);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::ShiftLeft);
        input.on_mouse_pressed(MouseButton::Right);
        input.on_cursor_moved(Vec2::new(1.0, 1.0));

        input.clear();
        assert!(!input.is_key_pressed(KeyCode::ShiftLeft));
        assert!(!input.is_mouse_pressed(MouseButton::Right));

        // Anchor was dropped, so the next move is not a jump.
        input.on_cursor_moved(Vec2::new(500.0, 500.0));
        assert_eq!(input.cursor_delta(), Vec2::ZERO);
    }
}
