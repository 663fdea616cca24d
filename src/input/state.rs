//! Per-frame input snapshot

use std::hash::Hash;

use glam::Vec2;
use rustc_hash::FxHashSet;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// Held set plus the edges seen since the last frame
#[derive(Debug)]
struct Buttons<T> {
    held: FxHashSet<T>,
    pressed: FxHashSet<T>,
    released: FxHashSet<T>,
}

impl<T: Copy + Eq + Hash> Buttons<T> {
    fn new() -> Self {
        Self {
            held: FxHashSet::default(),
            pressed: FxHashSet::default(),
            released: FxHashSet::default(),
        }
    }

    fn process(&mut self, button: T, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // Key repeat arrives as another press while held
                if self.held.insert(button) {
                    self.pressed.insert(button);
                }
            }
            ElementState::Released => {
                if self.held.remove(&button) {
                    self.released.insert(button);
                }
            }
        }
    }

    fn end_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    fn clear(&mut self) {
        self.held.clear();
        self.end_frame();
    }
}

/// Input state as seen by components during one tick
///
/// The frame driver feeds window events in and calls [`Input::end_frame`]
/// once the tick is over, so "just pressed" and "just released" hold for
/// exactly one tick. A press and release inside the same tick report both
/// edges while the key reads as not held.
#[derive(Debug)]
pub struct Input {
    keys: Buttons<KeyCode>,
    mouse_buttons: Buttons<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: Buttons::new(),
            mouse_buttons: Buttons::new(),
            mouse_position: Vec2::ZERO,
            mouse_delta: Vec2::ZERO,
            scroll_delta: Vec2::ZERO,
        }
    }

    /// Clear per-frame edges and deltas
    pub fn end_frame(&mut self) {
        self.keys.end_frame();
        self.mouse_buttons.end_frame();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Forget everything held, e.g. when the window loses focus
    pub fn reset(&mut self) {
        self.keys.clear();
        self.mouse_buttons.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    pub fn process_keyboard(&mut self, key_code: KeyCode, state: ElementState) {
        self.keys.process(key_code, state);
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        self.mouse_buttons.process(button, state);
    }

    /// Pointer moved to `position` in window pixels
    pub fn process_mouse_motion(&mut self, position: Vec2) {
        self.mouse_delta += position - self.mouse_position;
        self.mouse_position = position;
    }

    pub fn process_scroll(&mut self, delta: Vec2) {
        self.scroll_delta += delta;
    }

    #[must_use]
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.held.contains(&key)
    }

    #[must_use]
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys.pressed.contains(&key)
    }

    #[must_use]
    pub fn is_key_just_released(&self, key: KeyCode) -> bool {
        self.keys.released.contains(&key)
    }

    #[must_use]
    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.held.contains(&button)
    }

    #[must_use]
    pub fn is_mouse_button_just_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.pressed.contains(&button)
    }

    #[must_use]
    pub fn is_mouse_button_just_released(&self, button: MouseButton) -> bool {
        self.mouse_buttons.released.contains(&button)
    }

    /// Axis from two opposing keys: -1, 0 or 1
    #[must_use]
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        f32::from(i8::from(self.is_key_pressed(positive)) - i8::from(self.is_key_pressed(negative)))
    }

    #[must_use]
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Pointer movement since the last frame
    #[must_use]
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Wheel movement since the last frame
    #[must_use]
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edges_last_one_frame() {
        let mut input = Input::new();
        input.process_keyboard(KeyCode::Space, ElementState::Pressed);
        assert!(input.is_key_pressed(KeyCode::Space));
        assert!(input.is_key_just_pressed(KeyCode::Space));

        input.end_frame();
        assert!(input.is_key_pressed(KeyCode::Space));
        assert!(!input.is_key_just_pressed(KeyCode::Space));

        input.process_keyboard(KeyCode::Space, ElementState::Released);
        assert!(!input.is_key_pressed(KeyCode::Space));
        assert!(input.is_key_just_released(KeyCode::Space));

        input.end_frame();
        assert!(!input.is_key_just_released(KeyCode::Space));
    }

    #[test]
    fn test_repeat_is_not_a_new_press() {
        let mut input = Input::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        input.end_frame();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        assert!(!input.is_key_just_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut input = Input::new();
        input.process_keyboard(KeyCode::KeyA, ElementState::Released);
        assert!(!input.is_key_just_released(KeyCode::KeyA));
    }

    #[test]
    fn test_press_and_release_in_one_frame() {
        let mut input = Input::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.process_mouse_button(MouseButton::Left, ElementState::Released);

        assert!(!input.is_mouse_button_pressed(MouseButton::Left));
        assert!(input.is_mouse_button_just_pressed(MouseButton::Left));
        assert!(input.is_mouse_button_just_released(MouseButton::Left));
    }

    #[test]
    fn test_pointer_and_wheel_deltas() {
        let mut input = Input::new();
        input.process_mouse_motion(Vec2::new(10.0, 5.0));
        input.process_mouse_motion(Vec2::new(12.0, 5.0));
        input.process_scroll(Vec2::new(0.0, 1.0));
        input.process_scroll(Vec2::new(0.0, 2.0));

        assert_eq!(input.mouse_position(), Vec2::new(12.0, 5.0));
        assert_eq!(input.mouse_delta(), Vec2::new(12.0, 5.0));
        assert_eq!(input.scroll_delta(), Vec2::new(0.0, 3.0));

        input.end_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert_eq!(input.scroll_delta(), Vec2::ZERO);
        assert_eq!(input.mouse_position(), Vec2::new(12.0, 5.0));
    }

    #[test]
    fn test_axis() {
        let mut input = Input::new();
        assert_eq!(input.axis(KeyCode::KeyA, KeyCode::KeyD), 0.0);
        input.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        assert_eq!(input.axis(KeyCode::KeyA, KeyCode::KeyD), 1.0);
        input.process_keyboard(KeyCode::KeyA, ElementState::Pressed);
        assert_eq!(input.axis(KeyCode::KeyA, KeyCode::KeyD), 0.0);
    }
}
