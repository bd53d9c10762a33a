use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState};

/// Keyboard state for one window.
///
/// `keys_down` persists across frames; the pressed/released sets only hold
/// transitions since the last [`end_frame`](Self::end_frame).
#[derive(Debug, Default)]
pub struct InputState {
    pub focused: bool,
    keys_down: HashSet<Key>,
    pressed: HashSet<Key>,
    released: HashSet<Key>,
}

impl InputState {
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match *ev {
            InputEvent::Focused(focused) => {
                self.focused = focused;
                if !focused {
                    // Releases are not delivered while unfocused.
                    self.released.extend(self.keys_down.drain());
                }
            }
            InputEvent::Key { key, state: KeyState::Pressed, .. } => {
                if self.keys_down.insert(key) {
                    self.pressed.insert(key);
                }
            }
            InputEvent::Key { key, state: KeyState::Released, .. } => {
                if self.keys_down.remove(&key) {
                    self.released.insert(key);
                }
            }
        }
    }

    /// Held right now.
    #[inline]
    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Went down this frame. Key repeat does not count.
    #[inline]
    pub fn key_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    #[inline]
    pub fn key_released(&self, key: Key) -> bool {
        self.released.contains(&key)
    }

    /// `+1.0` if only `positive` is held, `-1.0` if only `negative`, else `0.0`.
    pub fn axis(&self, negative: Key, positive: Key) -> f32 {
        let mut v = 0.0;
        if self.key_down(positive) {
            v += 1.0;
        }
        if self.key_down(negative) {
            v -= 1.0;
        }
        v
    }

    /// Clears per-frame transitions.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState, repeat: bool) -> InputEvent {
        InputEvent::Key { key, state, repeat }
    }

    #[test]
    fn press_is_reported_once_per_frame() {
        let mut s = InputState::default();
        s.apply_event(&key(Key::W, KeyState::Pressed, false));
        s.apply_event(&key(Key::W, KeyState::Pressed, true));
        assert!(s.key_down(Key::W));
        assert!(s.key_pressed(Key::W));

        s.end_frame();
        assert!(s.key_down(Key::W));
        assert!(!s.key_pressed(Key::W));
    }

    #[test]
    fn release_clears_down_state() {
        let mut s = InputState::default();
        s.apply_event(&key(Key::A, KeyState::Pressed, false));
        s.end_frame();
        s.apply_event(&key(Key::A, KeyState::Released, false));
        assert!(!s.key_down(Key::A));
        assert!(s.key_released(Key::A));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut s = InputState::default();
        s.apply_event(&key(Key::S, KeyState::Released, false));
        assert!(!s.key_released(Key::S));
    }

    #[test]
    fn focus_loss_releases_held_keys() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::Focused(true));
        s.apply_event(&key(Key::D, KeyState::Pressed, false));
        s.apply_event(&InputEvent::Focused(false));
        assert!(!s.focused);
        assert!(!s.key_down(Key::D));
        assert!(s.key_released(Key::D));
    }

    #[test]
    fn axis_cancels_opposing_keys() {
        let mut s = InputState::default();
        assert_eq!(s.axis(Key::A, Key::D), 0.0);
        s.apply_event(&key(Key::D, KeyState::Pressed, false));
        assert_eq!(s.axis(Key::A, Key::D), 1.0);
        s.apply_event(&key(Key::A, KeyState::Pressed, false));
        assert_eq!(s.axis(Key::A, Key::D), 0.0);
    }
}
