//! Keyboard snapshots with edge detection.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tactica_core::keys;

const KEY_COUNT: usize = 256;

bitflags! {
    /// Modifier keys held while another key or button is used.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        /// Either shift key.
        const SHIFT = 1 << 0;
        /// Either control key.
        const CTRL  = 1 << 1;
        /// Either alt key.
        const ALT   = 1 << 2;
        /// Either meta key.
        const META  = 1 << 3;
    }
}

/// Current and previous key state.
#[derive(Clone, Debug)]
pub struct KeyboardState {
    current: [bool; KEY_COUNT],
    previous: [bool; KEY_COUNT],
    typed: Vec<u8>,
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self {
            current: [false; KEY_COUNT],
            previous: [false; KEY_COUNT],
            typed: Vec::new(),
        }
    }
}

impl KeyboardState {
    /// Rolls the current snapshot into the previous one and records the new state.
    pub fn update(&mut self, keys_down: &[u8], typed: &[u8]) {
        self.previous = self.current;
        self.current = [false; KEY_COUNT];
        for &key in keys_down {
            self.current[usize::from(key)] = true;
        }
        self.typed.clear();
        self.typed.extend_from_slice(typed);
    }

    /// Forgets every held key, for example when the window loses focus.
    pub fn release_all(&mut self) {
        self.previous = self.current;
        self.current = [false; KEY_COUNT];
        self.typed.clear();
    }

    /// Returns `true` while the key is held.
    #[must_use]
    pub fn is_down(&self, key: u8) -> bool {
        self.current[usize::from(key)]
    }

    /// Returns `true` on the frame the key went down.
    #[must_use]
    pub fn was_pressed(&self, key: u8) -> bool {
        let index = usize::from(key);
        self.current[index] && !self.previous[index]
    }

    /// Returns `true` on the frame the key came up.
    #[must_use]
    pub fn was_released(&self, key: u8) -> bool {
        let index = usize::from(key);
        !self.current[index] && self.previous[index]
    }

    /// Keys typed this frame in the order the platform reported them.
    #[must_use]
    pub fn typed(&self) -> &[u8] {
        &self.typed
    }

    /// Modifier keys currently held.
    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::SHIFT, self.is_down(keys::SHIFT));
        modifiers.set(Modifiers::CTRL, self.is_down(keys::CONTROL));
        modifiers.set(Modifiers::ALT, self.is_down(keys::ALT));
        modifiers.set(Modifiers::META, self.is_down(keys::META));
        modifiers
    }
}
