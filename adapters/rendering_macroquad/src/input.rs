//! Device polling translated into [`RawInput`] snapshots.

use std::time::Duration;

use macroquad::input::{
    is_key_down, is_key_pressed, is_mouse_button_down, mouse_position, mouse_wheel, KeyCode,
    MouseButton as MacroquadButton,
};
use tactica_core::{keys, MouseButton, RawInput};

use crate::surface::Letterbox;

/// Keys polled every frame with their virtual key codes.
///
/// Left and right modifiers share one code.
pub const TRACKED_KEYS: [(KeyCode, u8); 73] = [
    (KeyCode::Backspace, keys::BACKSPACE),
    (KeyCode::Tab, keys::TAB),
    (KeyCode::Enter, keys::RETURN),
    (KeyCode::KpEnter, keys::RETURN),
    (KeyCode::LeftShift, keys::SHIFT),
    (KeyCode::RightShift, keys::SHIFT),
    (KeyCode::LeftControl, keys::CONTROL),
    (KeyCode::RightControl, keys::CONTROL),
    (KeyCode::LeftAlt, keys::ALT),
    (KeyCode::RightAlt, keys::ALT),
    (KeyCode::Pause, keys::PAUSE),
    (KeyCode::Escape, keys::ESCAPE),
    (KeyCode::Space, keys::SPACE),
    (KeyCode::End, keys::END),
    (KeyCode::Home, keys::HOME),
    (KeyCode::Left, keys::LEFT),
    (KeyCode::Up, keys::UP),
    (KeyCode::Right, keys::RIGHT),
    (KeyCode::Down, keys::DOWN),
    (KeyCode::Delete, keys::DELETE),
    (KeyCode::LeftSuper, keys::META),
    (KeyCode::RightSuper, keys::META),
    (KeyCode::Key0, keys::digit(0)),
    (KeyCode::Key1, keys::digit(1)),
    (KeyCode::Key2, keys::digit(2)),
    (KeyCode::Key3, keys::digit(3)),
    (KeyCode::Key4, keys::digit(4)),
    (KeyCode::Key5, keys::digit(5)),
    (KeyCode::Key6, keys::digit(6)),
    (KeyCode::Key7, keys::digit(7)),
    (KeyCode::Key8, keys::digit(8)),
    (KeyCode::Key9, keys::digit(9)),
    (KeyCode::A, keys::letter('A')),
    (KeyCode::B, keys::letter('B')),
    (KeyCode::C, keys::letter('C')),
    (KeyCode::D, keys::letter('D')),
    (KeyCode::E, keys::letter('E')),
    (KeyCode::F, keys::letter('F')),
    (KeyCode::G, keys::letter('G')),
    (KeyCode::H, keys::letter('H')),
    (KeyCode::I, keys::letter('I')),
    (KeyCode::J, keys::letter('J')),
    (KeyCode::K, keys::letter('K')),
    (KeyCode::L, keys::letter('L')),
    (KeyCode::M, keys::letter('M')),
    (KeyCode::N, keys::letter('N')),
    (KeyCode::O, keys::letter('O')),
    (KeyCode::P, keys::letter('P')),
    (KeyCode::Q, keys::letter('Q')),
    (KeyCode::R, keys::letter('R')),
    (KeyCode::S, keys::letter('S')),
    (KeyCode::T, keys::letter('T')),
    (KeyCode::U, keys::letter('U')),
    (KeyCode::V, keys::letter('V')),
    (KeyCode::W, keys::letter('W')),
    (KeyCode::X, keys::letter('X')),
    (KeyCode::Y, keys::letter('Y')),
    (KeyCode::Z, keys::letter('Z')),
    (KeyCode::F1, keys::function(1)),
    (KeyCode::F2, keys::function(2)),
    (KeyCode::F3, keys::function(3)),
    (KeyCode::F4, keys::function(4)),
    (KeyCode::F5, keys::function(5)),
    (KeyCode::F6, keys::function(6)),
    (KeyCode::F7, keys::function(7)),
    (KeyCode::F8, keys::function(8)),
    (KeyCode::F9, keys::function(9)),
    (KeyCode::F10, keys::function(10)),
    (KeyCode::F11, keys::function(11)),
    (KeyCode::F12, keys::function(12)),
    (KeyCode::PageUp, 33),
    (KeyCode::PageDown, 34),
    (KeyCode::Insert, 45),
];

/// Virtual key code for a macroquad key, if the key is tracked.
#[must_use]
pub fn virtual_key(key: KeyCode) -> Option<u8> {
    TRACKED_KEYS
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, code)| *code)
}

/// Collects codes reported by `is_set`, keeping the first occurrence of each.
pub(crate) fn collect_codes<F>(mut is_set: F) -> Vec<u8>
where
    F: FnMut(KeyCode) -> bool,
{
    let mut codes = Vec::new();
    for (key, code) in TRACKED_KEYS {
        if is_set(key) && !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

/// Normalises a wheel delta to whole notches.
#[must_use]
pub fn wheel_notches(delta: f32) -> i32 {
    if delta > 0.0 {
        1
    } else if delta < 0.0 {
        -1
    } else {
        0
    }
}

/// Reads the current device state. Mouse coordinates are mapped into frame pixels.
pub(crate) fn poll(letterbox: &Letterbox, timestamp: Duration) -> RawInput {
    let (mouse_x, mouse_y) = mouse_position();
    let (x, y) = letterbox.to_frame(mouse_x, mouse_y);
    let mut buttons = [false; 3];
    for button in MouseButton::ALL {
        let device = match button {
            MouseButton::Left => MacroquadButton::Left,
            MouseButton::Right => MacroquadButton::Right,
            MouseButton::Middle => MacroquadButton::Middle,
        };
        buttons[button.index()] = is_mouse_button_down(device);
    }
    let (_, wheel_y) = mouse_wheel();

    RawInput {
        keys_down: collect_codes(is_key_down),
        typed: collect_codes(is_key_pressed),
        mouse_x: x,
        mouse_y: y,
        buttons,
        wheel: wheel_notches(wheel_y),
        timestamp,
    }
}
