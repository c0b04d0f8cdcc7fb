use std::collections::HashSet;

use glam::Vec2;
use macroquad::input::KeyCode;
use tactica_core::keys;
use tactica_rendering_macroquad::{virtual_key, Letterbox, TRACKED_KEYS};

#[test]
fn every_tracked_key_is_listed_once() {
    let mut seen = HashSet::new();
    for (key, _) in TRACKED_KEYS {
        assert!(seen.insert(format!("{key:?}")), "{key:?} listed twice");
    }
}

#[test]
fn keys_map_to_virtual_codes() {
    assert_eq!(virtual_key(KeyCode::A), Some(b'A'));
    assert_eq!(virtual_key(KeyCode::Key7), Some(b'7'));
    assert_eq!(virtual_key(KeyCode::F10), Some(keys::function(10)));
    assert_eq!(virtual_key(KeyCode::RightControl), Some(keys::CONTROL));
    assert_eq!(virtual_key(KeyCode::Escape), Some(keys::ESCAPE));
    assert_eq!(virtual_key(KeyCode::Menu), None, "untracked keys are dropped");
}

#[test]
fn window_positions_land_on_frame_pixels() {
    let letterbox = Letterbox::fit(Vec2::new(1280.0, 800.0), Vec2::new(640.0, 400.0));
    assert_eq!(letterbox.origin, Vec2::ZERO);
    assert_eq!(letterbox.to_frame(0.0, 0.0), (0, 0));
    assert_eq!(letterbox.to_frame(1279.0, 799.0), (639, 399));
    assert_eq!(letterbox.to_frame(641.0, 401.0), (320, 200));
}
