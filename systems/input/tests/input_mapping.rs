use std::time::Duration;

use tactica_core::{keys, MouseButton, RawInput, Rect};
use tactica_system_input::{GameAction, InputConfig, InputState, Modifiers};

fn raw(keys_down: &[u8], left: bool, x: i32, y: i32, millis: u64) -> RawInput {
    RawInput {
        keys_down: keys_down.to_vec(),
        typed: Vec::new(),
        mouse_x: x,
        mouse_y: y,
        buttons: [left, false, false],
        wheel: 0,
        timestamp: Duration::from_millis(millis),
    }
}

#[test]
fn partial_toml_configuration_keeps_defaults() {
    let config: InputConfig = toml::from_str(
        r#"
        drag_threshold = 8

        [[bindings]]
        action = "Stop"
        key = 75
        "#,
    )
    .expect("config parses");

    assert_eq!(config.drag_threshold, 8);
    assert_eq!(config.double_click_ms, 400, "unspecified fields keep defaults");

    let mapper = config.mapper();
    assert_eq!(
        mapper.has_conflict(keys::letter('k'), Modifiers::empty()),
        Some(GameAction::Stop),
        "override must rebind stop to K"
    );
}

#[test]
fn mapper_sees_keys_recorded_by_input_state() {
    let mut input = InputState::default();
    let mut mapper = InputConfig::default().mapper();

    input.update(&raw(&[keys::CONTROL, keys::letter('a')], false, 0, 0, 0), (1.0, 1.0));
    mapper.evaluate(input.keyboard());

    assert!(mapper.triggered(GameAction::SelectAll));
    assert!(!mapper.triggered(GameAction::AttackMove), "ctrl excludes attack move");
    assert!(mapper.is_active(GameAction::ForceFire));
}

#[test]
fn drags_only_start_inside_the_configured_region() {
    let mut input = InputState::default();
    input.set_drag_region(Rect::new(0, 16, 480, 384));

    input.update(&raw(&[], true, 100, 100, 0), (1.0, 1.0));
    input.update(&raw(&[], true, 200, 180, 16), (1.0, 1.0));
    assert!(input.mouse().is_dragging());
    input.update(&raw(&[], false, 200, 180, 32), (1.0, 1.0));
    assert_eq!(
        input.mouse().drag_completed(),
        Some(Rect::spanning(100, 100, 200, 180))
    );
    assert!(input.mouse().was_released(MouseButton::Left));

    input.update(&raw(&[], true, 560, 100, 48), (1.0, 1.0));
    input.update(&raw(&[], true, 600, 200, 64), (1.0, 1.0));
    assert!(!input.mouse().is_dragging(), "presses on the sidebar never drag");
}
