#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Raw device state, edge detection and semantic action mapping.
//!
//! Platform adapters hand a [`RawInput`] snapshot to [`InputState::update`]
//! once per frame. The state keeps the previous snapshot so presses and
//! releases can be detected, converts the window-space mouse position into
//! game-screen pixels, tracks double clicks and drags, and routes typed keys
//! to a text field when one owns the keyboard. [`InputMapper`] then turns the
//! keyboard state into [`GameAction`]s.

mod actions;
mod keyboard;
mod mouse;
mod text;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tactica_core::{RawInput, Rect, ScreenPoint};
use tracing::debug;

pub use actions::{
    BindingOverride, GameAction, InputMapper, KeyBinding, BOOKMARK_COUNT, GROUP_COUNT,
};
pub use keyboard::{KeyboardState, Modifiers};
pub use mouse::{DragState, MouseState, PointerThresholds};
pub use text::{key_to_char, InputFocus, TextEntryStatus, TextInput};

/// Input tuning loaded from configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Width of the game screen the mouse position is clamped to.
    pub screen_width: i32,
    /// Height of the game screen the mouse position is clamped to.
    pub screen_height: i32,
    /// Longest gap in milliseconds between the presses of a double click.
    pub double_click_ms: u64,
    /// Furthest the cursor may move between the presses of a double click.
    pub double_click_distance: i32,
    /// Distance the cursor must travel before a held press becomes a drag.
    pub drag_threshold: i32,
    /// Whether the debug bindings respond.
    pub debug_bindings: bool,
    /// Bindings replacing the defaults.
    pub bindings: Vec<BindingOverride>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            screen_width: 640,
            screen_height: 400,
            double_click_ms: 400,
            double_click_distance: 4,
            drag_threshold: 4,
            debug_bindings: false,
            bindings: Vec::new(),
        }
    }
}

impl InputConfig {
    /// Click and drag thresholds derived from the configuration.
    #[must_use]
    pub const fn thresholds(&self) -> PointerThresholds {
        PointerThresholds {
            double_click_window: Duration::from_millis(self.double_click_ms),
            double_click_distance: self.double_click_distance,
            drag_threshold: self.drag_threshold,
        }
    }

    /// Builds a mapper with the configured debug toggle and overrides applied.
    #[must_use]
    pub fn mapper(&self) -> InputMapper {
        let mut mapper = InputMapper::new(self.debug_bindings);
        mapper.apply_overrides(&self.bindings);
        mapper
    }
}

/// Keyboard and mouse state for the current frame.
#[derive(Clone, Debug)]
pub struct InputState {
    config: InputConfig,
    keyboard: KeyboardState,
    mouse: MouseState,
    focus: InputFocus,
    text: TextInput,
    drag_region: Rect,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

impl InputState {
    /// Creates an idle input state.
    #[must_use]
    pub fn new(config: InputConfig) -> Self {
        let drag_region = Rect::new(0, 0, config.screen_width, config.screen_height);
        Self {
            config,
            keyboard: KeyboardState::default(),
            mouse: MouseState::default(),
            focus: InputFocus::Game,
            text: TextInput::default(),
            drag_region,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Restricts where a left press may start a drag (screen pixels).
    pub fn set_drag_region(&mut self, region: Rect) {
        self.drag_region = region;
    }

    /// Consumes a raw snapshot.
    ///
    /// `scale` is the ratio of window pixels to game-screen pixels on each axis.
    pub fn update(&mut self, raw: &RawInput, scale: (f32, f32)) {
        if self.focus == InputFocus::Disabled {
            self.keyboard.release_all();
            return;
        }

        self.keyboard.update(&raw.keys_down, &raw.typed);
        let position = self.to_screen(raw.mouse_x, raw.mouse_y, scale);
        self.mouse.update(
            position,
            raw.buttons,
            raw.wheel,
            raw.timestamp,
            &self.config.thresholds(),
            self.drag_region,
        );

        if self.focus == InputFocus::Text {
            let shift = self.keyboard.modifiers().contains(Modifiers::SHIFT);
            for &key in self.keyboard.typed() {
                let _ = self.text.handle_key(key, shift);
            }
            if self.text.status() != TextEntryStatus::Editing {
                debug!(status = ?self.text.status(), "text entry finished");
                self.focus = InputFocus::Game;
            }
        }
    }

    fn to_screen(&self, x: i32, y: i32, (scale_x, scale_y): (f32, f32)) -> ScreenPoint {
        let scale_x = if scale_x > 0.0 { scale_x } else { 1.0 };
        let scale_y = if scale_y > 0.0 { scale_y } else { 1.0 };
        let max_x = (self.config.screen_width - 1).max(0);
        let max_y = (self.config.screen_height - 1).max(0);
        ScreenPoint::new(
            ((x as f32 / scale_x) as i32).clamp(0, max_x),
            ((y as f32 / scale_y) as i32).clamp(0, max_y),
        )
    }

    /// Keyboard snapshot.
    #[must_use]
    pub const fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    /// Mouse snapshot.
    #[must_use]
    pub const fn mouse(&self) -> &MouseState {
        &self.mouse
    }

    /// Modifier keys currently held.
    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.keyboard.modifiers()
    }

    /// Consumer owning the keyboard.
    #[must_use]
    pub const fn focus(&self) -> InputFocus {
        self.focus
    }

    /// Hands the keyboard to another consumer. Leaving text focus cancels the entry.
    pub fn set_focus(&mut self, focus: InputFocus) {
        if self.focus == InputFocus::Text
            && focus != InputFocus::Text
            && self.text.status() == TextEntryStatus::Editing
        {
            self.text.cancel();
        }
        self.focus = focus;
    }

    /// Starts a text entry and gives it the keyboard.
    pub fn begin_text_input(&mut self, max_len: usize) {
        self.text = TextInput::new(max_len);
        self.focus = InputFocus::Text;
    }

    /// Text entry buffer.
    #[must_use]
    pub const fn text(&self) -> &TextInput {
        &self.text
    }

    /// Returns `true` when keys should drive game actions.
    #[must_use]
    pub fn accepts_game_input(&self) -> bool {
        self.focus == InputFocus::Game
    }
}
