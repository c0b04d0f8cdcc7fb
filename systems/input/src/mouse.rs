//! Mouse buttons, double clicks and drag tracking.

use std::time::Duration;

use tactica_core::{MouseButton, Rect, ScreenPoint};

/// Thresholds governing click and drag recognition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerThresholds {
    /// Longest gap between two presses that still counts as a double click.
    pub double_click_window: Duration,
    /// Furthest the cursor may travel between the presses of a double click.
    pub double_click_distance: i32,
    /// Distance the cursor must travel with the button held before a drag starts.
    pub drag_threshold: i32,
}

/// Progress of a left-button drag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DragState {
    /// Where the button went down.
    pub anchor: ScreenPoint,
    /// Latest cursor position while the button is held.
    pub current: ScreenPoint,
    /// Whether the cursor moved past the drag threshold.
    pub started: bool,
}

impl DragState {
    /// Screen rectangle spanned by the anchor and the current position.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::spanning(
            self.anchor.x(),
            self.anchor.y(),
            self.current.x(),
            self.current.y(),
        )
    }
}

/// Mouse snapshot for the current and previous frame.
#[derive(Clone, Debug, Default)]
pub struct MouseState {
    position: ScreenPoint,
    buttons: [bool; 3],
    previous: [bool; 3],
    wheel: i32,
    double_clicked: [bool; 3],
    last_press: [Option<(Duration, ScreenPoint)>; 3],
    drag: Option<DragState>,
    drag_completed: Option<Rect>,
}

impl MouseState {
    /// Records a new snapshot.
    ///
    /// A drag is only armed when the left button goes down inside `drag_region`.
    pub fn update(
        &mut self,
        position: ScreenPoint,
        buttons: [bool; 3],
        wheel: i32,
        timestamp: Duration,
        thresholds: &PointerThresholds,
        drag_region: Rect,
    ) {
        self.position = position;
        self.previous = self.buttons;
        self.buttons = buttons;
        self.wheel = wheel;
        self.double_clicked = [false; 3];
        self.drag_completed = None;

        for button in MouseButton::ALL {
            if self.was_pressed(button) {
                self.register_press(button, timestamp, thresholds);
            }
        }
        self.update_drag(thresholds, drag_region);
    }

    fn register_press(
        &mut self,
        button: MouseButton,
        timestamp: Duration,
        thresholds: &PointerThresholds,
    ) {
        let index = button.index();
        let position = self.position;
        let is_double = self.last_press[index].is_some_and(|(time, at)| {
            timestamp.saturating_sub(time) <= thresholds.double_click_window
                && distance_squared(at, position)
                    <= thresholds.double_click_distance * thresholds.double_click_distance
        });
        if is_double {
            self.double_clicked[index] = true;
            self.last_press[index] = None;
        } else {
            self.last_press[index] = Some((timestamp, position));
        }
    }

    fn update_drag(&mut self, thresholds: &PointerThresholds, drag_region: Rect) {
        if self.was_pressed(MouseButton::Left)
            && drag_region.contains_point(self.position.x(), self.position.y())
        {
            self.drag = Some(DragState {
                anchor: self.position,
                current: self.position,
                started: false,
            });
            return;
        }

        let Some(mut drag) = self.drag else {
            return;
        };
        if self.is_down(MouseButton::Left) {
            drag.current = self.position;
            if !drag.started
                && distance_squared(drag.anchor, drag.current)
                    >= thresholds.drag_threshold * thresholds.drag_threshold
            {
                drag.started = true;
            }
            self.drag = Some(drag);
        } else {
            if drag.started {
                self.drag_completed = Some(drag.rect());
            }
            self.drag = None;
        }
    }

    /// Cursor position in screen pixels.
    #[must_use]
    pub const fn position(&self) -> ScreenPoint {
        self.position
    }

    /// Wheel movement reported this frame.
    #[must_use]
    pub const fn wheel(&self) -> i32 {
        self.wheel
    }

    /// Returns `true` while the button is held.
    #[must_use]
    pub const fn is_down(&self, button: MouseButton) -> bool {
        self.buttons[button.index()]
    }

    /// Returns `true` on the frame the button went down.
    #[must_use]
    pub const fn was_pressed(&self, button: MouseButton) -> bool {
        self.buttons[button.index()] && !self.previous[button.index()]
    }

    /// Returns `true` on the frame the button came up.
    #[must_use]
    pub const fn was_released(&self, button: MouseButton) -> bool {
        !self.buttons[button.index()] && self.previous[button.index()]
    }

    /// Returns `true` on the frame the second press of a double click landed.
    #[must_use]
    pub const fn was_double_clicked(&self, button: MouseButton) -> bool {
        self.double_clicked[button.index()]
    }

    /// Drag in progress, if the left button is held after an armed press.
    #[must_use]
    pub const fn drag(&self) -> Option<DragState> {
        self.drag
    }

    /// Returns `true` while a drag is past its threshold.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|drag| drag.started)
    }

    /// Rectangle of a drag that ended this frame. Reported exactly once.
    #[must_use]
    pub const fn drag_completed(&self) -> Option<Rect> {
        self.drag_completed
    }
}

fn distance_squared(a: ScreenPoint, b: ScreenPoint) -> i32 {
    let dx = a.x() - b.x();
    let dy = a.y() - b.y();
    dx * dx + dy * dy
}
