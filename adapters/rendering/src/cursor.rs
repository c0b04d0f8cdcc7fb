//! Software mouse pointer drawn from a cursor shape file.

use tactica_core::{CursorShape, Rect, ScreenPoint, ScrollEdge};

use crate::{DrawFlags, DrawParams, DrawSurface, ShapeId, ShapeRenderer};

/// Ticks each animation frame stays up unless overridden.
pub const DEFAULT_ANIMATION_DELAY: u32 = 4;

/// Frames of the cursor shape that make up one pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CursorFrames {
    /// First frame in the cursor shape file.
    pub first: usize,
    /// Number of animation frames.
    pub count: usize,
    /// Offset from the image's top-left corner to the point that clicks.
    pub hotspot: (i32, i32),
}

const fn scroll_frame(edge: ScrollEdge) -> usize {
    match edge {
        ScrollEdge::North => 1,
        ScrollEdge::NorthEast => 2,
        ScrollEdge::East => 3,
        ScrollEdge::SouthEast => 4,
        ScrollEdge::South => 5,
        ScrollEdge::SouthWest => 6,
        ScrollEdge::West => 7,
        ScrollEdge::NorthWest => 8,
    }
}

/// Frame layout of a pointer in the cursor shape file.
#[must_use]
pub const fn cursor_frames(shape: CursorShape) -> CursorFrames {
    const CENTER: (i32, i32) = (12, 12);
    const CROSSHAIR: (i32, i32) = (15, 15);
    let (first, count, hotspot) = match shape {
        CursorShape::Arrow => (0, 1, (0, 0)),
        CursorShape::Scroll(edge) => (scroll_frame(edge), 1, CENTER),
        CursorShape::NoScroll => (9, 1, CENTER),
        CursorShape::Move => (10, 1, CENTER),
        CursorShape::NoMove => (11, 1, CENTER),
        CursorShape::Select => (12, 4, CROSSHAIR),
        CursorShape::Attack => (16, 4, CROSSHAIR),
        CursorShape::Enter => (20, 1, CENTER),
        CursorShape::Deploy => (21, 1, CENTER),
        CursorShape::Sell => (22, 1, CENTER),
        CursorShape::Repair => (23, 1, CENTER),
        CursorShape::Guard => (24, 1, CENTER),
        CursorShape::Capture => (25, 1, CENTER),
        CursorShape::Harvest => (26, 1, CENTER),
    };
    CursorFrames {
        first,
        count,
        hotspot,
    }
}

/// Animated software pointer.
#[derive(Clone, Debug)]
pub struct MouseCursor {
    shape_id: ShapeId,
    shape: CursorShape,
    hidden: bool,
    locked: bool,
    frame: usize,
    counter: u32,
    delay: u32,
}

impl MouseCursor {
    /// Pointer drawn from the given cursor shape file.
    #[must_use]
    pub const fn new(shape_id: ShapeId) -> Self {
        Self {
            shape_id,
            shape: CursorShape::Arrow,
            hidden: false,
            locked: false,
            frame: 0,
            counter: 0,
            delay: DEFAULT_ANIMATION_DELAY,
        }
    }

    /// Shape file the pointer is drawn from.
    #[must_use]
    pub const fn shape_id(&self) -> ShapeId {
        self.shape_id
    }

    /// Current pointer.
    #[must_use]
    pub const fn shape(&self) -> CursorShape {
        self.shape
    }

    /// Switches pointer; restarts the animation when it changes. Ignored while locked.
    pub fn set_shape(&mut self, shape: CursorShape) {
        if self.locked || self.shape == shape {
            return;
        }
        self.shape = shape;
        self.frame = 0;
        self.counter = 0;
    }

    /// Freezes the pointer shape.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Lets the pointer shape change again.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Returns `true` while the shape is frozen.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Shows or hides the pointer.
    pub fn set_visible(&mut self, visible: bool) {
        self.hidden = !visible;
    }

    /// Returns `true` when the pointer is drawn.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !self.hidden
    }

    /// Ticks per animation frame; zero is treated as one.
    pub fn set_animation_delay(&mut self, ticks: u32) {
        self.delay = ticks.max(1);
    }

    /// Click point offset for the current pointer.
    #[must_use]
    pub const fn hotspot(&self) -> (i32, i32) {
        cursor_frames(self.shape).hotspot
    }

    /// Frame of the shape file drawn now.
    #[must_use]
    pub const fn current_frame(&self) -> usize {
        cursor_frames(self.shape).first + self.frame
    }

    /// Advances the animation one tick.
    pub fn update(&mut self) {
        let frames = cursor_frames(self.shape);
        if frames.count <= 1 {
            return;
        }
        self.counter += 1;
        if self.counter >= self.delay {
            self.counter = 0;
            self.frame = (self.frame + 1) % frames.count;
        }
    }

    fn top_left(&self, position: ScreenPoint) -> (i32, i32) {
        let (hx, hy) = self.hotspot();
        (position.x() - hx, position.y() - hy)
    }

    /// Screen area the pointer covers when drawn at `position`.
    #[must_use]
    pub fn bounds(&self, shapes: &ShapeRenderer, position: ScreenPoint) -> Option<Rect> {
        if self.hidden {
            return None;
        }
        let (x, y) = self.top_left(position);
        shapes.bounds(self.shape_id, x, y, DrawFlags::empty())
    }

    /// Draws the pointer with its hotspot on `position`. Returns the covered area.
    pub fn draw<S>(
        &self,
        surface: &mut S,
        shapes: &mut ShapeRenderer,
        position: ScreenPoint,
    ) -> Option<Rect>
    where
        S: DrawSurface + ?Sized,
    {
        if self.hidden {
            return None;
        }
        let (x, y) = self.top_left(position);
        if shapes.draw(surface, self.shape_id, self.current_frame(), x, y, &DrawParams::new()) {
            self.bounds(shapes, position)
        } else {
            None
        }
    }
}
