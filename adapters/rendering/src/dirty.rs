//! Tracking of the screen regions that changed since the last flip.

use serde::{Deserialize, Serialize};
use tactica_core::Rect;

use crate::DrawSurface;

/// Palette index used by the dirty-rect debug overlay.
pub const DEBUG_OVERLAY_COLOR: u8 = 252;

/// Dirty-rect tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirtyRectConfig {
    /// Whether composite is limited to dirty regions.
    pub enabled: bool,
    /// Most rectangles kept before the closest pair is forced together.
    pub max_rects: usize,
    /// Two touching rects merge when `bounding <= (a + b) / merge_threshold`.
    pub merge_threshold: f32,
}

impl Default for DirtyRectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_rects: 20,
            merge_threshold: 0.5,
        }
    }
}

/// Set of screen rectangles needing a redraw this frame.
#[derive(Clone, Debug)]
pub struct DirtyRectTracker {
    config: DirtyRectConfig,
    screen: Rect,
    rects: Vec<Rect>,
    full_redraw: bool,
}

impl DirtyRectTracker {
    /// Creates an empty tracker for a screen of the given size.
    #[must_use]
    pub fn new(config: DirtyRectConfig, width: i32, height: i32) -> Self {
        Self {
            config,
            screen: Rect::new(0, 0, width, height),
            rects: Vec::new(),
            full_redraw: false,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &DirtyRectConfig {
        &self.config
    }

    /// Changes the screen size; the next frame redraws everything.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.screen = Rect::new(0, 0, width, height);
        self.mark_full_redraw();
    }

    /// Adds a changed region, merging it with neighbours where cheap.
    ///
    /// Off-screen parts are clipped away and empty rectangles are ignored.
    pub fn mark_dirty(&mut self, rect: Rect) {
        if self.full_redraw {
            return;
        }
        let Some(clipped) = rect.intersection(&self.screen) else {
            return;
        };
        if self.rects.iter().any(|existing| existing.contains_rect(&clipped)) {
            return;
        }
        self.rects.push(clipped);
        self.merge_touching();
        while self.rects.len() > self.config.max_rects.max(1) {
            self.merge_closest_pair();
        }
    }

    /// Replaces every region with the whole screen until [`Self::clear`].
    pub fn mark_full_redraw(&mut self) {
        self.full_redraw = true;
        self.rects.clear();
        if !self.screen.is_empty() {
            self.rects.push(self.screen);
        }
    }

    /// Returns `true` when the whole screen is dirty.
    #[must_use]
    pub const fn is_full_redraw(&self) -> bool {
        self.full_redraw
    }

    /// Merged regions for this frame.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Returns `true` when nothing needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Sum of the region areas.
    #[must_use]
    pub fn total_area(&self) -> i64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Forgets every region after a flip.
    pub fn clear(&mut self) {
        self.rects.clear();
        self.full_redraw = false;
    }

    /// Outlines every region in [`DEBUG_OVERLAY_COLOR`].
    pub fn draw_debug_overlay<S>(&self, surface: &mut S)
    where
        S: DrawSurface + ?Sized,
    {
        for rect in &self.rects {
            surface.outline_rect(*rect, DEBUG_OVERLAY_COLOR);
        }
    }

    fn should_merge(&self, a: &Rect, b: &Rect) -> bool {
        if !a.touches(b) {
            return false;
        }
        let threshold = f64::from(self.config.merge_threshold);
        if threshold <= 0.0 {
            return a.contains_rect(b) || b.contains_rect(a);
        }
        let bounding = a.union(b).area() as f64;
        bounding <= (a.area() + b.area()) as f64 / threshold
    }

    fn merge_touching(&mut self) {
        'restart: loop {
            for i in 0..self.rects.len() {
                for j in (i + 1)..self.rects.len() {
                    if self.should_merge(&self.rects[i], &self.rects[j]) {
                        let merged = self.rects[i].union(&self.rects[j]);
                        let _ = self.rects.swap_remove(j);
                        self.rects[i] = merged;
                        continue 'restart;
                    }
                }
            }
            break;
        }
    }

    fn merge_closest_pair(&mut self) {
        let mut best: Option<(usize, usize, i64)> = None;
        for i in 0..self.rects.len() {
            for j in (i + 1)..self.rects.len() {
                let (a, b) = (&self.rects[i], &self.rects[j]);
                let waste = a.union(b).area() - a.area() - b.area();
                if best.map_or(true, |(_, _, w)| waste < w) {
                    best = Some((i, j, waste));
                }
            }
        }
        if let Some((i, j, _)) = best {
            let merged = self.rects[i].union(&self.rects[j]);
            let _ = self.rects.swap_remove(j);
            self.rects[i] = merged;
            self.merge_touching();
        }
    }
}

/// Tracker for a back buffer that alternates with a front buffer.
///
/// A region changed in frame `n` is stale in the other buffer too, so the
/// previous frame's regions are replayed into the current frame.
#[derive(Clone, Debug)]
pub struct DoubleBufferedDirtyTracker {
    current: DirtyRectTracker,
    previous: Vec<Rect>,
    previous_full: bool,
}

impl DoubleBufferedDirtyTracker {
    /// Creates an empty tracker for a screen of the given size.
    #[must_use]
    pub fn new(config: DirtyRectConfig, width: i32, height: i32) -> Self {
        Self {
            current: DirtyRectTracker::new(config, width, height),
            previous: Vec::new(),
            previous_full: false,
        }
    }

    /// Adds a changed region to this frame.
    pub fn mark_dirty(&mut self, rect: Rect) {
        self.current.mark_dirty(rect);
    }

    /// Redraws the whole screen this frame and the next.
    pub fn mark_full_redraw(&mut self) {
        self.current.mark_full_redraw();
    }

    /// Changes the screen size.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.current.resize(width, height);
    }

    /// Regions for this frame including the previous frame's.
    #[must_use]
    pub fn frame_rects(&self) -> DirtyRectTracker {
        let mut combined = self.current.clone();
        if self.previous_full {
            combined.mark_full_redraw();
        }
        for rect in &self.previous {
            combined.mark_dirty(*rect);
        }
        combined
    }

    /// Regions marked during this frame only.
    #[must_use]
    pub const fn current(&self) -> &DirtyRectTracker {
        &self.current
    }

    /// Rotates this frame's regions into the replay slot.
    pub fn end_frame(&mut self) {
        self.previous_full = self.current.is_full_redraw();
        self.previous = if self.previous_full {
            Vec::new()
        } else {
            self.current.rects().to_vec()
        };
        self.current.clear();
    }
}
