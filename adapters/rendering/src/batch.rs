//! Per-frame queue of draw requests grouped by shared source and remap.

use std::ops::Range;

use tactica_core::{Rect, ScreenPoint, TemplateId};

use crate::{DrawFlags, HouseColor, ShapeId};

/// Draw layers, back to front.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Map tiles.
    #[default]
    Terrain,
    /// Unit and building shadows.
    Shadow,
    /// Units and buildings.
    Object,
    /// Explosions, projectiles and other transient effects.
    Effect,
    /// Sidebar, radar and tab bar.
    Ui,
    /// Mouse pointer.
    Cursor,
}

/// Image a request draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawSource {
    /// Frame of a loaded shape.
    Shape(ShapeId),
    /// Icon of a terrain template.
    Tile(TemplateId),
}

/// One queued draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteRequest {
    /// Image to draw.
    pub source: DrawSource,
    /// Shape frame or template icon.
    pub frame: usize,
    /// Destination in screen pixels.
    pub position: ScreenPoint,
    /// Layer the request belongs to.
    pub layer: RenderLayer,
    /// Depth key inside the layer; larger values draw later.
    pub sort_y: i32,
    /// House colour remap, if any.
    pub remap: Option<HouseColor>,
    /// Drawing modes.
    pub flags: DrawFlags,
    /// Flat colour, effect phase or fade level, depending on `flags`.
    pub param: u8,
}

impl SpriteRequest {
    /// Draws a shape frame on the object layer, sorted by its y position.
    #[must_use]
    pub const fn shape(shape: ShapeId, frame: usize, position: ScreenPoint) -> Self {
        Self {
            source: DrawSource::Shape(shape),
            frame,
            position,
            layer: RenderLayer::Object,
            sort_y: position.y(),
            remap: None,
            flags: DrawFlags::empty(),
            param: 0,
        }
    }

    /// Moves the request to another layer.
    #[must_use]
    pub const fn on_layer(mut self, layer: RenderLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Overrides the depth key.
    #[must_use]
    pub const fn with_sort_y(mut self, sort_y: i32) -> Self {
        self.sort_y = sort_y;
        self
    }

    /// Recolours the house range.
    #[must_use]
    pub const fn with_remap(mut self, remap: HouseColor) -> Self {
        self.remap = Some(remap);
        self
    }

    /// Sets the drawing modes.
    #[must_use]
    pub const fn with_flags(mut self, flags: DrawFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the effect parameter.
    #[must_use]
    pub const fn with_param(mut self, param: u8) -> Self {
        self.param = param;
        self
    }

    fn group_key(&self) -> (DrawSource, Option<HouseColor>) {
        (self.source, self.remap)
    }
}

/// Consecutive requests sharing a source and remap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchGroup {
    /// Shared source.
    pub source: DrawSource,
    /// Shared remap.
    pub remap: Option<HouseColor>,
    /// Positions of the requests in the planned order.
    pub range: Range<usize>,
}

/// Counters for the last flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Requests drawn.
    pub requests: usize,
    /// Groups formed.
    pub groups: usize,
    /// Source or remap switches avoided by grouping.
    pub state_changes_saved: usize,
}

/// Frame-long queue of sprite requests.
#[derive(Clone, Debug, Default)]
pub struct SpriteBatch {
    requests: Vec<SpriteRequest>,
    reorder: bool,
    last: BatchStats,
}

impl SpriteBatch {
    /// Creates an empty batch. `reorder` enables the overlap-checked reordering pass.
    #[must_use]
    pub fn new(reorder: bool) -> Self {
        Self {
            requests: Vec::new(),
            reorder,
            last: BatchStats::default(),
        }
    }

    /// Queues a request.
    pub fn push(&mut self, request: SpriteRequest) {
        self.requests.push(request);
    }

    /// Number of queued requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Queued requests in their current order.
    #[must_use]
    pub fn requests(&self) -> &[SpriteRequest] {
        &self.requests
    }

    /// Counters from the last flush.
    #[must_use]
    pub const fn last_stats(&self) -> BatchStats {
        self.last
    }

    /// Orders the queue for drawing and returns its groups.
    ///
    /// Requests are stable-sorted by `(layer, sort_y)`, so equal keys keep
    /// submission order. With reordering enabled a request may then move
    /// earlier within its layer to join a matching group, but only past
    /// requests whose `bounds` it does not overlap. A request without bounds
    /// never moves and nothing moves past it.
    pub fn plan<B>(&mut self, bounds: B) -> Vec<BatchGroup>
    where
        B: Fn(&SpriteRequest) -> Option<Rect>,
    {
        self.requests.sort_by_key(|request| (request.layer, request.sort_y));
        if self.reorder {
            self.reorder_by_group(&bounds);
        }
        self.groups()
    }

    /// Plans the queue, hands every request to `draw` in order and empties the queue.
    pub fn flush<B, F>(&mut self, bounds: B, mut draw: F) -> BatchStats
    where
        B: Fn(&SpriteRequest) -> Option<Rect>,
        F: FnMut(&SpriteRequest),
    {
        let groups = self.plan(bounds);
        for group in &groups {
            for request in &self.requests[group.range.clone()] {
                draw(request);
            }
        }
        self.finish(groups.len())
    }

    /// Records counters for a queue drawn from [`Self::plan`]'s order and empties it.
    pub fn finish(&mut self, groups: usize) -> BatchStats {
        let requests = self.requests.len();
        self.last = BatchStats {
            requests,
            groups,
            state_changes_saved: requests.saturating_sub(groups),
        };
        self.requests.clear();
        self.last
    }

    /// Drops every queued request.
    pub fn clear(&mut self) {
        self.requests.clear();
    }

    fn groups(&self) -> Vec<BatchGroup> {
        let mut groups: Vec<BatchGroup> = Vec::new();
        for (index, request) in self.requests.iter().enumerate() {
            match groups.last_mut() {
                Some(group)
                    if (group.source, group.remap) == request.group_key()
                        && group.range.end == index =>
                {
                    group.range.end = index + 1;
                }
                _ => groups.push(BatchGroup {
                    source: request.source,
                    remap: request.remap,
                    range: index..index + 1,
                }),
            }
        }
        groups
    }

    fn reorder_by_group<B>(&mut self, bounds: &B)
    where
        B: Fn(&SpriteRequest) -> Option<Rect>,
    {
        let mut index = 1;
        while index < self.requests.len() {
            let request = self.requests[index];
            if let Some(target) = self.move_target(index, &request, bounds) {
                let moved = self.requests.remove(index);
                self.requests.insert(target, moved);
            }
            index += 1;
        }
    }

    /// Slot just after the nearest earlier same-group request reachable without
    /// crossing an overlapping request or another layer.
    fn move_target<B>(&self, index: usize, request: &SpriteRequest, bounds: &B) -> Option<usize>
    where
        B: Fn(&SpriteRequest) -> Option<Rect>,
    {
        let area = bounds(request)?;
        if index > 0 && self.requests[index - 1].group_key() == request.group_key() {
            return None;
        }
        for earlier in (0..index).rev() {
            let other = &self.requests[earlier];
            if other.layer != request.layer {
                return None;
            }
            if other.group_key() == request.group_key() {
                return Some(earlier + 1);
            }
            match bounds(other) {
                Some(other_area) if !other_area.intersects(&area) => {}
                _ => return None,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(shape: u16, x: i32) -> SpriteRequest {
        SpriteRequest::shape(ShapeId::new(shape), 0, ScreenPoint::new(x, 0)).with_sort_y(0)
    }

    fn ten_by_ten(request: &SpriteRequest) -> Option<Rect> {
        Some(Rect::new(request.position.x(), request.position.y(), 10, 10))
    }

    #[test]
    fn consecutive_matching_requests_share_a_group() {
        let mut batch = SpriteBatch::new(false);
        batch.push(request(1, 0));
        batch.push(request(1, 20));
        batch.push(request(2, 40));
        batch.push(request(1, 60));
        let groups = batch.plan(ten_by_ten);
        assert_eq!(groups.len(), 3, "without reordering the last request stays apart");
        assert_eq!(groups[0].range, 0..2);
    }

    #[test]
    fn remap_splits_groups() {
        let mut batch = SpriteBatch::new(false);
        batch.push(request(1, 0));
        batch.push(request(1, 20).with_remap(HouseColor::Red));
        assert_eq!(batch.plan(ten_by_ten).len(), 2);
    }

    #[test]
    fn layers_and_depth_order_the_queue_stably() {
        let mut batch = SpriteBatch::new(false);
        batch.push(request(1, 0).on_layer(RenderLayer::Ui));
        batch.push(request(2, 0).with_sort_y(50));
        batch.push(request(3, 0).with_sort_y(10));
        batch.push(request(4, 0).with_sort_y(10));
        let _ = batch.plan(ten_by_ten);
        let order: Vec<_> = batch
            .requests()
            .iter()
            .map(|r| match r.source {
                DrawSource::Shape(id) => id.get(),
                DrawSource::Tile(id) => id.get(),
            })
            .collect();
        assert_eq!(order, vec![3, 4, 2, 1], "ties keep submission order");
    }

    #[test]
    fn reordering_joins_groups_past_non_overlapping_requests() {
        let mut batch = SpriteBatch::new(true);
        batch.push(request(1, 0));
        batch.push(request(2, 40));
        batch.push(request(1, 80));
        let groups = batch.plan(ten_by_ten);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].range, 0..2);
    }

    #[test]
    fn reordering_never_crosses_an_overlap() {
        let mut batch = SpriteBatch::new(true);
        batch.push(request(1, 0));
        batch.push(request(2, 40));
        batch.push(request(1, 45));
        assert_eq!(batch.plan(ten_by_ten).len(), 3, "shape 2 overlaps the last request");
    }

    #[test]
    fn reordering_stays_inside_the_layer() {
        let mut batch = SpriteBatch::new(true);
        batch.push(request(1, 0).on_layer(RenderLayer::Shadow));
        batch.push(request(2, 40));
        batch.push(request(1, 80));
        assert_eq!(batch.plan(ten_by_ten).len(), 3);
    }

    #[test]
    fn flush_draws_everything_and_reports_savings() {
        let mut batch = SpriteBatch::new(false);
        for x in 0..4 {
            batch.push(request(1, x * 20));
        }
        let mut drawn = 0;
        let stats = batch.flush(ten_by_ten, |_| drawn += 1);
        assert_eq!(drawn, 4);
        assert_eq!(
            stats,
            BatchStats {
                requests: 4,
                groups: 1,
                state_changes_saved: 3
            }
        );
        assert!(batch.is_empty());
    }
}
