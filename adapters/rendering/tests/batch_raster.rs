use proptest::prelude::*;
use tactica_core::{Rect, ScreenPoint};
use tactica_rendering::{
    DrawFlags, DrawParams, DrawSource, DrawSurface, FrameBuffer, RenderLayer, ShapeEncoder, ShapeId,
    ShapeRenderer, SpriteBatch, SpriteRequest,
};

fn loaded_shapes() -> ShapeRenderer {
    let mut shapes = ShapeRenderer::new();
    for id in 1..=3u16 {
        let color = 100 + id as u8;
        let mut pixels = vec![color; 64];
        pixels[usize::from(id) * 9] = 0;
        let bytes = ShapeEncoder::new(8, 8).raw(pixels).encode();
        shapes
            .load(ShapeId::new(id), "BLOCK.SHP", &bytes)
            .expect("valid shape");
    }
    shapes
}

fn render(requests: &[SpriteRequest], reorder: bool) -> (FrameBuffer, usize) {
    let mut shapes = loaded_shapes();
    let mut batch = SpriteBatch::new(reorder);
    for request in requests {
        batch.push(*request);
    }
    let mut buffer = FrameBuffer::new(96, 96);
    let bounds_source = loaded_shapes();
    let bounds = |request: &SpriteRequest| match request.source {
        DrawSource::Shape(id) => bounds_source.bounds(
            id,
            request.position.x(),
            request.position.y(),
            request.flags,
        ),
        DrawSource::Tile(_) => None,
    };
    let stats = batch.flush(bounds, |request| {
        if let DrawSource::Shape(id) = request.source {
            let _ = shapes.draw(
                &mut buffer,
                id,
                request.frame,
                request.position.x(),
                request.position.y(),
                &DrawParams::new().with_flags(request.flags),
            );
        }
    });
    (buffer, stats.groups)
}

fn request_strategy() -> impl Strategy<Value = SpriteRequest> {
    (1u16..=3, 0i32..88, 0i32..88, 0i32..4, prop::bool::ANY).prop_map(
        |(shape, x, y, sort_y, effect)| {
            let layer = if effect {
                RenderLayer::Effect
            } else {
                RenderLayer::Object
            };
            SpriteRequest::shape(ShapeId::new(shape), 0, ScreenPoint::new(x, y))
                .on_layer(layer)
                .with_sort_y(sort_y)
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Reordering only ever trades state changes; the pixels stay identical.
    #[test]
    fn reordering_preserves_the_raster(
        requests in prop::collection::vec(request_strategy(), 0..24),
    ) {
        let (ordered, plain_groups) = render(&requests, false);
        let (reordered, grouped) = render(&requests, true);
        prop_assert_eq!(ordered.pixels(), reordered.pixels());
        prop_assert!(grouped <= plain_groups, "reordering never adds groups");
    }
}

#[test]
fn layers_draw_back_to_front_regardless_of_submission() {
    let requests = [
        SpriteRequest::shape(ShapeId::new(1), 0, ScreenPoint::new(10, 10))
            .on_layer(RenderLayer::Effect),
        SpriteRequest::shape(ShapeId::new(2), 0, ScreenPoint::new(10, 10))
            .on_layer(RenderLayer::Shadow)
            .with_flags(DrawFlags::empty()),
    ];
    let (buffer, _) = render(&requests, false);
    let top = Rect::new(10, 10, 8, 8);
    assert_eq!(
        buffer.pixel(top.x() + 1, top.y()),
        Some(101),
        "the effect layer covers the shadow layer"
    );
}
