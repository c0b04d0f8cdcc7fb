use tactica_core::{CellCoord, CursorShape, ScreenPoint, TemplateId};
use tactica_rendering::{
    AssetManifest, DrawSurface, FadeState, FrameScene, HeadlessSurface, MemoryAssets,
    PipelineConfig, RenderLayer, RenderPipeline, Rgb, ShapeEncoder, ShapeId, SpriteRequest,
    TerrainCell, Theater, TILE_BYTES,
};

fn vga_palette() -> Vec<u8> {
    let mut bytes = vec![0u8; 768];
    for (index, chunk) in bytes.chunks_mut(3).enumerate() {
        let level = (index % 64) as u8;
        chunk.copy_from_slice(&[level, 63 - level, level / 2]);
    }
    bytes
}

fn assets() -> MemoryAssets {
    let cursor = {
        let mut encoder = ShapeEncoder::new(4, 4);
        for frame in 0..27u8 {
            encoder = encoder.raw(vec![200 + (frame % 50); 16]);
        }
        encoder.encode()
    };
    MemoryAssets::new()
        .with_asset("TEMPERAT.PAL", vga_palette())
        .with_asset("CLEAR1.TMP", vec![30; TILE_BYTES * 4])
        .with_asset("W1.TMP", vec![40; TILE_BYTES])
        .with_asset("MOUSE.SHP", cursor)
        .with_asset("TANK.SHP", ShapeEncoder::new(8, 8).raw(vec![90; 64]).encode())
}

fn manifest() -> AssetManifest {
    AssetManifest::parse(
        r#"
version = 1

[[shapes]]
id = 0
name = "MOUSE.SHP"

[[shapes]]
id = 5
name = "TANK.SHP"
"#,
    )
    .expect("valid manifest")
}

fn terrain(cell: CellCoord) -> Option<TerrainCell> {
    if cell.column() < 0 || cell.row() < 0 || cell.column() >= 64 || cell.row() >= 64 {
        return None;
    }
    let template = match cell.column() {
        2 => TemplateId::new(1),
        3 => TemplateId::new(11),
        _ => TemplateId::CLEAR,
    };
    Some(TerrainCell {
        template,
        icon: 0,
        overlay: None,
    })
}

#[test]
fn loaded_theater_draws_tiles_sprites_and_cursor() {
    let assets = assets();
    let manifest = manifest();
    let mut pipeline = RenderPipeline::new(PipelineConfig::default());
    assert_eq!(pipeline.load_shapes(&manifest, &assets), 2);
    let templates = pipeline.set_theater(Theater::Temperate, &manifest, &assets);
    assert_eq!(templates, 2, "only CLEAR1 and W1 are present");

    let sprites = [SpriteRequest::shape(ShapeId::new(5), 0, ScreenPoint::new(100, 100))];
    let scene = FrameScene {
        view_origin: ScreenPoint::new(0, 0),
        terrain: &terrain,
        sprites: &sprites,
        cursor: Some((ScreenPoint::new(300, 200), CursorShape::Move)),
    };
    let mut surface = HeadlessSurface::new(640, 400);
    let report = pipeline.render_frame(&scene, &mut surface);
    assert!(report.presented);

    let frame = surface.last_frame().expect("a frame was flipped");
    assert_eq!(frame.pixel(10, 20), Some(30), "clear ground");
    assert_eq!(frame.pixel(50, 20), Some(40), "water column");
    assert_eq!(frame.pixel(80, 40), Some(30), "missing templates fall back to clear");
    assert_eq!(frame.pixel(104, 104), Some(90), "sprite");
    assert_eq!(frame.pixel(288, 188), Some(210), "move cursor is centred on its hotspot");
    assert_eq!(
        surface.palette().get(100),
        Rgb::new(144, 108, 72),
        "theater palette uploaded"
    );
}

#[test]
fn palette_fade_is_uploaded_every_frame_it_changes() {
    let mut pipeline = RenderPipeline::new(PipelineConfig::default());
    let mut surface = HeadlessSurface::new(640, 400);
    let scene = FrameScene {
        view_origin: ScreenPoint::new(0, 0),
        terrain: &terrain,
        sprites: &[],
        cursor: None,
    };
    let _ = pipeline.render_frame(&scene, &mut surface);
    pipeline.palette_mut().start_fade_out(2);
    let _ = pipeline.render_frame(&scene, &mut surface);
    let _ = pipeline.render_frame(&scene, &mut surface);
    assert_eq!(pipeline.palette().fade_state(), FadeState::FadedOut);
    assert_eq!(surface.palette_uploads(), 3);
    assert_eq!(surface.palette().get(200), Rgb::BLACK);
    let _ = pipeline.render_frame(&scene, &mut surface);
    assert_eq!(surface.palette_uploads(), 3, "a settled palette is not re-sent");
}

#[test]
fn lock_failure_skips_the_frame_and_keeps_going() {
    let mut pipeline = RenderPipeline::new(PipelineConfig::default());
    let mut surface = HeadlessSurface::new(640, 400);
    let sprites = [SpriteRequest::shape(ShapeId::new(9), 0, ScreenPoint::new(0, 20))
        .on_layer(RenderLayer::Effect)];
    let scene = FrameScene {
        view_origin: ScreenPoint::new(0, 0),
        terrain: &terrain,
        sprites: &sprites,
        cursor: None,
    };
    surface.set_lock_failure(true);
    let report = pipeline.render_frame(&scene, &mut surface);
    assert!(!report.presented);
    assert_eq!(pipeline.stats().frames_skipped, 1);

    surface.set_lock_failure(false);
    let report = pipeline.render_frame(&scene, &mut surface);
    assert!(report.presented);
    assert!(report.full_redraw, "the skipped frame never reached the screen");
    assert_eq!(pipeline.stats().frames_rendered, 1);
}
