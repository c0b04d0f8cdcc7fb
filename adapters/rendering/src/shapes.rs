//! Multi-frame sprites decoded lazily and drawn with index-0 transparency.
//!
//! Shape data is little-endian: a header `frame_count: u16, width: u16,
//! height: u16`, one descriptor per frame `kind: u8, reference: u16,
//! offset: u32, length: u32`, then the frame payloads. Kind 0 is a raw
//! frame of `width * height` bytes; kind 1 is the same size XORed against the
//! decoded frame `reference`, which must come earlier in the shape.

use std::collections::{BTreeMap, BTreeSet};

use bitflags::bitflags;
use tactica_core::Rect;
use tracing::{debug, warn};

use crate::{AssetError, AssetSource, DrawSurface, RemapTable};

const HEADER_BYTES: usize = 6;
const DESCRIPTOR_BYTES: usize = 11;

/// Identifier of a loaded shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u16);

impl ShapeId {
    /// Creates a new shape identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Numeric value of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

bitflags! {
    /// Drawing modes for a shape frame.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DrawFlags: u16 {
        /// Position names the frame centre rather than its top-left corner.
        const CENTER = 1 << 0;
        /// Mirror horizontally.
        const FLIP_X = 1 << 1;
        /// Mirror vertically.
        const FLIP_Y = 1 << 2;
        /// Darken the destination under the opaque pixels with the remap table.
        const SHADOW = 1 << 3;
        /// Draw every other pixel in a checkerboard.
        const GHOST = 1 << 4;
        /// Shimmer: copy destination pixels from a small offset.
        const PREDATOR = 1 << 5;
        /// Draw every opaque pixel in one colour.
        const FLAT = 1 << 6;
        /// Pass pixels through a fade table.
        const FADING = 1 << 7;
    }
}

/// How a frame's payload is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameEncoding {
    /// Plain pixels.
    Raw,
    /// Pixels XORed against an earlier frame.
    Delta {
        /// Frame the payload is relative to.
        reference: u16,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrameDescriptor {
    encoding: FrameEncoding,
    offset: usize,
    length: usize,
}

/// Parsed shape header with undecoded frame payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeData {
    width: i32,
    height: i32,
    descriptors: Vec<FrameDescriptor>,
    payload: Vec<u8>,
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl ShapeData {
    /// Parses the header and descriptors. Frame payloads stay encoded.
    pub fn parse(name: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let malformed = |reason: String| AssetError::MalformedShape {
            name: name.to_owned(),
            reason,
        };
        if bytes.len() < HEADER_BYTES {
            return Err(malformed(format!("{} byte header", bytes.len())));
        }
        let frame_count = usize::from(read_u16(bytes, 0));
        let (raw_width, raw_height) = (read_u16(bytes, 2), read_u16(bytes, 4));
        let width = i32::from(raw_width);
        let height = i32::from(raw_height);
        if frame_count == 0 || width == 0 || height == 0 {
            return Err(malformed("empty shape".to_owned()));
        }
        let table_end = HEADER_BYTES + frame_count * DESCRIPTOR_BYTES;
        if bytes.len() < table_end {
            return Err(malformed(format!("{frame_count} descriptors do not fit")));
        }
        let frame_bytes = usize::from(raw_width) * usize::from(raw_height);
        if frame_bytes > bytes.len() - table_end {
            return Err(malformed(format!(
                "{width}x{height} frames do not fit in {} bytes",
                bytes.len() - table_end
            )));
        }
        let payload = bytes[table_end..].to_vec();

        let mut descriptors = Vec::with_capacity(frame_count);
        for index in 0..frame_count {
            let at = HEADER_BYTES + index * DESCRIPTOR_BYTES;
            let reference = read_u16(bytes, at + 1);
            let encoding = match bytes[at] {
                0 => FrameEncoding::Raw,
                1 if usize::from(reference) < index => FrameEncoding::Delta { reference },
                1 => {
                    return Err(malformed(format!(
                        "frame {index} refers to later frame {reference}"
                    )))
                }
                kind => return Err(malformed(format!("frame {index} has kind {kind}"))),
            };
            let offset = read_u32(bytes, at + 3) as usize;
            let length = read_u32(bytes, at + 7) as usize;
            if length != frame_bytes {
                return Err(malformed(format!(
                    "frame {index} holds {length} bytes, expected {frame_bytes}"
                )));
            }
            if offset.checked_add(length).map_or(true, |end| end > payload.len()) {
                return Err(malformed(format!("frame {index} runs past the data")));
            }
            descriptors.push(FrameDescriptor {
                encoding,
                offset,
                length,
            });
        }

        Ok(Self {
            width,
            height,
            descriptors,
            payload,
        })
    }

    /// Frame width in pixels.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Frame height in pixels.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.descriptors.len()
    }

    /// Encoding of a frame.
    #[must_use]
    pub fn encoding(&self, frame: usize) -> Option<FrameEncoding> {
        self.descriptors.get(frame).map(|d| d.encoding)
    }

    fn payload(&self, frame: usize) -> &[u8] {
        let descriptor = &self.descriptors[frame];
        &self.payload[descriptor.offset..descriptor.offset + descriptor.length]
    }
}

/// Builds shape bytes in the format [`ShapeData::parse`] reads.
#[derive(Clone, Debug)]
pub struct ShapeEncoder {
    width: u16,
    height: u16,
    frames: Vec<(FrameEncoding, Vec<u8>)>,
}

impl ShapeEncoder {
    /// Starts a shape of the given frame size.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            frames: Vec::new(),
        }
    }

    /// Appends a raw frame.
    #[must_use]
    pub fn raw(mut self, pixels: Vec<u8>) -> Self {
        self.frames.push((FrameEncoding::Raw, pixels));
        self
    }

    /// Appends a frame stored as a delta against `reference`.
    ///
    /// `pixels` are the frame's final pixels; the encoder computes the delta.
    #[must_use]
    pub fn delta(mut self, reference: u16, pixels: Vec<u8>) -> Self {
        self.frames.push((FrameEncoding::Delta { reference }, pixels));
        self
    }

    /// Serializes the shape.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut header = Vec::new();
        header.extend_from_slice(&(self.frames.len() as u16).to_le_bytes());
        header.extend_from_slice(&self.width.to_le_bytes());
        header.extend_from_slice(&self.height.to_le_bytes());

        let mut payload: Vec<u8> = Vec::new();
        for (encoding, pixels) in &self.frames {
            let (kind, reference, data) = match encoding {
                FrameEncoding::Raw => (0u8, 0u16, pixels.clone()),
                FrameEncoding::Delta { reference } => {
                    let base = self
                        .frames
                        .get(usize::from(*reference))
                        .map(|(_, p)| p.as_slice())
                        .unwrap_or(&[]);
                    let data = pixels
                        .iter()
                        .enumerate()
                        .map(|(i, p)| p ^ base.get(i).copied().unwrap_or(0))
                        .collect();
                    (1u8, *reference, data)
                }
            };
            header.push(kind);
            header.extend_from_slice(&reference.to_le_bytes());
            header.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            header.extend_from_slice(&(data.len() as u32).to_le_bytes());
            payload.extend_from_slice(&data);
        }
        header.extend_from_slice(&payload);
        header
    }
}

/// Decoded frame pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Row-major palette indices; 0 is transparent.
    pub pixels: Vec<u8>,
}

/// Per-draw options.
#[derive(Clone, Copy, Debug, Default)]
pub struct DrawParams<'a> {
    /// Drawing modes.
    pub flags: DrawFlags,
    /// Colour remap, shadow table under [`DrawFlags::SHADOW`], or fade table
    /// under [`DrawFlags::FADING`].
    pub remap: Option<&'a RemapTable>,
    /// Colour for [`DrawFlags::FLAT`].
    pub flat_color: u8,
    /// Animation phase for ghost and predator effects.
    pub phase: u8,
    /// Extra clip rectangle inside the surface.
    pub clip: Option<Rect>,
}

impl<'a> DrawParams<'a> {
    /// Plain transparent draw.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the drawing modes.
    #[must_use]
    pub const fn with_flags(mut self, flags: DrawFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the remap table.
    #[must_use]
    pub const fn with_remap(mut self, remap: &'a RemapTable) -> Self {
        self.remap = Some(remap);
        self
    }

    /// Sets the flat colour.
    #[must_use]
    pub const fn with_flat_color(mut self, color: u8) -> Self {
        self.flat_color = color;
        self
    }

    /// Sets the effect phase.
    #[must_use]
    pub const fn with_phase(mut self, phase: u8) -> Self {
        self.phase = phase;
        self
    }

    /// Restricts drawing to `clip`.
    #[must_use]
    pub const fn with_clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }
}

/// Cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShapeCacheStats {
    /// Shapes whose headers are loaded.
    pub shapes_loaded: usize,
    /// Frames currently decoded.
    pub frames_cached: usize,
    /// Bytes held by decoded frames.
    pub bytes_cached: usize,
    /// Frame decodes performed since creation.
    pub decodes: u64,
}

/// Loads shapes and draws their frames.
#[derive(Clone, Debug, Default)]
pub struct ShapeRenderer {
    shapes: BTreeMap<ShapeId, ShapeData>,
    cache: BTreeMap<(ShapeId, usize), Frame>,
    warned: BTreeSet<ShapeId>,
    decodes: u64,
}

impl ShapeRenderer {
    /// Creates a renderer with nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and registers a shape. Replacing a shape drops its cached frames.
    pub fn load(&mut self, id: ShapeId, name: &str, bytes: &[u8]) -> Result<(), AssetError> {
        let data = ShapeData::parse(name, bytes)?;
        debug!(shape = id.get(), name, frames = data.frame_count(), "shape loaded");
        if self.shapes.insert(id, data).is_some() {
            self.cache.retain(|(shape, _), _| *shape != id);
        }
        let _ = self.warned.remove(&id);
        Ok(())
    }

    /// Reads a shape from `assets` and registers it.
    pub fn load_from<A>(&mut self, id: ShapeId, name: &str, assets: &A) -> Result<(), AssetError>
    where
        A: AssetSource + ?Sized,
    {
        let bytes = assets.read(name)?;
        self.load(id, name, &bytes)
    }

    /// Returns `true` when the shape is registered.
    #[must_use]
    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Registered shape data.
    #[must_use]
    pub fn shape(&self, id: ShapeId) -> Option<&ShapeData> {
        self.shapes.get(&id)
    }

    /// Screen rectangle a draw at `(x, y)` would touch.
    #[must_use]
    pub fn bounds(&self, id: ShapeId, x: i32, y: i32, flags: DrawFlags) -> Option<Rect> {
        let shape = self.shapes.get(&id)?;
        let (x, y) = anchor(x, y, shape.width, shape.height, flags);
        Some(Rect::new(x, y, shape.width, shape.height))
    }

    /// Decoded frame, decoding and caching it on first access.
    pub fn frame(&mut self, id: ShapeId, frame: usize) -> Option<&Frame> {
        let shape = self.shapes.get(&id)?;
        if frame >= shape.frame_count() {
            return None;
        }
        decode_into(&mut self.cache, &mut self.decodes, id, shape, frame);
        self.cache.get(&(id, frame))
    }

    /// Draws a frame with index-0 transparency.
    ///
    /// Returns `false` when the shape or frame is unknown.
    pub fn draw<S>(
        &mut self,
        surface: &mut S,
        id: ShapeId,
        frame: usize,
        x: i32,
        y: i32,
        params: &DrawParams<'_>,
    ) -> bool
    where
        S: DrawSurface + ?Sized,
    {
        if !self.contains(id) {
            if self.warned.insert(id) {
                warn!(shape = id.get(), "draw requested for unknown shape");
            }
            return false;
        }
        match self.frame(id, frame) {
            Some(decoded) => {
                draw_frame(surface, decoded, x, y, params);
                true
            }
            None => false,
        }
    }

    /// Draws a frame passing every opaque pixel through `remap`.
    pub fn draw_remapped<S>(
        &mut self,
        surface: &mut S,
        id: ShapeId,
        frame: usize,
        x: i32,
        y: i32,
        remap: &RemapTable,
    ) -> bool
    where
        S: DrawSurface + ?Sized,
    {
        self.draw(surface, id, frame, x, y, &DrawParams::new().with_remap(remap))
    }

    /// Frees every decoded frame. Later draws decode again.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Drops a shape and its decoded frames.
    pub fn unload(&mut self, id: ShapeId) {
        let _ = self.shapes.remove(&id);
        self.cache.retain(|(shape, _), _| *shape != id);
    }

    /// Cache counters.
    #[must_use]
    pub fn stats(&self) -> ShapeCacheStats {
        ShapeCacheStats {
            shapes_loaded: self.shapes.len(),
            frames_cached: self.cache.len(),
            bytes_cached: self.cache.values().map(|f| f.pixels.len()).sum(),
            decodes: self.decodes,
        }
    }
}

fn decode_into(
    cache: &mut BTreeMap<(ShapeId, usize), Frame>,
    decodes: &mut u64,
    id: ShapeId,
    shape: &ShapeData,
    frame: usize,
) {
    if cache.contains_key(&(id, frame)) {
        return;
    }
    let payload = shape.payload(frame);
    let pixels = match shape.descriptors[frame].encoding {
        FrameEncoding::Raw => payload.to_vec(),
        FrameEncoding::Delta { reference } => {
            let reference = usize::from(reference);
            decode_into(cache, decodes, id, shape, reference);
            match cache.get(&(id, reference)) {
                Some(base) => base
                    .pixels
                    .iter()
                    .zip(payload)
                    .map(|(b, d)| b ^ d)
                    .collect(),
                None => payload.to_vec(),
            }
        }
    };
    *decodes += 1;
    let _ = cache.insert(
        (id, frame),
        Frame {
            width: shape.width,
            height: shape.height,
            pixels,
        },
    );
}

fn anchor(x: i32, y: i32, width: i32, height: i32, flags: DrawFlags) -> (i32, i32) {
    if flags.contains(DrawFlags::CENTER) {
        (x - width / 2, y - height / 2)
    } else {
        (x, y)
    }
}

/// Composites a decoded frame onto `surface`, clipped to the surface and `params.clip`.
pub fn draw_frame<S>(surface: &mut S, frame: &Frame, x: i32, y: i32, params: &DrawParams<'_>)
where
    S: DrawSurface + ?Sized,
{
    let flags = params.flags;
    let (x, y) = anchor(x, y, frame.width, frame.height, flags);
    let target = Rect::new(x, y, frame.width, frame.height);
    let mut visible = match target.intersection(&surface.bounds()) {
        Some(rect) => rect,
        None => return,
    };
    if let Some(clip) = params.clip {
        visible = match visible.intersection(&clip) {
            Some(rect) => rect,
            None => return,
        };
    }

    let shimmer_x = i32::from(params.phase % 3) - 1;
    let shimmer_y = i32::from(params.phase % 5) - 2;

    for dy in visible.y()..visible.bottom() {
        let row = dy - y;
        let sy = if flags.contains(DrawFlags::FLIP_Y) {
            frame.height - 1 - row
        } else {
            row
        };
        for dx in visible.x()..visible.right() {
            let column = dx - x;
            let sx = if flags.contains(DrawFlags::FLIP_X) {
                frame.width - 1 - column
            } else {
                column
            };
            let pixel = frame.pixels[(sy * frame.width + sx) as usize];
            if pixel == 0 {
                continue;
            }

            if flags.contains(DrawFlags::SHADOW) {
                if let (Some(table), Some(under)) = (params.remap, surface.pixel(dx, dy)) {
                    surface.set_pixel(dx, dy, table.apply(under));
                }
            } else if flags.contains(DrawFlags::GHOST) {
                if (dx + dy + i32::from(params.phase)) & 1 == 0 {
                    surface.set_pixel(dx, dy, remapped(params.remap, pixel));
                }
            } else if flags.contains(DrawFlags::PREDATOR) {
                if let Some(sample) = surface.pixel(dx + shimmer_x, dy + shimmer_y) {
                    surface.set_pixel(dx, dy, sample);
                }
            } else if flags.contains(DrawFlags::FLAT) {
                surface.set_pixel(dx, dy, params.flat_color);
            } else {
                surface.set_pixel(dx, dy, remapped(params.remap, pixel));
            }
        }
    }
}

fn remapped(table: Option<&RemapTable>, pixel: u8) -> u8 {
    table.map_or(pixel, |table| table.apply(pixel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameBuffer;

    fn arrow() -> Vec<u8> {
        ShapeEncoder::new(2, 2)
            .raw(vec![5, 0, 6, 7])
            .delta(0, vec![5, 9, 6, 0])
            .encode()
    }

    #[test]
    fn delta_frames_decode_against_their_reference() {
        let mut shapes = ShapeRenderer::new();
        shapes
            .load(ShapeId::new(1), "ARROW.SHP", &arrow())
            .expect("valid shape");
        let frame = shapes.frame(ShapeId::new(1), 1).expect("frame 1").clone();
        assert_eq!(frame.pixels, vec![5, 9, 6, 0]);
        assert_eq!(
            shapes.stats().decodes,
            2,
            "decoding a delta decodes its reference first"
        );
        let _ = shapes.frame(ShapeId::new(1), 1);
        assert_eq!(shapes.stats().decodes, 2, "cached frames are not decoded again");
    }

    #[test]
    fn parse_rejects_forward_references_and_short_payloads() {
        let mut bytes = arrow();
        bytes[HEADER_BYTES] = 1;
        assert!(
            matches!(
                ShapeData::parse("BAD.SHP", &bytes),
                Err(AssetError::MalformedShape { .. })
            ),
            "frame 0 cannot be a delta of anything"
        );
        let full = arrow();
        assert!(ShapeData::parse("SHORT.SHP", &full[..full.len() - 1]).is_err());
        assert!(ShapeData::parse("TINY.SHP", &[1, 0]).is_err());
    }

    #[test]
    fn parse_rejects_frames_larger_than_the_file() {
        let mut bytes = vec![1, 0, 0xFF, 0xFF, 0xFF, 0xFF];
        bytes.extend([0; DESCRIPTOR_BYTES]);
        assert!(matches!(
            ShapeData::parse("HUGE.SHP", &bytes),
            Err(AssetError::MalformedShape { .. })
        ));

        let mut wide = arrow();
        wide[2..4].copy_from_slice(&u16::MAX.to_le_bytes());
        assert!(matches!(
            ShapeData::parse("WIDE.SHP", &wide),
            Err(AssetError::MalformedShape { .. })
        ));
    }

    #[test]
    fn transparent_pixels_leave_the_destination() {
        let mut shapes = ShapeRenderer::new();
        shapes.load(ShapeId::new(1), "ARROW.SHP", &arrow()).expect("valid");
        let mut buffer = FrameBuffer::new(4, 4);
        buffer.clear(3);
        assert!(shapes.draw(&mut buffer, ShapeId::new(1), 0, 1, 1, &DrawParams::new()));
        assert_eq!(buffer.pixel(1, 1), Some(5));
        assert_eq!(buffer.pixel(2, 1), Some(3), "index 0 is transparent");
        assert_eq!(buffer.pixel(2, 2), Some(7));
    }

    #[test]
    fn remap_never_touches_transparent_pixels() {
        let mut shapes = ShapeRenderer::new();
        shapes.load(ShapeId::new(1), "ARROW.SHP", &arrow()).expect("valid");
        let table = RemapTable::from_fn(|index| index.wrapping_add(100));
        let mut buffer = FrameBuffer::new(2, 2);
        buffer.clear(1);
        assert!(shapes.draw_remapped(&mut buffer, ShapeId::new(1), 0, 0, 0, &table));
        assert_eq!(buffer.row(0), Some(&[105, 1][..]));
        assert_eq!(buffer.row(1), Some(&[106, 107][..]));
    }

    #[test]
    fn flips_mirror_the_frame() {
        let mut shapes = ShapeRenderer::new();
        shapes.load(ShapeId::new(1), "ARROW.SHP", &arrow()).expect("valid");
        let mut buffer = FrameBuffer::new(2, 2);
        let params = DrawParams::new().with_flags(DrawFlags::FLIP_X | DrawFlags::FLIP_Y);
        assert!(shapes.draw(&mut buffer, ShapeId::new(1), 0, 0, 0, &params));
        assert_eq!(buffer.row(0), Some(&[7, 6][..]));
        assert_eq!(buffer.row(1), Some(&[0, 5][..]));
    }

    #[test]
    fn centred_draws_are_clipped_to_the_surface() {
        let mut shapes = ShapeRenderer::new();
        shapes.load(ShapeId::new(1), "ARROW.SHP", &arrow()).expect("valid");
        let mut buffer = FrameBuffer::new(2, 2);
        let params = DrawParams::new().with_flags(DrawFlags::CENTER);
        assert!(shapes.draw(&mut buffer, ShapeId::new(1), 0, 0, 0, &params));
        assert_eq!(buffer.pixel(0, 0), Some(7), "only the bottom-right pixel lands");
        assert_eq!(
            shapes.bounds(ShapeId::new(1), 0, 0, DrawFlags::CENTER),
            Some(Rect::new(-1, -1, 2, 2))
        );
    }

    #[test]
    fn shadow_darkens_what_is_underneath() {
        let mut shapes = ShapeRenderer::new();
        shapes.load(ShapeId::new(1), "ARROW.SHP", &arrow()).expect("valid");
        let shadow = RemapTable::from_fn(|index| index / 2);
        let mut buffer = FrameBuffer::new(2, 2);
        buffer.clear(40);
        let params = DrawParams::new()
            .with_flags(DrawFlags::SHADOW)
            .with_remap(&shadow);
        assert!(shapes.draw(&mut buffer, ShapeId::new(1), 0, 0, 0, &params));
        assert_eq!(buffer.row(0), Some(&[20, 40][..]));
    }

    #[test]
    fn flat_and_ghost_modes() {
        let mut shapes = ShapeRenderer::new();
        shapes.load(ShapeId::new(1), "ARROW.SHP", &arrow()).expect("valid");
        let mut buffer = FrameBuffer::new(2, 2);
        let flat = DrawParams::new()
            .with_flags(DrawFlags::FLAT)
            .with_flat_color(15);
        assert!(shapes.draw(&mut buffer, ShapeId::new(1), 0, 0, 0, &flat));
        assert_eq!(buffer.row(1), Some(&[15, 15][..]));

        let mut buffer = FrameBuffer::new(2, 2);
        let ghost = DrawParams::new().with_flags(DrawFlags::GHOST);
        assert!(shapes.draw(&mut buffer, ShapeId::new(1), 0, 0, 0, &ghost));
        assert_eq!(buffer.row(0), Some(&[5, 0][..]));
        assert_eq!(buffer.row(1), Some(&[0, 7][..]), "odd squares are skipped");
    }

    #[test]
    fn clear_cache_is_safe_and_draws_decode_again() {
        let mut shapes = ShapeRenderer::new();
        shapes.load(ShapeId::new(1), "ARROW.SHP", &arrow()).expect("valid");
        let mut buffer = FrameBuffer::new(2, 2);
        assert!(shapes.draw(&mut buffer, ShapeId::new(1), 1, 0, 0, &DrawParams::new()));
        shapes.clear_cache();
        assert_eq!(shapes.stats().frames_cached, 0);
        assert!(shapes.draw(&mut buffer, ShapeId::new(1), 1, 0, 0, &DrawParams::new()));
        assert_eq!(shapes.stats().frames_cached, 2);
    }

    #[test]
    fn unknown_shapes_and_frames_are_reported() {
        let mut shapes = ShapeRenderer::new();
        let mut buffer = FrameBuffer::new(2, 2);
        assert!(!shapes.draw(&mut buffer, ShapeId::new(9), 0, 0, 0, &DrawParams::new()));
        shapes.load(ShapeId::new(1), "ARROW.SHP", &arrow()).expect("valid");
        assert!(!shapes.draw(&mut buffer, ShapeId::new(1), 2, 0, 0, &DrawParams::new()));
    }
}
