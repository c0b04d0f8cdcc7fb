use tactica_core::Rect;

/// Drawing target addressed in 8-bit palette indices.
///
/// Renderers only need these few operations, so the same drawing code can
/// target the pipeline's frame buffer, an off-screen radar image or a test
/// buffer.
pub trait DrawSurface {
    /// Width in pixels.
    fn width(&self) -> i32;

    /// Height in pixels.
    fn height(&self) -> i32;

    /// Palette index at the pixel, or `None` outside the surface.
    fn pixel(&self, x: i32, y: i32) -> Option<u8>;

    /// Writes a palette index. Writes outside the surface are ignored.
    fn set_pixel(&mut self, x: i32, y: i32, color: u8);

    /// Rectangle covering the whole surface.
    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    /// Fills the part of `rect` that lies on the surface.
    fn fill_rect(&mut self, rect: Rect, color: u8) {
        let Some(clipped) = rect.intersection(&self.bounds()) else {
            return;
        };
        for y in clipped.y()..clipped.bottom() {
            for x in clipped.x()..clipped.right() {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Draws a one-pixel outline along the inside of `rect`.
    fn outline_rect(&mut self, rect: Rect, color: u8) {
        if rect.is_empty() {
            return;
        }
        for x in rect.x()..rect.right() {
            self.set_pixel(x, rect.y(), color);
            self.set_pixel(x, rect.bottom() - 1, color);
        }
        for y in rect.y()..rect.bottom() {
            self.set_pixel(rect.x(), y, color);
            self.set_pixel(rect.right() - 1, y, color);
        }
    }
}

/// Row-major 8-bit indexed pixel buffer whose pitch equals its width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: i32,
    height: i32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// Creates a buffer cleared to index 0. Negative sizes become empty.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize)],
        }
    }

    /// Bytes between the starts of consecutive rows.
    #[must_use]
    pub const fn pitch(&self) -> i32 {
        self.width
    }

    /// Raw pixel storage.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixels of one row, or `None` outside the buffer.
    #[must_use]
    pub fn row(&self, y: i32) -> Option<&[u8]> {
        if y < 0 || y >= self.height {
            return None;
        }
        let start = (y * self.width) as usize;
        self.pixels.get(start..start + self.width as usize)
    }

    /// Sets every pixel to `color`.
    pub fn clear(&mut self, color: u8) {
        self.pixels.fill(color);
    }

    /// Copies the region of `source` inside `rect` into the same place here.
    ///
    /// The rectangle is clipped to both buffers.
    pub fn copy_region(&mut self, source: &FrameBuffer, rect: Rect) {
        let Some(clipped) = rect
            .intersection(&self.bounds())
            .and_then(|r| r.intersection(&source.bounds()))
        else {
            return;
        };
        for y in clipped.y()..clipped.bottom() {
            let dst = (y * self.width + clipped.x()) as usize;
            let src = (y * source.width + clipped.x()) as usize;
            let len = clipped.width() as usize;
            self.pixels[dst..dst + len].copy_from_slice(&source.pixels[src..src + len]);
        }
    }

    /// Copies `source` pixels row by row to `(x, y)`, clipped to this buffer.
    ///
    /// `source` holds `width` pixels per row; every pixel is opaque.
    pub fn blit_opaque(&mut self, x: i32, y: i32, width: i32, source: &[u8]) {
        if width <= 0 {
            return;
        }
        let height = source.len() as i32 / width;
        let target = Rect::new(x, y, width, height);
        let Some(clipped) = target.intersection(&self.bounds()) else {
            return;
        };
        for row in clipped.y()..clipped.bottom() {
            let src_row = row - y;
            let src = (src_row * width + (clipped.x() - x)) as usize;
            let dst = (row * self.width + clipped.x()) as usize;
            let len = clipped.width() as usize;
            self.pixels[dst..dst + len].copy_from_slice(&source[src..src + len]);
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some((y * self.width + x) as usize)
        }
    }
}

impl DrawSurface for FrameBuffer {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|index| self.pixels[index])
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: u8) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = color;
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: u8) {
        let Some(clipped) = rect.intersection(&self.bounds()) else {
            return;
        };
        for y in clipped.y()..clipped.bottom() {
            let start = (y * self.width + clipped.x()) as usize;
            self.pixels[start..start + clipped.width() as usize].fill(color);
        }
    }
}
