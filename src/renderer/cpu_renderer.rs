use std::sync::Arc;

use euclid::default::Size2D;

use crate::{
    glyph::RasterizedGlyph,
    glyph_cache::GlyphTextureAllocator,
    renderer::QuadTarget,
    text::Quad,
};

/// Simple L8 bitmap produced by the CPU renderer.
///
/// Pixels are arranged in row-major order with the origin at the top-left.
/// Each pixel stores a single 8-bit coverage value where `0` represents
/// transparent/empty and `255` is fully opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        let len = width.saturating_mul(height);
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Adds `value` to the pixel, saturating at 255. Out of range writes are
    /// ignored.
    pub fn accumulate(&mut self, x: usize, y: usize, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.width + x;
        self.pixels[idx] = self.pixels[idx].saturating_add(value);
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }
}

/// A glyph's coverage bitmap held in memory, the CPU stand-in for a
/// single-channel GPU texture.
#[derive(Clone, Debug, PartialEq)]
pub struct CpuTexture {
    size: Size2D<u32>,
    coverage: Arc<[u8]>,
}

impl CpuTexture {
    pub fn size(&self) -> Size2D<u32> {
        self.size
    }

    fn texel(&self, x: i64, y: i64) -> f32 {
        // clamp-to-edge
        let x = x.clamp(0, self.size.width as i64 - 1) as usize;
        let y = y.clamp(0, self.size.height as i64 - 1) as usize;
        self.coverage[y * self.size.width as usize + x] as f32
    }

    /// Bilinear sample at normalized `(u, v)`, `(0, 0)` being the top-left of
    /// the bitmap.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        if self.size.width == 0 || self.size.height == 0 {
            return 0.0;
        }

        let x = u * self.size.width as f32 - 0.5;
        let y = v * self.size.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0) * (1.0 - fx) + self.texel(x0 + 1, y0) * fx;
        let bottom = self.texel(x0, y0 + 1) * (1.0 - fx) + self.texel(x0 + 1, y0 + 1) * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

/// Software backend that composites glyph quads into a [`Bitmap`].
///
/// Screen space matches the GPU backend: pixels, origin at the bottom-left,
/// y up. Row 0 of the output bitmap is the top of the viewport.
pub struct CpuRenderer {
    bitmap: Bitmap,
    text_color: [f32; 3],
    bound_texture: Option<CpuTexture>,
    quad: Quad,
    draw_calls: usize,
}

impl CpuRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            bitmap: Bitmap::new(width, height),
            text_color: [1.0; 3],
            bound_texture: None,
            quad: bytemuck::Zeroable::zeroed(),
            draw_calls: 0,
        }
    }

    /// Resizes the viewport. The bitmap contents are discarded.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.bitmap = Bitmap::new(width, height);
    }

    /// Clears the bitmap and the draw call counter.
    pub fn clear(&mut self) {
        self.bitmap.clear();
        self.draw_calls = 0;
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn into_bitmap(self) -> Bitmap {
        self.bitmap
    }

    /// Color set by the most recent text call. The bitmap itself only stores
    /// coverage.
    pub fn text_color(&self) -> [f32; 3] {
        self.text_color
    }

    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    fn composite_quad(&mut self, texture: &CpuTexture) {
        let bounds = self.quad.bounds();
        let width = bounds.width();
        let height = bounds.height();
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let viewport_height = self.bitmap.height as f32;
        let x_start = bounds.min.x.floor().max(0.0) as usize;
        let x_end = bounds.max.x.ceil().min(self.bitmap.width as f32).max(0.0) as usize;
        let y_start = bounds.min.y.floor().max(0.0) as usize;
        let y_end = bounds.max.y.ceil().min(viewport_height).max(0.0) as usize;

        for sy in y_start..y_end {
            let cy = sy as f32 + 0.5;
            if cy < bounds.min.y || cy >= bounds.max.y {
                continue;
            }
            let v = (bounds.max.y - cy) / height;
            let row = self.bitmap.height - 1 - sy;

            for sx in x_start..x_end {
                let cx = sx as f32 + 0.5;
                if cx < bounds.min.x || cx >= bounds.max.x {
                    continue;
                }
                let u = (cx - bounds.min.x) / width;

                let coverage = texture.sample(u, v).round().clamp(0.0, 255.0) as u8;
                if coverage != 0 {
                    self.bitmap.accumulate(sx, row, coverage);
                }
            }
        }
    }
}

impl GlyphTextureAllocator for CpuRenderer {
    type Texture = CpuTexture;
    type Error = std::convert::Infallible;

    fn allocate_glyph_texture(
        &mut self,
        _ch: char,
        glyph: &RasterizedGlyph,
    ) -> Result<CpuTexture, Self::Error> {
        Ok(CpuTexture {
            size: glyph.size,
            coverage: Arc::from(glyph.bitmap.as_slice()),
        })
    }
}

impl QuadTarget for CpuRenderer {
    type Texture = CpuTexture;

    fn set_text_color(&mut self, color: [f32; 3]) {
        self.text_color = color;
    }

    fn bind_texture(&mut self, texture: &CpuTexture) {
        self.bound_texture = Some(texture.clone());
    }

    fn upload_quad(&mut self, quad: &Quad) {
        self.quad = *quad;
    }

    fn draw_quad(&mut self) {
        let Some(texture) = self.bound_texture.take() else {
            log::warn!("Draw called without a bound glyph texture.");
            return;
        };
        self.composite_quad(&texture);
        self.bound_texture = Some(texture);

        self.draw_calls += 1;
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        glyph_cache::{GlyphCacheConfig, GlyphTextureCache},
        renderer::TextRenderer,
        test_fonts::FakeRasterizer,
    };

    fn texture(width: u32, height: u32, coverage: Vec<u8>) -> CpuTexture {
        CpuTexture {
            size: Size2D::new(width, height),
            coverage: coverage.into(),
        }
    }

    #[test]
    fn sampling_clamps_to_edge() {
        let tex = texture(2, 1, vec![0, 200]);

        assert_eq!(tex.sample(0.0, 0.5), 0.0);
        assert_eq!(tex.sample(1.0, 0.5), 200.0);
        assert_eq!(tex.sample(0.5, 0.5), 100.0);
        // outside the unit square repeats the border texels
        assert_eq!(tex.sample(-3.0, 7.0), 0.0);
        assert_eq!(tex.sample(4.0, -2.0), 200.0);
    }

    #[test]
    fn empty_texture_samples_zero() {
        let tex = texture(0, 0, vec![]);
        assert_eq!(tex.sample(0.5, 0.5), 0.0);
    }

    #[test]
    fn accumulate_saturates() {
        let mut bitmap = Bitmap::new(1, 1);
        bitmap.accumulate(0, 0, 200);
        bitmap.accumulate(0, 0, 200);
        bitmap.accumulate(3, 3, 1);
        assert_eq!(bitmap.get(0, 0), Some(255));
    }

    #[test]
    fn glyph_covers_exactly_its_quad() {
        let rasterizer = FakeRasterizer::new();
        let mut cpu = CpuRenderer::new(64, 32);
        let cache =
            GlyphTextureCache::build(&rasterizer, &GlyphCacheConfig::default(), &mut cpu).unwrap();
        let renderer = TextRenderer::default();

        renderer.render_text(&cache, "A", 10.0, 8.0, 1.0, [1.0; 3], &mut cpu);
        assert_eq!(cpu.draw_calls(), 1);

        let glyph = cache.get('A').unwrap();
        let x0 = 10 + glyph.bearing.x as usize;
        let x1 = x0 + glyph.size.width as usize;
        // y-up bottom/top edges in screen space
        let y0 = (8 - (glyph.size.height as i32 - glyph.bearing.y)) as usize;
        let y1 = y0 + glyph.size.height as usize;

        let bitmap = cpu.bitmap();
        for row in 0..bitmap.height {
            let sy = bitmap.height - 1 - row;
            for sx in 0..bitmap.width {
                let inside = (x0..x1).contains(&sx) && (y0..y1).contains(&sy);
                let value = bitmap.get(sx, row).unwrap();
                if inside {
                    assert_eq!(value, 255, "pixel ({sx}, {sy}) should be covered");
                } else {
                    assert_eq!(value, 0, "pixel ({sx}, {sy}) should be empty");
                }
            }
        }
    }

    #[test]
    fn quads_outside_the_viewport_are_clipped() {
        let rasterizer = FakeRasterizer::new();
        let mut cpu = CpuRenderer::new(8, 8);
        let cache =
            GlyphTextureCache::build(&rasterizer, &GlyphCacheConfig::default(), &mut cpu).unwrap();
        let renderer = TextRenderer::default();

        renderer.render_text(&cache, "MM", -40.0, 100.0, 1.0, [1.0; 3], &mut cpu);

        assert_eq!(cpu.draw_calls(), 2);
        assert!(cpu.bitmap().pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn draw_without_texture_is_not_counted() {
        let mut cpu = CpuRenderer::new(8, 8);
        cpu.upload_quad(&bytemuck::Zeroable::zeroed());
        cpu.draw_quad();

        assert_eq!(cpu.draw_calls(), 0);
        assert!(cpu.bitmap().pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn short_bitmap_is_never_sampled() {
        let rasterizer = FakeRasterizer::new().truncating('A');
        let mut cpu = CpuRenderer::new(32, 32);
        let cache =
            GlyphTextureCache::build(&rasterizer, &GlyphCacheConfig::default(), &mut cpu).unwrap();
        assert!(!cache.contains('A'));

        let pen = TextRenderer::default().render_text(&cache, "AB", 2.0, 4.0, 1.0, [1.0; 3], &mut cpu);

        assert_eq!(cpu.draw_calls(), 1);
        let b = cache.get('B').unwrap();
        assert_eq!(pen.x(), 2.0 + b.advance_px() as f32);
    }

    #[test]
    fn clear_resets_pixels_and_counter() {
        let rasterizer = FakeRasterizer::new();
        let mut cpu = CpuRenderer::new(32, 32);
        let cache =
            GlyphTextureCache::build(&rasterizer, &GlyphCacheConfig::default(), &mut cpu).unwrap();

        TextRenderer::default().render_text(&cache, "x", 4.0, 4.0, 1.0, [0.0, 1.0, 0.0], &mut cpu);
        assert_eq!(cpu.text_color(), [0.0, 1.0, 0.0]);
        assert!(cpu.bitmap().pixels.iter().any(|&p| p != 0));

        cpu.clear();
        assert_eq!(cpu.draw_calls(), 0);
        assert!(cpu.bitmap().pixels.iter().all(|&p| p == 0));
    }
}
