use euclid::default::{Size2D, Vector2D};

use crate::error::RasterizeError;

/// Number of advance units per pixel (advances are stored in 26.6 fixed point).
pub const ADVANCE_UNITS_PER_PIXEL: f32 = 64.0;

/// Cached data for one code point.
///
/// `T` is the backend's texture handle. The handle owns the glyph's coverage
/// bitmap and is released together with the cache entry.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphMetrics<T> {
    pub texture: T,
    /// Bitmap width/height in pixels.
    pub size: Size2D<u32>,
    /// Offset from the pen's baseline origin to the bitmap's top-left corner.
    /// **Y-axis goes up.**
    pub bearing: Vector2D<i32>,
    /// Horizontal pen advance in 1/64 pixel units.
    pub advance: u32,
}

impl<T> GlyphMetrics<T> {
    /// Advance in whole pixels, truncating the fractional 1/64 part.
    pub fn advance_px(&self) -> u32 {
        self.advance >> 6
    }
}

/// Output of [`GlyphRasterizer::rasterize_glyph`].
#[derive(Clone, Debug, PartialEq)]
pub struct RasterizedGlyph {
    /// Single-channel coverage, row-major, top row first.
    pub bitmap: Vec<u8>,
    pub size: Size2D<u32>,
    pub bearing: Vector2D<i32>,
    /// 1/64 pixel units.
    pub advance: u32,
}

impl RasterizedGlyph {
    /// Whether the bitmap has no pixels (e.g. the space character).
    pub fn is_blank(&self) -> bool {
        self.size.width == 0 || self.size.height == 0
    }

    /// Whether `bitmap` holds exactly `width * height` coverage values.
    pub fn bitmap_matches_size(&self) -> bool {
        self.bitmap.len() as u64 == self.size.width as u64 * self.size.height as u64
    }
}

/// Renders one code point of a font into a coverage bitmap.
pub trait GlyphRasterizer {
    fn rasterize_glyph(
        &self,
        ch: char,
        pixel_height: f32,
    ) -> Result<RasterizedGlyph, RasterizeError>;
}

impl GlyphRasterizer for fontdue::Font {
    fn rasterize_glyph(
        &self,
        ch: char,
        pixel_height: f32,
    ) -> Result<RasterizedGlyph, RasterizeError> {
        if !(pixel_height.is_finite() && pixel_height > 0.0) {
            return Err(RasterizeError::InvalidPixelHeight(pixel_height));
        }

        // index 0 is .notdef, fontdue falls back to it for unmapped chars
        let glyph_index = self.lookup_glyph_index(ch);
        if glyph_index == 0 {
            return Err(RasterizeError::MissingGlyph(ch));
        }

        let (metrics, bitmap) = self.rasterize_indexed(glyph_index, pixel_height);

        // fontdue reports the bitmap's bottom edge; the top edge is what the
        // quad placement needs.
        let bearing_y = metrics.ymin + metrics.height as i32;
        let advance = (metrics.advance_width.max(0.0) * ADVANCE_UNITS_PER_PIXEL).round() as u32;

        Ok(RasterizedGlyph {
            bitmap,
            size: Size2D::new(metrics.width as u32, metrics.height as u32),
            bearing: Vector2D::new(metrics.xmin, bearing_y),
            advance,
        })
    }
}

impl<R: GlyphRasterizer + ?Sized> GlyphRasterizer for std::sync::Arc<R> {
    fn rasterize_glyph(
        &self,
        ch: char,
        pixel_height: f32,
    ) -> Result<RasterizedGlyph, RasterizeError> {
        (**self).rasterize_glyph(ch, pixel_height)
    }
}
