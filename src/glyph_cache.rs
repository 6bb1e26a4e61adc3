use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::{
    error::CacheError,
    glyph::{GlyphMetrics, GlyphRasterizer, RasterizedGlyph},
};

/// Pixel height used when none is configured.
pub const DEFAULT_PIXEL_HEIGHT: f32 = 48.0;

/// The 128 ASCII code points.
pub const ASCII: RangeInclusive<char> = '\0'..='\x7f';

/// Configuration for building a [`GlyphTextureCache`].
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphCacheConfig {
    /// Em height in pixels that every glyph is rasterized at.
    pub pixel_height: f32,
    /// Code points to rasterize, inclusive.
    ///
    /// Every code point that rasterizes costs one texture, so keep this
    /// range as small as the text you intend to draw.
    pub code_points: RangeInclusive<char>,
}

impl Default for GlyphCacheConfig {
    fn default() -> Self {
        Self {
            pixel_height: DEFAULT_PIXEL_HEIGHT,
            code_points: ASCII,
        }
    }
}

/// Creates one texture per rasterized glyph.
///
/// Implementations must create a single-channel texture sampled with
/// clamp-to-edge addressing and linear filtering, and upload `glyph.bitmap`
/// into it.
pub trait GlyphTextureAllocator {
    type Texture;
    type Error: std::fmt::Display;

    fn allocate_glyph_texture(
        &mut self,
        ch: char,
        glyph: &RasterizedGlyph,
    ) -> Result<Self::Texture, Self::Error>;
}

/// Read-only map from code point to its texture and metrics.
///
/// Built once per font load by [`GlyphTextureCache::build`] and never mutated
/// afterwards. Dropping the cache drops every texture handle.
pub struct GlyphTextureCache<T> {
    pixel_height: f32,
    glyphs: HashMap<char, GlyphMetrics<T>, fxhash::FxBuildHasher>,
}

impl<T> GlyphTextureCache<T> {
    /// A cache with no glyphs, the state after a font is unloaded.
    pub fn empty() -> Self {
        Self {
            pixel_height: 0.0,
            glyphs: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
        }
    }

    /// Rasterizes every code point in `config.code_points` and uploads each
    /// one through `allocator`.
    ///
    /// A code point that fails to rasterize or upload is logged and left out;
    /// the other entries are unaffected.
    pub fn build<R, A>(
        rasterizer: &R,
        config: &GlyphCacheConfig,
        allocator: &mut A,
    ) -> Result<Self, CacheError>
    where
        R: GlyphRasterizer + ?Sized,
        A: GlyphTextureAllocator<Texture = T>,
    {
        let pixel_height = config.pixel_height;
        if !(pixel_height.is_finite() && pixel_height > 0.0) {
            return Err(CacheError::InvalidPixelHeight(pixel_height));
        }

        let mut glyphs = HashMap::with_hasher(fxhash::FxBuildHasher::default());
        let mut skipped = 0usize;

        for ch in config.code_points.clone() {
            let glyph = match rasterizer.rasterize_glyph(ch, pixel_height) {
                Ok(glyph) => glyph,
                Err(e) => {
                    log::warn!("Failed to rasterize glyph {:?}: {}", ch, e);
                    skipped += 1;
                    continue;
                }
            };

            if !glyph.bitmap_matches_size() {
                log::warn!(
                    "Failed to rasterize glyph {:?}: {} coverage bytes for a {}x{} bitmap",
                    ch,
                    glyph.bitmap.len(),
                    glyph.size.width,
                    glyph.size.height
                );
                skipped += 1;
                continue;
            }

            let texture = match allocator.allocate_glyph_texture(ch, &glyph) {
                Ok(texture) => texture,
                Err(e) => {
                    log::warn!("Failed to upload glyph {:?}: {}", ch, e);
                    skipped += 1;
                    continue;
                }
            };

            glyphs.insert(
                ch,
                GlyphMetrics {
                    texture,
                    size: glyph.size,
                    bearing: glyph.bearing,
                    advance: glyph.advance,
                },
            );
        }

        log::debug!(
            "glyph cache built at {}px: {} cached, {} skipped",
            pixel_height,
            glyphs.len(),
            skipped
        );

        Ok(Self {
            pixel_height,
            glyphs,
        })
    }
}

impl<T> GlyphTextureCache<T> {
    /// Looks up the glyph for `ch`.
    pub fn get(&self, ch: char) -> Option<&GlyphMetrics<T>> {
        self.glyphs.get(&ch)
    }

    pub fn contains(&self, ch: char) -> bool {
        self.glyphs.contains_key(&ch)
    }

    /// Pixel height the glyphs were rasterized at. `0.0` for an empty cache.
    pub fn pixel_height(&self) -> f32 {
        self.pixel_height
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Iterates over all cached glyphs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (char, &GlyphMetrics<T>)> {
        self.glyphs.iter().map(|(&ch, metrics)| (ch, metrics))
    }
}
