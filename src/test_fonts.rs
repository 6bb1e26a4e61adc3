//! Deterministic glyph sources and recording targets for unit tests.

use std::sync::Arc;

use euclid::default::{Size2D, Vector2D};

use crate::{
    error::RasterizeError,
    font_storage::FontStorage,
    glyph::{GlyphRasterizer, RasterizedGlyph},
    glyph_cache::GlyphTextureAllocator,
    renderer::QuadTarget,
    text::Quad,
};

/// Produces solid rectangular glyphs whose size depends on the code point.
pub struct FakeRasterizer {
    missing: Vec<char>,
    truncated: Vec<char>,
}

impl FakeRasterizer {
    pub fn new() -> Self {
        Self {
            missing: vec![],
            truncated: vec![],
        }
    }

    pub fn without(mut self, ch: char) -> Self {
        self.missing.push(ch);
        self
    }

    /// Reports the usual size for `ch` but returns fewer coverage bytes.
    pub fn truncating(mut self, ch: char) -> Self {
        self.truncated.push(ch);
        self
    }

    fn size_of(ch: char) -> Size2D<u32> {
        if ch == ' ' {
            return Size2D::zero();
        }
        let code = ch as u32;
        Size2D::new(4 + code % 5, 6 + code % 3)
    }

    /// Whole-pixel width plus a fractional part that must be truncated.
    pub fn advance_of(&self, ch: char) -> u32 {
        (Self::size_of(ch).width + 2) * 64 + 17
    }
}

impl GlyphRasterizer for FakeRasterizer {
    fn rasterize_glyph(
        &self,
        ch: char,
        pixel_height: f32,
    ) -> Result<RasterizedGlyph, RasterizeError> {
        if !(pixel_height.is_finite() && pixel_height > 0.0) {
            return Err(RasterizeError::InvalidPixelHeight(pixel_height));
        }
        if self.missing.contains(&ch) {
            return Err(RasterizeError::MissingGlyph(ch));
        }

        let size = Self::size_of(ch);
        let mut len = (size.width * size.height) as usize;
        if self.truncated.contains(&ch) {
            len = len.saturating_sub(1);
        }

        Ok(RasterizedGlyph {
            bitmap: vec![255; len],
            size,
            bearing: Vector2D::new(1, size.height as i32 - 2),
            advance: self.advance_of(ch),
        })
    }
}

/// Hands out increasing integer handles, optionally failing for one char.
#[derive(Default)]
pub struct HandleAllocator {
    pub allocated: usize,
    pub fail_on: Option<char>,
}

impl GlyphTextureAllocator for HandleAllocator {
    type Texture = u32;
    type Error = String;

    fn allocate_glyph_texture(
        &mut self,
        ch: char,
        _glyph: &RasterizedGlyph,
    ) -> Result<u32, String> {
        if self.fail_on == Some(ch) {
            return Err(format!("refusing {:?}", ch));
        }
        self.allocated += 1;
        Ok(self.allocated as u32)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedDraw {
    pub texture: u32,
    pub quad: Quad,
}

/// Records every call the text renderer makes.
#[derive(Default)]
pub struct RecordingTarget {
    pub colors: Vec<[f32; 3]>,
    pub draws: Vec<RecordedDraw>,
    bound: Option<u32>,
    uploaded: Option<Quad>,
}

impl QuadTarget for RecordingTarget {
    type Texture = u32;

    fn set_text_color(&mut self, color: [f32; 3]) {
        self.colors.push(color);
    }

    fn bind_texture(&mut self, texture: &u32) {
        self.bound = Some(*texture);
    }

    fn upload_quad(&mut self, quad: &Quad) {
        self.uploaded = Some(*quad);
    }

    #[allow(clippy::unwrap_used)]
    fn draw_quad(&mut self) {
        self.draws.push(RecordedDraw {
            texture: self.bound.unwrap(),
            quad: self.uploaded.unwrap(),
        });
    }
}

/// Any installed font, preferring a sans-serif face. `None` on machines
/// without fonts.
pub fn system_font() -> Option<Arc<fontdue::Font>> {
    let mut storage = FontStorage::new();
    storage.load_system_fonts();

    const FAMILIES: &[fontdb::Family<'_>] = &[fontdb::Family::SansSerif];
    let query = fontdb::Query {
        families: FAMILIES,
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    if let Ok((_, font)) = storage.query(&query) {
        return Some(font);
    }

    let ids: Vec<_> = storage.faces().map(|face| face.id).collect();
    ids.into_iter().find_map(|id| storage.font(id).ok())
}
