use crate::{
    glyph::GlyphMetrics,
    glyph_cache::GlyphTextureCache,
    text::{PenState, Quad},
};

/// The surface a [`TextRenderer`] draws into.
///
/// The renderer calls these in a fixed order: `set_text_color` once per
/// string, then `bind_texture`, `upload_quad`, `draw_quad` once per glyph.
/// `upload_quad` overwrites the whole one-quad vertex buffer, so a backend
/// must make sure each draw reads the vertices uploaded right before it.
pub trait QuadTarget {
    type Texture;

    fn set_text_color(&mut self, color: [f32; 3]);
    fn bind_texture(&mut self, texture: &Self::Texture);
    fn upload_quad(&mut self, quad: &Quad);
    /// Draws the 6 vertices currently in the quad buffer as a triangle list.
    fn draw_quad(&mut self);
}

/// What to do with a character that has no cache entry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum MissingGlyphPolicy {
    /// Draw nothing and leave the pen where it is.
    #[default]
    Skip,
    /// Draw nothing but move the pen by this many unscaled pixels.
    Advance(f32),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextRendererConfig {
    pub missing_glyph: MissingGlyphPolicy,
}

/// Lays out a string glyph by glyph and drives a [`QuadTarget`].
///
/// Each glyph is one upload and one draw call. Glyphs of a string are not
/// batched into a shared buffer.
#[derive(Clone, Debug, Default)]
pub struct TextRenderer {
    config: TextRendererConfig,
}

impl TextRenderer {
    pub fn new(config: TextRendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TextRendererConfig {
        &self.config
    }

    /// Draws `text` as a single line with its baseline starting at `(x, y)`.
    ///
    /// Returns the pen after the last character, so successive runs can be
    /// chained on the same line.
    pub fn render_text<Q: QuadTarget>(
        &self,
        cache: &GlyphTextureCache<Q::Texture>,
        text: &str,
        x: f32,
        y: f32,
        scale: f32,
        color: [f32; 3],
        target: &mut Q,
    ) -> PenState {
        target.set_text_color(color);

        self.walk(cache, text, PenState::new(x, y), scale, |glyph, pen| {
            let quad = Quad::for_glyph(pen, glyph.size, glyph.bearing, scale);

            target.bind_texture(&glyph.texture);
            target.upload_quad(&quad);
            target.draw_quad();
        })
    }

    /// Width in pixels the pen would travel when rendering `text`.
    pub fn measure<T>(&self, cache: &GlyphTextureCache<T>, text: &str, scale: f32) -> f32 {
        self.walk(cache, text, PenState::new(0.0, 0.0), scale, |_, _| {})
            .x()
    }

    fn walk<T>(
        &self,
        cache: &GlyphTextureCache<T>,
        text: &str,
        mut pen: PenState,
        scale: f32,
        mut draw: impl FnMut(&GlyphMetrics<T>, &PenState),
    ) -> PenState {
        for ch in text.chars() {
            let Some(glyph) = cache.get(ch) else {
                log::trace!("no glyph cached for {:?}", ch);
                if let MissingGlyphPolicy::Advance(width) = self.config.missing_glyph {
                    pen.advance(width * scale);
                }
                continue;
            };

            draw(glyph, &pen);

            pen.advance(glyph.advance_px() as f32 * scale);
        }

        pen
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph_cache::GlyphCacheConfig;
    use crate::test_fonts::{FakeRasterizer, HandleAllocator, RecordingTarget};

    fn fake_cache(rasterizer: &FakeRasterizer) -> GlyphTextureCache<u32> {
        let mut allocator = HandleAllocator::default();
        GlyphTextureCache::build(rasterizer, &GlyphCacheConfig::default(), &mut allocator)
            .unwrap()
    }

    #[test]
    fn pen_advance_is_additive() {
        let rasterizer = FakeRasterizer::new();
        let cache = fake_cache(&rasterizer);
        let renderer = TextRenderer::default();
        let mut target = RecordingTarget::default();

        let text = "Hello, quad!";
        let scale = 1.5;
        let pen = renderer.render_text(&cache, text, 12.0, 34.0, scale, [1.0; 3], &mut target);

        let expected: u32 = text.chars().map(|c| cache.get(c).unwrap().advance >> 6).sum();
        assert_eq!(pen.x(), 12.0 + scale * expected as f32);
        assert_eq!(pen.y(), 34.0);
        assert_eq!(target.draws.len(), text.chars().count());
    }

    #[test]
    fn color_is_set_once_per_call() {
        let rasterizer = FakeRasterizer::new();
        let cache = fake_cache(&rasterizer);
        let renderer = TextRenderer::default();
        let mut target = RecordingTarget::default();

        renderer.render_text(&cache, "abc", 0.0, 0.0, 1.0, [1.0, 0.0, 0.0], &mut target);

        assert_eq!(target.colors, vec![[1.0, 0.0, 0.0]]);
    }

    #[test]
    fn each_draw_uses_its_own_texture_and_quad() {
        let rasterizer = FakeRasterizer::new();
        let cache = fake_cache(&rasterizer);
        let renderer = TextRenderer::default();
        let mut target = RecordingTarget::default();

        renderer.render_text(&cache, "ab", 5.0, 7.0, 2.0, [1.0; 3], &mut target);

        let a = cache.get('a').unwrap();
        let b = cache.get('b').unwrap();
        assert_eq!(target.draws[0].texture, a.texture);
        assert_eq!(target.draws[1].texture, b.texture);

        let first = PenState::new(5.0, 7.0);
        assert_eq!(
            target.draws[0].quad,
            Quad::for_glyph(&first, a.size, a.bearing, 2.0)
        );

        let mut second = first;
        second.advance(a.advance_px() as f32 * 2.0);
        assert_eq!(
            target.draws[1].quad,
            Quad::for_glyph(&second, b.size, b.bearing, 2.0)
        );
    }

    #[test]
    fn missing_glyph_is_skipped_without_advance() {
        let rasterizer = FakeRasterizer::new().without('x');
        let cache = fake_cache(&rasterizer);
        let renderer = TextRenderer::default();

        let mut with_missing = RecordingTarget::default();
        let pen_with =
            renderer.render_text(&cache, "axb", 0.0, 0.0, 1.0, [1.0; 3], &mut with_missing);

        let mut without = RecordingTarget::default();
        let pen_without = renderer.render_text(&cache, "ab", 0.0, 0.0, 1.0, [1.0; 3], &mut without);

        assert_eq!(pen_with, pen_without);
        assert_eq!(with_missing.draws.len(), 2);
        assert_eq!(with_missing.draws, without.draws);
    }

    #[test]
    fn missing_glyph_can_advance_by_fallback_width() {
        let rasterizer = FakeRasterizer::new().without('x');
        let cache = fake_cache(&rasterizer);
        let renderer = TextRenderer::new(TextRendererConfig {
            missing_glyph: MissingGlyphPolicy::Advance(10.0),
        });
        let mut target = RecordingTarget::default();

        let pen = renderer.render_text(&cache, "axb", 0.0, 0.0, 2.0, [1.0; 3], &mut target);

        let a = cache.get('a').unwrap().advance_px() as f32;
        let b = cache.get('b').unwrap().advance_px() as f32;
        assert_eq!(pen.x(), 2.0 * (a + 10.0 + b));
        assert_eq!(target.draws.len(), 2);
    }

    #[test]
    fn measure_matches_rendered_pen() {
        let rasterizer = FakeRasterizer::new();
        let cache = fake_cache(&rasterizer);
        let renderer = TextRenderer::default();
        let mut target = RecordingTarget::default();

        let pen = renderer.render_text(&cache, "ABC abc", 3.0, 0.0, 0.5, [1.0; 3], &mut target);
        assert_eq!(renderer.measure(&cache, "ABC abc", 0.5), pen.x() - 3.0);
    }

    #[test]
    fn empty_text_draws_nothing() {
        let rasterizer = FakeRasterizer::new();
        let cache = fake_cache(&rasterizer);
        let renderer = TextRenderer::default();
        let mut target = RecordingTarget::default();

        let pen = renderer.render_text(&cache, "", 1.0, 2.0, 1.0, [1.0; 3], &mut target);

        assert_eq!(pen, PenState::new(1.0, 2.0));
        assert!(target.draws.is_empty());
        assert_eq!(target.colors.len(), 1);
    }
}
