//! # quadtext
//!
//! Glyph texture cache and per-glyph quad text renderer.
//!
//! ## Overview
//!
//! A font is rasterized once, at a fixed pixel height, into one coverage
//! texture per code point ([`GlyphTextureCache`]). Text is then drawn one
//! glyph at a time: the [`TextRenderer`] walks the string, builds a textured
//! quad from the pen position and the glyph's bearing, uploads it into a
//! single reusable vertex buffer and issues one draw call per glyph.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quadtext::{
//!     CpuRenderer, FontStorage, GlyphCacheConfig, GlyphTextureCache, TextRenderer,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 1. Load a font
//! let mut fonts = FontStorage::new();
//! let id = fonts.load_font_file("fonts/DejaVuSans.ttf")?;
//! let font = fonts.font(id)?;
//!
//! // 2. Build the glyph cache on a backend
//! let mut target = CpuRenderer::new(800, 600);
//! let cache = GlyphTextureCache::build(&font, &GlyphCacheConfig::default(), &mut target)?;
//!
//! // 3. Render
//! let renderer = TextRenderer::default();
//! let pen = renderer.render_text(&cache, "ABC abc", 25.0, 25.0, 1.0, [1.0; 3], &mut target);
//! println!("pen stopped at {:?}", pen.position());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! *   **`wgpu`** (default): [`WgpuTextRenderer`], a rendering session on a
//!     wgpu device.
//! *   Without it, [`CpuRenderer`] composites the same quads into an 8-bit
//!     coverage bitmap.

pub mod error;
pub mod font_storage;
pub mod glyph;
pub mod glyph_cache;
pub mod renderer;
pub mod text;

#[cfg(test)]
mod test_fonts;

// common re-exports
pub use error::{CacheError, FontError, RasterizeError, RenderError, ShaderError};
pub use font_storage::FontStorage;
pub use glyph::{GlyphMetrics, GlyphRasterizer, RasterizedGlyph};
pub use glyph_cache::{GlyphCacheConfig, GlyphTextureAllocator, GlyphTextureCache};
pub use renderer::{
    Bitmap, CpuRenderer, MissingGlyphPolicy, QuadTarget, TextRenderer, TextRendererConfig,
};
pub use text::{PenState, Quad, QuadVertex};

#[cfg(feature = "wgpu")]
pub use renderer::{WgpuTextRenderer, WgpuTextRendererConfig};

// re-export dependencies
pub use fontdb;
pub use fontdue;

#[cfg(feature = "wgpu")]
pub use wgpu;

#[cfg(feature = "wgpu")]
pub use palette;
