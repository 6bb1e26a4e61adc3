pub mod cpu_renderer;
pub mod text_renderer;
#[cfg(feature = "wgpu")]
pub mod wgpu_renderer;

pub use cpu_renderer::{Bitmap, CpuRenderer, CpuTexture};
pub use text_renderer::{MissingGlyphPolicy, QuadTarget, TextRenderer, TextRendererConfig};
#[cfg(feature = "wgpu")]
pub use wgpu_renderer::{WgpuGlyphTexture, WgpuTextRenderer, WgpuTextRendererConfig};
