/// Pen position tracking while a line of text is drawn.
pub mod pen;
/// Per-glyph quad geometry written into the shared vertex buffer.
pub mod quad;

pub use pen::PenState;
pub use quad::{QUAD_BUFFER_SIZE, QUAD_VERTEX_COUNT, Quad, QuadVertex};
