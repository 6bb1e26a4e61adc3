use bytemuck::{Pod, Zeroable};
use euclid::default::{Box2D, Point2D, Size2D, Vector2D};

use super::PenState;

/// Vertices per glyph quad: two triangles, no index buffer.
pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Byte size of the shared vertex buffer. It holds exactly one quad.
pub const QUAD_BUFFER_SIZE: u64 = std::mem::size_of::<Quad>() as u64;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],   // x, y in screen pixels
    pub tex_coords: [f32; 2], // u, v
}

/// One glyph's geometry as a triangle list.
///
/// Texture coordinates put `(0, 0)` at the bitmap's top-left and `(1, 1)` at
/// its bottom-right, matching the top-row-first layout of coverage bitmaps.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Quad {
    pub vertices: [QuadVertex; QUAD_VERTEX_COUNT as usize],
}

impl Quad {
    /// Places a glyph bitmap of `size` with `bearing` at the pen, scaled by
    /// `scale`.
    pub fn for_glyph(
        pen: &PenState,
        size: Size2D<u32>,
        bearing: Vector2D<i32>,
        scale: f32,
    ) -> Self {
        let x = pen.x() + bearing.x as f32 * scale;
        let y = pen.y() - (size.height as f32 - bearing.y as f32) * scale;
        let w = size.width as f32 * scale;
        let h = size.height as f32 * scale;

        let vertex = |px: f32, py: f32, u: f32, v: f32| QuadVertex {
            position: [px, py],
            tex_coords: [u, v],
        };

        Self {
            vertices: [
                vertex(x, y + h, 0.0, 0.0),
                vertex(x, y, 0.0, 1.0),
                vertex(x + w, y, 1.0, 1.0),
                vertex(x, y + h, 0.0, 0.0),
                vertex(x + w, y, 1.0, 1.0),
                vertex(x + w, y + h, 1.0, 0.0),
            ],
        }
    }

    /// Screen-space rectangle covered by the quad. `min` is the bottom-left
    /// corner since y goes up.
    pub fn bounds(&self) -> Box2D<f32> {
        let [x, y] = self.vertices[1].position;
        let [x_max, y_max] = self.vertices[5].position;
        Box2D::new(Point2D::new(x, y), Point2D::new(x_max, y_max))
    }

    /// The corner that samples the bitmap's first pixel.
    pub fn top_left(&self) -> Point2D<f32> {
        let [x, y] = self.vertices[0].position;
        Point2D::new(x, y)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_holds_six_vertices_of_four_floats() {
        assert_eq!(QUAD_BUFFER_SIZE, 6 * 4 * 4);
    }

    #[test]
    fn geometry_follows_pen_bearing_and_scale() {
        let pen = PenState::new(100.0, 50.0);
        let quad = Quad::for_glyph(&pen, Size2D::new(10, 20), Vector2D::new(2, 15), 2.0);

        let bounds = quad.bounds();
        // bottom-left: (px + bx*s, py - (sy - by)*s)
        assert_eq!(bounds.min, Point2D::new(104.0, 40.0));
        assert_eq!(bounds.width(), 20.0);
        assert_eq!(bounds.height(), 40.0);
        // the bitmap's top row lands at ypos + h
        assert_eq!(quad.top_left(), Point2D::new(104.0, 80.0));
    }

    #[test]
    fn tex_coords_map_bitmap_top_left_to_origin() {
        let pen = PenState::new(0.0, 0.0);
        let quad = Quad::for_glyph(&pen, Size2D::new(4, 4), Vector2D::new(0, 4), 1.0);

        for vertex in &quad.vertices {
            let [x, y] = vertex.position;
            let [u, v] = vertex.tex_coords;
            assert_eq!(u, x / 4.0);
            assert_eq!(v, 1.0 - y / 4.0);
        }
    }

    #[test]
    fn descender_extends_below_baseline() {
        let pen = PenState::new(0.0, 100.0);
        // 12 rows, top 8 above the baseline
        let quad = Quad::for_glyph(&pen, Size2D::new(6, 12), Vector2D::new(0, 8), 1.0);

        assert_eq!(quad.bounds().min.y, 96.0);
        assert_eq!(quad.bounds().max.y, 108.0);
    }
}
