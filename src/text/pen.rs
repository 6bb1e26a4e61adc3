use euclid::default::Point2D;

/// Baseline cursor for one line of text, in screen pixels.
///
/// **Y-axis goes up**, matching the orthographic projection the renderers
/// use. Only the x coordinate ever moves; text is a single left-to-right line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PenState {
    position: Point2D<f32>,
}

impl PenState {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: Point2D::new(x, y),
        }
    }

    pub fn position(&self) -> Point2D<f32> {
        self.position
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    /// Moves the pen right by `dx` pixels.
    pub fn advance(&mut self, dx: f32) {
        self.position.x += dx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_only_x() {
        let mut pen = PenState::new(10.0, 20.0);
        pen.advance(5.5);
        pen.advance(2.0);

        assert_eq!(pen.x(), 17.5);
        assert_eq!(pen.y(), 20.0);
    }
}
