use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle, used for walls, obstacles and the car body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Creates a rectangle of the given size centered at `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x: cx - w / 2.,
            y: cy - h / 2.,
            w,
            h,
        }
    }

    /// Returns `true` when the two rectangles overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

#[cfg(test)]
mod tests {
    use super::Rect;

    #[test]
    fn overlap() {
        let a = Rect::new(0., 0., 10., 10.);
        assert!(a.intersects(&Rect::new(5., 5., 10., 10.)));
        assert!(a.intersects(&Rect::new(-5., -5., 10., 10.)));
        assert!(!a.intersects(&Rect::new(10., 0., 10., 10.)));
        assert!(!a.intersects(&Rect::new(0., 20., 10., 10.)));
    }

    #[test]
    fn centered_rect() {
        let r = Rect::centered(400., 300., 30., 30.);
        assert_eq!(r.x, 385.);
        assert_eq!(r.y, 285.);
    }
}
