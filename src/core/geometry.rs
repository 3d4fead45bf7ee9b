use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page space. `y0` is the top edge, `y1` the bottom
/// edge, both measured downward from the top of the page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn top(&self) -> f32 {
        self.y0
    }

    pub fn bottom(&self) -> f32 {
        self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Self) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }

    pub fn scale(&self, factor: f32) -> Self {
        Self {
            x0: self.x0 * factor,
            y0: self.y0 * factor,
            x1: self.x1 * factor,
            y1: self.y1 * factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn contains_requires_full_overlap() {
        let half = BBox::new(0.0, 0.0, 306.0, 792.0);
        assert!(half.contains(&BBox::new(40.0, 100.0, 200.0, 180.0)));
        assert!(!half.contains(&BBox::new(280.0, 100.0, 340.0, 180.0)));
    }

    #[test]
    fn scales_every_edge() {
        let bbox = BBox::new(36.0, 95.0, 300.0, 297.0).scale(3.0);
        assert_eq!(bbox, BBox::new(108.0, 285.0, 900.0, 891.0));
    }

    #[test]
    fn empty_when_inverted() {
        assert!(BBox::new(10.0, 50.0, 20.0, 40.0).is_empty());
        assert!(!BBox::new(10.0, 40.0, 20.0, 50.0).is_empty());
    }
}
