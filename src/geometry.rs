use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Distance from `point` to each of `positions`, in the same order.
pub fn distances(point: &Point, positions: &[Point]) -> Vec<f64> {
    positions.iter().map(|p| point.distance(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn three_four_five() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn distances_follow_input_order() {
        let ue = Point::new(10.0, 0.0);
        let enbs = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, -7.5)];
        assert_eq!(distances(&ue, &enbs), vec![10.0, 0.0, 7.5]);
    }

    #[test]
    fn no_positions_no_distances() {
        assert!(distances(&Point::new(1.0, 1.0), &[]).is_empty());
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(ax in -1e4..1e4f64, ay in -1e4..1e4f64, bx in -1e4..1e4f64, by in -1e4..1e4f64) {
            let a = Point::new(ax, ay);
            let b = Point::new(bx, by);
            prop_assert_eq!(a.distance(&b), b.distance(&a));
        }

        #[test]
        fn distance_to_self_is_zero(x in -1e4..1e4f64, y in -1e4..1e4f64) {
            let a = Point::new(x, y);
            prop_assert_eq!(a.distance(&a), 0.0);
        }
    }
}
