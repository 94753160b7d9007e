use std::cmp::Ordering;

use crate::error::{GeometryError, Result};
use crate::math::predicates::{lex_cmp, point_on_segment};
use crate::math::Point2;

/// A directed straight segment between two distinct points.
///
/// The direction carries no topological meaning; arrangements treat segments
/// as undirected curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment2 {
    source: Point2,
    target: Point2,
}

impl Segment2 {
    /// Creates a new segment.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFiniteCoordinate`] if either endpoint has
    /// a NaN or infinite coordinate, and [`GeometryError::DegenerateSegment`]
    /// if the endpoints coincide.
    pub fn new(source: Point2, target: Point2) -> Result<Self> {
        for p in [source, target] {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(GeometryError::NonFiniteCoordinate { x: p.x, y: p.y }.into());
            }
        }
        if source == target {
            return Err(GeometryError::DegenerateSegment {
                x: source.x,
                y: source.y,
            }
            .into());
        }
        Ok(Self { source, target })
    }

    /// Returns the source endpoint.
    #[must_use]
    pub fn source(&self) -> Point2 {
        self.source
    }

    /// Returns the target endpoint.
    #[must_use]
    pub fn target(&self) -> Point2 {
        self.target
    }

    /// Returns the endpoints ordered lexicographically (left, right).
    #[must_use]
    pub fn lex_endpoints(&self) -> (Point2, Point2) {
        if lex_cmp(self.source, self.target) == Ordering::Greater {
            (self.target, self.source)
        } else {
            (self.source, self.target)
        }
    }

    /// Returns `true` if the segment is vertical.
    #[must_use]
    pub fn is_vertical(&self) -> bool {
        self.source.x == self.target.x
    }

    /// Exact containment test for a point on the closed segment.
    #[must_use]
    pub fn contains_point(&self, p: Point2) -> bool {
        point_on_segment(p, self.source, self.target)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn rejects_degenerate() {
        assert!(Segment2::new(p(1.0, 1.0), p(1.0, 1.0)).is_err());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(Segment2::new(p(f64::NAN, 0.0), p(1.0, 1.0)).is_err());
        assert!(Segment2::new(p(0.0, 0.0), p(f64::INFINITY, 1.0)).is_err());
    }

    #[test]
    fn lex_endpoints_swaps() {
        let s = Segment2::new(p(3.0, 0.0), p(1.0, 2.0)).unwrap();
        let (l, r) = s.lex_endpoints();
        assert_eq!(l, p(1.0, 2.0));
        assert_eq!(r, p(3.0, 0.0));
    }

    #[test]
    fn containment_is_exact() {
        let s = Segment2::new(p(0.0, 0.0), p(10.0, 10.0)).unwrap();
        assert!(s.contains_point(p(5.0, 5.0)));
        assert!(!s.contains_point(p(5.0, 5.000000001)));
    }
}
