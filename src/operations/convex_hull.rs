use crate::error::{GeometryError, Result};
use crate::math::predicates::{lex_cmp, orientation, Orientation};
use crate::math::Point2;

/// Computes the convex hull of a point set.
///
/// Monotone-chain (Graham–Andrew) construction: sort lexicographically, then
/// build the lower and upper chains with the exact left-turn test. Collinear
/// and interior points never appear in the output.
pub struct ConvexHull {
    points: Vec<Point2>,
}

impl ConvexHull {
    /// Creates a new `ConvexHull` operation.
    #[must_use]
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Executes the operation, returning the hull vertices in
    /// counter-clockwise order, starting from the lexicographically smallest
    /// point. Inputs of fewer than three distinct points are returned as-is
    /// after duplicate collapse.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFiniteCoordinate`] if any input point has
    /// a NaN or infinite coordinate.
    pub fn execute(&self) -> Result<Vec<Point2>> {
        for p in &self.points {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(GeometryError::NonFiniteCoordinate { x: p.x, y: p.y }.into());
            }
        }
        let mut pts = self.points.clone();
        pts.sort_by(|a, b| lex_cmp(*a, *b));
        pts.dedup();
        if pts.len() <= 2 {
            return Ok(pts);
        }

        let mut lower: Vec<Point2> = Vec::with_capacity(pts.len());
        for &p in &pts {
            pop_non_left_turns(&mut lower, p);
            lower.push(p);
        }
        let mut upper: Vec<Point2> = Vec::with_capacity(pts.len());
        for &p in pts.iter().rev() {
            pop_non_left_turns(&mut upper, p);
            upper.push(p);
        }

        // Each chain ends with the other's starting point; drop both.
        lower.pop();
        upper.pop();
        lower.extend(upper);
        Ok(lower)
    }
}

fn pop_non_left_turns(chain: &mut Vec<Point2>, p: Point2) {
    while chain.len() >= 2 {
        let a = chain[chain.len() - 2];
        let b = chain[chain.len() - 1];
        if orientation(a, b, p) == Orientation::CounterClockwise {
            break;
        }
        chain.pop();
    }
}
