mod landmarks;
mod naive;
mod trapezoid;
mod walk;

pub use landmarks::LandmarksLocator;
pub use naive::NaiveLocator;
pub use trapezoid::TrapezoidLocator;
pub use walk::WalkLocator;

use crate::error::{GeometryError, QueryError, Result};
use crate::math::predicates::point_in_cycle;
use crate::math::Point2;
use crate::topology::{Arrangement, FaceId, HalfEdgeId, VertexId};

/// Result of a point-location query.
///
/// A query point lies in the interior of exactly one face, or exactly on an
/// edge, or exactly on a vertex; the degenerate outcomes are always reported
/// as such, never resolved to an adjacent face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The point lies in the interior of this face.
    Face(FaceId),
    /// The point lies on the interior of this edge. Always the forward
    /// half of the twin pair, so results from different strategies compare
    /// equal.
    Edge(HalfEdgeId),
    /// The point coincides with this vertex.
    Vertex(VertexId),
}

/// Common capability interface of the point-location strategies.
///
/// Implementations are read-only over a borrowed [`Arrangement`]: a locator
/// never mutates or outlives the arrangement it answers for. Given the same
/// arrangement and query point, every strategy returns an equivalent
/// [`Location`].
pub trait PointLocator {
    /// Locates the arrangement feature containing `q`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnfinishedArrangement`] if construction of the
    /// arrangement did not complete, and
    /// [`crate::error::GeometryError::NonFiniteCoordinate`] for a NaN or
    /// infinite query point.
    fn locate(&self, q: Point2) -> Result<Location>;
}

/// Guards every query entry point.
pub(crate) fn check_query(arr: &Arrangement, q: Point2) -> Result<()> {
    if !q.x.is_finite() || !q.y.is_finite() {
        return Err(GeometryError::NonFiniteCoordinate { x: q.x, y: q.y }.into());
    }
    if !arr.is_finalized() {
        return Err(QueryError::UnfinishedArrangement.into());
    }
    Ok(())
}

/// Membership test of `q` against the boundary cycle starting at `start`.
///
/// The caller must already have ruled out `q` lying on the boundary itself.
pub(crate) fn cycle_contains(arr: &Arrangement, start: HalfEdgeId, q: Point2) -> Result<bool> {
    let points: Vec<Point2> = arr
        .ccb_cycle(start)?
        .into_iter()
        .map(|h| arr.source_point(h))
        .collect();
    Ok(point_in_cycle(&points, q))
}
