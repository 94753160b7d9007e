use super::{check_query, cycle_contains, Location, PointLocator};
use crate::error::Result;
use crate::math::predicates::point_on_segment;
use crate::math::Point2;
use crate::topology::{Arrangement, FaceId, HalfEdgeId};

/// Point location by exhaustive scan.
///
/// Traverses all vertices and edges with direct geometric tests, then
/// classifies the face by a crossing-number test against every bounded
/// boundary. No preprocessing; query time is linear in the arrangement
/// size. The reference implementation the other strategies are tested
/// against.
pub struct NaiveLocator<'a> {
    arr: &'a Arrangement,
}

impl<'a> NaiveLocator<'a> {
    /// Creates a locator over the given arrangement.
    #[must_use]
    pub fn new(arr: &'a Arrangement) -> Self {
        Self { arr }
    }
}

impl PointLocator for NaiveLocator<'_> {
    fn locate(&self, q: Point2) -> Result<Location> {
        check_query(self.arr, q)?;

        for (vid, v) in self.arr.vertices() {
            if v.point == q {
                return Ok(Location::Vertex(vid));
            }
        }

        for eid in self.arr.edge_ids() {
            let (u, v) = self.arr.edge_endpoints(eid)?;
            if point_on_segment(q, u, v) {
                return Ok(Location::Edge(HalfEdgeId::forward(eid)));
            }
        }

        // Among nested containing faces the smallest one is the innermost.
        let mut best: Option<(f64, FaceId)> = None;
        for (fid, f) in self.arr.faces() {
            let Some(start) = f.outer_ccb else { continue };
            if cycle_contains(self.arr, start, q)?
                && best.is_none_or(|(area, _)| f.area < area)
            {
                best = Some((f.area, fid));
            }
        }
        Ok(Location::Face(
            best.map_or(self.arr.unbounded_face(), |(_, fid)| fid),
        ))
    }
}
