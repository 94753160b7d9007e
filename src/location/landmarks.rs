use std::collections::HashSet;

use malachite::Rational;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use super::{check_query, Location, PointLocator, WalkLocator};
use crate::error::{Result, TopologyError};
use crate::math::exact;
use crate::math::predicates::{orientation, point_on_segment, Orientation};
use crate::math::Point2;
use crate::topology::{Arrangement, EdgeId, FaceId, HalfEdgeId, SectorHit, VertexId};

type Landmark = GeomWithData<[f64; 2], VertexId>;

/// Point location by jump & walk.
///
/// Preprocessing indexes the arrangement vertices (the landmarks) in an
/// R-tree; their location is known by construction. A query jumps to the
/// nearest landmark and walks the straight line from there to the query
/// point, crossing one boundary feature at a time. Worth its preprocessing
/// when many queries hit the same arrangement.
pub struct LandmarksLocator<'a> {
    arr: &'a Arrangement,
    tree: RTree<Landmark>,
}

enum WalkState {
    AtVertex(VertexId),
    InFace(FaceId, Point2, Rational),
}

enum Hit {
    Vertex(VertexId, Rational),
    Edge(EdgeId, FaceId, Rational),
}

impl<'a> LandmarksLocator<'a> {
    /// Creates a locator over the given arrangement, indexing its vertices.
    #[must_use]
    pub fn new(arr: &'a Arrangement) -> Self {
        let landmarks: Vec<Landmark> = arr
            .vertices()
            .map(|(vid, v)| GeomWithData::new([v.point.x, v.point.y], vid))
            .collect();
        Self {
            arr,
            tree: RTree::bulk_load(landmarks),
        }
    }

    /// Straight walk from a landmark vertex towards `q`.
    fn walk_from(&self, start: VertexId, q: Point2) -> Result<Location> {
        let arr = self.arr;
        let cap = arr.half_edge_count() + arr.vertex_count() + 2;
        let mut state = WalkState::AtVertex(start);
        for _ in 0..cap {
            state = match state {
                WalkState::AtVertex(v) => {
                    let vp = arr.point_of(v);
                    if vp == q {
                        return Ok(Location::Vertex(v));
                    }
                    match arr.sector_at(v, q) {
                        // An isolated landmark has no known cell to start
                        // from; fall back to the vertical walk.
                        None => return WalkLocator::new(arr).locate(q),
                        Some(SectorHit::AlongEdge(h)) => {
                            let (src, tgt) = (arr.source_point(h), arr.target_point(h));
                            if point_on_segment(q, src, tgt) {
                                return Ok(Location::Edge(HalfEdgeId::forward(h.edge)));
                            }
                            // q lies beyond the far endpoint; keep walking
                            // along the collinear chain.
                            WalkState::AtVertex(arr.half(h.twin()).origin)
                        }
                        Some(SectorHit::Face(f)) => {
                            WalkState::InFace(f, vp, Rational::default())
                        }
                    }
                }
                WalkState::InFace(face, s, cur_t) => {
                    match self.first_crossing(face, s, q, &cur_t)? {
                        None => return Ok(Location::Face(face)),
                        Some(Hit::Vertex(w, _)) => WalkState::AtVertex(w),
                        Some(Hit::Edge(e, _, t)) if t == Rational::from(1) => {
                            return Ok(Location::Edge(HalfEdgeId::forward(e)));
                        }
                        Some(Hit::Edge(_, far, t)) => WalkState::InFace(far, s, t),
                    }
                }
            };
        }
        Err(TopologyError::InvalidTopology("straight walk exceeded its step cap".into()).into())
    }

    /// Earliest contact of the carrier `s..q` with the boundary of `face`,
    /// strictly after parameter `cur_t`. Vertex contacts win ties so that a
    /// crossing through a shared endpoint is resolved rotationally.
    fn first_crossing(
        &self,
        face: FaceId,
        s: Point2,
        q: Point2,
        cur_t: &Rational,
    ) -> Result<Option<Hit>> {
        let arr = self.arr;
        let one = Rational::from(1);
        let mut best: Option<Hit> = None;
        let t_of = |hit: &Hit| match hit {
            Hit::Vertex(_, t) | Hit::Edge(_, _, t) => t.clone(),
        };
        let mut seen: HashSet<EdgeId> = HashSet::new();
        let boundary = arr.face(face)?.boundary.clone();
        for start in boundary {
            for h in arr.ccb_cycle(start)? {
                if !seen.insert(h.edge) {
                    continue;
                }
                let u = arr.source_point(h);
                let v = arr.target_point(h);
                let endpoints = [
                    (u, arr.half(h).origin),
                    (v, arr.half(h.twin()).origin),
                ];
                for (w, wid) in endpoints {
                    if point_on_segment(w, s, q) {
                        let t = exact::collinear_param(s, q, w);
                        if t > *cur_t && t <= one {
                            let candidate = Hit::Vertex(wid, t);
                            if better(&candidate, &best, &t_of) {
                                best = Some(candidate);
                            }
                        }
                    }
                }
                // Proper interior crossing: strict straddle on both sides.
                let us = orientation(s, q, u);
                let vs = orientation(s, q, v);
                if us != Orientation::Collinear && vs != Orientation::Collinear && us != vs {
                    if let Some(t) = exact::crossing_param(s, q, u, v) {
                        if t > *cur_t {
                            let far = self.far_side_face(h, q);
                            let candidate = Hit::Edge(h.edge, far, t);
                            if better(&candidate, &best, &t_of) {
                                best = Some(candidate);
                            }
                        }
                    }
                }
            }
        }
        Ok(best)
    }

    /// The face on the far side of `h` as seen when crossing towards `q`.
    fn far_side_face(&self, h: HalfEdgeId, q: Point2) -> FaceId {
        let u = self.arr.source_point(h);
        let v = self.arr.target_point(h);
        let side = if orientation(u, v, q) == Orientation::CounterClockwise {
            h
        } else {
            h.twin()
        };
        self.arr.half(side).face
    }
}

fn better(candidate: &Hit, best: &Option<Hit>, t_of: &impl Fn(&Hit) -> Rational) -> bool {
    match best {
        None => true,
        Some(b) => {
            let tc = t_of(candidate);
            let tb = t_of(b);
            tc < tb
                || (tc == tb
                    && matches!(candidate, Hit::Vertex(..))
                    && matches!(b, Hit::Edge(..)))
        }
    }
}

impl PointLocator for LandmarksLocator<'_> {
    fn locate(&self, q: Point2) -> Result<Location> {
        check_query(self.arr, q)?;
        if let Some(v) = self.arr.vertex_at(q) {
            return Ok(Location::Vertex(v));
        }
        match self.tree.nearest_neighbor(&[q.x, q.y]) {
            // No landmarks at all: the plane is empty of vertices.
            None => WalkLocator::new(self.arr).locate(q),
            Some(nearest) => self.walk_from(nearest.data, q),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Segment2;
    use crate::location::NaiveLocator;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment2 {
        Segment2::new(p(ax, ay), p(bx, by)).unwrap()
    }

    fn crossed_square() -> Arrangement {
        let mut arr = Arrangement::new();
        arr.insert_segments(&[
            seg(0.0, 0.0, 4.0, 0.0),
            seg(4.0, 0.0, 4.0, 4.0),
            seg(4.0, 4.0, 0.0, 4.0),
            seg(0.0, 4.0, 0.0, 0.0),
            seg(0.0, 0.0, 4.0, 4.0),
            seg(0.0, 4.0, 4.0, 0.0),
        ])
        .unwrap();
        arr
    }

    #[test]
    fn agrees_with_naive_on_a_query_grid() {
        let arr = crossed_square();
        let naive = NaiveLocator::new(&arr);
        let landmarks = LandmarksLocator::new(&arr);
        for ix in -1..=9 {
            for iy in -1..=9 {
                let q = p(f64::from(ix) * 0.5, f64::from(iy) * 0.5);
                assert_eq!(
                    landmarks.locate(q).unwrap(),
                    naive.locate(q).unwrap(),
                    "disagreement at {q:?}"
                );
            }
        }
    }

    #[test]
    fn crossing_vertex_is_a_vertex() {
        let arr = crossed_square();
        let loc = LandmarksLocator::new(&arr);
        let v = arr.vertex_at(p(2.0, 2.0)).unwrap();
        assert_eq!(loc.locate(p(2.0, 2.0)).unwrap(), Location::Vertex(v));
    }

    #[test]
    fn empty_arrangement_falls_back() {
        let arr = Arrangement::new();
        let loc = LandmarksLocator::new(&arr);
        assert_eq!(
            loc.locate(p(1.0, 1.0)).unwrap(),
            Location::Face(arr.unbounded_face())
        );
    }

    #[test]
    fn isolated_landmark_falls_back() {
        let mut arr = Arrangement::new();
        arr.insert_isolated_point(p(10.0, 10.0)).unwrap();
        arr.insert_segments(&[
            seg(0.0, 0.0, 2.0, 0.0),
            seg(2.0, 0.0, 1.0, 2.0),
            seg(1.0, 2.0, 0.0, 0.0),
        ])
        .unwrap();
        let loc = LandmarksLocator::new(&arr);
        // Nearest landmark to this query is the isolated vertex.
        assert_eq!(
            loc.locate(p(9.0, 9.0)).unwrap(),
            Location::Face(arr.unbounded_face())
        );
    }
}
