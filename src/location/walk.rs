use std::collections::HashSet;

use malachite::Rational;

use super::{check_query, Location, PointLocator};
use crate::error::{Result, TopologyError};
use crate::math::exact::{self, rational};
use crate::math::predicates::point_on_segment;
use crate::math::Point2;
use crate::topology::{Arrangement, EdgeId, FaceId, HalfEdgeId, SectorHit, VertexId};

/// Point location by walking the zone of a vertical ray.
///
/// Conceptually a vertical ray drops from above the arrangement onto the
/// query point; the walk starts in the unbounded face and crosses one
/// boundary feature at a time, so the cost scales with the number of
/// features in the ray's zone rather than with the whole arrangement.
/// No preprocessing.
pub struct WalkLocator<'a> {
    arr: &'a Arrangement,
}

enum RayHit {
    Vertex(VertexId),
    Edge(EdgeId),
}

enum Descend {
    OnEdge(EdgeId),
    Into(FaceId, Rational),
}

impl<'a> WalkLocator<'a> {
    /// Creates a locator over the given arrangement.
    #[must_use]
    pub fn new(arr: &'a Arrangement) -> Self {
        Self { arr }
    }

    /// First contact of the downward ray `x = q.x` with the boundary of
    /// `face`, strictly below `cur` (`None` = above everything) and not
    /// below `q` itself.
    fn scan(
        &self,
        face: FaceId,
        q: Point2,
        cur: Option<&Rational>,
        qy: &Rational,
    ) -> Result<Option<(Rational, RayHit)>> {
        let qx = rational(q.x);
        let below_cur = |y: &Rational| cur.is_none_or(|c| y < c);
        let mut best: Option<(Rational, RayHit)> = None;
        let consider = |y: Rational, hit: RayHit, best: &mut Option<(Rational, RayHit)>| {
            let replace = match best {
                None => true,
                Some((by, bh)) => {
                    y > *by || (y == *by && matches!(bh, RayHit::Edge(_)) && matches!(hit, RayHit::Vertex(_)))
                }
            };
            if replace {
                *best = Some((y, hit));
            }
        };

        let mut seen: HashSet<EdgeId> = HashSet::new();
        let boundary = self.arr.face(face)?.boundary.clone();
        for start in boundary {
            for h in self.arr.ccb_cycle(start)? {
                if !seen.insert(h.edge) {
                    continue;
                }
                let u = self.arr.source_point(h);
                let v = self.arr.target_point(h);

                // A vertical edge lying on the ray and containing q is a
                // direct on-edge answer.
                if u.x == v.x && u.x == q.x && point_on_segment(q, u, v) {
                    return Ok(Some((qy.clone(), RayHit::Edge(h.edge))));
                }

                let endpoints = [
                    (u, self.arr.half(h).origin),
                    (v, self.arr.half(h.twin()).origin),
                ];
                for (w, wid) in endpoints {
                    if w.x != q.x {
                        continue;
                    }
                    let wy = rational(w.y);
                    if wy > *qy && below_cur(&wy) {
                        consider(wy, RayHit::Vertex(wid), &mut best);
                    }
                }

                if u.x != v.x {
                    let (lo, hi) = if u.x < v.x { (u, v) } else { (v, u) };
                    if q.x > lo.x && q.x < hi.x {
                        let y = exact::y_at(lo, hi, &qx);
                        if y >= *qy && below_cur(&y) {
                            consider(y, RayHit::Edge(h.edge), &mut best);
                        }
                    }
                }
            }
        }
        Ok(best)
    }

    /// Resolves the ray's continuation through vertex `v`: follows any
    /// chain of exactly-vertical edges downward, then names the face whose
    /// angular sector contains the downward direction.
    fn resolve_down(&self, v: VertexId, q: Point2) -> Result<Descend> {
        let cap = self.arr.vertex_count() + 1;
        let mut v = v;
        for _ in 0..cap {
            let wp = self.arr.point_of(v);
            let down = self.arr.incident_of(v).iter().copied().find(|&h| {
                let t = self.arr.target_point(h);
                t.x == wp.x && t.y < wp.y
            });
            if let Some(h) = down {
                let t = self.arr.target_point(h);
                if q.x == wp.x && q.y < wp.y && q.y > t.y {
                    return Ok(Descend::OnEdge(h.edge));
                }
                v = self.arr.half(h.twin()).origin;
                continue;
            }
            let down_y = {
                let d = wp.y - 1.0;
                if d < wp.y {
                    d
                } else {
                    wp.y.next_down()
                }
            };
            match self.arr.sector_at(v, Point2::new(wp.x, down_y)) {
                Some(SectorHit::Face(f)) => return Ok(Descend::Into(f, rational(wp.y))),
                Some(SectorHit::AlongEdge(h)) => {
                    v = self.arr.half(h.twin()).origin;
                }
                None => {
                    return Err(TopologyError::InvalidTopology(
                        "ray resolution reached an isolated vertex".into(),
                    )
                    .into())
                }
            }
        }
        Err(TopologyError::InvalidTopology("vertical chain did not terminate".into()).into())
    }
}

impl PointLocator for WalkLocator<'_> {
    fn locate(&self, q: Point2) -> Result<Location> {
        check_query(self.arr, q)?;
        if let Some(v) = self.arr.vertex_at(q) {
            return Ok(Location::Vertex(v));
        }

        let qy = rational(q.y);
        let mut face = self.arr.unbounded_face();
        let mut cur: Option<Rational> = None;
        let cap = self.arr.half_edge_count() + self.arr.vertex_count() + 2;
        for _ in 0..cap {
            match self.scan(face, q, cur.as_ref(), &qy)? {
                None => return Ok(Location::Face(face)),
                Some((y, RayHit::Edge(e))) if y == qy => {
                    return Ok(Location::Edge(HalfEdgeId::forward(e)));
                }
                Some((y, RayHit::Edge(e))) => {
                    face = self.arr.half(self.arr.upward_half(e).twin()).face;
                    cur = Some(y);
                }
                Some((_, RayHit::Vertex(v))) => match self.resolve_down(v, q)? {
                    Descend::OnEdge(e) => return Ok(Location::Edge(HalfEdgeId::forward(e))),
                    Descend::Into(f, vy) => {
                        face = f;
                        cur = Some(vy);
                    }
                },
            }
        }
        Err(TopologyError::InvalidTopology("vertical walk exceeded its step cap".into()).into())
    }
}
