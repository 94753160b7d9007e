use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::{check_query, Location, PointLocator};
use crate::error::{QueryError, Result, TopologyError};
use crate::math::predicates::{lex_cmp, orientation, point_on_segment, Orientation};
use crate::math::Point2;
use crate::topology::{Arrangement, EdgeId, FaceId, HalfEdgeId, VertexId};

/// Fixed default seed: the incremental order is random in the analysis
/// sense but reproducible across runs.
const DEFAULT_SEED: u64 = 0x9e37_79b9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SegRef(usize);

#[derive(Debug, Clone, Copy)]
struct MapSeg {
    left: Point2,
    right: Point2,
    edge: EdgeId,
    /// Face under the segment; answers the query for any trapezoid whose
    /// top boundary this segment is.
    below: FaceId,
}

#[derive(Debug, Clone)]
enum Node {
    X {
        p: Point2,
        vertex: VertexId,
        left: usize,
        right: usize,
    },
    Y {
        seg: SegRef,
        above: usize,
        below: usize,
    },
    Leaf(usize),
}

#[derive(Debug, Clone)]
struct Trapezoid {
    top: Option<SegRef>,
    bottom: Option<SegRef>,
    leftp: Option<Point2>,
    rightp: Option<Point2>,
    /// This trapezoid's leaf in the search DAG. Splitting the trapezoid
    /// overwrites the leaf in place, so every parent sees the new subtree.
    node: usize,
}

/// Point location through a randomized incremental trapezoidal map.
///
/// Preprocessing decomposes the plane into pseudo-trapezoids of constant
/// complexity and builds a search DAG of point and segment comparisons over
/// them; queries then descend the DAG in expected logarithmic time. The most
/// expensive strategy to set up and the cheapest to query, meant for a
/// static arrangement answering many queries. Degenerate inputs (vertical
/// segments, shared abscissae) are handled by the lexicographic shear: point
/// order is (x, then y) throughout.
///
/// The map is built once over a finalized arrangement and never patched; a
/// changed arrangement needs a new locator.
pub struct TrapezoidLocator<'a> {
    arr: &'a Arrangement,
    segs: Vec<MapSeg>,
    nodes: Vec<Node>,
    traps: Vec<Trapezoid>,
}

impl<'a> TrapezoidLocator<'a> {
    /// Builds the map with the default insertion seed.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnfinishedArrangement`] if the arrangement is
    /// not finalized, or a topology error if the map walk diverges.
    pub fn new(arr: &'a Arrangement) -> Result<Self> {
        Self::with_seed(arr, DEFAULT_SEED)
    }

    /// Builds the map, shuffling the insertion order with the given seed.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TrapezoidLocator::new`].
    pub fn with_seed(arr: &'a Arrangement, seed: u64) -> Result<Self> {
        if !arr.is_finalized() {
            return Err(QueryError::UnfinishedArrangement.into());
        }
        let mut segs = Vec::with_capacity(arr.edge_count());
        for eid in arr.edge_ids() {
            let up = arr.upward_half(eid);
            segs.push(MapSeg {
                left: arr.source_point(up),
                right: arr.target_point(up),
                edge: eid,
                below: arr.half(up.twin()).face,
            });
        }
        let mut map = Self {
            arr,
            segs,
            nodes: vec![Node::Leaf(0)],
            traps: vec![Trapezoid {
                top: None,
                bottom: None,
                leftp: None,
                rightp: None,
                node: 0,
            }],
        };
        let mut order: Vec<usize> = (0..map.segs.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        for i in order {
            map.insert(SegRef(i))?;
        }
        debug!(
            segments = map.segs.len(),
            trapezoids = map.traps.len(),
            nodes = map.nodes.len(),
            "trapezoidal map built"
        );
        Ok(map)
    }

    fn seg(&self, s: SegRef) -> &MapSeg {
        &self.segs[s.0]
    }

    /// Side of `p` relative to the segment: counter-clockwise means above.
    fn side_of(&self, p: Point2, s: SegRef) -> Orientation {
        let m = self.seg(s);
        orientation(m.left, m.right, p)
    }

    fn push_node(&mut self, n: Node) -> usize {
        self.nodes.push(n);
        self.nodes.len() - 1
    }

    fn new_trap(
        &mut self,
        top: Option<SegRef>,
        bottom: Option<SegRef>,
        leftp: Option<Point2>,
        rightp: Option<Point2>,
    ) -> usize {
        let t = self.traps.len();
        let node = self.nodes.len();
        self.nodes.push(Node::Leaf(t));
        self.traps.push(Trapezoid {
            top,
            bottom,
            leftp,
            rightp,
            node,
        });
        t
    }

    /// The trapezoid containing the point of `s` immediately right of `p`.
    ///
    /// Ties against a point node step right (forward along `s`); ties
    /// against a segment node compare the direction of `s` out of the
    /// shared endpoint.
    fn locate_for_insert(&self, p: Point2, s: SegRef) -> usize {
        let mut n = 0usize;
        loop {
            match &self.nodes[n] {
                Node::Leaf(t) => return *t,
                Node::X { p: xp, left, right, .. } => {
                    n = if lex_cmp(p, *xp) == Ordering::Less {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Y { seg, above, below } => {
                    n = match self.side_of(p, *seg) {
                        Orientation::CounterClockwise => *above,
                        Orientation::Clockwise => *below,
                        Orientation::Collinear => match self.side_of(self.seg(s).right, *seg) {
                            Orientation::Clockwise => *below,
                            _ => *above,
                        },
                    };
                }
            }
        }
    }

    fn insert(&mut self, s: SegRef) -> Result<()> {
        let (sl, sr) = {
            let m = self.seg(s);
            (m.left, m.right)
        };

        let mut crossed = vec![self.locate_for_insert(sl, s)];
        loop {
            if crossed.len() > self.traps.len() {
                return Err(
                    TopologyError::InvalidTopology("trapezoid walk diverged".into()).into(),
                );
            }
            let Some(&d) = crossed.last() else { break };
            match self.traps[d].rightp {
                Some(rp) if lex_cmp(rp, sr) == Ordering::Less => {
                    crossed.push(self.locate_for_insert(rp, s));
                }
                _ => break,
            }
        }
        let k = crossed.len();
        let first = crossed[0];
        let last = crossed[k - 1];

        let left_cap = match self.traps[first].leftp {
            Some(lp) => lex_cmp(sl, lp) == Ordering::Greater,
            None => true,
        };
        let right_cap = match self.traps[last].rightp {
            Some(rp) => lex_cmp(sr, rp) == Ordering::Less,
            None => true,
        };

        let cap_l = if left_cap {
            let t = self.traps[first].clone();
            Some(self.new_trap(t.top, t.bottom, t.leftp, Some(sl)))
        } else {
            None
        };
        let cap_r = if right_cap {
            let t = self.traps[last].clone();
            Some(self.new_trap(t.top, t.bottom, Some(sr), t.rightp))
        } else {
            None
        };

        // Runs above and below s, merged across consecutive trapezoids
        // whose shared wall does not cross the run's side.
        let start_left = if left_cap {
            Some(sl)
        } else {
            self.traps[first].leftp
        };
        let first_top = self.traps[first].top;
        let first_bottom = self.traps[first].bottom;
        let mut cur_upper = self.new_trap(first_top, Some(s), start_left, None);
        let mut cur_lower = self.new_trap(Some(s), first_bottom, start_left, None);
        let mut upper_of = vec![0usize; k];
        let mut lower_of = vec![0usize; k];
        for i in 0..k {
            upper_of[i] = cur_upper;
            lower_of[i] = cur_lower;
            if i + 1 < k {
                let rp = self.traps[crossed[i]].rightp.ok_or_else(|| {
                    TopologyError::InvalidTopology("crossed trapezoid lost its right wall".into())
                })?;
                let nxt = crossed[i + 1];
                if self.side_of(rp, s) == Orientation::CounterClockwise {
                    self.traps[cur_upper].rightp = Some(rp);
                    let nxt_top = self.traps[nxt].top;
                    cur_upper = self.new_trap(nxt_top, Some(s), Some(rp), None);
                } else {
                    self.traps[cur_lower].rightp = Some(rp);
                    let nxt_bottom = self.traps[nxt].bottom;
                    cur_lower = self.new_trap(Some(s), nxt_bottom, Some(rp), None);
                }
            } else {
                let end_right = if right_cap {
                    Some(sr)
                } else {
                    self.traps[last].rightp
                };
                self.traps[cur_upper].rightp = end_right;
                self.traps[cur_lower].rightp = end_right;
            }
        }

        // Splice one subtree per crossed trapezoid into the DAG, in place
        // of the trapezoid's leaf.
        for i in 0..k {
            let above = self.traps[upper_of[i]].node;
            let below = self.traps[lower_of[i]].node;
            let mut sub = self.push_node(Node::Y { seg: s, above, below });
            if i + 1 == k {
                if let Some(c) = cap_r {
                    let right = self.traps[c].node;
                    sub = self.push_node(Node::X {
                        p: sr,
                        vertex: self.vertex_of(sr)?,
                        left: sub,
                        right,
                    });
                }
            }
            if i == 0 {
                if let Some(c) = cap_l {
                    let left = self.traps[c].node;
                    sub = self.push_node(Node::X {
                        p: sl,
                        vertex: self.vertex_of(sl)?,
                        left,
                        right: sub,
                    });
                }
            }
            let target = self.traps[crossed[i]].node;
            self.nodes[target] = self.nodes[sub].clone();
        }
        Ok(())
    }

    fn vertex_of(&self, p: Point2) -> Result<VertexId> {
        Ok(self.arr.vertex_at(p).ok_or_else(|| {
            TopologyError::InvalidTopology("map endpoint is not an arrangement vertex".into())
        })?)
    }
}

impl PointLocator for TrapezoidLocator<'_> {
    fn locate(&self, q: Point2) -> Result<Location> {
        check_query(self.arr, q)?;
        if let Some(v) = self.arr.vertex_at(q) {
            return Ok(Location::Vertex(v));
        }
        if self.segs.is_empty() {
            return Ok(Location::Face(self.arr.unbounded_face()));
        }

        let mut n = 0usize;
        let cap = self.nodes.len() + 1;
        for _ in 0..cap {
            match &self.nodes[n] {
                Node::Leaf(t) => {
                    let trap = &self.traps[*t];
                    for sref in [trap.top, trap.bottom].into_iter().flatten() {
                        let m = self.seg(sref);
                        if point_on_segment(q, m.left, m.right) {
                            return Ok(Location::Edge(HalfEdgeId::forward(m.edge)));
                        }
                    }
                    let face = trap
                        .top
                        .map_or(self.arr.unbounded_face(), |top| self.seg(top).below);
                    return Ok(Location::Face(face));
                }
                Node::X { p, vertex, left, right } => {
                    n = match lex_cmp(q, *p) {
                        Ordering::Less => *left,
                        Ordering::Equal => return Ok(Location::Vertex(*vertex)),
                        Ordering::Greater => *right,
                    };
                }
                Node::Y { seg, above, below } => match self.side_of(q, *seg) {
                    Orientation::CounterClockwise => n = *above,
                    Orientation::Clockwise => n = *below,
                    Orientation::Collinear => {
                        let m = self.seg(*seg);
                        if point_on_segment(q, m.left, m.right) {
                            return Ok(Location::Edge(HalfEdgeId::forward(m.edge)));
                        }
                        // On the carrier line but past an end of the
                        // segment; the regions rejoin there.
                        n = if lex_cmp(q, m.right) == Ordering::Greater {
                            *above
                        } else {
                            *below
                        };
                    }
                },
            }
        }
        Err(TopologyError::InvalidTopology("trapezoid search did not terminate".into()).into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Segment2;
    use crate::location::NaiveLocator;
    use crate::topology::Arrangement;

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
        let trap = TrapezoidLocator::new(&arr).unwrap();
        for ix in -1..=9 {
            for iy in -1..=9 {
                let q = p(f64::from(ix) * 0.5, f64::from(iy) * 0.5);
                assert_eq!(
                    trap.locate(q).unwrap(),
                    naive.locate(q).unwrap(),
                    "disagreement at {q:?}"
                );
            }
        }
    }

    #[test]
    fn seed_does_not_change_answers() {
        let arr = crossed_square();
        let a = TrapezoidLocator::with_seed(&arr, 1).unwrap();
        let b = TrapezoidLocator::with_seed(&arr, 99).unwrap();
        for ix in 0..=8 {
            for iy in 0..=8 {
                let q = p(f64::from(ix) * 0.5, f64::from(iy) * 0.5);
                assert_eq!(a.locate(q).unwrap(), b.locate(q).unwrap());
            }
        }
    }

    #[test]
    fn vertical_segments_and_shared_abscissae() {
        let mut arr = Arrangement::new();
        arr.insert_segments(&[
            seg(2.0, 0.0, 2.0, 4.0),
            seg(2.0, 4.0, 5.0, 4.0),
            seg(2.0, 2.0, 5.0, 2.0),
        ])
        .unwrap();
        let naive = NaiveLocator::new(&arr);
        let trap = TrapezoidLocator::new(&arr).unwrap();
        for q in [
            p(1.0, 2.0),
            p(3.0, 3.0),
            p(3.0, 1.0),
            p(2.0, 1.0),
            p(2.0, 5.0),
            p(3.0, 2.0),
            p(6.0, 2.0),
        ] {
            assert_eq!(
                trap.locate(q).unwrap(),
                naive.locate(q).unwrap(),
                "disagreement at {q:?}"
            );
        }
    }

    #[test]
    fn degenerate_queries_are_explicit() {
        let arr = crossed_square();
        let trap = TrapezoidLocator::new(&arr).unwrap();
        let v = arr.vertex_at(p(2.0, 2.0)).unwrap();
        assert_eq!(trap.locate(p(2.0, 2.0)).unwrap(), Location::Vertex(v));
        assert!(matches!(trap.locate(p(1.0, 0.0)).unwrap(), Location::Edge(_)));
    }

    #[test]
    fn empty_plane_is_unbounded() {
        let arr = Arrangement::new();
        let trap = TrapezoidLocator::new(&arr).unwrap();
        assert_eq!(
            trap.locate(p(0.0, 0.0)).unwrap(),
            Location::Face(arr.unbounded_face())
        );
    }

    #[test]
    fn refuses_unfinished_arrangement() {
        let mut arr = Arrangement::new();
        let bad = [(p(0.0, 0.0), p(1.0, 0.0)), (p(2.0, 2.0), p(2.0, 2.0))];
        assert!(arr.insert_endpoint_pairs(&bad).is_err());
        assert!(TrapezoidLocator::new(&arr).is_err());
    }
}
