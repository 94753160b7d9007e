pub mod face;
pub mod half_edge;
pub mod vertex;

pub use face::{FaceData, FaceId};
pub use half_edge::{Dir, EdgeData, EdgeId, HalfEdgeData, HalfEdgeId};
pub use vertex::{VertexData, VertexId};

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use slotmap::SlotMap;
use tracing::debug;

use crate::error::{GeometryError, Result, TopologyError};
use crate::geometry::Segment2;
use crate::math::exact;
use crate::math::predicates::{
    ccw_direction_cmp, lex_cmp, orientation, point_in_cycle, point_on_segment, same_direction,
    Orientation,
};
use crate::math::Point2;

/// Exact-equality key for a point; `-0.0` is normalized to match `0.0`.
fn point_key(p: Point2) -> (u64, u64) {
    let canon = |x: f64| {
        let x = if x == 0.0 { 0.0_f64 } else { x };
        x.to_bits()
    };
    (canon(p.x), canon(p.y))
}

fn ordered_pair(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn lex_min_max(a: Point2, b: Point2) -> (Point2, Point2) {
    if lex_cmp(a, b) == Ordering::Greater {
        (b, a)
    } else {
        (a, b)
    }
}

/// What lies immediately around a vertex in a given direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorHit {
    /// The direction falls strictly inside the angular sector of this face.
    Face(FaceId),
    /// The direction runs exactly along this outgoing half-edge.
    AlongEdge(HalfEdgeId),
}

/// A planar subdivision induced by a set of line segments.
///
/// Central arena that owns all vertices, edges (as twin pairs of
/// half-edges), and faces. Entities reference each other via typed IDs
/// (generational indices), avoiding self-referential structures and enabling
/// safe mutation.
///
/// Segments are inserted incrementally; every crossing or touch with
/// existing geometry splits the affected edges at an exactly constructed
/// point, and the boundary structure is relinked after every insertion, so
/// the final topology never depends on insertion order.
#[derive(Debug)]
pub struct Arrangement {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    faces: SlotMap<FaceId, FaceData>,
    unbounded: FaceId,
    vertex_by_point: HashMap<(u64, u64), VertexId>,
    edge_by_pair: HashMap<(VertexId, VertexId), EdgeId>,
    finalized: bool,
}

impl Default for Arrangement {
    fn default() -> Self {
        Self::new()
    }
}

impl Arrangement {
    /// Creates an empty arrangement: the whole plane as one unbounded face.
    #[must_use]
    pub fn new() -> Self {
        let mut faces = SlotMap::with_key();
        let unbounded = faces.insert(FaceData::default());
        Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            faces,
            unbounded,
            vertex_by_point: HashMap::new(),
            edge_by_pair: HashMap::new(),
            finalized: true,
        }
    }

    // --- Counts and iteration ---

    /// Number of vertices, including isolated ones.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of half-edges (always twice the edge count).
    #[must_use]
    pub fn half_edge_count(&self) -> usize {
        self.edges.len() * 2
    }

    /// Number of faces, including the unbounded face.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// The unique unbounded face.
    #[must_use]
    pub fn unbounded_face(&self) -> FaceId {
        self.unbounded
    }

    /// `true` once construction has completed; point location requires it.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Iterates over all faces.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FaceData)> {
        self.faces.iter()
    }

    /// Iterates over all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> {
        self.vertices.iter()
    }

    /// Iterates over all undirected edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys()
    }

    // --- Fallible accessors ---

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the arrangement.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData> {
        Ok(self
            .vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?)
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the arrangement.
    pub fn face(&self, id: FaceId) -> Result<&FaceData> {
        Ok(self
            .faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))?)
    }

    /// Returns one directed view of an edge, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the arrangement.
    pub fn half_edge(&self, h: HalfEdgeId) -> Result<&HalfEdgeData> {
        Ok(self
            .edges
            .get(h.edge)
            .map(|e| e.half(h.dir))
            .ok_or_else(|| TopologyError::EntityNotFound("half-edge".into()))?)
    }

    /// Source and target points of a half-edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the half-edge is not found.
    pub fn halfedge_endpoints(&self, h: HalfEdgeId) -> Result<(Point2, Point2)> {
        self.half_edge(h)?;
        Ok((self.source_point(h), self.target_point(h)))
    }

    /// Endpoints of an undirected edge, in its forward direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not found.
    pub fn edge_endpoints(&self, e: EdgeId) -> Result<(Point2, Point2)> {
        self.halfedge_endpoints(HalfEdgeId::forward(e))
    }

    /// Looks up the vertex at exactly this point, if any.
    #[must_use]
    pub fn vertex_at(&self, p: Point2) -> Option<VertexId> {
        self.vertex_by_point.get(&point_key(p)).copied()
    }

    // --- Infallible crate-internal accessors (IDs must be live) ---

    pub(crate) fn half(&self, h: HalfEdgeId) -> &HalfEdgeData {
        self.edges[h.edge].half(h.dir)
    }

    fn half_mut(&mut self, h: HalfEdgeId) -> &mut HalfEdgeData {
        self.edges[h.edge].half_mut(h.dir)
    }

    pub(crate) fn point_of(&self, v: VertexId) -> Point2 {
        self.vertices[v].point
    }

    pub(crate) fn source_point(&self, h: HalfEdgeId) -> Point2 {
        self.point_of(self.half(h).origin)
    }

    pub(crate) fn target_point(&self, h: HalfEdgeId) -> Point2 {
        self.point_of(self.half(h.twin()).origin)
    }

    pub(crate) fn incident_of(&self, v: VertexId) -> &[HalfEdgeId] {
        &self.vertices[v].incident
    }

    /// The half-edge of `e` directed from its lexicographically smaller
    /// endpoint to the larger; its left face lies above the edge.
    pub(crate) fn upward_half(&self, e: EdgeId) -> HalfEdgeId {
        let h = HalfEdgeId::forward(e);
        if lex_cmp(self.source_point(h), self.target_point(h)) == Ordering::Greater {
            h.twin()
        } else {
            h
        }
    }

    // --- Boundary traversal ---

    /// Walks a boundary cycle from `start` via `next` links.
    ///
    /// The walk is capped: a cycle that fails to return to its start within
    /// the total number of half-edges is reported as corrupted rather than
    /// looping forever.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::CorruptedBoundary`] if the cap is exceeded,
    /// or [`TopologyError::EntityNotFound`] for a stale handle.
    pub fn ccb_cycle(&self, start: HalfEdgeId) -> Result<Vec<HalfEdgeId>> {
        self.half_edge(start)?;
        let cap = self.half_edge_count() + 1;
        let mut cycle = Vec::new();
        let mut h = start;
        loop {
            if cycle.len() >= cap {
                return Err(TopologyError::CorruptedBoundary { cap }.into());
            }
            cycle.push(h);
            h = self.half(h).next;
            if h == start {
                break;
            }
        }
        Ok(cycle)
    }

    /// Resolves what lies around vertex `v` in the direction of `towards`.
    ///
    /// `None` if the vertex is isolated. The incident list must be in its
    /// rebuilt (counter-clockwise) order, which holds for any finalized
    /// arrangement.
    pub(crate) fn sector_at(&self, v: VertexId, towards: Point2) -> Option<SectorHit> {
        let vd = &self.vertices[v];
        let c = vd.point;
        if vd.incident.is_empty() {
            return None;
        }
        for &h in &vd.incident {
            if same_direction(c, self.target_point(h), towards) {
                return Some(SectorHit::AlongEdge(h));
            }
        }
        // The sector between two consecutive outgoing directions belongs to
        // the face left of the sector's clockwise bounding edge.
        let mut owner = *vd.incident.last()?;
        for (i, &h) in vd.incident.iter().enumerate() {
            if ccw_direction_cmp(c, towards, self.target_point(h)) == Ordering::Less {
                owner = if i == 0 {
                    *vd.incident.last()?
                } else {
                    vd.incident[i - 1]
                };
                break;
            }
        }
        Some(SectorHit::Face(self.half(owner).face))
    }

    // --- Construction ---

    /// Inserts a segment, splitting existing geometry at every crossing or
    /// touch point, and relinks the boundary structure.
    ///
    /// # Errors
    ///
    /// Returns an error if relinking detects a corrupted boundary.
    pub fn insert_segment(&mut self, seg: &Segment2) -> Result<()> {
        self.finalized = false;
        self.split_and_link(seg);
        self.rebuild()?;
        self.finalized = true;
        Ok(())
    }

    /// Inserts a batch of segments, relinking once at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if relinking detects a corrupted boundary; the
    /// arrangement is then left unfinalized and refuses queries.
    pub fn insert_segments(&mut self, segs: &[Segment2]) -> Result<()> {
        self.finalized = false;
        for seg in segs {
            self.split_and_link(seg);
        }
        self.rebuild()?;
        self.finalized = true;
        Ok(())
    }

    /// Inserts a batch of raw endpoint pairs, validating each.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateSegment`] or
    /// [`GeometryError::NonFiniteCoordinate`] for an invalid pair; the
    /// arrangement is then left unfinalized and refuses queries.
    pub fn insert_endpoint_pairs(&mut self, pairs: &[(Point2, Point2)]) -> Result<()> {
        self.finalized = false;
        for &(a, b) in pairs {
            let seg = Segment2::new(a, b)?;
            self.split_and_link(&seg);
        }
        self.rebuild()?;
        self.finalized = true;
        Ok(())
    }

    /// Inserts a point as a vertex. Reuses an existing vertex at the same
    /// location; splits an edge if the point lies in its interior.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFiniteCoordinate`] for a NaN or infinite
    /// coordinate.
    pub fn insert_isolated_point(&mut self, p: Point2) -> Result<VertexId> {
        if !p.x.is_finite() || !p.y.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate { x: p.x, y: p.y }.into());
        }
        if let Some(v) = self.vertex_at(p) {
            return Ok(v);
        }
        let hit = self.edges.iter().find_map(|(eid, e)| {
            let u = self.point_of(e.half(Dir::Forward).origin);
            let w = self.point_of(e.half(Dir::Reverse).origin);
            (point_on_segment(p, u, w) && p != u && p != w).then_some(eid)
        });
        let vid = self.ensure_vertex(p);
        if let Some(eid) = hit {
            self.finalized = false;
            let (fu, fv) = self.edge_vertices(eid);
            self.remove_edge(eid);
            self.add_edge_if_absent(fu, vid);
            self.add_edge_if_absent(vid, fv);
            self.rebuild()?;
            self.finalized = true;
        }
        Ok(vid)
    }

    fn edge_vertices(&self, e: EdgeId) -> (VertexId, VertexId) {
        let rec = &self.edges[e];
        (rec.half(Dir::Forward).origin, rec.half(Dir::Reverse).origin)
    }

    fn ensure_vertex(&mut self, p: Point2) -> VertexId {
        if let Some(v) = self.vertex_at(p) {
            return v;
        }
        let id = self.vertices.insert(VertexData::new(p));
        self.vertex_by_point.insert(point_key(p), id);
        id
    }

    fn remove_edge(&mut self, e: EdgeId) {
        let pair = ordered_pair(
            self.edges[e].half(Dir::Forward).origin,
            self.edges[e].half(Dir::Reverse).origin,
        );
        self.edge_by_pair.remove(&pair);
        self.edges.remove(e);
    }

    fn add_edge_if_absent(&mut self, va: VertexId, vb: VertexId) {
        if va == vb {
            return;
        }
        let key = ordered_pair(va, vb);
        if self.edge_by_pair.contains_key(&key) {
            return;
        }
        let unbounded = self.unbounded;
        let eid = self.edges.insert_with_key(|eid| {
            let fwd = HalfEdgeId::new(eid, Dir::Forward);
            let rev = HalfEdgeId::new(eid, Dir::Reverse);
            EdgeData {
                halves: [
                    HalfEdgeData {
                        origin: va,
                        face: unbounded,
                        next: rev,
                        prev: rev,
                    },
                    HalfEdgeData {
                        origin: vb,
                        face: unbounded,
                        next: fwd,
                        prev: fwd,
                    },
                ],
            }
        });
        self.edge_by_pair.insert(key, eid);
    }

    /// Splits existing edges at every point where `seg` meets them, then
    /// adds the missing pieces of `seg` itself.
    fn split_and_link(&mut self, seg: &Segment2) {
        let (a, b) = (seg.source(), seg.target());
        let mut stops: Vec<Point2> = vec![a, b];

        for v in self.vertices.values() {
            if point_on_segment(v.point, a, b) {
                stops.push(v.point);
            }
        }

        let snapshot: Vec<(EdgeId, Point2, Point2)> = self
            .edges
            .iter()
            .map(|(id, e)| {
                (
                    id,
                    self.point_of(e.half(Dir::Forward).origin),
                    self.point_of(e.half(Dir::Reverse).origin),
                )
            })
            .collect();

        let mut edge_splits: HashMap<EdgeId, Vec<Point2>> = HashMap::new();
        for &(eid, u, v) in &snapshot {
            let u_side = orientation(a, b, u);
            let v_side = orientation(a, b, v);
            if u_side == Orientation::Collinear && v_side == Orientation::Collinear {
                // Collinear: the overlap interval contributes its endpoints.
                let (s_lo, s_hi) = lex_min_max(a, b);
                let (e_lo, e_hi) = lex_min_max(u, v);
                let lo = if lex_cmp(s_lo, e_lo) == Ordering::Less { e_lo } else { s_lo };
                let hi = if lex_cmp(s_hi, e_hi) == Ordering::Greater { e_hi } else { s_hi };
                if lex_cmp(lo, hi) != Ordering::Greater {
                    stops.push(lo);
                    stops.push(hi);
                }
                continue;
            }
            // Proper crossing: strict straddle on both sides. The edge is
            // split at the constructed point even when rounding moved that
            // point off the edge's carrier line.
            let strict = |o: Orientation| o != Orientation::Collinear;
            let straddles = strict(u_side)
                && strict(v_side)
                && u_side != v_side
                && {
                    let a_side = orientation(u, v, a);
                    let b_side = orientation(u, v, b);
                    strict(a_side) && strict(b_side) && a_side != b_side
                };
            if straddles {
                if let Some(x) = exact::segment_intersection(a, b, u, v) {
                    stops.push(x);
                    if x != u && x != v {
                        edge_splits.entry(eid).or_default().push(x);
                    }
                }
            }
        }

        // Any stop landing exactly in the interior of an existing edge also
        // splits it: touches, overlap endpoints, and a rounded crossing that
        // settles onto a third, concurrent edge.
        for &(eid, u, v) in &snapshot {
            for &s in &stops {
                if s != u && s != v && point_on_segment(s, u, v) {
                    edge_splits.entry(eid).or_default().push(s);
                }
            }
        }

        for (eid, mut pts) in edge_splits {
            let (fu, fv) = self.edge_vertices(eid);
            let pu = self.point_of(fu);
            let pv = self.point_of(fv);
            self.remove_edge(eid);
            pts.sort_by(|p, q| lex_cmp(*p, *q));
            pts.dedup();
            let (first, last) = if lex_cmp(pu, pv) == Ordering::Greater {
                (fv, fu)
            } else {
                (fu, fv)
            };
            let mut chain = vec![first];
            for p in pts {
                chain.push(self.ensure_vertex(p));
            }
            chain.push(last);
            chain.dedup();
            for w in chain.windows(2) {
                self.add_edge_if_absent(w[0], w[1]);
            }
        }

        stops.sort_by(|p, q| lex_cmp(*p, *q));
        stops.dedup();
        let ids: Vec<VertexId> = stops.into_iter().map(|p| self.ensure_vertex(p)).collect();
        for w in ids.windows(2) {
            self.add_edge_if_absent(w[0], w[1]);
        }
    }

    /// Connected-component index for every vertex; isolated vertices form
    /// their own components.
    pub(crate) fn vertex_components(&self) -> HashMap<VertexId, usize> {
        let mut adjacency: HashMap<VertexId, Vec<VertexId>> = HashMap::new();
        for e in self.edges.values() {
            let a = e.half(Dir::Forward).origin;
            let b = e.half(Dir::Reverse).origin;
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }
        let mut comp: HashMap<VertexId, usize> = HashMap::with_capacity(self.vertices.len());
        let mut next = 0usize;
        for vid in self.vertices.keys() {
            if comp.contains_key(&vid) {
                continue;
            }
            let mut stack = vec![vid];
            while let Some(v) = stack.pop() {
                if comp.contains_key(&v) {
                    continue;
                }
                comp.insert(v, next);
                if let Some(nbrs) = adjacency.get(&v) {
                    stack.extend(nbrs.iter().copied());
                }
            }
            next += 1;
        }
        comp
    }

    /// Recomputes incident-edge order, next/prev links, and faces from the
    /// current vertex and edge sets.
    fn rebuild(&mut self) -> Result<()> {
        for v in self.vertices.values_mut() {
            v.incident.clear();
        }
        let half_ids: Vec<HalfEdgeId> = self
            .edges
            .keys()
            .flat_map(|eid| [HalfEdgeId::new(eid, Dir::Forward), HalfEdgeId::new(eid, Dir::Reverse)])
            .collect();
        for &h in &half_ids {
            let origin = self.half(h).origin;
            self.vertices[origin].incident.push(h);
        }

        let vids: Vec<VertexId> = self.vertices.keys().collect();
        for v in vids {
            let center = self.vertices[v].point;
            let mut inc = std::mem::take(&mut self.vertices[v].incident);
            inc.sort_by(|&h1, &h2| {
                ccw_direction_cmp(center, self.target_point(h1), self.target_point(h2))
                    .then_with(|| h1.cmp(&h2))
            });
            self.vertices[v].incident = inc;
        }

        // next(h) is the outgoing half-edge at target(h) immediately
        // clockwise of twin(h) in the rotational order.
        let mut links: Vec<(HalfEdgeId, HalfEdgeId)> = Vec::with_capacity(half_ids.len());
        for &h in &half_ids {
            let tv = self.half(h.twin()).origin;
            let inc = &self.vertices[tv].incident;
            let idx = inc
                .iter()
                .position(|&x| x == h.twin())
                .ok_or_else(|| TopologyError::InvalidTopology("twin missing from incident list".into()))?;
            let next = inc[(idx + inc.len() - 1) % inc.len()];
            links.push((h, next));
        }
        for (h, next) in links {
            self.half_mut(h).next = next;
            self.half_mut(next).prev = h;
        }

        let keep = self.unbounded;
        self.faces.retain(|id, _| id == keep);
        {
            let ub = &mut self.faces[keep];
            ub.boundary.clear();
            ub.outer_ccb = None;
            ub.area = 0.0;
        }

        // Collect every boundary orbit with its geometry before touching
        // faces: counter-clockwise orbits become bounded faces, the rest
        // must be attributed to whichever face geometrically contains them.
        struct Orbit {
            start: HalfEdgeId,
            cycle: Vec<HalfEdgeId>,
            points: Vec<Point2>,
            sign: Ordering,
        }
        let cap = self.half_edge_count() + 1;
        let mut orbits: Vec<Orbit> = Vec::new();
        let mut visited: HashSet<HalfEdgeId> = HashSet::with_capacity(half_ids.len());
        for &start in &half_ids {
            if visited.contains(&start) {
                continue;
            }
            let mut cycle = Vec::new();
            let mut points = Vec::new();
            let mut h = start;
            loop {
                if cycle.len() >= cap {
                    return Err(TopologyError::CorruptedBoundary { cap }.into());
                }
                cycle.push(h);
                points.push(self.source_point(h));
                h = self.half(h).next;
                if h == start {
                    break;
                }
            }
            for &c in &cycle {
                visited.insert(c);
            }
            let sign = exact::cycle_area_sign(&points);
            orbits.push(Orbit {
                start,
                cycle,
                points,
                sign,
            });
        }

        let components = self.vertex_components();
        let orbit_comps: Vec<Option<usize>> = orbits
            .iter()
            .map(|o| components.get(&self.half(o.start).origin).copied())
            .collect();

        let mut bounded: Vec<(FaceId, Option<usize>, f64, usize)> = Vec::new();
        for (i, o) in orbits.iter().enumerate() {
            if o.sign != Ordering::Greater {
                continue;
            }
            let area = shoelace_abs(&o.points);
            let fid = self.faces.insert(FaceData {
                outer_ccb: Some(o.start),
                boundary: vec![o.start],
                area,
            });
            for &c in &o.cycle {
                self.half_mut(c).face = fid;
            }
            bounded.push((fid, orbit_comps[i], area, i));
        }

        // A clockwise or flat orbit is the outer boundary of its connected
        // component; it borders the smallest bounded face of another
        // component that strictly contains it, or the unbounded face.
        for (i, o) in orbits.iter().enumerate() {
            if o.sign == Ordering::Greater {
                continue;
            }
            let comp = orbit_comps[i];
            let anchor = o
                .points
                .iter()
                .copied()
                .min_by(|a, b| lex_cmp(*a, *b))
                .unwrap_or_else(|| self.source_point(o.start));
            let mut best: Option<(f64, FaceId)> = None;
            for &(fid, fcomp, area, oi) in &bounded {
                if fcomp == comp {
                    continue;
                }
                if point_in_cycle(&orbits[oi].points, anchor)
                    && best.is_none_or(|(a, _)| area < a)
                {
                    best = Some((area, fid));
                }
            }
            let target = best.map_or(keep, |(_, fid)| fid);
            for &c in &o.cycle {
                self.half_mut(c).face = target;
            }
            self.faces[target].boundary.push(o.start);
        }

        debug!(
            vertices = self.vertex_count(),
            edges = self.edge_count(),
            faces = self.face_count(),
            "relinked arrangement topology"
        );
        Ok(())
    }
}

fn shoelace_abs(points: &[Point2]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    (sum * 0.5).abs()
}
