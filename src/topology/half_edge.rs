use super::face::FaceId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an undirected edge (a twin pair) in the
    /// arrangement.
    pub struct EdgeId;
}

/// One of the two traversal directions of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dir {
    /// The direction the edge record was created with.
    Forward = 0,
    /// The opposite direction.
    Reverse = 1,
}

impl Dir {
    /// Returns the opposite direction.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

/// Identifier of one directed view of an edge.
///
/// The twin relation is structural: flipping the direction component always
/// yields the other view of the same edge record, so a half-edge and its
/// twin cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HalfEdgeId {
    /// The owning edge record.
    pub edge: EdgeId,
    /// Which of the two directed views.
    pub dir: Dir,
}

impl HalfEdgeId {
    /// Creates a half-edge identifier.
    #[must_use]
    pub fn new(edge: EdgeId, dir: Dir) -> Self {
        Self { edge, dir }
    }

    /// The forward view of an edge, used as its canonical handle.
    #[must_use]
    pub fn forward(edge: EdgeId) -> Self {
        Self::new(edge, Dir::Forward)
    }

    /// Returns the opposite directed view of the same edge.
    #[must_use]
    pub fn twin(self) -> Self {
        Self::new(self.edge, self.dir.flip())
    }

    /// Canonicalizes to the forward view, so twin pairs compare equal.
    #[must_use]
    pub fn canonical(self) -> Self {
        Self::forward(self.edge)
    }
}

/// Data associated with one directed view of an edge.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdgeData {
    /// The vertex this half-edge leaves.
    pub origin: VertexId,
    /// The face on the left of this half-edge.
    pub face: FaceId,
    /// The next half-edge along the boundary of `face`.
    pub next: HalfEdgeId,
    /// The previous half-edge along the boundary of `face`.
    pub prev: HalfEdgeId,
}

/// An undirected edge stored as its two directed views.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// The two directed views, indexed by [`Dir`].
    pub halves: [HalfEdgeData; 2],
}

impl EdgeData {
    /// Returns the directed view for the given direction.
    #[must_use]
    pub fn half(&self, dir: Dir) -> &HalfEdgeData {
        &self.halves[dir as usize]
    }

    /// Returns the directed view mutably.
    pub fn half_mut(&mut self, dir: Dir) -> &mut HalfEdgeData {
        &mut self.halves[dir as usize]
    }
}
