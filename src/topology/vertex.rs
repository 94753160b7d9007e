use crate::math::Point2;

use super::half_edge::HalfEdgeId;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the arrangement.
    pub struct VertexId;
}

/// Data associated with an arrangement vertex.
///
/// A vertex exists at every segment endpoint and at every crossing point;
/// two coincident input points produce a single vertex.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// The position of the vertex.
    pub point: Point2,
    /// Outgoing half-edges, sorted counter-clockwise after each rebuild.
    /// Empty for an isolated vertex.
    pub incident: Vec<HalfEdgeId>,
}

impl VertexData {
    /// Creates a new vertex at the given point, with no incident edges.
    #[must_use]
    pub fn new(point: Point2) -> Self {
        Self {
            point,
            incident: Vec::new(),
        }
    }

    /// Returns `true` if no edge ends at this vertex.
    #[must_use]
    pub fn is_isolated(&self) -> bool {
        self.incident.is_empty()
    }
}
