use super::half_edge::HalfEdgeId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the arrangement.
    pub struct FaceId;
}

/// Data associated with an arrangement face.
///
/// Exactly one face per arrangement is unbounded; it has no outer boundary.
/// There is no explicit hole model: a boundary cycle that encloses no area
/// on its left is simply listed among the boundaries of whichever face
/// geometrically contains it.
#[derive(Debug, Clone, Default)]
pub struct FaceData {
    /// A half-edge on the outer boundary, `None` for the unbounded face.
    pub outer_ccb: Option<HalfEdgeId>,
    /// One representative half-edge per boundary cycle adjacent to this
    /// face. For a bounded face this is the outer boundary alone.
    pub boundary: Vec<HalfEdgeId>,
    /// Approximate enclosed area; `0.0` for the unbounded face. Used only
    /// to order nested faces, never for incidence decisions.
    pub area: f64,
}

impl FaceData {
    /// Returns `true` if this is the unbounded face.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.outer_ccb.is_none()
    }
}
