use tracing::debug;

use crate::error::Result;
use crate::geometry::Segment2;
use crate::topology::Arrangement;

/// Builds an arrangement from a set of segments.
///
/// Segments may share endpoints, touch, overlap, or cross; every incidence
/// becomes a vertex and every crossing splits the segments involved. The
/// result does not depend on the order of the input.
pub struct BuildArrangement {
    segments: Vec<Segment2>,
}

impl BuildArrangement {
    /// Creates a new `BuildArrangement` operation.
    #[must_use]
    pub fn new(segments: Vec<Segment2>) -> Self {
        Self { segments }
    }

    /// Executes the operation, returning the finalized arrangement.
    ///
    /// # Errors
    ///
    /// Returns an error if boundary relinking detects corrupted topology.
    pub fn execute(&self) -> Result<Arrangement> {
        let mut arr = Arrangement::new();
        arr.insert_segments(&self.segments)?;
        debug!(
            segments = self.segments.len(),
            vertices = arr.vertex_count(),
            edges = arr.edge_count(),
            faces = arr.face_count(),
            "arrangement constructed"
        );
        Ok(arr)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment2 {
        Segment2::new(Point2::new(ax, ay), Point2::new(bx, by)).unwrap()
    }

    #[test]
    fn builds_finalized_arrangement() {
        let arr = BuildArrangement::new(vec![
            seg(0.0, 0.0, 4.0, 0.0),
            seg(4.0, 0.0, 2.0, 3.0),
            seg(2.0, 3.0, 0.0, 0.0),
        ])
        .execute()
        .unwrap();
        assert!(arr.is_finalized());
        assert_eq!(arr.face_count(), 2);
    }

    #[test]
    fn empty_input_yields_the_bare_plane() {
        let arr = BuildArrangement::new(vec![]).execute().unwrap();
        assert_eq!(arr.vertex_count(), 0);
        assert_eq!(arr.face_count(), 1);
    }
}
