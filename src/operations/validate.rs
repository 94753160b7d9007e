use std::collections::HashSet;

use crate::error::{Result, TopologyError};
use crate::topology::{Arrangement, Dir, HalfEdgeId};

/// Checks the structural invariants of an arrangement.
///
/// Verifies next/prev consistency, boundary-cycle closure, face-label
/// consistency along every cycle, and the Euler characteristic
/// `V - E + F = 1 + C` (`C` = connected components, isolated vertices
/// included), which reduces to the familiar `V - E + F = 2` for one
/// connected component.
pub struct ValidateArrangement;

impl ValidateArrangement {
    /// Creates a new `ValidateArrangement` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidTopology`] describing the first
    /// violated invariant, or [`TopologyError::CorruptedBoundary`] if a
    /// boundary walk fails to close.
    pub fn execute(&self, arr: &Arrangement) -> Result<()> {
        for eid in arr.edge_ids() {
            for dir in [Dir::Forward, Dir::Reverse] {
                let h = HalfEdgeId::new(eid, dir);
                let he = arr.half_edge(h)?;
                let next = arr.half_edge(he.next)?;
                if next.prev != h {
                    return Err(TopologyError::InvalidTopology(
                        "next/prev links are not inverse".into(),
                    )
                    .into());
                }
                // The next half-edge must continue from this one's target.
                if arr.half_edge(h.twin())?.origin != next.origin {
                    return Err(TopologyError::InvalidTopology(
                        "boundary is not vertex-continuous".into(),
                    )
                    .into());
                }
            }
        }

        for (fid, f) in arr.faces() {
            if f.is_unbounded() && fid != arr.unbounded_face() {
                return Err(TopologyError::InvalidTopology(
                    "a second face has no outer boundary".into(),
                )
                .into());
            }
            for &start in &f.boundary {
                for h in arr.ccb_cycle(start)? {
                    if arr.half_edge(h)?.face != fid {
                        return Err(TopologyError::InvalidTopology(
                            "boundary cycle crosses into another face".into(),
                        )
                        .into());
                    }
                }
            }
        }

        let v = i64::try_from(arr.vertex_count()).unwrap_or(i64::MAX);
        let e = i64::try_from(arr.edge_count()).unwrap_or(i64::MAX);
        let f = i64::try_from(arr.face_count()).unwrap_or(i64::MAX);
        let c = i64::try_from(component_count(arr)).unwrap_or(i64::MAX);
        if v - e + f != 1 + c {
            return Err(TopologyError::InvalidTopology(format!(
                "Euler characteristic violated: V={v} E={e} F={f} C={c}"
            ))
            .into());
        }
        Ok(())
    }
}

impl Default for ValidateArrangement {
    fn default() -> Self {
        Self::new()
    }
}

/// Connected components of the incidence graph; isolated vertices count.
fn component_count(arr: &Arrangement) -> usize {
    let distinct: HashSet<usize> = arr.vertex_components().values().copied().collect();
    distinct.len()
}
