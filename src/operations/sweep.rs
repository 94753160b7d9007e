use std::cmp::Ordering;
use std::collections::BTreeMap;

use ordered_float::NotNan;
use tracing::debug;

use crate::geometry::Segment2;
use crate::math::exact::{self, rational};
use crate::math::predicates::{lex_cmp, orientation, point_on_segment, Orientation};
use crate::math::Point2;

type EventKey = (NotNan<f64>, NotNan<f64>);

/// Coordinates are finite by construction (`Segment2` rejects the rest, and
/// constructed crossings stay inside both bounding boxes).
fn event_key(p: Point2) -> EventKey {
    debug_assert!(p.x.is_finite() && p.y.is_finite());
    (
        NotNan::new(p.x).unwrap_or_default(),
        NotNan::new(p.y).unwrap_or_default(),
    )
}

#[derive(Debug, Default)]
struct Event {
    /// Segments whose lexicographically-left endpoint is this point.
    starting: Vec<usize>,
    /// Segments recorded by an adjacency check as crossing here. The exact
    /// containment test rediscovers most of these; the list keeps segments
    /// whose crossing point moved off them by the final rounding step.
    crossing: Vec<usize>,
}

/// Reports every point where at least two input segments meet.
///
/// Left-to-right plane sweep over endpoint and crossing events. The sweep
/// status holds the segments active at the sweep position in their exact
/// vertical order; only neighbouring entries are tested for intersection,
/// and every event where two or more segments meet is reported once,
/// including endpoint touches and the endpoints of collinear overlaps.
pub struct IntersectionSweep {
    segments: Vec<Segment2>,
}

impl IntersectionSweep {
    /// Creates a new `IntersectionSweep` operation.
    #[must_use]
    pub fn new(segments: Vec<Segment2>) -> Self {
        Self { segments }
    }

    /// Executes the sweep, returning the distinct meeting points in
    /// lexicographic order.
    #[must_use]
    pub fn execute(&self) -> Vec<Point2> {
        let segs: Vec<(Point2, Point2)> =
            self.segments.iter().map(Segment2::lex_endpoints).collect();

        let mut queue: BTreeMap<EventKey, Event> = BTreeMap::new();
        for (i, (l, r)) in segs.iter().enumerate() {
            queue.entry(event_key(*l)).or_default().starting.push(i);
            queue.entry(event_key(*r)).or_default();
        }

        let mut status: Vec<usize> = Vec::new();
        let mut out: Vec<Point2> = Vec::new();

        while let Some(((kx, ky), ev)) = queue.pop_first() {
            let p = Point2::new(kx.into_inner(), ky.into_inner());

            let mut ending: Vec<usize> = Vec::new();
            let mut passing: Vec<usize> = Vec::new();
            for &i in &status {
                let (l, r) = segs[i];
                if r == p {
                    ending.push(i);
                } else if (p != l && point_on_segment(p, l, r)) || ev.crossing.contains(&i) {
                    passing.push(i);
                }
            }

            if ev.starting.len() + ending.len() + passing.len() >= 2 {
                out.push(p);
            }

            status.retain(|i| !ending.contains(i) && !passing.contains(i));

            // Segments strictly below p keep their place; everything that
            // goes through p re-enters in its order just right of p.
            let px = rational(p.x);
            let py = rational(p.y);
            let insert_at = status.partition_point(|&i| {
                let (l, r) = segs[i];
                exact::y_at(l, r, &px) < py
            });

            let mut entering: Vec<usize> = ev.starting.clone();
            entering.extend(passing.iter().copied());
            entering.sort_unstable();
            entering.dedup();
            entering.sort_by(|&i, &j| cmp_direction_above(p, segs[i].1, segs[j].1));

            for (k, &i) in entering.iter().enumerate() {
                status.insert(insert_at + k, i);
            }

            if entering.is_empty() {
                if insert_at > 0 && insert_at < status.len() {
                    enqueue_crossing(
                        &segs,
                        status[insert_at - 1],
                        status[insert_at],
                        p,
                        &mut queue,
                    );
                }
            } else {
                if insert_at > 0 {
                    enqueue_crossing(&segs, status[insert_at - 1], status[insert_at], p, &mut queue);
                }
                let top = insert_at + entering.len() - 1;
                if top + 1 < status.len() {
                    enqueue_crossing(&segs, status[top], status[top + 1], p, &mut queue);
                }
            }
        }

        debug!(
            segments = self.segments.len(),
            points = out.len(),
            "intersection sweep complete"
        );
        out
    }
}

/// Orders two segments through `p` by their direction just right of `p`:
/// smaller slope below, vertical on top.
fn cmp_direction_above(p: Point2, ri: Point2, rj: Point2) -> Ordering {
    match orientation(p, ri, rj) {
        Orientation::CounterClockwise => Ordering::Less,
        Orientation::Clockwise => Ordering::Greater,
        Orientation::Collinear => lex_cmp(ri, rj),
    }
}

fn enqueue_crossing(
    segs: &[(Point2, Point2)],
    i: usize,
    j: usize,
    p: Point2,
    queue: &mut BTreeMap<EventKey, Event>,
) {
    let (li, ri) = segs[i];
    let (lj, rj) = segs[j];
    if let Some(x) = exact::segment_intersection(li, ri, lj, rj) {
        if lex_cmp(x, p) == Ordering::Greater {
            let ev = queue.entry(event_key(x)).or_default();
            ev.crossing.push(i);
            ev.crossing.push(j);
        }
    }
}
