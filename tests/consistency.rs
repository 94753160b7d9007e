//! End-to-end properties: the demo pipeline, cross-strategy agreement of
//! the four point-location algorithms, insertion-order independence, and
//! the persistence round trip.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use flatland::geometry::Segment2;
use flatland::location::{
    LandmarksLocator, Location, NaiveLocator, PointLocator, TrapezoidLocator, WalkLocator,
};
use flatland::math::Point2;
use flatland::operations::{BuildArrangement, ConvexHull, IntersectionSweep, ValidateArrangement};
use flatland::topology::Arrangement;

fn p(x: f64, y: f64) -> Point2 {
    Point2::new(x, y)
}

fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment2 {
    Segment2::new(p(ax, ay), p(bx, by)).unwrap()
}

/// Sorted vertex point list and sorted undirected edge list, comparable
/// across arrangements with different internal identifiers.
fn signature(arr: &Arrangement) -> (Vec<String>, Vec<String>) {
    let fmt = |q: Point2| format!("{},{}", q.x, q.y);
    let mut vs: Vec<String> = arr.vertices().map(|(_, v)| fmt(v.point)).collect();
    vs.sort();
    let mut es: Vec<String> = arr
        .edge_ids()
        .map(|e| {
            let (u, v) = arr.edge_endpoints(e).unwrap();
            let (a, b) = (fmt(u), fmt(v));
            if a <= b {
                format!("{a}|{b}")
            } else {
                format!("{b}|{a}")
            }
        })
        .collect();
    es.sort();
    (vs, es)
}

/// Runs all four strategies and asserts they classify `q` identically.
fn consensus(arr: &Arrangement, q: Point2) -> Location {
    let naive = NaiveLocator::new(arr).locate(q).unwrap();
    let walk = WalkLocator::new(arr).locate(q).unwrap();
    let landmarks = LandmarksLocator::new(arr).locate(q).unwrap();
    let trapezoid = TrapezoidLocator::new(arr).unwrap().locate(q).unwrap();
    assert_eq!(naive, walk, "walk disagrees at {q:?}");
    assert_eq!(naive, landmarks, "landmarks disagrees at {q:?}");
    assert_eq!(naive, trapezoid, "trapezoid disagrees at {q:?}");
    naive
}

#[test]
fn demo_pipeline_hull_to_arrangement_to_queries() {
    // Hull of a noisy square; interior points must not survive.
    let cloud = vec![
        p(0.0, 0.0),
        p(6.0, 0.0),
        p(6.0, 6.0),
        p(0.0, 6.0),
        p(3.0, 2.0),
        p(2.0, 4.0),
    ];
    let hull = ConvexHull::new(cloud).execute().unwrap();
    assert_eq!(hull.len(), 4);

    // Hull edges (with the closing edge) feed the arrangement.
    let mut edges = Vec::new();
    for i in 0..hull.len() {
        edges.push(Segment2::new(hull[i], hull[(i + 1) % hull.len()]).unwrap());
    }
    // The ring only touches at shared endpoints.
    assert_eq!(IntersectionSweep::new(edges.clone()).execute().len(), 4);

    let arr = BuildArrangement::new(edges).execute().unwrap();
    ValidateArrangement::new().execute(&arr).unwrap();
    assert_eq!(arr.vertex_count(), 4);
    assert_eq!(arr.edge_count(), 4);
    assert_eq!(arr.face_count(), 2);

    match consensus(&arr, p(3.0, 3.0)) {
        Location::Face(f) => assert_ne!(f, arr.unbounded_face()),
        other => panic!("expected interior face, got {other:?}"),
    }
    assert_eq!(consensus(&arr, p(7.0, 7.0)), Location::Face(arr.unbounded_face()));
    assert!(matches!(consensus(&arr, p(3.0, 0.0)), Location::Edge(_)));
    assert!(matches!(consensus(&arr, p(0.0, 0.0)), Location::Vertex(_)));
}

#[test]
fn strategies_agree_across_a_dense_grid() {
    let arr = BuildArrangement::new(vec![
        seg(0.0, 0.0, 4.0, 0.0),
        seg(4.0, 0.0, 4.0, 4.0),
        seg(4.0, 4.0, 0.0, 4.0),
        seg(0.0, 4.0, 0.0, 0.0),
        seg(0.0, 0.0, 4.0, 4.0),
        seg(0.0, 4.0, 4.0, 0.0),
        seg(2.0, 0.0, 2.0, 4.0),
    ])
    .execute()
    .unwrap();
    ValidateArrangement::new().execute(&arr).unwrap();
    for ix in -1..=9 {
        for iy in -1..=9 {
            consensus(&arr, p(f64::from(ix) * 0.5, f64::from(iy) * 0.5));
        }
    }
}

#[test]
fn crossing_vertex_never_degrades_to_a_face() {
    let arr = BuildArrangement::new(vec![
        seg(0.0, 0.0, 4.0, 4.0),
        seg(0.0, 4.0, 4.0, 0.0),
        seg(2.0, 0.0, 2.0, 4.0),
    ])
    .execute()
    .unwrap();
    // (2, 2) is a crossing of three segments and an arrangement vertex.
    let v = arr.vertex_at(p(2.0, 2.0)).unwrap();
    assert_eq!(consensus(&arr, p(2.0, 2.0)), Location::Vertex(v));
}

#[test]
fn nested_components_inside_a_bounded_face() {
    // A box containing a floating segment and a floating square, none of
    // them touching the box.
    let arr = BuildArrangement::new(vec![
        seg(0.0, 0.0, 10.0, 0.0),
        seg(10.0, 0.0, 10.0, 10.0),
        seg(10.0, 10.0, 0.0, 10.0),
        seg(0.0, 10.0, 0.0, 0.0),
        seg(1.0, 5.0, 2.0, 5.0),
        seg(4.0, 4.0, 6.0, 4.0),
        seg(6.0, 4.0, 6.0, 6.0),
        seg(6.0, 6.0, 4.0, 6.0),
        seg(4.0, 6.0, 4.0, 4.0),
    ])
    .execute()
    .unwrap();
    ValidateArrangement::new().execute(&arr).unwrap();

    let inner = consensus(&arr, p(5.0, 5.0));
    let ring = consensus(&arr, p(8.0, 8.0));
    assert!(matches!(inner, Location::Face(_)));
    assert!(matches!(ring, Location::Face(_)));
    assert_ne!(inner, ring, "nested square must be its own face");
    assert_ne!(ring, Location::Face(arr.unbounded_face()));
    assert!(matches!(consensus(&arr, p(1.5, 5.0)), Location::Edge(_)));
    assert_eq!(
        consensus(&arr, p(11.0, 5.0)),
        Location::Face(arr.unbounded_face())
    );

    // The floating pieces survive a round trip through the text format.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested.txt");
    flatland::storage::save_arrangement(&path, &arr).unwrap();
    let loaded = flatland::storage::load_arrangement(&path).unwrap();
    assert_eq!(signature(&arr), signature(&loaded));
}

#[test]
fn persistence_round_trip_preserves_query_classification() {
    let arr = BuildArrangement::new(vec![
        seg(1.0, 1.0, 10.0, 10.0),
        seg(1.0, 10.0, 10.0, 1.0),
        seg(1.0, 1.0, 10.0, 1.0),
        seg(10.0, 1.0, 10.0, 10.0),
    ])
    .execute()
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arrangement.txt");
    flatland::storage::save_arrangement(&path, &arr).unwrap();
    let loaded = flatland::storage::load_arrangement(&path).unwrap();

    assert_eq!(signature(&arr), signature(&loaded));
    ValidateArrangement::new().execute(&loaded).unwrap();

    // Same classification kinds on both sides of the round trip.
    for q in [p(5.5, 5.5), p(5.0, 2.0), p(0.0, 0.0), p(5.5, 2.0)] {
        let before = consensus(&arr, q);
        let after = consensus(&loaded, q);
        assert_eq!(
            std::mem::discriminant(&before),
            std::mem::discriminant(&after),
            "classification changed across round trip at {q:?}"
        );
    }
}

fn grid_segment() -> impl Strategy<Value = Segment2> {
    let coord = 0i32..7;
    (coord.clone(), coord.clone(), coord.clone(), coord)
        .prop_filter_map("degenerate", |(ax, ay, bx, by)| {
            Segment2::new(
                p(f64::from(ax), f64::from(ay)),
                p(f64::from(bx), f64::from(by)),
            )
            .ok()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn insertion_order_is_irrelevant(
        segs in prop::collection::vec(grid_segment(), 1..6),
    ) {
        let forward = BuildArrangement::new(segs.clone()).execute().unwrap();
        let mut reversed = segs.clone();
        reversed.reverse();
        let backward = BuildArrangement::new(reversed).execute().unwrap();
        let mut rotated = segs.clone();
        rotated.rotate_left(segs.len() / 2);
        let middle = BuildArrangement::new(rotated).execute().unwrap();
        prop_assert_eq!(signature(&forward), signature(&backward));
        prop_assert_eq!(signature(&forward), signature(&middle));
        ValidateArrangement::new().execute(&forward).unwrap();
    }

    #[test]
    fn locators_agree_on_random_arrangements(
        segs in prop::collection::vec(grid_segment(), 1..6),
        queries in prop::collection::vec((0i32..13, 0i32..13), 1..8),
    ) {
        let arr = BuildArrangement::new(segs).execute().unwrap();
        for (qx, qy) in queries {
            consensus(&arr, p(f64::from(qx) * 0.5, f64::from(qy) * 0.5));
        }
    }
}
