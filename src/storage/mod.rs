//! Line-oriented text persistence for arrangements, plus the point and
//! segment file loaders that feed the demo pipeline.
//!
//! Point format: one `<x>,<y>` per line, where `x` is everything before the
//! first comma and `y` everything after it. An arrangement file is the vertex list,
//! a separator line, then one block per face: either the literal
//! `Unbounded` or the outer boundary as consecutive source/target pairs,
//! each block closed by the separator.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::geometry::Segment2;
use crate::math::Point2;
use crate::topology::Arrangement;

const FACE_SEPARATOR: &str = "----------------------";
const UNBOUNDED_MARKER: &str = "Unbounded";

fn malformed(line: usize, content: &str) -> StorageError {
    StorageError::MalformedRecord {
        line,
        content: content.to_string(),
    }
}

fn parse_point(text: &str, line_no: usize) -> Result<Point2> {
    let Some((xs, ys)) = text.split_once(',') else {
        return Err(malformed(line_no, text).into());
    };
    let x = xs
        .trim()
        .parse::<f64>()
        .map_err(|_| malformed(line_no, text))?;
    let y = ys
        .trim()
        .parse::<f64>()
        .map_err(|_| malformed(line_no, text))?;
    Ok(Point2::new(x, y))
}

fn format_point(p: Point2) -> String {
    format!("{},{}", p.x, p.y)
}

/// Reads a point-list file: one `<x>,<y>` per line, blank lines ignored.
///
/// # Errors
///
/// Returns [`StorageError::Resource`] if the file cannot be read and
/// [`StorageError::MalformedRecord`] for a line that does not parse.
pub fn read_points(path: &Path) -> Result<Vec<Point2>> {
    let file = File::open(path).map_err(StorageError::Resource)?;
    let mut out = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(StorageError::Resource)?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        out.push(parse_point(text, i + 1)?);
    }
    Ok(out)
}

/// Pairs consecutive points into segments: lines 1–2 form the first
/// segment, lines 3–4 the second, and so on.
///
/// # Errors
///
/// Returns [`StorageError::MalformedRecord`] for an odd number of points
/// and a geometry error for a degenerate pair.
pub fn segments_from_points(points: &[Point2]) -> Result<Vec<Segment2>> {
    if points.len() % 2 != 0 {
        return Err(malformed(points.len(), "unpaired segment endpoint").into());
    }
    points
        .chunks_exact(2)
        .map(|pair| Segment2::new(pair[0], pair[1]))
        .collect()
}

/// Reads a segment file: the point format with lines paired consecutively.
///
/// # Errors
///
/// Propagates the conditions of [`read_points`] and
/// [`segments_from_points`].
pub fn read_segments(path: &Path) -> Result<Vec<Segment2>> {
    segments_from_points(&read_points(path)?)
}

/// Writes a convex hull as consecutive edge endpoint pairs, covering every
/// hull edge including the closing one.
///
/// # Errors
///
/// Returns [`StorageError::Resource`] if the file cannot be written.
pub fn write_hull(path: &Path, hull: &[Point2]) -> Result<()> {
    let mut tmp = open_temp(path)?;
    {
        let f = tmp.as_file_mut();
        let n = hull.len();
        for i in 0..n {
            writeln!(f, "{}", format_point(hull[i])).map_err(StorageError::Resource)?;
            writeln!(f, "{}", format_point(hull[(i + 1) % n])).map_err(StorageError::Resource)?;
        }
    }
    persist(tmp, path)?;
    Ok(())
}

/// Saves an arrangement: vertex list, separator, then one boundary block
/// per face. The write goes to a temporary file in the target directory and
/// is finalized atomically, so a failed save leaves no partial file behind.
///
/// # Errors
///
/// Returns [`StorageError::Resource`] on any I/O failure and a topology
/// error if a boundary walk fails to close.
pub fn save_arrangement(path: &Path, arr: &Arrangement) -> Result<()> {
    let mut tmp = open_temp(path)?;
    write_arrangement(tmp.as_file_mut(), arr)?;
    persist(tmp, path)?;
    debug!(
        path = %path.display(),
        vertices = arr.vertex_count(),
        faces = arr.face_count(),
        "arrangement saved"
    );
    Ok(())
}

fn write_arrangement(f: &mut File, arr: &Arrangement) -> Result<()> {
    for (_, v) in arr.vertices() {
        writeln!(f, "{}", format_point(v.point)).map_err(StorageError::Resource)?;
    }
    writeln!(f, "{FACE_SEPARATOR}").map_err(StorageError::Resource)?;
    for (_, face) in arr.faces() {
        // The unbounded face keeps its sentinel; its boundary cycles follow
        // so edges bordering no bounded face still survive a round trip.
        if face.is_unbounded() {
            writeln!(f, "{UNBOUNDED_MARKER}").map_err(StorageError::Resource)?;
        }
        for &start in &face.boundary {
            for h in arr.ccb_cycle(start)? {
                let (s, t) = arr.halfedge_endpoints(h)?;
                writeln!(f, "{}", format_point(s)).map_err(StorageError::Resource)?;
                writeln!(f, "{}", format_point(t)).map_err(StorageError::Resource)?;
            }
        }
        writeln!(f, "{FACE_SEPARATOR}").map_err(StorageError::Resource)?;
    }
    Ok(())
}

/// Loads an arrangement saved by [`save_arrangement`]: every vertex is
/// inserted as an isolated point, every boundary pair as a segment through
/// the regular construction path, so the loaded arrangement has the same
/// vertex set and undirected edge set as the saved one.
///
/// # Errors
///
/// Returns [`StorageError::Resource`] if the file cannot be read,
/// [`StorageError::MalformedRecord`] for an unparsable line or a face block
/// missing its terminating pair, and a geometry error for a degenerate
/// record.
pub fn load_arrangement(path: &Path) -> Result<Arrangement> {
    let file = File::open(path).map_err(StorageError::Resource)?;
    let mut arr = Arrangement::new();
    let mut in_faces = false;
    let mut lines = BufReader::new(file).lines().enumerate();
    while let Some((i, line)) = lines.next() {
        let line = line.map_err(StorageError::Resource)?;
        let text = line.trim();
        if text == FACE_SEPARATOR {
            in_faces = true;
            continue;
        }
        if text.is_empty() {
            continue;
        }
        if !in_faces {
            arr.insert_isolated_point(parse_point(text, i + 1)?)?;
            continue;
        }
        if text == UNBOUNDED_MARKER {
            continue;
        }
        let source = parse_point(text, i + 1)?;
        let Some((j, second)) = lines.next() else {
            return Err(malformed(i + 1, "face record missing its target point").into());
        };
        let second = second.map_err(StorageError::Resource)?;
        let text2 = second.trim();
        if text2 == FACE_SEPARATOR || text2 == UNBOUNDED_MARKER || text2.is_empty() {
            return Err(malformed(j + 1, text2).into());
        }
        let target = parse_point(text2, j + 1)?;
        arr.insert_segment(&Segment2::new(source, target)?)?;
    }
    debug!(
        path = %path.display(),
        vertices = arr.vertex_count(),
        edges = arr.edge_count(),
        faces = arr.face_count(),
        "arrangement loaded"
    );
    Ok(arr)
}

fn open_temp(path: &Path) -> Result<NamedTempFile> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(NamedTempFile::new_in(dir).map_err(StorageError::Resource)?)
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<()> {
    tmp.persist(path)
        .map_err(|e| StorageError::Resource(e.error))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::BuildArrangement;
    use std::io::Write as _;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment2 {
        Segment2::new(p(ax, ay), p(bx, by)).unwrap()
    }

    fn signature(arr: &Arrangement) -> (Vec<(String, String)>, Vec<Vec<String>>) {
        let mut vs: Vec<_> = arr
            .vertices()
            .map(|(_, v)| (v.point.x.to_string(), v.point.y.to_string()))
            .collect();
        vs.sort();
        let mut es: Vec<_> = arr
            .edge_ids()
            .map(|e| {
                let (u, v) = arr.edge_endpoints(e).unwrap();
                let mut pair = vec![format_point(u), format_point(v)];
                pair.sort();
                pair
            })
            .collect();
        es.sort();
        (vs, es)
    }

    #[test]
    fn round_trip_preserves_vertices_and_edges() {
        let arr = BuildArrangement::new(vec![
            seg(0.0, 0.0, 4.0, 0.0),
            seg(4.0, 0.0, 4.0, 4.0),
            seg(4.0, 4.0, 0.0, 4.0),
            seg(0.0, 4.0, 0.0, 0.0),
            seg(0.0, 0.0, 4.0, 4.0),
        ])
        .execute()
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arrangement.txt");
        save_arrangement(&path, &arr).unwrap();
        let loaded = load_arrangement(&path).unwrap();

        assert_eq!(signature(&arr), signature(&loaded));
        assert_eq!(arr.face_count(), loaded.face_count());
    }

    #[test]
    fn round_trip_keeps_fractional_crossings() {
        let arr = BuildArrangement::new(vec![
            seg(1.0, 1.0, 10.0, 10.0),
            seg(1.0, 10.0, 10.0, 1.0),
        ])
        .execute()
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arrangement.txt");
        save_arrangement(&path, &arr).unwrap();
        let loaded = load_arrangement(&path).unwrap();
        assert!(loaded.vertex_at(p(5.5, 5.5)).is_some());
        assert_eq!(signature(&arr), signature(&loaded));
    }

    #[test]
    fn point_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.txt");
        std::fs::write(&path, "1.5,2.25\n-3,0.5\n").unwrap();
        assert_eq!(read_points(&path).unwrap(), vec![p(1.5, 2.25), p(-3.0, 0.5)]);
    }

    #[test]
    fn segment_pairing_and_odd_count() {
        let pts = [p(0.0, 0.0), p(1.0, 0.0), p(2.0, 2.0), p(3.0, 3.0)];
        let segs = segments_from_points(&pts).unwrap();
        assert_eq!(segs.len(), 2);
        assert!(segments_from_points(&pts[..3]).is_err());
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.txt");
        std::fs::write(&path, "1,2\nnot-a-point\n").unwrap();
        let err = read_points(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn truncated_face_block_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arrangement.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "0,0").unwrap();
        writeln!(f, "1,0").unwrap();
        writeln!(f, "{FACE_SEPARATOR}").unwrap();
        writeln!(f, "0,0").unwrap();
        writeln!(f, "{FACE_SEPARATOR}").unwrap();
        drop(f);
        assert!(load_arrangement(&path).is_err());
    }

    #[test]
    fn missing_file_is_a_resource_error() {
        let err = read_points(Path::new("/nonexistent/flatland-points.txt")).unwrap_err();
        assert!(matches!(
            err,
            crate::FlatlandError::Storage(StorageError::Resource(_))
        ));
    }

    #[test]
    fn failed_save_leaves_no_file() {
        let arr = Arrangement::new();
        let path = Path::new("/nonexistent-dir/flatland/arrangement.txt");
        assert!(save_arrangement(path, &arr).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn hull_file_closes_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hull.txt");
        write_hull(&path, &[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]).unwrap();
        let pts = read_points(&path).unwrap();
        // Three edges, two endpoints each; the last pair closes the cycle.
        assert_eq!(pts.len(), 6);
        assert_eq!(pts[4], p(1.0, 1.0));
        assert_eq!(pts[5], p(0.0, 0.0));
    }
}
