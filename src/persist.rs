use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::Error,
    lattice::{ControlLattice, LatticeDims},
};

/// Line written after the last control point of a lattice file.
pub const TRAILER: &str = "##################################";

/// How strictly a lattice file is checked while loading.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Skip control point lines that cannot be parsed, and accept any number
    /// of control points regardless of the declared dimensions.
    #[default]
    Permissive,
    /// Reject files with unparsable control point lines, or with a number of
    /// control points different from `rows * cols`.
    Strict,
}

/// Write the lattice in the text format read by [`parse_lattice`].
pub fn write_lattice<W: Write>(lattice: &ControlLattice, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{}", lattice.rows())?;
    writeln!(out, "{}", lattice.cols())?;
    for cp in lattice.points() {
        writeln!(out, "{} {}", cp.x, cp.y)?;
    }
    writeln!(out, "{TRAILER}")
}

fn parse_header(line: Option<&str>, lineno: usize) -> Result<usize, Error> {
    line.and_then(|l| l.split_whitespace().next())
        .and_then(|token| token.parse::<usize>().ok())
        .ok_or(Error::MalformedHeader(lineno))
}

fn parse_point(line: &str) -> Option<Vec2> {
    let mut tokens = line.split_whitespace().map(str::parse::<f32>);
    match (tokens.next(), tokens.next()) {
        (Some(Ok(x)), Some(Ok(y))) => Some(Vec2::new(x, y)),
        _ => None,
    }
}

/// Parse the text of a lattice file.
///
/// The first line holds the number of rows, and the first token of the second
/// line holds the number of columns. Every following line that is at least 2
/// characters long and does not start with `#` is a control point, `x y`.
pub fn parse_lattice(text: &str, policy: LoadPolicy) -> Result<(LatticeDims, Vec<Vec2>), Error> {
    let mut lines = text.lines();
    let rows = parse_header(lines.next(), 1)?;
    let cols = parse_header(lines.next(), 2)?;
    let dims = LatticeDims::new(rows, cols)?;
    // The header is not trusted for sizing, every point takes at least 4 bytes.
    let mut points = Vec::with_capacity(dims.num_points().min(text.len() / 4));
    // Line numbers are 1-based, and the header took two lines.
    for (lineno, line) in lines.enumerate().map(|(i, l)| (i + 3, l)) {
        if line.len() < 2 || line.starts_with('#') {
            continue;
        }
        match (parse_point(line), policy) {
            (Some(p), _) => points.push(p),
            (None, LoadPolicy::Strict) => return Err(Error::MalformedPoint(lineno)),
            (None, LoadPolicy::Permissive) => {
                warn!(lineno, line, "skipping malformed control point");
            }
        }
    }
    if points.len() != dims.num_points() {
        match policy {
            LoadPolicy::Strict => {
                return Err(Error::PointCountMismatch {
                    expected: dims.num_points(),
                    found: points.len(),
                });
            }
            LoadPolicy::Permissive => warn!(
                expected = dims.num_points(),
                found = points.len(),
                "control point count does not match the lattice dimensions"
            ),
        }
    }
    Ok((dims, points))
}

impl ControlLattice {
    /// Save the control points to `path`. Nothing is written if the file
    /// cannot be created.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut out = BufWriter::new(file);
        write_lattice(self, &mut out)
            .and_then(|_| out.flush())
            .map_err(|e| Error::io(path, e))?;
        info!(path = %path.display(), points = self.num_points(), "saved lattice");
        Ok(())
    }

    /// Load control points from `path`. On failure the lattice is left
    /// unchanged. On success the selection is cleared.
    ///
    /// With [`LoadPolicy::Permissive`] the number of loaded control points may
    /// not match the declared dimensions; see [`ControlLattice::is_consistent`].
    pub fn load(&mut self, path: impl AsRef<Path>, policy: LoadPolicy) -> Result<(), Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let (dims, points) = parse_lattice(&text, policy)?;
        info!(
            path = %path.display(),
            rows = dims.rows(),
            cols = dims.cols(),
            points = points.len(),
            "loaded lattice"
        );
        self.replace(dims, points);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use glam::vec2;

    use super::{LoadPolicy, TRAILER, parse_lattice, write_lattice};
    use crate::{
        error::Error,
        lattice::{ControlLattice, LatticeDims},
    };

    fn edited_lattice() -> ControlLattice {
        let mut lattice = ControlLattice::new(3, 4).expect("Cannot create lattice");
        lattice.find_closest(vec2(-1.0 / 3.0, 0.0));
        assert!(lattice.move_selected(vec2(0.123_456_79, -0.3)));
        lattice.find_closest(vec2(1.0, 1.0));
        assert!(lattice.move_selected(vec2(1.7, 2.25e-3)));
        lattice
    }

    #[test]
    fn t_write_format() {
        let lattice = ControlLattice::new(2, 2).expect("Cannot create lattice");
        let mut buf = Vec::new();
        write_lattice(&lattice, &mut buf).expect("Cannot write lattice");
        let text = String::from_utf8(buf).expect("Lattice file is not utf8");
        assert_eq!(text, format!("2\n2\n-1 -1\n1 -1\n-1 1\n1 1\n{TRAILER}\n"));
        assert_eq!(TRAILER.len(), 34);
    }

    #[test]
    fn t_round_trip_in_memory() {
        let lattice = edited_lattice();
        let mut buf = Vec::new();
        write_lattice(&lattice, &mut buf).expect("Cannot write lattice");
        let text = String::from_utf8(buf).expect("Lattice file is not utf8");
        let (dims, points) = parse_lattice(&text, LoadPolicy::Strict).expect("Cannot parse");
        assert_eq!(dims, lattice.dims());
        assert_eq!(points, lattice.points());
    }

    #[test]
    fn t_round_trip_file() {
        let dir = tempfile::tempdir().expect("Cannot create temp dir");
        let path = dir.path().join("cps.txt");
        let lattice = edited_lattice();
        lattice.save(&path).expect("Cannot save lattice");
        let mut loaded = ControlLattice::new(5, 5).expect("Cannot create lattice");
        loaded.find_closest(vec2(0.0, 0.0));
        loaded
            .load(&path, LoadPolicy::Permissive)
            .expect("Cannot load lattice");
        assert_eq!(loaded.dims(), LatticeDims::new(3, 4).expect("Valid dims"));
        assert_eq!(loaded.points(), lattice.points());
        assert_eq!(loaded.selected(), None);
        assert!(loaded.is_consistent());
    }

    #[test]
    fn t_short_file_is_tolerated() {
        let text = "3\n3\n-1 -1\n0 -1\n1 -1\n-1 0\n";
        let (dims, points) = parse_lattice(text, LoadPolicy::Permissive).expect("Cannot parse");
        assert_eq!(dims, LatticeDims::new(3, 3).expect("Valid dims"));
        assert_eq!(points.len(), 4);

        let dir = tempfile::tempdir().expect("Cannot create temp dir");
        let path = dir.path().join("short.txt");
        std::fs::write(&path, text).expect("Cannot write file");
        let mut lattice = ControlLattice::new(2, 2).expect("Cannot create lattice");
        lattice
            .load(&path, LoadPolicy::Permissive)
            .expect("Cannot load lattice");
        assert_eq!(lattice.rows(), 3);
        assert_eq!(lattice.cols(), 3);
        assert_eq!(lattice.num_points(), 4);
        assert!(!lattice.is_consistent());
        // Reset restores the invariant.
        lattice.reset();
        assert_eq!(lattice.num_points(), 9);
    }

    #[test]
    fn t_strict_rejects_mismatch() {
        let text = "3\n3\n-1 -1\n0 -1\n1 -1\n-1 0\n";
        assert!(matches!(
            parse_lattice(text, LoadPolicy::Strict),
            Err(Error::PointCountMismatch {
                expected: 9,
                found: 4
            })
        ));
    }

    #[test]
    fn t_huge_header() {
        for text in [
            "4294967296\n4294967296\n-1 -1\n",
            "3037000499\n3037000499\n-1 -1\n",
            "65536\n65537\n-1 -1\n",
        ] {
            for policy in [LoadPolicy::Permissive, LoadPolicy::Strict] {
                assert!(matches!(
                    parse_lattice(text, policy),
                    Err(Error::InvalidDimensions { .. })
                ));
            }
        }
        // Addressable, but far more points than the file holds.
        let text = "65536\n65535\n-1 -1\n";
        let (dims, points) = parse_lattice(text, LoadPolicy::Permissive).expect("Cannot parse");
        assert_eq!((dims.rows(), dims.cols()), (65536, 65535));
        assert_eq!(points, vec![vec2(-1.0, -1.0)]);
        assert!(matches!(
            parse_lattice(text, LoadPolicy::Strict),
            Err(Error::PointCountMismatch { found: 1, .. })
        ));
        // A failed load leaves the lattice as it was.
        let dir = tempfile::tempdir().expect("Cannot create temp dir");
        let path = dir.path().join("huge.txt");
        std::fs::write(&path, "4294967296\n4294967296\n-1 -1\n").expect("Cannot write file");
        let mut lattice = edited_lattice();
        let before = lattice.points().to_vec();
        assert!(lattice.load(&path, LoadPolicy::Permissive).is_err());
        assert_eq!(lattice.points(), before);
        assert_eq!(lattice.dims(), LatticeDims::new(3, 4).expect("Valid dims"));
    }

    #[test]
    fn t_skipped_lines() {
        let text = "2 \n2 trailing words\n\n# comment\n-1 -1\n1 -1\nx\n-1 1\n1 1\n####\n";
        let (dims, points) = parse_lattice(text, LoadPolicy::Strict).expect("Cannot parse");
        assert_eq!(dims, LatticeDims::new(2, 2).expect("Valid dims"));
        assert_eq!(
            points,
            vec![
                vec2(-1.0, -1.0),
                vec2(1.0, -1.0),
                vec2(-1.0, 1.0),
                vec2(1.0, 1.0)
            ]
        );
    }

    #[test]
    fn t_malformed_point() {
        let text = "2\n2\n-1 -1\n1 oops\n-1 1\n1 1\n";
        assert!(matches!(
            parse_lattice(text, LoadPolicy::Strict),
            Err(Error::MalformedPoint(4))
        ));
        let (_, points) = parse_lattice(text, LoadPolicy::Permissive).expect("Cannot parse");
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn t_malformed_header() {
        assert!(matches!(
            parse_lattice("", LoadPolicy::Permissive),
            Err(Error::MalformedHeader(1))
        ));
        assert!(matches!(
            parse_lattice("3\nthree\n", LoadPolicy::Permissive),
            Err(Error::MalformedHeader(2))
        ));
        assert!(matches!(
            parse_lattice("1\n3\n", LoadPolicy::Permissive),
            Err(Error::InvalidDimensions { rows: 1, cols: 3 })
        ));
    }

    #[test]
    fn t_failed_load_leaves_lattice() {
        let dir = tempfile::tempdir().expect("Cannot create temp dir");
        let mut lattice = edited_lattice();
        let before = lattice.points().to_vec();
        assert!(matches!(
            lattice.load(dir.path().join("missing.txt"), LoadPolicy::Permissive),
            Err(Error::Io { .. })
        ));
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "not a lattice\n").expect("Cannot write file");
        assert!(lattice.load(&path, LoadPolicy::Permissive).is_err());
        assert_eq!(lattice.points(), before);
        assert_eq!(lattice.dims(), LatticeDims::new(3, 4).expect("Valid dims"));
    }

    #[test]
    fn t_save_to_unopenable_path() {
        let dir = tempfile::tempdir().expect("Cannot create temp dir");
        let path = dir.path().join("no").join("such").join("cps.txt");
        let lattice = ControlLattice::new(2, 2).expect("Cannot create lattice");
        assert!(matches!(lattice.save(&path), Err(Error::Io { .. })));
        assert!(!path.exists());
    }
}
