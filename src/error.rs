use std::path::PathBuf;

use crate::lattice::LatticeDims;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Lattice.
    #[error("invalid lattice of {rows} x {cols}, needs at least 2 rows and 2 columns and at most u32::MAX points")]
    InvalidDimensions { rows: usize, cols: usize },
    // Lattice files.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed lattice header on line {0}")]
    MalformedHeader(usize),
    #[error("malformed control point on line {0}")]
    MalformedPoint(usize),
    #[error("lattice file declares {expected} control points but contains {found}")]
    PointCountMismatch { expected: usize, found: usize },
    // Obj.
    #[error("failed to load obj file: {0}")]
    ObjLoadFailed(String),
    #[error("position buffer of length {0} is not a multiple of 3")]
    IncorrectNumberOfCoordinates(usize),
    #[error("index buffer of length {0} does not describe triangles")]
    IncorrectIndexCount(usize),
    #[error("vertex index {0} is out of bounds")]
    OutOfBoundsAccess(u32),
    // Deformation.
    #[error("binding was computed for a {bound:?} lattice, but the lattice is {current:?}")]
    BindingMismatch {
        bound: LatticeDims,
        current: LatticeDims,
    },
    #[error("lattice should have {expected} control points but has {found}")]
    InconsistentLattice { expected: usize, found: usize },
    // Other.
    #[error("mismatched array lengths: {0} and {1}")]
    MismatchedArrayLengths(usize, usize),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
