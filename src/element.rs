use crate::lattice::LatticeDims;
use std::fmt::{Debug, Display};

/**
 * Control points and tiles of a lattice are identified by their flattened
 * row-major index.
 */
pub trait Handle {
    /**
     * The index of the element.
     */
    fn index(&self) -> u32;
}

/**
 * Control point handle.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CH {
    idx: u32,
}

/**
 * Tile handle. A tile is identified by the index of its lower-left control
 * point.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TH {
    idx: u32,
}

impl Handle for CH {
    fn index(&self) -> u32 {
        self.idx
    }
}

impl From<u32> for CH {
    fn from(idx: u32) -> Self {
        CH { idx }
    }
}

impl From<&u32> for CH {
    fn from(idx: &u32) -> Self {
        CH { idx: *idx }
    }
}

impl Handle for TH {
    fn index(&self) -> u32 {
        self.idx
    }
}

impl From<u32> for TH {
    fn from(idx: u32) -> Self {
        TH { idx }
    }
}

impl From<&u32> for TH {
    fn from(idx: &u32) -> Self {
        TH { idx: *idx }
    }
}

impl Display for CH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CH({})", self.index())
    }
}

impl Display for TH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TH({})", self.index())
    }
}

impl Debug for CH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CH({})", self.index())
    }
}

impl Debug for TH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TH({})", self.index())
    }
}

impl CH {
    /// The `(row, col)` of this control point in a lattice of the given
    /// dimensions.
    pub fn row_col(self, dims: LatticeDims) -> (usize, usize) {
        let i = self.idx as usize;
        (i / dims.cols(), i % dims.cols())
    }
}

impl TH {
    /// Flattened indices of the four corners of this tile, in the order
    /// lower-left, lower-right, upper-left, upper-right.
    /// ```text
    ///    2---3
    ///    |   |
    ///    0---1
    /// ```
    pub fn corners(self, dims: LatticeDims) -> [CH; 4] {
        let i = self.idx;
        let ncols = dims.cols() as u32;
        [
            i.into(),
            (i + 1).into(),
            (i + ncols).into(),
            (i + ncols + 1).into(),
        ]
    }

    /// Check if this tile exists in a lattice of the given dimensions, i.e. the
    /// handle refers to a control point that is not in the last row or the
    /// last column.
    pub fn is_valid(self, dims: LatticeDims) -> bool {
        let (row, col) = CH::from(self.idx).row_col(dims);
        row + 1 < dims.rows() && col + 1 < dims.cols()
    }
}
