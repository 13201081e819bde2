/*!
The control lattice that drives the deformation.

A lattice is a `rows x cols` grid of 2D control points stored in row-major
order. Two flavours exist:

+ [`ControlLattice`] is the live, editable lattice. The user picks and drags
  its control points, and the deformed positions of the mesh are solved
  against it.

+ [`ReferenceLattice`] is an immutable snapshot of the uniform rest layout
  covering `[-1, 1] x [-1, 1]`. Vertices are only ever bound to tiles of a
  reference lattice, because the bounding box containment test used for
  binding is only valid for axis aligned tiles.
*/

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    element::{CH, Handle, TH},
    error::Error,
};

/// Default radius within which a control point can be picked.
pub const PICK_RADIUS: f32 = 0.1;

/// Number of rows and columns of control points in a lattice.
///
/// Both are at least 2, and every control point can be addressed with a
/// [`CH`]. Deserializing goes through [`LatticeDims::new`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDims")]
pub struct LatticeDims {
    rows: usize,
    cols: usize,
}

#[derive(Deserialize)]
struct RawDims {
    rows: usize,
    cols: usize,
}

impl TryFrom<RawDims> for LatticeDims {
    type Error = Error;

    fn try_from(raw: RawDims) -> Result<Self, Error> {
        LatticeDims::new(raw.rows, raw.cols)
    }
}

impl LatticeDims {
    /// Validated dimensions. Both `rows` and `cols` must be at least 2, and
    /// `rows * cols` must fit in a `u32` index.
    pub fn new(rows: usize, cols: usize) -> Result<Self, Error> {
        let fits = rows
            .checked_mul(cols)
            .is_some_and(|n| n <= u32::MAX as usize);
        if rows < 2 || cols < 2 || !fits {
            return Err(Error::InvalidDimensions { rows, cols });
        }
        Ok(LatticeDims { rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn num_points(&self) -> usize {
        self.rows * self.cols
    }

    pub fn num_tiles(&self) -> usize {
        (self.rows - 1) * (self.cols - 1)
    }

    pub fn index_at(&self, row: usize, col: usize) -> CH {
        ((row * self.cols + col) as u32).into()
    }

    /// All control points, columns outer and rows inner.
    pub fn scan(self) -> impl Iterator<Item = CH> {
        (0..self.cols).flat_map(move |col| (0..self.rows).map(move |row| self.index_at(row, col)))
    }

    /// All tiles, columns outer and rows inner.
    pub fn tiles(self) -> impl Iterator<Item = TH> {
        (0..(self.cols - 1)).flat_map(move |col| {
            (0..(self.rows - 1)).map(move |row| TH::from(self.index_at(row, col).index()))
        })
    }

    /// Position of the control point at `(row, col)` in the uniform rest
    /// layout.
    pub fn uniform_point(&self, row: usize, col: usize) -> Vec2 {
        let x = -1.0 + col as f32 / (self.cols as f32 - 1.0) * 2.0;
        let y = -1.0 + row as f32 / (self.rows as f32 - 1.0) * 2.0;
        Vec2::new(x, y)
    }

    fn fill_uniform(&self, points: &mut Vec<Vec2>) {
        points.clear();
        points.extend(
            (0..self.rows)
                .flat_map(|row| (0..self.cols).map(move |col| (row, col)))
                .map(|(row, col)| self.uniform_point(row, col)),
        );
    }
}

fn corners_of(points: &[Vec2], dims: LatticeDims, tile: TH) -> [Vec2; 4] {
    debug_assert!(
        tile.index() as usize + dims.cols() + 1 < points.len(),
        "{tile} is not the lower-left corner of a tile"
    );
    tile.corners(dims).map(|c| points[c.index() as usize])
}

/// Immutable uniform layout used to bind vertices to tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLattice {
    dims: LatticeDims,
    points: Vec<Vec2>,
}

impl ReferenceLattice {
    pub fn new(rows: usize, cols: usize) -> Result<Self, Error> {
        Ok(Self::uniform(LatticeDims::new(rows, cols)?))
    }

    pub(crate) fn uniform(dims: LatticeDims) -> Self {
        let mut points = Vec::with_capacity(dims.num_points());
        dims.fill_uniform(&mut points);
        ReferenceLattice { dims, points }
    }

    pub fn dims(&self) -> LatticeDims {
        self.dims
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn point(&self, row: usize, col: usize) -> Vec2 {
        self.points[self.dims.index_at(row, col).index() as usize]
    }

    pub fn tiles(&self) -> impl Iterator<Item = TH> {
        self.dims.tiles()
    }

    /// Corners of `tile` in the order lower-left, lower-right, upper-left,
    /// upper-right.
    pub fn tile_corners(&self, tile: TH) -> [Vec2; 4] {
        corners_of(&self.points, self.dims, tile)
    }

    /// Axis aligned bounding box of `tile` as `(min, max)`.
    pub fn tile_bounds(&self, tile: TH) -> (Vec2, Vec2) {
        let corners = self.tile_corners(tile);
        corners[1..].iter().fold((corners[0], corners[0]), |(lo, hi), c| {
            (lo.min(*c), hi.max(*c))
        })
    }

    /// An editable lattice starting out in this layout.
    pub fn to_editable(&self) -> ControlLattice {
        ControlLattice {
            dims: self.dims,
            points: self.points.clone(),
            selected: None,
        }
    }
}

/// The live, editable control lattice.
#[derive(Debug, Clone)]
pub struct ControlLattice {
    dims: LatticeDims,
    points: Vec<Vec2>,
    selected: Option<CH>,
}

impl ControlLattice {
    /// Create a lattice with `rows x cols` control points in the uniform
    /// layout.
    pub fn new(rows: usize, cols: usize) -> Result<Self, Error> {
        let dims = LatticeDims::new(rows, cols)?;
        let mut lattice = ControlLattice {
            dims,
            points: Vec::with_capacity(dims.num_points()),
            selected: None,
        };
        lattice.reset();
        Ok(lattice)
    }

    /// Resize the lattice and reset it to the uniform layout. The lattice is
    /// left untouched if the dimensions are invalid.
    pub fn set_size(&mut self, rows: usize, cols: usize) -> Result<(), Error> {
        self.dims = LatticeDims::new(rows, cols)?;
        self.points.reserve(self.dims.num_points());
        self.reset();
        Ok(())
    }

    /// Move every control point back to the uniform layout over
    /// `[-1, 1] x [-1, 1]`, and clear the selection.
    pub fn reset(&mut self) {
        self.dims.fill_uniform(&mut self.points);
        self.selected = None;
        debug!(rows = self.dims.rows, cols = self.dims.cols, "lattice reset");
    }

    /// The uniform layout with the same dimensions as this lattice.
    pub fn reference(&self) -> ReferenceLattice {
        ReferenceLattice::uniform(self.dims)
    }

    pub fn dims(&self) -> LatticeDims {
        self.dims
    }

    pub fn rows(&self) -> usize {
        self.dims.rows
    }

    pub fn cols(&self) -> usize {
        self.dims.cols
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_tiles(&self) -> usize {
        self.dims.num_tiles()
    }

    pub fn index_at(&self, row: usize, col: usize) -> CH {
        self.dims.index_at(row, col)
    }

    pub fn tiles(&self) -> impl Iterator<Item = TH> {
        self.dims.tiles()
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn point(&self, row: usize, col: usize) -> Vec2 {
        self.points[self.index_at(row, col).index() as usize]
    }

    /// Whether the number of control points matches the declared dimensions.
    /// This only fails after permissively loading an inconsistent file.
    pub fn is_consistent(&self) -> bool {
        self.points.len() == self.dims.num_points()
    }

    pub fn selected(&self) -> Option<CH> {
        self.selected
    }

    pub fn selected_point(&self) -> Option<Vec2> {
        self.selected
            .and_then(|c| self.points.get(c.index() as usize).copied())
    }

    /// Select the control point closest to `p`, if it is closer than
    /// [`PICK_RADIUS`]. Otherwise the selection is cleared.
    pub fn find_closest(&mut self, p: Vec2) -> Option<CH> {
        self.find_closest_within(p, PICK_RADIUS)
    }

    /// Select the control point closest to `p`, if it is closer than
    /// `radius`. Otherwise the selection is cleared.
    ///
    /// Points are visited columns first. Among points at the same distance,
    /// the first one visited wins.
    pub fn find_closest_within(&mut self, p: Vec2, radius: f32) -> Option<CH> {
        let points = &self.points;
        self.selected = self
            .dims
            .scan()
            .filter_map(|c| points.get(c.index() as usize).map(|cp| (c, p.distance(*cp))))
            .fold((None, radius), |(best, dmin), (c, d)| {
                if d < dmin { (Some(c), d) } else { (best, dmin) }
            })
            .0;
        self.selected
    }

    /// Move the selected control point to `p`. Returns `false` and leaves the
    /// lattice untouched if nothing is selected.
    pub fn move_selected(&mut self, p: Vec2) -> bool {
        match self
            .selected
            .and_then(|c| self.points.get_mut(c.index() as usize))
        {
            Some(cp) => {
                *cp = p;
                true
            }
            None => false,
        }
    }

    /// Current positions of the corners of `tile`, in the order lower-left,
    /// lower-right, upper-left, upper-right.
    ///
    /// Panics if `tile` is not the lower-left corner of a tile.
    pub fn tile_corners(&self, tile: TH) -> [Vec2; 4] {
        corners_of(&self.points, self.dims, tile)
    }

    /// Replace the contents of the lattice wholesale. Used when loading from
    /// a file, where the number of points may disagree with `dims`.
    pub(crate) fn replace(&mut self, dims: LatticeDims, points: Vec<Vec2>) {
        self.dims = dims;
        self.points = points;
        self.selected = None;
    }
}

#[cfg(test)]
mod test {
    use glam::{Vec2, vec2};

    use super::{ControlLattice, LatticeDims, PICK_RADIUS, ReferenceLattice};
    use crate::{
        element::{Handle, TH},
        error::Error,
    };

    #[test]
    fn t_reset_layout() {
        for (rows, cols) in [(2usize, 2usize), (3, 5), (5, 5), (7, 4)] {
            let lattice = ControlLattice::new(rows, cols).expect("Cannot create lattice");
            assert_eq!(lattice.num_points(), rows * cols);
            for row in 0..rows {
                for col in 0..cols {
                    let expected = vec2(
                        -1.0 + col as f32 / (cols as f32 - 1.0) * 2.0,
                        -1.0 + row as f32 / (rows as f32 - 1.0) * 2.0,
                    );
                    assert_eq!(lattice.point(row, col), expected);
                }
            }
            assert_eq!(lattice.point(0, 0), vec2(-1.0, -1.0));
            assert_eq!(lattice.point(rows - 1, cols - 1), vec2(1.0, 1.0));
        }
    }

    #[test]
    fn t_reset_idempotent() {
        let mut lattice = ControlLattice::new(4, 3).expect("Cannot create lattice");
        lattice.find_closest(vec2(0.0, 1.0));
        lattice.move_selected(vec2(0.3, 0.2));
        lattice.reset();
        let first = lattice.points().to_vec();
        lattice.reset();
        assert_eq!(first, lattice.points());
        assert_eq!(first, lattice.reference().points());
        assert_eq!(lattice.selected(), None);
    }

    #[test]
    fn t_invalid_dimensions() {
        assert!(matches!(
            ControlLattice::new(1, 5),
            Err(Error::InvalidDimensions { rows: 1, cols: 5 })
        ));
        let mut lattice = ControlLattice::new(3, 3).expect("Cannot create lattice");
        assert!(lattice.set_size(3, 0).is_err());
        assert_eq!(lattice.dims(), LatticeDims::new(3, 3).expect("Valid dims"));
        assert_eq!(lattice.num_points(), 9);
    }

    #[test]
    fn t_dims_must_be_addressable() {
        assert!(LatticeDims::new(65536, 65535).is_ok());
        assert!(matches!(
            LatticeDims::new(65536, 65537),
            Err(Error::InvalidDimensions {
                rows: 65536,
                cols: 65537
            })
        ));
        assert!(LatticeDims::new(usize::MAX, 2).is_err());
        assert!(LatticeDims::new(1 << 32, 1 << 32).is_err());
    }

    #[test]
    fn t_deserialize_dims() {
        let dims: LatticeDims =
            serde_json::from_str(r#"{"rows":3,"cols":5}"#).expect("Cannot parse dims");
        assert_eq!((dims.rows(), dims.cols()), (3, 5));
        assert_eq!(dims.num_tiles(), 8);
        assert!(serde_json::from_str::<LatticeDims>(r#"{"rows":1,"cols":5}"#).is_err());
        assert!(serde_json::from_str::<LatticeDims>(r#"{"rows":4,"cols":0}"#).is_err());
        let text = serde_json::to_string(&dims).expect("Cannot serialize dims");
        assert_eq!(
            serde_json::from_str::<LatticeDims>(&text).expect("Cannot parse dims"),
            dims
        );
    }

    #[test]
    fn t_set_size_clears_selection() {
        let mut lattice = ControlLattice::new(2, 2).expect("Cannot create lattice");
        assert!(lattice.find_closest(vec2(1.0, 1.0)).is_some());
        lattice.set_size(4, 6).expect("Cannot resize lattice");
        assert_eq!(lattice.selected(), None);
        assert_eq!(lattice.num_points(), 24);
        assert_eq!(lattice.num_tiles(), 15);
        assert!(lattice.is_consistent());
    }

    #[test]
    fn t_find_and_move() {
        let mut lattice = ControlLattice::new(3, 3).expect("Cannot create lattice");
        let picked = lattice
            .find_closest(vec2(0.02, -0.97))
            .expect("Expected a control point to be picked");
        assert_eq!(picked, lattice.index_at(0, 1));
        assert!(lattice.move_selected(vec2(0.25, -1.5)));
        assert_eq!(lattice.point(0, 1), vec2(0.25, -1.5));
        assert_eq!(lattice.selected_point(), Some(vec2(0.25, -1.5)));
    }

    #[test]
    fn t_move_without_selection() {
        let mut lattice = ControlLattice::new(3, 3).expect("Cannot create lattice");
        let before: Vec<_> = lattice.points().iter().map(|p| p.to_array()).collect();
        assert_eq!(lattice.find_closest(vec2(0.5, 0.5)), None);
        assert!(!lattice.move_selected(vec2(9.0, 9.0)));
        let after: Vec<_> = lattice.points().iter().map(|p| p.to_array()).collect();
        assert_eq!(
            before
                .iter()
                .flatten()
                .map(|v| v.to_bits())
                .collect::<Vec<_>>(),
            after.iter().flatten().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn t_pick_radius() {
        let mut lattice = ControlLattice::new(2, 2).expect("Cannot create lattice");
        // Just inside.
        assert_eq!(
            lattice.find_closest(vec2(-1.0 + 0.099, -1.0)),
            Some(lattice.index_at(0, 0))
        );
        // Exactly at and beyond the radius.
        assert_eq!(lattice.find_closest(vec2(-1.0, -1.0 + 0.25)), None);
        assert_eq!(
            lattice.find_closest_within(vec2(-1.0, -1.0 + 0.25), 0.25),
            None
        );
        assert_eq!(
            lattice.find_closest_within(vec2(-1.0, -1.0 + 0.25), 0.3),
            Some(lattice.index_at(0, 0))
        );
        assert!(PICK_RADIUS < 0.25);
    }

    #[test]
    fn t_pick_tie_break() {
        let mut lattice = ControlLattice::new(2, 2).expect("Cannot create lattice");
        // Midway between (row 0, col 0) and (row 1, col 0), which are visited
        // in that order.
        assert_eq!(
            lattice.find_closest_within(vec2(-1.0, 0.0), 2.0),
            Some(lattice.index_at(0, 0))
        );
        // Midway between (row 0, col 0) and (row 0, col 1). Column 0 comes
        // first.
        assert_eq!(
            lattice.find_closest_within(vec2(0.0, -1.0), 2.0),
            Some(lattice.index_at(0, 0))
        );
    }

    #[test]
    fn t_tile_corners() {
        let lattice = ControlLattice::new(3, 3).expect("Cannot create lattice");
        assert_eq!(
            lattice.tile_corners(TH::from(4)),
            [
                vec2(0.0, 0.0),
                vec2(1.0, 0.0),
                vec2(0.0, 1.0),
                vec2(1.0, 1.0)
            ]
        );
        assert_eq!(
            lattice.tiles().map(|t| t.index()).collect::<Vec<_>>(),
            vec![0, 3, 1, 4]
        );
    }

    #[test]
    #[should_panic]
    fn t_tile_corners_out_of_range() {
        let lattice = ControlLattice::new(2, 2).expect("Cannot create lattice");
        lattice.tile_corners(TH::from(1));
    }

    #[test]
    fn t_reference_bounds() {
        let reference = ReferenceLattice::new(3, 5).expect("Cannot create lattice");
        let (lo, hi) = reference.tile_bounds(TH::from(6));
        assert_eq!(lo, vec2(-0.5, 0.0));
        assert_eq!(hi, vec2(0.0, 1.0));
        let editable = reference.to_editable();
        assert_eq!(editable.points(), reference.points());
        assert_eq!(editable.selected(), None);
        assert_eq!(reference.point(2, 4), Vec2::ONE);
    }
}
