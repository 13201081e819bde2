use glam::Vec2;

use crate::{
    binding::{DeformationBinding, TileBinding},
    error::Error,
    lattice::ControlLattice,
};

/// Bilinear interpolation of the tile `corners`, given in the order
/// lower-left, lower-right, upper-left, upper-right, at the local coordinates
/// `uv`.
#[inline]
pub fn bilinear(corners: &[Vec2; 4], uv: Vec2) -> Vec2 {
    let [c00, c10, c01, c11] = *corners;
    let (u, v) = (uv.x, uv.y);
    (1.0 - v) * ((1.0 - u) * c00 + u * c10) + v * ((1.0 - u) * c01 + u * c11)
}

/// World position of a bound vertex in the current layout of `lattice`.
#[inline]
pub fn to_world(lattice: &ControlLattice, binding: TileBinding) -> Vec2 {
    bilinear(&lattice.tile_corners(binding.tile), binding.uv)
}

/// Recompute the deformed positions of a mesh from its `binding` and the
/// current layout of `lattice`.
///
/// `rest` and `out` are flat position buffers with 3 coordinates per vertex.
/// The x and y coordinates of bound vertices are solved, everything else is
/// copied from `rest`. Returns the number of vertices that were solved.
pub fn deform_positions(
    binding: &DeformationBinding,
    lattice: &ControlLattice,
    rest: &[f32],
    out: &mut [f32],
) -> Result<usize, Error> {
    if binding.dims() != lattice.dims() {
        return Err(Error::BindingMismatch {
            bound: binding.dims(),
            current: lattice.dims(),
        });
    }
    if !lattice.is_consistent() {
        return Err(Error::InconsistentLattice {
            expected: lattice.dims().num_points(),
            found: lattice.num_points(),
        });
    }
    if rest.len() != out.len() {
        return Err(Error::MismatchedArrayLengths(rest.len(), out.len()));
    }
    if rest.len() != binding.len() * 3 {
        return Err(Error::MismatchedArrayLengths(rest.len(), binding.len() * 3));
    }
    out.copy_from_slice(rest);
    let mut solved = 0usize;
    for (xyz, b) in out.chunks_exact_mut(3).zip(binding.iter()) {
        if let Some(b) = b {
            let p = to_world(lattice, b);
            xyz[0] = p.x;
            xyz[1] = p.y;
            solved += 1;
        }
    }
    Ok(solved)
}
