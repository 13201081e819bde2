use glam::Vec2;
use tracing::debug;

use crate::{
    element::TH,
    error::Error,
    lattice::{LatticeDims, ReferenceLattice},
};

/// The tile a vertex belongs to, and its local coordinates in that tile.
/// `(0, 0)` is the lower-left corner and `(1, 1)` the upper-right corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TileBinding {
    pub tile: TH,
    pub uv: Vec2,
}

/// Per-vertex tile bindings of a mesh, computed once against a
/// [`ReferenceLattice`].
///
/// Only the dimensions of the lattice are remembered, so the binding can be
/// checked against the lattice it is later solved with.
#[derive(Debug, Clone)]
pub struct DeformationBinding {
    dims: LatticeDims,
    bindings: Vec<Option<TileBinding>>,
}

/// Find the first tile whose bounding box contains `p`, and compute the local
/// coordinates of `p` in that tile. Bounding boxes are half open, so a point
/// on the upper or right edge of a tile belongs to the next tile over.
pub fn to_local(reference: &ReferenceLattice, p: Vec2) -> Option<TileBinding> {
    reference.tiles().find_map(|tile| {
        let (lo, hi) = reference.tile_bounds(tile);
        if p.x < lo.x || p.x >= hi.x || p.y < lo.y || p.y >= hi.y {
            return None;
        }
        Some(TileBinding {
            tile,
            uv: (p - lo) / (hi - lo),
        })
    })
}

impl DeformationBinding {
    /// Bind every vertex of `positions` to a tile of `reference`. The
    /// positions are a flat buffer with 3 coordinates per vertex. The z
    /// coordinate is ignored.
    ///
    /// Vertices outside the lattice are left unbound.
    pub fn bind(reference: &ReferenceLattice, positions: &[f32]) -> Result<Self, Error> {
        if positions.len() % 3 != 0 {
            return Err(Error::IncorrectNumberOfCoordinates(positions.len()));
        }
        let bindings: Vec<_> = positions
            .chunks_exact(3)
            .map(|xyz| to_local(reference, Vec2::new(xyz[0], xyz[1])))
            .collect();
        let binding = DeformationBinding {
            dims: reference.dims(),
            bindings,
        };
        debug!(
            vertices = binding.len(),
            bound = binding.num_bound(),
            "bound mesh to lattice"
        );
        Ok(binding)
    }

    /// Dimensions of the lattice this binding was computed against.
    pub fn dims(&self) -> LatticeDims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn num_bound(&self) -> usize {
        self.bindings.iter().flatten().count()
    }

    pub fn get(&self, vertex: usize) -> Option<TileBinding> {
        self.bindings.get(vertex).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<TileBinding>> + use<'_> {
        self.bindings.iter().copied()
    }
}
