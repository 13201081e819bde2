/*!
Lattice based free-form deformation of 2D triangle meshes.

A grid of control points is laid over a mesh. Every vertex of the mesh is
bound once to the grid cell ("tile") that contains it, and remembered by its
local coordinates in that tile. When control points are moved, the vertices
are placed back into their tiles by bilinear interpolation of the tile's
corners, which smoothly warps the mesh.

# Overview

+ [`ControlLattice`] is the editable grid of control points. Points are
  picked with [`ControlLattice::find_closest`], dragged with
  [`ControlLattice::move_selected`], and saved to or loaded from a simple text
  format.

+ [`ReferenceLattice`] is the uniform rest layout of a lattice. Vertices are
  bound to tiles of a reference lattice with [`DeformationBinding::bind`].
  Binding against an edited lattice is not possible, because the containment
  test assumes axis aligned tiles.

+ [`deform_positions`] solves the deformed positions of all bound vertices
  against the current layout of a [`ControlLattice`]. This is linear in the
  number of vertices and is meant to run after every edit.

+ [`DeformSession`] ties a lattice, a [`TriMesh`] and its binding together for
  interactive use. It translates [`InputEvent`]s into lattice edits, and hands
  the result to a [`RenderTarget`].

```
use cagewarp::{DeformationBinding, ReferenceLattice, deform_positions};
use glam::vec2;

let reference = ReferenceLattice::new(2, 2)?;
let mut lattice = reference.to_editable();
let rest = [0.0, 0.0, 0.0];
let binding = DeformationBinding::bind(&reference, &rest)?;

lattice.find_closest(vec2(1.0, 1.0));
lattice.move_selected(vec2(2.0, 2.0));

let mut deformed = [0.0; 3];
deform_positions(&binding, &lattice, &rest, &mut deformed)?;
assert!((deformed[0] - 0.25).abs() < 1e-6);
# Ok::<(), cagewarp::Error>(())
```
*/

mod binding;
mod config;
mod element;
mod error;
mod lattice;
mod macros;
mod mesh;
mod modes;
mod persist;
mod session;
mod solve;
mod view;

pub use binding::{DeformationBinding, TileBinding, to_local};
pub use config::SessionConfig;
pub use element::{CH, Handle, TH};
pub use error::Error;
pub use lattice::{ControlLattice, LatticeDims, PICK_RADIUS, ReferenceLattice};
pub use mesh::TriMesh;
pub use modes::{RenderMode, RenderModes};
pub use persist::{LoadPolicy, TRAILER, parse_lattice, write_lattice};
pub use session::{DeformSession, InputEvent, KeyCommand, LatticeView, RenderTarget, ShapeView};
pub use solve::{bilinear, deform_positions, to_world};
pub use view::OrthoView;
