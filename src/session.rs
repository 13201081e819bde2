/*!
An interactive deformation session.

[`DeformSession`] owns everything an interactive editor needs: the editable
lattice, the reference layout the mesh was bound against, the mesh itself,
its binding and the buffer of deformed positions. Input events are fed in
with [`DeformSession::handle`], and the current state is handed to a
[`RenderTarget`] with [`DeformSession::render`].
*/

use glam::Vec2;
use tracing::{debug, info, warn};

use crate::{
    binding::DeformationBinding,
    config::SessionConfig,
    error::Error,
    lattice::{ControlLattice, LatticeDims, ReferenceLattice},
    mesh::TriMesh,
    modes::{RenderMode, RenderModes},
    solve::deform_positions,
    view::OrthoView,
};

/// Input delivered by the windowing layer. Positions are in world
/// coordinates, see [`OrthoView::window_to_world`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    /// The pointer moved. `pressed` is the state of the primary button.
    PointerMoved { position: Vec2, pressed: bool },
    /// A character was typed.
    Key(char),
}

/// Commands bound to keys.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyCommand {
    Reset,
    Save,
    Load,
    Toggle(RenderMode),
}

impl KeyCommand {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'r' => Some(KeyCommand::Reset),
            's' => Some(KeyCommand::Save),
            'l' => Some(KeyCommand::Load),
            'c' => Some(KeyCommand::Toggle(RenderMode::CullFaces)),
            'z' => Some(KeyCommand::Toggle(RenderMode::Wireframe)),
            _ => None,
        }
    }
}

/// What a renderer needs to draw the editable grid.
#[derive(Debug, Copy, Clone)]
pub struct LatticeView<'a> {
    pub dims: LatticeDims,
    pub points: &'a [Vec2],
    pub selected: Option<Vec2>,
}

/// What a renderer needs to draw the deformed shape.
#[derive(Debug, Copy, Clone)]
pub struct ShapeView<'a> {
    pub positions: &'a [f32],
    pub texcoords: Option<&'a [f32]>,
    pub indices: &'a [u32],
    pub modes: RenderModes,
}

/// Something that draws the lattice and the shape, once per frame.
pub trait RenderTarget {
    fn draw_lattice(&mut self, lattice: &LatticeView);

    fn draw_shape(&mut self, shape: &ShapeView);
}

pub struct DeformSession {
    config: SessionConfig,
    lattice: ControlLattice,
    reference: ReferenceLattice,
    mesh: TriMesh,
    binding: DeformationBinding,
    deformed: Vec<f32>,
    modes: RenderModes,
}

impl DeformSession {
    /// Create a session with a uniform lattice as described by `config`, and
    /// bind `mesh` to it.
    pub fn new(config: SessionConfig, mesh: TriMesh) -> Result<Self, Error> {
        config.validate()?;
        let lattice = ControlLattice::new(config.rows, config.cols)?;
        let reference = lattice.reference();
        let binding = DeformationBinding::bind(&reference, mesh.positions())?;
        let deformed = mesh.positions().to_vec();
        info!(
            rows = config.rows,
            cols = config.cols,
            vertices = binding.len(),
            bound = binding.num_bound(),
            "created deformation session"
        );
        Ok(DeformSession {
            config,
            lattice,
            reference,
            mesh,
            binding,
            deformed,
            modes: RenderModes::default(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn lattice(&self) -> &ControlLattice {
        &self.lattice
    }

    pub fn reference(&self) -> &ReferenceLattice {
        &self.reference
    }

    pub fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    pub fn binding(&self) -> &DeformationBinding {
        &self.binding
    }

    pub fn modes(&self) -> RenderModes {
        self.modes
    }

    pub fn view(&self) -> OrthoView {
        OrthoView::new(self.config.view_extent)
    }

    /// Current positions of the mesh, 3 coordinates per vertex.
    pub fn deformed_positions(&self) -> &[f32] {
        &self.deformed
    }

    /// Respond to an input event. Returns `true` if anything visible changed
    /// and the scene should be redrawn.
    ///
    /// Errors from saving or loading the lattice are returned to the caller;
    /// the session is left as it was.
    pub fn handle(&mut self, event: InputEvent) -> Result<bool, Error> {
        match event {
            InputEvent::PointerMoved {
                position,
                pressed: true,
            } => {
                if !self.lattice.move_selected(position) {
                    return Ok(false);
                }
                self.update();
                Ok(true)
            }
            InputEvent::PointerMoved {
                position,
                pressed: false,
            } => {
                let before = self.lattice.selected();
                let after = self
                    .lattice
                    .find_closest_within(position, self.config.pick_radius);
                Ok(before != after)
            }
            InputEvent::Key(c) => match KeyCommand::from_char(c) {
                Some(cmd) => self.apply(cmd),
                None => Ok(false),
            },
        }
    }

    /// Execute a key command. Returns `true` if the scene should be redrawn.
    pub fn apply(&mut self, cmd: KeyCommand) -> Result<bool, Error> {
        match cmd {
            KeyCommand::Reset => {
                self.lattice.reset();
                if self.lattice.dims() != self.binding.dims() {
                    self.rebind()?;
                }
                self.update();
                Ok(true)
            }
            KeyCommand::Save => {
                self.lattice.save(&self.config.lattice_file)?;
                Ok(false)
            }
            KeyCommand::Load => {
                self.lattice
                    .load(&self.config.lattice_file, self.config.load_policy)?;
                // An inconsistent lattice cannot be solved against, so there is
                // nothing to bind to until it is reset.
                if self.lattice.is_consistent() && self.lattice.dims() != self.binding.dims() {
                    self.rebind()?;
                }
                self.update();
                Ok(true)
            }
            KeyCommand::Toggle(mode) => {
                let flag = self.modes.toggle(mode);
                info!(?mode, enabled = flag, "toggled render mode");
                Ok(true)
            }
        }
    }

    /// Resize the lattice, which resets it and binds the mesh again.
    pub fn set_size(&mut self, rows: usize, cols: usize) -> Result<(), Error> {
        self.lattice.set_size(rows, cols)?;
        self.config.rows = rows;
        self.config.cols = cols;
        self.rebind()?;
        self.update();
        Ok(())
    }

    /// Replace the mesh, and bind it to the reference layout.
    pub fn set_mesh(&mut self, mesh: TriMesh) -> Result<(), Error> {
        let binding = DeformationBinding::bind(&self.reference, mesh.positions())?;
        self.deformed = mesh.positions().to_vec();
        self.mesh = mesh;
        self.binding = binding;
        self.update();
        Ok(())
    }

    /// Hand the lattice and the deformed shape to `target`.
    pub fn render(&self, target: &mut impl RenderTarget) {
        target.draw_lattice(&LatticeView {
            dims: self.lattice.dims(),
            points: self.lattice.points(),
            selected: self.lattice.selected_point(),
        });
        target.draw_shape(&ShapeView {
            positions: &self.deformed,
            texcoords: self.mesh.texcoords(),
            indices: self.mesh.indices(),
            modes: self.modes,
        });
    }

    fn rebind(&mut self) -> Result<(), Error> {
        self.reference = ReferenceLattice::uniform(self.lattice.dims());
        self.binding = DeformationBinding::bind(&self.reference, self.mesh.positions())?;
        debug!(
            rows = self.reference.dims().rows(),
            cols = self.reference.dims().cols(),
            bound = self.binding.num_bound(),
            "rebound mesh"
        );
        Ok(())
    }

    /// Solve the deformed positions against the current lattice. A lattice
    /// that does not have the number of control points its dimensions call
    /// for cannot be solved against, and the shape is shown at rest instead.
    fn update(&mut self) {
        if let Err(e) = deform_positions(
            &self.binding,
            &self.lattice,
            self.mesh.positions(),
            &mut self.deformed,
        ) {
            warn!(error = %e, "cannot deform mesh, showing it at rest");
            self.deformed.copy_from_slice(self.mesh.positions());
        }
    }
}
