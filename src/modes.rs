const CULL_FACES: u8 = 1 << 0;
const WIREFRAME: u8 = 1 << 1;

/// A debug rendering option that can be toggled at runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// Cull back facing triangles.
    CullFaces,
    /// Draw the shape as lines instead of filled triangles.
    Wireframe,
}

impl RenderMode {
    fn bit(self) -> u8 {
        match self {
            RenderMode::CullFaces => CULL_FACES,
            RenderMode::Wireframe => WIREFRAME,
        }
    }
}

/// Set of enabled [`RenderMode`]s. Everything is off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderModes {
    flags: u8,
}

impl RenderModes {
    fn check(&self, i: u8) -> bool {
        self.flags & i > 0
    }

    fn set(&mut self, i: u8, flag: bool) {
        if flag {
            self.flags |= i;
        } else {
            self.flags &= !i;
        }
    }

    pub fn is_enabled(&self, mode: RenderMode) -> bool {
        self.check(mode.bit())
    }

    pub fn set_enabled(&mut self, mode: RenderMode, flag: bool) {
        self.set(mode.bit(), flag)
    }

    /// Flip `mode` and return its new state.
    pub fn toggle(&mut self, mode: RenderMode) -> bool {
        let flag = !self.is_enabled(mode);
        self.set_enabled(mode, flag);
        flag
    }

    pub fn cull_faces(&self) -> bool {
        self.check(CULL_FACES)
    }

    pub fn wireframe(&self) -> bool {
        self.check(WIREFRAME)
    }
}
