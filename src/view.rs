use glam::{Mat4, Vec2, Vec4};

/// Orthographic view that keeps `[-extent, extent]` visible vertically, and
/// stretches horizontally with the aspect ratio of the window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrthoView {
    pub extent: f32,
}

impl Default for OrthoView {
    fn default() -> Self {
        OrthoView { extent: 1.1 }
    }
}

impl OrthoView {
    pub fn new(extent: f32) -> Self {
        OrthoView { extent }
    }

    /// Projection matrix for a window of the given size in pixels.
    pub fn projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width as f32 / height.max(1) as f32;
        let s = self.extent;
        Mat4::orthographic_rh_gl(-s * aspect, s * aspect, -s, s, -1.0, 1.0)
    }

    /// Convert a cursor position in window pixels, with the origin at the top
    /// left corner, into world coordinates.
    pub fn window_to_world(&self, cursor: Vec2, width: u32, height: u32) -> Vec2 {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let ndc = Vec4::new(
            2.0 * (cursor.x / w - 0.5),
            2.0 * ((h - cursor.y) / h - 0.5),
            0.0,
            1.0,
        );
        let p = self.projection(width, height).inverse() * ndc;
        Vec2::new(p.x, p.y)
    }
}
