use std::path::Path;

use tracing::{info, warn};

use crate::error::Error;

/// A triangle mesh as flat buffers, ready to be handed to a renderer.
///
/// Positions and normals have 3 coordinates per vertex, texture coordinates
/// have 2. Normals and texture coordinates are optional and empty when
/// absent. Every 3 consecutive indices make a triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    positions: Vec<f32>,
    normals: Vec<f32>,
    texcoords: Vec<f32>,
    indices: Vec<u32>,
}

impl TriMesh {
    /// Create a mesh from flat buffers, after checking that they are
    /// consistent with each other.
    pub fn from_buffers(
        positions: Vec<f32>,
        normals: Vec<f32>,
        texcoords: Vec<f32>,
        indices: Vec<u32>,
    ) -> Result<Self, Error> {
        if positions.len() % 3 != 0 {
            return Err(Error::IncorrectNumberOfCoordinates(positions.len()));
        }
        let nverts = positions.len() / 3;
        if !normals.is_empty() && normals.len() != positions.len() {
            return Err(Error::MismatchedArrayLengths(positions.len(), normals.len()));
        }
        if !texcoords.is_empty() && texcoords.len() != nverts * 2 {
            return Err(Error::MismatchedArrayLengths(nverts * 2, texcoords.len()));
        }
        if indices.len() % 3 != 0 {
            return Err(Error::IncorrectIndexCount(indices.len()));
        }
        if let Some(&i) = indices.iter().find(|&&i| i as usize >= nverts) {
            return Err(Error::OutOfBoundsAccess(i));
        }
        Ok(TriMesh {
            positions,
            normals,
            texcoords,
            indices,
        })
    }

    /// A rectangle spanning `min` to `max` in the xy plane, split into
    /// `nx x ny` quads of two triangles each. Texture coordinates go from
    /// `(0, 0)` at `min` to `(1, 1)` at `max`.
    pub fn grid(min: [f32; 2], max: [f32; 2], nx: usize, ny: usize) -> Result<Self, Error> {
        if nx == 0 || ny == 0 {
            return Err(Error::InvalidDimensions { rows: ny, cols: nx });
        }
        let nverts = (nx + 1) * (ny + 1);
        let mut positions = Vec::with_capacity(nverts * 3);
        let mut texcoords = Vec::with_capacity(nverts * 2);
        let mut normals = Vec::with_capacity(nverts * 3);
        for j in 0..=ny {
            let t = j as f32 / ny as f32;
            for i in 0..=nx {
                let s = i as f32 / nx as f32;
                positions.extend_from_slice(&[
                    min[0] + s * (max[0] - min[0]),
                    min[1] + t * (max[1] - min[1]),
                    0.0,
                ]);
                texcoords.extend_from_slice(&[s, t]);
                normals.extend_from_slice(&[0.0, 0.0, 1.0]);
            }
        }
        let stride = (nx + 1) as u32;
        let mut indices = Vec::with_capacity(nx * ny * 6);
        for j in 0..ny as u32 {
            for i in 0..nx as u32 {
                let v0 = j * stride + i;
                let (v1, v2, v3) = (v0 + 1, v0 + stride, v0 + stride + 1);
                indices.extend_from_slice(&[v0, v1, v3, v0, v3, v2]);
            }
        }
        Self::from_buffers(positions, normals, texcoords, indices)
    }

    /// Load a mesh from an OBJ file. Polygons are triangulated, and all models
    /// in the file are merged into one mesh.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        };
        let (models, _) =
            tobj::load_obj(path, &options).map_err(|e| Error::ObjLoadFailed(format!("{}", e)))?;
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut texcoords = Vec::new();
        let mut indices = Vec::new();
        for model in models {
            let mesh = model.mesh;
            if mesh.positions.len() % 3 != 0 {
                return Err(Error::IncorrectNumberOfCoordinates(mesh.positions.len()));
            }
            let voffset = (positions.len() / 3) as u32;
            positions.extend_from_slice(&mesh.positions);
            normals.extend_from_slice(&mesh.normals);
            texcoords.extend_from_slice(&mesh.texcoords);
            indices.extend(mesh.indices.iter().map(|i| i + voffset));
        }
        let nverts = positions.len() / 3;
        if normals.len() != positions.len() {
            if !normals.is_empty() {
                warn!(path = %path.display(), "discarding normals missing on some vertices");
            }
            normals.clear();
        }
        if texcoords.len() != nverts * 2 {
            if !texcoords.is_empty() {
                warn!(path = %path.display(), "discarding texcoords missing on some vertices");
            }
            texcoords.clear();
        }
        let mesh = Self::from_buffers(positions, normals, texcoords, indices)?;
        info!(
            path = %path.display(),
            vertices = mesh.num_vertices(),
            triangles = mesh.num_triangles(),
            "loaded mesh"
        );
        Ok(mesh)
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn normals(&self) -> Option<&[f32]> {
        (!self.normals.is_empty()).then_some(&self.normals[..])
    }

    pub fn texcoords(&self) -> Option<&[f32]> {
        (!self.texcoords.is_empty()).then_some(&self.texcoords[..])
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}
