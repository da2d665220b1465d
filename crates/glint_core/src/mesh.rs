//! Triangle mesh data and OBJ loading.
//!
//! A [`Mesh`] is plain geometry: the renderer wraps it in a shape with its
//! own acceleration structure, and several instances may share one mesh.

use std::path::Path;

use glint_math::{Aabb, Vec2, Vec3};
use thiserror::Error;

/// Errors that can occur while loading mesh files.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Failed to load OBJ file {path}: {source}")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("Mesh {0} contains no triangles")]
    Empty(String),

    #[error("Triangle index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

pub type MeshResult<T> = Result<T, MeshError>;

/// A mesh consisting of vertex positions, optional normals and uvs, and
/// triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Per-vertex normals, used for smooth shading
    pub normals: Option<Vec<Vec3>>,

    /// Per-vertex texture coordinates
    pub uvs: Option<Vec<Vec2>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a mesh, checking that every index refers to a vertex.
    pub fn new(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<Vec2>>,
    ) -> MeshResult<Self> {
        let vertex_count = positions.len();
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        let mut bounds = Aabb::EMPTY;
        for p in &positions {
            bounds.extend_point(*p);
        }

        // Attributes that do not match the vertex count are dropped.
        let normals = normals.filter(|n| n.len() == vertex_count);
        let uvs = uvs.filter(|t| t.len() == vertex_count);

        Ok(Self {
            positions,
            normals,
            uvs,
            indices,
            bounds,
        })
    }

    /// Compute smooth vertex normals by averaging area-weighted face normals
    /// (counter-clockwise winding).
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Z);
        }

        self.normals = Some(normals);
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Vertex indices of triangle `i`.
    #[inline]
    pub fn triangle(&self, i: usize) -> [usize; 3] {
        let base = 3 * i;
        [
            self.indices[base] as usize,
            self.indices[base + 1] as usize,
            self.indices[base + 2] as usize,
        ]
    }

    /// Bounding box of triangle `i`.
    pub fn triangle_bounds(&self, i: usize) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for v in self.triangle(i) {
            bounds.extend_point(self.positions[v]);
        }
        bounds
    }

    /// Centroid of triangle `i`.
    pub fn triangle_centroid(&self, i: usize) -> Vec3 {
        let [a, b, c] = self.triangle(i);
        (self.positions[a] + self.positions[b] + self.positions[c]) / 3.0
    }
}

/// Load every model of an OBJ file into a single triangulated mesh.
///
/// Normals and uvs are kept only when all models provide them.
pub fn load_obj(path: impl AsRef<Path>) -> MeshResult<Mesh> {
    let path = path.as_ref();
    let name = path.display().to_string();

    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )
    .map_err(|source| MeshError::Obj {
        path: name.clone(),
        source,
    })?;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();
    let mut all_normals = true;
    let mut all_uvs = true;

    for model in &models {
        let mesh = &model.mesh;
        let offset = positions.len() as u32;
        let vertex_count = mesh.positions.len() / 3;

        positions.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );
        indices.extend(mesh.indices.iter().map(|i| i + offset));

        if mesh.normals.len() == 3 * vertex_count {
            normals.extend(mesh.normals.chunks_exact(3).map(|n| Vec3::new(n[0], n[1], n[2])));
        } else {
            all_normals = false;
        }

        if mesh.texcoords.len() == 2 * vertex_count {
            uvs.extend(mesh.texcoords.chunks_exact(2).map(|t| Vec2::new(t[0], t[1])));
        } else {
            all_uvs = false;
        }
    }

    if indices.is_empty() {
        return Err(MeshError::Empty(name));
    }

    let mesh = Mesh::new(
        positions,
        indices,
        all_normals.then_some(normals),
        all_uvs.then_some(uvs),
    )?;

    log::debug!(
        "Loaded mesh {}: {} vertices, {} triangles (normals: {}, uvs: {})",
        name,
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.has_normals(),
        mesh.has_uvs()
    );

    Ok(mesh)
}
