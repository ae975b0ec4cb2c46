//! Renderable geometry for detected planes.
//!
//! `Mesh` is a plain CPU-side buffer set; the host uploads it. Every rebuild goes
//! through [`Mesh::clear`], which bumps [`Mesh::version`], so consumers can tell
//! whether a frame actually regenerated the buffers.

pub mod builder;
pub mod feather;
pub mod primitive;
pub mod triangulate;

pub use builder::{FeatheredPlaneMesh, FlatPlaneMesh, PlaneMeshBuilder, builder_for};
pub use feather::{FEATHER_LENGTH, FEATHER_SCALE, feathered};
pub use primitive::reference_plane;
pub use triangulate::triangulate_xz;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

pub const CLEAR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];
pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    Triangles,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub const EMPTY: Bounds = Bounds {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    pub fn from_points(points: &[Vec3]) -> Self {
        let Some((first, rest)) = points.split_first() else {
            return Self::EMPTY;
        };
        rest.iter().fold(
            Bounds {
                min: *first,
                max: *first,
            },
            |bounds, point| Bounds {
                min: bounds.min.min(*point),
                max: bounds.max.max(*point),
            },
        )
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub topology: Topology,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<[f32; 4]>,
    pub tangents: Vec<Vec4>,
    bounds: Bounds,
    version: u64,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            topology: Topology::Triangles,
            normals: Vec::new(),
            uvs: Vec::new(),
            colors: Vec::new(),
            tangents: Vec::new(),
            bounds: Bounds::EMPTY,
            version: 0,
        }
    }

    /// Empties every buffer and starts a new version. Buffers keep their capacity.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.topology = Topology::Triangles;
        self.normals.clear();
        self.uvs.clear();
        self.colors.clear();
        self.tangents.clear();
        self.bounds = Bounds::EMPTY;
        self.version += 1;
    }

    /// Replaces this mesh's geometry with a copy of `source`.
    pub fn copy_from(&mut self, source: &Mesh) {
        self.clear();
        self.vertices.extend_from_slice(&source.vertices);
        self.indices.extend_from_slice(&source.indices);
        self.topology = source.topology;
        self.normals.extend_from_slice(&source.normals);
        self.uvs.extend_from_slice(&source.uvs);
        self.colors.extend_from_slice(&source.colors);
        self.tangents.extend_from_slice(&source.tangents);
        self.recalculate_bounds();
    }

    pub fn recalculate_bounds(&mut self) {
        self.bounds = Bounds::from_points(&self.vertices);
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        match self.topology {
            Topology::Triangles => self.indices.len() / 3,
            Topology::Points => 0,
        }
    }

    /// Triangle corner positions; indices out of range are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let chunks = match self.topology {
            Topology::Triangles => self.indices.chunks_exact(3),
            Topology::Points => self.indices[..0].chunks_exact(3),
        };
        chunks.filter_map(|tri| {
            Some([
                *self.vertices.get(tri[0] as usize)?,
                *self.vertices.get(tri[1] as usize)?,
                *self.vertices.get(tri[2] as usize)?,
            ])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_bumps_version_and_empties_buffers() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vec3::ONE);
        mesh.indices.push(0);
        let before = mesh.version();

        mesh.clear();

        assert!(mesh.is_empty());
        assert!(mesh.indices.is_empty());
        assert_eq!(mesh.version(), before + 1);
    }

    #[test]
    fn copy_recomputes_bounds() {
        let source = reference_plane();
        let mut mesh = Mesh::new();
        mesh.copy_from(&source);

        assert_eq!(mesh.vertices.len(), source.vertices.len());
        assert_eq!(mesh.triangle_count(), source.triangle_count());
        let bounds = mesh.bounds();
        assert_eq!(bounds.min, Vec3::new(-5.0, 0.0, -5.0));
        assert_eq!(bounds.max, Vec3::new(5.0, 0.0, 5.0));
    }

    #[test]
    fn empty_points_have_empty_bounds() {
        assert_eq!(Bounds::from_points(&[]), Bounds::EMPTY);
    }
}
