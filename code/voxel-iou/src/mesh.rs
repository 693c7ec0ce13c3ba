use glam::Vec3;

use crate::error::VoxelError;
use crate::geometry::{Aabb, Triangle};

/// Indexed triangle soup. Read-only input to every voxelizer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Validates that `indices` forms whole triangles over existing vertices.
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Result<Self, VoxelError> {
        if indices.len() % 3 != 0 {
            return Err(VoxelError::PartialTriangle(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(VoxelError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self { vertices, indices })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounding box over all vertices, `None` when there are none.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    pub fn triangle(&self, i: usize) -> Triangle {
        let [a, b, c] = self.triangle_indices(i);
        Triangle::new(
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        )
    }

    pub fn triangle_indices(&self, i: usize) -> [u32; 3] {
        [
            self.indices[3 * i],
            self.indices[3 * i + 1],
            self.indices[3 * i + 2],
        ]
    }

    pub fn triangles(&self) -> impl ExactSizeIterator<Item = Triangle> + '_ {
        (0..self.triangle_count()).map(|i| self.triangle(i))
    }

    pub fn translated(&self, offset: Vec3) -> Mesh {
        Mesh {
            vertices: self.vertices.iter().map(|v| *v + offset).collect(),
            indices: self.indices.clone(),
        }
    }

    /// Concatenates two meshes into one soup. Overlaps are kept as-is.
    pub fn merged(&self, other: &Mesh) -> Mesh {
        let base = self.vertices.len() as u32;
        let mut vertices = self.vertices.clone();
        vertices.extend_from_slice(&other.vertices);
        let mut indices = self.indices.clone();
        indices.extend(other.indices.iter().map(|i| i + base));
        Mesh { vertices, indices }
    }

    // ===========================================================================
    // 基础几何体
    // ===========================================================================

    /// Closed box with outward-facing triangles.
    pub fn cuboid(min: Vec3, max: Vec3) -> Mesh {
        // corner i: bit 0 -> x, bit 1 -> y, bit 2 -> z
        let vertices = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 != 0 { max.x } else { min.x },
                    if i & 2 != 0 { max.y } else { min.y },
                    if i & 4 != 0 { max.z } else { min.z },
                )
            })
            .collect();
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1,  1, 2, 3, // -z
            4, 5, 6,  5, 7, 6, // +z
            0, 1, 4,  1, 5, 4, // -y
            2, 6, 3,  3, 6, 7, // +y
            0, 4, 2,  2, 4, 6, // -x
            1, 3, 5,  3, 7, 5, // +x
        ];
        Mesh { vertices, indices }
    }

    pub fn unit_cube() -> Mesh {
        Self::cuboid(Vec3::ZERO, Vec3::ONE)
    }

    /// Corner tetrahedron spanning the three unit axes.
    pub fn tetrahedron() -> Mesh {
        Mesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
        }
    }

    /// Open square of edge `size` in the `z = 0` plane, normal `+Z`.
    pub fn plane(size: f32) -> Mesh {
        Mesh {
            vertices: vec![
                Vec3::ZERO,
                Vec3::new(size, 0.0, 0.0),
                Vec3::new(0.0, size, 0.0),
                Vec3::new(size, size, 0.0),
            ],
            indices: vec![0, 1, 2, 1, 3, 2],
        }
    }
}
