//! Triangle mesh voxelization and volumetric similarity.
//!
//! A mesh is sized into a cubic-cell [`Grid`], rasterized with an exact
//! triangle/box test and optionally filled along `+Z` columns. Three
//! interchangeable backends produce identical grids: [`SequentialVoxelizer`],
//! [`ParallelVoxelizer`] (rayon) and [`GpuVoxelizer`] (wgpu compute).
//! [`SimilarityEngine`] compares two meshes by Intersection-over-Union.

mod config;
mod error;
mod fill;
pub mod geometry;
mod grid;
mod mesh;
pub mod similarity;
mod voxelizer;

pub use config::{Backend, DEFAULT_RESOLUTION, VoxelizerConfig};
pub use error::{ComputeError, VoxelError};
pub use geometry::{Aabb, Plane, Triangle};
pub use grid::{CellFlags, Facing, Grid, GridSpec, MAX_GRID_BYTES, Voxel};
pub use mesh::Mesh;
pub use similarity::{SimilarityEngine, SimilarityReport, compute_similarity};
pub use voxelizer::{
    FillMode, GpuVoxelizer, ParallelVoxelizer, SequentialVoxelizer, Voxelizer, voxelize_parallel,
    voxelize_sequential,
};
