mod gpu;
mod parallel;
mod sequential;

pub use gpu::GpuVoxelizer;
pub use parallel::ParallelVoxelizer;
pub use sequential::SequentialVoxelizer;

use crate::error::VoxelError;
use crate::grid::{Grid, GridSpec};
use crate::mesh::Mesh;

/// Whether the interior-fill pass runs after surface rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    /// Only cells touched by a triangle.
    SurfaceOnly,
    /// Surface cells plus the column-scan interior.
    #[default]
    Volume,
}

/// Shared interface of the voxelization backends.
pub trait Voxelizer: Send + Sync {
    fn fill_mode(&self) -> FillMode;

    /// Voxelizes into caller-chosen grid parameters.
    fn voxelize_in(&self, mesh: &Mesh, spec: &GridSpec) -> Result<Grid, VoxelError>;

    /// Voxelizes into a grid sized around the mesh's own bounds.
    fn voxelize(&self, mesh: &Mesh, resolution: u32) -> Result<Grid, VoxelError> {
        if resolution == 0 {
            return Err(VoxelError::InvalidResolution(resolution));
        }
        let bounds = mesh.bounds().ok_or(VoxelError::EmptyMesh)?;
        let spec = GridSpec::from_bounds(&bounds, resolution)?;
        self.voxelize_in(mesh, &spec)
    }
}

impl<V: Voxelizer + ?Sized> Voxelizer for Box<V> {
    fn fill_mode(&self) -> FillMode {
        (**self).fill_mode()
    }

    fn voxelize_in(&self, mesh: &Mesh, spec: &GridSpec) -> Result<Grid, VoxelError> {
        (**self).voxelize_in(mesh, spec)
    }

    fn voxelize(&self, mesh: &Mesh, resolution: u32) -> Result<Grid, VoxelError> {
        (**self).voxelize(mesh, resolution)
    }
}

/// Single-threaded voxelization. `grid.unit()` gives the cell edge length.
pub fn voxelize_sequential(
    mesh: &Mesh,
    resolution: u32,
    surface_only: bool,
) -> Result<Grid, VoxelError> {
    let fill = if surface_only {
        FillMode::SurfaceOnly
    } else {
        FillMode::Volume
    };
    SequentialVoxelizer::new(fill).voxelize(mesh, resolution)
}

/// Data-parallel voxelization running all three stages, interior fill
/// included. `ParallelVoxelizer::surface_only()` stops after the surface
/// stages.
pub fn voxelize_parallel(mesh: &Mesh, resolution: u32) -> Result<Grid, VoxelError> {
    ParallelVoxelizer::default().voxelize(mesh, resolution)
}
