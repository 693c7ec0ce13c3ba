use glam::UVec3;

use super::{FillMode, Voxelizer};
use crate::error::VoxelError;
use crate::fill;
use crate::grid::{Facing, Grid, GridSpec};
use crate::mesh::Mesh;

/// CPU 单线程体素化
///
/// Rasterizes every triangle in turn, then runs the column scan over the
/// finished surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialVoxelizer {
    fill: FillMode,
}

impl SequentialVoxelizer {
    pub fn new(fill: FillMode) -> Self {
        Self { fill }
    }

    pub fn surface_only() -> Self {
        Self::new(FillMode::SurfaceOnly)
    }
}

impl Voxelizer for SequentialVoxelizer {
    fn fill_mode(&self) -> FillMode {
        self.fill
    }

    fn voxelize_in(&self, mesh: &Mesh, spec: &GridSpec) -> Result<Grid, VoxelError> {
        let mut grid = Grid::new(*spec)?;

        for triangle in mesh.triangles() {
            let facing = Facing::of(&triangle);
            spec.rasterize(&triangle, |cell| grid.mark_surface(cell, facing));
        }
        log::trace!("surface pass: {} cells", grid.filled_count());

        if self.fill == FillMode::Volume {
            fill_interior(&mut grid);
        }

        log::debug!(
            "sequential: {} triangles -> {}x{}x{} grid, {} filled",
            mesh.triangle_count(),
            spec.dims().x,
            spec.dims().y,
            spec.dims().z,
            grid.filled_count()
        );
        Ok(grid)
    }
}

fn fill_interior(grid: &mut Grid) {
    let dims = grid.dims();
    for y in 0..dims.y {
        for x in 0..dims.x {
            let spans = fill::interior_spans(dims.z, |z| {
                grid.get(UVec3::new(x, y, z)).and_then(|v| v.surface())
            });
            for z in spans.into_iter().flatten() {
                grid.mark_interior(UVec3::new(x, y, z));
            }
        }
    }
}
