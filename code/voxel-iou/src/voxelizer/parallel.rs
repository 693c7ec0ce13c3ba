use std::sync::atomic::{AtomicU32, Ordering};

use glam::UVec3;
use rayon::prelude::*;

use super::{FillMode, Voxelizer};
use crate::error::VoxelError;
use crate::fill;
use crate::geometry::Triangle;
use crate::grid::{CellFlags, Grid, GridSpec};
use crate::mesh::Mesh;

/// Data-parallel voxelization on the rayon thread pool.
///
/// Three stages, each a parallel map over independent work items:
/// - A: front-facing triangles mark `FILLED | FRONT`
/// - B: back-facing triangles clear `FRONT` and mark `FILLED | BACK`
/// - C: one work item per `(x, y)` column runs the interior scan
///
/// Every cell is an atomic flag word and all writes are bitwise OR / AND, so
/// triangles sharing a cell merge without a race. A stage's `for_each`
/// returning is the barrier before the next one starts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelVoxelizer {
    fill: FillMode,
}

impl ParallelVoxelizer {
    pub fn new(fill: FillMode) -> Self {
        Self { fill }
    }

    pub fn surface_only() -> Self {
        Self::new(FillMode::SurfaceOnly)
    }
}

impl Voxelizer for ParallelVoxelizer {
    fn fill_mode(&self) -> FillMode {
        self.fill
    }

    fn voxelize_in(&self, mesh: &Mesh, spec: &GridSpec) -> Result<Grid, VoxelError> {
        let mut cells: Vec<AtomicU32> = Vec::new();
        cells.try_reserve_exact(spec.len()).map_err(|e| {
            VoxelError::DegenerateGrid(format!("{} cells: {e}", spec.len()))
        })?;
        cells.extend((0..spec.len()).map(|_| AtomicU32::new(0)));
        let triangles: Vec<Triangle> = mesh.triangles().collect();

        // Stage A
        triangles
            .par_iter()
            .filter(|t| t.front_facing)
            .for_each(|t| {
                spec.rasterize(t, |cell| {
                    let bits = (CellFlags::FILLED | CellFlags::FRONT).bits();
                    cells[spec.index(cell)].fetch_or(bits, Ordering::Relaxed);
                })
            });
        log::trace!("stage A done");

        // Stage B
        triangles
            .par_iter()
            .filter(|t| !t.front_facing)
            .for_each(|t| {
                spec.rasterize(t, |cell| {
                    let slot = &cells[spec.index(cell)];
                    slot.fetch_and(!CellFlags::FRONT.bits(), Ordering::Relaxed);
                    slot.fetch_or((CellFlags::FILLED | CellFlags::BACK).bits(), Ordering::Relaxed);
                })
            });
        log::trace!("stage B done");

        // Stage C
        if self.fill == FillMode::Volume {
            let dims = spec.dims();
            (0..dims.x * dims.y).into_par_iter().for_each(|column| {
                let (x, y) = (column % dims.x, column / dims.x);
                let at = |z| spec.index(UVec3::new(x, y, z));
                let spans = fill::interior_spans(dims.z, |z| {
                    CellFlags::from_bits_truncate(cells[at(z)].load(Ordering::Relaxed)).surface()
                });
                for z in spans.into_iter().flatten() {
                    cells[at(z)].fetch_or(CellFlags::FILLED.bits(), Ordering::Relaxed);
                }
            });
            log::trace!("stage C done");
        }

        let grid = Grid::from_flags(*spec, cells.into_iter().map(AtomicU32::into_inner));
        log::debug!(
            "parallel: {} triangles -> {}x{}x{} grid, {} filled",
            triangles.len(),
            spec.dims().x,
            spec.dims().y,
            spec.dims().z,
            grid.filled_count()
        );
        Ok(grid)
    }
}
