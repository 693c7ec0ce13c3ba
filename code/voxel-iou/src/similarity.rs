//! Volumetric Intersection-over-Union between two meshes.

use glam::Vec4;
use rayon::prelude::*;

use crate::error::VoxelError;
use crate::grid::{Grid, GridSpec};
use crate::mesh::Mesh;
use crate::voxelizer::{ParallelVoxelizer, Voxelizer};

/// Overlap and union of two grids sharing one [`GridSpec`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iou {
    pub overlap_cells: usize,
    pub union_cells: usize,
    pub overlap_volume: f32,
    pub union_volume: f32,
    /// `overlap / union`, in `[0, 1]`.
    pub score: f32,
}

/// IoU of two grids. Both must share origin, unit and dimensions.
pub fn intersection_over_union(a: &Grid, b: &Grid) -> Result<Iou, VoxelError> {
    if a.spec() != b.spec() {
        return Err(VoxelError::IncompatibleGrids);
    }
    let (overlap_cells, union_cells) = a
        .voxels()
        .iter()
        .zip(b.voxels())
        .fold((0usize, 0usize), |(overlap, union), (va, vb)| {
            (
                overlap + (va.fill && vb.fill) as usize,
                union + (va.fill || vb.fill) as usize,
            )
        });
    if union_cells == 0 {
        return Err(VoxelError::EmptyMesh);
    }
    let unit_volume = a.spec().unit_volume();
    Ok(Iou {
        overlap_cells,
        union_cells,
        overlap_volume: overlap_cells as f32 * unit_volume,
        union_volume: union_cells as f32 * unit_volume,
        score: (overlap_cells as f64 / union_cells as f64) as f32,
    })
}

/// Result of [`SimilarityEngine::compare`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityReport {
    pub score: f32,
    pub overlap_volume: f32,
    pub union_volume: f32,
    /// Grid both meshes were voxelized into.
    pub spec: GridSpec,
    /// One RGBA color per vertex of the first mesh, when the heat map is on.
    pub vertex_colors: Option<Vec<Vec4>>,
}

/// 类似度计算
///
/// Voxelizes both meshes into one grid sized around the union of their bounds,
/// so cell indices are comparable, and reduces the pair to an IoU score.
#[derive(Debug, Clone, Default)]
pub struct SimilarityEngine<V> {
    voxelizer: V,
    heatmap: bool,
}

impl<V: Voxelizer> SimilarityEngine<V> {
    pub fn new(voxelizer: V) -> Self {
        Self {
            voxelizer,
            heatmap: false,
        }
    }

    /// Also derive per-vertex colors for the first mesh.
    pub fn with_heatmap(mut self, enabled: bool) -> Self {
        self.heatmap = enabled;
        self
    }

    pub fn compare(&self, a: &Mesh, b: &Mesh, resolution: u32) -> Result<SimilarityReport, VoxelError> {
        if resolution == 0 {
            return Err(VoxelError::InvalidResolution(resolution));
        }
        let bounds = match (a.bounds(), b.bounds()) {
            (Some(ba), Some(bb)) => ba.union(&bb),
            _ => return Err(VoxelError::EmptyMesh),
        };
        let spec = GridSpec::from_bounds(&bounds, resolution)?;

        // Disjoint buffers: both may run at once, both finish before the reduction.
        let (grid_a, grid_b) = rayon::join(
            || self.voxelizer.voxelize_in(a, &spec),
            || self.voxelizer.voxelize_in(b, &spec),
        );
        let (grid_a, grid_b) = (grid_a?, grid_b?);

        let iou = intersection_over_union(&grid_a, &grid_b)?;
        log::debug!(
            "similarity {:.4}: overlap {} / union {} cells",
            iou.score,
            iou.overlap_cells,
            iou.union_cells
        );

        let vertex_colors = self.heatmap.then(|| {
            let levels = triangle_levels(a, &grid_b);
            vertex_colors(a, &levels)
        });

        Ok(SimilarityReport {
            score: iou.score,
            overlap_volume: iou.overlap_volume,
            union_volume: iou.union_volume,
            spec,
            vertex_colors,
        })
    }
}

/// Volumetric IoU of two meshes with the default parallel backend.
pub fn compute_similarity(a: &Mesh, b: &Mesh, resolution: u32) -> Result<f32, VoxelError> {
    SimilarityEngine::new(ParallelVoxelizer::default())
        .compare(a, b, resolution)
        .map(|report| report.score)
}

// ===============================================================================
// 可视化
// ===============================================================================

/// Per-triangle similarity level of `mesh` against `other`.
///
/// A triangle's level is the fraction of the cells it intersects that are
/// filled in `other`; a triangle touching no cell scores 0.
pub fn triangle_levels(mesh: &Mesh, other: &Grid) -> Vec<f32> {
    let spec = other.spec();
    (0..mesh.triangle_count())
        .into_par_iter()
        .map(|i| {
            let triangle = mesh.triangle(i);
            let (mut touched, mut matched) = (0u32, 0u32);
            spec.rasterize(&triangle, |cell| {
                touched += 1;
                if other.get(cell).is_some_and(|v| v.fill) {
                    matched += 1;
                }
            });
            if touched == 0 {
                0.0
            } else {
                matched as f32 / touched as f32
            }
        })
        .collect()
}

/// Red (`0`, dissimilar) to cyan (`1`, similar). The level is clamped first.
pub fn heat_color(level: f32) -> Vec4 {
    let l = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
    Vec4::new(1.0 - l, l, l, 1.0)
}

/// Averages the triangle colors over every vertex they share.
///
/// Vertices no triangle references get the level-0 color.
pub fn vertex_colors(mesh: &Mesh, levels: &[f32]) -> Vec<Vec4> {
    let mut sums = vec![Vec4::ZERO; mesh.vertices().len()];
    let mut counts = vec![0u32; mesh.vertices().len()];
    for (i, level) in levels.iter().enumerate().take(mesh.triangle_count()) {
        let color = heat_color(*level);
        for v in mesh.triangle_indices(i) {
            sums[v as usize] += color;
            counts[v as usize] += 1;
        }
    }
    sums.into_iter()
        .zip(counts)
        .map(|(sum, n)| if n == 0 { heat_color(0.0) } else { sum / n as f32 })
        .collect()
}
