use bitflags::bitflags;
use glam::{UVec3, Vec3};

use crate::error::VoxelError;
use crate::geometry::{Aabb, Triangle};

// ===============================================================================
// 网格尺寸
// ===============================================================================

/// Upper bound on the host memory of one [`Grid`], in bytes (4 GiB).
///
/// Sizing refuses anything larger with [`VoxelError::DegenerateGrid`], so a
/// huge resolution fails before any cell buffer is allocated.
pub const MAX_GRID_BYTES: u64 = 1 << 32;

/// Origin, cubic cell size and dimensions of an occupancy grid.
///
/// Cell `(x, y, z)` covers `[origin + (x,y,z)*unit, origin + (x,y,z)*unit + unit]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    origin: Vec3,
    unit: f32,
    dims: UVec3,
}

impl GridSpec {
    /// Sizes a grid around `bounds`.
    ///
    /// `resolution` cells span the longest axis; shorter axes get proportionally
    /// fewer cells. The grid is padded by half a cell on every side, so each axis
    /// holds `ceil((extent + unit) / unit)` cells.
    pub fn from_bounds(bounds: &Aabb, resolution: u32) -> Result<Self, VoxelError> {
        if resolution == 0 {
            return Err(VoxelError::InvalidResolution(resolution));
        }
        let size = bounds.size();
        if size.is_nan() || size.cmplt(Vec3::ZERO).any() {
            return Err(VoxelError::DegenerateGrid(format!(
                "malformed bounds {:?}..{:?}",
                bounds.min, bounds.max
            )));
        }
        let longest = size.max_element();
        let unit = longest / resolution as f32;
        if !(unit > 0.0 && unit.is_finite()) {
            return Err(VoxelError::DegenerateGrid(format!(
                "extent {longest} gives unit {unit}"
            )));
        }

        // (extent + unit) / unit == extent / longest * resolution + 1, which is
        // exactly resolution + 1 on the longest axis.
        let cells = (size / longest * resolution as f32).ceil() + Vec3::ONE;
        let dims = cells.as_uvec3();
        let total = (dims.x as u64)
            .checked_mul(dims.y as u64)
            .and_then(|n| n.checked_mul(dims.z as u64))
            .filter(|&n| n > 0 && n <= u32::MAX as u64);
        let Some(total) = total else {
            return Err(VoxelError::DegenerateGrid(format!(
                "dimensions {}x{}x{}",
                dims.x, dims.y, dims.z
            )));
        };
        let bytes = total.saturating_mul(size_of::<Voxel>() as u64);
        if bytes > MAX_GRID_BYTES {
            return Err(VoxelError::DegenerateGrid(format!(
                "{total} cells need {bytes} bytes, limit is {MAX_GRID_BYTES}"
            )));
        }

        Ok(Self {
            origin: bounds.min - Vec3::splat(unit * 0.5),
            unit,
            dims,
        })
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn unit(&self) -> f32 {
        self.unit
    }

    pub fn unit_volume(&self) -> f32 {
        self.unit * self.unit * self.unit
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.dims.x as usize * self.dims.y as usize * self.dims.z as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index `z*(width*height) + y*width + x`. Bounds are the caller's
    /// responsibility; every cell handed out by this type is in range.
    #[inline]
    pub fn index(&self, cell: UVec3) -> usize {
        let (w, h) = (self.dims.x as usize, self.dims.y as usize);
        cell.z as usize * (w * h) + cell.y as usize * w + cell.x as usize
    }

    #[inline]
    pub fn cell(&self, index: usize) -> UVec3 {
        let (w, h) = (self.dims.x as usize, self.dims.y as usize);
        UVec3::new(
            (index % w) as u32,
            ((index / w) % h) as u32,
            (index / (w * h)) as u32,
        )
    }

    pub fn cell_box(&self, cell: UVec3) -> Aabb {
        let min = self.origin + cell.as_vec3() * self.unit;
        Aabb::new(min, min + Vec3::splat(self.unit))
    }

    pub fn center(&self, cell: UVec3) -> Vec3 {
        self.origin + (cell.as_vec3() + Vec3::splat(0.5)) * self.unit
    }

    /// Inclusive range of cells whose boxes may touch `aabb`, clamped to the
    /// grid. `None` when the box lies entirely outside.
    pub fn cell_range(&self, aabb: &Aabb) -> Option<(UVec3, UVec3)> {
        let lo = ((aabb.min - self.origin) / self.unit).ceil() - Vec3::ONE;
        let hi = ((aabb.max - self.origin) / self.unit).floor();
        let top = (self.dims - UVec3::ONE).as_vec3();
        if lo.is_nan() || hi.is_nan() || hi.cmplt(Vec3::ZERO).any() || lo.cmpgt(top).any() {
            return None;
        }
        Some((
            lo.clamp(Vec3::ZERO, top).as_uvec3(),
            hi.clamp(Vec3::ZERO, top).as_uvec3(),
        ))
    }

    /// Calls `hit` for every cell the triangle intersects.
    pub fn rasterize(&self, triangle: &Triangle, mut hit: impl FnMut(UVec3)) {
        let Some((lo, hi)) = self.cell_range(&triangle.bounds) else {
            return;
        };
        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let cell = UVec3::new(x, y, z);
                    if crate::geometry::intersection_test_aabb_triangle(
                        &self.cell_box(cell),
                        triangle,
                    ) {
                        hit(cell);
                    }
                }
            }
        }
    }
}

// ===============================================================================
// 体素
// ===============================================================================

/// Surface orientation of a filled cell relative to the scan direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Facing {
    /// Empty cells and interior-filled cells.
    #[default]
    Unset,
    Front,
    Back,
}

impl Facing {
    pub fn of(triangle: &Triangle) -> Self {
        if triangle.front_facing {
            Facing::Front
        } else {
            Facing::Back
        }
    }

    /// Conservative AND: a cell stays front-facing only while every covering
    /// triangle agrees.
    pub fn merge(self, other: Facing) -> Facing {
        match (self, other) {
            (Facing::Unset, f) | (f, Facing::Unset) => f,
            (Facing::Front, Facing::Front) => Facing::Front,
            _ => Facing::Back,
        }
    }
}

bitflags! {
    /// Per-cell state word shared by the concurrent backends.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CellFlags: u32 {
        const FILLED = 0b001;
        const FRONT  = 0b010;
        const BACK   = 0b100;
    }
}

impl CellFlags {
    /// `BACK` wins over `FRONT`, which reproduces [`Facing::merge`] whatever
    /// the order of the writes.
    pub fn facing(self) -> Facing {
        if self.contains(CellFlags::BACK) {
            Facing::Back
        } else if self.contains(CellFlags::FRONT) {
            Facing::Front
        } else {
            Facing::Unset
        }
    }

    /// Column-scan view: `None` for an empty cell.
    pub fn surface(self) -> Option<Facing> {
        self.contains(CellFlags::FILLED).then(|| self.facing())
    }
}

/// 单个体素
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Voxel {
    /// Cell center, set when the cell is filled.
    pub position: Vec3,
    pub fill: bool,
    pub facing: Facing,
}

impl Voxel {
    pub fn is_empty(&self) -> bool {
        !self.fill
    }

    pub fn is_front_face(&self) -> bool {
        self.fill && self.facing == Facing::Front
    }

    pub fn is_back_face(&self) -> bool {
        self.fill && self.facing == Facing::Back
    }

    /// Column-scan view: `None` for an empty cell.
    pub fn surface(&self) -> Option<Facing> {
        self.fill.then_some(self.facing)
    }
}

// ===============================================================================
// 占据网格
// ===============================================================================

/// Dense occupancy grid stored as one flat buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    spec: GridSpec,
    voxels: Vec<Voxel>,
}

impl Grid {
    /// All-empty grid. Fails instead of aborting when the allocator refuses
    /// the cell buffer.
    pub fn new(spec: GridSpec) -> Result<Self, VoxelError> {
        let mut voxels = Vec::new();
        voxels.try_reserve_exact(spec.len()).map_err(|e| {
            VoxelError::DegenerateGrid(format!("{} cells: {e}", spec.len()))
        })?;
        voxels.resize(spec.len(), Voxel::default());
        Ok(Self { spec, voxels })
    }

    /// Decodes the flag words produced by the concurrent backends.
    pub fn from_flags(spec: GridSpec, flags: impl IntoIterator<Item = u32>) -> Self {
        let voxels = flags
            .into_iter()
            .enumerate()
            .map(|(i, bits)| {
                let flags = CellFlags::from_bits_truncate(bits);
                if flags.contains(CellFlags::FILLED) {
                    Voxel {
                        position: spec.center(spec.cell(i)),
                        fill: true,
                        facing: flags.facing(),
                    }
                } else {
                    Voxel::default()
                }
            })
            .collect();
        Self { spec, voxels }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn unit(&self) -> f32 {
        self.spec.unit
    }

    pub fn origin(&self) -> Vec3 {
        self.spec.origin
    }

    pub fn dims(&self) -> UVec3 {
        self.spec.dims
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn get(&self, cell: UVec3) -> Option<&Voxel> {
        if cell.cmpge(self.spec.dims).any() {
            return None;
        }
        self.voxels.get(self.spec.index(cell))
    }

    pub fn filled_count(&self) -> usize {
        self.voxels.iter().filter(|v| v.fill).count()
    }

    /// Flat indices of all filled cells, ascending.
    pub fn filled_indices(&self) -> Vec<usize> {
        self.voxels
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.fill.then_some(i))
            .collect()
    }

    pub fn iter_filled(&self) -> impl Iterator<Item = (UVec3, &Voxel)> + '_ {
        self.voxels
            .iter()
            .enumerate()
            .filter(|(_, v)| v.fill)
            .map(|(i, v)| (self.spec.cell(i), v))
    }

    /// Marks a surface hit, merging the facing with what the cell already holds.
    pub(crate) fn mark_surface(&mut self, cell: UVec3, facing: Facing) {
        let position = self.spec.center(cell);
        let voxel = &mut self.voxels[self.spec.index(cell)];
        voxel.facing = if voxel.fill {
            voxel.facing.merge(facing)
        } else {
            facing
        };
        voxel.fill = true;
        voxel.position = position;
    }

    pub(crate) fn mark_interior(&mut self, cell: UVec3) {
        let position = self.spec.center(cell);
        let voxel = &mut self.voxels[self.spec.index(cell)];
        voxel.fill = true;
        voxel.position = position;
    }
}
