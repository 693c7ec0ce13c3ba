//! Triangle / box primitives and the separating-axis intersection tests.

use glam::Vec3;

/// Direction the interior-fill pass scans along.
pub const SCAN_DIRECTION: Vec3 = Vec3::Z;

// ===============================================================================
// Aabb
// ===============================================================================

/// Axis-aligned box given by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = Self::new(*first, *first);
        for p in rest {
            aabb.min = aabb.min.min(*p);
            aabb.max = aabb.max.max(*p);
        }
        Some(aabb)
    }

    /// Component-wise min of minimums, max of maximums.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb::new(self.min + offset, self.max + offset)
    }
}

// ===============================================================================
// Triangle
// ===============================================================================

/// 光栅化期间使用的临时三角形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
    /// Normal points against [`SCAN_DIRECTION`]: the scan enters the solid here.
    pub front_facing: bool,
    pub bounds: Aabb,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a);
        Self {
            a,
            b,
            c,
            front_facing: normal.dot(SCAN_DIRECTION) < 0.0,
            bounds: Aabb::new(a.min(b).min(c), a.max(b).max(c)),
        }
    }

    /// Unnormalized normal, zero for degenerate triangles.
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a).cross(self.c - self.a)
    }

    pub fn translated(&self, offset: Vec3) -> Triangle {
        Triangle::new(self.a + offset, self.b + offset, self.c + offset)
    }
}

/// Plane `{ p | dot(normal, p) == distance }`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Supporting plane of a triangle. The normal is not normalized.
    pub fn from_triangle(triangle: &Triangle) -> Self {
        let normal = triangle.normal();
        Self::new(normal, normal.dot(triangle.a))
    }
}

// ===============================================================================
// Intersection tests
// ===============================================================================

/// Tests if a plane intersects an AABB.
///
/// Touching counts as intersecting.
pub fn intersection_test_aabb_plane(aabb: &Aabb, plane: &Plane) -> bool {
    let extent = aabb.half_extents().dot(plane.normal.abs());
    let s = plane.normal.dot(aabb.center()) - plane.distance;
    s.abs() <= extent
}

/// Tests if a triangle intersects an AABB.
///
/// Separating-axis test over the 3 box face normals, the 9 cross products of
/// the triangle edges with the box axes, and the triangle's supporting plane.
/// A zero-width overlap on every axis is reported as an intersection so that
/// surfaces lying exactly on cell boundaries leave no gaps.
pub fn intersection_test_aabb_triangle(aabb: &Aabb, triangle: &Triangle) -> bool {
    let center = aabb.center();
    let half = aabb.half_extents();

    // Work in the box frame.
    let v0 = triangle.a - center;
    let v1 = triangle.b - center;
    let v2 = triangle.c - center;

    // Box face normals: plain interval overlap per axis.
    let lo = v0.min(v1).min(v2);
    let hi = v0.max(v1).max(v2);
    if lo.cmpgt(half).any() || hi.cmplt(-half).any() {
        return false;
    }

    // Box axes crossed with the triangle edges.
    for edge in [v1 - v0, v2 - v1, v0 - v2] {
        if edge_axes_separate(edge, v0, v1, v2, half) {
            return false;
        }
    }

    let normal = (v1 - v0).cross(v2 - v1);
    let plane = Plane::new(normal, normal.dot(v0));
    intersection_test_aabb_plane(&Aabb::new(-half, half), &plane)
}

/// `X × e`, `Y × e` and `Z × e`, written out.
#[inline]
fn edge_axes_separate(edge: Vec3, v0: Vec3, v1: Vec3, v2: Vec3, half: Vec3) -> bool {
    let axes = [
        Vec3::new(0.0, -edge.z, edge.y),
        Vec3::new(edge.z, 0.0, -edge.x),
        Vec3::new(-edge.y, edge.x, 0.0),
    ];
    axes.into_iter().any(|axis| {
        let p0 = v0.dot(axis);
        let p1 = v1.dot(axis);
        let p2 = v2.dot(axis);
        let r = half.dot(axis.abs());
        p0.min(p1).min(p2) > r || p0.max(p1).max(p2) < -r
    })
}
