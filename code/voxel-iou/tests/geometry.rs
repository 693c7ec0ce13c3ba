use glam::Vec3;
use voxel_iou::geometry::{intersection_test_aabb_plane, intersection_test_aabb_triangle};
use voxel_iou::{Aabb, Plane, Triangle};

fn unit_box() -> Aabb {
    Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))
}

fn tri(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Triangle {
    Triangle::new(Vec3::from(a), Vec3::from(b), Vec3::from(c))
}

/// (triangle, expected) pairs against `unit_box()`. All coordinates are
/// dyadic so every projection is exact.
fn cases() -> Vec<(Triangle, bool)> {
    vec![
        // fully inside
        (tri([-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.0, 0.5, 0.0]), true),
        // far away on +x
        (tri([3.0, 0.0, 0.0], [4.0, 0.0, 0.0], [3.0, 1.0, 0.0]), false),
        // large triangle enclosing the box cross-section, no vertex inside
        (tri([-8.0, -8.0, 0.25], [8.0, -8.0, 0.25], [0.0, 8.0, 0.25]), true),
        // lying exactly on the +z face
        (tri([-0.5, -0.5, 1.0], [0.5, -0.5, 1.0], [0.0, 0.5, 1.0]), true),
        // just above the +z face
        (tri([-0.5, -0.5, 1.25], [0.5, -0.5, 1.25], [0.0, 0.5, 1.25]), false),
        // bounds overlap, hypotenuse x + y = 2.5 passes beyond the (1, 1) edge
        (tri([2.0, 0.5, 0.0], [0.5, 2.0, 0.0], [2.0, 2.0, 0.0]), false),
        // hypotenuse x + y = 2 touches the box edge at (1, 1)
        (tri([1.5, 0.5, 0.0], [0.5, 1.5, 0.0], [1.5, 1.5, 0.0]), true),
        // plane x + y + z = 3.25 misses the (1, 1, 1) corner
        (tri([1.75, 1.5, 0.0], [1.5, 0.0, 1.75], [0.0, 1.75, 1.5]), false),
        // plane x + y + z = 3 touches the corner at the centroid
        (tri([1.5, 1.5, 0.0], [1.5, 0.0, 1.5], [0.0, 1.5, 1.5]), true),
        // degenerate: all three vertices equal, inside / outside
        (tri([0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, 0.5]), true),
        (tri([1.5, 0.5, 0.5], [1.5, 0.5, 0.5], [1.5, 0.5, 0.5]), false),
        // degenerate: collinear segment crossing the box
        (tri([-2.0, 0.0, 0.0], [0.0, 0.0, 0.0], [2.0, 0.0, 0.0]), true),
    ]
}

#[test]
fn triangle_box_cases() {
    let aabb = unit_box();
    for (i, (triangle, expected)) in cases().into_iter().enumerate() {
        assert_eq!(
            intersection_test_aabb_triangle(&aabb, &triangle),
            expected,
            "case {i}: {triangle:?}"
        );
    }
}

#[test]
fn triangle_box_is_translation_invariant() {
    let offsets = [
        Vec3::new(3.0, -7.0, 12.0),
        Vec3::new(0.5, 0.25, -4.0),
        Vec3::new(-16.0, 0.0, 0.125),
    ];
    for offset in offsets {
        let aabb = unit_box().translated(offset);
        for (i, (triangle, expected)) in cases().into_iter().enumerate() {
            assert_eq!(
                intersection_test_aabb_triangle(&aabb, &triangle.translated(offset)),
                expected,
                "case {i} moved by {offset}"
            );
        }
    }
}

#[test]
fn vertex_order_does_not_matter() {
    let aabb = unit_box();
    for (triangle, expected) in cases() {
        let flipped = Triangle::new(triangle.a, triangle.c, triangle.b);
        assert_eq!(intersection_test_aabb_triangle(&aabb, &flipped), expected);
        if triangle.normal().z != 0.0 {
            assert_ne!(flipped.front_facing, triangle.front_facing);
        }
    }
}

#[test]
fn plane_box() {
    let aabb = unit_box();
    assert!(intersection_test_aabb_plane(&aabb, &Plane::new(Vec3::Z, 0.5)));
    assert!(intersection_test_aabb_plane(&aabb, &Plane::new(Vec3::Z, 1.0)));
    assert!(!intersection_test_aabb_plane(&aabb, &Plane::new(Vec3::Z, 1.5)));
    // diagonal plane through the corner (1, 1, 1)
    assert!(intersection_test_aabb_plane(&aabb, &Plane::new(Vec3::ONE, 3.0)));
    assert!(!intersection_test_aabb_plane(&aabb, &Plane::new(Vec3::ONE, 3.5)));
}

#[test]
fn plane_from_triangle() {
    let triangle = tri([0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [0.0, 1.0, 2.0]);
    let plane = Plane::from_triangle(&triangle);
    assert_eq!(plane.normal, Vec3::Z);
    assert_eq!(plane.distance, 2.0);
}

#[test]
fn facing_follows_the_scan_direction() {
    // normal -Z: the scan along +Z enters here
    assert!(tri([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]).front_facing);
    // normal +Z
    assert!(!tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]).front_facing);
    // vertical wall counts as back-facing
    assert!(!tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]).front_facing);
}

#[test]
fn aabb_helpers() {
    let points = [Vec3::new(1.0, -2.0, 0.5), Vec3::new(-1.0, 3.0, 0.0)];
    let aabb = Aabb::from_points(&points).unwrap();
    assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
    assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 0.5));
    assert!(Aabb::from_points(&[]).is_none());

    let other = Aabb::new(Vec3::splat(2.0), Vec3::splat(4.0));
    let union = aabb.union(&other);
    assert_eq!(union.min, Vec3::new(-1.0, -2.0, 0.0));
    assert_eq!(union.max, Vec3::new(4.0, 4.0, 4.0));
    assert_eq!(union, other.union(&aabb));
}
