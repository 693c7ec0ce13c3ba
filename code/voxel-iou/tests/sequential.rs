use glam::{UVec3, Vec3};
use voxel_iou::{Facing, Mesh, VoxelError, voxelize_sequential};

fn shell(r: u32) -> usize {
    ((r + 1).pow(3) - (r - 1).pow(3)) as usize
}

#[test]
fn cube_surface_is_a_shell() {
    let cube = Mesh::unit_cube();
    for r in 1..=8 {
        let grid = voxelize_sequential(&cube, r, true).unwrap();
        assert_eq!(grid.dims(), UVec3::splat(r + 1));
        assert_eq!(grid.filled_count(), shell(r), "resolution {r}");
    }
}

#[test]
fn cube_volume_is_solid() {
    let cube = Mesh::unit_cube();
    for r in 1..=8 {
        let grid = voxelize_sequential(&cube, r, false).unwrap();
        assert_eq!(grid.filled_count(), ((r + 1).pow(3)) as usize, "resolution {r}");
    }
}

#[test]
fn cube_facings() {
    let grid = voxelize_sequential(&Mesh::unit_cube(), 4, false).unwrap();
    let at = |x, y, z| *grid.get(UVec3::new(x, y, z)).unwrap();

    // only the bottom face reaches the bottom-center cell
    assert!(at(2, 2, 0).is_front_face());
    assert!(at(2, 2, 4).is_back_face());
    // a corner is shared with side faces, which win
    assert!(at(0, 0, 0).is_back_face());
    // interior
    let inner = at(2, 2, 2);
    assert!(inner.fill);
    assert_eq!(inner.facing, Facing::Unset);
    assert_eq!(inner.position, Vec3::splat(0.5));
}

#[test]
fn filled_cells_carry_their_center() {
    let grid = voxelize_sequential(&Mesh::unit_cube(), 4, true).unwrap();
    let spec = *grid.spec();
    for (cell, voxel) in grid.iter_filled() {
        assert_eq!(voxel.position, spec.center(cell));
    }
    assert_eq!(grid.filled_indices().len(), grid.filled_count());
    assert!(grid.get(UVec3::splat(2)).unwrap().is_empty());
    assert!(grid.get(UVec3::splat(5)).is_none());
}

#[test]
fn open_plane_is_not_filled() {
    let plane = Mesh::plane(1.0);
    let surface = voxelize_sequential(&plane, 4, true).unwrap();
    let volume = voxelize_sequential(&plane, 4, false).unwrap();
    assert_eq!(surface.dims(), UVec3::new(5, 5, 1));
    assert_eq!(surface.filled_count(), 25);
    assert_eq!(surface, volume);
    assert!(surface.voxels().iter().all(|v| v.is_back_face()));
}

#[test]
fn tetrahedron_interior() {
    let tetra = Mesh::tetrahedron();
    let surface = voxelize_sequential(&tetra, 8, true).unwrap();
    let volume = voxelize_sequential(&tetra, 8, false).unwrap();

    let inner = UVec3::new(1, 1, 1);
    assert!(surface.get(inner).unwrap().is_empty());
    assert!(volume.get(inner).unwrap().fill);
    assert!(volume.filled_count() > surface.filled_count());

    // volume only ever adds cells
    for (s, v) in surface.voxels().iter().zip(volume.voxels()) {
        if s.fill {
            assert_eq!(s, v);
        }
    }
    // nothing beyond the slanted face
    assert!(volume.get(UVec3::new(7, 7, 7)).unwrap().is_empty());
}

#[test]
fn mesh_without_triangles_gives_an_empty_grid() {
    let points = Mesh::new(vec![Vec3::ZERO, Vec3::ONE], vec![]).unwrap();
    let grid = voxelize_sequential(&points, 4, false).unwrap();
    assert_eq!(grid.dims(), UVec3::splat(5));
    assert_eq!(grid.filled_count(), 0);
}

#[test]
fn degenerate_triangle_does_not_panic() {
    let mesh = Mesh::new(
        vec![Vec3::ZERO, Vec3::splat(0.5), Vec3::ONE],
        vec![0, 1, 2],
    )
    .unwrap();
    let grid = voxelize_sequential(&mesh, 4, false).unwrap();
    assert!(grid.filled_count() >= 1);
}

#[test]
fn rejects_bad_input() {
    assert!(matches!(
        voxelize_sequential(&Mesh::default(), 4, false),
        Err(VoxelError::EmptyMesh)
    ));
    assert!(matches!(
        voxelize_sequential(&Mesh::unit_cube(), 0, false),
        Err(VoxelError::InvalidResolution(0))
    ));
    assert!(matches!(
        Mesh::new(vec![Vec3::ZERO], vec![0, 0]),
        Err(VoxelError::PartialTriangle(2))
    ));
    assert!(matches!(
        Mesh::new(vec![Vec3::ZERO, Vec3::X], vec![0, 1, 2]),
        Err(VoxelError::IndexOutOfRange {
            index: 2,
            vertex_count: 2
        })
    ));
}

#[test]
fn translation_keeps_the_shape() {
    let cube = Mesh::unit_cube();
    let moved = cube.translated(Vec3::new(8.0, -4.0, 2.0));
    let a = voxelize_sequential(&cube, 6, false).unwrap();
    let b = voxelize_sequential(&moved, 6, false).unwrap();
    assert_eq!(a.dims(), b.dims());
    assert_eq!(a.filled_indices(), b.filled_indices());
}
