use std::sync::Arc;

use glam::Vec3;
use voxel_iou::{
    FillMode, GpuVoxelizer, Mesh, SequentialVoxelizer, SimilarityEngine, Voxelizer,
    voxelize_sequential,
};

/// Initialize WGPU device and queue for testing. `None` when the machine has
/// no adapter, in which case the caller skips.
async fn init_wgpu() -> Option<(Arc<wgpu::Device>, Arc<wgpu::Queue>)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok()?;

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            label: None,
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .expect("Failed to create device");

    Some((Arc::new(device), Arc::new(queue)))
}

macro_rules! gpu_or_skip {
    ($fill:expr) => {
        match init_wgpu().await {
            Some((device, queue)) => GpuVoxelizer::new(device, queue, $fill),
            None => {
                eprintln!("no wgpu adapter, skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn cube_matches_sequential() {
    let gpu = gpu_or_skip!(FillMode::Volume);
    let cube = Mesh::unit_cube();
    for r in [1, 2, 4, 8] {
        let expected = voxelize_sequential(&cube, r, false).unwrap();
        let actual = gpu.voxelize(&cube, r).unwrap();
        assert_eq!(actual, expected, "resolution {r}");
        assert_eq!(actual.filled_count(), ((r + 1).pow(3)) as usize);
    }
}

#[tokio::test]
async fn surface_only_matches_sequential() {
    let gpu = gpu_or_skip!(FillMode::SurfaceOnly);
    for mesh in [Mesh::unit_cube(), Mesh::tetrahedron(), Mesh::plane(1.0)] {
        let expected = voxelize_sequential(&mesh, 8, true).unwrap();
        let actual = gpu.voxelize(&mesh, 8).unwrap();
        assert_eq!(actual, expected);
    }
}

#[tokio::test]
async fn tetrahedron_volume() {
    let gpu = gpu_or_skip!(FillMode::Volume);
    let tetra = Mesh::tetrahedron();
    let expected = voxelize_sequential(&tetra, 8, false).unwrap();
    let actual = gpu.voxelize(&tetra, 8).unwrap();
    assert_eq!(actual, expected);
    assert!(actual.get(glam::UVec3::ONE).unwrap().fill);
}

#[tokio::test]
async fn mesh_without_triangles() {
    let gpu = gpu_or_skip!(FillMode::Volume);
    let points = Mesh::new(vec![Vec3::ZERO, Vec3::ONE], vec![]).unwrap();
    let grid = gpu.voxelize(&points, 4).unwrap();
    assert_eq!(grid.filled_count(), 0);
}

#[tokio::test]
async fn similarity_on_gpu() {
    let gpu = gpu_or_skip!(FillMode::Volume);
    let a = Mesh::unit_cube();
    let b = a.translated(Vec3::new(0.5, 0.0, 0.0));
    let on_gpu = SimilarityEngine::new(gpu).compare(&a, &b, 8).unwrap();
    let on_cpu = SimilarityEngine::new(SequentialVoxelizer::default())
        .compare(&a, &b, 8)
        .unwrap();
    assert_eq!(on_gpu.score, on_cpu.score);
}
