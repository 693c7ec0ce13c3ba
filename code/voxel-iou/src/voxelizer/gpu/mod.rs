//! wgpu compute backend.
//!
//! The same three stages as the host-parallel backend, each dispatched in its
//! own compute pass so that the cell buffer is complete before the next stage
//! reads it.

mod elem;

use std::sync::Arc;
use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::{ShaderStages, util::DeviceExt};

use self::elem::{GpuElement, padded_contents, padded_size};
use super::{FillMode, Voxelizer};
use crate::error::{ComputeError, VoxelError};
use crate::grid::{Grid, GridSpec};
use crate::mesh::Mesh;

const TRIANGLE_WORKGROUP: u32 = 64;
const COLUMN_WORKGROUP: u32 = 8;

/// Uniform block shared by all three entry points.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GridParams {
    origin: [f32; 3],
    unit: f32,
    dims: [u32; 3],
    triangle_count: u32,
}

impl GridParams {
    fn new(spec: &GridSpec, triangle_count: u32) -> Self {
        Self {
            origin: spec.origin().to_array(),
            unit: spec.unit(),
            dims: spec.dims().to_array(),
            triangle_count,
        }
    }

    fn min_binding_size() -> wgpu::BufferSize {
        const SIZE: wgpu::BufferSize = match wgpu::BufferSize::new(size_of::<GridParams>() as u64) {
            Some(size) => size,
            None => panic!("empty uniform block"),
        };
        SIZE
    }
}

/// GPU 体素化
#[derive(Clone)]
pub struct GpuVoxelizer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    fill: FillMode,
    surface_front: wgpu::ComputePipeline,
    surface_back: wgpu::ComputePipeline,
    volume: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuVoxelizer {
    /// Acquires an adapter and device of its own.
    pub async fn request(fill: FillMode) -> Result<Self, ComputeError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ComputeError::AdapterUnavailable(e.to_string()))?;
        let info = adapter.get_info();
        log::info!("gpu voxelizer on {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("voxelizer_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| ComputeError::DeviceRequest(e.to_string()))?;

        Ok(Self::new(Arc::new(device), Arc::new(queue), fill))
    }

    /// Builds the pipelines on an existing device.
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, fill: FillMode) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("voxelize.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("voxelize.wgsl").into()),
        });
        let storage = |binding, read_only, min_size| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: Some(min_size),
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("voxelize_layout"),
            entries: &[
                // binding 0: 网格参数
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(GridParams::min_binding_size()),
                    },
                    count: None,
                },
                // binding 1: vertices, vec3 padded to vec4
                storage(1, true, <Vec3 as GpuElement>::MIN_BINDING_SIZE),
                // binding 2: indices
                storage(2, true, <u32 as GpuElement>::MIN_BINDING_SIZE),
                // binding 3: cell flags
                storage(3, false, <u32 as GpuElement>::MIN_BINDING_SIZE),
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("voxelize_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = |entry_point: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry_point),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };
        let surface_front = pipeline("surface_front");
        let surface_back = pipeline("surface_back");
        let volume = pipeline("volume");

        Self {
            device,
            queue,
            fill,
            surface_front,
            surface_back,
            volume,
            bind_group_layout,
        }
    }

    fn check_limits(&self, spec: &GridSpec, triangle_count: usize) -> Result<(), ComputeError> {
        let limits = self.device.limits();
        let cell_bytes = padded_size::<u32>(spec.len());
        if cell_bytes > limits.max_storage_buffer_binding_size as u64 {
            log::warn!(
                "grid of {} cells needs {cell_bytes} bytes, limit is {}",
                spec.len(),
                limits.max_storage_buffer_binding_size
            );
            return Err(ComputeError::LimitExceeded(format!(
                "{} cells exceed the storage binding limit",
                spec.len()
            )));
        }
        let groups = (triangle_count as u64).div_ceil(TRIANGLE_WORKGROUP as u64);
        let columns = (spec.dims().x.max(spec.dims().y) as u64).div_ceil(COLUMN_WORKGROUP as u64);
        let max_groups = limits.max_compute_workgroups_per_dimension as u64;
        if groups > max_groups || columns > max_groups {
            log::warn!("dispatch of {groups} triangle groups / {columns} column groups rejected");
            return Err(ComputeError::LimitExceeded(format!(
                "{triangle_count} triangles on a {}x{} column grid",
                spec.dims().x,
                spec.dims().y
            )));
        }
        Ok(())
    }

    /// Copies the cell buffer back to the host.
    fn read_cells(&self, cells: &wgpu::Buffer, len: usize) -> Result<Vec<u32>, ComputeError> {
        let size = padded_size::<u32>(len);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cells_staging"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cells_readback"),
            });
        encoder.copy_buffer_to_buffer(cells, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| ComputeError::Execution(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| ComputeError::BufferMap(e.to_string()))?
            .map_err(|e| ComputeError::BufferMap(e.to_string()))?;

        let data = slice.get_mapped_range();
        let words: &[u32] = bytemuck::cast_slice(&data);
        let flags = words[..len].to_vec();
        drop(data);
        staging.unmap();
        Ok(flags)
    }
}

impl Voxelizer for GpuVoxelizer {
    fn fill_mode(&self) -> FillMode {
        self.fill
    }

    fn voxelize_in(&self, mesh: &Mesh, spec: &GridSpec) -> Result<Grid, VoxelError> {
        let triangle_count = mesh.triangle_count();
        self.check_limits(spec, triangle_count)?;
        let device = &self.device;

        let params = GridParams::new(spec, triangle_count as u32);
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vertices"),
            contents: bytemuck::cast_slice(&padded_contents(mesh.vertices())),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("indices"),
            contents: bytemuck::cast_slice(&padded_contents(mesh.indices())),
            usage: wgpu::BufferUsages::STORAGE,
        });
        // 用零初始化：所有体素为空
        let cell_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cells"),
            contents: &vec![0u8; padded_size::<u32>(spec.len()) as usize],
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("voxelize_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: vertex_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: index_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: cell_buffer.as_entire_binding(),
                },
            ],
        });

        let triangle_groups = (triangle_count as u32).div_ceil(TRIANGLE_WORKGROUP);
        let dims = spec.dims();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("voxelize_encoder"),
        });

        let mut stages: Vec<(&str, &wgpu::ComputePipeline, [u32; 3])> = vec![
            ("surface_front", &self.surface_front, [triangle_groups, 1, 1]),
            ("surface_back", &self.surface_back, [triangle_groups, 1, 1]),
        ];
        if self.fill == FillMode::Volume {
            stages.push((
                "volume",
                &self.volume,
                [
                    dims.x.div_ceil(COLUMN_WORKGROUP),
                    dims.y.div_ceil(COLUMN_WORKGROUP),
                    1,
                ],
            ));
        }
        // 每个阶段一个 compute pass：阶段之间即同步屏障
        for (label, pipeline, [x, y, z]) in stages {
            if x == 0 || y == 0 {
                continue;
            }
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(x, y, z);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        let flags = self.read_cells(&cell_buffer, spec.len())?;
        let grid = Grid::from_flags(*spec, flags);
        log::debug!(
            "gpu: {} triangles -> {}x{}x{} grid, {} filled",
            triangle_count,
            dims.x,
            dims.y,
            dims.z,
            grid.filled_count()
        );
        Ok(grid)
    }
}
