// ===============================================================================
// 错误类型定义
// ===============================================================================

/// Voxelization and similarity errors.
///
/// All of these are precondition failures detected before a grid is filled,
/// except `Compute`, which wraps failures of the GPU backend.
#[derive(Debug, thiserror::Error)]
pub enum VoxelError {
    #[error("Resolution must be at least 1, got {0}")]
    InvalidResolution(u32),

    #[error("Mesh has no geometry to measure")]
    EmptyMesh,

    #[error("Degenerate grid: {0}")]
    DegenerateGrid(String),

    #[error("Grids do not share origin, unit and dimensions")]
    IncompatibleGrids,

    #[error("Index buffer length {0} is not a multiple of 3")]
    PartialTriangle(usize),

    #[error("Vertex index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error(transparent)]
    Compute(#[from] ComputeError),
}

/// GPU 计算错误类型
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error("No suitable GPU adapter: {0}")]
    AdapterUnavailable(String),

    #[error("Device request failed: {0}")]
    DeviceRequest(String),

    #[error("Workload exceeds device limits: {0}")]
    LimitExceeded(String),

    #[error("Buffer mapping failed: {0}")]
    BufferMap(String),

    #[error("GPU execution failed: {0}")]
    Execution(String),
}
