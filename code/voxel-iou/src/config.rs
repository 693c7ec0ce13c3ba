use crate::error::VoxelError;
use crate::voxelizer::{FillMode, GpuVoxelizer, ParallelVoxelizer, SequentialVoxelizer, Voxelizer};

/// Cells along the longest bounding-box axis when nothing else is asked for.
pub const DEFAULT_RESOLUTION: u32 = 64;

/// Execution strategy for a voxelization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    Sequential,
    #[default]
    Parallel,
    Gpu,
}

/// Per-call voxelization settings. Nothing here is process-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelizerConfig {
    pub resolution: u32,
    pub fill: FillMode,
    pub backend: Backend,
}

impl Default for VoxelizerConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            fill: FillMode::Volume,
            backend: Backend::Parallel,
        }
    }
}

impl VoxelizerConfig {
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution,
            ..Default::default()
        }
    }

    pub fn with_fill(mut self, fill: FillMode) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn validate(&self) -> Result<(), VoxelError> {
        if self.resolution == 0 {
            return Err(VoxelError::InvalidResolution(self.resolution));
        }
        Ok(())
    }

    /// Instantiates the configured backend. The GPU backend blocks while it
    /// acquires a device.
    pub fn build(&self) -> Result<Box<dyn Voxelizer>, VoxelError> {
        self.validate()?;
        let voxelizer: Box<dyn Voxelizer> = match self.backend {
            Backend::Sequential => Box::new(SequentialVoxelizer::new(self.fill)),
            Backend::Parallel => Box::new(ParallelVoxelizer::new(self.fill)),
            Backend::Gpu => Box::new(pollster::block_on(GpuVoxelizer::request(self.fill))?),
        };
        Ok(voxelizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = VoxelizerConfig::default();
        assert_eq!(config.resolution, 64);
        assert_eq!(config.fill, FillMode::Volume);
        assert_eq!(config.backend, Backend::Parallel);
    }

    #[test]
    fn zero_resolution_is_rejected_before_building() {
        let config = VoxelizerConfig::new(0).with_backend(Backend::Gpu);
        assert!(matches!(config.validate(), Err(VoxelError::InvalidResolution(0))));
        assert!(matches!(config.build(), Err(VoxelError::InvalidResolution(0))));
    }

    #[test]
    fn builds_cpu_backends() {
        for backend in [Backend::Sequential, Backend::Parallel] {
            let voxelizer = VoxelizerConfig::new(8)
                .with_backend(backend)
                .with_fill(FillMode::SurfaceOnly)
                .build()
                .unwrap();
            assert_eq!(voxelizer.fill_mode(), FillMode::SurfaceOnly);
        }
    }
}
