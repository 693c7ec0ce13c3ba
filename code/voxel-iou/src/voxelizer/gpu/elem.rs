use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use wgpu::BufferSize;

// ============================================================================
// 1. 统一的 compile-time stride 计算器
// ============================================================================
const fn gpu_stride(bytes: usize) -> usize {
    match bytes {
        0..=4 => 4,
        5..=8 => 8,
        9..=12 => 16,
        _ => bytes.div_ceil(16) * 16,
    }
}

const fn stride_to_bufsize(n: usize) -> BufferSize {
    match BufferSize::new(n as u64) {
        Some(size) => size,
        None => panic!("zero stride"),
    }
}

// ============================================================================
// 2. Trait：storage buffer 元素及其对齐后的表示
// ============================================================================
pub trait GpuElement: Copy + Send + Sync + 'static {
    /// 对齐后的类型 (padded)
    type Padded: Pod + Zeroable;

    /// 将原始类型填充到对齐类型
    fn pad(v: Self) -> Self::Padded;

    const SIZE: usize = core::mem::size_of::<Self::Padded>();
    const STRIDE_SIZE: usize = gpu_stride(Self::SIZE);
    const MIN_BINDING_SIZE: BufferSize = stride_to_bufsize(Self::STRIDE_SIZE);
}

impl GpuElement for u32 {
    type Padded = u32;
    #[inline]
    fn pad(v: Self) -> Self::Padded {
        v
    }
}

// vec3<f32> in a storage array has a 16 byte stride
impl GpuElement for Vec3 {
    type Padded = Vec4;
    #[inline]
    fn pad(v: Self) -> Self::Padded {
        v.extend(0.0)
    }
}

/// Pads every element. Never empty: zero-sized bindings are rejected, so an
/// empty input yields one zeroed element.
pub fn padded_contents<E: GpuElement>(items: &[E]) -> Vec<E::Padded> {
    if items.is_empty() {
        return vec![E::Padded::zeroed()];
    }
    items.iter().map(|v| E::pad(*v)).collect()
}

/// 计算满足 GPU 对齐要求的缓冲区大小
#[inline]
pub fn padded_size<E: GpuElement>(count: usize) -> u64 {
    let stride = E::STRIDE_SIZE as u64;
    (count as u64).saturating_mul(stride).max(stride)
}
