//! Uniform block layout
//!
//! Blocks are sized at creation and never reallocated: whichever is larger
//! of the requested size and the GL-reported minimum for the named block.
//! New blocks come up zero-filled with a 4x4 identity matrix at the head,
//! so a guest that forgets its first upload still draws with a sane
//! transform.

#[cfg(target_arch = "wasm32")]
use web_sys::WebGlBuffer;

/// The 4x4 identity pre-seeded at the head of every new block.
pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Allocation size in bytes for a block: the larger of the requested size
/// and the device-reported minimum, rounded up to whole f32s.
pub fn block_byte_len(requested: usize, minimum: usize) -> usize {
    requested.max(minimum).div_ceil(4) * 4
}

/// Initial block contents: zero-filled, identity at offset 0.
pub fn initial_contents(byte_len: usize) -> Vec<f32> {
    let mut data = vec![0.0f32; byte_len / 4];
    for (slot, value) in data.iter_mut().zip(IDENTITY) {
        *slot = value;
    }
    data
}

/// A GPU-resident parameter buffer bound at the global binding slot.
/// Mutable via whole or partial overwrite; size fixed at creation.
#[cfg(target_arch = "wasm32")]
pub struct UniformBlock {
    buffer: WebGlBuffer,
    byte_len: usize,
}

#[cfg(target_arch = "wasm32")]
impl UniformBlock {
    pub(crate) fn new(buffer: WebGlBuffer, byte_len: usize) -> Self {
        Self { buffer, byte_len }
    }

    pub fn raw(&self) -> &WebGlBuffer {
        &self.buffer
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}
