//! Guest memory view
//!
//! A read-only accessor over the guest's linear memory. All multi-byte
//! reads are little-endian; every read is bounds-checked against the
//! current buffer size and fails with `MalformedMemory` rather than
//! clamping. Offsets handed across the boundary are only valid until the
//! guest grows its memory - the view re-reads the buffer on every access,
//! so growth invalidates nothing on this side.
//!
//! On wasm the view wraps the guest's `WebAssembly.Memory`; on native it
//! wraps a plain byte vector so decoders and tests run without a browser.

use super::error::{BridgeError, BridgeResult};

#[cfg(target_arch = "wasm32")]
use js_sys::{Float32Array, Uint8Array, WebAssembly};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

/// Read-only view over the guest's linear memory.
#[cfg(target_arch = "wasm32")]
pub struct GuestMemory {
    memory: WebAssembly::Memory,
}

#[cfg(not(target_arch = "wasm32"))]
pub struct GuestMemory {
    data: Vec<u8>,
}

impl GuestMemory {
    /// Fail unless `[address, address + len)` lies inside the buffer.
    fn check(&self, address: u32, len: u64) -> BridgeResult<()> {
        let size = self.byte_len() as u64;
        if address as u64 + len > size {
            return Err(BridgeError::MalformedMemory {
                address,
                reason: format!("read of {} bytes past end of {}-byte memory", len, size),
            });
        }
        Ok(())
    }

    /// Bounds-check a span of `count` f32 elements without reading it.
    pub fn check_f32_span(&self, address: u32, count: u32) -> BridgeResult<()> {
        self.check(address, count as u64 * 4)
    }

    pub fn read_u32(&self, address: u32) -> BridgeResult<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f32(&self, address: u32) -> BridgeResult<f32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Copy `count` f32 elements out of guest memory.
    pub fn read_f32_slice(&self, address: u32, count: u32) -> BridgeResult<Vec<f32>> {
        self.check_f32_span(address, count)?;
        let bytes = self.read_bytes(address, count * 4)?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }
}

#[cfg(target_arch = "wasm32")]
impl GuestMemory {
    pub fn new(memory: WebAssembly::Memory) -> Self {
        Self { memory }
    }

    /// Current size of the guest's memory in bytes.
    pub fn byte_len(&self) -> u32 {
        let buffer: js_sys::ArrayBuffer = self.memory.buffer().unchecked_into();
        buffer.byte_length()
    }

    /// Copy bytes out of guest memory.
    pub fn read_bytes(&self, address: u32, len: u32) -> BridgeResult<Vec<u8>> {
        self.check(address, len as u64)?;
        let view = Uint8Array::new_with_byte_offset_and_length(&self.memory.buffer(), address, len);
        Ok(view.to_vec())
    }

    /// Decode a null-terminated string. Fails if no terminator exists
    /// anywhere in the remaining buffer.
    pub fn read_cstr(&self, address: u32) -> BridgeResult<String> {
        let size = self.byte_len();
        let view = Uint8Array::new(&self.memory.buffer());
        let mut bytes = Vec::new();
        let mut at = address;
        while at < size {
            let byte = view.get_index(at);
            if byte == 0 {
                return Ok(String::from_utf8_lossy(&bytes).into_owned());
            }
            bytes.push(byte);
            at += 1;
        }
        Err(BridgeError::MalformedMemory {
            address,
            reason: "string missing null terminator".to_string(),
        })
    }

    /// Zero-copy f32 view over a span of guest memory, for buffer uploads.
    /// Invalidated if the guest grows its memory; consume immediately.
    pub fn float32_view(&self, address: u32, count: u32) -> BridgeResult<Float32Array> {
        self.check_f32_span(address, count)?;
        Ok(Float32Array::new_with_byte_offset_and_length(
            &self.memory.buffer(),
            address,
            count,
        ))
    }

    /// Zero-copy byte view over a span of guest memory.
    pub fn uint8_view(&self, address: u32, len: u32) -> BridgeResult<Uint8Array> {
        self.check(address, len as u64)?;
        Ok(Uint8Array::new_with_byte_offset_and_length(
            &self.memory.buffer(),
            address,
            len,
        ))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl GuestMemory {
    /// Build a view over raw bytes (tests).
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn byte_len(&self) -> u32 {
        self.data.len() as u32
    }

    pub fn read_bytes(&self, address: u32, len: u32) -> BridgeResult<Vec<u8>> {
        self.check(address, len as u64)?;
        let start = address as usize;
        Ok(self.data[start..start + len as usize].to_vec())
    }

    pub fn read_cstr(&self, address: u32) -> BridgeResult<String> {
        let start = address as usize;
        if start > self.data.len() {
            return Err(BridgeError::MalformedMemory {
                address,
                reason: "string starts past end of memory".to_string(),
            });
        }
        match self.data[start..].iter().position(|&b| b == 0) {
            Some(end) => Ok(String::from_utf8_lossy(&self.data[start..start + end]).into_owned()),
            None => Err(BridgeError::MalformedMemory {
                address,
                reason: "string missing null terminator".to_string(),
            }),
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn memory_with(bytes: &[u8]) -> GuestMemory {
        GuestMemory::from_bytes(bytes.to_vec())
    }

    #[test]
    fn test_read_u32_is_little_endian() {
        let mem = memory_with(&[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(mem.read_u32(0).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_read_f32() {
        let mem = memory_with(&1.5f32.to_le_bytes());
        assert_eq!(mem.read_f32(0).unwrap(), 1.5);
    }

    #[test]
    fn test_read_past_end_is_malformed() {
        let mem = memory_with(&[0; 8]);
        assert!(matches!(
            mem.read_u32(6),
            Err(BridgeError::MalformedMemory { address: 6, .. })
        ));
        assert!(matches!(
            mem.read_bytes(8, 1),
            Err(BridgeError::MalformedMemory { .. })
        ));
    }

    #[test]
    fn test_read_cstr() {
        let mem = memory_with(b"ignored\0position\0rest");
        assert_eq!(mem.read_cstr(0).unwrap(), "ignored");
        assert_eq!(mem.read_cstr(8).unwrap(), "position");
    }

    #[test]
    fn test_read_cstr_without_terminator_is_malformed() {
        let mem = memory_with(b"no terminator here");
        assert!(matches!(
            mem.read_cstr(3),
            Err(BridgeError::MalformedMemory { address: 3, .. })
        ));
    }

    #[test]
    fn test_read_f32_slice() {
        let mut bytes = Vec::new();
        for value in [0.0f32, 0.5, -1.0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        let mem = memory_with(&bytes);
        assert_eq!(mem.read_f32_slice(0, 3).unwrap(), vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_f32_span_check() {
        let mem = memory_with(&[0; 16]);
        assert!(mem.check_f32_span(0, 4).is_ok());
        assert!(mem.check_f32_span(4, 3).is_ok());
        assert!(mem.check_f32_span(4, 4).is_err());
        // A huge count must not wrap around the bounds check.
        assert!(mem.check_f32_span(0, u32::MAX).is_err());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use js_sys::{Object, Reflect};
    use wasm_bindgen::JsValue;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn memory_with(bytes: &[u8]) -> GuestMemory {
        let descriptor = Object::new();
        Reflect::set(&descriptor, &JsValue::from_str("initial"), &JsValue::from(1)).unwrap();
        let memory = WebAssembly::Memory::new(&descriptor).unwrap();
        let view = Uint8Array::new(&memory.buffer());
        for (i, byte) in bytes.iter().enumerate() {
            view.set_index(i as u32, *byte);
        }
        GuestMemory::new(memory)
    }

    #[wasm_bindgen_test]
    fn reads_little_endian_u32_from_wasm_memory() {
        let mem = memory_with(&[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(mem.read_u32(0).unwrap(), 0x1234_5678);
    }

    #[wasm_bindgen_test]
    fn float32_view_is_bounds_checked() {
        let mem = memory_with(&[0; 16]);
        assert!(mem.float32_view(0, 4).is_ok());
        let len = mem.byte_len();
        assert!(mem.float32_view(len - 4, 2).is_err());
    }
}
