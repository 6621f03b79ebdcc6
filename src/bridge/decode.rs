//! Struct decoders
//!
//! The guest describes geometry with C structs laid out in its own linear
//! memory; these decoders reconstruct host-level records from the fixed
//! byte layouts documented on [`crate::bridge`]. Decoding never reads past
//! a declared count, and every span is bounds-checked before it is
//! trusted. What the counts themselves claim is the guest's problem: a
//! corrupt element count desynchronizes every later buffer entry, and the
//! only defense taken here is surfacing `MalformedMemory` when a walk
//! leaves the buffer.

use super::error::BridgeResult;
use super::memory::GuestMemory;

/// Fixed stride of an attribute descriptor in guest memory.
pub const ATTRIBUTE_STRIDE: u32 = 24;

/// Size of the geometry descriptor header in guest memory.
pub const GEOMETRY_HEADER: u32 = 24;

/// One vertex attribute, wired against the program bound at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLayout {
    pub name: String,
    /// Index into the geometry's buffer list.
    pub buffer: u32,
    /// Components per vertex.
    pub components: u32,
    /// Component type tag. Fixed to f32 at this boundary; decoded and
    /// carried for layout fidelity.
    pub kind: u32,
    /// Byte stride between consecutive vertices.
    pub stride: u32,
    /// Byte offset of the first component.
    pub offset: u32,
}

/// A span of f32 data inside guest memory. `len` counts elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSpan {
    pub ptr: u32,
    pub len: u32,
}

/// A decoded geometry descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryDesc {
    pub buffers: Vec<BufferSpan>,
    pub attributes: Vec<AttributeLayout>,
    pub vertex_count: u32,
    pub mode: u32,
}

/// Decode a 24-byte attribute descriptor at `ptr`, following its name
/// pointer to the attribute's null-terminated name.
pub fn decode_attribute(mem: &GuestMemory, ptr: u32) -> BridgeResult<AttributeLayout> {
    let name_ptr = mem.read_u32(ptr)?;
    let buffer = mem.read_u32(ptr + 4)?;
    let components = mem.read_u32(ptr + 8)?;
    let kind = mem.read_u32(ptr + 12)?;
    let stride = mem.read_u32(ptr + 16)?;
    let offset = mem.read_u32(ptr + 20)?;
    let name = mem.read_cstr(name_ptr)?;
    Ok(AttributeLayout {
        name,
        buffer,
        components,
        kind,
        stride,
        offset,
    })
}

/// Decode a geometry descriptor at `ptr`: the 24-byte header, then the
/// buffer table and attribute array it points at.
///
/// Buffer table entries are variable-length records - data_ptr(4),
/// element_count(4) - with the next entry at `+8 + element_count*4`. The
/// walk advances by each entry's own declared count.
pub fn decode_geometry(mem: &GuestMemory, ptr: u32) -> BridgeResult<GeometryDesc> {
    let buffers_ptr = mem.read_u32(ptr)?;
    let buffer_count = mem.read_u32(ptr + 4)?;
    let attributes_ptr = mem.read_u32(ptr + 8)?;
    let attribute_count = mem.read_u32(ptr + 12)?;
    let vertex_count = mem.read_u32(ptr + 16)?;
    let mode = mem.read_u32(ptr + 20)?;

    let mut buffers = Vec::with_capacity(buffer_count as usize);
    let mut cursor = buffers_ptr;
    for _ in 0..buffer_count {
        let data_ptr = mem.read_u32(cursor)?;
        let len = mem.read_u32(cursor + 4)?;
        mem.check_f32_span(data_ptr, len)?;
        buffers.push(BufferSpan { ptr: data_ptr, len });
        cursor += 8 + len * 4;
    }

    let mut attributes = Vec::with_capacity(attribute_count as usize);
    let mut cursor = attributes_ptr;
    for _ in 0..attribute_count {
        attributes.push(decode_attribute(mem, cursor)?);
        cursor += ATTRIBUTE_STRIDE;
    }

    Ok(GeometryDesc {
        buffers,
        attributes,
        vertex_count,
        mode,
    })
}
