//! Integration tests for the vitrine bridge
//!
//! Exercises the pieces that run without a browser: the handle table, the
//! guest memory view and struct decoders working together, module
//! validation, and the pure layout math behind textures and uniform
//! blocks.

use vitrine::bridge::{
    BridgeError, GuestMemory, HandleTable, ModuleValidator, decode_geometry,
};
use vitrine::config::BootConfig;
use vitrine::gfx::{IDENTITY, band_height, band_ranges, block_byte_len, initial_contents};

// ============================================================================
// Handle lifecycle
// ============================================================================

#[derive(Debug, PartialEq)]
enum FakeResource {
    Program,
    Geometry(i32),
}

#[test]
fn test_handles_stay_unique_across_churn() {
    let mut table = HandleTable::new();
    let mut live = Vec::new();

    // Churn: create two, destroy one, repeat. Nothing may ever collide.
    for round in 0..50 {
        let kept = table.insert(FakeResource::Geometry(round));
        let dropped = table.insert(FakeResource::Program);
        table.remove(dropped);

        assert!(!live.contains(&kept));
        assert!(!live.contains(&dropped));
        live.push(kept);
        live.push(dropped);
    }

    // Every kept geometry still resolves; every dropped program is gone.
    for chunk in live.chunks(2) {
        assert!(matches!(
            table.get(chunk[0]),
            Some(FakeResource::Geometry(_))
        ));
        assert_eq!(table.get(chunk[1]), None);
    }
}

#[test]
fn test_destroyed_handle_reads_as_absent_not_as_other_kind() {
    let mut table = HandleTable::new();
    let geometry = table.insert(FakeResource::Geometry(3));
    table.remove(geometry);

    // The guard a draw call performs: absent means silent no-op, and the
    // stale handle must not alias a later resource.
    let program = table.insert(FakeResource::Program);
    assert_ne!(program, geometry);
    assert_eq!(table.get(geometry), None);
}

// ============================================================================
// Geometry decoding against a guest-style memory image
// ============================================================================

/// Lay out the triangle scenario the way a C guest would: one buffer of
/// six floats, one two-component "pos" attribute, three vertices.
fn triangle_memory() -> (GuestMemory, u32) {
    let mut bytes = vec![0u8; 16];
    let push_u32 = |bytes: &mut Vec<u8>, v: u32| {
        bytes.extend_from_slice(&v.to_le_bytes());
    };

    // Attribute name
    let name_ptr = bytes.len() as u32;
    bytes.extend_from_slice(b"pos\0");

    // Buffer table: header immediately followed by its data
    let buffers_ptr = bytes.len() as u32;
    push_u32(&mut bytes, buffers_ptr + 8);
    push_u32(&mut bytes, 6);
    for v in [0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }

    // Attribute descriptor
    let attributes_ptr = bytes.len() as u32;
    for field in [name_ptr, 0, 2, 0, 8, 0] {
        push_u32(&mut bytes, field);
    }

    // Geometry descriptor header
    let desc_ptr = bytes.len() as u32;
    for field in [buffers_ptr, 1, attributes_ptr, 1, 3, 4] {
        push_u32(&mut bytes, field);
    }

    (GuestMemory::from_bytes(bytes), desc_ptr)
}

#[test]
fn test_triangle_descriptor_decodes_exactly() {
    let (mem, desc_ptr) = triangle_memory();
    let desc = decode_geometry(&mem, desc_ptr).unwrap();

    assert_eq!(desc.vertex_count, 3);
    assert_eq!(desc.buffers.len(), 1);
    assert_eq!(desc.attributes.len(), 1);

    let attr = &desc.attributes[0];
    assert_eq!(attr.name, "pos");
    assert_eq!(attr.buffer, 0);
    assert_eq!(attr.components, 2);
    assert_eq!(attr.stride, 8);
    assert_eq!(attr.offset, 0);

    let span = desc.buffers[0];
    let data = mem.read_f32_slice(span.ptr, span.len).unwrap();
    assert_eq!(data, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_descriptor_pointing_outside_memory_is_malformed() {
    let (mem, _) = triangle_memory();
    let past_end = mem.byte_len();
    assert!(matches!(
        decode_geometry(&mem, past_end),
        Err(BridgeError::MalformedMemory { .. })
    ));
}

// ============================================================================
// Module validation
// ============================================================================

/// Smallest binary that passes validation: magic, version, a memory, and
/// three exported functions named init/update/shutdown.
fn conforming_guest() -> Vec<u8> {
    let mut bytes = vec![
        0x00, 0x61, 0x73, 0x6D, // \0asm
        0x01, 0x00, 0x00, 0x00, // version 1
    ];
    // type section: one () -> ()
    bytes.extend_from_slice(&[0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
    // function section: three functions of type 0
    bytes.extend_from_slice(&[0x03, 0x04, 0x03, 0x00, 0x00, 0x00]);
    // memory section: one page
    bytes.extend_from_slice(&[0x05, 0x03, 0x01, 0x00, 0x01]);
    // export section
    let mut exports = vec![0x04];
    for (name, kind, index) in [
        ("memory", 0x02u8, 0x00u8),
        ("init", 0x00, 0x00),
        ("update", 0x00, 0x01),
        ("shutdown", 0x00, 0x02),
    ] {
        exports.push(name.len() as u8);
        exports.extend_from_slice(name.as_bytes());
        exports.push(kind);
        exports.push(index);
    }
    bytes.push(0x07);
    bytes.push(exports.len() as u8);
    bytes.extend_from_slice(&exports);
    // code section: three empty bodies
    bytes.extend_from_slice(&[
        0x0A, 0x0A, 0x03, 0x02, 0x00, 0x0B, 0x02, 0x00, 0x0B, 0x02, 0x00, 0x0B,
    ]);
    bytes
}

#[test]
fn test_conforming_guest_passes_validation() {
    assert!(ModuleValidator::validate(&conforming_guest()).is_ok());
}

#[test]
fn test_guest_missing_shutdown_fails_before_instantiation() {
    let mut bytes = conforming_guest();
    // Corrupt the exported name so "shutdown" is never found.
    let at = bytes
        .windows(8)
        .position(|w| w == &b"shutdown"[..])
        .expect("export name present");
    bytes[at] = b'X';

    assert!(matches!(
        ModuleValidator::validate(&bytes),
        Err(BridgeError::MissingExport { name: "shutdown" })
    ));
}

// ============================================================================
// Texture band math
// ============================================================================

#[test]
fn test_layered_texture_bands_partition_the_source() {
    let width = 16u32;
    let height = 64u32;
    let layers = 8u32;

    let ranges = band_ranges(width, height, layers);
    assert_eq!(ranges.len(), 8);
    assert_eq!(band_height(height, layers), 8);

    // Bands tile the image exactly: contiguous, non-overlapping, in order.
    assert_eq!(ranges[0].start, 0);
    for pair in ranges.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
    assert_eq!(ranges.last().unwrap().end, (width * height * 4) as usize);
}

// ============================================================================
// Uniform block sizing
// ============================================================================

#[test]
fn test_block_allocation_respects_device_minimum() {
    // Requested 16 bytes against a 256-byte minimum: the minimum wins.
    let byte_len = block_byte_len(16, 256);
    assert_eq!(byte_len, 256);

    let contents = initial_contents(byte_len);
    assert_eq!(&contents[..16], &IDENTITY);
    assert!(contents[16..].iter().all(|&v| v == 0.0));
}

// ============================================================================
// Boot config
// ============================================================================

#[test]
fn test_page_config_round_trip() {
    let config =
        BootConfig::from_json(r#"{"moduleUrl": "sample.wasm", "canvasWidth": 800}"#).unwrap();
    assert_eq!(config.module_url, "sample.wasm");
    assert_eq!(config.canvas_width, 800);
    assert_eq!(config.canvas_height, 1080);
}
