//! Guest module validation
//!
//! Checks a guest binary against the ABI before anything is instantiated:
//! magic number, version, and the export section's names and kinds. A
//! module missing `update` fails here, not three frames into a broken run
//! with GL state already touched.

use super::abi::exports;
use super::error::{BridgeError, BridgeResult};

/// WASM magic number: \0asm
const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// WASM version 1
const WASM_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Export section id
const EXPORT_SECTION: u8 = 7;

/// Export kind tags from the binary format
const KIND_FUNC: u8 = 0;
const KIND_MEMORY: u8 = 2;

/// Validates guest binaries against the bridge ABI
pub struct ModuleValidator;

impl ModuleValidator {
    /// Validate a guest module binary.
    ///
    /// Checks:
    /// - Valid WASM magic number and version
    /// - `memory` is exported as a memory
    /// - `init`, `update`, and `shutdown` are exported as functions
    pub fn validate(bytes: &[u8]) -> BridgeResult<()> {
        if bytes.len() < 8 {
            return Err(BridgeError::InvalidModule {
                reason: "module too small".to_string(),
            });
        }

        if bytes[0..4] != WASM_MAGIC {
            return Err(BridgeError::InvalidModule {
                reason: "invalid magic number".to_string(),
            });
        }

        if bytes[4..8] != WASM_VERSION {
            return Err(BridgeError::InvalidModule {
                reason: "unsupported WASM version".to_string(),
            });
        }

        let mut found_memory = false;
        let mut found = [false; 3];
        const FUNCS: [&str; 3] = [exports::INIT, exports::UPDATE, exports::SHUTDOWN];

        let mut offset = 8;
        while offset < bytes.len() {
            let section_id = bytes[offset];
            offset += 1;

            let (size, size_bytes) = read_leb128(&bytes[offset..])?;
            offset += size_bytes;

            let section_end = offset + size as usize;
            if section_end > bytes.len() {
                return Err(BridgeError::InvalidModule {
                    reason: "section extends past end of module".to_string(),
                });
            }

            if section_id == EXPORT_SECTION {
                for (name, kind) in parse_export_section(&bytes[offset..section_end])? {
                    if name == exports::MEMORY && kind == KIND_MEMORY {
                        found_memory = true;
                    }
                    for (i, func) in FUNCS.iter().enumerate() {
                        if name == *func && kind == KIND_FUNC {
                            found[i] = true;
                        }
                    }
                }
            }

            offset = section_end;
        }

        if !found_memory {
            return Err(BridgeError::MissingExport {
                name: exports::MEMORY,
            });
        }
        for (i, func) in FUNCS.iter().enumerate() {
            if !found[i] {
                return Err(BridgeError::MissingExport { name: func });
            }
        }

        Ok(())
    }
}

/// Read an unsigned LEB128 value
fn read_leb128(bytes: &[u8]) -> BridgeResult<(u32, usize)> {
    let mut result = 0u32;
    let mut shift = 0;
    let mut bytes_read = 0;

    for &byte in bytes.iter().take(5) {
        bytes_read += 1;
        result |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, bytes_read));
        }
        shift += 7;
    }

    Err(BridgeError::InvalidModule {
        reason: "invalid LEB128".to_string(),
    })
}

/// Parse an export section into (name, kind) pairs
fn parse_export_section(data: &[u8]) -> BridgeResult<Vec<(String, u8)>> {
    let mut result = Vec::new();
    let mut offset = 0;

    if data.is_empty() {
        return Ok(result);
    }

    let (count, count_bytes) = read_leb128(&data[offset..])?;
    offset += count_bytes;

    for _ in 0..count {
        let (name_len, len_bytes) = read_leb128(&data[offset..])?;
        offset += len_bytes;

        let name_end = offset + name_len as usize;
        if name_end > data.len() {
            return Err(BridgeError::InvalidModule {
                reason: "export name extends past section".to_string(),
            });
        }
        let name = String::from_utf8_lossy(&data[offset..name_end]).to_string();
        offset = name_end;

        if offset >= data.len() {
            return Err(BridgeError::InvalidModule {
                reason: "unexpected end of export section".to_string(),
            });
        }
        let kind = data[offset];
        offset += 1;

        // Export index; value unused here.
        let (_, index_bytes) = read_leb128(&data[offset..])?;
        offset += index_bytes;

        result.push((name, kind));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to build guest binaries for testing
    struct ModuleBuilder {
        bytes: Vec<u8>,
    }

    impl ModuleBuilder {
        fn new() -> Self {
            Self {
                bytes: vec![
                    0x00, 0x61, 0x73, 0x6D, // magic: \0asm
                    0x01, 0x00, 0x00, 0x00, // version: 1
                ],
            }
        }

        fn push_leb128(bytes: &mut Vec<u8>, mut value: u32) {
            loop {
                let byte = (value & 0x7F) as u8;
                value >>= 7;
                if value == 0 {
                    bytes.push(byte);
                    break;
                } else {
                    bytes.push(byte | 0x80);
                }
            }
        }

        fn section(mut self, id: u8, content: &[u8]) -> Self {
            self.bytes.push(id);
            Self::push_leb128(&mut self.bytes, content.len() as u32);
            self.bytes.extend_from_slice(content);
            self
        }

        /// Type section with one `() -> ()` signature
        fn type_section(self) -> Self {
            self.section(0x01, &[0x01, 0x60, 0x00, 0x00])
        }

        /// Function section declaring `count` functions of type 0
        fn function_section(self, count: u8) -> Self {
            let mut content = vec![count];
            content.extend(std::iter::repeat_n(0x00, count as usize));
            self.section(0x03, &content)
        }

        /// Memory section (1 page)
        fn memory_section(self) -> Self {
            self.section(0x05, &[0x01, 0x00, 0x01])
        }

        /// Export section with the given (name, kind, index) triples
        fn export_section(self, entries: &[(&str, u8, u32)]) -> Self {
            let mut content = Vec::new();
            Self::push_leb128(&mut content, entries.len() as u32);
            for (name, kind, index) in entries {
                Self::push_leb128(&mut content, name.len() as u32);
                content.extend_from_slice(name.as_bytes());
                content.push(*kind);
                Self::push_leb128(&mut content, *index);
            }
            self.section(0x07, &content)
        }

        /// Code section with `count` empty function bodies
        fn code_section(self, count: u8) -> Self {
            let mut content = vec![count];
            for _ in 0..count {
                content.extend_from_slice(&[0x02, 0x00, 0x0B]); // size, 0 locals, end
            }
            self.section(0x0A, &content)
        }

        fn build(self) -> Vec<u8> {
            self.bytes
        }
    }

    /// A minimal module exporting the full ABI surface
    fn conforming_module() -> Vec<u8> {
        ModuleBuilder::new()
            .type_section()
            .function_section(3)
            .memory_section()
            .export_section(&[
                ("memory", KIND_MEMORY, 0),
                ("init", KIND_FUNC, 0),
                ("update", KIND_FUNC, 1),
                ("shutdown", KIND_FUNC, 2),
            ])
            .code_section(3)
            .build()
    }

    #[test]
    fn test_validate_empty_module() {
        let result = ModuleValidator::validate(&[]);
        assert!(matches!(result, Err(BridgeError::InvalidModule { .. })));
    }

    #[test]
    fn test_validate_invalid_magic() {
        let bad_magic = vec![0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
        let result = ModuleValidator::validate(&bad_magic);
        assert!(matches!(result, Err(BridgeError::InvalidModule { .. })));
    }

    #[test]
    fn test_validate_unsupported_version() {
        let bad_version = vec![0x00, 0x61, 0x73, 0x6D, 0x02, 0x00, 0x00, 0x00];
        let result = ModuleValidator::validate(&bad_version);
        assert!(matches!(result, Err(BridgeError::InvalidModule { .. })));
    }

    #[test]
    fn test_validate_conforming_module() {
        assert!(ModuleValidator::validate(&conforming_module()).is_ok());
    }

    #[test]
    fn test_validate_missing_memory_export() {
        let module = ModuleBuilder::new()
            .type_section()
            .function_section(3)
            .memory_section()
            .export_section(&[
                ("init", KIND_FUNC, 0),
                ("update", KIND_FUNC, 1),
                ("shutdown", KIND_FUNC, 2),
            ])
            .code_section(3)
            .build();
        let result = ModuleValidator::validate(&module);
        assert!(matches!(
            result,
            Err(BridgeError::MissingExport { name: "memory" })
        ));
    }

    #[test]
    fn test_validate_missing_update_export() {
        let module = ModuleBuilder::new()
            .type_section()
            .function_section(2)
            .memory_section()
            .export_section(&[
                ("memory", KIND_MEMORY, 0),
                ("init", KIND_FUNC, 0),
                ("shutdown", KIND_FUNC, 1),
            ])
            .code_section(2)
            .build();
        let result = ModuleValidator::validate(&module);
        assert!(matches!(
            result,
            Err(BridgeError::MissingExport { name: "update" })
        ));
    }

    #[test]
    fn test_validate_export_with_wrong_kind() {
        // `init` exported as a memory does not satisfy the ABI.
        let module = ModuleBuilder::new()
            .type_section()
            .function_section(2)
            .memory_section()
            .export_section(&[
                ("memory", KIND_MEMORY, 0),
                ("init", KIND_MEMORY, 0),
                ("update", KIND_FUNC, 0),
                ("shutdown", KIND_FUNC, 1),
            ])
            .code_section(2)
            .build();
        let result = ModuleValidator::validate(&module);
        assert!(matches!(
            result,
            Err(BridgeError::MissingExport { name: "init" })
        ));
    }

    #[test]
    fn test_validate_truncated_section() {
        let mut module = conforming_module();
        module.truncate(module.len() - 4);
        // Either a section overrun or a missing export, never a panic.
        assert!(ModuleValidator::validate(&module).is_err());
    }
}
