//! Error types for the bridge
//!
//! Creation-time failures surface to the failing call and register no
//! handle. Runtime-path failures on already-registered handles (stale or
//! mistyped) are swallowed with a console diagnostic and a safe default,
//! so one guest bug cannot halt the frame loop.

use std::fmt;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while loading the guest or servicing its calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// A shader stage failed to compile
    Compile {
        stage: &'static str,
        log: String,
    },

    /// The shader pair failed to link
    Link {
        log: String,
    },

    /// The device refused an allocation
    ResourceCreation {
        what: &'static str,
    },

    /// A guest pointer or length fell outside linear memory, or a string
    /// had no terminator
    MalformedMemory {
        address: u32,
        reason: String,
    },

    /// A handle was absent or resolved to the wrong resource kind
    StaleHandle {
        handle: i32,
        expected: &'static str,
    },

    /// A partial update exceeded an allocation's size
    OutOfRange {
        offset: usize,
        len: usize,
        size: usize,
    },

    /// Guest module binary is malformed or invalid
    InvalidModule {
        reason: String,
    },

    /// Required guest export is missing or has the wrong type
    MissingExport {
        name: &'static str,
    },

    /// Guest module fetch or instantiation failed
    Instantiation {
        reason: String,
    },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile { stage, log } => {
                write!(f, "{} shader failed to compile: {}", stage, log)
            }
            Self::Link { log } => {
                write!(f, "program failed to link: {}", log)
            }
            Self::ResourceCreation { what } => {
                write!(f, "resource creation failed: {}", what)
            }
            Self::MalformedMemory { address, reason } => {
                write!(f, "malformed guest memory at {:#x}: {}", address, reason)
            }
            Self::StaleHandle { handle, expected } => {
                write!(f, "handle {} does not resolve to a {}", handle, expected)
            }
            Self::OutOfRange { offset, len, size } => {
                write!(
                    f,
                    "update out of range: offset {} + len {} > size {}",
                    offset, len, size
                )
            }
            Self::InvalidModule { reason } => {
                write!(f, "invalid guest module: {}", reason)
            }
            Self::MissingExport { name } => {
                write!(f, "missing required guest export: '{}'", name)
            }
            Self::Instantiation { reason } => {
                write!(f, "guest instantiation failed: {}", reason)
            }
        }
    }
}

impl std::error::Error for BridgeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::Compile {
            stage: "fragment",
            log: "ERROR: 0:3: syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "fragment shader failed to compile: ERROR: 0:3: syntax error"
        );

        let err = BridgeError::StaleHandle {
            handle: 7,
            expected: "geometry",
        };
        assert_eq!(err.to_string(), "handle 7 does not resolve to a geometry");

        let err = BridgeError::MissingExport { name: "update" };
        assert_eq!(err.to_string(), "missing required guest export: 'update'");
    }

    #[test]
    fn test_out_of_range_display_carries_bounds() {
        let err = BridgeError::OutOfRange {
            offset: 60,
            len: 16,
            size: 64,
        };
        let text = err.to_string();
        assert!(text.contains("60"));
        assert!(text.contains("16"));
        assert!(text.contains("64"));
    }
}
