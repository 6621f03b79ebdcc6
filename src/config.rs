//! Boot configuration
//!
//! The embedding page hands [`crate::launch`] a JSON blob. Every field has
//! a default, so an empty object is a valid config.

use serde::Deserialize;

/// Boot-time settings for the bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BootConfig {
    /// URL of the guest module binary, relative to the page.
    pub module_url: String,
    /// Canvas width in device pixels.
    pub canvas_width: u32,
    /// Canvas height in device pixels.
    pub canvas_height: u32,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            module_url: "main.wasm".to_string(),
            canvas_width: 1920,
            canvas_height: 1080,
        }
    }
}

impl BootConfig {
    /// Parse a config from the page's JSON. Unknown fields are ignored.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = BootConfig::from_json("{}").unwrap();
        assert_eq!(config.module_url, "main.wasm");
        assert_eq!(config.canvas_width, 1920);
        assert_eq!(config.canvas_height, 1080);
    }

    #[test]
    fn test_partial_config() {
        let config = BootConfig::from_json(r#"{"moduleUrl": "game.wasm"}"#).unwrap();
        assert_eq!(config.module_url, "game.wasm");
        assert_eq!(config.canvas_width, 1920);
    }

    #[test]
    fn test_full_config() {
        let json = r#"{"moduleUrl": "demo.wasm", "canvasWidth": 640, "canvasHeight": 480}"#;
        let config = BootConfig::from_json(json).unwrap();
        assert_eq!(config.module_url, "demo.wasm");
        assert_eq!(config.canvas_width, 640);
        assert_eq!(config.canvas_height, 480);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(BootConfig::from_json("not json").is_err());
    }
}
