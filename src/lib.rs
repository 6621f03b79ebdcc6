//! vitrine - a browser display case for sandboxed WASM modules
//!
//! A guest module compiled to WASM gets no host objects: only integers and
//! byte offsets. vitrine is the host side of that boundary. It fetches and
//! instantiates the guest, hands it a set of `env` imports, and lets it
//! drive a WebGL2 canvas through opaque handles and structs marshaled out
//! of the guest's linear memory.
//!
//! The pieces:
//! - `bridge`: handle table, guest memory marshaling, struct decoders, and
//!   the `env` import set the guest calls into
//! - `gfx`: the WebGL2 stage and its resources (programs, geometry,
//!   textures, uniform blocks)
//! - `runtime`: the requestAnimationFrame loop driving the guest's
//!   init/update/shutdown exports
//!
//! The crate itself compiles to WASM with wasm-bindgen; the guest is a
//! second, separately compiled binary instantiated through
//! `js_sys::WebAssembly` reflection.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod bridge;
pub mod config;
pub mod gfx;

#[cfg(target_arch = "wasm32")]
mod boot;

#[cfg(target_arch = "wasm32")]
pub mod runtime;

/// Initialize panic hook for better error messages in browser console
#[cfg(target_arch = "wasm32")]
fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Launch the bridge: fetch and instantiate the guest module described by
/// `config_json` (see [`config::BootConfig`]), then start the frame loop.
///
/// Returns a handle the embedding page can use to stop the loop.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn launch(config_json: String) -> Result<LoopHandle, JsValue> {
    init_panic_hook();

    let config = config::BootConfig::from_json(&config_json)
        .map_err(|e| JsValue::from_str(&format!("bad boot config: {}", e)))?;

    let frame_loop = boot::launch(config)
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    Ok(LoopHandle { inner: frame_loop })
}

/// Page-side control over the running frame loop.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct LoopHandle {
    inner: runtime::FrameLoop,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl LoopHandle {
    /// Clear the running flag. The guest's `shutdown` export runs on the
    /// next animation frame; no further frames are scheduled after it.
    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }
}

/// Console logging helper
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);
}

/// Log to browser console (WASM)
#[cfg(target_arch = "wasm32")]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::log(&format!($($t)*))
    };
}

/// Log to stderr (native)
#[cfg(not(target_arch = "wasm32"))]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        eprintln!($($t)*)
    };
}
