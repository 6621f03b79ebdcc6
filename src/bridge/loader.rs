//! Guest module loading
//!
//! Fetches the guest binary, compiles it with the browser's WebAssembly
//! API, instantiates it against the bridge's import object, and resolves
//! the required exports.

use js_sys::{Function, Object, Reflect, Uint8Array, WebAssembly};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use super::abi::exports;
use super::error::{BridgeError, BridgeResult};

/// The guest's required exports, resolved after instantiation.
pub struct GuestInstance {
    pub memory: WebAssembly::Memory,
    pub init: Function,
    pub update: Function,
    pub shutdown: Function,
}

/// Fetch the guest module bytes over the network.
pub async fn fetch_module(url: &str) -> BridgeResult<Vec<u8>> {
    let window = web_sys::window().ok_or_else(|| instantiation("no window object"))?;

    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| js_reason("fetch failed", &e))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| instantiation("fetch did not produce a Response"))?;

    if !response.ok() {
        return Err(BridgeError::Instantiation {
            reason: format!("fetching {} returned HTTP {}", url, response.status()),
        });
    }

    let buffer_promise = response
        .array_buffer()
        .map_err(|e| js_reason("response body unavailable", &e))?;
    let buffer = JsFuture::from(buffer_promise)
        .await
        .map_err(|e| js_reason("reading response body failed", &e))?;

    Ok(Uint8Array::new(&buffer).to_vec())
}

/// Compile and instantiate the guest against the bridge's import object.
pub async fn instantiate(bytes: &[u8], imports: &Object) -> BridgeResult<GuestInstance> {
    let array = Uint8Array::new_with_length(bytes.len() as u32);
    array.copy_from(bytes);

    let compiled = JsFuture::from(WebAssembly::compile(&array.buffer()))
        .await
        .map_err(|e| js_reason("compilation failed", &e))?;
    let module: WebAssembly::Module = compiled
        .dyn_into()
        .map_err(|_| instantiation("compile result was not a Module"))?;

    let instantiated = JsFuture::from(WebAssembly::instantiate_module(&module, imports))
        .await
        .map_err(|e| js_reason("instantiation failed", &e))?;
    let instance: WebAssembly::Instance = instantiated
        .dyn_into()
        .map_err(|_| instantiation("instantiate result was not an Instance"))?;

    let guest_exports = instance.exports();

    let memory = take_export(&guest_exports, exports::MEMORY)?
        .dyn_into::<WebAssembly::Memory>()
        .map_err(|_| BridgeError::MissingExport {
            name: exports::MEMORY,
        })?;
    let init = function_export(&guest_exports, exports::INIT)?;
    let update = function_export(&guest_exports, exports::UPDATE)?;
    let shutdown = function_export(&guest_exports, exports::SHUTDOWN)?;

    Ok(GuestInstance {
        memory,
        init,
        update,
        shutdown,
    })
}

fn take_export(guest_exports: &Object, name: &'static str) -> BridgeResult<JsValue> {
    let value = Reflect::get(guest_exports, &JsValue::from_str(name))
        .map_err(|_| BridgeError::MissingExport { name })?;
    if value.is_undefined() {
        return Err(BridgeError::MissingExport { name });
    }
    Ok(value)
}

fn function_export(guest_exports: &Object, name: &'static str) -> BridgeResult<Function> {
    take_export(guest_exports, name)?
        .dyn_into()
        .map_err(|_| BridgeError::MissingExport { name })
}

fn instantiation(reason: &str) -> BridgeError {
    BridgeError::Instantiation {
        reason: reason.to_string(),
    }
}

fn js_reason(what: &str, error: &JsValue) -> BridgeError {
    let detail = error
        .as_string()
        .unwrap_or_else(|| format!("{:?}", error));
    BridgeError::Instantiation {
        reason: format!("{}: {}", what, detail),
    }
}
