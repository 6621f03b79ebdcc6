//! The call bridge: the `env` import set
//!
//! One closure per entry point. Each resolves its handles with a type
//! guard, decodes any pointer arguments out of guest memory, performs one
//! stage or table operation, and hands back a handle or primitive.
//!
//! Failure policy: creation failures are logged and return
//! [`INVALID_HANDLE`] with no handle registered; stale or mistyped handles
//! on runtime paths are logged (or, for draw/update racing teardown,
//! silently tolerated) and never trap, so one guest bug cannot halt the
//! frame loop.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::config::BootConfig;
use crate::console_log;
use crate::gfx::Stage;

use super::abi::{self, INVALID_HANDLE, calls};
use super::decode;
use super::error::{BridgeError, BridgeResult};
use super::handle::HandleTable;
use super::memory::GuestMemory;
use super::resource::Resource;
use super::shell::Shell;

/// Everything the import closures share. One instance per bridge, never
/// ambient: two bridges (say, in tests) cannot see each other's handles.
pub struct BridgeState {
    pub config: BootConfig,
    pub handles: HandleTable<Resource>,
    /// Set after instantiation; the import object has to exist first.
    pub memory: Option<GuestMemory>,
}

impl BridgeState {
    pub fn new(config: BootConfig) -> Self {
        Self {
            config,
            handles: HandleTable::new(),
            memory: None,
        }
    }
}

/// Shared state for the import closures
pub type SharedBridge = Rc<RefCell<BridgeState>>;

/// Build the import object handed to guest instantiation.
pub fn build_imports(state: SharedBridge) -> BridgeResult<Object> {
    let imports = Object::new();
    let env = Object::new();

    add_shell_calls(&env, Rc::clone(&state))?;
    add_stage_calls(&env, Rc::clone(&state))?;
    add_program_calls(&env, Rc::clone(&state))?;
    add_geometry_calls(&env, Rc::clone(&state))?;
    add_uniform_calls(&env, Rc::clone(&state))?;
    add_texture_calls(&env, Rc::clone(&state))?;
    add_diagnostic_calls(&env, state)?;
    add_math_calls(&env)?;

    Reflect::set(&imports, &JsValue::from_str(abi::IMPORT_NAMESPACE), &env).map_err(|_| {
        BridgeError::Instantiation {
            reason: "failed to set env imports".to_string(),
        }
    })?;

    Ok(imports)
}

/// Register a closure under `name` in the env object.
fn register(env: &Object, name: &'static str, value: &JsValue) -> BridgeResult<()> {
    Reflect::set(env, &JsValue::from_str(name), value).map_err(|_| BridgeError::Instantiation {
        reason: format!("failed to set '{}' import", name),
    })?;
    Ok(())
}

/// Log a stale-handle diagnostic. Non-fatal by design.
fn stale(op: &'static str, handle: i32, expected: &'static str) {
    console_log!(
        "[bridge] {}: {}",
        op,
        BridgeError::StaleHandle { handle, expected }
    );
}

/// Log a failed operation to the console.
fn report(op: &'static str, err: &BridgeError) {
    web_sys::console::error_1(&format!("[bridge] {}: {}", op, err).into());
}

// =========================================================================
// Shell: factory and image loading
// =========================================================================

fn add_shell_calls(env: &Object, state: SharedBridge) -> BridgeResult<()> {
    // vitrine_create() -> handle
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move || -> i32 {
            state.borrow_mut().handles.insert(Resource::Shell(Shell::new()))
        }) as Box<dyn Fn() -> i32>);
        register(env, calls::VITRINE_CREATE, closure.as_ref())?;
        closure.forget();
    }

    // vitrine_destroy(handle)
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |handle: i32| {
            // The entry is removed even on a kind mismatch; destroy is a
            // table operation first.
            match state.borrow_mut().handles.remove(handle) {
                Some(Resource::Shell(_)) | None => {}
                Some(other) => {
                    console_log!("[bridge] vitrine_destroy: handle {} was a {}", handle, other.kind());
                }
            }
        }) as Box<dyn Fn(i32)>);
        register(env, calls::VITRINE_DESTROY, closure.as_ref())?;
        closure.forget();
    }

    // vitrine_load_image(shell, path_ptr) -> handle
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |shell: i32, path_ptr: i32| -> i32 {
            let slot = {
                let state_ref = state.borrow();
                let Some(shell_ref) = state_ref.handles.get(shell).and_then(Resource::as_shell)
                else {
                    stale(calls::VITRINE_LOAD_IMAGE, shell, "shell");
                    return INVALID_HANDLE;
                };
                let Some(memory) = state_ref.memory.as_ref() else {
                    return INVALID_HANDLE;
                };
                let path = match memory.read_cstr(path_ptr as u32) {
                    Ok(path) => path,
                    Err(e) => {
                        report(calls::VITRINE_LOAD_IMAGE, &e);
                        return INVALID_HANDLE;
                    }
                };
                match shell_ref.load_image(&path) {
                    Ok(slot) => slot,
                    Err(e) => {
                        report(calls::VITRINE_LOAD_IMAGE, &e);
                        return INVALID_HANDLE;
                    }
                }
            };
            state.borrow_mut().handles.insert(Resource::Image(slot))
        }) as Box<dyn Fn(i32, i32) -> i32>);
        register(env, calls::VITRINE_LOAD_IMAGE, closure.as_ref())?;
        closure.forget();
    }

    // vitrine_image_ready(shell, image) -> 0|1
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |shell: i32, image: i32| -> i32 {
            let state_ref = state.borrow();
            if state_ref.handles.get(shell).and_then(Resource::as_shell).is_none() {
                stale(calls::VITRINE_IMAGE_READY, shell, "shell");
                return 0;
            }
            match state_ref.handles.get(image).and_then(Resource::as_image) {
                Some(slot) => slot.is_ready() as i32,
                None => 0,
            }
        }) as Box<dyn Fn(i32, i32) -> i32>);
        register(env, calls::VITRINE_IMAGE_READY, closure.as_ref())?;
        closure.forget();
    }

    Ok(())
}

// =========================================================================
// Stage: creation, clear, programs
// =========================================================================

fn add_stage_calls(env: &Object, state: SharedBridge) -> BridgeResult<()> {
    // stage_create(shell) -> handle
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |shell: i32| -> i32 {
            let stage = {
                let state_ref = state.borrow();
                if state_ref.handles.get(shell).and_then(Resource::as_shell).is_none() {
                    stale(calls::STAGE_CREATE, shell, "shell");
                    return INVALID_HANDLE;
                }
                let config = &state_ref.config;
                match Stage::new(config.canvas_width, config.canvas_height) {
                    Ok(stage) => stage,
                    Err(e) => {
                        report(calls::STAGE_CREATE, &e);
                        return INVALID_HANDLE;
                    }
                }
            };
            state.borrow_mut().handles.insert(Resource::Stage(stage))
        }) as Box<dyn Fn(i32) -> i32>);
        register(env, calls::STAGE_CREATE, closure.as_ref())?;
        closure.forget();
    }

    // stage_destroy(handle)
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |handle: i32| {
            match state.borrow_mut().handles.remove(handle) {
                Some(Resource::Stage(stage)) => stage.destroy(),
                None => {}
                Some(other) => {
                    console_log!("[bridge] stage_destroy: handle {} was a {}", handle, other.kind());
                }
            }
        }) as Box<dyn Fn(i32)>);
        register(env, calls::STAGE_DESTROY, closure.as_ref())?;
        closure.forget();
    }

    // stage_clear(stage, r, g, b, a)
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(
            move |stage: i32, r: f32, g: f32, b: f32, a: f32| {
                let state_ref = state.borrow();
                match state_ref.handles.get(stage).and_then(Resource::as_stage) {
                    Some(stage_ref) => stage_ref.clear(r, g, b, a),
                    None => stale(calls::STAGE_CLEAR, stage, "stage"),
                }
            },
        ) as Box<dyn Fn(i32, f32, f32, f32, f32)>);
        register(env, calls::STAGE_CLEAR, closure.as_ref())?;
        closure.forget();
    }

    // stage_create_program(stage, vert_ptr, frag_ptr) -> handle
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(
            move |stage: i32, vert_ptr: i32, frag_ptr: i32| -> i32 {
                let program = {
                    let state_ref = state.borrow();
                    let Some(stage_ref) = state_ref.handles.get(stage).and_then(Resource::as_stage)
                    else {
                        stale(calls::STAGE_CREATE_PROGRAM, stage, "stage");
                        return INVALID_HANDLE;
                    };
                    let Some(memory) = state_ref.memory.as_ref() else {
                        return INVALID_HANDLE;
                    };
                    let sources = memory
                        .read_cstr(vert_ptr as u32)
                        .and_then(|vert| Ok((vert, memory.read_cstr(frag_ptr as u32)?)));
                    let (vert, frag) = match sources {
                        Ok(sources) => sources,
                        Err(e) => {
                            report(calls::STAGE_CREATE_PROGRAM, &e);
                            return INVALID_HANDLE;
                        }
                    };
                    match stage_ref.create_program(&vert, &frag) {
                        Ok(program) => program,
                        Err(e) => {
                            report(calls::STAGE_CREATE_PROGRAM, &e);
                            return INVALID_HANDLE;
                        }
                    }
                };
                state.borrow_mut().handles.insert(Resource::Program(program))
            },
        ) as Box<dyn Fn(i32, i32, i32) -> i32>);
        register(env, calls::STAGE_CREATE_PROGRAM, closure.as_ref())?;
        closure.forget();
    }

    // stage_bind_program(stage, program)
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |stage: i32, program: i32| {
            let mut state_ref = state.borrow_mut();
            let Some(program_ref) = state_ref
                .handles
                .get(program)
                .and_then(Resource::as_program)
                .cloned()
            else {
                stale(calls::STAGE_BIND_PROGRAM, program, "program");
                return;
            };
            match state_ref.handles.get_mut(stage).and_then(Resource::as_stage_mut) {
                Some(stage_ref) => stage_ref.bind_program(&program_ref),
                None => stale(calls::STAGE_BIND_PROGRAM, stage, "stage"),
            }
        }) as Box<dyn Fn(i32, i32)>);
        register(env, calls::STAGE_BIND_PROGRAM, closure.as_ref())?;
        closure.forget();
    }

    Ok(())
}

// =========================================================================
// Programs
// =========================================================================

fn add_program_calls(env: &Object, state: SharedBridge) -> BridgeResult<()> {
    // program_destroy(handle)
    let closure = Closure::wrap(Box::new(move |handle: i32| {
        match state.borrow_mut().handles.remove(handle) {
            Some(Resource::Program(program)) => program.destroy(),
            None => {}
            Some(other) => {
                console_log!("[bridge] program_destroy: handle {} was a {}", handle, other.kind());
            }
        }
    }) as Box<dyn Fn(i32)>);
    register(env, calls::PROGRAM_DESTROY, closure.as_ref())?;
    closure.forget();

    Ok(())
}

// =========================================================================
// Geometry
// =========================================================================

fn add_geometry_calls(env: &Object, state: SharedBridge) -> BridgeResult<()> {
    // stage_create_geometry(stage, desc_ptr) -> handle
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |stage: i32, desc_ptr: i32| -> i32 {
            let geometry = {
                let state_ref = state.borrow();
                let Some(stage_ref) = state_ref.handles.get(stage).and_then(Resource::as_stage)
                else {
                    stale(calls::STAGE_CREATE_GEOMETRY, stage, "stage");
                    return INVALID_HANDLE;
                };
                let Some(memory) = state_ref.memory.as_ref() else {
                    return INVALID_HANDLE;
                };
                let desc = match decode::decode_geometry(memory, desc_ptr as u32) {
                    Ok(desc) => desc,
                    Err(e) => {
                        report(calls::STAGE_CREATE_GEOMETRY, &e);
                        return INVALID_HANDLE;
                    }
                };
                match stage_ref.create_geometry(memory, &desc) {
                    Ok(geometry) => geometry,
                    Err(e) => {
                        report(calls::STAGE_CREATE_GEOMETRY, &e);
                        return INVALID_HANDLE;
                    }
                }
            };
            state.borrow_mut().handles.insert(Resource::Geometry(geometry))
        }) as Box<dyn Fn(i32, i32) -> i32>);
        register(env, calls::STAGE_CREATE_GEOMETRY, closure.as_ref())?;
        closure.forget();
    }

    // stage_draw_geometry(stage, geometry)
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |stage: i32, geometry: i32| {
            let state_ref = state.borrow();
            let Some(stage_ref) = state_ref.handles.get(stage).and_then(Resource::as_stage) else {
                stale(calls::STAGE_DRAW_GEOMETRY, stage, "stage");
                return;
            };
            // A draw racing the geometry's teardown is tolerated silently.
            let Some(geometry_ref) = state_ref.handles.get(geometry).and_then(Resource::as_geometry)
            else {
                return;
            };
            stage_ref.draw_geometry(geometry_ref);
        }) as Box<dyn Fn(i32, i32)>);
        register(env, calls::STAGE_DRAW_GEOMETRY, closure.as_ref())?;
        closure.forget();
    }

    // stage_set_vertex_count(geometry, count)
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |geometry: i32, count: i32| {
            let mut state_ref = state.borrow_mut();
            match state_ref.handles.get_mut(geometry).and_then(Resource::as_geometry_mut) {
                Some(geometry_ref) => geometry_ref.vertex_count = count,
                None => stale(calls::STAGE_SET_VERTEX_COUNT, geometry, "geometry"),
            }
        }) as Box<dyn Fn(i32, i32)>);
        register(env, calls::STAGE_SET_VERTEX_COUNT, closure.as_ref())?;
        closure.forget();
    }

    // stage_update_geometry(stage, geometry, buffer_index, data_ptr, len)
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(
            move |stage: i32, geometry: i32, buffer_index: i32, data_ptr: i32, len: i32| {
                let state_ref = state.borrow();
                let Some(stage_ref) = state_ref.handles.get(stage).and_then(Resource::as_stage)
                else {
                    stale(calls::STAGE_UPDATE_GEOMETRY, stage, "stage");
                    return;
                };
                let Some(geometry_ref) =
                    state_ref.handles.get(geometry).and_then(Resource::as_geometry)
                else {
                    return;
                };
                let Some(memory) = state_ref.memory.as_ref() else {
                    return;
                };
                let data = match memory.float32_view(data_ptr as u32, len as u32) {
                    Ok(data) => data,
                    Err(e) => {
                        report(calls::STAGE_UPDATE_GEOMETRY, &e);
                        return;
                    }
                };
                if let Err(e) = stage_ref.update_geometry(geometry_ref, buffer_index as usize, &data)
                {
                    report(calls::STAGE_UPDATE_GEOMETRY, &e);
                }
            },
        ) as Box<dyn Fn(i32, i32, i32, i32, i32)>);
        register(env, calls::STAGE_UPDATE_GEOMETRY, closure.as_ref())?;
        closure.forget();
    }

    Ok(())
}

// =========================================================================
// Uniform blocks
// =========================================================================

fn add_uniform_calls(env: &Object, state: SharedBridge) -> BridgeResult<()> {
    // stage_create_uniform_block(stage, name_ptr, size) -> handle
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(
            move |stage: i32, name_ptr: i32, size: i32| -> i32 {
                let block = {
                    let state_ref = state.borrow();
                    let Some(stage_ref) = state_ref.handles.get(stage).and_then(Resource::as_stage)
                    else {
                        stale(calls::STAGE_CREATE_UNIFORM_BLOCK, stage, "stage");
                        return INVALID_HANDLE;
                    };
                    let Some(memory) = state_ref.memory.as_ref() else {
                        return INVALID_HANDLE;
                    };
                    let name = match memory.read_cstr(name_ptr as u32) {
                        Ok(name) => name,
                        Err(e) => {
                            report(calls::STAGE_CREATE_UNIFORM_BLOCK, &e);
                            return INVALID_HANDLE;
                        }
                    };
                    match stage_ref.create_uniform_block(&name, size.max(0) as usize) {
                        Ok(block) => block,
                        Err(e) => {
                            report(calls::STAGE_CREATE_UNIFORM_BLOCK, &e);
                            return INVALID_HANDLE;
                        }
                    }
                };
                state.borrow_mut().handles.insert(Resource::UniformBlock(block))
            },
        ) as Box<dyn Fn(i32, i32, i32) -> i32>);
        register(env, calls::STAGE_CREATE_UNIFORM_BLOCK, closure.as_ref())?;
        closure.forget();
    }

    // stage_update_uniform_block(stage, block, data_ptr, len)
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(
            move |stage: i32, block: i32, data_ptr: i32, len: i32| {
                let state_ref = state.borrow();
                let Some(stage_ref) = state_ref.handles.get(stage).and_then(Resource::as_stage)
                else {
                    stale(calls::STAGE_UPDATE_UNIFORM_BLOCK, stage, "stage");
                    return;
                };
                let Some(block_ref) =
                    state_ref.handles.get(block).and_then(Resource::as_uniform_block)
                else {
                    return;
                };
                let Some(memory) = state_ref.memory.as_ref() else {
                    return;
                };
                let data = match memory.uint8_view(data_ptr as u32, len as u32) {
                    Ok(data) => data,
                    Err(e) => {
                        report(calls::STAGE_UPDATE_UNIFORM_BLOCK, &e);
                        return;
                    }
                };
                if let Err(e) =
                    stage_ref.update_uniform_block(block_ref, 0, len as usize, &data)
                {
                    report(calls::STAGE_UPDATE_UNIFORM_BLOCK, &e);
                }
            },
        ) as Box<dyn Fn(i32, i32, i32, i32)>);
        register(env, calls::STAGE_UPDATE_UNIFORM_BLOCK, closure.as_ref())?;
        closure.forget();
    }

    Ok(())
}

// =========================================================================
// Textures
// =========================================================================

fn add_texture_calls(env: &Object, state: SharedBridge) -> BridgeResult<()> {
    // stage_create_texture(stage, image) -> handle
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |stage: i32, image: i32| -> i32 {
            let texture = {
                let state_ref = state.borrow();
                let Some(stage_ref) = state_ref.handles.get(stage).and_then(Resource::as_stage)
                else {
                    stale(calls::STAGE_CREATE_TEXTURE, stage, "stage");
                    return INVALID_HANDLE;
                };
                let Some(slot) = state_ref.handles.get(image).and_then(Resource::as_image) else {
                    stale(calls::STAGE_CREATE_TEXTURE, image, "image");
                    return INVALID_HANDLE;
                };
                match stage_ref.create_texture(slot.element()) {
                    Ok(texture) => texture,
                    Err(e) => {
                        report(calls::STAGE_CREATE_TEXTURE, &e);
                        return INVALID_HANDLE;
                    }
                }
            };
            state.borrow_mut().handles.insert(Resource::Texture(texture))
        }) as Box<dyn Fn(i32, i32) -> i32>);
        register(env, calls::STAGE_CREATE_TEXTURE, closure.as_ref())?;
        closure.forget();
    }

    // stage_create_texture_array(stage, image, layer_count) -> handle
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(
            move |stage: i32, image: i32, layer_count: i32| -> i32 {
                let texture = {
                    let state_ref = state.borrow();
                    let Some(stage_ref) = state_ref.handles.get(stage).and_then(Resource::as_stage)
                    else {
                        stale(calls::STAGE_CREATE_TEXTURE_ARRAY, stage, "stage");
                        return INVALID_HANDLE;
                    };
                    let Some(slot) = state_ref.handles.get(image).and_then(Resource::as_image)
                    else {
                        stale(calls::STAGE_CREATE_TEXTURE_ARRAY, image, "image");
                        return INVALID_HANDLE;
                    };
                    match stage_ref.create_texture_array(slot.element(), layer_count.max(0) as u32)
                    {
                        Ok(texture) => texture,
                        Err(e) => {
                            report(calls::STAGE_CREATE_TEXTURE_ARRAY, &e);
                            return INVALID_HANDLE;
                        }
                    }
                };
                state.borrow_mut().handles.insert(Resource::Texture(texture))
            },
        ) as Box<dyn Fn(i32, i32, i32) -> i32>);
        register(env, calls::STAGE_CREATE_TEXTURE_ARRAY, closure.as_ref())?;
        closure.forget();
    }

    // stage_bind_texture(stage, texture)
    {
        let state = Rc::clone(&state);
        let closure = Closure::wrap(Box::new(move |stage: i32, texture: i32| {
            let state_ref = state.borrow();
            let Some(stage_ref) = state_ref.handles.get(stage).and_then(Resource::as_stage) else {
                stale(calls::STAGE_BIND_TEXTURE, stage, "stage");
                return;
            };
            match state_ref.handles.get(texture).and_then(Resource::as_texture) {
                Some(texture_ref) => stage_ref.bind_texture(texture_ref),
                None => stale(calls::STAGE_BIND_TEXTURE, texture, "texture"),
            }
        }) as Box<dyn Fn(i32, i32)>);
        register(env, calls::STAGE_BIND_TEXTURE, closure.as_ref())?;
        closure.forget();
    }

    Ok(())
}

// =========================================================================
// Diagnostics and math
// =========================================================================

fn add_diagnostic_calls(env: &Object, state: SharedBridge) -> BridgeResult<()> {
    // host_log(shell, msg_ptr)
    let closure = Closure::wrap(Box::new(move |_shell: i32, msg_ptr: i32| {
        let state_ref = state.borrow();
        let Some(memory) = state_ref.memory.as_ref() else {
            return;
        };
        match memory.read_cstr(msg_ptr as u32) {
            Ok(msg) => console_log!("[guest] {}", msg),
            Err(e) => report(calls::HOST_LOG, &e),
        }
    }) as Box<dyn Fn(i32, i32)>);
    register(env, calls::HOST_LOG, closure.as_ref())?;
    closure.forget();

    Ok(())
}

/// The guest carries no libm; these are its scalar math imports.
fn add_math_calls(env: &Object) -> BridgeResult<()> {
    add_unary(env, calls::HOST_SIN, f32::sin)?;
    add_unary(env, calls::HOST_COS, f32::cos)?;
    add_unary(env, calls::HOST_TAN, f32::tan)?;
    add_unary(env, calls::HOST_ASIN, f32::asin)?;
    add_unary(env, calls::HOST_ACOS, f32::acos)?;
    add_unary(env, calls::HOST_SQRT, f32::sqrt)?;
    Ok(())
}

fn add_unary(env: &Object, name: &'static str, f: fn(f32) -> f32) -> BridgeResult<()> {
    let closure = Closure::wrap(Box::new(move |x: f32| -> f32 { f(x) }) as Box<dyn Fn(f32) -> f32>);
    register(env, name, closure.as_ref())?;
    closure.forget();
    Ok(())
}
