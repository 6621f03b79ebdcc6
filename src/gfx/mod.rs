//! The WebGL2 stage and its resources
//!
//! `Stage` owns the canvas, the GL context, and the baseline state every
//! frame assumes (depth test on, culling off, standard alpha blending).
//! Everything else - programs, geometry, textures, uniform blocks - is
//! created through it and owned exclusively by whichever handle wraps it.
//!
//! The pure layout math (texture band slicing, uniform block sizing) lives
//! beside the GL calls so it runs under native tests.

#[cfg(target_arch = "wasm32")]
mod shader;
#[cfg(target_arch = "wasm32")]
mod stage;

mod texture;
mod uniforms;

#[cfg(target_arch = "wasm32")]
pub use shader::Program;
#[cfg(target_arch = "wasm32")]
pub use stage::{Geometry, Stage, UNIFORM_BINDING_SLOT};

pub use texture::*;
pub use uniforms::*;
