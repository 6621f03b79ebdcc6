//! The guest/host bridge
//!
//! This module is the boundary between the sandboxed guest module and the
//! host page. The guest sees nothing but integers: handles naming host
//! resources it cannot otherwise touch, and byte offsets into its own
//! linear memory where it has laid out strings and structs for the host
//! to read.
//!
//! # Guest ABI v1
//!
//! ## Required Exports
//!
//! Every guest module MUST export:
//!
//! | Export     | Type      | Description                               |
//! |------------|-----------|-------------------------------------------|
//! | `memory`   | Memory    | Linear memory for data exchange           |
//! | `init`     | `() -> ()`| Called once before the first frame        |
//! | `update`   | `() -> ()`| Called once per animation frame           |
//! | `shutdown` | `() -> ()`| Called once after the running flag clears |
//!
//! ## Host Imports
//!
//! The bridge provides these calls in the `env` namespace. A "ptr" is a
//! byte offset into the guest's linear memory; strings are null-terminated.
//! Creation calls return a fresh handle, or -1 when the owning handle
//! fails its type guard or the creation itself fails (the failure is
//! logged to the console; no handle is registered).
//!
//! ### Shell (resource factory)
//!
//! ```text
//! vitrine_create() -> handle
//! vitrine_destroy(handle)
//! vitrine_load_image(shell, path_ptr) -> handle
//!   Starts an asynchronous image load. The returned handle is valid
//!   immediately; poll it with vitrine_image_ready.
//! vitrine_image_ready(shell, image) -> 0|1
//!   1 once the load completed. A failed load stays 0 forever; the guest
//!   owns the give-up policy.
//! ```
//!
//! ### Stage (graphics device)
//!
//! ```text
//! stage_create(shell) -> handle
//! stage_destroy(handle)
//!   Does NOT destroy programs, geometry, or textures created through the
//!   stage; destroy those first.
//! stage_clear(stage, r, g, b, a)
//! stage_create_program(stage, vert_ptr, frag_ptr) -> handle
//! stage_bind_program(stage, program)
//!   Must precede stage_create_geometry / stage_create_uniform_block for
//!   the program whose locations they resolve.
//! stage_create_geometry(stage, desc_ptr) -> handle
//!   desc_ptr names a geometry descriptor; see Memory Layouts below.
//! stage_draw_geometry(stage, geometry)
//!   Silent no-op if the geometry handle no longer resolves.
//! stage_set_vertex_count(geometry, count)
//! stage_update_geometry(stage, geometry, buffer_index, data_ptr, len)
//!   len counts f32 elements.
//! stage_create_uniform_block(stage, name_ptr, size) -> handle
//!   Binds the named block at slot 0. A second block evicts the first's
//!   binding; the slot is single-occupancy on purpose.
//! stage_update_uniform_block(stage, block, data_ptr, len)
//!   len counts bytes, written from the head of the block.
//! stage_create_texture(stage, image) -> handle
//! stage_create_texture_array(stage, image, layer_count) -> handle
//!   Slices the source image into layer_count equal-height bands; the
//!   image height must divide evenly.
//! stage_bind_texture(stage, texture)
//! ```
//!
//! ### Programs
//!
//! ```text
//! program_destroy(handle)
//! ```
//!
//! ### Diagnostics and math
//!
//! The guest has no math library of its own.
//!
//! ```text
//! host_log(shell, msg_ptr)
//! host_sin(x) -> f32      host_cos(x) -> f32     host_tan(x) -> f32
//! host_asin(x) -> f32     host_acos(x) -> f32    host_sqrt(x) -> f32
//! ```
//!
//! ## Memory Layouts
//!
//! All multi-byte fields are little-endian u32 unless noted.
//!
//! Attribute descriptor (24 bytes, fixed stride):
//!
//! ```text
//! [0..4]   name_ptr      null-terminated attribute name
//! [4..8]   buffer        buffer index
//! [8..12]  components    components per vertex
//! [12..16] kind          component type tag (f32 at this boundary)
//! [16..20] stride        byte stride between vertices
//! [20..24] offset        byte offset of the first component
//! ```
//!
//! Geometry descriptor (24-byte header):
//!
//! ```text
//! [0..4]   buffers_ptr      first buffer table entry
//! [4..8]   buffer_count
//! [8..12]  attributes_ptr   first attribute descriptor
//! [12..16] attribute_count
//! [16..20] vertex_count
//! [20..24] mode             draw mode tag
//! ```
//!
//! Buffer table entries are variable-length: data_ptr(4), element_count(4),
//! with the next entry at `+8 + element_count*4`. The decoder walks entries
//! by each entry's own declared count; a corrupt count desynchronizes every
//! later entry. That is the guest's trust boundary - the only defense is a
//! bounds check on each decoded span.
//!
//! ## Handles
//!
//! Handles are process-wide unique non-negative integers from a monotonic
//! counter; a removed handle's value is never reissued. Handles are untyped
//! at the boundary - every call re-checks the resolved resource's kind
//! before using it, and a stale or mistyped handle on a runtime path is a
//! logged no-op rather than a trap, so a guest racing its own teardown
//! cannot halt the frame loop.

mod abi;
mod decode;
mod error;
mod handle;
mod memory;
mod validate;

#[cfg(target_arch = "wasm32")]
mod imports;
#[cfg(target_arch = "wasm32")]
mod loader;
#[cfg(target_arch = "wasm32")]
mod resource;
#[cfg(target_arch = "wasm32")]
mod shell;

pub use abi::*;
pub use decode::*;
pub use error::*;
pub use handle::*;
pub use memory::*;
pub use validate::*;

#[cfg(target_arch = "wasm32")]
pub use imports::*;
#[cfg(target_arch = "wasm32")]
pub use loader::*;
#[cfg(target_arch = "wasm32")]
pub use resource::*;
#[cfg(target_arch = "wasm32")]
pub use shell::*;
