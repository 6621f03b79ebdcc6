//! Guest ABI names and constants
//!
//! The stable interface between the bridge and guest modules. The full
//! contract is documented on the [`crate::bridge`] module.

/// ABI version number
pub const ABI_VERSION: u32 = 1;

/// Import module namespace
pub const IMPORT_NAMESPACE: &str = "env";

/// Returned by creation calls whose owning handle fails its type guard or
/// whose creation fails outright.
pub const INVALID_HANDLE: i32 = -1;

/// Required export names
pub mod exports {
    /// The linear memory export name
    pub const MEMORY: &str = "memory";
    /// Called once before the first frame
    pub const INIT: &str = "init";
    /// Called once per animation frame
    pub const UPDATE: &str = "update";
    /// Called once after the running flag clears
    pub const SHUTDOWN: &str = "shutdown";
}

/// Host call names (imported by the guest)
pub mod calls {
    // Shell: the resource factory
    pub const VITRINE_CREATE: &str = "vitrine_create";
    pub const VITRINE_DESTROY: &str = "vitrine_destroy";
    pub const VITRINE_LOAD_IMAGE: &str = "vitrine_load_image";
    pub const VITRINE_IMAGE_READY: &str = "vitrine_image_ready";

    // Stage: the graphics device
    pub const STAGE_CREATE: &str = "stage_create";
    pub const STAGE_DESTROY: &str = "stage_destroy";
    pub const STAGE_CLEAR: &str = "stage_clear";
    pub const STAGE_CREATE_PROGRAM: &str = "stage_create_program";
    pub const STAGE_BIND_PROGRAM: &str = "stage_bind_program";
    pub const STAGE_CREATE_GEOMETRY: &str = "stage_create_geometry";
    pub const STAGE_DRAW_GEOMETRY: &str = "stage_draw_geometry";
    pub const STAGE_SET_VERTEX_COUNT: &str = "stage_set_vertex_count";
    pub const STAGE_UPDATE_GEOMETRY: &str = "stage_update_geometry";
    pub const STAGE_CREATE_UNIFORM_BLOCK: &str = "stage_create_uniform_block";
    pub const STAGE_UPDATE_UNIFORM_BLOCK: &str = "stage_update_uniform_block";
    pub const STAGE_CREATE_TEXTURE: &str = "stage_create_texture";
    pub const STAGE_CREATE_TEXTURE_ARRAY: &str = "stage_create_texture_array";
    pub const STAGE_BIND_TEXTURE: &str = "stage_bind_texture";

    // Programs
    pub const PROGRAM_DESTROY: &str = "program_destroy";

    // Diagnostics and math
    pub const HOST_LOG: &str = "host_log";
    pub const HOST_SIN: &str = "host_sin";
    pub const HOST_COS: &str = "host_cos";
    pub const HOST_TAN: &str = "host_tan";
    pub const HOST_ASIN: &str = "host_asin";
    pub const HOST_ACOS: &str = "host_acos";
    pub const HOST_SQRT: &str = "host_sqrt";
}
