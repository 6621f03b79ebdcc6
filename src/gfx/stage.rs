//! The stage: canvas, GL context, and baseline state
//!
//! Created once per shell, torn down explicitly. Baseline state is set at
//! creation and assumed by everything after: depth test on, face culling
//! off, alpha blending on with src-alpha / one-minus-src-alpha.
//!
//! The currently bound program is explicit Stage state, not hidden device
//! state, because it is load-bearing: attribute and uniform-block
//! locations resolve against whichever program is current when geometry or
//! blocks are created. Bind before you create.

use js_sys::Float32Array;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, HtmlImageElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram,
    WebGlVertexArrayObject,
};

use crate::bridge::{AttributeLayout, BridgeError, BridgeResult, GeometryDesc, GuestMemory};
use crate::console_log;

use super::shader::{self, Program};
use super::texture::{self, Texture};
use super::uniforms::{self, UniformBlock};

/// Uniform blocks always bind at this slot. Creating a second block evicts
/// the first's binding; the slot is single-occupancy on purpose.
pub const UNIFORM_BINDING_SLOT: u32 = 0;

/// Vertex geometry: one layout object, its data buffers in order, and a
/// mutable draw count. Layout and buffer identities are fixed at creation;
/// count and buffer contents may change for streaming geometry.
pub struct Geometry {
    pub(crate) vao: WebGlVertexArrayObject,
    pub(crate) buffers: Vec<WebGlBuffer>,
    pub vertex_count: i32,
}

/// The rendering surface and device context.
pub struct Stage {
    canvas: HtmlCanvasElement,
    gl: GL,
    /// The program locations resolve against at creation time.
    current_program: Option<WebGlProgram>,
}

impl Stage {
    /// Create the canvas, attach it to the document, and set baseline
    /// state.
    pub fn new(width: u32, height: u32) -> BridgeResult<Self> {
        let window = web_sys::window().ok_or(creation("window"))?;
        let document = window.document().ok_or(creation("document"))?;

        let canvas = document
            .create_element("canvas")
            .map_err(|_| creation("canvas"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| creation("canvas"))?;
        canvas.set_width(width);
        canvas.set_height(height);
        document
            .body()
            .ok_or(creation("body"))?
            .append_child(&canvas)
            .map_err(|_| creation("canvas attach"))?;

        let gl = canvas
            .get_context("webgl2")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<GL>().ok())
            .ok_or(creation("webgl2 context"))?;

        gl.viewport(0, 0, width as i32, height as i32);
        gl.enable(GL::DEPTH_TEST);
        gl.disable(GL::CULL_FACE);
        gl.enable(GL::BLEND);
        gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);

        Ok(Self {
            canvas,
            gl,
            current_program: None,
        })
    }

    /// Set the clear color and clear color + depth.
    pub fn clear(&self, r: f32, g: f32, b: f32, a: f32) {
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);
    }

    pub fn create_program(&self, vert_src: &str, frag_src: &str) -> BridgeResult<Program> {
        let program = shader::link_program(&self.gl, vert_src, frag_src)?;
        Ok(Program::new(self.gl.clone(), program))
    }

    /// Make `program` current. Must precede geometry or uniform-block
    /// creation for the program whose locations they resolve.
    pub fn bind_program(&mut self, program: &Program) {
        self.gl.use_program(Some(program.raw()));
        self.current_program = Some(program.raw().clone());
    }

    /// Allocate a vertex layout object and one data buffer from the
    /// descriptor's first buffer entry, then wire each attribute against
    /// the currently bound program.
    pub fn create_geometry(
        &self,
        memory: &GuestMemory,
        desc: &GeometryDesc,
    ) -> BridgeResult<Geometry> {
        let program = self
            .current_program
            .as_ref()
            .ok_or(creation("geometry without a bound program"))?;

        let vao = self
            .gl
            .create_vertex_array()
            .ok_or(creation("vertex array"))?;
        self.gl.bind_vertex_array(Some(&vao));

        let span = desc
            .buffers
            .first()
            .ok_or(creation("geometry without buffer data"))?;
        let vbo = self.gl.create_buffer().ok_or(creation("vertex buffer"))?;
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(&vbo));
        let data = memory.float32_view(span.ptr, span.len)?;
        self.gl
            .buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &data, GL::STATIC_DRAW);

        for attribute in &desc.attributes {
            self.wire_attribute(program, attribute);
        }

        Ok(Geometry {
            vao,
            buffers: vec![vbo],
            vertex_count: desc.vertex_count as i32,
        })
    }

    fn wire_attribute(&self, program: &WebGlProgram, attribute: &AttributeLayout) {
        let location = self.gl.get_attrib_location(program, &attribute.name);
        if location < 0 {
            console_log!(
                "[stage] attribute '{}' not found in bound program",
                attribute.name
            );
            return;
        }
        self.gl.enable_vertex_attrib_array(location as u32);
        // Component type is fixed to f32 at this boundary.
        self.gl.vertex_attrib_pointer_with_i32(
            location as u32,
            attribute.components as i32,
            GL::FLOAT,
            false,
            attribute.stride as i32,
            attribute.offset as i32,
        );
    }

    /// Issue a triangle-list draw over the geometry's current vertex
    /// count.
    pub fn draw_geometry(&self, geometry: &Geometry) {
        self.gl.bind_vertex_array(Some(&geometry.vao));
        self.gl.draw_arrays(GL::TRIANGLES, 0, geometry.vertex_count);
    }

    /// Overwrite one of the geometry's buffers in place, from its head.
    pub fn update_geometry(
        &self,
        geometry: &Geometry,
        buffer_index: usize,
        data: &Float32Array,
    ) -> BridgeResult<()> {
        let buffer = geometry
            .buffers
            .get(buffer_index)
            .ok_or(BridgeError::OutOfRange {
                offset: buffer_index,
                len: 1,
                size: geometry.buffers.len(),
            })?;
        self.gl.bind_vertex_array(Some(&geometry.vao));
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(buffer));
        self.gl
            .buffer_sub_data_with_i32_and_array_buffer_view(GL::ARRAY_BUFFER, 0, data);
        Ok(())
    }

    /// Resolve the named block on the current program, bind it at the
    /// global slot, and allocate its buffer: at least the device-reported
    /// minimum, zero-filled, identity at the head.
    pub fn create_uniform_block(&self, name: &str, requested: usize) -> BridgeResult<UniformBlock> {
        let program = self
            .current_program
            .as_ref()
            .ok_or(creation("uniform block without a bound program"))?;

        let index = self.gl.get_uniform_block_index(program, name);
        if index == GL::INVALID_INDEX {
            return Err(creation("uniform block not found in bound program"));
        }
        self.gl
            .uniform_block_binding(program, index, UNIFORM_BINDING_SLOT);

        let minimum = self
            .gl
            .get_active_uniform_block_parameter(program, index, GL::UNIFORM_BLOCK_DATA_SIZE)
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as usize;
        let byte_len = uniforms::block_byte_len(requested, minimum);
        let contents = uniforms::initial_contents(byte_len);

        let buffer = self.gl.create_buffer().ok_or(creation("uniform buffer"))?;
        self.gl.bind_buffer(GL::UNIFORM_BUFFER, Some(&buffer));
        let view = Float32Array::from(contents.as_slice());
        self.gl
            .buffer_data_with_array_buffer_view(GL::UNIFORM_BUFFER, &view, GL::STATIC_DRAW);
        self.gl
            .bind_buffer_base(GL::UNIFORM_BUFFER, UNIFORM_BINDING_SLOT, Some(&buffer));

        Ok(UniformBlock::new(buffer, byte_len))
    }

    /// Partial overwrite of a block's buffer. Fails with `OutOfRange` when
    /// the write would pass the allocation's end.
    pub fn update_uniform_block(
        &self,
        block: &UniformBlock,
        byte_offset: usize,
        len: usize,
        data: &js_sys::Uint8Array,
    ) -> BridgeResult<()> {
        if byte_offset + len > block.byte_len() {
            return Err(BridgeError::OutOfRange {
                offset: byte_offset,
                len,
                size: block.byte_len(),
            });
        }
        self.gl.bind_buffer(GL::UNIFORM_BUFFER, Some(block.raw()));
        self.gl.buffer_sub_data_with_i32_and_array_buffer_view(
            GL::UNIFORM_BUFFER,
            byte_offset as i32,
            data,
        );
        Ok(())
    }

    pub fn create_texture(&self, image: &HtmlImageElement) -> BridgeResult<Texture> {
        texture::create_crisp_texture(&self.gl, image)
    }

    pub fn create_texture_array(
        &self,
        image: &HtmlImageElement,
        layers: u32,
    ) -> BridgeResult<Texture> {
        texture::create_crisp_texture_array(&self.gl, image, layers)
    }

    /// Bind as 2D or layered depending on how the texture was built.
    pub fn bind_texture(&self, texture: &Texture) {
        let target = if texture.is_layered() {
            GL::TEXTURE_2D_ARRAY
        } else {
            GL::TEXTURE_2D
        };
        self.gl.bind_texture(target, Some(texture.raw()));
    }

    /// Tear down the canvas. Programs, geometry, and textures created
    /// through this stage are NOT destroyed here; the guest destroys its
    /// children first.
    pub fn destroy(&self) {
        self.canvas.remove();
    }
}

fn creation(what: &'static str) -> BridgeError {
    BridgeError::ResourceCreation { what }
}
