//! Shader compilation and linking

use web_sys::{WebGl2RenderingContext as GL, WebGlProgram, WebGlShader};

use crate::bridge::{BridgeError, BridgeResult};

/// A linked shader pair. Immutable after creation, except destruction.
#[derive(Clone)]
pub struct Program {
    gl: GL,
    program: WebGlProgram,
}

impl Program {
    pub(crate) fn new(gl: GL, program: WebGlProgram) -> Self {
        Self { gl, program }
    }

    pub fn raw(&self) -> &WebGlProgram {
        &self.program
    }

    /// Release the GL program object.
    pub fn destroy(&self) {
        self.gl.delete_program(Some(&self.program));
    }
}

/// Compile one shader stage, or fail with the driver's diagnostic log.
pub fn compile_shader(
    gl: &GL,
    stage: &'static str,
    kind: u32,
    src: &str,
) -> BridgeResult<WebGlShader> {
    let shader = gl.create_shader(kind).ok_or(BridgeError::ResourceCreation {
        what: "shader object",
    })?;
    gl.shader_source(&shader, src);
    gl.compile_shader(&shader);

    if !gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        return Err(BridgeError::Compile { stage, log });
    }

    Ok(shader)
}

/// Compile both stages and link them.
pub fn link_program(gl: &GL, vert_src: &str, frag_src: &str) -> BridgeResult<WebGlProgram> {
    let vert = compile_shader(gl, "vertex", GL::VERTEX_SHADER, vert_src)?;
    let frag = compile_shader(gl, "fragment", GL::FRAGMENT_SHADER, frag_src)?;

    let program = gl.create_program().ok_or(BridgeError::ResourceCreation {
        what: "program object",
    })?;
    gl.attach_shader(&program, &vert);
    gl.attach_shader(&program, &frag);
    gl.link_program(&program);

    if !gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        return Err(BridgeError::Link { log });
    }

    Ok(program)
}
