//! Resource registry entries
//!
//! Handles are untyped at the boundary; this tagged variant is how the
//! host gets type safety back. Every call site resolves its handle and
//! checks the kind before use - the caller's intended kind is never
//! trusted.

use crate::gfx::{Geometry, Program, Stage, Texture, UniformBlock};

use super::shell::{ImageSlot, Shell};

/// One live host resource. Each variant owns its host-side objects
/// exclusively; nothing is shared between handles.
pub enum Resource {
    Shell(Shell),
    Stage(Stage),
    Program(Program),
    Geometry(Geometry),
    Texture(Texture),
    UniformBlock(UniformBlock),
    Image(ImageSlot),
}

impl Resource {
    /// Kind tag for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Shell(_) => "shell",
            Resource::Stage(_) => "stage",
            Resource::Program(_) => "program",
            Resource::Geometry(_) => "geometry",
            Resource::Texture(_) => "texture",
            Resource::UniformBlock(_) => "uniform block",
            Resource::Image(_) => "image",
        }
    }

    pub fn as_shell(&self) -> Option<&Shell> {
        match self {
            Resource::Shell(shell) => Some(shell),
            _ => None,
        }
    }

    pub fn as_stage(&self) -> Option<&Stage> {
        match self {
            Resource::Stage(stage) => Some(stage),
            _ => None,
        }
    }

    pub fn as_stage_mut(&mut self) -> Option<&mut Stage> {
        match self {
            Resource::Stage(stage) => Some(stage),
            _ => None,
        }
    }

    pub fn as_program(&self) -> Option<&Program> {
        match self {
            Resource::Program(program) => Some(program),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Resource::Geometry(geometry) => Some(geometry),
            _ => None,
        }
    }

    pub fn as_geometry_mut(&mut self) -> Option<&mut Geometry> {
        match self {
            Resource::Geometry(geometry) => Some(geometry),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Texture> {
        match self {
            Resource::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn as_uniform_block(&self) -> Option<&UniformBlock> {
        match self {
            Resource::UniformBlock(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageSlot> {
        match self {
            Resource::Image(image) => Some(image),
            _ => None,
        }
    }
}
