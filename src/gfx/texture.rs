//! Texture construction
//!
//! Both texture kinds use nearest-neighbor filtering in both directions -
//! the crisp pixel-art policy is part of the contract, not a default the
//! guest can change. A layered texture is built by slicing one tall source
//! image into equal-height horizontal bands, one per layer, uploaded in
//! index order; layered textures also get a full mipmap chain, 2D textures
//! do not.

use std::ops::Range;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement,
    WebGl2RenderingContext as GL, WebGlTexture,
};

#[cfg(target_arch = "wasm32")]
use crate::bridge::{BridgeError, BridgeResult};

/// Height of each band when an image of `height` is sliced into `layers`
/// equal strips. Truncating division; a height that does not divide evenly
/// is caller error and silently drops the remainder rows.
pub fn band_height(height: u32, layers: u32) -> u32 {
    if layers == 0 { 0 } else { height / layers }
}

/// Byte ranges of each band in a tightly packed RGBA image of
/// `width * height`. One range per layer, contiguous, non-overlapping,
/// in layer order.
pub fn band_ranges(width: u32, height: u32, layers: u32) -> Vec<Range<usize>> {
    let band_bytes = band_height(height, layers) as usize * width as usize * 4;
    (0..layers as usize)
        .map(|layer| {
            let start = layer * band_bytes;
            start..start + band_bytes
        })
        .collect()
}

/// A GPU texture, either a single 2D image or a layered array.
#[cfg(target_arch = "wasm32")]
pub struct Texture {
    texture: WebGlTexture,
    layered: bool,
}

#[cfg(target_arch = "wasm32")]
impl Texture {
    pub fn raw(&self) -> &WebGlTexture {
        &self.texture
    }

    pub fn is_layered(&self) -> bool {
        self.layered
    }
}

/// Upload an image as a 2D texture with crisp filtering.
#[cfg(target_arch = "wasm32")]
pub(crate) fn create_crisp_texture(gl: &GL, image: &HtmlImageElement) -> BridgeResult<Texture> {
    let texture = gl.create_texture().ok_or(BridgeError::ResourceCreation {
        what: "texture object",
    })?;
    gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
    gl.tex_image_2d_with_u32_and_u32_and_html_image_element(
        GL::TEXTURE_2D,
        0,
        GL::RGBA as i32,
        GL::RGBA,
        GL::UNSIGNED_BYTE,
        image,
    )
    .map_err(|_| BridgeError::ResourceCreation {
        what: "texture upload",
    })?;
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::NEAREST as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, GL::NEAREST as i32);

    Ok(Texture {
        texture,
        layered: false,
    })
}

/// Slice an image into `layers` horizontal bands and upload each as one
/// layer of a texture array, band 0 first.
#[cfg(target_arch = "wasm32")]
pub(crate) fn create_crisp_texture_array(
    gl: &GL,
    image: &HtmlImageElement,
    layers: u32,
) -> BridgeResult<Texture> {
    let width = image.width();
    let height = image.height();
    let band = band_height(height, layers);
    let pixels = read_image_pixels(image)?;

    let texture = gl.create_texture().ok_or(BridgeError::ResourceCreation {
        what: "texture object",
    })?;
    gl.bind_texture(GL::TEXTURE_2D_ARRAY, Some(&texture));
    gl.tex_image_3d_with_opt_u8_array(
        GL::TEXTURE_2D_ARRAY,
        0,
        GL::RGBA as i32,
        width as i32,
        band as i32,
        layers as i32,
        0,
        GL::RGBA,
        GL::UNSIGNED_BYTE,
        None,
    )
    .map_err(|_| BridgeError::ResourceCreation {
        what: "texture array allocation",
    })?;

    for (layer, range) in band_ranges(width, height, layers).into_iter().enumerate() {
        gl.tex_sub_image_3d_with_opt_u8_array(
            GL::TEXTURE_2D_ARRAY,
            0,
            0,
            0,
            layer as i32,
            width as i32,
            band as i32,
            1,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            Some(&pixels[range]),
        )
        .map_err(|_| BridgeError::ResourceCreation {
            what: "texture layer upload",
        })?;
    }

    gl.tex_parameteri(GL::TEXTURE_2D_ARRAY, GL::TEXTURE_MAG_FILTER, GL::NEAREST as i32);
    gl.tex_parameteri(GL::TEXTURE_2D_ARRAY, GL::TEXTURE_MIN_FILTER, GL::NEAREST as i32);
    gl.generate_mipmap(GL::TEXTURE_2D_ARRAY);

    Ok(Texture {
        texture,
        layered: true,
    })
}

/// Pull the decoded RGBA bytes out of an image via a scratch 2D canvas.
#[cfg(target_arch = "wasm32")]
fn read_image_pixels(image: &HtmlImageElement) -> BridgeResult<Vec<u8>> {
    let creation = |what: &'static str| BridgeError::ResourceCreation { what };

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or(creation("document"))?;
    let canvas = document
        .create_element("canvas")
        .map_err(|_| creation("scratch canvas"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| creation("scratch canvas"))?;
    canvas.set_width(image.width());
    canvas.set_height(image.height());

    let ctx = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
        .ok_or(creation("2d context"))?;
    ctx.draw_image_with_html_image_element(image, 0.0, 0.0)
        .map_err(|_| creation("image draw"))?;

    let data = ctx
        .get_image_data(0.0, 0.0, image.width() as f64, image.height() as f64)
        .map_err(|_| creation("image readback"))?;
    Ok(data.data().0)
}
