//! The shell: the top-level resource factory
//!
//! The first thing a guest creates. It owns no GPU state of its own; it
//! knows how to make the stage and how to start image loads off the
//! network.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use super::error::{BridgeError, BridgeResult};

/// Where an in-flight image load stands.
///
/// A failed load is observable only as "not ready"; the guest owns the
/// give-up policy. There is no push notification across the boundary -
/// the guest polls once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed,
}

/// An asynchronously loading bitmap.
///
/// The state cell is flipped by the browser's completion handlers and read
/// synchronously by the guest's poll call. Destroying the handle while a
/// load is in flight orphans the browser-side load; its result, if it
/// arrives, lands in a cell nothing reads anymore.
pub struct ImageSlot {
    element: HtmlImageElement,
    state: Rc<Cell<LoadState>>,
}

impl ImageSlot {
    /// Start loading `path`. Returns immediately in the pending state.
    pub fn load(path: &str) -> BridgeResult<Self> {
        let element = HtmlImageElement::new().map_err(|_| BridgeError::ResourceCreation {
            what: "image element",
        })?;
        let state = Rc::new(Cell::new(LoadState::Pending));

        {
            let state = Rc::clone(&state);
            let closure = Closure::wrap(Box::new(move || {
                state.set(LoadState::Ready);
            }) as Box<dyn FnMut()>);
            element.set_onload(Some(closure.as_ref().unchecked_ref()));
            closure.forget(); // lives as long as the element
        }
        {
            let state = Rc::clone(&state);
            let closure = Closure::wrap(Box::new(move || {
                state.set(LoadState::Failed);
            }) as Box<dyn FnMut()>);
            element.set_onerror(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        element.set_src(path);
        Ok(Self { element, state })
    }

    /// True once the load completed. Pending and failed loads both read
    /// as not ready.
    pub fn is_ready(&self) -> bool {
        self.state.get() == LoadState::Ready
    }

    pub fn element(&self) -> &HtmlImageElement {
        &self.element
    }
}

/// The top-level factory the guest creates first.
pub struct Shell;

impl Shell {
    pub fn new() -> Self {
        Shell
    }

    pub fn load_image(&self, path: &str) -> BridgeResult<ImageSlot> {
        ImageSlot::load(path)
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}
