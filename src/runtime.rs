//! Frame loop
//!
//! Drives the guest through its three exports: `init` once on entry,
//! `update` on every animation frame while the running flag holds, and
//! `shutdown` exactly once on the first frame after the flag clears - no
//! further frames are scheduled after that. One transition, never
//! reversed.
//!
//! This is the only self-driven actor in the crate; everything else reacts
//! to guest calls or browser completion events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::bridge::GuestInstance;
use crate::console_log;

/// Shared holder for the self-rescheduling frame closure.
type TickClosure = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Control over a running frame loop.
pub struct FrameLoop {
    running: Rc<Cell<bool>>,
}

impl FrameLoop {
    /// Clear the running flag. The guest's `shutdown` runs on the next
    /// animation frame.
    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

/// Call the guest's `init`, then start ticking `update` once per animation
/// frame.
pub fn start(guest: GuestInstance) -> FrameLoop {
    let running = Rc::new(Cell::new(true));

    if let Err(e) = guest.init.call0(&JsValue::NULL) {
        web_sys::console::error_1(&format!("[runtime] guest init trapped: {:?}", e).into());
        running.set(false);
        return FrameLoop { running };
    }

    console_log!("[runtime] guest initialized, starting frame loop");

    // The closure has to reference itself to schedule the next frame, so
    // it lives in this shared cell. The cycle is deliberate: the loop
    // lives for the page lifetime.
    let tick: TickClosure = Rc::new(RefCell::new(None));
    let tick_handle = Rc::clone(&tick);

    let loop_running = Rc::clone(&running);
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if !loop_running.get() {
            // Stopped: one shutdown call, no frame scheduled after it.
            if let Err(e) = guest.shutdown.call0(&JsValue::NULL) {
                web_sys::console::error_1(
                    &format!("[runtime] guest shutdown trapped: {:?}", e).into(),
                );
            }
            console_log!("[runtime] frame loop stopped");
            return;
        }

        if let Err(e) = guest.update.call0(&JsValue::NULL) {
            // A trapped update abandons the loop without running shutdown;
            // the guest is in an unknown state.
            web_sys::console::error_1(&format!("[runtime] guest update trapped: {:?}", e).into());
            loop_running.set(false);
            return;
        }

        request_frame(&tick_handle);
    }) as Box<dyn FnMut()>));

    request_frame(&tick);
    FrameLoop { running }
}

/// Schedule the next animation frame.
fn request_frame(tick: &TickClosure) {
    let Some(window) = web_sys::window() else {
        console_log!("[runtime] no window object");
        return;
    };
    if let Some(closure) = tick.borrow().as_ref() {
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    }
}
