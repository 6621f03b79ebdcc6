//! Boot sequence
//!
//! Fetch the guest, check its exports against the ABI, wire the bridge,
//! start the loop. Nothing touches GL until the module has passed
//! validation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::bridge::{self, BridgeResult, BridgeState, GuestMemory, ModuleValidator};
use crate::config::BootConfig;
use crate::console_log;
use crate::runtime::{self, FrameLoop};

/// Boot the bridge and hand back the running frame loop.
pub async fn launch(config: BootConfig) -> BridgeResult<FrameLoop> {
    console_log!("[boot] fetching guest module '{}'", config.module_url);
    let bytes = bridge::fetch_module(&config.module_url).await?;

    ModuleValidator::validate(&bytes)?;
    console_log!("[boot] guest module valid ({} bytes)", bytes.len());

    let state = Rc::new(RefCell::new(BridgeState::new(config)));
    let imports = bridge::build_imports(Rc::clone(&state))?;
    let guest = bridge::instantiate(&bytes, &imports).await?;

    // The import object had to exist before instantiation, so the memory
    // reference lands in the shared state afterwards.
    state.borrow_mut().memory = Some(GuestMemory::new(guest.memory.clone()));

    Ok(runtime::start(guest))
}
