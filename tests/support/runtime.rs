//! Tokio runtime that can live inside `rstest-bdd` scenario state.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use rstest_bdd::Slot;
use tokio::runtime::Runtime;

/// Runtime handle shared between the synchronous steps of one scenario.
#[derive(Clone)]
pub struct SharedRuntime(Rc<RefCell<Runtime>>);

impl SharedRuntime {
    /// Runs `future` to completion.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.borrow().block_on(future)
    }
}

/// Returns the runtime stored in `slot`, creating it on first use.
///
/// # Errors
///
/// Returns an error if the Tokio runtime cannot be created.
pub fn runtime_in(slot: &Slot<SharedRuntime>) -> io::Result<SharedRuntime> {
    if let Some(existing) = slot.get() {
        return Ok(existing);
    }
    let shared = SharedRuntime(Rc::new(RefCell::new(Runtime::new()?)));
    slot.set(shared.clone());
    Ok(shared)
}
