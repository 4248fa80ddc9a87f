//! Single-flight guard for persistence cycles.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    rerun: bool,
}

/// Allows one persistence cycle at a time and remembers requests that
/// arrive while it runs.
#[derive(Debug, Default)]
pub struct SaveGate {
    state: Mutex<GateState>,
}

impl SaveGate {
    /// Creates an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the gate.
    ///
    /// Returns `None` when a cycle already holds it; that cycle is then
    /// asked to run once more before releasing.
    #[must_use]
    pub fn try_acquire(&self) -> Option<SaveTicket<'_>> {
        let mut state = self.lock();
        if state.in_flight {
            state.rerun = true;
            return None;
        }
        state.in_flight = true;
        Some(SaveTicket {
            gate: self,
            active: true,
        })
    }

    /// Whether a cycle currently holds the gate.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of holding the [`SaveGate`].
///
/// Dropping the ticket releases the gate, so a failed or cancelled cycle
/// never leaves it claimed. Requests queued behind such a cycle are
/// forgotten rather than rerun.
#[derive(Debug)]
pub struct SaveTicket<'gate> {
    gate: &'gate SaveGate,
    active: bool,
}

impl SaveTicket<'_> {
    /// Ends the current cycle.
    ///
    /// Returns the ticket again when another request arrived during the
    /// cycle, in which case the caller must run one more cycle. Otherwise the
    /// gate is released and `None` is returned.
    #[must_use]
    pub fn finish_or_rerun(mut self) -> Option<Self> {
        let gate = self.gate;
        let mut state = gate.lock();
        if state.rerun {
            state.rerun = false;
            drop(state);
            return Some(self);
        }
        state.in_flight = false;
        drop(state);
        self.active = false;
        None
    }
}

impl Drop for SaveTicket<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        let mut state = self.gate.lock();
        state.in_flight = false;
        state.rerun = false;
    }
}
