//! Operation gate
//!
//! Per-family mutual exclusion for the four operation families. Acquiring a
//! family disables the controls it claims; the returned [`GateGuard`]
//! re-enables them when dropped, so every exit path releases, including
//! errors and futures dropped mid-flight.
//!
//! Families are independent: send and upload may be in flight together. A
//! second acquire of a busy family fails fast; nothing is queued.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ClientError;
use crate::ui::{Control, UiSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationFamily {
    Send,
    Upload,
    Reset,
    Delete,
}

impl OperationFamily {
    pub const ALL: [OperationFamily; 4] = [
        OperationFamily::Send,
        OperationFamily::Upload,
        OperationFamily::Reset,
        OperationFamily::Delete,
    ];

    fn index(self) -> usize {
        match self {
            OperationFamily::Send => 0,
            OperationFamily::Upload => 1,
            OperationFamily::Reset => 2,
            OperationFamily::Delete => 3,
        }
    }

    pub fn active_state(self) -> OperationState {
        match self {
            OperationFamily::Send => OperationState::Sending,
            OperationFamily::Upload => OperationState::Uploading,
            OperationFamily::Reset => OperationState::Resetting,
            OperationFamily::Delete => OperationState::Deleting,
        }
    }

    /// Controls disabled while this family is active
    pub fn controls(self) -> &'static [Control] {
        match self {
            OperationFamily::Send => &[Control::MessageInput, Control::SendButton],
            OperationFamily::Upload => &[Control::FilePicker, Control::UploadButton],
            OperationFamily::Reset => &[
                Control::MessageInput,
                Control::SendButton,
                Control::ResetButton,
            ],
            OperationFamily::Delete => &[Control::DeleteButtons],
        }
    }
}

impl fmt::Display for OperationFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationFamily::Send => "send",
            OperationFamily::Upload => "upload",
            OperationFamily::Reset => "reset",
            OperationFamily::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Sending,
    Uploading,
    Resetting,
    Deleting,
}

struct GateInner {
    states: Mutex<[OperationState; 4]>,
    ui: Arc<dyn UiSurface>,
}

impl GateInner {
    fn states(&self) -> MutexGuard<'_, [OperationState; 4]> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push control and loading state for `family` after a transition
    fn sync_controls(&self, states: &[OperationState; 4], family: OperationFamily) {
        for &control in family.controls() {
            let claimed = OperationFamily::ALL.iter().any(|other| {
                states[other.index()] != OperationState::Idle && other.controls().contains(&control)
            });
            self.ui.set_control_enabled(control, !claimed);
        }
        let any_active = states.iter().any(|s| *s != OperationState::Idle);
        self.ui.set_loading(any_active);
    }

    fn release(&self, family: OperationFamily) {
        let mut states = self.states();
        states[family.index()] = OperationState::Idle;
        self.sync_controls(&states, family);
        tracing::debug!(%family, "Operation gate released");
    }
}

#[derive(Clone)]
pub struct OperationGate {
    inner: Arc<GateInner>,
}

impl OperationGate {
    pub fn new(ui: Arc<dyn UiSurface>) -> Self {
        Self {
            inner: Arc::new(GateInner {
                states: Mutex::new([OperationState::Idle; 4]),
                ui,
            }),
        }
    }

    /// Move `family` from idle to active and disable its controls
    pub fn acquire(&self, family: OperationFamily) -> Result<GateGuard, ClientError> {
        let mut states = self.inner.states();
        if states[family.index()] != OperationState::Idle {
            tracing::warn!(%family, "Rejected re-entrant operation");
            return Err(ClientError::AlreadyInFlight(family));
        }
        states[family.index()] = family.active_state();
        self.inner.sync_controls(&states, family);
        tracing::debug!(%family, "Operation gate acquired");

        Ok(GateGuard {
            inner: Arc::clone(&self.inner),
            family,
        })
    }

    pub fn state(&self, family: OperationFamily) -> OperationState {
        self.inner.states()[family.index()]
    }

    pub fn is_idle(&self, family: OperationFamily) -> bool {
        self.state(family) == OperationState::Idle
    }
}

impl fmt::Debug for OperationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationGate")
            .field("states", &*self.inner.states())
            .finish()
    }
}

/// Active hold on one family; releases on drop
#[must_use = "dropping the guard releases the operation immediately"]
pub struct GateGuard {
    inner: Arc<GateInner>,
    family: OperationFamily,
}

impl GateGuard {
    pub fn family(&self) -> OperationFamily {
        self.family
    }

    /// Return the family to idle now
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.inner.release(self.family);
    }
}

impl fmt::Debug for GateGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateGuard")
            .field("family", &self.family)
            .finish()
    }
}
