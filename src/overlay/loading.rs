//! Loading indicator state.

use crate::editor::HostEditor;

/// Shows the host's loading widget while a check request is in flight.
#[derive(Debug)]
pub struct LoadingIndicator {
    enabled: bool,
    active: bool,
}

impl LoadingIndicator {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            active: false,
        }
    }

    pub fn start<E: HostEditor + ?Sized>(&mut self, editor: &E) {
        self.active = true;
        if self.enabled {
            editor.set_loading(true);
        }
    }

    pub fn stop<E: HostEditor + ?Sized>(&mut self, editor: &E) {
        if !self.active {
            return;
        }
        self.active = false;
        if self.enabled {
            editor.set_loading(false);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
