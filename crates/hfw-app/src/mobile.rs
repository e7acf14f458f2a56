//! Mobile navigation flags
//!
//! Process-wide UI flags shared between the shell chrome and the
//! orchestrator. Setters only notify subscribers when the value changes.

use tokio::sync::watch;

use hfw_core::prelude::*;

#[derive(Debug)]
pub struct MobileNavigation {
    mobile_only_visibility: watch::Sender<bool>,
    recalc_bottom_space: watch::Sender<bool>,
    right_panel_open: watch::Sender<bool>,
    is_last_node: watch::Sender<bool>,
}

fn set_flag(tx: &watch::Sender<bool>, name: &str, value: bool) -> bool {
    let changed = tx.send_if_modified(|current| {
        if *current == value {
            return false;
        }
        *current = value;
        true
    });
    if changed {
        debug!("{} = {}", name, value);
    }
    changed
}

impl MobileNavigation {
    pub fn new() -> Self {
        Self {
            mobile_only_visibility: watch::channel(false).0,
            recalc_bottom_space: watch::channel(false).0,
            right_panel_open: watch::channel(false).0,
            is_last_node: watch::channel(false).0,
        }
    }

    pub fn mobile_only_visibility(&self) -> watch::Receiver<bool> {
        self.mobile_only_visibility.subscribe()
    }

    pub fn is_mobile(&self) -> bool {
        *self.mobile_only_visibility.borrow()
    }

    /// Returns whether the flag changed.
    pub fn set_mobile_only_visibility(&self, value: bool) -> bool {
        set_flag(&self.mobile_only_visibility, "mobile_only_visibility", value)
    }

    pub fn recalc_bottom_space(&self) -> watch::Receiver<bool> {
        self.recalc_bottom_space.subscribe()
    }

    pub fn set_recalc_bottom_space(&self, value: bool) -> bool {
        set_flag(&self.recalc_bottom_space, "recalc_bottom_space", value)
    }

    pub fn right_panel_open(&self) -> watch::Receiver<bool> {
        self.right_panel_open.subscribe()
    }

    pub fn set_right_panel_open(&self, value: bool) -> bool {
        set_flag(&self.right_panel_open, "right_panel_open", value)
    }

    pub fn is_last_node(&self) -> watch::Receiver<bool> {
        self.is_last_node.subscribe()
    }

    pub fn set_is_last_node(&self, value: bool) -> bool {
        set_flag(&self.is_last_node, "is_last_node", value)
    }
}

impl Default for MobileNavigation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setter_is_idempotent() {
        let mobile = MobileNavigation::new();
        let mut rx = mobile.mobile_only_visibility();

        assert!(!mobile.set_mobile_only_visibility(false));
        assert!(!rx.has_changed().unwrap());

        assert!(mobile.set_mobile_only_visibility(true));
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
        assert!(mobile.is_mobile());

        assert!(!mobile.set_mobile_only_visibility(true));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_flags_are_independent() {
        let mobile = MobileNavigation::new();
        let panel = mobile.right_panel_open();
        let last = mobile.is_last_node();

        mobile.set_right_panel_open(true);
        mobile.set_recalc_bottom_space(true);

        assert!(*panel.borrow());
        assert!(!*last.borrow());
        assert!(*mobile.recalc_bottom_space().borrow());
    }
}
