//! Core domain types for the shell

use std::fmt;

use serde::{Deserialize, Serialize};

/// Process-wide application status.
///
/// Exactly one value is current at any time. The orchestrator checks it
/// synchronously before starting an operation and sets it before the first
/// suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppStatus {
    /// Layout description loaded, first navigation not yet completed
    #[default]
    Initializing,
    /// Idle and accepting navigation requests
    Running,
    /// Switching the active frame
    SwitchingFrame,
    /// Mode change or explicit layout/view navigation in progress
    ProcessingMessage,
    /// A cross-pane selection message is being routed
    ProcessingNewSelection,
    /// The router is driving a state update (back/forward, external link)
    UpdatingFromNavigate,
}

impl AppStatus {
    /// Statuses in which a pane tab navigation may start.
    pub fn allows_snap_in_navigation(&self) -> bool {
        matches!(self, AppStatus::Running | AppStatus::SwitchingFrame)
    }

    /// Statuses in which a mode change may start (also mid frame switch).
    pub fn allows_mode_change(&self) -> bool {
        matches!(
            self,
            AppStatus::Running | AppStatus::SwitchingFrame | AppStatus::ProcessingNewSelection
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppStatus::Initializing => "Initializing",
            AppStatus::Running => "Running",
            AppStatus::SwitchingFrame => "SwitchingFrame",
            AppStatus::ProcessingMessage => "ProcessingMessage",
            AppStatus::ProcessingNewSelection => "ProcessingNewSelection",
            AppStatus::UpdatingFromNavigate => "UpdatingFromNavigate",
        }
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Screen-size class used to bucket remembered layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenSize {
    /// Mobile visibility is active; a reserved layout id is used
    Mobile,
    Small,
    Large,
}

impl ScreenSize {
    pub fn classify(width: u32, mobile: bool, large_min_width: u32) -> Self {
        if mobile {
            ScreenSize::Mobile
        } else if width >= large_min_width {
            ScreenSize::Large
        } else {
            ScreenSize::Small
        }
    }
}

/// Docking classification of a frame. Docked frames are never switched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Docked {
    #[default]
    None,
    Top,
}

/// A pane addressed within its frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullPaneId {
    pub frame_id: String,
    pub pane_id: String,
}

impl FullPaneId {
    pub fn new(frame_id: impl Into<String>, pane_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            pane_id: pane_id.into(),
        }
    }
}

impl fmt::Display for FullPaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.frame_id, self.pane_id)
    }
}

/// A snap-in instance, unique by `(frame_id, snap_in_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullSnapInId {
    pub frame_id: String,
    pub snap_in_id: String,
}

impl FullSnapInId {
    pub fn new(frame_id: impl Into<String>, snap_in_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            snap_in_id: snap_in_id.into(),
        }
    }
}

impl fmt::Display for FullSnapInId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.frame_id, self.snap_in_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_status_default_is_initializing() {
        assert_eq!(AppStatus::default(), AppStatus::Initializing);
    }

    #[test]
    fn test_snap_in_navigation_guard() {
        assert!(AppStatus::Running.allows_snap_in_navigation());
        assert!(AppStatus::SwitchingFrame.allows_snap_in_navigation());
        assert!(!AppStatus::Initializing.allows_snap_in_navigation());
        assert!(!AppStatus::UpdatingFromNavigate.allows_snap_in_navigation());
        assert!(!AppStatus::ProcessingMessage.allows_snap_in_navigation());
        assert!(!AppStatus::ProcessingNewSelection.allows_snap_in_navigation());
    }

    #[test]
    fn test_mode_change_guard() {
        assert!(AppStatus::Running.allows_mode_change());
        assert!(AppStatus::SwitchingFrame.allows_mode_change());
        assert!(AppStatus::ProcessingNewSelection.allows_mode_change());
        assert!(!AppStatus::ProcessingMessage.allows_mode_change());
        assert!(!AppStatus::Initializing.allows_mode_change());
    }

    #[test]
    fn test_screen_size_classify() {
        assert_eq!(ScreenSize::classify(1400, false, 1024), ScreenSize::Large);
        assert_eq!(ScreenSize::classify(800, false, 1024), ScreenSize::Small);
        assert_eq!(ScreenSize::classify(1400, true, 1024), ScreenSize::Mobile);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(FullPaneId::new("main", "primary").to_string(), "main.primary");
        assert_eq!(FullSnapInId::new("main", "tree").to_string(), "main.tree");
    }
}
