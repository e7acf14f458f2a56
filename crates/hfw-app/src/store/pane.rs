//! Runtime pane and snap-in records

use hfw_core::{FullPaneId, FullSnapInId};
use hfw_hldl::PaneDescription;

/// A snap-in tab inside a pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapInTab {
    pub snap_in_id: String,
    pub snap_in_type: String,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct Pane {
    pub id: FullPaneId,
    pub tabs: Vec<SnapInTab>,
    pub selected_snap_in_id: Option<String>,
    pub visible: bool,
    pub start_closed: bool,
    pub full_screen: bool,
    pub tab_change_in_progress: bool,
    /// Modes in which the pane may be shown; empty means all
    pub modes: Vec<String>,
    pub displayable: bool,
}

impl Pane {
    pub fn from_description(frame_id: &str, desc: &PaneDescription) -> Self {
        let tabs: Vec<SnapInTab> = desc
            .snap_in_references
            .iter()
            .map(|r| SnapInTab {
                snap_in_id: r.id.clone(),
                snap_in_type: r.snap_in_type.clone(),
                visible: r.tab_visible,
            })
            .collect();

        let selected_snap_in_id = tabs
            .iter()
            .find(|t| t.visible)
            .map(|t| t.snap_in_id.clone());

        Self {
            id: FullPaneId::new(frame_id, desc.id.clone()),
            tabs,
            selected_snap_in_id,
            visible: !desc.start_closed,
            start_closed: desc.start_closed,
            full_screen: false,
            tab_change_in_progress: false,
            modes: desc.modes.clone(),
            displayable: true,
        }
    }

    pub fn hosts(&self, snap_in_id: &str) -> bool {
        self.tabs.iter().any(|t| t.snap_in_id == snap_in_id)
    }

    pub fn tab_mut(&mut self, snap_in_id: &str) -> Option<&mut SnapInTab> {
        self.tabs.iter_mut().find(|t| t.snap_in_id == snap_in_id)
    }

    pub fn first_visible_tab(&self) -> Option<&SnapInTab> {
        self.tabs.iter().find(|t| t.visible)
    }

    pub fn is_tab_visible(&self, snap_in_id: &str) -> bool {
        self.tabs
            .iter()
            .any(|t| t.snap_in_id == snap_in_id && t.visible)
    }

    pub fn is_displayable_in(&self, mode: Option<&str>) -> bool {
        match mode {
            Some(mode) => self.modes.is_empty() || self.modes.iter().any(|m| m == mode),
            None => true,
        }
    }
}

/// A snap-in instance and the panes that may host it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapIn {
    pub id: FullSnapInId,
    pub snap_in_type: String,
    pub host_panes: Vec<String>,
    /// Pane the instance moves to during a reuse-preserving transition
    pub future_pane_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hfw_hldl::SnapInReference;

    fn reference(id: &str, visible: bool) -> SnapInReference {
        SnapInReference {
            id: id.into(),
            snap_in_type: format!("{id}-type"),
            tab_visible: visible,
        }
    }

    #[test]
    fn test_from_description_selects_first_visible_tab() {
        let desc = PaneDescription {
            id: "primary".into(),
            start_closed: true,
            modes: vec![],
            snap_in_references: vec![reference("hidden", false), reference("props", true)],
        };

        let pane = Pane::from_description("main", &desc);

        assert_eq!(pane.id, FullPaneId::new("main", "primary"));
        assert_eq!(pane.selected_snap_in_id.as_deref(), Some("props"));
        assert!(!pane.visible);
        assert!(pane.start_closed);
        assert!(pane.hosts("hidden"));
        assert!(!pane.is_tab_visible("hidden"));
    }

    #[test]
    fn test_displayable_in_mode() {
        let mut pane = Pane::from_description(
            "main",
            &PaneDescription {
                id: "p".into(),
                ..Default::default()
            },
        );
        assert!(pane.is_displayable_in(Some("edit")));

        pane.modes = vec!["edit".into()];
        assert!(pane.is_displayable_in(Some("edit")));
        assert!(!pane.is_displayable_in(Some("view")));
        assert!(pane.is_displayable_in(None));
    }
}
