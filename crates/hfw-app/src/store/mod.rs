//! Runtime stores built from the layout description
//!
//! Frames, panes and snap-ins are created when the HLDL tree is parsed at
//! bootstrap or when a frame is added later, and dropped on frame removal.
//! Only the orchestrator mutates them.

mod frame;
mod pane;

use std::collections::HashMap;

use hfw_core::prelude::*;
use hfw_core::{FullPaneId, FullSnapInId};
use hfw_hldl::{FrameDescription, HfwInstance};

pub use frame::{FavoriteLayoutsPerRange, Frame, LayoutInstance, View};
pub use pane::{Pane, SnapIn, SnapInTab};

/// Viewport the layouts are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportContext {
    pub width: u32,
    pub mobile: bool,
}

/// All runtime records of the shell.
#[derive(Debug, Clone, Default)]
pub struct ShellStores {
    frames: Vec<Frame>,
    panes: HashMap<FullPaneId, Pane>,
    snap_ins: HashMap<FullSnapInId, SnapIn>,
    pub active_frame_id: Option<String>,
    pub active_mode_id: Option<String>,
    pub viewport: ViewportContext,
}

impl ShellStores {
    pub fn from_instance(instance: &HfwInstance, viewport: ViewportContext) -> Self {
        let mut stores = Self {
            viewport,
            active_mode_id: instance.default_mode().map(|m| m.id.clone()),
            ..Default::default()
        };

        for desc in &instance.frames {
            if let Err(e) = stores.add_frame(desc) {
                warn!("Skipping frame {}: {}", desc.id, e);
            }
        }

        stores.active_frame_id = instance.default_frame().map(|f| f.id.clone());
        debug!(
            "Stores built: {} frames, {} panes, {} snap-ins",
            stores.frames.len(),
            stores.panes.len(),
            stores.snap_ins.len()
        );
        stores
    }

    /// Add a frame with its panes and snap-ins.
    pub fn add_frame(&mut self, desc: &FrameDescription) -> Result<()> {
        if self.frame(&desc.id).is_some() {
            return Err(Error::config_invalid(format!(
                "frame {} already exists",
                desc.id
            )));
        }

        for pane_desc in &desc.panes {
            let pane = Pane::from_description(&desc.id, pane_desc);
            for tab in &pane.tabs {
                let id = FullSnapInId::new(desc.id.clone(), tab.snap_in_id.clone());
                let snap_in = self.snap_ins.entry(id.clone()).or_insert_with(|| SnapIn {
                    id,
                    snap_in_type: tab.snap_in_type.clone(),
                    host_panes: Vec::new(),
                    future_pane_id: None,
                });
                snap_in.host_panes.push(pane_desc.id.clone());
            }
            self.panes.insert(pane.id.clone(), pane);
        }

        self.frames.push(Frame::from(desc));
        Ok(())
    }

    /// Remove a frame and everything it owns.
    pub fn remove_frame(&mut self, frame_id: &str) -> Result<Frame> {
        let index = self
            .frames
            .iter()
            .position(|f| f.id == frame_id)
            .ok_or_else(|| Error::frame_not_found(frame_id))?;

        self.panes.retain(|id, _| id.frame_id != frame_id);
        self.snap_ins.retain(|id, _| id.frame_id != frame_id);
        if self.active_frame_id.as_deref() == Some(frame_id) {
            self.active_frame_id = None;
        }
        Ok(self.frames.remove(index))
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, frame_id: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == frame_id)
    }

    pub fn frame_mut(&mut self, frame_id: &str) -> Option<&mut Frame> {
        self.frames.iter_mut().find(|f| f.id == frame_id)
    }

    pub fn active_frame(&self) -> Option<&Frame> {
        self.active_frame_id
            .as_deref()
            .and_then(|id| self.frame(id))
    }

    pub fn pane(&self, id: &FullPaneId) -> Option<&Pane> {
        self.panes.get(id)
    }

    pub fn pane_mut(&mut self, id: &FullPaneId) -> Option<&mut Pane> {
        self.panes.get_mut(id)
    }

    /// Panes of a frame, in the frame's declaration order.
    pub fn panes_of_frame(&self, frame_id: &str) -> Vec<&Pane> {
        self.frame(frame_id)
            .map(|frame| {
                frame
                    .pane_ids
                    .iter()
                    .filter_map(|p| self.panes.get(&FullPaneId::new(frame_id, p.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn snap_in(&self, id: &FullSnapInId) -> Option<&SnapIn> {
        self.snap_ins.get(id)
    }

    pub fn snap_in_mut(&mut self, id: &FullSnapInId) -> Option<&mut SnapIn> {
        self.snap_ins.get_mut(id)
    }

    /// Recompute pane displayability for a mode.
    pub fn update_displayability(&mut self, mode: Option<&str>) {
        for pane in self.panes.values_mut() {
            pane.displayable = pane.is_displayable_in(mode);
        }
    }

    /// Clear the full-screen flag of every pane in a frame.
    pub fn reset_full_screen(&mut self, frame_id: &str) {
        for pane in self.panes.values_mut() {
            if pane.id.frame_id == frame_id {
                pane.full_screen = false;
            }
        }
    }

    pub fn clear_future_pane_hints(&mut self) {
        for snap_in in self.snap_ins.values_mut() {
            snap_in.future_pane_id = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hfw_hldl::ProfileDocument;

    const PROFILE: &str = r#"{"hfwInstance": {
        "isBaseInstance": true,
        "frames": [
            {"id": "main", "isDefault": true,
             "panes": [
                {"id": "selection", "snapInReferences": [{"id": "tree", "snapInType": "t"}]},
                {"id": "primary", "modes": ["edit"],
                 "snapInReferences": [{"id": "tree", "snapInType": "t"}, {"id": "props", "snapInType": "p"}]}
             ],
             "layouts": [{"id": "2-pane", "paneInstances": [{"id": "selection"}, {"id": "primary"}]}],
             "views": [{"id": "v1"}, {"id": "v2", "isDefault": true}]},
            {"id": "other", "panes": [{"id": "primary"}]}
        ],
        "modes": [{"id": "view", "isDefault": true}, {"id": "edit"}]
    }}"#;

    fn stores() -> ShellStores {
        let instance = ProfileDocument::parse(PROFILE).unwrap().hfw_instance;
        ShellStores::from_instance(&instance, ViewportContext::default())
    }

    #[test]
    fn test_from_instance_builds_records() {
        let stores = stores();

        assert_eq!(stores.frames().len(), 2);
        assert_eq!(stores.active_frame_id.as_deref(), Some("main"));
        assert_eq!(stores.active_mode_id.as_deref(), Some("view"));

        let main = stores.frame("main").unwrap();
        assert_eq!(main.selected_view_id.as_deref(), Some("v2"));
        assert_eq!(main.panes_in_layout("2-pane"), ["selection", "primary"]);

        let tree = stores.snap_in(&FullSnapInId::new("main", "tree")).unwrap();
        assert_eq!(tree.host_panes, vec!["selection", "primary"]);
        assert_eq!(stores.panes_of_frame("main").len(), 2);
    }

    #[test]
    fn test_add_duplicate_frame_rejected() {
        let mut stores = stores();
        let desc = FrameDescription {
            id: "main".into(),
            ..Default::default()
        };
        assert!(stores.add_frame(&desc).is_err());
    }

    #[test]
    fn test_remove_frame_drops_owned_records() {
        let mut stores = stores();
        let removed = stores.remove_frame("main").unwrap();

        assert_eq!(removed.id, "main");
        assert!(stores.active_frame_id.is_none());
        assert!(stores.pane(&FullPaneId::new("main", "primary")).is_none());
        assert!(stores.snap_in(&FullSnapInId::new("main", "tree")).is_none());
        assert!(stores.pane(&FullPaneId::new("other", "primary")).is_some());
        assert!(stores.remove_frame("main").is_err());
    }

    #[test]
    fn test_update_displayability() {
        let mut stores = stores();
        stores.update_displayability(Some("view"));

        assert!(!stores.pane(&FullPaneId::new("main", "primary")).unwrap().displayable);
        assert!(stores.pane(&FullPaneId::new("main", "selection")).unwrap().displayable);
    }
}
