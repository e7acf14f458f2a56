//! HLDL document model
//!
//! The layout description is a JSON document whose root object carries a single
//! `hfwInstance` entry. Only the parts the orchestration logic inspects are
//! modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use hfw_core::prelude::*;
use hfw_core::Docked;

/// Root of a profile file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    pub hfw_instance: HfwInstance,
}

impl ProfileDocument {
    /// Parse a profile file.
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The parsed layout-description tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HfwInstance {
    /// A base instance terminates the `parentProfile` chain
    #[serde(default)]
    pub is_base_instance: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_profile: Option<String>,

    #[serde(default)]
    pub frames: Vec<FrameDescription>,

    #[serde(default)]
    pub modes: Vec<ModeDescription>,

    #[serde(default)]
    pub snap_in_types: Vec<SnapInTypeDescription>,
}

impl HfwInstance {
    pub fn frame(&self, frame_id: &str) -> Option<&FrameDescription> {
        self.frames.iter().find(|f| f.id == frame_id)
    }

    /// The frame flagged as default, falling back to the first undocked frame.
    pub fn default_frame(&self) -> Option<&FrameDescription> {
        self.frames
            .iter()
            .find(|f| f.is_default)
            .or_else(|| self.frames.iter().find(|f| f.docked == Docked::None))
    }

    pub fn mode(&self, mode_id: &str) -> Option<&ModeDescription> {
        self.modes.iter().find(|m| m.id == mode_id)
    }

    pub fn default_mode(&self) -> Option<&ModeDescription> {
        self.modes
            .iter()
            .find(|m| m.is_default)
            .or_else(|| self.modes.first())
    }
}

/// A top-level navigable area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDescription {
    pub id: String,

    #[serde(default)]
    pub docked: Docked,

    #[serde(default)]
    pub is_default: bool,

    /// q-param service resolving first/deep-link selections for this frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_param_service: Option<String>,

    /// Channel the first selection message is delivered on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_channel: Option<String>,

    #[serde(default)]
    pub panes: Vec<PaneDescription>,

    #[serde(default)]
    pub layouts: Vec<LayoutDescription>,

    #[serde(default)]
    pub views: Vec<ViewDescription>,
}

impl FrameDescription {
    pub fn layout(&self, layout_id: &str) -> Option<&LayoutDescription> {
        self.layouts.iter().find(|l| l.id == layout_id)
    }

    pub fn pane(&self, pane_id: &str) -> Option<&PaneDescription> {
        self.panes.iter().find(|p| p.id == pane_id)
    }

    pub fn view(&self, view_id: &str) -> Option<&ViewDescription> {
        self.views.iter().find(|v| v.id == view_id)
    }
}

/// A sub-region of a frame hosting one active snap-in at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneDescription {
    pub id: String,

    #[serde(default)]
    pub start_closed: bool,

    /// Modes in which the pane is displayable; empty means all modes
    #[serde(default)]
    pub modes: Vec<String>,

    #[serde(default)]
    pub snap_in_references: Vec<SnapInReference>,
}

/// A snap-in tab hosted by a pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapInReference {
    pub id: String,

    pub snap_in_type: String,

    #[serde(default = "default_true")]
    pub tab_visible: bool,
}

fn default_true() -> bool {
    true
}

/// A named arrangement of panes valid for a viewport range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDescription {
    pub id: String,

    /// Viewport breakpoint; `None` fits all screens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width_from_media_query: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_growth: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_shrink: Option<String>,

    #[serde(default)]
    pub is_default: bool,

    #[serde(default)]
    pub pane_instances: Vec<PaneInstanceDescription>,

    /// Opaque splitter configuration forwarded to the renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splitters: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneInstanceDescription {
    pub id: String,
}

/// A view of a frame restricting the layouts it may be shown with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDescription {
    pub id: String,

    #[serde(default)]
    pub is_default: bool,

    /// Layout ids usable with this view; empty means all frame layouts
    #[serde(default)]
    pub layouts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeDescription {
    pub id: String,

    #[serde(default)]
    pub is_default: bool,

    /// Frames reachable in this mode; empty means all frames
    #[serde(default)]
    pub frames: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_frame: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapInTypeDescription {
    pub type_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{
        "hfwInstance": {
            "isBaseInstance": true,
            "frames": [{
                "id": "main",
                "isDefault": true,
                "qParamService": "qp",
                "primaryChannel": "ch",
                "panes": [
                    {"id": "selection", "snapInReferences": [{"id": "tree", "snapInType": "tree-type"}]},
                    {"id": "primary", "startClosed": true, "modes": ["edit"],
                     "snapInReferences": [{"id": "props", "snapInType": "props-type", "tabVisible": false}]}
                ],
                "layouts": [
                    {"id": "2-pane", "minWidthFromMediaQuery": 300, "onShrink": "1-pane",
                     "paneInstances": [{"id": "selection"}, {"id": "primary"}]},
                    {"id": "1-pane", "isDefault": true, "onGrowth": "2-pane",
                     "paneInstances": [{"id": "primary"}]}
                ],
                "views": [{"id": "default", "isDefault": true}]
            }, {
                "id": "toolbar",
                "docked": "top"
            }],
            "modes": [{"id": "default", "isDefault": true}]
        }
    }"#;

    #[test]
    fn test_parse_profile_document() {
        let doc = ProfileDocument::parse(PROFILE).unwrap();
        let instance = doc.hfw_instance;

        assert!(instance.is_base_instance);
        assert_eq!(instance.frames.len(), 2);

        let main = instance.frame("main").unwrap();
        assert_eq!(main.q_param_service.as_deref(), Some("qp"));
        assert_eq!(main.layouts[0].min_width_from_media_query, Some(300));
        assert_eq!(main.layouts[0].on_shrink.as_deref(), Some("1-pane"));
        assert!(main.layouts[1].is_default);
        assert!(main.pane("primary").unwrap().start_closed);
        assert!(main.pane("selection").unwrap().snap_in_references[0].tab_visible);
        assert!(!main.pane("primary").unwrap().snap_in_references[0].tab_visible);

        assert_eq!(instance.frame("toolbar").unwrap().docked, Docked::Top);
    }

    #[test]
    fn test_default_frame_and_mode() {
        let instance = ProfileDocument::parse(PROFILE).unwrap().hfw_instance;
        assert_eq!(instance.default_frame().unwrap().id, "main");
        assert_eq!(instance.default_mode().unwrap().id, "default");
    }

    #[test]
    fn test_default_frame_skips_docked() {
        let instance = HfwInstance {
            frames: vec![
                FrameDescription {
                    id: "top".into(),
                    docked: Docked::Top,
                    ..Default::default()
                },
                FrameDescription {
                    id: "work".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(instance.default_frame().unwrap().id, "work");
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(ProfileDocument::parse("{'hfwInstance': {}}").is_err());
    }
}
