//! Runtime frame records

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use hfw_core::{Docked, ScreenSize};
use hfw_hldl::{FrameDescription, LayoutDescription, ViewDescription};

/// A layout of a frame, with its breakpoint and successor chain.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutInstance {
    pub id: String,
    pub min_width_from_media_query: Option<u32>,
    pub on_growth: Option<String>,
    pub on_shrink: Option<String>,
    pub is_default: bool,
    pub splitters: Option<serde_json::Value>,
}

impl LayoutInstance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            min_width_from_media_query: None,
            on_growth: None,
            on_shrink: None,
            is_default: false,
            splitters: None,
        }
    }

    /// A layout without breakpoint fits every screen.
    pub fn fits_all_screens(&self) -> bool {
        self.min_width_from_media_query.is_none()
    }

    pub fn fits_width(&self, width: u32) -> bool {
        self.min_width_from_media_query
            .map_or(true, |min_width| width >= min_width)
    }
}

impl From<&LayoutDescription> for LayoutInstance {
    fn from(desc: &LayoutDescription) -> Self {
        Self {
            id: desc.id.clone(),
            min_width_from_media_query: desc.min_width_from_media_query,
            on_growth: desc.on_growth.clone(),
            on_shrink: desc.on_shrink.clone(),
            is_default: desc.is_default,
            splitters: desc.splitters.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub id: String,
    pub is_default: bool,
    /// Empty allows every layout of the frame
    pub layouts: Vec<String>,
}

impl View {
    pub fn allows(&self, layout_id: &str) -> bool {
        self.layouts.is_empty() || self.layouts.iter().any(|l| l == layout_id)
    }
}

impl From<&ViewDescription> for View {
    fn from(desc: &ViewDescription) -> Self {
        Self {
            id: desc.id.clone(),
            is_default: desc.is_default,
            layouts: desc.layouts.clone(),
        }
    }
}

/// Remembered layout per screen-size class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteLayoutsPerRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_layout_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_layout_id: Option<String>,
}

impl FavoriteLayoutsPerRange {
    /// Favorite for a screen-size class. Mobile never has one.
    pub fn for_size(&self, size: ScreenSize) -> Option<&str> {
        match size {
            ScreenSize::Mobile => None,
            ScreenSize::Small => self.small_layout_id.as_deref(),
            ScreenSize::Large => self.large_layout_id.as_deref(),
        }
    }
}

/// A top-level navigable area and its current selections.
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: String,
    pub docked: Docked,
    pub is_default: bool,
    pub q_param_service: Option<String>,
    pub primary_channel: Option<String>,
    pub layouts: Vec<LayoutInstance>,
    pub views: Vec<View>,
    /// Declared pane ids, in description order
    pub pane_ids: Vec<String>,
    /// Layout id → ordered pane ids placed by that layout
    pub panes_per_layout: HashMap<String, Vec<String>>,
    pub selected_layout_id: Option<String>,
    pub selected_view_id: Option<String>,
    /// Layouts usable with the current viewport and view
    pub available_layouts: Vec<String>,
    /// View id → remembered layouts
    pub favorite_layouts: HashMap<String, FavoriteLayoutsPerRange>,
    pub splitter_configuration: Option<serde_json::Value>,
    pub has_been_navigated_once: bool,
}

impl Frame {
    pub fn layout(&self, layout_id: &str) -> Option<&LayoutInstance> {
        self.layouts.iter().find(|l| l.id == layout_id)
    }

    pub fn view(&self, view_id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id == view_id)
    }

    pub fn default_view(&self) -> Option<&View> {
        self.views
            .iter()
            .find(|v| v.is_default)
            .or_else(|| self.views.first())
    }

    pub fn selected_layout(&self) -> Option<&LayoutInstance> {
        self.selected_layout_id
            .as_deref()
            .and_then(|id| self.layout(id))
    }

    /// Pane ids placed by a layout; empty for unknown layouts.
    pub fn panes_in_layout(&self, layout_id: &str) -> &[String] {
        self.panes_per_layout
            .get(layout_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_layout_available(&self, layout_id: &str) -> bool {
        self.available_layouts.iter().any(|l| l == layout_id)
    }

    pub fn is_docked(&self) -> bool {
        self.docked != Docked::None
    }
}

impl From<&FrameDescription> for Frame {
    fn from(desc: &FrameDescription) -> Self {
        let panes_per_layout = desc
            .layouts
            .iter()
            .map(|l| {
                (
                    l.id.clone(),
                    l.pane_instances.iter().map(|p| p.id.clone()).collect(),
                )
            })
            .collect();

        let views: Vec<View> = desc.views.iter().map(View::from).collect();
        let selected_view_id = views
            .iter()
            .find(|v| v.is_default)
            .or_else(|| views.first())
            .map(|v| v.id.clone());

        Self {
            id: desc.id.clone(),
            docked: desc.docked,
            is_default: desc.is_default,
            q_param_service: desc.q_param_service.clone(),
            primary_channel: desc.primary_channel.clone(),
            layouts: desc.layouts.iter().map(LayoutInstance::from).collect(),
            views,
            pane_ids: desc.panes.iter().map(|p| p.id.clone()).collect(),
            panes_per_layout,
            selected_layout_id: None,
            selected_view_id,
            available_layouts: Vec::new(),
            favorite_layouts: HashMap::new(),
            splitter_configuration: None,
            has_been_navigated_once: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_fits_width() {
        let mut layout = LayoutInstance::new("2-pane");
        assert!(layout.fits_all_screens());
        assert!(layout.fits_width(0));

        layout.min_width_from_media_query = Some(300);
        assert!(!layout.fits_all_screens());
        assert!(layout.fits_width(300));
        assert!(!layout.fits_width(299));
    }

    #[test]
    fn test_view_allows() {
        let open = View {
            id: "v".into(),
            is_default: true,
            layouts: vec![],
        };
        assert!(open.allows("anything"));

        let scoped = View {
            layouts: vec!["1-pane".into()],
            ..open
        };
        assert!(scoped.allows("1-pane"));
        assert!(!scoped.allows("2-pane"));
    }

    #[test]
    fn test_favorite_for_size() {
        let fav = FavoriteLayoutsPerRange {
            small_layout_id: Some("1-pane".into()),
            large_layout_id: Some("3-pane".into()),
        };
        assert_eq!(fav.for_size(ScreenSize::Small), Some("1-pane"));
        assert_eq!(fav.for_size(ScreenSize::Large), Some("3-pane"));
        assert_eq!(fav.for_size(ScreenSize::Mobile), None);
    }

    #[test]
    fn test_favorite_serializes_camel_case() {
        let fav = FavoriteLayoutsPerRange {
            small_layout_id: None,
            large_layout_id: Some("2-pane".into()),
        };
        assert_eq!(
            serde_json::to_string(&fav).unwrap(),
            r#"{"largeLayoutId":"2-pane"}"#
        );
    }
}
