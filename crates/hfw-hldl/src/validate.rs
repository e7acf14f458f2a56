//! Structural checks over a merged instance

use std::collections::HashSet;
use std::fmt;

use hfw_core::prelude::*;

use crate::model::HfwInstance;

/// A structural problem found in a layout description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    DuplicateFrame {
        frame_id: String,
    },
    DuplicateLayout {
        frame_id: String,
        layout_id: String,
    },
    /// `onGrowth`/`onShrink` names a layout the frame does not declare
    DanglingSuccessor {
        frame_id: String,
        layout_id: String,
        successor: String,
    },
    /// A layout places a pane the frame does not declare
    UnknownPane {
        frame_id: String,
        layout_id: String,
        pane_id: String,
    },
    /// A view allows a layout the frame does not declare
    UnknownViewLayout {
        frame_id: String,
        view_id: String,
        layout_id: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::DuplicateFrame { frame_id } => {
                write!(f, "frame {frame_id} declared more than once")
            }
            ValidationIssue::DuplicateLayout {
                frame_id,
                layout_id,
            } => write!(f, "layout {frame_id}.{layout_id} declared more than once"),
            ValidationIssue::DanglingSuccessor {
                frame_id,
                layout_id,
                successor,
            } => write!(
                f,
                "layout {frame_id}.{layout_id} references unknown successor {successor}"
            ),
            ValidationIssue::UnknownPane {
                frame_id,
                layout_id,
                pane_id,
            } => write!(
                f,
                "layout {frame_id}.{layout_id} places undeclared pane {pane_id}"
            ),
            ValidationIssue::UnknownViewLayout {
                frame_id,
                view_id,
                layout_id,
            } => write!(
                f,
                "view {frame_id}.{view_id} allows undeclared layout {layout_id}"
            ),
        }
    }
}

/// Collect structural issues; each one is also logged as a warning.
pub fn validate(instance: &HfwInstance) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut frame_ids = HashSet::new();

    for frame in &instance.frames {
        if !frame_ids.insert(frame.id.as_str()) {
            issues.push(ValidationIssue::DuplicateFrame {
                frame_id: frame.id.clone(),
            });
        }

        let mut layout_ids = HashSet::new();
        for layout in &frame.layouts {
            if !layout_ids.insert(layout.id.as_str()) {
                issues.push(ValidationIssue::DuplicateLayout {
                    frame_id: frame.id.clone(),
                    layout_id: layout.id.clone(),
                });
            }
        }

        for layout in &frame.layouts {
            for successor in [&layout.on_growth, &layout.on_shrink].into_iter().flatten() {
                if !layout_ids.contains(successor.as_str()) {
                    issues.push(ValidationIssue::DanglingSuccessor {
                        frame_id: frame.id.clone(),
                        layout_id: layout.id.clone(),
                        successor: successor.clone(),
                    });
                }
            }
            for pane in &layout.pane_instances {
                if frame.pane(&pane.id).is_none() {
                    issues.push(ValidationIssue::UnknownPane {
                        frame_id: frame.id.clone(),
                        layout_id: layout.id.clone(),
                        pane_id: pane.id.clone(),
                    });
                }
            }
        }

        for view in &frame.views {
            for layout_id in &view.layouts {
                if !layout_ids.contains(layout_id.as_str()) {
                    issues.push(ValidationIssue::UnknownViewLayout {
                        frame_id: frame.id.clone(),
                        view_id: view.id.clone(),
                        layout_id: layout_id.clone(),
                    });
                }
            }
        }
    }

    for issue in &issues {
        warn!("HLDL: {}", issue);
    }
    issues
}
