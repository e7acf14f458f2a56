//! Layout management
//!
//! Stateless computations over a frame's layouts: which layouts fit the
//! viewport, which one fits best, and which one replaces the selected layout
//! when the set of available layouts grows or shrinks.
//!
//! The only mutation is the refresh of `Frame::available_layouts`, which the
//! growth/shrink decisions compare against.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::store::{FavoriteLayoutsPerRange, Frame, LayoutInstance, ViewportContext};

/// Inputs of layout availability.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    pub viewport: ViewportContext,
    pub mobile_layout_id: &'a str,
}

/// Result of a layout re-evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutChange {
    pub is_number_of_layout_changed: bool,
    pub new_layout_id: Option<String>,
}

/// Layout ids usable for `view_id` with the given viewport, in frame order.
///
/// While mobile-only visibility is on and the frame declares the reserved
/// mobile layout, that layout is the only one available. Otherwise the mobile
/// layout is never offered.
pub fn available_layouts(frame: &Frame, view_id: Option<&str>, ctx: &LayoutContext) -> Vec<String> {
    let view = view_id.and_then(|id| frame.view(id));
    let allowed = |layout: &LayoutInstance| view.map_or(true, |v| v.allows(&layout.id));

    if ctx.viewport.mobile {
        if let Some(mobile) = frame.layout(ctx.mobile_layout_id) {
            return vec![mobile.id.clone()];
        }
    }

    frame
        .layouts
        .iter()
        .filter(|l| l.id != ctx.mobile_layout_id)
        .filter(|l| allowed(l))
        .filter(|l| l.fits_width(ctx.viewport.width))
        .map(|l| l.id.clone())
        .collect()
}

/// Pick the best fitting layout.
///
/// Layouts are sorted by breakpoint, widest first, with breakpoint-less
/// layouts last. Walking back from the most generic end, the first default
/// layout wins; without any default the widest layout is used.
pub fn get_most_fitting_layout_id(layouts: &[&LayoutInstance]) -> Option<String> {
    let mut sorted = layouts.to_vec();
    // Stable: equal breakpoints keep their relative order
    sorted.sort_by(|a, b| {
        b.min_width_from_media_query
            .cmp(&a.min_width_from_media_query)
    });

    sorted
        .iter()
        .rev()
        .find(|l| l.is_default)
        .or_else(|| sorted.first())
        .map(|l| l.id.clone())
}

/// Most fitting layout among the frame's currently available layouts.
pub fn most_fitting_available(frame: &Frame) -> Option<String> {
    let candidates: Vec<&LayoutInstance> = frame
        .available_layouts
        .iter()
        .filter_map(|id| frame.layout(id))
        .collect();
    get_most_fitting_layout_id(&candidates)
}

/// Re-evaluate the frame's layouts against the viewport.
pub fn check_frame_needs_new_layout(frame: &mut Frame, ctx: &LayoutContext) -> LayoutChange {
    let previous_count = frame.available_layouts.len();
    let available = available_layouts(frame, frame.selected_view_id.as_deref(), ctx);

    if available.is_empty() {
        // Keep the previous list: a stale layout beats no layout
        warn!(
            "Frame {}: no layout fits width {}",
            frame.id, ctx.viewport.width
        );
        return LayoutChange::default();
    }

    let grew = available.len() > previous_count;
    let mut change = LayoutChange {
        is_number_of_layout_changed: available.len() != previous_count,
        new_layout_id: None,
    };
    frame.available_layouts = available;

    let selected = frame.selected_layout().cloned();

    if change.is_number_of_layout_changed {
        if let Some(selected) = &selected {
            if grew {
                if let Some(successor) = &selected.on_growth {
                    if frame.is_layout_available(successor) {
                        debug!("Frame {}: growing {} → {}", frame.id, selected.id, successor);
                        change.new_layout_id = Some(successor.clone());
                    }
                }
            } else if !frame.is_layout_available(&selected.id) {
                change.new_layout_id = find_next_available_layout_id_on_shrink(selected, frame);
                debug!(
                    "Frame {}: shrinking {} → {:?}",
                    frame.id, selected.id, change.new_layout_id
                );
            }
        }
    }

    let selected_available = selected
        .as_ref()
        .is_some_and(|s| frame.is_layout_available(&s.id));
    if change.new_layout_id.is_none() && !selected_available {
        change.new_layout_id = most_fitting_available(frame);
    }

    trace!("Frame {}: {:?}", frame.id, change);
    change
}

/// Re-evaluate the frame's layouts for a newly selected view.
pub fn check_frame_needs_new_layout_after_view_change(
    frame: &mut Frame,
    view_id: &str,
    ctx: &LayoutContext,
) -> LayoutChange {
    let previous_count = frame.available_layouts.len();
    let available = available_layouts(frame, Some(view_id), ctx);

    if available.is_empty() {
        warn!("Frame {}: view {} has no fitting layout", frame.id, view_id);
        return LayoutChange::default();
    }

    let mut change = LayoutChange {
        is_number_of_layout_changed: available.len() != previous_count,
        new_layout_id: None,
    };
    frame.available_layouts = available;

    let selected_available = frame
        .selected_layout_id
        .as_deref()
        .is_some_and(|id| frame.is_layout_available(id));
    if !selected_available {
        change.new_layout_id = most_fitting_available(frame);
    }
    change
}

/// Follow the `onShrink` chain from `starting` to the first available layout.
///
/// Falls back to the last available layout when the chain ends, points at an
/// undeclared layout, or loops.
pub fn find_next_available_layout_id_on_shrink(
    starting: &LayoutInstance,
    frame: &Frame,
) -> Option<String> {
    let mut visited = HashSet::new();
    visited.insert(starting.id.as_str());
    let mut current = starting;

    while let Some(next_id) = current.on_shrink.as_deref() {
        if frame.is_layout_available(next_id) {
            return Some(next_id.to_string());
        }
        if !visited.insert(next_id) {
            warn!(
                "Frame {}: onShrink chain from {} loops at {}",
                frame.id, starting.id, next_id
            );
            break;
        }
        match frame.layout(next_id) {
            Some(layout) => current = layout,
            None => break,
        }
    }

    frame.available_layouts.last().cloned()
}

/// Favorites after the user picked `layout_id` for `view_id`.
///
/// A breakpoint-less layout becomes the favorite for every range; any other
/// layout only for large screens. The mobile layout is never remembered.
pub fn calculate_next_favorite_layout_per_range(
    frame: &Frame,
    view_id: &str,
    layout_id: &str,
    mobile_layout_id: &str,
) -> FavoriteLayoutsPerRange {
    let mut favorites = frame
        .favorite_layouts
        .get(view_id)
        .cloned()
        .unwrap_or_default();

    if layout_id == mobile_layout_id {
        return favorites;
    }

    match frame.layout(layout_id) {
        Some(layout) if layout.fits_all_screens() => {
            favorites.small_layout_id = Some(layout_id.to_string());
            favorites.large_layout_id = Some(layout_id.to_string());
        }
        Some(_) => favorites.large_layout_id = Some(layout_id.to_string()),
        None => warn!("Frame {}: unknown favorite layout {}", frame.id, layout_id),
    }
    favorites
}
