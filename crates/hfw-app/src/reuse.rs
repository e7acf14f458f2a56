//! Snap-in reuse across layout changes
//!
//! Decides which live snap-in instances survive a layout change inside a frame
//! and keeps the bookkeeping the router consults while the route changes.
//!
//! Frame switches never reuse: the registry is reset before every switch.

use std::collections::HashSet;

use hfw_core::prelude::*;
use hfw_core::FullSnapInId;

use crate::store::ShellStores;

/// The snap-in currently shown by a pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSnapIn {
    pub pane_id: String,
    pub snap_in_id: String,
    /// Scratch flag of one evaluation
    pub handled: bool,
}

impl CurrentSnapIn {
    pub fn new(pane_id: impl Into<String>, snap_in_id: impl Into<String>) -> Self {
        Self {
            pane_id: pane_id.into(),
            snap_in_id: snap_in_id.into(),
            handled: false,
        }
    }
}

/// A pane a snap-in could occupy after the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuturePane {
    pub pane_id: String,
    pub occupied: bool,
}

impl FuturePane {
    pub fn new(pane_id: impl Into<String>) -> Self {
        Self {
            pane_id: pane_id.into(),
            occupied: false,
        }
    }
}

/// Candidate panes per snap-in id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuturePanes {
    entries: Vec<(String, Vec<FuturePane>)>,
}

impl FuturePanes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate pane for a snap-in.
    pub fn push(&mut self, snap_in_id: &str, pane_id: impl Into<String>) {
        let pane = FuturePane::new(pane_id);
        match self.entries.iter_mut().find(|(id, _)| id == snap_in_id) {
            Some((_, panes)) => panes.push(pane),
            None => self.entries.push((snap_in_id.to_string(), vec![pane])),
        }
    }

    pub fn get(&self, snap_in_id: &str) -> Option<&[FuturePane]> {
        self.entries
            .iter()
            .find(|(id, _)| id == snap_in_id)
            .map(|(_, panes)| panes.as_slice())
    }

    /// First unoccupied candidate of a snap-in accepted by `pick`.
    fn find_free(&self, snap_in_id: &str, pick: impl Fn(&str) -> bool) -> Option<String> {
        self.get(snap_in_id)?
            .iter()
            .find(|p| !p.occupied && pick(&p.pane_id))
            .map(|p| p.pane_id.clone())
    }

    /// Mark a pane occupied in every snap-in's candidate list.
    fn occupy(&mut self, pane_id: &str) {
        for (_, panes) in &mut self.entries {
            for pane in panes.iter_mut().filter(|p| p.pane_id == pane_id) {
                pane.occupied = true;
            }
        }
    }

    /// Total number of candidate slots.
    pub fn slot_count(&self) -> usize {
        self.entries.iter().map(|(_, panes)| panes.len()).sum()
    }
}

/// A snap-in instance carried over from one pane to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReusedSnapIn {
    pub snap_in: FullSnapInId,
    pub current_pane_id: String,
    pub future_pane_id: String,
}

/// Two-pass reuse assignment.
///
/// Pass 1 keeps snap-ins that can stay in a pane of the same name. Pass 2 moves
/// every remaining snap-in to its first unoccupied candidate. A pane taken by
/// one snap-in is occupied for all of them. Snap-ins left without a candidate
/// are not reused.
pub fn evaluate_snapins_to_reuse(
    frame_id: &str,
    current: &mut [CurrentSnapIn],
    future: &mut FuturePanes,
) -> Vec<ReusedSnapIn> {
    let mut reused = Vec::new();

    for entry in current.iter_mut() {
        let Some(pane_id) = future.find_free(&entry.snap_in_id, |p| p == entry.pane_id) else {
            continue;
        };
        future.occupy(&pane_id);
        entry.handled = true;
        reused.push(ReusedSnapIn {
            snap_in: FullSnapInId::new(frame_id, entry.snap_in_id.clone()),
            current_pane_id: entry.pane_id.clone(),
            future_pane_id: pane_id,
        });
    }

    for entry in current.iter_mut().filter(|e| !e.handled) {
        let Some(pane_id) = future.find_free(&entry.snap_in_id, |_| true) else {
            continue;
        };
        future.occupy(&pane_id);
        entry.handled = true;
        reused.push(ReusedSnapIn {
            snap_in: FullSnapInId::new(frame_id, entry.snap_in_id.clone()),
            current_pane_id: entry.pane_id.clone(),
            future_pane_id: pane_id,
        });
    }

    trace!("Frame {}: reusing {} snap-ins", frame_id, reused.len());
    reused
}

/// Collect reuse inputs for a layout change of a frame.
///
/// Current entries are the selected snap-ins of the visible panes of
/// `from_layout`; candidates are the panes of `to_layout` hosting them.
pub fn collect_reuse_inputs(
    stores: &ShellStores,
    frame_id: &str,
    from_layout: Option<&str>,
    to_layout: &str,
) -> (Vec<CurrentSnapIn>, FuturePanes) {
    let Some(frame) = stores.frame(frame_id) else {
        return (Vec::new(), FuturePanes::new());
    };

    let from_panes = from_layout.map(|l| frame.panes_in_layout(l)).unwrap_or(&[]);
    let current: Vec<CurrentSnapIn> = stores
        .panes_of_frame(frame_id)
        .into_iter()
        .filter(|p| p.visible && from_panes.contains(&p.id.pane_id))
        .filter_map(|p| {
            p.selected_snap_in_id
                .as_ref()
                .map(|s| CurrentSnapIn::new(p.id.pane_id.clone(), s.clone()))
        })
        .collect();

    let to_panes = frame.panes_in_layout(to_layout);
    let mut future = FuturePanes::new();
    for entry in &current {
        for pane in stores.panes_of_frame(frame_id) {
            if to_panes.contains(&pane.id.pane_id) && pane.hosts(&entry.snap_in_id) {
                future.push(&entry.snap_in_id, pane.id.pane_id.clone());
            }
        }
    }

    (current, future)
}

/// Router-facing reuse bookkeeping for one route change.
#[derive(Debug, Default)]
pub struct ReuseRegistry {
    preserved: Vec<ReusedSnapIn>,
}

impl ReuseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preserve exactly these instances for the next route change.
    ///
    /// Fails when an instance or a target pane is listed twice, or when the
    /// previous change was never reset.
    pub fn preserve(&mut self, entries: Vec<ReusedSnapIn>) -> Result<()> {
        if !self.preserved.is_empty() {
            return Err(Error::reuse_bookkeeping(format!(
                "{} instances still preserved from a previous change",
                self.preserved.len()
            )));
        }

        let mut snap_ins = HashSet::new();
        let mut targets = HashSet::new();
        for entry in &entries {
            if !snap_ins.insert(&entry.snap_in) {
                return Err(Error::reuse_bookkeeping(format!(
                    "snap-in {} preserved twice",
                    entry.snap_in
                )));
            }
            if !targets.insert(&entry.future_pane_id) {
                return Err(Error::reuse_bookkeeping(format!(
                    "pane {} targeted twice",
                    entry.future_pane_id
                )));
            }
        }

        debug!("Preserving {} snap-in instances", entries.len());
        self.preserved = entries;
        Ok(())
    }

    /// Whether the router should keep the instance of a snap-in.
    pub fn should_reuse(&self, snap_in: &FullSnapInId) -> Option<&ReusedSnapIn> {
        self.preserved.iter().find(|e| &e.snap_in == snap_in)
    }

    pub fn entries(&self) -> &[ReusedSnapIn] {
        &self.preserved
    }

    pub fn is_empty(&self) -> bool {
        self.preserved.is_empty()
    }

    pub fn reset(&mut self) {
        if !self.preserved.is_empty() {
            trace!("Reuse registry reset ({} entries)", self.preserved.len());
        }
        self.preserved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignments(reused: &[ReusedSnapIn]) -> Vec<(&str, &str)> {
        reused
            .iter()
            .map(|r| (r.snap_in.snap_in_id.as_str(), r.future_pane_id.as_str()))
            .collect()
    }

    #[test]
    fn test_exact_pane_match_wins() {
        let mut current = vec![
            CurrentSnapIn::new("selection", "snapin1"),
            CurrentSnapIn::new("primary", "snapin2"),
        ];
        let mut future = FuturePanes::new();
        future.push("snapin1", "selection");
        future.push("snapin2", "secondary");
        future.push("snapin2", "primary");

        let reused = evaluate_snapins_to_reuse("main", &mut current, &mut future);

        assert_eq!(
            assignments(&reused),
            [("snapin1", "selection"), ("snapin2", "primary")]
        );
        assert!(current.iter().all(|c| c.handled));
        assert!(!future.get("snapin2").unwrap()[0].occupied);
    }

    #[test]
    fn test_second_pass_takes_first_free_candidate() {
        let mut current = vec![
            CurrentSnapIn::new("primary", "tree"),
            CurrentSnapIn::new("secondary", "tree"),
        ];
        let mut future = FuturePanes::new();
        future.push("tree", "primary");
        future.push("tree", "tertiary");

        let reused = evaluate_snapins_to_reuse("main", &mut current, &mut future);

        assert_eq!(
            assignments(&reused),
            [("tree", "primary"), ("tree", "tertiary")]
        );
        assert_eq!(reused[1].current_pane_id, "secondary");
    }

    #[test]
    fn test_unmatched_snapin_not_reused() {
        let mut current = vec![CurrentSnapIn::new("primary", "props")];
        let mut future = FuturePanes::new();
        future.push("tree", "primary");

        let reused = evaluate_snapins_to_reuse("main", &mut current, &mut future);

        assert!(reused.is_empty());
        assert!(!current[0].handled);
    }

    #[test]
    fn test_reuse_count_is_bounded() {
        let shapes: [(&[(&str, &str)], &[(&str, &str)]); 4] = [
            (&[("a", "s1"), ("b", "s1"), ("c", "s1")], &[("s1", "a")]),
            (&[("a", "s1")], &[("s1", "a"), ("s1", "b"), ("s1", "c")]),
            (&[("a", "s1"), ("b", "s2")], &[("s2", "a"), ("s1", "a")]),
            (&[], &[("s1", "a")]),
        ];

        for (panes, candidates) in shapes {
            let mut current: Vec<_> = panes
                .iter()
                .map(|(pane, snap)| CurrentSnapIn::new(*pane, *snap))
                .collect();
            let mut future = FuturePanes::new();
            for (snap, pane) in candidates {
                future.push(snap, *pane);
            }
            let bound = current.len().min(future.slot_count());

            let reused = evaluate_snapins_to_reuse("f", &mut current, &mut future);

            assert!(reused.len() <= bound);
            let mut sources: Vec<_> = reused.iter().map(|r| &r.current_pane_id).collect();
            sources.dedup();
            assert_eq!(sources.len(), reused.len());
            let mut targets: Vec<_> = reused.iter().map(|r| &r.future_pane_id).collect();
            targets.sort();
            targets.dedup();
            assert_eq!(targets.len(), reused.len());
        }
    }

    #[test]
    fn test_registry_preserve_and_reset() {
        let mut registry = ReuseRegistry::new();
        let entry = ReusedSnapIn {
            snap_in: FullSnapInId::new("main", "tree"),
            current_pane_id: "selection".into(),
            future_pane_id: "primary".into(),
        };

        registry.preserve(vec![entry.clone()]).unwrap();
        assert_eq!(
            registry.should_reuse(&FullSnapInId::new("main", "tree")),
            Some(&entry)
        );
        assert!(registry.should_reuse(&FullSnapInId::new("main", "props")).is_none());

        let err = registry.preserve(vec![]).unwrap_err();
        assert!(matches!(err, Error::ReuseBookkeeping { .. }));

        registry.reset();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_rejects_duplicate_entries() {
        let mut registry = ReuseRegistry::new();
        let entry = ReusedSnapIn {
            snap_in: FullSnapInId::new("main", "tree"),
            current_pane_id: "selection".into(),
            future_pane_id: "primary".into(),
        };

        assert!(registry.preserve(vec![entry.clone(), entry]).is_err());
        assert!(registry.is_empty());
    }
}
