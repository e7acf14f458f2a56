//! The application status machine
//!
//! All transitions go through [`StatusMachine::transition`], which checks and
//! sets the status in one step under the channel lock. The returned
//! [`StatusGuard`] settles the status when dropped, so every exit path of an
//! operation (success, refusal, error, cancellation) leaves the machine
//! consistent.
//!
//! Some operations may start while another one is in flight (a mode change
//! during a frame switch). Live guards are kept in entry order. A guard that
//! settles while a later guard is still live hands its settle value to that
//! guard instead of writing it, so the status always reflects the newest
//! live operation and lands on the oldest one's value once all have settled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

use hfw_core::prelude::*;
use hfw_core::AppStatus;

#[derive(Debug, Clone, Copy)]
struct LiveGuard {
    id: u64,
    restore: AppStatus,
}

#[derive(Debug)]
pub struct StatusMachine {
    tx: watch::Sender<AppStatus>,
    live: Mutex<Vec<LiveGuard>>,
    next_id: AtomicU64,
}

impl StatusMachine {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AppStatus::Initializing);
        Self {
            tx,
            live: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> AppStatus {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppStatus> {
        self.tx.subscribe()
    }

    /// Apply `step` to the current status.
    ///
    /// `step` returns the next status, or `None` to refuse. Returns a guard
    /// restoring the status seen before the step.
    pub fn transition(
        &self,
        step: impl FnOnce(AppStatus) -> Option<AppStatus>,
    ) -> Option<StatusGuard<'_>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut previous = None;
        self.tx.send_if_modified(|status| {
            let Some(next) = step(*status) else {
                return false;
            };
            previous = Some(*status);
            self.lock_live().push(LiveGuard {
                id,
                restore: *status,
            });
            if *status == next {
                return false;
            }
            trace!("Status {} → {}", status, next);
            *status = next;
            true
        });

        match previous {
            Some(previous) => Some(StatusGuard {
                machine: self,
                id,
                previous,
                armed: true,
            }),
            None => {
                debug!("Status {} refused transition", self.current());
                None
            }
        }
    }

    /// Move from `from` to `to`, or refuse.
    pub fn enter(&self, from: AppStatus, to: AppStatus) -> Option<StatusGuard<'_>> {
        self.transition(|current| (current == from).then_some(to))
    }

    fn lock_live(&self) -> std::sync::MutexGuard<'_, Vec<LiveGuard>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Retire guard `id`, settling on `commit` or on its restore value.
    fn settle(&self, id: u64, commit: Option<AppStatus>) {
        self.tx.send_if_modified(|status| {
            let mut live = self.lock_live();
            let Some(index) = live.iter().position(|g| g.id == id) else {
                return false;
            };
            let retired = live.remove(index);
            let value = commit.unwrap_or(retired.restore);

            // A later operation is still running; it settles for both
            if let Some(next) = live.get_mut(index) {
                next.restore = value;
                return false;
            }

            if *status == value {
                return false;
            }
            trace!("Status {} → {}", status, value);
            *status = value;
            true
        });
    }
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Settles the status on drop unless committed.
#[must_use = "dropping the guard restores the previous status immediately"]
#[derive(Debug)]
pub struct StatusGuard<'a> {
    machine: &'a StatusMachine,
    id: u64,
    previous: AppStatus,
    armed: bool,
}

impl StatusGuard<'_> {
    /// Status in effect before the transition.
    pub fn previous(&self) -> AppStatus {
        self.previous
    }

    /// Settle on `status` instead of the previous one.
    pub fn commit(mut self, status: AppStatus) {
        self.armed = false;
        self.machine.settle(self.id, Some(status));
    }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.machine.settle(self.id, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_restores_previous() {
        let machine = StatusMachine::new();
        machine.enter(AppStatus::Initializing, AppStatus::Running).unwrap().commit(AppStatus::Running);

        {
            let guard = machine
                .enter(AppStatus::Running, AppStatus::SwitchingFrame)
                .unwrap();
            assert_eq!(guard.previous(), AppStatus::Running);
            assert_eq!(machine.current(), AppStatus::SwitchingFrame);
        }

        assert_eq!(machine.current(), AppStatus::Running);
    }

    #[test]
    fn test_refused_transition_keeps_status() {
        let machine = StatusMachine::new();
        assert!(machine.enter(AppStatus::Running, AppStatus::ProcessingMessage).is_none());
        assert_eq!(machine.current(), AppStatus::Initializing);
    }

    #[test]
    fn test_nested_guard_is_refused() {
        let machine = StatusMachine::new();
        machine.enter(AppStatus::Initializing, AppStatus::Running).unwrap().commit(AppStatus::Running);

        let _outer = machine
            .enter(AppStatus::Running, AppStatus::ProcessingMessage)
            .unwrap();
        assert!(machine.enter(AppStatus::Running, AppStatus::SwitchingFrame).is_none());
    }

    #[test]
    fn test_outer_guard_settling_first_hands_over() {
        let machine = StatusMachine::new();
        machine.enter(AppStatus::Initializing, AppStatus::Running).unwrap().commit(AppStatus::Running);

        let switching = machine
            .enter(AppStatus::Running, AppStatus::SwitchingFrame)
            .unwrap();
        let processing = machine
            .enter(AppStatus::SwitchingFrame, AppStatus::ProcessingMessage)
            .unwrap();

        drop(switching);
        assert_eq!(machine.current(), AppStatus::ProcessingMessage);
        drop(processing);
        assert_eq!(machine.current(), AppStatus::Running);
    }

    #[test]
    fn test_inner_guard_settling_first_restores_outer() {
        let machine = StatusMachine::new();
        machine.enter(AppStatus::Initializing, AppStatus::Running).unwrap().commit(AppStatus::Running);

        let switching = machine
            .enter(AppStatus::Running, AppStatus::SwitchingFrame)
            .unwrap();
        let same = machine
            .transition(|s| (s == AppStatus::SwitchingFrame).then_some(s))
            .unwrap();

        drop(same);
        assert_eq!(machine.current(), AppStatus::SwitchingFrame);
        drop(switching);
        assert_eq!(machine.current(), AppStatus::Running);
    }

    #[test]
    fn test_commit_while_later_guard_live() {
        let machine = StatusMachine::new();

        let starting = machine
            .transition(|s| (s == AppStatus::Initializing).then_some(s))
            .unwrap();
        let nested = machine
            .transition(|s| (s == AppStatus::Initializing).then_some(AppStatus::ProcessingMessage))
            .unwrap();

        starting.commit(AppStatus::Running);
        assert_eq!(machine.current(), AppStatus::ProcessingMessage);
        drop(nested);
        assert_eq!(machine.current(), AppStatus::Running);
    }

    #[test]
    fn test_same_status_transition_guards_without_emitting() {
        let machine = StatusMachine::new();
        let mut rx = machine.subscribe();
        rx.borrow_and_update();

        let guard = machine
            .transition(|s| (s == AppStatus::Initializing).then_some(s))
            .unwrap();
        assert!(!rx.has_changed().unwrap());

        guard.commit(AppStatus::Running);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AppStatus::Running);
    }
}
