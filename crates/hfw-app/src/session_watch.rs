//! Cross-instance logout detection
//!
//! Another shell instance logging out removes the shared auth cookie. The
//! watch polls for the cookie and reports its disappearance once.

use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use hfw_core::prelude::*;

use crate::config::SessionSettings;
use crate::state::ShellEvent;

/// Reads the browser cookie jar.
#[cfg_attr(test, mockall::automock)]
pub trait CookieProbe: Send + Sync {
    fn has_auth_cookie(&self, name: &str) -> bool;
}

/// Handle of a running logout watch.
#[derive(Debug)]
pub struct LogoutWatch {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl LogoutWatch {
    /// Ask the task to stop at its next tick.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to end.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                error!("Logout watch task failed: {}", e);
            }
        }
    }
}

/// Spawn the cookie poll.
///
/// The task ends after emitting [`ShellEvent::LoggedOutElsewhere`], on
/// shutdown, or when every event receiver is gone.
pub fn spawn_logout_watch<P>(
    probe: P,
    settings: &SessionSettings,
    events: broadcast::Sender<ShellEvent>,
) -> LogoutWatch
where
    P: CookieProbe + 'static,
{
    let interval = Duration::from_millis(settings.cookie_poll_interval_ms.max(1));
    let cookie_name = settings.auth_cookie_name.clone();
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let mut seen_cookie = false;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if probe.has_auth_cookie(&cookie_name) {
                        seen_cookie = true;
                        continue;
                    }
                    if !seen_cookie {
                        continue;
                    }
                    info!("Auth cookie {} gone, logged out elsewhere", cookie_name);
                    if events.send(ShellEvent::LoggedOutElsewhere).is_err() {
                        debug!("No subscriber for logout event");
                    }
                    break;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        debug!("Logout watch stopped");
                        break;
                    }
                }
            }
        }
    });

    LogoutWatch {
        shutdown_tx,
        handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SessionSettings {
        SessionSettings {
            cookie_poll_interval_ms: 1000,
            auth_cookie_name: "hfw-auth".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_once_when_cookie_disappears() {
        let mut probe = MockCookieProbe::new();
        let mut polls = 0;
        probe
            .expect_has_auth_cookie()
            .withf(|name| name == "hfw-auth")
            .returning(move |_| {
                polls += 1;
                polls <= 2
            });
        let (tx, mut rx) = broadcast::channel(4);

        let watch = spawn_logout_watch(probe, &settings(), tx);

        assert_eq!(rx.recv().await.unwrap(), ShellEvent::LoggedOutElsewhere);
        watch.join().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_cookie_never_reports() {
        let mut probe = MockCookieProbe::new();
        probe.expect_has_auth_cookie().return_const(false);
        let (tx, mut rx) = broadcast::channel(4);

        let watch = spawn_logout_watch(probe, &settings(), tx);

        let waited = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(waited.is_err());

        watch.stop();
        watch.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_ends_task() {
        let mut probe = MockCookieProbe::new();
        probe.expect_has_auth_cookie().return_const(true);
        let (tx, _rx) = broadcast::channel(4);

        let watch = spawn_logout_watch(probe, &settings(), tx);
        watch.abort();
        watch.join().await;
    }
}
