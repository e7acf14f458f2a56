//! One-shot async handlers
//!
//! Every handler is consumed by its `run` method, performs its side effect
//! exactly once and resolves with one value. All of them race their work
//! against a [`CancelToken`]; cancelling the owning [`CancelSource`] makes
//! pending handlers resolve with [`Error::Cancelled`].

pub mod change_mode;
pub mod first_selection;
pub mod navigate;
pub mod unsaved_data;
pub mod user_settings;

use std::future::Future;

use tokio::sync::watch;

use hfw_core::prelude::*;

pub use change_mode::{ChangeModeHandler, ChangeModeRequest};
pub use first_selection::AutomaticFirstSelectionHandler;
pub use navigate::NavigateHandler;
pub use unsaved_data::UnsavedDataHandler;
pub use user_settings::{
    FrameSettingsKeys, FullScreenSettings, UserFramePreferences, UserSettingsHandler,
};

/// Owner side of a cancellation signal.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Never resolves if the source is dropped
    /// without cancelling.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Run `future` unless `token` fires first.
pub async fn run_cancellable<T, F>(operation: &str, token: &CancelToken, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let mut token = token.clone();
    if token.is_cancelled() {
        return Err(Error::cancelled(operation));
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!("{} cancelled", operation);
            Err(Error::cancelled(operation))
        }
        result = future => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_cancellable_passes_result() {
        let source = CancelSource::new();
        let result = run_cancellable("op", &source.token(), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let source = CancelSource::new();
        source.cancel();

        let result: Result<()> = run_cancellable("op", &source.token(), async { Ok(()) }).await;

        assert!(matches!(result, Err(Error::Cancelled { .. })));
        assert!(source.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_pending_work() {
        let source = CancelSource::new();
        let token = source.token();

        let task = tokio::spawn(async move {
            run_cancellable("slow", &token, async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        source.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled { operation }) if operation == "slow"));
    }
}
