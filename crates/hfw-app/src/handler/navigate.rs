//! Router navigation as a one-shot task

use hfw_core::prelude::*;

use super::{run_cancellable, CancelToken};
use crate::services::{NavigationExtras, Router};

pub struct NavigateHandler<'a, R> {
    router: &'a R,
    token: CancelToken,
}

impl<'a, R: Router + Sync> NavigateHandler<'a, R> {
    pub fn new(router: &'a R, token: CancelToken) -> Self {
        Self { router, token }
    }

    /// Navigate and resolve with the router's verdict.
    pub async fn run(self, url: &str, extras: NavigationExtras) -> Result<bool> {
        debug!("Navigating to {} ({:?})", url, extras);
        let result = run_cancellable(
            "navigation",
            &self.token,
            self.router.navigate_by_url(url, extras),
        )
        .await;

        match &result {
            Ok(true) => trace!("Navigation to {} done", url),
            Ok(false) => debug!("Navigation to {} declined", url),
            Err(e) => error!("Navigation to {} failed: {}", url, e),
        }
        result
    }
}
