//! Sequential unsaved-data checks

use std::sync::Arc;

use hfw_core::prelude::*;
use hfw_core::FullSnapInId;

use super::{run_cancellable, CancelToken};
use crate::services::{UnsavedDataCheck, UnsavedReason};

pub struct UnsavedDataHandler {
    checks: Vec<(FullSnapInId, Arc<dyn UnsavedDataCheck>)>,
    token: CancelToken,
}

impl UnsavedDataHandler {
    pub fn new(checks: Vec<(FullSnapInId, Arc<dyn UnsavedDataCheck>)>, token: CancelToken) -> Self {
        Self { checks, token }
    }

    /// Ask every snap-in in order. The first refusal ends the run.
    pub async fn run(self, reason: UnsavedReason) -> Result<bool> {
        let Self { checks, token } = self;
        run_cancellable("unsaved data check", &token, async move {
            for (snap_in, check) in &checks {
                if !check.check_unsaved(reason).await {
                    info!("Snap-in {} refused {:?}", snap_in, reason);
                    return Ok(false);
                }
                trace!("Snap-in {} accepted {:?}", snap_in, reason);
            }
            Ok(true)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::CancelSource;
    use crate::test_utils::StaticUnsavedCheck;

    fn checks(answers: &[bool]) -> (Vec<(FullSnapInId, Arc<dyn UnsavedDataCheck>)>, Vec<Arc<StaticUnsavedCheck>>) {
        let probes: Vec<_> = answers
            .iter()
            .map(|answer| Arc::new(StaticUnsavedCheck::new(*answer)))
            .collect();
        let checks = probes
            .iter()
            .enumerate()
            .map(|(i, probe)| {
                (
                    FullSnapInId::new("main", format!("snap{i}")),
                    probe.clone() as Arc<dyn UnsavedDataCheck>,
                )
            })
            .collect();
        (checks, probes)
    }

    #[tokio::test]
    async fn test_second_refusal_stops_before_third() {
        let (checks, probes) = checks(&[true, false, true]);

        let ok = UnsavedDataHandler::new(checks, CancelSource::new().token())
            .run(UnsavedReason::Logout)
            .await
            .unwrap();

        assert!(!ok);
        let calls: Vec<_> = probes.iter().map(|p| p.calls()).collect();
        assert_eq!(calls, [1, 1, 0]);
    }

    #[tokio::test]
    async fn test_all_accept() {
        let (checks, probes) = checks(&[true, true]);

        let ok = UnsavedDataHandler::new(checks, CancelSource::new().token())
            .run(UnsavedReason::RoleChange)
            .await
            .unwrap();

        assert!(ok);
        assert!(probes.iter().all(|p| p.calls() == 1));
    }

    #[tokio::test]
    async fn test_no_checks_accepts() {
        let ok = UnsavedDataHandler::new(Vec::new(), CancelSource::new().token())
            .run(UnsavedReason::Navigation)
            .await
            .unwrap();
        assert!(ok);
    }
}
