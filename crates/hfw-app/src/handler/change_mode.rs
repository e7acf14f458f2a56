//! Mode change as a one-shot task

use std::sync::{Mutex, PoisonError};

use hfw_core::prelude::*;

use super::{run_cancellable, CancelToken, NavigateHandler};
use crate::route::RouteState;
use crate::services::{MessageBroker, NavigationExtras, Router, SelectionMessage};
use crate::store::ShellStores;

/// What a mode change needs to know about its target.
#[derive(Debug, Clone)]
pub struct ChangeModeRequest {
    pub mode_id: String,
    pub frame_id: String,
    pub q_param_service: Option<String>,
    pub primary_channel: Option<String>,
    /// Route of the target frame, already filtered for the new mode
    pub route: RouteState,
    pub message: Option<SelectionMessage>,
}

pub struct ChangeModeHandler<'a, R, B> {
    router: &'a R,
    broker: &'a B,
    stores: &'a Mutex<ShellStores>,
    token: CancelToken,
}

impl<'a, R, B> ChangeModeHandler<'a, R, B>
where
    R: Router + Sync,
    B: MessageBroker + Sync,
{
    pub fn new(
        router: &'a R,
        broker: &'a B,
        stores: &'a Mutex<ShellStores>,
        token: CancelToken,
    ) -> Self {
        Self {
            router,
            broker,
            stores,
            token,
        }
    }

    /// Propagate the pending selection, navigate, then commit the mode.
    pub async fn run(self, request: ChangeModeRequest) -> Result<bool> {
        if let Some(message) = &request.message {
            if request.q_param_service.is_some() && request.primary_channel.is_some() {
                let sent = run_cancellable(
                    "mode selection message",
                    &self.token,
                    self.broker
                        .send_message_from_qparam_service(&request.frame_id, message),
                )
                .await;
                match sent {
                    Ok(true) => {}
                    Ok(false) => warn!(
                        "{}",
                        Error::broker(format!(
                            "selection message for {} declined",
                            request.frame_id
                        ))
                    ),
                    Err(e @ Error::Cancelled { .. }) => return Err(e),
                    Err(e) => {
                        warn!("Selection message for {} not delivered: {}", request.frame_id, e)
                    }
                }
            } else {
                debug!(
                    "Frame {} has no q-param service or primary channel, message dropped",
                    request.frame_id
                );
            }
        }

        let url = request
            .route
            .clone()
            .with_mode(Some(request.mode_id.clone()))
            .to_string();
        let navigated = NavigateHandler::new(self.router, self.token.clone())
            .run(&url, NavigationExtras::default())
            .await?;
        if !navigated {
            return Ok(false);
        }

        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        stores.active_mode_id = Some(request.mode_id.clone());
        stores.active_frame_id = Some(request.frame_id.clone());
        stores.update_displayability(Some(&request.mode_id));
        if let Some(frame) = stores.frame_mut(&request.frame_id) {
            frame.has_been_navigated_once = true;
        }
        info!("Mode {} active in frame {}", request.mode_id, request.frame_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::CancelSource;
    use crate::store::ViewportContext;
    use crate::test_utils::{
        sample_instance, BrokerReply, FakeBroker, FakeRouter, NavigationResult,
    };

    fn stores() -> Mutex<ShellStores> {
        Mutex::new(ShellStores::from_instance(
            &sample_instance(),
            ViewportContext::default(),
        ))
    }

    fn request(q_param: bool) -> ChangeModeRequest {
        ChangeModeRequest {
            mode_id: "edit".into(),
            frame_id: "main".into(),
            q_param_service: q_param.then(|| "sys".to_string()),
            primary_channel: q_param.then(|| "primary".to_string()),
            route: RouteState::new("main", "default", "2-pane"),
            message: Some(SelectionMessage::default()),
        }
    }

    #[tokio::test]
    async fn test_change_mode_sends_message_and_commits() {
        let router = FakeRouter::new("/main/default/2-pane");
        let broker = FakeBroker::new();
        let stores = stores();

        let ok = ChangeModeHandler::new(&router, &broker, &stores, CancelSource::new().token())
            .run(request(true))
            .await
            .unwrap();

        assert!(ok);
        assert_eq!(broker.sent().len(), 1);
        assert_eq!(router.navigations(), ["/main/default/2-pane?mode=edit"]);
        let stores = stores.lock().unwrap();
        assert_eq!(stores.active_mode_id.as_deref(), Some("edit"));
    }

    #[tokio::test]
    async fn test_message_requires_service_and_channel() {
        let router = FakeRouter::new("/");
        let broker = FakeBroker::new();
        let stores = stores();

        ChangeModeHandler::new(&router, &broker, &stores, CancelSource::new().token())
            .run(request(false))
            .await
            .unwrap();

        assert!(broker.sent().is_empty());
        assert_eq!(router.navigations().len(), 1);
    }

    #[tokio::test]
    async fn test_undelivered_message_still_changes_mode() {
        for reply in [BrokerReply::Decline, BrokerReply::Fail] {
            let router = FakeRouter::new("/");
            let broker = FakeBroker::new();
            broker.set_reply(reply);
            let stores = stores();

            let ok = ChangeModeHandler::new(&router, &broker, &stores, CancelSource::new().token())
                .run(request(true))
                .await
                .unwrap();

            assert!(ok, "{reply:?}");
            assert_eq!(broker.sent().len(), 1);
            assert_eq!(stores.lock().unwrap().active_mode_id.as_deref(), Some("edit"));
        }
    }

    #[tokio::test]
    async fn test_declined_navigation_keeps_mode() {
        let router = FakeRouter::new("/");
        router.set_result(NavigationResult::Reject);
        let broker = FakeBroker::new();
        let stores = stores();
        let before = stores.lock().unwrap().active_mode_id.clone();

        let ok = ChangeModeHandler::new(&router, &broker, &stores, CancelSource::new().token())
            .run(request(true))
            .await
            .unwrap();

        assert!(!ok);
        assert_eq!(stores.lock().unwrap().active_mode_id, before);
    }
}
