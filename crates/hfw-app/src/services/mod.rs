//! Collaborator interfaces consumed by the orchestrator
//!
//! The router, the settings store, the message broker and the q-param service
//! live outside this crate. Each is an async trait with a `Send` variant so
//! orchestrator futures can move between worker threads.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use hfw_core::prelude::*;
use hfw_core::FullSnapInId;

/// Options of a router navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationExtras {
    /// Navigate without touching the browser location
    pub skip_location_change: bool,
}

/// The application router.
#[trait_variant::make(Router: Send)]
pub trait LocalRouter {
    /// Navigate to a composite state URL. `Ok(false)` means the router
    /// declined (a guard rejected the change).
    async fn navigate_by_url(&self, url: &str, extras: NavigationExtras) -> Result<bool>;

    /// URL of the last completed navigation.
    fn current_url(&self) -> String;
}

/// Key/value store for persisted user settings.
#[trait_variant::make(SettingsService: Send)]
pub trait LocalSettingsService {
    async fn get_settings(&self, key: &str) -> Result<Option<String>>;

    async fn put_settings(&self, key: &str, value: &str) -> Result<bool>;

    async fn delete_settings(&self, key: &str) -> Result<bool>;
}

/// A cross-pane selection message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionMessage {
    /// Id of the q-param service that produced the message
    pub q_param_service: Option<String>,
    pub channel: Option<String>,
    pub types: Vec<String>,
    pub body: serde_json::Value,
}

/// Routes selection messages and context to snap-ins.
#[trait_variant::make(MessageBroker: Send)]
pub trait LocalMessageBroker {
    async fn send_message_from_qparam_service(
        &self,
        target_frame_id: &str,
        message: &SelectionMessage,
    ) -> Result<bool>;

    async fn deliver_context(
        &self,
        snap_in: &FullSnapInId,
        context: &serde_json::Value,
    ) -> Result<()>;
}

/// Resolves initial and deep-link selections.
#[trait_variant::make(QParamService: Send)]
pub trait LocalQParamService {
    async fn first_selection(
        &self,
        service_id: &str,
        frame_id: &str,
    ) -> Result<Option<SelectionMessage>>;
}

/// Why unsaved data is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedReason {
    Logout,
    RoleChange,
    Navigation,
}

/// Opt-in capability of snap-ins holding unsaved data.
///
/// Only snap-ins registered with the orchestrator are asked. The future
/// resolves `true` when it is fine to continue.
pub trait UnsavedDataCheck: Send + Sync {
    fn check_unsaved(&self, reason: UnsavedReason) -> BoxFuture<'_, bool>;
}

/// The collaborators the orchestrator runs against.
pub trait ShellBackend: Send + Sync + 'static {
    type Router: Router + Sync;
    type Settings: SettingsService + Sync;
    type Broker: MessageBroker + Sync;
    type QParams: QParamService + Sync;

    fn router(&self) -> &Self::Router;
    fn settings(&self) -> &Self::Settings;
    fn broker(&self) -> &Self::Broker;
    fn qparams(&self) -> &Self::QParams;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_message_camel_case() {
        let json = r#"{"qParamService": "sys", "channel": "primary", "types": ["t"], "body": {"id": 1}}"#;
        let message: SelectionMessage = serde_json::from_str(json).unwrap();

        assert_eq!(message.q_param_service.as_deref(), Some("sys"));
        assert_eq!(message.types, vec!["t"]);
        assert_eq!(message.body["id"], 1);
    }
}
