//! Test utilities for the orchestrator
//!
//! In-memory collaborators and a sample layout description. Exported with the
//! `test-helpers` feature for cross-crate integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;

use hfw_core::{Error, FullSnapInId, Result};
use hfw_hldl::{HfwInstance, ProfileDocument};

use crate::services::{
    MessageBroker, NavigationExtras, QParamService, Router, SelectionMessage, SettingsService,
    ShellBackend, UnsavedDataCheck, UnsavedReason,
};

/// Sample profile with three frames.
///
/// `main` has layouts `3-pane` (≥1200), `2-pane` (≥600, default), `1-pane`
/// and `2-pane-mobile`; `events` has a single layout; `toolbar` is docked.
pub const SAMPLE_PROFILE: &str = r#"{"hfwInstance": {
    "isBaseInstance": true,
    "frames": [
        {
            "id": "main",
            "isDefault": true,
            "qParamService": "sys",
            "primaryChannel": "primary",
            "panes": [
                {"id": "selection", "snapInReferences": [{"id": "tree", "snapInType": "tree-type"}]},
                {"id": "primary", "snapInReferences": [
                    {"id": "props", "snapInType": "props-type"},
                    {"id": "details", "snapInType": "details-type"},
                    {"id": "tree", "snapInType": "tree-type"}
                ]},
                {"id": "secondary", "startClosed": true, "modes": ["edit"], "snapInReferences": [
                    {"id": "graph", "snapInType": "graph-type"}
                ]}
            ],
            "layouts": [
                {"id": "3-pane", "minWidthFromMediaQuery": 1200, "onShrink": "2-pane",
                 "paneInstances": [{"id": "selection"}, {"id": "primary"}, {"id": "secondary"}]},
                {"id": "2-pane", "minWidthFromMediaQuery": 600, "isDefault": true,
                 "onShrink": "1-pane", "onGrowth": "3-pane",
                 "paneInstances": [{"id": "selection"}, {"id": "primary"}]},
                {"id": "1-pane", "onGrowth": "2-pane", "paneInstances": [{"id": "primary"}]},
                {"id": "2-pane-mobile", "paneInstances": [{"id": "selection"}, {"id": "primary"}]}
            ],
            "views": [
                {"id": "default", "isDefault": true},
                {"id": "list", "layouts": ["1-pane", "2-pane"]}
            ]
        },
        {
            "id": "events",
            "panes": [{"id": "primary", "snapInReferences": [{"id": "log", "snapInType": "log-type"}]}],
            "layouts": [{"id": "1-pane", "isDefault": true, "paneInstances": [{"id": "primary"}]}],
            "views": [{"id": "default"}]
        },
        {
            "id": "toolbar",
            "docked": "top",
            "panes": [{"id": "bar", "snapInReferences": [{"id": "menu", "snapInType": "menu-type"}]}],
            "layouts": [{"id": "bar", "paneInstances": [{"id": "bar"}]}],
            "views": [{"id": "default"}]
        }
    ],
    "modes": [
        {"id": "view", "isDefault": true},
        {"id": "edit", "frames": ["main"], "defaultFrame": "main"}
    ]
}}"#;

pub fn sample_instance() -> HfwInstance {
    ProfileDocument::parse(SAMPLE_PROFILE)
        .expect("SAMPLE_PROFILE is valid")
        .hfw_instance
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How [`FakeRouter`] answers navigations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationResult {
    Succeed,
    Reject,
    Fail,
}

/// Router recording every navigation.
#[derive(Debug)]
pub struct FakeRouter {
    current: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    extras: Mutex<Vec<NavigationExtras>>,
    result: Mutex<NavigationResult>,
    delay: Mutex<Option<Duration>>,
}

impl FakeRouter {
    pub fn new(initial_url: &str) -> Self {
        Self {
            current: Mutex::new(initial_url.to_string()),
            navigations: Mutex::new(Vec::new()),
            extras: Mutex::new(Vec::new()),
            result: Mutex::new(NavigationResult::Succeed),
            delay: Mutex::new(None),
        }
    }

    pub fn navigations(&self) -> Vec<String> {
        lock(&self.navigations).clone()
    }

    pub fn last_navigation(&self) -> Option<String> {
        lock(&self.navigations).last().cloned()
    }

    /// Extras of every navigation, in call order.
    pub fn extras(&self) -> Vec<NavigationExtras> {
        lock(&self.extras).clone()
    }

    pub fn set_result(&self, result: NavigationResult) {
        *lock(&self.result) = result;
    }

    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    /// Simulate a navigation the shell did not trigger.
    pub fn set_current(&self, url: &str) {
        *lock(&self.current) = url.to_string();
    }
}

impl Router for FakeRouter {
    async fn navigate_by_url(&self, url: &str, extras: NavigationExtras) -> Result<bool> {
        lock(&self.navigations).push(url.to_string());
        lock(&self.extras).push(extras);
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = *lock(&self.result);
        match result {
            NavigationResult::Succeed => {
                *lock(&self.current) = url.to_string();
                Ok(true)
            }
            NavigationResult::Reject => Ok(false),
            NavigationResult::Fail => Err(Error::navigation(url, "router failure")),
        }
    }

    fn current_url(&self) -> String {
        lock(&self.current).clone()
    }
}

/// Settings store backed by a map.
#[derive(Debug, Default)]
pub struct FakeSettings {
    values: Mutex<HashMap<String, String>>,
    stalled: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: &str) {
        lock(&self.values).insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    /// Reads of `key` never answer.
    pub fn stall(&self, key: &str) {
        lock(&self.stalled).insert(key.to_string());
    }

    /// Reads of `key` fail.
    pub fn fail(&self, key: &str) {
        lock(&self.failing).insert(key.to_string());
    }
}

impl SettingsService for FakeSettings {
    async fn get_settings(&self, key: &str) -> Result<Option<String>> {
        let stalled = lock(&self.stalled).contains(key);
        if stalled {
            std::future::pending::<()>().await;
        }
        if lock(&self.failing).contains(key) {
            return Err(Error::settings(format!("cannot read {key}")));
        }
        Ok(self.raw(key))
    }

    async fn put_settings(&self, key: &str, value: &str) -> Result<bool> {
        self.insert(key, value);
        Ok(true)
    }

    async fn delete_settings(&self, key: &str) -> Result<bool> {
        Ok(lock(&self.values).remove(key).is_some())
    }
}

/// How [`FakeBroker`] answers selection messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrokerReply {
    #[default]
    Deliver,
    Decline,
    Fail,
}

/// Message broker recording messages and contexts.
#[derive(Debug, Default)]
pub struct FakeBroker {
    sent: Mutex<Vec<(String, SelectionMessage)>>,
    contexts: Mutex<Vec<(FullSnapInId, serde_json::Value)>>,
    reply: Mutex<BrokerReply>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, SelectionMessage)> {
        lock(&self.sent).clone()
    }

    pub fn contexts(&self) -> Vec<(FullSnapInId, serde_json::Value)> {
        lock(&self.contexts).clone()
    }

    pub fn set_reply(&self, reply: BrokerReply) {
        *lock(&self.reply) = reply;
    }
}

impl MessageBroker for FakeBroker {
    async fn send_message_from_qparam_service(
        &self,
        target_frame_id: &str,
        message: &SelectionMessage,
    ) -> Result<bool> {
        lock(&self.sent).push((target_frame_id.to_string(), message.clone()));
        let reply = *lock(&self.reply);
        match reply {
            BrokerReply::Deliver => Ok(true),
            BrokerReply::Decline => Ok(false),
            BrokerReply::Fail => Err(Error::broker(format!("{target_frame_id} unreachable"))),
        }
    }

    async fn deliver_context(
        &self,
        snap_in: &FullSnapInId,
        context: &serde_json::Value,
    ) -> Result<()> {
        lock(&self.contexts).push((snap_in.clone(), context.clone()));
        Ok(())
    }
}

/// Q-param service with fixed selections per frame.
#[derive(Debug, Default)]
pub struct FakeQParams {
    selections: Mutex<HashMap<String, SelectionMessage>>,
    calls: AtomicUsize,
}

impl FakeQParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_selection(&self, frame_id: &str, message: SelectionMessage) {
        lock(&self.selections).insert(frame_id.to_string(), message);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QParamService for FakeQParams {
    async fn first_selection(
        &self,
        _service_id: &str,
        frame_id: &str,
    ) -> Result<Option<SelectionMessage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.selections).get(frame_id).cloned())
    }
}

/// Unsaved-data check with a fixed answer.
#[derive(Debug)]
pub struct StaticUnsavedCheck {
    answer: bool,
    calls: AtomicUsize,
}

impl StaticUnsavedCheck {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UnsavedDataCheck for StaticUnsavedCheck {
    fn check_unsaved(&self, _reason: UnsavedReason) -> BoxFuture<'_, bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { self.answer })
    }
}

/// All fakes bundled as a backend.
#[derive(Debug)]
pub struct TestBackend {
    pub router: FakeRouter,
    pub settings: FakeSettings,
    pub broker: FakeBroker,
    pub qparams: FakeQParams,
}

impl TestBackend {
    pub fn new() -> Self {
        Self {
            router: FakeRouter::new("/"),
            settings: FakeSettings::new(),
            broker: FakeBroker::new(),
            qparams: FakeQParams::new(),
        }
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellBackend for TestBackend {
    type Router = FakeRouter;
    type Settings = FakeSettings;
    type Broker = FakeBroker;
    type QParams = FakeQParams;

    fn router(&self) -> &FakeRouter {
        &self.router
    }

    fn settings(&self) -> &FakeSettings {
        &self.settings
    }

    fn broker(&self) -> &FakeBroker {
        &self.broker
    }

    fn qparams(&self) -> &FakeQParams {
        &self.qparams
    }
}
