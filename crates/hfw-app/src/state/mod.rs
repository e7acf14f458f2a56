//! State orchestration
//!
//! [`StateService`] is the single authority over the [`AppStatus`] and over
//! the active frame, view, layout and pane selections. Every operation that
//! may navigate follows the same discipline:
//!
//! 1. check and set the status in one synchronous step ([`StatusMachine`]),
//! 2. compute the target under the store lock,
//! 3. release the lock and await the one-shot handler,
//! 4. commit the result under the lock again.
//!
//! Locks are never held across an await point.
//!
//! Configuration problems (unknown frame, unavailable layout, ...) are logged
//! as warnings and resolve to `Ok(false)`. Navigation errors propagate.

mod events;
mod status;


use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use hfw_core::prelude::*;
use hfw_core::{AppStatus, FullPaneId, FullSnapInId, ScreenSize};
use hfw_hldl::{FrameDescription, HfwInstance, ModeDescription};

use crate::config::ShellSettings;
use crate::handler::{
    run_cancellable, AutomaticFirstSelectionHandler, CancelSource, ChangeModeHandler,
    ChangeModeRequest, FrameSettingsKeys, FullScreenSettings, NavigateHandler,
    UnsavedDataHandler, UserFramePreferences, UserSettingsHandler,
};
use crate::layout::{
    available_layouts, calculate_next_favorite_layout_per_range, check_frame_needs_new_layout,
    get_most_fitting_layout_id, most_fitting_available, LayoutContext,
};
use crate::mobile::MobileNavigation;
use crate::reuse::{collect_reuse_inputs, evaluate_snapins_to_reuse, ReuseRegistry, ReusedSnapIn};
use crate::route::RouteState;
use crate::services::{
    MessageBroker, NavigationExtras, Router, SelectionMessage, ShellBackend, UnsavedDataCheck,
    UnsavedReason,
};
use crate::session_watch::{spawn_logout_watch, CookieProbe, LogoutWatch};
use crate::store::{
    FavoriteLayoutsPerRange, Frame, LayoutInstance, ShellStores, ViewportContext,
};

pub use events::ShellEvent;
pub use status::{StatusGuard, StatusMachine};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A tab visibility change for [`StateService::display_snap_in_tab`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapInTabRequest {
    pub snap_in: FullSnapInId,
    pub visible: bool,
    /// Select the tab in every pane hosting it
    pub focus: bool,
}

type UnsavedChecks = Vec<(FullSnapInId, Arc<dyn UnsavedDataCheck>)>;

pub struct StateService<K: ShellBackend> {
    backend: K,
    settings: ShellSettings,
    instance: HfwInstance,
    stores: Mutex<ShellStores>,
    status: StatusMachine,
    reuse: Mutex<ReuseRegistry>,
    unsaved_checks: Mutex<UnsavedChecks>,
    events: broadcast::Sender<ShellEvent>,
    data_ready: watch::Sender<bool>,
    mobile: MobileNavigation,
    cancel: CancelSource,
}

impl<K: ShellBackend> StateService<K> {
    pub fn new(
        backend: K,
        settings: ShellSettings,
        instance: HfwInstance,
        viewport: ViewportContext,
    ) -> Self {
        let stores = ShellStores::from_instance(&instance, viewport);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (data_ready, _) = watch::channel(false);
        let mobile = MobileNavigation::new();
        mobile.set_mobile_only_visibility(viewport.mobile);

        Self {
            backend,
            settings,
            instance,
            stores: Mutex::new(stores),
            status: StatusMachine::new(),
            reuse: Mutex::new(ReuseRegistry::new()),
            unsaved_checks: Mutex::new(Vec::new()),
            events,
            data_ready,
            mobile,
            cancel: CancelSource::new(),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────

    pub fn backend(&self) -> &K {
        &self.backend
    }

    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    /// Subscribe to shell events.
    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> watch::Receiver<AppStatus> {
        self.status.subscribe()
    }

    pub fn current_status(&self) -> AppStatus {
        self.status.current()
    }

    /// Turns `true` once the first navigation completed.
    pub fn data_structure_ready(&self) -> watch::Receiver<bool> {
        self.data_ready.subscribe()
    }

    pub fn mobile(&self) -> &MobileNavigation {
        &self.mobile
    }

    /// Copy of the runtime stores.
    pub fn snapshot(&self) -> ShellStores {
        self.lock_stores().clone()
    }

    /// Whether the router should keep the live instance of a snap-in.
    pub fn should_reuse(&self, snap_in: &FullSnapInId) -> Option<ReusedSnapIn> {
        self.lock_reuse().should_reuse(snap_in).cloned()
    }

    /// Start polling for a logout performed by another instance.
    pub fn watch_logout<P: CookieProbe + 'static>(&self, probe: P) -> LogoutWatch {
        spawn_logout_watch(probe, &self.settings.session, self.events.clone())
    }

    // ─────────────────────────────────────────────────────────
    // Start-up
    // ─────────────────────────────────────────────────────────

    /// Perform the first navigation, to `deep_link` when it names a usable
    /// frame, otherwise to the default frame.
    ///
    /// On success the status becomes `Running`, the data structure is ready,
    /// and the persisted user preferences are loaded and applied.
    pub async fn start(&self, deep_link: Option<&str>) -> Result<bool> {
        let Some(guard) = self
            .status
            .transition(|s| (s == AppStatus::Initializing).then_some(s))
        else {
            warn!("Shell already started ({})", self.current_status());
            return Ok(false);
        };

        let deep = deep_link.and_then(|url| {
            let route = RouteState::parse(url);
            if route.is_none() {
                warn!("Ignoring malformed deep link {}", url);
            }
            route
        });

        let prepared = {
            let mut stores = self.lock_stores();
            self.prepare_start(&mut stores, deep.as_ref())
        };
        let (frame_id, route) = match prepared {
            Ok(prepared) => prepared,
            Err(e) if e.is_configuration() => {
                warn!("Cannot start: {}", e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if !self.navigate(&route.to_string()).await? {
            warn!("Initial navigation to {} declined", route);
            return Ok(false);
        }

        if let Some(frame) = self.lock_stores().frame_mut(&frame_id) {
            frame.has_been_navigated_once = true;
        }
        guard.commit(AppStatus::Running);
        self.data_ready.send_replace(true);
        self.emit_layout_selected(&frame_id);
        info!("Shell running, frame {}", frame_id);

        self.load_user_preferences(deep.is_some()).await;

        if let Err(e) = self.run_first_selection(&frame_id).await {
            log_failure(&format!("First selection for {frame_id}"), &e);
        }
        Ok(true)
    }

    fn prepare_start(
        &self,
        stores: &mut ShellStores,
        deep: Option<&RouteState>,
    ) -> Result<(String, RouteState)> {
        let default_frame = stores.active_frame_id.clone();
        let frame_id = match deep {
            Some(route) if stores.frame(&route.frame_id).is_some_and(|f| !f.is_docked()) => {
                route.frame_id.clone()
            }
            Some(route) => {
                warn!("Deep link frame {} unknown or docked", route.frame_id);
                default_frame.ok_or_else(|| Error::config("no default frame"))?
            }
            None => default_frame.ok_or_else(|| Error::config("no default frame"))?,
        };

        if let Some(mode) = deep.and_then(|r| r.mode.as_deref()) {
            if self.instance.mode(mode).is_some() {
                stores.active_mode_id = Some(mode.to_string());
            } else {
                warn!("{}", Error::mode_not_found(mode));
            }
        }

        let ctx = self.layout_context(stores.viewport);
        let deep_here = deep.filter(|r| r.frame_id == frame_id);
        let frame = stores
            .frame_mut(&frame_id)
            .ok_or_else(|| Error::frame_not_found(&frame_id))?;

        if let Some(view) = deep_here.map(|r| r.view_id.as_str()) {
            if frame.view(view).is_some() {
                frame.selected_view_id = Some(view.to_string());
            }
        }
        let available = available_layouts(frame, frame.selected_view_id.as_deref(), &ctx);
        frame.available_layouts = available;

        let deep_layout = deep_here
            .map(|r| r.layout_id.clone())
            .filter(|id| frame.is_layout_available(id));
        frame.selected_layout_id = deep_layout.or_else(|| most_fitting_available(frame));
        if frame.selected_layout_id.is_none() {
            return Err(Error::layout_not_available(&frame_id, "<any>"));
        }

        if let Some(route) = deep_here {
            for (pane_id, snap_in_id) in &route.outlets {
                if let Some(pane) = stores.pane_mut(&FullPaneId::new(&frame_id, pane_id)) {
                    if pane.hosts(snap_in_id) {
                        pane.selected_snap_in_id = Some(snap_in_id.clone());
                        pane.visible = true;
                    }
                }
            }
        }

        stores.active_frame_id = Some(frame_id.clone());
        let mode = stores.active_mode_id.clone();
        stores.update_displayability(mode.as_deref());

        let route = frame_route(stores, &frame_id, mode.as_deref())
            .ok_or_else(|| Error::frame_not_found(&frame_id))?;
        Ok((frame_id, route))
    }

    async fn load_user_preferences(&self, keep_active_selection: bool) {
        let frames: Vec<FrameSettingsKeys> = self
            .lock_stores()
            .frames()
            .iter()
            .map(|f| FrameSettingsKeys {
                frame_id: f.id.clone(),
                view_ids: f.views.iter().map(|v| v.id.clone()).collect(),
            })
            .collect();

        let outcome = self.user_settings().load(&frames).await;
        if !outcome.missing().is_empty() {
            debug!("Applying partial user settings");
        }
        let preferences = match outcome.into_result() {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!("User settings unavailable: {}", e);
                return;
            }
        };

        let relayout = {
            let mut stores = self.lock_stores();
            self.apply_preferences(&mut stores, &preferences, keep_active_selection)
        };
        if relayout {
            let extras = NavigationExtras {
                skip_location_change: true,
            };
            if let Err(e) = self.renavigate(extras).await {
                log_failure("Restoring user layout", &e);
            }
        }
    }

    /// Returns whether the active frame's selection changed.
    fn apply_preferences(
        &self,
        stores: &mut ShellStores,
        preferences: &UserFramePreferences,
        keep_active_selection: bool,
    ) -> bool {
        let size = self.screen_size(stores.viewport);
        let ctx = self.layout_context(stores.viewport);
        let active = stores.active_frame_id.clone();
        let frame_ids: Vec<String> = stores.frames().iter().map(|f| f.id.clone()).collect();
        let mut changed = false;

        for frame_id in frame_ids {
            let is_active = active.as_deref() == Some(frame_id.as_str());

            if let Some(frame) = stores.frame_mut(&frame_id) {
                let view_ids: Vec<String> = frame.views.iter().map(|v| v.id.clone()).collect();
                for view_id in &view_ids {
                    if let Some(favorites) = preferences.layout_for(&frame_id, view_id) {
                        frame
                            .favorite_layouts
                            .insert(view_id.clone(), favorites.clone());
                    }
                }
                if let Some(splitters) = preferences.splitter_configuration.get(&frame_id) {
                    frame.splitter_configuration = Some(splitters.clone());
                }

                if !(is_active && keep_active_selection) {
                    let before = (
                        frame.selected_view_id.clone(),
                        frame.selected_layout_id.clone(),
                    );
                    if let Some(view_id) = preferences.selected_views.get(&frame_id) {
                        if frame.view(view_id).is_some() {
                            frame.selected_view_id = Some(view_id.clone());
                        }
                    }
                    select_preferred_layout(frame, size, &ctx);
                    let after = (
                        frame.selected_view_id.clone(),
                        frame.selected_layout_id.clone(),
                    );
                    changed |= is_active && before != after;
                }
            }

            if let Some(state) = preferences.full_screen_states.get(&frame_id) {
                if let Some(pane) = stores.pane_mut(&FullPaneId::new(&frame_id, &state.pane_id)) {
                    pane.full_screen = state.full_screen;
                }
            }
        }
        changed
    }

    // ─────────────────────────────────────────────────────────
    // Frame switching
    // ─────────────────────────────────────────────────────────

    /// Switch to another undocked frame, optionally carrying a selection.
    ///
    /// Targeting the active frame only spreads the message and re-navigates
    /// to the current state.
    pub async fn switch_to_next_frame(
        &self,
        frame_id: &str,
        message: Option<SelectionMessage>,
    ) -> Result<bool> {
        let status = self.current_status();
        if status != AppStatus::Running {
            debug!("Frame switch to {} refused while {}", frame_id, status);
            return Ok(false);
        }

        let same_frame = {
            let stores = self.lock_stores();
            match stores.frame(frame_id) {
                None => {
                    warn!("{}", Error::frame_not_found(frame_id));
                    return Ok(false);
                }
                Some(frame) if frame.is_docked() => {
                    debug!("Frame {} is docked", frame_id);
                    return Ok(false);
                }
                Some(_) => stores.active_frame_id.as_deref() == Some(frame_id),
            }
        };

        if same_frame {
            if let Some(message) = &message {
                self.spread_message(frame_id, message).await;
            }
            return self.navigate_to_current_state().await;
        }

        self.switch_frame(frame_id, message, None).await
    }

    /// Full frame switch under `SwitchingFrame`, to the frame's current
    /// selection or to `target` (view, layout).
    async fn switch_frame(
        &self,
        frame_id: &str,
        message: Option<SelectionMessage>,
        target: Option<(&str, &str)>,
    ) -> Result<bool> {
        let Some(guard) = self
            .status
            .enter(AppStatus::Running, AppStatus::SwitchingFrame)
        else {
            debug!("Frame switch to {} refused while {}", frame_id, self.current_status());
            return Ok(false);
        };
        let had_message = message.is_some();
        let switched = self.perform_frame_switch(frame_id, message, target).await;
        drop(guard);

        let (navigated, first_visit) = switched?;
        if navigated && first_visit && !had_message {
            if let Err(e) = self.run_first_selection(frame_id).await {
                log_failure(&format!("First selection for {frame_id}"), &e);
            }
        }
        Ok(navigated)
    }

    /// Returns `(navigated, first visit)`.
    ///
    /// Live snap-ins of the previous frame are never carried over.
    async fn perform_frame_switch(
        &self,
        frame_id: &str,
        message: Option<SelectionMessage>,
        target: Option<(&str, &str)>,
    ) -> Result<(bool, bool)> {
        let route = {
            let mut stores = self.lock_stores();
            let ctx = self.layout_context(stores.viewport);
            match stores.frame_mut(frame_id) {
                Some(frame) if !frame.is_docked() => {
                    if target.is_none() {
                        ensure_layout(frame, &ctx);
                    }
                }
                _ => {
                    warn!("Cannot switch to frame {}", frame_id);
                    return Ok((false, false));
                }
            }
            let mode = stores.active_mode_id.clone();
            match target {
                Some((view_id, layout_id)) => Some(layout_route(
                    &stores,
                    frame_id,
                    view_id,
                    layout_id,
                    mode.as_deref(),
                    true,
                )),
                None => frame_route(&stores, frame_id, mode.as_deref()),
            }
        };
        let Some(route) = route else {
            warn!("Frame {} has no layout for the current viewport", frame_id);
            return Ok((false, false));
        };

        self.lock_reuse().reset();
        if let Some(message) = &message {
            self.spread_message(frame_id, message).await;
        }

        if !self.navigate(&route.to_string()).await? {
            return Ok((false, false));
        }

        let (first_visit, favorites) = {
            let mut stores = self.lock_stores();
            stores.active_frame_id = Some(frame_id.to_string());
            let mode = stores.active_mode_id.clone();
            stores.update_displayability(mode.as_deref());
            let favorites = match target {
                Some((view_id, layout_id)) => {
                    Some(self.commit_layout(&mut stores, frame_id, view_id, layout_id)?)
                }
                None => None,
            };
            let first_visit = stores.frame_mut(frame_id).is_some_and(|frame| {
                let first = !frame.has_been_navigated_once;
                frame.has_been_navigated_once = true;
                first
            });
            (first_visit, favorites)
        };
        info!("Switched to frame {}", frame_id);
        if let (Some((view_id, _)), Some(favorites)) = (target, favorites) {
            self.persist_layout(frame_id, view_id, &favorites).await;
        }
        self.emit_layout_selected(frame_id);
        Ok((true, first_visit))
    }

    // ─────────────────────────────────────────────────────────
    // Layout and view navigation
    // ─────────────────────────────────────────────────────────

    /// Navigate a frame to a view and layout.
    ///
    /// Within the active frame, snap-ins that fit the new layout keep their
    /// live instances. Any other frame is reached through a full frame switch,
    /// which needs `Running`. Returns `Ok(false)` when the layout is not
    /// available for the viewport.
    pub async fn navigate_to_frame_view_layout(
        &self,
        frame_id: &str,
        view_id: &str,
        layout_id: &str,
    ) -> Result<bool> {
        let allowed = |s: AppStatus| {
            matches!(
                s,
                AppStatus::Running | AppStatus::SwitchingFrame | AppStatus::ProcessingNewSelection
            )
        };
        let status = self.current_status();
        if !allowed(status) {
            debug!("Layout navigation refused while {}", status);
            return Ok(false);
        }

        let is_active = {
            let stores = self.lock_stores();
            let ctx = self.layout_context(stores.viewport);
            let Some(frame) = stores.frame(frame_id) else {
                warn!("{}", Error::frame_not_found(frame_id));
                return Ok(false);
            };
            if frame.is_docked() {
                debug!("Frame {} is docked", frame_id);
                return Ok(false);
            }
            if frame.view(view_id).is_none() {
                warn!("{}", Error::view_not_found(frame_id, view_id));
                return Ok(false);
            }
            if !available_layouts(frame, Some(view_id), &ctx)
                .iter()
                .any(|l| l == layout_id)
            {
                warn!("{}", Error::layout_not_available(frame_id, layout_id));
                return Ok(false);
            }
            stores.active_frame_id.as_deref() == Some(frame_id)
        };

        if !is_active {
            return self
                .switch_frame(frame_id, None, Some((view_id, layout_id)))
                .await;
        }

        let Some(guard) = self
            .status
            .transition(|s| allowed(s).then_some(AppStatus::ProcessingMessage))
        else {
            return Ok(false);
        };
        let result = self.perform_layout_change(frame_id, view_id, layout_id).await;
        drop(guard);
        result
    }

    async fn perform_layout_change(
        &self,
        frame_id: &str,
        view_id: &str,
        layout_id: &str,
    ) -> Result<bool> {
        let (route, reused) = {
            let mut stores = self.lock_stores();
            stores.reset_full_screen(frame_id);

            let from_layout = stores
                .frame(frame_id)
                .and_then(|f| f.selected_layout_id.clone());
            let (mut current, mut future) =
                collect_reuse_inputs(&stores, frame_id, from_layout.as_deref(), layout_id);
            let reused = evaluate_snapins_to_reuse(frame_id, &mut current, &mut future);
            for entry in &reused {
                if let Some(snap_in) = stores.snap_in_mut(&entry.snap_in) {
                    snap_in.future_pane_id = Some(entry.future_pane_id.clone());
                }
            }

            let mode = stores.active_mode_id.clone();
            let mut route =
                layout_route(&stores, frame_id, view_id, layout_id, mode.as_deref(), true);
            for entry in &reused {
                route = route.with_outlet(&entry.future_pane_id, &entry.snap_in.snap_in_id);
            }
            (route, reused)
        };

        let preserved = self.lock_reuse().preserve(reused.clone());
        if let Err(e) = preserved {
            error!("Reuse bookkeeping for frame {} failed: {}", frame_id, e);
            self.abandon_reuse();
            return Err(e);
        }

        match self.navigate(&route.to_string()).await {
            Ok(true) => self.lock_reuse().reset(),
            Ok(false) => {
                self.abandon_reuse();
                return Ok(false);
            }
            Err(e) => {
                self.abandon_reuse();
                return Err(e);
            }
        }

        let favorites = {
            let mut stores = self.lock_stores();
            for entry in &reused {
                if let Some(pane) =
                    stores.pane_mut(&FullPaneId::new(frame_id, &entry.future_pane_id))
                {
                    pane.selected_snap_in_id = Some(entry.snap_in.snap_in_id.clone());
                }
            }
            stores.clear_future_pane_hints();
            self.commit_layout(&mut stores, frame_id, view_id, layout_id)?
        };
        self.persist_layout(frame_id, view_id, &favorites).await;

        self.emit(ShellEvent::LayoutSelected {
            frame_id: frame_id.to_string(),
            view_id: view_id.to_string(),
            layout_id: layout_id.to_string(),
        });
        Ok(true)
    }

    /// Record a navigated view and layout: reopen the layout's panes, select
    /// them and remember the layout as favorite. Returns the new favorites.
    fn commit_layout(
        &self,
        stores: &mut ShellStores,
        frame_id: &str,
        view_id: &str,
        layout_id: &str,
    ) -> Result<FavoriteLayoutsPerRange> {
        let layout_panes = stores
            .frame(frame_id)
            .map(|f| f.panes_in_layout(layout_id).to_vec())
            .unwrap_or_default();
        for pane_id in &layout_panes {
            if let Some(pane) = stores.pane_mut(&FullPaneId::new(frame_id, pane_id)) {
                if !pane.start_closed && !pane.visible {
                    pane.visible = true;
                    debug!("Reopened pane {}", pane.id);
                }
            }
        }

        let ctx = self.layout_context(stores.viewport);
        let Some(frame) = stores.frame_mut(frame_id) else {
            return Err(Error::frame_not_found(frame_id));
        };
        let available = available_layouts(frame, Some(view_id), &ctx);
        frame.available_layouts = available;
        frame.selected_view_id = Some(view_id.to_string());
        frame.selected_layout_id = Some(layout_id.to_string());

        let favorites = calculate_next_favorite_layout_per_range(
            frame,
            view_id,
            layout_id,
            &self.settings.layout.mobile_layout_id,
        );
        frame
            .favorite_layouts
            .insert(view_id.to_string(), favorites.clone());
        Ok(favorites)
    }

    async fn persist_layout(
        &self,
        frame_id: &str,
        view_id: &str,
        favorites: &FavoriteLayoutsPerRange,
    ) {
        let user_settings = self.user_settings();
        if let Err(e) = user_settings.save_layout(frame_id, view_id, favorites).await {
            warn!("Saving layout of {} failed: {}", frame_id, e);
        }
        if let Err(e) = user_settings.save_selected_view(frame_id, view_id).await {
            warn!("Saving selected view of {} failed: {}", frame_id, e);
        }
    }

    fn abandon_reuse(&self) {
        self.lock_reuse().reset();
        self.lock_stores().clear_future_pane_hints();
    }

    /// Navigate to the route computed from the stores.
    ///
    /// Does not touch the router when it already shows that route. Always
    /// settles on `Running`.
    pub async fn navigate_to_current_state(&self) -> Result<bool> {
        self.renavigate(NavigationExtras::default()).await
    }

    async fn renavigate(&self, extras: NavigationExtras) -> Result<bool> {
        let Some(_guard) = self
            .status
            .enter(AppStatus::Running, AppStatus::ProcessingMessage)
        else {
            debug!("Navigation to current state refused while {}", self.current_status());
            return Ok(false);
        };

        let route = {
            let stores = self.lock_stores();
            let mode = stores.active_mode_id.clone();
            stores
                .active_frame_id
                .clone()
                .and_then(|id| frame_route(&stores, &id, mode.as_deref()))
        };
        let Some(route) = route else {
            warn!("No active frame to navigate to");
            return Ok(false);
        };

        let url = route.to_string();
        if url == self.backend.router().current_url() {
            trace!("Already at {}", url);
            return Ok(true);
        }
        self.navigate_with(&url, extras).await
    }

    // ─────────────────────────────────────────────────────────
    // Pane tabs
    // ─────────────────────────────────────────────────────────

    /// Show `snap_in_id` in a pane by changing only that pane's outlet.
    pub async fn navigate_to_snap_id(&self, pane_id: &FullPaneId, snap_in_id: &str) -> Result<bool> {
        let status = self.current_status();
        if !status.allows_snap_in_navigation() {
            debug!("Tab change in {} refused while {}", pane_id, status);
            return Ok(false);
        }

        let target = {
            let mut stores = self.lock_stores();
            let Some(pane) = stores.pane_mut(pane_id) else {
                warn!("{}", Error::pane_not_found(pane_id));
                return Ok(false);
            };
            if !pane.hosts(snap_in_id) {
                warn!("Pane {} does not host {}", pane_id, snap_in_id);
                return Ok(false);
            }
            pane.tab_change_in_progress = true;

            let mode = stores.active_mode_id.clone();
            let base = RouteState::parse(&self.backend.router().current_url())
                .filter(|r| r.frame_id == pane_id.frame_id)
                .or_else(|| frame_route(&stores, &pane_id.frame_id, mode.as_deref()));
            base.map(|route| {
                (route.outlet(&pane_id.pane_id) != Some(snap_in_id))
                    .then(|| route.with_outlet(&pane_id.pane_id, snap_in_id))
            })
        };

        let route = match target {
            None => {
                warn!("No route for frame {}", pane_id.frame_id);
                self.finish_tab_change(pane_id, None);
                return Ok(false);
            }
            Some(None) => {
                trace!("Pane {} already shows {}", pane_id, snap_in_id);
                self.finish_tab_change(pane_id, Some(snap_in_id));
                return Ok(true);
            }
            Some(Some(route)) => route,
        };

        let result = self.navigate(&route.to_string()).await;
        let selected = matches!(result, Ok(true)).then_some(snap_in_id);
        self.finish_tab_change(pane_id, selected);
        result
    }

    fn finish_tab_change(&self, pane_id: &FullPaneId, selected: Option<&str>) {
        if let Some(pane) = self.lock_stores().pane_mut(pane_id) {
            pane.tab_change_in_progress = false;
            if let Some(snap_in_id) = selected {
                pane.selected_snap_in_id = Some(snap_in_id.to_string());
            }
        }
    }

    /// Change tab visibility of snap-ins in the active frame, then navigate
    /// to the resulting state.
    ///
    /// Requests for other frames are ignored. `context` is delivered to every
    /// snap-in made visible.
    pub async fn display_snap_in_tab(
        &self,
        requests: &[SnapInTabRequest],
        context: Option<&serde_json::Value>,
    ) -> Result<bool> {
        let deliveries: Vec<FullSnapInId> = {
            let mut stores = self.lock_stores();
            let Some(active) = stores.active_frame_id.clone() else {
                return Ok(false);
            };
            let requests: Vec<&SnapInTabRequest> = requests
                .iter()
                .filter(|r| r.snap_in.frame_id == active)
                .collect();
            if requests.is_empty() {
                debug!("No tab request for active frame {}", active);
                return Ok(false);
            }

            let pane_ids = stores
                .frame(&active)
                .map(|f| f.pane_ids.clone())
                .unwrap_or_default();
            let mut touched: Vec<String> = Vec::new();
            let mut focused: HashMap<String, String> = HashMap::new();

            for request in &requests {
                for pane_id in &pane_ids {
                    let Some(pane) = stores.pane_mut(&FullPaneId::new(&active, pane_id)) else {
                        continue;
                    };
                    let Some(tab) = pane.tab_mut(&request.snap_in.snap_in_id) else {
                        continue;
                    };
                    tab.visible = request.visible;
                    if !touched.contains(pane_id) {
                        touched.push(pane_id.clone());
                    }
                    if request.focus && request.visible {
                        focused.insert(pane_id.clone(), request.snap_in.snap_in_id.clone());
                    }
                }
            }

            for pane_id in &touched {
                let Some(pane) = stores.pane_mut(&FullPaneId::new(&active, pane_id)) else {
                    continue;
                };
                if let Some(snap_in_id) = focused.get(pane_id) {
                    pane.selected_snap_in_id = Some(snap_in_id.clone());
                } else if !pane
                    .selected_snap_in_id
                    .as_deref()
                    .is_some_and(|s| pane.is_tab_visible(s))
                {
                    pane.selected_snap_in_id =
                        pane.first_visible_tab().map(|t| t.snap_in_id.clone());
                }
            }

            match context {
                Some(_) => requests
                    .iter()
                    .filter(|r| r.visible)
                    .map(|r| r.snap_in.clone())
                    .collect(),
                None => Vec::new(),
            }
        };

        if let Some(context) = context {
            for snap_in in &deliveries {
                let delivered = run_cancellable(
                    "context delivery",
                    &self.cancel.token(),
                    self.backend.broker().deliver_context(snap_in, context),
                )
                .await;
                if let Err(e) = delivered {
                    warn!("Context for {} not delivered: {}", snap_in, e);
                }
            }
        }

        self.navigate_to_current_state().await
    }

    /// Open or close a pane. Returns whether anything changed.
    pub fn set_pane_visible(&self, pane_id: &FullPaneId, visible: bool) -> bool {
        match self.lock_stores().pane_mut(pane_id) {
            Some(pane) if pane.visible != visible => {
                pane.visible = visible;
                true
            }
            Some(_) => false,
            None => {
                warn!("{}", Error::pane_not_found(pane_id));
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────
    // Modes and selections
    // ─────────────────────────────────────────────────────────

    /// Activate a mode, preferring `preferred_frame_id` when the mode allows it.
    pub async fn change_mode(
        &self,
        mode_id: &str,
        preferred_frame_id: Option<&str>,
        first_selection: Option<SelectionMessage>,
    ) -> Result<bool> {
        let Some(mode) = self.instance.mode(mode_id) else {
            warn!("{}", Error::mode_not_found(mode_id));
            return Ok(false);
        };

        let Some(guard) = self.status.transition(|s| {
            s.allows_mode_change().then_some(if s == AppStatus::Running {
                AppStatus::ProcessingMessage
            } else {
                s
            })
        }) else {
            debug!("Mode change refused while {}", self.current_status());
            return Ok(false);
        };

        let request = {
            let mut stores = self.lock_stores();
            let Some(frame_id) = resolve_mode_frame(&stores, mode, preferred_frame_id) else {
                warn!("No frame can show mode {}", mode_id);
                return Ok(false);
            };
            let ctx = self.layout_context(stores.viewport);
            if let Some(frame) = stores.frame_mut(&frame_id) {
                ensure_layout(frame, &ctx);
            }
            let Some(route) = frame_route(&stores, &frame_id, Some(mode_id)) else {
                warn!("Frame {} has no layout for mode {}", frame_id, mode_id);
                return Ok(false);
            };
            let frame = stores.frame(&frame_id);
            ChangeModeRequest {
                mode_id: mode_id.to_string(),
                q_param_service: frame.and_then(|f| f.q_param_service.clone()),
                primary_channel: frame.and_then(|f| f.primary_channel.clone()),
                frame_id,
                route,
                message: first_selection,
            }
        };

        let frame_id = request.frame_id.clone();
        let result = ChangeModeHandler::new(
            self.backend.router(),
            self.backend.broker(),
            &self.stores,
            self.cancel.token(),
        )
        .run(request)
        .await;
        drop(guard);

        if matches!(result, Ok(true)) {
            self.emit(ShellEvent::ModeChanged {
                frame_id,
                mode_id: mode_id.to_string(),
            });
        }
        result
    }

    /// Route a selection coming from a q-param service.
    ///
    /// With a `mode` other than the active one this becomes a mode change;
    /// otherwise the message goes to the frame, switching to it first when
    /// needed.
    pub async fn process_new_selection(
        &self,
        frame_id: &str,
        message: SelectionMessage,
        mode: Option<&str>,
    ) -> Result<bool> {
        let Some(guard) = self
            .status
            .enter(AppStatus::Running, AppStatus::ProcessingNewSelection)
        else {
            debug!("New selection refused while {}", self.current_status());
            return Ok(false);
        };

        let (active_frame, active_mode) = {
            let stores = self.lock_stores();
            (stores.active_frame_id.clone(), stores.active_mode_id.clone())
        };

        let result = match mode {
            Some(mode) if active_mode.as_deref() != Some(mode) => {
                self.change_mode(mode, Some(frame_id), Some(message)).await
            }
            _ if active_frame.as_deref() == Some(frame_id) => {
                Ok(self.spread_message(frame_id, &message).await)
            }
            _ => self
                .perform_frame_switch(frame_id, Some(message), None)
                .await
                .map(|(navigated, _)| navigated),
        };
        drop(guard);
        result
    }

    async fn spread_message(&self, frame_id: &str, message: &SelectionMessage) -> bool {
        let sent = run_cancellable(
            "selection message",
            &self.cancel.token(),
            self.backend
                .broker()
                .send_message_from_qparam_service(frame_id, message),
        )
        .await;
        match sent {
            Ok(true) => true,
            Ok(false) => {
                warn!(
                    "{}",
                    Error::broker(format!("selection message for {frame_id} declined"))
                );
                false
            }
            Err(e) => {
                warn!("Selection message for {} not delivered: {}", frame_id, e);
                false
            }
        }
    }

    async fn run_first_selection(&self, frame_id: &str) -> Result<bool> {
        let service = self
            .lock_stores()
            .frame(frame_id)
            .and_then(|f| f.q_param_service.clone());
        AutomaticFirstSelectionHandler::new(
            self.backend.qparams(),
            self.backend.broker(),
            self.cancel.token(),
        )
        .run(frame_id, service.as_deref())
        .await
    }

    // ─────────────────────────────────────────────────────────
    // Router-driven updates
    // ─────────────────────────────────────────────────────────

    /// Apply a route change the shell did not cause (back/forward, links).
    pub async fn update_from_navigate(&self, url: &str) -> Result<bool> {
        let Some(route) = RouteState::parse(url) else {
            warn!("Ignoring unparsable route {}", url);
            return Ok(false);
        };
        let Some(_guard) = self
            .status
            .enter(AppStatus::Running, AppStatus::UpdatingFromNavigate)
        else {
            debug!("Route update refused while {}", self.current_status());
            return Ok(false);
        };

        let (mode_changed, selection) = {
            let mut stores = self.lock_stores();
            let ctx = self.layout_context(stores.viewport);
            let Some(frame) = stores.frame_mut(&route.frame_id) else {
                warn!("{}", Error::frame_not_found(&route.frame_id));
                return Ok(false);
            };
            if frame.is_docked() {
                warn!("Route targets docked frame {}", route.frame_id);
                return Ok(false);
            }

            if frame.view(&route.view_id).is_some() {
                frame.selected_view_id = Some(route.view_id.clone());
            } else {
                warn!("{}", Error::view_not_found(&route.frame_id, &route.view_id));
            }
            if frame.layout(&route.layout_id).is_some() {
                frame.selected_layout_id = Some(route.layout_id.clone());
            } else {
                warn!("{}", Error::layout_not_available(&route.frame_id, &route.layout_id));
            }
            let available = available_layouts(frame, frame.selected_view_id.as_deref(), &ctx);
            frame.available_layouts = available;
            frame.has_been_navigated_once = true;
            let selection = (
                frame.selected_view_id.clone(),
                frame.selected_layout_id.clone(),
            );

            for (pane_id, snap_in_id) in &route.outlets {
                if let Some(pane) = stores.pane_mut(&FullPaneId::new(&route.frame_id, pane_id)) {
                    if pane.hosts(snap_in_id) {
                        pane.selected_snap_in_id = Some(snap_in_id.clone());
                        pane.visible = true;
                    }
                }
            }
            stores.active_frame_id = Some(route.frame_id.clone());

            let mode_changed = route.mode.is_some() && route.mode != stores.active_mode_id;
            if mode_changed {
                stores.active_mode_id = route.mode.clone();
                stores.update_displayability(route.mode.as_deref());
            }
            (mode_changed, selection)
        };

        if mode_changed {
            info!("Mode changed by route to {:?}", route.mode);
            self.emit(ShellEvent::QParamChangeDetected {
                url: url.to_string(),
                mode: route.mode.clone(),
            });
        }
        if let (Some(view_id), Some(layout_id)) = selection {
            self.emit(ShellEvent::LayoutSelected {
                frame_id: route.frame_id.clone(),
                view_id,
                layout_id,
            });
        }
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────
    // Viewport
    // ─────────────────────────────────────────────────────────

    pub async fn on_resize(&self, width: u32) -> Result<bool> {
        let previous = {
            let mut stores = self.lock_stores();
            let previous = self.screen_size(stores.viewport);
            stores.viewport.width = width;
            previous
        };
        self.reevaluate_layout(previous).await
    }

    pub async fn on_mobile_visibility_changed(&self, mobile: bool) -> Result<bool> {
        self.mobile.set_mobile_only_visibility(mobile);
        let previous = {
            let mut stores = self.lock_stores();
            if stores.viewport.mobile == mobile {
                return Ok(false);
            }
            let previous = self.screen_size(stores.viewport);
            stores.viewport.mobile = mobile;
            previous
        };
        self.reevaluate_layout(previous).await
    }

    async fn reevaluate_layout(&self, previous_size: ScreenSize) -> Result<bool> {
        let target = {
            let mut stores = self.lock_stores();
            let size = self.screen_size(stores.viewport);
            let ctx = self.layout_context(stores.viewport);
            let Some(active) = stores.active_frame_id.clone() else {
                return Ok(false);
            };
            let Some(frame) = stores.frame_mut(&active) else {
                return Ok(false);
            };

            let mut change = check_frame_needs_new_layout(frame, &ctx);
            if size != previous_size {
                let favorite = frame
                    .selected_view_id
                    .as_deref()
                    .and_then(|view| frame.favorite_layouts.get(view))
                    .and_then(|f| f.for_size(size))
                    .filter(|id| frame.is_layout_available(id))
                    .map(str::to_string);
                if favorite.is_some() {
                    change.new_layout_id = favorite;
                }
            }
            trace!("Frame {} after viewport change: {:?}", active, change);

            let Some(layout_id) = change
                .new_layout_id
                .filter(|id| frame.selected_layout_id.as_deref() != Some(id.as_str()))
            else {
                return Ok(false);
            };
            if self.current_status() == AppStatus::Initializing {
                frame.selected_layout_id = Some(layout_id);
                return Ok(false);
            }
            let Some(view_id) = frame.selected_view_id.clone() else {
                return Ok(false);
            };
            (active, view_id, layout_id)
        };

        let (frame_id, view_id, layout_id) = target;
        self.navigate_to_frame_view_layout(&frame_id, &view_id, &layout_id)
            .await
    }

    // ─────────────────────────────────────────────────────────
    // Unsaved data
    // ─────────────────────────────────────────────────────────

    /// Register the unsaved-data capability of a snap-in.
    pub fn register_unsaved_check(&self, snap_in: FullSnapInId, check: Arc<dyn UnsavedDataCheck>) {
        let mut checks = self.lock_checks();
        match checks.iter_mut().find(|(id, _)| *id == snap_in) {
            Some(entry) => entry.1 = check,
            None => checks.push((snap_in, check)),
        }
    }

    pub fn unregister_unsaved_check(&self, snap_in: &FullSnapInId) -> bool {
        let mut checks = self.lock_checks();
        let before = checks.len();
        checks.retain(|(id, _)| id != snap_in);
        checks.len() != before
    }

    /// Ask the snap-ins shown in `target_panes` (every visible pane of the
    /// active frame when empty) whether it is fine to continue.
    pub async fn check_unsaved(
        &self,
        target_panes: &[FullPaneId],
        reason: UnsavedReason,
    ) -> Result<bool> {
        let checks = {
            let stores = self.lock_stores();
            let registered = self.lock_checks();

            let panes = if target_panes.is_empty() {
                stores
                    .active_frame_id
                    .as_deref()
                    .map(|id| stores.panes_of_frame(id))
                    .unwrap_or_default()
            } else {
                target_panes
                    .iter()
                    .filter_map(|id| stores.pane(id))
                    .collect()
            };

            let mut checks: UnsavedChecks = Vec::new();
            for pane in panes.into_iter().filter(|p| p.visible) {
                let Some(snap_in_id) = &pane.selected_snap_in_id else {
                    continue;
                };
                let id = FullSnapInId::new(&pane.id.frame_id, snap_in_id);
                if checks.iter().any(|(c, _)| *c == id) {
                    continue;
                }
                if let Some((_, check)) = registered.iter().find(|(r, _)| *r == id) {
                    checks.push((id, check.clone()));
                }
            }
            checks
        };

        debug!("Checking unsaved data of {} snap-ins ({:?})", checks.len(), reason);
        UnsavedDataHandler::new(checks, self.cancel.token())
            .run(reason)
            .await
    }

    // ─────────────────────────────────────────────────────────
    // Pane state and layout preferences
    // ─────────────────────────────────────────────────────────

    /// Toggle full screen for a pane. Returns the new full-screen state.
    pub async fn toggle_full_screen(&self, pane_id: &FullPaneId) -> Result<bool> {
        let state = {
            let mut stores = self.lock_stores();
            let Some(pane) = stores.pane(pane_id) else {
                warn!("{}", Error::pane_not_found(pane_id));
                return Ok(false);
            };
            let full_screen = !pane.full_screen;
            stores.reset_full_screen(&pane_id.frame_id);
            if let Some(pane) = stores.pane_mut(pane_id) {
                pane.full_screen = full_screen;
            }
            FullScreenSettings {
                pane_id: pane_id.pane_id.clone(),
                full_screen,
            }
        };

        if let Err(e) = self
            .user_settings()
            .save_full_screen(&pane_id.frame_id, &state)
            .await
        {
            warn!("Saving full-screen state of {} failed: {}", pane_id, e);
        }
        Ok(state.full_screen)
    }

    pub async fn save_splitter_configuration(
        &self,
        frame_id: &str,
        configuration: serde_json::Value,
    ) -> Result<bool> {
        match self.lock_stores().frame_mut(frame_id) {
            Some(frame) => frame.splitter_configuration = Some(configuration.clone()),
            None => {
                warn!("{}", Error::frame_not_found(frame_id));
                return Ok(false);
            }
        }
        self.user_settings()
            .save_splitters(frame_id, &configuration)
            .await
    }

    /// Forget the frame's layout preferences.
    ///
    /// The active frame first returns to its default view with the most
    /// fitting layout. The stored preferences are dropped afterwards, even
    /// when that navigation fails.
    pub async fn reset_layout(&self, frame_id: &str) -> Result<bool> {
        let target = {
            let stores = self.lock_stores();
            let ctx = self.layout_context(stores.viewport);
            let Some(frame) = stores.frame(frame_id) else {
                warn!("{}", Error::frame_not_found(frame_id));
                return Ok(false);
            };
            let is_active = stores.active_frame_id.as_deref() == Some(frame_id);
            frame.default_view().filter(|_| is_active).and_then(|view| {
                let available = available_layouts(frame, Some(&view.id), &ctx);
                let candidates: Vec<&LayoutInstance> =
                    available.iter().filter_map(|id| frame.layout(id)).collect();
                get_most_fitting_layout_id(&candidates).map(|layout_id| (view.id.clone(), layout_id))
            })
        };

        let navigated = match target {
            Some((view_id, layout_id)) => {
                self.navigate_to_frame_view_layout(frame_id, &view_id, &layout_id)
                    .await
            }
            None => Ok(true),
        };

        let view_ids = match self.lock_stores().frame_mut(frame_id) {
            Some(frame) => {
                frame.favorite_layouts.clear();
                frame.views.iter().map(|v| v.id.clone()).collect::<Vec<_>>()
            }
            None => Vec::new(),
        };
        self.user_settings()
            .delete_layouts(frame_id, &view_ids)
            .await?;
        info!("Layout preferences of {} reset", frame_id);
        self.emit(ShellEvent::LayoutReset {
            frame_id: frame_id.to_string(),
        });
        navigated
    }

    // ─────────────────────────────────────────────────────────
    // Dynamic frames and teardown
    // ─────────────────────────────────────────────────────────

    pub fn add_frame(&self, desc: &FrameDescription) -> Result<()> {
        let mut stores = self.lock_stores();
        stores.add_frame(desc)?;
        let ctx = self.layout_context(stores.viewport);
        if let Some(frame) = stores.frame_mut(&desc.id) {
            ensure_layout(frame, &ctx);
        }
        let mode = stores.active_mode_id.clone();
        stores.update_displayability(mode.as_deref());
        info!("Frame {} added", desc.id);
        Ok(())
    }

    /// Remove a frame. The active frame cannot be removed.
    pub fn remove_frame(&self, frame_id: &str) -> Result<bool> {
        {
            let mut stores = self.lock_stores();
            if stores.active_frame_id.as_deref() == Some(frame_id) {
                warn!("Cannot remove active frame {}", frame_id);
                return Ok(false);
            }
            match stores.remove_frame(frame_id) {
                Ok(_) => {}
                Err(e) if e.is_configuration() => {
                    warn!("{}", e);
                    return Ok(false);
                }
                Err(e) => return Err(e),
            }
        }
        self.lock_checks().retain(|(id, _)| id.frame_id != frame_id);
        info!("Frame {} removed", frame_id);
        Ok(true)
    }

    /// Cancel every pending handler. Later operations resolve with
    /// [`Error::Cancelled`].
    pub fn dispose(&self) {
        self.cancel.cancel();
        self.abandon_reuse();
        info!("Shell disposed");
    }

    // ─────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────

    fn lock_stores(&self) -> MutexGuard<'_, ShellStores> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_reuse(&self) -> MutexGuard<'_, ReuseRegistry> {
        self.reuse.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_checks(&self) -> MutexGuard<'_, UnsavedChecks> {
        self.unsaved_checks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn layout_context(&self, viewport: ViewportContext) -> LayoutContext<'_> {
        LayoutContext {
            viewport,
            mobile_layout_id: &self.settings.layout.mobile_layout_id,
        }
    }

    fn screen_size(&self, viewport: ViewportContext) -> ScreenSize {
        ScreenSize::classify(
            viewport.width,
            viewport.mobile,
            self.settings.layout.large_screen_min_width,
        )
    }

    fn user_settings(&self) -> UserSettingsHandler<'_, K::Settings> {
        UserSettingsHandler::new(
            self.backend.settings(),
            Duration::from_millis(self.settings.settings.read_timeout_ms),
            self.cancel.token(),
        )
    }

    async fn navigate(&self, url: &str) -> Result<bool> {
        self.navigate_with(url, NavigationExtras::default()).await
    }

    async fn navigate_with(&self, url: &str, extras: NavigationExtras) -> Result<bool> {
        NavigateHandler::new(self.backend.router(), self.cancel.token())
            .run(url, extras)
            .await
    }

    fn emit(&self, event: ShellEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn emit_layout_selected(&self, frame_id: &str) {
        let selection = self.lock_stores().frame(frame_id).and_then(|f| {
            Some((f.selected_view_id.clone()?, f.selected_layout_id.clone()?))
        });
        if let Some((view_id, layout_id)) = selection {
            self.emit(ShellEvent::LayoutSelected {
                frame_id: frame_id.to_string(),
                view_id,
                layout_id,
            });
        }
    }
}

fn log_failure(what: &str, e: &Error) {
    if e.is_recoverable() {
        warn!("{} failed: {}", what, e);
    } else {
        error!("{} failed: {}", what, e);
    }
}

/// Make sure the frame has an available layout selected.
fn ensure_layout(frame: &mut Frame, ctx: &LayoutContext) {
    let change = check_frame_needs_new_layout(frame, ctx);
    if let Some(layout_id) = change.new_layout_id {
        frame.selected_layout_id = Some(layout_id);
    } else if frame.selected_layout_id.is_none() {
        frame.selected_layout_id = most_fitting_available(frame);
    }
}

/// Select the remembered layout for the screen size, else keep an available
/// selection, else the most fitting layout.
fn select_preferred_layout(frame: &mut Frame, size: ScreenSize, ctx: &LayoutContext) {
    let available = available_layouts(frame, frame.selected_view_id.as_deref(), ctx);
    frame.available_layouts = available;

    let favorite = frame
        .selected_view_id
        .as_deref()
        .and_then(|view| frame.favorite_layouts.get(view))
        .and_then(|f| f.for_size(size))
        .filter(|id| frame.is_layout_available(id))
        .map(str::to_string);

    if favorite.is_some() {
        frame.selected_layout_id = favorite;
    } else if !frame
        .selected_layout_id
        .as_deref()
        .is_some_and(|id| frame.is_layout_available(id))
    {
        frame.selected_layout_id = most_fitting_available(frame);
    }
}

fn resolve_mode_frame(
    stores: &ShellStores,
    mode: &ModeDescription,
    preferred: Option<&str>,
) -> Option<String> {
    let usable = |id: &str| {
        stores.frame(id).is_some_and(|f| !f.is_docked())
            && (mode.frames.is_empty() || mode.frames.iter().any(|f| f == id))
    };

    preferred
        .filter(|id| usable(id))
        .map(str::to_string)
        .or_else(|| mode.default_frame.clone().filter(|id| usable(id)))
        .or_else(|| stores.active_frame_id.clone().filter(|id| usable(id)))
        .or_else(|| mode.frames.iter().find(|id| usable(id)).cloned())
}

/// Route of a frame's current view and layout.
fn frame_route(stores: &ShellStores, frame_id: &str, mode: Option<&str>) -> Option<RouteState> {
    let frame = stores.frame(frame_id)?;
    let view_id = frame.selected_view_id.as_deref()?;
    let layout_id = frame.selected_layout_id.as_deref()?;
    Some(layout_route(stores, frame_id, view_id, layout_id, mode, false))
}

/// Route for a layout, with one outlet per shown pane of that layout.
///
/// With `reopen`, closed panes that do not start closed count as shown.
fn layout_route(
    stores: &ShellStores,
    frame_id: &str,
    view_id: &str,
    layout_id: &str,
    mode: Option<&str>,
    reopen: bool,
) -> RouteState {
    let mut route =
        RouteState::new(frame_id, view_id, layout_id).with_mode(mode.map(str::to_string));

    let Some(frame) = stores.frame(frame_id) else {
        return route;
    };
    for pane_id in frame.panes_in_layout(layout_id) {
        let Some(pane) = stores.pane(&FullPaneId::new(frame_id, pane_id)) else {
            continue;
        };
        let shown = pane.visible || (reopen && !pane.start_closed);
        if !shown || !pane.is_displayable_in(mode) {
            continue;
        }
        if let Some(snap_in_id) = &pane.selected_snap_in_id {
            route.outlets.push((pane_id.clone(), snap_in_id.clone()));
        }
    }
    route
}
