//! Persisted user preferences
//!
//! Four categories are stored per frame: splitter positions, favorite layouts
//! (per frame and view), full-screen state and the selected view. Loading
//! reads each category key by key, runs the four categories side by side and
//! joins them into one [`UserFramePreferences`] under a single deadline.
//!
//! Stored JSON replaces every `"` with `'`; reads undo the substitution.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use hfw_core::prelude::*;
use hfw_hldl::FetchOutcome;

use super::{run_cancellable, CancelToken};
use crate::services::SettingsService;
use crate::store::FavoriteLayoutsPerRange;

pub const LAYOUT_SETTINGS_PREFIX: &str = "Flex_Hfw_LayoutSettings";
pub const SPLITTER_SETTINGS_PREFIX: &str = "Flex_HfwCore_SplitterSettings";
pub const FULL_SCREEN_SETTINGS_PREFIX: &str = "Flex_HfwCore_FullScreenSettings";
pub const SELECTED_VIEW_PREFIX: &str = "Flex_HfwCore_FullScreenSelectedView";

pub fn layout_key(frame_id: &str, view_id: &str) -> String {
    format!("{LAYOUT_SETTINGS_PREFIX}-{frame_id}-{view_id}")
}

pub fn splitter_key(frame_id: &str) -> String {
    format!("{SPLITTER_SETTINGS_PREFIX}-{frame_id}")
}

pub fn full_screen_key(frame_id: &str) -> String {
    format!("{FULL_SCREEN_SETTINGS_PREFIX}-{frame_id}")
}

pub fn selected_view_key(frame_id: &str) -> String {
    format!("{SELECTED_VIEW_PREFIX}-{frame_id}")
}

/// Serialize with the single-quote storage convention.
pub fn encode_value<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace('"', "'"))
}

/// Parse a stored value written by [`encode_value`].
///
/// A string inside the value that itself contains `'` cannot be told apart
/// from a quote after the substitution, so such a value fails to parse.
/// Layout settings then fall back to reading the raw value as a bare id.
pub fn decode_value<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(&raw.replace('\'', "\""))?)
}

/// Full-screen state of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullScreenSettings {
    pub pane_id: String,
    pub full_screen: bool,
}

/// Everything persisted for the user, keyed by frame id
/// (`frameId.viewId` for layouts).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFramePreferences {
    pub splitter_configuration: HashMap<String, serde_json::Value>,
    pub layout_configuration: HashMap<String, FavoriteLayoutsPerRange>,
    pub full_screen_states: HashMap<String, FullScreenSettings>,
    pub selected_views: HashMap<String, String>,
}

impl UserFramePreferences {
    pub fn layout_for(&self, frame_id: &str, view_id: &str) -> Option<&FavoriteLayoutsPerRange> {
        self.layout_configuration
            .get(&format!("{frame_id}.{view_id}"))
    }
}

/// Frame and views whose settings should be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSettingsKeys {
    pub frame_id: String,
    pub view_ids: Vec<String>,
}

/// `(preference key, settings key)` pairs of one category.
type CategoryKeys = Vec<(String, String)>;

/// Raw values that arrived and settings keys that did not.
type CategoryReplies = (Vec<(String, String)>, Vec<String>);

pub struct UserSettingsHandler<'a, S> {
    settings: &'a S,
    read_timeout: Duration,
    token: CancelToken,
}

impl<'a, S: SettingsService + Sync> UserSettingsHandler<'a, S> {
    pub fn new(settings: &'a S, read_timeout: Duration, token: CancelToken) -> Self {
        Self {
            settings,
            read_timeout,
            token,
        }
    }

    /// Read all four categories for `frames`.
    ///
    /// Reads still pending at the deadline, and reads that failed, are listed
    /// as missing in a `Partial` outcome.
    pub async fn load(&self, frames: &[FrameSettingsKeys]) -> FetchOutcome<UserFramePreferences> {
        let deadline = Instant::now() + self.read_timeout;

        let per_frame = |key: fn(&str) -> String| -> CategoryKeys {
            frames
                .iter()
                .map(|f| (f.frame_id.clone(), key(&f.frame_id)))
                .collect()
        };
        let layout_keys: CategoryKeys = frames
            .iter()
            .flat_map(|f| {
                f.view_ids.iter().map(|v| {
                    (
                        format!("{}.{}", f.frame_id, v),
                        layout_key(&f.frame_id, v),
                    )
                })
            })
            .collect();

        let joined = run_cancellable("user settings", &self.token, async {
            Ok(tokio::join!(
                self.read_category("splitter", per_frame(splitter_key), deadline),
                self.read_category("layout", layout_keys, deadline),
                self.read_category("full-screen", per_frame(full_screen_key), deadline),
                self.read_category("selected-view", per_frame(selected_view_key), deadline),
            ))
        })
        .await;

        let (splitters, layouts, full_screens, views) = match joined {
            Ok(replies) => replies,
            Err(e) => return FetchOutcome::Failed(e),
        };

        let mut preferences = UserFramePreferences::default();
        let mut missing = Vec::new();

        for (frame_id, raw) in splitters.0 {
            match decode_value(&raw) {
                Ok(value) => {
                    preferences.splitter_configuration.insert(frame_id, value);
                }
                Err(e) => warn!("Ignoring splitter settings of {}: {}", frame_id, e),
            }
        }
        missing.extend(splitters.1);

        for (key, raw) in layouts.0 {
            let favorites = decode_value(&raw).unwrap_or_else(|_| {
                debug!("Layout setting {} is a bare layout id", key);
                FavoriteLayoutsPerRange {
                    small_layout_id: Some(raw.clone()),
                    large_layout_id: Some(raw.clone()),
                }
            });
            preferences.layout_configuration.insert(key, favorites);
        }
        missing.extend(layouts.1);

        for (frame_id, raw) in full_screens.0 {
            match decode_value(&raw) {
                Ok(state) => {
                    preferences.full_screen_states.insert(frame_id, state);
                }
                Err(e) => warn!("Ignoring full-screen settings of {}: {}", frame_id, e),
            }
        }
        missing.extend(full_screens.1);

        for (frame_id, raw) in views.0 {
            let view_id = raw.trim();
            if !view_id.is_empty() {
                preferences
                    .selected_views
                    .insert(frame_id, view_id.to_string());
            }
        }
        missing.extend(views.1);

        if missing.is_empty() {
            FetchOutcome::Complete(preferences)
        } else {
            warn!("User settings incomplete, missing {:?}", missing);
            FetchOutcome::Partial {
                value: preferences,
                missing,
            }
        }
    }

    async fn read_category(
        &self,
        category: &str,
        keys: CategoryKeys,
        deadline: Instant,
    ) -> CategoryReplies {
        let mut values = Vec::new();
        let mut missing = Vec::new();

        for (index, (pref_key, settings_key)) in keys.iter().enumerate() {
            match tokio::time::timeout_at(deadline, self.settings.get_settings(settings_key)).await
            {
                Err(_) => {
                    warn!(
                        "{} after {} of {}",
                        Error::timeout(format!("reading {category} settings")),
                        index,
                        keys.len()
                    );
                    missing.extend(keys[index..].iter().map(|(_, k)| k.clone()));
                    break;
                }
                Ok(Ok(Some(raw))) => values.push((pref_key.clone(), raw)),
                Ok(Ok(None)) => trace!("No {} setting {}", category, settings_key),
                Ok(Err(e)) => {
                    error!("Failed to read {}: {}", settings_key, e);
                    missing.push(settings_key.clone());
                }
            }
        }

        (values, missing)
    }

    pub async fn get_layout(
        &self,
        frame_id: &str,
        view_id: &str,
    ) -> Result<Option<FavoriteLayoutsPerRange>> {
        let raw = self
            .settings
            .get_settings(&layout_key(frame_id, view_id))
            .await?;
        Ok(raw.map(|raw| {
            decode_value(&raw).unwrap_or(FavoriteLayoutsPerRange {
                small_layout_id: Some(raw.clone()),
                large_layout_id: Some(raw),
            })
        }))
    }

    pub async fn save_layout(
        &self,
        frame_id: &str,
        view_id: &str,
        favorites: &FavoriteLayoutsPerRange,
    ) -> Result<bool> {
        let value = encode_value(favorites)?;
        self.settings
            .put_settings(&layout_key(frame_id, view_id), &value)
            .await
    }

    pub async fn save_splitters(&self, frame_id: &str, value: &serde_json::Value) -> Result<bool> {
        let value = encode_value(value)?;
        self.settings
            .put_settings(&splitter_key(frame_id), &value)
            .await
    }

    pub async fn save_full_screen(&self, frame_id: &str, state: &FullScreenSettings) -> Result<bool> {
        let value = encode_value(state)?;
        self.settings
            .put_settings(&full_screen_key(frame_id), &value)
            .await
    }

    pub async fn save_selected_view(&self, frame_id: &str, view_id: &str) -> Result<bool> {
        self.settings
            .put_settings(&selected_view_key(frame_id), view_id)
            .await
    }

    /// Drop the stored layouts of the given views and the selected view.
    pub async fn delete_layouts(&self, frame_id: &str, view_ids: &[String]) -> Result<bool> {
        let mut all_deleted = true;
        for view_id in view_ids {
            all_deleted &= self
                .settings
                .delete_settings(&layout_key(frame_id, view_id))
                .await?;
        }
        all_deleted &= self
            .settings
            .delete_settings(&selected_view_key(frame_id))
            .await?;
        Ok(all_deleted)
    }
}
