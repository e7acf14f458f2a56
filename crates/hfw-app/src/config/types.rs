//! Configuration types for the shell
//!
//! Defines `ShellSettings` (`.hfw/config.toml`) and its sections.

use serde::{Deserialize, Serialize};

/// Reserved layout id used while mobile-only visibility is active.
pub const MOBILE_LAYOUT_ID: &str = "2-pane-mobile";

/// Shell settings (.hfw/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ShellSettings {
    #[serde(default)]
    pub layout: LayoutSettings,

    #[serde(default)]
    pub settings: UserSettingsConfig,

    #[serde(default)]
    pub profiles: ProfileSettings,

    #[serde(default)]
    pub session: SessionSettings,
}

/// Layout selection settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LayoutSettings {
    /// Layout preferred while mobile-only visibility is on
    #[serde(default = "default_mobile_layout_id")]
    pub mobile_layout_id: String,

    /// Viewport widths at or above this count as a large screen
    #[serde(default = "default_large_screen_min_width")]
    pub large_screen_min_width: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            mobile_layout_id: default_mobile_layout_id(),
            large_screen_min_width: default_large_screen_min_width(),
        }
    }
}

fn default_mobile_layout_id() -> String {
    MOBILE_LAYOUT_ID.to_string()
}

fn default_large_screen_min_width() -> u32 {
    1024
}

/// Persisted user settings retrieval
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserSettingsConfig {
    /// Deadline for one settings category to answer, in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for UserSettingsConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

fn default_read_timeout_ms() -> u64 {
    5000
}

/// Profile and extension loading
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProfileSettings {
    /// Entry profile file name
    #[serde(default = "default_entry_profile")]
    pub entry_profile: String,

    /// Extension files applied on top of the merged profile
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Deadline for reading all extensions, in milliseconds
    #[serde(default = "default_extension_timeout_ms")]
    pub extension_timeout_ms: u64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            entry_profile: default_entry_profile(),
            extensions: Vec::new(),
            extension_timeout_ms: default_extension_timeout_ms(),
        }
    }
}

fn default_entry_profile() -> String {
    "hfw-instance.json".to_string()
}

fn default_extension_timeout_ms() -> u64 {
    3000
}

/// Cross-instance logout detection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionSettings {
    #[serde(default = "default_cookie_poll_interval_ms")]
    pub cookie_poll_interval_ms: u64,

    #[serde(default = "default_auth_cookie_name")]
    pub auth_cookie_name: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_poll_interval_ms: default_cookie_poll_interval_ms(),
            auth_cookie_name: default_auth_cookie_name(),
        }
    }
}

fn default_cookie_poll_interval_ms() -> u64 {
    1000
}

fn default_auth_cookie_name() -> String {
    "hfw-auth".to_string()
}
