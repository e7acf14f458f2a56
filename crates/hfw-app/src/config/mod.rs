//! Configuration file parsing for the shell
//!
//! Supports:
//! - `.hfw/config.toml` - Shell settings

pub mod settings;
pub mod types;

pub use settings::{load_settings, save_settings};
pub use types::*;
