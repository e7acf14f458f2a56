//! Host framework shell
//!
//! Frame, pane and layout orchestration for snap-in web clients. This crate
//! re-exports the workspace crates:
//!
//! - [`core`] - identifiers, application status, errors, logging
//! - [`hldl`] - layout description model, profile chain and extensions
//! - [`app`] - runtime stores, layout selection, reuse and the orchestrator

pub use hfw_app as app;
pub use hfw_core as core;
pub use hfw_hldl as hldl;

// Re-export main entry points
pub use hfw_app::{load_instance, ShellBackend, ShellEvent, ShellSettings, StateService};
pub use hfw_core::{AppStatus, Error, Result};
