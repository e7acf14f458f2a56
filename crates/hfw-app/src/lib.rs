//! hfw-app - State orchestration for the host framework shell
//!
//! This crate owns the runtime stores built from the layout description, the
//! layout selection and snap-in reuse algorithms, the one-shot navigation
//! handlers and the [`StateService`] that sequences them under an explicit
//! application status.

pub mod bootstrap;
pub mod config;
pub mod handler;
pub mod layout;
pub mod mobile;
pub mod reuse;
pub mod route;
pub mod services;
pub mod session_watch;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

// Re-export primary types
pub use bootstrap::load_instance;
pub use config::ShellSettings;
pub use route::RouteState;
pub use services::{SelectionMessage, ShellBackend, UnsavedDataCheck, UnsavedReason};
pub use state::{ShellEvent, SnapInTabRequest, StateService};
pub use store::{ShellStores, ViewportContext};
