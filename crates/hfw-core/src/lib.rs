//! # hfw-core - Core Domain Types
//!
//! Foundation crate for the host framework shell. Provides domain identifiers,
//! the application status, error handling and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`AppStatus`] - Process-wide orchestration status
//! - [`FullPaneId`], [`FullSnapInId`] - Frame-scoped identifiers
//! - [`ScreenSize`] - Screen-size class for remembered layouts
//! - [`Docked`] - Frame docking classification
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with `configuration` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use hfw_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all shell crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use types::{AppStatus, Docked, FullPaneId, FullSnapInId, ScreenSize};
