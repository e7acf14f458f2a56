//! Shell error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Shell error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors (layout description lookups)
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    #[error("Frame not found: {frame_id}")]
    FrameNotFound { frame_id: String },

    #[error("Pane not found: {pane}")]
    PaneNotFound { pane: String },

    #[error("Layout {layout_id} not available in frame {frame_id}")]
    LayoutNotAvailable { frame_id: String, layout_id: String },

    #[error("View {view_id} not found in frame {frame_id}")]
    ViewNotFound { frame_id: String, view_id: String },

    #[error("Mode not found: {mode_id}")]
    ModeNotFound { mode_id: String },

    // ─────────────────────────────────────────────────────────────
    // Navigation Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Snap-in reuse bookkeeping failed: {message}")]
    ReuseBookkeeping { message: String },

    #[error("Message broker error: {message}")]
    Broker { message: String },

    // ─────────────────────────────────────────────────────────────
    // Settings / Transport Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Settings store error: {message}")]
    Settings { message: String },

    #[error("Profile error: {message}")]
    Profile { message: String },

    #[error("Transport error fetching {resource}: {message}")]
    Transport { resource: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Async Handler Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn frame_not_found(frame_id: impl Into<String>) -> Self {
        Self::FrameNotFound {
            frame_id: frame_id.into(),
        }
    }

    pub fn pane_not_found(pane: impl ToString) -> Self {
        Self::PaneNotFound {
            pane: pane.to_string(),
        }
    }

    pub fn layout_not_available(frame_id: impl Into<String>, layout_id: impl Into<String>) -> Self {
        Self::LayoutNotAvailable {
            frame_id: frame_id.into(),
            layout_id: layout_id.into(),
        }
    }

    pub fn view_not_found(frame_id: impl Into<String>, view_id: impl Into<String>) -> Self {
        Self::ViewNotFound {
            frame_id: frame_id.into(),
            view_id: view_id.into(),
        }
    }

    pub fn mode_not_found(mode_id: impl Into<String>) -> Self {
        Self::ModeNotFound {
            mode_id: mode_id.into(),
        }
    }

    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn reuse_bookkeeping(message: impl Into<String>) -> Self {
        Self::ReuseBookkeeping {
            message: message.into(),
        }
    }

    pub fn broker(message: impl Into<String>) -> Self {
        Self::Broker {
            message: message.into(),
        }
    }

    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    pub fn profile(message: impl Into<String>) -> Self {
        Self::Profile {
            message: message.into(),
        }
    }

    pub fn transport(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Configuration errors are logged as warnings and resolve to "not performed".
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::ConfigInvalid { .. }
                | Error::FrameNotFound { .. }
                | Error::PaneNotFound { .. }
                | Error::LayoutNotAvailable { .. }
                | Error::ViewNotFound { .. }
                | Error::ModeNotFound { .. }
        )
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        self.is_configuration()
            || matches!(
                self,
                Error::Transport { .. }
                    | Error::Settings { .. }
                    | Error::Broker { .. }
                    | Error::Timeout { .. }
                    | Error::Cancelled { .. }
            )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::layout_not_available("main", "3-pane");
        assert_eq!(err.to_string(), "Layout 3-pane not available in frame main");

        let err = Error::navigation("/main/v/l", "router rejected");
        assert!(err.to_string().contains("router rejected"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{'a':1}").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_configuration_errors_are_recoverable() {
        assert!(Error::frame_not_found("f").is_configuration());
        assert!(Error::mode_not_found("m").is_recoverable());
        assert!(!Error::navigation("/", "boom").is_configuration());
        assert!(!Error::reuse_bookkeeping("x").is_recoverable());
    }

    #[test]
    fn test_transport_and_timeout_are_recoverable() {
        assert!(Error::transport("ext.json", "404").is_recoverable());
        assert!(Error::timeout("settings").is_recoverable());
        assert!(!Error::Io(std::io::Error::other("disk")).is_recoverable());
    }

    #[test]
    fn test_result_ext_preserves_error() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = res.context("reading profile").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
