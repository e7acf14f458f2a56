//! Events published by the orchestrator

/// Broadcast to every subscriber of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// A frame committed a view and layout
    LayoutSelected {
        frame_id: String,
        view_id: String,
        layout_id: String,
    },

    /// The router changed the mode query
    QParamChangeDetected { url: String, mode: Option<String> },

    /// Persisted layout preferences of a frame were dropped
    LayoutReset { frame_id: String },

    ModeChanged { frame_id: String, mode_id: String },

    /// The auth cookie vanished, another instance logged out
    LoggedOutElsewhere,
}
