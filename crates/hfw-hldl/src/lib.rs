//! # hfw-hldl - Layout Description Handling
//!
//! Parses HLDL profile documents into an [`HfwInstance`] tree, follows
//! `parentProfile` chains, applies extension documents under a deadline and
//! reports structural problems.
//!
//! All best-effort fetches report through [`FetchOutcome`].

pub mod model;
pub mod outcome;
pub mod profile;
pub mod validate;

pub use model::{
    FrameDescription, HfwInstance, LayoutDescription, ModeDescription, PaneDescription,
    PaneInstanceDescription, ProfileDocument, SnapInReference, SnapInTypeDescription,
    ViewDescription,
};
pub use outcome::FetchOutcome;
pub use profile::{
    apply_extensions, load_extensions, load_profile_chain, merge_instances, ExtensionDocument,
    LocalProfileSource, PaneExtension, ProfileSource,
};
pub use validate::{validate, ValidationIssue};
