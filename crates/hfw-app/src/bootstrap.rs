//! Layout description bootstrap
//!
//! Loads the profile chain, applies extensions and validates the result
//! before the orchestrator is built.

use std::time::Duration;

use hfw_core::prelude::*;
use hfw_hldl::{
    apply_extensions, load_extensions, load_profile_chain, validate, FetchOutcome, HfwInstance,
    ProfileSource,
};

use crate::config::ProfileSettings;

/// Load the merged layout description.
///
/// A failed profile chain fails the bootstrap. Missing extensions degrade
/// the outcome to `Partial`, listing the extension files that were skipped.
/// Validation problems are logged and never fatal.
pub async fn load_instance<S: ProfileSource>(
    source: &S,
    settings: &ProfileSettings,
) -> FetchOutcome<HfwInstance> {
    let chain = load_profile_chain(source, &settings.entry_profile).await;
    let mut instance = match chain.into_result() {
        Ok(instance) => instance,
        Err(e) => return FetchOutcome::Failed(e),
    };

    let extensions = load_extensions(
        source,
        &settings.extensions,
        Duration::from_millis(settings.extension_timeout_ms),
    )
    .await;
    let missing = extensions.missing().to_vec();
    if let Some(documents) = extensions.value() {
        apply_extensions(&mut instance, documents);
    }

    let issues = validate(&instance);
    for issue in &issues {
        warn!("Layout description: {}", issue);
    }
    info!(
        "Layout description loaded: {} frames, {} modes, {} extensions skipped",
        instance.frames.len(),
        instance.modes.len(),
        missing.len()
    );

    if missing.is_empty() {
        FetchOutcome::Complete(instance)
    } else {
        FetchOutcome::Partial {
            value: instance,
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::test_utils::SAMPLE_PROFILE;

    struct Files(HashMap<&'static str, String>);

    impl ProfileSource for Files {
        async fn fetch(&self, file_name: &str) -> Result<Option<String>> {
            Ok(self.0.get(file_name).cloned())
        }
    }

    fn settings(extensions: &[&str]) -> ProfileSettings {
        ProfileSettings {
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_instance_applies_extensions() {
        let files = Files(HashMap::from([
            ("hfw-instance.json", SAMPLE_PROFILE.to_string()),
            (
                "reports.json",
                r#"{"frames": [{"id": "reports", "panes": [{"id": "p"}],
                   "layouts": [{"id": "1-pane", "paneInstances": [{"id": "p"}]}]}]}"#
                    .to_string(),
            ),
        ]));

        let outcome = load_instance(&files, &settings(&["reports.json"])).await;

        assert!(outcome.is_complete());
        let instance = outcome.into_result().unwrap();
        assert!(instance.frame("reports").is_some());
        assert_eq!(instance.frames.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_extension_is_partial() {
        let files = Files(HashMap::from([(
            "hfw-instance.json",
            SAMPLE_PROFILE.to_string(),
        )]));

        let outcome = load_instance(&files, &settings(&["absent.json"])).await;

        assert_eq!(outcome.missing(), ["absent.json"]);
        assert_eq!(outcome.value().unwrap().frames.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_entry_profile_fails() {
        let files = Files(HashMap::new());

        let outcome = load_instance(&files, &settings(&[])).await;

        assert!(matches!(outcome, FetchOutcome::Failed(_)));
    }
}
