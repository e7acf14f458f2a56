//! Profile chain loading and extension merging
//!
//! A profile names its parent through `parentProfile`; the chain ends at a file
//! declaring `isBaseInstance`. The chain is merged base first, so the entry
//! profile wins on conflicting ids. Extension documents are applied on top of
//! the merged instance.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use hfw_core::prelude::*;

use crate::model::{
    FrameDescription, HfwInstance, ProfileDocument, SnapInReference, SnapInTypeDescription,
};
use crate::outcome::FetchOutcome;

/// Source of profile and extension files (usually an HTTP reader).
#[trait_variant::make(ProfileSource: Send)]
pub trait LocalProfileSource {
    /// Fetch a file by name. `Ok(None)` means the file does not exist.
    async fn fetch(&self, file_name: &str) -> Result<Option<String>>;
}

/// An extension document contributing frames and snap-ins to a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionDocument {
    #[serde(skip)]
    pub file_name: String,

    #[serde(default)]
    pub frames: Vec<FrameDescription>,

    #[serde(default)]
    pub snap_in_types: Vec<SnapInTypeDescription>,

    #[serde(default)]
    pub pane_extensions: Vec<PaneExtension>,
}

/// Snap-ins added to a pane declared elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneExtension {
    pub frame_id: String,
    pub pane_id: String,
    #[serde(default)]
    pub snap_in_references: Vec<SnapInReference>,
}

/// Load `entry` and every ancestor profile, then merge them.
///
/// Fails on transport errors, missing files, malformed JSON and on a chain
/// that revisits a file.
pub async fn load_profile_chain<S: ProfileSource>(
    source: &S,
    entry: &str,
) -> FetchOutcome<HfwInstance> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(entry.to_string());

    while let Some(file_name) = next.take() {
        if !visited.insert(file_name.clone()) {
            warn!("Profile chain revisits {}", file_name);
            return FetchOutcome::Failed(Error::profile(format!(
                "cyclic parentProfile chain at {file_name}"
            )));
        }

        let fetched = source
            .fetch(&file_name)
            .await
            .with_context(|| format!("Failed to fetch profile {file_name}"));
        let content = match fetched {
            Ok(Some(content)) => content,
            Ok(None) => {
                warn!("Profile {} not found", file_name);
                return FetchOutcome::Failed(Error::profile(format!(
                    "profile {file_name} not found"
                )));
            }
            Err(e) => return FetchOutcome::Failed(e),
        };

        let parsed = ProfileDocument::parse(&content)
            .with_context(|| format!("Failed to parse profile {file_name}"));
        let instance = match parsed {
            Ok(doc) => doc.hfw_instance,
            Err(e) => return FetchOutcome::Failed(e),
        };

        debug!(
            "Loaded profile {} (base: {})",
            file_name, instance.is_base_instance
        );

        if !instance.is_base_instance {
            match &instance.parent_profile {
                Some(parent) => next = Some(parent.clone()),
                None => {
                    return FetchOutcome::Failed(Error::profile(format!(
                        "profile {file_name} is neither a base instance nor names a parent"
                    )))
                }
            }
        }
        chain.push(instance);
    }

    let merged = chain
        .into_iter()
        .rev()
        .reduce(merge_instances)
        .unwrap_or_default();
    FetchOutcome::Complete(merged)
}

/// Merge `child` over `base`: entries are replaced by id, new ids appended.
pub fn merge_instances(mut base: HfwInstance, child: HfwInstance) -> HfwInstance {
    for frame in child.frames {
        match base.frames.iter_mut().find(|f| f.id == frame.id) {
            Some(existing) => merge_frame(existing, frame),
            None => base.frames.push(frame),
        }
    }
    for mode in child.modes {
        upsert(&mut base.modes, mode, |m| m.id.clone());
    }
    for snap_in_type in child.snap_in_types {
        upsert(&mut base.snap_in_types, snap_in_type, |t| t.type_id.clone());
    }
    base.is_base_instance = true;
    base.parent_profile = None;
    base
}

fn merge_frame(existing: &mut FrameDescription, frame: FrameDescription) {
    existing.docked = frame.docked;
    existing.is_default = frame.is_default;
    if frame.q_param_service.is_some() {
        existing.q_param_service = frame.q_param_service;
    }
    if frame.primary_channel.is_some() {
        existing.primary_channel = frame.primary_channel;
    }
    for pane in frame.panes {
        upsert(&mut existing.panes, pane, |p| p.id.clone());
    }
    for layout in frame.layouts {
        upsert(&mut existing.layouts, layout, |l| l.id.clone());
    }
    for view in frame.views {
        upsert(&mut existing.views, view, |v| v.id.clone());
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> String) {
    let id = key(&item);
    match items.iter_mut().find(|existing| key(existing) == id) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

/// Read extension documents one after another under a single deadline.
///
/// Missing or unreadable files are logged and reported as missing. When the
/// deadline expires the documents read so far are returned as partial data.
pub async fn load_extensions<S: ProfileSource>(
    source: &S,
    file_names: &[String],
    deadline: Duration,
) -> FetchOutcome<Vec<ExtensionDocument>> {
    let deadline = Instant::now() + deadline;
    let mut documents = Vec::new();
    let mut missing = Vec::new();

    for (index, file_name) in file_names.iter().enumerate() {
        match tokio::time::timeout_at(deadline, source.fetch(file_name)).await {
            Err(_) => {
                warn!(
                    "{}, {} of {} read",
                    Error::timeout("reading extensions"),
                    documents.len(),
                    file_names.len()
                );
                missing.extend(file_names[index..].iter().cloned());
                break;
            }
            Ok(Ok(Some(content))) => match serde_json::from_str::<ExtensionDocument>(&content) {
                Ok(mut doc) => {
                    doc.file_name = file_name.clone();
                    documents.push(doc);
                }
                Err(e) => {
                    error!("Failed to parse extension {}: {}", file_name, e);
                    missing.push(file_name.clone());
                }
            },
            Ok(Ok(None)) => {
                warn!("Extension {} not found", file_name);
                missing.push(file_name.clone());
            }
            Ok(Err(e)) => {
                error!("Failed to fetch extension {}: {}", file_name, e);
                missing.push(file_name.clone());
            }
        }
    }

    if missing.is_empty() {
        FetchOutcome::Complete(documents)
    } else {
        FetchOutcome::Partial {
            value: documents,
            missing,
        }
    }
}

/// Apply extension documents to a merged instance, in order.
pub fn apply_extensions(instance: &mut HfwInstance, documents: &[ExtensionDocument]) {
    for doc in documents {
        for frame in &doc.frames {
            if instance.frame(&frame.id).is_some() {
                warn!(
                    "Extension {} redefines frame {}, ignored",
                    doc.file_name, frame.id
                );
                continue;
            }
            instance.frames.push(frame.clone());
        }

        for snap_in_type in &doc.snap_in_types {
            upsert(&mut instance.snap_in_types, snap_in_type.clone(), |t| {
                t.type_id.clone()
            });
        }

        for extension in &doc.pane_extensions {
            let pane = instance
                .frames
                .iter_mut()
                .find(|f| f.id == extension.frame_id)
                .and_then(|f| f.panes.iter_mut().find(|p| p.id == extension.pane_id));

            let Some(pane) = pane else {
                warn!(
                    "Extension {} targets unknown pane {}.{}",
                    doc.file_name, extension.frame_id, extension.pane_id
                );
                continue;
            };

            for reference in &extension.snap_in_references {
                if pane.snap_in_references.iter().any(|r| r.id == reference.id) {
                    continue;
                }
                pane.snap_in_references.push(reference.clone());
            }
        }
    }
}
