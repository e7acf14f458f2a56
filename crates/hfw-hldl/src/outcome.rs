//! Uniform result type for best-effort fetches

use hfw_core::{Error, Result};

/// Outcome of a fetch that may complete only partially.
///
/// Profile chains and extension lists report through this one type so callers
/// decide explicitly how to treat partial data.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// Everything requested arrived
    Complete(T),
    /// Some parts were missing or the deadline expired
    Partial { value: T, missing: Vec<String> },
    /// Nothing usable arrived
    Failed(Error),
}

impl<T> FetchOutcome<T> {
    pub fn is_complete(&self) -> bool {
        matches!(self, FetchOutcome::Complete(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FetchOutcome::Complete(value) | FetchOutcome::Partial { value, .. } => Some(value),
            FetchOutcome::Failed(_) => None,
        }
    }

    /// Names of the parts that did not arrive.
    pub fn missing(&self) -> &[String] {
        match self {
            FetchOutcome::Partial { missing, .. } => missing,
            _ => &[],
        }
    }

    /// Partial data counts as success.
    pub fn into_result(self) -> Result<T> {
        match self {
            FetchOutcome::Complete(value) | FetchOutcome::Partial { value, .. } => Ok(value),
            FetchOutcome::Failed(err) => Err(err),
        }
    }
}
