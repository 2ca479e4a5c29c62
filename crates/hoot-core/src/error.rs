use hoot_ai::ClassifierError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors surfaced by focus engine operations
#[derive(Debug, Error)]
pub enum FocusError {
    /// Caller supplied an empty goal, a non-positive duration or a bad timestamp
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The persistent store could not be read or written
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A classification for the same content is already in flight on this observer
    #[error("classification already pending for content {0}")]
    NavigationRaceCondition(String),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

impl FocusError {
    pub(crate) fn storage(err: &anyhow::Error) -> Self {
        Self::StorageUnavailable(format!("{err:#}"))
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::NavigationRaceCondition(_) => ErrorKind::NavigationRaceCondition,
            Self::Classifier(_) => ErrorKind::ClassifierUnavailable,
        }
    }
}

/// Wire-friendly error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    StorageUnavailable,
    NavigationRaceCondition,
    ClassifierUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidInput => "InvalidInput",
            Self::StorageUnavailable => "StorageUnavailable",
            Self::NavigationRaceCondition => "NavigationRaceCondition",
            Self::ClassifierUnavailable => "ClassifierUnavailable",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            FocusError::InvalidInput("goal".to_string()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            FocusError::from(ClassifierError::MissingApiKey).kind(),
            ErrorKind::ClassifierUnavailable
        );
    }

    #[test]
    fn test_storage_error_keeps_context() {
        let err = anyhow::anyhow!("disk full").context("saving session");
        let focus = FocusError::storage(&err);
        assert_eq!(
            focus.to_string(),
            "storage unavailable: saving session: disk full"
        );
    }
}
