/// Convenience result type used across varimotion.
pub type MotionResult<T> = Result<T, MotionError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Only ingestion (`Validation`, `Serde`) is fatal. The lookup variants are produced while
/// handling a switch request and are reported back as a rejected outcome instead of being
/// propagated, so one malformed group never blocks the rest of the document.
#[derive(thiserror::Error, Debug)]
pub enum MotionError {
    /// Invalid document data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// A switch or binding referenced a group id that was never discovered.
    #[error("variant group not found: '{0}'")]
    GroupNotFound(String),

    /// A switch or binding referenced a variant that is not a member of its group.
    #[error("variant '{variant}' not found in group '{group}'")]
    VariantNotFound {
        /// Group the lookup was scoped to.
        group: String,
        /// Requested variant id or name.
        variant: String,
    },

    /// A switch was requested before the engine finished initialization.
    #[error("no active variant for group '{0}'")]
    NoActiveVariant(String),

    /// Several incoming elements shared a correspondence key; the first one was used.
    #[error("ambiguous correspondence for '{key}' ({candidates} candidates)")]
    AmbiguousCorrespondence {
        /// The `(name, type)` key rendered as text.
        key: String,
        /// Number of incoming candidates sharing the key.
        candidates: usize,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MotionError {
    /// Build a [`MotionError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MotionError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`MotionError::GroupNotFound`] value.
    pub fn group_not_found(group: impl Into<String>) -> Self {
        Self::GroupNotFound(group.into())
    }

    /// Build a [`MotionError::VariantNotFound`] value.
    pub fn variant_not_found(group: impl Into<String>, variant: impl Into<String>) -> Self {
        Self::VariantNotFound {
            group: group.into(),
            variant: variant.into(),
        }
    }

    /// Whether the error came from a runtime lookup (never fatal to the engine).
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound(_) | Self::VariantNotFound { .. } | Self::NoActiveVariant(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
