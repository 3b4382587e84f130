// error.rs — Error types for the policy compiler.

use thiserror::Error;

/// Errors produced by the transformation and reconciliation core.
///
/// Every failure is returned to the immediate caller with its cause
/// preserved; nothing is retried here because every operation is a
/// deterministic function over already-loaded data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A generated or merged policy is structurally incomplete.
    /// Carries the path of the offending field.
    #[error("validation failed at {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A named expression template failed to parse, or a substitution
    /// referenced a placeholder with no corresponding value. This is an
    /// authoring bug in the template set, not a classification miss, so
    /// the generator does not fall back to the basic generator.
    #[error("template '{name}': {reason}")]
    Template { name: String, reason: String },

    /// A sub-step of the structural mapping failed. Carries the
    /// identifying plan/requirement context so callers can report which
    /// source record caused the failure.
    #[error("mapping failed for {context}: {source}")]
    Mapping {
        context: String,
        #[source]
        source: Box<CoreError>,
    },

    /// The merged policy failed validation. Distinct from `Mapping`
    /// because the cause is reconciliation logic, not generation.
    #[error("merged policy validation failed: {source}")]
    MergeValidation {
        #[source]
        source: Box<CoreError>,
    },
}

impl CoreError {
    /// Wrap a sub-step failure with plan/requirement context.
    pub(crate) fn mapping(context: impl Into<String>, source: CoreError) -> Self {
        CoreError::Mapping {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
