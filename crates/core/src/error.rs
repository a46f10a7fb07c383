use thiserror::Error;

/// Caller-facing misuse of the field API.
///
/// Malformed field *content* never produces one of these; it is reported as
/// parse diagnostics instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// A tag or structured record names a different field than the spec.
    #[error("tag {found} does not match field {expected}")]
    TagMismatch {
        /// Field name declared by the spec.
        expected: String,
        /// Name carried by the tag.
        found: String,
    },

    /// A component index outside `1..=component_count`.
    #[error("component {index} out of range for field {field} (1..={count})")]
    IndexOutOfRange {
        /// Field name.
        field: String,
        /// Requested 1-based index.
        index: usize,
        /// Number of components.
        count: usize,
    },

    /// No spec with this name in the tables.
    #[error("unknown field {0}")]
    UnknownField(String),

    /// The spec names a parse hook that is not registered.
    #[error("field {field} needs parse hook '{hook}', which is not registered")]
    UnknownHook {
        /// Field name.
        field: String,
        /// Hook name from the strategy.
        hook: String,
    },

    /// No component has this label, key, or alias.
    #[error("field {field} has no component labelled '{label}'")]
    UnknownLabel {
        /// Field name.
        field: String,
        /// The label that was looked up.
        label: String,
    },
}
