//! Error types for wizard navigation
//!
//! Validation failures are never errors; they live in
//! [`crate::ValidationResult`]. These errors only cover navigation requests
//! the wizard refuses.

/// Wizard navigation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    /// Advancing past a step that has not passed validation
    #[error("step '{0}' has not passed validation")]
    StepNotValid(String),

    /// Requested step index does not exist
    #[error("step index {index} out of range (steps: {len})")]
    OutOfRange {
        /// Requested index
        index: usize,
        /// Number of steps
        len: usize,
    },

    /// Step name not part of this wizard
    #[error("unknown step: {0}")]
    UnknownStep(String),
}
