//! Error types for list actions
//!
//! Loading never fails with an error value: its outcome is a
//! [`crate::LoadOutcome`]. These errors cover actions the controller could
//! not run or whose backend call was rejected.

use portal_core::RequestError;

/// List action errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListError {
    /// No action registered under this name
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// Row not present in the loaded items
    #[error("no row with id '{0}'")]
    UnknownEntity(String),

    /// Bulk action with nothing selected
    #[error("no rows selected")]
    EmptySelection,

    /// Controller already disposed
    #[error("list controller disposed")]
    Disposed,

    /// Backend rejected the action
    #[error("action failed: {0}")]
    Request(#[from] RequestError),
}
