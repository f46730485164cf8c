//! Store error types.

use thiserror::Error;

use crate::form::DecodeError;
use crate::store::config_store::StorePhase;
use crate::tree::TreeError;

/// Errors returned to collaborators of the store.
///
/// Storage and restart failures never appear here; they are reported
/// through the notifier and the store keeps running.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot {operation} while the store is {phase}")]
    Phase {
        operation: &'static str,
        phase: StorePhase,
    },

    #[error("section '{0}' does not exist")]
    UnknownSection(String),

    #[error("'{0}' is a single value, not a section")]
    NotASection(String),

    #[error("'{0}' is not editable")]
    NotEditable(String),

    #[error("field '{path}' is outside section '{section}'")]
    FieldOutsideSection { section: String, path: String },

    #[error("a save is already in progress")]
    SaveInProgress,

    #[error("invalid edit: {0}")]
    Decode(#[from] DecodeError),

    #[error("cannot apply edit: {0}")]
    Tree(#[from] TreeError),
}
