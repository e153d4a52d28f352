use thiserror::Error;

use crate::types::{AtomIdx, BondIdx};

/// Errors surfaced across the toolkit boundary.
///
/// Every variant is cloneable and comparable so callers can degrade on a
/// specific failure and tests can assert on it directly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolkitError {
    #[error("parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("cannot kekulize aromatic system: unmatched atoms {atoms:?}")]
    Kekulize { atoms: Vec<AtomIdx> },

    #[error("atom index {0} out of range")]
    AtomOutOfRange(AtomIdx),

    #[error("bond index {0} out of range")]
    BondOutOfRange(BondIdx),

    #[error("invalid fingerprint length {0}; expected >= 1")]
    InvalidLength(usize),

    #[error("substructure serialization failed: {0}")]
    Serialization(String),
}

impl ToolkitError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        ToolkitError::Parse {
            position,
            message: message.into(),
        }
    }
}
