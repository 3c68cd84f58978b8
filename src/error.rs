//! Error types for region analysis.

use thiserror::Error;

/// Which side of a subunit/superunit pairing an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionRole {
    Subunits,
    Superunits,
}

impl std::fmt::Display for CollectionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionRole::Subunits => write!(f, "subunit"),
            CollectionRole::Superunits => write!(f, "superunit"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompactnessError {
    /// A region lacks the attribute used to join subunits to superunits.
    #[error("{collection} {index} is missing the joining attribute '{key}'")]
    MissingJoinAttribute {
        collection: CollectionRole,
        index: usize,
        key: String,
    },

    /// A region lacks an attribute a writer keys its output by.
    #[error("region {index} is missing the attribute '{key}'")]
    MissingAttribute { index: usize, key: String },

    /// Two superunits carry the same join value.
    #[error("more than one superunit has {key}='{value}'")]
    DuplicateJoinKey { key: String, value: String },

    #[error("{0} collection is empty")]
    EmptyCollection(CollectionRole),

    /// A relationship link points outside its collection.
    #[error("{collection} index {index} is out of range")]
    UnknownRegion {
        collection: CollectionRole,
        index: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CompactnessError {
    fn from(err: serde_json::Error) -> Self {
        CompactnessError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CompactnessError>;
