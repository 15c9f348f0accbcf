#![forbid(unsafe_code)]

//! Layout error types.

use thiserror::Error;

use crate::tree::{NodeId, NodeKey};

/// Conditions that abort a layout pass.
///
/// A failed pass produces no partial output: a bad leaf anywhere in the tree
/// fails the whole layout rather than being counted as zero.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A leaf weight was negative, NaN or infinite, or sibling weights summed
    /// past `f64::MAX`.
    #[error("invalid weight {value} for node `{key}`")]
    InvalidWeight { key: NodeKey, value: f64 },

    /// Two siblings share the same id.
    #[error("duplicate child id `{id}` under `{parent}`")]
    DuplicateIdentity { parent: NodeKey, id: NodeId },

    /// The canvas has a negative or non-finite extent.
    #[error("invalid canvas {width}x{height}")]
    InvalidCanvas { width: f64, height: f64 },

    /// The input document could not be decoded into a tree.
    #[error("malformed tree input: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for LayoutError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
