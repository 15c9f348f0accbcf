#![forbid(unsafe_code)]

//! Leaf weight accessors.
//!
//! The layout engine asks a [`WeightAccessor`] for the weight of every leaf
//! and sums internal nodes itself. Validation happens here, at the accessor
//! boundary: a negative or non-finite weight is an
//! [`LayoutError::InvalidWeight`], never a silently clamped value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::tree::{Leaf, NodeKey};

/// Maps a leaf to its raw weight.
pub trait WeightAccessor {
    /// Raw weight of `leaf`. Checked by [`checked_weight`] before use.
    fn weight(&self, leaf: &Leaf) -> f64;
}

/// Every leaf weighs 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flat;

impl WeightAccessor for Flat {
    fn weight(&self, _leaf: &Leaf) -> f64 {
        1.0
    }
}

/// A leaf weighs its document count.
#[derive(Debug, Clone, Copy, Default)]
pub struct Proportional;

impl WeightAccessor for Proportional {
    fn weight(&self, leaf: &Leaf) -> f64 {
        leaf.count
    }
}

impl<F> WeightAccessor for F
where
    F: Fn(&Leaf) -> f64,
{
    fn weight(&self, leaf: &Leaf) -> f64 {
        self(leaf)
    }
}

/// Fetch and validate the weight of `leaf` at `key`.
pub fn checked_weight(
    accessor: &dyn WeightAccessor,
    leaf: &Leaf,
    key: &NodeKey,
) -> Result<f64, LayoutError> {
    let value = accessor.weight(leaf);
    if value.is_finite() && value >= 0.0 {
        // Normalize -0.0 so sums and comparisons stay clean.
        Ok(value + 0.0)
    } else {
        Err(LayoutError::InvalidWeight {
            key: key.clone(),
            value,
        })
    }
}

/// The two built-in weighting modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMode {
    /// Every leaf weighs 1.
    Flat,
    /// Leaves weigh their document count.
    #[default]
    Proportional,
}

impl WeightMode {
    /// The accessor implementing this mode.
    pub fn accessor(self) -> &'static dyn WeightAccessor {
        match self {
            Self::Flat => &Flat,
            Self::Proportional => &Proportional,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Proportional => "proportional",
        }
    }
}

impl fmt::Display for WeightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown weight mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown weight mode `{0}` (expected `flat` or `proportional`)")]
pub struct ParseWeightModeError(pub String);

impl FromStr for WeightMode {
    type Err = ParseWeightModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "proportional" => Ok(Self::Proportional),
            _ => Err(ParseWeightModeError(s.to_string())),
        }
    }
}
