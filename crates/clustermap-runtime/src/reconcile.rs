#![forbid(unsafe_code)]

//! Keyed reconciliation of positioned node sequences.
//!
//! Given the sequence that is currently on screen and a freshly computed
//! one, [`reconcile`] classifies every key into exactly one of three groups:
//!
//! | previous | next | group      |
//! |----------|------|------------|
//! | -        | yes  | `entering` |
//! | yes      | yes  | `updating` |
//! | yes      | -    | `exiting`  |
//!
//! Matching is by [`NodeKey`] only; geometry, weight and position in the
//! sequence are free to change. Entering and updating nodes follow `next`
//! order, exiting nodes follow `previous` order.

use std::fmt;

use clustermap_layout::{NodeKey, PositionedNode};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// Which input sequence an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Previous,
    Next,
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Previous => "previous",
            Self::Next => "next",
        })
    }
}

/// Reconciliation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The same key occurs twice within one sequence.
    #[error("duplicate key `{key}` in {sequence} sequence")]
    DuplicateIdentity { key: NodeKey, sequence: Sequence },
}

/// A node present on both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub old: PositionedNode,
    pub new: PositionedNode,
}

impl Update {
    pub fn key(&self) -> &NodeKey {
        &self.new.key
    }

    /// Whether the rectangle moved or resized.
    pub fn is_moved(&self) -> bool {
        self.old.rect != self.new.rect
    }
}

/// The enter/update/exit partition of two sequences.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderSet {
    pub entering: Vec<PositionedNode>,
    pub updating: Vec<Update>,
    /// Last known state of nodes that disappeared.
    pub exiting: Vec<PositionedNode>,
}

impl RenderSet {
    /// Total number of keys across all three groups.
    pub fn len(&self) -> usize {
        self.entering.len() + self.updating.len() + self.exiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether applying this set changes nothing on screen.
    pub fn is_unchanged(&self) -> bool {
        self.entering.is_empty()
            && self.exiting.is_empty()
            && self.updating.iter().all(|u| !u.is_moved())
    }

    /// Every key in the set, entering and updating first.
    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.entering
            .iter()
            .map(|n| &n.key)
            .chain(self.updating.iter().map(Update::key))
            .chain(self.exiting.iter().map(|n| &n.key))
    }
}

/// Diff `previous` against `next` by key.
///
/// Runs in O(n) using a hash table built from `previous`. A key repeated
/// within either side is an error; nothing is merged.
pub fn reconcile(
    previous: &[PositionedNode],
    next: &[PositionedNode],
) -> Result<RenderSet, ReconcileError> {
    let _span = tracing::debug_span!(
        "reconcile",
        previous = previous.len(),
        next = next.len()
    )
    .entered();

    let mut by_key: FxHashMap<&NodeKey, &PositionedNode> =
        FxHashMap::with_capacity_and_hasher(previous.len(), Default::default());
    for node in previous {
        if by_key.insert(&node.key, node).is_some() {
            return Err(ReconcileError::DuplicateIdentity {
                key: node.key.clone(),
                sequence: Sequence::Previous,
            });
        }
    }

    let mut set = RenderSet::default();
    let mut seen: FxHashSet<&NodeKey> =
        FxHashSet::with_capacity_and_hasher(next.len(), Default::default());
    for node in next {
        if !seen.insert(&node.key) {
            return Err(ReconcileError::DuplicateIdentity {
                key: node.key.clone(),
                sequence: Sequence::Next,
            });
        }
        match by_key.get(&node.key) {
            Some(old) => set.updating.push(Update {
                old: (*old).clone(),
                new: node.clone(),
            }),
            None => set.entering.push(node.clone()),
        }
    }

    set.exiting = previous
        .iter()
        .filter(|node| !seen.contains(&node.key))
        .cloned()
        .collect();

    tracing::debug!(
        entering = set.entering.len(),
        updating = set.updating.len(),
        exiting = set.exiting.len(),
        "reconcile complete"
    );
    Ok(set)
}
