#![forbid(unsafe_code)]

//! Input tree model.
//!
//! A [`TreeNode`] is either a [`Leaf`] (a cluster carrying its document
//! count and documents) or an [`Internal`] node whose weight is derived from
//! its children. Children are held behind [`Arc`] so positioned nodes can
//! point back at their source without copying subtrees.
//!
//! # Identity
//!
//! Ids only need to be unique among siblings. The globally unique
//! [`NodeKey`] is the escaped path of ids from the root, so the same logical
//! node keeps its key across layouts even when its geometry changes.
//!
//! # JSON input
//!
//! ```text
//! { "id"?: string|number, "count"?: number,
//!   "children"|"clusters"?: [ ... ], "docs"?: [ { "text": "...", ... } ] }
//! ```
//!
//! Absent or empty children make a leaf. A missing id falls back to the
//! sibling index, prefixed with `#` while that would clash with an explicit
//! sibling id (`[{"id": "1"}, {}]` yields ids `1` and `#1`). A leaf without
//! `count` weighs as many documents as it has.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LayoutError;

/// Sibling-unique node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Globally unique, layout-stable node identity.
///
/// Built as `root/child/grandchild` from escaped ids (`%` → `%25`,
/// `/` → `%2F`), so distinct paths never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(Arc<str>);

impl NodeKey {
    /// Key of a root node.
    pub fn root(id: &NodeId) -> Self {
        Self(Arc::from(escape(id.as_str())))
    }

    /// Key of the child `id` under this key.
    pub fn child(&self, id: &NodeId) -> Self {
        let mut path = String::with_capacity(self.0.len() + id.as_str().len() + 1);
        path.push_str(&self.0);
        path.push('/');
        path.push_str(&escape(id.as_str()));
        Self(Arc::from(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of path segments below the root.
    pub fn depth(&self) -> usize {
        self.0.bytes().filter(|&b| b == b'/').count()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape(id: &str) -> String {
    if !id.contains(['%', '/']) {
        return id.to_string();
    }
    let mut out = String::with_capacity(id.len() + 4);
    for ch in id.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            _ => out.push(ch),
        }
    }
    out
}

/// A document inside a cluster.
///
/// Only `text` is interpreted; any other fields are kept verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Opaque per-leaf data consumed by content renderers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload {
    pub docs: Vec<Document>,
}

/// A cluster of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub id: NodeId,
    /// Document count used as the proportional weight. NaN marks a count
    /// that was present but not numeric.
    pub count: f64,
    pub payload: Payload,
}

/// A container whose weight is the sum of its descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct Internal {
    pub id: NodeId,
    pub children: Vec<Arc<TreeNode>>,
}

/// A node of the input hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Leaf(Leaf),
    /// An internal node with no children is laid out as a zero-weight
    /// container; it stays non-leaf.
    Internal(Internal),
}

impl TreeNode {
    /// A leaf with an explicit document count and no documents.
    pub fn leaf(id: impl Into<NodeId>, count: f64) -> Self {
        Self::Leaf(Leaf {
            id: id.into(),
            count,
            payload: Payload::default(),
        })
    }

    /// A leaf whose count is the number of documents.
    pub fn leaf_with_docs(id: impl Into<NodeId>, docs: Vec<Document>) -> Self {
        Self::Leaf(Leaf {
            id: id.into(),
            count: docs.len() as f64,
            payload: Payload { docs },
        })
    }

    /// An internal node owning `children` in sibling order.
    pub fn internal(id: impl Into<NodeId>, children: impl IntoIterator<Item = TreeNode>) -> Self {
        Self::Internal(Internal {
            id: id.into(),
            children: children.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn id(&self) -> &NodeId {
        match self {
            Self::Leaf(leaf) => &leaf.id,
            Self::Internal(node) => &node.id,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Internal(_) => None,
        }
    }

    /// Direct children; empty for leaves.
    pub fn children(&self) -> &[Arc<TreeNode>] {
        match self {
            Self::Leaf(_) => &[],
            Self::Internal(node) => &node.children,
        }
    }

    /// Total number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|child| child.node_count())
            .sum::<usize>()
    }

    /// Parse a JSON document. `null` is the empty tree.
    pub fn from_json(input: &str) -> Result<Option<TreeNode>, LayoutError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Convert an already-decoded JSON value. `null` is the empty tree.
    pub fn from_value(value: Value) -> Result<Option<TreeNode>, LayoutError> {
        if value.is_null() {
            return Ok(None);
        }
        let raw: RawNode = serde_json::from_value(value)?;
        raw.into_node(NodeId::new("root")).map(Some)
    }
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    count: Option<Value>,
    #[serde(default, alias = "clusters")]
    children: Option<Vec<RawNode>>,
    #[serde(default)]
    docs: Vec<Document>,
}

impl RawNode {
    fn explicit_id(&self) -> Result<Option<NodeId>, LayoutError> {
        match &self.id {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(NodeId::new(s.clone()))),
            Some(Value::Number(n)) => Ok(Some(NodeId::new(n.to_string()))),
            Some(other) => Err(LayoutError::Parse(format!(
                "node id must be a string or number, got {other}"
            ))),
        }
    }

    fn into_node(self, fallback_id: NodeId) -> Result<TreeNode, LayoutError> {
        let id = self.explicit_id()?.unwrap_or(fallback_id);

        match self.children {
            Some(children) if !children.is_empty() => {
                let explicit = children
                    .iter()
                    .filter_map(|child| child.explicit_id().transpose())
                    .collect::<Result<FxHashSet<_>, _>>()?;
                let children = children
                    .into_iter()
                    .enumerate()
                    .map(|(i, child)| child.into_node(index_id(i, &explicit)).map(Arc::new))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TreeNode::Internal(Internal { id, children }))
            }
            _ => {
                let count = match self.count {
                    None | Some(Value::Null) => self.docs.len() as f64,
                    Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
                    Some(_other) => {
                        clustermap_core::debug!(id = %id, count = %_other, "non-numeric count");
                        f64::NAN
                    }
                };
                Ok(TreeNode::Leaf(Leaf {
                    id,
                    count,
                    payload: Payload { docs: self.docs },
                }))
            }
        }
    }
}

/// Sibling index as an id, avoiding the explicit ids of its siblings.
fn index_id(index: usize, explicit: &FxHashSet<NodeId>) -> NodeId {
    let mut id = index.to_string();
    while explicit.contains(&NodeId::new(id.as_str())) {
        id.insert(0, '#');
    }
    NodeId::new(id)
}
