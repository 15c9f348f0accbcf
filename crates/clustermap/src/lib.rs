#![forbid(unsafe_code)]

//! Clustermap public facade crate.
//!
//! Re-exports the layout engine, the reconciliation and transition runtime,
//! and the geometry primitives behind one surface, plus a reference content
//! renderer for leaf cells.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use clustermap::prelude::*;
//!
//! let tree = clustermap::parse_tree(r#"{"clusters": [
//!     {"id": "a", "count": 3}, {"id": "b", "count": 1}
//! ]}"#)?;
//!
//! let mut session = DrawSession::new(SessionConfig::default())?;
//! let set = session.draw(tree)?;
//! assert_eq!(set.entering.len(), 3);
//!
//! let frames = session.run(&mut FixedTicks::new(Duration::from_millis(100)), |_| {});
//! assert_eq!(frames, 15);
//! # Ok::<(), clustermap::Error>(())
//! ```

use std::sync::Arc;

pub mod content;

// --- Core re-exports -------------------------------------------------------

pub use clustermap_core::animation::{EasingFn, easing_by_name};
pub use clustermap_core::geometry::{Rect, Sides, Size};

// --- Layout re-exports -----------------------------------------------------

pub use clustermap_layout::{
    Document, Flat, LayoutError, LayoutStats, NodeId, NodeKey, PositionedNode, Proportional,
    Rounding, SplitRule, TreeNode, Treemap, WeightAccessor, WeightMode,
};

// --- Runtime re-exports ----------------------------------------------------

pub use clustermap_runtime::{
    Category, ConfigError, DisplayCell, DrawSession, FixedTicks, IntervalTicks, NodeState,
    ReconcileError, RenderSet, SessionConfig, SessionError, TickSource, TransitionFrame,
    TransitionScheduler, reconcile,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for clustermap.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Standard result type for clustermap APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Parse a JSON cluster tree, ready for [`DrawSession::draw`].
///
/// `null` is the empty tree.
pub fn parse_tree(json: &str) -> Result<Option<Arc<TreeNode>>> {
    Ok(TreeNode::from_json(json)?.map(Arc::new))
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::content::{CellContent, ContentOptions, render_cell, render_leaf};
    pub use crate::{
        Category, DisplayCell, DrawSession, Error, FixedTicks, IntervalTicks, NodeState,
        PositionedNode, Rect, RenderSet, Result, SessionConfig, Size, TickSource, TreeNode,
        WeightMode,
    };

    pub use crate::{core, layout, runtime};
}

pub use clustermap_core as core;
pub use clustermap_layout as layout;
pub use clustermap_runtime as runtime;
