#![forbid(unsafe_code)]

//! Reference content renderer for leaf cells.
//!
//! Turns a positioned leaf into the pieces a page needs to draw it: a DOM
//! id, a link to the cluster, a document-count label, and, when the cell is
//! large enough, a preview of its first document.

use serde::Serialize;

use clustermap_core::geometry::{Rect, Sides};
use clustermap_layout::{Leaf, PositionedNode};
use clustermap_runtime::{DisplayCell, SessionConfig};

/// Cells wider or taller than this (after the gutter) get a preview.
pub const PREVIEW_MIN_EXTENT: f64 = 80.0;

/// Rendering options.
///
/// `gutter` only affects [`render_leaf`]; [`render_cell`] takes the inset
/// from the session that produced the cell. Use
/// [`for_session`](Self::for_session) to keep both paths in agreement.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOptions {
    /// Link prefix; a trailing `/` is added when missing.
    pub route_prefix: String,
    /// Trailing inset subtracted from the layout rect before size checks.
    pub gutter: f64,
    pub preview_min_extent: f64,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            route_prefix: "#/".to_string(),
            gutter: 1.0,
            preview_min_extent: PREVIEW_MIN_EXTENT,
        }
    }
}

impl ContentOptions {
    /// Defaults with the gutter of `config`.
    pub fn for_session(config: &SessionConfig) -> Self {
        Self::default().with_gutter(config.gutter)
    }

    #[must_use]
    pub fn with_route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_gutter(mut self, gutter: f64) -> Self {
        self.gutter = gutter;
        self
    }
}

/// Display content of one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellContent {
    pub element_id: String,
    pub href: String,
    pub label: String,
    pub preview: Option<String>,
}

/// Content for a settled leaf; `None` for internal nodes.
pub fn render_leaf(node: &PositionedNode, options: &ContentOptions) -> Option<CellContent> {
    let displayed = node.rect.inner(Sides::trailing(options.gutter));
    render(node, &displayed, options)
}

/// Content for a display cell, whose rect already has the gutter removed.
pub fn render_cell(cell: &DisplayCell, options: &ContentOptions) -> Option<CellContent> {
    render(&cell.node, &cell.rect, options)
}

fn render(node: &PositionedNode, displayed: &Rect, options: &ContentOptions) -> Option<CellContent> {
    let leaf = node.leaf()?;
    let index = node.leaf_index?;

    let mut href = options.route_prefix.clone();
    if !href.ends_with('/') {
        href.push('/');
    }
    href.push_str(&index.to_string());

    let roomy = displayed.width > options.preview_min_extent
        || displayed.height > options.preview_min_extent;
    let preview = roomy
        .then(|| leaf.payload.docs.first().map(|doc| doc.text.clone()))
        .flatten();

    Some(CellContent {
        element_id: format!("cluster-{index}"),
        href,
        label: format!("{} documents", document_count(leaf)),
        preview,
    })
}

/// Whole-number counts as given, otherwise the number of documents.
fn document_count(leaf: &Leaf) -> u64 {
    if leaf.count.is_finite() && leaf.count >= 0.0 && leaf.count.fract() == 0.0 {
        leaf.count as u64
    } else {
        leaf.payload.docs.len() as u64
    }
}
