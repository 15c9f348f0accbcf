#![forbid(unsafe_code)]

//! Slice-and-dice treemap layout.
//!
//! This crate turns a weighted [`TreeNode`] hierarchy into a flat, pre-ordered
//! list of [`PositionedNode`]s whose rectangles partition the canvas:
//!
//! - [`Treemap`] - the layout engine (split rule, rounding mode, canvas)
//! - [`WeightAccessor`] - pluggable leaf weights ([`Flat`], [`Proportional`])
//! - [`round_layout_stable`] - largest-remainder rounding of a row of cells
//!
//! # Algorithm
//!
//! 1. Weigh: leaves are weighed through the accessor, internal nodes sum
//!    their children. Any invalid leaf fails the whole pass.
//! 2. Order: children are sorted by descending weight; ties keep sibling
//!    order (stable sort), so layouts are reproducible.
//! 3. Partition: each internal rectangle is cut along one axis into slices
//!    proportional to child weight; the other extent is inherited.
//!    [`SplitRule::LongestSide`] cuts across the longer side (width wins
//!    ties); [`SplitRule::AlternateByDepth`] cuts along x at even depths and
//!    along y at odd depths.
//! 4. Round (optional): with [`Rounding::Integer`] the canvas is rounded to
//!    whole units and every row is distributed with [`round_layout_stable`],
//!    so slices abut exactly and the row ends exactly on the parent edge.
//!
//! # Invariants
//!
//! 1. The root rectangle equals the canvas.
//! 2. Children tile their parent: no gaps, no overlaps.
//! 3. Zero-weight nodes keep a degenerate rectangle and are never dropped.
//! 4. Same tree + same accessor → identical output.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use clustermap_layout::{Proportional, Size, TreeNode, Treemap};
//!
//! let tree = Arc::new(TreeNode::internal(
//!     "root",
//!     [TreeNode::leaf("a", 3.0), TreeNode::leaf("b", 1.0)],
//! ));
//! let nodes = Treemap::new(Size::new(100.0, 100.0))
//!     .layout(Some(&tree), &Proportional)
//!     .unwrap();
//!
//! assert_eq!(nodes.len(), 3);
//! assert_eq!(nodes[1].rect.width, 75.0);
//! assert_eq!(nodes[2].rect.width, 25.0);
//! ```

pub mod error;
pub mod tree;
pub mod weight;

use std::sync::Arc;

use rustc_hash::FxHashSet;

pub use clustermap_core::geometry::{Rect, Sides, Size};
pub use error::LayoutError;
pub use tree::{Document, Internal, Leaf, NodeId, NodeKey, Payload, TreeNode};
pub use weight::{Flat, ParseWeightModeError, Proportional, WeightAccessor, WeightMode};

/// Which axis a parent rectangle is cut along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Children sit side by side, left to right.
    Horizontal,
    /// Children stack top to bottom.
    Vertical,
}

/// Rule choosing the cut axis for each internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SplitRule {
    /// Cut across the longer side of the parent rectangle.
    #[default]
    LongestSide,
    /// Horizontal at even depths, vertical at odd depths.
    AlternateByDepth,
}

impl SplitRule {
    /// Axis used to partition `rect` at `depth`.
    pub fn axis(self, rect: &Rect, depth: usize) -> Axis {
        match self {
            Self::LongestSide if rect.width >= rect.height => Axis::Horizontal,
            Self::LongestSide => Axis::Vertical,
            Self::AlternateByDepth if depth % 2 == 0 => Axis::Horizontal,
            Self::AlternateByDepth => Axis::Vertical,
        }
    }
}

/// Rectangle edge rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rounding {
    /// Whole units; rows are distributed by largest remainder.
    #[default]
    Integer,
    /// Exact proportional geometry.
    Continuous,
}

/// A laid-out node.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    /// Stable identity, derived from the id path.
    pub key: NodeKey,
    /// Key of the parent; `None` for the root.
    pub parent: Option<NodeKey>,
    pub rect: Rect,
    /// Root is depth 0.
    pub depth: usize,
    pub is_leaf: bool,
    /// Effective weight (leaf weight or sum of descendants).
    pub weight: f64,
    /// Position in the pre-order output sequence.
    pub index: usize,
    /// Ordinal among leaves in output order; `None` for internal nodes.
    ///
    /// Deterministic for a given layout, but unlike `key` it may change when
    /// weights reorder siblings.
    pub leaf_index: Option<usize>,
    /// The node this entry was computed from.
    pub source: Arc<TreeNode>,
}

impl PositionedNode {
    /// The source leaf, if this is one.
    pub fn leaf(&self) -> Option<&Leaf> {
        self.source.as_leaf()
    }

    pub fn id(&self) -> &NodeId {
        self.source.id()
    }
}

/// Summary counters for a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
    pub total_weight: f64,
}

/// The layout engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Treemap {
    canvas: Size,
    split_rule: SplitRule,
    rounding: Rounding,
}

impl Treemap {
    /// Engine for `canvas` with longest-side splitting and integer rounding.
    pub fn new(canvas: Size) -> Self {
        Self {
            canvas,
            split_rule: SplitRule::default(),
            rounding: Rounding::default(),
        }
    }

    /// Set the split rule.
    #[must_use]
    pub fn split_rule(mut self, split_rule: SplitRule) -> Self {
        self.split_rule = split_rule;
        self
    }

    /// Set the rounding mode.
    #[must_use]
    pub fn rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Set the canvas size.
    #[must_use]
    pub fn canvas(mut self, canvas: Size) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    /// Lay out `root` (or nothing) into a pre-ordered node sequence.
    pub fn layout(
        &self,
        root: Option<&Arc<TreeNode>>,
        weights: &dyn WeightAccessor,
    ) -> Result<Vec<PositionedNode>, LayoutError> {
        self.layout_with_stats(root, weights).map(|(nodes, _)| nodes)
    }

    /// Like [`layout`](Self::layout), also returning summary counters.
    pub fn layout_with_stats(
        &self,
        root: Option<&Arc<TreeNode>>,
        weights: &dyn WeightAccessor,
    ) -> Result<(Vec<PositionedNode>, LayoutStats), LayoutError> {
        if !self.canvas.is_valid() {
            return Err(LayoutError::InvalidCanvas {
                width: self.canvas.width,
                height: self.canvas.height,
            });
        }
        let Some(root) = root else {
            clustermap_core::debug!("layout of empty tree");
            return Ok((Vec::new(), LayoutStats::default()));
        };

        let weighed = weigh(root, NodeKey::root(root.id()), weights)?;
        let canvas = match self.rounding {
            Rounding::Integer => self.canvas.rounded(),
            Rounding::Continuous => self.canvas,
        };

        let mut placer = Placer {
            split_rule: self.split_rule,
            rounding: self.rounding,
            out: Vec::with_capacity(root.node_count()),
            stats: LayoutStats {
                total_weight: weighed.weight,
                ..LayoutStats::default()
            },
        };
        placer.place(weighed, None, Rect::from_size(canvas), 0);

        clustermap_core::debug!(
            nodes = placer.stats.nodes,
            leaves = placer.stats.leaves,
            max_depth = placer.stats.max_depth,
            total_weight = placer.stats.total_weight,
            "treemap layout complete"
        );
        Ok((placer.out, placer.stats))
    }
}

/// Lay out `root` on `canvas` with default split rule and rounding.
pub fn layout(
    root: Option<&Arc<TreeNode>>,
    canvas: Size,
    weights: &dyn WeightAccessor,
) -> Result<Vec<PositionedNode>, LayoutError> {
    Treemap::new(canvas).layout(root, weights)
}

// ---------------------------------------------------------------------------
// Weighing
// ---------------------------------------------------------------------------

/// A node with its effective weight and children in layout order.
struct Weighed<'a> {
    node: &'a Arc<TreeNode>,
    key: NodeKey,
    weight: f64,
    children: Vec<Weighed<'a>>,
}

fn weigh<'a>(
    node: &'a Arc<TreeNode>,
    key: NodeKey,
    weights: &dyn WeightAccessor,
) -> Result<Weighed<'a>, LayoutError> {
    match node.as_ref() {
        TreeNode::Leaf(leaf) => {
            let weight = weight::checked_weight(weights, leaf, &key)?;
            Ok(Weighed {
                node,
                key,
                weight,
                children: Vec::new(),
            })
        }
        TreeNode::Internal(internal) => {
            let mut seen = FxHashSet::default();
            let mut children = Vec::with_capacity(internal.children.len());
            for child in &internal.children {
                if !seen.insert(child.id()) {
                    return Err(LayoutError::DuplicateIdentity {
                        parent: key,
                        id: child.id().clone(),
                    });
                }
                children.push(weigh(child, key.child(child.id()), weights)?);
            }
            // Stable: equal weights keep sibling order.
            children.sort_by(|a, b| b.weight.total_cmp(&a.weight));
            let weight: f64 = children.iter().map(|c| c.weight).sum();
            // Finite leaves can still overflow when summed.
            if !weight.is_finite() {
                return Err(LayoutError::InvalidWeight { key, value: weight });
            }
            Ok(Weighed {
                node,
                key,
                weight,
                children,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

struct Placer {
    split_rule: SplitRule,
    rounding: Rounding,
    out: Vec<PositionedNode>,
    stats: LayoutStats,
}

impl Placer {
    fn place(&mut self, weighed: Weighed<'_>, parent: Option<NodeKey>, rect: Rect, depth: usize) {
        let is_leaf = weighed.node.is_leaf();
        let leaf_index = is_leaf.then_some(self.stats.leaves);

        self.stats.nodes += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);
        if is_leaf {
            self.stats.leaves += 1;
        }

        self.out.push(PositionedNode {
            key: weighed.key.clone(),
            parent,
            rect,
            depth,
            is_leaf,
            weight: weighed.weight,
            index: self.out.len(),
            leaf_index,
            source: Arc::clone(weighed.node),
        });

        if weighed.children.is_empty() {
            return;
        }

        let axis = self.split_rule.axis(&rect, depth);
        let child_weights: Vec<f64> = weighed.children.iter().map(|c| c.weight).collect();
        let slices = partition(&rect, axis, &child_weights, weighed.weight, self.rounding);
        clustermap_core::trace!(
            key = %weighed.key,
            children = slices.len(),
            axis = ?axis,
            "partitioned node"
        );

        for (child, slice) in weighed.children.into_iter().zip(slices) {
            self.place(child, Some(weighed.key.clone()), slice, depth + 1);
        }
    }
}

/// Cut `rect` along `axis` into slices proportional to `weights`.
///
/// `total` is the sum of `weights`. With zero total every slice is a
/// degenerate rectangle at the leading edge.
fn partition(rect: &Rect, axis: Axis, weights: &[f64], total: f64, rounding: Rounding) -> Vec<Rect> {
    let (start, extent) = match axis {
        Axis::Horizontal => (rect.x, rect.width),
        Axis::Vertical => (rect.y, rect.height),
    };

    // edges[i]..edges[i + 1] is slice i along the axis.
    let mut edges = Vec::with_capacity(weights.len() + 1);
    edges.push(start);
    if total <= 0.0 {
        edges.extend(weights.iter().map(|_| start));
    } else {
        match rounding {
            Rounding::Integer => {
                let targets: Vec<f64> = weights.iter().map(|w| extent * w / total).collect();
                let cells = extent.max(0.0).round().min(f64::from(u32::MAX)) as u32;
                let mut offset = 0u64;
                for size in round_layout_stable(&targets, cells) {
                    offset += u64::from(size);
                    edges.push(start + offset as f64);
                }
            }
            Rounding::Continuous => {
                let mut acc = 0.0;
                for w in weights {
                    acc += w;
                    edges.push(start + extent * (acc / total).min(1.0));
                }
                // Pin the last edge so the row ends exactly on the parent edge.
                if let Some(last) = edges.last_mut() {
                    *last = start + extent;
                }
            }
        }
    }

    edges
        .windows(2)
        .map(|pair| {
            let (from, to) = (pair[0], pair[1]);
            let size = (to - from).max(0.0);
            match axis {
                Axis::Horizontal => Rect::new(from, rect.y, size, rect.height),
                Axis::Vertical => Rect::new(rect.x, from, rect.width, size),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Largest-remainder rounding
// ---------------------------------------------------------------------------

/// Round real-valued slice sizes to whole units with exact sum conservation.
///
/// # Algorithm: Largest Remainder (Hamilton's method)
///
/// 1. **Floor phase**: `x_i = floor(r_i)`.
/// 2. **Deficit**: `D = total − Σ floor(r_i)` units remain.
/// 3. **Priority**: rank positive targets by remainder `r_i − floor(r_i)`,
///    descending; ties go to the smaller index.
/// 4. **Distribute**: one extra unit to each of the top `D` targets.
///
/// # Properties
///
/// 1. **Sum conservation**: `Σ x_i = total` whenever any target is positive.
/// 2. **Bounded displacement**: each `x_i` is `floor(r_i)` or `ceil(r_i)`.
/// 3. **Zero stays zero**: a zero target never receives a unit, so
///    zero-weight nodes keep their degenerate slice.
/// 4. **Deterministic**: index tie-break gives a total order.
///
/// # Example
///
/// ```
/// use clustermap_layout::round_layout_stable;
///
/// let result = round_layout_stable(&[10.4, 20.6, 9.0], 40);
/// assert_eq!(result, vec![10, 21, 9]);
/// ```
pub fn round_layout_stable(targets: &[f64], total: u32) -> Vec<u32> {
    let n = targets.len();
    if n == 0 {
        return Vec::new();
    }

    let floors: Vec<u32> = targets
        .iter()
        .map(|&r| r.max(0.0).floor().min(f64::from(u32::MAX)) as u32)
        .collect();
    let floor_sum: u64 = floors.iter().map(|&f| u64::from(f)).sum();

    if floor_sum > u64::from(total) {
        return redistribute_overflow(&floors, total);
    }
    let deficit = (u64::from(total) - floor_sum) as usize;
    if deficit == 0 {
        return floors;
    }

    let mut priority: Vec<(usize, f64)> = targets
        .iter()
        .enumerate()
        .filter(|&(_, &r)| r > 0.0)
        .map(|(i, &r)| (i, r - f64::from(floors[i])))
        .collect();
    if priority.is_empty() {
        // Nothing to grow; all-zero targets yield an all-zero row.
        return floors;
    }
    priority.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    // Cycling only matters when floating-point drift leaves a deficit larger
    // than the number of positive targets.
    let mut result = floors;
    for &(i, _) in priority.iter().cycle().take(deficit) {
        result[i] = result[i].saturating_add(1);
    }
    result
}

/// Handle the edge case where floored values exceed total: shave the largest
/// entries one unit at a time until the sum matches.
fn redistribute_overflow(floors: &[u32], total: u32) -> Vec<u32> {
    let mut result = floors.to_vec();
    let mut current_sum: u64 = result.iter().map(|&f| u64::from(f)).sum();

    while current_sum > u64::from(total) {
        let Some((idx, _)) = result
            .iter()
            .enumerate()
            .filter(|item| *item.1 > 0)
            .max_by_key(|item| *item.1)
        else {
            break;
        };
        result[idx] -= 1;
        current_sum -= 1;
    }
    result
}
