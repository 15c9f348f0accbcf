//! Property-based invariant tests for the treemap layout.
//!
//! 1. Area conservation: leaf areas sum to the canvas area.
//! 2. No overlap between siblings.
//! 3. Containment: every child lies inside its parent.
//! 4. Tiling: children of a positive-weight parent cover it exactly.
//! 5. Determinism: identical inputs give identical outputs.
//! 6. Proportionality: sibling areas track weights within rounding.

use std::collections::HashMap;
use std::sync::Arc;

use clustermap_layout::{
    Flat, LayoutError, PositionedNode, Proportional, Rounding, Size, SplitRule, TreeNode,
    Treemap, WeightAccessor,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn leaf_strategy() -> impl Strategy<Value = TreeNode> {
    (0u32..50).prop_map(|count| TreeNode::leaf("leaf", f64::from(count)))
}

/// Random trees up to three levels deep with renumbered sibling ids.
fn tree_strategy() -> impl Strategy<Value = TreeNode> {
    leaf_strategy().prop_recursive(3, 64, 6, |inner| {
        prop::collection::vec(inner, 1..6).prop_map(|children| {
            TreeNode::internal("node", children.into_iter().enumerate().map(|(i, c)| renamed(c, i)))
        })
    })
}

fn renamed(node: TreeNode, i: usize) -> TreeNode {
    let id = format!("n{i}");
    match node {
        TreeNode::Leaf(mut leaf) => {
            leaf.id = id.into();
            TreeNode::Leaf(leaf)
        }
        TreeNode::Internal(mut internal) => {
            internal.id = id.into();
            TreeNode::Internal(internal)
        }
    }
}

fn canvas_strategy() -> impl Strategy<Value = Size> {
    (1u32..1500, 1u32..900).prop_map(|(w, h)| Size::new(f64::from(w), f64::from(h)))
}

fn rounding_strategy() -> impl Strategy<Value = Rounding> {
    prop_oneof![Just(Rounding::Integer), Just(Rounding::Continuous)]
}

fn split_strategy() -> impl Strategy<Value = SplitRule> {
    prop_oneof![Just(SplitRule::LongestSide), Just(SplitRule::AlternateByDepth)]
}

fn children_by_parent(nodes: &[PositionedNode]) -> HashMap<&str, Vec<&PositionedNode>> {
    let mut map: HashMap<&str, Vec<&PositionedNode>> = HashMap::new();
    for node in nodes {
        if let Some(parent) = &node.parent {
            map.entry(parent.as_str()).or_default().push(node);
        }
    }
    map
}

fn run(
    tree: &Arc<TreeNode>,
    canvas: Size,
    rounding: Rounding,
    split: SplitRule,
    weights: &dyn WeightAccessor,
) -> Vec<PositionedNode> {
    Treemap::new(canvas)
        .rounding(rounding)
        .split_rule(split)
        .layout(Some(tree), weights)
        .expect("valid tree lays out")
}

const EPS: f64 = 1e-6;

// ═════════════════════════════════════════════════════════════════════════
// Properties
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn root_equals_canvas(
        tree in tree_strategy(),
        canvas in canvas_strategy(),
        rounding in rounding_strategy(),
    ) {
        let tree = Arc::new(tree);
        let nodes = run(&tree, canvas, rounding, SplitRule::LongestSide, &Proportional);
        prop_assert_eq!(nodes[0].rect.width, canvas.width);
        prop_assert_eq!(nodes[0].rect.height, canvas.height);
        prop_assert_eq!(nodes.len(), tree.node_count());
    }

    #[test]
    fn leaf_area_is_conserved(
        tree in tree_strategy(),
        canvas in canvas_strategy(),
        rounding in rounding_strategy(),
        split in split_strategy(),
    ) {
        let tree = Arc::new(tree);
        let nodes = run(&tree, canvas, rounding, split, &Flat);
        // Flat weights are always positive, so every leaf has real area.
        let leaf_area: f64 = nodes.iter().filter(|n| n.is_leaf).map(|n| n.rect.area()).sum();
        let canvas_area = canvas.area();
        prop_assert!(
            (leaf_area - canvas_area).abs() <= canvas_area * EPS,
            "leaf area {} vs canvas {}", leaf_area, canvas_area
        );
    }

    #[test]
    fn siblings_never_overlap(
        tree in tree_strategy(),
        canvas in canvas_strategy(),
        rounding in rounding_strategy(),
        split in split_strategy(),
    ) {
        let tree = Arc::new(tree);
        let nodes = run(&tree, canvas, rounding, split, &Proportional);
        for siblings in children_by_parent(&nodes).values() {
            for (i, a) in siblings.iter().enumerate() {
                for b in &siblings[i + 1..] {
                    prop_assert!(
                        a.rect.intersection_area(&b.rect) <= EPS,
                        "{} overlaps {}", a.key, b.key
                    );
                }
            }
        }
    }

    #[test]
    fn children_stay_inside_parent(
        tree in tree_strategy(),
        canvas in canvas_strategy(),
        rounding in rounding_strategy(),
        split in split_strategy(),
    ) {
        let tree = Arc::new(tree);
        let nodes = run(&tree, canvas, rounding, split, &Proportional);
        let by_key: HashMap<&str, &PositionedNode> =
            nodes.iter().map(|n| (n.key.as_str(), n)).collect();
        for node in &nodes {
            prop_assert!(node.rect.is_valid());
            if let Some(parent) = &node.parent {
                let parent = by_key[parent.as_str()];
                prop_assert!(parent.rect.contains_rect(&node.rect, EPS));
                prop_assert_eq!(parent.depth + 1, node.depth);
            }
        }
    }

    #[test]
    fn children_tile_positive_parents(
        tree in tree_strategy(),
        canvas in canvas_strategy(),
        rounding in rounding_strategy(),
    ) {
        let tree = Arc::new(tree);
        let nodes = run(&tree, canvas, rounding, SplitRule::LongestSide, &Proportional);
        let by_key: HashMap<&str, &PositionedNode> =
            nodes.iter().map(|n| (n.key.as_str(), n)).collect();
        for (parent, children) in children_by_parent(&nodes) {
            let parent = by_key[parent];
            if parent.weight <= 0.0 {
                continue;
            }
            let covered: f64 = children.iter().map(|c| c.rect.area()).sum();
            prop_assert!(
                (covered - parent.rect.area()).abs() <= parent.rect.area().max(1.0) * EPS,
                "children of {} cover {} of {}", parent.key, covered, parent.rect.area()
            );
        }
    }

    #[test]
    fn layout_is_deterministic(
        tree in tree_strategy(),
        canvas in canvas_strategy(),
        rounding in rounding_strategy(),
    ) {
        let tree = Arc::new(tree);
        let first = run(&tree, canvas, rounding, SplitRule::LongestSide, &Proportional);
        let second = run(&tree, canvas, rounding, SplitRule::LongestSide, &Proportional);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn integer_slices_within_one_unit_of_ideal(
        counts in prop::collection::vec(1u32..100, 1..12),
        width in 1u32..2000,
    ) {
        let leaves = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| TreeNode::leaf(format!("c{i}"), f64::from(c)));
        let tree = Arc::new(TreeNode::internal("root", leaves));
        let canvas = Size::new(f64::from(width), 10.0);
        let nodes = run(&tree, canvas, Rounding::Integer, SplitRule::AlternateByDepth, &Proportional);
        let total: f64 = counts.iter().map(|&c| f64::from(c)).sum();
        for node in nodes.iter().skip(1) {
            let ideal = canvas.width * node.weight / total;
            prop_assert!((node.rect.width - ideal).abs() < 1.0);
            prop_assert_eq!(node.rect.width.fract(), 0.0);
        }
        let last = nodes.last().map(|n| n.rect.right());
        prop_assert_eq!(last, Some(canvas.width));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Scenarios
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn documents_drive_proportional_area() {
    let tree = TreeNode::from_json(
        r#"{"children": [
            {"id": "a", "docs": [{"text": "1"}, {"text": "2"}, {"text": "3"}]},
            {"id": "b", "docs": [{"text": "4"}]}
        ]}"#,
    )
    .unwrap()
    .map(Arc::new);
    let canvas = Size::new(100.0, 100.0);
    let engine = Treemap::new(canvas);

    let proportional = engine.layout(tree.as_ref(), &Proportional).unwrap();
    let areas: Vec<f64> = proportional.iter().filter(|n| n.is_leaf).map(|n| n.rect.area()).collect();
    assert_eq!(areas, [7500.0, 2500.0]);

    let flat = engine.layout(tree.as_ref(), &Flat).unwrap();
    let rects: Vec<_> = flat.iter().filter(|n| n.is_leaf).map(|n| n.rect).collect();
    assert_eq!(rects[0].width, 50.0);
    assert_eq!(rects[1].width, 50.0);
    assert_eq!(rects[0].height, 100.0);
}

#[test]
fn keys_survive_weight_changes() {
    let before = Arc::new(TreeNode::internal(
        "root",
        [TreeNode::leaf("a", 1.0), TreeNode::leaf("b", 9.0)],
    ));
    let after = Arc::new(TreeNode::internal(
        "root",
        [TreeNode::leaf("a", 9.0), TreeNode::leaf("b", 1.0)],
    ));
    let engine = Treemap::new(Size::new(100.0, 100.0));
    let first = engine.layout(Some(&before), &Proportional).unwrap();
    let second = engine.layout(Some(&after), &Proportional).unwrap();

    let key_a_first = first.iter().find(|n| n.id().as_str() == "a").unwrap();
    let key_a_second = second.iter().find(|n| n.id().as_str() == "a").unwrap();
    assert_eq!(key_a_first.key, key_a_second.key);
    assert_ne!(key_a_first.rect, key_a_second.rect);
    // Position-based indices swap, keys do not.
    assert_eq!(key_a_first.leaf_index, Some(1));
    assert_eq!(key_a_second.leaf_index, Some(0));
}

#[test]
fn json_without_ids_lays_out_next_to_numeric_ids() {
    let tree = TreeNode::from_json(r#"{"children": [{"id": "1", "count": 1}, {"count": 3}]}"#)
        .unwrap()
        .map(Arc::new);
    let nodes = Treemap::new(Size::new(100.0, 100.0))
        .layout(tree.as_ref(), &Proportional)
        .unwrap();
    let keys: Vec<_> = nodes.iter().map(|n| n.key.as_str().to_string()).collect();
    assert_eq!(keys, ["root", "root/#1", "root/1"]);
}

#[test]
fn overflowing_weights_are_rejected_not_collapsed() {
    let tree = Arc::new(TreeNode::internal(
        "root",
        [TreeNode::leaf("a", 1e308), TreeNode::leaf("b", 1e308)],
    ));
    for rounding in [Rounding::Integer, Rounding::Continuous] {
        let result = Treemap::new(Size::new(100.0, 100.0))
            .rounding(rounding)
            .layout(Some(&tree), &Proportional);
        assert!(
            matches!(result, Err(LayoutError::InvalidWeight { .. })),
            "{rounding:?}: {result:?}"
        );
    }
    // Flat weights never overflow.
    let nodes = Treemap::new(Size::new(100.0, 100.0))
        .layout(Some(&tree), &Flat)
        .unwrap();
    let area: f64 = nodes.iter().filter(|n| n.is_leaf).map(|n| n.rect.area()).sum();
    assert_eq!(area, 10_000.0);
}
