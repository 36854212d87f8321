// ABOUTME: Persistent binary tree structure for panel layout.
// ABOUTME: Supports splitting, removing, swapping, moving and resizing with structural sharing.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use xmux_core::{NodeId, PanelId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Side-by-side (left | right)
    Horizontal,
    /// Stacked (top / bottom)
    Vertical,
}

/// Where a dragged panel is dropped relative to a target leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

impl Zone {
    /// Split axis for edge zones; `Center` does not split
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Zone::Left | Zone::Right => Some(Direction::Horizontal),
            Zone::Top | Zone::Bottom => Some(Direction::Vertical),
            Zone::Center => None,
        }
    }

    /// Whether the dropped panel lands after (right of / below) the target
    pub fn inserts_after(&self) -> bool {
        matches!(self, Zone::Right | Zone::Bottom)
    }
}

/// Percentages of the two children, always summing to 100
pub type Sizes = [f64; 2];

pub const EVEN_SIZES: Sizes = [50.0, 50.0];

/// Rectangle in normalized coordinates (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    /// Cut in two along `direction`, the first part taking `percent` of the extent
    fn split(&self, direction: Direction, percent: f64) -> (Rect, Rect) {
        let ratio = percent / 100.0;
        match direction {
            Direction::Horizontal => (
                Rect {
                    width: self.width * ratio,
                    ..*self
                },
                Rect {
                    x: self.x + self.width * ratio,
                    width: self.width * (1.0 - ratio),
                    ..*self
                },
            ),
            Direction::Vertical => (
                Rect {
                    height: self.height * ratio,
                    ..*self
                },
                Rect {
                    y: self.y + self.height * ratio,
                    height: self.height * (1.0 - ratio),
                    ..*self
                },
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Leaf {
    pub id: NodeId,
    pub panel_id: PanelId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub id: NodeId,
    pub direction: Direction,
    pub sizes: Sizes,
    pub children: [Arc<LayoutNode>; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutNode {
    Leaf(Leaf),
    Split(Split),
}

/// An immutable layout. Every edit returns a new tree that shares all
/// untouched subtrees with the old one; an edit that changes nothing
/// returns a tree pointing at the very same root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutTree {
    root: Arc<LayoutNode>,
}

impl LayoutTree {
    /// Single-leaf tree bound to `panel_id`
    pub fn new(panel_id: PanelId) -> Self {
        Self {
            root: make_leaf(panel_id),
        }
    }

    pub fn root(&self) -> &LayoutNode {
        &self.root
    }

    /// True when both trees share the same root allocation
    pub fn ptr_eq(&self, other: &LayoutTree) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// Replace the leaf `target_leaf_id` with a 50/50 split of the old leaf and a
    /// new leaf for `new_panel_id`. Unknown targets leave the tree unchanged.
    pub fn split_leaf(
        &self,
        target_leaf_id: NodeId,
        new_panel_id: PanelId,
        direction: Direction,
        insert_after: bool,
    ) -> LayoutTree {
        self.with_root(split_node(
            &self.root,
            target_leaf_id,
            new_panel_id,
            direction,
            insert_after,
        ))
    }

    /// Drop the leaf carrying `panel_id`, collapsing its parent split into the
    /// surviving sibling. `None` when the tree becomes empty.
    pub fn remove_panel(&self, panel_id: PanelId) -> Option<LayoutTree> {
        remove_node(&self.root, panel_id).map(|root| self.with_root(root))
    }

    /// Exchange the panels bound to two leaves; the shape is untouched
    pub fn swap_panels(&self, a: PanelId, b: PanelId) -> LayoutTree {
        if a == b {
            return self.clone();
        }
        self.with_root(map_leaves(&self.root, &|leaf| {
            if leaf.panel_id == a {
                Some(Leaf { panel_id: b, ..*leaf })
            } else if leaf.panel_id == b {
                Some(Leaf { panel_id: a, ..*leaf })
            } else {
                None
            }
        }))
    }

    /// Move `source_panel_id` next to the leaf `target_leaf_id`, splitting that
    /// leaf along the zone's axis.
    ///
    /// Returns the tree unchanged when the zone is `Center`, when the source or
    /// target is missing, when the target leaf is the source's own leaf, or when
    /// the source is the only panel. The source's leaf gets a fresh node id.
    pub fn move_panel_to_split(
        &self,
        source_panel_id: PanelId,
        target_leaf_id: NodeId,
        zone: Zone,
    ) -> LayoutTree {
        let Some(direction) = zone.direction() else {
            return self.clone();
        };
        match self.find_panel_by_leaf_id(target_leaf_id) {
            Some(target_panel) if target_panel != source_panel_id => {}
            _ => return self.clone(),
        }
        if self.find_leaf_by_panel_id(source_panel_id).is_none() {
            return self.clone();
        }
        let Some(without_source) = self.remove_panel(source_panel_id) else {
            return self.clone();
        };
        without_source.split_leaf(
            target_leaf_id,
            source_panel_id,
            direction,
            zone.inserts_after(),
        )
    }

    /// Set the sizes of split `split_id`. The pair is rescaled to sum to 100;
    /// non-finite or non-positive pairs are ignored.
    pub fn update_sizes(&self, split_id: NodeId, sizes: Sizes) -> LayoutTree {
        let Some(sizes) = normalize_sizes(sizes) else {
            return self.clone();
        };
        self.with_root(resize_node(&self.root, split_id, sizes))
    }

    pub fn find_leaf_by_panel_id(&self, panel_id: PanelId) -> Option<Leaf> {
        find_leaf(&self.root, &|leaf| leaf.panel_id == panel_id)
    }

    pub fn find_panel_by_leaf_id(&self, leaf_id: NodeId) -> Option<PanelId> {
        find_leaf(&self.root, &|leaf| leaf.id == leaf_id).map(|leaf| leaf.panel_id)
    }

    /// Panel ids in depth-first, left-before-right order
    pub fn all_panel_ids(&self) -> Vec<PanelId> {
        self.leaves().into_iter().map(|leaf| leaf.panel_id).collect()
    }

    /// Leaves in depth-first, left-before-right order
    pub fn leaves(&self) -> Vec<Leaf> {
        let mut out = Vec::new();
        collect_leaves(&self.root, &mut out);
        out
    }

    pub fn contains_panel(&self, panel_id: PanelId) -> bool {
        self.find_leaf_by_panel_id(panel_id).is_some()
    }

    /// Area each panel occupies, as a fraction of the whole layout
    pub fn panel_rects(&self) -> HashMap<PanelId, Rect> {
        let mut out = HashMap::new();
        collect_rects(&self.root, Rect::full(), &mut out);
        out
    }

    fn with_root(&self, root: Arc<LayoutNode>) -> LayoutTree {
        LayoutTree { root }
    }
}

/// Leaf node with a fresh unique id
pub fn make_leaf(panel_id: PanelId) -> Arc<LayoutNode> {
    Arc::new(LayoutNode::Leaf(Leaf {
        id: NodeId::new(),
        panel_id,
    }))
}

fn normalize_sizes(sizes: Sizes) -> Option<Sizes> {
    let [a, b] = sizes;
    if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0) {
        return None;
    }
    // Scale first so huge pairs cannot overflow the sum
    let max = a.max(b);
    let (a, b) = (a / max, b / max);
    let first = a / (a + b) * 100.0;
    let second = 100.0 - first;
    (first > 0.0 && second > 0.0).then_some([first, second])
}

/// Reuse `node` when neither child changed, otherwise allocate a new split
fn rebuild(
    node: &Arc<LayoutNode>,
    split: &Split,
    first: Arc<LayoutNode>,
    second: Arc<LayoutNode>,
) -> Arc<LayoutNode> {
    if Arc::ptr_eq(&first, &split.children[0]) && Arc::ptr_eq(&second, &split.children[1]) {
        return Arc::clone(node);
    }
    Arc::new(LayoutNode::Split(Split {
        id: split.id,
        direction: split.direction,
        sizes: split.sizes,
        children: [first, second],
    }))
}

fn split_node(
    node: &Arc<LayoutNode>,
    target: NodeId,
    new_panel: PanelId,
    direction: Direction,
    insert_after: bool,
) -> Arc<LayoutNode> {
    match node.as_ref() {
        LayoutNode::Leaf(leaf) if leaf.id == target => {
            let old_leaf = Arc::clone(node);
            let new_leaf = make_leaf(new_panel);
            let children = if insert_after {
                [old_leaf, new_leaf]
            } else {
                [new_leaf, old_leaf]
            };
            Arc::new(LayoutNode::Split(Split {
                id: NodeId::new(),
                direction,
                sizes: EVEN_SIZES,
                children,
            }))
        }
        LayoutNode::Leaf(_) => Arc::clone(node),
        LayoutNode::Split(split) => {
            let first = split_node(&split.children[0], target, new_panel, direction, insert_after);
            let second = split_node(&split.children[1], target, new_panel, direction, insert_after);
            rebuild(node, split, first, second)
        }
    }
}

fn remove_node(node: &Arc<LayoutNode>, panel: PanelId) -> Option<Arc<LayoutNode>> {
    match node.as_ref() {
        LayoutNode::Leaf(leaf) => (leaf.panel_id != panel).then(|| Arc::clone(node)),
        LayoutNode::Split(split) => {
            let first = remove_node(&split.children[0], panel);
            let second = remove_node(&split.children[1], panel);
            match (first, second) {
                (None, None) => None,
                // The surviving sibling takes the split's place wholesale
                (Some(only), None) | (None, Some(only)) => Some(only),
                (Some(first), Some(second)) => Some(rebuild(node, split, first, second)),
            }
        }
    }
}

/// Rebuild only the leaves for which `f` returns a replacement
fn map_leaves(node: &Arc<LayoutNode>, f: &impl Fn(&Leaf) -> Option<Leaf>) -> Arc<LayoutNode> {
    match node.as_ref() {
        LayoutNode::Leaf(leaf) => match f(leaf) {
            Some(replacement) => Arc::new(LayoutNode::Leaf(replacement)),
            None => Arc::clone(node),
        },
        LayoutNode::Split(split) => {
            let first = map_leaves(&split.children[0], f);
            let second = map_leaves(&split.children[1], f);
            rebuild(node, split, first, second)
        }
    }
}

fn resize_node(node: &Arc<LayoutNode>, split_id: NodeId, sizes: Sizes) -> Arc<LayoutNode> {
    match node.as_ref() {
        LayoutNode::Leaf(_) => Arc::clone(node),
        LayoutNode::Split(split) if split.id == split_id => {
            if split.sizes == sizes {
                return Arc::clone(node);
            }
            Arc::new(LayoutNode::Split(Split {
                sizes,
                ..split.clone()
            }))
        }
        LayoutNode::Split(split) => {
            let first = resize_node(&split.children[0], split_id, sizes);
            let second = resize_node(&split.children[1], split_id, sizes);
            rebuild(node, split, first, second)
        }
    }
}

fn find_leaf(node: &LayoutNode, pred: &impl Fn(&Leaf) -> bool) -> Option<Leaf> {
    match node {
        LayoutNode::Leaf(leaf) => pred(leaf).then_some(*leaf),
        LayoutNode::Split(split) => {
            find_leaf(&split.children[0], pred).or_else(|| find_leaf(&split.children[1], pred))
        }
    }
}

fn find_split(node: &LayoutNode, split_id: NodeId) -> Option<&Split> {
    match node {
        LayoutNode::Leaf(_) => None,
        LayoutNode::Split(split) if split.id == split_id => Some(split),
        LayoutNode::Split(split) => find_split(&split.children[0], split_id)
            .or_else(|| find_split(&split.children[1], split_id)),
    }
}

fn collect_leaves(node: &LayoutNode, out: &mut Vec<Leaf>) {
    match node {
        LayoutNode::Leaf(leaf) => out.push(*leaf),
        LayoutNode::Split(split) => {
            collect_leaves(&split.children[0], out);
            collect_leaves(&split.children[1], out);
        }
    }
}

fn collect_rects(node: &LayoutNode, rect: Rect, out: &mut HashMap<PanelId, Rect>) {
    match node {
        LayoutNode::Leaf(leaf) => {
            out.insert(leaf.panel_id, rect);
        }
        LayoutNode::Split(split) => {
            let (first, second) = rect.split(split.direction, split.sizes[0]);
            collect_rects(&split.children[0], first, out);
            collect_rects(&split.children[1], second, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use test_case::test_case;

    fn leaf_id(tree: &LayoutTree, panel: PanelId) -> NodeId {
        tree.find_leaf_by_panel_id(panel).unwrap().id
    }

    fn two_panels(direction: Direction) -> (LayoutTree, PanelId, PanelId) {
        let p0 = PanelId::new();
        let p1 = PanelId::new();
        let tree = LayoutTree::new(p0);
        let tree = tree.split_leaf(leaf_id(&tree, p0), p1, direction, true);
        (tree, p0, p1)
    }

    fn panels_of(node: &LayoutNode) -> Vec<PanelId> {
        let mut leaves = Vec::new();
        collect_leaves(node, &mut leaves);
        leaves.into_iter().map(|leaf| leaf.panel_id).collect()
    }

    fn as_split(node: &LayoutNode) -> &Split {
        match node {
            LayoutNode::Split(split) => split,
            LayoutNode::Leaf(_) => panic!("expected split, got leaf"),
        }
    }

    #[test]
    fn new_tree_has_one_panel() {
        let p0 = PanelId::new();
        let tree = LayoutTree::new(p0);
        assert_eq!(tree.all_panel_ids(), vec![p0]);
    }

    #[test]
    fn split_places_new_panel_after() {
        let (tree, p0, p1) = two_panels(Direction::Horizontal);
        let split = as_split(tree.root());
        assert_eq!(split.direction, Direction::Horizontal);
        assert_eq!(split.sizes, EVEN_SIZES);
        assert_eq!(tree.all_panel_ids(), vec![p0, p1]);
    }

    #[test]
    fn split_can_insert_before() {
        let p0 = PanelId::new();
        let p1 = PanelId::new();
        let tree = LayoutTree::new(p0);
        let tree = tree.split_leaf(leaf_id(&tree, p0), p1, Direction::Vertical, false);
        assert_eq!(tree.all_panel_ids(), vec![p1, p0]);
    }

    #[test]
    fn split_keeps_old_leaf_id() {
        let p0 = PanelId::new();
        let tree = LayoutTree::new(p0);
        let before = leaf_id(&tree, p0);
        let tree = tree.split_leaf(before, PanelId::new(), Direction::Vertical, true);
        assert_eq!(leaf_id(&tree, p0), before);
    }

    #[test]
    fn split_unknown_target_is_noop() {
        let (tree, _, _) = two_panels(Direction::Horizontal);
        let same = tree.split_leaf(NodeId::new(), PanelId::new(), Direction::Vertical, true);
        assert!(same.ptr_eq(&tree));
    }

    #[test]
    fn split_shares_untouched_subtree() {
        let (tree, p0, p1) = two_panels(Direction::Horizontal);
        let next = tree.split_leaf(leaf_id(&tree, p1), PanelId::new(), Direction::Vertical, true);
        let before = as_split(tree.root());
        let after = as_split(next.root());
        assert!(Arc::ptr_eq(&before.children[0], &after.children[0]));
        assert_eq!(leaf_id(&next, p0), leaf_id(&tree, p0));
    }

    #[test]
    fn remove_collapses_into_sibling() {
        let (tree, p0, p1) = two_panels(Direction::Horizontal);
        let original_leaf = leaf_id(&tree, p0);
        let tree = tree.remove_panel(p1).unwrap();
        assert_eq!(
            tree.root(),
            &LayoutNode::Leaf(Leaf {
                id: original_leaf,
                panel_id: p0
            })
        );
    }

    #[test]
    fn remove_last_panel_empties_tree() {
        let p0 = PanelId::new();
        assert!(LayoutTree::new(p0).remove_panel(p0).is_none());
    }

    #[test]
    fn remove_unknown_panel_is_noop() {
        let (tree, _, _) = two_panels(Direction::Vertical);
        let same = tree.remove_panel(PanelId::new()).unwrap();
        assert!(same.ptr_eq(&tree));
    }

    #[test]
    fn remove_nested_keeps_other_sizes() {
        let (tree, p0, p1) = two_panels(Direction::Horizontal);
        let split_id = as_split(tree.root()).id;
        let tree = tree.update_sizes(split_id, [30.0, 70.0]);
        let p2 = PanelId::new();
        let tree = tree.split_leaf(leaf_id(&tree, p1), p2, Direction::Vertical, true);

        let tree = tree.remove_panel(p2).unwrap();
        let root = as_split(tree.root());
        assert_eq!(root.id, split_id);
        assert_eq!(root.sizes, [30.0, 70.0]);
        assert_eq!(tree.all_panel_ids(), vec![p0, p1]);
    }

    #[test]
    fn swap_exchanges_bindings_only() {
        let (tree, p0, p1) = two_panels(Direction::Horizontal);
        let leaf_ids: Vec<NodeId> = tree.leaves().iter().map(|l| l.id).collect();
        let swapped = tree.swap_panels(p0, p1);
        assert_eq!(swapped.all_panel_ids(), vec![p1, p0]);
        let swapped_ids: Vec<NodeId> = swapped.leaves().iter().map(|l| l.id).collect();
        assert_eq!(swapped_ids, leaf_ids);
    }

    #[test]
    fn swap_with_unknown_ids_is_noop() {
        let (tree, p0, _) = two_panels(Direction::Horizontal);
        assert!(tree.swap_panels(PanelId::new(), PanelId::new()).ptr_eq(&tree));
        assert!(tree.swap_panels(p0, p0).ptr_eq(&tree));
    }

    #[test]
    fn move_onto_only_other_panel() {
        let (tree, p0, p1) = two_panels(Direction::Vertical);
        let moved = tree.move_panel_to_split(p0, leaf_id(&tree, p1), Zone::Right);
        let split = as_split(moved.root());
        assert_eq!(split.direction, Direction::Horizontal);
        assert_eq!(moved.all_panel_ids(), vec![p1, p0]);
    }

    #[test_case(Zone::Left, Direction::Horizontal, false ; "left")]
    #[test_case(Zone::Right, Direction::Horizontal, true ; "right")]
    #[test_case(Zone::Top, Direction::Vertical, false ; "top")]
    #[test_case(Zone::Bottom, Direction::Vertical, true ; "bottom")]
    fn move_zone_picks_axis_and_order(zone: Zone, direction: Direction, after: bool) {
        let (tree, p0, p1) = two_panels(Direction::Horizontal);
        let p2 = PanelId::new();
        let tree = tree.split_leaf(leaf_id(&tree, p1), p2, Direction::Vertical, true);

        let inner_before = as_split(&as_split(tree.root()).children[1]).id;

        let moved = tree.move_panel_to_split(p0, leaf_id(&tree, p2), zone);

        // p0 left the root split, which collapsed into the p1/p2 split
        let root = as_split(moved.root());
        assert_eq!(root.id, inner_before);
        assert_eq!(panels_of(&root.children[0]), vec![p1]);
        let target = as_split(&root.children[1]);
        assert_eq!(target.direction, direction);
        let expected = if after { vec![p2, p0] } else { vec![p0, p2] };
        assert_eq!(panels_of(&root.children[1]), expected);
    }

    #[test]
    fn move_onto_own_leaf_is_noop() {
        let (tree, p0, _) = two_panels(Direction::Horizontal);
        let same = tree.move_panel_to_split(p0, leaf_id(&tree, p0), Zone::Left);
        assert!(same.ptr_eq(&tree));
    }

    #[test]
    fn move_with_center_zone_is_noop() {
        let (tree, p0, p1) = two_panels(Direction::Horizontal);
        assert!(tree
            .move_panel_to_split(p0, leaf_id(&tree, p1), Zone::Center)
            .ptr_eq(&tree));
    }

    #[test]
    fn move_to_missing_target_keeps_panel() {
        let (tree, p0, _) = two_panels(Direction::Horizontal);
        let same = tree.move_panel_to_split(p0, NodeId::new(), Zone::Top);
        assert!(same.ptr_eq(&tree));
    }

    #[test]
    fn move_of_absent_panel_is_noop() {
        let (tree, _, p1) = two_panels(Direction::Horizontal);
        let same = tree.move_panel_to_split(PanelId::new(), leaf_id(&tree, p1), Zone::Top);
        assert!(same.ptr_eq(&tree));
    }

    #[test]
    fn update_sizes_normalizes() {
        let (tree, _, _) = two_panels(Direction::Horizontal);
        let split_id = as_split(tree.root()).id;
        let tree = tree.update_sizes(split_id, [1.0, 3.0]);
        assert_eq!(as_split(tree.root()).sizes, [25.0, 75.0]);
    }

    #[test]
    fn update_sizes_rejects_invalid() {
        let (tree, _, _) = two_panels(Direction::Horizontal);
        let split_id = as_split(tree.root()).id;
        assert!(tree.update_sizes(split_id, [0.0, 100.0]).ptr_eq(&tree));
        assert!(tree.update_sizes(split_id, [f64::NAN, 50.0]).ptr_eq(&tree));
        assert!(tree.update_sizes(NodeId::new(), [40.0, 60.0]).ptr_eq(&tree));
        assert!(tree.update_sizes(split_id, [1e-300, 1e300]).ptr_eq(&tree));
    }

    #[test]
    fn update_sizes_handles_huge_values() {
        let (tree, _, _) = two_panels(Direction::Horizontal);
        let split_id = as_split(tree.root()).id;
        let resized = tree.update_sizes(split_id, [1e308, 1e308]);
        assert_eq!(as_split(resized.root()).sizes, [50.0, 50.0]);

        let resized = tree.update_sizes(split_id, [f64::MAX, f64::MAX / 3.0]);
        let [first, second] = as_split(resized.root()).sizes;
        assert!(first > 0.0 && second > 0.0);
        assert!((first - 75.0).abs() < 1e-9);
    }

    #[test]
    fn update_sizes_touches_only_target() {
        let (tree, _, p1) = two_panels(Direction::Horizontal);
        let tree = tree.split_leaf(leaf_id(&tree, p1), PanelId::new(), Direction::Vertical, true);
        let inner_id = as_split(&as_split(tree.root()).children[1]).id;

        let resized = tree.update_sizes(inner_id, [60.0, 40.0]);
        let before = as_split(tree.root());
        let after = as_split(resized.root());
        assert_eq!(after.sizes, EVEN_SIZES);
        assert!(Arc::ptr_eq(&before.children[0], &after.children[0]));
        assert_eq!(find_split(resized.root(), inner_id).unwrap().sizes, [60.0, 40.0]);
    }

    #[test]
    fn serializes_with_type_tags() {
        let (tree, _, _) = two_panels(Direction::Vertical);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "split");
        assert_eq!(json["direction"], "vertical");
        assert_eq!(json["children"][0]["type"], "leaf");
    }

    #[test]
    fn panel_rects_follow_sizes() {
        let (tree, p0, p1) = two_panels(Direction::Horizontal);
        let p2 = PanelId::new();
        let tree = tree.split_leaf(leaf_id(&tree, p1), p2, Direction::Vertical, true);
        let tree = tree.update_sizes(as_split(tree.root()).id, [25.0, 75.0]);

        let rects = tree.panel_rects();
        assert_eq!(rects.len(), 3);
        assert_eq!(
            rects[&p0],
            Rect {
                x: 0.0,
                y: 0.0,
                width: 0.25,
                height: 1.0
            }
        );
        assert_eq!(
            rects[&p1],
            Rect {
                x: 0.25,
                y: 0.0,
                width: 0.75,
                height: 0.5
            }
        );
        assert_eq!(
            rects[&p2],
            Rect {
                x: 0.25,
                y: 0.5,
                width: 0.75,
                height: 0.5
            }
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Split(usize, bool, bool),
        Remove(usize),
        Swap(usize, usize),
        Move(usize, usize, u8),
        Resize(usize, f64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<usize>(), any::<bool>(), any::<bool>()).prop_map(|(i, h, a)| Op::Split(i, h, a)),
            any::<usize>().prop_map(Op::Remove),
            (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Swap(a, b)),
            (any::<usize>(), any::<usize>(), 0u8..5).prop_map(|(a, b, z)| Op::Move(a, b, z)),
            (any::<usize>(), 1.0f64..99.0).prop_map(|(i, s)| Op::Resize(i, s)),
        ]
    }

    fn splits(node: &LayoutNode, out: &mut Vec<Split>) {
        if let LayoutNode::Split(split) = node {
            out.push(split.clone());
            splits(&split.children[0], out);
            splits(&split.children[1], out);
        }
    }

    fn node_ids(node: &LayoutNode, out: &mut Vec<NodeId>) {
        match node {
            LayoutNode::Leaf(leaf) => out.push(leaf.id),
            LayoutNode::Split(split) => {
                out.push(split.id);
                node_ids(&split.children[0], out);
                node_ids(&split.children[1], out);
            }
        }
    }

    fn apply(tree: &LayoutTree, op: &Op) -> Option<LayoutTree> {
        let leaves = tree.leaves();
        let pick = |i: usize| leaves[i % leaves.len()];
        let zones = [Zone::Top, Zone::Bottom, Zone::Left, Zone::Right, Zone::Center];
        Some(match *op {
            Op::Split(i, horizontal, after) => {
                let direction = if horizontal {
                    Direction::Horizontal
                } else {
                    Direction::Vertical
                };
                tree.split_leaf(pick(i).id, PanelId::new(), direction, after)
            }
            Op::Remove(i) => return tree.remove_panel(pick(i).panel_id),
            Op::Swap(a, b) => tree.swap_panels(pick(a).panel_id, pick(b).panel_id),
            Op::Move(a, b, z) => {
                tree.move_panel_to_split(pick(a).panel_id, pick(b).id, zones[z as usize])
            }
            Op::Resize(i, first) => {
                let mut all = Vec::new();
                splits(tree.root(), &mut all);
                if all.is_empty() {
                    tree.clone()
                } else {
                    tree.update_sizes(all[i % all.len()].id, [first, 100.0 - first])
                }
            }
        })
    }

    proptest! {
        #[test]
        fn invariants_hold_under_any_edit_sequence(ops in prop::collection::vec(op(), 1..40)) {
            let mut tree = LayoutTree::new(PanelId::new());
            for op in &ops {
                let before: HashSet<PanelId> = tree.all_panel_ids().into_iter().collect();
                let Some(next) = apply(&tree, op) else {
                    break;
                };
                tree = next;

                let ids = tree.all_panel_ids();
                let unique: HashSet<PanelId> = ids.iter().copied().collect();
                prop_assert_eq!(unique.len(), ids.len());

                // Only splits add panels and only removals drop them
                match op {
                    Op::Split(..) => prop_assert!(unique.is_superset(&before)),
                    Op::Remove(_) => prop_assert!(unique.is_subset(&before)),
                    _ => prop_assert_eq!(&unique, &before),
                }

                let mut nodes = Vec::new();
                node_ids(tree.root(), &mut nodes);
                let unique_nodes: HashSet<NodeId> = nodes.iter().copied().collect();
                prop_assert_eq!(unique_nodes.len(), nodes.len());

                let mut all = Vec::new();
                splits(tree.root(), &mut all);
                for split in all {
                    prop_assert!(split.sizes[0] > 0.0 && split.sizes[1] > 0.0);
                    prop_assert!((split.sizes[0] + split.sizes[1] - 100.0).abs() < 1e-9);
                }
            }
        }

        #[test]
        fn split_then_remove_roundtrips(ops in prop::collection::vec(op(), 0..20), i in any::<usize>(), horizontal in any::<bool>(), after in any::<bool>()) {
            let mut tree = LayoutTree::new(PanelId::new());
            for op in &ops {
                match apply(&tree, op) {
                    Some(next) => tree = next,
                    None => break,
                }
            }
            let leaves = tree.leaves();
            let target = leaves[i % leaves.len()].id;
            let direction = if horizontal { Direction::Horizontal } else { Direction::Vertical };
            let p = PanelId::new();

            let back = tree.split_leaf(target, p, direction, after).remove_panel(p).unwrap();
            prop_assert_eq!(back, tree);
        }
    }
}
