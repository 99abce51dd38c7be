//! Binary space partition arena
//!
//! Nodes live in a flat `Vec` indexed by `PartitionId`; parent and child
//! links are ids, never references, so the tree serializes and diffs as plain
//! data. A node is split at most once and nodes are never removed, so the
//! leaves always tile the root rectangle exactly.

use dg_rng::SeededRng;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::config::{GeneratorConfig, cells};
use crate::geom::Rect;

/// Aspect ratio beyond which the split orientation is forced
const ORIENTATION_BIAS: f64 = 1.25;
/// Score weight for area balance between the halves
const BALANCE_WEIGHT: f64 = 0.6;
/// Score weight for squareness of the halves
const SQUARENESS_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(pub u32);

impl PartitionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Direction of the split line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Orientation {
    /// Split line at a column; children are left and right
    Vertical,
    /// Split line at a row; children are top and bottom
    Horizontal,
}

/// How a node was divided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub orientation: Orientation,
    /// Absolute column (vertical) or row (horizontal) where the right/bottom
    /// child starts
    pub line: i32,
    pub left: PartitionId,
    pub right: PartitionId,
}

/// Serializes with a computed `isLeaf` flag, which is ignored on input
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartitionNode {
    pub id: PartitionId,
    pub rect: Rect,
    pub depth: u32,
    pub split: Option<Split>,
    pub parent: Option<PartitionId>,
}

impl PartitionNode {
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }
}

impl Serialize for PartitionNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut node = serializer.serialize_struct("PartitionNode", 6)?;
        node.serialize_field("id", &self.id)?;
        node.serialize_field("rect", &self.rect)?;
        node.serialize_field("depth", &self.depth)?;
        node.serialize_field("isLeaf", &self.is_leaf())?;
        node.serialize_field("split", &self.split)?;
        node.serialize_field("parent", &self.parent)?;
        node.end()
    }
}

/// A scored way of dividing a partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitCandidate {
    pub orientation: Orientation,
    pub line: i32,
    /// 1.0 for an even 50/50 area split
    pub balance: f64,
    /// Mean short/long side ratio of the two halves
    pub squareness: f64,
    pub score: f64,
}

/// Why a partition stayed a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SkipReason {
    MaxDepth,
    TooSmall,
    NoCandidates,
}

/// Arena of partition nodes; id 0 is the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTree {
    nodes: Vec<PartitionNode>,
}

impl PartitionTree {
    /// An empty arena, before the root exists
    pub fn empty() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Create the root node covering `rect`. Returns its id.
    pub fn init_root(&mut self, rect: Rect) -> PartitionId {
        assert!(self.nodes.is_empty(), "partition root already exists");
        self.push(rect, 0, None)
    }

    pub fn nodes(&self) -> &[PartitionNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node. Panics on an id this tree never created.
    pub fn node(&self, id: PartitionId) -> &PartitionNode {
        match self.nodes.get(id.index()) {
            Some(node) => node,
            None => panic!("unknown partition {id} (tree has {} nodes)", self.nodes.len()),
        }
    }

    /// Leaf ids in creation order
    pub fn leaves(&self) -> Vec<PartitionId> {
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.id)
            .collect()
    }

    /// Split a leaf along `candidate`, returning the two new child ids
    pub fn split(&mut self, id: PartitionId, candidate: &SplitCandidate) -> (PartitionId, PartitionId) {
        let node = self.node(id).clone();
        assert!(node.is_leaf(), "partition {id} is already split");

        let (a, b) = split_rect(&node.rect, candidate.orientation, candidate.line);
        let left = self.push(a, node.depth + 1, Some(id));
        let right = self.push(b, node.depth + 1, Some(id));
        self.nodes[id.index()].split = Some(Split {
            orientation: candidate.orientation,
            line: candidate.line,
            left,
            right,
        });
        (left, right)
    }

    fn push(&mut self, rect: Rect, depth: u32, parent: Option<PartitionId>) -> PartitionId {
        let id = PartitionId(self.nodes.len() as u32);
        self.nodes.push(PartitionNode {
            id,
            rect,
            depth,
            split: None,
            parent,
        });
        id
    }
}

/// Divide `rect` at an absolute `line`
pub fn split_rect(rect: &Rect, orientation: Orientation, line: i32) -> (Rect, Rect) {
    match orientation {
        Orientation::Vertical => {
            let left_w = line - rect.x;
            (
                Rect::new(rect.x, rect.y, left_w, rect.h),
                Rect::new(line, rect.y, rect.w - left_w, rect.h),
            )
        }
        Orientation::Horizontal => {
            let top_h = line - rect.y;
            (
                Rect::new(rect.x, rect.y, rect.w, top_h),
                Rect::new(rect.x, line, rect.w, rect.h - top_h),
            )
        }
    }
}

fn min_leaf(config: &GeneratorConfig) -> i32 {
    cells(config.min_leaf_size.max(1))
}

/// Decide whether `node` must stay a leaf without sampling candidates
pub fn skip_reason(node: &PartitionNode, config: &GeneratorConfig) -> Option<SkipReason> {
    if node.depth >= config.max_depth {
        return Some(SkipReason::MaxDepth);
    }
    let span = min_leaf(config).saturating_mul(2);
    if node.rect.w < span && node.rect.h < span {
        return Some(SkipReason::TooSmall);
    }
    None
}

/// Sample up to `config.split_candidates` distinct scored splits of `rect`
pub fn sample_splits(rect: &Rect, config: &GeneratorConfig, rng: &mut SeededRng) -> Vec<SplitCandidate> {
    let min = min_leaf(config);
    let can_vertical = rect.w >= min.saturating_mul(2);
    let can_horizontal = rect.h >= min.saturating_mul(2);
    if !can_vertical && !can_horizontal {
        return Vec::new();
    }

    let mut candidates: Vec<SplitCandidate> = Vec::new();
    for _ in 0..config.split_candidates {
        let orientation = pick_orientation(rect, can_vertical, can_horizontal, rng);
        let line = match orientation {
            Orientation::Vertical => rect.x + rng.int_in_range(min, rect.w - min),
            Orientation::Horizontal => rect.y + rng.int_in_range(min, rect.h - min),
        };
        if candidates
            .iter()
            .any(|c| c.orientation == orientation && c.line == line)
        {
            continue;
        }
        candidates.push(score_split(rect, orientation, line));
    }
    candidates
}

fn pick_orientation(
    rect: &Rect,
    can_vertical: bool,
    can_horizontal: bool,
    rng: &mut SeededRng,
) -> Orientation {
    match (can_vertical, can_horizontal) {
        (true, false) => Orientation::Vertical,
        (false, true) => Orientation::Horizontal,
        _ => {
            let w = f64::from(rect.w);
            let h = f64::from(rect.h);
            if w / h >= ORIENTATION_BIAS {
                Orientation::Vertical
            } else if h / w >= ORIENTATION_BIAS {
                Orientation::Horizontal
            } else if rng.chance(0.5) {
                Orientation::Vertical
            } else {
                Orientation::Horizontal
            }
        }
    }
}

/// Score one split: balanced areas and square halves score higher
pub fn score_split(rect: &Rect, orientation: Orientation, line: i32) -> SplitCandidate {
    let (a, b) = split_rect(rect, orientation, line);
    let total = (a.area() + b.area()) as f64;
    let balance = if total > 0.0 {
        1.0 - ((a.area() as f64 / total) - 0.5).abs() * 2.0
    } else {
        0.0
    };
    let squareness = (a.squareness() + b.squareness()) / 2.0;
    SplitCandidate {
        orientation,
        line,
        balance,
        squareness,
        score: BALANCE_WEIGHT * balance + SQUARENESS_WEIGHT * squareness,
    }
}

/// Highest-scoring candidate; the earliest wins ties
pub fn best_split(candidates: &[SplitCandidate]) -> Option<&SplitCandidate> {
    candidates.iter().fold(None, |best, c| match best {
        Some(b) if b.score >= c.score => Some(b),
        _ => Some(c),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            min_leaf_size: 5,
            max_depth: 3,
            split_candidates: 8,
            ..GeneratorConfig::standard()
        }
    }

    #[test]
    fn test_split_rect_tiles_parent() {
        let r = Rect::new(2, 3, 20, 10);
        let (a, b) = split_rect(&r, Orientation::Vertical, 9);
        assert_eq!(a, Rect::new(2, 3, 7, 10));
        assert_eq!(b, Rect::new(9, 3, 13, 10));
        assert_eq!(a.area() + b.area(), r.area());

        let (c, d) = split_rect(&r, Orientation::Horizontal, 5);
        assert_eq!(c, Rect::new(2, 3, 20, 2));
        assert_eq!(d, Rect::new(2, 5, 20, 8));
    }

    #[test]
    fn test_even_split_scores_best_balance() {
        let r = Rect::new(0, 0, 20, 10);
        let even = score_split(&r, Orientation::Vertical, 10);
        let lopsided = score_split(&r, Orientation::Vertical, 15);
        assert_eq!(even.balance, 1.0);
        assert_eq!(even.squareness, 1.0);
        assert!(even.score > lopsided.score);
    }

    #[test]
    fn test_best_split_keeps_first_on_tie() {
        let r = Rect::new(0, 0, 20, 20);
        let a = score_split(&r, Orientation::Vertical, 10);
        let b = score_split(&r, Orientation::Horizontal, 10);
        assert_eq!(a.score, b.score);
        assert_eq!(best_split(&[a, b]), Some(&a));
        assert_eq!(best_split(&[]), None);
    }

    #[test]
    fn test_wide_rect_splits_vertically() {
        let mut rng = SeededRng::new("wide");
        let r = Rect::new(0, 0, 60, 20);
        let candidates = sample_splits(&r, &config(), &mut rng);
        assert!(!candidates.is_empty());
        for c in &candidates {
            assert_eq!(c.orientation, Orientation::Vertical);
            assert!(c.line >= 5 && c.line <= 55);
        }
    }

    #[test]
    fn test_candidates_are_distinct_and_leave_min_size() {
        let mut rng = SeededRng::new("distinct");
        let r = Rect::new(4, 4, 22, 21);
        let candidates = sample_splits(&r, &config(), &mut rng);
        for (i, a) in candidates.iter().enumerate() {
            let (x, y) = split_rect(&r, a.orientation, a.line);
            assert!(x.w >= 5 && x.h >= 5 && y.w >= 5 && y.h >= 5);
            for b in &candidates[i + 1..] {
                assert!(a.orientation != b.orientation || a.line != b.line);
            }
        }
    }

    #[test]
    fn test_too_narrow_yields_nothing() {
        let mut rng = SeededRng::new("narrow");
        let r = Rect::new(0, 0, 9, 9);
        assert!(sample_splits(&r, &config(), &mut rng).is_empty());
    }

    #[test]
    fn test_skip_reasons() {
        let cfg = config();
        let node = |rect, depth| PartitionNode {
            id: PartitionId(0),
            rect,
            depth,
            split: None,
            parent: None,
        };
        assert_eq!(
            skip_reason(&node(Rect::new(0, 0, 50, 50), 3), &cfg),
            Some(SkipReason::MaxDepth)
        );
        assert_eq!(
            skip_reason(&node(Rect::new(0, 0, 9, 9), 0), &cfg),
            Some(SkipReason::TooSmall)
        );
        assert_eq!(skip_reason(&node(Rect::new(0, 0, 10, 4), 0), &cfg), None);
        assert_eq!(SkipReason::MaxDepth.to_string(), "max-depth");
    }

    #[test]
    fn test_min_leaf_larger_than_any_grid_never_splits() {
        let cfg = GeneratorConfig {
            min_leaf_size: u32::MAX,
            ..config()
        };
        let node = PartitionNode {
            id: PartitionId(0),
            rect: Rect::new(0, 0, 40, 30),
            depth: 0,
            split: None,
            parent: None,
        };
        assert_eq!(skip_reason(&node, &cfg), Some(SkipReason::TooSmall));
        let mut rng = SeededRng::new("huge");
        assert!(sample_splits(&node.rect, &cfg, &mut rng).is_empty());
    }

    #[test]
    fn test_tree_split_links_ids() {
        let mut tree = PartitionTree::empty();
        let root = tree.init_root(Rect::new(0, 0, 30, 20));
        let cand = score_split(&tree.node(root).rect, Orientation::Vertical, 12);
        let (l, r) = tree.split(root, &cand);

        assert_eq!(tree.len(), 3);
        assert!(!tree.node(root).is_leaf());
        assert_eq!(tree.node(l).parent, Some(root));
        assert_eq!(tree.node(r).depth, 1);
        assert_eq!(tree.leaves(), vec![l, r]);
        let split = tree.node(root).split.unwrap();
        assert_eq!((split.left, split.right, split.line), (l, r, 12));
    }

    #[test]
    #[should_panic(expected = "unknown partition")]
    fn test_unknown_partition_panics() {
        let tree = PartitionTree::empty();
        tree.node(PartitionId(4));
    }

    #[test]
    fn test_serializes_as_plain_ids() {
        let mut tree = PartitionTree::empty();
        let root = tree.init_root(Rect::new(0, 0, 10, 10));
        let cand = score_split(&Rect::new(0, 0, 10, 10), Orientation::Horizontal, 5);
        tree.split(root, &cand);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["nodes"][1]["parent"], 0);
        assert_eq!(json["nodes"][0]["split"]["orientation"], "horizontal");
        assert_eq!(json["nodes"][0]["isLeaf"], false);
        assert_eq!(json["nodes"][1]["isLeaf"], true);

        let back: PartitionTree = serde_json::from_value(json).unwrap();
        assert_eq!(back, tree);
    }
}
