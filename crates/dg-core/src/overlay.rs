//! Visualization snapshot
//!
//! An [`Overlay`] is rebuilt from scratch on every request out of the
//! generator's canonical state plus a small [`Focus`] record of the last
//! decision. Nothing here is ever patched incrementally.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::geom::{Point, Rect};
use crate::graph::{GraphEdge, GraphPhase};
use crate::partition::{PartitionId, SplitCandidate};
use crate::room::{RoomCandidate, RoomId};

/// Generator stages, in the order they run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    Init,
    Bsp,
    Rooms,
    Graph,
    CorridorPlan,
    CorridorCarve,
    Post,
    Done,
}

/// The last decision made, kept so the overlay can show it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub(crate) enum Focus {
    #[default]
    Idle,
    Split {
        node: PartitionId,
        candidates: Vec<SplitCandidate>,
        chosen: Option<SplitCandidate>,
    },
    Room {
        leaf: PartitionId,
        candidates: Vec<RoomCandidate>,
        room: RoomId,
        fallback: bool,
    },
    Edge {
        edge: GraphEdge,
        accepted: bool,
        phase: GraphPhase,
    },
    Corridor {
        plan: usize,
    },
    Door {
        plan: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub stage: Stage,
    /// One line describing the last step
    pub message: String,
    pub detail: OverlayDetail,
}

/// Stage-specific partial data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum OverlayDetail {
    Empty,
    Partition {
        node: PartitionId,
        rect: Rect,
        candidates: Vec<SplitCandidate>,
        chosen: Option<SplitCandidate>,
        /// Partitions still waiting to be examined
        pending: usize,
    },
    Room {
        leaf: PartitionId,
        leaf_rect: Rect,
        /// Margin-shrunk area the room had to fit in
        interior: Rect,
        candidates: Vec<RoomCandidate>,
        chosen: Rect,
        fallback: bool,
    },
    Graph {
        edge: GraphEdge,
        accepted: bool,
        phase: GraphPhase,
        tree_edges: usize,
        loops: u32,
    },
    Corridor {
        plan: usize,
        from: RoomId,
        to: RoomId,
        path: Vec<Point>,
        /// Cells of `path` already carved
        carve_index: usize,
    },
    Doors {
        placed: usize,
        total: usize,
    },
}
