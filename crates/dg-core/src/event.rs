//! Step events
//!
//! Every call to [`crate::DungeonGenerator::next_step`] returns one
//! `GenEvent` describing the single mutation it made. The serialized form is
//! tagged by `"type"` with kebab-case variant names and camelCase fields, and
//! is what UIs and trace logs consume.

use serde::{Deserialize, Serialize};

use crate::geom::{Point, Rect};
use crate::graph::{GraphEdge, GraphPhase};
use crate::partition::{PartitionId, SkipReason, SplitCandidate};
use crate::room::{FallbackReason, RoomCandidate, RoomId};

/// Number of path points carried by a `corridor-path-found` event
pub const PATH_PREVIEW_LEN: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum GenEvent {
    /// Root partition created
    Init { seed: String, width: i32, height: i32 },
    SplitChosen {
        node: PartitionId,
        rect: Rect,
        depth: u32,
        candidates: Vec<SplitCandidate>,
        chosen: SplitCandidate,
        left: PartitionId,
        right: PartitionId,
    },
    SplitSkipped {
        node: PartitionId,
        rect: Rect,
        depth: u32,
        reason: SkipReason,
    },
    RoomChosen {
        leaf: PartitionId,
        leaf_rect: Rect,
        candidates: Vec<RoomCandidate>,
        chosen: RoomCandidate,
        room: RoomId,
        /// Samples dropped for crowding an earlier room
        rejected: u32,
    },
    RoomFallback {
        leaf: PartitionId,
        leaf_rect: Rect,
        room: RoomId,
        rect: Rect,
        reason: FallbackReason,
    },
    GraphEdgeConsidered {
        edge: GraphEdge,
        accepted: bool,
        phase: GraphPhase,
        /// Spanning tree edges accepted so far
        tree_size: usize,
    },
    GraphLoopAdded {
        edge: GraphEdge,
        /// Loop edges accepted so far, including this one
        loops: u32,
    },
    CorridorPathFound {
        plan: usize,
        from: RoomId,
        to: RoomId,
        start: Point,
        goal: Point,
        /// First points of the path
        preview: Vec<Point>,
        path_len: usize,
        visited: usize,
        #[serde(with = "infinite_as_null")]
        cost: f64,
        fallback: bool,
    },
    CorridorCarveCell {
        plan: usize,
        index: usize,
        point: Point,
        /// False when the cell was already open
        carved: bool,
    },
    /// Both endpoints of the plan become doors; only `start` is reported
    DoorPlaced { plan: usize, point: Point },
    Done { rooms: usize, corridors: usize },
}

impl GenEvent {
    /// The kebab-case wire name of this event
    pub fn kind(&self) -> &'static str {
        match self {
            GenEvent::Init { .. } => "init",
            GenEvent::SplitChosen { .. } => "split-chosen",
            GenEvent::SplitSkipped { .. } => "split-skipped",
            GenEvent::RoomChosen { .. } => "room-chosen",
            GenEvent::RoomFallback { .. } => "room-fallback",
            GenEvent::GraphEdgeConsidered { .. } => "graph-edge-considered",
            GenEvent::GraphLoopAdded { .. } => "graph-loop-added",
            GenEvent::CorridorPathFound { .. } => "corridor-path-found",
            GenEvent::CorridorCarveCell { .. } => "corridor-carve-cell",
            GenEvent::DoorPlaced { .. } => "door-placed",
            GenEvent::Done { .. } => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, GenEvent::Done { .. })
    }
}

/// JSON has no infinity; an unreachable cost travels as `null`.
pub(crate) mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cost: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if cost.is_finite() {
            serializer.serialize_f64(*cost)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tag_and_field_names() {
        let event = GenEvent::RoomFallback {
            leaf: PartitionId(3),
            leaf_rect: Rect::new(0, 0, 10, 10),
            room: RoomId(1),
            rect: Rect::new(2, 2, 6, 6),
            reason: FallbackReason::NoCandidateFit,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "room-fallback");
        assert_eq!(json["leafRect"]["w"], 10);
        assert_eq!(json["reason"], "no-candidate-fit");
        assert_eq!(event.kind(), "room-fallback");
    }

    #[test]
    fn test_infinite_cost_round_trips_as_null() {
        let event = GenEvent::CorridorPathFound {
            plan: 0,
            from: RoomId(0),
            to: RoomId(1),
            start: Point::new(1, 1),
            goal: Point::new(9, 9),
            preview: vec![Point::new(1, 1), Point::new(9, 9)],
            path_len: 2,
            visited: 40,
            cost: f64::INFINITY,
            fallback: true,
        };
        let text = serde_json::to_string(&event).unwrap();
        assert!(text.contains("\"cost\":null"), "{text}");
        let back: GenEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_done_event() {
        let done = GenEvent::Done { rooms: 4, corridors: 5 };
        assert!(done.is_done());
        assert_eq!(
            serde_json::to_string(&done).unwrap(),
            r#"{"type":"done","rooms":4,"corridors":5}"#
        );
    }
}
