//! Room connectivity candidates
//!
//! Every room proposes edges to its `k` nearest neighbours by center
//! distance. If that graph leaves some rooms unreachable, the shortest
//! cross-component pair is added until it is connected, so the spanning tree
//! built from these candidates always reaches every room.
//!
//! Candidates are ordered by distance; each carries a random tie-break key
//! drawn once here, which is what makes the Kruskal pass randomized among
//! equal-length edges.

use std::collections::BTreeSet;

use dg_rng::SeededRng;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::dsu::DisjointSet;
use crate::room::{Room, RoomId};

/// An undirected connection between two rooms, `a < b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub a: RoomId,
    pub b: RoomId,
    /// Euclidean distance between the room centers
    pub weight: f64,
}

impl GraphEdge {
    pub fn new(a: RoomId, b: RoomId, weight: f64) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self { a, b, weight }
    }

    pub fn same_pair(&self, other: &GraphEdge) -> bool {
        self.a == other.a && self.b == other.b
    }
}

/// Which part of the graph stage considered an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GraphPhase {
    /// Building the spanning tree
    Tree,
    /// Adding extra loop edges
    Loop,
}

/// Build the sorted, deduplicated candidate edge list
pub fn candidate_edges(rooms: &[Room], k_nearest: usize, rng: &mut SeededRng) -> Vec<GraphEdge> {
    let n = rooms.len();
    if n < 2 {
        return Vec::new();
    }
    let dist = |i: usize, j: usize| rooms[i].center.distance(rooms[j].center);

    let mut pairs: BTreeSet<(usize, usize)> = BTreeSet::new();
    for i in 0..n {
        let mut others: Vec<(f64, usize)> = (0..n).filter(|&j| j != i).map(|j| (dist(i, j), j)).collect();
        others.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
        for &(_, j) in others.iter().take(k_nearest) {
            pairs.insert((i.min(j), i.max(j)));
        }
    }

    let mut components = DisjointSet::new(n);
    for &(i, j) in &pairs {
        components.union(i, j);
    }
    while components.component_count() > 1 {
        let mut bridge: Option<(f64, usize, usize)> = None;
        for i in 0..n {
            for j in (i + 1)..n {
                if components.connected(i, j) {
                    continue;
                }
                let d = dist(i, j);
                if bridge.is_none_or(|(best, _, _)| d < best) {
                    bridge = Some((d, i, j));
                }
            }
        }
        let Some((_, i, j)) = bridge else { break };
        pairs.insert((i, j));
        components.union(i, j);
    }

    let mut keyed: Vec<(u32, GraphEdge)> = pairs
        .into_iter()
        .map(|(i, j)| {
            let edge = GraphEdge::new(rooms[i].id, rooms[j].id, dist(i, j));
            (rng.next_raw(), edge)
        })
        .collect();
    keyed.sort_by(|(ka, ea), (kb, eb)| {
        ea.weight
            .total_cmp(&eb.weight)
            .then(ka.cmp(kb))
            .then((ea.a, ea.b).cmp(&(eb.a, eb.b)))
    });
    keyed.into_iter().map(|(_, edge)| edge).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;
    use crate::partition::PartitionId;

    fn room_at(id: u32, x: i32, y: i32) -> Room {
        Room::new(RoomId(id), Rect::new(x, y, 3, 3), PartitionId(id))
    }

    #[test]
    fn test_edges_are_deduplicated_and_sorted() {
        let rooms = vec![room_at(0, 0, 0), room_at(1, 10, 0), room_at(2, 30, 0)];
        let mut rng = SeededRng::new("edges");
        let edges = candidate_edges(&rooms, 2, &mut rng);
        assert_eq!(edges.len(), 3);
        for pair in edges.windows(2) {
            assert!(pair[0].weight <= pair[1].weight);
        }
        for (i, e) in edges.iter().enumerate() {
            assert!(e.a < e.b);
            for other in &edges[i + 1..] {
                assert!(!e.same_pair(other));
            }
        }
    }

    #[test]
    fn test_single_room_has_no_edges() {
        let mut rng = SeededRng::new("solo");
        assert!(candidate_edges(&[room_at(0, 0, 0)], 4, &mut rng).is_empty());
    }

    #[test]
    fn test_disconnected_clusters_are_bridged() {
        // Two tight clusters far apart; with k=1 each cluster only links
        // internally, so a bridge must be added
        let rooms = vec![
            room_at(0, 0, 0),
            room_at(1, 4, 0),
            room_at(2, 100, 0),
            room_at(3, 104, 0),
        ];
        let mut rng = SeededRng::new("bridge");
        let edges = candidate_edges(&rooms, 1, &mut rng);
        let mut set = DisjointSet::new(rooms.len());
        for e in &edges {
            set.union(e.a.index(), e.b.index());
        }
        assert_eq!(set.component_count(), 1);
        // The bridge is the shortest cross pair: room 1 to room 2
        assert!(edges.iter().any(|e| e.a == RoomId(1) && e.b == RoomId(2)));
    }

    #[test]
    fn test_zero_k_still_connects() {
        let rooms: Vec<Room> = (0..5).map(|i| room_at(i, i as i32 * 7, (i as i32 % 2) * 9)).collect();
        let mut rng = SeededRng::new("k0");
        let edges = candidate_edges(&rooms, 0, &mut rng);
        assert_eq!(edges.len(), rooms.len() - 1);
    }

    #[test]
    fn test_same_seed_same_order() {
        let rooms: Vec<Room> = (0..6).map(|i| room_at(i, (i as i32 % 3) * 10, (i as i32 / 3) * 10)).collect();
        let a = candidate_edges(&rooms, 3, &mut SeededRng::new("order"));
        let b = candidate_edges(&rooms, 3, &mut SeededRng::new("order"));
        assert_eq!(a, b);
    }
}
