//! The stepwise generator
//!
//! [`DungeonGenerator`] owns the grid and every intermediate list and moves
//! through [`Stage`]s one unit of work per [`DungeonGenerator::next_step`]
//! call. A stage is left at the end of the step that exhausts it, so every
//! call made before [`Stage::Done`] mutates something. Once done, further
//! calls keep returning the same `done` event.
//!
//! The generator serializes in full, RNG included, so a paused run can be
//! snapshotted and resumed with an identical continuation.

use std::collections::VecDeque;

use dg_rng::SeededRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{ConfigError, GeneratorConfig, cells};
use crate::dsu::DisjointSet;
use crate::event::{GenEvent, PATH_PREVIEW_LEN, infinite_as_null};
use crate::geom::{Point, Rect};
use crate::graph::{GraphEdge, GraphPhase, candidate_edges};
use crate::overlay::{Focus, Overlay, OverlayDetail, Stage};
use crate::partition::{
    PartitionId, PartitionNode, PartitionTree, SkipReason, best_split, sample_splits, skip_reason,
};
use crate::pathfind::find_path;
use crate::room::{
    FallbackReason, Room, RoomId, best_room, fallback_room, sample_rooms, usable_area,
};
use crate::tile::{Tile, TileGrid};

/// Search statistics for one corridor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStats {
    /// Nodes expanded by A*
    pub visited: usize,
    /// Cells in the path, endpoints included
    pub length: usize,
    /// Total step cost, infinite for a fallback path
    #[serde(with = "infinite_as_null")]
    pub cost: f64,
    pub fallback: bool,
}

/// A planned corridor between two rooms, one per accepted graph edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorridorPlan {
    pub id: usize,
    pub from: RoomId,
    pub to: RoomId,
    /// Door cell on `from`'s edge
    pub start: Point,
    /// Door cell on `to`'s edge
    pub goal: Point,
    pub path: Vec<Point>,
    pub stats: PathStats,
    /// Cells of `path` carved so far
    pub carved: usize,
}

impl CorridorPlan {
    pub fn is_carved(&self) -> bool {
        self.carved >= self.path.len()
    }
}

/// Borrowed read-only view of the generator's canonical state
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorState<'a> {
    pub stage: Stage,
    pub width: i32,
    pub height: i32,
    /// Row-major tile values
    pub tiles: &'a [Tile],
    pub partitions: &'a [PartitionNode],
    pub rooms: &'a [Room],
    pub graph_candidate_edges: &'a [GraphEdge],
    pub graph_accepted_edges: &'a [GraphEdge],
    pub corridor_plans: &'a [CorridorPlan],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonGenerator {
    seed: String,
    config: GeneratorConfig,
    rng: SeededRng,
    stage: Stage,
    grid: TileGrid,

    partitions: PartitionTree,
    pending: VecDeque<PartitionId>,

    leaves: Vec<PartitionId>,
    next_leaf: usize,
    rooms: Vec<Room>,

    candidates: Vec<GraphEdge>,
    components: DisjointSet,
    next_candidate: usize,
    tree_edges: usize,
    /// Indices into `candidates` left out of the spanning tree
    loop_pool: Vec<usize>,
    next_loop: usize,
    loops: u32,
    accepted: Vec<GraphEdge>,

    plans: Vec<CorridorPlan>,
    doors_placed: usize,

    focus: Focus,
}

impl DungeonGenerator {
    /// Create a generator for `seed`. Only malformed configs are rejected.
    pub fn new(seed: &str, config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = TileGrid::new(cells(config.width), cells(config.height));
        debug!(seed, width = config.width, height = config.height, "generator created");
        Ok(Self {
            seed: seed.to_owned(),
            rng: SeededRng::new(seed),
            config,
            stage: Stage::Init,
            grid,
            partitions: PartitionTree::empty(),
            pending: VecDeque::new(),
            leaves: Vec::new(),
            next_leaf: 0,
            rooms: Vec::new(),
            candidates: Vec::new(),
            components: DisjointSet::new(0),
            next_candidate: 0,
            tree_edges: 0,
            loop_pool: Vec::new(),
            next_loop: 0,
            loops: 0,
            accepted: Vec::new(),
            plans: Vec::new(),
            doors_placed: 0,
            focus: Focus::Idle,
        })
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn partitions(&self) -> &PartitionTree {
        &self.partitions
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Look up a placed room. Panics on an id that was never created.
    pub fn room(&self, id: RoomId) -> &Room {
        match self.rooms.get(id.index()) {
            Some(room) => room,
            None => panic!("unknown {id} ({} rooms placed)", self.rooms.len()),
        }
    }

    pub fn candidate_edges(&self) -> &[GraphEdge] {
        &self.candidates
    }

    pub fn accepted_edges(&self) -> &[GraphEdge] {
        &self.accepted
    }

    /// Loop edges accepted on top of the spanning tree
    pub fn loop_count(&self) -> u32 {
        self.loops
    }

    pub fn corridor_plans(&self) -> &[CorridorPlan] {
        &self.plans
    }

    /// Borrowed snapshot, valid until the next step
    pub fn state(&self) -> GeneratorState<'_> {
        GeneratorState {
            stage: self.stage,
            width: self.grid.width(),
            height: self.grid.height(),
            tiles: self.grid.cells(),
            partitions: self.partitions.nodes(),
            rooms: &self.rooms,
            graph_candidate_edges: &self.candidates,
            graph_accepted_edges: &self.accepted,
            corridor_plans: &self.plans,
        }
    }

    /// Perform one unit of work and describe it
    pub fn next_step(&mut self) -> GenEvent {
        let event = match self.stage {
            Stage::Init => self.step_init(),
            Stage::Bsp => self.step_bsp(),
            Stage::Rooms => self.step_rooms(),
            Stage::Graph => self.step_graph(),
            Stage::CorridorPlan => self.step_plan(),
            Stage::CorridorCarve => self.step_carve(),
            Stage::Post => self.step_post(),
            Stage::Done => return self.done_event(),
        };
        self.settle();
        trace!(event = event.kind(), stage = %self.stage, "step");
        event
    }

    /// Step until done. The returned events end with the `done` event.
    pub fn run_to_completion(&mut self) -> Vec<GenEvent> {
        let mut events = Vec::new();
        while !self.is_done() {
            events.push(self.next_step());
        }
        events.push(self.next_step());
        events
    }

    fn done_event(&self) -> GenEvent {
        GenEvent::Done {
            rooms: self.rooms.len(),
            corridors: self.plans.len(),
        }
    }

    fn enter(&mut self, stage: Stage) {
        debug!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }

    /// Leave every stage that has no work left
    fn settle(&mut self) {
        loop {
            let next = match self.stage {
                Stage::Bsp if self.pending.is_empty() => {
                    self.leaves = self.partitions.leaves();
                    self.next_leaf = 0;
                    Stage::Rooms
                }
                Stage::Rooms if self.next_leaf >= self.leaves.len() => {
                    self.build_graph_candidates();
                    Stage::Graph
                }
                Stage::Graph if self.graph_exhausted() => Stage::CorridorPlan,
                Stage::CorridorPlan if self.plans.last().is_some_and(|p| !p.is_carved()) => {
                    Stage::CorridorCarve
                }
                Stage::CorridorPlan if self.plans.len() >= self.accepted.len() => Stage::Post,
                Stage::CorridorCarve if self.plans.last().is_none_or(CorridorPlan::is_carved) => {
                    Stage::CorridorPlan
                }
                Stage::Post if self.doors_placed >= self.plans.len() => Stage::Done,
                _ => return,
            };
            self.enter(next);
        }
    }

    fn step_init(&mut self) -> GenEvent {
        let root = self.partitions.init_root(self.grid.bounds());
        self.pending.push_back(root);
        self.enter(Stage::Bsp);
        GenEvent::Init {
            seed: self.seed.clone(),
            width: self.grid.width(),
            height: self.grid.height(),
        }
    }

    fn step_bsp(&mut self) -> GenEvent {
        let Some(id) = self.pending.pop_front() else {
            panic!("bsp step with no pending partition");
        };
        let node = self.partitions.node(id).clone();
        if let Some(reason) = skip_reason(&node, &self.config) {
            return self.skip_split(&node, reason);
        }

        let candidates = sample_splits(&node.rect, &self.config, &mut self.rng);
        let Some(chosen) = best_split(&candidates).copied() else {
            return self.skip_split(&node, SkipReason::NoCandidates);
        };
        let (left, right) = self.partitions.split(id, &chosen);
        self.pending.push_back(left);
        self.pending.push_back(right);

        self.focus = Focus::Split {
            node: id,
            candidates: candidates.clone(),
            chosen: Some(chosen),
        };
        GenEvent::SplitChosen {
            node: id,
            rect: node.rect,
            depth: node.depth,
            candidates,
            chosen,
            left,
            right,
        }
    }

    fn skip_split(&mut self, node: &PartitionNode, reason: SkipReason) -> GenEvent {
        self.focus = Focus::Split {
            node: node.id,
            candidates: Vec::new(),
            chosen: None,
        };
        GenEvent::SplitSkipped {
            node: node.id,
            rect: node.rect,
            depth: node.depth,
            reason,
        }
    }

    fn step_rooms(&mut self) -> GenEvent {
        let leaf = self.leaves[self.next_leaf];
        self.next_leaf += 1;
        let leaf_rect = self.partitions.node(leaf).rect;
        let room = RoomId(self.rooms.len() as u32);

        let sample = sample_rooms(&leaf_rect, &self.rooms, &self.config, &mut self.rng);
        if let Some(chosen) = best_room(&sample.candidates).copied() {
            self.place_room(room, chosen.rect, leaf);
            self.focus = Focus::Room {
                leaf,
                candidates: sample.candidates.clone(),
                room,
                fallback: false,
            };
            return GenEvent::RoomChosen {
                leaf,
                leaf_rect,
                candidates: sample.candidates,
                chosen,
                room,
                rejected: sample.rejected,
            };
        }

        let rect = fallback_room(&leaf_rect, &self.config);
        debug!(%leaf, rejected = sample.rejected, "no room candidate fit, using fallback room");
        self.place_room(room, rect, leaf);
        self.focus = Focus::Room {
            leaf,
            candidates: Vec::new(),
            room,
            fallback: true,
        };
        GenEvent::RoomFallback {
            leaf,
            leaf_rect,
            room,
            rect,
            reason: FallbackReason::NoCandidateFit,
        }
    }

    fn place_room(&mut self, id: RoomId, rect: Rect, leaf: PartitionId) {
        self.grid.carve_room(&rect);
        self.rooms.push(Room::new(id, rect, leaf));
    }

    fn build_graph_candidates(&mut self) {
        self.candidates = candidate_edges(&self.rooms, self.config.k_nearest as usize, &mut self.rng);
        self.components = DisjointSet::new(self.rooms.len());
        debug!(rooms = self.rooms.len(), candidates = self.candidates.len(), "graph candidates built");
    }

    fn tree_complete(&self) -> bool {
        self.tree_edges + 1 >= self.rooms.len()
    }

    fn loops_enabled(&self) -> bool {
        self.config.extra_loop_chance > 0.0 && self.config.max_loops > 0
    }

    fn graph_exhausted(&self) -> bool {
        if !self.tree_complete() {
            return self.next_candidate >= self.candidates.len();
        }
        !self.loops_enabled() || self.loops >= self.config.max_loops || self.next_loop >= self.loop_pool.len()
    }

    fn step_graph(&mut self) -> GenEvent {
        if !self.tree_complete() {
            let index = self.next_candidate;
            self.next_candidate += 1;
            let edge = self.candidates[index];
            let accepted = self.components.union(edge.a.index(), edge.b.index());
            if accepted {
                self.accepted.push(edge);
                self.tree_edges += 1;
            } else {
                self.loop_pool.push(index);
            }
            if self.tree_complete() {
                self.loop_pool.extend(self.next_candidate..self.candidates.len());
                debug!(tree_edges = self.tree_edges, loop_pool = self.loop_pool.len(), "spanning tree complete");
            }
            self.focus = Focus::Edge {
                edge,
                accepted,
                phase: GraphPhase::Tree,
            };
            return GenEvent::GraphEdgeConsidered {
                edge,
                accepted,
                phase: GraphPhase::Tree,
                tree_size: self.tree_edges,
            };
        }

        let edge = self.candidates[self.loop_pool[self.next_loop]];
        self.next_loop += 1;
        let accepted = self.rng.chance(self.config.extra_loop_chance);
        self.focus = Focus::Edge {
            edge,
            accepted,
            phase: GraphPhase::Loop,
        };
        if accepted {
            self.accepted.push(edge);
            self.loops += 1;
            GenEvent::GraphLoopAdded {
                edge,
                loops: self.loops,
            }
        } else {
            GenEvent::GraphEdgeConsidered {
                edge,
                accepted: false,
                phase: GraphPhase::Loop,
                tree_size: self.tree_edges,
            }
        }
    }

    fn step_plan(&mut self) -> GenEvent {
        let id = self.plans.len();
        let edge = self.accepted[id];
        let from = *self.room(edge.a);
        let to = *self.room(edge.b);
        let start = from.door_point_toward(to.center);
        let goal = to.door_point_toward(from.center);

        let result = find_path(&self.grid, start, goal, &self.config.cost_params());
        if result.fallback {
            debug!(plan = id, ?start, ?goal, "no corridor route, using direct fallback");
        }
        let stats = PathStats {
            visited: result.visited,
            length: result.path.len(),
            cost: result.cost,
            fallback: result.fallback,
        };
        let preview = result.path.iter().take(PATH_PREVIEW_LEN).copied().collect();
        self.plans.push(CorridorPlan {
            id,
            from: from.id,
            to: to.id,
            start,
            goal,
            path: result.path,
            stats,
            carved: 0,
        });
        self.focus = Focus::Corridor { plan: id };

        GenEvent::CorridorPathFound {
            plan: id,
            from: from.id,
            to: to.id,
            start,
            goal,
            preview,
            path_len: stats.length,
            visited: stats.visited,
            cost: stats.cost,
            fallback: stats.fallback,
        }
    }

    fn step_carve(&mut self) -> GenEvent {
        let Some(plan) = self.plans.last_mut() else {
            panic!("carve step with no corridor plan");
        };
        let index = plan.carved;
        let point = plan.path[index];
        let carved = self.grid.carve_corridor(point);
        plan.carved += 1;
        let id = plan.id;

        self.focus = Focus::Corridor { plan: id };
        GenEvent::CorridorCarveCell {
            plan: id,
            index,
            point,
            carved,
        }
    }

    fn step_post(&mut self) -> GenEvent {
        let plan = &self.plans[self.doors_placed];
        let (id, start, goal) = (plan.id, plan.start, plan.goal);
        self.grid.place_door(start);
        self.grid.place_door(goal);
        self.doors_placed += 1;

        self.focus = Focus::Door { plan: id };
        GenEvent::DoorPlaced { plan: id, point: start }
    }

    /// Fresh visualization snapshot of the last step
    pub fn overlay(&self) -> Overlay {
        if self.is_done() {
            return Overlay {
                stage: self.stage,
                message: format!(
                    "Dungeon complete: {} rooms, {} corridors",
                    self.rooms.len(),
                    self.plans.len()
                ),
                detail: OverlayDetail::Empty,
            };
        }

        let (message, detail) = match &self.focus {
            Focus::Idle => (
                format!("Ready to partition a {}x{} grid", self.grid.width(), self.grid.height()),
                OverlayDetail::Empty,
            ),
            Focus::Split {
                node,
                candidates,
                chosen,
            } => {
                let rect = self.partitions.node(*node).rect;
                let message = match chosen {
                    Some(c) => format!(
                        "Split partition {node} {} at {} ({} candidates)",
                        c.orientation,
                        c.line,
                        candidates.len()
                    ),
                    None => format!("Partition {node} stays a leaf"),
                };
                let detail = OverlayDetail::Partition {
                    node: *node,
                    rect,
                    candidates: candidates.clone(),
                    chosen: *chosen,
                    pending: self.pending.len(),
                };
                (message, detail)
            }
            Focus::Room {
                leaf,
                candidates,
                room,
                fallback,
            } => {
                let leaf_rect = self.partitions.node(*leaf).rect;
                let placed = self.room(*room);
                let message = if *fallback {
                    format!("No candidate fit partition {leaf}, placed fallback {room}")
                } else {
                    format!("Placed {room} in partition {leaf} ({} candidates)", candidates.len())
                };
                let detail = OverlayDetail::Room {
                    leaf: *leaf,
                    leaf_rect,
                    interior: usable_area(&leaf_rect, &self.config),
                    candidates: candidates.clone(),
                    chosen: placed.rect,
                    fallback: *fallback,
                };
                (message, detail)
            }
            Focus::Edge {
                edge,
                accepted,
                phase,
            } => {
                let message = match (phase, accepted) {
                    (GraphPhase::Tree, true) => format!(
                        "Tree edge {} to {} accepted ({}/{})",
                        edge.a,
                        edge.b,
                        self.tree_edges,
                        self.rooms.len().saturating_sub(1)
                    ),
                    (GraphPhase::Tree, false) => {
                        format!("Edge {} to {} would close a cycle", edge.a, edge.b)
                    }
                    (GraphPhase::Loop, true) => format!(
                        "Loop edge {} to {} added ({}/{})",
                        edge.a, edge.b, self.loops, self.config.max_loops
                    ),
                    (GraphPhase::Loop, false) => {
                        format!("Loop edge {} to {} passed over", edge.a, edge.b)
                    }
                };
                let detail = OverlayDetail::Graph {
                    edge: *edge,
                    accepted: *accepted,
                    phase: *phase,
                    tree_edges: self.tree_edges,
                    loops: self.loops,
                };
                (message, detail)
            }
            Focus::Corridor { plan } => {
                let p = &self.plans[*plan];
                let message = if p.carved == 0 {
                    format!(
                        "Planned corridor {plan} from {} to {} ({} cells)",
                        p.from,
                        p.to,
                        p.path.len()
                    )
                } else {
                    format!("Carving corridor {plan}: {}/{}", p.carved, p.path.len())
                };
                let detail = OverlayDetail::Corridor {
                    plan: *plan,
                    from: p.from,
                    to: p.to,
                    path: p.path.clone(),
                    carve_index: p.carved,
                };
                (message, detail)
            }
            Focus::Door { plan } => (
                format!("Placed doors for corridor {plan}"),
                OverlayDetail::Doors {
                    placed: self.doors_placed,
                    total: self.plans.len(),
                },
            ),
        };

        Overlay {
            stage: self.stage,
            message,
            detail,
        }
    }
}
