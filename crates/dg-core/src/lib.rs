//! dg-core: stepwise rooms-and-corridors dungeon generation
//!
//! A [`DungeonGenerator`] turns a seed and a [`GeneratorConfig`] into a tile
//! grid through a fixed pipeline: binary space partitioning, one room per
//! leaf, a randomized Kruskal spanning tree with optional loop edges, and
//! A* corridors carved a cell at a time. Every call to
//! [`DungeonGenerator::next_step`] performs one unit of work and returns a
//! [`GenEvent`] describing it.
//!
//! The crate does no I/O beyond optional config file loading and is fully
//! deterministic: the same seed and config always yield the same events and
//! the same grid.

pub mod config;
pub mod dsu;
pub mod event;
pub mod generator;
pub mod geom;
pub mod graph;
pub mod heap;
pub mod overlay;
pub mod partition;
pub mod pathfind;
pub mod room;
pub mod tile;

pub use config::{ConfigError, GeneratorConfig};
pub use event::GenEvent;
pub use generator::{CorridorPlan, DungeonGenerator, GeneratorState, PathStats};
pub use geom::{Point, Rect};
pub use graph::{GraphEdge, GraphPhase};
pub use overlay::{Overlay, OverlayDetail, Stage};
pub use partition::{PartitionId, PartitionNode};
pub use room::{Room, RoomId};
pub use tile::{Tile, TileError, TileGrid};

pub use dg_rng::SeededRng;
