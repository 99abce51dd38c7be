//! dg-export: export documents for generated dungeons
//!
//! Turns a generator's state into a self-contained JSON document: the tile
//! grid as run-length pairs, rooms with their neighbours, corridor
//! connections, and a validation block with a reachability check.

use std::collections::{BTreeSet, VecDeque};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dg_core::{GeneratorConfig, GeneratorState, Point, Rect, RoomId, Tile, TileError};

/// Current export format version
pub const EXPORT_VERSION: u32 = 1;

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Export file not found")]
    NotFound,

    #[error("Not a dungeon export (format {0:?})")]
    InvalidFormat(String),

    #[error("Incompatible export version: expected {expected}, found {found}")]
    IncompatibleVersion { expected: u32, found: u32 },

    #[error("Tile runs cover {found} cells, expected {expected}")]
    LengthMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Tile(#[from] TileError),
}

/// Run-length encode tiles as `(value, count)` pairs in row-major order
pub fn encode_rle(tiles: &[Tile]) -> Vec<(u8, u32)> {
    let mut runs: Vec<(u8, u32)> = Vec::new();
    for &tile in tiles {
        let value = u8::from(tile);
        match runs.last_mut() {
            Some((last, count)) if *last == value => *count += 1,
            _ => runs.push((value, 1)),
        }
    }
    runs
}

/// Expand run-length pairs back into exactly `len` tiles
pub fn decode_rle(runs: &[(u8, u32)], len: usize) -> Result<Vec<Tile>, ExportError> {
    let found: usize = runs.iter().map(|&(_, count)| count as usize).sum();
    if found != len {
        return Err(ExportError::LengthMismatch { expected: len, found });
    }
    let mut tiles = Vec::with_capacity(len);
    for &(value, count) in runs {
        let tile = Tile::try_from(value)?;
        tiles.extend(std::iter::repeat_n(tile, count as usize));
    }
    Ok(tiles)
}

/// Export header for versioning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportHeader {
    /// Format identifier
    pub format: String,
    pub version: u32,
    pub seed: String,
    pub width: i32,
    pub height: i32,
}

impl ExportHeader {
    const FORMAT: &'static str = "dungeon-export";

    pub fn new(seed: &str, width: i32, height: i32) -> Self {
        Self {
            format: Self::FORMAT.to_string(),
            version: EXPORT_VERSION,
            seed: seed.to_string(),
            width,
            height,
        }
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.format != Self::FORMAT {
            return Err(ExportError::InvalidFormat(self.format.clone()));
        }
        if self.version != EXPORT_VERSION {
            return Err(ExportError::IncompatibleVersion {
                expected: EXPORT_VERSION,
                found: self.version,
            });
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRoom {
    pub id: RoomId,
    pub rect: Rect,
    pub center: Point,
    pub area: i64,
    /// Rooms joined to this one by an accepted edge, ascending
    pub neighbors: Vec<RoomId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConnection {
    pub id: usize,
    pub from: RoomId,
    pub to: RoomId,
    /// Start and goal door cells
    pub doors: [Point; 2],
    pub path_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub room_count: usize,
    pub corridor_tiles: usize,
    pub door_count: usize,
    /// Sum of corridor path lengths
    pub total_corridor_length: usize,
    /// Every room reachable from room 0 over `neighbors`
    pub all_rooms_reachable: bool,
}

/// Complete export document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonExport {
    pub header: ExportHeader,
    pub config: GeneratorConfig,
    /// Run-length `[value, count]` pairs, row-major
    pub tiles: Vec<(u8, u32)>,
    pub rooms: Vec<ExportRoom>,
    pub connections: Vec<ExportConnection>,
    pub validation: Validation,
}

impl DungeonExport {
    pub fn from_state(seed: &str, config: &GeneratorConfig, state: &GeneratorState<'_>) -> Self {
        let mut neighbors: Vec<BTreeSet<RoomId>> = vec![BTreeSet::new(); state.rooms.len()];
        for edge in state.graph_accepted_edges {
            neighbors[edge.a.index()].insert(edge.b);
            neighbors[edge.b.index()].insert(edge.a);
        }

        let rooms: Vec<ExportRoom> = state
            .rooms
            .iter()
            .zip(neighbors)
            .map(|(room, adjacent)| ExportRoom {
                id: room.id,
                rect: room.rect,
                center: room.center,
                area: room.rect.area(),
                neighbors: adjacent.into_iter().collect(),
            })
            .collect();

        let connections: Vec<ExportConnection> = state
            .corridor_plans
            .iter()
            .map(|plan| ExportConnection {
                id: plan.id,
                from: plan.from,
                to: plan.to,
                doors: [plan.start, plan.goal],
                path_length: plan.path.len(),
            })
            .collect();

        let count = |tile: Tile| state.tiles.iter().filter(|&&t| t == tile).count();
        let validation = Validation {
            room_count: rooms.len(),
            corridor_tiles: count(Tile::Corridor),
            door_count: count(Tile::Door),
            total_corridor_length: connections.iter().map(|c| c.path_length).sum(),
            all_rooms_reachable: all_reachable(&rooms),
        };

        Self {
            header: ExportHeader::new(seed, state.width, state.height),
            config: config.clone(),
            tiles: encode_rle(state.tiles),
            rooms,
            connections,
            validation,
        }
    }

    /// Reconstruct the flat row-major tile grid
    pub fn tiles(&self) -> Result<Vec<Tile>, ExportError> {
        decode_rle(&self.tiles, self.header.cell_count())
    }

    /// Check the header and that the tile runs cover the grid exactly
    pub fn validate(&self) -> Result<(), ExportError> {
        self.header.validate()?;
        self.tiles().map(|_| ())
    }
}

/// Breadth-first search over room neighbours from room 0
fn all_reachable(rooms: &[ExportRoom]) -> bool {
    if rooms.is_empty() {
        return true;
    }
    let mut seen = vec![false; rooms.len()];
    let mut queue = VecDeque::from([0usize]);
    seen[0] = true;
    while let Some(current) = queue.pop_front() {
        for next in &rooms[current].neighbors {
            let i = next.index();
            if i < seen.len() && !seen[i] {
                seen[i] = true;
                queue.push_back(i);
            }
        }
    }
    seen.iter().all(|&s| s)
}

/// Write an export as pretty JSON
pub fn save_export(export: &DungeonExport, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, export)?;
    Ok(())
}

/// Write an export as compact JSON
pub fn save_export_compact(export: &DungeonExport, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, export)?;
    Ok(())
}

/// Load and validate an export
pub fn load_export(path: impl AsRef<Path>) -> Result<DungeonExport, ExportError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ExportError::NotFound,
        _ => ExportError::Io(e),
    })?;
    let reader = BufReader::new(file);
    let export: DungeonExport = serde_json::from_reader(reader)?;
    export.validate()?;
    Ok(export)
}
