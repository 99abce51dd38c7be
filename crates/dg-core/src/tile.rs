//! Tile grid
//!
//! Tiles only ever move away from `Wall`: carving writes Wall→Room or
//! Wall→Corridor, and door placement writes Room|Corridor→Door. The grid has
//! no generic setter, so these writers are the only way to mutate it.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use strum::{Display, EnumIter};
use thiserror::Error;

use crate::geom::{Point, Rect};

/// Per-cell classification
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize_repr,
    Deserialize_repr,
    Display,
    EnumIter,
)]
#[repr(u8)]
pub enum Tile {
    #[default]
    Wall = 0,
    Room = 1,
    Corridor = 2,
    Door = 3,
}

/// Raised when decoding a tile from its integer value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid tile value {0}")]
pub struct TileError(pub u8);

impl Tile {
    /// ASCII representation used by text dumps
    pub const fn glyph(&self) -> char {
        match self {
            Tile::Wall => ' ',
            Tile::Room => '.',
            Tile::Corridor => '#',
            Tile::Door => '+',
        }
    }
}

impl TryFrom<u8> for Tile {
    type Error = TileError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Tile::Wall),
            1 => Ok(Tile::Room),
            2 => Ok(Tile::Corridor),
            3 => Ok(Tile::Door),
            other => Err(TileError(other)),
        }
    }
}

impl From<Tile> for u8 {
    fn from(tile: Tile) -> u8 {
        tile as u8
    }
}

/// Row-major grid of tiles, initially all `Wall`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: i32,
    height: i32,
    cells: Vec<Tile>,
}

impl TileGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![Tile::Wall; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The whole grid as a flat row-major slice
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    /// The rectangle covering the whole grid
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    /// Flat index of an in-bounds point
    pub fn index(&self, p: Point) -> Option<usize> {
        self.in_bounds(p)
            .then(|| (p.y as usize) * (self.width as usize) + p.x as usize)
    }

    /// Point for a flat index
    pub fn point(&self, idx: usize) -> Point {
        let w = self.width.max(1) as usize;
        Point::new((idx % w) as i32, (idx / w) as i32)
    }

    pub fn get(&self, p: Point) -> Option<Tile> {
        self.index(p).map(|i| self.cells[i])
    }

    /// Number of cells holding `tile`
    pub fn count(&self, tile: Tile) -> usize {
        self.cells.iter().filter(|&&t| t == tile).count()
    }

    /// Turn every Wall cell of `rect` into Room. Out-of-bounds cells and
    /// non-Wall cells are left untouched.
    pub fn carve_room(&mut self, rect: &Rect) {
        for p in rect.cells() {
            if let Some(i) = self.index(p)
                && self.cells[i] == Tile::Wall
            {
                self.cells[i] = Tile::Room;
            }
        }
    }

    /// Turn a Wall cell into Corridor. Returns whether the cell changed.
    pub fn carve_corridor(&mut self, p: Point) -> bool {
        match self.index(p) {
            Some(i) if self.cells[i] == Tile::Wall => {
                self.cells[i] = Tile::Corridor;
                true
            }
            _ => false,
        }
    }

    /// Turn a Room or Corridor cell into Door. Returns whether the cell changed.
    pub fn place_door(&mut self, p: Point) -> bool {
        match self.index(p) {
            Some(i) if matches!(self.cells[i], Tile::Room | Tile::Corridor) => {
                self.cells[i] = Tile::Door;
                true
            }
            _ => false,
        }
    }
}
