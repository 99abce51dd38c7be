//! A* corridor search over the tile grid
//!
//! 4-connected movement. Entering a cell costs 1 for Wall, `reuse_bias` for
//! Corridor or Door, and `room_penalty` for Room; a step that changes
//! direction relative to how the current cell was reached adds
//! `turn_penalty`. The heuristic is Manhattan distance scaled by
//! `min(1, reuse_bias)`.
//!
//! The frontier is a `MinHeap` without decrease-key. A cheaper route to a
//! node pushes a second entry; the older one is skipped when it surfaces
//! because the node is already closed.
//!
//! The search never fails: when no route exists the result is the direct
//! two-point path with an infinite cost.

use serde::{Deserialize, Serialize};

use crate::geom::Point;
use crate::heap::MinHeap;
use crate::tile::{Tile, TileGrid};

/// Up, right, down, left
const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Step cost weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParams {
    /// Cost of entering a Room cell
    pub room_penalty: f64,
    /// Cost of entering a Corridor or Door cell
    pub reuse_bias: f64,
    /// Extra cost for changing direction
    pub turn_penalty: f64,
}

impl CostParams {
    /// Cost of stepping onto a cell holding `tile`
    pub fn step_cost(&self, tile: Tile) -> f64 {
        match tile {
            Tile::Wall => 1.0,
            Tile::Corridor | Tile::Door => self.reuse_bias,
            Tile::Room => self.room_penalty,
        }
    }

    fn heuristic(&self, from: Point, to: Point) -> f64 {
        f64::from(from.manhattan(to)) * self.reuse_bias.min(1.0)
    }
}

/// Outcome of a corridor search
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    /// Cells from start to goal, inclusive
    pub path: Vec<Point>,
    /// Nodes expanded by the search
    pub visited: usize,
    /// Total step cost, infinite for the fallback path
    pub cost: f64,
    /// True when no route existed and `path` is the direct two-point line
    pub fallback: bool,
}

impl PathResult {
    fn direct(start: Point, goal: Point, visited: usize) -> Self {
        Self {
            path: vec![start, goal],
            visited,
            cost: f64::INFINITY,
            fallback: true,
        }
    }
}

/// Find the cheapest 4-connected path from `start` to `goal`
pub fn find_path(grid: &TileGrid, start: Point, goal: Point, params: &CostParams) -> PathResult {
    let (Some(start_idx), Some(goal_idx)) = (grid.index(start), grid.index(goal)) else {
        return PathResult::direct(start, goal, 0);
    };
    if start_idx == goal_idx {
        return PathResult {
            path: vec![start],
            visited: 0,
            cost: 0.0,
            fallback: false,
        };
    }

    let n = grid.cells().len();
    let mut g_score = vec![f64::INFINITY; n];
    let mut came_from: Vec<Option<usize>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut open = MinHeap::with_capacity(n / 4);
    let mut visited = 0;

    g_score[start_idx] = 0.0;
    open.push(params.heuristic(start, goal), start_idx);

    while let Some((_, current)) = open.pop() {
        if closed[current] {
            continue;
        }
        closed[current] = true;
        visited += 1;

        if current == goal_idx {
            return PathResult {
                path: reconstruct_path(grid, &came_from, goal_idx),
                visited,
                cost: g_score[goal_idx],
                fallback: false,
            };
        }

        let here = grid.point(current);
        let incoming = came_from[current].map(|prev| {
            let from = grid.point(prev);
            (here.x - from.x, here.y - from.y)
        });

        for dir in DIRECTIONS {
            let next = Point::new(here.x + dir.0, here.y + dir.1);
            let Some(ni) = grid.index(next) else {
                continue;
            };
            if closed[ni] {
                continue;
            }

            let mut step = params.step_cost(grid.cells()[ni]);
            if incoming.is_some_and(|d| d != dir) {
                step += params.turn_penalty;
            }
            let tentative = g_score[current] + step;
            if tentative < g_score[ni] {
                g_score[ni] = tentative;
                came_from[ni] = Some(current);
                open.push(tentative + params.heuristic(next, goal), ni);
            }
        }
    }

    PathResult::direct(start, goal, visited)
}

fn reconstruct_path(grid: &TileGrid, came_from: &[Option<usize>], goal: usize) -> Vec<Point> {
    let mut path = vec![grid.point(goal)];
    let mut current = goal;
    while let Some(prev) = came_from[current] {
        path.push(grid.point(prev));
        current = prev;
    }
    path.reverse();
    path
}
