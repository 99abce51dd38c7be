//! Room placement inside partition leaves
//!
//! Each leaf gets exactly one room. Candidates are sampled inside the leaf's
//! margin-shrunk interior, any candidate whose buffer-expanded box touches a
//! placed room is dropped, and the survivors are scored. When nothing
//! survives, a centered fallback room is used instead.

use dg_rng::SeededRng;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::config::{GeneratorConfig, cells};
use crate::geom::{Point, Rect};
use crate::partition::PartitionId;

const FILL_WEIGHT: f64 = 0.5;
const SQUARENESS_WEIGHT: f64 = 0.3;
const VARIETY_WEIGHT: f64 = 0.2;
/// Width of the variety peak around the target fill
const VARIETY_SPREAD: f64 = 0.15;
/// Area fraction of the usable interior covered by a fallback room
const FALLBACK_AREA: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl RoomId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room {}", self.0)
    }
}

/// A placed room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub rect: Rect,
    pub center: Point,
    /// Leaf partition the room was placed in
    pub leaf: PartitionId,
}

impl Room {
    pub fn new(id: RoomId, rect: Rect, leaf: PartitionId) -> Self {
        Self {
            id,
            rect,
            center: rect.center(),
            leaf,
        }
    }

    /// The room's own edge cell nearest to `target`
    pub fn door_point_toward(&self, target: Point) -> Point {
        self.rect.clamp_point(target)
    }
}

/// A scored candidate rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomCandidate {
    pub rect: Rect,
    /// Candidate area over usable interior area
    pub fill_ratio: f64,
    /// Linear closeness of `fill_ratio` to the target
    pub fill: f64,
    pub squareness: f64,
    /// Sharp peak around the target fill
    pub variety: f64,
    pub score: f64,
}

/// Why a leaf got the fallback room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FallbackReason {
    NoCandidateFit,
}

/// Survivors of one leaf's sampling round
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomSample {
    pub candidates: Vec<RoomCandidate>,
    /// Samples dropped for crowding a placed room
    pub rejected: u32,
}

/// Interior of a leaf available to its room
pub fn usable_area(leaf: &Rect, config: &GeneratorConfig) -> Rect {
    leaf.shrink(cells(config.room_margin))
}

/// Sample and score room candidates for one leaf
pub fn sample_rooms(
    leaf: &Rect,
    placed: &[Room],
    config: &GeneratorConfig,
    rng: &mut SeededRng,
) -> RoomSample {
    let interior = usable_area(leaf, config);
    let min = cells(config.room_min_size.max(1));
    let mut sample = RoomSample::default();
    if interior.w < min || interior.h < min {
        return sample;
    }

    let buffer = cells(config.room_buffer);
    for _ in 0..config.room_candidates {
        let w = rng.int_in_range(min, interior.w);
        let h = rng.int_in_range(min, interior.h);
        let x = rng.int_in_range(interior.x, interior.right() - w);
        let y = rng.int_in_range(interior.y, interior.bottom() - h);
        let rect = Rect::new(x, y, w, h);

        let padded = rect.expand(buffer);
        if placed.iter().any(|room| padded.intersects(&room.rect)) {
            sample.rejected += 1;
            continue;
        }
        sample
            .candidates
            .push(score_room(&rect, &interior, config.target_fill));
    }
    sample
}

/// Score a room rectangle against its usable interior
pub fn score_room(rect: &Rect, interior: &Rect, target_fill: f64) -> RoomCandidate {
    let fill_ratio = if interior.area() > 0 {
        rect.area() as f64 / interior.area() as f64
    } else {
        0.0
    };
    let spread = target_fill.max(1.0 - target_fill);
    let fill = (1.0 - (fill_ratio - target_fill).abs() / spread).max(0.0);
    let squareness = rect.squareness();
    let variety = (-((fill_ratio - target_fill) / VARIETY_SPREAD).powi(2)).exp();
    RoomCandidate {
        rect: *rect,
        fill_ratio,
        fill,
        squareness,
        variety,
        score: FILL_WEIGHT * fill + SQUARENESS_WEIGHT * squareness + VARIETY_WEIGHT * variety,
    }
}

/// Highest-scoring candidate; the earliest wins ties
pub fn best_room(candidates: &[RoomCandidate]) -> Option<&RoomCandidate> {
    candidates.iter().fold(None, |best, c| match best {
        Some(b) if b.score >= c.score => Some(b),
        _ => Some(c),
    })
}

/// Centered room covering about three quarters of the usable interior
pub fn fallback_room(leaf: &Rect, config: &GeneratorConfig) -> Rect {
    let interior = usable_area(leaf, config);
    let scale = FALLBACK_AREA.sqrt();
    let w = ((f64::from(interior.w) * scale).floor() as i32).clamp(1, interior.w.max(1));
    let h = ((f64::from(interior.h) * scale).floor() as i32).clamp(1, interior.h.max(1));
    Rect::new(
        interior.x + (interior.w - w) / 2,
        interior.y + (interior.h - h) / 2,
        w,
        h,
    )
}
