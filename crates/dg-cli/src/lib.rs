//! dg-cli: headless driver for the dungeon generator
//!
//! Provides config layering, the stepping loop, and map rendering used by
//! the `dungen` binary.

pub mod display;
pub mod driver;

pub use display::{GlyphSet, GraphicsMode, detect_glyph_set, render_map};
pub use driver::{ConfigOverrides, RunSummary, build_config, drive};
