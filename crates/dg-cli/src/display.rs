//! Glyph system for map dumps
//!
//! Provides support for both classic ASCII and fancy Unicode block characters.

use dg_core::{Tile, TileGrid};
use strum::{Display, EnumString, VariantNames};

/// Available glyph modes for printed maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames, Default)]
#[strum(serialize_all = "lowercase")]
pub enum GraphicsMode {
    /// Classic ASCII characters.
    Classic,
    /// Unicode shading characters.
    Fancy,
    /// Automatically detect support.
    #[default]
    Auto,
}

/// Set of glyphs used for rendering tiles.
pub trait GlyphSet: Send + Sync {
    fn tile_char(&self, tile: Tile) -> char;

    /// Corner, horizontal and vertical frame characters
    fn frame(&self) -> [char; 3];
}

/// Plain ASCII glyph set.
pub struct ClassicGlyphs;

impl GlyphSet for ClassicGlyphs {
    fn tile_char(&self, tile: Tile) -> char {
        tile.glyph()
    }

    fn frame(&self) -> [char; 3] {
        ['+', '-', '|']
    }
}

/// Unicode glyph set.
pub struct FancyGlyphs;

impl GlyphSet for FancyGlyphs {
    fn tile_char(&self, tile: Tile) -> char {
        match tile {
            Tile::Wall => '█',
            Tile::Room => '·',
            Tile::Corridor => '░',
            Tile::Door => '▒',
        }
    }

    fn frame(&self) -> [char; 3] {
        ['┼', '─', '│']
    }
}

/// Detect if the terminal supports Unicode/UTF-8.
pub fn supports_unicode() -> bool {
    ["LANG", "LC_ALL", "LC_CTYPE"].iter().any(|var| {
        std::env::var(var).is_ok_and(|val| {
            let val = val.to_uppercase();
            val.contains("UTF-8") || val.contains("UTF8")
        })
    })
}

/// Returns the best available glyph set for the current environment.
pub fn detect_glyph_set(mode: GraphicsMode) -> Box<dyn GlyphSet> {
    match mode {
        GraphicsMode::Classic => Box::new(ClassicGlyphs),
        GraphicsMode::Fancy => Box::new(FancyGlyphs),
        GraphicsMode::Auto => {
            if supports_unicode() {
                Box::new(FancyGlyphs)
            } else {
                Box::new(ClassicGlyphs)
            }
        }
    }
}

/// Render the grid inside a one-cell frame, one line per row
pub fn render_map(grid: &TileGrid, glyphs: &dyn GlyphSet) -> String {
    let [corner, horizontal, vertical] = glyphs.frame();
    let width = grid.width().max(0) as usize;
    let border: String = std::iter::once(corner)
        .chain(std::iter::repeat_n(horizontal, width))
        .chain(std::iter::once(corner))
        .collect();

    let mut out = String::with_capacity((width + 3) * (grid.height().max(0) as usize + 2));
    out.push_str(&border);
    out.push('\n');
    if width > 0 {
        for row in grid.cells().chunks(width) {
            out.push(vertical);
            out.extend(row.iter().map(|&t| glyphs.tile_char(t)));
            out.push(vertical);
            out.push('\n');
        }
    }
    out.push_str(&border);
    out.push('\n');
    out
}
