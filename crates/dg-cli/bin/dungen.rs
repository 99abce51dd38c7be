//! Stepwise dungeon generator
//!
//! Main entry point for the command-line driver.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dg_cli::{ConfigOverrides, GraphicsMode, build_config, detect_glyph_set, drive, render_map};
use dg_core::DungeonGenerator;
use dg_export::{DungeonExport, save_export, save_export_compact};

/// Generate a rooms-and-corridors dungeon from a seed
#[derive(Parser, Debug)]
#[command(name = "dungen")]
#[command(author, version, about = "Deterministic stepwise dungeon generator", long_about = None)]
struct Args {
    /// Seed string; the same seed and config always give the same dungeon
    #[arg(short = 's', long = "seed", default_value = "dungeon-001")]
    seed: String,

    /// JSON config file; omitted fields come from the standard preset
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Grid width override
    #[arg(long = "width")]
    width: Option<u32>,

    /// Grid height override
    #[arg(long = "height")]
    height: Option<u32>,

    /// Stop after this many steps instead of running to completion
    #[arg(short = 'n', long = "steps")]
    steps: Option<usize>,

    /// Print every event as a JSON line
    #[arg(short = 't', long = "trace")]
    trace: bool,

    /// Print the map
    #[arg(short = 'a', long = "ascii")]
    ascii: bool,

    /// Glyphs for the printed map (classic, fancy, auto)
    #[arg(long = "glyphs", default_value = "classic")]
    glyphs: GraphicsMode,

    /// Write the export document to this file
    #[arg(short = 'e', long = "export")]
    export: Option<PathBuf>,

    /// Write the export as single-line JSON
    #[arg(long = "compact", requires = "export")]
    compact: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(io::stderr)
        .init();

    let overrides = ConfigOverrides {
        width: args.width,
        height: args.height,
    };
    let config = build_config(args.config.as_deref(), &overrides).with_context(|| match &args.config {
        Some(path) => format!("invalid config {}", path.display()),
        None => "invalid config".to_string(),
    })?;
    info!(seed = %args.seed, width = config.width, height = config.height, "starting generation");

    let mut generator = DungeonGenerator::new(&args.seed, config.clone())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = drive(&mut generator, args.steps, |event| -> anyhow::Result<()> {
        if args.trace {
            serde_json::to_writer(&mut out, event)?;
            writeln!(out)?;
        }
        Ok(())
    })?;

    if args.ascii {
        let glyphs = detect_glyph_set(args.glyphs);
        write!(out, "{}", render_map(generator.grid(), glyphs.as_ref()))?;
    }

    if let Some(path) = &args.export {
        let export = DungeonExport::from_state(&args.seed, &config, &generator.state());
        let written = if args.compact {
            save_export_compact(&export, path)
        } else {
            save_export(&export, path)
        };
        written.with_context(|| format!("failed to write export {}", path.display()))?;
        info!(path = %path.display(), reachable = export.validation.all_rooms_reachable, "export written");
    }

    if !generator.is_done() {
        writeln!(out, "{}", generator.overlay().message)?;
    }
    writeln!(out, "{summary}")?;
    Ok(())
}
