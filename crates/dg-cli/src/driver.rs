//! Headless stepping loop and config layering

use std::fmt;
use std::path::Path;

use dg_core::{ConfigError, DungeonGenerator, GenEvent, GeneratorConfig, Stage, Tile};

/// Command-line overrides applied on top of a config file or the preset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Load `path` (or the standard preset), apply overrides, validate
pub fn build_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<GeneratorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => GeneratorConfig::from_json_file(path)?,
        None => GeneratorConfig::standard(),
    };
    if let Some(width) = overrides.width {
        config.width = width;
    }
    if let Some(height) = overrides.height {
        config.height = height;
    }
    config.validate()?;
    Ok(config)
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Events emitted, the terminal `done` event included
    pub steps: usize,
    pub stage: Stage,
    pub rooms: usize,
    pub corridors: usize,
    pub loops: u32,
    pub corridor_tiles: usize,
    pub doors: usize,
}

impl RunSummary {
    pub fn of(generator: &DungeonGenerator, steps: usize) -> Self {
        Self {
            steps,
            stage: generator.stage(),
            rooms: generator.rooms().len(),
            corridors: generator.corridor_plans().len(),
            loops: generator.loop_count(),
            corridor_tiles: generator.grid().count(Tile::Corridor),
            doors: generator.grid().count(Tile::Door),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "stage:     {} after {} steps", self.stage, self.steps)?;
        writeln!(f, "rooms:     {}", self.rooms)?;
        writeln!(f, "corridors: {} ({} loops)", self.corridors, self.loops)?;
        write!(f, "tiles:     {} corridor, {} door", self.corridor_tiles, self.doors)
    }
}

/// Step `generator` until it is done, or `limit` events have been emitted.
///
/// A run to completion ends with the `done` event. `on_event` sees every
/// event in order; its first error stops the run.
pub fn drive<E>(
    generator: &mut DungeonGenerator,
    limit: Option<usize>,
    mut on_event: impl FnMut(&GenEvent) -> Result<(), E>,
) -> Result<RunSummary, E> {
    let mut steps = 0;
    loop {
        if limit.is_some_and(|limit| steps >= limit) {
            break;
        }
        let event = generator.next_step();
        steps += 1;
        on_event(&event)?;
        if event.is_done() {
            break;
        }
    }
    Ok(RunSummary::of(generator, steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> GeneratorConfig {
        GeneratorConfig {
            width: 40,
            height: 24,
            min_leaf_size: 8,
            room_min_size: 3,
            room_margin: 1,
            ..GeneratorConfig::standard()
        }
    }

    #[test]
    fn test_drive_stops_at_limit() {
        let mut generator = DungeonGenerator::new("limit", small()).unwrap();
        let mut seen = Vec::new();
        let summary = drive(&mut generator, Some(5), |e| {
            seen.push(e.kind());
            Ok::<_, ()>(())
        })
        .unwrap();
        assert_eq!(summary.steps, 5);
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0], "init");
        assert!(!generator.is_done());
    }

    #[test]
    fn test_drive_to_completion_ends_with_done() {
        let mut generator = DungeonGenerator::new("full", small()).unwrap();
        let mut last = None;
        let summary = drive(&mut generator, None, |e| {
            last = Some(e.clone());
            Ok::<_, ()>(())
        })
        .unwrap();
        assert_eq!(summary.stage, Stage::Done);
        assert!(last.is_some_and(|e| e.is_done()));
        assert_eq!(summary.corridors, generator.accepted_edges().len());
    }

    #[test]
    fn test_callback_error_stops_run() {
        let mut generator = DungeonGenerator::new("error", small()).unwrap();
        let mut calls = 0;
        let result = drive(&mut generator, None, |_| {
            calls += 1;
            if calls == 3 { Err("stop") } else { Ok(()) }
        });
        assert_eq!(result, Err("stop"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_overrides_apply_and_validate() {
        let overrides = ConfigOverrides {
            width: Some(120),
            height: None,
        };
        let config = build_config(None, &overrides).unwrap();
        assert_eq!(config.width, 120);
        assert_eq!(config.height, GeneratorConfig::standard().height);

        let zero = ConfigOverrides {
            width: Some(0),
            height: None,
        };
        assert!(matches!(
            build_config(None, &zero),
            Err(ConfigError::ZeroDimension { .. })
        ));
    }
}
