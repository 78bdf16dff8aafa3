//! Renderer collaborator interface
//!
//! After every tick the host hands a [`Snapshot`] to a [`Renderer`]. The
//! snapshot is camera-relative: `x` is measured from the left edge of the
//! viewport, `y` from its bottom, and every position is a sprite's
//! bottom-left corner.

use std::io::{self, Write};

use glam::DVec2;
use serde::Serialize;

use crate::settings::{Settings, Viewport};
use crate::sim::enemy::EnemyStatus;
use crate::sim::protagonist::ProtagonistStatus;
use crate::sim::state::{AwardStatus, Direction, EntityId, GamePhase, GameState, TileKind};

#[derive(Debug, Clone, Serialize)]
pub struct ProtagonistView {
    pub pos: DVec2,
    pub size: DVec2,
    pub status: ProtagonistStatus,
    pub frame: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TileView {
    pub id: EntityId,
    pub pos: DVec2,
    pub size: DVec2,
    pub tier: usize,
    pub kind: TileKind,
    pub variant: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub id: EntityId,
    pub kind: usize,
    pub pos: DVec2,
    pub size: DVec2,
    pub direction: Direction,
    pub status: EnemyStatus,
    pub frame: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AwardView {
    pub id: EntityId,
    pub kind: usize,
    pub pos: DVec2,
    pub size: DVec2,
    pub status: AwardStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagView {
    pub id: EntityId,
    pub kind: usize,
    pub pos: DVec2,
    pub size: DVec2,
    pub forced: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackgroundView {
    pub id: EntityId,
    pub x: f64,
    pub width: f64,
    pub segment: usize,
}

/// Everything live, positioned relative to the camera
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub score: u64,
    pub target_score: Option<u64>,
    pub elapsed_ms: f64,
    pub camera: f64,
    pub protagonist: ProtagonistView,
    pub tiles: Vec<TileView>,
    pub enemies: Vec<EnemyView>,
    pub awards: Vec<AwardView>,
    pub flags: Vec<FlagView>,
    pub backgrounds: Vec<BackgroundView>,
}

impl Snapshot {
    pub fn capture(state: &GameState, settings: &Settings) -> Self {
        let camera = state.camera;
        let corner = |center_x: f64, bottom: f64, size: DVec2| {
            DVec2::new(center_x - size.x / 2.0 - camera, bottom)
        };

        let runner = &state.protagonist;
        let runner_size = settings.protagonist.size.dims();
        let protagonist = ProtagonistView {
            pos: corner(runner.location, runner.height, runner_size),
            size: runner_size,
            status: runner.status,
            frame: runner.frame,
        };

        let tiles = state
            .terrain
            .iter()
            .map(|tile| TileView {
                id: tile.id,
                pos: DVec2::new(tile.location - camera, 0.0),
                size: DVec2::new(tile.width, tile.height),
                tier: tile.tier,
                kind: tile.kind,
                variant: tile.variant,
            })
            .collect();

        // Planted flags first, then floating ones
        let flags = state
            .terrain
            .iter()
            .flat_map(|tile| tile.flags.iter())
            .chain(&state.flags)
            .map(|flag| {
                let size = settings.flags[flag.kind].size.dims();
                FlagView {
                    id: flag.id,
                    kind: flag.kind,
                    pos: corner(flag.location, flag.height, size),
                    size,
                    forced: flag.forced,
                }
            })
            .collect();

        let enemies = state
            .enemies
            .iter()
            .map(|e| {
                let size = settings.enemies[e.kind].size.dims();
                EnemyView {
                    id: e.id,
                    kind: e.kind,
                    pos: corner(e.location, e.height, size),
                    size,
                    direction: e.direction,
                    status: e.status,
                    frame: e.frame,
                }
            })
            .collect();

        let awards = state
            .awards
            .iter()
            .map(|a| {
                let size = settings.awards[a.kind].size.dims();
                AwardView {
                    id: a.id,
                    kind: a.kind,
                    pos: corner(a.location, a.height, size),
                    size,
                    status: a.status,
                }
            })
            .collect();

        let backgrounds = state
            .backgrounds
            .iter()
            .map(|b| BackgroundView {
                id: b.id,
                x: b.offset,
                width: b.width,
                segment: b.segment,
            })
            .collect();

        Self {
            tick: state.time_ticks,
            phase: state.phase,
            score: state.score,
            target_score: settings.win.score,
            elapsed_ms: state.elapsed_ms,
            camera,
            protagonist,
            tiles,
            enemies,
            awards,
            flags,
            backgrounds,
        }
    }
}

/// Draws snapshots. Never calls back into the simulation.
pub trait Renderer {
    fn viewport(&self) -> Viewport;
    fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()>;
}

/// Logs a one-line summary every `every` ticks and on every phase change
#[derive(Debug)]
pub struct LogRenderer {
    viewport: Viewport,
    every: u64,
    last_phase: Option<GamePhase>,
}

impl LogRenderer {
    pub fn new(viewport: Viewport, every: u64) -> Self {
        Self {
            viewport,
            every: every.max(1),
            last_phase: None,
        }
    }
}

impl Renderer for LogRenderer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let phase_changed = self.last_phase != Some(snapshot.phase);
        if phase_changed || snapshot.tick % self.every == 0 {
            log::info!(
                "tick {:>5} {:?} score {} x {:.0} height {:.0} {:?} ({} tiles, {} enemies, {} awards)",
                snapshot.tick,
                snapshot.phase,
                snapshot.score,
                snapshot.camera,
                snapshot.protagonist.pos.y,
                snapshot.protagonist.status,
                snapshot.tiles.len(),
                snapshot.enemies.len(),
                snapshot.awards.len(),
            );
        }
        self.last_phase = Some(snapshot.phase);
        Ok(())
    }
}

/// One JSON snapshot per line
#[derive(Debug)]
pub struct JsonLinesRenderer<W: Write> {
    viewport: Viewport,
    out: W,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(viewport: Viewport, out: W) -> Self {
        Self { viewport, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, snapshot)?;
        self.out.write_all(b"\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GameOptions;

    fn capture(seed: u64) -> (Settings, Snapshot) {
        let settings = Settings::from_options(&GameOptions::demo()).unwrap();
        let mut state = GameState::new(&settings, seed);
        state.camera = 100.0;
        let snapshot = Snapshot::capture(&state, &settings);
        (settings, snapshot)
    }

    #[test]
    fn test_snapshot_is_camera_relative() {
        let (settings, snapshot) = capture(5);
        assert_eq!(snapshot.tiles[0].pos.x, -100.0);
        let runner = &snapshot.protagonist;
        let expected = settings.protagonist.start - settings.protagonist.size.width / 2.0 - 100.0;
        assert_eq!(runner.pos.x, expected);
        assert_eq!(runner.pos.y, settings.tier_height(0));
        assert_eq!(runner.status, ProtagonistStatus::Ready);
    }

    #[test]
    fn test_json_lines_renderer_writes_one_line_per_draw() {
        let (settings, snapshot) = capture(5);
        let mut renderer = JsonLinesRenderer::new(settings.viewport, Vec::new());
        renderer.draw(&snapshot).unwrap();
        renderer.draw(&snapshot).unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["phase"], "Uninitialized");
        assert_eq!(value["protagonist"]["status"], "Ready");
    }
}
