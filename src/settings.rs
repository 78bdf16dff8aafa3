//! Game construction options and validated runtime settings
//!
//! `GameOptions` is the serde schema read from JSON (sizes, assets, gameplay
//! config). `Settings::from_options` checks it eagerly and produces the
//! runtime form, with every ramping value turned into a [`Curve`].

use std::path::Path;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::AssetManifest;
use crate::consts::*;
use crate::curve::{Bounds, BoundsSpec, Curve, CurveSpec, Ramp};
use crate::sim::collision::Insets;
use crate::sim::kinematics::max_jump_height;

/// Construction failures. Any of these prevents a session from being built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
    #[error("asset list must not be empty: {0}")]
    EmptyAssets(String),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: String, value: f64 },
    #[error("{field} must have {expected} entries to match its sizes, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{field} must be a probability in [0, 1], got {value}")]
    Probability { field: String, value: f64 },
    #[error("{field} is invalid: {reason}")]
    Invalid { field: String, reason: &'static str },
    #[error("failed to read options: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),
}

// ── Sizes ──

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySize {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub insets: Insets,
}

impl BodySize {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            insets: Insets::default(),
        }
    }

    pub fn dims(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidthOnly {
    pub width: f64,
}

/// A terrain elevation; land tiles reference one by index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightTier {
    pub height: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizeOptions {
    pub container: Option<Viewport>,
    pub protagonist: Option<BodySize>,
    pub background: Option<WidthOnly>,
    pub tile: Option<WidthOnly>,
    #[serde(default)]
    pub tiles: Vec<HeightTier>,
    #[serde(default)]
    pub awards: Vec<BodySize>,
    #[serde(default)]
    pub enemies: Vec<BodySize>,
    #[serde(default)]
    pub flags: Vec<BodySize>,
}

// ── Assets ──

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtagonistAssets {
    #[serde(default)]
    pub running: Vec<String>,
    pub jumping: Option<String>,
    #[serde(default)]
    pub dead: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileAssets {
    #[serde(default)]
    pub left: Vec<String>,
    #[serde(default)]
    pub middle: Vec<String>,
    #[serde(default)]
    pub right: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwardAssets {
    pub normal: Option<String>,
    #[serde(default)]
    pub collected: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnemyAssets {
    #[serde(default)]
    pub running: Vec<String>,
    #[serde(default)]
    pub dead: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagAssets {
    pub normal: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetOptions {
    pub protagonist: Option<ProtagonistAssets>,
    #[serde(default)]
    pub background: Vec<String>,
    #[serde(default)]
    pub tiles: Vec<TileAssets>,
    #[serde(default)]
    pub awards: Vec<AwardAssets>,
    #[serde(default)]
    pub enemies: Vec<EnemyAssets>,
    #[serde(default)]
    pub flags: Vec<FlagAssets>,
}

// ── Gameplay ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Runner center x at the start of a run
    pub start: f64,
    /// px/tick
    pub speed: CurveSpec,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            start: DEFAULT_RUN_START,
            speed: CurveSpec::Ramp(Ramp {
                base: DEFAULT_RUN_SPEED,
                per_score: 0.05,
                per_second: 0.02,
                min: None,
                max: Some(DEFAULT_RUN_SPEED_MAX),
            }),
        }
    }
}

/// Jump physics and the landing/wall heuristics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Launch power, px/tick
    pub power: f64,
    /// px/tick²
    pub gravity: f64,
    /// Launches allowed before touching ground again
    pub max_count: u32,
    /// Upward pop given to the runner when it dies
    pub dead_power: f64,
    /// Ceiling for a charged jump
    pub max_charge_power: f64,
    /// How far past a Left tile's edge still counts as hitting its face
    pub wall_band: f64,
    /// How far a surface may rise above the feet before it counts as a wall
    pub step_tolerance: f64,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            power: DEFAULT_JUMP_POWER,
            gravity: DEFAULT_GRAVITY,
            max_count: DEFAULT_MAX_JUMP_COUNT,
            dead_power: DEFAULT_DEAD_POWER,
            max_charge_power: DEFAULT_JUMP_POWER * 1.4,
            wall_band: DEFAULT_WALL_BAND,
            step_tolerance: DEFAULT_STEP_TOLERANCE,
        }
    }
}

impl JumpConfig {
    pub fn max_height(&self) -> f64 {
        max_jump_height(self.power, self.gravity)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtagonistOptions {
    pub run: RunOptions,
    pub jump: JumpConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwardOptions {
    pub score: u64,
    /// Chance per appended tile
    pub probability: f64,
    /// Height of the award's bottom above the surface it floats over
    pub elevation: f64,
}

impl Default for AwardOptions {
    fn default() -> Self {
        Self {
            score: 1,
            probability: 0.2,
            elevation: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReboundOptions {
    pub power: f64,
    /// Jump count the runner is left with after bouncing
    pub count: u32,
}

impl Default for ReboundOptions {
    fn default() -> Self {
        Self {
            power: DEFAULT_REBOUND_POWER,
            count: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyOptions {
    /// Chance per appended Middle tile
    pub probability: f64,
    /// px/tick
    pub speed: f64,
    pub turn_on_cliff: bool,
    pub rebound: ReboundOptions,
    /// Dead body stays in place and keeps blocking other enemies
    pub hold: bool,
}

impl Default for EnemyOptions {
    fn default() -> Self {
        Self {
            probability: 0.15,
            speed: 1.5,
            turn_on_cliff: true,
            rebound: ReboundOptions::default(),
            hold: false,
        }
    }
}

/// Where a flag appears
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FlagPlacement {
    /// Pinned to an absolute world x; the ground beneath is always land
    Forced { location: f64 },
    /// Planted on a land tile with the given chance per appended tile
    Random { probability: f64 },
    /// Hovers at a random height and drifts horizontally
    Floating {
        probability: f64,
        drift_speed: f64,
        min_elevation: f64,
        max_elevation: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlagOptions {
    pub placement: FlagPlacement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileOptions {
    pub empty: BoundsSpec,
    pub land: BoundsSpec,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            empty: BoundsSpec::fixed(1, 2),
            land: BoundsSpec::fixed(3, 8),
        }
    }
}

/// Win thresholds; `None` means never
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinCondition {
    /// Elapsed game time in ms
    pub time: Option<f64>,
    pub score: Option<u64>,
}

impl WinCondition {
    pub fn is_met(&self, score: u64, elapsed_ms: f64) -> bool {
        self.score.is_some_and(|target| score >= target)
            || self.time.is_some_and(|target| elapsed_ms >= target)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    /// Screen px/tick
    pub speed: CurveSpec,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            speed: CurveSpec::Fixed(1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayOptions {
    pub fps: CurveSpec,
    pub seed: Option<u64>,
    pub protagonist: ProtagonistOptions,
    pub awards: Vec<AwardOptions>,
    pub enemies: Vec<EnemyOptions>,
    pub flags: Vec<FlagOptions>,
    pub tile: TileOptions,
    pub win: WinCondition,
    pub background: BackgroundOptions,
}

impl Default for GameplayOptions {
    fn default() -> Self {
        Self {
            fps: CurveSpec::Fixed(DEFAULT_FPS),
            seed: None,
            protagonist: ProtagonistOptions::default(),
            awards: Vec::new(),
            enemies: Vec::new(),
            flags: Vec::new(),
            tile: TileOptions::default(),
            win: WinCondition::default(),
            background: BackgroundOptions::default(),
        }
    }
}

/// Everything needed to construct a session, as read from a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameOptions {
    pub size: Option<SizeOptions>,
    pub assets: Option<AssetOptions>,
    #[serde(default)]
    pub config: GameplayOptions,
}

impl GameOptions {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let options = Self::from_json_str(&json)?;
        log::info!("Loaded game options from {}", path.display());
        Ok(options)
    }

    /// A complete playable configuration
    pub fn demo() -> Self {
        let tier_heights = [64.0, 96.0, 128.0];
        let tiles = tier_heights
            .iter()
            .map(|&height| HeightTier { height })
            .collect();
        let tile_assets = (0..tier_heights.len())
            .map(|i| TileAssets {
                left: vec![format!("assets/tiles/{i}/left.png")],
                middle: vec![
                    format!("assets/tiles/{i}/middle_0.png"),
                    format!("assets/tiles/{i}/middle_1.png"),
                ],
                right: vec![format!("assets/tiles/{i}/right.png")],
            })
            .collect();

        Self {
            size: Some(SizeOptions {
                container: Some(Viewport {
                    width: 800.0,
                    height: 450.0,
                }),
                protagonist: Some(BodySize {
                    width: 48.0,
                    height: 64.0,
                    insets: Insets {
                        top: 4.0,
                        bottom: 0.0,
                        left: 6.0,
                        right: 6.0,
                    },
                }),
                background: Some(WidthOnly { width: 800.0 }),
                tile: Some(WidthOnly { width: 64.0 }),
                tiles,
                awards: vec![BodySize::new(32.0, 32.0), BodySize::new(40.0, 40.0)],
                enemies: vec![BodySize::new(40.0, 40.0)],
                flags: vec![BodySize::new(24.0, 64.0), BodySize::new(32.0, 32.0)],
            }),
            assets: Some(AssetOptions {
                protagonist: Some(ProtagonistAssets {
                    running: (0..4)
                        .map(|i| format!("assets/protagonist/run_{i}.png"))
                        .collect(),
                    jumping: Some("assets/protagonist/jump.png".into()),
                    dead: Some("assets/protagonist/dead.png".into()),
                }),
                background: vec![
                    "assets/background/0.png".into(),
                    "assets/background/1.png".into(),
                ],
                tiles: tile_assets,
                awards: vec![
                    AwardAssets {
                        normal: Some("assets/awards/coin.png".into()),
                        collected: None,
                    },
                    AwardAssets {
                        normal: Some("assets/awards/gem.png".into()),
                        collected: None,
                    },
                ],
                enemies: vec![EnemyAssets {
                    running: vec![
                        "assets/enemies/walker_0.png".into(),
                        "assets/enemies/walker_1.png".into(),
                    ],
                    dead: Some("assets/enemies/walker_dead.png".into()),
                }],
                flags: vec![
                    FlagAssets {
                        normal: Some("assets/flags/checkpoint.png".into()),
                    },
                    FlagAssets {
                        normal: Some("assets/flags/balloon.png".into()),
                    },
                ],
            }),
            config: GameplayOptions {
                awards: vec![
                    AwardOptions::default(),
                    AwardOptions {
                        score: 5,
                        probability: 0.04,
                        elevation: 120.0,
                    },
                ],
                enemies: vec![EnemyOptions::default()],
                flags: vec![
                    FlagOptions {
                        placement: FlagPlacement::Forced { location: 3200.0 },
                    },
                    FlagOptions {
                        placement: FlagPlacement::Floating {
                            probability: 0.02,
                            drift_speed: -0.5,
                            min_elevation: 120.0,
                            max_elevation: 220.0,
                        },
                    },
                ],
                win: WinCondition {
                    time: None,
                    score: Some(50),
                },
                ..Default::default()
            },
        }
    }
}

// ── Runtime settings ──

#[derive(Debug, Clone)]
pub struct ProtagonistSettings {
    pub size: BodySize,
    pub start: f64,
    pub jump: JumpConfig,
    pub running_frames: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AwardKind {
    pub size: BodySize,
    pub score: u64,
    pub probability: f64,
    pub elevation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyKind {
    pub size: BodySize,
    pub speed: f64,
    pub probability: f64,
    pub turn_on_cliff: bool,
    pub rebound: ReboundOptions,
    pub hold: bool,
    pub running_frames: usize,
}

impl EnemyKind {
    /// How high a bounce off this enemy carries the runner
    pub fn rebound_height(&self, gravity: f64) -> f64 {
        max_jump_height(self.rebound.power, gravity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlagKind {
    pub size: BodySize,
    pub placement: FlagPlacement,
}

/// Asset variant counts for one height tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileVariants {
    pub left: usize,
    pub middle: usize,
    pub right: usize,
}

/// Tick-local difficulty, sampled once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difficulty {
    pub fps: f64,
    pub run_speed: f64,
    pub background_speed: f64,
    pub empty: Bounds,
    pub land: Bounds,
}

impl Difficulty {
    /// Milliseconds until the next tick
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.fps
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub viewport: Viewport,
    pub tile_width: f64,
    pub tiers: Vec<HeightTier>,
    pub tile_variants: Vec<TileVariants>,
    pub protagonist: ProtagonistSettings,
    pub awards: Vec<AwardKind>,
    pub enemies: Vec<EnemyKind>,
    pub flags: Vec<FlagKind>,
    pub background_width: f64,
    pub background_segments: usize,
    pub fps: Curve<f64>,
    pub run_speed: Curve<f64>,
    pub background_speed: Curve<f64>,
    pub empty: Curve<Bounds>,
    pub land: Curve<Bounds>,
    pub win: WinCondition,
    pub seed: Option<u64>,
    pub assets: AssetManifest,
}

impl Settings {
    pub fn from_options(options: &GameOptions) -> Result<Self, ConfigError> {
        let size = options.size.as_ref().ok_or(ConfigError::Missing("size"))?;
        let assets = options
            .assets
            .as_ref()
            .ok_or(ConfigError::Missing("assets"))?;
        let config = &options.config;

        // Sizes
        let viewport = size
            .container
            .ok_or(ConfigError::Missing("size.container"))?;
        positive("size.container.width", viewport.width)?;
        positive("size.container.height", viewport.height)?;
        let protagonist_size = size
            .protagonist
            .ok_or(ConfigError::Missing("size.protagonist"))?;
        body("size.protagonist", &protagonist_size)?;
        let background = size
            .background
            .ok_or(ConfigError::Missing("size.background"))?;
        positive("size.background.width", background.width)?;
        let tile = size.tile.ok_or(ConfigError::Missing("size.tile"))?;
        positive("size.tile.width", tile.width)?;
        if size.tiles.is_empty() {
            return Err(ConfigError::Missing("size.tiles"));
        }
        for (i, tier) in size.tiles.iter().enumerate() {
            if !tier.height.is_finite() || tier.height < 0.0 {
                return Err(ConfigError::Invalid {
                    field: format!("size.tiles[{i}].height"),
                    reason: "must be a finite, non-negative height",
                });
            }
        }
        if size.awards.is_empty() {
            return Err(ConfigError::Missing("size.awards"));
        }
        for (i, s) in size.awards.iter().enumerate() {
            body(&format!("size.awards[{i}]"), s)?;
        }
        for (i, s) in size.enemies.iter().enumerate() {
            body(&format!("size.enemies[{i}]"), s)?;
        }
        for (i, s) in size.flags.iter().enumerate() {
            body(&format!("size.flags[{i}]"), s)?;
        }

        // Assets
        let protagonist_assets = assets
            .protagonist
            .as_ref()
            .ok_or(ConfigError::Missing("assets.protagonist"))?;
        non_empty("assets.protagonist.running", &protagonist_assets.running)?;
        if protagonist_assets.jumping.is_none() {
            return Err(ConfigError::Missing("assets.protagonist.jumping"));
        }
        non_empty("assets.background", &assets.background)?;
        same_len("assets.tiles", size.tiles.len(), assets.tiles.len())?;
        for (i, t) in assets.tiles.iter().enumerate() {
            non_empty(&format!("assets.tiles[{i}].left"), &t.left)?;
            non_empty(&format!("assets.tiles[{i}].middle"), &t.middle)?;
            non_empty(&format!("assets.tiles[{i}].right"), &t.right)?;
        }
        same_len("assets.awards", size.awards.len(), assets.awards.len())?;
        if assets.awards.iter().any(|a| a.normal.is_none()) {
            return Err(ConfigError::Missing("assets.awards[].normal"));
        }
        same_len("assets.enemies", size.enemies.len(), assets.enemies.len())?;
        for (i, e) in assets.enemies.iter().enumerate() {
            non_empty(&format!("assets.enemies[{i}].running"), &e.running)?;
        }
        same_len("assets.flags", size.flags.len(), assets.flags.len())?;
        if assets.flags.iter().any(|f| f.normal.is_none()) {
            return Err(ConfigError::Missing("assets.flags[].normal"));
        }

        // Gameplay
        let fps0 = config.fps.sample(0, 0.0);
        if !fps0.is_finite() || fps0 <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "config.fps".into(),
                value: fps0,
            });
        }
        let speed0 = config.protagonist.run.speed.sample(0, 0.0);
        if !speed0.is_finite() || speed0 < 0.0 {
            return Err(ConfigError::Invalid {
                field: "config.protagonist.run.speed".into(),
                reason: "must be finite and non-negative",
            });
        }
        let background_speed0 = config.background.speed.sample(0, 0.0);
        if !background_speed0.is_finite() || background_speed0 < 0.0 {
            return Err(ConfigError::Invalid {
                field: "config.background.speed".into(),
                reason: "backgrounds only scroll left; speed must be finite and non-negative",
            });
        }
        let jump = config.protagonist.jump;
        positive("config.protagonist.jump.power", jump.power)?;
        positive("config.protagonist.jump.gravity", jump.gravity)?;
        if jump.max_count == 0 {
            return Err(ConfigError::Invalid {
                field: "config.protagonist.jump.max_count".into(),
                reason: "at least one jump is required",
            });
        }
        if jump.max_charge_power < jump.power {
            return Err(ConfigError::Invalid {
                field: "config.protagonist.jump.max_charge_power".into(),
                reason: "must not be below jump.power",
            });
        }
        if jump.dead_power < 0.0 || jump.wall_band < 0.0 || jump.step_tolerance < 0.0 {
            return Err(ConfigError::Invalid {
                field: "config.protagonist.jump".into(),
                reason: "dead_power, wall_band and step_tolerance must be non-negative",
            });
        }
        // A runner faster than the wall band can pass through a wall face in one tick
        match config.protagonist.run.speed.upper_bound() {
            Some(top) if top > jump.wall_band => {
                return Err(ConfigError::Invalid {
                    field: "config.protagonist.run.speed".into(),
                    reason: "can exceed jump.wall_band px/tick",
                });
            }
            Some(_) => {}
            None => log::warn!(
                "Run speed has no upper bound; above {} px/tick walls can be skipped",
                jump.wall_band
            ),
        }

        same_len("config.awards", size.awards.len(), config.awards.len())?;
        for (i, a) in config.awards.iter().enumerate() {
            probability(&format!("config.awards[{i}].probability"), a.probability)?;
        }
        same_len("config.enemies", size.enemies.len(), config.enemies.len())?;
        for (i, e) in config.enemies.iter().enumerate() {
            probability(&format!("config.enemies[{i}].probability"), e.probability)?;
            if e.rebound.count > jump.max_count {
                return Err(ConfigError::Invalid {
                    field: format!("config.enemies[{i}].rebound.count"),
                    reason: "must not exceed jump.max_count",
                });
            }
        }
        same_len("config.flags", size.flags.len(), config.flags.len())?;
        for (i, f) in config.flags.iter().enumerate() {
            let field = format!("config.flags[{i}].placement");
            match f.placement {
                FlagPlacement::Forced { location } => {
                    if !location.is_finite() || location < 0.0 {
                        return Err(ConfigError::Invalid {
                            field,
                            reason: "forced location must be a non-negative world x",
                        });
                    }
                }
                FlagPlacement::Random { probability: p } => probability(&field, p)?,
                FlagPlacement::Floating {
                    probability: p,
                    min_elevation,
                    max_elevation,
                    ..
                } => {
                    probability(&field, p)?;
                    if min_elevation > max_elevation {
                        return Err(ConfigError::Invalid {
                            field,
                            reason: "min_elevation exceeds max_elevation",
                        });
                    }
                }
            }
        }
        if let Some(time) = config.win.time {
            positive("config.win.time", time)?;
        }

        let tile_variants = assets
            .tiles
            .iter()
            .map(|t| TileVariants {
                left: t.left.len(),
                middle: t.middle.len(),
                right: t.right.len(),
            })
            .collect();

        let awards = size
            .awards
            .iter()
            .zip(&config.awards)
            .map(|(size, a)| AwardKind {
                size: *size,
                score: a.score,
                probability: a.probability,
                elevation: a.elevation,
            })
            .collect();

        let enemies = size
            .enemies
            .iter()
            .zip(&config.enemies)
            .zip(&assets.enemies)
            .map(|((size, e), a)| EnemyKind {
                size: *size,
                speed: e.speed,
                probability: e.probability,
                turn_on_cliff: e.turn_on_cliff,
                rebound: e.rebound,
                hold: e.hold,
                running_frames: a.running.len(),
            })
            .collect();

        let flags = size
            .flags
            .iter()
            .zip(&config.flags)
            .map(|(size, f)| FlagKind {
                size: *size,
                placement: f.placement,
            })
            .collect();

        Ok(Self {
            viewport,
            tile_width: tile.width,
            tiers: size.tiles.clone(),
            tile_variants,
            protagonist: ProtagonistSettings {
                size: protagonist_size,
                start: config.protagonist.run.start,
                jump,
                running_frames: protagonist_assets.running.len(),
            },
            awards,
            enemies,
            flags,
            background_width: background.width,
            background_segments: assets.background.len(),
            fps: config.fps.to_curve(),
            run_speed: config.protagonist.run.speed.to_curve(),
            background_speed: config.background.speed.to_curve(),
            empty: config.tile.empty.to_curve(),
            land: config.tile.land.to_curve(),
            win: config.win,
            seed: config.seed,
            assets: AssetManifest::from_options(assets),
        })
    }

    /// Sample every curve for the current progress.
    ///
    /// Runtime values that would break the tick arithmetic are clamped.
    pub fn difficulty(&self, score: u64, elapsed_ms: f64) -> Difficulty {
        let mut fps = self.fps.evaluate(score, elapsed_ms);
        if !fps.is_finite() || fps < MIN_FPS {
            log::warn!("fps curve produced {fps}, clamping to {MIN_FPS}");
            fps = MIN_FPS;
        }
        let run_speed = finite_or_zero(self.run_speed.evaluate(score, elapsed_ms)).max(0.0);
        let background_speed =
            finite_or_zero(self.background_speed.evaluate(score, elapsed_ms)).max(0.0);

        Difficulty {
            fps,
            run_speed,
            background_speed,
            empty: self.empty.evaluate(score, elapsed_ms).at_least(MIN_GAP_TILES),
            land: self.land.evaluate(score, elapsed_ms).at_least(MIN_LAND_TILES),
        }
    }

    pub fn tier_height(&self, tier: usize) -> f64 {
        self.tiers[tier].height
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            field: field.to_string(),
            value,
        })
    }
}

fn body(field: &str, size: &BodySize) -> Result<(), ConfigError> {
    positive(&format!("{field}.width"), size.width)?;
    positive(&format!("{field}.height"), size.height)
}

fn non_empty(field: &str, list: &[String]) -> Result<(), ConfigError> {
    if list.is_empty() {
        Err(ConfigError::EmptyAssets(field.to_string()))
    } else {
        Ok(())
    }
}

fn same_len(field: &'static str, expected: usize, actual: usize) -> Result<(), ConfigError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::LengthMismatch {
            field,
            expected,
            actual,
        })
    }
}

fn probability(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability {
            field: field.to_string(),
            value,
        })
    }
}
