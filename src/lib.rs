//! Parkour - a side-scrolling endless runner engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, kinematics, collisions, game state)
//! - `settings`: Config schema, validation and difficulty curves
//! - `curve`: Values that are fixed or evolve with score and elapsed time
//! - `assets`: Asset manifest and load tracking
//! - `render`: Snapshot handed to renderer collaborators
//! - `schedule`: Variable-delay tick scheduler
//! - `autopilot`: Demo controller

pub mod assets;
pub mod autopilot;
pub mod curve;
pub mod render;
pub mod schedule;
pub mod settings;
pub mod sim;

pub use autopilot::Autopilot;
pub use render::{Renderer, Snapshot};
pub use schedule::{RunError, RunSummary, Scheduler};
pub use settings::{ConfigError, GameOptions, Settings};
pub use sim::{GameEvent, GamePhase, Session, SessionError};

/// Defaults used when a config omits a value
pub mod consts {
    /// Runner's horizontal position at start
    pub const DEFAULT_RUN_START: f64 = 160.0;
    /// Run speed, px/tick
    pub const DEFAULT_RUN_SPEED: f64 = 6.0;
    pub const DEFAULT_RUN_SPEED_MAX: f64 = 10.0;

    /// Launch power, px/tick
    pub const DEFAULT_JUMP_POWER: f64 = 14.0;
    /// px/tick²
    pub const DEFAULT_GRAVITY: f64 = 1.2;
    pub const DEFAULT_MAX_JUMP_COUNT: u32 = 2;
    pub const DEFAULT_DEAD_POWER: f64 = 10.0;
    /// Bounce off a stomped enemy
    pub const DEFAULT_REBOUND_POWER: f64 = 12.0;

    /// Distance past a Left tile's edge that counts as its face
    pub const DEFAULT_WALL_BAND: f64 = 12.0;
    /// A surface this far above the runner's feet is a wall, not a step
    pub const DEFAULT_STEP_TOLERANCE: f64 = 8.0;

    pub const DEFAULT_FPS: f64 = 30.0;
    /// Runtime floor for the fps curve
    pub const MIN_FPS: f64 = 1.0;

    /// Generated gaps are at least one tile wide
    pub const MIN_GAP_TILES: u32 = 1;
    /// Left, Middle, Right
    pub const MIN_LAND_TILES: u32 = 3;
}
