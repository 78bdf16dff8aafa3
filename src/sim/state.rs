//! Game state and core simulation types
//!
//! Everything a tick reads or writes lives in `GameState`. Entities refer to
//! one another by id, resolved through the state, never by reference.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use super::protagonist::Protagonist;
use super::terrain::Terrain;
use crate::settings::Settings;

pub type EntityId = u32;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Built, waiting for assets to settle
    Uninitialized,
    /// Assets settled, first frame drawn, waiting for start
    Initialized,
    Playing,
    Won,
    Lost,
    /// Stopped from outside before an outcome
    Stopped,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::Lost | GamePhase::Stopped)
    }
}

/// Facing / travel direction along the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Direction from `from` toward `to` (right on a tie)
    pub fn toward(from: f64, to: f64) -> Self {
        if to < from {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

/// Tiles under a body's center and its left/right hitbox edges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeTiles {
    pub under: Option<EntityId>,
    pub left: Option<EntityId>,
    pub right: Option<EntityId>,
}

/// Terrain cell shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// Gap, no collision surface
    Empty,
    Left,
    Middle,
    Right,
}

impl TileKind {
    pub fn is_land(self) -> bool {
        self != TileKind::Empty
    }
}

/// One terrain cell
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: EntityId,
    /// Left edge, world x
    pub location: f64,
    pub width: f64,
    pub tier: usize,
    /// Tier height; Empty tiles carry the height of the land before them
    pub height: f64,
    pub kind: TileKind,
    /// Which asset variant the renderer should use
    pub variant: usize,
    pub flags: Vec<Flag>,
}

impl Tile {
    #[inline]
    pub fn right(&self) -> f64 {
        self.location + self.width
    }

    /// Collision surface height, `None` for gaps
    #[inline]
    pub fn surface(&self) -> Option<f64> {
        self.kind.is_land().then_some(self.height)
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.location && x < self.right()
    }

    pub fn tick(&mut self) {
        for flag in &mut self.flags {
            flag.tick();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AwardStatus {
    Held,
    Collected,
}

/// A floating reward
#[derive(Debug, Clone)]
pub struct Award {
    pub id: EntityId,
    pub kind: usize,
    /// Center x
    pub location: f64,
    /// Bottom edge
    pub height: f64,
    pub status: AwardStatus,
    pub frame: u32,
}

/// A marker, either planted on a tile or floating free
#[derive(Debug, Clone)]
pub struct Flag {
    pub id: EntityId,
    pub kind: usize,
    /// Center x
    pub location: f64,
    /// Bottom edge
    pub height: f64,
    /// Horizontal drift in px/tick (zero when planted)
    pub drift: f64,
    pub forced: bool,
    pub frame: u32,
}

impl Flag {
    pub fn tick(&mut self) {
        self.location += self.drift;
        self.frame = self.frame.wrapping_add(1);
    }
}

/// One background image segment, positioned in screen space
#[derive(Debug, Clone)]
pub struct Background {
    pub id: EntityId,
    /// Left edge relative to the viewport
    pub offset: f64,
    pub width: f64,
    /// Index into the background image list
    pub segment: usize,
}

/// Notifications for the host, drained after each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Inited,
    Started,
    ScoreChanged { score: u64, target: Option<u64> },
    AwardCollected { id: EntityId, score: u64 },
    Jumped { count: u32 },
    Fell,
    Landed,
    HitWall,
    EnemyStomped { id: EntityId },
    Died,
    Won,
    Lost,
    Stopped,
}

/// Commands buffered between ticks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub jump: bool,
    /// Launch power override for `jump`
    pub jump_power: Option<f64>,
    /// Begin charging at this rate (power per tick)
    pub start_charge: Option<f64>,
    pub release_charge: bool,
}

impl TickInput {
    pub fn is_empty(&self) -> bool {
        *self == TickInput::default()
    }
}

/// Complete game state (deterministic given seed and inputs)
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Horizontal scroll offset; never decreases
    pub camera: f64,
    pub score: u64,
    /// Simulated game time
    pub elapsed_ms: f64,
    pub time_ticks: u64,
    pub protagonist: Protagonist,
    pub terrain: Terrain,
    /// Sorted by id for deterministic iteration
    pub enemies: Vec<Enemy>,
    pub awards: Vec<Award>,
    /// Floating flags; planted flags live on their tile
    pub flags: Vec<Flag>,
    pub backgrounds: Vec<Background>,
    pub events: Vec<GameEvent>,
    next_id: EntityId,
    next_background_segment: usize,
}

impl GameState {
    /// Build the opening world: safe starting run, runner ready, backgrounds laid
    pub fn new(settings: &Settings, seed: u64) -> Self {
        let ground = settings.tier_height(0);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Uninitialized,
            camera: 0.0,
            score: 0,
            elapsed_ms: 0.0,
            time_ticks: 0,
            protagonist: Protagonist::new(settings.protagonist.start, ground),
            terrain: Terrain::default(),
            enemies: Vec::new(),
            awards: Vec::new(),
            flags: Vec::new(),
            backgrounds: Vec::new(),
            events: Vec::new(),
            next_id: 1,
            next_background_segment: 0,
        };

        let difficulty = settings.difficulty(0, 0.0);
        super::spawn::extend_world(&mut state, settings, &difficulty);
        super::spawn::refill_backgrounds(&mut state, settings);
        state.protagonist.check_tiles(&state.terrain, settings);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Next background image index, cycling through the list
    pub fn next_background_segment(&mut self, segments: usize) -> usize {
        let segment = self.next_background_segment % segments.max(1);
        self.next_background_segment += 1;
        segment
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.awards.sort_by_key(|a| a.id);
        self.flags.sort_by_key(|f| f.id);
    }
}
