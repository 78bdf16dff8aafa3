//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per call, sized by the fps curve
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, asset or clock dependencies below `session`

pub mod collision;
pub mod enemy;
pub mod kinematics;
pub mod protagonist;
pub mod resolve;
pub mod session;
pub mod spawn;
pub mod state;
pub mod terrain;
pub mod tick;

pub use collision::{CollisionResult, Hitbox, Insets, check_collision, overlaps};
pub use enemy::{Enemy, EnemyStatus};
pub use kinematics::{JumpArc, max_jump_height};
pub use protagonist::{Protagonist, ProtagonistStatus};
pub use session::{Session, SessionError, TickOutcome};
pub use state::{
    Award, AwardStatus, Background, Direction, EntityId, Flag, GameEvent, GamePhase, GameState,
    TickInput, Tile, TileKind,
};
pub use terrain::{Terrain, TilePlan};
pub use tick::tick;
