//! The runner
//!
//! States: Ready → Running ⇄ Jumping → Deading / Dead. Airborne states follow
//! the closed-form arc in [`kinematics`](super::kinematics); landing, walking
//! off a ledge and hitting a wall are decided against the tiles under the
//! hitbox edges after terrain has been refreshed for the tick.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::collision::Hitbox;
use super::kinematics::JumpArc;
use super::state::{EdgeTiles, TileKind};
use super::terrain::Terrain;
use crate::settings::{JumpConfig, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtagonistStatus {
    /// Before start, no motion
    Ready,
    Running,
    Jumping,
    /// Falling after a fatal wall hit, no input
    Deading,
    /// Knocked out; falls off the world
    Dead,
}

/// What changed during a tile check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Walked off a ledge into free fall
    Fell,
    Landed,
    /// Hit the face of a Left tile
    HitWall,
}

/// A jump being charged while the button is held
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Charge {
    /// Power added per tick
    pub rate: f64,
    pub power: f64,
}

#[derive(Debug, Clone)]
pub struct Protagonist {
    /// Center x, world space
    pub location: f64,
    /// Bottom edge, ground-relative
    pub height: f64,
    /// Bottom edge at the end of the previous tick
    pub prev_height: f64,
    /// Horizontal px/tick, resampled every tick
    pub speed: f64,
    pub status: ProtagonistStatus,
    /// Running: animation frame. Airborne: ticks since launch.
    pub frame: u32,
    pub arc: JumpArc,
    pub jump_count: u32,
    pub charge: Option<Charge>,
    pub tiles: EdgeTiles,
}

impl Protagonist {
    pub fn new(location: f64, ground: f64) -> Self {
        Self {
            location,
            height: ground,
            prev_height: ground,
            speed: 0.0,
            status: ProtagonistStatus::Ready,
            frame: 0,
            arc: JumpArc::fall(ground),
            jump_count: 0,
            charge: None,
            tiles: EdgeTiles::default(),
        }
    }

    pub fn hitbox(&self, settings: &Settings) -> Hitbox {
        self.hitbox_at(self.height, settings)
    }

    /// Hitbox with the bottom edge at `height`
    pub fn hitbox_at(&self, height: f64, settings: &Settings) -> Hitbox {
        let size = &settings.protagonist.size;
        Hitbox::standing(
            self.location,
            height,
            DVec2::new(size.width, size.height),
            size.insets,
        )
    }

    /// Still in play (can jump, collect, collide)
    pub fn is_alive(&self) -> bool {
        matches!(
            self.status,
            ProtagonistStatus::Running | ProtagonistStatus::Jumping
        )
    }

    pub fn is_airborne(&self) -> bool {
        matches!(
            self.status,
            ProtagonistStatus::Jumping | ProtagonistStatus::Deading | ProtagonistStatus::Dead
        )
    }

    pub fn can_jump(&self, jump: &JumpConfig) -> bool {
        match self.status {
            ProtagonistStatus::Running => true,
            ProtagonistStatus::Jumping => self.jump_count < jump.max_count,
            _ => false,
        }
    }

    pub fn start(&mut self) {
        if self.status == ProtagonistStatus::Ready {
            self.status = ProtagonistStatus::Running;
            self.frame = 0;
        }
    }

    /// Launch (or relaunch while airborne). Returns the new jump count.
    pub fn jump(&mut self, power: Option<f64>, jump: &JumpConfig) -> Option<u32> {
        if !self.can_jump(jump) {
            return None;
        }
        let count = if self.status == ProtagonistStatus::Running {
            1
        } else {
            self.jump_count + 1
        };
        self.launch(power.unwrap_or(jump.power));
        self.jump_count = count;
        Some(count)
    }

    /// Bounce off a stomped enemy with a forced jump count
    pub fn rebound(&mut self, origin: f64, power: f64, count: u32, jump: &JumpConfig) {
        if !self.is_alive() {
            return;
        }
        self.height = origin;
        self.launch(power);
        self.jump_count = count.min(jump.max_count);
    }

    pub fn start_charge(&mut self, rate: f64, jump: &JumpConfig) -> bool {
        if !self.can_jump(jump) {
            return false;
        }
        self.charge = Some(Charge {
            rate: rate.max(0.0),
            power: jump.power,
        });
        true
    }

    /// Release a held charge into a jump
    pub fn release_charge(&mut self, jump: &JumpConfig) -> Option<u32> {
        let charge = self.charge.take()?;
        self.jump(Some(charge.power), jump)
    }

    /// Fatal contact: pop upward with the dead power and fall off the world
    pub fn die(&mut self, jump: &JumpConfig) {
        self.status = ProtagonistStatus::Dead;
        self.arc = JumpArc::new(self.height, jump.dead_power);
        self.frame = 0;
        self.speed = 0.0;
        self.charge = None;
    }

    /// Pick up this tick's horizontal speed; only moving states advance
    pub fn update_speed(&mut self, run_speed: f64) {
        self.speed = if self.is_alive() { run_speed } else { 0.0 };
    }

    /// Advance motion by one tick
    pub fn tick(&mut self, settings: &Settings) {
        let gravity = settings.protagonist.jump.gravity;
        self.prev_height = self.height;

        match self.status {
            ProtagonistStatus::Ready => {
                self.frame = 0;
            }
            ProtagonistStatus::Running => {
                self.location += self.speed;
                self.frame = (self.frame + 1) % settings.protagonist.running_frames.max(1) as u32;
            }
            ProtagonistStatus::Jumping => {
                self.location += self.speed;
                self.frame += 1;
                self.height = self.arc.height_at(self.frame, gravity);
            }
            ProtagonistStatus::Deading | ProtagonistStatus::Dead => {
                self.frame += 1;
                self.height = self.arc.height_at(self.frame, gravity);
            }
        }

        if let Some(charge) = &mut self.charge {
            charge.power = (charge.power + charge.rate).min(settings.protagonist.jump.max_charge_power);
        }
    }

    /// Refresh tile references and resolve ground contact
    pub fn check_tiles(&mut self, terrain: &Terrain, settings: &Settings) -> Option<Transition> {
        let hitbox = self.hitbox(settings);
        let (left_x, right_x) = (hitbox.left(), hitbox.right());
        self.tiles = EdgeTiles {
            under: terrain.tile_at(self.location).map(|t| t.id),
            left: terrain.tile_at(left_x).map(|t| t.id),
            right: terrain.tile_at(right_x).map(|t| t.id),
        };

        let jump = &settings.protagonist.jump;
        match self.status {
            ProtagonistStatus::Running => {
                if self.is_against_wall(terrain, right_x, jump) {
                    self.start_deading();
                    return Some(Transition::HitWall);
                }
                if terrain.surface_at(left_x).is_none() {
                    // Walking off counts as the first launch
                    self.launch(0.0);
                    self.jump_count = 1;
                    return Some(Transition::Fell);
                }
                None
            }
            ProtagonistStatus::Jumping => {
                let descending = self.height < self.prev_height;
                if self.is_against_wall(terrain, right_x, jump) {
                    if descending {
                        self.start_deading();
                    } else {
                        // Moving up into a face: drop straight down
                        self.arc = JumpArc::fall(self.height);
                        self.frame = 0;
                    }
                    return Some(Transition::HitWall);
                }
                if !descending {
                    return None;
                }
                // Right edge first, then left
                let support = [right_x, left_x]
                    .into_iter()
                    .filter_map(|x| terrain.surface_at(x))
                    .find(|&surface| surface >= self.height);
                if let Some(surface) = support {
                    self.height = surface;
                    self.status = ProtagonistStatus::Running;
                    self.jump_count = 0;
                    self.frame = 0;
                    return Some(Transition::Landed);
                }
                None
            }
            _ => None,
        }
    }

    /// Right edge has just entered a Left tile whose top is out of step reach
    fn is_against_wall(&self, terrain: &Terrain, right_x: f64, jump: &JumpConfig) -> bool {
        terrain.tile_at(right_x).is_some_and(|tile| {
            tile.kind == TileKind::Left
                && right_x - tile.location < jump.wall_band
                && tile.height - self.height > jump.step_tolerance
        })
    }

    fn launch(&mut self, power: f64) {
        self.status = ProtagonistStatus::Jumping;
        self.arc = JumpArc::new(self.height, power);
        self.frame = 0;
    }

    fn start_deading(&mut self) {
        self.status = ProtagonistStatus::Deading;
        self.arc = JumpArc::fall(self.height);
        self.frame = 0;
        self.speed = 0.0;
        self.charge = None;
    }
}
