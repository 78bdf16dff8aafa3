//! Patrolling enemies
//!
//! Enemies walk along land at their kind's speed, turn at walls (and at
//! cliffs when configured to), drop off ledges otherwise and die when stomped.

use serde::{Deserialize, Serialize};

use super::collision::Hitbox;
use super::kinematics::JumpArc;
use super::state::{Direction, EdgeTiles, EntityId};
use super::terrain::Terrain;
use crate::settings::{EnemyKind, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyStatus {
    Running,
    /// Falling after walking off a ledge
    Jumping,
    Dead,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    /// Index into `Settings::enemies`
    pub kind: usize,
    /// Center x
    pub location: f64,
    /// Bottom edge
    pub height: f64,
    pub prev_height: f64,
    pub direction: Direction,
    pub status: EnemyStatus,
    pub frame: u32,
    pub arc: JumpArc,
    pub tiles: EdgeTiles,
}

impl Enemy {
    pub fn new(id: EntityId, kind: usize, location: f64, height: f64, direction: Direction) -> Self {
        Self {
            id,
            kind,
            location,
            height,
            prev_height: height,
            direction,
            status: EnemyStatus::Running,
            frame: 0,
            arc: JumpArc::fall(height),
            tiles: EdgeTiles::default(),
        }
    }

    #[inline]
    pub fn kind<'a>(&self, settings: &'a Settings) -> &'a EnemyKind {
        &settings.enemies[self.kind]
    }

    pub fn hitbox(&self, settings: &Settings) -> Hitbox {
        let size = self.kind(settings).size;
        Hitbox::standing(self.location, self.height, size.dims(), size.insets)
    }

    pub fn is_alive(&self) -> bool {
        self.status != EnemyStatus::Dead
    }

    /// Whether this enemy takes part in enemy-vs-enemy contact
    pub fn blocks(&self, settings: &Settings) -> bool {
        self.is_alive() || self.kind(settings).hold
    }

    pub fn turn(&mut self) {
        self.direction = self.direction.flip();
    }

    /// Face toward world x
    pub fn face(&mut self, x: f64) {
        self.direction = Direction::toward(self.location, x);
    }

    pub fn tick(&mut self, settings: &Settings) {
        let kind = *self.kind(settings);
        let gravity = settings.protagonist.jump.gravity;
        self.prev_height = self.height;

        match self.status {
            EnemyStatus::Running => {
                self.location += kind.speed * self.direction.sign();
                self.frame = (self.frame + 1) % kind.running_frames.max(1) as u32;
            }
            EnemyStatus::Jumping => {
                self.location += kind.speed * self.direction.sign();
                self.frame += 1;
                self.height = self.arc.height_at(self.frame, gravity);
            }
            EnemyStatus::Dead => {
                if !kind.hold {
                    self.frame += 1;
                    self.height = self.arc.height_at(self.frame, gravity);
                }
            }
        }
    }

    /// Refresh tile references and react to the ground ahead
    pub fn check_tile(&mut self, terrain: &Terrain, settings: &Settings) {
        let kind = *self.kind(settings);
        let hitbox = self.hitbox(settings);
        let (left_x, right_x) = (hitbox.left(), hitbox.right());
        self.tiles = EdgeTiles {
            under: terrain.tile_at(self.location).map(|t| t.id),
            left: terrain.tile_at(left_x).map(|t| t.id),
            right: terrain.tile_at(right_x).map(|t| t.id),
        };
        let lead_x = match self.direction {
            Direction::Left => left_x,
            Direction::Right => right_x,
        };
        let lead = terrain.surface_at(lead_x);

        match self.status {
            EnemyStatus::Running => {
                match lead {
                    Some(surface) if surface == self.height => {}
                    Some(surface) if surface > self.height => self.turn(),
                    _ if kind.turn_on_cliff => self.turn(),
                    _ => {
                        let under = terrain.surface_at(self.location);
                        if under.is_none_or(|surface| surface < self.height) {
                            self.status = EnemyStatus::Jumping;
                            self.arc = JumpArc::fall(self.height);
                            self.frame = 0;
                        }
                    }
                }
            }
            EnemyStatus::Jumping => {
                if lead.is_some_and(|surface| surface > self.prev_height) {
                    self.turn();
                }
                let descending = self.height < self.prev_height;
                let landing = terrain
                    .surface_at(self.location)
                    .filter(|&surface| surface >= self.height && surface <= self.prev_height);
                if let (true, Some(surface)) = (descending, landing) {
                    self.height = surface;
                    self.status = EnemyStatus::Running;
                    self.frame = 0;
                }
            }
            EnemyStatus::Dead => {}
        }
    }

    /// Killed from above. Holding kinds stay put, others drop through the floor.
    pub fn stomp(&mut self) {
        self.status = EnemyStatus::Dead;
        self.arc = JumpArc::fall(self.height);
        self.frame = 0;
    }
}
