//! Demo controller that plays on its own
//!
//! Looks a few ticks ahead of the runner's leading edge and jumps at gaps,
//! walls and oncoming enemies. Spends the second jump when it is dropping
//! into a gap.

use crate::schedule::Controller;
use crate::settings::Settings;
use crate::sim::protagonist::ProtagonistStatus;
use crate::sim::session::Session;
use crate::sim::state::{GamePhase, GameState};

#[derive(Debug, Clone, Copy)]
pub struct Autopilot {
    /// How many ticks of travel to look ahead
    pub lookahead_ticks: f64,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            lookahead_ticks: 6.0,
        }
    }
}

impl Autopilot {
    pub fn should_jump(&self, state: &GameState, settings: &Settings) -> bool {
        let runner = &state.protagonist;
        let jump = &settings.protagonist.jump;
        if !runner.can_jump(jump) {
            return false;
        }

        let speed = settings
            .difficulty(state.score, state.elapsed_ms)
            .run_speed
            .max(1.0);
        let reach = speed * self.lookahead_ticks;
        let hitbox = runner.hitbox(settings);
        let probe = hitbox.right() + reach;
        let ahead = state.terrain.surface_at(probe);

        match runner.status {
            ProtagonistStatus::Running => {
                let blocked = ahead.is_none_or(|s| s > runner.height + jump.step_tolerance);
                let enemy_ahead = state.enemies.iter().filter(|e| e.is_alive()).any(|e| {
                    let other = e.hitbox(settings);
                    let gap = other.left() - hitbox.right();
                    (0.0..=reach * 1.5).contains(&gap) && other.bottom() < hitbox.top()
                });
                blocked || enemy_ahead
            }
            ProtagonistStatus::Jumping => {
                let descending = runner.height < runner.prev_height;
                let over_gap = state.terrain.surface_at(runner.location).is_none();
                let falling_short = ahead.is_none_or(|s| s > runner.height);
                descending
                    && over_gap
                    && falling_short
                    && !self.stomp_carries(state, settings, probe, ahead)
            }
            _ => false,
        }
    }

    /// A live enemy below and ahead whose rebound lifts the runner at least
    /// back to its current height (or onto the landing ahead)
    fn stomp_carries(
        &self,
        state: &GameState,
        settings: &Settings,
        probe: f64,
        ahead: Option<f64>,
    ) -> bool {
        let runner = &state.protagonist;
        let hitbox = runner.hitbox(settings);
        let gravity = settings.protagonist.jump.gravity;
        let needed = ahead.map_or(runner.height, |s| s.max(runner.height));
        state.enemies.iter().filter(|e| e.is_alive()).any(|e| {
            let other = e.hitbox(settings);
            other.right() >= hitbox.left()
                && other.left() <= probe
                && other.top() <= runner.height
                && other.top() + e.kind(settings).rebound_height(gravity) >= needed
        })
    }
}

impl Controller for Autopilot {
    fn control(&mut self, session: &mut Session) {
        if session.phase() != GamePhase::Playing {
            return;
        }
        if self.should_jump(session.state(), session.settings()) {
            if let Err(err) = session.jump() {
                log::debug!("Autopilot jump refused: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GameOptions;
    use crate::sim::enemy::Enemy;
    use crate::sim::state::{Direction, TileKind};
    use crate::sim::terrain::{Terrain, TilePlan};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn settings() -> Settings {
        Settings::from_options(&GameOptions::demo()).unwrap()
    }

    fn state_on(settings: &Settings, cells: &[TileKind]) -> GameState {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut terrain = Terrain::default();
        for (i, &kind) in cells.iter().enumerate() {
            let plan = TilePlan {
                location: i as f64 * settings.tile_width,
                kind,
                tier: 0,
            };
            terrain.push(plan, 1000 + i as u32, &mut rng, settings);
        }
        let mut state = GameState::new(settings, 1);
        state.terrain = terrain;
        state.enemies.clear();
        state.protagonist.start();
        state
    }

    #[test]
    fn test_holds_on_flat_ground() {
        let settings = settings();
        let state = state_on(&settings, &[TileKind::Middle; 10]);
        assert!(!Autopilot::default().should_jump(&state, &settings));
    }

    #[test]
    fn test_jumps_before_gap() {
        let settings = settings();
        let mut cells = [TileKind::Middle; 10];
        cells[2] = TileKind::Right;
        cells[3] = TileKind::Empty;
        cells[4] = TileKind::Left;
        let state = state_on(&settings, &cells);
        assert!(Autopilot::default().should_jump(&state, &settings));
    }

    #[test]
    fn test_jumps_over_oncoming_enemy() {
        let settings = settings();
        let mut state = state_on(&settings, &[TileKind::Middle; 10]);
        let height = state.protagonist.height;
        state
            .enemies
            .push(Enemy::new(900, 0, 230.0, height, Direction::Left));
        assert!(Autopilot::default().should_jump(&state, &settings));
    }

    #[test]
    fn test_saves_second_jump_for_a_stomp() {
        let settings = settings();
        let mut state = state_on(&settings, &[TileKind::Empty; 10]);
        let runner = &mut state.protagonist;
        runner.status = ProtagonistStatus::Jumping;
        runner.jump_count = 1;
        runner.prev_height = 152.0;
        runner.height = 150.0;
        let pilot = Autopilot::default();
        assert!(pilot.should_jump(&state, &settings));

        // Top at 104, rebound rises 60: the bounce gets back above 150
        state
            .enemies
            .push(Enemy::new(900, 0, 170.0, 64.0, Direction::Left));
        assert!(!pilot.should_jump(&state, &settings));
    }

    #[test]
    fn test_never_jumps_when_not_allowed() {
        let settings = settings();
        let mut cells = [TileKind::Middle; 10];
        cells[3] = TileKind::Empty;
        let mut state = state_on(&settings, &cells);
        state.protagonist.status = ProtagonistStatus::Deading;
        assert!(!Autopilot::default().should_jump(&state, &settings));
    }
}
