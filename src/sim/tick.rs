//! Variable-rate simulation tick
//!
//! One call advances the world by one frame. The frame length is not fixed:
//! it comes from the fps curve sampled at the start of the tick.

use super::protagonist::{ProtagonistStatus, Transition};
use super::state::{GameEvent, GamePhase, GameState, TickInput};
use super::{resolve, spawn};
use crate::settings::{Difficulty, Settings};

/// Advance the game state by one tick. Returns the difficulty the tick ran at.
///
/// Does nothing outside `Playing`.
pub fn tick(state: &mut GameState, settings: &Settings, input: &TickInput) -> Difficulty {
    let difficulty = settings.difficulty(state.score, state.elapsed_ms);
    if state.phase != GamePhase::Playing {
        return difficulty;
    }

    apply_input(state, settings, input);

    // Camera follows the runner's horizontal speed
    state.protagonist.update_speed(difficulty.run_speed);
    state.camera += state.protagonist.speed;

    // Motion
    state.protagonist.tick(settings);
    for tile in state.terrain.iter_mut() {
        tile.tick();
    }
    for award in &mut state.awards {
        award.frame = award.frame.wrapping_add(1);
    }
    for background in &mut state.backgrounds {
        background.offset -= difficulty.background_speed;
    }
    for flag in &mut state.flags {
        flag.tick();
    }
    for enemy in &mut state.enemies {
        enemy.tick(settings);
    }

    // Regenerate and cull windows
    spawn::extend_world(state, settings, &difficulty);
    let pruned = state.terrain.prune(state.camera);
    if !pruned.is_empty() {
        log::trace!("Pruned {} tiles behind x={:.0}", pruned.len(), state.camera);
    }
    for enemy in &mut state.enemies {
        enemy.check_tile(&state.terrain, settings);
    }
    resolve::enemy_vs_enemy(&mut state.enemies, settings);
    let was_alive = state.protagonist.is_alive();
    match state.protagonist.check_tiles(&state.terrain, settings) {
        Some(Transition::Fell) => state.events.push(GameEvent::Fell),
        Some(Transition::Landed) => state.events.push(GameEvent::Landed),
        Some(Transition::HitWall) => {
            state.events.push(GameEvent::HitWall);
            if was_alive && !state.protagonist.is_alive() {
                state.events.push(GameEvent::Died);
                log::info!("Runner hit a wall at x={:.0}", state.protagonist.location);
            }
        }
        None => {}
    }
    spawn::cull(state, settings);
    spawn::refill_backgrounds(state, settings);
    state.normalize_order();

    // Contacts
    resolve::collect_awards(state, settings);
    resolve::runner_vs_enemies(state, settings);

    state.elapsed_ms += difficulty.frame_ms();
    state.time_ticks += 1;

    // Win is checked first so a last-moment pickup still counts. A runner that
    // is already dying can only lose.
    let runner_height = settings.protagonist.size.height;
    if state.protagonist.is_alive() && settings.win.is_met(state.score, state.elapsed_ms) {
        state.phase = GamePhase::Won;
        state.events.push(GameEvent::Won);
        log::info!(
            "Won with score {} after {:.1}s",
            state.score,
            state.elapsed_ms / 1000.0
        );
    } else if state.protagonist.height < -runner_height {
        if state.protagonist.is_alive() {
            state.events.push(GameEvent::Died);
        }
        state.protagonist.status = ProtagonistStatus::Dead;
        state.phase = GamePhase::Lost;
        state.events.push(GameEvent::Lost);
        log::info!(
            "Lost with score {} after {:.1}s",
            state.score,
            state.elapsed_ms / 1000.0
        );
    }

    difficulty
}

/// Apply buffered commands. Refused jumps are dropped silently.
fn apply_input(state: &mut GameState, settings: &Settings, input: &TickInput) {
    let jump = &settings.protagonist.jump;
    let runner = &mut state.protagonist;

    if let Some(rate) = input.start_charge {
        runner.start_charge(rate, jump);
    }
    if input.release_charge {
        if let Some(count) = runner.release_charge(jump) {
            state.events.push(GameEvent::Jumped { count });
        }
    }
    if input.jump {
        if let Some(count) = runner.jump(input.jump_power, jump) {
            state.events.push(GameEvent::Jumped { count });
        }
    }
}
