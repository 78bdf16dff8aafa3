//! Contact resolution between bodies
//!
//! Runs after every body has moved and the terrain has been refreshed. A
//! stomp (runner's previous-tick box entirely above the enemy) beats a side
//! hit from another enemy in the same tick.

use super::collision::{Hitbox, Vertical, check_collision, overlaps};
use super::enemy::Enemy;
use super::protagonist::ProtagonistStatus;
use super::state::{AwardStatus, Direction, GameEvent, GameState};
use crate::settings::Settings;

/// Collect every held award the runner touches. Returns the score gained.
pub fn collect_awards(state: &mut GameState, settings: &Settings) -> u64 {
    if !state.protagonist.is_alive() {
        return 0;
    }
    let runner = state.protagonist.hitbox(settings);
    let mut gained = 0;

    for award in state
        .awards
        .iter_mut()
        .filter(|a| a.status == AwardStatus::Held)
    {
        let kind = &settings.awards[award.kind];
        let hitbox = Hitbox::standing(award.location, award.height, kind.size.dims(), kind.size.insets);
        if overlaps(&runner, &hitbox) {
            award.status = AwardStatus::Collected;
            gained += kind.score;
            state.events.push(GameEvent::AwardCollected {
                id: award.id,
                score: kind.score,
            });
        }
    }

    if gained > 0 {
        state.score += gained;
        state.events.push(GameEvent::ScoreChanged {
            score: state.score,
            target: settings.win.score,
        });
        log::debug!("Score {} (+{gained})", state.score);
    }
    gained
}

/// Runner against live enemies: stomp them from above or die on contact
pub fn runner_vs_enemies(state: &mut GameState, settings: &Settings) {
    let runner = &state.protagonist;
    if !runner.is_alive() {
        return;
    }
    let current = runner.hitbox(settings);
    let previous = runner.hitbox_at(runner.prev_height, settings);
    let airborne = runner.status == ProtagonistStatus::Jumping;

    let mut stomped = Vec::new();
    let mut killer = None;
    for (index, enemy) in state.enemies.iter().enumerate() {
        if !enemy.is_alive() {
            continue;
        }
        let hitbox = enemy.hitbox(settings);
        if !overlaps(&current, &hitbox) {
            continue;
        }
        if airborne && check_collision(&previous, &hitbox).vertical == Vertical::Above {
            stomped.push(index);
        } else if killer.is_none() {
            killer = Some(index);
        }
    }

    let jump = settings.protagonist.jump;
    if !stomped.is_empty() {
        let mut origin = f64::MIN;
        let mut power: f64 = 0.0;
        let mut rise: f64 = 0.0;
        let mut count = 0;
        for &index in &stomped {
            let enemy = &mut state.enemies[index];
            let kind = enemy.kind(settings);
            origin = origin.max(enemy.hitbox(settings).top());
            power = power.max(kind.rebound.power);
            rise = rise.max(kind.rebound_height(jump.gravity));
            count = count.max(kind.rebound.count);
            enemy.stomp();
            state.events.push(GameEvent::EnemyStomped { id: enemy.id });
        }
        state.protagonist.rebound(origin, power, count, &jump);
        state.events.push(GameEvent::Jumped {
            count: state.protagonist.jump_count,
        });
        log::debug!(
            "Stomped {} enemies, rebound power {power} to apex {:.1}",
            stomped.len(),
            origin + rise
        );
    } else if let Some(index) = killer {
        let runner_x = state.protagonist.location;
        let enemy = &mut state.enemies[index];
        enemy.face(runner_x);
        state.protagonist.die(&jump);
        state.events.push(GameEvent::Died);
        log::info!("Runner killed by enemy {} at x={runner_x:.0}", enemy.id);
    }
}

/// Enemies that bump into each other turn away
pub fn enemy_vs_enemy(enemies: &mut [Enemy], settings: &Settings) {
    for j in 1..enemies.len() {
        let (head, tail) = enemies.split_at_mut(j);
        let b = &mut tail[0];
        if !b.blocks(settings) {
            continue;
        }
        let b_box = b.hitbox(settings);
        for a in head.iter_mut().filter(|a| a.blocks(settings)) {
            if !overlaps(&a.hitbox(settings), &b_box) {
                continue;
            }
            turn_away(a, b.location);
            turn_away(b, a.location);
        }
    }
}

fn turn_away(enemy: &mut Enemy, other_x: f64) {
    if enemy.is_alive() && enemy.direction == Direction::toward(enemy.location, other_x) {
        enemy.turn();
    }
}
