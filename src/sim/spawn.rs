//! Spawning and culling of everything that rides on the terrain
//!
//! New enemies, awards and flags are only ever created as a tile is
//! appended, so spawn rolls happen in tile order and stay deterministic.

use rand::Rng;

use super::enemy::Enemy;
use super::state::{Award, AwardStatus, Background, Direction, Flag, GameState, TileKind};
use crate::settings::{Difficulty, FlagPlacement, Settings};

/// Append tiles until the window covers the viewport and every enemy's reach
pub fn extend_world(state: &mut GameState, settings: &Settings, difficulty: &Difficulty) {
    while needs_tile(state, settings) {
        let plan = state
            .terrain
            .plan_next(&mut state.rng, settings, difficulty);
        let id = state.next_entity_id();
        state.terrain.push(plan, id, &mut state.rng, settings);
        populate_last_tile(state, settings);
    }
}

fn needs_tile(state: &GameState, settings: &Settings) -> bool {
    let Some(last) = state.terrain.back() else {
        return true;
    };
    last.location < state.camera + settings.viewport.width
        || state.enemies.iter().any(|e| {
            e.is_alive()
                && e.direction == Direction::Right
                && e.hitbox(settings).right() >= last.location
        })
}

/// Spawn rolls for the tile just appended
fn populate_last_tile(state: &mut GameState, settings: &Settings) {
    let Some(tile) = state.terrain.back() else {
        return;
    };
    let (location, width, kind, height) = (tile.location, tile.width, tile.kind, tile.height);
    let center = location + width / 2.0;

    // Planted flags: forced ones at their pinned x, random ones on land
    let mut planted = Vec::new();
    for (index, flag) in settings.flags.iter().enumerate() {
        if let FlagPlacement::Forced { location: x } = flag.placement {
            if x >= location && x < location + width {
                planted.push((index, x, true));
            }
        }
    }
    if kind.is_land() {
        let random = settings
            .flags
            .iter()
            .enumerate()
            .filter_map(|(i, f)| match f.placement {
                FlagPlacement::Random { probability } => Some((i, probability)),
                _ => None,
            });
        if let Some(index) = first_hit(&mut state.rng, random) {
            planted.push((index, center, false));
        }
    }
    for (kind, x, forced) in planted {
        let flag = Flag {
            id: state.next_entity_id(),
            kind,
            location: x,
            height,
            drift: 0.0,
            forced,
            frame: 0,
        };
        log::debug!("Planted flag {} at x={x}", flag.id);
        if let Some(tile) = state.terrain.back_mut() {
            tile.flags.push(flag);
        }
    }

    // Floating flags
    let floating: Vec<_> = settings
        .flags
        .iter()
        .enumerate()
        .filter_map(|(i, f)| match f.placement {
            FlagPlacement::Floating {
                probability,
                drift_speed,
                min_elevation,
                max_elevation,
            } => Some((i, probability, drift_speed, min_elevation, max_elevation)),
            _ => None,
        })
        .collect();
    for (kind, probability, drift, min, max) in floating {
        if state.rng.random::<f64>() < probability {
            let elevation = min + state.rng.random::<f64>() * (max - min);
            let id = state.next_entity_id();
            state.flags.push(Flag {
                id,
                kind,
                location: center,
                height: elevation,
                drift,
                forced: false,
                frame: 0,
            });
        }
    }

    // Enemies walk in from the right, never inside the opening viewport
    if kind == TileKind::Middle && location >= settings.viewport.width {
        let rolls = settings
            .enemies
            .iter()
            .enumerate()
            .map(|(i, e)| (i, e.probability));
        if let Some(index) = first_hit(&mut state.rng, rolls) {
            let id = state.next_entity_id();
            state
                .enemies
                .push(Enemy::new(id, index, center, height, Direction::Left));
        }
    }

    // Awards hover over land and gaps alike, ahead of the runner's start
    if location > settings.protagonist.start {
        let rolls = settings
            .awards
            .iter()
            .enumerate()
            .map(|(i, a)| (i, a.probability));
        if let Some(index) = first_hit(&mut state.rng, rolls) {
            let id = state.next_entity_id();
            state.awards.push(Award {
                id,
                kind: index,
                location: center,
                height: height + settings.awards[index].elevation,
                status: AwardStatus::Held,
                frame: 0,
            });
        }
    }
}

/// Roll each candidate in order; the first success wins
fn first_hit<R: Rng>(rng: &mut R, candidates: impl Iterator<Item = (usize, f64)>) -> Option<usize> {
    for (index, probability) in candidates {
        if rng.random::<f64>() < probability {
            return Some(index);
        }
    }
    None
}

/// Drop everything that can no longer be seen or reached
pub fn cull(state: &mut GameState, settings: &Settings) {
    let camera = state.camera;
    let view_right = camera + settings.viewport.width;

    state.enemies.retain(|e| {
        let hitbox = e.hitbox(settings);
        hitbox.right() > camera && e.height >= -hitbox.size.y
    });
    state.awards.retain(|a| {
        let size = settings.awards[a.kind].size;
        a.status == AwardStatus::Held
            && a.location + size.width / 2.0 > camera
            && a.height >= -size.height
    });
    state.flags.retain(|f| {
        let half = settings.flags[f.kind].size.width / 2.0;
        f.location + half > camera && f.location - half < view_right + settings.viewport.width
    });
}

/// Tile backgrounds end to end across the viewport, dropping ones scrolled off
pub fn refill_backgrounds(state: &mut GameState, settings: &Settings) {
    state.backgrounds.retain(|b| b.offset + b.width > 0.0);
    loop {
        let next = state
            .backgrounds
            .last()
            .map_or(0.0, |b| b.offset + b.width);
        if next >= settings.viewport.width {
            break;
        }
        let id = state.next_entity_id();
        let segment = state.next_background_segment(settings.background_segments);
        state.backgrounds.push(Background {
            id,
            offset: next,
            width: settings.background_width,
            segment,
        });
    }
}
