//! Mobile target steering and enemy fire
//!
//! Targets random-walk: each holds a heading that is re-rolled every 3-5
//! seconds and bounces off the arena walls. There is no pathing or pursuit.
//! Enemy fire shares one cooldown across all enemies.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use super::state::{Target, Wander};
use crate::consts::*;
use crate::yaw_facing;

/// Uniformly random unit heading on the floor plane
pub fn random_heading<R: Rng>(rng: &mut R) -> Vec3 {
    let angle = rng.random_range(0.0..TAU);
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

/// Seconds until the next heading change
pub fn random_countdown<R: Rng>(rng: &mut R) -> f32 {
    rng.random_range(HEADING_CHANGE_MIN..=HEADING_CHANGE_MAX)
}

/// Fresh steering state for a newly placed mobile target
pub fn new_wander<R: Rng>(rng: &mut R) -> Wander {
    Wander {
        heading: random_heading(rng),
        speed: AGENT_SPEED,
        change_in: random_countdown(rng),
    }
}

/// Reflect one horizontal axis off the arena wall. Returns true on a bounce.
fn bounce_axis(pos: &mut f32, heading: &mut f32) -> bool {
    if pos.abs() <= ARENA_HALF_EXTENT {
        return false;
    }
    *pos = pos.clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT);
    *heading = -*heading;
    true
}

/// Advance one target by a frame. Static targets are left alone.
pub fn steer<R: Rng>(target: &mut Target, dt: f32, rng: &mut R) {
    let Some(wander) = target.wander.as_mut() else {
        return;
    };

    wander.change_in -= dt;
    if wander.change_in <= 0.0 {
        wander.heading = random_heading(rng);
        wander.change_in = random_countdown(rng);
        target.yaw = yaw_facing(wander.heading);
    }

    target.pos += wander.heading * wander.speed * dt;

    let bounced_x = bounce_axis(&mut target.pos.x, &mut wander.heading.x);
    let bounced_z = bounce_axis(&mut target.pos.z, &mut wander.heading.z);
    if bounced_x || bounced_z {
        wander.change_in = random_countdown(rng);
        target.yaw = yaw_facing(wander.heading);
        log::trace!("Target {} bounced at {:?}", target.id, target.pos);
    }
}

/// Advance every target, in store order
pub fn update_agents<R: Rng>(targets: &mut [Target], dt: f32, rng: &mut R) {
    for target in targets.iter_mut() {
        steer(target, dt, rng);
    }
}

/// An enemy projectile to launch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volley {
    pub shooter: u32,
    pub origin: Vec3,
    pub velocity: Vec3,
}

/// Tick the shared fire cooldown and pick a shooter if it has elapsed.
///
/// The first mobile target within engagement range of the player fires,
/// aimed at the player's current position, and the cooldown restarts for
/// everyone.
pub fn enemy_volley(
    targets: &[Target],
    player_pos: Vec3,
    timer: &mut f32,
    dt: f32,
) -> Option<Volley> {
    *timer += dt;
    if *timer < ENEMY_FIRE_COOLDOWN {
        return None;
    }

    let shooter = targets
        .iter()
        .filter(|t| t.is_mobile())
        .find(|t| t.pos.distance(player_pos) <= ENEMY_ENGAGE_RANGE)?;

    *timer = 0.0;
    let aim = (player_pos - shooter.pos).normalize_or_zero();
    Some(Volley {
        shooter: shooter.id,
        origin: shooter.pos,
        velocity: aim * ENEMY_PROJECTILE_SPEED,
    })
}
