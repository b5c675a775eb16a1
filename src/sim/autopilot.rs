//! Idle/demo mode: a bot that plays the game
//!
//! Turns toward the nearest target, closes to a comfortable range and fires
//! one shot at a time. Used by the headless native run and the in-browser
//! demo toggle.

use glam::Vec2;

use super::state::{GameState, Owner};
use super::tick::TickInput;
use crate::{wrap_angle, yaw_facing};

/// Largest view rotation per frame (radians)
const TURN_RATE: f32 = 0.1;
/// Aim error under which the bot pulls the trigger (radians)
const AIM_TOLERANCE: f32 = 0.02;
/// Walk toward targets farther than this
const CLOSE_IN_RANGE: f32 = 15.0;

/// Build this frame's input for the bot
pub fn drive(state: &GameState) -> TickInput {
    let mut input = TickInput::default();
    let player = &state.player;

    if player.ammo == 0 {
        input.reload = true;
        return input;
    }

    let Some(target) = state.targets.iter().min_by(|a, b| {
        a.pos
            .distance_squared(player.pos)
            .partial_cmp(&b.pos.distance_squared(player.pos))
            .unwrap_or(std::cmp::Ordering::Equal)
    }) else {
        return input;
    };

    let to_target = target.pos - player.pos;
    let flat = to_target.with_y(0.0);
    let distance = flat.length();

    let yaw_error = wrap_angle(player.yaw - yaw_facing(flat));
    let pitch_error = player.pitch - to_target.y.atan2(distance.max(1e-3));
    input.look_delta = Vec2::new(
        yaw_error.clamp(-TURN_RATE, TURN_RATE),
        pitch_error.clamp(-TURN_RATE, TURN_RATE),
    );

    input.forward = distance > CLOSE_IN_RANGE;

    let in_flight = state.projectiles.iter().any(|p| p.owner == Owner::Player);
    input.fire = !in_flight && yaw_error.abs() < AIM_TOLERANCE && pitch_error.abs() < AIM_TOLERANCE;
    input
}
