//! Player movement integration
//!
//! Horizontal motion is velocity x dt from either the digital direction
//! flags or an analog stick. Vertical motion is the per-frame jump arc:
//! launch velocity, constant gravity per frame, landing at eye height.

use glam::{Vec2, Vec3};

use super::state::Player;
use crate::consts::*;
use crate::{clamp_to_arena, yaw_basis};

/// Directional movement intent for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Analog movement stick (x = strafe right, y = forward). Overrides the
    /// flags when present.
    pub stick: Option<Vec2>,
}

/// Look intent for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookIntent {
    /// Mouse-look rotation already scaled to radians (x = yaw, y = pitch)
    pub delta: Vec2,
    /// Analog look stick deflection (x = turn right, y = look up)
    pub stick: Vec2,
}

/// Local (strafe, forward) velocity before rotation into the world
fn local_velocity(intent: &MoveIntent) -> Vec2 {
    if let Some(stick) = intent.stick {
        return stick.clamp_length_max(1.0) * MOVE_SPEED;
    }

    let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f32;
    let dir = Vec2::new(
        axis(intent.right, intent.left),
        axis(intent.forward, intent.backward),
    );
    // Diagonals are normalized so strafing never outruns a single axis
    dir.normalize_or_zero() * MOVE_SPEED
}

/// World-space horizontal velocity for a movement intent at a given yaw
pub fn horizontal_velocity(intent: &MoveIntent, yaw: f32) -> Vec3 {
    let local = local_velocity(intent);
    let (forward, right) = yaw_basis(yaw);
    right * local.x + forward * local.y
}

/// Rotate the view. Pitch is kept within straight up/down.
pub fn apply_look(player: &mut Player, look: &LookIntent) {
    use std::f32::consts::FRAC_PI_2;

    // Mouse y grows downward, the stick's grows upward
    let yaw_delta = look.delta.x + look.stick.x * LOOK_JOYSTICK_RATE;
    let pitch_delta = look.stick.y * LOOK_JOYSTICK_RATE - look.delta.y;
    player.yaw = crate::wrap_angle(player.yaw - yaw_delta);
    player.pitch = (player.pitch + pitch_delta).clamp(-FRAC_PI_2, FRAC_PI_2);
}

/// Begin a jump. Ignored while already airborne.
pub fn start_jump(player: &mut Player) -> bool {
    if player.jumping {
        return false;
    }
    player.jumping = true;
    player.vertical_vel = JUMP_VELOCITY;
    true
}

/// One frame of the jump arc
pub fn integrate_vertical(player: &mut Player) {
    if !player.jumping && player.pos.y <= GROUND_Y {
        return;
    }

    player.vertical_vel -= GRAVITY;
    player.pos.y += player.vertical_vel;

    if player.pos.y < GROUND_Y {
        player.pos.y = GROUND_Y;
        player.vertical_vel = 0.0;
        player.jumping = false;
    }
}

/// Advance the player by one frame and keep them inside the arena
pub fn integrate(player: &mut Player, velocity: Vec3, dt: f32) {
    player.pos += velocity * dt;
    integrate_vertical(player);
    player.pos = clamp_to_arena(player.pos);
}
