//! Arena FPS - a small first-person arena shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, agents, collisions, game state)
//! - `session`: Session lifetime and stale-completion guarding
//! - `platform`: Scene/HUD/audio collaborator seams and event dispatch
//! - `settings`: Player preferences

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use session::{Epoch, Session};
pub use settings::Settings;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Horizontal movement speed (units/s)
    pub const MOVE_SPEED: f32 = 10.0;
    /// Vertical velocity applied on jump (units/frame)
    pub const JUMP_VELOCITY: f32 = 0.3;
    /// Vertical velocity lost each frame while airborne (units/frame)
    pub const GRAVITY: f32 = 0.01;
    /// Eye height of the player when standing on the floor
    pub const GROUND_Y: f32 = 2.0;

    /// Every positioned entity is clamped to [-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT] on x and z
    pub const ARENA_HALF_EXTENT: f32 = 49.0;
    /// Targets spawn uniformly inside [-TARGET_SPAWN_EXTENT, TARGET_SPAWN_EXTENT)
    pub const TARGET_SPAWN_EXTENT: f32 = 40.0;
    pub const TARGET_COUNT: usize = 10;

    pub const MAX_HEALTH: u32 = 100;
    pub const MAX_AMMO: u32 = 30;
    pub const SCORE_PER_TARGET: u64 = 10;
    pub const ENEMY_DAMAGE: u32 = 10;

    /// Player projectile speed (units/s)
    pub const PLAYER_PROJECTILE_SPEED: f32 = 50.0;
    /// Enemy projectile speed (units/s)
    pub const ENEMY_PROJECTILE_SPEED: f32 = 20.0;
    /// Projectiles farther than this from where they were fired are discarded
    pub const PROJECTILE_MAX_RANGE: f32 = 100.0;

    /// Enemy projectile vs player
    pub const PLAYER_HIT_RADIUS: f32 = 1.0;
    /// Player projectile vs static box target
    pub const STATIC_TARGET_HIT_RADIUS: f32 = 1.0;
    /// Player projectile vs mobile humanoid target
    pub const MOBILE_TARGET_HIT_RADIUS: f32 = 2.0;

    /// Mobile target walking speed (units/s)
    pub const AGENT_SPEED: f32 = 2.0;
    /// Heading re-roll interval bounds (seconds)
    pub const HEADING_CHANGE_MIN: f32 = 3.0;
    pub const HEADING_CHANGE_MAX: f32 = 5.0;
    /// Enemies only shoot at a player within this distance
    pub const ENEMY_ENGAGE_RANGE: f32 = 30.0;
    /// Seconds between enemy volleys, shared by all enemies
    pub const ENEMY_FIRE_COOLDOWN: f32 = 2.0;

    /// Look joystick rotation per unit of stick deflection per frame (radians)
    pub const LOOK_JOYSTICK_RATE: f32 = 0.01;
    /// Longest frame the simulation will integrate in one step (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn wrap_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit look vector for a yaw/pitch pair.
///
/// Yaw 0 faces -Z; positive yaw turns left (counter-clockwise seen from above).
#[inline]
pub fn look_direction(yaw: f32, pitch: f32) -> Vec3 {
    let (sy, cy) = yaw.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    Vec3::new(-sy * cp, sp, -cy * cp)
}

/// Horizontal forward and right unit vectors for a yaw
#[inline]
pub fn yaw_basis(yaw: f32) -> (Vec3, Vec3) {
    let (s, c) = yaw.sin_cos();
    (Vec3::new(-s, 0.0, -c), Vec3::new(c, 0.0, -s))
}

/// Yaw that faces along a horizontal direction
#[inline]
pub fn yaw_facing(dir: Vec3) -> f32 {
    (-dir.x).atan2(-dir.z)
}

/// Clamp the horizontal components of a position to the arena
#[inline]
pub fn clamp_to_arena(pos: Vec3) -> Vec3 {
    use consts::ARENA_HALF_EXTENT;
    Vec3::new(
        pos.x.clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT),
        pos.y,
        pos.z.clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_look_direction_axes() {
        let fwd = look_direction(0.0, 0.0);
        assert!((fwd - Vec3::NEG_Z).length() < 1e-5);

        let left = look_direction(FRAC_PI_2, 0.0);
        assert!((left - Vec3::NEG_X).length() < 1e-5);

        let up = look_direction(0.3, FRAC_PI_2);
        assert!((up - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_yaw_facing_roundtrip() {
        for yaw in [-2.5_f32, -1.0, 0.0, 0.7, 3.0] {
            let (fwd, right) = yaw_basis(yaw);
            assert!((yaw_facing(fwd) - yaw).abs() < 1e-4);
            assert!(fwd.dot(right).abs() < 1e-6);
        }
    }

    #[test]
    fn test_wrap_angle() {
        use std::f32::consts::PI;
        assert!((wrap_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert!((wrap_angle(-0.5) + 0.5).abs() < 1e-6);
        assert!(wrap_angle(PI) < PI);
    }

    #[test]
    fn test_clamp_to_arena_keeps_height() {
        let p = clamp_to_arena(Vec3::new(120.0, 7.0, -60.0));
        assert_eq!(p, Vec3::new(49.0, 7.0, -49.0));
    }
}
