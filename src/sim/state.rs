//! Game state and core simulation types
//!
//! Entity store (player, projectiles, targets) plus the score/health/ammo
//! tracker. Every mutation the outside world cares about is recorded as a
//! [`GameEvent`] for the platform layer to drain after the frame.

use std::str::FromStr;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::agent;
use crate::consts::*;
use crate::look_direction;

/// How a finished session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Every target destroyed
    Won,
    /// Health reached zero
    Lost,
}

/// Session phase. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Running,
    Finished(Outcome),
}

/// Which kind of targets populate the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetVariant {
    /// Stationary boxes that never shoot back
    Static,
    /// Wandering humanoids that shoot at a nearby player
    #[default]
    Mobile,
}

impl TargetVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetVariant::Static => "static",
            TargetVariant::Mobile => "mobile",
        }
    }

    /// Player projectile hit radius for this kind of target
    pub fn hit_radius(&self) -> f32 {
        match self {
            TargetVariant::Static => STATIC_TARGET_HIT_RADIUS,
            TargetVariant::Mobile => MOBILE_TARGET_HIT_RADIUS,
        }
    }
}

impl FromStr for TargetVariant {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" | "boxes" => Ok(TargetVariant::Static),
            "mobile" | "agents" => Ok(TargetVariant::Mobile),
            _ => Err(()),
        }
    }
}

/// Strategy for finding projectile/target pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Broadphase {
    /// Test every projectile against every target
    #[default]
    Pairwise,
    /// Bucket targets into a uniform grid over the arena first
    Grid,
}

/// Per-session configuration, fixed at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub variant: TargetVariant,
    pub broadphase: Broadphase,
}

/// The player: a camera with a body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Eye position
    pub pos: Vec3,
    /// Heading around +Y (radians, 0 faces -Z)
    pub yaw: f32,
    /// Look elevation (radians, clamped to ±π/2)
    pub pitch: f32,
    /// Vertical velocity (units per frame)
    pub vertical_vel: f32,
    pub jumping: bool,
    pub health: u32,
    pub ammo: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec3::new(0.0, GROUND_Y, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            vertical_vel: 0.0,
            jumping: false,
            health: MAX_HEALTH,
            ammo: MAX_AMMO,
        }
    }
}

impl Player {
    /// Unit vector the player is looking along
    pub fn look_direction(&self) -> Vec3 {
        look_direction(self.yaw, self.pitch)
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// A projectile in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub owner: Owner,
    pub pos: Vec3,
    pub vel: Vec3,
}

impl Projectile {
    pub fn new(id: u32, owner: Owner, pos: Vec3, vel: Vec3) -> Self {
        Self { id, owner, pos, vel }
    }

    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    /// Range is measured from the player's current position, so a shot
    /// chased by the player lives longer than one fired while retreating.
    pub fn out_of_range(&self, player_pos: Vec3) -> bool {
        self.pos.distance(player_pos) > PROJECTILE_MAX_RANGE
    }
}

/// Random-walk steering state of a mobile target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wander {
    /// Unit horizontal heading
    pub heading: Vec3,
    pub speed: f32,
    /// Seconds until the next heading re-roll
    pub change_in: f32,
}

/// A destructible target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    pub pos: Vec3,
    /// Facing around +Y (radians)
    pub yaw: f32,
    pub radius: f32,
    /// Present on mobile targets only
    pub wander: Option<Wander>,
}

impl Target {
    pub fn is_mobile(&self) -> bool {
        self.wander.is_some()
    }
}

/// Audio cues, fire-and-forget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Shoot,
    Hit,
    Reload,
    Empty,
    EnemyShoot,
    GameOver,
}

/// Values shown on the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HudStats {
    pub score: u64,
    pub health: u32,
    pub ammo: u32,
}

/// Something the scene, HUD or audio should react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ProjectileSpawned { id: u32, owner: Owner, pos: Vec3 },
    ProjectileRemoved { id: u32 },
    TargetSpawned { id: u32, pos: Vec3, mobile: bool },
    TargetDestroyed { id: u32, pos: Vec3 },
    PlayerDamaged { amount: u32, health: u32 },
    Sound(SoundCue),
    StatsChanged(HudStats),
    Finished { outcome: Outcome, score: u64 },
}

fn detached_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Complete session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub config: SimConfig,
    pub phase: GamePhase,
    pub score: u64,
    /// Frames stepped so far
    pub frame: u64,
    /// Simulated seconds so far
    pub elapsed: f64,
    pub player: Player,
    pub projectiles: Vec<Projectile>,
    pub targets: Vec<Target>,
    /// Seconds since the last enemy volley (shared by every enemy)
    pub enemy_fire_timer: f32,
    #[serde(skip, default = "detached_rng")]
    pub rng: Pcg32,
    #[serde(skip)]
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a session with a fresh set of targets
    pub fn new(seed: u64, config: SimConfig) -> Self {
        let mut state = Self::empty(seed, config);
        state.spawn_targets(TARGET_COUNT);
        state.emit_stats();
        state
    }

    /// A session with no targets placed yet
    pub fn empty(seed: u64, config: SimConfig) -> Self {
        Self {
            seed,
            config,
            phase: GamePhase::Running,
            score: 0,
            frame: 0,
            elapsed: 0.0,
            player: Player::default(),
            projectiles: Vec::new(),
            targets: Vec::new(),
            enemy_fire_timer: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn spawn_targets(&mut self, count: usize) {
        for _ in 0..count {
            let x = self.rng.random_range(-TARGET_SPAWN_EXTENT..TARGET_SPAWN_EXTENT);
            let z = self.rng.random_range(-TARGET_SPAWN_EXTENT..TARGET_SPAWN_EXTENT);
            self.add_target(Vec3::new(x, GROUND_Y, z));
        }
    }

    /// Place a target of the configured variant. Mobile targets get a random
    /// initial heading.
    pub fn add_target(&mut self, pos: Vec3) -> u32 {
        let id = self.next_entity_id();
        let wander = match self.config.variant {
            TargetVariant::Static => None,
            TargetVariant::Mobile => Some(agent::new_wander(&mut self.rng)),
        };
        let yaw = wander
            .as_ref()
            .map(|w| crate::yaw_facing(w.heading))
            .unwrap_or(0.0);
        self.targets.push(Target {
            id,
            pos,
            yaw,
            radius: self.config.variant.hit_radius(),
            wander,
        });
        self.events.push(GameEvent::TargetSpawned {
            id,
            pos,
            mobile: self.config.variant == TargetVariant::Mobile,
        });
        id
    }

    /// Launch a projectile and announce it to the scene
    pub fn spawn_projectile(&mut self, owner: Owner, origin: Vec3, vel: Vec3) -> u32 {
        let id = self.next_entity_id();
        self.projectiles.push(Projectile::new(id, owner, origin, vel));
        self.events.push(GameEvent::ProjectileSpawned {
            id,
            owner,
            pos: origin,
        });
        id
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Finished(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            GamePhase::Running => None,
            GamePhase::Finished(outcome) => Some(outcome),
        }
    }

    pub fn stats(&self) -> HudStats {
        HudStats {
            score: self.score,
            health: self.player.health,
            ammo: self.player.ammo,
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn emit_stats(&mut self) {
        let stats = self.stats();
        self.events.push(GameEvent::StatsChanged(stats));
    }

    /// Events recorded since the last drain, oldest first
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn add_score(&mut self, points: u64) {
        self.score += points;
        self.emit_stats();
    }

    /// Apply damage to the player, ending the session at zero health
    pub fn damage_player(&mut self, amount: u32) {
        if self.is_finished() {
            return;
        }
        self.player.health = self.player.health.saturating_sub(amount);
        self.events.push(GameEvent::PlayerDamaged {
            amount,
            health: self.player.health,
        });
        self.emit_stats();
        log::debug!("Player hit, health {}", self.player.health);

        if !self.player.is_alive() {
            self.finish(Outcome::Lost);
        }
    }

    /// Enter the terminal phase. Only the first call has any effect.
    pub fn finish(&mut self, outcome: Outcome) {
        if self.is_finished() {
            return;
        }
        self.phase = GamePhase::Finished(outcome);
        log::info!(
            "Session over: {:?} with score {} after {} frames",
            outcome,
            self.score,
            self.frame
        );
        self.events.push(GameEvent::Sound(SoundCue::GameOver));
        self.events.push(GameEvent::Finished {
            outcome,
            score: self.score,
        });
    }
}
