//! Platform abstraction layer
//!
//! The simulation owns no rendering, DOM or audio state. After each frame
//! the drained [`GameEvent`]s are routed to three collaborators:
//! - [`Scene`]: creates/destroys visuals and receives poses
//! - [`Hud`]: score/health/ammo readout and the end screen
//! - [`Sfx`]: fire-and-forget sound cues

#[cfg(target_arch = "wasm32")]
pub mod web;

use glam::{Vec2, Vec3};

use crate::sim::{GameEvent, GameState, HudStats, Outcome, Owner, SoundCue};

/// Visual representation of the simulation
pub trait Scene {
    fn spawn_projectile(&mut self, id: u32, owner: Owner, pos: Vec3);
    fn remove_projectile(&mut self, id: u32);
    fn spawn_target(&mut self, id: u32, pos: Vec3, mobile: bool);
    fn remove_target(&mut self, id: u32, pos: Vec3);
    fn move_projectile(&mut self, id: u32, pos: Vec3);
    fn move_target(&mut self, id: u32, pos: Vec3, yaw: f32);
    fn move_camera(&mut self, pos: Vec3, yaw: f32, pitch: f32);
    /// Short flash when the player is hit
    fn damage_flash(&mut self) {}
}

/// On-screen readouts
pub trait Hud {
    fn show_stats(&mut self, stats: HudStats);
    fn show_outcome(&mut self, outcome: Outcome, score: u64);
}

/// Sound playback
pub trait Sfx {
    fn play(&mut self, cue: SoundCue);
}

/// Sound sink used until audio is available
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Sfx for Silent {
    fn play(&mut self, cue: SoundCue) {
        log::trace!("Audio not ready, dropping {:?}", cue);
    }
}

/// Route one frame's events to the collaborators, in order
pub fn dispatch<S, H, A>(events: &[GameEvent], scene: &mut S, hud: &mut H, sfx: &mut A)
where
    S: Scene + ?Sized,
    H: Hud + ?Sized,
    A: Sfx + ?Sized,
{
    for event in events {
        match *event {
            GameEvent::ProjectileSpawned { id, owner, pos } => {
                scene.spawn_projectile(id, owner, pos)
            }
            GameEvent::ProjectileRemoved { id } => scene.remove_projectile(id),
            GameEvent::TargetSpawned { id, pos, mobile } => scene.spawn_target(id, pos, mobile),
            GameEvent::TargetDestroyed { id, pos } => scene.remove_target(id, pos),
            GameEvent::PlayerDamaged { .. } => scene.damage_flash(),
            GameEvent::Sound(cue) => sfx.play(cue),
            GameEvent::StatsChanged(stats) => hud.show_stats(stats),
            GameEvent::Finished { outcome, score } => hud.show_outcome(outcome, score),
        }
    }
}

/// Whether this frame's events ended the session
pub fn has_finished(events: &[GameEvent]) -> bool {
    events.iter().any(|e| matches!(e, GameEvent::Finished { .. }))
}

/// Full-screen overlay the page should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Playing, nothing covers the view
    None,
    /// Click-to-play screen while the pointer is free
    Start,
    Credits,
    GameOver,
}

/// Menu state the frontend keeps beside the simulation
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuState {
    pub pointer_locked: bool,
    pub credits_open: bool,
}

impl MenuState {
    pub fn overlay(&self, finished: bool) -> Overlay {
        if self.credits_open {
            Overlay::Credits
        } else if finished {
            Overlay::GameOver
        } else if self.pointer_locked {
            Overlay::None
        } else {
            Overlay::Start
        }
    }

    /// A click should capture the pointer only while a game is on and no menu is up
    pub fn should_lock(&self, finished: bool) -> bool {
        !finished && !self.credits_open && !self.pointer_locked
    }
}

/// Virtual on-screen stick driven by a single touch
///
/// The touch-down point becomes the stick center; deflection is the offset
/// from it divided by `radius`, clamped to the unit disc. Screen y grows
/// downward, so dragging up reads as positive y.
#[derive(Debug, Clone, Copy)]
pub struct TouchStick {
    radius: f32,
    anchor: Option<(i32, Vec2)>,
    deflection: Vec2,
}

impl TouchStick {
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.max(1.0),
            anchor: None,
            deflection: Vec2::ZERO,
        }
    }

    /// Claim a touch if the stick is free. Returns whether it was taken.
    pub fn begin(&mut self, touch_id: i32, at: Vec2) -> bool {
        if self.anchor.is_some() {
            return false;
        }
        self.anchor = Some((touch_id, at));
        self.deflection = Vec2::ZERO;
        true
    }

    pub fn drag(&mut self, touch_id: i32, at: Vec2) {
        let Some((id, center)) = self.anchor else { return };
        if id != touch_id {
            return;
        }
        let offset = (at - center) / self.radius;
        self.deflection = Vec2::new(offset.x, -offset.y).clamp_length_max(1.0);
    }

    pub fn end(&mut self, touch_id: i32) {
        if matches!(self.anchor, Some((id, _)) if id == touch_id) {
            self.anchor = None;
            self.deflection = Vec2::ZERO;
        }
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn deflection(&self) -> Vec2 {
        self.deflection
    }
}

/// Push current poses of everything alive to the scene
pub fn sync_scene<S: Scene + ?Sized>(state: &GameState, scene: &mut S) {
    let player = &state.player;
    scene.move_camera(player.pos, player.yaw, player.pitch);
    for target in &state.targets {
        scene.move_target(target.id, target.pos, target.yaw);
    }
    for projectile in &state.projectiles {
        scene.move_projectile(projectile.id, projectile.pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimConfig, TargetVariant, TickInput, tick};

    #[derive(Default)]
    struct Recorder {
        projectiles: Vec<u32>,
        targets: Vec<u32>,
        flashes: u32,
        camera: Option<Vec3>,
        stats: Vec<HudStats>,
        outcome: Option<(Outcome, u64)>,
    }

    impl Scene for Recorder {
        fn spawn_projectile(&mut self, id: u32, _owner: Owner, _pos: Vec3) {
            self.projectiles.push(id);
        }
        fn remove_projectile(&mut self, id: u32) {
            self.projectiles.retain(|p| *p != id);
        }
        fn spawn_target(&mut self, id: u32, _pos: Vec3, _mobile: bool) {
            self.targets.push(id);
        }
        fn remove_target(&mut self, id: u32, _pos: Vec3) {
            self.targets.retain(|t| *t != id);
        }
        fn move_projectile(&mut self, id: u32, _pos: Vec3) {
            assert!(self.projectiles.contains(&id), "moved unknown projectile {id}");
        }
        fn move_target(&mut self, id: u32, _pos: Vec3, _yaw: f32) {
            assert!(self.targets.contains(&id), "moved unknown target {id}");
        }
        fn move_camera(&mut self, pos: Vec3, _yaw: f32, _pitch: f32) {
            self.camera = Some(pos);
        }
        fn damage_flash(&mut self) {
            self.flashes += 1;
        }
    }

    impl Hud for Recorder {
        fn show_stats(&mut self, stats: HudStats) {
            self.stats.push(stats);
        }
        fn show_outcome(&mut self, outcome: Outcome, score: u64) {
            self.outcome = Some((outcome, score));
        }
    }

    #[derive(Default)]
    struct Cues(Vec<SoundCue>);

    impl Sfx for Cues {
        fn play(&mut self, cue: SoundCue) {
            self.0.push(cue);
        }
    }

    #[test]
    fn test_scene_mirrors_simulation() {
        let mut state = GameState::new(77, SimConfig::default());
        let mut view = Recorder::default();
        let mut hud = Recorder::default();
        let mut cues = Cues::default();

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        for frame in 0..600 {
            let input = if frame % 20 == 0 { fire.clone() } else { TickInput::default() };
            tick(&mut state, &input, 1.0 / 60.0);
            let events = state.drain_events();
            dispatch(&events, &mut view, &mut hud, &mut cues);
            sync_scene(&state, &mut view);

            let mut live: Vec<u32> = state.projectiles.iter().map(|p| p.id).collect();
            live.sort_unstable();
            let mut shown = view.projectiles.clone();
            shown.sort_unstable();
            assert_eq!(live, shown);
            assert_eq!(view.targets.len(), state.targets.len());
        }
        assert_eq!(view.camera, Some(state.player.pos));
        assert!(cues.0.contains(&SoundCue::Shoot));
        assert_eq!(hud.stats.last().copied(), Some(state.stats()));
        let damage_taken = crate::consts::MAX_HEALTH - state.player.health;
        assert_eq!(view.flashes * crate::consts::ENEMY_DAMAGE, damage_taken);
    }

    #[test]
    fn test_hud_and_audio_routing() {
        let config = SimConfig {
            variant: TargetVariant::Static,
            ..Default::default()
        };
        let mut state = GameState::empty(1, config);
        state.add_target(Vec3::new(0.0, crate::consts::GROUND_Y, -4.0));
        state.player.ammo = 1;
        state.drain_events();

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        let mut hud = Recorder::default();
        let mut scene = Recorder::default();
        scene.targets.push(state.targets[0].id);
        let mut cues = Cues::default();

        for frame in 0..10 {
            let input = if frame == 0 { fire.clone() } else { TickInput::default() };
            tick(&mut state, &input, 1.0 / 60.0);
            let events = state.drain_events();
            dispatch(&events, &mut scene, &mut hud, &mut cues);
        }

        assert_eq!(hud.outcome, Some((Outcome::Won, 10)));
        assert_eq!(hud.stats.first().map(|s| s.ammo), Some(0));
        assert_eq!(hud.stats.last().map(|s| s.score), Some(10));
        assert!(scene.targets.is_empty());
        assert_eq!(cues.0, vec![SoundCue::Shoot, SoundCue::Hit, SoundCue::GameOver]);
    }

    #[test]
    fn test_touch_stick_tracks_its_own_touch() {
        let mut stick = TouchStick::new(50.0);
        assert!(stick.begin(7, Vec2::new(100.0, 100.0)));
        assert!(!stick.begin(8, Vec2::new(300.0, 100.0)));

        // Drag up and to the right, half a radius each way
        stick.drag(7, Vec2::new(125.0, 75.0));
        assert!((stick.deflection() - Vec2::new(0.5, 0.5)).length() < 1e-6);

        // Other fingers do not move it
        stick.drag(8, Vec2::new(0.0, 0.0));
        assert!((stick.deflection() - Vec2::new(0.5, 0.5)).length() < 1e-6);

        // Far drags saturate at full deflection
        stick.drag(7, Vec2::new(400.0, 100.0));
        assert!((stick.deflection().length() - 1.0).abs() < 1e-6);

        stick.end(8);
        assert!(stick.is_active());
        stick.end(7);
        assert!(!stick.is_active());
        assert_eq!(stick.deflection(), Vec2::ZERO);
    }

    #[test]
    fn test_dragging_look_stick_up_looks_up() {
        let mut state = GameState::empty(5, SimConfig::default());
        let mut stick = TouchStick::new(50.0);
        stick.begin(1, Vec2::new(100.0, 100.0));
        stick.drag(1, Vec2::new(100.0, 50.0));

        let input = TickInput {
            look_stick: stick.deflection(),
            ..Default::default()
        };
        for _ in 0..30 {
            tick(&mut state, &input, 1.0 / 60.0);
        }
        assert!(state.player.pitch > 0.0);
        assert!(state.player.look_direction().y > 0.0);

        // Dragging right turns right (yaw decreases)
        stick.drag(1, Vec2::new(150.0, 100.0));
        let yaw_before = state.player.yaw;
        let input = TickInput {
            look_stick: stick.deflection(),
            ..Default::default()
        };
        tick(&mut state, &input, 1.0 / 60.0);
        assert!(state.player.yaw < yaw_before);
    }

    #[test]
    fn test_game_over_keeps_start_screen_away() {
        let mut state = GameState::empty(3, SimConfig::default());
        let mut menu = MenuState {
            pointer_locked: true,
            ..Default::default()
        };
        assert_eq!(menu.overlay(state.is_finished()), Overlay::None);

        state.damage_player(crate::consts::MAX_HEALTH);
        let events = state.drain_events();
        assert!(has_finished(&events));

        // Lock is released on finish; the end screen stays, not the start screen
        menu.pointer_locked = false;
        assert_eq!(menu.overlay(state.is_finished()), Overlay::GameOver);
        assert!(!menu.should_lock(state.is_finished()));
    }

    #[test]
    fn test_credits_overlay() {
        let mut menu = MenuState::default();
        assert_eq!(menu.overlay(false), Overlay::Start);
        assert!(menu.should_lock(false));

        menu.credits_open = true;
        assert_eq!(menu.overlay(false), Overlay::Credits);
        assert_eq!(menu.overlay(true), Overlay::Credits);
        assert!(!menu.should_lock(false));

        // Back from credits: relock mid-game, end screen after it
        menu.credits_open = false;
        assert!(menu.should_lock(false));
        assert_eq!(menu.overlay(true), Overlay::GameOver);
    }

    #[test]
    fn test_running_frames_are_not_finished() {
        let mut state = GameState::new(9, SimConfig::default());
        tick(&mut state, &TickInput::default(), 1.0 / 60.0);
        assert!(!has_finished(&state.drain_events()));
    }

    #[test]
    fn test_silent_sink_swallows_cues() {
        let events = [GameEvent::Sound(SoundCue::Reload)];
        let mut scene = Recorder::default();
        let mut hud = Recorder::default();
        dispatch(&events, &mut scene, &mut hud, &mut Silent);
        assert!(hud.stats.is_empty());
    }
}
