//! Session lifetime
//!
//! A restart throws the whole [`GameState`] away and builds a new one. Work
//! that completes asynchronously (audio unlock, model loads) captures the
//! [`Epoch`] it was started in; completions from an older epoch are dropped
//! instead of touching the new session.

use crate::sim::{GameEvent, GameState, SimConfig, TickInput, tick};

/// Identifies one session between restarts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Out-of-band resources the frontend waits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Audio output unlocked by a user gesture
    Audio,
    /// Target meshes handed to the scene
    TargetModels,
}

/// A running game plus the epoch guarding it
#[derive(Debug)]
pub struct Session {
    state: GameState,
    config: SimConfig,
    epoch: Epoch,
    ready: Vec<AssetKind>,
}

impl Session {
    pub fn new(seed: u64, config: SimConfig) -> Self {
        Self {
            state: GameState::new(seed, config),
            config,
            epoch: Epoch(0),
            ready: Vec::new(),
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn config(&self) -> SimConfig {
        self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Run one frame
    pub fn step(&mut self, input: &TickInput, dt: f32) {
        tick(&mut self.state, input, dt);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Tear down and start over. Returns the new epoch.
    pub fn restart(&mut self, seed: u64, config: SimConfig) -> Epoch {
        self.epoch = Epoch(self.epoch.0 + 1);
        self.config = config;
        self.state = GameState::new(seed, config);
        self.ready.clear();
        log::info!("Session restarted (epoch {}, seed {})", self.epoch.0, seed);
        self.epoch
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        epoch == self.epoch
    }

    /// Record that an asset finished loading. Stale completions are ignored.
    pub fn complete_asset(&mut self, epoch: Epoch, kind: AssetKind) -> bool {
        if !self.is_current(epoch) {
            log::debug!(
                "Dropping stale {:?} completion from epoch {} (now {})",
                kind,
                epoch.0,
                self.epoch.0
            );
            return false;
        }
        if !self.ready.contains(&kind) {
            self.ready.push(kind);
        }
        true
    }

    pub fn is_ready(&self, kind: AssetKind) -> bool {
        self.ready.contains(&kind)
    }

    /// Apply a deferred mutation if it still belongs to this session
    pub fn apply<F>(&mut self, epoch: Epoch, f: F) -> bool
    where
        F: FnOnce(&mut GameState),
    {
        if !self.is_current(epoch) {
            log::debug!("Dropping stale completion from epoch {}", epoch.0);
            return false;
        }
        f(&mut self.state);
        true
    }
}
