//! Player preferences
//!
//! Persisted as JSON in LocalStorage on the web; native builds use defaults.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::TargetVariant;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Controls ===
    /// Mouse-look radians per pixel of pointer movement
    pub look_sensitivity: f32,
    /// Invert vertical mouse-look
    pub invert_y: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Gameplay ===
    /// Which targets populate a new session
    pub variant: TargetVariant,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            look_sensitivity: 0.002,
            invert_y: false,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            variant: TargetVariant::Mobile,
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "arena_fps_settings";

    /// Volume actually applied to sound effects
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Convert a pointer movement in pixels to a look rotation in radians
    pub fn look_delta(&self, dx: f32, dy: f32) -> Vec2 {
        let dy = if self.invert_y { -dy } else { dy };
        Vec2::new(dx, dy) * self.look_sensitivity
    }

    /// Parse stored settings; unknown or missing fields fall back to defaults
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => Some(settings.sanitized()),
            Err(e) => {
                log::warn!("Ignoring unreadable settings: {}", e);
                None
            }
        }
    }

    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    /// Clamp values a hand-edited store could have pushed out of range
    fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        if !(self.look_sensitivity.is_finite() && self.look_sensitivity > 0.0) {
            self.look_sensitivity = Self::default().look_sensitivity;
        }
        self
    }

    /// Apply a `variant=` override from a URL query string (`?a=1&variant=static`)
    pub fn apply_query(&mut self, query: &str) {
        let value = query
            .trim_start_matches('?')
            .split('&')
            .find_map(|pair| pair.strip_prefix("variant="));
        let Some(value) = value else { return };

        match value.parse::<TargetVariant>() {
            Ok(variant) => self.variant = variant,
            Err(()) => log::warn!("Unknown variant '{}', keeping {}", value, self.variant.as_str()),
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Some(settings) = Self::from_json(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        match (storage, self.to_json()) {
            (Some(storage), Some(json)) => {
                if storage.set_item(Self::STORAGE_KEY, &json).is_ok() {
                    log::info!("Settings saved");
                } else {
                    log::warn!("Could not write settings");
                }
            }
            _ => log::warn!("LocalStorage unavailable, settings not saved"),
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
