//! Browser implementations of the platform seams
//!
//! The 3D scene is owned by page script exposing `window.arenaScene`; this
//! side only forwards spawns, removals and poses to it. The HUD writes
//! straight into the DOM.

use glam::Vec3;
use wasm_bindgen::prelude::*;
use web_sys::Document;

use super::{Hud, Overlay, Scene};
use crate::sim::{HudStats, Outcome, Owner};

// JS bindings for the page-owned scene and pointer lock. Every call is a
// no-op when the page has not installed a scene.
#[wasm_bindgen(inline_js = "
    function scene() {
        return window.arenaScene || null;
    }

    export function scene_spawn_projectile(id, enemy, x, y, z) {
        const s = scene();
        if (s && s.spawnProjectile) s.spawnProjectile(id, enemy, x, y, z);
    }

    export function scene_remove_projectile(id) {
        const s = scene();
        if (s && s.removeProjectile) s.removeProjectile(id);
    }

    export function scene_spawn_target(id, mobile, x, y, z) {
        const s = scene();
        if (s && s.spawnTarget) s.spawnTarget(id, mobile, x, y, z);
    }

    export function scene_remove_target(id, x, y, z) {
        const s = scene();
        if (s && s.removeTarget) s.removeTarget(id, x, y, z);
    }

    export function scene_move_projectile(id, x, y, z) {
        const s = scene();
        if (s && s.moveProjectile) s.moveProjectile(id, x, y, z);
    }

    export function scene_move_target(id, x, y, z, yaw) {
        const s = scene();
        if (s && s.moveTarget) s.moveTarget(id, x, y, z, yaw);
    }

    export function scene_move_camera(x, y, z, yaw, pitch) {
        const s = scene();
        if (s && s.moveCamera) s.moveCamera(x, y, z, yaw, pitch);
    }

    export function scene_damage_flash() {
        const s = scene();
        if (s && s.damageFlash) s.damageFlash();
    }

    export function scene_models_ready() {
        const s = scene();
        if (s && s.modelsReady) return Promise.resolve(s.modelsReady());
        return Promise.resolve();
    }

    export function scene_reset() {
        const s = scene();
        if (s && s.reset) s.reset();
    }

    export function request_pointer_lock() {
        const canvas = document.getElementById('canvas');
        if (!canvas) return;
        const result = canvas.requestPointerLock();
        if (result && result.catch) {
            result.catch(e => console.warn('Pointer lock failed:', e));
        }
    }

    export function release_pointer_lock() {
        if (document.pointerLockElement) document.exitPointerLock();
    }

    export function is_pointer_locked() {
        return document.pointerLockElement !== null;
    }
")]
extern "C" {
    fn scene_spawn_projectile(id: u32, enemy: bool, x: f32, y: f32, z: f32);
    fn scene_remove_projectile(id: u32);
    fn scene_spawn_target(id: u32, mobile: bool, x: f32, y: f32, z: f32);
    fn scene_remove_target(id: u32, x: f32, y: f32, z: f32);
    fn scene_move_projectile(id: u32, x: f32, y: f32, z: f32);
    fn scene_move_target(id: u32, x: f32, y: f32, z: f32, yaw: f32);
    fn scene_move_camera(x: f32, y: f32, z: f32, yaw: f32, pitch: f32);
    fn scene_damage_flash();
    fn scene_reset();
    fn scene_models_ready() -> js_sys::Promise;
    pub fn request_pointer_lock();
    pub fn release_pointer_lock();
    pub fn is_pointer_locked() -> bool;
}

/// Forwards scene updates to `window.arenaScene`
#[derive(Debug, Default)]
pub struct JsScene;

impl JsScene {
    /// Drop every visual from the previous session
    pub fn reset(&mut self) {
        scene_reset();
    }

    /// Resolves once the page has the target meshes loaded
    pub fn models_ready(&self) -> js_sys::Promise {
        scene_models_ready()
    }
}

impl Scene for JsScene {
    fn spawn_projectile(&mut self, id: u32, owner: Owner, pos: Vec3) {
        scene_spawn_projectile(id, owner == Owner::Enemy, pos.x, pos.y, pos.z);
    }

    fn remove_projectile(&mut self, id: u32) {
        scene_remove_projectile(id);
    }

    fn spawn_target(&mut self, id: u32, pos: Vec3, mobile: bool) {
        scene_spawn_target(id, mobile, pos.x, pos.y, pos.z);
    }

    fn remove_target(&mut self, id: u32, pos: Vec3) {
        scene_remove_target(id, pos.x, pos.y, pos.z);
    }

    fn move_projectile(&mut self, id: u32, pos: Vec3) {
        scene_move_projectile(id, pos.x, pos.y, pos.z);
    }

    fn move_target(&mut self, id: u32, pos: Vec3, yaw: f32) {
        scene_move_target(id, pos.x, pos.y, pos.z, yaw);
    }

    fn move_camera(&mut self, pos: Vec3, yaw: f32, pitch: f32) {
        scene_move_camera(pos.x, pos.y, pos.z, yaw, pitch);
    }

    fn damage_flash(&mut self) {
        scene_damage_flash();
    }
}

/// HUD and overlays in the page DOM
pub struct DomHud {
    document: Document,
}

impl DomHud {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(&self, id: &str, hidden: bool) {
        let Some(el) = self.document.get_element_by_id(id) else {
            log::warn!("Missing #{} element", id);
            return;
        };
        let classes = el.class_list();
        let _ = if hidden {
            classes.add_1("hidden")
        } else {
            classes.remove_1("hidden")
        };
    }

    /// Show exactly one of the full-screen overlays, or none
    pub fn show_overlay(&self, overlay: Overlay) {
        self.set_hidden("start-screen", overlay != Overlay::Start);
        self.set_hidden("credits-screen", overlay != Overlay::Credits);
        self.set_hidden("game-over", overlay != Overlay::GameOver);
    }
}

impl Hud for DomHud {
    fn show_stats(&mut self, stats: HudStats) {
        self.set_text("score-value", &stats.score.to_string());
        self.set_text("health-value", &stats.health.to_string());
        self.set_text("ammo-value", &stats.ammo.to_string());
    }

    fn show_outcome(&mut self, outcome: Outcome, score: u64) {
        let title = match outcome {
            Outcome::Won => "You Win!",
            Outcome::Lost => "Game Over",
        };
        if let Some(el) = self.document.query_selector("#game-over h1").ok().flatten() {
            el.set_text_content(Some(title));
        }
        self.set_text("final-score", &score.to_string());
        self.set_hidden("game-over", false);
    }
}
