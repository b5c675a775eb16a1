//! Arena FPS entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{JsFuture, spawn_local};
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use arena_fps::audio::AudioManager;
    use arena_fps::consts::MAX_FRAME_DT;
    use arena_fps::platform::web::{
        DomHud, JsScene, is_pointer_locked, release_pointer_lock, request_pointer_lock,
    };
    use arena_fps::platform::{MenuState, Silent, TouchStick, dispatch, has_finished, sync_scene};
    use arena_fps::session::AssetKind;
    use arena_fps::sim::autopilot;
    use arena_fps::sim::{SimConfig, TickInput};
    use arena_fps::{Session, Settings};

    /// Pixels of finger travel for full stick deflection
    const STICK_RADIUS: f32 = 60.0;
    /// A touch on the look side shorter than this (ms) counts as a tap to fire
    const TAP_MS: f64 = 200.0;

    /// Game instance holding all state
    struct Game {
        session: Session,
        input: TickInput,
        settings: Settings,
        audio: AudioManager,
        scene: JsScene,
        hud: DomHud,
        last_time: f64,
        menu: MenuState,
        autopilot: bool,
        move_stick: TouchStick,
        look_stick: TouchStick,
        look_touch_started: f64,
    }

    impl Game {
        fn new(seed: u64, settings: Settings, hud: DomHud) -> Self {
            let mut audio = AudioManager::new();
            audio.set_volume(settings.effective_volume());
            let config = SimConfig {
                variant: settings.variant,
                ..Default::default()
            };
            log::info!("New session: seed {}, {} targets", seed, config.variant.as_str());

            Self {
                session: Session::new(seed, config),
                input: TickInput::default(),
                settings,
                audio,
                scene: JsScene,
                hud,
                last_time: 0.0,
                menu: MenuState::default(),
                autopilot: false,
                move_stick: TouchStick::new(STICK_RADIUS),
                look_stick: TouchStick::new(STICK_RADIUS),
                look_touch_started: 0.0,
            }
        }

        /// Advance one animation frame and push the results out
        fn update(&mut self, dt: f32) {
            // Nothing to show targets with yet
            if !self.session.is_ready(AssetKind::TargetModels) {
                return;
            }

            let input = if self.autopilot {
                autopilot::drive(self.session.state())
            } else {
                let mut input = self.input.clone();
                if self.move_stick.is_active() {
                    input.move_stick = Some(self.move_stick.deflection());
                }
                input.look_stick = self.look_stick.deflection();
                input
            };

            self.session.step(&input, dt);

            let events = self.session.drain_events();
            if self.session.is_ready(AssetKind::Audio) {
                dispatch(&events, &mut self.scene, &mut self.hud, &mut self.audio);
            } else {
                dispatch(&events, &mut self.scene, &mut self.hud, &mut Silent);
            }
            sync_scene(self.session.state(), &mut self.scene);

            // Free the cursor so the end screen's buttons can be clicked
            if has_finished(&events) {
                release_pointer_lock();
                self.refresh_overlay();
            }

            self.input.clear_triggers();
        }

        fn refresh_overlay(&self) {
            let finished = self.session.state().is_finished();
            self.hud.show_overlay(self.menu.overlay(finished));
        }

        fn restart(&mut self, seed: u64) {
            let config = SimConfig {
                variant: self.settings.variant,
                ..self.session.config()
            };
            self.scene.reset();
            self.input = TickInput::default();
            let epoch = self.session.restart(seed, config);
            self.refresh_overlay();

            // Audio stays unlocked across sessions
            if self.audio.is_running() {
                self.session.complete_asset(epoch, AssetKind::Audio);
            }
        }

        fn toggle_mute(&mut self) {
            self.settings.muted = !self.settings.muted;
            self.audio.set_volume(self.settings.effective_volume());
            self.settings.save();
            log::info!("Muted: {}", self.settings.muted);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Arena FPS starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window, cannot start");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document, cannot start");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element, cannot start");
            return;
        };

        let mut settings = Settings::load();
        if let Ok(query) = window.location().search() {
            settings.apply_query(&query);
        }

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, settings, DomHud::new(document.clone()))));
        game.borrow().refresh_overlay();

        setup_input_handlers(&canvas, game.clone());
        setup_touch_handlers(&canvas, game.clone());
        setup_restart_button(game.clone());
        setup_credits_buttons(game.clone());

        wait_for_models(&game);
        request_animation_frame(game);

        log::info!("Arena FPS running!");
    }

    /// Start the session once the scene has its meshes. A restart while
    /// loading makes the completion stale.
    fn wait_for_models(game: &Rc<RefCell<Game>>) {
        let (promise, epoch) = {
            let g = game.borrow();
            (g.scene.models_ready(), g.session.epoch())
        };

        let game = game.clone();
        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(_) => {
                    if game.borrow_mut().session.complete_asset(epoch, AssetKind::TargetModels) {
                        log::info!("Target models ready");
                    }
                }
                Err(e) => log::warn!("Target models failed to load: {:?}", e),
            }
        });
    }

    /// Resume audio on a user gesture; the completion only counts for the
    /// session it was started in.
    fn unlock_audio(game: &Rc<RefCell<Game>>) {
        let (promise, epoch) = {
            let g = game.borrow();
            if g.session.is_ready(AssetKind::Audio) {
                return;
            }
            (g.audio.resume(), g.session.epoch())
        };
        let Some(promise) = promise else {
            log::warn!("Audio unavailable");
            return;
        };

        let game = game.clone();
        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(_) => {
                    if game.borrow_mut().session.complete_asset(epoch, AssetKind::Audio) {
                        log::info!("Audio unlocked");
                    }
                }
                Err(e) => log::warn!("Audio resume failed: {:?}", e),
            }
        });
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        // Pointer lock change handler
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let locked = is_pointer_locked();
                if locked {
                    log::info!("Pointer lock acquired");
                } else {
                    log::info!("Pointer lock released");
                }
                let mut g = game.borrow_mut();
                g.menu.pointer_locked = locked;
                g.refresh_overlay();
            });
            let _ = document.add_event_listener_with_callback(
                "pointerlockchange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Pointer lock error handler
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                log::warn!("Pointer lock error");
            });
            let _ = document.add_event_listener_with_callback(
                "pointerlockerror",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Mouse look - only while pointer locked
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if !g.menu.pointer_locked {
                    return;
                }
                let delta = g
                    .settings
                    .look_delta(event.movement_x() as f32, event.movement_y() as f32);
                g.input.look_delta += delta;
            });
            let _ = document
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse click - fire when locked, otherwise capture the pointer
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                unlock_audio(&game);
                let mut g = game.borrow_mut();
                if g.menu.pointer_locked {
                    g.input.fire = true;
                } else if g.menu.should_lock(g.session.state().is_finished()) {
                    drop(g); // Release borrow before calling into JS
                    request_pointer_lock();
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "w" | "W" | "ArrowUp" => g.input.forward = true,
                    "s" | "S" | "ArrowDown" => g.input.backward = true,
                    "a" | "A" | "ArrowLeft" => g.input.left = true,
                    "d" | "D" | "ArrowRight" => g.input.right = true,
                    " " => g.input.jump = true,
                    "r" | "R" => g.input.reload = true,
                    "m" | "M" => g.toggle_mute(),
                    "i" | "I" => {
                        g.autopilot = !g.autopilot;
                        log::info!("Autopilot: {}", g.autopilot);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "w" | "W" | "ArrowUp" => g.input.forward = false,
                    "s" | "S" | "ArrowDown" => g.input.backward = false,
                    "a" | "A" | "ArrowLeft" => g.input.left = false,
                    "d" | "D" | "ArrowRight" => g.input.right = false,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Left half of the canvas moves, right half looks; a tap on the right fires
    fn setup_touch_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        fn touch_pos(canvas: &HtmlCanvasElement, touch: &web_sys::Touch) -> Vec2 {
            let rect = canvas.get_bounding_client_rect();
            Vec2::new(
                touch.client_x() as f32 - rect.left() as f32,
                touch.client_y() as f32 - rect.top() as f32,
            )
        }

        // Touch start
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                unlock_audio(&game);
                let half = canvas_clone.client_width() as f32 / 2.0;
                let touches = event.changed_touches();
                let mut g = game.borrow_mut();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else { continue };
                    let pos = touch_pos(&canvas_clone, &touch);
                    if pos.x < half {
                        g.move_stick.begin(touch.identifier(), pos);
                    } else if g.look_stick.begin(touch.identifier(), pos) {
                        g.look_touch_started = js_sys::Date::now();
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let touches = event.changed_touches();
                let mut g = game.borrow_mut();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else { continue };
                    let pos = touch_pos(&canvas_clone, &touch);
                    g.move_stick.drag(touch.identifier(), pos);
                    g.look_stick.drag(touch.identifier(), pos);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end / cancel
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let touches = event.changed_touches();
                let mut g = game.borrow_mut();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else { continue };
                    let id = touch.identifier();
                    let was_look = g.look_stick.is_active();
                    g.look_stick.end(id);
                    let tapped = was_look
                        && !g.look_stick.is_active()
                        && js_sys::Date::now() - g.look_touch_started < TAP_MS;
                    if tapped {
                        g.input.fire = true;
                    }
                    g.move_stick.end(id);
                }
            });
            for kind in ["touchend", "touchcancel"] {
                let _ = canvas
                    .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            }
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.update(dt.clamp(0.0, MAX_FRAME_DT));
        }

        request_animation_frame(game);
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else { return };

        let Some(btn) = document.get_element_by_id("restart-btn") else {
            log::warn!("Missing #restart-btn, restart disabled");
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            let seed = js_sys::Date::now() as u64;
            game.borrow_mut().restart(seed);
            wait_for_models(&game);
            log::info!("Game restarted with seed: {}", seed);
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Credits screen frees the pointer; going back resumes a running game
    fn setup_credits_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else { return };

        if let Some(btn) = document.get_element_by_id("credits-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.menu.credits_open = true;
                g.refresh_overlay();
                drop(g);
                release_pointer_lock();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        } else {
            log::warn!("Missing #credits-btn, credits disabled");
        }

        if let Some(btn) = document.get_element_by_id("back-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.menu.credits_open = false;
                g.refresh_overlay();
                let relock = g.menu.should_lock(g.session.state().is_finished());
                drop(g);
                if relock {
                    request_pointer_lock();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Frames the headless run plays before giving up (two minutes at 60 Hz)
#[cfg(not(target_arch = "wasm32"))]
const HEADLESS_FRAMES: u32 = 7200;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use arena_fps::Session;
    use arena_fps::sim::{SimConfig, TargetVariant, autopilot};

    env_logger::init();
    log::info!("Arena FPS (native) starting...");
    log::info!("Rendering needs the browser build - running a headless autopilot session");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(2024);
    let variant = args
        .next()
        .and_then(|s| s.parse::<TargetVariant>().ok())
        .unwrap_or_default();
    let config = SimConfig {
        variant,
        ..Default::default()
    };

    let mut session = Session::new(seed, config);
    let dt = 1.0 / 60.0;
    let mut frames = 0;
    while frames < HEADLESS_FRAMES && !session.state().is_finished() {
        let input = autopilot::drive(session.state());
        session.step(&input, dt);
        for event in session.drain_events() {
            log::trace!("{:?}", event);
        }
        frames += 1;
    }

    let state = session.state();
    match state.outcome() {
        Some(outcome) => log::info!("Finished after {} frames: {:?}", frames, outcome),
        None => log::info!(
            "Stopped after {} frames with {} targets left",
            frames,
            state.targets.len()
        ),
    }

    let summary = serde_json::json!({
        "seed": seed,
        "variant": variant.as_str(),
        "frames": frames,
        "outcome": state.outcome(),
        "stats": state.stats(),
    });
    println!("{}", summary);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
