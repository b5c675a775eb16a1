//! Web Audio synth for gameplay cues
//!
//! Every cue is a handful of oscillator blips with an exponential decay, so
//! there are no sound files to fetch.

use web_sys::{AudioContext, OscillatorType};

use crate::platform::Sfx;
use crate::sim::SoundCue;

/// One oscillator blip
#[derive(Clone, Copy)]
struct Voice {
    wave: OscillatorType,
    freq: f32,
    /// Target frequency and glide time in seconds
    glide_to: Option<(f32, f64)>,
    /// Peak gain before master volume
    level: f32,
    /// Seconds from trigger to start
    delay: f64,
    /// Seconds to decay to silence
    decay: f64,
}

impl Voice {
    fn new(wave: OscillatorType, freq: f32, level: f32, decay: f64) -> Self {
        Self {
            wave,
            freq,
            glide_to: None,
            level,
            delay: 0.0,
            decay,
        }
    }

    fn glide(mut self, to: f32, over: f64) -> Self {
        self.glide_to = Some((to, over));
        self
    }

    fn after(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }
}

fn cue_voices(cue: SoundCue) -> Vec<Voice> {
    use OscillatorType::{Sawtooth, Sine, Square, Triangle};

    match cue {
        // Falling body plus a short high crack
        SoundCue::Shoot => vec![
            Voice::new(Sawtooth, 900.0, 0.5, 0.12).glide(90.0, 0.1),
            Voice::new(Square, 3000.0, 0.15, 0.03),
        ],
        SoundCue::EnemyShoot => vec![
            Voice::new(Sawtooth, 350.0, 0.35, 0.15).glide(40.0, 0.12),
            Voice::new(Square, 1800.0, 0.1, 0.03),
        ],
        SoundCue::Hit => vec![Voice::new(Triangle, 700.0, 0.4, 0.25).glide(1400.0, 0.1)],
        // Magazine out, magazine in
        SoundCue::Reload => vec![
            Voice::new(Square, 220.0, 0.25, 0.06),
            Voice::new(Square, 330.0, 0.25, 0.06).after(0.18),
        ],
        SoundCue::Empty => vec![Voice::new(Square, 1200.0, 0.15, 0.03)],
        SoundCue::GameOver => [400.0, 350.0, 300.0, 200.0]
            .iter()
            .enumerate()
            .map(|(i, &freq)| Voice::new(Sine, freq, 0.3, 0.3).after(i as f64 * 0.2))
            .collect(),
    }
}

/// Plays [`SoundCue`]s through an `AudioContext`
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Fails outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self { ctx, volume: 0.8 }
    }

    /// Browsers start the context suspended until a user gesture. The promise
    /// resolves once output is running.
    pub fn resume(&self) -> Option<js_sys::Promise> {
        self.ctx.as_ref()?.resume().ok()
    }

    pub fn is_running(&self) -> bool {
        self.ctx
            .as_ref()
            .is_some_and(|ctx| ctx.state() == web_sys::AudioContextState::Running)
    }

    /// Effective volume (0.0 - 1.0), already combined with mute
    pub fn set_volume(&mut self, vol: f32) {
        self.volume = vol.clamp(0.0, 1.0);
    }

    pub fn play_cue(&self, cue: SoundCue) {
        if self.volume <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        for voice in cue_voices(cue) {
            if self.sound(ctx, voice).is_none() {
                log::debug!("Could not schedule {:?}", cue);
                return;
            }
        }
    }

    fn sound(&self, ctx: &AudioContext, voice: Voice) -> Option<()> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;
        osc.set_type(voice.wave);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        let start = ctx.current_time() + voice.delay;
        let end = start + voice.decay;

        let pitch = osc.frequency();
        pitch.set_value_at_time(voice.freq, start).ok()?;
        if let Some((to, over)) = voice.glide_to {
            pitch.exponential_ramp_to_value_at_time(to, start + over).ok()?;
        }

        let envelope = gain.gain();
        envelope.set_value_at_time(self.volume * voice.level, start).ok()?;
        envelope.exponential_ramp_to_value_at_time(0.01, end).ok()?;

        osc.start_with_when(start).ok()?;
        osc.stop_with_when(end + 0.02).ok()
    }
}

impl Sfx for AudioManager {
    fn play(&mut self, cue: SoundCue) {
        self.play_cue(cue);
    }
}
