//! Cue sheet parameters for the procedural score.
//!
//! Every envelope offset is in seconds relative to the moment its voice is
//! scheduled: graph construction for the drone, noise bed and creaks, the
//! trigger instant for the climax voices.

use crate::audio::{Envelope, EnvelopePoint, Waveform};

/// Sample rate used when no output device dictates one (Hz)
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44_100;

/// Floor used instead of zero so exponential ramps stay defined
pub const SILENCE: f32 = 0.0001;

/// The whole fixed score
#[derive(Debug, Clone)]
pub struct CueSheet {
    /// Master output level at construction (linear gain)
    pub master_level: f32,
    pub drone: DroneParams,
    pub noise_bed: NoiseBedParams,
    pub creak: CreakParams,
    pub climax: ClimaxParams,
    pub lifecycle: LifecycleParams,
}

impl Default for CueSheet {
    fn default() -> Self {
        Self {
            master_level: 0.7,
            drone: DroneParams::default(),
            noise_bed: NoiseBedParams::default(),
            creak: CreakParams::default(),
            climax: ClimaxParams::default(),
            lifecycle: LifecycleParams::default(),
        }
    }
}

/// Continuous low drone with a slow downward pitch sweep
#[derive(Debug, Clone)]
pub struct DroneParams {
    pub waveform: Waveform,

    /// Pitch sweep (Hz): 48 Hz sliding to 36 Hz over the full run
    pub frequency: Envelope,

    /// Fade in, then two swells at ~12 s and ~24 s
    pub gain: Envelope,
}

impl Default for DroneParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Triangle,
            frequency: Envelope::new([
                EnvelopePoint::set(0.0, 48.0),
                EnvelopePoint::linear(30.0, 36.0),
            ]),
            gain: Envelope::new([
                EnvelopePoint::set(0.0, SILENCE),
                EnvelopePoint::exponential(1.5, 0.05),
                EnvelopePoint::linear(12.0, 0.22),
                EnvelopePoint::linear(24.0, 0.45),
            ]),
        }
    }
}

/// Looping bed of decaying noise
#[derive(Debug, Clone)]
pub struct NoiseBedParams {
    /// Length of the looped noise buffer (seconds)
    pub buffer_secs: f64,

    /// Decay curve exponent: amplitude = (1 - position)^exponent
    pub decay_exponent: f32,

    /// Three-stage rise at 8 s, 20 s and 26 s
    pub gain: Envelope,
}

impl Default for NoiseBedParams {
    fn default() -> Self {
        Self {
            buffer_secs: 3.0,
            decay_exponent: 1.6,
            gain: Envelope::new([
                EnvelopePoint::set(0.0, SILENCE),
                EnvelopePoint::linear(8.0, 0.08),
                EnvelopePoint::linear(20.0, 0.18),
                EnvelopePoint::linear(26.0, 0.25),
            ]),
        }
    }
}

/// One-shot creak transients
#[derive(Debug, Clone)]
pub struct CreakParams {
    /// Scheduled offsets from graph construction (seconds)
    pub offsets_s: Vec<f64>,

    /// Pitch drop (Hz): 180 Hz down to 40 Hz over 1.2 s
    pub frequency: Envelope,

    /// Fast attack to ~0.35, decay by 1.4 s
    pub gain: Envelope,

    /// Voice lifetime before it stops itself (seconds)
    pub duration_s: f64,
}

impl Default for CreakParams {
    fn default() -> Self {
        Self {
            offsets_s: vec![9.0, 15.5, 21.5],
            frequency: Envelope::new([
                EnvelopePoint::set(0.0, 180.0),
                EnvelopePoint::exponential(1.2, 40.0),
            ]),
            gain: Envelope::new([
                EnvelopePoint::set(0.0, SILENCE),
                EnvelopePoint::exponential(0.22, 0.35),
                EnvelopePoint::exponential(1.4, SILENCE),
            ]),
            duration_s: 1.6,
        }
    }
}

/// Jump-scare burst
#[derive(Debug, Clone)]
pub struct ClimaxParams {
    /// Drone level the ambient swells to after cancel-and-hold
    pub drone_swell_level: f32,

    /// Time for the drone swell (seconds)
    pub drone_swell_s: f64,

    /// Rising sweep oscillator
    pub burst_waveform: Waveform,

    /// 55 Hz to 680 Hz in 0.35 s
    pub burst_frequency: Envelope,

    /// Fast attack, slow decay
    pub burst_gain: Envelope,

    /// Burst lifetime (seconds)
    pub burst_duration_s: f64,

    pub scream: ScreamParams,

    /// Scream mix envelope
    pub scream_gain: Envelope,
}

impl Default for ClimaxParams {
    fn default() -> Self {
        Self {
            drone_swell_level: 0.8,
            drone_swell_s: 0.5,
            burst_waveform: Waveform::Sawtooth,
            burst_frequency: Envelope::new([
                EnvelopePoint::set(0.0, 55.0),
                EnvelopePoint::exponential(0.35, 680.0),
            ]),
            burst_gain: Envelope::new([
                EnvelopePoint::set(0.0, SILENCE),
                EnvelopePoint::exponential(0.12, 1.2),
                EnvelopePoint::exponential(0.9, 0.04),
                EnvelopePoint::linear(1.4, SILENCE),
            ]),
            burst_duration_s: 1.5,
            scream: ScreamParams::default(),
            scream_gain: Envelope::new([
                EnvelopePoint::set(0.0, SILENCE),
                EnvelopePoint::exponential(0.08, 0.9),
                EnvelopePoint::exponential(1.1, SILENCE),
            ]),
        }
    }
}

/// Synthesized scream buffer: enveloped, frequency-jittered sine noise
#[derive(Debug, Clone)]
pub struct ScreamParams {
    /// Buffer length, also the voice lifetime (seconds)
    pub buffer_secs: f64,

    /// Envelope exponent: amplitude = (1 - t / length)^exponent
    pub envelope_exponent: f64,

    /// Centre pitch (Hz)
    pub base_hz: f64,

    /// Jitter amount drawn uniformly from [-depth, depth] per sample
    pub jitter_depth: f64,

    /// Pitch deviation per unit of jitter (Hz)
    pub jitter_hz: f64,
}

impl Default for ScreamParams {
    fn default() -> Self {
        Self {
            buffer_secs: 1.3,
            envelope_exponent: 0.2,
            base_hz: 420.0,
            jitter_depth: 0.7,
            jitter_hz: 120.0,
        }
    }
}

/// Fade-out and teardown timing
#[derive(Debug, Clone)]
pub struct LifecycleParams {
    /// Master fade length (seconds)
    pub fade_out_s: f64,

    /// Level the master fades to
    pub fade_floor: f32,

    /// Delay before the continuous sources stop on dispose (seconds)
    pub source_stop_delay_s: f64,

    /// Delay before the context closes on dispose (seconds)
    pub close_delay_s: f64,
}

impl Default for LifecycleParams {
    fn default() -> Self {
        Self {
            fade_out_s: 2.0,
            fade_floor: SILENCE,
            source_stop_delay_s: 2.1,
            close_delay_s: 2.2,
        }
    }
}
