//! Procedural voices for the cue sheet.
//!
//! Each function builds one voice (source + gain envelope) scheduled at an
//! origin on the audio clock. No pre-recorded material: the two sample
//! buffers are generated here from a seeded RNG.

use std::f64::consts::TAU;

use rand::Rng;

use super::graph::{BufferPlayer, Oscillator, Source, Voice, Waveform};
use crate::params::{ClimaxParams, CreakParams, DroneParams, NoiseBedParams, ScreamParams};

fn buffer_len(secs: f64, sample_rate: u32) -> usize {
    (secs * sample_rate as f64).round() as usize
}

/// Uniform white noise fading out along the buffer
pub fn decaying_noise<R: Rng + ?Sized>(
    params: &NoiseBedParams,
    sample_rate: u32,
    rng: &mut R,
) -> Vec<f32> {
    let len = buffer_len(params.buffer_secs, sample_rate);
    (0..len)
        .map(|i| {
            let fade = 1.0 - i as f32 / len as f32;
            rng.gen_range(-1.0f32..1.0) * fade.powf(params.decay_exponent)
        })
        .collect()
}

/// Enveloped sine whose pitch jitters every sample
pub fn scream<R: Rng + ?Sized>(params: &ScreamParams, sample_rate: u32, rng: &mut R) -> Vec<f32> {
    let len = buffer_len(params.buffer_secs, sample_rate);
    (0..len)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let envelope = (1.0 - t / params.buffer_secs).max(0.0).powf(params.envelope_exponent);
            let jitter = rng.gen_range(-1.0f64..1.0) * params.jitter_depth;
            let hz = params.base_hz + jitter * params.jitter_hz;
            (envelope * (TAU * hz * t).sin()) as f32
        })
        .collect()
}

/// Continuous ambient drone starting at `origin`
pub fn drone(params: &DroneParams, origin: f64) -> Voice {
    let osc = Oscillator::new(params.waveform, params.frequency.to_param(origin));
    Voice::new(Source::Oscillator(osc), params.gain.to_param(origin)).starting_at(origin)
}

/// Looping noise bed starting at `origin`
pub fn noise_bed(params: &NoiseBedParams, buffer: Vec<f32>, origin: f64) -> Voice {
    Voice::new(
        Source::Buffer(BufferPlayer::new(buffer, true)),
        params.gain.to_param(origin),
    )
    .starting_at(origin)
}

/// Creak transient beginning at `at`; stops itself after its duration
pub fn creak(params: &CreakParams, at: f64) -> Voice {
    let osc = Oscillator::new(Waveform::Sine, params.frequency.to_param(at));
    Voice::new(Source::Oscillator(osc), params.gain.to_param(at))
        .starting_at(at)
        .stopping_at(at + params.duration_s)
}

/// Rising sawtooth sweep of the jump-scare
pub fn burst(params: &ClimaxParams, now: f64) -> Voice {
    let osc = Oscillator::new(params.burst_waveform, params.burst_frequency.to_param(now));
    Voice::new(Source::Oscillator(osc), params.burst_gain.to_param(now))
        .starting_at(now)
        .stopping_at(now + params.burst_duration_s)
}

/// One-shot scream voice playing `buffer`
pub fn scream_voice(params: &ClimaxParams, buffer: Vec<f32>, now: f64) -> Voice {
    Voice::new(
        Source::Buffer(BufferPlayer::new(buffer, false)),
        params.scream_gain.to_param(now),
    )
    .starting_at(now)
    .stopping_at(now + params.scream.buffer_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn near(actual: f32, expected: f32) -> bool {
        (actual - expected).abs() <= 1e-4 + expected.abs() * 1e-4
    }

    #[test]
    fn test_noise_bed_decays() {
        let mut rng = StdRng::seed_from_u64(7);
        let params = NoiseBedParams::default();
        let buffer = decaying_noise(&params, 8000, &mut rng);
        assert_eq!(buffer.len(), 24_000);

        let energy = |s: &[f32]| s.iter().map(|x| x * x).sum::<f32>() / s.len() as f32;
        let head = energy(&buffer[..2400]);
        let tail = energy(&buffer[buffer.len() - 2400..]);
        assert!(head > tail * 10.0, "head {head} tail {tail}");
        assert!(buffer.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_noise_is_reproducible_with_seed() {
        let params = NoiseBedParams::default();
        let a = decaying_noise(&params, 1000, &mut StdRng::seed_from_u64(3));
        let b = decaying_noise(&params, 1000, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_scream_shape() {
        let mut rng = StdRng::seed_from_u64(11);
        let params = ScreamParams::default();
        let buffer = scream(&params, 10_000, &mut rng);
        assert_eq!(buffer.len(), 13_000);
        assert_eq!(buffer[0], 0.0);
        assert!(buffer.iter().all(|s| s.abs() <= 1.0));
        let peak = buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.5);
    }

    #[test]
    fn test_creak_window() {
        let params = CreakParams::default();
        let mut voice = creak(&params, 9.0);
        assert_eq!(voice.start_at(), 9.0);
        assert!(voice.stop_at().is_some_and(|stop| (stop - 10.6).abs() < 1e-9));
        let freq = voice.frequency_mut().map(|f| f.value_at(10.2));
        assert!(freq.is_some_and(|hz| (hz - 40.0).abs() < 1e-3));
        assert!((voice.gain.value_at(9.22) - 0.35).abs() < 1e-4);
    }

    #[test]
    fn test_drone_sweeps_down() {
        let params = DroneParams::default();
        let mut voice = drone(&params, 2.0);
        assert!(voice.stop_at().is_none());
        let Some(freq) = voice.frequency_mut() else {
            panic!("drone must be an oscillator");
        };
        assert!((freq.value_at(2.0) - 48.0).abs() < 1e-4);
        assert!((freq.value_at(32.0) - 36.0).abs() < 1e-4);
        assert!((voice.gain.value_at(26.0) - 0.45).abs() < 1e-4);
    }

    #[test]
    fn test_drone_fades_in_then_swells() {
        let voice = drone(&DroneParams::default(), 0.0);
        assert!(near(voice.gain.value_at(0.0), 0.0001));
        assert!(near(voice.gain.value_at(1.5), 0.05));
        assert!(near(voice.gain.value_at(12.0), 0.22));
        // Linear between the swells
        assert!(near(voice.gain.value_at(18.0), (0.22 + 0.45) / 2.0));
    }

    #[test]
    fn test_noise_bed_stages() {
        let params = NoiseBedParams::default();
        let voice = noise_bed(&params, vec![0.5; 100], 0.0);
        assert_eq!(voice.start_at(), 0.0);
        assert!(voice.stop_at().is_none());
        assert!(near(voice.gain.value_at(0.0), 0.0001));
        assert!(near(voice.gain.value_at(8.0), 0.08));
        assert!(near(voice.gain.value_at(14.0), (0.08 + 0.18) / 2.0));
        assert!(near(voice.gain.value_at(20.0), 0.18));
        assert!(near(voice.gain.value_at(26.0), 0.25));
        assert!(near(voice.gain.value_at(29.0), 0.25));
    }

    #[test]
    fn test_burst_sweep_and_envelope() {
        let params = ClimaxParams::default();
        let mut voice = burst(&params, 27.0);
        assert_eq!(voice.start_at(), 27.0);
        assert!(voice.stop_at().is_some_and(|stop| (stop - 28.5).abs() < 1e-9));

        let gain = voice.gain.clone();
        assert!(near(gain.value_at(27.0), 0.0001));
        assert!(near(gain.value_at(27.12), 1.2));
        assert!(near(gain.value_at(27.9), 0.04));
        assert!(near(gain.value_at(28.15), (0.04 + 0.0001) / 2.0));
        assert!(near(gain.value_at(28.4), 0.0001));

        let Some(freq) = voice.frequency_mut() else {
            panic!("burst must be an oscillator");
        };
        assert!(near(freq.value_at(27.0), 55.0));
        // Exponential: geometric mean halfway through the sweep
        assert!(near(freq.value_at(27.175), (55.0f32 * 680.0).sqrt()));
        assert!(near(freq.value_at(27.35), 680.0));
        assert!(near(freq.value_at(28.0), 680.0));
    }

    #[test]
    fn test_scream_voice_window() {
        let params = ClimaxParams::default();
        let mut voice = scream_voice(&params, vec![0.25; 1300], 27.0);
        assert_eq!(voice.start_at(), 27.0);
        assert!(voice.stop_at().is_some_and(|stop| (stop - 28.3).abs() < 1e-9));
        assert!(voice.frequency_mut().is_none());

        assert!(near(voice.gain.value_at(27.0), 0.0001));
        assert!(near(voice.gain.value_at(27.08), 0.9));
        assert!(near(voice.gain.value_at(28.1), 0.0001));
    }
}
