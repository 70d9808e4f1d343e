//! Offline recording: one complete run rendered to a WAV file.
//!
//! A synthetic frame clock stands in for the display. Each tick renders
//! one frame's worth of audio from the graph and then samples the driver,
//! so the climax and fade land on the same frames they would live.

use std::path::Path;
use std::sync::PoisonError;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::audio::{OfflineFactory, SharedGraph};
use crate::params::{CueSheet, RecordingConfig};
use crate::playback::PlaybackDriver;
use crate::timeline::{Phase, TOTAL_DURATION_SECS};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid recording config: {0}")]
    InvalidConfig(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

/// What happened during an offline run
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    /// Mono frames rendered (per channel)
    pub frames: usize,

    /// Rendered length (seconds)
    pub duration_secs: f64,

    /// Audio clock time at which the climax burst was triggered
    pub climax_at: Option<f64>,

    /// Largest absolute sample value
    pub peak: f32,

    /// Distinct phases in the order the driver visited them
    pub phases: Vec<Phase>,
}

/// Interleaved samples plus the run summary
#[derive(Debug, Clone)]
pub struct Recording {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate_hz: u32,
    pub summary: RecordingSummary,
}

fn pull(graph: &SharedGraph, frames: usize, channels: usize, out: &mut Vec<f32>) {
    let start = out.len();
    out.resize(start + frames * channels, 0.0);
    graph
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .render(&mut out[start..], channels);
}

/// Run one complete playback offline and collect the audio
pub fn render_run(config: &RecordingConfig, cues: CueSheet) -> Result<Recording, RecordError> {
    config.validate().map_err(RecordError::InvalidConfig)?;

    let channels = config.channels as usize;

    let mut driver = PlaybackDriver::new(OfflineFactory::new(
        config.sample_rate_hz,
        cues,
        config.seed,
    ));
    pollster::block_on(driver.start());

    // The offline factory never fails, so a graph always exists here
    let graph = driver.factory().latest_graph().ok_or_else(|| {
        RecordError::InvalidConfig("offline factory produced no graph".to_string())
    })?;

    let origin = Instant::now();
    let mut samples = Vec::with_capacity(
        ((TOTAL_DURATION_SECS + config.tail_secs) * config.sample_rate_hz as f64) as usize
            * channels,
    );
    let mut phases = vec![driver.state().phase];
    let mut climax_at = None;
    let mut ticks: u64 = 0;

    loop {
        let was_fired = driver.audio().is_some_and(|audio| audio.climax_fired());
        let now = origin + Duration::from_secs_f64(ticks as f64 / config.fps as f64);
        let more = driver.frame(now);

        let phase = driver.state().phase;
        if phases.last() != Some(&phase) {
            phases.push(phase);
        }
        if !was_fired && driver.audio().is_some_and(|audio| audio.climax_fired()) {
            climax_at = Some(graph.lock().unwrap_or_else(PoisonError::into_inner).current_time());
        }
        if !more {
            break;
        }

        let due = config.frames_through_tick(ticks) - samples.len() / channels;
        pull(&graph, due, channels, &mut samples);
        ticks += 1;
    }

    // Dispose, then keep rendering through the fade and the close
    driver.teardown();
    let tail_frames = (config.tail_secs * config.sample_rate_hz as f64).round() as usize;
    pull(&graph, tail_frames, channels, &mut samples);

    let frames = samples.len() / channels;
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let summary = RecordingSummary {
        frames,
        duration_secs: frames as f64 / config.sample_rate_hz as f64,
        climax_at,
        peak,
        phases,
    };

    info!(
        frames = summary.frames,
        seconds = summary.duration_secs,
        climax_at = ?summary.climax_at,
        peak = summary.peak,
        "Offline run rendered"
    );

    Ok(Recording {
        samples,
        channels: config.channels,
        sample_rate_hz: config.sample_rate_hz,
        summary,
    })
}

/// Write a recording as 32-bit float WAV
pub fn write_wav(path: &Path, recording: &Recording) -> Result<(), RecordError> {
    let spec = hound::WavSpec {
        channels: recording.channels,
        sample_rate: recording.sample_rate_hz,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &recording.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    info!(path = %path.display(), "WAV written");
    Ok(())
}

/// Render a full run and write it to `config.output_path`
pub fn record(config: &RecordingConfig, cues: CueSheet) -> Result<RecordingSummary, RecordError> {
    let recording = render_run(config, cues)?;
    write_wav(&config.output_path, &recording)?;
    Ok(recording.summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(path: &Path) -> RecordingConfig {
        let mut config = RecordingConfig::new(path);
        config.sample_rate_hz = 6_000;
        config.channels = 1;
        config.fps = 60;
        config.seed = Some(5);
        config
    }

    #[test]
    fn test_offline_run_visits_every_phase() {
        let config = small_config(Path::new("unused.wav"));
        let recording = render_run(&config, CueSheet::default()).unwrap();
        assert_eq!(recording.summary.phases, Phase::ALL.to_vec());
    }

    #[test]
    fn test_offline_run_climax_timing() {
        let config = small_config(Path::new("unused.wav"));
        let recording = render_run(&config, CueSheet::default()).unwrap();
        let climax_at = recording.summary.climax_at.unwrap();
        // Triggered on the first frame at or after 27 s
        assert!((27.0..27.0 + 1.0 / 60.0 + 1e-6).contains(&climax_at), "{climax_at}");
    }

    #[test]
    fn test_offline_run_length_and_silence_after_close() {
        let config = small_config(Path::new("unused.wav"));
        let recording = render_run(&config, CueSheet::default()).unwrap();
        let expected = (30.0 + config.tail_secs) * config.sample_rate_hz as f64;
        assert!((recording.summary.frames as f64 - expected).abs() < 2.0 * 100.0);

        // The context closes 2.2 s into the tail
        let tail = &recording.samples[recording.samples.len() - 600..];
        assert!(tail.iter().all(|s| *s == 0.0));
        assert!(recording.summary.peak > 0.3);
        assert!(recording.summary.peak <= 1.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = small_config(Path::new("unused.wav"));
        config.fps = 0;
        assert!(matches!(
            render_run(&config, CueSheet::default()),
            Err(RecordError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_record_writes_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.wav");
        let mut config = small_config(&path);
        config.sample_rate_hz = 2_000;
        config.channels = 2;

        let summary = record(&config, CueSheet::default()).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 2_000);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        assert_eq!(reader.duration() as usize, summary.frames);
    }
}
