//! Window and offline recording configuration.

use std::path::PathBuf;

use super::audio::DEFAULT_SAMPLE_RATE_HZ;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Prefix for the window title; cue text follows it
    pub title: String,

    /// Cross-fade between phase looks (seconds)
    pub phase_blend_s: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 960,
            window_height: 720,
            title: "Whisperglass".to_string(),
            phase_blend_s: 1.2,
        }
    }
}

/// Offline recording configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Destination WAV file
    pub output_path: PathBuf,

    /// Audio sample rate (Hz)
    pub sample_rate_hz: u32,

    /// Interleaved channels written to the file
    pub channels: u16,

    /// Synthetic frame rate driving the playback loop (FPS)
    pub fps: u32,

    /// Audio rendered after teardown to capture the fade and close (seconds)
    pub tail_secs: f64,

    /// Noise seed; random when `None`
    pub seed: Option<u64>,
}

impl RecordingConfig {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            channels: 2,
            fps: 60,
            tail_secs: 2.5,
            seed: None,
        }
    }

    /// Audio frames that should have been rendered by the end of `tick`.
    ///
    /// Cumulative so rates that don't divide evenly by the frame rate never drift.
    pub fn frames_through_tick(&self, tick: u64) -> usize {
        ((tick + 1) * self.sample_rate_hz as u64 / self.fps.max(1) as u64) as usize
    }

    /// Validate configuration (non-zero rates, frame rate below sample rate)
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        if self.channels == 0 {
            return Err("Channel count must be > 0".to_string());
        }
        if self.fps == 0 || self.fps > self.sample_rate_hz {
            return Err(format!(
                "Frame rate must be in 1..={}, got {}",
                self.sample_rate_hz, self.fps
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_through_tick() {
        let mut config = RecordingConfig::new("out.wav");
        assert_eq!(config.frames_through_tick(0), 735);
        assert_eq!(config.frames_through_tick(59), 44_100);

        config.sample_rate_hz = 2_000;
        // 33.3 frames per tick, but one second is still exactly 2000
        assert_eq!(config.frames_through_tick(0), 33);
        assert_eq!(config.frames_through_tick(59), 2_000);
    }

    #[test]
    fn test_validate_rejects_zero_rates() {
        let mut config = RecordingConfig::new("out.wav");
        assert!(config.validate().is_ok());
        config.fps = 0;
        assert!(config.validate().is_err());
        config.fps = 60;
        config.sample_rate_hz = 0;
        assert!(config.validate().is_err());
    }
}
