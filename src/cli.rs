//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::params::{RecordingConfig, DEFAULT_SAMPLE_RATE_HZ};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Whisperglass")]
#[command(about = "A thirty-second horror vignette in a haunted mirror", long_about = None)]
pub struct Args {
    /// Render one run offline to a WAV file instead of opening a window
    #[arg(long, value_name = "PATH")]
    pub render_wav: Option<PathBuf>,

    /// Seed for the noise sources (random when omitted)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Sample rate for offline rendering (Hz)
    #[arg(long, value_name = "HZ", default_value_t = DEFAULT_SAMPLE_RATE_HZ)]
    pub sample_rate: u32,

    /// Start playback as soon as the window opens
    #[arg(long)]
    pub autostart: bool,
}

impl Args {
    /// Create recording configuration if offline mode is enabled
    pub fn create_recording_config(&self) -> Option<RecordingConfig> {
        self.render_wav.as_ref().map(|path| {
            let mut config = RecordingConfig::new(path);
            config.sample_rate_hz = self.sample_rate;
            config.seed = self.seed;
            config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_open_window() {
        let args = Args::parse_from(["whisperglass"]);
        assert!(args.create_recording_config().is_none());
        assert_eq!(args.sample_rate, 44_100);
        assert!(!args.autostart);
    }

    #[test]
    fn test_render_wav_builds_recording_config() {
        let args = Args::parse_from([
            "whisperglass",
            "--render-wav",
            "out/run.wav",
            "--seed",
            "7",
            "--sample-rate",
            "22050",
        ]);
        let config = args.create_recording_config().unwrap();
        assert_eq!(config.output_path, PathBuf::from("out/run.wav"));
        assert_eq!(config.sample_rate_hz, 22_050);
        assert_eq!(config.seed, Some(7));
    }
}
