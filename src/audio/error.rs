//! Audio subsystem errors.

use thiserror::Error;

/// Reasons an audio controller could not be built
#[derive(Debug, Error)]
pub enum AudioError {
    /// No output device on this host
    #[error("audio output not supported: no output device found")]
    Unsupported,

    /// The device only offers a sample format the renderer does not write
    #[error("unsupported sample format: {0:?}")]
    SampleFormat(cpal::SampleFormat),

    #[error("failed to get audio config: {0}")]
    StreamConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}
