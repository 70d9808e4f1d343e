//! Procedural audio engine.
//!
//! A small scheduled-automation synthesis graph, the cue sheet voices built
//! on it, and the controller the playback driver talks to.

mod automation;
mod controller;
mod error;
mod graph;
mod synthesis;
mod system;

// Re-export public types
pub use automation::{AudioParam, AutomationEvent, Curve, Envelope, EnvelopePoint};
pub use controller::{AudioController, DeviceFactory, OfflineFactory};
pub use error::AudioError;
pub use graph::{
    BufferPlayer, Oscillator, SharedGraph, Source, SynthGraph, Voice, VoiceId, Waveform,
};
pub use system::{detect_output_device, AudioContext};
