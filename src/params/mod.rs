//! Parameter definitions with physical units and documented semantics.
//!
//! All script constants live here with:
//! - Physical units (seconds, Hz, linear gain)
//! - Documented ranges and meanings
//! - Defaults that are the fixed script itself

mod audio;
mod render;

// Re-export all types
pub use audio::{
    ClimaxParams, CreakParams, CueSheet, DroneParams, LifecycleParams, NoiseBedParams,
    ScreamParams, DEFAULT_SAMPLE_RATE_HZ, SILENCE,
};
pub use render::{RecordingConfig, RenderConfig};
