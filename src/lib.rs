//! Whisperglass library - a thirty-second haunted mirror with procedural audio

pub mod audio;
pub mod cli;
pub mod params;
pub mod playback;
pub mod recording;
pub mod rendering;
pub mod timeline;
pub mod visuals;
