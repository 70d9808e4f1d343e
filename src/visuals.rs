//! Phase-driven look of the mirror, packed into the shader's uniform block.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::timeline::{Phase, PlaybackState, FINAL_LINE};

/// Uniform buffer for the mirror shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MirrorUniforms {
    /// Glass tint (rgb) and vignette strength (a)
    pub tint: [f32; 4],
    /// Wall-clock seconds since launch (drives grain and flicker)
    pub time: f32,
    /// Run elapsed seconds
    pub elapsed: f32,
    /// Timeline progress in [0, 1]
    pub progress: f32,
    /// Phase index (0 = intro .. 4 = after)
    pub phase: f32,
    pub crack: f32,
    pub eyes: f32,
    pub glitch: f32,
    pub distortion: f32,
    /// 1.0 while the jump-scare is on screen
    pub jump: f32,
    /// 1.0 once the final frame is showing
    pub final_frame: f32,
    /// 1.0 before the first run
    pub idle: f32,
    pub _padding: f32,
}

/// Static per-phase look
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseLook {
    pub tint: Vec3,
    pub vignette: f32,
    pub crack: f32,
    pub eyes: f32,
    pub glitch: f32,
    pub distortion: f32,
}

impl PhaseLook {
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Intro => Self {
                tint: Vec3::new(0.55, 0.62, 0.70),
                vignette: 0.55,
                crack: 0.0,
                eyes: 0.0,
                glitch: 0.0,
                distortion: 0.02,
            },
            Phase::Reveal => Self {
                tint: Vec3::new(0.45, 0.50, 0.58),
                vignette: 0.65,
                crack: 0.1,
                eyes: 0.45,
                glitch: 0.05,
                distortion: 0.05,
            },
            Phase::Escalation => Self {
                tint: Vec3::new(0.50, 0.36, 0.38),
                vignette: 0.78,
                crack: 0.55,
                eyes: 0.8,
                glitch: 0.3,
                distortion: 0.12,
            },
            Phase::Climax => Self {
                tint: Vec3::new(0.75, 0.12, 0.10),
                vignette: 0.9,
                crack: 1.0,
                eyes: 1.0,
                glitch: 0.9,
                distortion: 0.3,
            },
            Phase::After => Self {
                tint: Vec3::new(0.08, 0.06, 0.07),
                vignette: 0.95,
                crack: 1.0,
                eyes: 0.15,
                glitch: 0.0,
                distortion: 0.0,
            },
        }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            tint: self.tint.lerp(other.tint, t),
            vignette: mix(self.vignette, other.vignette),
            crack: mix(self.crack, other.crack),
            eyes: mix(self.eyes, other.eyes),
            glitch: mix(self.glitch, other.glitch),
            distortion: mix(self.distortion, other.distortion),
        }
    }
}

/// Look for the current state, cross-faded from the previous phase for
/// `blend_s` seconds after each boundary
pub fn current_look(state: &PlaybackState, blend_s: f32) -> PhaseLook {
    let target = PhaseLook::for_phase(state.phase);
    let Some(previous) = state.phase.previous() else {
        return target;
    };
    if blend_s <= 0.0 {
        return target;
    }
    let since = (state.elapsed - state.phase.starts_at()) as f32;
    let t = since / blend_s;
    if t >= 1.0 {
        return target;
    }
    PhaseLook::for_phase(previous).lerp(target, t.max(0.0))
}

/// Pack the playback state for the GPU
pub fn mirror_uniforms(state: &PlaybackState, time_s: f32, blend_s: f32) -> MirrorUniforms {
    let look = current_look(state, blend_s);
    let flag = |on: bool| if on { 1.0 } else { 0.0 };

    MirrorUniforms {
        tint: Vec4::from((look.tint, look.vignette)).to_array(),
        time: time_s,
        elapsed: state.elapsed as f32,
        progress: (state.progress() / 100.0) as f32,
        phase: state.phase.index() as f32,
        crack: look.crack,
        eyes: look.eyes,
        glitch: look.glitch,
        distortion: look.distortion,
        jump: flag(state.phase == Phase::Climax),
        final_frame: flag(state.phase == Phase::After),
        idle: flag(state.is_idle()),
        _padding: 0.0,
    }
}

/// Window title carrying the text overlay: cue, the final line once the
/// run is over, then the start/replay label while the control is visible
pub fn window_title(prefix: &str, state: &PlaybackState, label: Option<&str>) -> String {
    let mut parts = vec![prefix];
    if !state.is_idle() {
        parts.push(state.cue());
    }
    if state.phase == Phase::After {
        parts.push(FINAL_LINE);
    }
    parts.extend(label);
    parts.join(" · ")
}
