//! Phase timeline: elapsed time to narrative phase and cue text.
//!
//! The timeline is a pure function of elapsed seconds. Nothing here owns
//! state beyond the `PlaybackState` snapshot the driver mutates each frame.

use std::fmt;

/// Total length of one run (seconds)
pub const TOTAL_DURATION_SECS: f64 = 30.0;

/// Start label shown before the first run
pub const START_LABEL: &str = "touch the mirror";

/// Replay label shown once a run has completed
pub const REPLAY_LABEL: &str = "watch again";

/// Line shown over the final frame
pub const FINAL_LINE: &str = "it followed you home.";

/// Caption shown alongside the mirror
pub const CAPTION: &str = "Best experienced with sound · 30 seconds";

/// Narrative phase, ordered by when it begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Phase {
    #[default]
    Intro,
    Reveal,
    Escalation,
    Climax,
    After,
}

impl Phase {
    /// All phases in timeline order
    pub const ALL: [Phase; 5] = [
        Phase::Intro,
        Phase::Reveal,
        Phase::Escalation,
        Phase::Climax,
        Phase::After,
    ];

    /// Elapsed time (seconds) at which this phase begins
    pub const fn starts_at(self) -> f64 {
        match self {
            Phase::Intro => 0.0,
            Phase::Reveal => 10.0,
            Phase::Escalation => 20.0,
            Phase::Climax => 27.0,
            Phase::After => TOTAL_DURATION_SECS,
        }
    }

    /// Derive the phase for an elapsed time.
    ///
    /// Boundary values resolve to the later phase. NaN and negative
    /// inputs fall through every comparison and resolve to `Intro`.
    pub fn from_elapsed(elapsed_secs: f64) -> Self {
        if elapsed_secs >= Phase::After.starts_at() {
            Phase::After
        } else if elapsed_secs >= Phase::Climax.starts_at() {
            Phase::Climax
        } else if elapsed_secs >= Phase::Escalation.starts_at() {
            Phase::Escalation
        } else if elapsed_secs >= Phase::Reveal.starts_at() {
            Phase::Reveal
        } else {
            Phase::Intro
        }
    }

    /// Cue text displayed during this phase
    pub const fn cue(self) -> &'static str {
        match self {
            Phase::Intro => "is it you... staring back?",
            Phase::Reveal => "no, it blinks when you don't",
            Phase::Escalation => "it's learning your face",
            Phase::Climax => "it's inside the glass",
            Phase::After => "it remembers you now",
        }
    }

    /// Lowercase tag used by logs and the shader look table
    pub const fn tag(self) -> &'static str {
        match self {
            Phase::Intro => "intro",
            Phase::Reveal => "reveal",
            Phase::Escalation => "escalation",
            Phase::Climax => "climax",
            Phase::After => "after",
        }
    }

    /// Position in `Phase::ALL`
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Phase immediately before this one, if any
    pub fn previous(self) -> Option<Phase> {
        self.index().checked_sub(1).map(|i| Phase::ALL[i])
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Derive the phase for an elapsed time (see [`Phase::from_elapsed`])
pub fn derive_phase(elapsed_secs: f64) -> Phase {
    Phase::from_elapsed(elapsed_secs)
}

/// Snapshot of one run as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    /// Seconds since the run started, clamped to the total duration
    pub elapsed: f64,
    pub phase: Phase,
    pub is_playing: bool,
    pub is_complete: bool,
}

impl PlaybackState {
    /// Timeline progress as a percentage in [0, 100]
    pub fn progress(&self) -> f64 {
        (self.elapsed / TOTAL_DURATION_SECS * 100.0).clamp(0.0, 100.0)
    }

    /// Cue text for the current phase
    pub fn cue(&self) -> &'static str {
        self.phase.cue()
    }

    /// Neither running nor finished: waiting for the first start
    pub fn is_idle(&self) -> bool {
        !self.is_playing && !self.is_complete
    }
}
