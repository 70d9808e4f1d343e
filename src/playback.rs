//! Playback driver: the idle → running → completed state machine.
//!
//! The driver owns everything a run needs: the playback snapshot, the
//! current audio controller, the climax fired-once flag and the run start
//! timestamp. Hosts call [`PlaybackDriver::start`] on user input,
//! [`PlaybackDriver::frame`] once per display frame while
//! [`PlaybackDriver::wants_frames`] is true, and
//! [`PlaybackDriver::teardown`] on exit.

use std::future::Future;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::audio::AudioError;
use crate::timeline::{
    derive_phase, Phase, PlaybackState, REPLAY_LABEL, START_LABEL, TOTAL_DURATION_SECS,
};

/// Operations the driver performs on a live synthesis graph
pub trait AudioControl {
    /// Fire the jump-scare; later calls on the same controller do nothing
    fn trigger_climax(&mut self);

    /// Ramp the master output to silence
    fn fade_out(&mut self);

    /// Stop every source and schedule the context to close
    fn dispose(&mut self);

    /// Whether a disposed controller has finished closing
    fn is_closed(&self) -> bool;
}

/// Builds a fresh audio controller for each run
pub trait ControllerFactory {
    type Controller: AudioControl;

    fn create(&mut self) -> impl Future<Output = Result<Self::Controller, AudioError>>;
}

/// Drives one run at a time
pub struct PlaybackDriver<F: ControllerFactory> {
    factory: F,
    state: PlaybackState,
    audio: Option<F::Controller>,
    /// Disposed controllers still fading out
    retiring: Vec<F::Controller>,
    run_start: Option<Instant>,
    climax_fired: bool,
}

impl<F: ControllerFactory> PlaybackDriver<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            state: PlaybackState::default(),
            audio: None,
            retiring: Vec::new(),
            run_start: None,
            climax_fired: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Live controller, if construction succeeded
    pub fn audio(&self) -> Option<&F::Controller> {
        self.audio.as_ref()
    }

    /// Whether the host should keep scheduling frames
    pub fn wants_frames(&self) -> bool {
        self.state.is_playing
    }

    /// Label of the start/replay control, `None` while it is hidden
    pub fn button_label(&self) -> Option<&'static str> {
        if self.state.is_playing {
            None
        } else if self.state.is_complete {
            Some(REPLAY_LABEL)
        } else {
            Some(START_LABEL)
        }
    }

    /// Begin a run. Does nothing while a run is in progress.
    ///
    /// Audio failure is logged and the run continues without sound.
    pub async fn start(&mut self) {
        if self.state.is_playing {
            return;
        }

        self.climax_fired = false;
        self.state = PlaybackState::default();
        self.retire_current();

        self.audio = match self.factory.create().await {
            Ok(controller) => Some(controller),
            Err(err) => {
                error!(error = %err, "Audio failed to initialise");
                None
            }
        };

        self.run_start = None;
        self.state.is_playing = true;
        info!(audio = self.audio.is_some(), "Playback started");
    }

    /// Sample the clock for one frame. Returns whether another frame is wanted.
    ///
    /// The first frame after `start` anchors the run at `now`.
    pub fn frame(&mut self, now: Instant) -> bool {
        self.reap_retired();
        if !self.state.is_playing {
            return false;
        }

        let run_start = *self.run_start.get_or_insert(now);
        let elapsed = now
            .saturating_duration_since(run_start)
            .as_secs_f64()
            .min(TOTAL_DURATION_SECS);

        let phase = derive_phase(elapsed);
        if phase != self.state.phase {
            info!(phase = %phase, elapsed, cue = phase.cue(), "Phase change");
        }
        self.state.elapsed = elapsed;
        self.state.phase = phase;

        if !self.climax_fired && elapsed >= Phase::Climax.starts_at() {
            if let Some(audio) = self.audio.as_mut() {
                audio.trigger_climax();
            }
            self.climax_fired = true;
        }

        if elapsed >= TOTAL_DURATION_SECS {
            self.state.is_complete = true;
            self.state.is_playing = false;
            if let Some(audio) = self.audio.as_mut() {
                audio.fade_out();
            }
            info!("Playback complete");
            return false;
        }

        true
    }

    /// Stop sampling and release every audio resource
    pub fn teardown(&mut self) {
        self.state.is_playing = false;
        self.run_start = None;
        self.retire_current();
        self.retiring.clear();
        debug!("Playback torn down");
    }

    /// Number of disposed controllers not yet closed
    pub fn retiring_count(&self) -> usize {
        self.retiring.len()
    }

    fn retire_current(&mut self) {
        if let Some(mut previous) = self.audio.take() {
            previous.dispose();
            self.retiring.push(previous);
        }
    }

    fn reap_retired(&mut self) {
        self.retiring.retain(|controller| !controller.is_closed());
    }
}

impl<F: ControllerFactory> Drop for PlaybackDriver<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}
