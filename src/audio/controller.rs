//! The audio controller: builds the cue sheet on a context and exposes the
//! climax, fade-out and dispose operations the playback driver calls.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::error::AudioError;
use super::graph::{SharedGraph, SynthGraph, VoiceId};
use super::synthesis;
use super::system::AudioContext;
use crate::params::CueSheet;
use crate::playback::{AudioControl, ControllerFactory};

/// Owning handle for one synthesis graph
pub struct AudioController {
    context: AudioContext,
    cues: CueSheet,
    rng: StdRng,
    drone: VoiceId,
    noise_bed: VoiceId,
    creaks: Vec<VoiceId>,
    climax_fired: bool,
    disposed: bool,
}

impl AudioController {
    /// Open the output device and schedule the cue sheet on it
    pub async fn create(cues: CueSheet, seed: Option<u64>) -> Result<Self, AudioError> {
        let context = AudioContext::realtime().await?;
        Ok(Self::with_context(context, cues, seed))
    }

    /// Controller on an offline context rendered by the caller
    pub fn offline(sample_rate: u32, cues: CueSheet, seed: Option<u64>) -> Self {
        Self::with_context(AudioContext::offline(sample_rate), cues, seed)
    }

    /// Schedule the whole score relative to the context's clock right now
    pub fn with_context(context: AudioContext, cues: CueSheet, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Buffers are synthesized before locking; the device callback shares this lock
        let sample_rate = context.sample_rate();
        let noise = synthesis::decaying_noise(&cues.noise_bed, sample_rate, &mut rng);

        let (drone, noise_bed, creaks) = {
            let mut graph = context.lock();
            let now = graph.current_time();

            graph.master_mut().set_value_at_time(cues.master_level, now);

            let drone = graph.connect(synthesis::drone(&cues.drone, now));
            let noise_bed = graph.connect(synthesis::noise_bed(&cues.noise_bed, noise, now));

            let creaks = cues
                .creak
                .offsets_s
                .iter()
                .map(|offset| graph.connect(synthesis::creak(&cues.creak, now + offset)))
                .collect::<Vec<_>>();

            debug!(
                origin = now,
                sample_rate,
                creaks = creaks.len(),
                "Cue sheet scheduled"
            );
            (drone, noise_bed, creaks)
        };

        Self {
            context,
            cues,
            rng,
            drone,
            noise_bed,
            creaks,
            climax_fired: false,
            disposed: false,
        }
    }

    /// Shared handle to the underlying graph
    pub fn graph(&self) -> SharedGraph {
        self.context.graph()
    }

    pub fn climax_fired(&self) -> bool {
        self.climax_fired
    }

    /// Scream samples for the climax, synthesized without touching the graph
    fn scream_buffer(&mut self) -> Vec<f32> {
        synthesis::scream(
            &self.cues.climax.scream,
            self.context.sample_rate(),
            &mut self.rng,
        )
    }

    fn fade_out_locked(&self, graph: &mut SynthGraph) {
        let now = graph.current_time();
        let lifecycle = &self.cues.lifecycle;
        graph
            .master_mut()
            .cancel_and_hold_at_time(now)
            .linear_ramp_to_value_at_time(lifecycle.fade_floor, now + lifecycle.fade_out_s);
    }
}

impl AudioControl for AudioController {
    fn trigger_climax(&mut self) {
        if self.climax_fired {
            return;
        }
        self.climax_fired = true;

        let scream = self.scream_buffer();
        let climax = &self.cues.climax;
        let mut graph = self.context.lock();
        let now = graph.current_time();

        if let Some(drone) = graph.voice_mut(self.drone) {
            drone
                .gain
                .cancel_and_hold_at_time(now)
                .linear_ramp_to_value_at_time(climax.drone_swell_level, now + climax.drone_swell_s);
        }

        graph.connect(synthesis::burst(climax, now));
        graph.connect(synthesis::scream_voice(climax, scream, now));

        info!(at = now, "Climax burst triggered");
    }

    fn fade_out(&mut self) {
        let mut graph = self.context.lock();
        self.fade_out_locked(&mut graph);
        debug!(at = graph.current_time(), "Master fade-out");
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let lifecycle = &self.cues.lifecycle;
        let mut graph = self.context.lock();
        let now = graph.current_time();

        graph.stop(self.drone, now + lifecycle.source_stop_delay_s);
        graph.stop(self.noise_bed, now + lifecycle.source_stop_delay_s);
        for creak in self.creaks.drain(..) {
            graph.disconnect(creak);
        }
        self.fade_out_locked(&mut graph);
        graph.schedule_close(now + lifecycle.close_delay_s);

        debug!(at = now, close_at = now + lifecycle.close_delay_s, "Audio disposed");
    }

    fn is_closed(&self) -> bool {
        self.context.is_closed()
    }
}

/// Builds controllers on the default output device
#[derive(Debug, Clone, Default)]
pub struct DeviceFactory {
    pub cues: CueSheet,
    pub seed: Option<u64>,
}

impl ControllerFactory for DeviceFactory {
    type Controller = AudioController;

    async fn create(&mut self) -> Result<AudioController, AudioError> {
        AudioController::create(self.cues.clone(), self.seed).await
    }
}

/// Builds controllers on offline contexts and remembers the latest graph
/// so the caller can pull samples from it
#[derive(Debug, Clone)]
pub struct OfflineFactory {
    pub sample_rate: u32,
    pub cues: CueSheet,
    pub seed: Option<u64>,
    latest: Option<SharedGraph>,
}

impl OfflineFactory {
    pub fn new(sample_rate: u32, cues: CueSheet, seed: Option<u64>) -> Self {
        Self {
            sample_rate,
            cues,
            seed,
            latest: None,
        }
    }

    /// Graph of the most recently created controller
    pub fn latest_graph(&self) -> Option<SharedGraph> {
        self.latest.clone()
    }
}

impl ControllerFactory for OfflineFactory {
    type Controller = AudioController;

    async fn create(&mut self) -> Result<AudioController, AudioError> {
        let controller = AudioController::offline(self.sample_rate, self.cues.clone(), self.seed);
        self.latest = Some(controller.graph());
        Ok(controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 8_000;

    fn render(graph: &SharedGraph, secs: f64) -> Vec<f32> {
        let mut out = vec![0.0; (secs * RATE as f64).round() as usize];
        graph.lock().unwrap().render(&mut out, 1);
        out
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    fn controller() -> AudioController {
        AudioController::offline(RATE, CueSheet::default(), Some(42))
    }

    #[test]
    fn test_construction_schedules_score() {
        let controller = controller();
        let graph = controller.graph();
        let graph = graph.lock().unwrap();
        // drone + noise bed + three creaks
        assert_eq!(graph.voice_count(), 5);
        assert!((graph.master().value_at(0.0) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_creaks_clean_themselves_up() {
        let controller = controller();
        let graph = controller.graph();
        render(&graph, 23.5);
        // Only the continuous sources remain once all creaks have stopped
        assert_eq!(graph.lock().unwrap().voice_count(), 2);
    }

    #[test]
    fn test_climax_fires_once() {
        let mut controller = controller();
        let graph = controller.graph();
        render(&graph, 1.0);

        controller.trigger_climax();
        let after_first = graph.lock().unwrap().voice_count();
        controller.trigger_climax();
        controller.trigger_climax();
        assert_eq!(graph.lock().unwrap().voice_count(), after_first);
        assert_eq!(after_first, 5 + 2);
        assert!(controller.climax_fired());
    }

    #[test]
    fn test_climax_is_loud() {
        let mut controller = controller();
        let graph = controller.graph();
        let before = render(&graph, 2.0);
        controller.trigger_climax();
        let burst = render(&graph, 0.5);
        assert!(peak(&burst) > peak(&before) * 4.0);
    }

    #[test]
    fn test_climax_swells_drone_from_held_value() {
        let mut controller = controller();
        let graph = controller.graph();
        render(&graph, 6.0);
        controller.trigger_climax();
        let guard = graph.lock().unwrap();
        let drone = guard.voice(controller.drone).map(|v| v.gain.clone());
        let Some(gain) = drone else {
            panic!("drone should still be connected");
        };
        // Held near the ~6s level, then swelling to 0.8 by +0.5s
        let held = gain.value_at(6.0);
        assert!(held > 0.05 && held < 0.22, "held {held}");
        assert!((gain.value_at(6.5) - 0.8).abs() < 1e-4);
    }

    #[test]
    fn test_fade_out_reaches_floor() {
        let mut controller = controller();
        let graph = controller.graph();
        render(&graph, 3.0);
        controller.fade_out();
        render(&graph, 2.0);
        let tail = render(&graph, 0.5);
        assert!(peak(&tail) < 0.001, "peak {}", peak(&tail));
    }

    #[test]
    fn test_dispose_closes_after_delay() {
        let mut controller = controller();
        let graph = controller.graph();
        render(&graph, 1.0);
        controller.dispose();
        // Pending creaks were disconnected straight away
        assert_eq!(graph.lock().unwrap().voice_count(), 2);
        assert!(!controller.is_closed());

        render(&graph, 2.0);
        assert!(!controller.is_closed());
        render(&graph, 0.3);
        assert!(controller.is_closed());
        assert_eq!(graph.lock().unwrap().voice_count(), 0);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut controller = controller();
        let graph = controller.graph();
        controller.dispose();
        controller.dispose();
        controller.fade_out();
        controller.trigger_climax();
        render(&graph, 2.5);
        assert!(controller.is_closed());
    }

    #[test]
    fn test_offline_factory_tracks_latest_graph() {
        let mut factory = OfflineFactory::new(RATE, CueSheet::default(), Some(1));
        assert!(factory.latest_graph().is_none());
        let controller = pollster::block_on(factory.create());
        assert!(controller.is_ok());
        assert!(factory.latest_graph().is_some());
    }

    #[test]
    fn test_scream_buffer_does_not_need_graph_lock() {
        let mut controller = controller();
        let graph = controller.graph();
        let held = graph.lock().unwrap();
        // Would deadlock if synthesis took the graph lock
        let scream = controller.scream_buffer();
        drop(held);
        assert_eq!(scream.len(), (1.3 * RATE as f64).round() as usize);
    }
}
