//! Minimal synthesis graph: voices summed through a master gain.
//!
//! Every voice is one source (oscillator or sample buffer) feeding its own
//! gain stage, and every gain stage feeds the master. That is the only
//! topology the cue sheet needs, so the graph does not model arbitrary
//! connections.

use std::f64::consts::TAU;
use std::sync::{Arc, Mutex};

use super::automation::AudioParam;

/// Graph shared between the controller and the audio callback
pub type SharedGraph = Arc<Mutex<SynthGraph>>;

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Sample the waveform at a phase in [0, 1)
    pub fn sample(self, phase: f64) -> f32 {
        let value = match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
            Waveform::Sawtooth => 2.0 * (phase + 0.5).fract() - 1.0,
        };
        value as f32
    }
}

/// Periodic oscillator with an automatable frequency
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    /// Frequency (Hz)
    pub frequency: AudioParam,
    phase: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: AudioParam) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
        }
    }

    fn next(&mut self, time: f64, sample_rate: f64) -> f32 {
        let out = self.waveform.sample(self.phase);
        let hz = self.frequency.value_at(time) as f64;
        self.phase = (self.phase + hz / sample_rate).rem_euclid(1.0);
        out
    }
}

/// Plays a mono sample buffer, optionally looping
#[derive(Debug, Clone)]
pub struct BufferPlayer {
    buffer: Arc<[f32]>,
    looping: bool,
    position: usize,
}

impl BufferPlayer {
    pub fn new(buffer: impl Into<Arc<[f32]>>, looping: bool) -> Self {
        Self {
            buffer: buffer.into(),
            looping,
            position: 0,
        }
    }

    /// Next sample, or `None` once a one-shot buffer has played out
    fn next(&mut self) -> Option<f32> {
        if self.position >= self.buffer.len() {
            if !self.looping || self.buffer.is_empty() {
                return None;
            }
            self.position = 0;
        }
        let sample = self.buffer[self.position];
        self.position += 1;
        Some(sample)
    }
}

/// Sound source of a voice
#[derive(Debug, Clone)]
pub enum Source {
    Oscillator(Oscillator),
    Buffer(BufferPlayer),
}

/// A source, its gain stage, and its start/stop window on the audio clock
#[derive(Debug, Clone)]
pub struct Voice {
    source: Source,
    pub gain: AudioParam,
    start_at: f64,
    stop_at: Option<f64>,
    exhausted: bool,
}

impl Voice {
    pub fn new(source: Source, gain: AudioParam) -> Self {
        Self {
            source,
            gain,
            start_at: 0.0,
            stop_at: None,
            exhausted: false,
        }
    }

    /// Builder: begin sounding at `time`
    pub fn starting_at(mut self, time: f64) -> Self {
        self.start_at = time;
        self
    }

    /// Builder: fall silent at `time`
    pub fn stopping_at(mut self, time: f64) -> Self {
        self.stop_at = Some(time);
        self
    }

    /// Frequency parameter, for oscillator voices
    pub fn frequency_mut(&mut self) -> Option<&mut AudioParam> {
        match &mut self.source {
            Source::Oscillator(osc) => Some(&mut osc.frequency),
            Source::Buffer(_) => None,
        }
    }

    pub fn start_at(&self) -> f64 {
        self.start_at
    }

    pub fn stop_at(&self) -> Option<f64> {
        self.stop_at
    }

    /// Whether the voice can make no further sound at `time`
    pub fn is_finished(&self, time: f64) -> bool {
        self.exhausted || self.stop_at.is_some_and(|stop| time >= stop)
    }

    fn render(&mut self, time: f64, sample_rate: f64) -> f32 {
        if time < self.start_at || self.is_finished(time) {
            return 0.0;
        }
        let raw = match &mut self.source {
            Source::Oscillator(osc) => osc.next(time, sample_rate),
            Source::Buffer(player) => match player.next() {
                Some(sample) => sample,
                None => {
                    self.exhausted = true;
                    return 0.0;
                }
            },
        };
        raw * self.gain.value_at(time)
    }
}

/// Handle to a voice connected to a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(u64);

/// The synthesis graph and its sample clock
#[derive(Debug)]
pub struct SynthGraph {
    sample_rate: u32,
    frames_rendered: u64,
    master: AudioParam,
    voices: Vec<(VoiceId, Voice)>,
    next_id: u64,
    close_at: Option<f64>,
    closed: bool,
}

impl SynthGraph {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frames_rendered: 0,
            master: AudioParam::new(1.0),
            voices: Vec::new(),
            next_id: 0,
            close_at: None,
            closed: false,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Audio clock (seconds of audio rendered so far)
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    pub fn master(&self) -> &AudioParam {
        &self.master
    }

    pub fn master_mut(&mut self) -> &mut AudioParam {
        &mut self.master
    }

    /// Connect a voice to the master stage
    pub fn connect(&mut self, voice: Voice) -> VoiceId {
        let id = VoiceId(self.next_id);
        self.next_id += 1;
        if !self.closed {
            self.voices.push((id, voice));
        }
        id
    }

    /// Disconnect a voice. Unknown or already-pruned ids are ignored.
    pub fn disconnect(&mut self, id: VoiceId) -> bool {
        let before = self.voices.len();
        self.voices.retain(|(voice_id, _)| *voice_id != id);
        self.voices.len() != before
    }

    /// Schedule a voice to stop. Ignored if the voice is already gone.
    pub fn stop(&mut self, id: VoiceId, time: f64) {
        if let Some(voice) = self.voice_mut(id) {
            voice.stop_at = Some(time);
        }
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|(v, _)| *v == id).map(|(_, voice)| voice)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices
            .iter_mut()
            .find(|(v, _)| *v == id)
            .map(|(_, voice)| voice)
    }

    pub fn contains(&self, id: VoiceId) -> bool {
        self.voice(id).is_some()
    }

    /// Number of connected voices
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Close the graph once the clock reaches `time`
    pub fn schedule_close(&mut self, time: f64) {
        self.close_at = Some(self.close_at.map_or(time, |at| at.min(time)));
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Render one mono frame and advance the clock
    pub fn next_sample(&mut self) -> f32 {
        let time = self.current_time();
        self.frames_rendered += 1;

        if !self.closed && self.close_at.is_some_and(|at| time >= at) {
            self.closed = true;
            self.voices.clear();
        }
        if self.closed {
            return 0.0;
        }

        let sample_rate = self.sample_rate as f64;
        let mix: f32 = self
            .voices
            .iter_mut()
            .map(|(_, voice)| voice.render(time, sample_rate))
            .sum();

        // Safety limiter: hard clip so a stacked climax can never exceed full scale
        (mix * self.master.value_at(time)).clamp(-1.0, 1.0)
    }

    /// Fill an interleaved buffer, copying each mono frame to every channel
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let sample = self.next_sample();
            frame.fill(sample);
        }
        self.prune();
    }

    /// Drop voices that can no longer sound
    pub fn prune(&mut self) {
        let time = self.current_time();
        self.voices.retain(|(_, voice)| !voice.is_finished(time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f32) -> AudioParam {
        AudioParam::new(value)
    }

    #[test]
    fn test_waveform_shapes() {
        assert!(Waveform::Sine.sample(0.0).abs() < 1e-6);
        assert!((Waveform::Sine.sample(0.25) - 1.0).abs() < 1e-6);
        assert!((Waveform::Triangle.sample(0.25) - 1.0).abs() < 1e-6);
        assert!((Waveform::Triangle.sample(0.75) + 1.0).abs() < 1e-6);
        assert!(Waveform::Sawtooth.sample(0.0).abs() < 1e-6);
        assert!(Waveform::Sawtooth.sample(0.49) > 0.9);
        assert!(Waveform::Sawtooth.sample(0.51) < -0.9);
    }

    #[test]
    fn test_clock_advances_per_frame() {
        let mut graph = SynthGraph::new(100);
        let mut out = vec![0.0; 50 * 2];
        graph.render(&mut out, 2);
        assert!((graph.current_time() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_voice_respects_start_and_stop() {
        let mut graph = SynthGraph::new(100);
        let voice = Voice::new(
            Source::Buffer(BufferPlayer::new(vec![1.0; 10], true)),
            constant(0.5),
        )
        .starting_at(0.1)
        .stopping_at(0.2);
        graph.connect(voice);

        let samples: Vec<f32> = (0..30).map(|_| graph.next_sample()).collect();
        assert!(samples[..10].iter().all(|s| *s == 0.0));
        assert!(samples[10..20].iter().all(|s| *s == 0.5));
        assert!(samples[20..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_finished_voices_are_pruned() {
        let mut graph = SynthGraph::new(100);
        let id = graph.connect(
            Voice::new(
                Source::Oscillator(Oscillator::new(Waveform::Sine, constant(10.0))),
                constant(1.0),
            )
            .stopping_at(0.1),
        );
        let mut out = vec![0.0; 5];
        graph.render(&mut out, 1);
        assert!(graph.contains(id));
        let mut out = vec![0.0; 10];
        graph.render(&mut out, 1);
        assert!(!graph.contains(id));
    }

    #[test]
    fn test_one_shot_buffer_exhausts() {
        let mut graph = SynthGraph::new(100);
        graph.connect(Voice::new(
            Source::Buffer(BufferPlayer::new(vec![0.25; 4], false)),
            constant(1.0),
        ));
        let mut out = vec![0.0; 8];
        graph.render(&mut out, 1);
        assert_eq!(&out[..4], &[0.25; 4]);
        assert_eq!(&out[4..], &[0.0; 4]);
        assert_eq!(graph.voice_count(), 0);
    }

    #[test]
    fn test_disconnect_and_stop_are_idempotent() {
        let mut graph = SynthGraph::new(100);
        let id = graph.connect(Voice::new(
            Source::Buffer(BufferPlayer::new(vec![1.0], true)),
            constant(1.0),
        ));
        assert!(graph.disconnect(id));
        assert!(!graph.disconnect(id));
        graph.stop(id, 1.0);
        assert_eq!(graph.voice_count(), 0);
    }

    #[test]
    fn test_master_gain_and_limiter() {
        let mut graph = SynthGraph::new(100);
        graph.master_mut().set_value_at_time(0.5, 0.0);
        for _ in 0..3 {
            graph.connect(Voice::new(
                Source::Buffer(BufferPlayer::new(vec![1.0], true)),
                constant(1.0),
            ));
        }
        // 3.0 * 0.5 clips to full scale
        assert_eq!(graph.next_sample(), 1.0);
    }

    #[test]
    fn test_close_silences_and_drops_voices() {
        let mut graph = SynthGraph::new(100);
        graph.connect(Voice::new(
            Source::Buffer(BufferPlayer::new(vec![1.0], true)),
            constant(1.0),
        ));
        graph.schedule_close(0.05);
        let mut out = vec![0.0; 10];
        graph.render(&mut out, 1);
        assert!(out[..5].iter().all(|s| *s == 1.0));
        assert!(out[5..].iter().all(|s| *s == 0.0));
        assert!(graph.is_closed());
        assert_eq!(graph.voice_count(), 0);
    }

    #[test]
    fn test_multichannel_copies_mono() {
        let mut graph = SynthGraph::new(100);
        graph.connect(Voice::new(
            Source::Buffer(BufferPlayer::new(vec![0.3, -0.3], true)),
            constant(1.0),
        ));
        let mut out = vec![0.0; 4];
        graph.render(&mut out, 2);
        assert_eq!(out, vec![0.3, 0.3, -0.3, -0.3]);
    }
}
