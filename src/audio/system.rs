//! Audio context: the synthesis graph plus the device stream that pulls it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use super::error::AudioError;
use super::graph::{SharedGraph, SynthGraph};

/// Look up the default output device, if this host has one
pub fn detect_output_device() -> Option<cpal::Device> {
    cpal::default_host().default_output_device()
}

/// Owns a synthesis graph and, when real-time, the stream rendering it
pub struct AudioContext {
    graph: SharedGraph,
    sample_rate: u32,

    /// Device stream (kept alive); `None` for offline contexts
    stream: Option<cpal::Stream>,
}

impl AudioContext {
    /// Open the default output device and start rendering.
    ///
    /// Fails with [`AudioError::Unsupported`] when the host has no output.
    pub async fn realtime() -> Result<Self, AudioError> {
        let device = detect_output_device().ok_or(AudioError::Unsupported)?;
        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate().0;

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels = config.channels(),
            "Audio output"
        );

        let graph = Arc::new(Mutex::new(SynthGraph::new(sample_rate)));
        let stream = build_stream(&device, &config, Arc::clone(&graph))?;

        let context = Self {
            graph,
            sample_rate,
            stream: Some(stream),
        };
        context.resume().await?;
        Ok(context)
    }

    /// Context whose graph is rendered by the caller
    pub fn offline(sample_rate: u32) -> Self {
        Self {
            graph: Arc::new(Mutex::new(SynthGraph::new(sample_rate))),
            sample_rate,
            stream: None,
        }
    }

    /// Start the device stream
    async fn resume(&self) -> Result<(), AudioError> {
        if let Some(stream) = &self.stream {
            stream.play()?;
            debug!("Audio stream started");
        }
        Ok(())
    }

    /// Shared handle to the graph
    pub fn graph(&self) -> SharedGraph {
        Arc::clone(&self.graph)
    }

    /// Lock the graph, recovering from a poisoned lock
    pub fn lock(&self) -> MutexGuard<'_, SynthGraph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sample rate of the graph, readable without taking the lock
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Audio clock (seconds)
    pub fn current_time(&self) -> f64 {
        self.lock().current_time()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_closed()
    }
}

/// Build an output stream that renders `graph` in the device's native format
fn build_stream(
    device: &cpal::Device,
    config: &cpal::SupportedStreamConfig,
    graph: SharedGraph,
) -> Result<cpal::Stream, AudioError> {
    let channels = config.channels() as usize;
    let stream_config: cpal::StreamConfig = config.clone().into();

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| match graph.lock() {
                Ok(mut graph) => graph.render(data, channels),
                Err(_) => data.fill(0.0),
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )?,
        cpal::SampleFormat::I16 => {
            // Pre-allocate buffer for the f32 render
            let mut temp_buffer: Vec<f32> = vec![0.0; 4096];
            device.build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    if temp_buffer.len() < data.len() {
                        temp_buffer.resize(data.len(), 0.0);
                    }
                    let rendered = &mut temp_buffer[..data.len()];
                    match graph.lock() {
                        Ok(mut graph) => graph.render(rendered, channels),
                        Err(_) => rendered.fill(0.0),
                    }
                    for (out, &f) in data.iter_mut().zip(rendered.iter()) {
                        *out = (f * 32767.0).clamp(-32768.0, 32767.0) as i16;
                    }
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )?
        }
        other => return Err(AudioError::SampleFormat(other)),
    };

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_context_starts_at_zero() {
        let context = AudioContext::offline(48_000);
        assert_eq!(context.sample_rate(), 48_000);
        assert_eq!(context.lock().sample_rate(), 48_000);
        assert_eq!(context.current_time(), 0.0);
        assert!(!context.is_closed());
    }

    #[test]
    fn test_graph_handle_shares_clock() {
        let context = AudioContext::offline(100);
        let graph = context.graph();
        let mut out = vec![0.0; 25];
        graph.lock().unwrap().render(&mut out, 1);
        assert!((context.current_time() - 0.25).abs() < 1e-9);
    }
}
