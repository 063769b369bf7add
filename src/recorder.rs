use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

const SAMPLE_RATE: u32 = 16_000; // 16kHz mono is plenty for voice

/// Microphone capture for the audio-replace tool. The capture device is
/// held only between `start` and `stop`; dropping the recorder (or any
/// error path) releases it.
pub struct VoiceRecorder {
    stream: Option<cpal::Stream>,
    samples: Arc<Mutex<Vec<f32>>>,
    started_at: Option<Instant>,
}

impl VoiceRecorder {
    pub fn new() -> Self {
        Self {
            stream: None,
            samples: Arc::new(Mutex::new(Vec::new())),
            started_at: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.is_recording() {
            anyhow::bail!("Already recording. Use /record stop to finish.");
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("Microphone unavailable: no input device found"))?;

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        self.samples.lock().unwrap().clear();
        let samples = self.samples.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut lock) = samples.lock() {
                        lock.extend_from_slice(data);
                    }
                },
                |err| eprintln!("Recording stream error: {}", err),
                None,
            )
            .map_err(|e| anyhow::anyhow!("Microphone unavailable: {}", e))?;

        stream
            .play()
            .map_err(|e| anyhow::anyhow!("Failed to start recording: {}", e))?;

        self.stream = Some(stream);
        self.started_at = Some(Instant::now());
        Ok(())
    }

    /// Stop recording, release the device, and write the captured samples
    /// to a WAV file. Returns the recorded duration.
    pub fn stop(&mut self, output_path: &Path) -> Result<Duration> {
        let Some(stream) = self.stream.take() else {
            anyhow::bail!("Not currently recording. Use /record start first.");
        };
        drop(stream); // releases the capture device before the disk write

        let elapsed = self
            .started_at
            .take()
            .map(|t| t.elapsed())
            .unwrap_or_default();

        let samples = self.samples.lock().unwrap().clone();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(output_path, spec)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        for sample in samples {
            let amplitude = (sample * i16::MAX as f32) as i16;
            writer.write_sample(amplitude)?;
        }
        writer.finalize().context("Failed to finalize WAV file")?;

        Ok(elapsed)
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }
}

impl Drop for VoiceRecorder {
    fn drop(&mut self) {
        // Device must not stay held past teardown.
        self.stream.take();
    }
}

impl Default for VoiceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_without_start_errors() {
        let mut recorder = VoiceRecorder::new();
        let result = recorder.stop(Path::new("/tmp/never-written.wav"));
        assert!(result.is_err());
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_fresh_recorder_is_idle() {
        let recorder = VoiceRecorder::new();
        assert!(!recorder.is_recording());
        assert!(recorder.elapsed().is_none());
    }
}
