//! Live microphone capture over cpal.
//!
//! The input callback runs on the audio thread, so it only downmixes and pushes
//! into a small lock-free ring buffer. A collector thread empties the ring into
//! the recording as it grows, so memory follows the length of the recording.

use crate::audio;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FrameCount, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// The size of each audio chunk delivered by the input stream.
pub const INPUT_CHUNK_SIZE: usize = 1024;
/// Longest recording kept; audio past this point is dropped.
pub const MAX_RECORDING_SECS: usize = 300;
/// Audio the ring buffer holds between two collector passes.
const RING_SECS: usize = 2;
const COLLECT_INTERVAL: Duration = Duration::from_millis(100);

/// Opens capture streams on one input device.
#[derive(Debug, Clone, Default)]
pub struct CpalMicrophone {
    device_name: Option<String>,
}

impl CpalMicrophone {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    /// Acquires the input device and starts streaming into a fresh buffer.
    pub fn open(&self) -> Result<LiveCapture> {
        let input = crate::device::get_or_default_input(self.device_name.as_deref())
            .context("Failed to get audio input device")?;
        tracing::info!("Using input device: {:?}", input.name()?);

        let default_config = input
            .default_input_config()
            .context("Failed to get default input config")?;
        let config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: default_config.sample_rate(),
            buffer_size: cpal::BufferSize::Fixed(FrameCount::from(INPUT_CHUNK_SIZE as u32)),
        };
        let channel_count = config.channels as usize;
        let sample_rate = config.sample_rate.0;
        tracing::debug!("Input stream config: {:?}", &config);

        let (mut producer, consumer) = HeapRb::<f32>::new(sample_rate as usize * RING_SECS).split();
        let overflowed = Arc::new(AtomicBool::new(false));
        let overflow_flag = overflowed.clone();

        let input_data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let mono = audio::downmix(data, channel_count);
            let pushed = producer.push_slice(&mono);
            if pushed < mono.len() {
                overflow_flag.store(true, Ordering::Relaxed);
            }
        };

        let stream = input
            .build_input_stream(
                &config,
                input_data_fn,
                move |err| tracing::error!("An error occurred on input stream: {}", err),
                None,
            )
            .context("Failed to open input stream")?;
        let collector = Collector::spawn(
            consumer,
            overflowed,
            sample_rate as usize * MAX_RECORDING_SECS,
        )?;
        stream.play().context("Failed to start input stream")?;

        Ok(LiveCapture {
            stream,
            sample_rate,
            collector,
        })
    }
}

/// A running capture. Dropping it closes the input stream.
pub struct LiveCapture {
    stream: cpal::Stream,
    sample_rate: u32,
    collector: Collector,
}

impl LiveCapture {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stops the stream, releases the device and returns everything recorded.
    pub fn release(self) -> Vec<f32> {
        if let Err(e) = self.stream.pause() {
            tracing::debug!("Failed to pause input stream before release: {}", e);
        }
        let samples = self.collector.finish();
        drop(self.stream);
        tracing::debug!("Input stream released");
        samples
    }
}

// Moves samples from the ring buffer into the recording until stopped. The
// thread is told to stop when the collector is dropped without `finish`.
struct Collector {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<Vec<f32>>>,
}

impl Collector {
    fn spawn(
        consumer: HeapCons<f32>,
        overflowed: Arc<AtomicBool>,
        max_samples: usize,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = std::thread::Builder::new()
            .name("mic-collector".to_string())
            .spawn(move || collect(consumer, &flag, &overflowed, max_samples, COLLECT_INTERVAL))
            .context("Failed to start the capture collector")?;
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    fn finish(mut self) -> Vec<f32> {
        self.running.store(false, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return Vec::new();
        };
        handle.join().unwrap_or_else(|_| {
            tracing::error!("Capture collector panicked, recording lost");
            Vec::new()
        })
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

fn collect(
    mut consumer: HeapCons<f32>,
    running: &AtomicBool,
    overflowed: &AtomicBool,
    max_samples: usize,
    interval: Duration,
) -> Vec<f32> {
    let mut recording = Vec::new();
    let mut truncated = false;
    loop {
        // Read the flag before draining so the final pass sees every sample
        // pushed before the stream was paused.
        let keep_running = running.load(Ordering::Acquire);
        for sample in consumer.pop_iter() {
            if recording.len() < max_samples {
                recording.push(sample);
            } else {
                truncated = true;
            }
        }
        if overflowed.swap(false, Ordering::Relaxed) {
            tracing::warn!("Capture buffer overflowed, some audio was dropped");
        }
        if !keep_running {
            break;
        }
        std::thread::sleep(interval);
    }
    if truncated {
        tracing::warn!(
            "Recording exceeded {} seconds, trailing audio was dropped",
            MAX_RECORDING_SECS
        );
    }
    recording
}
