//! Push-to-talk recording lifecycle.
//!
//! The controller owns at most one live microphone stream. The stream is
//! released on every path that ends a recording: `stop`, and dropping the
//! controller mid-recording.

use crate::error::CaptureError;
use crate::model::AudioBlob;
#[cfg(test)]
use mockall::automock;
use mockmate_native_utils::audio::{self, CAPTURE_SAMPLE_RATE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
}

/// Grants access to an input device.
#[cfg_attr(test, automock)]
pub trait Microphone {
    /// Opens the device and starts capturing. Fails if access is refused.
    fn acquire(&mut self) -> Result<Box<dyn MicrophoneStream>, CaptureError>;
}

/// A live capture. Samples are mono f32 at `sample_rate`.
#[cfg_attr(test, automock)]
pub trait MicrophoneStream {
    fn sample_rate(&self) -> u32;

    /// Stops capturing, releases the device, and hands back everything captured.
    fn release(&mut self) -> Vec<f32>;
}

pub struct AudioCaptureController<M: Microphone> {
    microphone: M,
    active: Option<Box<dyn MicrophoneStream>>,
}

impl<M: Microphone> AudioCaptureController<M> {
    pub fn new(microphone: M) -> Self {
        Self {
            microphone,
            active: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        if self.active.is_some() {
            CaptureState::Recording
        } else {
            CaptureState::Idle
        }
    }

    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.active.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        let stream = self.microphone.acquire().inspect_err(|e| {
            tracing::warn!("Microphone unavailable: {e}");
        })?;
        tracing::debug!("Recording started at {} Hz", stream.sample_rate());
        self.active = Some(stream);
        Ok(())
    }

    /// Ends the recording and returns it as one WAV blob.
    ///
    /// Returns `Ok(None)` when nothing is being recorded, so redundant stop
    /// signals are harmless.
    pub fn stop(&mut self) -> Result<Option<AudioBlob>, CaptureError> {
        let Some(mut stream) = self.active.take() else {
            return Ok(None);
        };
        let sample_rate = stream.sample_rate();
        let samples = stream.release();
        tracing::debug!(
            "Recording stopped: {} samples at {} Hz",
            samples.len(),
            sample_rate
        );

        let samples = audio::resample(&samples, sample_rate, CAPTURE_SAMPLE_RATE)
            .map_err(CaptureError::Encoding)?;
        let bytes = audio::encode_wav(&samples, CAPTURE_SAMPLE_RATE).map_err(CaptureError::Encoding)?;
        Ok(Some(AudioBlob::wav(bytes)))
    }
}

impl<M: Microphone> Drop for AudioCaptureController<M> {
    fn drop(&mut self) {
        if let Some(mut stream) = self.active.take() {
            let discarded = stream.release();
            tracing::debug!("Released microphone on drop, {} samples discarded", discarded.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_releasing_once(samples: Vec<f32>) -> MockMicrophoneStream {
        let mut stream = MockMicrophoneStream::new();
        stream.expect_sample_rate().return_const(CAPTURE_SAMPLE_RATE);
        stream.expect_release().times(1).return_once(move || samples);
        stream
    }

    fn microphone_with(stream: MockMicrophoneStream) -> MockMicrophone {
        let mut mic = MockMicrophone::new();
        mic.expect_acquire()
            .times(1)
            .return_once(move || Ok(Box::new(stream) as Box<dyn MicrophoneStream>));
        mic
    }

    #[test]
    fn test_start_stop_produces_one_wav_blob() {
        let mic = microphone_with(stream_releasing_once(vec![0.1; 1600]));
        let mut capture = AudioCaptureController::new(mic);

        capture.start().unwrap();
        assert_eq!(capture.state(), CaptureState::Recording);

        let blob = capture.stop().unwrap().expect("a blob");
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(blob.mime_type, "audio/wav");
        let decoded = audio::decode_wav(&blob.bytes).unwrap();
        assert_eq!(decoded.samples.len(), 1600);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mic = microphone_with(stream_releasing_once(vec![0.0; 10]));
        let mut capture = AudioCaptureController::new(mic);

        capture.start().unwrap();
        assert!(capture.stop().unwrap().is_some());
        // A second stop (pointer-up followed by pointer-leave) yields nothing.
        assert!(capture.stop().unwrap().is_none());
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn test_stop_while_idle_is_a_no_op() {
        let mut capture = AudioCaptureController::new(MockMicrophone::new());
        assert!(capture.stop().unwrap().is_none());
    }

    #[test]
    fn test_denied_microphone_leaves_controller_idle() {
        let mut mic = MockMicrophone::new();
        mic.expect_acquire()
            .times(1)
            .returning(|| Err(CaptureError::MicrophoneDenied("permission refused".into())));
        let mut capture = AudioCaptureController::new(mic);

        let err = capture.start().unwrap_err();
        assert!(matches!(err, CaptureError::MicrophoneDenied(_)));
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn test_second_start_is_rejected_without_reacquiring() {
        // `times(1)` on acquire fails the test if the device is opened twice.
        let mic = microphone_with(stream_releasing_once(vec![]));
        let mut capture = AudioCaptureController::new(mic);

        capture.start().unwrap();
        assert!(matches!(capture.start(), Err(CaptureError::AlreadyRecording)));
        assert_eq!(capture.state(), CaptureState::Recording);
        capture.stop().unwrap();
    }

    #[test]
    fn test_drop_while_recording_releases_stream() {
        // The stream mock asserts `release` ran exactly once when it is dropped.
        let mic = microphone_with(stream_releasing_once(vec![0.2; 5]));
        let mut capture = AudioCaptureController::new(mic);
        capture.start().unwrap();
        drop(capture);
    }
}
