//! Connects the session's capture and playback seams to the host audio devices.
//!
//! Without the `native-audio` feature there is no device access: recording is
//! refused and replies are not spoken.

use crate::config::Config;
use mockmate_core::{AudioPlaybackController, CaptureError, Microphone, MicrophoneStream};

#[cfg(feature = "native-audio")]
mod native {
    use super::*;
    use mockmate_core::{AudioSink, SynthesizedClip};
    use mockmate_native_utils::microphone::{CpalMicrophone, LiveCapture};
    use mockmate_native_utils::speaker::RodioSpeaker;

    pub struct DeviceMicrophone {
        inner: CpalMicrophone,
    }

    impl Microphone for DeviceMicrophone {
        fn acquire(&mut self) -> Result<Box<dyn MicrophoneStream>, CaptureError> {
            let capture = self
                .inner
                .open()
                .map_err(|e| CaptureError::MicrophoneDenied(format!("{e:#}")))?;
            Ok(Box::new(DeviceStream {
                sample_rate: capture.sample_rate(),
                capture: Some(capture),
            }))
        }
    }

    struct DeviceStream {
        sample_rate: u32,
        capture: Option<LiveCapture>,
    }

    impl MicrophoneStream for DeviceStream {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn release(&mut self) -> Vec<f32> {
            self.capture.take().map(LiveCapture::release).unwrap_or_default()
        }
    }

    struct DeviceSpeaker(RodioSpeaker);

    impl AudioSink for DeviceSpeaker {
        fn start(&mut self, clip: &SynthesizedClip) -> anyhow::Result<()> {
            self.0.play_bytes(clip.as_bytes())
        }

        fn stop(&mut self) {
            self.0.stop();
        }
    }

    pub fn microphone(config: &Config) -> DeviceMicrophone {
        DeviceMicrophone {
            inner: CpalMicrophone::new(config.input_device.clone()),
        }
    }

    pub fn playback(config: &Config) -> AudioPlaybackController {
        match RodioSpeaker::open(config.output_device.as_deref()) {
            Ok(speaker) => AudioPlaybackController::new(Box::new(DeviceSpeaker(speaker))),
            Err(e) => {
                tracing::warn!("No audio output, replies will not be spoken: {e:#}");
                AudioPlaybackController::muted()
            }
        }
    }

    pub fn describe_devices() -> anyhow::Result<String> {
        use anyhow::Context;
        let inputs = mockmate_native_utils::device::get_available_inputs()
            .context("Failed to list input devices")?;
        let outputs = mockmate_native_utils::device::get_available_outputs()
            .context("Failed to list output devices")?;
        Ok(format!("Input devices:\n{inputs}\nOutput devices:\n{outputs}"))
    }
}

#[cfg(not(feature = "native-audio"))]
mod unavailable {
    use super::*;

    const REASON: &str = "built without the native-audio feature";

    pub struct NoMicrophone;

    impl Microphone for NoMicrophone {
        fn acquire(&mut self) -> Result<Box<dyn MicrophoneStream>, CaptureError> {
            Err(CaptureError::MicrophoneDenied(REASON.to_string()))
        }
    }

    pub fn microphone(_: &Config) -> NoMicrophone {
        NoMicrophone
    }

    pub fn playback(_: &Config) -> AudioPlaybackController {
        tracing::debug!("Speech playback disabled: {REASON}");
        AudioPlaybackController::muted()
    }

    pub fn describe_devices() -> anyhow::Result<String> {
        anyhow::bail!("Device listing is unavailable: {REASON}")
    }
}

#[cfg(feature = "native-audio")]
pub use native::{DeviceMicrophone as HostMicrophone, describe_devices, microphone, playback};
#[cfg(not(feature = "native-audio"))]
pub use unavailable::{NoMicrophone as HostMicrophone, describe_devices, microphone, playback};
