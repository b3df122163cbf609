use crate::model::SynthesizedClip;
#[cfg(test)]
use mockall::automock;

/// An output that can play one encoded clip at a time.
#[cfg_attr(test, automock)]
pub trait AudioSink {
    /// Starts `clip` from the beginning.
    fn start(&mut self, clip: &SynthesizedClip) -> anyhow::Result<()>;

    /// Silences whatever is playing.
    fn stop(&mut self);
}

/// Plays the interviewer's speech. A new clip always preempts the current one.
///
/// Audio is best effort: playback failures are logged and never reach the caller.
pub struct AudioPlaybackController {
    sink: Option<Box<dyn AudioSink>>,
    current: Option<SynthesizedClip>,
}

impl AudioPlaybackController {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink: Some(sink),
            current: None,
        }
    }

    /// A controller with no output; every clip is ignored.
    pub fn muted() -> Self {
        Self {
            sink: None,
            current: None,
        }
    }

    pub fn play(&mut self, clip: SynthesizedClip) {
        let Some(sink) = self.sink.as_mut() else {
            tracing::debug!("Muted, skipping clip of {} bytes", clip.as_bytes().len());
            return;
        };
        if self.current.take().is_some() {
            sink.stop();
        }
        match sink.start(&clip) {
            Ok(()) => self.current = Some(clip),
            Err(e) => tracing::warn!("Playback failed: {e:#}"),
        }
    }

    pub fn stop(&mut self) {
        if self.current.take().is_some() {
            if let Some(sink) = self.sink.as_mut() {
                sink.stop();
            }
        }
    }

    /// The clip most recently started, if it has not been stopped.
    pub fn current(&self) -> Option<&SynthesizedClip> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;

    fn clip(tag: u8) -> SynthesizedClip {
        SynthesizedClip(vec![tag; 4])
    }

    #[test]
    fn test_new_clip_preempts_current_one() {
        let mut seq = Sequence::new();
        let mut sink = MockAudioSink::new();
        sink.expect_start()
            .withf(|c| c.as_bytes()[0] == 1)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sink.expect_stop().times(1).in_sequence(&mut seq).return_const(());
        sink.expect_start()
            .withf(|c| c.as_bytes()[0] == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut playback = AudioPlaybackController::new(Box::new(sink));
        playback.play(clip(1));
        playback.play(clip(2));
        assert_eq!(playback.current(), Some(&clip(2)));
    }

    #[test]
    fn test_playback_failure_is_swallowed() {
        let mut sink = MockAudioSink::new();
        sink.expect_start()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("autoplay blocked")));

        let mut playback = AudioPlaybackController::new(Box::new(sink));
        playback.play(clip(1));
        assert_eq!(playback.current(), None);
    }

    #[test]
    fn test_stop_only_touches_sink_when_playing() {
        let mut sink = MockAudioSink::new();
        sink.expect_start().times(1).returning(|_| Ok(()));
        sink.expect_stop().times(1).return_const(());

        let mut playback = AudioPlaybackController::new(Box::new(sink));
        playback.stop();
        playback.play(clip(3));
        playback.stop();
        playback.stop();
        assert_eq!(playback.current(), None);
    }

    #[test]
    fn test_muted_controller_ignores_clips() {
        let mut playback = AudioPlaybackController::muted();
        playback.play(clip(1));
        assert_eq!(playback.current(), None);
    }
}
