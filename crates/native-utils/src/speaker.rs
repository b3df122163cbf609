use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;

/// Plays encoded clips (MP3 or WAV) on one output device, one clip at a time.
pub struct RodioSpeaker {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioSpeaker {
    /// Opens the named output device, or the host default.
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        let (stream, handle) = match device_name {
            Some(_) => {
                let device = crate::device::get_or_default_output(device_name)?;
                OutputStream::try_from_device(&device)
                    .context("Failed to open output stream on the selected device")?
            }
            None => OutputStream::try_default().context("Failed to open default output stream")?,
        };
        tracing::info!("Speaker ready for playback");
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }

    /// Stops whatever is playing and starts `bytes` from the beginning.
    pub fn play_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.stop();
        if bytes.is_empty() {
            return Ok(());
        }
        let source = Decoder::new(Cursor::new(bytes.to_vec())).context("Failed to decode clip")?;
        let sink = Sink::try_new(&self.handle).context("Failed to create playback sink")?;
        sink.append(source);
        self.sink = Some(sink);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}
