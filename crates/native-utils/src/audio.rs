use base64::Engine;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use std::io::Cursor;

/// Sample rate of recordings uploaded for transcription. Whisper works natively at 16 kHz.
pub const CAPTURE_SAMPLE_RATE: u32 = 16000;

/// Frames fed to the resampler per call.
const RESAMPLE_CHUNK_SIZE: usize = 1024;

/// Creates a resampler to convert between audio sample rates.
pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1,
    )?;
    Ok(resampler)
}

/// Splits a slice of audio samples into a vector of vectors, where each inner vector has a fixed chunk size.
/// If a chunk is smaller than the `chunk_size`, it is padded with zeros.
pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples
        .chunks(chunk_size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            chunk.resize(chunk_size, 0.0);
            chunk
        })
        .collect()
}

/// Resamples a whole mono recording in one pass.
///
/// The tail of the recording is zero padded up to the resampler's chunk size, so
/// the output may carry a few milliseconds of trailing silence.
pub fn resample(samples: &[f32], in_rate: u32, out_rate: u32) -> anyhow::Result<Vec<f32>> {
    if in_rate == out_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    let mut resampler = create_resampler(in_rate as f64, out_rate as f64, RESAMPLE_CHUNK_SIZE)?;
    let mut out = Vec::with_capacity(samples.len() * out_rate as usize / in_rate as usize + 1);
    for chunk in split_for_chunks(samples, RESAMPLE_CHUNK_SIZE) {
        let frames = resampler.process(&[chunk.as_slice()], None)?;
        if let Some(mono) = frames.first() {
            out.extend_from_slice(mono);
        }
    }
    Ok(out)
}

/// Averages interleaved frames down to a single channel.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels > 1 {
        data.chunks(channels)
            .map(|c| c.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        data.to_vec()
    }
}

/// Converts a slice of f32 samples to a vector of i16 samples.
pub fn convert_f32_to_i16(pcm32: &[f32]) -> Vec<i16> {
    pcm32
        .iter()
        .map(|&sample| (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Converts a slice of i16 samples to a vector of f32 samples.
pub fn convert_i16_to_f32(pcm16: &[i16]) -> Vec<f32> {
    pcm16
        .iter()
        .map(|&sample| sample as f32 / 32768.0)
        .collect()
}

/// Encodes mono f32 samples as a 16-bit PCM WAV file held in memory.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> anyhow::Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in convert_f32_to_i16(samples) {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// A decoded WAV file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedWav {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Decodes a 16-bit PCM WAV file into interleaved f32 samples.
pub fn decode_wav(bytes: &[u8]) -> anyhow::Result<DecodedWav> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(anyhow::anyhow!(
            "Unsupported WAV format: {:?} at {} bits",
            spec.sample_format,
            spec.bits_per_sample
        ));
    }
    let pcm16 = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()?;
    Ok(DecodedWav {
        samples: convert_i16_to_f32(&pcm16),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Decodes a base64 string into raw bytes.
pub fn decode_base64(fragment: &str) -> anyhow::Result<Vec<u8>> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(fragment.trim())?;
    Ok(bytes)
}

/// Encodes raw bytes as a base64 string.
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
