//! Re-encoding of processed buffers to WAV files.

use std::path::Path;

use crate::audio_engine::errors::SampleWriteError;
use crate::messages::AudioBuffer;

/// Sample format of a written WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavFormat {
    /// 16-bit signed integer, clamped to [-1, 1].
    #[default]
    Pcm16,

    /// 32-bit IEEE float, written as-is.
    Float32,
}

impl WavFormat {
    fn spec(self, sample_rate: u32) -> hound::WavSpec {
        let (bits_per_sample, sample_format) = match self {
            Self::Pcm16 => (16, hound::SampleFormat::Int),
            Self::Float32 => (32, hound::SampleFormat::Float),
        };
        hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

/// Writes `buffer` as a mono WAV file at its native rate (rounded to whole Hz).
///
/// # Errors
///
/// Fails if the file cannot be created or written, or if the buffer's rate does not fit a
/// WAV header.
pub fn write_wav(path: &Path, buffer: &AudioBuffer, format: WavFormat) -> Result<(), SampleWriteError> {
    let sample_rate = buffer.sample_rate.round();
    if !sample_rate.is_finite() || sample_rate < 1.0 || sample_rate > u32::MAX as f32 {
        return Err(SampleWriteError::UnrepresentableSampleRate(buffer.sample_rate));
    }

    let mut writer = hound::WavWriter::create(path, format.spec(sample_rate as u32))?;
    match format {
        WavFormat::Pcm16 => {
            for &sample in &buffer.samples {
                writer.write_sample(to_pcm16(sample))?;
            }
        }
        WavFormat::Float32 => {
            for &sample in &buffer.samples {
                writer.write_sample(sample)?;
            }
        }
    }
    writer.finalize()?;

    log::info!(
        "Wrote {} ({} samples @ {} Hz, {:?})",
        path.display(),
        buffer.len(),
        sample_rate,
        format
    );
    Ok(())
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_engine::sample_loader::decode_audio_file;

    #[test]
    fn test_pcm16_conversion_clamps() {
        assert_eq!(to_pcm16(0.0), 0);
        assert_eq!(to_pcm16(1.0), i16::MAX);
        assert_eq!(to_pcm16(2.0), i16::MAX);
        assert_eq!(to_pcm16(-1.0), -i16::MAX);
        assert_eq!(to_pcm16(-3.0), -i16::MAX);
    }

    #[test]
    fn test_write_pcm16_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.wav");
        let buffer = AudioBuffer::new(vec![0.0, 0.5, -0.5, 1.0], 44_100.0);

        write_wav(&path, &buffer, WavFormat::Pcm16).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 4);
    }

    #[test]
    fn test_write_float32_is_lossless() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.wav");
        let buffer = AudioBuffer::new(vec![0.125, -0.875, 0.0, 1.0], 8_000.0);

        write_wav(&path, &buffer, WavFormat::Float32).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, buffer.samples);
    }

    #[test]
    fn test_written_file_decodes_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("roundtrip.wav");
        let buffer = AudioBuffer::new(vec![0.25; 256], 22_050.0);

        write_wav(&path, &buffer, WavFormat::Pcm16).unwrap();
        let decoded = decode_audio_file(&path).unwrap();

        assert_eq!(decoded.sample_rate, 22_050.0);
        assert_eq!(decoded.len(), 256);
        assert!(decoded.samples.iter().all(|s| (s - 0.25).abs() < 1e-3));
    }

    #[test]
    fn test_rejects_unrepresentable_rate() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.wav");
        let buffer = AudioBuffer::new(vec![0.0], 0.0);

        let result = write_wav(&path, &buffer, WavFormat::Pcm16);
        assert!(matches!(
            result,
            Err(SampleWriteError::UnrepresentableSampleRate(_))
        ));
    }
}
