use crate::audio_engine::errors::SampleLoadError;

/// Downmixes interleaved samples to a single channel.
///
/// - Mono (1 channel): returned unchanged
/// - N channels: each frame is averaged into one sample
///
/// # Parameters
///
/// - `samples`: Interleaved audio samples to convert
/// - `channels`: Number of channels in the source audio
///
/// # Returns
///
/// - `Ok(Vec<f32>)`: One sample per frame
/// - `Err(SampleLoadError)`: Zero channels
pub fn downmix_to_mono(samples: Vec<f32>, channels: usize) -> Result<Vec<f32>, SampleLoadError> {
    match channels {
        0 => Err(SampleLoadError::UnsupportedChannels { channels }),
        1 => Ok(samples),
        _ => {
            let scale = 1.0 / channels as f32;
            Ok(samples
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() * scale)
                .collect())
        }
    }
}
