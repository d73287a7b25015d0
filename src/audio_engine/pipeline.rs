//! Console emulation pipeline: decimate, then quantize with the console's encoding.

use crate::audio_engine::decimator::decimate;
use crate::audio_engine::dpcm::quantize_dpcm_with_progress;
use crate::audio_engine::errors::EmulationError;
use crate::audio_engine::params::{Encoding, EmulationParameters, validate_sample_rate};
use crate::audio_engine::pcm::quantize_pcm;
use crate::audio_engine::progress::{ConversionProgress, ConversionStage};
use crate::messages::AudioBuffer;

/// Run the full emulation on `source` and return the degraded copy.
///
/// The source is never modified, so callers can keep it for A/B comparison.
pub fn convert(
    source: &AudioBuffer,
    params: &EmulationParameters,
) -> Result<AudioBuffer, EmulationError> {
    convert_with_progress(source, params, |_| {})
}

/// Same as [`convert`], reporting stage progress to `on_progress`.
///
/// # Errors
///
/// Parameters and the source buffer are validated before any work is done; on error no
/// output buffer is produced.
pub fn convert_with_progress<F>(
    source: &AudioBuffer,
    params: &EmulationParameters,
    mut on_progress: F,
) -> Result<AudioBuffer, EmulationError>
where
    F: FnMut(ConversionProgress),
{
    params.validate()?;
    validate_sample_rate(source.sample_rate)?;
    source.check_finite()?;

    log::info!(
        "Converting {} samples @ {} Hz -> {} Hz, {} {} bit{}",
        source.len(),
        source.sample_rate,
        params.target_sample_rate,
        params.kind(),
        params.bit_depth(),
        params
            .slope_bit_depth()
            .map(|slope| format!(", {slope} bit slope"))
            .unwrap_or_default()
    );

    let mut samples = source.samples.clone();

    on_progress(ConversionProgress {
        stage: ConversionStage::Decimating,
        percent: 0.0,
    });
    decimate(&mut samples, source.sample_rate, params.target_sample_rate)?;
    on_progress(ConversionProgress {
        stage: ConversionStage::Decimating,
        percent: 1.0,
    });

    match params.encoding {
        Encoding::Pcm { bit_depth } => {
            on_progress(ConversionProgress {
                stage: ConversionStage::Quantizing,
                percent: 0.0,
            });
            quantize_pcm(&mut samples, bit_depth)?;
            on_progress(ConversionProgress {
                stage: ConversionStage::Quantizing,
                percent: 1.0,
            });
        }
        Encoding::Dpcm {
            bit_depth,
            slope_bit_depth,
        } => {
            quantize_dpcm_with_progress(
                &mut samples,
                source.sample_rate,
                params.target_sample_rate,
                bit_depth,
                slope_bit_depth,
                |percent| {
                    on_progress(ConversionProgress {
                        stage: ConversionStage::Quantizing,
                        percent,
                    })
                },
            )?;
        }
    }

    Ok(AudioBuffer::new(samples, source.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_engine::pcm::LevelGrid;
    use crate::audio_engine::profiles::{Console, ConsoleSettings};

    fn sine_buffer(freq_hz: f32, sample_rate: f32, len: usize) -> AudioBuffer {
        let samples = (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq_hz * i as f32 / sample_rate).sin())
            .collect();
        AudioBuffer::new(samples, sample_rate)
    }

    fn run_lengths(samples: &[f32]) -> Vec<usize> {
        let mut runs = Vec::new();
        let mut current = 1;
        for pair in samples.windows(2) {
            if pair[0] == pair[1] {
                current += 1;
            } else {
                runs.push(current);
                current = 1;
            }
        }
        runs.push(current);
        runs
    }

    #[test]
    fn test_nes_sine_scenario() {
        let source = sine_buffer(440.0, 44_100.0, 44_100);
        let params = ConsoleSettings {
            console: Console::Nes,
            sample_rate_index: 7,
            bit_depth: 4,
            slope_bit_depth: None,
        }
        .resolve()
        .unwrap();

        let output = convert(&source, &params).unwrap();

        assert_eq!(output.len(), source.len());
        assert_eq!(output.sample_rate, source.sample_rate);

        let mut distinct: Vec<f32> = output.samples.iter().copied().filter(|&s| s != 0.0).collect();
        distinct.sort_by(f32::total_cmp);
        distinct.dedup();
        assert!(distinct.len() <= 16);

        let levels: Vec<f32> = LevelGrid::new(4).unwrap().levels().collect();
        assert!(output.samples.iter().all(|s| levels.contains(s)));

        let held_fraction = output
            .samples
            .windows(2)
            .filter(|pair| pair[0] == pair[1])
            .count() as f32
            / (output.len() - 1) as f32;
        assert!(held_fraction > 0.75, "held fraction {held_fraction}");
    }

    #[test]
    fn test_nes_decimation_runs_are_five_or_six_samples() {
        let source = sine_buffer(440.0, 44_100.0, 44_100);
        let mut samples = source.samples.clone();

        decimate(&mut samples, 44_100.0, 8_397.01).unwrap();

        let runs = run_lengths(&samples);
        let interior = &runs[..runs.len() - 1];
        assert!(interior.iter().all(|&run| run >= 5));
        let typical = interior.iter().filter(|&&run| run == 5 || run == 6).count();
        assert!(typical as f32 / interior.len() as f32 > 0.99);

        let mean = samples.len() as f32 / runs.len() as f32;
        assert!((mean - 44_100.0 / 8_397.01).abs() < 0.1, "mean run {mean}");
    }

    #[test]
    fn test_source_is_left_untouched() {
        let source = sine_buffer(440.0, 44_100.0, 4_410);
        let before = source.clone();

        let output = convert(&source, &EmulationParameters::dpcm(16_000.0, 4, 2)).unwrap();

        assert_eq!(source, before);
        assert_ne!(output, source);
    }

    #[test]
    fn test_dpcm_pipeline_preserves_length_and_rate() {
        let source = sine_buffer(220.0, 48_000.0, 12_345);

        let output = convert(&source, &EmulationParameters::dpcm(8_000.0, 4, 2)).unwrap();

        assert_eq!(output.len(), source.len());
        assert_eq!(output.sample_rate, 48_000.0);
    }

    #[test]
    fn test_silence_round_trips_for_both_encodings() {
        let source = AudioBuffer::new(vec![0.0; 1_000], 44_100.0);

        for params in [
            EmulationParameters::pcm(8_397.01, 4),
            EmulationParameters::dpcm(8_000.0, 4, 2),
        ] {
            let output = convert(&source, &params).unwrap();
            assert!(output.samples.iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_empty_buffer() {
        let source = AudioBuffer::new(Vec::new(), 44_100.0);

        let output = convert(&source, &EmulationParameters::pcm(8_000.0, 4)).unwrap();

        assert!(output.is_empty());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let source = sine_buffer(440.0, 44_100.0, 100);

        assert!(matches!(
            convert(&source, &EmulationParameters::pcm(8_000.0, 0)),
            Err(EmulationError::InvalidBitDepth { .. })
        ));
        assert!(matches!(
            convert(&source, &EmulationParameters::dpcm(8_000.0, 4, 0)),
            Err(EmulationError::InvalidSlopeBitDepth { .. })
        ));
        assert!(matches!(
            convert(&source, &EmulationParameters::pcm(0.0, 4)),
            Err(EmulationError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn test_non_finite_source_rejected() {
        let source = AudioBuffer::new(vec![0.0, f32::INFINITY], 44_100.0);

        assert_eq!(
            convert(&source, &EmulationParameters::pcm(8_000.0, 4)),
            Err(EmulationError::NonFiniteSample { index: 1 })
        );
    }

    #[test]
    fn test_invalid_source_rate_rejected() {
        let source = AudioBuffer::new(vec![0.5; 10], 0.0);

        assert!(matches!(
            convert(&source, &EmulationParameters::pcm(8_000.0, 4)),
            Err(EmulationError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn test_progress_covers_both_stages() {
        let source = sine_buffer(440.0, 44_100.0, 1_000);
        let mut stages = Vec::new();

        convert_with_progress(&source, &EmulationParameters::pcm(8_000.0, 4), |update| {
            stages.push((update.stage, update.percent))
        })
        .unwrap();

        assert_eq!(
            stages,
            vec![
                (ConversionStage::Decimating, 0.0),
                (ConversionStage::Decimating, 1.0),
                (ConversionStage::Quantizing, 0.0),
                (ConversionStage::Quantizing, 1.0),
            ]
        );
    }
}
