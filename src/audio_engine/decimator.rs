//! Zero-order-hold sample rate reduction.
//!
//! The buffer keeps its length and native rate. A virtual cursor walks the input in steps of
//! `native_rate / target_rate` samples; at each cursor position an anchor value is read
//! (linearly interpolated between the bracketing samples) and held across every native sample
//! up to the next cursor position. This reproduces the stair-step output of a low, fixed
//! hardware playback clock.

use std::ops::Range;

use crate::audio_engine::errors::EmulationError;
use crate::audio_engine::params::validate_sample_rate;

/// One held segment of the decimated output.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldSegment {
    /// Cursor position in native samples.
    pub pos: f64,

    /// Native sample indices that receive the anchor value.
    pub span: Range<usize>,
}

/// Iterator over the held segments of a buffer of `len` samples.
///
/// Segments are contiguous and cover `0..len`. The final segment is clamped to the buffer
/// end instead of overrunning it.
#[derive(Debug, Clone)]
pub struct HoldSegments {
    len: usize,
    increment: f64,
    step: u64,
}

impl HoldSegments {
    pub fn new(len: usize, increment: f64) -> Self {
        Self {
            len,
            increment,
            step: 0,
        }
    }
}

impl Iterator for HoldSegments {
    type Item = HoldSegment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 || self.increment.is_nan() || self.increment <= 0.0 {
            return None;
        }

        let last = (self.len - 1) as f64;
        let pos = self.step as f64 * self.increment;
        if pos > last {
            return None;
        }
        self.step += 1;

        let start = (pos.ceil() as usize).min(self.len);
        let next = pos + self.increment;
        let end = if next > last {
            self.len
        } else {
            (next.ceil() as usize).min(self.len)
        };

        Some(HoldSegment {
            pos,
            span: start..end,
        })
    }
}

/// Native samples spanned by one emulated sample.
pub fn hold_increment(native_rate: f32, target_rate: f32) -> f64 {
    f64::from(native_rate) / f64::from(target_rate)
}

/// Decimate `samples` in place from `native_rate` to a perceived `target_rate`.
///
/// A target at or above the native rate leaves the buffer untouched, as does an empty
/// buffer.
///
/// # Errors
///
/// Returns [`EmulationError::InvalidSampleRate`] if either rate is zero, negative or not
/// finite.
pub fn decimate(
    samples: &mut [f32],
    native_rate: f32,
    target_rate: f32,
) -> Result<(), EmulationError> {
    validate_sample_rate(native_rate)?;
    validate_sample_rate(target_rate)?;

    if samples.is_empty() {
        return Ok(());
    }

    let increment = hold_increment(native_rate, target_rate);
    if increment <= 1.0 {
        log::debug!(
            "target rate {target_rate} Hz is not below native rate {native_rate} Hz, skipping decimation"
        );
        return Ok(());
    }

    let source = samples.to_vec();
    for segment in HoldSegments::new(source.len(), increment) {
        let anchor = anchor_at(&source, segment.pos);
        samples[segment.span].fill(anchor);
    }

    Ok(())
}

/// Value of `source` at a fractional position, exact on integer positions.
fn anchor_at(source: &[f32], pos: f64) -> f32 {
    let floor = pos.floor();
    let index = floor as usize;
    if floor == pos {
        return source[index];
    }

    let previous = source[index];
    let following = source[(index + 1).min(source.len() - 1)];
    let frac = (pos - floor) as f32;
    previous + frac * (following - previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn test_integer_increment_holds_every_nth_sample() {
        let mut samples = ramp(8);

        decimate(&mut samples, 4.0, 2.0).unwrap();

        assert_eq!(samples, vec![0.0, 0.0, 2.0, 2.0, 4.0, 4.0, 6.0, 6.0]);
    }

    #[test]
    fn test_fractional_increment_interpolates_anchor() {
        // increment = 2.5: cursors at 0.0, 2.5, 5.0, 7.5
        let mut samples = ramp(10);

        decimate(&mut samples, 5.0, 2.0).unwrap();

        assert_eq!(
            samples,
            vec![0.0, 0.0, 0.0, 2.5, 2.5, 5.0, 5.0, 5.0, 7.5, 7.5]
        );
    }

    #[test]
    fn test_final_segment_clamped_to_buffer_end() {
        let mut samples = ramp(7);

        decimate(&mut samples, 3.0, 1.0).unwrap();

        assert_eq!(samples, vec![0.0, 0.0, 0.0, 3.0, 3.0, 3.0, 6.0]);
    }

    #[test]
    fn test_length_preserved() {
        let mut samples: Vec<f32> = (0..1_001).map(|i| (i as f32 * 0.01).sin()).collect();

        decimate(&mut samples, 44_100.0, 4_177.4).unwrap();

        assert_eq!(samples.len(), 1_001);
    }

    #[test]
    fn test_samples_constant_within_each_segment() {
        let original: Vec<f32> = (0..500).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut samples = original.clone();
        let increment = hold_increment(44_100.0, 7_044.94);

        decimate(&mut samples, 44_100.0, 7_044.94).unwrap();

        let mut covered = 0;
        for segment in HoldSegments::new(samples.len(), increment) {
            let held = samples[segment.span.start];
            assert!(samples[segment.span.clone()].iter().all(|&s| s == held));
            covered += segment.span.len();
        }
        assert_eq!(covered, samples.len());
        assert_ne!(samples, original);
    }

    #[test]
    fn test_degenerate_increment_yields_no_segments() {
        assert_eq!(HoldSegments::new(10, f64::NAN).count(), 0);
        assert_eq!(HoldSegments::new(10, 0.0).count(), 0);
        assert_eq!(HoldSegments::new(10, -2.0).count(), 0);
    }

    #[test]
    fn test_segments_are_contiguous() {
        let segments: Vec<HoldSegment> = HoldSegments::new(20, 5.2518).collect();

        assert_eq!(segments.first().unwrap().span.start, 0);
        assert_eq!(segments.last().unwrap().span.end, 20);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].span.end, pair[1].span.start);
        }
    }

    #[test]
    fn test_upsample_request_is_pass_through() {
        let original = vec![0.1, -0.2, 0.3, -0.4];
        let mut samples = original.clone();

        decimate(&mut samples, 8_000.0, 16_000.0).unwrap();
        assert_eq!(samples, original);

        decimate(&mut samples, 8_000.0, 8_000.0).unwrap();
        assert_eq!(samples, original);
    }

    #[test]
    fn test_empty_buffer_is_noop() {
        let mut samples: Vec<f32> = Vec::new();

        decimate(&mut samples, 44_100.0, 4_177.4).unwrap();

        assert!(samples.is_empty());
    }

    #[test]
    fn test_invalid_rates_rejected() {
        let mut samples = ramp(4);

        assert!(decimate(&mut samples, 44_100.0, 0.0).is_err());
        assert!(decimate(&mut samples, 0.0, 8_000.0).is_err());
        assert!(decimate(&mut samples, 44_100.0, f32::NAN).is_err());
        assert_eq!(samples, ramp(4));
    }
}
