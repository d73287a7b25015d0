//! PCM amplitude quantization.
//!
//! Samples are first normalized so the peak magnitude is 1, then each one snaps to the
//! nearest of `2^bit_depth` levels spread evenly over `[-1 + 2 / levels, MAX_LEVEL]`. The grid is
//! asymmetric on purpose: it contains an exact 0 and an exact +1, giving up one step of
//! negative headroom.

use crate::audio_engine::errors::EmulationError;
use crate::audio_engine::params::validate_bit_depth;
use crate::messages::{check_finite, peak_abs};

/// Upper bound of every level grid.
pub const MAX_LEVEL: f32 = 1.0;

/// Evenly spaced reconstruction levels for one bit depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelGrid {
    num_levels: usize,
}

impl LevelGrid {
    pub fn new(bit_depth: u32) -> Result<Self, EmulationError> {
        validate_bit_depth(bit_depth)?;
        Ok(Self {
            num_levels: 1usize << bit_depth,
        })
    }

    pub fn num_levels(&self) -> usize {
        self.num_levels
    }

    /// Lowest level, `-1 + 1 / (0.5 * levels)`.
    pub fn min_level(&self) -> f32 {
        self.level(0)
    }

    /// Spacing between neighbouring levels.
    pub fn step(&self) -> f32 {
        (2.0 / self.num_levels as f64) as f32
    }

    /// Index of the exact zero level.
    pub fn zero_index(&self) -> usize {
        self.num_levels / 2 - 1
    }

    pub fn contains(&self, index: i64) -> bool {
        index >= 0 && (index as u64) < self.num_levels as u64
    }

    /// Value of level `index`.
    ///
    /// Evaluates `min + index * step` as the dyadic fraction `2 * (index + 1) / levels - 1`,
    /// which is exact in `f32` for every supported bit depth.
    pub fn level(&self, index: usize) -> f32 {
        let top = f64::from(MAX_LEVEL);
        (top * (2.0 * (index as f64 + 1.0) / self.num_levels as f64 - 1.0)) as f32
    }

    pub fn levels(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.num_levels).map(|index| self.level(index))
    }

    /// Index of the level nearest to `sample`; exact ties go to the lower index.
    ///
    /// Only the two levels bracketing the sample can be nearest, so this matches a linear
    /// scan over the whole table that keeps the first strict improvement.
    pub fn nearest_index(&self, sample: f32) -> usize {
        let last = self.num_levels - 1;
        let scaled = (f64::from(sample) + 1.0) * self.num_levels as f64 / 2.0 - 1.0;
        let lower = if scaled <= 0.0 {
            0
        } else {
            (scaled.floor() as usize).min(last)
        };
        let upper = (lower + 1).min(last);

        let lower_diff = (sample - self.level(lower)).abs();
        let upper_diff = (sample - self.level(upper)).abs();
        if upper_diff < lower_diff { upper } else { lower }
    }

    pub fn snap(&self, sample: f32) -> f32 {
        self.level(self.nearest_index(sample))
    }
}

/// Scale `samples` so that the peak magnitude becomes exactly 1.
///
/// Silent buffers (peak of exactly 0) are left untouched. Returns the gain that was applied.
pub fn normalize_peak(samples: &mut [f32]) -> f32 {
    let peak = peak_abs(samples);
    if peak == 0.0 {
        log::debug!("silent buffer, skipping normalization");
        return 1.0;
    }

    for sample in samples.iter_mut() {
        *sample /= peak;
    }
    1.0 / peak
}

/// Normalize and quantize `samples` in place to `2^bit_depth` levels.
///
/// # Errors
///
/// Returns an error for a bit depth outside the supported range or a non-finite sample.
/// The buffer is left unmodified in both cases.
pub fn quantize_pcm(samples: &mut [f32], bit_depth: u32) -> Result<(), EmulationError> {
    let grid = LevelGrid::new(bit_depth)?;
    check_finite(samples)?;

    normalize_peak(samples);
    for sample in samples.iter_mut() {
        *sample = grid.snap(*sample);
    }

    Ok(())
}
