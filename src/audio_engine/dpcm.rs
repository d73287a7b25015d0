//! Delta-modulation (DPCM) quantization.
//!
//! Delta-modulation hardware cannot jump to an arbitrary level: every decimated interval the
//! decoder moves its reconstructed value by one of a small, symmetric set of non-zero steps.
//! The encoder here models that decoder with a greedy walk. For each decision point it picks
//! the legal step that lands closest to the target sample and never revisits an earlier
//! choice, so fast ramps lag behind the input (slope overload) exactly as on the hardware.
//!
//! The walk tracks the reconstructed value as an index into the [`LevelGrid`], so consecutive
//! decision points always differ by an exact multiple of the grid step.

use crate::audio_engine::constants::DPCM_PROGRESS_STRIDE;
use crate::audio_engine::decimator::hold_increment;
use crate::audio_engine::errors::EmulationError;
use crate::audio_engine::params::{validate_sample_rate, validate_slope_bit_depth};
use crate::audio_engine::pcm::{LevelGrid, normalize_peak};
use crate::messages::{check_finite, peak_abs};

/// Legal per-step deltas in grid steps, most negative first.
///
/// `2^slope_bit_depth` values, symmetric around zero, zero excluded: a slope depth of 2
/// yields `[-2, -1, 1, 2]`.
pub fn slope_deltas(slope_bit_depth: u32) -> Result<Vec<i64>, EmulationError> {
    validate_slope_bit_depth(slope_bit_depth)?;
    let half = 1i64 << (slope_bit_depth - 1);
    Ok((-half..=-1).chain(1..=half).collect())
}

/// Number of decision points for a buffer of `len` samples.
///
/// `floor(len * converted_rate / native_rate)` with the converted rate capped at the native
/// rate, and at least one so that a non-empty buffer always has a starting point.
pub fn decision_points(len: usize, native_rate: f32, converted_rate: f32) -> usize {
    let converted = f64::from(converted_rate.min(native_rate));
    let points = (len as f64 * converted / f64::from(native_rate)).floor() as usize;
    points.clamp(1, len.max(1))
}

/// Greedy choice of the next level index from `current`.
///
/// Candidates that leave the grid are skipped; among the rest the closest to `target` wins,
/// earlier deltas winning exact ties.
pub fn next_level_index(grid: &LevelGrid, current: i64, target: f32, deltas: &[i64]) -> i64 {
    let mut best = current;
    let mut best_diff = f32::INFINITY;
    for &delta in deltas {
        let candidate = current + delta;
        if !grid.contains(candidate) {
            continue;
        }

        let diff = (target - grid.level(candidate as usize)).abs();
        if diff < best_diff {
            best_diff = diff;
            best = candidate;
        }
    }
    best
}

/// DPCM-quantize a buffer that has already been decimated to `converted_rate`.
pub fn quantize_dpcm(
    samples: &mut [f32],
    native_rate: f32,
    converted_rate: f32,
    bit_depth: u32,
    slope_bit_depth: u32,
) -> Result<(), EmulationError> {
    quantize_dpcm_with_progress(
        samples,
        native_rate,
        converted_rate,
        bit_depth,
        slope_bit_depth,
        |_| {},
    )
}

/// Same as [`quantize_dpcm`], reporting walk progress (0.0..=1.0) to `on_progress`.
///
/// A converted rate at or above the native rate places one decision point on every sample.
///
/// # Errors
///
/// Returns an error for invalid rates or bit depths, or a non-finite input sample. The
/// buffer is left unmodified on error.
pub fn quantize_dpcm_with_progress<F>(
    samples: &mut [f32],
    native_rate: f32,
    converted_rate: f32,
    bit_depth: u32,
    slope_bit_depth: u32,
    mut on_progress: F,
) -> Result<(), EmulationError>
where
    F: FnMut(f32),
{
    validate_sample_rate(native_rate)?;
    validate_sample_rate(converted_rate)?;
    let grid = LevelGrid::new(bit_depth)?;
    let deltas = slope_deltas(slope_bit_depth)?;
    check_finite(samples)?;

    if samples.is_empty() {
        return Ok(());
    }
    if peak_abs(samples) == 0.0 {
        // Every step is non-zero, so a walk over silence would only add noise.
        log::debug!("silent buffer, skipping delta walk");
        on_progress(1.0);
        return Ok(());
    }

    normalize_peak(samples);

    let len = samples.len();
    let increment = hold_increment(native_rate, converted_rate).max(1.0);
    let points = decision_points(len, native_rate, converted_rate);

    on_progress(0.0);
    let mut current = grid.zero_index() as i64;
    let mut indices = Vec::with_capacity(points);
    indices.push(current);
    for point in 1..points {
        let read = ((point as f64 * increment).ceil() as usize).min(len - 1);
        current = next_level_index(&grid, current, samples[read], &deltas);
        indices.push(current);

        if point % DPCM_PROGRESS_STRIDE == 0 {
            on_progress(point as f32 / points as f32);
        }
    }

    for (point, &index) in indices.iter().enumerate() {
        let start = ((point as f64 * increment).ceil() as usize).min(len);
        let end = if point + 1 == points {
            len
        } else {
            (((point + 1) as f64 * increment).ceil() as usize).min(len)
        };
        samples[start..end].fill(grid.level(index as usize));
    }
    on_progress(1.0);

    Ok(())
}
