//! Buffer and event definitions shared between the conversion pipeline and its callers.
//!
//! [`AudioBuffer`] is the unit every stage consumes and produces. [`ConversionEvent`] is the
//! message format the background conversion worker publishes back to the owner of a
//! [`ConversionEngine`](crate::audio_engine::ConversionEngine).

use std::sync::Arc;

use crate::audio_engine::errors::EmulationError;

/// A mono buffer of `f32` samples tagged with the rate it was captured at.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,

    /// Native sample rate in Hz.
    pub sample_rate: f32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: f32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Buffer length in seconds at the native rate.
    pub fn duration_sec(&self) -> f32 {
        if self.sample_rate > 0.0 {
            self.samples.len() as f32 / self.sample_rate
        } else {
            0.0
        }
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        peak_abs(&self.samples)
    }

    /// Reject buffers containing NaN or infinities.
    pub fn check_finite(&self) -> Result<(), EmulationError> {
        check_finite(&self.samples)
    }
}

pub(crate) fn peak_abs(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()))
}

pub(crate) fn check_finite(samples: &[f32]) -> Result<(), EmulationError> {
    match samples.iter().position(|s| !s.is_finite()) {
        Some(index) => Err(EmulationError::NonFiniteSample { index }),
        None => Ok(()),
    }
}

/// Events emitted by background conversions.
///
/// Every event carries the generation of the request that produced it. The engine only
/// surfaces events belonging to the most recent request.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionEvent {
    /// A conversion started.
    Started { generation: u64 },

    /// A progress update.
    ///
    /// - `percent` is the best-effort total progress across the pipeline (0.0..=1.0).
    /// - `stage` is a human-readable stage string (e.g. "Converting (quantizing)").
    Progress {
        generation: u64,
        percent: f32,
        stage: String,
    },

    /// The conversion finished and `buffer` holds the emulated sample.
    Success {
        generation: u64,
        duration_sec: f32,
        buffer: Arc<AudioBuffer>,
    },

    /// The conversion failed; the previous result is kept.
    Error { generation: u64, error: String },
}

impl ConversionEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Started { generation }
            | Self::Progress { generation, .. }
            | Self::Success { generation, .. }
            | Self::Error { generation, .. } => *generation,
        }
    }

    /// Whether this event ends its conversion.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_duration_and_peak() {
        let buffer = AudioBuffer::new(vec![0.25, -0.75, 0.5, 0.0], 4.0);

        assert_eq!(buffer.len(), 4);
        assert!((buffer.duration_sec() - 1.0).abs() < f32::EPSILON);
        assert!((buffer.peak() - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = AudioBuffer::new(Vec::new(), 44_100.0);

        assert!(buffer.is_empty());
        assert_eq!(buffer.peak(), 0.0);
        assert!(buffer.check_finite().is_ok());
    }

    #[test]
    fn test_check_finite_reports_first_bad_index() {
        let buffer = AudioBuffer::new(vec![0.0, 0.5, f32::NAN, f32::INFINITY], 8_000.0);

        assert_eq!(
            buffer.check_finite(),
            Err(EmulationError::NonFiniteSample { index: 2 })
        );
    }

    #[test]
    fn test_event_generation_and_terminal() {
        let started = ConversionEvent::Started { generation: 3 };
        let failed = ConversionEvent::Error {
            generation: 4,
            error: "boom".to_string(),
        };

        assert_eq!(started.generation(), 3);
        assert!(!started.is_terminal());
        assert_eq!(failed.generation(), 4);
        assert!(failed.is_terminal());
    }
}
