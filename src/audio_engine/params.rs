//! Emulation parameters handed to the conversion pipeline.

use std::fmt;

use crate::audio_engine::constants::{MAX_BIT_DEPTH, MIN_BIT_DEPTH};
use crate::audio_engine::errors::EmulationError;

/// Amplitude encoding used by the emulated hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Each sample snaps to one of `2^bit_depth` absolute levels.
    Pcm { bit_depth: u32 },

    /// Each decision point moves the reconstructed value by one of `2^slope_bit_depth`
    /// non-zero steps on a `2^bit_depth` level grid.
    Dpcm { bit_depth: u32, slope_bit_depth: u32 },
}

/// Encoding without its parameters, used for console locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingKind {
    Pcm,
    Dpcm,
}

impl EncodingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pcm => "PCM",
            Self::Dpcm => "DPCM",
        }
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Encoding {
    pub fn kind(&self) -> EncodingKind {
        match self {
            Self::Pcm { .. } => EncodingKind::Pcm,
            Self::Dpcm { .. } => EncodingKind::Dpcm,
        }
    }

    pub fn bit_depth(&self) -> u32 {
        match *self {
            Self::Pcm { bit_depth } | Self::Dpcm { bit_depth, .. } => bit_depth,
        }
    }

    pub fn slope_bit_depth(&self) -> Option<u32> {
        match *self {
            Self::Pcm { .. } => None,
            Self::Dpcm {
                slope_bit_depth, ..
            } => Some(slope_bit_depth),
        }
    }
}

/// Target emulation for one conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmulationParameters {
    /// Perceived output sample rate in Hz.
    pub target_sample_rate: f32,
    pub encoding: Encoding,
}

impl EmulationParameters {
    pub fn pcm(target_sample_rate: f32, bit_depth: u32) -> Self {
        Self {
            target_sample_rate,
            encoding: Encoding::Pcm { bit_depth },
        }
    }

    pub fn dpcm(target_sample_rate: f32, bit_depth: u32, slope_bit_depth: u32) -> Self {
        Self {
            target_sample_rate,
            encoding: Encoding::Dpcm {
                bit_depth,
                slope_bit_depth,
            },
        }
    }

    pub fn kind(&self) -> EncodingKind {
        self.encoding.kind()
    }

    pub fn bit_depth(&self) -> u32 {
        self.encoding.bit_depth()
    }

    pub fn slope_bit_depth(&self) -> Option<u32> {
        self.encoding.slope_bit_depth()
    }

    /// Check the numeric constraints every conversion relies on.
    ///
    /// Console legality is checked separately by
    /// [`ConsoleProfile::validate`](crate::audio_engine::profiles::ConsoleProfile::validate).
    pub fn validate(&self) -> Result<(), EmulationError> {
        validate_sample_rate(self.target_sample_rate)?;
        validate_bit_depth(self.bit_depth())?;
        if let Some(slope_bit_depth) = self.slope_bit_depth() {
            validate_slope_bit_depth(slope_bit_depth)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_sample_rate(rate: f32) -> Result<(), EmulationError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(EmulationError::InvalidSampleRate(rate))
    }
}

pub(crate) fn validate_bit_depth(bit_depth: u32) -> Result<(), EmulationError> {
    if (MIN_BIT_DEPTH..=MAX_BIT_DEPTH).contains(&bit_depth) {
        Ok(())
    } else {
        Err(EmulationError::bit_depth(bit_depth))
    }
}

pub(crate) fn validate_slope_bit_depth(slope_bit_depth: u32) -> Result<(), EmulationError> {
    if (MIN_BIT_DEPTH..=MAX_BIT_DEPTH).contains(&slope_bit_depth) {
        Ok(())
    } else {
        Err(EmulationError::slope_bit_depth(slope_bit_depth))
    }
}
