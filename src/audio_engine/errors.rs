//! Error types for emulation, file intake and file output.

use thiserror::Error;

use crate::audio_engine::constants::{MAX_BIT_DEPTH, MIN_BIT_DEPTH};

/// Errors raised while validating parameters or converting a buffer.
///
/// None of these leave a partially converted buffer behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmulationError {
    /// Amplitude bit depth outside the accepted range.
    #[error("bit depth {bit_depth} out of range (expected {min}..={max})")]
    InvalidBitDepth { bit_depth: u32, min: u32, max: u32 },

    /// Delta-step bit depth outside the accepted range.
    #[error("slope bit depth {slope_bit_depth} out of range (expected {min}..={max})")]
    InvalidSlopeBitDepth {
        slope_bit_depth: u32,
        min: u32,
        max: u32,
    },

    /// Target or native sample rate is zero, negative or not finite.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),

    /// A console sample-rate index outside the profile's table.
    #[error("{console} sample rate index out of range (expected 0..{len}, got {index})")]
    SampleRateIndexOutOfRange {
        console: &'static str,
        index: usize,
        len: usize,
    },

    /// The requested encoding does not match the console's locked encoding.
    #[error("{console} is locked to {expected} encoding, got {requested}")]
    EncodingMismatch {
        console: &'static str,
        expected: &'static str,
        requested: &'static str,
    },

    /// A target rate that is not one of the console's hardware rates.
    #[error("{console} does not support a target rate of {rate} Hz")]
    UnsupportedSampleRate { console: &'static str, rate: f32 },

    /// The input buffer contains NaN or an infinity.
    #[error("non-finite sample at index {index}")]
    NonFiniteSample { index: usize },
}

impl EmulationError {
    pub(crate) fn bit_depth(bit_depth: u32) -> Self {
        Self::InvalidBitDepth {
            bit_depth,
            min: MIN_BIT_DEPTH,
            max: MAX_BIT_DEPTH,
        }
    }

    pub(crate) fn slope_bit_depth(slope_bit_depth: u32) -> Self {
        Self::InvalidSlopeBitDepth {
            slope_bit_depth,
            min: MIN_BIT_DEPTH,
            max: MAX_BIT_DEPTH,
        }
    }
}

/// Errors that can occur while loading audio files.
#[derive(Debug, Error)]
pub enum SampleLoadError {
    /// Failed to open the audio file.
    #[error("failed to open file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the audio file.
    #[error("failed to decode audio file: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    /// Audio file has no default track.
    #[error("audio file has no default track")]
    NoDefaultTrack,

    /// Audio file is missing sample rate information.
    #[error("audio file is missing a sample rate")]
    MissingSampleRate,

    /// Audio file is missing channel information.
    #[error("audio file is missing channel information")]
    MissingChannels,

    /// Unsupported channel configuration.
    #[error("unsupported channel layout: {channels} channels")]
    UnsupportedChannels {
        /// Number of channels in the source file.
        channels: usize,
    },
}

/// Errors that can occur while writing a processed buffer to disk.
#[derive(Debug, Error)]
pub enum SampleWriteError {
    /// The WAV encoder failed.
    #[error("failed to write wav file: {0}")]
    Wav(#[from] hound::Error),

    /// The buffer's sample rate cannot be stored in a WAV header.
    #[error("sample rate {0} Hz cannot be written to a wav header")]
    UnrepresentableSampleRate(f32),
}

/// Errors surfaced by [`ConversionEngine`](crate::audio_engine::ConversionEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// No source buffer has been loaded yet.
    #[error("no sample loaded")]
    NoSource,

    /// No conversion result is available yet.
    #[error("no processed sample available")]
    NoResult,

    #[error(transparent)]
    Emulation(#[from] EmulationError),

    #[error(transparent)]
    Load(#[from] SampleLoadError),

    #[error(transparent)]
    Write(#[from] SampleWriteError),
}
