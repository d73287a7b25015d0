//! Console profile table.
//!
//! Each emulated console only ever exposed a handful of playback rates and a fixed sample
//! encoding. A [`ConsoleProfile`] records those legal values so that callers can turn UI
//! selections (a rate index, a bit depth) into validated [`EmulationParameters`].

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use thiserror::Error;

use crate::audio_engine::errors::EmulationError;
use crate::audio_engine::params::{Encoding, EmulationParameters, EncodingKind};

/// Hardware-derived NES DMC playback rates in Hz.
const NES_SAMPLE_RATES: [f32; 16] = [
    4_177.4, 4_696.63, 5_261.41, 5_579.22, 6_023.94, 7_044.94, 7_917.18, 8_397.01, 9_446.63,
    11_233.8, 12_595.5, 14_089.9, 16_965.4, 21_315.5, 25_191.0, 33_252.1,
];

const SNES_SAMPLE_RATES: [f32; 3] = [8_000.0, 16_000.0, 32_000.0];

const GAME_BOY_SAMPLE_RATES: [f32; 3] = [8_192.0, 16_384.0, 32_768.0];

/// GBA DirectSound rates commonly used by the official mixer.
const GBA_SAMPLE_RATES: [f32; 10] = [
    5_734.0, 10_512.0, 13_379.0, 18_157.0, 21_024.0, 26_758.0, 31_536.0, 36_314.0, 40_137.0,
    42_048.0,
];

/// Emulated console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Console {
    Nes,
    Snes,
    GameBoy,
    Gba,
}

impl Console {
    pub const ALL: [Console; 4] = [Self::Nes, Self::Snes, Self::GameBoy, Self::Gba];

    pub fn profile(self) -> &'static ConsoleProfile {
        match self {
            Self::Nes => &NES_PROFILE,
            Self::Snes => &SNES_PROFILE,
            Self::GameBoy => &GAME_BOY_PROFILE,
            Self::Gba => &GBA_PROFILE,
        }
    }

    pub fn name(self) -> &'static str {
        self.profile().name
    }
}

impl fmt::Display for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown console identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown console '{0}' (expected one of: nes, snes, gameboy, gba)")]
pub struct ParseConsoleError(String);

impl FromStr for Console {
    type Err = ParseConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nes" => Ok(Self::Nes),
            "snes" => Ok(Self::Snes),
            "gameboy" | "game boy" | "gb" => Ok(Self::GameBoy),
            "gba" => Ok(Self::Gba),
            _ => Err(ParseConsoleError(s.to_string())),
        }
    }
}

/// Legal parameter space of one console.
#[derive(Debug)]
pub struct ConsoleProfile {
    pub console: Console,
    pub name: &'static str,

    /// Encoding the console is locked to.
    pub encoding: EncodingKind,

    pub bit_depths: RangeInclusive<u32>,

    /// Legal delta-step bit depths; `None` for PCM consoles.
    pub slope_bit_depths: Option<RangeInclusive<u32>>,

    /// Selectable target rates in Hz, indexed by the UI.
    pub sample_rates: &'static [f32],

    pub default_bit_depth: u32,
    pub default_slope_bit_depth: Option<u32>,
    pub default_sample_rate_index: usize,
}

static NES_PROFILE: ConsoleProfile = ConsoleProfile {
    console: Console::Nes,
    name: "NES",
    encoding: EncodingKind::Pcm,
    bit_depths: 1..=7,
    slope_bit_depths: None,
    sample_rates: &NES_SAMPLE_RATES,
    default_bit_depth: 7,
    default_slope_bit_depth: None,
    default_sample_rate_index: 0,
};

static SNES_PROFILE: ConsoleProfile = ConsoleProfile {
    console: Console::Snes,
    name: "SNES",
    encoding: EncodingKind::Dpcm,
    bit_depths: 1..=8,
    slope_bit_depths: Some(1..=4),
    sample_rates: &SNES_SAMPLE_RATES,
    default_bit_depth: 4,
    default_slope_bit_depth: Some(2),
    default_sample_rate_index: 2,
};

static GAME_BOY_PROFILE: ConsoleProfile = ConsoleProfile {
    console: Console::GameBoy,
    name: "Game Boy",
    encoding: EncodingKind::Pcm,
    bit_depths: 1..=4,
    slope_bit_depths: None,
    sample_rates: &GAME_BOY_SAMPLE_RATES,
    default_bit_depth: 4,
    default_slope_bit_depth: None,
    default_sample_rate_index: 0,
};

static GBA_PROFILE: ConsoleProfile = ConsoleProfile {
    console: Console::Gba,
    name: "GBA",
    encoding: EncodingKind::Pcm,
    bit_depths: 1..=8,
    slope_bit_depths: None,
    sample_rates: &GBA_SAMPLE_RATES,
    default_bit_depth: 8,
    default_slope_bit_depth: None,
    default_sample_rate_index: 1,
};

/// A caller's selection for one console, as produced by UI controls or CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub console: Console,
    pub sample_rate_index: usize,
    pub bit_depth: u32,
    pub slope_bit_depth: Option<u32>,
}

impl ConsoleSettings {
    /// The console's default selection.
    pub fn defaults(console: Console) -> Self {
        let profile = console.profile();
        Self {
            console,
            sample_rate_index: profile.default_sample_rate_index,
            bit_depth: profile.default_bit_depth,
            slope_bit_depth: profile.default_slope_bit_depth,
        }
    }

    /// Resolve against the console's own profile.
    pub fn resolve(&self) -> Result<EmulationParameters, EmulationError> {
        self.console.profile().resolve(self)
    }
}

impl ConsoleProfile {
    /// Literal rate in Hz for a sample-rate index.
    pub fn sample_rate(&self, index: usize) -> Result<f32, EmulationError> {
        self.sample_rates
            .get(index)
            .copied()
            .ok_or(EmulationError::SampleRateIndexOutOfRange {
                console: self.name,
                index,
                len: self.sample_rates.len(),
            })
    }

    /// Validate a selection and turn it into emulation parameters.
    pub fn resolve(&self, settings: &ConsoleSettings) -> Result<EmulationParameters, EmulationError> {
        let target_sample_rate = self.sample_rate(settings.sample_rate_index)?;
        self.check_bit_depth(settings.bit_depth)?;

        let encoding = match (self.encoding, settings.slope_bit_depth) {
            (EncodingKind::Pcm, None) => Encoding::Pcm {
                bit_depth: settings.bit_depth,
            },
            (EncodingKind::Dpcm, Some(slope_bit_depth)) => {
                self.check_slope_bit_depth(slope_bit_depth)?;
                Encoding::Dpcm {
                    bit_depth: settings.bit_depth,
                    slope_bit_depth,
                }
            }
            (EncodingKind::Pcm, Some(_)) => return Err(self.mismatch(EncodingKind::Dpcm)),
            (EncodingKind::Dpcm, None) => return Err(self.mismatch(EncodingKind::Pcm)),
        };

        Ok(EmulationParameters {
            target_sample_rate,
            encoding,
        })
    }

    /// Check parameters built elsewhere against this console's legal values.
    pub fn validate(&self, params: &EmulationParameters) -> Result<(), EmulationError> {
        if params.kind() != self.encoding {
            return Err(self.mismatch(params.kind()));
        }

        self.check_bit_depth(params.bit_depth())?;
        if let Some(slope_bit_depth) = params.slope_bit_depth() {
            self.check_slope_bit_depth(slope_bit_depth)?;
        }

        if !self.sample_rates.contains(&params.target_sample_rate) {
            return Err(EmulationError::UnsupportedSampleRate {
                console: self.name,
                rate: params.target_sample_rate,
            });
        }

        Ok(())
    }

    fn check_bit_depth(&self, bit_depth: u32) -> Result<(), EmulationError> {
        if self.bit_depths.contains(&bit_depth) {
            Ok(())
        } else {
            Err(EmulationError::InvalidBitDepth {
                bit_depth,
                min: *self.bit_depths.start(),
                max: *self.bit_depths.end(),
            })
        }
    }

    fn check_slope_bit_depth(&self, slope_bit_depth: u32) -> Result<(), EmulationError> {
        match &self.slope_bit_depths {
            Some(range) if range.contains(&slope_bit_depth) => Ok(()),
            Some(range) => Err(EmulationError::InvalidSlopeBitDepth {
                slope_bit_depth,
                min: *range.start(),
                max: *range.end(),
            }),
            None => Err(self.mismatch(EncodingKind::Dpcm)),
        }
    }

    fn mismatch(&self, requested: EncodingKind) -> EmulationError {
        EmulationError::EncodingMismatch {
            console: self.name,
            expected: self.encoding.as_str(),
            requested: requested.as_str(),
        }
    }
}
