//! Emulation limits and engine configuration constants.

/// Smallest accepted amplitude or slope bit depth.
pub const MIN_BIT_DEPTH: u32 = 1;

/// Largest accepted amplitude or slope bit depth.
///
/// 16 bits keeps the level grid at 65536 entries, which is already beyond
/// anything the emulated hardware exposed.
pub const MAX_BIT_DEPTH: u32 = 16;

/// Minimum interval between two non-forced progress events, in milliseconds.
pub const PROGRESS_MIN_INTERVAL_MS: u64 = 100;

/// Number of DPCM decision points between progress callbacks.
pub const DPCM_PROGRESS_STRIDE: usize = 4096;
