//! Retro console audio degradation.
//!
//! Samples are decimated with a zero-order hold to a console's hardware playback rate and
//! then quantized with the console's amplitude encoding (plain PCM or delta-constrained DPCM).
//! The output keeps the source's length and native rate so it can be compared against the
//! original directly.

pub mod audio_engine;
pub mod messages;

#[cfg(feature = "python")]
mod python;

pub use audio_engine::pipeline::convert;
pub use audio_engine::profiles::{Console, ConsoleProfile, ConsoleSettings};
pub use audio_engine::{ConversionEngine, setup_logger};
pub use messages::{AudioBuffer, ConversionEvent};

/// The Python module implemented in Rust.
#[cfg(feature = "python")]
#[pyo3::pymodule]
mod chipcrush {
    #[pymodule_export]
    use super::python::ConsoleEmulator;

    #[pymodule_export]
    use super::python::console_sample_rates;
}
