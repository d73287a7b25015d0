//! Python bindings for the conversion engine.

use std::path::PathBuf;

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::audio_engine::errors::EngineError;
use crate::audio_engine::profiles::{Console, ConsoleSettings};
use crate::audio_engine::sample_writer::WavFormat;
use crate::audio_engine::{ConversionEngine, setup_logger};
use crate::messages::{AudioBuffer, ConversionEvent};

fn to_py_err(err: EngineError) -> PyErr {
    match err {
        EngineError::Emulation(err) => PyValueError::new_err(err.to_string()),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

fn parse_console(console: &str) -> PyResult<Console> {
    console
        .parse::<Console>()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Degrades samples the way a retro console's sample playback would.
#[pyclass]
pub struct ConsoleEmulator {
    engine: ConversionEngine,
}

#[pymethods]
impl ConsoleEmulator {
    #[new]
    pub fn new() -> PyResult<Self> {
        setup_logger();
        Ok(ConsoleEmulator {
            engine: ConversionEngine::new(),
        })
    }

    /// Decode an audio file and make it the source sample. Returns its duration in seconds.
    pub fn load_sample(&mut self, path: PathBuf) -> PyResult<f32> {
        let buffer = self.engine.load_sample(&path).map_err(to_py_err)?;
        Ok(buffer.duration_sec())
    }

    /// Use a mono float array as the source sample.
    pub fn set_samples(&mut self, samples: PyReadonlyArray1<'_, f32>, sample_rate: f32) {
        let samples: Vec<f32> = samples.as_array().iter().copied().collect();
        self.engine.set_original(AudioBuffer::new(samples, sample_rate));
    }

    /// Start a background conversion with the given console settings.
    ///
    /// Returns the request's generation; events from older requests are never reported.
    #[pyo3(signature = (console, sample_rate_index, bit_depth, slope_bit_depth=None))]
    pub fn request_conversion(
        &self,
        console: &str,
        sample_rate_index: usize,
        bit_depth: u32,
        slope_bit_depth: Option<u32>,
    ) -> PyResult<u64> {
        let console = parse_console(console)?;
        let settings = ConsoleSettings {
            console,
            sample_rate_index,
            bit_depth,
            slope_bit_depth,
        };
        self.engine
            .request_console_conversion(&settings)
            .map_err(to_py_err)
    }

    /// Poll for pending conversion events.
    ///
    /// Returns `None` when no events are available.
    pub fn poll_events(&mut self, py: Python<'_>) -> PyResult<Option<Py<PyAny>>> {
        let Some(event) = self.engine.poll_event() else {
            return Ok(None);
        };

        let dict = PyDict::new(py);
        match event {
            ConversionEvent::Started { generation } => {
                dict.set_item("type", "started")?;
                dict.set_item("generation", generation)?;
            }
            ConversionEvent::Progress {
                generation,
                percent,
                stage,
            } => {
                dict.set_item("type", "progress")?;
                dict.set_item("generation", generation)?;
                dict.set_item("percent", percent)?;
                dict.set_item("stage", stage)?;
            }
            ConversionEvent::Success {
                generation,
                duration_sec,
                ..
            } => {
                dict.set_item("type", "success")?;
                dict.set_item("generation", generation)?;
                dict.set_item("duration_sec", duration_sec)?;
            }
            ConversionEvent::Error { generation, error } => {
                dict.set_item("type", "error")?;
                dict.set_item("generation", generation)?;
                dict.set_item("msg", error)?;
            }
        }

        Ok(Some(dict.into_any().unbind()))
    }

    /// The unmodified source sample, or `None` if nothing is loaded.
    pub fn original_samples<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray1<f32>>> {
        self.engine
            .original()
            .map(|buffer| PyArray1::from_slice(py, &buffer.samples))
    }

    /// The latest converted sample, or `None` if no conversion has finished.
    pub fn processed_samples<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray1<f32>>> {
        self.engine
            .processed()
            .map(|buffer| PyArray1::from_slice(py, &buffer.samples))
    }

    /// Native sample rate of the loaded source.
    pub fn sample_rate(&self) -> Option<f32> {
        self.engine.original().map(|buffer| buffer.sample_rate)
    }

    /// Write the latest converted sample to a WAV file.
    #[pyo3(signature = (path, float=false))]
    pub fn export(&self, path: PathBuf, float: bool) -> PyResult<()> {
        let format = if float {
            WavFormat::Float32
        } else {
            WavFormat::Pcm16
        };
        self.engine
            .export_processed(&path, format)
            .map_err(to_py_err)
    }
}

/// Hardware sample rates offered by `console`, in table order.
#[pyfunction]
pub fn console_sample_rates(console: &str) -> PyResult<Vec<f32>> {
    let console = parse_console(console)?;
    Ok(console.profile().sample_rates.to_vec())
}
