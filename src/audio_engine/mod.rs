//! Console Emulation Engine Module
//!
//! This module turns a decoded sample into what a retro console's sample hardware would have
//! played back. It is organized into sub-modules, each with a specific responsibility:
//!
//! - [`decimator`]: zero-order-hold sample rate reduction
//! - [`pcm`]: nearest-level amplitude quantization
//! - [`dpcm`]: greedy constrained-delta quantization
//! - [`profiles`]: per-console legal parameters and hardware sample rates
//! - [`pipeline`]: validation plus decimate-then-quantize dispatch
//! - [`sample_loader`] / [`sample_writer`]: file decoding and WAV re-encoding
//! - [`constants`]: Configuration constants and limits
//! - [`errors`]: Engine error types
//!
//! The [`ConversionEngine`] struct keeps the unmodified original for A/B comparison and runs
//! conversions off the caller's thread, publishing progress and results as
//! [`ConversionEvent`]s.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use env_logger::{Builder, Env};

use crate::audio_engine::errors::EngineError;
use crate::audio_engine::params::EmulationParameters;
use crate::audio_engine::pipeline::convert_with_progress;
use crate::audio_engine::profiles::ConsoleSettings;
use crate::audio_engine::progress::{ConversionProgress, ConversionStage, ProgressReporter};
use crate::audio_engine::sample_loader::decode_audio_file;
use crate::audio_engine::sample_writer::{WavFormat, write_wav};
use crate::messages::{AudioBuffer, ConversionEvent};

pub mod channels;
pub mod constants;
pub mod decimator;
pub mod dpcm;
pub mod errors;
pub mod params;
pub mod pcm;
pub mod pipeline;
pub mod profiles;
pub mod progress;
pub mod sample_loader;
pub mod sample_writer;

/// Setup and configure the logger for engine operations
pub fn setup_logger() {
    // Default to `info`; users can override via `RUST_LOG`, e.g. `RUST_LOG=debug`.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .unwrap_or(()); // Ignore initialization errors
}

/// Owns a source sample and the latest emulated version of it.
///
/// Each call to [`request_conversion`](Self::request_conversion) spawns a worker that owns
/// its parameters and a shared handle to the source, so conversions never share mutable
/// state. Requests are numbered; only events from the newest generation are surfaced, which
/// makes a fresh request invalidate every earlier result even if that worker is still
/// running.
pub struct ConversionEngine {
    events_tx: Sender<ConversionEvent>,
    events_rx: Mutex<Receiver<ConversionEvent>>,
    generation: Arc<AtomicU64>,
    original: Option<Arc<AudioBuffer>>,
    processed: Option<Arc<AudioBuffer>>,
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionEngine {
    pub fn new() -> Self {
        let (events_tx, events_rx) = std::sync::mpsc::channel();

        Self {
            events_tx,
            events_rx: Mutex::new(events_rx),
            generation: Arc::new(AtomicU64::new(0)),
            original: None,
            processed: None,
        }
    }

    /// Decode `path` and make it the new source.
    pub fn load_sample(&mut self, path: &Path) -> Result<&AudioBuffer, EngineError> {
        let buffer = decode_audio_file(path)?;
        Ok(self.set_original(buffer))
    }

    /// Replace the source. Any pending or finished result for the old source is discarded.
    pub fn set_original(&mut self, buffer: AudioBuffer) -> &AudioBuffer {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.processed = None;
        self.original.insert(Arc::new(buffer))
    }

    /// The unmodified source, for A/B comparison.
    pub fn original(&self) -> Option<&AudioBuffer> {
        self.original.as_deref()
    }

    /// The most recent successful conversion of the current source.
    pub fn processed(&self) -> Option<&AudioBuffer> {
        self.processed.as_deref()
    }

    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Resolve console settings and start a conversion.
    pub fn request_console_conversion(
        &self,
        settings: &ConsoleSettings,
    ) -> Result<u64, EngineError> {
        let params = settings.resolve()?;
        self.request_conversion(params)
    }

    /// Start converting the source on a background thread.
    ///
    /// Parameters are validated before the worker starts, so numeric errors surface here
    /// synchronously. Returns the generation of the new request.
    pub fn request_conversion(&self, params: EmulationParameters) -> Result<u64, EngineError> {
        let original = self.original.clone().ok_or(EngineError::NoSource)?;
        params.validate()?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let tx = self.events_tx.clone();
        let latest = Arc::clone(&self.generation);

        thread::spawn(move || {
            let _ = tx.send(ConversionEvent::Started { generation });

            let mut progress = ProgressReporter::new(generation, tx.clone());
            let result =
                convert_with_progress(&original, &params, |update| progress.emit(update));

            match result {
                Ok(buffer) => {
                    if latest.load(Ordering::SeqCst) != generation {
                        log::debug!("Conversion {generation} finished after being superseded");
                    }
                    progress.emit(ConversionProgress {
                        stage: ConversionStage::Publishing,
                        percent: 1.0,
                    });
                    let _ = tx.send(ConversionEvent::Success {
                        generation,
                        duration_sec: buffer.duration_sec(),
                        buffer: Arc::new(buffer),
                    });
                }
                Err(err) => {
                    log::warn!("Conversion {generation} failed: {err}");
                    let _ = tx.send(ConversionEvent::Error {
                        generation,
                        error: err.to_string(),
                    });
                }
            }
        });

        Ok(generation)
    }

    /// Poll for the next event of the latest generation.
    ///
    /// Returns `None` when no events are available. Stale events are dropped.
    pub fn poll_event(&mut self) -> Option<ConversionEvent> {
        loop {
            let event = {
                let rx = self
                    .events_rx
                    .get_mut()
                    .unwrap_or_else(PoisonError::into_inner);
                match rx.try_recv() {
                    Ok(event) => event,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
                }
            };

            if let Some(event) = self.accept(event) {
                return Some(event);
            }
        }
    }

    /// Block until the latest generation succeeds or fails, or `timeout` elapses.
    ///
    /// Non-terminal events received meanwhile are consumed.
    pub fn wait_for_result(&mut self, timeout: Duration) -> Option<ConversionEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let event = {
                let rx = self
                    .events_rx
                    .get_mut()
                    .unwrap_or_else(PoisonError::into_inner);
                match rx.recv_timeout(remaining) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                        return None;
                    }
                }
            };

            if let Some(event) = self.accept(event) {
                if event.is_terminal() {
                    return Some(event);
                }
            }
        }
    }

    /// Write the latest result to a WAV file.
    pub fn export_processed(&self, path: &Path, format: WavFormat) -> Result<(), EngineError> {
        let processed = self.processed.as_deref().ok_or(EngineError::NoResult)?;
        write_wav(path, processed, format)?;
        Ok(())
    }

    fn accept(&mut self, event: ConversionEvent) -> Option<ConversionEvent> {
        if event.generation() != self.latest_generation() {
            log::debug!("Dropping stale event from conversion {}", event.generation());
            return None;
        }

        if let ConversionEvent::Success { buffer, .. } = &event {
            self.processed = Some(Arc::clone(buffer));
        }
        Some(event)
    }
}
