//! Audio file loading and decoding functionality.
//!
//! This module decodes audio files into the mono [`AudioBuffer`] the emulation pipeline works
//! on. The file's own sample rate is kept as the buffer's native rate; no resampling happens
//! here.

use std::fs::File;
use std::path::Path;
use symphonia::core::{
    audio::SampleBuffer as SymphoniaSampleBuffer, codecs::DecoderOptions,
    errors::Error as SymphoniaError, formats::FormatOptions, io::MediaSourceStream,
    meta::MetadataOptions, probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};

use crate::audio_engine::channels::downmix_to_mono;
use crate::audio_engine::errors::SampleLoadError;
use crate::messages::AudioBuffer;

/// Decodes an audio file into a mono buffer at the file's sample rate.
///
/// # Parameters
///
/// - `path`: Path to the audio file to load
///
/// # Returns
///
/// - `Ok(AudioBuffer)`: Successfully decoded audio buffer
/// - `Err(SampleLoadError)`: Error encountered during loading or decoding
///
/// # Errors
///
/// This function may return errors for various conditions:
/// - File not found or cannot be opened
/// - Audio format not recognized or corrupted
/// - Missing sample rate or channel information
/// - Invalid or corrupt audio data
pub fn decode_audio_file(path: &Path) -> Result<AudioBuffer, SampleLoadError> {
    decode_audio_file_with_progress(path, |_| {})
}

/// Same as [`decode_audio_file`], reporting decode progress (0.0..=1.0) to `on_progress`.
///
/// Progress is derived from packet timestamps and is only reported when the container
/// declares its frame count.
pub fn decode_audio_file_with_progress<F>(
    path: &Path,
    mut on_progress: F,
) -> Result<AudioBuffer, SampleLoadError>
where
    F: FnMut(f32),
{
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or(SampleLoadError::NoDefaultTrack)?;
    let track_id = track.id;
    let file_rate_hz = track
        .codec_params
        .sample_rate
        .ok_or(SampleLoadError::MissingSampleRate)?;
    let file_channels = track
        .codec_params
        .channels
        .ok_or(SampleLoadError::MissingChannels)?
        .count();
    let total_frames = track.codec_params.n_frames;

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    on_progress(0.0);
    let mut decoded: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(SampleLoadError::Decode(err)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let audio_buf = decoder.decode(&packet)?;
        let spec = *audio_buf.spec();
        let duration = audio_buf.capacity() as u64;

        let mut sample_buf = SymphoniaSampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        decoded.extend_from_slice(sample_buf.samples());

        if let Some(total) = total_frames.filter(|&total| total > 0) {
            let done = packet.ts().saturating_add(packet.dur());
            on_progress((done as f64 / total as f64).min(1.0) as f32);
        }
    }
    on_progress(1.0);

    let mono = downmix_to_mono(decoded, file_channels)?;
    log::info!(
        "Decoded {} ({} ch@{} Hz, {} frames)",
        path.display(),
        file_channels,
        file_rate_hz,
        mono.len()
    );

    Ok(AudioBuffer::new(mono, file_rate_hz as f32))
}
