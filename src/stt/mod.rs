//! Speech-to-text stage.

pub mod transcriber;
pub mod whisper;

pub use transcriber::{MockTranscriber, Transcriber};
pub use whisper::{WhisperConfig, WhisperTranscriber};

use crate::audio::AudioSample;
use crate::audio::wav::resample;
use crate::error::{PhonoscopeError, Result};
use std::time::Instant;

/// Run `engine` over preprocessed audio and return the trimmed transcript.
///
/// Audio at a rate other than the engine's is resampled first. Engine
/// failures come back as [`PhonoscopeError::Transcription`] with the original
/// error kept as the source. An empty transcript is not an error.
pub fn transcribe(engine: &dyn Transcriber, audio: &AudioSample) -> Result<String> {
    let started = Instant::now();
    let engine_rate = engine.sample_rate();

    let text = if audio.sample_rate == engine_rate {
        engine.transcribe(&audio.samples)
    } else {
        let resampled = resample(&audio.samples, audio.sample_rate, engine_rate);
        engine.transcribe(&resampled)
    }
    .map_err(|e| match e {
        PhonoscopeError::Transcription { .. } | PhonoscopeError::TranscriptionModelNotFound { .. } => e,
        other => PhonoscopeError::transcription_caused_by(
            format!("{} engine failed", engine.model_name()),
            other,
        ),
    })?;

    let text = text.trim().to_string();
    tracing::debug!(
        model = engine.model_name(),
        chars = text.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "transcribed audio"
    );
    Ok(text)
}
