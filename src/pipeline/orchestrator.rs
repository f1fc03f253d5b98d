//! End-to-end pronunciation analysis for one recording.

use crate::audio::{AudioInput, AudioPreprocessor};
use crate::config::Config;
use crate::error::{ErrorKind, Result};
use crate::features::FeatureExtractor;
use crate::phoneme::{PhonemeAligner, to_phonemes};
use crate::pipeline::types::{PipelineFailure, PipelineOutcome, PipelineResult};
use crate::registry::EngineRegistry;
use crate::stt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Runs preprocessing, transcription, phoneme conversion, alignment and
/// feature extraction in order.
#[derive(Debug)]
pub struct PipelineOrchestrator {
    registry: Arc<EngineRegistry>,
    preprocessor: AudioPreprocessor,
    aligner: PhonemeAligner,
    extractor: FeatureExtractor,
}

impl PipelineOrchestrator {
    /// Build the stages from `config`. Engines come from `registry`.
    pub fn new(config: &Config, registry: Arc<EngineRegistry>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            preprocessor: AudioPreprocessor::new(config.audio.clone()),
            aligner: PhonemeAligner::new(),
            extractor: FeatureExtractor::new(config.features.clone(), config.audio.sample_rate)?,
        })
    }

    /// Analyse one recording.
    ///
    /// Phonemes come from `reference` when it has text, otherwise from the
    /// transcript. Every failure, including a panicking engine, is returned
    /// as a [`PipelineFailure`]; nothing escapes this call.
    pub fn run(&self, input: AudioInput, reference: Option<&str>) -> PipelineOutcome {
        let started = Instant::now();
        let source = input.describe();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.try_run(input, reference))) {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(error)) => Err(PipelineFailure::from(&error)),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| payload.downcast_ref::<String>().map(|s| s.as_str()))
                    .unwrap_or("unknown panic");
                Err(PipelineFailure {
                    kind: ErrorKind::Other,
                    message: format!("pipeline stage panicked: {message}"),
                })
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(result) => tracing::info!(
                source = %source,
                phonemes = result.phonemes.len(),
                duration = result.audio_duration,
                elapsed_ms,
                "pipeline finished"
            ),
            Err(failure) => tracing::warn!(
                source = %source,
                kind = ?failure.kind,
                error = %failure.message,
                elapsed_ms,
                "pipeline failed"
            ),
        }
        outcome
    }

    fn try_run(&self, input: AudioInput, reference: Option<&str>) -> Result<PipelineResult> {
        let audio = self.preprocessor.process(input)?;

        let transcriber = self.registry.transcriber()?;
        let transcription = stt::transcribe(transcriber.as_ref(), &audio)?;

        let text = match reference.map(str::trim) {
            Some(reference) if !reference.is_empty() => reference,
            _ => transcription.as_str(),
        };
        let g2p = self.registry.g2p()?;
        let phonemes = to_phonemes(g2p.as_ref(), text)?;

        let mut alignments = self.aligner.align(&audio, &phonemes);
        for alignment in &mut alignments {
            let features = self
                .extractor
                .extract(&alignment.samples, alignment.sample_rate)?;
            alignment.features = Some(features);
        }

        Ok(PipelineResult {
            audio_duration: audio.duration_secs(),
            audio,
            transcription,
            phonemes,
            alignments,
        })
    }
}
