//! Values produced by a pipeline run.

use crate::audio::AudioSample;
use crate::error::{ErrorKind, PhonoscopeError};
use crate::phoneme::PhonemeAlignment;
use serde::Serialize;
use std::fmt;

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    /// Preprocessed audio the alignment was computed on.
    pub audio: AudioSample,
    pub transcription: String,
    pub phonemes: Vec<String>,
    /// One entry per phoneme, each with its feature vector attached.
    pub alignments: Vec<PhonemeAlignment>,
    /// Seconds of preprocessed audio.
    pub audio_duration: f64,
}

/// Why a run failed. Partial results are not kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PipelineFailure {}

impl From<&PhonoscopeError> for PipelineFailure {
    fn from(error: &PhonoscopeError) -> Self {
        Self {
            kind: error.kind(),
            message: error.chain_message(),
        }
    }
}

/// Outcome of one [`PipelineOrchestrator::run`](super::PipelineOrchestrator::run).
pub type PipelineOutcome = std::result::Result<PipelineResult, PipelineFailure>;

/// Serializable summary handed to callers outside the crate.
///
/// Successful runs fill every field except `error`; failed runs carry only
/// `success`, `error` and `error_kind`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonemes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignments: Option<Vec<AlignmentReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentReport {
    pub phoneme: String,
    pub start_time: f64,
    pub end_time: f64,
    pub features: Vec<f32>,
}

impl From<&PhonemeAlignment> for AlignmentReport {
    fn from(alignment: &PhonemeAlignment) -> Self {
        Self {
            phoneme: alignment.phoneme.clone(),
            start_time: alignment.start_time,
            end_time: alignment.end_time,
            features: alignment.features.clone().unwrap_or_default(),
        }
    }
}

impl From<&PipelineOutcome> for PipelineReport {
    fn from(outcome: &PipelineOutcome) -> Self {
        match outcome {
            Ok(result) => Self {
                success: true,
                audio_duration: Some(result.audio_duration),
                transcription: Some(result.transcription.clone()),
                phonemes: Some(result.phonemes.clone()),
                alignments: Some(result.alignments.iter().map(AlignmentReport::from).collect()),
                error: None,
                error_kind: None,
            },
            Err(failure) => Self {
                success: false,
                audio_duration: None,
                transcription: None,
                phonemes: None,
                alignments: None,
                error: Some(failure.message.clone()),
                error_kind: Some(failure.kind),
            },
        }
    }
}

impl PipelineReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> PipelineResult {
        PipelineResult {
            audio: AudioSample::new(vec![0.0; 3200], 16000),
            transcription: "ah".to_string(),
            phonemes: vec!["AA1".to_string()],
            alignments: vec![PhonemeAlignment {
                phoneme: "AA1".to_string(),
                start_time: 0.0,
                end_time: 0.2,
                samples: vec![0.0; 3200],
                sample_rate: 16000,
                features: Some(vec![0.5; 13]),
            }],
            audio_duration: 0.2,
        }
    }

    #[test]
    fn success_report_has_boundary_fields() {
        let outcome: PipelineOutcome = Ok(sample_result());
        let json = serde_json::to_value(PipelineReport::from(&outcome)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["audio_duration"], 0.2);
        assert_eq!(json["transcription"], "ah");
        assert_eq!(json["phonemes"], serde_json::json!(["AA1"]));
        assert_eq!(json["alignments"][0]["phoneme"], "AA1");
        assert_eq!(json["alignments"][0]["end_time"], 0.2);
        assert_eq!(json["alignments"][0]["features"].as_array().unwrap().len(), 13);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_report_has_only_error() {
        let error = PhonoscopeError::preprocessing("audio is empty after trimming silence");
        let outcome: PipelineOutcome = Err(PipelineFailure::from(&error));
        let json = serde_json::to_value(PipelineReport::from(&outcome)).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(
            json["error"],
            "Audio preprocessing failed: audio is empty after trimming silence"
        );
        assert_eq!(json["error_kind"], "preprocessing");
        assert!(json.get("transcription").is_none());
        assert!(json.get("alignments").is_none());
    }

    #[test]
    fn failure_message_includes_cause_chain() {
        let cause = std::io::Error::other("decoder crashed");
        let error = PhonoscopeError::transcription_caused_by("whisper failed", cause);
        let failure = PipelineFailure::from(&error);

        assert_eq!(failure.kind, ErrorKind::Transcription);
        assert_eq!(failure.to_string(), "Transcription failed: whisper failed: decoder crashed");
    }
}
