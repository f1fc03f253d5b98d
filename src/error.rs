//! Error types for phonoscope.

use serde::Serialize;
use thiserror::Error;

/// Boxed underlying cause carried by stage errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PhonoscopeError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio preprocessing errors
    #[error("Audio preprocessing failed: {message}")]
    Preprocessing {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    // Transcription errors
    #[error("Transcription model not found at {path}")]
    TranscriptionModelNotFound { path: String },

    #[error("Transcription failed: {message}")]
    Transcription {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    // Grapheme-to-phoneme errors
    #[error("Phoneme conversion failed: {message}")]
    Conversion {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    // Feature extraction errors
    #[error("Feature extraction failed: {message}")]
    FeatureExtraction { message: String },

    // Word alignment errors
    #[error(transparent)]
    Stream(#[from] hound::Error),

    #[error("Recognizer model not found at {path}")]
    RecognizerModelNotFound { path: String },

    #[error("Recognition failed: {message}")]
    Recognition { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl PhonoscopeError {
    pub fn preprocessing(message: impl Into<String>) -> Self {
        Self::Preprocessing {
            message: message.into(),
            source: None,
        }
    }

    pub fn preprocessing_caused_by(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Preprocessing {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn transcription(message: impl Into<String>) -> Self {
        Self::Transcription {
            message: message.into(),
            source: None,
        }
    }

    pub fn transcription_caused_by(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Transcription {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
            source: None,
        }
    }

    pub fn conversion_caused_by(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Conversion {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Stage this error belongs to, as reported at the pipeline boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigFileNotFound { .. }
            | Self::ConfigInvalidValue { .. }
            | Self::Config(_) => ErrorKind::Config,
            Self::Preprocessing { .. } => ErrorKind::Preprocessing,
            Self::TranscriptionModelNotFound { .. } | Self::Transcription { .. } => {
                ErrorKind::Transcription
            }
            Self::Conversion { .. } => ErrorKind::Conversion,
            Self::FeatureExtraction { .. } => ErrorKind::FeatureExtraction,
            Self::Stream(_) => ErrorKind::Stream,
            Self::RecognizerModelNotFound { .. } | Self::Recognition { .. } => {
                ErrorKind::Recognition
            }
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Display message followed by every `source()` in the chain.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

/// Flat classification of failures, used where errors become data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Preprocessing,
    Transcription,
    Conversion,
    FeatureExtraction,
    Stream,
    Recognition,
    Io,
    Other,
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PhonoscopeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = PhonoscopeError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = PhonoscopeError::ConfigInvalidValue {
            key: "audio.sample_rate".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for audio.sample_rate: must be positive"
        );
    }

    #[test]
    fn test_preprocessing_display() {
        let error = PhonoscopeError::preprocessing("audio is empty after trimming");
        assert_eq!(
            error.to_string(),
            "Audio preprocessing failed: audio is empty after trimming"
        );
        assert_eq!(error.kind(), ErrorKind::Preprocessing);
    }

    #[test]
    fn test_transcription_keeps_source() {
        let cause = io::Error::new(io::ErrorKind::OutOfMemory, "out of memory");
        let error = PhonoscopeError::transcription_caused_by("whisper inference failed", cause);

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
        assert_eq!(
            error.chain_message(),
            "Transcription failed: whisper inference failed: out of memory"
        );
        assert_eq!(error.kind(), ErrorKind::Transcription);
    }

    #[test]
    fn test_conversion_without_source() {
        let error = PhonoscopeError::conversion("lexicon missing");
        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_none());
        assert_eq!(error.chain_message(), "Phoneme conversion failed: lexicon missing");
    }

    #[test]
    fn test_feature_extraction_kind() {
        let error = PhonoscopeError::FeatureExtraction {
            message: "non-finite coefficient".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::FeatureExtraction);
    }

    #[test]
    fn test_stream_error_is_transparent() {
        let error: PhonoscopeError = hound::Error::FormatError("no RIFF tag found").into();
        assert_eq!(
            error.to_string(),
            hound::Error::FormatError("no RIFF tag found").to_string()
        );
        assert!(error.to_string().contains("no RIFF tag found"));
        assert_eq!(error.kind(), ErrorKind::Stream);
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: PhonoscopeError = io_error.into();
        assert!(error.to_string().contains("file not found"));
        assert_eq!(error.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: PhonoscopeError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
        assert_eq!(error.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::FeatureExtraction).unwrap();
        assert_eq!(json, "\"feature_extraction\"");
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<PhonoscopeError>();
        assert_sync::<PhonoscopeError>();
    }
}
