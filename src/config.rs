use crate::defaults;
use crate::error::{PhonoscopeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub stt: SttConfig,
    pub g2p: G2pConfig,
    pub features: FeatureConfig,
    pub word_alignment: WordAlignmentConfig,
}

/// Audio preprocessing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub top_db: f32,
    pub trim_frame_length: usize,
    pub trim_hop_length: usize,
    pub preemphasis: f32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    pub model_path: PathBuf,
    pub language: String,
    pub threads: Option<usize>,
}

/// Grapheme-to-phoneme configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct G2pConfig {
    pub lexicon_path: PathBuf,
    pub lexicon_url: String,
    pub auto_download: bool,
}

/// Per-phoneme feature extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    pub n_mfcc: usize,
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mels: usize,
    pub min_samples: usize,
}

/// Streaming word alignment configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WordAlignmentConfig {
    pub model_path: PathBuf,
    pub chunk_frames: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            top_db: defaults::TRIM_TOP_DB,
            trim_frame_length: defaults::TRIM_FRAME_LENGTH,
            trim_hop_length: defaults::TRIM_HOP_LENGTH,
            preemphasis: defaults::PREEMPHASIS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(defaults::DEFAULT_STT_MODEL),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
        }
    }
}

impl Default for G2pConfig {
    fn default() -> Self {
        Self {
            lexicon_path: crate::phoneme::lexicon::default_lexicon_path(),
            lexicon_url: defaults::LEXICON_URL.to_string(),
            auto_download: true,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            n_mfcc: defaults::N_MFCC,
            n_fft: defaults::MFCC_N_FFT,
            hop_length: defaults::MFCC_HOP_LENGTH,
            n_mels: defaults::N_MELS,
            min_samples: defaults::MFCC_MIN_SAMPLES,
        }
    }
}

impl Default for WordAlignmentConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(defaults::DEFAULT_VOSK_MODEL),
            chunk_frames: defaults::ALIGN_CHUNK_FRAMES,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns `ConfigFileNotFound` for a missing file and `Config` for
    /// invalid TOML. Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PhonoscopeError::ConfigFileNotFound {
                path: path.display().to_string(),
            },
            _ => PhonoscopeError::Io(e),
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(PhonoscopeError::ConfigFileNotFound { .. }) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PHONOSCOPE_STT_MODEL → stt.model_path
    /// - PHONOSCOPE_LANGUAGE → stt.language
    /// - PHONOSCOPE_LEXICON → g2p.lexicon_path
    /// - PHONOSCOPE_VOSK_MODEL → word_alignment.model_path
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("PHONOSCOPE_STT_MODEL")
            && !model.is_empty()
        {
            self.stt.model_path = PathBuf::from(model);
        }

        if let Ok(language) = std::env::var("PHONOSCOPE_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }

        if let Ok(lexicon) = std::env::var("PHONOSCOPE_LEXICON")
            && !lexicon.is_empty()
        {
            self.g2p.lexicon_path = PathBuf::from(lexicon);
        }

        if let Ok(model) = std::env::var("PHONOSCOPE_VOSK_MODEL")
            && !model.is_empty()
        {
            self.word_alignment.model_path = PathBuf::from(model);
        }

        self
    }

    /// Reject values the processing stages cannot work with.
    pub fn validate(&self) -> Result<()> {
        fn invalid(key: &str, message: &str) -> PhonoscopeError {
            PhonoscopeError::ConfigInvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            }
        }

        if self.audio.sample_rate == 0 {
            return Err(invalid("audio.sample_rate", "must be positive"));
        }
        if self.audio.trim_frame_length == 0 || self.audio.trim_hop_length == 0 {
            return Err(invalid("audio.trim_frame_length", "frame and hop must be positive"));
        }
        if self.audio.trim_hop_length > self.audio.trim_frame_length {
            return Err(invalid("audio.trim_hop_length", "must not exceed the frame length"));
        }
        if !(0.0..1.0).contains(&self.audio.preemphasis) {
            return Err(invalid("audio.preemphasis", "must be in [0, 1)"));
        }
        if !(self.audio.top_db > 0.0) {
            return Err(invalid("audio.top_db", "must be positive"));
        }
        if self.features.n_fft == 0 || self.features.hop_length == 0 {
            return Err(invalid("features.n_fft", "fft size and hop must be positive"));
        }
        if self.features.n_mfcc == 0 || self.features.n_mfcc > self.features.n_mels {
            return Err(invalid("features.n_mfcc", "must be between 1 and n_mels"));
        }
        if self.word_alignment.chunk_frames == 0 {
            return Err(invalid("word_alignment.chunk_frames", "must be positive"));
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/phonoscope/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("phonoscope")
            .join("config.toml")
    }
}
