//! phonoscope - pronunciation analysis
//!
//! Transcribes a spoken recording, converts the expected sentence to
//! ARPAbet phonemes, aligns them against the audio and extracts MFCC
//! features per phoneme. A streaming word aligner and learner feedback
//! generation sit alongside the main pipeline.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod align;
pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod features;
pub mod feedback;
pub mod phoneme;
pub mod pipeline;
pub mod registry;
pub mod stt;

// Capabilities
pub use align::{RecognizerModel, StreamingRecognizer};
pub use phoneme::GraphemeToPhoneme;
pub use stt::Transcriber;

// Stages
pub use align::WordAligner;
pub use audio::{AudioInput, AudioPreprocessor, AudioSample};
pub use features::FeatureExtractor;
pub use phoneme::PhonemeAligner;
pub use pipeline::{PipelineOrchestrator, PipelineOutcome, PipelineReport, PipelineResult};
pub use registry::EngineRegistry;

// Error handling
pub use error::{ErrorKind, PhonoscopeError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
