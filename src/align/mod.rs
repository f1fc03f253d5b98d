//! Word-level alignment over a streaming recognizer.

pub mod recognizer;
pub mod vosk;
pub mod word_aligner;

pub use recognizer::{
    MockModel, MockRecognizer, RecognizerModel, StreamingRecognizer, WordBatch, WordTimestamp,
};
pub use vosk::{VoskModel, VoskRecognizer};
pub use word_aligner::WordAligner;
