//! Streaming speech recognizer capability.
//!
//! A [`RecognizerModel`] is the expensive, loaded-once part; each alignment
//! asks it for a fresh [`StreamingRecognizer`] at the stream's sample rate.

use crate::error::{PhonoscopeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// One recognized word with its time span in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conf: Option<f32>,
}

impl WordTimestamp {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
            conf: None,
        }
    }
}

/// Words recognized for one utterance.
///
/// `result` is absent when nothing was recognized; that is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<WordTimestamp>>,
    #[serde(default)]
    pub text: String,
}

impl WordBatch {
    pub fn from_words(words: Vec<WordTimestamp>) -> Self {
        let text = words
            .iter()
            .map(|w| w.word.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            result: (!words.is_empty()).then_some(words),
            text,
        }
    }

    pub fn words(&self) -> &[WordTimestamp] {
        self.result.as_deref().unwrap_or_default()
    }
}

/// Loaded recognition model.
pub trait RecognizerModel {
    type Recognizer: StreamingRecognizer;

    /// New recognizer with word timings enabled.
    fn recognizer(&self, sample_rate: u32) -> Result<Self::Recognizer>;

    fn name(&self) -> &str;
}

/// Stateful recognizer fed with consecutive 16-bit mono chunks.
pub trait StreamingRecognizer {
    /// Feed one chunk. Returns `true` when an utterance boundary was reached
    /// and [`result`](Self::result) holds a completed batch.
    fn accept_waveform(&mut self, pcm: &[i16]) -> Result<bool>;

    /// Completed batch after a boundary.
    fn result(&mut self) -> Result<WordBatch>;

    /// Flush whatever is still buffered.
    fn final_result(&mut self) -> Result<WordBatch>;
}

/// Mock model for testing.
///
/// Chunks are numbered from zero per recognizer. A chunk registered with
/// [`with_boundary`](Self::with_boundary) reports a boundary and yields its
/// batch; every other chunk is absorbed silently.
#[derive(Debug, Clone, Default)]
pub struct MockModel {
    boundaries: HashMap<usize, WordBatch>,
    final_batch: WordBatch,
    fail_on_chunk: Option<usize>,
    recognizers_created: Arc<AtomicUsize>,
    last_sample_rate: Arc<AtomicU32>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a boundary after chunk `index` with `batch` as its result.
    pub fn with_boundary(mut self, index: usize, batch: WordBatch) -> Self {
        self.boundaries.insert(index, batch);
        self
    }

    /// Batch returned by `final_result`.
    pub fn with_final(mut self, batch: WordBatch) -> Self {
        self.final_batch = batch;
        self
    }

    /// Fail when chunk `index` is fed.
    pub fn with_failure_on(mut self, index: usize) -> Self {
        self.fail_on_chunk = Some(index);
        self
    }

    pub fn recognizers_created(&self) -> usize {
        self.recognizers_created.load(Ordering::SeqCst)
    }

    pub fn last_sample_rate(&self) -> u32 {
        self.last_sample_rate.load(Ordering::SeqCst)
    }
}

impl RecognizerModel for MockModel {
    type Recognizer = MockRecognizer;

    fn recognizer(&self, sample_rate: u32) -> Result<MockRecognizer> {
        self.recognizers_created.fetch_add(1, Ordering::SeqCst);
        self.last_sample_rate.store(sample_rate, Ordering::SeqCst);
        Ok(MockRecognizer {
            boundaries: self.boundaries.clone(),
            final_batch: self.final_batch.clone(),
            fail_on_chunk: self.fail_on_chunk,
            chunks_seen: 0,
            samples_seen: 0,
            pending: None,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[derive(Debug, Clone)]
pub struct MockRecognizer {
    boundaries: HashMap<usize, WordBatch>,
    final_batch: WordBatch,
    fail_on_chunk: Option<usize>,
    chunks_seen: usize,
    samples_seen: usize,
    pending: Option<WordBatch>,
}

impl MockRecognizer {
    pub fn chunks_seen(&self) -> usize {
        self.chunks_seen
    }

    pub fn samples_seen(&self) -> usize {
        self.samples_seen
    }
}

impl StreamingRecognizer for MockRecognizer {
    fn accept_waveform(&mut self, pcm: &[i16]) -> Result<bool> {
        let index = self.chunks_seen;
        self.chunks_seen += 1;
        self.samples_seen += pcm.len();

        if self.fail_on_chunk == Some(index) {
            return Err(PhonoscopeError::Recognition {
                message: format!("mock recognizer rejected chunk {index}"),
            });
        }

        match self.boundaries.get(&index) {
            Some(batch) => {
                self.pending = Some(batch.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn result(&mut self) -> Result<WordBatch> {
        Ok(self.pending.take().unwrap_or_default())
    }

    fn final_result(&mut self) -> Result<WordBatch> {
        Ok(self.final_batch.clone())
    }
}
