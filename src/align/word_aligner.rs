//! Streaming word-level forced alignment.

use crate::align::recognizer::{RecognizerModel, StreamingRecognizer, WordBatch, WordTimestamp};
use crate::align::vosk::VoskModel;
use crate::audio::wav::WavChunkReader;
use crate::config::WordAlignmentConfig;
use crate::defaults;
use crate::error::Result;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

#[derive(Debug)]
enum AlignState {
    /// Feeding the next chunk.
    Reading,
    /// A chunk completed an utterance; its batch is appended next.
    Accumulating(WordBatch),
    /// Stream exhausted; the final result is still pending.
    Finalizing,
    Done,
}

/// Splits a WAV stream into fixed-size chunks, feeds them to a recognizer
/// and collects one [`WordBatch`] per utterance plus a final flush.
///
/// The model is loaded once and reused for every [`align`](Self::align).
#[derive(Debug)]
pub struct WordAligner<M: RecognizerModel> {
    model: M,
    chunk_frames: usize,
}

impl WordAligner<VoskModel> {
    /// Load the Vosk model named by `config`.
    pub fn from_config(config: &WordAlignmentConfig) -> Result<Self> {
        Ok(Self::new(VoskModel::load(&config.model_path)?, config.chunk_frames))
    }
}

impl<M: RecognizerModel> WordAligner<M> {
    pub fn new(model: M, chunk_frames: usize) -> Self {
        Self {
            model,
            chunk_frames: chunk_frames.max(1),
        }
    }

    pub fn with_model(model: M) -> Self {
        Self::new(model, defaults::ALIGN_CHUNK_FRAMES)
    }

    /// Align a WAV file. Failure to open it is returned unchanged as
    /// [`PhonoscopeError::Stream`](crate::PhonoscopeError::Stream).
    pub fn align(&self, path: impl AsRef<Path>) -> Result<Vec<WordBatch>> {
        let chunks = WavChunkReader::open(path, self.chunk_frames)?;
        self.run(chunks)
    }

    /// Align WAV data read from `reader`.
    pub fn align_reader<R: Read>(&self, reader: R) -> Result<Vec<WordBatch>> {
        let chunks = WavChunkReader::new(reader, self.chunk_frames)?;
        self.run(chunks)
    }

    /// All words across `batches`, in order.
    pub fn words(batches: &[WordBatch]) -> Vec<WordTimestamp> {
        batches.iter().flat_map(|b| b.words().iter().cloned()).collect()
    }

    fn run<R: Read>(&self, mut chunks: WavChunkReader<R>) -> Result<Vec<WordBatch>> {
        let started = Instant::now();
        let mut recognizer = self.model.recognizer(chunks.sample_rate())?;
        let mut batches = Vec::new();
        let mut chunk_count = 0usize;
        let mut state = AlignState::Reading;

        loop {
            state = match state {
                AlignState::Reading => {
                    let chunk = chunks.read_chunk()?;
                    if chunk.is_empty() {
                        AlignState::Finalizing
                    } else {
                        chunk_count += 1;
                        if recognizer.accept_waveform(&chunk)? {
                            AlignState::Accumulating(recognizer.result()?)
                        } else {
                            AlignState::Reading
                        }
                    }
                }
                AlignState::Accumulating(batch) => {
                    batches.push(batch);
                    AlignState::Reading
                }
                AlignState::Finalizing => {
                    batches.push(recognizer.final_result()?);
                    AlignState::Done
                }
                AlignState::Done => break,
            };
        }

        tracing::debug!(
            model = self.model.name(),
            chunks = chunk_count,
            batches = batches.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "aligned words"
        );
        Ok(batches)
    }
}
