//! Vosk backed recognizer.
//!
//! Real implementation when the `vosk` feature is enabled, otherwise a stub
//! that reports the missing backend.

use crate::align::recognizer::{RecognizerModel, StreamingRecognizer, WordBatch};
use crate::error::{PhonoscopeError, Result};
use std::path::{Path, PathBuf};

#[cfg(feature = "vosk")]
mod backend {
    use super::*;
    use crate::align::recognizer::WordTimestamp;
    use vosk::{CompleteResult, DecodingState, Model, Recognizer};

    /// Kaldi model directory loaded through libvosk.
    pub struct VoskModel {
        model: Model,
        path: PathBuf,
    }

    impl VoskModel {
        pub fn load(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            if !path.exists() {
                return Err(PhonoscopeError::RecognizerModelNotFound {
                    path: path.display().to_string(),
                });
            }

            let model = Model::new(path.to_string_lossy()).ok_or_else(|| {
                PhonoscopeError::Recognition {
                    message: format!("failed to load vosk model from {}", path.display()),
                }
            })?;
            tracing::info!(path = %path.display(), "loaded vosk model");

            Ok(Self {
                model,
                path: path.to_path_buf(),
            })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl std::fmt::Debug for VoskModel {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("VoskModel").field("path", &self.path).finish()
        }
    }

    impl RecognizerModel for VoskModel {
        type Recognizer = VoskRecognizer;

        fn recognizer(&self, sample_rate: u32) -> Result<VoskRecognizer> {
            let mut inner = Recognizer::new(&self.model, sample_rate as f32).ok_or_else(|| {
                PhonoscopeError::Recognition {
                    message: format!("failed to create recognizer at {sample_rate} Hz"),
                }
            })?;
            inner.set_words(true);
            Ok(VoskRecognizer { inner })
        }

        fn name(&self) -> &str {
            "vosk"
        }
    }

    pub struct VoskRecognizer {
        inner: Recognizer,
    }

    impl StreamingRecognizer for VoskRecognizer {
        fn accept_waveform(&mut self, pcm: &[i16]) -> Result<bool> {
            match self.inner.accept_waveform(pcm) {
                Ok(DecodingState::Finalized) => Ok(true),
                Ok(_) => Ok(false),
                Err(e) => Err(PhonoscopeError::Recognition {
                    message: format!("vosk rejected waveform: {e:?}"),
                }),
            }
        }

        fn result(&mut self) -> Result<WordBatch> {
            to_batch(self.inner.result())
        }

        fn final_result(&mut self) -> Result<WordBatch> {
            to_batch(self.inner.final_result())
        }
    }

    fn to_batch(result: CompleteResult<'_>) -> Result<WordBatch> {
        let single = result.single().ok_or_else(|| PhonoscopeError::Recognition {
            message: "recognizer returned alternatives instead of a single result".to_string(),
        })?;

        let words: Vec<WordTimestamp> = single
            .result
            .iter()
            .map(|w| WordTimestamp {
                word: w.word.to_string(),
                start: f64::from(w.start),
                end: f64::from(w.end),
                conf: Some(w.conf),
            })
            .collect();

        Ok(WordBatch {
            result: (!words.is_empty()).then_some(words),
            text: single.text.to_string(),
        })
    }
}

#[cfg(not(feature = "vosk"))]
mod backend {
    use super::*;

    /// Stub used when the crate is built without the `vosk` feature.
    #[derive(Debug)]
    pub struct VoskModel {
        path: PathBuf,
    }

    impl VoskModel {
        pub fn load(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            if !path.exists() {
                return Err(PhonoscopeError::RecognizerModelNotFound {
                    path: path.display().to_string(),
                });
            }
            Err(PhonoscopeError::Recognition {
                message: "word alignment requires the 'vosk' feature".to_string(),
            })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl RecognizerModel for VoskModel {
        type Recognizer = VoskRecognizer;

        fn recognizer(&self, _sample_rate: u32) -> Result<VoskRecognizer> {
            Err(PhonoscopeError::Recognition {
                message: "word alignment requires the 'vosk' feature".to_string(),
            })
        }

        fn name(&self) -> &str {
            "vosk"
        }
    }

    /// Never constructed without the backend.
    #[derive(Debug)]
    pub enum VoskRecognizer {}

    impl StreamingRecognizer for VoskRecognizer {
        fn accept_waveform(&mut self, _pcm: &[i16]) -> Result<bool> {
            match *self {}
        }

        fn result(&mut self) -> Result<WordBatch> {
            match *self {}
        }

        fn final_result(&mut self) -> Result<WordBatch> {
            match *self {}
        }
    }
}

pub use backend::{VoskModel, VoskRecognizer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_directory_is_reported() {
        let result = VoskModel::load("/nonexistent/phonoscope/vosk-en");
        assert!(matches!(
            result,
            Err(PhonoscopeError::RecognizerModelNotFound { .. })
        ));
    }

    #[cfg(not(feature = "vosk"))]
    #[test]
    fn stub_explains_missing_feature() {
        let dir = tempfile::tempdir().unwrap();
        let err = VoskModel::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("vosk"));
    }
}
