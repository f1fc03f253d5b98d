//! Shared, lazily loaded engines.
//!
//! Model loading is expensive, so each engine is built on first use and the
//! same instance is handed to every later caller. The registry is an ordinary
//! value: build one at start-up and pass it by reference.

use crate::config::Config;
use crate::error::{PhonoscopeError, Result};
use crate::phoneme::g2p::{GraphemeToPhoneme, LexiconG2p};
use crate::stt::transcriber::Transcriber;
use crate::stt::whisper::{WhisperConfig, WhisperTranscriber};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

type Loader<T> = Box<dyn Fn() -> Result<Arc<T>> + Send + Sync>;

/// An engine that is loaded on the first [`get`](Self::get).
///
/// The lock is held for the whole load, so concurrent first callers wait for
/// the winner and then share its instance. A failed load stores nothing.
pub struct LazyEngine<T: ?Sized> {
    name: &'static str,
    loader: Loader<T>,
    instance: Mutex<Option<Arc<T>>>,
}

impl<T: ?Sized> LazyEngine<T> {
    pub fn new(
        name: &'static str,
        loader: impl Fn() -> Result<Arc<T>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            loader: Box::new(loader),
            instance: Mutex::new(None),
        }
    }

    /// Engine that is already loaded.
    pub fn ready(name: &'static str, engine: Arc<T>) -> Self {
        Self {
            name,
            loader: Box::new(|| Err(PhonoscopeError::Other("engine already loaded".to_string()))),
            instance: Mutex::new(Some(engine)),
        }
    }

    /// Shared instance, loading it first if needed.
    ///
    /// A loader that panicked poisons the lock but never fills the slot, so
    /// the guard is recovered and the load is attempted again.
    pub fn get(&self) -> Result<Arc<T>> {
        let mut slot = self
            .instance
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let started = Instant::now();
        let engine = (self.loader)()?;
        tracing::info!(
            engine = self.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "engine loaded"
        );
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    pub fn is_loaded(&self) -> bool {
        self.instance
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl<T: ?Sized> std::fmt::Debug for LazyEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyEngine")
            .field("name", &self.name)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// The engines a pipeline run needs.
#[derive(Debug)]
pub struct EngineRegistry {
    transcriber: LazyEngine<dyn Transcriber>,
    g2p: LazyEngine<dyn GraphemeToPhoneme>,
}

impl EngineRegistry {
    /// Whisper transcription and dictionary G2P, both loaded on first use.
    pub fn from_config(config: &Config) -> Self {
        let whisper = WhisperConfig::from(&config.stt);
        let g2p = config.g2p.clone();

        Self {
            transcriber: LazyEngine::new("whisper", move || {
                let engine: Arc<dyn Transcriber> =
                    Arc::new(WhisperTranscriber::new(whisper.clone())?);
                Ok(engine)
            }),
            g2p: LazyEngine::new("g2p", move || {
                let engine: Arc<dyn GraphemeToPhoneme> =
                    Arc::new(LexiconG2p::from_config(&g2p)?);
                Ok(engine)
            }),
        }
    }

    /// Registry around engines that are already built.
    pub fn with_engines(
        transcriber: Arc<dyn Transcriber>,
        g2p: Arc<dyn GraphemeToPhoneme>,
    ) -> Self {
        Self {
            transcriber: LazyEngine::ready("transcriber", transcriber),
            g2p: LazyEngine::ready("g2p", g2p),
        }
    }

    /// Registry with custom loaders.
    pub fn with_loaders(
        transcriber: LazyEngine<dyn Transcriber>,
        g2p: LazyEngine<dyn GraphemeToPhoneme>,
    ) -> Self {
        Self { transcriber, g2p }
    }

    pub fn transcriber(&self) -> Result<Arc<dyn Transcriber>> {
        self.transcriber.get()
    }

    pub fn g2p(&self) -> Result<Arc<dyn GraphemeToPhoneme>> {
        self.g2p.get()
    }
}
