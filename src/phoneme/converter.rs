//! Text to phoneme sequence stage.

use crate::defaults::PUNCTUATION_SYMBOLS;
use crate::error::{PhonoscopeError, Result};
use crate::phoneme::g2p::GraphemeToPhoneme;
use std::time::Instant;

/// Convert `text` with `engine` and drop whitespace and punctuation tokens.
///
/// Only the symbols in [`PUNCTUATION_SYMBOLS`] are removed; anything else the
/// engine emits is passed through. Engine failures come back as
/// [`PhonoscopeError::Conversion`].
pub fn to_phonemes(engine: &dyn GraphemeToPhoneme, text: &str) -> Result<Vec<String>> {
    let started = Instant::now();

    let symbols = engine.phonemize(text).map_err(|e| match e {
        PhonoscopeError::Conversion { .. } => e,
        other => PhonoscopeError::conversion_caused_by(
            format!("{} engine failed on {:?}", engine.name(), text),
            other,
        ),
    })?;

    let phonemes = filter_symbols(symbols);
    tracing::debug!(
        engine = engine.name(),
        phonemes = phonemes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "converted text to phonemes"
    );
    Ok(phonemes)
}

/// Remove whitespace and punctuation symbols from an engine's output.
pub fn filter_symbols(symbols: Vec<String>) -> Vec<String> {
    symbols
        .into_iter()
        .filter(|s| !PUNCTUATION_SYMBOLS.contains(&s.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phoneme::g2p::{LexiconG2p, MockG2p};
    use crate::phoneme::lexicon::Lexicon;

    #[test]
    fn cat_sat_yields_six_phonemes() {
        let engine = LexiconG2p::new(Lexicon::parse("cat K AE1 T\nsat S AE1 T\n"));

        let phonemes = to_phonemes(&engine, "cat sat").unwrap();

        assert_eq!(phonemes, ["K", "AE1", "T", "S", "AE1", "T"]);
    }

    #[test]
    fn filters_exactly_the_punctuation_set() {
        let symbols = [" ", ",", ".", "!", "?", ";", ":", "-", "'", "AH0"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(filter_symbols(symbols), ["-", "'", "AH0"]);
    }

    #[test]
    fn engine_failure_is_conversion_error() {
        let result = to_phonemes(&MockG2p::new().with_failure(), "hello");
        assert!(matches!(result, Err(PhonoscopeError::Conversion { .. })));
    }

    #[test]
    fn empty_text_gives_empty_sequence() {
        assert!(to_phonemes(&MockG2p::new(), "").unwrap().is_empty());
    }
}
