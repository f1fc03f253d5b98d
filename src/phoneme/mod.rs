//! Text to phonemes, and phonemes to time spans.

pub mod aligner;
pub mod converter;
pub mod g2p;
pub mod lexicon;

pub use aligner::{PhonemeAligner, PhonemeAlignment};
pub use converter::to_phonemes;
pub use g2p::{GraphemeToPhoneme, LexiconG2p, MockG2p};
pub use lexicon::Lexicon;
