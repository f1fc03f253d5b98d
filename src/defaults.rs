//! Default configuration constants for phonoscope.
//!
//! Shared between the configuration types and the processing stages so the
//! numbers live in one place.

/// Target sample rate in Hz for every stage after decoding.
///
/// Whisper and the recognizers are trained on 16kHz speech.
pub const SAMPLE_RATE: u32 = 16000;

/// Silence threshold for trimming, in dB below the loudest frame.
pub const TRIM_TOP_DB: f32 = 20.0;

/// Analysis frame length for silence trimming, in samples.
pub const TRIM_FRAME_LENGTH: usize = 2048;

/// Hop between trimming frames, in samples.
pub const TRIM_HOP_LENGTH: usize = 512;

/// First-order pre-emphasis coefficient.
pub const PREEMPHASIS: f32 = 0.97;

/// Number of cepstral coefficients per phoneme.
pub const N_MFCC: usize = 13;

/// FFT size for per-phoneme features.
pub const MFCC_N_FFT: usize = 512;

/// Segments shorter than this are zero-padded on the right before analysis.
pub const MFCC_MIN_SAMPLES: usize = 512;

/// Hop between feature frames, in samples.
pub const MFCC_HOP_LENGTH: usize = 256;

/// Mel bands feeding the DCT.
pub const N_MELS: usize = 128;

/// Power floor before log compression.
pub const POWER_FLOOR: f32 = 1e-10;

/// Dynamic range kept by the dB conversion of the mel spectrogram.
pub const TOP_DB_CLAMP: f32 = 80.0;

/// Frames fed to the word recognizer per chunk.
pub const ALIGN_CHUNK_FRAMES: usize = 4000;

/// Default Whisper model location.
pub const DEFAULT_STT_MODEL: &str = "models/ggml-base.en.bin";

/// Default language code for transcription.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default Vosk model directory for word alignment.
pub const DEFAULT_VOSK_MODEL: &str = "models/vosk-en";

/// Default CMU pronouncing dictionary file name.
pub const LEXICON_FILE_NAME: &str = "cmudict.dict";

/// Where the CMU pronouncing dictionary is fetched from on first use.
pub const LEXICON_URL: &str =
    "https://raw.githubusercontent.com/cmusphinx/cmudict/master/cmudict.dict";

/// Symbols dropped from a G2P result before alignment.
pub const PUNCTUATION_SYMBOLS: [&str; 7] = [" ", ",", ".", "!", "?", ";", ":"];

/// Phoneme descriptions used by the feedback command when none is given.
pub const DEFAULT_PHONEME_CATALOG: &str = "data/phoneme_mapping.json";
