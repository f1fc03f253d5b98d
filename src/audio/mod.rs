//! Audio decoding and preprocessing.

pub mod input;
pub mod preprocess;
pub mod sample;
pub mod wav;

pub use input::AudioInput;
pub use preprocess::AudioPreprocessor;
pub use sample::AudioSample;
