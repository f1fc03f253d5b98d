//! Uniform phoneme alignment.
//!
//! Every phoneme gets an equal share of the recording. This is a time
//! division, not acoustic alignment: boundaries do not follow the speech.

use crate::audio::AudioSample;
use serde::Serialize;

/// One phoneme mapped onto a span of the recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhonemeAlignment {
    pub phoneme: String,
    /// Start of the span in seconds (inclusive).
    pub start_time: f64,
    /// End of the span in seconds (exclusive).
    pub end_time: f64,
    #[serde(skip)]
    pub samples: Vec<f32>,
    #[serde(skip)]
    pub sample_rate: u32,
    /// Feature vector, filled in by the pipeline after extraction.
    pub features: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhonemeAligner;

impl PhonemeAligner {
    pub fn new() -> Self {
        Self
    }

    /// Split `audio` into `phonemes.len()` equal spans, in order.
    ///
    /// Span `i` covers `[i*D/N, (i+1)*D/N)` seconds and samples
    /// `floor(i*D/N*rate)..floor((i+1)*D/N*rate)`. An empty sequence gives an
    /// empty result.
    pub fn align(&self, audio: &AudioSample, phonemes: &[String]) -> Vec<PhonemeAlignment> {
        if phonemes.is_empty() {
            return Vec::new();
        }

        let rate = audio.sample_rate as f64;
        let len = audio.len();
        let per_phoneme = audio.duration_secs() / phonemes.len() as f64;

        let alignments: Vec<PhonemeAlignment> = phonemes
            .iter()
            .enumerate()
            .map(|(i, phoneme)| {
                let start_time = i as f64 * per_phoneme;
                let end_time = (i + 1) as f64 * per_phoneme;

                let start_sample = ((start_time * rate).floor() as usize).min(len);
                let end_sample = ((end_time * rate).floor() as usize).clamp(start_sample, len);

                PhonemeAlignment {
                    phoneme: phoneme.clone(),
                    start_time,
                    end_time,
                    samples: audio.samples[start_sample..end_sample].to_vec(),
                    sample_rate: audio.sample_rate,
                    features: None,
                }
            })
            .collect();

        tracing::debug!(
            phonemes = alignments.len(),
            seconds_each = per_phoneme,
            "aligned phonemes uniformly"
        );
        alignments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phonemes(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn six_phonemes_over_1_2_seconds() {
        let audio = AudioSample::new(vec![0.1; 19200], 16000);
        let result = PhonemeAligner::new().align(&audio, &phonemes(&["K", "AE1", "T", "S", "AE1", "T"]));

        assert_eq!(result.len(), 6);
        for (i, alignment) in result.iter().enumerate() {
            assert!((alignment.start_time - 0.2 * i as f64).abs() < 1e-9);
            assert!((alignment.end_time - 0.2 * (i + 1) as f64).abs() < 1e-9);
            assert!((alignment.samples.len() as i64 - 3200).abs() <= 1);
            assert_eq!(alignment.sample_rate, 16000);
            assert!(alignment.features.is_none());
        }
        assert!((result[5].end_time - 1.2).abs() < 1e-9);
    }

    #[test]
    fn spans_are_contiguous_and_cover_the_audio() {
        let audio = AudioSample::new(vec![0.0; 16037], 16000);
        let result = PhonemeAligner::new().align(&audio, &phonemes(&["A", "B", "C", "D", "E", "F", "G"]));

        assert_eq!(result.len(), 7);
        assert_eq!(result[0].start_time, 0.0);
        for pair in result.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
            assert!(pair[0].start_time <= pair[1].start_time);
        }
        let last_end = result[6].end_time;
        assert!((last_end - audio.duration_secs()).abs() < 1.0 / 16000.0);

        let total: usize = result.iter().map(|a| a.samples.len()).sum();
        assert!((total as i64 - 16037).abs() <= 1);
    }

    #[test]
    fn boundaries_truncate_rather_than_round() {
        // 10 samples at 10 Hz split three ways: boundaries at 3.33 and 6.67 samples.
        let audio = AudioSample::new((0..10).map(|i| i as f32).collect(), 10);
        let result = PhonemeAligner::new().align(&audio, &phonemes(&["A", "B", "C"]));

        assert_eq!(result[0].samples, vec![0.0, 1.0, 2.0]);
        assert_eq!(result[1].samples, vec![3.0, 4.0, 5.0]);
        assert_eq!(result[2].samples.first(), Some(&6.0));
    }

    #[test]
    fn empty_sequence_gives_empty_result() {
        let audio = AudioSample::new(vec![0.5; 1600], 16000);
        assert!(PhonemeAligner::new().align(&audio, &[]).is_empty());
    }

    #[test]
    fn more_phonemes_than_samples() {
        let audio = AudioSample::new(vec![0.5; 3], 16000);
        let result = PhonemeAligner::new().align(&audio, &phonemes(&["A"; 5]));

        assert_eq!(result.len(), 5);
        let total: usize = result.iter().map(|a| a.samples.len()).sum();
        assert!(total <= 3);
    }

    #[test]
    fn serializes_times_and_features_only() {
        let audio = AudioSample::new(vec![0.5; 160], 16000);
        let mut result = PhonemeAligner::new().align(&audio, &phonemes(&["AH0"]));
        result[0].features = Some(vec![1.0, 2.0]);

        let json = serde_json::to_value(&result[0]).unwrap();
        assert_eq!(json["phoneme"], "AH0");
        assert_eq!(json["features"], serde_json::json!([1.0, 2.0]));
        assert!(json.get("samples").is_none());
    }
}
