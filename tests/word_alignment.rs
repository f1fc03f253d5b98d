//! Streaming word alignment over WAV files on disk.

use phonoscope::align::{MockModel, WordAligner, WordBatch, WordTimestamp};
use phonoscope::error::PhonoscopeError;
use std::path::Path;

fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let sample = (((i as f32) * 0.05).sin() * 8000.0) as i16;
        for _ in 0..channels {
            writer.write_sample(sample).unwrap();
        }
    }
    writer.finalize().unwrap();
}

#[test]
fn two_chunks_with_one_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello.wav");
    write_wav(&path, 16000, 1, 8000);

    let hello = WordBatch::from_words(vec![WordTimestamp::new("hello", 0.1, 0.5)]);
    let model = MockModel::new().with_boundary(1, hello.clone());
    let aligner = WordAligner::new(model, 4000);

    let batches = aligner.align(&path).unwrap();

    assert_eq!(batches, vec![hello, WordBatch::default()]);
    let words = WordAligner::<MockModel>::words(&batches);
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].start, 0.1);
    assert_eq!(words[0].end, 0.5);
}

#[test]
fn batches_serialize_like_recognizer_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two.wav");
    write_wav(&path, 16000, 1, 12000);

    let model = MockModel::new()
        .with_boundary(1, WordBatch::from_words(vec![WordTimestamp::new("good", 0.0, 0.3)]))
        .with_final(WordBatch::from_words(vec![WordTimestamp::new("night", 0.4, 0.7)]));
    let batches = WordAligner::new(model, 4000).align(&path).unwrap();

    let lines: Vec<String> = batches
        .iter()
        .map(|b| serde_json::to_string(b).unwrap())
        .collect();
    assert_eq!(
        lines,
        [
            r#"{"result":[{"word":"good","start":0.0,"end":0.3}],"text":"good"}"#,
            r#"{"result":[{"word":"night","start":0.4,"end":0.7}],"text":"night"}"#,
        ]
    );
}

#[test]
fn stereo_file_is_fed_as_mono_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    write_wav(&path, 8000, 2, 5000);

    let model = MockModel::new().with_boundary(1, WordBatch::default());
    let batches = WordAligner::new(model.clone(), 4000).align(&path).unwrap();

    // boundary on the second (1000-frame) chunk, then the final flush
    assert_eq!(batches.len(), 2);
    assert_eq!(model.last_sample_rate(), 8000);
}

#[test]
fn unreadable_file_propagates_stream_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, b"definitely not RIFF").unwrap();

    let result = WordAligner::with_model(MockModel::new()).align(&path);

    assert!(matches!(result, Err(PhonoscopeError::Stream(_))));
}

#[cfg(feature = "vosk")]
#[test]
fn vosk_model_aligns_real_audio() {
    use phonoscope::config::Config;

    let config = Config::default().with_env_overrides();
    let model_path = &config.word_alignment.model_path;
    let Some(audio) = std::env::var_os("PHONOSCOPE_TEST_AUDIO") else {
        eprintln!("PHONOSCOPE_TEST_AUDIO not set, skipping vosk alignment test");
        return;
    };
    if !model_path.exists() {
        eprintln!(
            "Vosk model not found at {}, skipping vosk alignment test",
            model_path.display()
        );
        return;
    }

    let aligner = WordAligner::from_config(&config.word_alignment).unwrap();
    let batches = aligner.align(&audio).unwrap();

    assert!(!batches.is_empty());
    for word in WordAligner::<phonoscope::align::VoskModel>::words(&batches) {
        assert!(word.start <= word.end, "{word:?}");
    }
}
