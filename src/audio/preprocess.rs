//! Loudness normalization, silence trimming and pre-emphasis.

use crate::audio::input::AudioInput;
use crate::audio::sample::{AudioSample, peak};
use crate::audio::wav;
use crate::config::AudioConfig;
use crate::error::{PhonoscopeError, Result};
use std::path::Path;
use std::time::Instant;

/// Power floor used when converting frame energy to decibels.
const ENERGY_FLOOR: f64 = 1e-10;

/// Turns raw recordings into the mono, trimmed, pre-emphasized signal the
/// later stages expect.
#[derive(Debug, Clone)]
pub struct AudioPreprocessor {
    config: AudioConfig,
}

impl Default for AudioPreprocessor {
    fn default() -> Self {
        Self::new(AudioConfig::default())
    }
}

impl AudioPreprocessor {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Decode, normalize, trim and pre-emphasize.
    ///
    /// Fails with [`PhonoscopeError::Preprocessing`] when the input cannot be
    /// decoded or nothing is left after trimming.
    pub fn process(&self, input: AudioInput) -> Result<AudioSample> {
        let start = Instant::now();
        let source = input.describe();

        let decoded = wav::decode(input, self.config.sample_rate)?;
        let decoded_len = decoded.len();
        let mut samples = decoded.samples;

        normalize(&mut samples);

        let range = trim_range(
            &samples,
            self.config.top_db,
            self.config.trim_frame_length,
            self.config.trim_hop_length,
        );
        let trimmed = &samples[range.clone()];
        if trimmed.is_empty() {
            return Err(PhonoscopeError::preprocessing(
                "audio is empty after trimming silence",
            ));
        }

        let emphasized = preemphasis(trimmed, self.config.preemphasis);

        tracing::debug!(
            source = %source,
            decoded = decoded_len,
            trimmed_start = range.start,
            trimmed_end = range.end,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "preprocessed audio"
        );

        Ok(AudioSample::new(emphasized, self.config.sample_rate))
    }

    /// Preprocess `input` and write the result as a 16-bit mono WAV file.
    pub fn process_to_file(&self, input: AudioInput, output: &Path) -> Result<AudioSample> {
        let audio = self.process(input)?;
        write_wav(&audio, output)?;
        Ok(audio)
    }
}

/// Scale so the loudest sample has magnitude 1.0. All-zero input is left alone.
pub fn normalize(samples: &mut [f32]) {
    let max = peak(samples);
    if max > 0.0 {
        for s in samples.iter_mut() {
            *s /= max;
        }
    }
}

/// Sample range that survives trimming leading and trailing silence.
///
/// Frames are centred (padded by `frame_length / 2` zeros on both sides) and
/// a frame is silent when its mean power is more than `top_db` below the
/// loudest frame. Input whose loudest frame has zero power is all silence
/// and yields an empty range.
pub fn trim_range(
    samples: &[f32],
    top_db: f32,
    frame_length: usize,
    hop_length: usize,
) -> std::ops::Range<usize> {
    if samples.is_empty() || frame_length == 0 || hop_length == 0 {
        return 0..0;
    }

    let energies = frame_energies(samples, frame_length, hop_length);
    let max_energy = energies.iter().copied().fold(0.0_f64, f64::max);
    if max_energy <= 0.0 {
        return 0..0;
    }

    let reference_db = 10.0 * max_energy.max(ENERGY_FLOOR).log10();
    let threshold = -(top_db as f64);
    let loud = |energy: &f64| 10.0 * energy.max(ENERGY_FLOOR).log10() - reference_db > threshold;

    let Some(first) = energies.iter().position(loud) else {
        return 0..0;
    };
    let last = energies.iter().rposition(loud).unwrap_or(first);

    let start = (first * hop_length).min(samples.len());
    let end = ((last + 1) * hop_length).min(samples.len());
    start..end
}

/// Mean power of each centred analysis frame.
fn frame_energies(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let pad = frame_length / 2;
    let padded_len = samples.len() + 2 * pad;
    if padded_len < frame_length {
        return Vec::new();
    }
    let n_frames = 1 + (padded_len - frame_length) / hop_length;

    // Prefix sums over the padded signal; padding contributes no energy.
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0.0_f64);
    let mut acc = 0.0_f64;
    for &s in samples {
        acc += (s as f64) * (s as f64);
        prefix.push(acc);
    }
    let sum_between = |padded_start: usize, padded_end: usize| {
        let lo = padded_start.saturating_sub(pad).min(samples.len());
        let hi = padded_end.saturating_sub(pad).min(samples.len());
        prefix[hi] - prefix[lo]
    };

    (0..n_frames)
        .map(|t| {
            let begin = t * hop_length;
            sum_between(begin, begin + frame_length) / frame_length as f64
        })
        .collect()
}

/// First-order high-pass `y[n] - coef * y[n-1]`.
///
/// The sample before the start is extrapolated as `2*y[0] - y[1]` so the
/// first output does not spike. When filtering pushes the peak above 1.0
/// the output is rescaled back into [-1.0, 1.0].
pub fn preemphasis(samples: &[f32], coef: f32) -> Vec<f32> {
    let Some(&first) = samples.first() else {
        return Vec::new();
    };
    let previous = match samples.get(1) {
        Some(&second) => 2.0 * first - second,
        None => first,
    };

    let mut out = Vec::with_capacity(samples.len());
    out.push(first - coef * previous);
    out.extend(samples.windows(2).map(|w| w[1] - coef * w[0]));

    let max = peak(&out);
    if max > 1.0 {
        for s in out.iter_mut() {
            *s /= max;
        }
    }
    out
}

fn write_wav(audio: &AudioSample, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wrap = |e: hound::Error| {
        PhonoscopeError::preprocessing_caused_by(
            format!("failed to write {}", path.display()),
            e,
        )
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(wrap)?;
    for &s in &audio.samples {
        let value = (s * i16::MAX as f32).round().clamp(i16::MIN as f32, i16::MAX as f32);
        writer.write_sample(value as i16).map_err(wrap)?;
    }
    writer.finalize().map_err(wrap)
}
