//! WAV decoding to mono f32 and chunked PCM reading.

use crate::audio::input::AudioInput;
use crate::audio::sample::AudioSample;
use crate::error::{PhonoscopeError, Result};
use hound::{SampleFormat, WavReader, WavSpec};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// Decode any [`AudioInput`] to mono samples at `target_rate`.
///
/// Channels are averaged; other rates are resampled by linear interpolation.
pub fn decode(input: AudioInput, target_rate: u32) -> Result<AudioSample> {
    let source = input.describe();
    let decoded = match input {
        AudioInput::FilePath(path) => WavReader::open(&path).map_err(|e| {
            PhonoscopeError::preprocessing_caused_by(
                format!("failed to open {}", path.display()),
                e,
            )
        })?,
        AudioInput::Bytes(bytes) => {
            return decode_reader(Cursor::new(bytes), target_rate, &source);
        }
        AudioInput::Stream(reader) => {
            return decode_reader(BufReader::new(reader), target_rate, &source);
        }
    };
    decode_wav(decoded, target_rate, &source)
}

fn decode_reader<R: Read>(reader: R, target_rate: u32, source: &str) -> Result<AudioSample> {
    let wav = WavReader::new(reader).map_err(|e| {
        PhonoscopeError::preprocessing_caused_by(format!("failed to parse WAV data {source}"), e)
    })?;
    decode_wav(wav, target_rate, source)
}

fn decode_wav<R: Read>(
    mut reader: WavReader<R>,
    target_rate: u32,
    source: &str,
) -> Result<AudioSample> {
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(PhonoscopeError::preprocessing(format!(
            "WAV data {source} declares zero channels"
        )));
    }

    let interleaved: Vec<f32> = normalized_samples(&mut reader)
        .collect::<hound::Result<_>>()
        .map_err(|e| {
            PhonoscopeError::preprocessing_caused_by(
                format!("failed to read WAV samples {source}"),
                e,
            )
        })?;

    let mono = downmix(&interleaved, spec.channels as usize);
    let samples = resample(&mono, spec.sample_rate, target_rate);

    tracing::debug!(
        source,
        channels = spec.channels,
        source_rate = spec.sample_rate,
        target_rate,
        samples = samples.len(),
        "decoded audio"
    );

    Ok(AudioSample::new(samples, target_rate))
}

/// Iterate samples of any PCM layout as f32 in [-1.0, 1.0].
fn normalized_samples<R: Read>(
    reader: &mut WavReader<R>,
) -> Box<dyn Iterator<Item = hound::Result<f32>> + '_> {
    let WavSpec {
        bits_per_sample,
        sample_format,
        ..
    } = reader.spec();

    match sample_format {
        SampleFormat::Float => Box::new(reader.samples::<f32>()),
        SampleFormat::Int => {
            let scale = (1_i64 << (bits_per_sample.saturating_sub(1))) as f32;
            if bits_per_sample <= 16 {
                Box::new(
                    reader
                        .samples::<i16>()
                        .map(move |s| s.map(|v| v as f32 / scale)),
                )
            } else {
                Box::new(
                    reader
                        .samples::<i32>()
                        .map(move |s| s.map(|v| v as f32 / scale)),
                )
            }
        }
    }
}

/// Average interleaved frames down to one channel.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;
    let last = samples.len() - 1;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(last);
            let fraction = source_pos - source_idx as f64;

            if source_idx >= last {
                samples[last]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as f32
            }
        })
        .collect()
}

/// Reads a WAV container in fixed-size frame chunks as mono 16-bit PCM.
///
/// Header and read failures surface unchanged as
/// [`PhonoscopeError::Stream`].
pub struct WavChunkReader<R: Read> {
    reader: WavReader<R>,
    frames_per_chunk: usize,
    channels: usize,
}

impl WavChunkReader<BufReader<File>> {
    /// Open a WAV file for chunked reading.
    pub fn open(path: impl AsRef<Path>, frames_per_chunk: usize) -> Result<Self> {
        let reader = WavReader::open(path)?;
        Ok(Self::from_wav(reader, frames_per_chunk))
    }
}

impl<R: Read> WavChunkReader<R> {
    /// Create from any reader.
    pub fn new(reader: R, frames_per_chunk: usize) -> Result<Self> {
        let reader = WavReader::new(reader)?;
        Ok(Self::from_wav(reader, frames_per_chunk))
    }

    fn from_wav(reader: WavReader<R>, frames_per_chunk: usize) -> Self {
        let channels = reader.spec().channels.max(1) as usize;
        Self {
            reader,
            frames_per_chunk: frames_per_chunk.max(1),
            channels,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.reader.spec().sample_rate
    }

    /// Next chunk of up to `frames_per_chunk` mono frames. Empty at end of stream.
    pub fn read_chunk(&mut self) -> Result<Vec<i16>> {
        let wanted = self.frames_per_chunk * self.channels;
        let interleaved: Vec<f32> = normalized_samples(&mut self.reader)
            .take(wanted)
            .collect::<hound::Result<_>>()?;

        Ok(downmix(&interleaved, self.channels)
            .into_iter()
            .map(to_pcm16)
            .collect())
    }
}

fn to_pcm16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
