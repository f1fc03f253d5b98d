//! Per-phoneme cepstral features.
//!
//! Mel-frequency cepstral coefficients averaged over time, computed the usual
//! way: centred STFT with a periodic Hann window, power spectrum, Slaney mel
//! filterbank, dB compression and an orthonormal DCT-II.

use crate::config::FeatureConfig;
use crate::defaults;
use crate::error::{PhonoscopeError, Result};
use ndarray::{Array1, Array2, Axis};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Computes a fixed-length feature vector for an audio segment.
pub struct FeatureExtractor {
    config: FeatureConfig,
    sample_rate: u32,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    filterbank: Array2<f64>,
    dct: Array2<f64>,
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("config", &self.config)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl FeatureExtractor {
    /// Plan the FFT and build the filterbank for `sample_rate`.
    pub fn new(config: FeatureConfig, sample_rate: u32) -> Result<Self> {
        if config.n_fft == 0 || config.hop_length == 0 || config.n_mels == 0 {
            return Err(PhonoscopeError::FeatureExtraction {
                message: "n_fft, hop_length and n_mels must be positive".to_string(),
            });
        }
        if config.n_mfcc == 0 || config.n_mfcc > config.n_mels {
            return Err(PhonoscopeError::FeatureExtraction {
                message: format!(
                    "n_mfcc must be between 1 and n_mels ({}), got {}",
                    config.n_mels, config.n_mfcc
                ),
            });
        }
        if sample_rate == 0 {
            return Err(PhonoscopeError::FeatureExtraction {
                message: "sample rate must be positive".to_string(),
            });
        }

        let fft = FftPlanner::<f64>::new().plan_fft_forward(config.n_fft);
        let window = hann_window(config.n_fft);
        let filterbank = mel_filterbank(sample_rate, config.n_fft, config.n_mels);
        let dct = dct_matrix(config.n_mfcc, config.n_mels);

        Ok(Self {
            config,
            sample_rate,
            fft,
            window,
            filterbank,
            dct,
        })
    }

    /// Feature vector of `segment`, `n_mfcc` long.
    ///
    /// Segments shorter than `min_samples` are zero-padded on the right.
    /// Fails only on non-finite input or output.
    pub fn extract(&self, segment: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
        if segment.iter().any(|s| !s.is_finite()) {
            return Err(PhonoscopeError::FeatureExtraction {
                message: "segment contains non-finite samples".to_string(),
            });
        }

        let rebuilt;
        let filterbank = if sample_rate == self.sample_rate {
            &self.filterbank
        } else {
            if sample_rate == 0 {
                return Err(PhonoscopeError::FeatureExtraction {
                    message: "sample rate must be positive".to_string(),
                });
            }
            rebuilt = mel_filterbank(sample_rate, self.config.n_fft, self.config.n_mels);
            &rebuilt
        };

        let mut signal: Vec<f64> = segment.iter().map(|&s| s as f64).collect();
        if signal.len() < self.config.min_samples {
            signal.resize(self.config.min_samples, 0.0);
        }

        let power = self.power_spectrogram(&signal);
        let mel = filterbank.dot(&power);
        let log_mel = power_to_db(mel);
        let mfcc = self.dct.dot(&log_mel);

        let mean = mfcc
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(self.config.n_mfcc));

        let features: Vec<f32> = mean.iter().map(|&c| c as f32).collect();
        if features.iter().any(|c| !c.is_finite()) {
            return Err(PhonoscopeError::FeatureExtraction {
                message: "coefficients are not finite".to_string(),
            });
        }
        Ok(features)
    }

    /// Power spectrogram of the centred, zero-padded signal (bins x frames).
    fn power_spectrogram(&self, signal: &[f64]) -> Array2<f64> {
        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length;
        let pad = n_fft / 2;

        let mut padded = vec![0.0; signal.len() + 2 * pad];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let n_frames = if padded.len() >= n_fft {
            1 + (padded.len() - n_fft) / hop
        } else {
            0
        };
        let n_bins = n_fft / 2 + 1;
        let mut power = Array2::<f64>::zeros((n_bins, n_frames));

        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
        for frame in 0..n_frames {
            let start = frame * hop;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(padded[start + i] * self.window[i], 0.0);
            }
            self.fft.process(&mut buffer);
            for k in 0..n_bins {
                power[[k, frame]] = buffer[k].norm_sqr();
            }
        }

        power
    }
}

/// Periodic Hann window.
fn hann_window(length: usize) -> Vec<f64> {
    (0..length)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / length as f64).cos())
        .collect()
}

const MEL_F_SP: f64 = 200.0 / 3.0;
const MEL_MIN_LOG_HZ: f64 = 1000.0;
const MEL_MIN_LOG_MEL: f64 = MEL_MIN_LOG_HZ / MEL_F_SP;

fn mel_log_step() -> f64 {
    6.4_f64.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above.
fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MEL_MIN_LOG_HZ {
        MEL_MIN_LOG_MEL + (hz / MEL_MIN_LOG_HZ).ln() / mel_log_step()
    } else {
        hz / MEL_F_SP
    }
}

fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MEL_MIN_LOG_MEL {
        MEL_MIN_LOG_HZ * (mel_log_step() * (mel - MEL_MIN_LOG_MEL)).exp()
    } else {
        mel * MEL_F_SP
    }
}

/// Triangular filters between 0 Hz and Nyquist with Slaney area normalisation
/// (n_mels x bins).
fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f64> {
    let n_bins = n_fft / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;

    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * nyquist / (n_bins - 1).max(1) as f64)
        .collect();

    let min_mel = hz_to_mel(0.0);
    let max_mel = hz_to_mel(nyquist);
    let mel_freqs: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(min_mel + (max_mel - min_mel) * i as f64 / (n_mels + 1) as f64))
        .collect();

    let mut weights = Array2::<f64>::zeros((n_mels, n_bins));
    for m in 0..n_mels {
        let lower_width = mel_freqs[m + 1] - mel_freqs[m];
        let upper_width = mel_freqs[m + 2] - mel_freqs[m + 1];
        let norm = 2.0 / (mel_freqs[m + 2] - mel_freqs[m]);

        for (k, &freq) in fft_freqs.iter().enumerate() {
            let rising = (freq - mel_freqs[m]) / lower_width;
            let falling = (mel_freqs[m + 2] - freq) / upper_width;
            weights[[m, k]] = rising.min(falling).max(0.0) * norm;
        }
    }
    weights
}

/// `10*log10(max(floor, x))`, clamped to the configured dynamic range below the peak.
fn power_to_db(power: Array2<f64>) -> Array2<f64> {
    let floor = defaults::POWER_FLOOR as f64;
    let mut db = power.mapv_into(|x| 10.0 * x.max(floor).log10());
    let peak = db.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lowest = peak - defaults::TOP_DB_CLAMP as f64;
    db.mapv_inplace(|x| x.max(lowest));
    db
}

/// Orthonormal DCT-II basis, first `n_out` rows (n_out x n_in).
fn dct_matrix(n_out: usize, n_in: usize) -> Array2<f64> {
    let n = n_in as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, m)| {
        let scale = if k == 0 {
            (1.0 / n).sqrt()
        } else {
            (2.0 / n).sqrt()
        };
        scale * (PI * k as f64 * (2.0 * m as f64 + 1.0) / (2.0 * n)).cos()
    })
}
