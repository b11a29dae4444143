use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{Result, Signal};

/// Level and spectrum summary of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub rms: f32,
    pub peak: f32,
    /// Normalised [0, 1] spectral centroid where 1.0 corresponds to the
    /// Nyquist frequency.
    pub spectral_centroid: f32,
}

/// Summary of a rendered signal, logged after every render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalAnalysis {
    pub sample_rate: u32,
    pub samples: usize,
    pub duration_seconds: f64,
    pub left: ChannelStats,
    pub right: ChannelStats,
    /// Largest distance the beam jumps between consecutive samples. Large
    /// values show up as visible streaks on a real scope.
    pub max_beam_step: f32,
}

impl SignalAnalysis {
    /// Convenience wrapper that plans a fresh FFT.
    pub fn of(signal: &Signal, sample_rate: u32) -> Result<Self> {
        SignalAnalyzer::new(sample_rate).analyze(signal)
    }
}

/// Reusable analyser. FFT plans are kept between calls with the same length,
/// which is the common case when analysing successive frames.
pub struct SignalAnalyzer {
    sample_rate: u32,
    fft_planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl SignalAnalyzer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            fft_planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn analyze(&mut self, signal: &Signal) -> Result<SignalAnalysis> {
        let left = signal.left();
        let right = signal.right();

        let analysis = SignalAnalysis {
            sample_rate: self.sample_rate,
            samples: signal.len(),
            duration_seconds: signal.duration_seconds(self.sample_rate),
            left: self.channel_stats(&left)?,
            right: self.channel_stats(&right)?,
            max_beam_step: max_beam_step(signal),
        };
        tracing::debug!(?analysis, "analysed signal");
        Ok(analysis)
    }

    fn channel_stats(&mut self, samples: &[f32]) -> Result<ChannelStats> {
        if samples.is_empty() {
            return Ok(ChannelStats::default());
        }

        Ok(ChannelStats {
            rms: compute_rms(samples),
            peak: samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs())),
            spectral_centroid: self.compute_spectral_centroid(samples)?,
        })
    }

    fn compute_spectral_centroid(&mut self, samples: &[f32]) -> Result<f32> {
        let len = samples.len();
        if len < 2 {
            return Ok(0.0);
        }
        let fft = self.prepare_fft(len);

        for (index, value) in samples.iter().enumerate() {
            fft.input[index] = *value * hann_value(index, len);
        }

        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let mut magnitude_sum = 0.0;
        let mut weighted_sum = 0.0;
        // Bin i sits at i / len of the sample rate, so i / (len / 2) of Nyquist.
        let half = len as f32 * 0.5;

        for (i, bin) in fft.spectrum.iter().enumerate() {
            let magnitude = bin.norm();
            magnitude_sum += magnitude;
            weighted_sum += magnitude * (i as f32 / half);
        }

        if magnitude_sum <= f32::EPSILON {
            Ok(0.0)
        } else {
            Ok((weighted_sum / magnitude_sum).clamp(0.0, 1.0))
        }
    }

    fn prepare_fft(&mut self, size: usize) -> &mut FftResources {
        if self.fft.as_ref().is_some_and(|fft| fft.size != size) {
            self.fft = None;
        }

        let planner = &mut self.fft_planner;
        self.fft.get_or_insert_with(|| {
            let plan = planner.plan_fft_forward(size);
            FftResources {
                size,
                scratch: plan.make_scratch_vec(),
                spectrum: plan.make_output_vec(),
                input: plan.make_input_vec(),
                plan,
            }
        })
    }
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for SignalAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalAnalyzer")
            .field("sample_rate", &self.sample_rate)
            .field("fft_size", &self.fft.as_ref().map(|fft| fft.size))
            .finish()
    }
}

fn compute_rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}

fn max_beam_step(signal: &Signal) -> f32 {
    signal
        .samples()
        .windows(2)
        .map(|pair| (pair[1].x - pair[0].x).hypot(pair[1].y - pair[0].y))
        .fold(0.0, f32::max)
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}
