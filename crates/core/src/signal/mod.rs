use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Simultaneous X/Y deflection at one sample instant. X drives the left
/// channel, Y the right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StereoSample {
    pub x: f32,
    pub y: f32,
}

impl StereoSample {
    pub const SILENCE: StereoSample = StereoSample { x: 0.0, y: 0.0 };
}

impl From<Point> for StereoSample {
    fn from(point: Point) -> Self {
        Self {
            x: point.x as f32,
            y: point.y as f32,
        }
    }
}

/// Fixed-length run of stereo samples: one frame, an animation, or a whole
/// show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    samples: Vec<StereoSample>,
}

impl Signal {
    pub fn new(samples: Vec<StereoSample>) -> Self {
        Self { samples }
    }

    pub fn silence(len: usize) -> Self {
        Self::new(vec![StereoSample::SILENCE; len])
    }

    pub fn from_points(points: &[Point]) -> Self {
        Self::new(points.iter().copied().map(StereoSample::from).collect())
    }

    pub fn samples(&self) -> &[StereoSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<StereoSample> {
        self.samples
    }

    /// Appends another signal in place.
    pub fn extend_from(&mut self, other: &Signal) {
        self.samples.extend_from_slice(&other.samples);
    }

    /// Repeats the signal end to end and crops the result to exactly `len`
    /// samples. An empty signal tiles to silence.
    pub fn tiled(&self, len: usize) -> Signal {
        if self.samples.is_empty() {
            return Signal::silence(len);
        }
        Signal::new(self.samples.iter().copied().cycle().take(len).collect())
    }

    /// Left (X) channel.
    pub fn left(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.x).collect()
    }

    /// Right (Y) channel.
    pub fn right(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.y).collect()
    }

    /// `[x0, y0, x1, y1, ...]` as expected by audio devices and WAV writers.
    pub fn interleaved(&self) -> Vec<f32> {
        self.samples.iter().flat_map(|s| [s.x, s.y]).collect()
    }

    pub fn duration_seconds(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(sample_rate)
    }
}

impl FromIterator<StereoSample> for Signal {
    fn from_iter<I: IntoIterator<Item = StereoSample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
