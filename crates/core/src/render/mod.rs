//! Single-frame synthesis.
//!
//! One frame is one refresh period of samples that draws every path once.
//! The frame's sample budget is split in proportion to length, where drawn
//! length counts in full and transit length is divided by the transit speed:
//! a faster beam is dimmer and needs proportionally less time.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{
    geometry::{transit_endpoints, transit_lengths, Path},
    resample::resample,
    Signal,
};

/// Speed factor used when the caller supplies a non-positive one.
pub const DEFAULT_TRANSIT_SPEED: f64 = 20.0;

/// Minimum samples for any non-zero transit. Shorter jumps ring on the
/// display.
pub const MIN_TRANSIT_SAMPLES: usize = 8;

/// Minimum samples for a drawn path with non-zero length.
pub const MIN_PATH_SAMPLES: usize = 2;

/// Parameters shared by every frame of a render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthParams {
    pub sample_rate: u32,
    pub refresh_rate: f64,
    pub transit_speed: f64,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            refresh_rate: 60.0,
            transit_speed: DEFAULT_TRANSIT_SPEED,
        }
    }
}

impl SynthParams {
    /// `floor(sample_rate / refresh_rate)`; zero for a non-positive refresh rate.
    pub fn samples_per_frame(&self) -> usize {
        let spf = f64::from(self.sample_rate) / self.refresh_rate;
        if spf.is_finite() && spf > 0.0 {
            spf.floor() as usize
        } else {
            0
        }
    }

    /// The transit speed actually used for allocation.
    pub fn effective_transit_speed(&self) -> f64 {
        if self.transit_speed.is_finite() && self.transit_speed > 0.0 {
            self.transit_speed
        } else {
            DEFAULT_TRANSIT_SPEED
        }
    }
}

/// Renders one frame of `paths` as exactly `params.samples_per_frame()`
/// stereo samples.
///
/// Degenerate input (no paths, only empty paths, zero total length) renders
/// as silence of the full frame length.
pub fn synthesize_frame(paths: &[Path], params: &SynthParams) -> Signal {
    let spf = params.samples_per_frame();
    let paths: Cow<'_, [Path]> = if paths.iter().any(Path::is_empty) {
        Cow::Owned(paths.iter().filter(|path| !path.is_empty()).cloned().collect())
    } else {
        Cow::Borrowed(paths)
    };
    if paths.is_empty() {
        return Signal::silence(spf);
    }

    let Some(layout) = FrameLayout::plan(&paths, spf, params.effective_transit_speed()) else {
        return Signal::silence(spf);
    };

    let mut points = Vec::with_capacity(layout.total());
    for (index, path) in paths.iter().enumerate() {
        points.extend(resample(path.points(), layout.path_samples[index]));

        let transit_samples = layout.transit_samples[index];
        if transit_samples > 0 {
            if let Some((from, to)) = transit_endpoints(&paths, index) {
                points.extend(resample(&[from, to], transit_samples));
            }
        }
    }

    if points.is_empty() {
        return Signal::silence(spf);
    }
    if points.len() != spf {
        tracing::trace!(
            emitted = points.len(),
            samples_per_frame = spf,
            "resampling frame to exact length"
        );
        points = resample(&points, spf);
    }

    Signal::from_points(&points)
}

/// Samples given to each path and to the transit that follows it, before the
/// frame is squeezed to its exact length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FrameLayout {
    pub path_samples: Vec<usize>,
    pub transit_samples: Vec<usize>,
}

impl FrameLayout {
    /// Splits `spf` samples across non-empty `paths`. `None` when the
    /// drawing has no length at all.
    pub(crate) fn plan(paths: &[Path], spf: usize, speed: f64) -> Option<Self> {
        let path_lengths: Vec<f64> = paths.iter().map(Path::length).collect();
        let transits = transit_lengths(paths);

        let effective_total =
            path_lengths.iter().sum::<f64>() + transits.iter().sum::<f64>() / speed;
        if effective_total <= 0.0 || !effective_total.is_finite() {
            return None;
        }

        let share = |length: f64| (length / effective_total * spf as f64).floor() as usize;
        let path_samples = path_lengths
            .iter()
            .map(|&length| match share(length) {
                samples if length > 0.0 => samples.max(MIN_PATH_SAMPLES),
                samples => samples,
            })
            .collect();
        let transit_samples = transits
            .iter()
            .map(|&transit| {
                if transit > 0.0 {
                    share(transit / speed).max(MIN_TRANSIT_SAMPLES)
                } else {
                    0
                }
            })
            .collect();

        Some(Self {
            path_samples,
            transit_samples,
        })
    }

    pub(crate) fn total(&self) -> usize {
        self.path_samples.iter().sum::<usize>() + self.transit_samples.iter().sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn path(points: &[(f64, f64)]) -> Path {
        points.iter().copied().collect()
    }

    fn params() -> SynthParams {
        SynthParams::default()
    }

    #[test]
    fn frame_length_matches_refresh_period() {
        let paths = vec![
            path(&[(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5)]),
            path(&[(0.9, 0.9), (0.8, 0.7)]),
            path(&[(-0.2, 0.1)]),
        ];

        let rates = [(48_000, 60.0), (44_100, 50.0), (44_100, 70.0), (8_000, 33.3)];
        for (sample_rate, refresh_rate) in rates {
            let params = SynthParams {
                sample_rate,
                refresh_rate,
                transit_speed: 20.0,
            };
            let frame = synthesize_frame(&paths, &params);
            assert_eq!(
                frame.len(),
                (f64::from(sample_rate) / refresh_rate).floor() as usize
            );
        }
    }

    #[test]
    fn single_segment_fills_whole_frame() {
        let frame = synthesize_frame(&[path(&[(-1.0, 0.0), (1.0, 0.0)])], &params());

        assert_eq!(frame.len(), 800);
        let samples = frame.samples();
        assert_eq!(samples[0].x, -1.0);
        assert_eq!(samples[799].x, 1.0);
        for (i, sample) in samples.iter().enumerate() {
            let expected = -1.0 + 2.0 * i as f64 / 799.0;
            assert!((f64::from(sample.x) - expected).abs() < 1e-5);
            assert_eq!(sample.y, 0.0);
        }
    }

    #[test]
    fn empty_or_degenerate_input_is_silent() {
        let silent = Signal::silence(800);
        assert_eq!(synthesize_frame(&[], &params()), silent);
        assert_eq!(synthesize_frame(&[Path::default()], &params()), silent);
        assert_eq!(synthesize_frame(&[path(&[(0.3, 0.3)])], &params()), silent);
    }

    #[test]
    fn transits_get_minimum_dwell() {
        // Two long paths far apart; with a huge speed factor each transit's
        // proportional share rounds to zero samples.
        let paths = vec![
            path(&[(-1.0, -1.0), (-1.0, 1.0)]),
            path(&[(1.0, 1.0), (1.0, -1.0)]),
        ];
        let params = SynthParams {
            transit_speed: 1.0e6,
            ..params()
        };
        let frame = synthesize_frame(&paths, &params);
        assert_eq!(frame.len(), 800);

        // Drawn paths take 399 samples each, plus two transits of 8: 814
        // emitted, squeezed back to 800. Each transit keeps its mid-air
        // samples through the squeeze.
        let in_transit = frame
            .samples()
            .iter()
            .filter(|s| s.x.abs() < 0.99)
            .count();
        assert!(in_transit >= 2 * (MIN_TRANSIT_SAMPLES - 3), "{in_transit}");
    }

    #[test]
    fn transit_floor_applies_at_default_speed() {
        // Long strokes with narrow gaps: each gap is 0.02 long, so at speed
        // 20 its share is floor(0.001 / 4.002 * 800) = 0 before the floor.
        let paths = vec![
            path(&[(-0.01, -1.0), (-0.01, 1.0)]),
            path(&[(0.01, 1.0), (0.01, -1.0)]),
        ];
        let layout = FrameLayout::plan(&paths, 800, DEFAULT_TRANSIT_SPEED).unwrap();

        assert_eq!(layout.path_samples, vec![399, 399]);
        assert_eq!(
            layout.transit_samples,
            vec![MIN_TRANSIT_SAMPLES, MIN_TRANSIT_SAMPLES]
        );
        assert_eq!(layout.total(), 814);

        let frame = synthesize_frame(&paths, &params());
        assert_eq!(frame.len(), 800);
    }

    #[test]
    fn lone_path_layout_has_no_transit() {
        let paths = vec![path(&[(-0.5, 0.0), (0.5, 0.0), (0.5, 0.5)])];
        let layout = FrameLayout::plan(&paths, 800, DEFAULT_TRANSIT_SPEED).unwrap();
        assert_eq!(layout.transit_samples, vec![0]);
        assert_eq!(layout.path_samples, vec![800]);
    }

    #[test]
    fn non_positive_speed_uses_default() {
        let paths = vec![
            path(&[(0.0, 0.0), (0.5, 0.0)]),
            path(&[(0.0, 1.0), (0.5, 1.0)]),
        ];
        let with_default = synthesize_frame(&paths, &params());
        let with_zero = synthesize_frame(
            &paths,
            &SynthParams {
                transit_speed: 0.0,
                ..params()
            },
        );
        let with_negative = synthesize_frame(
            &paths,
            &SynthParams {
                transit_speed: -3.0,
                ..params()
            },
        );
        assert_eq!(with_zero, with_default);
        assert_eq!(with_negative, with_default);
    }

    #[test]
    fn output_stays_inside_input_hull() {
        let paths = vec![
            path(&[(-0.75, -0.5), (0.25, 0.5)]),
            path(&[(0.5, -0.25), (0.1, 0.1), (0.6, 0.4)]),
        ];
        let frame = synthesize_frame(&paths, &params());
        for sample in frame.samples() {
            assert!((-0.75..=0.6).contains(&sample.x));
            assert!((-0.5..=0.5).contains(&sample.y));
        }
    }

    #[test]
    fn frame_starts_at_first_path() {
        let paths = vec![
            path(&[(0.2, 0.3), (0.4, 0.3)]),
            path(&[(-0.2, -0.3), (-0.4, -0.3)]),
        ];
        let frame = synthesize_frame(&paths, &params());
        let first = frame.samples()[0];
        let start = Point::new(f64::from(first.x), f64::from(first.y));
        assert!(start.distance(Point::new(0.2, 0.3)) < 1e-6);
    }
}
