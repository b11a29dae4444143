//! Progressive reveal: the image is drawn in over a number of frames, each
//! showing a longer prefix of the path set.

use crate::{
    geometry::{Path, PathSet},
    render::{synthesize_frame, SynthParams},
    Signal,
};

/// Returns the prefix of `paths` covering `fraction` of their total drawn
/// length. Transit distance does not count.
///
/// The path that crosses the target is cut by point count in proportion to
/// the length still wanted, and dropped if that leaves fewer than two points.
/// Nothing after it is kept.
pub fn slice_prefix(paths: &[Path], fraction: f64) -> PathSet {
    if fraction <= 0.0 || fraction.is_nan() {
        return Vec::new();
    }
    if fraction >= 1.0 {
        return paths.to_vec();
    }

    let lengths: Vec<f64> = paths.iter().map(Path::length).collect();
    let target = lengths.iter().sum::<f64>() * fraction;

    let mut covered = 0.0;
    let mut sliced = Vec::new();
    for (path, &length) in paths.iter().zip(&lengths) {
        if covered + length <= target {
            sliced.push(path.clone());
            covered += length;
            continue;
        }

        let remaining = target - covered;
        if remaining > 0.0 && length > 0.0 {
            let count = ((remaining / length) * path.len() as f64).floor() as usize;
            if count > 1 {
                sliced.push(path.prefix(count));
            }
        }
        break;
    }
    sliced
}

/// Number of frames an animation of `duration` seconds spans.
pub fn frame_count(duration: f64, params: &SynthParams) -> usize {
    if duration.is_nan() || duration <= 0.0 {
        return 0;
    }
    let frames = (duration * params.refresh_rate).floor();
    if frames.is_finite() && frames > 0.0 {
        frames as usize
    } else {
        0
    }
}

/// Builds a reveal animation lasting `duration` seconds.
///
/// Frame `i` of `n` shows the prefix for fraction `(i + 1) / n`, so the last
/// frame is the complete image. The result is `n * samples_per_frame` long;
/// a non-positive duration, or one too long to address, gives an empty
/// signal.
pub fn synthesize_animation(paths: &[Path], duration: f64, params: &SynthParams) -> Signal {
    let frames = frame_count(duration, params);
    let spf = params.samples_per_frame();
    let Some(total) = frames.checked_mul(spf) else {
        tracing::warn!(duration, frames, "animation too long to render, skipping");
        return Signal::default();
    };
    let mut animation = Signal::new(Vec::with_capacity(total));

    for index in 0..frames {
        let fraction = (index + 1) as f64 / frames as f64;
        let visible = slice_prefix(paths, fraction);
        let frame = if visible.is_empty() {
            Signal::silence(spf)
        } else {
            synthesize_frame(&visible, params)
        };
        animation.extend_from(&frame);
    }

    tracing::debug!(frames, samples = animation.len(), "synthesized reveal animation");
    animation
}
