//! Index-proportional resampling of point sequences.
//!
//! Both the source and the target are treated as uniform grids over `[0, 1]`
//! and each channel is linearly interpolated against the source index, not
//! against arc length. Unevenly spaced input therefore keeps its uneven
//! spacing in time, which is the intended behaviour.

use crate::geometry::Point;

/// Resamples `points` to exactly `target_len` points.
///
/// Never fails: no input yields zeros, a single point is held for the whole
/// run, and a zero target yields nothing.
pub fn resample(points: &[Point], target_len: usize) -> Vec<Point> {
    if target_len == 0 {
        return Vec::new();
    }

    match points {
        [] => vec![Point::ZERO; target_len],
        [only] => vec![*only; target_len],
        _ => {
            let last_source = (points.len() - 1) as f64;
            let last_target = (target_len - 1).max(1) as f64;
            (0..target_len)
                .map(|i| {
                    // Position of target node `i` measured in source indices.
                    let t = if target_len == 1 { 0.0 } else { i as f64 / last_target };
                    interpolate(points, t * last_source)
                })
                .collect()
        }
    }
}

fn interpolate(points: &[Point], position: f64) -> Point {
    let max_index = points.len() - 1;
    let position = position.clamp(0.0, max_index as f64);
    let lower = (position.floor() as usize).min(max_index);
    if lower == max_index {
        return points[max_index];
    }

    let frac = position - lower as f64;
    let a = points[lower];
    let b = points[lower + 1];
    Point::new(a.x + (b.x - a.x) * frac, a.y + (b.y - a.y) * frac)
}
