use serde::{Deserialize, Serialize};

/// A single point in normalised display space. Y grows upwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Ordered point sequence traced by the beam without lifting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Point>,
}

impl Path {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Polyline length: the sum of the distances between consecutive points.
    pub fn length(&self) -> f64 {
        path_length(&self.points)
    }

    /// Returns the first `count` points as a new path.
    pub fn prefix(&self, count: usize) -> Path {
        Path::new(self.points[..count.min(self.points.len())].to_vec())
    }
}

impl<P: Into<Point>> FromIterator<P> for Path {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Ordered list of paths. The order is the draw order and the last path
/// connects back to the first.
pub type PathSet = Vec<Path>;

/// Sum of Euclidean distances between consecutive points; zero for fewer than
/// two points.
pub fn path_length(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum()
}

/// Distance from the end of each path to the start of the next one, wrapping
/// around from the last path to the first.
///
/// A lone path is a self-loop: the frame boundary is not treated as a move,
/// so its single entry is zero.
///
/// Empty paths have no endpoints and are expected to be filtered out before
/// calling this; any that remain contribute a zero-length gap.
pub fn transit_lengths(paths: &[Path]) -> Vec<f64> {
    let count = paths.len();
    (0..count)
        .map(|i| transit_endpoints(paths, i).map_or(0.0, |(from, to)| from.distance(to)))
        .collect()
}

/// Start and end of the transit leaving path `index`.
pub(crate) fn transit_endpoints(paths: &[Path], index: usize) -> Option<(Point, Point)> {
    if paths.len() < 2 {
        return None;
    }
    let next = paths.get((index + 1) % paths.len())?;
    Some((paths.get(index)?.last()?, next.first()?))
}
