//! SVG documents as path sources.
//!
//! Every SVG path element becomes one [`Path`]: its curves are flattened,
//! the polyline is resampled at a fixed density per user unit, and the whole
//! drawing is centred and scaled into `[-1, 1]` with Y pointing up.

use std::{
    fs,
    path::{Path as FsPath, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use usvg::tiny_skia_path::PathSegment;

use crate::{
    geometry::{path_length, Path, PathSet, Point},
    Result, ScopeError,
};

/// Line pieces used to approximate each quadratic or cubic segment.
const CURVE_STEPS: usize = 16;

/// Opaque "last modified" token. Two markers differ whenever the source
/// changed in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangeMarker(u128);

impl ChangeMarker {
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        Self(
            time.duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos())
                .unwrap_or_default(),
        )
    }
}

/// Something that yields a path set and can report whether it changed.
///
/// Live playback only ever asks "has this changed since marker X"; file
/// sources answer by polling modification times.
pub trait PathSource {
    /// Stable identity used as a cache key.
    fn id(&self) -> &str;

    fn marker(&self) -> Result<ChangeMarker>;

    /// Returns the new marker if the source changed since `marker`.
    fn changed_since(&self, marker: ChangeMarker) -> Result<Option<ChangeMarker>> {
        let current = self.marker()?;
        Ok((current != marker).then_some(current))
    }

    fn load(&self) -> Result<PathSet>;
}

/// A sorted, re-enumerable collection of sources (a show directory).
pub trait SourceCollection {
    type Source: PathSource;

    /// Lists the current sources in play order.
    fn enumerate(&self) -> Result<Vec<Self::Source>>;
}

/// One SVG file on disk.
#[derive(Debug, Clone)]
pub struct SvgFile {
    path: PathBuf,
    id: String,
    points_per_unit: f64,
}

impl SvgFile {
    pub fn new(path: impl Into<PathBuf>, points_per_unit: f64) -> Self {
        let path = path.into();
        let id = path.display().to_string();
        Self {
            path,
            id,
            points_per_unit,
        }
    }

    pub fn path(&self) -> &FsPath {
        &self.path
    }

    /// File name for log messages.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id.clone())
    }
}

impl PathSource for SvgFile {
    fn id(&self) -> &str {
        &self.id
    }

    fn marker(&self) -> Result<ChangeMarker> {
        let metadata = fs::metadata(&self.path).map_err(|err| not_found_or(err, &self.path))?;
        Ok(ChangeMarker::from_system_time(metadata.modified()?))
    }

    fn load(&self) -> Result<PathSet> {
        load_svg(&self.path, self.points_per_unit)
    }
}

/// All `*.svg` files in one directory, in file name order.
#[derive(Debug, Clone)]
pub struct SvgDirectory {
    dir: PathBuf,
    points_per_unit: f64,
}

impl SvgDirectory {
    pub fn new(dir: impl Into<PathBuf>, points_per_unit: f64) -> Self {
        Self {
            dir: dir.into(),
            points_per_unit,
        }
    }
}

impl SourceCollection for SvgDirectory {
    type Source = SvgFile;

    fn enumerate(&self) -> Result<Vec<SvgFile>> {
        if !self.dir.is_dir() {
            return Err(ScopeError::SourceNotFound(self.dir.clone()));
        }

        let pattern = format!(
            "{}/*.svg",
            glob::Pattern::escape(&self.dir.to_string_lossy())
        );

        let mut files: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|err| ScopeError::msg(format!("bad source pattern `{pattern}`: {err}")))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    None
                }
            })
            .collect();
        files.sort();

        Ok(files
            .into_iter()
            .map(|path| SvgFile::new(path, self.points_per_unit))
            .collect())
    }
}

/// Reads and parses an SVG file.
pub fn load_svg(path: impl AsRef<FsPath>, points_per_unit: f64) -> Result<PathSet> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|err| not_found_or(err, path))?;
    parse_svg(&data, points_per_unit)
}

/// Parses SVG bytes into a normalised path set.
pub fn parse_svg(data: &[u8], points_per_unit: f64) -> Result<PathSet> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|err| ScopeError::Svg(err.to_string()))?;

    let mut polylines = Vec::new();
    collect_polylines(tree.root(), &mut polylines);
    normalize(polylines, points_per_unit)
}

fn not_found_or(err: std::io::Error, path: &FsPath) -> ScopeError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ScopeError::SourceNotFound(path.to_path_buf())
    } else {
        ScopeError::Io(err)
    }
}

fn collect_polylines(group: &usvg::Group, out: &mut Vec<Vec<Point>>) {
    for child in group.children() {
        match child {
            usvg::Node::Group(group) => collect_polylines(group, out),
            usvg::Node::Path(path) => {
                out.push(flatten(path.data(), &path.abs_transform()));
            }
            _ => {}
        }
    }
}

/// Flattens one path element into a polyline in document coordinates.
/// Subpaths are joined end to start.
fn flatten(data: &usvg::tiny_skia_path::Path, transform: &usvg::Transform) -> Vec<Point> {
    let map = |p: usvg::tiny_skia_path::Point| {
        let (x, y) = (f64::from(p.x), f64::from(p.y));
        Point::new(
            f64::from(transform.sx) * x + f64::from(transform.kx) * y + f64::from(transform.tx),
            f64::from(transform.ky) * x + f64::from(transform.sy) * y + f64::from(transform.ty),
        )
    };

    let mut points: Vec<Point> = Vec::new();
    let mut subpath_start = None;
    for segment in data.segments() {
        let current = points.last().copied().unwrap_or(Point::ZERO);
        match segment {
            PathSegment::MoveTo(p) => {
                let p = map(p);
                subpath_start = Some(p);
                points.push(p);
            }
            PathSegment::LineTo(p) => points.push(map(p)),
            PathSegment::QuadTo(c, e) => {
                let (c, e) = (map(c), map(e));
                points.extend((1..=CURVE_STEPS).map(|i| {
                    let t = i as f64 / CURVE_STEPS as f64;
                    let u = 1.0 - t;
                    blend(&[(current, u * u), (c, 2.0 * u * t), (e, t * t)])
                }));
            }
            PathSegment::CubicTo(c1, c2, e) => {
                let (c1, c2, e) = (map(c1), map(c2), map(e));
                points.extend((1..=CURVE_STEPS).map(|i| {
                    let t = i as f64 / CURVE_STEPS as f64;
                    let u = 1.0 - t;
                    blend(&[
                        (current, u * u * u),
                        (c1, 3.0 * u * u * t),
                        (c2, 3.0 * u * t * t),
                        (e, t * t * t),
                    ])
                }));
            }
            PathSegment::Close => {
                if let Some(start) = subpath_start {
                    points.push(start);
                }
            }
        }
    }
    points
}

fn blend(weighted: &[(Point, f64)]) -> Point {
    weighted.iter().fold(Point::ZERO, |acc, (p, w)| {
        Point::new(acc.x + p.x * w, acc.y + p.y * w)
    })
}

/// Centres and scales every polyline into `[-1, 1]`, flips Y, and resamples
/// each at `points_per_unit` along its length. Zero-length polylines are
/// dropped.
fn normalize(polylines: Vec<Vec<Point>>, points_per_unit: f64) -> Result<PathSet> {
    let mut all = polylines.iter().flatten();
    let Some(first) = all.next() else {
        return Err(ScopeError::EmptyPathSet);
    };
    let (mut min, mut max) = (*first, *first);
    for p in all {
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }

    let center = Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
    let mut scale = (max.x - min.x).max(max.y - min.y) / 2.0;
    if scale <= 0.0 || !scale.is_finite() {
        tracing::debug!("degenerate bounding box, using unit scale");
        scale = 1.0;
    }

    let paths: PathSet = polylines
        .iter()
        .filter_map(|polyline| {
            let length = path_length(polyline);
            if length <= 0.0 {
                return None;
            }
            let count = ((length * points_per_unit).floor() as usize).max(2);
            Some(
                sample_evenly(polyline, length, count)
                    .into_iter()
                    .map(|p| Point::new((p.x - center.x) / scale, -(p.y - center.y) / scale))
                    .collect::<Path>(),
            )
        })
        .collect();

    if paths.is_empty() {
        return Err(ScopeError::EmptyPathSet);
    }
    tracing::debug!(paths = paths.len(), scale, "parsed svg");
    Ok(paths)
}

/// `count` points spaced evenly by distance along `polyline`, ends included.
fn sample_evenly(polyline: &[Point], length: f64, count: usize) -> Vec<Point> {
    let mut samples = Vec::with_capacity(count);
    let mut segment = 0;
    let mut walked = 0.0;

    for i in 0..count {
        let target = length * i as f64 / (count - 1) as f64;
        while segment + 2 < polyline.len()
            && walked + polyline[segment].distance(polyline[segment + 1]) < target
        {
            walked += polyline[segment].distance(polyline[segment + 1]);
            segment += 1;
        }

        let (a, b) = (polyline[segment], polyline[segment + 1]);
        let span = a.distance(b);
        let t = if span > 0.0 {
            ((target - walked) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        samples.push(Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t));
    }
    samples
}
