use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{render::SynthParams, Result, ScopeError};

/// Top-level configuration structure for the application.
///
/// Every section defaults independently, so a config file only needs the
/// keys it wants to change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub show: ShowConfig,
    pub live: LiveConfig,
    pub source: SourceConfig,
}

impl AppConfig {
    /// Loads a JSON config file. Missing keys fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| ScopeError::Config(format!("{}: {err}", path.display())))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values no render mode can work with.
    pub fn validate(&self) -> Result<()> {
        if self.render.sample_rate == 0 {
            return Err(ScopeError::Config("sample_rate must be non-zero".into()));
        }
        if self.render.refresh_rate.is_nan() || self.render.refresh_rate <= 0.0 {
            return Err(ScopeError::Config(format!(
                "refresh_rate must be positive, got {}",
                self.render.refresh_rate
            )));
        }
        if self.render.synth_params().samples_per_frame() == 0 {
            return Err(ScopeError::Config(format!(
                "refresh_rate {} leaves no samples per frame at {} Hz",
                self.render.refresh_rate, self.render.sample_rate
            )));
        }
        let poll = self.live.poll_period_seconds;
        let backoff = self.live.error_backoff_seconds;
        if poll.is_nan() || poll <= 0.0 || backoff.is_nan() || backoff < 0.0 {
            return Err(ScopeError::Config(
                "live timings must be positive".to_string(),
            ));
        }
        let show = &self.show;
        if [show.duration, show.interval, show.animation_duration]
            .iter()
            .any(|seconds| !seconds.is_finite())
        {
            return Err(ScopeError::Config("show timings must be finite".to_string()));
        }
        Ok(())
    }
}

/// Per-frame synthesis settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub sample_rate: u32,
    pub refresh_rate: f64,
    /// Beam speed during transits relative to drawing speed.
    pub transit_speed: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            refresh_rate: 60.0,
            transit_speed: 20.0,
        }
    }
}

impl RenderConfig {
    pub fn synth_params(&self) -> SynthParams {
        SynthParams {
            sample_rate: self.sample_rate,
            refresh_rate: self.refresh_rate,
            transit_speed: self.transit_speed,
        }
    }
}

/// Timing of file output and show sequencing, all in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowConfig {
    /// Length of a rendered file.
    pub duration: f64,
    /// Time slot given to each image in a show.
    pub interval: f64,
    /// Length of the reveal animation at the start of each slot. Zero disables it.
    pub animation_duration: f64,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            duration: 5.0,
            interval: 10.0,
            animation_duration: 0.0,
        }
    }
}

impl ShowConfig {
    pub fn animation(&self) -> Option<f64> {
        (self.animation_duration > 0.0).then_some(self.animation_duration)
    }

    pub fn interval(&self) -> Duration {
        seconds(self.interval)
    }
}

/// Cadences used by the live schedulers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub poll_period_seconds: f64,
    pub error_backoff_seconds: f64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_period_seconds: 0.5,
            error_backoff_seconds: 1.0,
        }
    }
}

impl LiveConfig {
    pub fn poll_period(&self) -> Duration {
        seconds(self.poll_period_seconds)
    }

    pub fn error_backoff(&self) -> Duration {
        seconds(self.error_backoff_seconds)
    }
}

/// Non-finite or oversized values saturate; negatives and NaN become zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

/// Settings for turning SVG documents into point sequences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Sampling density along each path, in points per SVG user unit.
    pub points_per_unit: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            points_per_unit: 100.0,
        }
    }
}
