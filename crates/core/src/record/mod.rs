//! WAV output.
//!
//! Files are stereo, 32-bit float, X on the left channel and Y on the right,
//! which is what most oscilloscope and vector-synth players expect.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::{audio::CHANNELS, timeline::seconds_to_samples, Result, ScopeError, Signal};

fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Writes `signal` to `path` unchanged.
pub fn write_signal(path: impl AsRef<Path>, signal: &Signal, sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WavWriter::create(path, wav_spec(sample_rate))?;
    for sample in signal.samples() {
        writer.write_sample(sample.x)?;
        writer.write_sample(sample.y)?;
    }
    writer.finalize()?;

    tracing::info!(
        path = %path.display(),
        seconds = signal.duration_seconds(sample_rate),
        "wrote wav"
    );
    Ok(())
}

/// Repeats one refresh cycle for `duration` seconds and writes the result.
///
/// The last repetition is cut wherever the duration ends. An empty cycle
/// produces silence of the requested length.
pub fn write_cycle(
    path: impl AsRef<Path>,
    cycle: &Signal,
    sample_rate: u32,
    duration: f64,
) -> Result<()> {
    if duration.is_nan() || duration <= 0.0 {
        return Err(ScopeError::InvalidDuration(duration));
    }
    let len = seconds_to_samples(duration, sample_rate);
    write_signal(path, &cycle.tiled(len), sample_rate)
}
