//! Destinations for finished samples.
//!
//! A sink is opened for a sample rate with two channels. `write` blocks
//! until the consumer has accepted the buffer, and that blocking is what
//! paces every playback loop in [`crate::live`].

use crate::{Result, Signal};

/// Number of interleaved channels every sink receives: X then Y.
pub const CHANNELS: u16 = 2;

/// Blocking consumer of stereo signals.
pub trait SampleSink {
    fn sample_rate(&self) -> u32;

    /// Hands `signal` to the consumer, returning once it has been accepted.
    fn write(&mut self, signal: &Signal) -> Result<()>;

    /// Releases the underlying resource. Writing after `close` is an error
    /// for device sinks; closing twice is harmless.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: SampleSink + ?Sized> SampleSink for Box<S> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn write(&mut self, signal: &Signal) -> Result<()> {
        (**self).write(signal)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

#[cfg(feature = "playback")]
pub use device::DeviceSink;

#[cfg(feature = "playback")]
mod device {
    use std::{thread, time::Duration};

    use rodio::{buffer::SamplesBuffer, OutputStream, Sink};

    use super::{SampleSink, CHANNELS};
    use crate::{Result, ScopeError, Signal};

    /// Buffers allowed in the device queue before `write` blocks: one
    /// playing, one waiting.
    const MAX_QUEUED: usize = 2;
    const POLL: Duration = Duration::from_millis(1);

    /// Default system output device.
    pub struct DeviceSink {
        // Dropping the stream tears down the device, so it lives as long as
        // the sink does.
        _stream: OutputStream,
        sink: Option<Sink>,
        sample_rate: u32,
    }

    impl DeviceSink {
        pub fn open(sample_rate: u32) -> Result<Self> {
            let (stream, handle) =
                OutputStream::try_default().map_err(|err| ScopeError::Audio(err.to_string()))?;
            let sink = Sink::try_new(&handle).map_err(|err| ScopeError::Audio(err.to_string()))?;
            tracing::info!(sample_rate, channels = CHANNELS, "opened audio device");
            Ok(Self {
                _stream: stream,
                sink: Some(sink),
                sample_rate,
            })
        }
    }

    impl SampleSink for DeviceSink {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn write(&mut self, signal: &Signal) -> Result<()> {
            let sink = self
                .sink
                .as_ref()
                .ok_or_else(|| ScopeError::Audio("device already closed".into()))?;
            if signal.is_empty() {
                return Ok(());
            }

            sink.append(SamplesBuffer::new(
                CHANNELS,
                self.sample_rate,
                signal.interleaved(),
            ));
            while sink.len() > MAX_QUEUED {
                thread::sleep(POLL);
            }
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            if let Some(sink) = self.sink.take() {
                sink.stop();
                tracing::info!("closed audio device");
            }
            Ok(())
        }
    }

    impl Drop for DeviceSink {
        fn drop(&mut self) {
            let _ = self.close();
        }
    }

    impl std::fmt::Debug for DeviceSink {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("DeviceSink")
                .field("sample_rate", &self.sample_rate)
                .field("open", &self.sink.is_some())
                .finish()
        }
    }
}

/// Stand-in used when the crate is built without the `playback` feature.
#[cfg(not(feature = "playback"))]
#[derive(Debug)]
pub struct DeviceSink {
    sample_rate: u32,
}

#[cfg(not(feature = "playback"))]
impl DeviceSink {
    pub fn open(sample_rate: u32) -> Result<Self> {
        tracing::debug!(sample_rate, "device output requested without playback support");
        Err(crate::ScopeError::Audio(
            "built without the `playback` feature".into(),
        ))
    }
}

#[cfg(not(feature = "playback"))]
impl SampleSink for DeviceSink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn write(&mut self, _signal: &Signal) -> Result<()> {
        Err(crate::ScopeError::Audio("no audio device".into()))
    }
}
