//! Core library for the Scopewave application.
//!
//! Scopewave turns vector drawings into stereo audio for an oscilloscope in
//! X/Y mode: the left channel drives the beam horizontally, the right
//! channel vertically. Each module owns one stage of that pipeline (source
//! loading, frame synthesis, animation, show sequencing, output) and the
//! `live` module ties them into unbounded playback loops.

pub mod analysis;
pub mod animation;
pub mod assets;
pub mod audio;
pub mod config;
pub mod error;
pub mod geometry;
pub mod live;
pub mod preview;
pub mod record;
pub mod render;
pub mod resample;
pub mod service;
pub mod signal;
pub mod timeline;

pub use analysis::{ChannelStats, SignalAnalysis, SignalAnalyzer};
pub use animation::{frame_count, slice_prefix, synthesize_animation};
pub use assets::{
    load_svg, parse_svg, ChangeMarker, PathSource, SourceCollection, SvgDirectory, SvgFile,
};
pub use audio::{DeviceSink, SampleSink};
pub use config::{AppConfig, LiveConfig, RenderConfig, ShowConfig, SourceConfig};
pub use error::{Result, ScopeError};
pub use geometry::{path_length, transit_lengths, Path, PathSet, Point};
pub use live::{
    play_loop, run_show_live, run_single_live, CancelToken, Clock, LiveSession, LiveSettings,
    PlaybackClock, RenderCache,
};
pub use preview::{render_preview, save_preview};
pub use record::{write_cycle, write_signal};
pub use render::{synthesize_frame, SynthParams};
pub use resample::resample;
pub use service::{RenderRequest, RenderResponse};
pub use signal::{Signal, StereoSample};
pub use timeline::{synthesize_show, ShowItem};
