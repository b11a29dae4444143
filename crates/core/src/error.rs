use std::path::PathBuf;

/// Result alias that carries the custom [`ScopeError`] type.
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Common error type for the core crate.
///
/// Synthesis itself never fails; these variants come from loading sources,
/// encoding output, talking to the audio device, or caller mistakes such as
/// an empty show.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// The requested source file or directory does not exist.
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    /// The source parsed but yielded no usable paths.
    #[error("no paths found in source")]
    EmptyPathSet,
    /// A fixed-length render was asked for a non-positive duration.
    #[error("duration must be positive, got {0}")]
    InvalidDuration(f64),
    /// The show composer was called without any items.
    #[error("no signals provided for show")]
    EmptyShowInput,
    /// The SVG document could not be parsed.
    #[error("svg: {0}")]
    Svg(String),
    /// The audio output device could not be opened or written.
    #[error("audio device: {0}")]
    Audio(String),
    /// A configuration file was unreadable or inconsistent.
    #[error("config: {0}")]
    Config(String),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("wav: {0}")]
    Wav(#[from] hound::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("fft: {0}")]
    Fft(#[from] realfft::FftError),
    #[error("preview image: {0}")]
    Image(#[from] image::ImageError),
}

impl ScopeError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for ScopeError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ScopeError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
