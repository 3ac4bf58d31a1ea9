//! Error types for the timeline engine

use serde::{Deserialize, Serialize};

/// Every failure the engine can report. Mutations that return one of these leave
/// the engine state untouched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FramelineError {
    /// Duration is negative or not a finite number
    #[error("Invalid duration: {duration}")]
    InvalidDuration { duration: f64 },

    /// Frame rate is zero, negative or not a finite number
    #[error("Invalid fps: {fps}")]
    InvalidFps { fps: f64 },

    /// Canvas width or height is not positive
    #[error("Invalid resolution: {width}x{height}")]
    InvalidResolution { width: i64, height: i64 },

    /// Playback range does not satisfy 0 <= start < end <= total frames
    #[error("Invalid playback range [{start}, {end}] for timeline of {total_frames} frames")]
    InvalidRange {
        start: f64,
        end: f64,
        total_frames: f64,
    },

    /// A marker with the same id already exists
    #[error("Marker with id '{id}' already exists")]
    DuplicateMarkerId { id: String },

    /// No marker with the requested id
    #[error("Marker not found: {id}")]
    MarkerNotFound { id: String },

    /// Marker failed validation (empty id, negative or non-finite time)
    #[error("Invalid marker: {reason}")]
    InvalidMarker { reason: String },

    /// SRT text could not be parsed
    #[error("Invalid SRT format: {reason}")]
    InvalidSrtFormat { reason: String },

    /// WebVTT text could not be parsed
    #[error("Invalid WebVTT format: {reason}")]
    InvalidWebVttFormat { reason: String },

    /// Timecode string is not HH:MM:SS:FF
    #[error("Invalid timecode format: {timecode}")]
    InvalidTimecodeFormat { timecode: String },

    /// Input props rejected by the schema
    #[error("Invalid input props: {reason}")]
    InvalidInputProps { reason: String },

    /// The schema itself is inconsistent
    #[error("Invalid input schema: {reason}")]
    InvalidSchema { reason: String },

    /// A registered stability check or the driver reported failure
    #[error("Stability check failed: {reason}")]
    StabilityCheckFailed { reason: String },

    /// Interpolation ranges have mismatched lengths or fewer than two stops
    #[error("Invalid input range: {reason}")]
    InvalidInputRange { reason: String },

    /// Interpolation input stops are not strictly increasing
    #[error("Input range must be strictly increasing: found {previous} >= {next} at index {index}")]
    UnsortedInputRange {
        index: usize,
        previous: f64,
        next: f64,
    },

    /// Color string is not hex, rgb(a) or hsl(a)
    #[error("Invalid color '{color}': {reason}")]
    InvalidColorFormat { color: String, reason: String },

    /// Capture range does not satisfy 0 <= start <= end
    #[error("Invalid render range [{start_frame}, {end_frame}]")]
    InvalidRenderRange { start_frame: f64, end_frame: f64 },
}

impl FramelineError {
    /// Stable machine-readable code, suitable for host error mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDuration { .. } => "INVALID_DURATION",
            Self::InvalidFps { .. } => "INVALID_FPS",
            Self::InvalidResolution { .. } => "INVALID_RESOLUTION",
            Self::InvalidRange { .. } => "INVALID_RANGE",
            Self::DuplicateMarkerId { .. } => "DUPLICATE_MARKER_ID",
            Self::MarkerNotFound { .. } => "MARKER_NOT_FOUND",
            Self::InvalidMarker { .. } => "INVALID_MARKER",
            Self::InvalidSrtFormat { .. } => "INVALID_SRT_FORMAT",
            Self::InvalidWebVttFormat { .. } => "INVALID_WEBVTT_FORMAT",
            Self::InvalidTimecodeFormat { .. } => "INVALID_TIMECODE_FORMAT",
            Self::InvalidInputProps { .. } => "INVALID_INPUT_PROPS",
            Self::InvalidSchema { .. } => "INVALID_SCHEMA",
            Self::StabilityCheckFailed { .. } => "STABILITY_CHECK_FAILED",
            Self::InvalidInputRange { .. } => "INVALID_INPUT_RANGE",
            Self::UnsortedInputRange { .. } => "UNSORTED_INPUT_RANGE",
            Self::InvalidColorFormat { .. } => "INVALID_COLOR_FORMAT",
            Self::InvalidRenderRange { .. } => "INVALID_RENDER_RANGE",
        }
    }

    /// Human-facing hint on how to fix the call that produced this error.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidDuration { .. } => "Duration must be a finite number of seconds >= 0.",
            Self::InvalidFps { .. } => "FPS must be a finite number greater than 0.",
            Self::InvalidResolution { .. } => "Width and height must both be greater than 0.",
            Self::InvalidRange { .. } => {
                "Ensure 0 <= start < end <= duration * fps, in frames."
            }
            Self::DuplicateMarkerId { .. } => "Use a unique id or remove the existing marker first.",
            Self::MarkerNotFound { .. } => "Check the marker id against get_state().markers.",
            Self::InvalidMarker { .. } => "Markers need a non-empty id and a time >= 0.",
            Self::InvalidSrtFormat { .. } => "Expect 'HH:MM:SS,mmm --> HH:MM:SS,mmm' cue lines.",
            Self::InvalidWebVttFormat { .. } => {
                "The file must start with WEBVTT and use 'MM:SS.mmm --> MM:SS.mmm' timings."
            }
            Self::InvalidTimecodeFormat { .. } => "Use HH:MM:SS:FF.",
            Self::InvalidInputProps { .. } => "Check the props against the input schema.",
            Self::InvalidSchema { .. } => "Schema defaults must satisfy their own definitions.",
            Self::StabilityCheckFailed { .. } => "Inspect the failing check or driver.",
            Self::InvalidInputRange { .. } => {
                "Provide at least 2 input stops and one output per input."
            }
            Self::UnsortedInputRange { .. } => "Sort the input range in ascending order.",
            Self::InvalidColorFormat { .. } => "Use #RGB[A], #RRGGBB[AA], rgb(a)(...) or hsl(a)(...).",
            Self::InvalidRenderRange { .. } => "Ensure 0 <= start_frame <= end_frame.",
        }
    }

    /// Error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidDuration { .. }
            | Self::InvalidFps { .. }
            | Self::InvalidResolution { .. }
            | Self::InvalidRange { .. } => "timeline",
            Self::DuplicateMarkerId { .. }
            | Self::MarkerNotFound { .. }
            | Self::InvalidMarker { .. } => "markers",
            Self::InvalidSrtFormat { .. } | Self::InvalidWebVttFormat { .. } => "captions",
            Self::InvalidTimecodeFormat { .. } => "timecode",
            Self::InvalidInputProps { .. } | Self::InvalidSchema { .. } => "props",
            Self::StabilityCheckFailed { .. } => "stability",
            Self::InvalidInputRange { .. } | Self::UnsortedInputRange { .. } => "interpolation",
            Self::InvalidColorFormat { .. } => "color",
            Self::InvalidRenderRange { .. } => "render",
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, FramelineError>;
