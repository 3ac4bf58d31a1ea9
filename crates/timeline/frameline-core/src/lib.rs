//! Frameline Core (host-agnostic)
//!
//! A frame-accurate time/state engine for programmatically authored video. The
//! current frame is the single source of truth; play/pause, rate, looping,
//! trimmed ranges, retiming, captions and markers are all derived from it.
//! How time advances is pluggable: a [`Ticker`] for live preview, explicit
//! [`Engine::seek`] calls for frame-exact capture, an external
//! [`TimelineClock`] with a [`VirtualTimeSlot`] override, or another engine via
//! [`Engine::bind_to`].

pub mod animation_sync;
pub mod captions;
pub mod clock;
pub mod color;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod easing;
pub mod engine;
pub mod error;
pub mod ids;
pub mod interpolate;
pub mod markers;
pub mod random;
pub mod render_session;
pub mod schema;
pub mod sequencing;
pub mod stability;
pub mod state;
pub mod subscription;
pub mod ticker;
pub mod timecode;
pub mod timeline;
pub mod transitions;

// Re-exports for consumers (adapters)
pub use animation_sync::{AnimationRegistry, AnimationScope, HostAnimation};
pub use captions::{
    find_active_cues, parse_captions, parse_srt, parse_webvtt, stringify_srt, CaptionCue,
    CaptionSource,
};
pub use color::{interpolate_colors, parse_color, Rgba};
pub use clock::{ManualClock, TimelineBinding, TimelineClock, VirtualTimeSlot};
pub use config::EngineOptions;
pub use diagnostics::{DiagnosticReport, HeadlessHost, HostCapabilities};
pub use driver::{Driver, DriverState, NoopDriver, StableFuture};
pub use easing::{EaseMode, Easing};
pub use engine::Engine;
pub use error::{FramelineError, Result};
pub use ids::{StabilityCheckId, SubscriptionId};
pub use interpolate::{interpolate, Extrapolate, InterpolateOptions};
pub use markers::Marker;
pub use random::{random, Seed};
pub use render_session::{AbortFlag, CaptureTarget, RenderSession};
pub use schema::{InputProps, InputSchema, PropDefinition, PropType};
pub use sequencing::{sequence, SequenceState};
pub use state::{AudioTrackMeta, AudioTrackState, AudioTracks, EngineState};
pub use ticker::{ManualTicker, TickCallback, Ticker, WallClockTicker};
pub use timecode::{frames_to_timecode, frames_to_timestamp, timecode_to_frames};
pub use timeline::{PlaybackRange, Timeline};
pub use transitions::{crossfade, transition, Crossfade};
