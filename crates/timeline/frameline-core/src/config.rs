//! Construction options for `Engine`.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::animation_sync::AnimationScope;
use crate::captions::CaptionSource;
use crate::driver::Driver;
use crate::markers::Marker;
use crate::schema::{InputProps, InputSchema};
use crate::state::{AudioTrackMeta, AudioTracks};
use crate::ticker::Ticker;
use crate::timeline::PlaybackRange;

fn default_fps() -> f64 {
    30.0
}

fn default_width() -> i64 {
    1920
}

fn default_height() -> i64 {
    1080
}

fn default_unit() -> f64 {
    1.0
}

/// Engine options. The data fields deserialize from JSON; `duration` is the only
/// required key. Collaborators (driver, ticker, animation scope) are attached
/// with the builder methods.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    /// Seconds.
    pub duration: f64,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default = "default_width")]
    pub width: i64,
    #[serde(default = "default_height")]
    pub height: i64,
    #[serde(default)]
    pub input_props: InputProps,
    #[serde(default, alias = "schema")]
    pub input_schema: Option<InputSchema>,
    #[serde(default = "default_unit")]
    pub playback_rate: f64,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub playback_range: Option<PlaybackRange>,
    /// Clamped into the timeline.
    #[serde(default)]
    pub initial_frame: f64,
    #[serde(default = "default_unit")]
    pub volume: f64,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub audio_tracks: AudioTracks,
    #[serde(default)]
    pub available_audio_tracks: Vec<AudioTrackMeta>,
    #[serde(default)]
    pub captions: Option<CaptionSource>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    /// Seek and pause host animations to the playhead on every update.
    #[serde(default)]
    pub auto_sync_animations: bool,

    #[serde(skip)]
    pub driver: Option<Box<dyn Driver>>,
    #[serde(skip)]
    pub ticker: Option<Box<dyn Ticker>>,
    #[serde(skip)]
    pub animation_scope: Option<Rc<dyn AnimationScope>>,
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("duration", &self.duration)
            .field("fps", &self.fps)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("playback_rate", &self.playback_rate)
            .field("loop", &self.looping)
            .field("playback_range", &self.playback_range)
            .field("initial_frame", &self.initial_frame)
            .field("markers", &self.markers.len())
            .field("auto_sync_animations", &self.auto_sync_animations)
            .field("driver", &self.driver.is_some())
            .field("ticker", &self.ticker.is_some())
            .field("animation_scope", &self.animation_scope.is_some())
            .finish_non_exhaustive()
    }
}

impl EngineOptions {
    pub fn new(duration: f64, fps: f64) -> Self {
        Self {
            duration,
            fps,
            width: default_width(),
            height: default_height(),
            input_props: InputProps::new(),
            input_schema: None,
            playback_rate: default_unit(),
            looping: false,
            playback_range: None,
            initial_frame: 0.0,
            volume: default_unit(),
            muted: false,
            audio_tracks: AudioTracks::new(),
            available_audio_tracks: Vec::new(),
            captions: None,
            markers: Vec::new(),
            auto_sync_animations: false,
            driver: None,
            ticker: None,
            animation_scope: None,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_size(mut self, width: i64, height: i64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_playback_rate(mut self, rate: f64) -> Self {
        self.playback_rate = rate;
        self
    }

    pub fn with_playback_range(mut self, start: f64, end: f64) -> Self {
        self.playback_range = Some(PlaybackRange::new(start, end));
        self
    }

    pub fn with_initial_frame(mut self, frame: f64) -> Self {
        self.initial_frame = frame;
        self
    }

    pub fn with_input_props(mut self, props: InputProps) -> Self {
        self.input_props = props;
        self
    }

    pub fn with_schema(mut self, schema: InputSchema) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn with_captions(mut self, captions: impl Into<CaptionSource>) -> Self {
        self.captions = Some(captions.into());
        self
    }

    pub fn with_markers(mut self, markers: Vec<Marker>) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn with_driver(mut self, driver: impl Driver + 'static) -> Self {
        self.driver = Some(Box::new(driver));
        self
    }

    pub fn with_ticker(mut self, ticker: impl Ticker + 'static) -> Self {
        self.ticker = Some(Box::new(ticker));
        self
    }

    pub fn with_animation_scope(mut self, scope: Rc<dyn AnimationScope>) -> Self {
        self.animation_scope = Some(scope);
        self
    }

    pub fn with_auto_sync_animations(mut self, enabled: bool) -> Self {
        self.auto_sync_animations = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_defaults() {
        let opts = EngineOptions::from_json(r#"{"duration": 5, "fps": 24, "loop": true}"#).unwrap();
        assert_eq!(opts.duration, 5.0);
        assert_eq!(opts.fps, 24.0);
        assert!(opts.looping);
        assert_eq!((opts.width, opts.height), (1920, 1080));
        assert_eq!(opts.playback_rate, 1.0);
        assert_eq!(opts.volume, 1.0);
        assert!(opts.driver.is_none());
    }

    #[test]
    fn json_without_duration_is_rejected() {
        let err = EngineOptions::from_json(r#"{"fps": 30}"#).unwrap_err();
        assert!(err.to_string().contains("duration"));
        assert!(EngineOptions::from_json(r#"{"duration": 2}"#).is_ok());
    }

    #[test]
    fn json_captions_text_or_cues() {
        let opts = EngineOptions::from_json(
            r#"{"duration": 5, "fps": 30, "captions": "1\n00:00:01,000 --> 00:00:02,000\nHi"}"#,
        )
        .unwrap();
        assert!(matches!(opts.captions, Some(CaptionSource::Text(_))));

        let opts = EngineOptions::from_json(
            r#"{"duration": 5, "fps": 30, "captions": [{"id":"a","startTime":0,"endTime":10,"text":"x"}]}"#,
        )
        .unwrap();
        assert!(matches!(opts.captions, Some(CaptionSource::Cues(ref c)) if c.len() == 1));
    }
}
