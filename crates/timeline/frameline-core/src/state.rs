//! Immutable snapshot handed to subscribers and returned by `Engine::get_state`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::captions::CaptionCue;
use crate::markers::Marker;
use crate::schema::InputProps;
use crate::timeline::PlaybackRange;

/// Per-track mix. Tracks absent from the map play at full volume, unmuted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioTrackState {
    pub volume: f64,
    pub muted: bool,
}

impl Default for AudioTrackState {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
        }
    }
}

/// Description of an audio track the host can play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrackMeta {
    pub id: String,
    /// Seconds from composition start.
    #[serde(default)]
    pub start_time: f64,
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
}

pub type AudioTracks = BTreeMap<String, AudioTrackState>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub width: u32,
    pub height: u32,
    /// Seconds.
    pub duration: f64,
    pub fps: f64,
    pub current_frame: f64,
    /// Seconds; always `current_frame / fps`.
    pub current_time: f64,
    pub is_playing: bool,
    pub playback_rate: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub playback_range: Option<PlaybackRange>,
    pub volume: f64,
    pub muted: bool,
    pub input_props: InputProps,
    pub audio_tracks: AudioTracks,
    pub available_audio_tracks: Vec<AudioTrackMeta>,
    pub captions: Vec<CaptionCue>,
    pub active_captions: Vec<CaptionCue>,
    pub markers: Vec<Marker>,
}

impl EngineState {
    #[inline]
    pub fn total_frames(&self) -> f64 {
        self.duration * self.fps
    }
}
