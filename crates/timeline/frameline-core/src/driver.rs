//! Drivers receive the engine's position and report when the host has caught up.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::animation_sync::AnimationScope;
use crate::error::{FramelineError, Result};
use crate::state::AudioTracks;

pub type StableFuture = Pin<Box<dyn Future<Output = Result<()>>>>;

/// Already-resolved stability future.
pub fn ready() -> StableFuture {
    Box::pin(std::future::ready(Ok::<(), FramelineError>(())))
}

/// What media should be doing, sent with every position update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverState {
    pub is_playing: bool,
    pub playback_rate: f64,
    pub volume: f64,
    pub muted: bool,
    pub audio_tracks: AudioTracks,
}

pub trait Driver {
    fn init(&mut self, _scope: Option<Rc<dyn AnimationScope>>) {}

    /// Called on every change to position or media state.
    fn update(&mut self, position_ms: f64, state: &DriverState);

    /// Resolves once the host has presented the last update (media seeked,
    /// fonts loaded, ...).
    fn wait_until_stable(&mut self) -> StableFuture {
        ready()
    }

    fn dispose(&mut self) {}
}

/// Driver for hosts with nothing to drive.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDriver;

impl Driver for NoopDriver {
    fn update(&mut self, _position_ms: f64, _state: &DriverState) {}
}
