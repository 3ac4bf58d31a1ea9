//! The engine: owns the timeline, fans state out to the driver and subscribers.
//!
//! `Engine` is a cheap, clonable, single-threaded handle. All mutation happens
//! synchronously on the calling thread. No `RefCell` borrow is held while host
//! code (listeners, drivers, stability checks) runs, so listeners may call back
//! into the engine.

mod external_clock;
mod instance_sync;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, warn};

use crate::animation_sync::{sync_animations, AnimationScope};
use crate::captions::{find_active_cues, same_cue_ids, CaptionCue, CaptionSource};
use crate::config::EngineOptions;
use crate::diagnostics::{self, DiagnosticReport, HostCapabilities};
use crate::driver::{self, Driver, DriverState, NoopDriver, StableFuture};
use crate::error::{FramelineError, Result};
use crate::ids::{StabilityCheckId, SubscriptionId};
use crate::markers::{sort_markers, validate_marker, validate_markers, Marker};
use crate::schema::{validate_props, validate_schema, InputProps, InputSchema};
use crate::stability::{await_all, StabilityRegistry};
use crate::state::{AudioTrackMeta, AudioTracks, EngineState};
use crate::subscription::SubscriberSet;
use crate::ticker::{ManualTicker, Ticker};
use crate::timeline::Timeline;

use external_clock::ClockLink;
use instance_sync::MasterLink;

fn check_resolution(width: i64, height: i64) -> Result<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(FramelineError::InvalidResolution { width, height }),
    }
}

/// Everything a snapshot is built from.
struct Core {
    timeline: Timeline,
    width: u32,
    height: u32,
    volume: f64,
    muted: bool,
    input_props: InputProps,
    input_schema: Option<InputSchema>,
    audio_tracks: AudioTracks,
    available_audio_tracks: Vec<AudioTrackMeta>,
    captions: Vec<CaptionCue>,
    active_captions: Vec<CaptionCue>,
    markers: Vec<Marker>,
}

impl Core {
    /// Recompute active captions; true when the active set changed.
    fn refresh_captions(&mut self) -> bool {
        let active = find_active_cues(&self.captions, self.timeline.position_ms());
        let changed = !same_cue_ids(&active, &self.active_captions);
        self.active_captions = active;
        changed
    }

    fn driver_state(&self, playing: bool) -> DriverState {
        DriverState {
            is_playing: playing,
            playback_rate: self.timeline.playback_rate(),
            volume: self.volume,
            muted: self.muted,
            audio_tracks: self.audio_tracks.clone(),
        }
    }

    fn snapshot(&self) -> EngineState {
        let t = &self.timeline;
        EngineState {
            width: self.width,
            height: self.height,
            duration: t.duration(),
            fps: t.fps(),
            current_frame: t.frame(),
            current_time: t.current_time(),
            is_playing: t.is_playing(),
            playback_rate: t.playback_rate(),
            looping: t.is_looping(),
            playback_range: t.playback_range(),
            volume: self.volume,
            muted: self.muted,
            input_props: self.input_props.clone(),
            audio_tracks: self.audio_tracks.clone(),
            available_audio_tracks: self.available_audio_tracks.clone(),
            captions: self.captions.clone(),
            active_captions: self.active_captions.clone(),
            markers: self.markers.clone(),
        }
    }
}

struct EngineShared {
    core: RefCell<Core>,
    driver: RefCell<Box<dyn Driver>>,
    ticker: RefCell<Box<dyn Ticker>>,
    subscribers: RefCell<SubscriberSet>,
    stability: RefCell<StabilityRegistry>,
    clock: RefCell<Option<ClockLink>>,
    master: RefCell<Option<MasterLink>>,
    animation_scope: Option<Rc<dyn AnimationScope>>,
    auto_sync: bool,
    disposed: Cell<bool>,
}

/// Reactive frame/time engine for a single composition.
#[derive(Clone)]
pub struct Engine {
    shared: Rc<EngineShared>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.shared.core.borrow();
        f.debug_struct("Engine")
            .field("frame", &core.timeline.frame())
            .field("fps", &core.timeline.fps())
            .field("playing", &core.timeline.is_playing())
            .field("disposed", &self.shared.disposed.get())
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(options: EngineOptions) -> Result<Self> {
        let EngineOptions {
            duration,
            fps,
            width,
            height,
            input_props,
            input_schema,
            playback_rate,
            looping,
            playback_range,
            initial_frame,
            volume,
            muted,
            audio_tracks,
            available_audio_tracks,
            captions,
            markers,
            auto_sync_animations,
            driver,
            ticker,
            animation_scope,
        } = options;

        let mut timeline = Timeline::new(duration, fps)?;
        let (width, height) = check_resolution(width, height)?;
        if let Some(schema) = &input_schema {
            validate_schema(schema)?;
        }
        let input_props = validate_props(&input_props, input_schema.as_ref())?;
        let markers = validate_markers(markers)?;
        let captions = match captions {
            Some(source) => source.into_cues()?,
            None => Vec::new(),
        };
        if let Some(range) = playback_range {
            timeline.set_playback_range(range.start, range.end)?;
        }
        timeline.set_playback_rate(playback_rate);
        timeline.set_loop(looping);
        timeline.seek(initial_frame);

        let auto_sync = auto_sync_animations && animation_scope.is_some();
        if auto_sync_animations && animation_scope.is_none() {
            warn!("auto_sync_animations requested without an animation scope; animation sync disabled");
        }

        let mut core = Core {
            timeline,
            width,
            height,
            volume: if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 1.0 },
            muted,
            input_props,
            input_schema,
            audio_tracks,
            available_audio_tracks,
            captions,
            active_captions: Vec::new(),
            markers,
        };
        core.refresh_captions();

        let mut driver = driver.unwrap_or_else(|| Box::new(NoopDriver));
        driver.init(animation_scope.clone());

        let engine = Engine {
            shared: Rc::new(EngineShared {
                core: RefCell::new(core),
                driver: RefCell::new(driver),
                ticker: RefCell::new(ticker.unwrap_or_else(|| Box::new(ManualTicker::new()))),
                subscribers: RefCell::new(SubscriberSet::new()),
                stability: RefCell::new(StabilityRegistry::new()),
                clock: RefCell::new(None),
                master: RefCell::new(None),
                animation_scope,
                auto_sync,
                disposed: Cell::new(false),
            }),
        };
        engine.push();
        Ok(engine)
    }

    /// Stateless host probe.
    pub fn diagnose(host: &dyn HostCapabilities) -> DiagnosticReport {
        diagnostics::diagnose(host)
    }

    pub fn get_state(&self) -> EngineState {
        self.shared.core.borrow().snapshot()
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.get()
    }

    // ---- internals ----

    fn downgrade(&self) -> Weak<EngineShared> {
        Rc::downgrade(&self.shared)
    }

    fn from_weak(weak: &Weak<EngineShared>) -> Option<Engine> {
        weak.upgrade().map(|shared| Engine { shared })
    }

    fn alive(&self, op: &str) -> bool {
        if self.shared.disposed.get() {
            debug!("{op} ignored: engine disposed");
            return false;
        }
        true
    }

    fn is_clock_bound(&self) -> bool {
        self.shared.clock.borrow().is_some()
    }

    fn is_master_bound(&self) -> bool {
        self.shared.master.borrow().is_some()
    }

    fn with_core<R>(&self, f: impl FnOnce(&mut Core) -> R) -> R {
        f(&mut self.shared.core.borrow_mut())
    }

    /// Send the current position and media state to the driver, then to host
    /// animations when auto-sync is on. While an external clock drives the
    /// engine the driver always sees `is_playing == false`.
    fn push(&self) {
        let clock_bound = self.is_clock_bound();
        let (position_ms, state) = {
            let core = self.shared.core.borrow();
            let playing = core.timeline.is_playing() && !clock_bound;
            (core.timeline.position_ms(), core.driver_state(playing))
        };
        match self.shared.driver.try_borrow_mut() {
            Ok(mut driver) => driver.update(position_ms, &state),
            Err(_) => warn!("driver re-entered the engine during update; nested update skipped"),
        }
        if self.shared.auto_sync {
            if let Some(scope) = &self.shared.animation_scope {
                sync_animations(scope.as_ref(), position_ms);
            }
        }
    }

    fn notify(&self) {
        if self.shared.disposed.get() {
            return;
        }
        let state = self.get_state();
        let listeners = self.shared.subscribers.borrow().snapshot();
        for (id, listener) in listeners {
            // A listener earlier in this pass may have unsubscribed it.
            if self.shared.subscribers.borrow().contains(id) {
                listener(&state);
            }
        }
    }

    fn start_ticker(&self) {
        let weak = self.downgrade();
        let on_tick = Box::new(move |delta_ms: f64| {
            if let Some(engine) = Engine::from_weak(&weak) {
                engine.advance(delta_ms);
            }
        });
        match self.shared.ticker.try_borrow_mut() {
            Ok(mut ticker) => ticker.start(on_tick),
            Err(_) => warn!("ticker busy; start skipped"),
        }
    }

    fn stop_ticker(&self) {
        match self.shared.ticker.try_borrow_mut() {
            Ok(mut ticker) => ticker.stop(),
            Err(_) => warn!("ticker busy; stop skipped"),
        }
    }

    /// Ticker is running and time is ours to advance.
    fn resume_ticker_if_playing(&self) {
        let playing = self.shared.core.borrow().timeline.is_playing();
        if playing && !self.is_clock_bound() && !self.is_master_bound() {
            self.start_ticker();
        }
    }

    // ---- playback ----

    /// Clamp to `[0, total_frames]` and move the playhead.
    pub fn seek(&self, frame: f64) {
        if !self.alive("seek") {
            return;
        }
        let changed = self.with_core(|core| {
            let moved = core.timeline.seek(frame);
            let captions = core.refresh_captions();
            moved || captions
        });
        self.push();
        if changed {
            self.notify();
        }
    }

    pub fn seek_to_time(&self, seconds: f64) {
        let fps = self.shared.core.borrow().timeline.fps();
        self.seek(seconds * fps);
    }

    pub fn play(&self) {
        if !self.alive("play") {
            return;
        }
        if !self.with_core(|core| core.timeline.play()) {
            return;
        }
        self.push();
        self.resume_ticker_if_playing();
        self.notify();
    }

    pub fn pause(&self) {
        if !self.alive("pause") {
            return;
        }
        if !self.with_core(|core| core.timeline.pause()) {
            return;
        }
        self.stop_ticker();
        self.push();
        self.notify();
    }

    /// Advance by `delta_ms` of wall time; normally called by the ticker.
    /// Ignored while paused, while an external clock drives the engine, and
    /// while mirroring another engine.
    pub fn advance(&self, delta_ms: f64) {
        if !self.alive("advance") || self.is_clock_bound() || self.is_master_bound() {
            return;
        }
        let (advance, captions) = self.with_core(|core| {
            let advance = core.timeline.advance(delta_ms);
            (advance, core.refresh_captions())
        });
        if advance.stopped {
            debug!("playback reached an edge without looping; pausing");
            self.stop_ticker();
        }
        if advance.moved || advance.stopped || captions {
            self.push();
            self.notify();
        }
    }

    pub fn set_playback_rate(&self, rate: f64) {
        if !self.alive("set_playback_rate") {
            return;
        }
        if self.with_core(|core| core.timeline.set_playback_rate(rate)) {
            self.push();
            self.notify();
        }
    }

    pub fn set_loop(&self, looping: bool) {
        if !self.alive("set_loop") {
            return;
        }
        if self.with_core(|core| core.timeline.set_loop(looping)) {
            self.notify();
        }
    }

    // ---- retiming ----

    pub fn set_duration(&self, seconds: f64) -> Result<()> {
        if !self.alive("set_duration") {
            return Ok(());
        }
        let changed = self.with_core(|core| -> Result<bool> {
            let changed = core.timeline.set_duration(seconds)?;
            core.refresh_captions();
            Ok(changed)
        })?;
        if changed {
            self.push();
            self.notify();
        }
        Ok(())
    }

    /// Changes the frame rate while keeping the wall-clock position.
    pub fn set_fps(&self, fps: f64) -> Result<()> {
        if !self.alive("set_fps") {
            return Ok(());
        }
        let changed = self.with_core(|core| -> Result<bool> {
            let changed = core.timeline.set_fps(fps)?;
            core.refresh_captions();
            Ok(changed)
        })?;
        if changed {
            self.push();
            self.notify();
        }
        Ok(())
    }

    pub fn set_size(&self, width: i64, height: i64) -> Result<()> {
        if !self.alive("set_size") {
            return Ok(());
        }
        let (width, height) = check_resolution(width, height)?;
        let changed = self.with_core(|core| {
            let changed = (core.width, core.height) != (width, height);
            core.width = width;
            core.height = height;
            changed
        });
        if changed {
            self.notify();
        }
        Ok(())
    }

    /// Restrict playback to `[start, end)` frames. The playhead is not moved.
    pub fn set_playback_range(&self, start: f64, end: f64) -> Result<()> {
        if !self.alive("set_playback_range") {
            return Ok(());
        }
        if self.with_core(|core| core.timeline.set_playback_range(start, end))? {
            self.notify();
        }
        Ok(())
    }

    pub fn clear_playback_range(&self) {
        if !self.alive("clear_playback_range") {
            return;
        }
        if self.with_core(|core| core.timeline.clear_playback_range()) {
            self.notify();
        }
    }

    // ---- markers ----

    pub fn add_marker(&self, marker: Marker) -> Result<()> {
        if !self.alive("add_marker") {
            return Ok(());
        }
        validate_marker(&marker)?;
        self.with_core(|core| {
            if core.markers.iter().any(|m| m.id == marker.id) {
                return Err(FramelineError::DuplicateMarkerId { id: marker.id.clone() });
            }
            core.markers.push(marker);
            sort_markers(&mut core.markers);
            Ok(())
        })?;
        self.notify();
        Ok(())
    }

    /// No-op when absent.
    pub fn remove_marker(&self, id: &str) {
        if !self.alive("remove_marker") {
            return;
        }
        let removed = self.with_core(|core| {
            let before = core.markers.len();
            core.markers.retain(|m| m.id != id);
            core.markers.len() != before
        });
        if removed {
            self.notify();
        }
    }

    pub fn set_markers(&self, markers: Vec<Marker>) -> Result<()> {
        if !self.alive("set_markers") {
            return Ok(());
        }
        let markers = validate_markers(markers)?;
        self.with_core(|core| core.markers = markers);
        self.notify();
        Ok(())
    }

    pub fn seek_to_marker(&self, id: &str) -> Result<()> {
        if !self.alive("seek_to_marker") {
            return Ok(());
        }
        let frame = {
            let core = self.shared.core.borrow();
            let marker = core
                .markers
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| FramelineError::MarkerNotFound { id: id.to_string() })?;
            marker.time * core.timeline.fps()
        };
        self.seek(frame);
        Ok(())
    }

    // ---- captions & props ----

    /// Replace captions. A malformed text blob leaves the current captions intact.
    pub fn set_captions(&self, captions: impl Into<CaptionSource>) -> Result<()> {
        if !self.alive("set_captions") {
            return Ok(());
        }
        let cues = captions.into().into_cues()?;
        self.with_core(|core| {
            core.captions = cues;
            core.refresh_captions();
        });
        self.notify();
        Ok(())
    }

    pub fn set_input_props(&self, props: InputProps) -> Result<()> {
        if !self.alive("set_input_props") {
            return Ok(());
        }
        self.with_core(|core| -> Result<()> {
            core.input_props = validate_props(&props, core.input_schema.as_ref())?;
            Ok(())
        })?;
        self.notify();
        Ok(())
    }

    // ---- audio ----

    /// Clamped to `[0, 1]`; non-finite values are ignored.
    pub fn set_audio_volume(&self, volume: f64) {
        if !self.alive("set_audio_volume") {
            return;
        }
        if !volume.is_finite() {
            warn!("set_audio_volume ignored non-finite volume {volume}");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        let changed = self.with_core(|core| std::mem::replace(&mut core.volume, volume) != volume);
        if changed {
            self.push();
            self.notify();
        }
    }

    pub fn set_audio_muted(&self, muted: bool) {
        if !self.alive("set_audio_muted") {
            return;
        }
        if self.with_core(|core| std::mem::replace(&mut core.muted, muted) != muted) {
            self.push();
            self.notify();
        }
    }

    pub fn set_audio_track_volume(&self, track_id: &str, volume: f64) {
        if !self.alive("set_audio_track_volume") {
            return;
        }
        if !volume.is_finite() {
            warn!("set_audio_track_volume ignored non-finite volume {volume} for '{track_id}'");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        let changed = self.with_core(|core| {
            let track = core.audio_tracks.entry(track_id.to_string()).or_default();
            std::mem::replace(&mut track.volume, volume) != volume
        });
        if changed {
            self.push();
            self.notify();
        }
    }

    pub fn set_audio_track_muted(&self, track_id: &str, muted: bool) {
        if !self.alive("set_audio_track_muted") {
            return;
        }
        let changed = self.with_core(|core| {
            let track = core.audio_tracks.entry(track_id.to_string()).or_default();
            std::mem::replace(&mut track.muted, muted) != muted
        });
        if changed {
            self.push();
            self.notify();
        }
    }

    pub fn set_available_audio_tracks(&self, tracks: Vec<AudioTrackMeta>) {
        if !self.alive("set_available_audio_tracks") {
            return;
        }
        self.with_core(|core| core.available_audio_tracks = tracks);
        self.notify();
    }

    // ---- subscriptions ----

    /// Register a listener. It is called once immediately with the current state.
    pub fn subscribe(&self, listener: impl Fn(&EngineState) + 'static) -> SubscriptionId {
        if self.shared.disposed.get() {
            debug!("subscribe on disposed engine; listener dropped");
            return self.shared.subscribers.borrow_mut().reserve_id();
        }
        let listener: crate::subscription::Listener = Rc::new(listener);
        let id = self.shared.subscribers.borrow_mut().add(listener.clone());
        let state = self.get_state();
        listener(&state);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.subscribers.borrow_mut().remove(id)
    }

    // ---- stability ----

    pub fn register_stability_check(&self, check: impl Fn() -> StableFuture + 'static) -> StabilityCheckId {
        self.shared.stability.borrow_mut().register(Rc::new(check))
    }

    pub fn unregister_stability_check(&self, id: StabilityCheckId) -> bool {
        self.shared.stability.borrow_mut().unregister(id)
    }

    /// Resolves once the driver and every registered check report stable. A
    /// pending virtual-time value is applied first. The engine never awaits this
    /// itself.
    pub fn wait_until_stable(&self) -> StableFuture {
        if !self.alive("wait_until_stable") {
            return driver::ready();
        }
        self.poll_clock();
        let mut futures = Vec::new();
        match self.shared.driver.try_borrow_mut() {
            Ok(mut driver) => futures.push(driver.wait_until_stable()),
            Err(_) => warn!("driver busy; skipping its stability wait"),
        }
        let checks = self.shared.stability.borrow().snapshot();
        futures.extend(checks.iter().map(|check| check()));
        Box::pin(await_all(futures))
    }

    // ---- teardown ----

    /// Terminal: stops time, severs clock and master bindings and drops every
    /// subscriber. Later calls are silent no-ops.
    pub fn dispose(&self) {
        if self.shared.disposed.replace(true) {
            return;
        }
        self.with_core(|core| core.timeline.pause());
        self.stop_ticker();
        self.detach_master();
        self.detach_clock();
        match self.shared.driver.try_borrow_mut() {
            Ok(mut driver) => driver.dispose(),
            Err(_) => warn!("driver busy during dispose"),
        }
        self.shared.subscribers.borrow_mut().clear();
        self.shared.stability.borrow_mut().clear();
        debug!("engine disposed");
    }
}
