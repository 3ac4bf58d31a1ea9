use std::cell::{Cell, RefCell};
use std::rc::Rc;

use frameline_core::{
    AnimationRegistry, AudioTrackMeta, AudioTrackState, Driver, DriverState, Engine,
    EngineOptions, HostAnimation,
};

#[derive(Clone, Default)]
struct RecordingDriver {
    updates: Rc<RefCell<Vec<(f64, DriverState)>>>,
}

impl Driver for RecordingDriver {
    fn update(&mut self, position_ms: f64, state: &DriverState) {
        self.updates.borrow_mut().push((position_ms, state.clone()));
    }
}

impl RecordingDriver {
    fn last(&self) -> DriverState {
        self.updates.borrow().last().map(|(_, s)| s.clone()).unwrap()
    }
}

fn mk_engine() -> (Engine, RecordingDriver) {
    let driver = RecordingDriver::default();
    let e = Engine::new(EngineOptions::new(10.0, 30.0).with_driver(driver.clone())).unwrap();
    (e, driver)
}

#[test]
fn volume_is_clamped_and_pushed() {
    let (e, driver) = mk_engine();
    e.set_audio_volume(1.7);
    assert_eq!(e.get_state().volume, 1.0);
    e.set_audio_volume(-3.0);
    assert_eq!(e.get_state().volume, 0.0);
    assert_eq!(driver.last().volume, 0.0);
    e.set_audio_volume(f64::NAN);
    assert_eq!(e.get_state().volume, 0.0);

    e.set_audio_muted(true);
    assert!(e.get_state().muted);
    assert!(driver.last().muted);
}

#[test]
fn track_mix_defaults_and_updates() {
    let (e, driver) = mk_engine();
    e.set_audio_track_muted("music", true);
    let track = e.get_state().audio_tracks["music"];
    assert_eq!(
        track,
        AudioTrackState {
            volume: 1.0,
            muted: true
        }
    );

    e.set_audio_track_volume("voice", 0.25);
    let state = driver.last();
    assert_eq!(state.audio_tracks["voice"].volume, 0.25);
    assert!(!state.audio_tracks["voice"].muted);
}

#[test]
fn available_tracks_are_reported() {
    let (e, _) = mk_engine();
    e.set_available_audio_tracks(vec![AudioTrackMeta {
        id: "bgm".into(),
        start_time: 0.0,
        duration: 10.0,
    }]);
    assert_eq!(e.get_state().available_audio_tracks[0].id, "bgm");
}

#[test]
fn driver_receives_rate_and_play_state() {
    let (e, driver) = mk_engine();
    let initial = driver.updates.borrow().len();
    assert_eq!(initial, 1);

    e.set_playback_rate(-1.5);
    e.play();
    let state = driver.last();
    assert!(state.is_playing);
    assert_eq!(state.playback_rate, -1.5);

    e.seek(30.0);
    let (position_ms, _) = driver.updates.borrow().last().cloned().unwrap();
    assert_eq!(position_ms, 1000.0);
}

#[derive(Default)]
struct FakeAnimation {
    time: Cell<f64>,
    paused: Cell<bool>,
}

impl HostAnimation for FakeAnimation {
    fn set_current_time(&self, time_ms: f64) {
        self.time.set(time_ms);
    }
    fn pause(&self) {
        self.paused.set(true);
    }
    fn is_paused(&self) -> bool {
        self.paused.get()
    }
}

#[test]
fn auto_sync_holds_host_animations_on_the_playhead() {
    let registry = Rc::new(AnimationRegistry::new());
    let anim = Rc::new(FakeAnimation::default());
    registry.register(anim.clone());

    let e = Engine::new(
        EngineOptions::new(10.0, 30.0)
            .with_animation_scope(registry.clone())
            .with_auto_sync_animations(true),
    )
    .unwrap();
    assert!(anim.paused.get());

    e.seek(45.0);
    assert_eq!(anim.time.get(), 1500.0);

    e.play();
    e.advance(500.0);
    assert_eq!(anim.time.get(), 2000.0);
}

#[test]
fn animations_untouched_without_auto_sync() {
    let registry = Rc::new(AnimationRegistry::new());
    let anim = Rc::new(FakeAnimation::default());
    registry.register(anim.clone());
    let e = Engine::new(EngineOptions::new(10.0, 30.0).with_animation_scope(registry)).unwrap();
    e.seek(45.0);
    assert_eq!(anim.time.get(), 0.0);
    assert!(!anim.paused.get());
}

#[test]
fn auto_sync_without_scope_is_harmless() {
    let e = Engine::new(EngineOptions::new(10.0, 30.0).with_auto_sync_animations(true)).unwrap();
    e.seek(15.0);
    assert_eq!(e.get_state().current_frame, 15.0);
}
