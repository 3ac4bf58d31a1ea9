use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use frameline_core::{CaptionCue, Driver, DriverState, Engine, EngineOptions, FramelineError};

#[derive(Clone, Default)]
struct RecordingDriver {
    updates: Rc<RefCell<Vec<(f64, DriverState)>>>,
}

impl Driver for RecordingDriver {
    fn update(&mut self, position_ms: f64, state: &DriverState) {
        self.updates.borrow_mut().push((position_ms, state.clone()));
    }
}

fn mk_engine(duration: f64, fps: f64) -> (Engine, RecordingDriver) {
    let driver = RecordingDriver::default();
    let engine = Engine::new(EngineOptions::new(duration, fps).with_driver(driver.clone())).unwrap();
    (engine, driver)
}

#[test]
fn fps_change_preserves_wall_clock_time() {
    let (e, _) = mk_engine(10.0, 30.0);
    e.seek(45.0);
    e.set_fps(60.0).unwrap();
    let s = e.get_state();
    assert_abs_diff_eq!(s.current_frame, 90.0, epsilon = 1e-9);
    assert_abs_diff_eq!(s.current_time, 1.5, epsilon = 1e-9);

    e.set_fps(24.0).unwrap();
    assert_abs_diff_eq!(e.get_state().current_frame, 36.0, epsilon = 1e-9);
}

#[test]
fn shrinking_duration_clamps_down_growing_never_moves() {
    let (e, _) = mk_engine(10.0, 30.0);
    e.seek(250.0);
    e.set_duration(5.0).unwrap();
    assert_eq!(e.get_state().current_frame, 150.0);
    e.set_duration(10.0).unwrap();
    assert_eq!(e.get_state().current_frame, 150.0);
    e.set_duration(0.0).unwrap();
    assert_eq!(e.get_state().current_frame, 0.0);
}

#[test]
fn invalid_retiming_leaves_state_unchanged() {
    let (e, _) = mk_engine(10.0, 30.0);
    e.seek(100.0);
    let before = e.get_state();

    let err = e.set_duration(-1.0).unwrap_err();
    assert_eq!(err, FramelineError::InvalidDuration { duration: -1.0 });
    assert_eq!(err.code(), "INVALID_DURATION");
    let err = e.set_fps(0.0).unwrap_err();
    assert_eq!(err.code(), "INVALID_FPS");
    assert!(e.set_fps(f64::INFINITY).is_err());

    assert_eq!(e.get_state(), before);
}

#[test]
fn retiming_pushes_new_position_to_driver() {
    let (e, driver) = mk_engine(10.0, 30.0);
    e.seek(30.0);
    e.set_fps(60.0).unwrap();
    let updates = driver.updates.borrow();
    let (position_ms, _) = updates.last().unwrap();
    assert_abs_diff_eq!(*position_ms, 1000.0, epsilon = 1e-9);
}

#[test]
fn fps_change_rescales_playback_range() {
    let (e, _) = mk_engine(4.0, 30.0);
    e.set_playback_range(30.0, 60.0).unwrap();
    e.set_fps(15.0).unwrap();
    let range = e.get_state().playback_range.unwrap();
    assert_abs_diff_eq!(range.start, 15.0, epsilon = 1e-9);
    assert_abs_diff_eq!(range.end, 30.0, epsilon = 1e-9);
}

#[test]
fn fps_change_never_pushes_range_past_total() {
    let (e, _) = mk_engine(1.0, 7.0);
    e.set_playback_range(0.0, 7.0).unwrap();
    e.set_fps(29.0).unwrap();
    let s = e.get_state();
    assert!(s.playback_range.unwrap().end <= s.total_frames());

    e.seek(28.5);
    e.play();
    e.advance(1000.0);
    let s = e.get_state();
    assert!(s.current_frame <= s.total_frames());
    assert!(!s.is_playing);
}

#[test]
fn duration_shrink_drops_collapsed_range() {
    let (e, _) = mk_engine(4.0, 30.0);
    e.set_playback_range(60.0, 90.0).unwrap();
    e.set_duration(2.0).unwrap();
    assert_eq!(e.get_state().playback_range, None);
}

#[test]
fn clamped_frame_refreshes_active_captions() {
    let driver = RecordingDriver::default();
    let e = Engine::new(
        EngineOptions::new(10.0, 10.0)
            .with_driver(driver)
            .with_captions(vec![CaptionCue::new("end", 1500.0, 2500.0, "tail")]),
    )
    .unwrap();
    e.seek(80.0);
    assert!(e.get_state().active_captions.is_empty());
    e.set_duration(2.0).unwrap();
    let s = e.get_state();
    assert_eq!(s.current_frame, 20.0);
    assert_eq!(s.active_captions.len(), 1);
}
