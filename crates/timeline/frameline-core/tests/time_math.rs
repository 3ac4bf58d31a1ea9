use approx::assert_abs_diff_eq;
use frameline_core::{Engine, EngineOptions, ManualTicker, Ticker};

// 1.875 s at 32 fps = 60 frames; 31.25 ms is exactly one frame.
const FPS: f64 = 32.0;
const DURATION: f64 = 1.875;
const ONE_FRAME_MS: f64 = 31.25;

fn mk_engine(looping: bool) -> Engine {
    Engine::new(EngineOptions::new(DURATION, FPS).with_loop(looping)).unwrap()
}

fn frame(engine: &Engine) -> f64 {
    engine.get_state().current_frame
}

#[test]
fn forward_loop_wraps_to_start() {
    let e = mk_engine(true);
    e.seek(59.0);
    e.play();
    e.advance(ONE_FRAME_MS);
    assert_abs_diff_eq!(frame(&e), 0.0, epsilon = 1e-9);
    assert!(e.get_state().is_playing);
}

#[test]
fn forward_loop_keeps_fractional_overflow() {
    let e = mk_engine(true);
    e.seek(59.5);
    e.play();
    e.advance(ONE_FRAME_MS);
    assert_abs_diff_eq!(frame(&e), 0.5, epsilon = 1e-9);
}

#[test]
fn overshooting_several_spans_wraps_once() {
    let e = mk_engine(true);
    e.play();
    e.advance(ONE_FRAME_MS * 125.0);
    assert_abs_diff_eq!(frame(&e), 5.0, epsilon = 1e-9);
}

#[test]
fn overshoot_without_loop_clamps_and_pauses() {
    let e = mk_engine(false);
    e.seek(59.5);
    e.play();
    e.advance(ONE_FRAME_MS);
    let s = e.get_state();
    assert_eq!(s.current_frame, 60.0);
    assert!(!s.is_playing);
}

#[test]
fn negative_rate_reverses() {
    let e = mk_engine(false);
    e.seek(30.0);
    e.set_playback_rate(-2.0);
    e.play();
    e.advance(ONE_FRAME_MS);
    assert_abs_diff_eq!(frame(&e), 28.0, epsilon = 1e-9);
}

#[test]
fn reverse_loop_wraps_to_end() {
    let e = mk_engine(true);
    e.seek(0.5);
    e.set_playback_rate(-1.0);
    e.play();
    e.advance(ONE_FRAME_MS);
    assert_abs_diff_eq!(frame(&e), 59.5, epsilon = 1e-9);
    assert!(e.get_state().is_playing);
}

#[test]
fn reverse_without_loop_clamps_at_zero() {
    let e = mk_engine(false);
    e.seek(0.5);
    e.set_playback_rate(-1.0);
    e.play();
    e.advance(ONE_FRAME_MS);
    let s = e.get_state();
    assert_eq!(s.current_frame, 0.0);
    assert!(!s.is_playing);
}

#[test]
fn zero_rate_holds_position() {
    let e = mk_engine(true);
    e.seek(12.0);
    e.set_playback_rate(0.0);
    e.play();
    e.advance(1000.0);
    assert_eq!(frame(&e), 12.0);
    assert!(e.get_state().is_playing);
}

#[test]
fn range_loops_within_itself_both_ways() {
    let e = mk_engine(true);
    e.set_playback_range(30.0, 60.0).unwrap();
    e.seek(59.5);
    e.play();
    e.advance(ONE_FRAME_MS);
    assert_abs_diff_eq!(frame(&e), 30.5, epsilon = 1e-9);

    e.set_playback_rate(-1.0);
    e.advance(ONE_FRAME_MS);
    assert_abs_diff_eq!(frame(&e), 59.5, epsilon = 1e-9);
}

#[test]
fn range_without_loop_clamps_at_each_edge() {
    let e = mk_engine(false);
    e.set_playback_range(30.0, 50.0).unwrap();
    e.seek(49.5);
    e.play();
    e.advance(ONE_FRAME_MS);
    assert_eq!(frame(&e), 50.0);
    assert!(!e.get_state().is_playing);

    e.seek(30.5);
    e.set_playback_rate(-1.0);
    e.play();
    e.advance(ONE_FRAME_MS);
    assert_eq!(frame(&e), 30.0);
    assert!(!e.get_state().is_playing);
}

#[test]
fn playhead_before_range_walks_into_it() {
    let e = mk_engine(true);
    e.set_playback_range(30.0, 60.0).unwrap();
    assert_eq!(frame(&e), 0.0);
    e.play();
    e.advance(ONE_FRAME_MS * 10.0);
    assert_abs_diff_eq!(frame(&e), 10.0, epsilon = 1e-9);
}

#[test]
fn seek_ignores_range_and_clamps_to_timeline() {
    let e = mk_engine(false);
    e.set_playback_range(30.0, 40.0).unwrap();
    e.seek(10.0);
    assert_eq!(frame(&e), 10.0);
    e.seek(500.0);
    assert_eq!(frame(&e), 60.0);
    e.seek(-500.0);
    assert_eq!(frame(&e), 0.0);
}

#[test]
fn ticker_drives_playback_and_stops_at_edge() {
    let ticker = ManualTicker::new();
    let e = Engine::new(EngineOptions::new(DURATION, FPS).with_ticker(ticker.clone())).unwrap();
    assert!(!ticker.is_running());

    e.play();
    assert!(ticker.is_running());
    ticker.tick_n(10, ONE_FRAME_MS);
    assert_abs_diff_eq!(frame(&e), 10.0, epsilon = 1e-9);

    e.pause();
    assert!(!ticker.is_running());
    assert!(!ticker.tick(ONE_FRAME_MS));
    assert_abs_diff_eq!(frame(&e), 10.0, epsilon = 1e-9);

    e.play();
    let delivered = ticker.tick_n(100, ONE_FRAME_MS);
    assert_eq!(delivered, 50);
    assert_eq!(frame(&e), 60.0);
    assert!(!ticker.is_running());
}

#[test]
fn paused_engine_ignores_advance() {
    let e = mk_engine(true);
    e.advance(1000.0);
    assert_eq!(frame(&e), 0.0);
}

#[test]
fn play_and_pause_are_idempotent() {
    let ticker = ManualTicker::new();
    let e = Engine::new(EngineOptions::new(DURATION, FPS).with_ticker(ticker.clone())).unwrap();
    e.play();
    e.play();
    ticker.tick(ONE_FRAME_MS);
    assert_abs_diff_eq!(frame(&e), 1.0, epsilon = 1e-9);
    e.pause();
    e.pause();
    assert!(!e.get_state().is_playing);
}
