//! Frame/time state machine: the numeric core of the engine.
//!
//! Every mutator returns whether it changed anything so the caller can decide
//! whether to push to the driver and notify subscribers. Nothing here performs
//! I/O or calls back into host code.

use serde::{Deserialize, Serialize};

use crate::error::{FramelineError, Result};

/// Trimmed region of the timeline, in frames. `0 <= start < end <= total_frames`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRange {
    pub start: f64,
    pub end: f64,
}

impl PlaybackRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.end - self.start
    }
}

/// Outcome of a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Advance {
    /// The frame moved.
    pub moved: bool,
    /// Playback hit an edge with looping off and stopped.
    pub stopped: bool,
}

/// Reconcile a candidate frame against `[lo, hi]` for a tick moving at `rate`.
///
/// Returns the settled frame and whether playback must stop. Looping wraps with a
/// Euclidean remainder, so fractional overflow survives and any number of
/// overshot spans collapses into one. Without looping the playhead clamps at the
/// edge it is moving towards; a stalled (zero-rate) playhead sitting on `lo`
/// stops there too.
pub fn reconcile(next: f64, lo: f64, hi: f64, rate: f64, looping: bool) -> (f64, bool) {
    let span = hi - lo;
    if next.is_nan() {
        return (lo, !looping);
    }
    if looping && span > 0.0 {
        // An overflowed step has no meaningful remainder.
        if next.is_infinite() {
            return (lo, false);
        }
        let wrap = (rate > 0.0 && next >= hi) || (rate < 0.0 && next < lo);
        if wrap {
            return (lo + (next - lo).rem_euclid(span), false);
        }
        return (next, false);
    }
    if rate > 0.0 && next >= hi {
        (hi.max(lo), true)
    } else if rate <= 0.0 && next <= lo {
        (lo, true)
    } else {
        (next, false)
    }
}

fn check_duration(duration: f64) -> Result<()> {
    if duration.is_finite() && duration >= 0.0 {
        Ok(())
    } else {
        Err(FramelineError::InvalidDuration { duration })
    }
}

pub(crate) fn check_fps(fps: f64) -> Result<()> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(FramelineError::InvalidFps { fps })
    }
}

pub(crate) fn check_range(start: f64, end: f64, total_frames: f64) -> Result<PlaybackRange> {
    let valid = start.is_finite() && end.is_finite() && start >= 0.0 && start < end && end <= total_frames;
    if valid {
        Ok(PlaybackRange { start, end })
    } else {
        Err(FramelineError::InvalidRange {
            start,
            end,
            total_frames,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    duration: f64,
    fps: f64,
    frame: f64,
    playing: bool,
    rate: f64,
    looping: bool,
    range: Option<PlaybackRange>,
}

impl Timeline {
    pub fn new(duration: f64, fps: f64) -> Result<Self> {
        check_duration(duration)?;
        check_fps(fps)?;
        Ok(Self {
            duration,
            fps,
            frame: 0.0,
            playing: false,
            rate: 1.0,
            looping: false,
            range: None,
        })
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    #[inline]
    pub fn frame(&self) -> f64 {
        self.frame
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    #[inline]
    pub fn playback_range(&self) -> Option<PlaybackRange> {
        self.range
    }

    #[inline]
    pub fn total_frames(&self) -> f64 {
        self.duration * self.fps
    }

    /// Seconds.
    #[inline]
    pub fn current_time(&self) -> f64 {
        self.frame / self.fps
    }

    #[inline]
    pub fn position_ms(&self) -> f64 {
        self.current_time() * 1000.0
    }

    /// Active bounds: the playback range if set, else the whole timeline.
    pub fn bounds(&self) -> (f64, f64) {
        match self.range {
            Some(r) => (r.start, r.end),
            None => (0.0, self.total_frames()),
        }
    }

    fn clamp_frame(&self, frame: f64) -> f64 {
        if frame.is_nan() {
            return 0.0;
        }
        frame.clamp(0.0, self.total_frames())
    }

    /// Clamp to `[0, total_frames]`; the playback range does not constrain seeking.
    pub fn seek(&mut self, frame: f64) -> bool {
        let next = self.clamp_frame(frame);
        let changed = next != self.frame;
        self.frame = next;
        changed
    }

    pub fn play(&mut self) -> bool {
        !std::mem::replace(&mut self.playing, true)
    }

    pub fn pause(&mut self) -> bool {
        std::mem::replace(&mut self.playing, false)
    }

    pub fn advance(&mut self, delta_ms: f64) -> Advance {
        if !self.playing || !delta_ms.is_finite() {
            return Advance::default();
        }
        let delta_frames = delta_ms / 1000.0 * self.fps * self.rate;
        let (lo, hi) = self.bounds();
        let (next, stop) = reconcile(self.frame + delta_frames, lo, hi, self.rate, self.looping);
        let moved = next != self.frame;
        self.frame = next;
        if stop {
            self.playing = false;
        }
        Advance { moved, stopped: stop }
    }

    /// Stored verbatim; zero and negative rates are allowed.
    pub fn set_playback_rate(&mut self, rate: f64) -> bool {
        if !rate.is_finite() || rate == self.rate {
            return false;
        }
        self.rate = rate;
        true
    }

    pub fn set_loop(&mut self, looping: bool) -> bool {
        std::mem::replace(&mut self.looping, looping) != looping
    }

    /// Shrinking clamps the frame (and any range) down; growing moves nothing.
    pub fn set_duration(&mut self, duration: f64) -> Result<bool> {
        check_duration(duration)?;
        if duration == self.duration {
            return Ok(false);
        }
        self.duration = duration;
        let total = self.total_frames();
        if self.frame > total {
            self.frame = total;
        }
        if let Some(r) = self.range {
            let end = r.end.min(total);
            self.range = if r.start < end {
                Some(PlaybackRange::new(r.start, end))
            } else {
                None
            };
        }
        Ok(true)
    }

    /// Keeps the wall-clock position: the frame and range scale by `new / old`.
    /// The scaled range is clamped to the new total and dropped if it collapses.
    pub fn set_fps(&mut self, fps: f64) -> Result<bool> {
        check_fps(fps)?;
        if fps == self.fps {
            return Ok(false);
        }
        let old_fps = self.fps;
        let time = self.current_time();
        self.fps = fps;
        self.frame = self.clamp_frame(time * fps);
        let total = self.total_frames();
        self.range = self.range.and_then(|r| {
            let start = r.start / old_fps * fps;
            let end = (r.end / old_fps * fps).min(total);
            (start < end).then(|| PlaybackRange::new(start, end))
        });
        Ok(true)
    }

    /// Does not move the playhead.
    pub fn set_playback_range(&mut self, start: f64, end: f64) -> Result<bool> {
        let range = check_range(start, end, self.total_frames())?;
        Ok(self.range.replace(range) != Some(range))
    }

    pub fn clear_playback_range(&mut self) -> bool {
        self.range.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_forward_loop_keeps_fraction() {
        let (f, stop) = reconcile(60.5, 0.0, 60.0, 1.0, true);
        assert!((f - 0.5).abs() < 1e-9);
        assert!(!stop);
        // Several spans at once.
        let (f, _) = reconcile(185.0, 0.0, 60.0, 1.0, true);
        assert!((f - 5.0).abs() < 1e-9);
    }

    #[test]
    fn reconcile_backward_loop() {
        let (f, stop) = reconcile(-0.5, 0.0, 60.0, -1.0, true);
        assert!((f - 59.5).abs() < 1e-9);
        assert!(!stop);
        let (f, _) = reconcile(29.0, 30.0, 60.0, -2.0, true);
        assert!((f - 59.0).abs() < 1e-9);
    }

    #[test]
    fn reconcile_clamps_without_loop() {
        assert_eq!(reconcile(61.0, 0.0, 60.0, 1.0, false), (60.0, true));
        assert_eq!(reconcile(60.0, 0.0, 60.0, 1.0, false), (60.0, true));
        assert_eq!(reconcile(-1.0, 0.0, 60.0, -1.0, false), (0.0, true));
        assert_eq!(reconcile(10.0, 0.0, 60.0, 1.0, false), (10.0, false));
    }

    #[test]
    fn zero_span_never_wraps() {
        assert_eq!(reconcile(0.5, 0.0, 0.0, 1.0, true), (0.0, true));
    }

    #[test]
    fn seek_clamps_and_reports_change() {
        let mut t = Timeline::new(2.0, 30.0).unwrap();
        assert!(t.seek(10.0));
        assert!(!t.seek(10.0));
        t.seek(1000.0);
        assert_eq!(t.frame(), 60.0);
        t.seek(-3.0);
        assert_eq!(t.frame(), 0.0);
        t.seek(f64::NAN);
        assert_eq!(t.frame(), 0.0);
    }

    #[test]
    fn advance_ignored_when_paused() {
        let mut t = Timeline::new(2.0, 30.0).unwrap();
        assert_eq!(t.advance(1000.0), Advance::default());
        assert_eq!(t.frame(), 0.0);
    }

    #[test]
    fn construction_validates() {
        assert_eq!(Timeline::new(-1.0, 30.0).unwrap_err().code(), "INVALID_DURATION");
        assert_eq!(Timeline::new(1.0, 0.0).unwrap_err().code(), "INVALID_FPS");
        assert_eq!(Timeline::new(f64::NAN, 30.0).unwrap_err().code(), "INVALID_DURATION");
    }

    #[test]
    fn duration_shrink_clamps_range() {
        let mut t = Timeline::new(4.0, 30.0).unwrap();
        t.set_playback_range(30.0, 90.0).unwrap();
        t.set_duration(2.0).unwrap();
        assert_eq!(t.playback_range(), Some(PlaybackRange::new(30.0, 60.0)));
        t.set_duration(1.0).unwrap();
        assert_eq!(t.playback_range(), None);
    }

    #[test]
    fn fps_change_scales_range() {
        let mut t = Timeline::new(4.0, 30.0).unwrap();
        t.set_playback_range(30.0, 60.0).unwrap();
        t.set_fps(60.0).unwrap();
        assert_eq!(t.playback_range(), Some(PlaybackRange::new(60.0, 120.0)));
    }

    #[test]
    fn fps_change_keeps_range_inside_total() {
        let mut t = Timeline::new(1.0, 7.0).unwrap();
        t.set_playback_range(0.0, 7.0).unwrap();
        t.set_fps(29.0).unwrap();
        let total = t.total_frames();
        let range = t.playback_range().unwrap();
        assert!(range.end <= total);

        t.seek(28.5);
        t.play();
        let step = t.advance(1000.0);
        assert!(step.stopped);
        assert!(t.frame() <= total);
    }

    #[test]
    fn overflowing_step_stays_in_bounds() {
        let mut t = Timeline::new(2.0, 30.0).unwrap();
        t.set_loop(true);
        t.set_playback_rate(1e300);
        t.play();
        t.advance(1e10);
        assert_eq!(t.frame(), 0.0);
        assert!(t.is_playing());

        t.set_loop(false);
        t.advance(1e10);
        assert_eq!(t.frame(), 60.0);
        assert!(!t.is_playing());

        t.set_loop(true);
        t.set_playback_rate(-1e300);
        t.play();
        t.advance(1e10);
        assert_eq!(t.frame(), 0.0);
    }

    #[test]
    fn zero_rate_at_start_without_loop_stops() {
        assert_eq!(reconcile(0.0, 0.0, 60.0, 0.0, false), (0.0, true));
        assert_eq!(reconcile(12.0, 0.0, 60.0, 0.0, false), (12.0, false));
        assert_eq!(reconcile(30.0, 30.0, 60.0, 0.0, true), (30.0, false));
    }

    #[test]
    fn range_validation() {
        let mut t = Timeline::new(2.0, 30.0).unwrap();
        for (s, e) in [(-1.0, 10.0), (10.0, 10.0), (20.0, 10.0), (0.0, 61.0)] {
            assert_eq!(t.set_playback_range(s, e).unwrap_err().code(), "INVALID_RANGE");
        }
        assert!(t.set_playback_range(0.0, 60.0).unwrap());
        assert!(!t.set_playback_range(0.0, 60.0).unwrap());
    }
}
