//! Frame-driven transition progress.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Opacity pair for overlapping scenes; `fade_in + fade_out == 1` before easing
/// overshoot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Crossfade {
    #[serde(rename = "in")]
    pub fade_in: f64,
    #[serde(rename = "out")]
    pub fade_out: f64,
}

/// `0` before `start`, eased `0..=1` across `duration` frames, `1` after. A
/// non-positive duration is an instant cut at `start`.
pub fn transition(frame: f64, start: f64, duration: f64, easing: Option<&Easing>) -> f64 {
    if frame < start {
        return 0.0;
    }
    if duration <= 0.0 {
        return 1.0;
    }
    let progress = ((frame - start) / duration).clamp(0.0, 1.0);
    easing.map_or(progress, |e| e.apply(progress))
}

pub fn crossfade(frame: f64, start: f64, duration: f64, easing: Option<&Easing>) -> Crossfade {
    let p = transition(frame, start, duration, easing);
    Crossfade {
        fade_in: p,
        fade_out: 1.0 - p,
    }
}
