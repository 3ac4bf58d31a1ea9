//! Local time for a sub-sequence starting at some frame of the composition.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceState {
    /// `frame - from`; negative before the sequence starts.
    pub local_frame: f64,
    /// 0..=1 across the sequence; always 0 for open-ended sequences.
    pub progress: f64,
    pub is_active: bool,
}

/// Sequence starting at `from` and lasting `duration_in_frames` (open-ended when `None`).
/// The end frame itself is not active.
pub fn sequence(frame: f64, from: f64, duration_in_frames: Option<f64>) -> SequenceState {
    let local_frame = frame - from;
    let (is_active, progress) = match duration_in_frames {
        None => (local_frame >= 0.0, 0.0),
        Some(duration) => {
            let active = local_frame >= 0.0 && local_frame < duration;
            let progress = if local_frame < 0.0 {
                0.0
            } else if local_frame >= duration {
                1.0
            } else if duration > 0.0 {
                local_frame / duration
            } else {
                0.0
            };
            (active, progress)
        }
    };
    SequenceState {
        local_frame,
        progress,
        is_active,
    }
}
