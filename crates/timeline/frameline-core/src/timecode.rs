//! SMPTE-style timecode and timestamp formatting.

use crate::error::{FramelineError, Result};
use crate::timeline::check_fps;

/// `HH:MM:SS:FF`. Fractional and negative frames are floored / clamped to 0.
pub fn frames_to_timecode(frame: f64, fps: f64) -> Result<String> {
    check_fps(fps)?;
    let frame = frame.max(0.0).floor();
    let total_seconds = (frame / fps).floor() as u64;
    let f = (frame % fps).floor() as u64;
    let s = total_seconds % 60;
    let m = (total_seconds / 60) % 60;
    let h = total_seconds / 3600;
    Ok(format!("{h:02}:{m:02}:{s:02}:{f:02}"))
}

pub fn timecode_to_frames(timecode: &str, fps: f64) -> Result<f64> {
    check_fps(fps)?;
    let invalid = || FramelineError::InvalidTimecodeFormat {
        timecode: timecode.to_string(),
    };
    let parts: Vec<&str> = timecode.split(':').collect();
    if parts.len() != 4 {
        return Err(invalid());
    }
    let mut fields = [0u32; 4];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        *slot = part.parse().map_err(|_| invalid())?;
    }
    let [h, m, s, f] = fields;
    Ok(f64::from(h * 3600 + m * 60 + s) * fps + f64::from(f))
}

/// `HH:MM:SS.mmm`
pub fn frames_to_timestamp(frame: f64, fps: f64) -> Result<String> {
    check_fps(fps)?;
    let total_ms = frame.max(0.0) / fps * 1000.0;
    let h = (total_ms / 3_600_000.0).floor() as u64;
    let m = ((total_ms % 3_600_000.0) / 60_000.0).floor() as u64;
    let s = ((total_ms % 60_000.0) / 1000.0).floor() as u64;
    let ms = (total_ms % 1000.0).floor() as u64;
    Ok(format!("{h:02}:{m:02}:{s:02}.{ms:03}"))
}
