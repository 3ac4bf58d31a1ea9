//! Caption cues: SRT and WebVTT parsing, SRT output, and active-cue lookup.

use serde::{Deserialize, Serialize};

use crate::error::{FramelineError, Result};

/// A single caption cue. Times are in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionCue {
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

impl CaptionCue {
    pub fn new(id: impl Into<String>, start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time,
            text: text.into(),
        }
    }

    /// Active iff `start_time <= t <= end_time` (both ends inclusive).
    #[inline]
    pub fn is_active_at(&self, time_ms: f64) -> bool {
        time_ms >= self.start_time && time_ms <= self.end_time
    }
}

/// Captions as supplied by a caller: either already-parsed cues or a text blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaptionSource {
    Text(String),
    Cues(Vec<CaptionCue>),
}

impl Default for CaptionSource {
    fn default() -> Self {
        CaptionSource::Cues(Vec::new())
    }
}

impl CaptionSource {
    pub fn into_cues(self) -> Result<Vec<CaptionCue>> {
        match self {
            CaptionSource::Text(text) => parse_captions(&text),
            CaptionSource::Cues(cues) => Ok(cues),
        }
    }
}

impl From<Vec<CaptionCue>> for CaptionSource {
    fn from(cues: Vec<CaptionCue>) -> Self {
        CaptionSource::Cues(cues)
    }
}

impl From<&str> for CaptionSource {
    fn from(text: &str) -> Self {
        CaptionSource::Text(text.to_string())
    }
}

fn normalize(content: &str) -> String {
    content.replace("\r\n", "\n").trim().to_string()
}

/// Split on one or more blank lines.
fn blocks(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split("\n\n")
        .map(|b| b.trim_matches('\n'))
        .filter(|b| !b.is_empty())
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn fixed_digits(s: &str, width: usize) -> Option<u64> {
    if s.len() == width && all_digits(s) {
        s.parse().ok()
    } else {
        None
    }
}

/// `HH:MM:SS,mmm`
fn parse_srt_stamp(stamp: &str) -> Option<f64> {
    let (hms, millis) = stamp.split_once(',')?;
    let mut parts = hms.split(':');
    let h = fixed_digits(parts.next()?, 2)?;
    let m = fixed_digits(parts.next()?, 2)?;
    let s = fixed_digits(parts.next()?, 2)?;
    if parts.next().is_some() {
        return None;
    }
    let ms = fixed_digits(millis, 3)?;
    Some((h * 3_600_000 + m * 60_000 + s * 1000 + ms) as f64)
}

/// `HH:MM:SS.mmm` or `MM:SS.mmm`; hours may have more than two digits.
fn parse_vtt_stamp(stamp: &str) -> Option<f64> {
    let (hms, millis) = stamp.split_once('.')?;
    let ms = fixed_digits(millis, 3)?;
    let parts: Vec<&str> = hms.split(':').collect();
    let (h, m, s) = match parts.as_slice() {
        [m, s] => (0, fixed_digits(m, 2)?, fixed_digits(s, 2)?),
        [h, m, s] if h.len() >= 2 && all_digits(h) => {
            (h.parse::<u64>().ok()?, fixed_digits(m, 2)?, fixed_digits(s, 2)?)
        }
        _ => return None,
    };
    Some((h * 3_600_000 + m * 60_000 + s * 1000 + ms) as f64)
}

/// Split `a --> b [settings]` and parse both stamps.
fn parse_timing_line(line: &str, stamp: fn(&str) -> Option<f64>) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once(" --> ")?;
    let end = rest.split_whitespace().next()?;
    Some((stamp(start.trim())?, stamp(end)?))
}

pub fn parse_srt(content: &str) -> Result<Vec<CaptionCue>> {
    let normalized = normalize(content);
    let mut cues = Vec::new();
    for (index, block) in blocks(&normalized).enumerate() {
        let lines: Vec<&str> = block.split('\n').collect();
        let (id, timing_idx) = if lines.len() >= 2 && all_digits(lines[0]) && lines[1].contains("-->") {
            (lines[0].to_string(), 1)
        } else if lines[0].contains("-->") {
            ((index + 1).to_string(), 0)
        } else {
            return Err(FramelineError::InvalidSrtFormat {
                reason: format!("block {index} must start with an id or a timing line"),
            });
        };
        let timing = lines[timing_idx];
        let (start_time, end_time) = parse_timing_line(timing, parse_srt_stamp).ok_or_else(|| {
            FramelineError::InvalidSrtFormat {
                reason: format!("invalid timing line: {timing}"),
            }
        })?;
        cues.push(CaptionCue {
            id,
            start_time,
            end_time,
            text: lines[timing_idx + 1..].join("\n"),
        });
    }
    Ok(cues)
}

pub fn parse_webvtt(content: &str) -> Result<Vec<CaptionCue>> {
    let normalized = normalize(content);
    let header = normalized.lines().next().unwrap_or_default();
    if !header.starts_with("WEBVTT") {
        return Err(FramelineError::InvalidWebVttFormat {
            reason: "missing WEBVTT header".into(),
        });
    }

    let mut cues = Vec::new();
    // First block is the header (and any header metadata lines).
    for block in blocks(&normalized).skip(1) {
        let lines: Vec<&str> = block.split('\n').collect();
        let first = lines[0];
        if first.starts_with("NOTE") || first.starts_with("STYLE") || first.starts_with("REGION") {
            continue;
        }
        let (id, timing_idx) = if first.contains("-->") {
            ((cues.len() + 1).to_string(), 0)
        } else if lines.len() >= 2 && lines[1].contains("-->") {
            (first.trim().to_string(), 1)
        } else {
            return Err(FramelineError::InvalidWebVttFormat {
                reason: format!("cue block without timing line: {first}"),
            });
        };
        let timing = lines[timing_idx];
        let (start_time, end_time) = parse_timing_line(timing, parse_vtt_stamp).ok_or_else(|| {
            FramelineError::InvalidWebVttFormat {
                reason: format!("invalid timing line: {timing}"),
            }
        })?;
        cues.push(CaptionCue {
            id,
            start_time,
            end_time,
            text: lines[timing_idx + 1..].join("\n"),
        });
    }
    Ok(cues)
}

/// Detects WebVTT by its header, otherwise parses as SRT.
pub fn parse_captions(content: &str) -> Result<Vec<CaptionCue>> {
    if content.trim_start().starts_with("WEBVTT") {
        parse_webvtt(content)
    } else {
        parse_srt(content)
    }
}

fn format_srt_stamp(ms: f64) -> String {
    let total = ms.max(0.0).floor() as u64;
    let h = total / 3_600_000;
    let m = (total % 3_600_000) / 60_000;
    let s = (total % 60_000) / 1000;
    let millis = total % 1000;
    format!("{h:02}:{m:02}:{s:02},{millis:03}")
}

pub fn stringify_srt(cues: &[CaptionCue]) -> String {
    cues.iter()
        .enumerate()
        .map(|(index, cue)| {
            let id = if cue.id.is_empty() {
                (index + 1).to_string()
            } else {
                cue.id.clone()
            };
            format!(
                "{id}\n{} --> {}\n{}",
                format_srt_stamp(cue.start_time),
                format_srt_stamp(cue.end_time),
                cue.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Cues active at `time_ms`, in list order.
pub fn find_active_cues(cues: &[CaptionCue], time_ms: f64) -> Vec<CaptionCue> {
    cues.iter()
        .filter(|c| c.is_active_at(time_ms))
        .cloned()
        .collect()
}

/// True when two cue lists hold the same ids in the same order.
pub(crate) fn same_cue_ids(a: &[CaptionCue], b: &[CaptionCue]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}
