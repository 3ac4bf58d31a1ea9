//! Named points on the timeline.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{FramelineError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    /// Seconds from the start of the composition.
    pub time: f64,
    #[serde(default)]
    pub label: String,
    /// Hex color, e.g. `#ff0000`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Marker {
    pub fn new(id: impl Into<String>, time: f64, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            time,
            label: label.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

pub fn validate_marker(marker: &Marker) -> Result<()> {
    if marker.id.trim().is_empty() {
        return Err(FramelineError::InvalidMarker {
            reason: "marker id cannot be empty".into(),
        });
    }
    if !marker.time.is_finite() || marker.time < 0.0 {
        return Err(FramelineError::InvalidMarker {
            reason: format!("marker '{}' has invalid time {}", marker.id, marker.time),
        });
    }
    Ok(())
}

/// Validates every marker, rejects duplicate ids and returns the list sorted by time.
pub fn validate_markers(markers: Vec<Marker>) -> Result<Vec<Marker>> {
    {
        let mut seen = HashSet::with_capacity(markers.len());
        for m in &markers {
            validate_marker(m)?;
            if !seen.insert(m.id.as_str()) {
                return Err(FramelineError::DuplicateMarkerId { id: m.id.clone() });
            }
        }
    }
    let mut sorted = markers;
    sort_markers(&mut sorted);
    Ok(sorted)
}

/// Stable sort by time; equal times keep insertion order.
pub(crate) fn sort_markers(markers: &mut [Marker]) {
    markers.sort_by(|a, b| a.time.total_cmp(&b.time));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_and_rejects_duplicates() {
        let sorted = validate_markers(vec![
            Marker::new("b", 5.0, "B"),
            Marker::new("a", 1.0, "A").with_color("#fff"),
        ])
        .unwrap();
        assert_eq!(sorted[0].id, "a");
        assert_eq!(sorted[1].id, "b");

        let err = validate_markers(vec![Marker::new("a", 1.0, ""), Marker::new("a", 2.0, "")])
            .unwrap_err();
        assert_eq!(err, FramelineError::DuplicateMarkerId { id: "a".into() });
    }

    #[test]
    fn rejects_blank_id_and_negative_time() {
        assert_eq!(
            validate_marker(&Marker::new("  ", 1.0, "")).unwrap_err().code(),
            "INVALID_MARKER"
        );
        assert_eq!(
            validate_marker(&Marker::new("m", -0.5, "")).unwrap_err().code(),
            "INVALID_MARKER"
        );
        assert!(validate_marker(&Marker::new("m", 0.0, "")).is_ok());
    }
}
