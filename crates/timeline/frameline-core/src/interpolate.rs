//! Piecewise-linear value mapping with easing and edge extrapolation.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{FramelineError, Result};

/// Behaviour for inputs outside the first/last input stop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Extrapolate {
    /// Continue the slope of the outermost segment.
    #[default]
    Extend,
    /// Hold the outermost output.
    Clamp,
    /// Return the input unchanged.
    Identity,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterpolateOptions {
    pub extrapolate_left: Extrapolate,
    pub extrapolate_right: Extrapolate,
    /// Applied to in-range segment progress only.
    pub easing: Option<Easing>,
}

impl InterpolateOptions {
    pub fn clamped() -> Self {
        Self {
            extrapolate_left: Extrapolate::Clamp,
            extrapolate_right: Extrapolate::Clamp,
            easing: None,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn with_left(mut self, mode: Extrapolate) -> Self {
        self.extrapolate_left = mode;
        self
    }

    pub fn with_right(mut self, mode: Extrapolate) -> Self {
        self.extrapolate_right = mode;
        self
    }
}

/// Where `input` falls relative to a validated input range.
pub(crate) enum Placement {
    Left { ratio: f64 },
    Right { ratio: f64 },
    /// Segment index and linear progress inside it.
    Inside { segment: usize, ratio: f64 },
}

/// Lengths must match, at least two stops, strictly increasing.
pub(crate) fn check_stops(input_range: &[f64], output_len: usize) -> Result<()> {
    if input_range.len() != output_len {
        return Err(FramelineError::InvalidInputRange {
            reason: format!(
                "input range has {} stops but output range has {output_len}",
                input_range.len()
            ),
        });
    }
    if input_range.len() < 2 {
        return Err(FramelineError::InvalidInputRange {
            reason: "at least 2 stops are required".into(),
        });
    }
    for (index, pair) in input_range.windows(2).enumerate() {
        if pair[0] >= pair[1] || pair[0].is_nan() || pair[1].is_nan() {
            return Err(FramelineError::UnsortedInputRange {
                index,
                previous: pair[0],
                next: pair[1],
            });
        }
    }
    Ok(())
}

#[inline]
fn progress(input: f64, lo: f64, hi: f64) -> f64 {
    (input - lo) / (hi - lo)
}

pub(crate) fn place(input: f64, input_range: &[f64]) -> Placement {
    let last = input_range.len() - 1;
    if input < input_range[0] {
        return Placement::Left {
            ratio: progress(input, input_range[0], input_range[1]),
        };
    }
    if input > input_range[last] {
        return Placement::Right {
            ratio: progress(input, input_range[last - 1], input_range[last]),
        };
    }
    let segment = input_range
        .windows(2)
        .position(|pair| input <= pair[1])
        .unwrap_or(last - 1);
    Placement::Inside {
        segment,
        ratio: progress(input, input_range[segment], input_range[segment + 1]),
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Map `input` through the stops `input_range -> output_range`.
///
/// Errors when the ranges differ in length, have fewer than two stops, or the
/// input stops are not strictly increasing.
pub fn interpolate(
    input: f64,
    input_range: &[f64],
    output_range: &[f64],
    options: &InterpolateOptions,
) -> Result<f64> {
    check_stops(input_range, output_range.len())?;
    let last = output_range.len() - 1;
    let value = match place(input, input_range) {
        Placement::Left { ratio } => match options.extrapolate_left {
            Extrapolate::Identity => input,
            Extrapolate::Clamp => output_range[0],
            Extrapolate::Extend => lerp(output_range[0], output_range[1], ratio),
        },
        Placement::Right { ratio } => match options.extrapolate_right {
            Extrapolate::Identity => input,
            Extrapolate::Clamp => output_range[last],
            Extrapolate::Extend => lerp(output_range[last - 1], output_range[last], ratio),
        },
        Placement::Inside { segment, ratio } => {
            let ratio = options.easing.map_or(ratio, |e| e.apply(ratio));
            lerp(output_range[segment], output_range[segment + 1], ratio)
        }
    };
    Ok(value)
}
