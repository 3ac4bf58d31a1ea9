//! CSS color parsing and color interpolation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FramelineError, Result};
use crate::interpolate::{check_stops, place, Extrapolate, InterpolateOptions, Placement};

/// 8-bit RGB with a `0..=1` alpha.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Channel-wise mix; channels round and clamp into range.
    pub fn mix(self, other: Rgba, t: f64) -> Rgba {
        let channel = |from: u8, to: u8| {
            let v = f64::from(from) + t * (f64::from(to) - f64::from(from));
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgba {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
            a: (self.a + t * (other.a - self.a)).clamp(0.0, 1.0),
        }
    }
}

/// `rgba(r, g, b, a)`.
impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

fn invalid(color: &str, reason: impl Into<String>) -> FramelineError {
    FramelineError::InvalidColorFormat {
        color: color.to_string(),
        reason: reason.into(),
    }
}

fn hex_pair(s: &str) -> Option<u8> {
    u8::from_str_radix(s, 16).ok()
}

fn parse_hex(color: &str, digits: &str) -> Result<Rgba> {
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid(color, "non-hex characters"));
    }
    let doubled: String;
    let full = match digits.len() {
        3 | 4 => {
            doubled = digits.chars().flat_map(|c| [c, c]).collect();
            doubled.as_str()
        }
        6 | 8 => digits,
        _ => return Err(invalid(color, "hex colors must be 3, 4, 6 or 8 digits")),
    };
    let channel = |i: usize| hex_pair(&full[i..i + 2]).ok_or_else(|| invalid(color, "non-hex characters"));
    let a = if full.len() == 8 {
        f64::from(channel(6)?) / 255.0
    } else {
        1.0
    };
    Ok(Rgba::new(channel(0)?, channel(2)?, channel(4)?, a))
}

/// Body of `name(...)` / `namea(...)`, split on commas.
fn function_args<'a>(color: &str, text: &'a str, name: &str) -> Result<Vec<&'a str>> {
    let rest = text
        .strip_prefix(name)
        .ok_or_else(|| invalid(color, format!("expected {name}(...)")))?;
    let rest = rest.strip_prefix('a').unwrap_or(rest);
    let body = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| invalid(color, format!("expected {name}(...)")))?;
    let args: Vec<&str> = body.split(',').map(str::trim).collect();
    if args.len() == 3 || args.len() == 4 {
        Ok(args)
    } else {
        Err(invalid(color, format!("{name} takes 3 or 4 components")))
    }
}

fn parse_int(color: &str, text: &str) -> Result<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(color, format!("'{text}' is not an integer")));
    }
    text.parse().map_err(|_| invalid(color, format!("'{text}' is out of range")))
}

/// Unsigned decimal (`1`, `0.5`, `.5`).
fn parse_alpha(color: &str, text: Option<&&str>) -> Result<f64> {
    let Some(text) = text else {
        return Ok(1.0);
    };
    let digits_ok = !text.is_empty()
        && !text.ends_with('.')
        && text.bytes().filter(|&b| b == b'.').count() <= 1
        && text.bytes().all(|b| b.is_ascii_digit() || b == b'.');
    if !digits_ok {
        return Err(invalid(color, format!("'{text}' is not a valid alpha")));
    }
    text.parse().map_err(|_| invalid(color, format!("'{text}' is not a valid alpha")))
}

fn parse_rgb(color: &str, text: &str) -> Result<Rgba> {
    let args = function_args(color, text, "rgb")?;
    let channel = |s: &str| {
        let v = parse_int(color, s)?;
        u8::try_from(v).map_err(|_| invalid(color, format!("channel {v} exceeds 255")))
    };
    Ok(Rgba::new(
        channel(args[0])?,
        channel(args[1])?,
        channel(args[2])?,
        parse_alpha(color, args.get(3))?,
    ))
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn hsl_to_rgba(h: f64, s: f64, l: f64, a: f64) -> Rgba {
    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let h = h / 360.0;
        (
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    };
    let to_u8 = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba::new(to_u8(r), to_u8(g), to_u8(b), a)
}

fn parse_hsl(color: &str, text: &str) -> Result<Rgba> {
    let args = function_args(color, text, "hsl")?;
    let percent = |s: &str| -> Result<f64> {
        let digits = s
            .strip_suffix('%')
            .ok_or_else(|| invalid(color, format!("'{s}' must be a percentage")))?;
        Ok(f64::from(parse_int(color, digits)?) / 100.0)
    };
    let h = f64::from(parse_int(color, args[0])?);
    Ok(hsl_to_rgba(
        h,
        percent(args[1])?,
        percent(args[2])?,
        parse_alpha(color, args.get(3))?,
    ))
}

/// Parse `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`, `rgb()`/`rgba()` or
/// `hsl()`/`hsla()`.
pub fn parse_color(color: &str) -> Result<Rgba> {
    let text = color.trim();
    if let Some(digits) = text.strip_prefix('#') {
        parse_hex(color, digits)
    } else if text.starts_with("rgb") {
        parse_rgb(color, text)
    } else if text.starts_with("hsl") {
        parse_hsl(color, text)
    } else {
        Err(invalid(color, "unsupported color format"))
    }
}

/// Color counterpart of [`crate::interpolate::interpolate`], returning an
/// `rgba(...)` string. Outside the stops, `Clamp` holds the edge color and the
/// other modes extend the outer segment (channels still clamp to range).
pub fn interpolate_colors<S: AsRef<str>>(
    input: f64,
    input_range: &[f64],
    output_range: &[S],
    options: &InterpolateOptions,
) -> Result<String> {
    check_stops(input_range, output_range.len())?;
    let colors = output_range
        .iter()
        .map(|c| parse_color(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let last = colors.len() - 1;
    let color = match place(input, input_range) {
        Placement::Left { ratio } => match options.extrapolate_left {
            Extrapolate::Clamp => colors[0],
            _ => colors[0].mix(colors[1], ratio),
        },
        Placement::Right { ratio } => match options.extrapolate_right {
            Extrapolate::Clamp => colors[last],
            _ => colors[last - 1].mix(colors[last], ratio),
        },
        Placement::Inside { segment, ratio } => {
            let ratio = options.easing.map_or(ratio, |e| e.apply(ratio));
            colors[segment].mix(colors[segment + 1], ratio)
        }
    };
    Ok(color.to_string())
}
