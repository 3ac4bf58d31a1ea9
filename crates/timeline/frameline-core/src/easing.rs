//! Easing curves mapping linear progress `t` in `[0, 1]` to eased progress.
//!
//! Curves follow the usual CSS / easings.net shapes. Back and elastic overshoot
//! `[0, 1]`; everything else stays inside it for inputs inside it.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;
const ELASTIC_C4: f64 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f64 = (2.0 * PI) / 4.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EaseMode {
    In,
    Out,
    InOut,
}

/// A named easing curve. Serializes as `{"type": "quad", "mode": "inOut"}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Easing {
    #[default]
    Linear,
    /// Quantize into `steps` equal jumps.
    Steps { steps: u32 },
    /// CSS `cubic-bezier(x1, y1, x2, y2)`.
    Bezier { x1: f64, y1: f64, x2: f64, y2: f64 },
    Quad { mode: EaseMode },
    Cubic { mode: EaseMode },
    Quart { mode: EaseMode },
    Quint { mode: EaseMode },
    Sine { mode: EaseMode },
    Expo { mode: EaseMode },
    Circ { mode: EaseMode },
    Back { mode: EaseMode },
    Elastic { mode: EaseMode },
    Bounce { mode: EaseMode },
}

/// `in` for power `n`; `out` and `in_out` are derived from it.
fn power(t: f64, n: i32, mode: EaseMode) -> f64 {
    match mode {
        EaseMode::In => t.powi(n),
        EaseMode::Out => 1.0 - (1.0 - t).powi(n),
        EaseMode::InOut => {
            if t < 0.5 {
                2f64.powi(n - 1) * t.powi(n)
            } else {
                1.0 - (-2.0 * t + 2.0).powi(n) / 2.0
            }
        }
    }
}

fn sine(t: f64, mode: EaseMode) -> f64 {
    match mode {
        EaseMode::In => 1.0 - (t * PI / 2.0).cos(),
        EaseMode::Out => (t * PI / 2.0).sin(),
        EaseMode::InOut => -((PI * t).cos() - 1.0) / 2.0,
    }
}

fn expo(t: f64, mode: EaseMode) -> f64 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    match mode {
        EaseMode::In => 2f64.powf(10.0 * t - 10.0),
        EaseMode::Out => 1.0 - 2f64.powf(-10.0 * t),
        EaseMode::InOut => {
            if t < 0.5 {
                2f64.powf(20.0 * t - 10.0) / 2.0
            } else {
                (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
            }
        }
    }
}

fn circ(t: f64, mode: EaseMode) -> f64 {
    match mode {
        EaseMode::In => 1.0 - (1.0 - t * t).sqrt(),
        EaseMode::Out => (1.0 - (t - 1.0).powi(2)).sqrt(),
        EaseMode::InOut => {
            if t < 0.5 {
                (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
            } else {
                ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
            }
        }
    }
}

fn back(t: f64, mode: EaseMode) -> f64 {
    match mode {
        EaseMode::In => BACK_C3 * t * t * t - BACK_C1 * t * t,
        EaseMode::Out => 1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2),
        EaseMode::InOut => {
            if t < 0.5 {
                ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
            } else {
                ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0) / 2.0
            }
        }
    }
}

fn elastic(t: f64, mode: EaseMode) -> f64 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    match mode {
        EaseMode::In => -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin(),
        EaseMode::Out => 2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0,
        EaseMode::InOut => {
            let s = ((20.0 * t - 11.125) * ELASTIC_C5).sin();
            if t < 0.5 {
                -(2f64.powf(20.0 * t - 10.0) * s) / 2.0
            } else {
                (2f64.powf(-20.0 * t + 10.0) * s) / 2.0 + 1.0
            }
        }
    }
}

fn bounce_out(x: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if x < 1.0 / D1 {
        N1 * x * x
    } else if x < 2.0 / D1 {
        let x = x - 1.5 / D1;
        N1 * x * x + 0.75
    } else if x < 2.5 / D1 {
        let x = x - 2.25 / D1;
        N1 * x * x + 0.9375
    } else {
        let x = x - 2.625 / D1;
        N1 * x * x + 0.984375
    }
}

fn bounce(t: f64, mode: EaseMode) -> f64 {
    match mode {
        EaseMode::In => 1.0 - bounce_out(1.0 - t),
        EaseMode::Out => bounce_out(t),
        EaseMode::InOut => {
            if t < 0.5 {
                (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
            } else {
                (bounce_out(2.0 * t - 1.0) + 1.0) / 2.0
            }
        }
    }
}

#[inline]
fn bezier_axis(p1: f64, p2: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

/// Invert the x polynomial by bisection, then read y. Assumes x1, x2 in `[0, 1]`
/// so x is monotonic in t.
fn cubic_bezier(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if x1 == y1 && x2 == y2 {
        return t;
    }
    if t <= 0.0 || t >= 1.0 {
        return t;
    }
    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    let mut mid = t;
    for _ in 0..48 {
        let x = bezier_axis(x1, x2, mid);
        if (x - t).abs() < 1e-9 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    bezier_axis(y1, y2, mid)
}

impl Easing {
    pub fn quad(mode: EaseMode) -> Self {
        Easing::Quad { mode }
    }

    pub fn cubic(mode: EaseMode) -> Self {
        Easing::Cubic { mode }
    }

    pub fn steps(steps: u32) -> Self {
        Easing::Steps { steps }
    }

    pub fn bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Easing::Bezier { x1, y1, x2, y2 }
    }

    /// Eased progress for `t`. Inputs outside `[0, 1]` are evaluated as-is.
    pub fn apply(&self, t: f64) -> f64 {
        match *self {
            Easing::Linear => t,
            Easing::Steps { steps } => {
                if steps == 0 {
                    return t;
                }
                let n = f64::from(steps);
                (t * n).floor() / n
            }
            Easing::Bezier { x1, y1, x2, y2 } => cubic_bezier(t, x1, y1, x2, y2),
            Easing::Quad { mode } => power(t, 2, mode),
            Easing::Cubic { mode } => power(t, 3, mode),
            Easing::Quart { mode } => power(t, 4, mode),
            Easing::Quint { mode } => power(t, 5, mode),
            Easing::Sine { mode } => sine(t, mode),
            Easing::Expo { mode } => expo(t, mode),
            Easing::Circ { mode } => circ(t, mode),
            Easing::Back { mode } => back(t, mode),
            Easing::Elastic { mode } => elastic(t, mode),
            Easing::Bounce { mode } => bounce(t, mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const MODES: [EaseMode; 3] = [EaseMode::In, EaseMode::Out, EaseMode::InOut];

    fn all_named() -> Vec<Easing> {
        let mut out = vec![Easing::Linear];
        for mode in MODES {
            out.extend([
                Easing::Quad { mode },
                Easing::Cubic { mode },
                Easing::Quart { mode },
                Easing::Quint { mode },
                Easing::Sine { mode },
                Easing::Expo { mode },
                Easing::Circ { mode },
                Easing::Back { mode },
                Easing::Elastic { mode },
                Easing::Bounce { mode },
            ]);
        }
        out
    }

    #[test]
    fn endpoints_are_fixed() {
        for easing in all_named() {
            assert_abs_diff_eq!(easing.apply(0.0), 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(easing.apply(1.0), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn in_out_curves_pass_through_midpoint() {
        for easing in all_named() {
            let symmetric = matches!(
                easing,
                Easing::Quad { mode: EaseMode::InOut }
                    | Easing::Cubic { mode: EaseMode::InOut }
                    | Easing::Sine { mode: EaseMode::InOut }
                    | Easing::Circ { mode: EaseMode::InOut }
                    | Easing::Bounce { mode: EaseMode::InOut }
            );
            if symmetric {
                assert_abs_diff_eq!(easing.apply(0.5), 0.5, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn polynomial_values() {
        assert_eq!(Easing::quad(EaseMode::In).apply(0.5), 0.25);
        assert_eq!(Easing::quad(EaseMode::Out).apply(0.5), 0.75);
        assert_eq!(Easing::cubic(EaseMode::In).apply(0.5), 0.125);
        assert_eq!(Easing::cubic(EaseMode::InOut).apply(0.25), 0.0625);
    }

    #[test]
    fn steps_quantize() {
        let e = Easing::steps(4);
        assert_eq!(e.apply(0.1), 0.0);
        assert_eq!(e.apply(0.3), 0.25);
        assert_eq!(e.apply(0.99), 0.75);
        assert_eq!(e.apply(1.0), 1.0);
    }

    #[test]
    fn bezier_linear_and_ease() {
        let linear = Easing::bezier(0.25, 0.25, 0.75, 0.75);
        assert_eq!(linear.apply(0.3), 0.3);

        // CSS `ease`: slow start, fast middle.
        let ease = Easing::bezier(0.25, 0.1, 0.25, 1.0);
        assert!(ease.apply(0.5) > 0.7);
        assert!(ease.apply(0.5) < 0.85);
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
    }

    #[test]
    fn back_overshoots() {
        assert!(Easing::Back { mode: EaseMode::In }.apply(0.2) < 0.0);
        assert!(Easing::Back { mode: EaseMode::Out }.apply(0.8) > 1.0);
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_value(Easing::quad(EaseMode::InOut)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "quad", "mode": "inOut"}));
        let back: Easing = serde_json::from_value(serde_json::json!({"type": "steps", "steps": 3})).unwrap();
        assert_eq!(back, Easing::steps(3));
    }
}
