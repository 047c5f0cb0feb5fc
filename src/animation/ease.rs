use crate::foundation::core::fmt_num;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Easing curves available to smart transitions.
///
/// Every curve resolves to cubic-bezier control points so that hosts with a native timing-function
/// implementation (CSS, Core Animation, ...) can use [`Ease::css`] directly, while [`Ease::apply`]
/// evaluates the same curve on the CPU.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// CSS `ease`.
    Ease,
    /// Slow start.
    EaseIn,
    /// Slow end.
    #[default]
    EaseOut,
    /// Slow start and end.
    EaseInOut,
    /// Pulls back before accelerating.
    EaseInBack,
    /// Overshoots the target before settling.
    EaseOutBack,
    /// Pulls back, then overshoots.
    EaseInOutBack,
    /// Explicit control points `(x1, y1, x2, y2)`.
    CubicBezier(f64, f64, f64, f64),
}

impl Ease {
    /// Control points `(x1, y1, x2, y2)` of the curve.
    pub fn control_points(self) -> (f64, f64, f64, f64) {
        match self {
            Self::Linear => (0.0, 0.0, 1.0, 1.0),
            Self::Ease => (0.25, 0.1, 0.25, 1.0),
            Self::EaseIn => (0.42, 0.0, 1.0, 1.0),
            Self::EaseOut => (0.0, 0.0, 0.58, 1.0),
            Self::EaseInOut => (0.42, 0.0, 0.58, 1.0),
            Self::EaseInBack => (0.3, -0.05, 0.7, -0.5),
            Self::EaseOutBack => (0.45, 1.45, 0.8, 1.0),
            Self::EaseInOutBack => (0.7, -0.4, 0.4, 1.4),
            Self::CubicBezier(x1, y1, x2, y2) => (x1, y1, x2, y2),
        }
    }

    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    ///
    /// The output is not clamped: the `*Back` curves leave `[0, 1]` on purpose.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if matches!(self, Self::Linear) || t == 0.0 || t == 1.0 {
            return t;
        }
        let (x1, y1, x2, y2) = self.control_points();
        let s = solve_bezier_param(t, x1, x2);
        bezier_axis(s, y1, y2)
    }

    /// CSS `transition-timing-function` value.
    pub fn css(self) -> String {
        match self {
            Self::Linear => "linear".to_owned(),
            Self::Ease => "ease".to_owned(),
            Self::EaseIn => "ease-in".to_owned(),
            Self::EaseOut => "ease-out".to_owned(),
            Self::EaseInOut => "ease-in-out".to_owned(),
            other => {
                let (x1, y1, x2, y2) = other.control_points();
                format!(
                    "cubic-bezier({}, {}, {}, {})",
                    fmt_num(x1),
                    fmt_num(y1),
                    fmt_num(x2),
                    fmt_num(y2)
                )
            }
        }
    }

    /// Canonical kebab-case name; explicit curves render as `cubic-bezier(..)`.
    pub fn name(self) -> String {
        match self {
            Self::Linear => "linear".to_owned(),
            Self::Ease => "ease".to_owned(),
            Self::EaseIn => "ease-in".to_owned(),
            Self::EaseOut => "ease-out".to_owned(),
            Self::EaseInOut => "ease-in-out".to_owned(),
            Self::EaseInBack => "ease-in-back".to_owned(),
            Self::EaseOutBack => "ease-out-back".to_owned(),
            Self::EaseInOutBack => "ease-in-out-back".to_owned(),
            Self::CubicBezier(..) => self.css(),
        }
    }

    /// Parse a curve name.
    ///
    /// Accepts kebab, snake and upper-case spellings (`ease-in-out`, `EASE_IN_AND_OUT`) and
    /// `cubic-bezier(x1, y1, x2, y2)`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let raw = s.trim();
        let lower = raw.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("cubic-bezier(")
            .or_else(|| lower.strip_prefix("cubic_bezier("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_bezier_args(args);
        }

        let key: String = lower
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        let key = key.replace("-and-", "-");
        match key.as_str() {
            "linear" => Ok(Self::Linear),
            "ease" => Ok(Self::Ease),
            "ease-in" => Ok(Self::EaseIn),
            "ease-out" => Ok(Self::EaseOut),
            "ease-in-out" => Ok(Self::EaseInOut),
            "ease-in-back" => Ok(Self::EaseInBack),
            "ease-out-back" => Ok(Self::EaseOutBack),
            "ease-in-out-back" => Ok(Self::EaseInOutBack),
            _ => Err(format!("unknown easing curve '{raw}'")),
        }
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for Ease {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for Ease {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Points([f64; 4]),
            Obj { cubic_bezier: [f64; 4] },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Name(s) => Self::parse(&s).map_err(serde::de::Error::custom),
            Repr::Points([x1, y1, x2, y2]) | Repr::Obj {
                cubic_bezier: [x1, y1, x2, y2],
            } => checked_bezier(x1, y1, x2, y2).map_err(serde::de::Error::custom),
        }
    }
}

fn parse_bezier_args(args: &str) -> Result<Ease, String> {
    let vals = args
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid cubic-bezier argument '{}'", p.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let [x1, y1, x2, y2] = vals[..] else {
        return Err("cubic-bezier takes exactly 4 arguments".to_owned());
    };
    checked_bezier(x1, y1, x2, y2)
}

fn checked_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Ease, String> {
    if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
        return Err("cubic-bezier arguments must be finite".to_owned());
    }
    if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
        return Err("cubic-bezier x coordinates must be within [0, 1]".to_owned());
    }
    Ok(Ease::CubicBezier(x1, y1, x2, y2))
}

fn bezier_axis(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_axis_slope(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Find the curve parameter whose x coordinate equals `x`.
fn solve_bezier_param(x: f64, x1: f64, x2: f64) -> f64 {
    const EPS: f64 = 1e-7;

    let mut s = x;
    for _ in 0..8 {
        let err = bezier_axis(s, x1, x2) - x;
        if err.abs() < EPS {
            return s;
        }
        let slope = bezier_axis_slope(s, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        s = (s - err / slope).clamp(0.0, 1.0);
    }

    // Newton stalled on a flat segment; x(s) is monotonic for x1, x2 in [0, 1].
    let (mut lo, mut hi) = (0.0, 1.0);
    s = x;
    for _ in 0..64 {
        let cur = bezier_axis(s, x1, x2);
        if (cur - x).abs() < EPS {
            break;
        }
        if cur < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    s
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
