use crate::foundation::core::fmt_num;
use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA color with normalized channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    /// Red in `[0, 1]`.
    pub r: f64,
    /// Green in `[0, 1]`.
    pub g: f64,
    /// Blue in `[0, 1]`.
    pub b: f64,
    /// Alpha in `[0, 1]`.
    pub a: f64,
}

/// Channel tolerance used when comparing authored colors; below one 8-bit step.
const CHANNEL_EPS: f64 = 0.5 / 255.0;

impl Color {
    /// Build a color from normalized channels.
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Value equality at 8-bit precision.
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.r - other.r).abs() < CHANNEL_EPS
            && (self.g - other.g).abs() < CHANNEL_EPS
            && (self.b - other.b).abs() < CHANNEL_EPS
            && (self.a - other.a).abs() < CHANNEL_EPS
    }

    /// Multiply alpha by a paint-level opacity.
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: (self.a * opacity).clamp(0.0, 1.0),
            ..self
        }
    }

    /// CSS `rgba(..)` value.
    pub fn to_css(self) -> String {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        format!(
            "rgba({}, {}, {}, {})",
            to_u8(self.r),
            to_u8(self.g),
            to_u8(self.b),
            fmt_num(self.a.clamp(0.0, 1.0))
        )
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbaObj {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "one")]
                a: f64,
            },
            HslaObj {
                h: f64,
                s: f64,
                l: f64,
                #[serde(default = "one")]
                a: f64,
            },
            Arr(Vec<f64>),
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Self::rgba(r, g, b, a)),
            Repr::HslaObj { h, s, l, a } => Ok(hsla_to_rgba(h, s, l, a)),
            Repr::Arr(v) => match v[..] {
                [r, g, b] => Ok(Self::rgba(r, g, b, 1.0)),
                [r, g, b, a] => Ok(Self::rgba(r, g, b, a)),
                _ => Err(serde::de::Error::custom(
                    "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn parse_hex(s: &str) -> Result<Color, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.is_ascii() {
        return Err(format!("invalid hex color \"{s}\""));
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    let expanded;
    let s = if s.len() == 3 || s.len() == 4 {
        expanded = s.chars().flat_map(|c| [c, c]).collect::<String>();
        expanded.as_str()
    } else {
        s
    };

    let (r, g, b, a) = match s.len() {
        6 => (hex_byte(&s[0..2])?, hex_byte(&s[2..4])?, hex_byte(&s[4..6])?, 255),
        8 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        ),
        _ => {
            return Err("hex color must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA".to_owned());
        }
    };

    Ok(Color::rgba(
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
        f64::from(a) / 255.0,
    ))
}

/// Chroma-based HSL conversion; hue in degrees, saturation and lightness in `[0, 1]`.
fn hsla_to_rgba(h: f64, s: f64, l: f64, a: f64) -> Color {
    let h = h.rem_euclid(360.0) / 60.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u8 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = l - chroma / 2.0;
    Color::rgba(r + m, g + m, b + m, a)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/color.rs"]
mod tests;
