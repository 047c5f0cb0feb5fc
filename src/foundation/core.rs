pub use kurbo::{Affine, Point, Rect, Vec2};

/// Declared geometry of an element, relative to its parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Geometry {
    /// Left edge in parent space.
    pub x: f64,
    /// Top edge in parent space.
    pub y: f64,
    /// Declared box width.
    pub width: f64,
    /// Declared box height.
    pub height: f64,
    /// Clockwise rotation in degrees.
    pub rotation_deg: f64,
}

impl Geometry {
    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Center in the element's own coordinate space.
    pub fn local_center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.rotation_deg.is_finite()
    }
}

/// Temporary transform override applied to an element while a smart switch is in flight.
///
/// Translation is expressed relative to the element's declared position; the pivot for rotation
/// and scale is `anchor`, in local space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ElementTransform {
    /// Offset from the declared position.
    pub translate: Vec2,
    /// Rotation delta in radians.
    pub rotation_rad: f64,
    /// Box scale, default (1,1).
    pub scale: Vec2,
    /// Pivot in local space.
    pub anchor: Vec2,
}

impl Default for ElementTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            rotation_rad: 0.0,
            scale: Vec2::new(1.0, 1.0),
            anchor: Vec2::ZERO,
        }
    }
}

impl ElementTransform {
    /// Affine for a host-side interpolator: scale and rotate around `anchor`, then translate.
    pub fn to_affine(self) -> Affine {
        let t_translate = Affine::translate(self.translate);
        let t_anchor = Affine::translate(self.anchor);
        let t_unanchor = Affine::translate(-self.anchor);
        let t_rotate = Affine::rotate(self.rotation_rad);
        let t_scale = Affine::scale_non_uniform(self.scale.x, self.scale.y);

        // T(translate) * T(anchor) * R(rot) * S(scale) * T(-anchor)
        t_translate * t_anchor * t_rotate * t_scale * t_unanchor
    }

    pub fn is_identity(self) -> bool {
        self.translate == Vec2::ZERO && self.rotation_rad == 0.0 && self.scale == Vec2::new(1.0, 1.0)
    }

    /// CSS `transform` value; pair it with [`Self::css_origin`] as `transform-origin`.
    pub fn to_css(self) -> String {
        let mut parts = Vec::with_capacity(3);
        if self.translate != Vec2::ZERO {
            parts.push(format!(
                "translate({}px, {}px)",
                fmt_num(self.translate.x),
                fmt_num(self.translate.y)
            ));
        }
        if self.rotation_rad != 0.0 {
            parts.push(format!("rotate({}deg)", fmt_num(self.rotation_rad.to_degrees())));
        }
        if self.scale != Vec2::new(1.0, 1.0) {
            parts.push(format!(
                "scale({}, {})",
                fmt_num(self.scale.x),
                fmt_num(self.scale.y)
            ));
        }
        if parts.is_empty() {
            return "none".to_owned();
        }
        parts.join(" ")
    }

    pub fn css_origin(self) -> String {
        format!("{}px {}px", fmt_num(self.anchor.x), fmt_num(self.anchor.y))
    }
}

/// Format with at most 4 decimals and no trailing zeros.
pub(crate) fn fmt_num(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
