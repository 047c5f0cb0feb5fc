use crate::foundation::core::{Point, Rect, Vec2};
use crate::matcher::correspond::CorrespondencePair;
use crate::scene::model::{Paint, paints_equal};
use crate::tree::arena::RenderTree;
use serde::Serialize;

const EPS: f64 = 1e-6;

/// Opacity channel: relative change plus the absolute value to animate to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpacityDelta {
    /// `target - source`.
    pub delta: f64,
    /// Target opacity.
    pub target: f64,
}

/// Element-local shape scale, animated on its own channel with its own origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapeScale {
    /// Horizontal factor.
    pub sx: f64,
    /// Vertical factor.
    pub sy: f64,
    /// Center of the rendered box, in the host's element-local coordinates.
    pub origin: Point,
}

/// Changed channels of one correspondence pair. `None` means the channel is skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Delta {
    /// Translation `(Δx, Δy)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
    /// Rotation change in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_deg: Option<f64>,
    /// Box scale factors for non path-like elements, combined into the transform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec2>,
    /// Opacity change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<OpacityDelta>,
    /// Full target fill list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Vec<Paint>>,
    /// Path-like elements only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_scale: Option<ShapeScale>,
}

impl Delta {
    /// Whether at least one channel is flagged.
    pub fn has_changes(&self) -> bool {
        self.has_transform()
            || self.opacity.is_some()
            || self.fill.is_some()
            || self.shape_scale.is_some()
    }

    /// Whether position, rotation or box scale changed.
    pub fn has_transform(&self) -> bool {
        self.position.is_some() || self.rotation_deg.is_some() || self.scale.is_some()
    }

    /// Only the shape-scale channel is flagged.
    pub fn is_shape_only(&self) -> bool {
        self.shape_scale.is_some()
            && !self.has_transform()
            && self.opacity.is_none()
            && self.fill.is_none()
    }
}

/// Compute the delta of a matched pair.
///
/// `rendered` is the outgoing element's own rendered box as reported by the host. It is only
/// consulted for path-like elements; `None` skips the shape-scale channel and nothing else.
pub fn diff(tree: &RenderTree, pair: &CorrespondencePair, rendered: Option<Rect>) -> Delta {
    let src = tree.get(pair.outgoing);
    let dst = tree.get(pair.incoming);
    let (sg, dg) = (src.geometry(), dst.geometry());

    let mut delta = Delta::default();

    let dpos = Vec2::new(dg.x - sg.x, dg.y - sg.y);
    if dpos.x.abs() > EPS || dpos.y.abs() > EPS {
        delta.position = Some(dpos);
    }

    let drot = dg.rotation_deg - sg.rotation_deg;
    if drot.abs() > EPS {
        delta.rotation_deg = Some(drot);
    }

    let dop = dst.opacity() - src.opacity();
    if dop.abs() > EPS {
        delta.opacity = Some(OpacityDelta {
            delta: dop,
            target: dst.opacity(),
        });
    }

    if !paints_equal(src.fills(), dst.fills()) {
        delta.fill = Some(dst.fills().to_vec());
    }

    if src.kind().is_path_like() {
        // The container box says nothing about the path; compare what is actually drawn.
        delta.shape_scale = match rendered {
            Some(r) => shape_scale(r, dg.width, dg.height),
            None => {
                tracing::debug!(
                    element = src.id(),
                    "no rendered bounds; skipping shape scale"
                );
                None
            }
        };
    } else if (dg.width - sg.width).abs() > EPS || (dg.height - sg.height).abs() > EPS {
        delta.scale = box_scale(sg.width, sg.height, dg.width, dg.height);
        if delta.scale.is_none() {
            tracing::debug!(element = src.id(), "degenerate source box; skipping scale");
        }
    }

    delta
}

fn box_scale(sw: f64, sh: f64, dw: f64, dh: f64) -> Option<Vec2> {
    (sw > EPS && sh > EPS).then(|| Vec2::new(dw / sw, dh / sh))
}

fn shape_scale(rendered: Rect, width: f64, height: f64) -> Option<ShapeScale> {
    let (rw, rh) = (rendered.width(), rendered.height());
    if rw <= EPS || rh <= EPS {
        return None;
    }
    let (sx, sy) = (width / rw, height / rh);
    ((sx - 1.0).abs() > EPS || (sy - 1.0).abs() > EPS).then(|| ShapeScale {
        sx,
        sy,
        origin: rendered.center(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/delta/diff.rs"]
mod tests;
