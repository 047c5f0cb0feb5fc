use crate::animation::ease::Ease;
use crate::delta::diff::{Delta, diff};
use crate::foundation::core::{Affine, ElementTransform, Point, Vec2};
use crate::foundation::ids::ElementIdx;
use crate::host::Host;
use crate::matcher::correspond::MatchOutcome;
use crate::scene::model::{Paint, TransitionDef};
use crate::tree::arena::RenderTree;
use serde::Serialize;
use smallvec::SmallVec;
use std::time::Duration;

/// Renderer-level animation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Position, rotation and box scale combined.
    Transform,
    /// Element opacity.
    Opacity,
    /// Fill list; interpolated by the host.
    Fill,
    /// Element-local shape scale on its own origin.
    ShapeScale,
}

/// Value a channel animates towards.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum ChannelTarget {
    /// Relative transform applied on top of the element's static placement.
    Transform {
        /// Structured transform.
        transform: ElementTransform,
        /// CSS `transform` value.
        css: String,
        /// CSS `transform-origin` value.
        origin: String,
    },
    /// Absolute opacity.
    Opacity {
        /// Target opacity.
        value: f64,
    },
    /// Full target fill list.
    Fill {
        /// Target paints.
        paints: Vec<Paint>,
    },
    /// Shape scale around `origin` (element-local).
    ShapeScale {
        /// Horizontal factor.
        sx: f64,
        /// Vertical factor.
        sy: f64,
        /// Scale origin.
        origin: Point,
    },
}

impl ChannelTarget {
    /// Channel this target drives.
    pub fn channel(&self) -> Channel {
        match self {
            Self::Transform { .. } => Channel::Transform,
            Self::Opacity { .. } => Channel::Opacity,
            Self::Fill { .. } => Channel::Fill,
            Self::ShapeScale { .. } => Channel::ShapeScale,
        }
    }
}

/// Curve and duration shared by every animation of one switch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// Easing curve.
    pub ease: Ease,
    /// Animation duration.
    pub duration: Duration,
}

impl Timing {
    /// Resolve the departing variant's descriptor.
    ///
    /// No descriptor, or an explicit zero duration, means an instantaneous swap (`None`).
    pub fn resolve(
        def: Option<&TransitionDef>,
        default_ease: Ease,
        default_duration: Duration,
    ) -> Option<Self> {
        let def = def?;
        let duration = match def.duration_seconds {
            None => default_duration,
            Some(secs) => Duration::try_from_secs_f64(secs).unwrap_or(default_duration),
        };
        if duration.is_zero() {
            return None;
        }
        Some(Self {
            ease: def.curve.unwrap_or(default_ease),
            duration,
        })
    }
}

/// Animations for one outgoing element.
#[derive(Debug, Clone)]
pub struct ElementPlan {
    /// Outgoing element that is animated.
    pub element: ElementIdx,
    /// Its counterpart in the incoming variant.
    pub counterpart: ElementIdx,
    /// Changed channels.
    pub delta: Delta,
    /// Host animations to start, at most one per channel.
    pub channels: SmallVec<[ChannelTarget; 4]>,
}

impl ElementPlan {
    /// Only the shape-scale channel animates.
    pub fn is_shape_only(&self) -> bool {
        self.delta.is_shape_only()
    }
}

/// Everything a smart switch starts in one synchronous pass.
#[derive(Debug, Clone)]
pub struct AnimationPlan {
    /// Shared timing.
    pub timing: Timing,
    /// Elements with at least one changed channel, in outgoing document order.
    pub elements: Vec<ElementPlan>,
    /// Matched pairs dropped because nothing changed.
    pub unchanged: usize,
    /// Outgoing elements without a counterpart; they vanish with the outgoing root.
    pub unmatched_outgoing: Vec<ElementIdx>,
    /// Incoming elements without a counterpart; they appear with the incoming root.
    pub unmatched_incoming: Vec<ElementIdx>,
}

impl AnimationPlan {
    /// Diff every pair and turn non-empty deltas into channel animations.
    pub fn build(
        tree: &RenderTree,
        matched: &MatchOutcome,
        host: &dyn Host,
        timing: Timing,
    ) -> Self {
        let mut elements = Vec::with_capacity(matched.pairs.len());
        let mut unchanged = 0;
        for pair in &matched.pairs {
            let src = tree.get(pair.outgoing);
            let rendered = if src.kind().is_path_like() {
                host.rendered_bounds(src.id())
            } else {
                None
            };
            let delta = diff(tree, pair, rendered);
            if !delta.has_changes() {
                unchanged += 1;
                continue;
            }
            let channels = channel_targets(tree, pair.outgoing, &delta);
            elements.push(ElementPlan {
                element: pair.outgoing,
                counterpart: pair.incoming,
                delta,
                channels,
            });
        }

        Self {
            timing,
            elements,
            unchanged,
            unmatched_outgoing: matched.unmatched_outgoing.clone(),
            unmatched_incoming: matched.unmatched_incoming.clone(),
        }
    }

    /// Completion signals the switch waits for: one per animated element.
    pub fn expected_signals(&self) -> usize {
        self.elements.len()
    }

    /// Elements whose only animation is the shape-scale channel.
    pub fn shape_only(&self) -> impl Iterator<Item = ElementIdx> + '_ {
        self.elements
            .iter()
            .filter(|e| e.is_shape_only())
            .map(|e| e.element)
    }
}

fn channel_targets(
    tree: &RenderTree,
    element: ElementIdx,
    delta: &Delta,
) -> SmallVec<[ChannelTarget; 4]> {
    let mut out = SmallVec::new();
    if delta.has_transform() {
        let transform = relative_transform(tree, element, delta);
        out.push(ChannelTarget::Transform {
            css: transform.to_css(),
            origin: transform.css_origin(),
            transform,
        });
    }
    if let Some(op) = delta.opacity {
        out.push(ChannelTarget::Opacity { value: op.target });
    }
    if let Some(paints) = &delta.fill {
        out.push(ChannelTarget::Fill {
            paints: paints.clone(),
        });
    }
    if let Some(s) = delta.shape_scale {
        out.push(ChannelTarget::ShapeScale {
            sx: s.sx,
            sy: s.sy,
            origin: s.origin,
        });
    }
    out
}

/// Transform that rotates and scales around the box center while landing the box's top-left
/// corner on the target position.
fn relative_transform(tree: &RenderTree, element: ElementIdx, delta: &Delta) -> ElementTransform {
    let anchor = tree.get(element).geometry().local_center().to_vec2();
    let rotation_rad = delta.rotation_deg.unwrap_or(0.0).to_radians();
    let scale = delta.scale.unwrap_or(Vec2::new(1.0, 1.0));
    let shift = delta.position.unwrap_or(Vec2::ZERO);

    let rs = Affine::rotate(rotation_rad) * Affine::scale_non_uniform(scale.x, scale.y);
    let moved_anchor = (rs * anchor.to_point()).to_vec2();

    ElementTransform {
        translate: shift - anchor + moved_anchor,
        rotation_rad,
        scale,
        anchor,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/director/plan.rs"]
mod tests;
