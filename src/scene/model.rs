use crate::animation::ease::Ease;
use crate::foundation::core::Geometry;
use crate::scene::color::Color;
use serde::{Deserialize, Serialize};

/// Document format version accepted by [`crate::Document`].
pub const DOCUMENT_VERSION: &str = "1";

/// Root of a serialized document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDef {
    /// Must equal [`DOCUMENT_VERSION`].
    pub version: String,
    /// Optional human-readable document name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Top-level element.
    pub root: ElementDef,
}

/// Closed set of element type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    /// Frame-like box with children.
    Container,
    /// Transparent grouping node.
    Group,
    /// Text run.
    Text,
    /// Arbitrary vector path.
    ShapeVector,
    /// Ellipse.
    ShapeEllipse,
    /// Rectangle; geometry is its box.
    ShapeRect,
    /// Regular polygon.
    ShapePolygon,
    /// Star.
    ShapeStar,
    /// Line segment.
    ShapeLine,
    /// Boolean combination of shapes.
    ShapeBoolean,
    /// Image, video or animation file handled by media collaborators.
    LeafMedia,
    /// Component instance.
    Instance,
    /// Variant container; its `variant` children are mutually exclusive.
    VariantGroup,
    /// One presentation inside a variant group.
    Variant,
}

impl ElementKind {
    /// Kinds whose visible geometry comes from a path payload rather than the box.
    pub fn is_path_like(self) -> bool {
        matches!(
            self,
            Self::ShapeVector
                | Self::ShapeEllipse
                | Self::ShapePolygon
                | Self::ShapeStar
                | Self::ShapeLine
                | Self::ShapeBoolean
        )
    }

    /// Whether media collaborators care about this element's activation.
    pub fn is_media(self) -> bool {
        matches!(self, Self::LeafMedia)
    }

    /// The serialized tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Group => "group",
            Self::Text => "text",
            Self::ShapeVector => "shape-vector",
            Self::ShapeEllipse => "shape-ellipse",
            Self::ShapeRect => "shape-rect",
            Self::ShapePolygon => "shape-polygon",
            Self::ShapeStar => "shape-star",
            Self::ShapeLine => "shape-line",
            Self::ShapeBoolean => "shape-boolean",
            Self::LeafMedia => "leaf-media",
            Self::Instance => "instance",
            Self::VariantGroup => "variant-group",
            Self::Variant => "variant",
        }
    }
}

/// One element of the authored tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDef {
    /// Unique within the whole document.
    pub id: String,
    /// Human-assigned name; the primary correspondence key across variants.
    #[serde(default)]
    pub name: String,
    /// Type tag.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Left edge relative to the parent.
    #[serde(default)]
    pub x: f64,
    /// Top edge relative to the parent.
    #[serde(default)]
    pub y: f64,
    /// Declared box width.
    #[serde(default)]
    pub width: f64,
    /// Declared box height.
    #[serde(default)]
    pub height: f64,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Missing opacity means fully opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Ordered fill paints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fills: Vec<Paint>,
    /// Ordered stroke paints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strokes: Vec<Paint>,
    /// Children in paint order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementDef>,
    /// How leaving this element (a `variant`) should animate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionDef>,
    /// Input events that request a switch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<TriggerDef>,
    /// On a `variant-group`: externally bound default, as a variant id or name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_variant: Option<String>,
}

impl ElementDef {
    /// Create an element with zero geometry and no style.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            opacity: None,
            fills: Vec::new(),
            strokes: Vec::new(),
            children: Vec::new(),
            transition: None,
            triggers: Vec::new(),
            default_variant: None,
        }
    }

    /// Set position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set box size.
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set rotation in degrees.
    pub fn rotated(mut self, deg: f64) -> Self {
        self.rotation = deg;
        self
    }

    /// Set opacity.
    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Append a fill.
    pub fn fill(mut self, paint: Paint) -> Self {
        self.fills.push(paint);
        self
    }

    /// Append a child.
    pub fn child(mut self, child: ElementDef) -> Self {
        self.children.push(child);
        self
    }

    /// Attach a transition descriptor.
    pub fn transition(mut self, transition: TransitionDef) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Append a trigger.
    pub fn trigger(mut self, trigger: TriggerDef) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Set the externally bound default variant.
    pub fn default_variant(mut self, variant: impl Into<String>) -> Self {
        self.default_variant = Some(variant.into());
        self
    }

    /// Declared geometry.
    pub fn geometry(&self) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation_deg: self.rotation,
        }
    }
}

/// A fill or stroke paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Paint {
    /// Flat color.
    Solid {
        /// Paint color.
        color: Color,
        /// Paint-level opacity multiplied into the color alpha.
        #[serde(default = "one")]
        opacity: f64,
    },
    /// Linear gradient.
    LinearGradient {
        /// Ordered color stops.
        stops: Vec<GradientStop>,
    },
    /// Radial gradient.
    RadialGradient {
        /// Ordered color stops.
        stops: Vec<GradientStop>,
    },
    /// Image fill, compared by reference.
    Image {
        /// Opaque image reference.
        #[serde(rename = "ref")]
        image_ref: String,
    },
}

fn one() -> f64 {
    1.0
}

impl Paint {
    /// Solid paint helper.
    pub fn solid(color: Color) -> Self {
        Self::Solid {
            color,
            opacity: 1.0,
        }
    }

    /// Deep value comparison: color + alpha for solids, stop lists for gradients.
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Solid {
                    color: a,
                    opacity: oa,
                },
                Self::Solid {
                    color: b,
                    opacity: ob,
                },
            ) => a.with_opacity(*oa).approx_eq(&b.with_opacity(*ob)),
            (Self::LinearGradient { stops: a }, Self::LinearGradient { stops: b })
            | (Self::RadialGradient { stops: a }, Self::RadialGradient { stops: b }) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(sa, sb)| {
                        (sa.position - sb.position).abs() < 1e-6 && sa.color.approx_eq(&sb.color)
                    })
            }
            (Self::Image { image_ref: a }, Self::Image { image_ref: b }) => a == b,
            _ => false,
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        match self {
            Self::Solid { color, opacity } => color.is_finite() && opacity.is_finite(),
            Self::LinearGradient { stops } | Self::RadialGradient { stops } => stops
                .iter()
                .all(|s| s.position.is_finite() && s.color.is_finite()),
            Self::Image { .. } => true,
        }
    }
}

/// Whether two ordered paint lists are equal by value.
pub fn paints_equal(a: &[Paint], b: &[Paint]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(pa, pb)| pa.same_value(pb))
}

/// One gradient stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Offset in `[0, 1]`.
    pub position: f64,
    /// Stop color.
    pub color: Color,
}

/// Smart-transition descriptor attached to the departing variant.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TransitionDef {
    /// Easing curve; engine default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<Ease>,
    /// Duration in seconds; engine default when absent.
    #[serde(
        default,
        alias = "durationSeconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_seconds: Option<f64>,
}

impl TransitionDef {
    /// Descriptor with explicit curve and duration.
    pub fn new(curve: Ease, duration_seconds: f64) -> Self {
        Self {
            curve: Some(curve),
            duration_seconds: Some(duration_seconds),
        }
    }
}

/// Input event family a trigger listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Click / tap on the element.
    Pointer,
    /// Fires once, `delay_ms` after the owning variant became visible.
    Timer,
    /// Key press matched by `KeyboardEvent.code`-style string.
    Key,
    /// Game controller button, polled once per host frame.
    Controller,
}

/// Authored trigger descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDef {
    /// Event family.
    pub on: TriggerKind,
    /// Target variant, by id (or name as a fallback).
    pub target: String,
    /// Owning group id; nearest enclosing group when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Timer delay in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    /// Key code for `key` triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Button index for `controller` triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<u32>,
}

impl TriggerDef {
    /// Pointer-activate trigger.
    pub fn pointer(target: impl Into<String>) -> Self {
        Self::base(TriggerKind::Pointer, target)
    }

    /// Timer trigger.
    pub fn timer(target: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            delay_ms: Some(delay_ms),
            ..Self::base(TriggerKind::Timer, target)
        }
    }

    /// Key-press trigger.
    pub fn key(target: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            key: Some(code.into()),
            ..Self::base(TriggerKind::Key, target)
        }
    }

    /// Controller-button trigger.
    pub fn controller(target: impl Into<String>, button: u32) -> Self {
        Self {
            button: Some(button),
            ..Self::base(TriggerKind::Controller, target)
        }
    }

    /// Scope the trigger to an explicit group.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    fn base(on: TriggerKind, target: impl Into<String>) -> Self {
        Self {
            on,
            target: target.into(),
            group: None,
            delay_ms: None,
            key: None,
            button: None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
