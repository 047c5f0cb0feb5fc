//! varimotion switches interactive design documents between variant presentations and animates
//! the change.
//!
//! The public API is session-oriented:
//!
//! - Load and validate a [`Document`]
//! - Create an [`Engine`] against a [`Host`] (the renderer/animation/timer seam)
//! - Request switches directly, through [`Engine::previous`]/[`Engine::next`], or let bound
//!   triggers fire them; feed host callbacks back through the `Engine::on_*` methods
//!
//! A smart switch matches elements of the outgoing and incoming variants by `(name, type)`,
//! diffs each pair into per-channel deltas, starts one host animation per changed channel and
//! finalizes once every animated element reports completion or the deadline elapses.
//!
//! Hosts that interpolate channels themselves instead of handing them to a native animation API
//! can sample [`Ease::apply`] per frame and compose [`ElementTransform::to_affine`] onto the
//! element's declared placement.
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod delta;
pub(crate) mod director;
pub(crate) mod matcher;
pub(crate) mod registry;
pub(crate) mod schema;
pub(crate) mod tree;
pub(crate) mod trigger;

/// Host integration seam and the in-memory recording host.
pub mod host;
pub(crate) mod scene;
pub(crate) mod session;

pub use crate::foundation::core::{Affine, ElementTransform, Geometry, Point, Rect, Vec2};
pub use crate::foundation::error::{MotionError, MotionResult};
pub use crate::foundation::ids::{ElementIdx, GroupIdx, SwitchId, TimerToken};

pub use crate::animation::ease::Ease;
pub use crate::delta::diff::{Delta, OpacityDelta, ShapeScale, diff};
pub use crate::director::plan::{AnimationPlan, Channel, ChannelTarget, ElementPlan, Timing};
pub use crate::director::transition::{
    DirectorState, ReentrantPolicy, SignalOutcome, SwitchOutcome,
};
pub use crate::host::{AnimationHandle, Host, HostOp, ListenerKind, RecordingHost};
pub use crate::matcher::correspond::{
    CorrespondencePair, MatchOutcome, MatchRule, UnmatchedPolicy, match_elements, match_variants,
};
pub use crate::registry::groups::{InitialSelection, VariantGroup, VariantRegistry};
pub use crate::scene::color::Color;
pub use crate::scene::document::Document;
pub use crate::scene::model::{
    DOCUMENT_VERSION, DocumentDef, ElementDef, ElementKind, GradientStop, Paint, TransitionDef,
    TriggerDef, TriggerKind, paints_equal,
};
pub use crate::schema::validate::{SchemaError, SchemaErrors};
pub use crate::session::engine::{Engine, EngineOpts, GroupSummary, TimerOutcome, VariantSummary};
pub use crate::tree::arena::{Element, RenderTree};
pub use crate::trigger::binder::{ControllerState, SwitchRequest};
