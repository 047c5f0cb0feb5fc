use crate::animation::ease::Ease;
use crate::director::transition::{
    Deadline, Director, DirectorState, ReentrantPolicy, SignalOutcome, SwitchCtx, SwitchOutcome,
    hook_targets,
};
use crate::foundation::error::{MotionError, MotionResult};
use crate::foundation::ids::{ElementIdx, GroupIdx, IdGen, SwitchId, TimerToken};
use crate::host::{AnimationHandle, Host};
use crate::matcher::correspond::UnmatchedPolicy;
use crate::registry::groups::{InitialSelection, VariantRegistry};
use crate::scene::document::Document;
use crate::tree::arena::RenderTree;
use crate::trigger::binder::{ControllerState, SwitchRequest, TriggerBinder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options controlling [`Engine`] behavior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOpts {
    /// Curve used when a transition descriptor names none.
    pub default_ease: Ease,
    /// Duration used when a transition descriptor names none.
    #[serde(rename = "default_duration_ms", with = "duration_ms")]
    pub default_duration: Duration,
    /// Added to the animation duration to form the completion deadline.
    #[serde(rename = "completion_margin_ms", with = "duration_ms")]
    pub completion_margin: Duration,
    /// Treatment of elements without a counterpart.
    pub unmatched: UnmatchedPolicy,
    /// Treatment of requests for a group that is animating.
    pub reentrant: ReentrantPolicy,
    /// Fire media hooks for `leaf-media` elements only, not for variant roots.
    pub hooks_for_media_only: bool,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            default_ease: Ease::EaseOut,
            default_duration: Duration::from_millis(300),
            completion_margin: Duration::from_millis(100),
            unmatched: UnmatchedPolicy::Snap,
            reentrant: ReentrantPolicy::Ignore,
            hooks_for_media_only: false,
        }
    }
}

impl EngineOpts {
    /// Parse options from JSON; absent fields keep their defaults.
    pub fn from_json_str(s: &str) -> MotionResult<Self> {
        serde_json::from_str(s).map_err(|e| MotionError::serde(format!("parse engine opts: {e}")))
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// What a host timer callback did.
#[derive(Debug)]
pub enum TimerOutcome {
    /// Unknown, cancelled or already consumed token.
    Stale,
    /// A switch deadline elapsed and the switch finalized.
    Deadline(SwitchId),
    /// A timer trigger fired and requested a switch.
    Trigger(SwitchOutcome),
}

/// Serializable view of one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSummary {
    /// Element id.
    pub id: String,
    /// Element name.
    pub name: String,
}

/// Serializable view of one variant group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Group element id.
    pub id: String,
    /// Group element name.
    pub name: String,
    /// Member variants in declaration order.
    pub variants: Vec<VariantSummary>,
    /// Active variant id.
    pub active: String,
    /// Rule that chose the initial variant.
    pub initial: InitialSelection,
    /// Enclosing variant id, for nested groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_variant: Option<String>,
    /// Enclosing group id, for nested groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_group: Option<String>,
    /// Director state.
    pub state: DirectorState,
}

/// Variant transition engine for one document.
///
/// The engine is the instance boundary: it owns the ingested tree, the registry of active
/// variants, the director and the trigger bindings. Every host interaction goes through a
/// `&mut dyn Host` passed per call.
#[derive(Debug)]
pub struct Engine {
    tree: RenderTree,
    registry: VariantRegistry,
    director: Director,
    binder: TriggerBinder,
    ids: IdGen,
    opts: EngineOpts,
}

impl Engine {
    /// Validate and ingest `doc`, apply initial visibility and bind triggers.
    #[tracing::instrument(skip_all, fields(document = doc.name().unwrap_or_default()))]
    pub fn initialize(doc: &Document, opts: EngineOpts, host: &mut dyn Host) -> MotionResult<Self> {
        doc.validate()?;
        let tree = RenderTree::from_document(doc)
            .map_err(|e| MotionError::validation(format!("ingest document: {e}")))?;
        let registry = VariantRegistry::discover(&tree);

        let mut engine = Self {
            tree,
            registry,
            director: Director::default(),
            binder: TriggerBinder::default(),
            ids: IdGen::default(),
            opts,
        };

        for group in engine.registry.groups() {
            for &v in group.variants() {
                host.set_visible(engine.tree.id_of(v), v == group.active());
            }
        }

        // Nested groups are covered by the walk of their enclosing variant.
        let top_level: Vec<ElementIdx> = engine
            .registry
            .groups()
            .iter()
            .filter(|g| g.parent_group().is_none())
            .map(|g| g.active())
            .collect();
        for active in top_level {
            for e in hook_targets(
                &engine.tree,
                &engine.registry,
                active,
                engine.opts.hooks_for_media_only,
            ) {
                host.element_activated(engine.tree.id_of(e));
            }
            engine.binder.bind(
                &engine.tree,
                &engine.registry,
                &mut engine.ids,
                host,
                active,
            );
        }

        tracing::info!(
            elements = engine.tree.len(),
            groups = engine.registry.groups().len(),
            listeners = engine.binder.listener_count(),
            timers = engine.binder.timer_count(),
            "engine initialized"
        );
        Ok(engine)
    }

    /// Request that `group` (id or name) switch to `variant` (id or name).
    ///
    /// Never fails: lookup errors come back as [`SwitchOutcome::Rejected`] and leave every group
    /// untouched.
    #[tracing::instrument(level = "debug", skip(self, host))]
    pub fn request_switch(
        &mut self,
        group: &str,
        variant: &str,
        host: &mut dyn Host,
    ) -> SwitchOutcome {
        let Some(g) = self.registry.find_group(&self.tree, group) else {
            let err = MotionError::group_not_found(group);
            tracing::warn!(%err, "switch rejected");
            return SwitchOutcome::Rejected(err);
        };
        let Some(v) = self.registry.find_variant(&self.tree, g, variant) else {
            let err = MotionError::variant_not_found(group, variant);
            tracing::warn!(%err, "switch rejected");
            return SwitchOutcome::Rejected(err);
        };
        self.switch_to(g, v, host)
    }

    /// Step back in the first discovered group; stays put on the first variant.
    pub fn previous(&mut self, host: &mut dyn Host) -> SwitchOutcome {
        self.step(host, -1)
    }

    /// Step forward in the first discovered group; stays put on the last variant.
    pub fn next(&mut self, host: &mut dyn Host) -> SwitchOutcome {
        self.step(host, 1)
    }

    fn step(&mut self, host: &mut dyn Host, by: isize) -> SwitchOutcome {
        let Some(g) = self.registry.first_group() else {
            let err = MotionError::NoActiveVariant("<none discovered>".to_owned());
            tracing::warn!(%err, "navigation rejected");
            return SwitchOutcome::Rejected(err);
        };
        let group = self.registry.group(g);
        let last = group.variants().len() - 1;
        let pos = group.position(group.active()).unwrap_or(0);
        let target = pos.saturating_add_signed(by).min(last);
        let target = group.variants()[target];
        self.switch_to(g, target, host)
    }

    /// Host callback: one channel animation finished.
    pub fn on_animation_end(
        &mut self,
        handle: AnimationHandle,
        host: &mut dyn Host,
    ) -> SignalOutcome {
        let mut cx = SwitchCtx {
            tree: &self.tree,
            registry: &mut self.registry,
            binder: &mut self.binder,
            ids: &mut self.ids,
            opts: &self.opts,
            host,
        };
        self.director.on_animation_end(&mut cx, handle)
    }

    /// Host callback: a scheduled timer elapsed.
    pub fn on_timer(&mut self, token: TimerToken, host: &mut dyn Host) -> TimerOutcome {
        let deadline = {
            let mut cx = SwitchCtx {
                tree: &self.tree,
                registry: &mut self.registry,
                binder: &mut self.binder,
                ids: &mut self.ids,
                opts: &self.opts,
                host: &mut *host,
            };
            self.director.on_deadline(&mut cx, token)
        };
        match deadline {
            Deadline::Finalized(switch) => TimerOutcome::Deadline(switch),
            Deadline::Stale => TimerOutcome::Stale,
            Deadline::NotMine => match self.binder.fire_timer(token) {
                Some(req) => TimerOutcome::Trigger(self.dispatch(req, host)),
                None => TimerOutcome::Stale,
            },
        }
    }

    /// Host callback: pointer activation on an element (by id).
    pub fn on_pointer(&mut self, element: &str, host: &mut dyn Host) -> Option<SwitchOutcome> {
        let idx = self.tree.find(element)?;
        let req = self.binder.pointer(&self.tree, idx)?;
        Some(self.dispatch(req, host))
    }

    /// Host callback: key press (by code).
    pub fn on_key(&mut self, code: &str, host: &mut dyn Host) -> Vec<SwitchOutcome> {
        let reqs = self.binder.key(code);
        self.dispatch_live(reqs, host)
    }

    /// Host callback: one animation frame with the current controller state.
    pub fn on_frame(&mut self, state: &ControllerState, host: &mut dyn Host) -> Vec<SwitchOutcome> {
        let reqs = self.binder.frame(state);
        self.dispatch_live(reqs, host)
    }

    /// Dispatch requests collected from one input event. A switch earlier in the batch may unbind
    /// the variant a later request was scoped to; those requests are dropped.
    fn dispatch_live(
        &mut self,
        reqs: Vec<(ElementIdx, SwitchRequest)>,
        host: &mut dyn Host,
    ) -> Vec<SwitchOutcome> {
        let mut out = Vec::with_capacity(reqs.len());
        for (scope, req) in reqs {
            if !self.binder.is_bound(scope) {
                tracing::debug!(scope = self.tree.id_of(scope), "binding detached, skipping");
                continue;
            }
            out.push(self.dispatch(req, host));
        }
        out
    }

    fn dispatch(&mut self, req: SwitchRequest, host: &mut dyn Host) -> SwitchOutcome {
        tracing::debug!(
            group = self.tree.id_of(self.registry.group(req.group).element()),
            target = self.tree.id_of(req.target),
            "trigger fired"
        );
        self.switch_to(req.group, req.target, host)
    }

    fn switch_to(&mut self, g: GroupIdx, target: ElementIdx, host: &mut dyn Host) -> SwitchOutcome {
        let mut cx = SwitchCtx {
            tree: &self.tree,
            registry: &mut self.registry,
            binder: &mut self.binder,
            ids: &mut self.ids,
            opts: &self.opts,
            host,
        };
        self.director.request(&mut cx, g, target)
    }

    /// Active variant id of a group (id or name).
    pub fn active_variant(&self, group: &str) -> Option<&str> {
        let g = self.registry.find_group(&self.tree, group)?;
        Some(self.tree.id_of(self.registry.active(g)))
    }

    /// Whether a group (id or name) has a switch in flight.
    pub fn is_animating(&self, group: &str) -> bool {
        self.state(group) == Some(DirectorState::Animating)
    }

    /// Director state of a group (id or name).
    pub fn state(&self, group: &str) -> Option<DirectorState> {
        let g = self.registry.find_group(&self.tree, group)?;
        Some(self.director.state(g))
    }

    /// Completion signals still awaited by a group's in-flight switch.
    pub fn pending_signals(&self, group: &str) -> Option<usize> {
        let g = self.registry.find_group(&self.tree, group)?;
        self.director.pending_signals(g)
    }

    /// Whether the triggers of a variant (by id) are currently bound.
    pub fn is_bound(&self, variant: &str) -> bool {
        self.tree
            .find(variant)
            .is_some_and(|v| self.binder.is_bound(v))
    }

    /// Every discovered group, in discovery order.
    pub fn groups(&self) -> Vec<GroupSummary> {
        let id = |idx: ElementIdx| self.tree.id_of(idx).to_owned();
        self.registry
            .groups()
            .iter()
            .enumerate()
            .map(|(i, g)| GroupSummary {
                id: id(g.element()),
                name: self.tree.get(g.element()).name().to_owned(),
                variants: g
                    .variants()
                    .iter()
                    .map(|&v| VariantSummary {
                        id: id(v),
                        name: self.tree.get(v).name().to_owned(),
                    })
                    .collect(),
                active: id(g.active()),
                initial: g.initial_selection(),
                parent_variant: g.parent_variant().map(id),
                parent_group: g
                    .parent_group()
                    .map(|pg| id(self.registry.group(pg).element())),
                state: self.director.state(GroupIdx(i as u32)),
            })
            .collect()
    }

    /// Ingested element arena.
    pub fn tree(&self) -> &RenderTree {
        &self.tree
    }

    /// Variant group registry.
    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    /// Options the engine was initialized with.
    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/engine.rs"]
mod tests;
