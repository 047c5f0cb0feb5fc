use crate::foundation::error::MotionError;
use crate::foundation::ids::{ElementIdx, GroupIdx, IdGen, TimerToken};
use crate::host::{Host, ListenerKind};
use crate::registry::groups::VariantRegistry;
use crate::scene::model::{TriggerDef, TriggerKind};
use crate::tree::arena::RenderTree;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;

/// A resolved "switch `group` to `target`" request produced by a fired trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchRequest {
    /// Owning group.
    pub group: GroupIdx,
    /// Variant to activate.
    pub target: ElementIdx,
}

/// Controller buttons held down during one host frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// Pressed button indices.
    pub pressed: Vec<u32>,
}

impl ControllerState {
    /// State with the given buttons held.
    pub fn pressed(buttons: impl IntoIterator<Item = u32>) -> Self {
        Self {
            pressed: buttons.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Match {
    Any,
    Key(String),
    Button(u32),
}

#[derive(Debug, Clone)]
struct Action {
    on: Match,
    request: SwitchRequest,
}

/// One host listener per `(element, kind)`; competing bindings share it.
#[derive(Debug)]
struct Listener {
    element: ElementIdx,
    kind: ListenerKind,
    scope: ElementIdx,
    actions: SmallVec<[Action; 2]>,
}

#[derive(Debug)]
struct PendingTimer {
    scope: ElementIdx,
    request: SwitchRequest,
}

/// Attaches and detaches trigger listeners for the displayed active variants.
///
/// Every binding is scoped to the nearest variant enclosing its element. Unbinding a group drops
/// every binding scoped inside it, nested groups included, and cancels their pending timers.
#[derive(Debug, Default)]
pub(crate) struct TriggerBinder {
    listeners: Vec<Listener>,
    timers: BTreeMap<TimerToken, PendingTimer>,
    bound: HashSet<ElementIdx>,
    held: BTreeSet<u32>,
}

impl TriggerBinder {
    /// Bind the triggers of `variant` and of the active variants of its nested groups.
    ///
    /// Idempotent: a variant that is already bound is left alone.
    pub(crate) fn bind(
        &mut self,
        tree: &RenderTree,
        registry: &VariantRegistry,
        ids: &mut IdGen,
        host: &mut dyn Host,
        variant: ElementIdx,
    ) {
        if self.bound.contains(&variant) {
            tracing::debug!(variant = tree.id_of(variant), "variant already bound");
            return;
        }

        for idx in tree.preorder_where(variant, |c| registry.is_active_or_plain(c)) {
            if registry.owning_group(idx).is_some() {
                self.bound.insert(idx);
            }
            let el = tree.get(idx);
            if el.triggers().is_empty() {
                continue;
            }
            let scope = std::iter::once(idx)
                .chain(tree.ancestors(idx))
                .find(|a| registry.owning_group(*a).is_some())
                .unwrap_or(variant);

            for trig in el.triggers() {
                let request = match resolve(tree, registry, idx, trig) {
                    Ok(r) => r,
                    Err(err) => {
                        tracing::warn!(element = el.id(), %err, "dropping trigger");
                        continue;
                    }
                };
                self.attach(tree, ids, host, idx, scope, trig, request);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn attach(
        &mut self,
        tree: &RenderTree,
        ids: &mut IdGen,
        host: &mut dyn Host,
        element: ElementIdx,
        scope: ElementIdx,
        trig: &TriggerDef,
        request: SwitchRequest,
    ) {
        let (kind, on) = match trig.on {
            TriggerKind::Timer => {
                let token = ids.timer();
                let delay = Duration::from_millis(trig.delay_ms.unwrap_or(0));
                host.schedule_timer(token, delay);
                self.timers.insert(token, PendingTimer { scope, request });
                return;
            }
            TriggerKind::Pointer => (ListenerKind::Pointer, Match::Any),
            TriggerKind::Key => (
                ListenerKind::Key,
                Match::Key(trig.key.clone().unwrap_or_default()),
            ),
            TriggerKind::Controller => (
                ListenerKind::Controller,
                Match::Button(trig.button.unwrap_or(0)),
            ),
        };

        let action = Action { on, request };
        if let Some(l) = self
            .listeners
            .iter_mut()
            .find(|l| l.element == element && l.kind == kind)
        {
            if kind == ListenerKind::Pointer {
                tracing::debug!(
                    element = tree.id_of(element),
                    "element already has a pointer trigger; extra one ignored"
                );
                return;
            }
            l.actions.push(action);
            return;
        }

        host.attach_listener(tree.id_of(element), kind);
        self.listeners.push(Listener {
            element,
            kind,
            scope,
            actions: SmallVec::from_elem(action, 1),
        });
    }

    /// Drop every binding scoped inside `g` and cancel its timers. Idempotent.
    pub(crate) fn unbind_group(
        &mut self,
        tree: &RenderTree,
        registry: &VariantRegistry,
        g: GroupIdx,
        host: &mut dyn Host,
    ) {
        let root = registry.group(g).element();

        let mut kept = Vec::with_capacity(self.listeners.len());
        for l in self.listeners.drain(..) {
            if tree.is_within(l.scope, root) {
                host.detach_listener(tree.id_of(l.element), l.kind);
            } else {
                kept.push(l);
            }
        }
        self.listeners = kept;

        let cancelled: Vec<TimerToken> = self
            .timers
            .iter()
            .filter(|(_, t)| tree.is_within(t.scope, root))
            .map(|(token, _)| *token)
            .collect();
        for token in cancelled {
            self.timers.remove(&token);
            host.cancel_timer(token);
        }

        self.bound.retain(|&v| !tree.is_within(v, root));
    }

    /// Consume a trigger timer. Tokens that were cancelled or never issued yield `None`.
    pub(crate) fn fire_timer(&mut self, token: TimerToken) -> Option<SwitchRequest> {
        self.timers.remove(&token).map(|t| t.request)
    }

    /// Pointer activation on `element`, delivered to the nearest element with a pointer binding.
    pub(crate) fn pointer(&self, tree: &RenderTree, element: ElementIdx) -> Option<SwitchRequest> {
        std::iter::once(element)
            .chain(tree.ancestors(element))
            .find_map(|e| {
                self.listeners
                    .iter()
                    .find(|l| l.element == e && l.kind == ListenerKind::Pointer)
            })
            .and_then(|l| l.actions.first())
            .map(|a| a.request)
    }

    /// Every key binding matching `code`, in binding order, tagged with the variant it is scoped to.
    pub(crate) fn key(&self, code: &str) -> Vec<(ElementIdx, SwitchRequest)> {
        self.matching(ListenerKind::Key, |on| matches!(on, Match::Key(k) if k == code))
    }

    /// Edge-detect controller buttons against the previous frame.
    pub(crate) fn frame(&mut self, state: &ControllerState) -> Vec<(ElementIdx, SwitchRequest)> {
        let now: BTreeSet<u32> = state.pressed.iter().copied().collect();
        let pressed: Vec<u32> = now.difference(&self.held).copied().collect();
        self.held = now;
        if pressed.is_empty() {
            return Vec::new();
        }
        self.matching(ListenerKind::Controller, |on| {
            matches!(on, Match::Button(b) if pressed.contains(b))
        })
    }

    fn matching(
        &self,
        kind: ListenerKind,
        pred: impl Fn(&Match) -> bool,
    ) -> Vec<(ElementIdx, SwitchRequest)> {
        self.listeners
            .iter()
            .filter(|l| l.kind == kind)
            .flat_map(|l| l.actions.iter().map(move |a| (l.scope, a)))
            .filter(|(_, a)| pred(&a.on))
            .map(|(scope, a)| (scope, a.request))
            .collect()
    }

    pub(crate) fn is_bound(&self, variant: ElementIdx) -> bool {
        self.bound.contains(&variant)
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn timer_count(&self) -> usize {
        self.timers.len()
    }
}

/// Resolve the owning group (explicit id, else nearest enclosing group) and the target variant.
fn resolve(
    tree: &RenderTree,
    registry: &VariantRegistry,
    element: ElementIdx,
    trig: &TriggerDef,
) -> Result<SwitchRequest, MotionError> {
    let group = match trig.group.as_deref() {
        Some(key) => registry
            .find_group(tree, key)
            .ok_or_else(|| MotionError::group_not_found(key))?,
        None => registry
            .nearest_group(tree, element)
            .ok_or_else(|| MotionError::group_not_found(format!("<enclosing {}>", tree.id_of(element))))?,
    };
    let target = registry
        .find_variant(tree, group, &trig.target)
        .ok_or_else(|| {
            MotionError::variant_not_found(
                tree.id_of(registry.group(group).element()),
                trig.target.as_str(),
            )
        })?;
    Ok(SwitchRequest { group, target })
}

#[cfg(test)]
#[path = "../../tests/unit/trigger/binder.rs"]
mod tests;
