use crate::director::completion::{CompletionTracker, Progress};
use crate::director::plan::{AnimationPlan, Timing};
use crate::foundation::error::MotionError;
use crate::foundation::ids::{ElementIdx, GroupIdx, IdGen, SwitchId, TimerToken};
use crate::host::{AnimationHandle, Host};
use crate::matcher::correspond::match_variants;
use crate::registry::groups::VariantRegistry;
use crate::scene::model::ElementKind;
use crate::session::engine::EngineOpts;
use crate::tree::arena::RenderTree;
use crate::trigger::binder::TriggerBinder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Per-group director state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorState {
    /// No switch in flight.
    Idle,
    /// Animations started; waiting for completion signals or the deadline.
    Animating,
    /// Swapping visibility and state; entered and left within one call.
    Finalizing,
}

/// Resolution of a switch request for a group that is already animating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReentrantPolicy {
    /// Drop the new request; the group accepts requests again once Idle.
    #[default]
    Ignore,
    /// Finalize the in-flight switch immediately, then handle the new request from its target.
    Restart,
}

/// What a switch request did.
#[derive(Debug)]
pub enum SwitchOutcome {
    /// The target is already active; nothing changed.
    AlreadyActive,
    /// The group is animating and the request was dropped.
    Ignored,
    /// Swapped without animation.
    Instant,
    /// Smooth transition with nothing to animate; finalized immediately.
    Completed,
    /// Animations started.
    Started {
        /// Switch id carried by every [`AnimationHandle`] of this switch.
        switch: SwitchId,
        /// Completion signals awaited.
        awaiting: usize,
    },
    /// A lookup failed; nothing changed.
    Rejected(MotionError),
}

impl SwitchOutcome {
    /// Whether the active variant changed (or will, once animations finish).
    pub fn switched(&self) -> bool {
        matches!(
            self,
            Self::Instant | Self::Completed | Self::Started { .. }
        )
    }
}

impl fmt::Display for SwitchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActive => f.write_str("already active"),
            Self::Ignored => f.write_str("ignored (group is animating)"),
            Self::Instant => f.write_str("instant"),
            Self::Completed => f.write_str("completed (nothing to animate)"),
            Self::Started { switch, awaiting } => {
                write!(f, "started switch {} awaiting {awaiting}", switch.get())
            }
            Self::Rejected(err) => write!(f, "rejected: {err}"),
        }
    }
}

/// What an animation-end signal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// Not part of any in-flight switch, or already counted.
    Stale,
    /// Counted; this many elements are still outstanding.
    Pending(usize),
    /// Counted and the switch finalized.
    Finalized(SwitchId),
}

/// What a director-owned deadline timer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deadline {
    /// Not a deadline token.
    NotMine,
    /// The switch it guarded already finalized.
    Stale,
    /// The switch finalized on timeout.
    Finalized(SwitchId),
}

/// Borrowed engine state a director operation works on.
pub(crate) struct SwitchCtx<'a> {
    pub(crate) tree: &'a RenderTree,
    pub(crate) registry: &'a mut VariantRegistry,
    pub(crate) binder: &'a mut TriggerBinder,
    pub(crate) ids: &'a mut IdGen,
    pub(crate) opts: &'a EngineOpts,
    pub(crate) host: &'a mut dyn Host,
}

#[derive(Debug)]
struct InFlight {
    from: ElementIdx,
    to: ElementIdx,
    touched: Vec<ElementIdx>,
    tracker: CompletionTracker,
}

/// Drives switches: Idle → Animating → Finalizing → Idle, independently per group.
///
/// The registry's active pointer is only written from [`Director::swap`], which every path
/// (instant, zero-change, countdown, deadline) goes through exactly once per switch.
#[derive(Debug, Default)]
pub(crate) struct Director {
    inflight: HashMap<GroupIdx, InFlight>,
    deadlines: HashMap<TimerToken, GroupIdx>,
}

impl Director {
    pub(crate) fn state(&self, g: GroupIdx) -> DirectorState {
        if self.inflight.contains_key(&g) {
            DirectorState::Animating
        } else {
            DirectorState::Idle
        }
    }

    pub(crate) fn pending_signals(&self, g: GroupIdx) -> Option<usize> {
        self.inflight.get(&g).map(|f| f.tracker.remaining())
    }

    pub(crate) fn request(
        &mut self,
        cx: &mut SwitchCtx<'_>,
        g: GroupIdx,
        target: ElementIdx,
    ) -> SwitchOutcome {
        let tree = cx.tree;
        let group_id = tree.id_of(cx.registry.group(g).element());
        if cx.registry.active(g) == target {
            tracing::debug!(group = group_id, "target already active");
            return SwitchOutcome::AlreadyActive;
        }
        if self.inflight.contains_key(&g) {
            match cx.opts.reentrant {
                ReentrantPolicy::Ignore => {
                    tracing::debug!(group = group_id, "group is animating; request ignored");
                    return SwitchOutcome::Ignored;
                }
                ReentrantPolicy::Restart => {
                    tracing::debug!(group = group_id, "group is animating; finalizing early");
                    self.finalize(cx, g, false);
                    if cx.registry.active(g) == target {
                        return SwitchOutcome::AlreadyActive;
                    }
                }
            }
        }

        let from = cx.registry.active(g);
        let displayed = cx.registry.is_displayed(tree, cx.registry.group(g).element());
        let timing = if displayed {
            Timing::resolve(
                tree.get(from).transition(),
                cx.opts.default_ease,
                cx.opts.default_duration,
            )
        } else {
            None
        };

        let Some(timing) = timing else {
            tracing::debug!(
                group = group_id,
                from = tree.id_of(from),
                to = tree.id_of(target),
                displayed,
                "instant swap"
            );
            Self::swap(cx, g, from, target, &[]);
            return SwitchOutcome::Instant;
        };

        let matched = match_variants(tree, cx.registry, from, target);
        let plan = AnimationPlan::build(tree, &matched, &*cx.host, timing);
        tracing::debug!(
            group = group_id,
            from = tree.id_of(from),
            to = tree.id_of(target),
            pairs = matched.pairs.len(),
            animated = plan.elements.len(),
            unchanged = plan.unchanged,
            unmatched_outgoing = plan.unmatched_outgoing.len(),
            unmatched_incoming = plan.unmatched_incoming.len(),
            policy = ?cx.opts.unmatched,
            "smart switch planned"
        );

        if plan.expected_signals() == 0 {
            Self::swap(cx, g, from, target, &[]);
            return SwitchOutcome::Completed;
        }

        // Outgoing triggers must not fire while the variant is on its way out.
        cx.binder.unbind_group(tree, cx.registry, g, cx.host);

        let switch = cx.ids.switch();
        let incoming_id = tree.id_of(target);
        cx.host.set_opacity(incoming_id, 0.0);
        cx.host.set_visible(incoming_id, true);

        let mut touched = Vec::with_capacity(plan.elements.len() + 1);
        for el in &plan.elements {
            let id = tree.id_of(el.element);
            for anim in &el.channels {
                let handle = AnimationHandle {
                    switch,
                    element: el.element,
                    channel: anim.channel(),
                };
                cx.host.start_animation(handle, id, anim, plan.timing);
            }
            touched.push(el.element);
        }
        touched.push(target);

        let deadline = cx.ids.timer();
        cx.host
            .schedule_timer(deadline, plan.timing.duration + cx.opts.completion_margin);
        let tracker = CompletionTracker::new(switch, &plan, deadline);
        let awaiting = tracker.expected();
        self.deadlines.insert(deadline, g);
        self.inflight.insert(
            g,
            InFlight {
                from,
                to: target,
                touched,
                tracker,
            },
        );

        SwitchOutcome::Started { switch, awaiting }
    }

    pub(crate) fn on_animation_end(
        &mut self,
        cx: &mut SwitchCtx<'_>,
        handle: AnimationHandle,
    ) -> SignalOutcome {
        let Some((&g, flight)) = self
            .inflight
            .iter_mut()
            .find(|(_, f)| f.tracker.switch() == handle.switch)
        else {
            return SignalOutcome::Stale;
        };
        match flight.tracker.signal(handle) {
            Progress::Stale => SignalOutcome::Stale,
            Progress::Pending(n) => SignalOutcome::Pending(n),
            Progress::Complete => {
                let switch = flight.tracker.switch();
                self.finalize(cx, g, false);
                SignalOutcome::Finalized(switch)
            }
        }
    }

    /// Deadline timers are owned by the director; other tokens are reported as `NotMine`.
    pub(crate) fn on_deadline(&mut self, cx: &mut SwitchCtx<'_>, token: TimerToken) -> Deadline {
        let Some(g) = self.deadlines.remove(&token) else {
            return Deadline::NotMine;
        };
        let Some(flight) = self.inflight.get_mut(&g) else {
            return Deadline::Stale;
        };
        match flight.tracker.expire(token) {
            Progress::Complete => {
                let tree = cx.tree;
                tracing::debug!(
                    group = tree.id_of(cx.registry.group(g).element()),
                    outstanding = flight.tracker.remaining(),
                    shape_only = flight.tracker.remaining_shape_only(),
                    "deadline elapsed before every completion signal"
                );
                let switch = flight.tracker.switch();
                self.finalize(cx, g, true);
                Deadline::Finalized(switch)
            }
            Progress::Stale | Progress::Pending(_) => Deadline::Stale,
        }
    }

    fn finalize(&mut self, cx: &mut SwitchCtx<'_>, g: GroupIdx, deadline_fired: bool) {
        let Some(flight) = self.inflight.remove(&g) else {
            return;
        };
        let deadline = flight.tracker.deadline();
        self.deadlines.remove(&deadline);
        if !deadline_fired {
            cx.host.cancel_timer(deadline);
        }
        let tree = cx.tree;
        tracing::debug!(
            group = tree.id_of(cx.registry.group(g).element()),
            switch = flight.tracker.switch().get(),
            state = ?DirectorState::Finalizing,
            "finalizing"
        );
        Self::swap(cx, g, flight.from, flight.to, &flight.touched);
    }

    /// Clear overrides, swap roots, fire hooks, move the active pointer and rebind triggers.
    fn swap(
        cx: &mut SwitchCtx<'_>,
        g: GroupIdx,
        from: ElementIdx,
        to: ElementIdx,
        touched: &[ElementIdx],
    ) {
        let tree = cx.tree;
        for &e in touched {
            cx.host.clear_overrides(tree.id_of(e));
        }

        let displayed = cx.registry.is_displayed(tree, cx.registry.group(g).element());
        if displayed {
            for e in hook_targets(tree, cx.registry, from, cx.opts.hooks_for_media_only) {
                cx.host.element_deactivated(tree.id_of(e));
            }
        }
        cx.host.set_visible(tree.id_of(from), false);
        cx.host.set_visible(tree.id_of(to), true);

        cx.binder.unbind_group(tree, cx.registry, g, cx.host);
        cx.registry.set_active(g, to);

        if displayed {
            for e in hook_targets(tree, cx.registry, to, cx.opts.hooks_for_media_only) {
                cx.host.element_activated(tree.id_of(e));
            }
            cx.binder.bind(tree, cx.registry, cx.ids, cx.host, to);
        }
    }
}

/// Elements that receive media hooks when `variant` changes visibility: every displayed
/// leaf-media element, plus the displayed variant roots unless `media_only`.
pub(crate) fn hook_targets(
    tree: &RenderTree,
    registry: &VariantRegistry,
    variant: ElementIdx,
    media_only: bool,
) -> Vec<ElementIdx> {
    tree.preorder_where(variant, |c| registry.is_active_or_plain(c))
        .into_iter()
        .filter(|&e| {
            let kind = tree.get(e).kind();
            kind.is_media() || (!media_only && kind == ElementKind::Variant)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/director/transition.rs"]
mod tests;
