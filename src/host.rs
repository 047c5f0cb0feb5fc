use crate::director::plan::{Channel, ChannelTarget, Timing};
use crate::foundation::core::Rect;
use crate::foundation::ids::{ElementIdx, SwitchId, TimerToken};
use crate::scene::document::Document;
use crate::scene::model::ElementDef;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Identifies one started channel animation. Hosts echo it back through
/// [`crate::Engine::on_animation_end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AnimationHandle {
    /// Switch that started the animation.
    pub switch: SwitchId,
    /// Animated element.
    pub element: ElementIdx,
    /// Animated channel.
    pub channel: Channel,
}

/// Input listener families attached to elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    /// Click / tap.
    Pointer,
    /// Key press.
    Key,
    /// Controller button, polled per frame.
    Controller,
}

/// Host integration seam: the renderer, its animation facility and its timers.
///
/// The engine never blocks. Completion and timer callbacks come back through the engine's
/// `on_*` methods on the same thread of control.
pub trait Host {
    /// Show or hide an element.
    fn set_visible(&mut self, element: &str, visible: bool);

    /// Override an element's opacity until [`Host::clear_overrides`].
    fn set_opacity(&mut self, element: &str, opacity: f64);

    /// Start one channel animation. All animations of a switch are started in the same pass.
    fn start_animation(
        &mut self,
        handle: AnimationHandle,
        element: &str,
        target: &ChannelTarget,
        timing: Timing,
    );

    /// Drop every temporary transform/opacity/fill override so static styling applies again.
    fn clear_overrides(&mut self, element: &str);

    /// The element's own rendered box, if the host can resolve it.
    fn rendered_bounds(&self, element: &str) -> Option<Rect>;

    /// Fire [`crate::Engine::on_timer`] with `token` after `delay`.
    fn schedule_timer(&mut self, token: TimerToken, delay: Duration);

    /// Cancel a scheduled timer. Unknown tokens are ignored.
    fn cancel_timer(&mut self, token: TimerToken);

    /// Start delivering events of `kind` for `element`.
    fn attach_listener(&mut self, element: &str, kind: ListenerKind);

    /// Stop delivering events of `kind` for `element`.
    fn detach_listener(&mut self, element: &str, kind: ListenerKind);

    /// Media hook: the element became active.
    fn element_activated(&mut self, _element: &str) {}

    /// Media hook: the element became inactive.
    fn element_deactivated(&mut self, _element: &str) {}
}

/// One recorded host call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
    /// [`Host::set_visible`].
    SetVisible {
        /// Element id.
        element: String,
        /// New visibility.
        visible: bool,
    },
    /// [`Host::set_opacity`].
    SetOpacity {
        /// Element id.
        element: String,
        /// Override value.
        opacity: f64,
    },
    /// [`Host::start_animation`].
    StartAnimation {
        /// Echoed handle.
        handle: AnimationHandle,
        /// Element id.
        element: String,
        /// Target value.
        target: ChannelTarget,
        /// CSS timing function.
        ease: String,
        /// Duration in milliseconds.
        duration_ms: u64,
    },
    /// [`Host::clear_overrides`].
    ClearOverrides {
        /// Element id.
        element: String,
    },
    /// [`Host::schedule_timer`].
    ScheduleTimer {
        /// Timer token.
        token: TimerToken,
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// [`Host::cancel_timer`].
    CancelTimer {
        /// Timer token.
        token: TimerToken,
    },
    /// [`Host::attach_listener`].
    AttachListener {
        /// Element id.
        element: String,
        /// Listener family.
        kind: ListenerKind,
    },
    /// [`Host::detach_listener`].
    DetachListener {
        /// Element id.
        element: String,
        /// Listener family.
        kind: ListenerKind,
    },
    /// [`Host::element_activated`].
    Activated {
        /// Element id.
        element: String,
    },
    /// [`Host::element_deactivated`].
    Deactivated {
        /// Element id.
        element: String,
    },
}

/// In-memory host for tests, the CLI and debugging.
///
/// Records every call, keeps the resulting visibility/listener state and a manual clock for
/// timers. Rendered bounds default to each element's declared box.
#[derive(Debug, Default)]
pub struct RecordingHost {
    ops: Vec<HostOp>,
    visible: HashMap<String, bool>,
    opacity: HashMap<String, f64>,
    bounds: HashMap<String, Rect>,
    running: Vec<AnimationHandle>,
    timers: Vec<(Duration, TimerToken)>,
    listeners: BTreeSet<(String, ListenerKind)>,
    now: Duration,
}

impl RecordingHost {
    /// Host with no known bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that answers rendered bounds from the document's declared geometry.
    pub fn for_document(doc: &Document) -> Self {
        let mut host = Self::new();
        let mut stack: Vec<&ElementDef> = vec![doc.root()];
        while let Some(def) = stack.pop() {
            host.bounds.insert(
                def.id.clone(),
                Rect::new(0.0, 0.0, def.width, def.height),
            );
            stack.extend(def.children.iter());
        }
        host
    }

    /// Override what [`Host::rendered_bounds`] reports for one element.
    pub fn set_bounds(&mut self, element: impl Into<String>, bounds: Rect) {
        self.bounds.insert(element.into(), bounds);
    }

    /// Forget the bounds of one element, as if the host could not resolve them.
    pub fn forget_bounds(&mut self, element: &str) {
        self.bounds.remove(element);
    }

    /// Recorded calls in order.
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drain recorded calls.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Last visibility set for an element.
    pub fn is_visible(&self, element: &str) -> Option<bool> {
        self.visible.get(element).copied()
    }

    /// Ids of every element currently marked visible, sorted.
    pub fn visible_elements(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .visible
            .iter()
            .filter(|(_, v)| **v)
            .map(|(k, _)| k.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Current opacity override, if any.
    pub fn opacity_override(&self, element: &str) -> Option<f64> {
        self.opacity.get(element).copied()
    }

    /// Animations started and not yet drained.
    pub fn running(&self) -> &[AnimationHandle] {
        &self.running
    }

    /// Drain started animations, e.g. to report them all as finished.
    pub fn take_running(&mut self) -> Vec<AnimationHandle> {
        std::mem::take(&mut self.running)
    }

    /// Whether a listener is attached.
    pub fn has_listener(&self, element: &str, kind: ListenerKind) -> bool {
        self.listeners.contains(&(element.to_owned(), kind))
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Tokens of timers still scheduled.
    pub fn pending_timers(&self) -> Vec<TimerToken> {
        self.timers.iter().map(|(_, t)| *t).collect()
    }

    /// Manual clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Fire time of the earliest scheduled timer.
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.iter().map(|(at, _)| *at).min()
    }

    /// Advance the clock and return the timers that came due, earliest first.
    pub fn advance(&mut self, dt: Duration) -> Vec<TimerToken> {
        self.now += dt;
        let now = self.now;
        let mut due: Vec<(Duration, TimerToken)> = Vec::new();
        self.timers.retain(|&(at, token)| {
            if at <= now {
                due.push((at, token));
                false
            } else {
                true
            }
        });
        due.sort_unstable();
        due.into_iter().map(|(_, t)| t).collect()
    }
}

impl Host for RecordingHost {
    fn set_visible(&mut self, element: &str, visible: bool) {
        self.visible.insert(element.to_owned(), visible);
        self.ops.push(HostOp::SetVisible {
            element: element.to_owned(),
            visible,
        });
    }

    fn set_opacity(&mut self, element: &str, opacity: f64) {
        self.opacity.insert(element.to_owned(), opacity);
        self.ops.push(HostOp::SetOpacity {
            element: element.to_owned(),
            opacity,
        });
    }

    fn start_animation(
        &mut self,
        handle: AnimationHandle,
        element: &str,
        target: &ChannelTarget,
        timing: Timing,
    ) {
        self.running.push(handle);
        self.ops.push(HostOp::StartAnimation {
            handle,
            element: element.to_owned(),
            target: target.clone(),
            ease: timing.ease.css(),
            duration_ms: millis(timing.duration),
        });
    }

    fn clear_overrides(&mut self, element: &str) {
        self.opacity.remove(element);
        self.ops.push(HostOp::ClearOverrides {
            element: element.to_owned(),
        });
    }

    fn rendered_bounds(&self, element: &str) -> Option<Rect> {
        self.bounds.get(element).copied()
    }

    fn schedule_timer(&mut self, token: TimerToken, delay: Duration) {
        self.timers.push((self.now + delay, token));
        self.ops.push(HostOp::ScheduleTimer {
            token,
            delay_ms: millis(delay),
        });
    }

    fn cancel_timer(&mut self, token: TimerToken) {
        self.timers.retain(|(_, t)| *t != token);
        self.ops.push(HostOp::CancelTimer { token });
    }

    fn attach_listener(&mut self, element: &str, kind: ListenerKind) {
        self.listeners.insert((element.to_owned(), kind));
        self.ops.push(HostOp::AttachListener {
            element: element.to_owned(),
            kind,
        });
    }

    fn detach_listener(&mut self, element: &str, kind: ListenerKind) {
        self.listeners.remove(&(element.to_owned(), kind));
        self.ops.push(HostOp::DetachListener {
            element: element.to_owned(),
            kind,
        });
    }

    fn element_activated(&mut self, element: &str) {
        self.ops.push(HostOp::Activated {
            element: element.to_owned(),
        });
    }

    fn element_deactivated(&mut self, element: &str) {
        self.ops.push(HostOp::Deactivated {
            element: element.to_owned(),
        });
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "../tests/unit/host.rs"]
mod tests;
