use super::*;
use crate::animation::ease::Ease;
use crate::host::{HostOp, RecordingHost};
use crate::scene::document::Document;
use crate::scene::model::{ElementDef, TransitionDef};
use std::time::Duration;

struct Rig {
    tree: RenderTree,
    registry: VariantRegistry,
    binder: TriggerBinder,
    ids: IdGen,
    opts: EngineOpts,
    host: RecordingHost,
    director: Director,
}

macro_rules! cx {
    ($rig:expr) => {
        SwitchCtx {
            tree: &$rig.tree,
            registry: &mut $rig.registry,
            binder: &mut $rig.binder,
            ids: &mut $rig.ids,
            opts: &$rig.opts,
            host: &mut $rig.host,
        }
    };
}

impl Rig {
    fn new(root: ElementDef, opts: EngineOpts) -> Self {
        let doc = Document::new(root);
        let tree = RenderTree::from_document(&doc).unwrap();
        let registry = VariantRegistry::discover(&tree);
        Self {
            tree,
            registry,
            binder: TriggerBinder::default(),
            ids: IdGen::default(),
            opts,
            host: RecordingHost::for_document(&doc),
            director: Director::default(),
        }
    }

    fn g(&self) -> GroupIdx {
        self.registry.find_group(&self.tree, "g").unwrap()
    }

    fn request(&mut self, variant: &str) -> SwitchOutcome {
        let g = self.g();
        let v = self.tree.find(variant).unwrap();
        let mut cx = cx!(self);
        self.director.request(&mut cx, g, v)
    }

    fn end_all(&mut self) -> Vec<SignalOutcome> {
        let handles = self.host.take_running();
        handles
            .into_iter()
            .map(|h| {
                let mut cx = cx!(self);
                self.director.on_animation_end(&mut cx, h)
            })
            .collect()
    }

    fn deadline(&mut self, token: TimerToken) -> Deadline {
        let mut cx = cx!(self);
        self.director.on_deadline(&mut cx, token)
    }

    fn active(&self) -> &str {
        self.tree.id_of(self.registry.active(self.g()))
    }

    fn count_ops(&self, pred: impl Fn(&HostOp) -> bool) -> usize {
        self.host.ops().iter().filter(|op| pred(op)).count()
    }
}

fn card(id: &str, x: f64) -> ElementDef {
    ElementDef::new(id, "Card", ElementKind::Container)
        .at(x, 0.0)
        .size(10.0, 10.0)
}

fn group(v1: ElementDef, v2: ElementDef) -> ElementDef {
    ElementDef::new("g", "G", ElementKind::VariantGroup)
        .child(v1)
        .child(v2)
}

fn smooth(id: &str) -> ElementDef {
    ElementDef::new(id, id, ElementKind::Variant).transition(TransitionDef::new(Ease::EaseIn, 0.3))
}

#[test]
fn missing_descriptor_swaps_instantly() {
    let mut rig = Rig::new(
        group(
            ElementDef::new("v1", "v1", ElementKind::Variant).child(card("a", 0.0)),
            ElementDef::new("v2", "v2", ElementKind::Variant).child(card("b", 50.0)),
        ),
        EngineOpts::default(),
    );
    assert!(matches!(rig.request("v2"), SwitchOutcome::Instant));
    assert_eq!(rig.active(), "v2");
    assert_eq!(rig.director.state(rig.g()), DirectorState::Idle);
    assert_eq!(rig.host.is_visible("v1"), Some(false));
    assert_eq!(rig.host.is_visible("v2"), Some(true));
    assert_eq!(
        rig.count_ops(|op| matches!(op, HostOp::StartAnimation { .. })),
        0
    );
}

#[test]
fn already_active_target_is_a_no_op() {
    let mut rig = Rig::new(
        group(smooth("v1").child(card("a", 0.0)), smooth("v2")),
        EngineOpts::default(),
    );
    assert!(matches!(rig.request("v1"), SwitchOutcome::AlreadyActive));
    assert!(rig.host.ops().is_empty());
}

#[test]
fn smooth_switch_finalizes_once_after_every_signal() {
    let mut rig = Rig::new(
        group(
            smooth("v1")
                .child(card("a1", 0.0))
                .child(ElementDef::new("a2", "Dot", ElementKind::Container).opacity(0.2))
                .child(ElementDef::new("a3", "Icon", ElementKind::ShapeEllipse).size(40.0, 40.0)),
            smooth("v2")
                .child(card("b1", 30.0))
                .child(ElementDef::new("b2", "Dot", ElementKind::Container))
                .child(ElementDef::new("b3", "Icon", ElementKind::ShapeEllipse).size(60.0, 60.0)),
        ),
        EngineOpts::default(),
    );

    let SwitchOutcome::Started { switch, awaiting } = rig.request("v2") else {
        panic!("expected an animated switch");
    };
    assert_eq!(awaiting, 3);
    assert_eq!(rig.director.pending_signals(rig.g()), Some(3));
    assert_eq!(rig.director.state(rig.g()), DirectorState::Animating);
    assert_eq!(rig.active(), "v1");
    assert_eq!(rig.host.opacity_override("v2"), Some(0.0));
    assert_eq!(rig.host.is_visible("v2"), Some(true));
    assert_eq!(
        rig.count_ops(|op| matches!(op, HostOp::ScheduleTimer { delay_ms: 400, .. })),
        1
    );

    let outcomes = rig.end_all();
    assert_eq!(
        outcomes,
        vec![
            SignalOutcome::Pending(2),
            SignalOutcome::Pending(1),
            SignalOutcome::Finalized(switch)
        ]
    );
    assert_eq!(rig.active(), "v2");
    assert_eq!(rig.director.state(rig.g()), DirectorState::Idle);
    assert_eq!(rig.host.is_visible("v1"), Some(false));
    assert_eq!(rig.host.opacity_override("v2"), None);
    assert_eq!(
        rig.count_ops(|op| matches!(op, HostOp::SetVisible { element, visible: false } if element == "v1")),
        1
    );
    // The deadline was cancelled and is stale if it is delivered anyway.
    assert!(rig.host.pending_timers().is_empty());
    let cancelled = rig
        .host
        .ops()
        .iter()
        .find_map(|op| match op {
            HostOp::CancelTimer { token } => Some(*token),
            _ => None,
        })
        .unwrap();
    assert_eq!(rig.deadline(cancelled), Deadline::NotMine);
}

#[test]
fn nothing_changed_finalizes_immediately() {
    let mut rig = Rig::new(
        group(smooth("v1").child(card("a", 0.0)), smooth("v2").child(card("b", 0.0))),
        EngineOpts::default(),
    );
    assert!(matches!(rig.request("v2"), SwitchOutcome::Completed));
    assert_eq!(rig.active(), "v2");
    assert!(rig.host.pending_timers().is_empty());
    assert!(rig.host.running().is_empty());
}

#[test]
fn zero_duration_is_instant() {
    let mut rig = Rig::new(
        group(
            ElementDef::new("v1", "v1", ElementKind::Variant)
                .transition(TransitionDef::new(Ease::Linear, 0.0))
                .child(card("a", 0.0)),
            smooth("v2").child(card("b", 20.0)),
        ),
        EngineOpts::default(),
    );
    assert!(matches!(rig.request("v2"), SwitchOutcome::Instant));
}

#[test]
fn reentrant_request_is_ignored_by_default() {
    let mut rig = Rig::new(
        ElementDef::new("g", "G", ElementKind::VariantGroup)
            .child(smooth("v1").child(card("a", 0.0)))
            .child(smooth("v2").child(card("b", 40.0)))
            .child(smooth("v3").child(card("c", 80.0))),
        EngineOpts::default(),
    );
    assert!(matches!(rig.request("v2"), SwitchOutcome::Started { .. }));
    assert!(matches!(rig.request("v3"), SwitchOutcome::Ignored));
    rig.end_all();
    assert_eq!(rig.active(), "v2");
}

#[test]
fn restart_policy_finalizes_in_flight_switch_first() {
    let opts = EngineOpts {
        reentrant: ReentrantPolicy::Restart,
        ..EngineOpts::default()
    };
    let mut rig = Rig::new(
        ElementDef::new("g", "G", ElementKind::VariantGroup)
            .child(smooth("v1").child(card("a", 0.0)))
            .child(smooth("v2").child(card("b", 40.0)))
            .child(smooth("v3").child(card("c", 80.0))),
        opts,
    );
    let SwitchOutcome::Started { switch: first, .. } = rig.request("v2") else {
        panic!("expected an animated switch");
    };
    let stale: Vec<_> = rig.host.take_running();
    let SwitchOutcome::Started { switch: second, .. } = rig.request("v3") else {
        panic!("expected an animated switch");
    };
    assert_ne!(first, second);
    // Signals of the superseded switch no longer count.
    for h in stale {
        let mut cx = cx!(rig);
        assert_eq!(rig.director.on_animation_end(&mut cx, h), SignalOutcome::Stale);
    }
    assert_eq!(rig.director.pending_signals(rig.g()), Some(1));
    rig.end_all();
    assert_eq!(rig.active(), "v3");
}

#[test]
fn deadline_finalizes_when_signals_never_arrive() {
    let mut rig = Rig::new(
        group(smooth("v1").child(card("a", 0.0)), smooth("v2").child(card("b", 9.0))),
        EngineOpts::default(),
    );
    let SwitchOutcome::Started { switch, .. } = rig.request("v2") else {
        panic!("expected an animated switch");
    };
    rig.host.take_running();
    let due = rig.host.advance(Duration::from_millis(400));
    assert_eq!(due.len(), 1);
    assert_eq!(rig.deadline(due[0]), Deadline::Finalized(switch));
    assert_eq!(rig.active(), "v2");
    assert_eq!(rig.deadline(due[0]), Deadline::NotMine);
}

#[test]
fn hook_targets_cover_variant_roots_and_media() {
    let root = group(
        ElementDef::new("v1", "v1", ElementKind::Variant)
            .child(ElementDef::new("clip", "Clip", ElementKind::LeafMedia))
            .child(ElementDef::new("txt", "Text", ElementKind::Text)),
        ElementDef::new("v2", "v2", ElementKind::Variant),
    );
    let rig = Rig::new(root, EngineOpts::default());
    let v1 = rig.tree.find("v1").unwrap();
    let ids = |media_only| {
        hook_targets(&rig.tree, &rig.registry, v1, media_only)
            .into_iter()
            .map(|e| rig.tree.id_of(e).to_owned())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(false), vec!["v1", "clip"]);
    assert_eq!(ids(true), vec!["clip"]);
}

#[test]
fn outcome_display() {
    assert_eq!(SwitchOutcome::Instant.to_string(), "instant");
    assert_eq!(
        SwitchOutcome::Rejected(MotionError::group_not_found("x")).to_string(),
        "rejected: variant group not found: 'x'"
    );
    assert!(SwitchOutcome::Completed.switched());
    assert!(!SwitchOutcome::Ignored.switched());
}
