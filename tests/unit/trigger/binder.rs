use super::*;
use crate::host::{HostOp, RecordingHost};
use crate::scene::model::{ElementDef, ElementKind};

struct Fixture {
    tree: RenderTree,
    registry: VariantRegistry,
    ids: IdGen,
    host: RecordingHost,
    binder: TriggerBinder,
}

impl Fixture {
    fn new(root: ElementDef) -> Self {
        let tree = RenderTree::from_root(&root).unwrap();
        let registry = VariantRegistry::discover(&tree);
        Self {
            tree,
            registry,
            ids: IdGen::default(),
            host: RecordingHost::new(),
            binder: TriggerBinder::default(),
        }
    }

    fn idx(&self, id: &str) -> ElementIdx {
        self.tree.find(id).unwrap()
    }

    fn group(&self, id: &str) -> GroupIdx {
        self.registry.find_group(&self.tree, id).unwrap()
    }

    fn bind(&mut self, variant: &str) {
        let v = self.idx(variant);
        self.binder
            .bind(&self.tree, &self.registry, &mut self.ids, &mut self.host, v);
    }

    fn unbind(&mut self, group: &str) {
        let g = self.group(group);
        self.binder
            .unbind_group(&self.tree, &self.registry, g, &mut self.host);
    }
}

fn deck(v1: ElementDef) -> ElementDef {
    ElementDef::new("page", "Page", ElementKind::Container).child(
        ElementDef::new("deck", "Deck", ElementKind::VariantGroup)
            .child(v1)
            .child(ElementDef::new("v2", "Slide 2", ElementKind::Variant))
            .child(ElementDef::new("v3", "Slide 3", ElementKind::Variant)),
    )
}

#[test]
fn competing_key_bindings_share_one_listener() {
    let mut f = Fixture::new(deck(
        ElementDef::new("v1", "Slide 1", ElementKind::Variant)
            .trigger(TriggerDef::key("v2", "ArrowRight"))
            .trigger(TriggerDef::key("v3", "End")),
    ));
    f.bind("v1");

    assert_eq!(f.binder.listener_count(), 1);
    assert!(f.host.has_listener("v1", ListenerKind::Key));
    let group = f.group("deck");
    assert_eq!(
        f.binder.key("ArrowRight").into_iter().map(|(_, r)| r).collect::<Vec<_>>(),
        vec![SwitchRequest {
            group,
            target: f.idx("v2")
        }]
    );
    assert_eq!(
        f.binder.key("End").into_iter().map(|(_, r)| r).collect::<Vec<_>>(),
        vec![SwitchRequest {
            group,
            target: f.idx("v3")
        }]
    );
    assert!(f.binder.key("Home").is_empty());
}

#[test]
fn bind_and_unbind_are_idempotent() {
    let mut f = Fixture::new(deck(
        ElementDef::new("v1", "Slide 1", ElementKind::Variant)
            .child(
                ElementDef::new("next", "Next", ElementKind::Container)
                    .trigger(TriggerDef::pointer("v2")),
            )
            .trigger(TriggerDef::timer("v3", 800)),
    ));
    f.bind("v1");
    let after_first = f.host.ops().len();
    f.bind("v1");
    assert_eq!(f.host.ops().len(), after_first);
    assert!(f.binder.is_bound(f.idx("v1")));

    f.unbind("deck");
    let after_unbind = f.host.ops().len();
    assert!(after_unbind > after_first);
    assert_eq!(f.binder.listener_count(), 0);
    assert_eq!(f.binder.timer_count(), 0);
    assert!(!f.binder.is_bound(f.idx("v1")));

    f.unbind("deck");
    assert_eq!(f.host.ops().len(), after_unbind);
}

#[test]
fn unbind_cancels_pending_timers() {
    let mut f = Fixture::new(deck(
        ElementDef::new("v1", "Slide 1", ElementKind::Variant).trigger(TriggerDef::timer("v2", 800)),
    ));
    f.bind("v1");
    let token = f.host.pending_timers()[0];

    assert!(f.host.advance(Duration::from_millis(400)).is_empty());
    f.unbind("deck");
    assert!(f.host.pending_timers().is_empty());
    assert!(
        f.host
            .ops()
            .iter()
            .any(|op| matches!(op, HostOp::CancelTimer { token: t } if *t == token))
    );
    // A late delivery of the cancelled token is not a trigger any more.
    assert_eq!(f.binder.fire_timer(token), None);
}

#[test]
fn timer_fires_once() {
    let mut f = Fixture::new(deck(
        ElementDef::new("v1", "Slide 1", ElementKind::Variant).trigger(TriggerDef::timer("v2", 800)),
    ));
    f.bind("v1");
    let due = f.host.advance(Duration::from_millis(800));
    assert_eq!(due.len(), 1);
    assert_eq!(
        f.binder.fire_timer(due[0]).map(|r| r.target),
        Some(f.idx("v2"))
    );
    assert_eq!(f.binder.fire_timer(due[0]), None);
}

#[test]
fn unresolvable_targets_are_dropped() {
    let mut f = Fixture::new(deck(
        ElementDef::new("v1", "Slide 1", ElementKind::Variant)
            .trigger(TriggerDef::pointer("nope"))
            .trigger(TriggerDef::key("v2", "KeyA").in_group("missing"))
            .trigger(TriggerDef::key("v2", "KeyB")),
    ));
    f.bind("v1");
    assert_eq!(f.binder.listener_count(), 1);
    assert!(!f.host.has_listener("v1", ListenerKind::Pointer));
    assert!(f.binder.key("KeyA").is_empty());
    assert_eq!(f.binder.key("KeyB").len(), 1);
}

#[test]
fn variant_names_resolve_as_targets() {
    let mut f = Fixture::new(deck(
        ElementDef::new("v1", "Slide 1", ElementKind::Variant).trigger(TriggerDef::pointer("Slide 3")),
    ));
    f.bind("v1");
    let req = f.binder.pointer(&f.tree, f.idx("v1")).unwrap();
    assert_eq!(req.target, f.idx("v3"));
}

#[test]
fn pointer_bubbles_to_nearest_bound_ancestor() {
    let mut f = Fixture::new(deck(
        ElementDef::new("v1", "Slide 1", ElementKind::Variant).child(
            ElementDef::new("button", "Button", ElementKind::Container)
                .trigger(TriggerDef::pointer("v2"))
                .child(ElementDef::new("label", "Label", ElementKind::Text)),
        ),
    ));
    f.bind("v1");
    let req = f.binder.pointer(&f.tree, f.idx("label")).unwrap();
    assert_eq!(req.target, f.idx("v2"));
    assert_eq!(f.binder.pointer(&f.tree, f.idx("page")), None);
}

#[test]
fn controller_buttons_fire_on_press_edge_only() {
    let mut f = Fixture::new(deck(
        ElementDef::new("v1", "Slide 1", ElementKind::Variant).trigger(TriggerDef::controller("v2", 0)),
    ));
    f.bind("v1");
    assert!(f.binder.frame(&ControllerState::default()).is_empty());
    assert_eq!(f.binder.frame(&ControllerState::pressed([0])).len(), 1);
    assert!(f.binder.frame(&ControllerState::pressed([0])).is_empty());
    assert!(f.binder.frame(&ControllerState::pressed([1])).is_empty());
    assert_eq!(f.binder.frame(&ControllerState::pressed([0, 1])).len(), 1);
}

#[test]
fn explicit_group_reaches_outside_the_enclosing_group() {
    let root = ElementDef::new("page", "Page", ElementKind::Container)
        .child(
            ElementDef::new("nav", "Nav", ElementKind::VariantGroup).child(
                ElementDef::new("n1", "Only", ElementKind::Variant)
                    .trigger(TriggerDef::key("v2", "KeyN").in_group("deck")),
            ),
        )
        .child(
            ElementDef::new("deck", "Deck", ElementKind::VariantGroup)
                .child(ElementDef::new("v1", "Slide 1", ElementKind::Variant))
                .child(ElementDef::new("v2", "Slide 2", ElementKind::Variant)),
        );
    let mut f = Fixture::new(root);
    f.bind("n1");
    let reqs = f.binder.key("KeyN");
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].0, f.idx("n1"));
    assert_eq!(reqs[0].1.group, f.group("deck"));
    // Scoped to the variant it lives in, not to the group it switches.
    f.unbind("deck");
    assert_eq!(f.binder.key("KeyN").len(), 1);
    f.unbind("nav");
    assert!(f.binder.key("KeyN").is_empty());
}

#[test]
fn nested_active_variants_are_bound_with_their_parent() {
    let root = deck(
        ElementDef::new("v1", "Slide 1", ElementKind::Variant).child(
            ElementDef::new("toggle", "Toggle", ElementKind::VariantGroup)
                .child(
                    ElementDef::new("off", "Off", ElementKind::Variant)
                        .trigger(TriggerDef::pointer("on")),
                )
                .child(
                    ElementDef::new("on", "On", ElementKind::Variant)
                        .trigger(TriggerDef::pointer("off")),
                ),
        ),
    );
    let mut f = Fixture::new(root);
    f.bind("v1");
    assert!(f.binder.is_bound(f.idx("off")));
    assert!(!f.binder.is_bound(f.idx("on")));
    assert!(f.host.has_listener("off", ListenerKind::Pointer));
    assert!(!f.host.has_listener("on", ListenerKind::Pointer));
    let req = f.binder.pointer(&f.tree, f.idx("off")).unwrap();
    assert_eq!(req.group, f.group("toggle"));

    // Leaving the outer variant drops nested bindings too.
    f.unbind("deck");
    assert_eq!(f.binder.listener_count(), 0);
    assert!(!f.binder.is_bound(f.idx("off")));
}
