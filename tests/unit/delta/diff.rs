use super::*;
use crate::foundation::ids::ElementIdx;
use crate::matcher::correspond::MatchRule;
use crate::scene::color::Color;
use crate::scene::model::{ElementDef, ElementKind};

fn pair_tree(a: ElementDef, b: ElementDef) -> (RenderTree, CorrespondencePair) {
    let root = ElementDef::new("g", "G", ElementKind::VariantGroup)
        .child(ElementDef::new("v1", "V1", ElementKind::Variant).child(a))
        .child(ElementDef::new("v2", "V2", ElementKind::Variant).child(b));
    let tree = RenderTree::from_root(&root).unwrap();
    let pair = CorrespondencePair {
        outgoing: tree.find("a").unwrap(),
        incoming: tree.find("b").unwrap(),
        rule: MatchRule::NameAndType,
    };
    (tree, pair)
}

fn declared(tree: &RenderTree, idx: ElementIdx) -> Option<Rect> {
    let g = tree.get(idx).geometry();
    Some(Rect::new(0.0, 0.0, g.width, g.height))
}

#[test]
fn identical_elements_have_no_changes() {
    let el = |id: &str| {
        ElementDef::new(id, "Box", ElementKind::Container)
            .at(5.0, 5.0)
            .size(10.0, 10.0)
            .fill(Paint::solid(Color::rgba(1.0, 0.0, 0.0, 1.0)))
    };
    let (tree, pair) = pair_tree(el("a"), el("b"));
    let d = diff(&tree, &pair, None);
    assert_eq!(d, Delta::default());
    assert!(!d.has_changes());
}

#[test]
fn ellipse_resize_flags_shape_scale_only() {
    let (tree, pair) = pair_tree(
        ElementDef::new("a", "Icon", ElementKind::ShapeEllipse)
            .at(10.0, 10.0)
            .size(40.0, 40.0),
        ElementDef::new("b", "Icon", ElementKind::ShapeEllipse)
            .at(10.0, 10.0)
            .size(60.0, 60.0),
    );
    let d = diff(&tree, &pair, declared(&tree, pair.outgoing));
    assert_eq!(d.position, None);
    assert_eq!(d.scale, None);
    let s = d.shape_scale.unwrap();
    assert!((s.sx - 1.5).abs() < 1e-12);
    assert!((s.sy - 1.5).abs() < 1e-12);
    assert_eq!(s.origin, Point::new(20.0, 20.0));
    assert!(d.is_shape_only());
}

#[test]
fn shape_scale_uses_rendered_box_not_container_box() {
    // Same container box, but the drawn path is half as wide.
    let el = |id: &str| {
        ElementDef::new(id, "Star", ElementKind::ShapeStar)
            .at(0.0, 0.0)
            .size(40.0, 40.0)
    };
    let (tree, pair) = pair_tree(el("a"), el("b"));
    let d = diff(&tree, &pair, Some(Rect::new(0.0, 0.0, 20.0, 40.0)));
    let s = d.shape_scale.unwrap();
    assert!((s.sx - 2.0).abs() < 1e-12);
    assert!((s.sy - 1.0).abs() < 1e-12);
}

#[test]
fn missing_bounds_skip_only_the_shape_channel() {
    let (tree, pair) = pair_tree(
        ElementDef::new("a", "Icon", ElementKind::ShapeVector)
            .at(0.0, 0.0)
            .size(40.0, 40.0),
        ElementDef::new("b", "Icon", ElementKind::ShapeVector)
            .at(8.0, 0.0)
            .size(60.0, 60.0),
    );
    let d = diff(&tree, &pair, None);
    assert_eq!(d.shape_scale, None);
    assert_eq!(d.position, Some(Vec2::new(8.0, 0.0)));
    assert!(d.has_changes());
}

#[test]
fn rect_shapes_use_box_scale() {
    let (tree, pair) = pair_tree(
        ElementDef::new("a", "Bar", ElementKind::ShapeRect).size(100.0, 10.0),
        ElementDef::new("b", "Bar", ElementKind::ShapeRect).size(50.0, 20.0),
    );
    let d = diff(&tree, &pair, declared(&tree, pair.outgoing));
    assert_eq!(d.scale, Some(Vec2::new(0.5, 2.0)));
    assert_eq!(d.shape_scale, None);
}

#[test]
fn zero_sized_source_box_skips_scale() {
    let (tree, pair) = pair_tree(
        ElementDef::new("a", "Line", ElementKind::Container).size(0.0, 10.0),
        ElementDef::new("b", "Line", ElementKind::Container).size(30.0, 10.0),
    );
    let d = diff(&tree, &pair, None);
    assert_eq!(d.scale, None);
    assert!(!d.has_changes());
}

#[test]
fn position_rotation_and_opacity_deltas() {
    let (tree, pair) = pair_tree(
        ElementDef::new("a", "Card", ElementKind::Container)
            .at(10.0, 20.0)
            .size(10.0, 10.0),
        ElementDef::new("b", "Card", ElementKind::Container)
            .at(30.0, 5.0)
            .size(10.0, 10.0)
            .rotated(45.0)
            .opacity(0.25),
    );
    let d = diff(&tree, &pair, None);
    assert_eq!(d.position, Some(Vec2::new(20.0, -15.0)));
    assert_eq!(d.rotation_deg, Some(45.0));
    assert_eq!(
        d.opacity,
        Some(OpacityDelta {
            delta: -0.75,
            target: 0.25
        })
    );
    assert!(d.has_transform());
    assert!(!d.is_shape_only());
}

#[test]
fn fill_change_carries_full_target_list() {
    let red = Paint::solid(Color::rgba(1.0, 0.0, 0.0, 1.0));
    let blue = Paint::solid(Color::rgba(0.0, 0.0, 1.0, 1.0));
    let (tree, pair) = pair_tree(
        ElementDef::new("a", "Dot", ElementKind::Container).fill(red.clone()),
        ElementDef::new("b", "Dot", ElementKind::Container)
            .fill(red.clone())
            .fill(blue.clone()),
    );
    let d = diff(&tree, &pair, None);
    assert_eq!(
        d,
        Delta {
            fill: Some(vec![red, blue]),
            ..Delta::default()
        }
    );
    let fill = d.fill.unwrap();
    assert_eq!(fill.len(), 2);
    assert!(paints_equal(&fill, tree.get(pair.incoming).fills()));
}

#[test]
fn paint_opacity_is_folded_into_alpha() {
    let half = Paint::Solid {
        color: Color::rgba(0.0, 0.0, 0.0, 1.0),
        opacity: 0.5,
    };
    let same = Paint::solid(Color::rgba(0.0, 0.0, 0.0, 0.5));
    let (tree, pair) = pair_tree(
        ElementDef::new("a", "Dot", ElementKind::Container).fill(half),
        ElementDef::new("b", "Dot", ElementKind::Container).fill(same),
    );
    assert_eq!(diff(&tree, &pair, None).fill, None);
}
