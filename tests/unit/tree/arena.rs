use super::*;

fn sample() -> ElementDef {
    ElementDef::new("root", "Page", ElementKind::Container)
        .child(
            ElementDef::new("a", "A", ElementKind::Group)
                .child(ElementDef::new("a1", "A1", ElementKind::Text))
                .child(ElementDef::new("a2", "A2", ElementKind::ShapeEllipse)),
        )
        .child(ElementDef::new("b", "B", ElementKind::ShapeRect).opacity(0.5))
}

fn ids(tree: &RenderTree, v: &[ElementIdx]) -> Vec<String> {
    v.iter().map(|&i| tree.id_of(i).to_string()).collect()
}

#[test]
fn allocation_is_document_preorder() {
    let tree = RenderTree::from_root(&sample()).unwrap();
    assert_eq!(tree.len(), 5);
    let all: Vec<_> = tree.indices().collect();
    assert_eq!(ids(&tree, &all), vec!["root", "a", "a1", "a2", "b"]);
    assert_eq!(tree.get(tree.root()).children().len(), 2);
    assert_eq!(tree.get(tree.find("a2").unwrap()).parent(), tree.find("a"));
}

#[test]
fn missing_opacity_resolves_to_one() {
    let tree = RenderTree::from_root(&sample()).unwrap();
    assert_eq!(tree.get(tree.find("a").unwrap()).opacity(), 1.0);
    assert_eq!(tree.get(tree.find("b").unwrap()).opacity(), 0.5);
}

#[test]
fn preorder_of_subtree_includes_start() {
    let tree = RenderTree::from_root(&sample()).unwrap();
    let a = tree.find("a").unwrap();
    assert_eq!(ids(&tree, &tree.preorder(a)), vec!["a", "a1", "a2"]);
}

#[test]
fn preorder_where_prunes_whole_subtrees() {
    let tree = RenderTree::from_root(&sample()).unwrap();
    let a = tree.find("a").unwrap();
    let flat = tree.preorder_where(tree.root(), |c| c != a);
    assert_eq!(ids(&tree, &flat), vec!["root", "b"]);
}

#[test]
fn ancestors_walk_nearest_first() {
    let tree = RenderTree::from_root(&sample()).unwrap();
    let a1 = tree.find("a1").unwrap();
    let chain: Vec<_> = tree.ancestors(a1).collect();
    assert_eq!(ids(&tree, &chain), vec!["a", "root"]);
    assert!(tree.is_within(a1, tree.find("a").unwrap()));
    assert!(!tree.is_within(a1, tree.find("b").unwrap()));
}

#[test]
fn duplicate_ids_fail_ingestion() {
    let root = ElementDef::new("root", "Page", ElementKind::Container)
        .child(ElementDef::new("x", "X", ElementKind::Text))
        .child(ElementDef::new("x", "Y", ElementKind::Text));
    let err = RenderTree::from_root(&root).unwrap_err();
    assert_eq!(err.to_string(), "duplicate element id \"x\"");
}

#[test]
fn acyclicity_check_rejects_corrupted_links() {
    let mut tree = RenderTree::from_root(&sample()).unwrap();
    let a = tree.find("a").unwrap();
    tree.elements[a.index()].children.push(ElementIdx(0));
    assert!(matches!(tree.check_acyclic(), Err(IngestError::Cycle(_))));
}
