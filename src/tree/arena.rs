use crate::foundation::core::Geometry;
use crate::foundation::ids::ElementIdx;
use crate::scene::document::Document;
use crate::scene::model::{ElementDef, ElementKind, Paint, TransitionDef, TriggerDef};
use std::collections::HashMap;

/// Ingested element. Immutable for the lifetime of the engine.
#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) kind: ElementKind,
    pub(crate) geometry: Geometry,
    pub(crate) opacity: f64,
    pub(crate) fills: Vec<Paint>,
    pub(crate) strokes: Vec<Paint>,
    pub(crate) parent: Option<ElementIdx>,
    pub(crate) children: Vec<ElementIdx>,
    pub(crate) transition: Option<TransitionDef>,
    pub(crate) triggers: Vec<TriggerDef>,
    pub(crate) default_variant: Option<String>,
}

impl Element {
    /// Document-unique id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Authored name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type tag.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Declared geometry.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Resolved opacity (missing means 1).
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Ordered fills.
    pub fn fills(&self) -> &[Paint] {
        &self.fills
    }

    /// Ordered strokes.
    pub fn strokes(&self) -> &[Paint] {
        &self.strokes
    }

    /// Parent element, `None` for the root.
    pub fn parent(&self) -> Option<ElementIdx> {
        self.parent
    }

    /// Children in document order.
    pub fn children(&self) -> &[ElementIdx] {
        &self.children
    }

    /// Smart-transition descriptor (meaningful on variants).
    pub fn transition(&self) -> Option<&TransitionDef> {
        self.transition.as_ref()
    }

    /// Authored triggers.
    pub fn triggers(&self) -> &[TriggerDef] {
        &self.triggers
    }

    fn from_def(def: &ElementDef, parent: Option<ElementIdx>) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            kind: def.kind,
            geometry: def.geometry(),
            opacity: def.opacity.unwrap_or(1.0),
            fills: def.fills.clone(),
            strokes: def.strokes.clone(),
            parent,
            children: Vec::with_capacity(def.children.len()),
            transition: def.transition,
            triggers: def.triggers.clone(),
            default_variant: def.default_variant.clone(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum IngestError {
    TooManyElements,
    DuplicateId(String),
    Cycle(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyElements => write!(f, "too many elements"),
            Self::DuplicateId(id) => write!(f, "duplicate element id \"{id}\""),
            Self::Cycle(id) => write!(f, "element \"{id}\" is reachable through itself"),
        }
    }
}

impl std::error::Error for IngestError {}

/// Arena of elements indexed by [`ElementIdx`], with parent/child index arrays.
///
/// Allocation is DFS pre-order, so document order equals index order and every parent index is
/// smaller than its children's.
#[derive(Debug, Clone)]
pub struct RenderTree {
    elements: Vec<Element>,
    idx_by_id: HashMap<String, ElementIdx>,
}

impl RenderTree {
    /// Ingest a document. Does not run schema validation; see [`Document::validate`].
    pub(crate) fn from_document(doc: &Document) -> Result<Self, IngestError> {
        Self::from_root(&doc.def().root)
    }

    pub(crate) fn from_root(root: &ElementDef) -> Result<Self, IngestError> {
        let mut elements = Vec::<Element>::new();
        let mut idx_by_id = HashMap::<String, ElementIdx>::new();

        let mut stack: Vec<(&ElementDef, Option<ElementIdx>)> = Vec::with_capacity(64);
        stack.push((root, None));

        while let Some((def, parent)) = stack.pop() {
            let idx = ElementIdx(
                u32::try_from(elements.len()).map_err(|_| IngestError::TooManyElements)?,
            );
            if idx_by_id.insert(def.id.clone(), idx).is_some() {
                return Err(IngestError::DuplicateId(def.id.clone()));
            }
            elements.push(Element::from_def(def, parent));
            if let Some(p) = parent {
                elements[p.index()].children.push(idx);
            }
            for child in def.children.iter().rev() {
                stack.push((child, Some(idx)));
            }
        }

        let tree = Self {
            elements,
            idx_by_id,
        };
        tree.check_acyclic()?;
        Ok(tree)
    }

    /// Verify the parent/child arrays describe a tree rooted at index 0.
    ///
    /// Runs once at ingestion; traversals afterwards rely on it and keep no visited set.
    fn check_acyclic(&self) -> Result<(), IngestError> {
        let mut seen_as_child = vec![false; self.elements.len()];
        for (i, el) in self.elements.iter().enumerate() {
            match el.parent {
                None if i == 0 => {}
                None => return Err(IngestError::Cycle(el.id.clone())),
                Some(p) if p.index() >= i => return Err(IngestError::Cycle(el.id.clone())),
                Some(_) => {}
            }
            for &c in &el.children {
                let ok = c.index() > i
                    && c.index() < self.elements.len()
                    && self.elements[c.index()].parent == Some(ElementIdx(i as u32))
                    && !std::mem::replace(&mut seen_as_child[c.index()], true);
                if !ok {
                    return Err(IngestError::Cycle(el.id.clone()));
                }
            }
        }
        Ok(())
    }

    /// Root element index.
    pub fn root(&self) -> ElementIdx {
        ElementIdx(0)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the tree is empty (never true for an ingested document).
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Borrow an element.
    pub fn get(&self, idx: ElementIdx) -> &Element {
        &self.elements[idx.index()]
    }

    /// Look up an element by its document id.
    pub fn find(&self, id: &str) -> Option<ElementIdx> {
        self.idx_by_id.get(id).copied()
    }

    /// Document id of an element.
    pub fn id_of(&self, idx: ElementIdx) -> &str {
        &self.elements[idx.index()].id
    }

    /// All indices in document order.
    pub fn indices(&self) -> impl Iterator<Item = ElementIdx> + '_ {
        (0..self.elements.len()).map(|i| ElementIdx(i as u32))
    }

    /// Pre-order flattening of the subtree at `start`, including `start`.
    pub fn preorder(&self, start: ElementIdx) -> Vec<ElementIdx> {
        self.preorder_where(start, |_| true)
    }

    /// Pre-order flattening that skips any child (and its subtree) for which `include` is false.
    /// `start` itself is always included.
    pub fn preorder_where(
        &self,
        start: ElementIdx,
        mut include: impl FnMut(ElementIdx) -> bool,
    ) -> Vec<ElementIdx> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            for &c in self.elements[idx.index()].children.iter().rev() {
                if include(c) {
                    stack.push(c);
                }
            }
        }
        out
    }

    /// Strict ancestors of `idx`, nearest first.
    pub fn ancestors(&self, idx: ElementIdx) -> impl Iterator<Item = ElementIdx> + '_ {
        std::iter::successors(self.elements[idx.index()].parent, move |p| {
            self.elements[p.index()].parent
        })
    }

    /// Whether `idx` lies inside the subtree rooted at `root` (inclusive).
    pub fn is_within(&self, idx: ElementIdx, root: ElementIdx) -> bool {
        idx == root || self.ancestors(idx).any(|a| a == root)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tree/arena.rs"]
mod tests;
