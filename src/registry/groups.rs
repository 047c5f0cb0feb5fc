use crate::foundation::ids::{ElementIdx, GroupIdx};
use crate::scene::model::ElementKind;
use crate::tree::arena::RenderTree;
use serde::Serialize;
use std::collections::HashMap;

/// Which rule picked a group's initial variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialSelection {
    /// The group's externally bound default named a member.
    Bound,
    /// Member names end in strictly monotonic integers; the highest won.
    Countdown,
    /// First declared member.
    First,
}

/// A set of mutually exclusive variants.
#[derive(Debug, Clone)]
pub struct VariantGroup {
    pub(crate) element: ElementIdx,
    pub(crate) variants: Vec<ElementIdx>,
    pub(crate) parent_variant: Option<ElementIdx>,
    pub(crate) parent_group: Option<GroupIdx>,
    pub(crate) active: ElementIdx,
    pub(crate) initial: InitialSelection,
}

impl VariantGroup {
    /// The `variant-group` element.
    pub fn element(&self) -> ElementIdx {
        self.element
    }

    /// Member variants in declared order.
    pub fn variants(&self) -> &[ElementIdx] {
        &self.variants
    }

    /// Enclosing variant when this group is nested inside another group's variant.
    pub fn parent_variant(&self) -> Option<ElementIdx> {
        self.parent_variant
    }

    /// Group owning [`Self::parent_variant`].
    pub fn parent_group(&self) -> Option<GroupIdx> {
        self.parent_group
    }

    /// Currently active variant.
    pub fn active(&self) -> ElementIdx {
        self.active
    }

    /// Rule that picked the initial variant.
    pub fn initial_selection(&self) -> InitialSelection {
        self.initial
    }

    /// Position of `variant` among the members.
    pub fn position(&self, variant: ElementIdx) -> Option<usize> {
        self.variants.iter().position(|&v| v == variant)
    }
}

/// Index of every variant group in a tree.
///
/// The active-variant pointer is the only mutable state here and is written through
/// [`VariantRegistry::set_active`], which only the transition director calls.
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    groups: Vec<VariantGroup>,
    by_element: HashMap<ElementIdx, GroupIdx>,
    owner_of_variant: HashMap<ElementIdx, GroupIdx>,
}

impl VariantRegistry {
    /// Discover every variant group in one pass over the arena (document order).
    pub fn discover(tree: &RenderTree) -> Self {
        let mut reg = Self::default();

        for idx in tree.indices() {
            let el = tree.get(idx);
            if el.kind() != ElementKind::VariantGroup {
                continue;
            }

            let mut variants = Vec::with_capacity(el.children().len());
            for &c in el.children() {
                if tree.get(c).kind() == ElementKind::Variant {
                    variants.push(c);
                } else {
                    tracing::debug!(
                        group = el.id(),
                        child = tree.id_of(c),
                        "ignoring non-variant child of variant group"
                    );
                }
            }
            if variants.is_empty() {
                tracing::warn!(group = el.id(), "variant group has no variants; skipped");
                continue;
            }

            // Pre-order: any enclosing group was registered before this one.
            let parent_variant = tree
                .ancestors(idx)
                .find(|a| reg.owner_of_variant.contains_key(a));
            let parent_group = parent_variant.and_then(|v| reg.owner_of_variant.get(&v).copied());

            let (active, initial) = select_initial(tree, idx, &variants);
            let gidx = GroupIdx(reg.groups.len() as u32);
            for &v in &variants {
                reg.owner_of_variant.insert(v, gidx);
            }
            reg.by_element.insert(idx, gidx);
            tracing::debug!(
                group = el.id(),
                active = tree.id_of(active),
                rule = ?initial,
                variants = variants.len(),
                "discovered variant group"
            );
            reg.groups.push(VariantGroup {
                element: idx,
                variants,
                parent_variant,
                parent_group,
                active,
                initial,
            });
        }

        reg
    }

    /// All groups in discovery order.
    pub fn groups(&self) -> &[VariantGroup] {
        &self.groups
    }

    /// Borrow a group.
    pub fn group(&self, g: GroupIdx) -> &VariantGroup {
        &self.groups[g.index()]
    }

    /// First discovered group (the sequencer's target).
    pub fn first_group(&self) -> Option<GroupIdx> {
        (!self.groups.is_empty()).then_some(GroupIdx(0))
    }

    /// Resolve a group by the id (or, failing that, the name) of its element.
    pub fn find_group(&self, tree: &RenderTree, key: &str) -> Option<GroupIdx> {
        if let Some(g) = tree.find(key).and_then(|idx| self.by_element.get(&idx)) {
            return Some(*g);
        }
        self.groups
            .iter()
            .position(|g| tree.get(g.element).name() == key)
            .map(|i| GroupIdx(i as u32))
    }

    /// Resolve a member variant by id, then by name.
    pub fn find_variant(&self, tree: &RenderTree, g: GroupIdx, key: &str) -> Option<ElementIdx> {
        let group = self.group(g);
        group
            .variants
            .iter()
            .copied()
            .find(|&v| tree.id_of(v) == key)
            .or_else(|| {
                group
                    .variants
                    .iter()
                    .copied()
                    .find(|&v| tree.get(v).name() == key)
            })
    }

    /// Group a variant belongs to.
    pub fn owning_group(&self, variant: ElementIdx) -> Option<GroupIdx> {
        self.owner_of_variant.get(&variant).copied()
    }

    /// Group whose `variant-group` element is `element`.
    pub fn group_at(&self, element: ElementIdx) -> Option<GroupIdx> {
        self.by_element.get(&element).copied()
    }

    /// Nearest variant group boundary at or above `idx`.
    pub fn nearest_group(&self, tree: &RenderTree, idx: ElementIdx) -> Option<GroupIdx> {
        std::iter::once(idx)
            .chain(tree.ancestors(idx))
            .find_map(|a| self.group_at(a))
    }

    /// Active variant of a group.
    pub fn active(&self, g: GroupIdx) -> ElementIdx {
        self.groups[g.index()].active
    }

    /// Groups nested directly inside `variant`.
    pub fn nested_groups(&self, variant: ElementIdx) -> impl Iterator<Item = GroupIdx> + '_ {
        self.groups
            .iter()
            .enumerate()
            .filter(move |(_, g)| g.parent_variant == Some(variant))
            .map(|(i, _)| GroupIdx(i as u32))
    }

    /// Whether `idx` is not hidden by an inactive variant at or above it.
    pub fn is_displayed(&self, tree: &RenderTree, idx: ElementIdx) -> bool {
        std::iter::once(idx)
            .chain(tree.ancestors(idx))
            .all(|a| self.is_active_or_plain(a))
    }

    /// False only for registered variants that are not their group's active one.
    pub(crate) fn is_active_or_plain(&self, idx: ElementIdx) -> bool {
        self.owning_group(idx)
            .is_none_or(|g| self.groups[g.index()].active == idx)
    }

    pub(crate) fn set_active(&mut self, g: GroupIdx, variant: ElementIdx) {
        debug_assert_eq!(self.owning_group(variant), Some(g));
        self.groups[g.index()].active = variant;
    }
}

fn select_initial(
    tree: &RenderTree,
    group: ElementIdx,
    variants: &[ElementIdx],
) -> (ElementIdx, InitialSelection) {
    if let Some(hint) = tree.get(group).default_variant.as_deref() {
        match bound_variant(tree, variants, hint) {
            Some(v) => return (v, InitialSelection::Bound),
            None => tracing::warn!(
                group = tree.id_of(group),
                hint,
                "bound default names no variant; falling back"
            ),
        }
    }

    if let Some(v) = countdown_variant(tree, variants) {
        return (v, InitialSelection::Countdown);
    }

    (variants[0], InitialSelection::First)
}

/// Match the hint against ids, whole names, then `property=value` pairs inside names.
fn bound_variant(tree: &RenderTree, variants: &[ElementIdx], hint: &str) -> Option<ElementIdx> {
    let hint = hint.trim();
    variants
        .iter()
        .copied()
        .find(|&v| tree.id_of(v) == hint)
        .or_else(|| variants.iter().copied().find(|&v| tree.get(v).name() == hint))
        .or_else(|| {
            variants.iter().copied().find(|&v| {
                tree.get(v).name().split(',').any(|pair| {
                    pair.split_once('=')
                        .is_some_and(|(_, value)| value.trim() == hint)
                })
            })
        })
}

fn countdown_variant(tree: &RenderTree, variants: &[ElementIdx]) -> Option<ElementIdx> {
    if variants.len() < 2 {
        return None;
    }
    let values = variants
        .iter()
        .map(|&v| trailing_integer(tree.get(v).name()))
        .collect::<Option<Vec<_>>>()?;

    let ascending = values.windows(2).all(|w| w[0] < w[1]);
    let descending = values.windows(2).all(|w| w[0] > w[1]);
    if !ascending && !descending {
        return None;
    }
    let best = if ascending { variants.len() - 1 } else { 0 };
    Some(variants[best])
}

pub(crate) fn trailing_integer(name: &str) -> Option<u64> {
    let name = name.trim_end();
    let start = name
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    name[start..].parse().ok()
}

#[cfg(test)]
#[path = "../../tests/unit/registry/groups.rs"]
mod tests;
