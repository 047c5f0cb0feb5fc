use crate::foundation::error::MotionError;
use crate::foundation::ids::ElementIdx;
use crate::registry::groups::VariantRegistry;
use crate::scene::model::ElementKind;
use crate::tree::arena::RenderTree;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Rule that produced a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Equal `(name, type)`.
    NameAndType,
    /// Equal local id (segment after the last `;` of an instance path).
    Id,
}

/// What happens to elements that found no counterpart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// No animation: outgoing-only elements vanish and incoming-only elements appear at finalize,
    /// together with the variant roots.
    #[default]
    Snap,
}

/// Outgoing element matched with its counterpart in the incoming variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorrespondencePair {
    /// Element in the departing variant.
    pub outgoing: ElementIdx,
    /// Element in the arriving variant.
    pub incoming: ElementIdx,
    /// Rule that matched them.
    pub rule: MatchRule,
}

/// Result of matching two variant subtrees.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    /// Pairs in outgoing document order.
    pub pairs: Vec<CorrespondencePair>,
    /// Outgoing elements without a counterpart.
    pub unmatched_outgoing: Vec<ElementIdx>,
    /// Incoming elements without a counterpart.
    pub unmatched_incoming: Vec<ElementIdx>,
    /// Keys shared by several incoming candidates, resolved first-unmatched-wins.
    pub ambiguous: Vec<MotionError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NameKey<'a> {
    name: &'a str,
    kind: ElementKind,
}

pub(crate) struct Candidates<'a> {
    by_name: HashMap<NameKey<'a>, Vec<ElementIdx>>,
    by_local_id: HashMap<&'a str, Vec<ElementIdx>>,
}

/// Match the displayed contents of two variant roots.
///
/// Both subtrees are flattened in pre-order including the roots; inactive variants of nested
/// groups are left out since they are not on screen on either side.
pub fn match_variants(
    tree: &RenderTree,
    registry: &VariantRegistry,
    outgoing_root: ElementIdx,
    incoming_root: ElementIdx,
) -> MatchOutcome {
    let outgoing = tree.preorder_where(outgoing_root, |c| registry.is_active_or_plain(c));
    let incoming = tree.preorder_where(incoming_root, |c| registry.is_active_or_plain(c));
    match_elements(tree, &outgoing, &incoming)
}

/// Match two flattened element lists.
pub fn match_elements(
    tree: &RenderTree,
    outgoing: &[ElementIdx],
    incoming: &[ElementIdx],
) -> MatchOutcome {
    let cands = index_candidates(tree, incoming);
    let mut claimed = HashSet::<ElementIdx>::with_capacity(incoming.len());
    let mut out = MatchOutcome::default();

    let mut reported = HashSet::<NameKey<'_>>::new();
    for (key, bucket) in &cands.by_name {
        if bucket.len() > 1 && outgoing.iter().any(|&o| name_key(tree, o) == Some(*key)) {
            reported.insert(*key);
        }
    }

    let mut pending = Vec::new();
    for &o in outgoing {
        match correspond_by_name(tree, o, &cands, &claimed) {
            Some(pair) => {
                claimed.insert(pair.incoming);
                out.pairs.push(pair);
            }
            None => pending.push(o),
        }
    }

    // Id fallback only sees what the primary rule left over.
    for o in pending {
        match correspond_by_id(tree, o, &cands, &claimed) {
            Some(pair) => {
                claimed.insert(pair.incoming);
                out.pairs.push(pair);
            }
            None => out.unmatched_outgoing.push(o),
        }
    }
    out.pairs.sort_by_key(|p| p.outgoing);

    out.unmatched_incoming = incoming
        .iter()
        .copied()
        .filter(|i| !claimed.contains(i))
        .collect();

    let mut ambiguous: Vec<_> = reported.into_iter().collect();
    ambiguous.sort_by(|a, b| (a.name, a.kind.as_str()).cmp(&(b.name, b.kind.as_str())));
    for key in ambiguous {
        let err = MotionError::AmbiguousCorrespondence {
            key: format!("{}/{}", key.name, key.kind.as_str()),
            candidates: cands.by_name[&key].len(),
        };
        tracing::warn!(%err, "resolving by first unmatched candidate");
        out.ambiguous.push(err);
    }

    out
}

/// Primary heuristic: first unclaimed incoming element with the same `(name, type)`.
///
/// Unnamed elements never match by name; ids are not stable across variants but names are.
pub(crate) fn correspond_by_name(
    tree: &RenderTree,
    outgoing: ElementIdx,
    cands: &Candidates<'_>,
    claimed: &HashSet<ElementIdx>,
) -> Option<CorrespondencePair> {
    let key = name_key(tree, outgoing)?;
    let incoming = cands
        .by_name
        .get(&key)?
        .iter()
        .copied()
        .find(|i| !claimed.contains(i))?;
    Some(CorrespondencePair {
        outgoing,
        incoming,
        rule: MatchRule::NameAndType,
    })
}

/// Fallback heuristic: equal local id and type.
pub(crate) fn correspond_by_id(
    tree: &RenderTree,
    outgoing: ElementIdx,
    cands: &Candidates<'_>,
    claimed: &HashSet<ElementIdx>,
) -> Option<CorrespondencePair> {
    let el = tree.get(outgoing);
    let incoming = cands
        .by_local_id
        .get(local_id(el.id()))?
        .iter()
        .copied()
        .find(|&i| !claimed.contains(&i) && i != outgoing && tree.get(i).kind() == el.kind())?;
    Some(CorrespondencePair {
        outgoing,
        incoming,
        rule: MatchRule::Id,
    })
}

fn index_candidates<'a>(tree: &'a RenderTree, incoming: &[ElementIdx]) -> Candidates<'a> {
    let mut by_name = HashMap::<NameKey<'a>, Vec<ElementIdx>>::new();
    let mut by_local_id = HashMap::<&'a str, Vec<ElementIdx>>::new();
    for &i in incoming {
        if let Some(key) = name_key(tree, i) {
            by_name.entry(key).or_default().push(i);
        }
        by_local_id
            .entry(local_id(tree.id_of(i)))
            .or_default()
            .push(i);
    }
    Candidates {
        by_name,
        by_local_id,
    }
}

fn name_key(tree: &RenderTree, idx: ElementIdx) -> Option<NameKey<'_>> {
    let el = tree.get(idx);
    let name = el.name().trim();
    (!name.is_empty()).then_some(NameKey {
        name,
        kind: el.kind(),
    })
}

/// Instance-path ids (`I12:3;45:6`) keep the source node id in the last segment.
fn local_id(id: &str) -> &str {
    id.rsplit(';').next().unwrap_or(id)
}

#[cfg(test)]
#[path = "../../tests/unit/matcher/correspond.rs"]
mod tests;
