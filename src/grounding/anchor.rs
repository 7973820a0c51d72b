use tracing::debug;

use crate::dom::document::{Document, NodeId};
use crate::dom::selector::parse_selector;
use crate::grounding::finder::FinderOptions;
use crate::grounding::selector::SelectorSynthesizer;

/// Find the repeated group `start` belongs to and return the member holding
/// `start` together with the member after it (wrapping to the first).
///
/// Every ancestor level of `start` is tried as a hypothetical group item;
/// the level whose item selector yields the most disjoint matches wins.
/// Needs at least two matches.
pub fn expand_anchor_from(
    doc: &Document,
    synthesizer: &SelectorSynthesizer,
    start: NodeId,
) -> Option<(NodeId, NodeId)> {
    let mut best: Vec<NodeId> = Vec::new();
    let mut best_items: Option<String> = None;
    let mut level = Some(start).filter(|&n| doc.is_element(n));

    while let Some(current) = level {
        level = doc.parent_element(current);

        let Some(features) = synthesizer.common_items_and_ancestor(doc, &[current]) else {
            continue;
        };

        // Tag-only items are too unstable to describe a group.
        if !ends_with_discriminative_compound(&features.items) {
            continue;
        }

        let Ok(matches) = doc.query_selector_all(&features.items) else {
            debug!(items = %features.items, "skipping unparseable item selector");
            continue;
        };
        let mut kept = matches.clone();

        if current != start {
            let options = FinderOptions::under(current).without_ids();
            let Some(similar) = synthesizer.unique_selector_with(doc, start, &options) else {
                continue;
            };
            kept.retain(|&candidate| matches!(doc.query_selector_from(candidate, &similar), Ok(Some(_))));
        }

        kept.retain(|&inner| {
            !matches
                .iter()
                .any(|&outer| outer != inner && doc.contains(outer, inner))
        });

        if kept.len() > best.len() {
            debug!(items = %features.items, matches = kept.len(), "better group hypothesis");
            best = kept;
            best_items = Some(features.items);
        }
    }

    if best_items.is_none() || best.len() < 2 {
        return None;
    }

    let index = best.iter().position(|&m| doc.contains(m, start))?;
    Some((best[index], best[(index + 1) % best.len()]))
}

/// The last compound of the item selector carries a class or attribute.
fn ends_with_discriminative_compound(items: &str) -> bool {
    let Ok(list) = parse_selector(items) else {
        return false;
    };
    list.0
        .last()
        .and_then(|complex| complex.parts.last())
        .is_some_and(|part| !part.compound.classes.is_empty() || !part.compound.attrs.is_empty())
}
