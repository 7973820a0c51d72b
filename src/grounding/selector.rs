use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::document::{Document, NodeId};
use crate::dom::selector::{css_escape, SelectorError};
use crate::grounding::finder::{FinderOptions, UniqueSelector};

/// Attributes never used to describe a group: identity, inline style and
/// resource locations differ per item even in a uniform list.
const EXCLUDED_ATTRS: [&str; 6] = ["class", "id", "style", "src", "alt", "href"];

/// A repeated group: `ancestor` locates the container, `items` (which
/// already includes the ancestor) locates every member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementFeatures {
    pub ancestor: String,
    pub items: String,
}

// ============================================================================
// Tree helpers
// ============================================================================

/// Nearest inclusive ancestor matching `selector`.
pub fn query_ancestor(doc: &Document, el: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
    doc.closest(el, selector)
}

/// Whether `el` matches `selector` or sits inside something that does.
pub fn is_child_of(doc: &Document, el: NodeId, ancestor_selector: &str) -> Result<bool, SelectorError> {
    doc.matches(el, &format!("{ancestor_selector}, {ancestor_selector} *"))
}

/// Closest matching ancestor, or failing that the first matching
/// descendant.
pub fn closest_element(doc: &Document, el: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
    match doc.closest(el, selector)? {
        Some(found) => Ok(Some(found)),
        None => doc.query_selector_from(el, selector),
    }
}

/// Nearest element containing every input (inclusive). A single element
/// yields its parent; disjoint inputs yield `None`.
pub fn common_ancestor(doc: &Document, els: &[NodeId]) -> Option<NodeId> {
    let (&first, rest) = els.split_first()?;
    if rest.is_empty() {
        return doc.parent_element(first);
    }

    let mut visited = HashSet::new();
    let mut cursor = Some(first);
    while let Some(node) = cursor {
        visited.insert(node);
        cursor = doc.parent_element(node);
    }

    let mut candidate: Option<NodeId> = None;
    for &el in rest {
        let mut cursor = Some(el);
        let mut common = None;
        while let Some(node) = cursor {
            if visited.contains(&node) {
                common = Some(node);
                break;
            }
            cursor = doc.parent_element(node);
        }
        let common = common?;

        // Keep whichever pairwise ancestor sits higher in the tree.
        match candidate {
            Some(current) if !doc.contains(common, current) => {}
            _ => candidate = Some(common),
        }
    }
    candidate
}

/// Tighten `selector` to its outermost matches under `root` when matches
/// nest inside each other. `selector` must be a single complex selector
/// without a leading `>`.
pub fn outermost_selector(doc: &Document, root: NodeId, selector: &str) -> Result<String, SelectorError> {
    let nested = doc.query_selector_all_from(root, &format!("{selector} {selector}"))?;
    if nested.is_empty() {
        Ok(selector.to_string())
    } else {
        Ok(format!("{selector}:not({selector} {selector})"))
    }
}

// ============================================================================
// SelectorSynthesizer
// ============================================================================

/// Builds selectors for single elements and for repeated groups.
pub struct SelectorSynthesizer {
    finder: Arc<dyn UniqueSelector>,
    marker_attr: String,
}

impl SelectorSynthesizer {
    /// `marker_attr` is the id marker written by the index; it is never part
    /// of a synthesized selector.
    pub fn new(finder: Arc<dyn UniqueSelector>, marker_attr: impl Into<String>) -> Self {
        Self {
            finder,
            marker_attr: marker_attr.into(),
        }
    }

    pub fn unique_selector(&self, doc: &Document, el: NodeId) -> Option<String> {
        self.finder.unique_selector(doc, el, &FinderOptions::default())
    }

    pub fn unique_selector_with(&self, doc: &Document, el: NodeId, options: &FinderOptions) -> Option<String> {
        self.finder.unique_selector(doc, el, options)
    }

    fn is_excluded_attr(&self, name: &str) -> bool {
        EXCLUDED_ATTRS.contains(&name) || name.eq_ignore_ascii_case(&self.marker_attr)
    }

    /// Most specific selector under `root` shared by all `els`, preferring
    /// classes and attributes over tag names.
    pub fn common_selector(&self, doc: &Document, root: NodeId, els: &[NodeId]) -> Option<String> {
        let depth_budget = doc.max_depth() + 1;
        self.common_selector_within(doc, root, els, depth_budget)
    }

    fn common_selector_within(
        &self,
        doc: &Document,
        root: NodeId,
        els: &[NodeId],
        depth_budget: usize,
    ) -> Option<String> {
        let (&first, rest) = els.split_first()?;
        let mut selectors: Vec<String> = Vec::new();

        for class in doc.classes(first) {
            if rest.iter().all(|&el| doc.has_class(el, class)) {
                selectors.push(format!(".{}", css_escape(class)));
            }
        }

        for (name, value) in doc.attrs(first) {
            if self.is_excluded_attr(name) {
                continue;
            }
            if rest.iter().all(|&el| doc.attr(el, name) == Some(value.as_str())) {
                selectors.push(format!("[{}=\"{}\"]", css_escape(name), css_escape(value)));
            }
        }

        if selectors.is_empty() {
            return self.tag_path(doc, root, els, depth_budget);
        }

        // Drop trailing candidates while the (outermost) match count holds.
        let mut last_count = 0usize;
        for i in (0..selectors.len()).rev() {
            let selector = outermost_selector(doc, root, &selectors[..=i].concat()).ok()?;
            let matched = doc.query_selector_all_from(root, &selector).ok()?.len();

            if last_count == 0 {
                last_count = matched;
            }

            if matched == 0 || matched != last_count {
                if last_count == 0 {
                    return None;
                }
                let end = (i + 2).min(selectors.len());
                return outermost_selector(doc, root, &selectors[..end].concat()).ok();
            }
        }

        outermost_selector(doc, root, &selectors[0]).ok()
    }

    /// Tag-name fallback: `parent-selector > tag`, or `> tag` directly under
    /// the root.
    fn tag_path(&self, doc: &Document, root: NodeId, els: &[NodeId], depth_budget: usize) -> Option<String> {
        let (&first, rest) = els.split_first()?;
        let tag = doc.tag_name(first)?;
        if !rest.iter().all(|&el| doc.tag_name(el) == Some(tag)) {
            return None;
        }

        let parents = els
            .iter()
            .map(|&el| doc.parent_element(el))
            .collect::<Option<Vec<NodeId>>>()?;

        if parents.contains(&root) {
            if parents.iter().all(|&p| p == parents[0]) {
                return Some(format!("> {tag}"));
            }
            return Some(tag.to_string());
        }

        if depth_budget == 0 {
            debug!(tag, "common selector recursion exhausted");
            return None;
        }
        let parent_selector = self.common_selector_within(doc, root, &parents, depth_budget - 1)?;
        Some(format!("{parent_selector} > {tag}"))
    }

    /// Container and item selectors for the group `els` belongs to.
    pub fn common_items_and_ancestor(&self, doc: &Document, els: &[NodeId]) -> Option<ElementFeatures> {
        let ancestor = common_ancestor(doc, els)?;
        let ancestor_selector = self.unique_selector(doc, ancestor)?;
        let common = self
            .common_selector(doc, ancestor, els)
            .unwrap_or_else(|| "> *".to_string());

        Some(ElementFeatures {
            items: format!("{ancestor_selector} {common}"),
            ancestor: ancestor_selector,
        })
    }
}
