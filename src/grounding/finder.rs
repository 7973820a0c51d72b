use tracing::trace;

use crate::dom::document::{Document, NodeId};
use crate::dom::selector::css_escape;

// ============================================================================
// UniqueSelector trait: single-element selector generation
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct FinderOptions {
    /// Uniqueness is checked among descendants of this node; the document
    /// when `None`.
    pub root: Option<NodeId>,
    /// Allow `#id` compounds. Turned off when structural similarity matters
    /// more than incidental ids.
    pub use_ids: bool,
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self {
            root: None,
            use_ids: true,
        }
    }
}

impl FinderOptions {
    pub fn under(root: NodeId) -> Self {
        Self {
            root: Some(root),
            ..Self::default()
        }
    }

    pub fn without_ids(mut self) -> Self {
        self.use_ids = false;
        self
    }
}

/// Produces the shortest selector that matches exactly one element under a
/// root.
pub trait UniqueSelector: Send + Sync {
    fn unique_selector(&self, doc: &Document, el: NodeId, options: &FinderOptions) -> Option<String>;
}

// ============================================================================
// MinimalSelectorFinder
// ============================================================================

/// Searches chains of `>`-joined compounds over the element's ancestors,
/// shortest chains first. Each level contributes `#id`, its classes, its tag
/// and `tag:nth-child(n)`. When the try budget runs out the root-anchored
/// `nth-child` path is returned, which is unique by construction.
pub struct MinimalSelectorFinder {
    max_tries: usize,
}

impl Default for MinimalSelectorFinder {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl MinimalSelectorFinder {
    pub fn new(max_tries: usize) -> Self {
        Self {
            max_tries: max_tries.max(1),
        }
    }

    fn level_candidates(&self, doc: &Document, node: NodeId, options: &FinderOptions) -> Vec<String> {
        let mut out = Vec::new();
        let tag = doc.tag_name(node).unwrap_or("*");

        if options.use_ids {
            if let Some(id) = doc.attr(node, "id").filter(|id| !id.is_empty()) {
                out.push(format!("#{}", css_escape(id)));
            }
        }
        for class in doc.classes(node) {
            out.push(format!(".{}", css_escape(class)));
        }
        out.push(tag.to_string());
        if let Some(n) = doc.element_index(node) {
            out.push(format!("{tag}:nth-child({n})"));
        }
        out
    }

    fn anchored_path(&self, doc: &Document, chain: &[NodeId]) -> String {
        let steps: Vec<String> = chain
            .iter()
            .rev()
            .map(|&node| {
                let tag = doc.tag_name(node).unwrap_or("*");
                let n = doc.element_index(node).unwrap_or(1);
                format!("{tag}:nth-child({n})")
            })
            .collect();
        format!("> {}", steps.join(" > "))
    }
}

impl UniqueSelector for MinimalSelectorFinder {
    fn unique_selector(&self, doc: &Document, el: NodeId, options: &FinderOptions) -> Option<String> {
        let root = options.root.unwrap_or_else(|| doc.root());
        if !doc.is_element(el) || el == root || !doc.contains(root, el) {
            return None;
        }

        // Element first, then its ancestors up to (excluding) the root.
        let mut chain = vec![el];
        chain.extend(doc.ancestors(el).into_iter().take_while(|&a| a != root));

        let levels: Vec<Vec<String>> = chain
            .iter()
            .map(|&node| self.level_candidates(doc, node, options))
            .collect();

        let mut tries = 0usize;
        for len in 1..=levels.len() {
            let mut combos: Vec<Vec<&str>> = vec![Vec::new()];
            for level in levels[..len].iter().rev() {
                let budget = self.max_tries.saturating_sub(tries).max(1);
                combos = combos
                    .iter()
                    .flat_map(|prefix| {
                        level.iter().map(move |candidate| {
                            let mut next = prefix.clone();
                            next.push(candidate.as_str());
                            next
                        })
                    })
                    .take(budget)
                    .collect();
            }

            let mut selectors: Vec<String> = combos.iter().map(|c| c.join(" > ")).collect();
            selectors.sort_by_key(|s| s.len());

            for selector in selectors {
                if tries >= self.max_tries {
                    break;
                }
                tries += 1;
                if is_unique(doc, root, &selector, el) {
                    trace!(selector = %selector, tries, "unique selector found");
                    return Some(selector);
                }
            }
            if tries >= self.max_tries {
                break;
            }
        }

        let fallback = self.anchored_path(doc, &chain);
        is_unique(doc, root, &fallback, el).then_some(fallback)
    }
}

/// The selector matches `el` and nothing else under `root`.
pub fn is_unique(doc: &Document, root: NodeId, selector: &str, el: NodeId) -> bool {
    matches!(doc.query_selector_all_from(root, selector), Ok(found) if found == [el])
}
