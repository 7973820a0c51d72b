use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use crate::browser::oracle::AccessibilityOracle;
use crate::dom::document::{Document, NodeId};

/// Tags that never hold content of their own.
const CONTENTLESS_TAGS: [&str; 9] = [
    "body", "head", "html", "script", "noscript", "style", "select", "form", "iframe",
];

/// The dominant repeated child tag under `element` and how many substantive
/// children share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentScore {
    pub element: NodeId,
    pub tag_name: Option<String>,
    pub count: usize,
}

/// Ranks containers by how many substantive children (holding a link or
/// image, or enough text) share one tag.
pub struct ContentDensityRanker {
    oracle: Arc<dyn AccessibilityOracle>,
    text_threshold: usize,
}

impl ContentDensityRanker {
    pub fn new(oracle: Arc<dyn AccessibilityOracle>, text_threshold: usize) -> Self {
        Self {
            oracle,
            text_threshold,
        }
    }

    pub fn is_contentless(&self, doc: &Document, el: NodeId) -> bool {
        let Some(tag) = doc.tag_name(el) else {
            return true;
        };
        if CONTENTLESS_TAGS.contains(&tag) {
            return true;
        }

        let (width, height) = doc.rendered_size(el);
        if width == 0.0 || height == 0.0 {
            return true;
        }

        self.oracle.is_disabled(doc, el) || self.oracle.is_inaccessible(doc, el)
    }

    fn is_substantive(&self, doc: &Document, child: NodeId) -> bool {
        let links_or_images = doc.descendants(child).into_iter().any(|d| {
            match doc.tag_name(d) {
                Some("a") => doc.has_attr(d, "href"),
                Some("img") => doc.has_attr(d, "src"),
                _ => false,
            }
        });
        links_or_images || doc.text_content(child).chars().count() > self.text_threshold
    }

    /// Score one container: its most frequent substantive child tag. Ties go
    /// to the tag seen first.
    pub fn score(&self, doc: &Document, el: NodeId) -> ContentScore {
        let mut tally: Vec<(String, usize)> = Vec::new();

        for child in doc.element_children(el) {
            if self.is_contentless(doc, child) || !self.is_substantive(doc, child) {
                continue;
            }
            let tag = doc.tag_name(child).unwrap_or_default();
            match tally.iter_mut().find(|(t, _)| t == tag) {
                Some((_, count)) => *count += 1,
                None => tally.push((tag.to_string(), 1)),
            }
        }

        let mut best: Option<(String, usize)> = None;
        for (tag, count) in tally {
            if best.as_ref().is_none_or(|(_, c)| count > *c) {
                best = Some((tag, count));
            }
        }

        match best {
            Some((tag, count)) => ContentScore {
                element: el,
                tag_name: Some(tag),
                count,
            },
            None => ContentScore {
                element: el,
                tag_name: None,
                count: 0,
            },
        }
    }

    /// Top `top_n` containers under `<body>`, highest count first. Elements
    /// without repetition (count <= 1) are dropped, as is any element whose
    /// containment chain (ancestors or descendants) holds a strictly higher
    /// count.
    pub fn most_contentful_elements(&self, doc: &Document, top_n: usize) -> Vec<ContentScore> {
        let Some(body) = doc.body() else {
            return Vec::new();
        };

        let mut scores: Vec<ContentScore> = Vec::new();
        for el in doc.descendants(body) {
            if self.is_contentless(doc, el) {
                trace!(node = el.index(), "contentless");
                continue;
            }
            scores.push(self.score(doc, el));
        }

        scores.sort_by(|a, b| b.count.cmp(&a.count));

        let repeated: Vec<&ContentScore> = scores.iter().filter(|s| s.count > 1).collect();
        repeated
            .iter()
            .filter(|candidate| {
                !repeated.iter().any(|other| {
                    other.element != candidate.element
                        && other.count > candidate.count
                        && (doc.contains(other.element, candidate.element)
                            || doc.contains(candidate.element, other.element))
                })
            })
            .take(top_n)
            .map(|s| (*s).clone())
            .collect()
    }
}
