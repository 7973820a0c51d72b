use serde::{Deserialize, Serialize};

use crate::dom::document::{Document, NodeId};
use crate::dom::selector::{parse_selector, SelectorList};
use crate::error::Result;

/// Which part of the page to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    FullPage,
    #[default]
    Viewport,
}

/// Source of the candidate elements a snapshot grounds.
pub trait ElementClassifier: Send + Sync {
    fn candidates(&self, doc: &Document, scope: Scope) -> Vec<NodeId>;
}

/// Candidates are the rendered elements matching an interactive selector.
pub struct SelectorClassifier {
    selector: SelectorList,
}

impl SelectorClassifier {
    pub fn new(selector: &str) -> Result<Self> {
        Ok(Self {
            selector: parse_selector(selector)?,
        })
    }
}

impl ElementClassifier for SelectorClassifier {
    fn candidates(&self, doc: &Document, scope: Scope) -> Vec<NodeId> {
        let viewport = doc.viewport();
        doc.select_from(doc.root(), &self.selector)
            .into_iter()
            .filter(|&el| {
                let mut rects = doc.client_rects(el).iter().filter(|r| !r.is_empty());
                match scope {
                    Scope::FullPage => rects.next().is_some(),
                    Scope::Viewport => rects.any(|r| r.intersects(&viewport)),
                }
            })
            .collect()
    }
}
