use tracing::{debug, trace};

use crate::dom::document::{Document, NodeId};
use crate::dom::selector::css_escape;
use crate::error::{GroundingError, Result};
use crate::grounding::capability::{classify, Capabilities};
use crate::grounding::record::{ElementRecord, RecordBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedElement {
    pub node: NodeId,
    pub capabilities: Capabilities,
}

/// Maps the short ids handed to an agent back to elements.
///
/// Ids are positions in the most recent assignment, written onto each
/// element as a marker attribute. Lookups prefer the positional reference
/// while it is still attached and fall back to the marker attribute.
#[derive(Debug, Clone)]
pub struct ElementIndex {
    marker_attr: String,
    entries: Vec<IndexedElement>,
}

impl ElementIndex {
    pub fn new(marker_attr: impl Into<String>) -> Self {
        Self {
            marker_attr: marker_attr.into(),
            entries: Vec::new(),
        }
    }

    pub fn marker_attr(&self) -> &str {
        &self.marker_attr
    }

    /// Elements of the latest assignment, in id order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|e| e.node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start a new id cycle: drop every old marker, then number `elements`
    /// from zero. An element listed twice keeps its first id. Returns the id
    /// of each input, in input order.
    pub fn mark_all(&mut self, doc: &mut Document, elements: &[NodeId]) -> Vec<String> {
        self.clear_markers(doc);
        self.entries.clear();

        let mut ids = Vec::with_capacity(elements.len());
        for &el in elements {
            if let Some(existing) = doc.attr(el, &self.marker_attr) {
                ids.push(existing.to_string());
                continue;
            }
            let id = self.entries.len().to_string();
            doc.set_attr(el, &self.marker_attr, &id);
            self.entries.push(IndexedElement {
                node: el,
                capabilities: classify(doc, el).capabilities(),
            });
            ids.push(id);
        }

        debug!(assigned = self.entries.len(), requested = elements.len(), "assigned element ids");
        ids
    }

    /// Assign ids and build one record per distinct element, in id order.
    pub fn assign(&mut self, doc: &mut Document, elements: &[NodeId], records: &RecordBuilder) -> Vec<ElementRecord> {
        self.mark_all(doc, elements);
        self.entries.iter().map(|e| records.record(doc, e.node)).collect()
    }

    pub fn resolve(&self, doc: &Document, id: &str) -> Result<NodeId> {
        if let Some(entry) = self.positional(doc, id) {
            return Ok(entry.node);
        }

        let selector = format!("[{}=\"{}\"]", css_escape(&self.marker_attr), css_escape(id));
        let found = doc.query_selector(&selector)?;
        trace!(id, found = found.is_some(), "resolved by marker attribute");
        found.ok_or_else(|| GroundingError::not_found(id))
    }

    /// Resolve `id` together with what the element supports.
    pub fn resolve_with_capabilities(&self, doc: &Document, id: &str) -> Result<(NodeId, Capabilities)> {
        if let Some(entry) = self.positional(doc, id) {
            return Ok((entry.node, entry.capabilities));
        }
        let node = self.resolve(doc, id)?;
        Ok((node, classify(doc, node).capabilities()))
    }

    fn positional(&self, doc: &Document, id: &str) -> Option<&IndexedElement> {
        let index: usize = id.parse().ok()?;
        self.entries.get(index).filter(|e| doc.is_connected(e.node))
    }

    /// Remove every marker attribute in the document. The positional
    /// references survive until the next assignment.
    pub fn clear_markers(&self, doc: &mut Document) {
        let marked: Vec<NodeId> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|&n| doc.has_attr(n, &self.marker_attr))
            .collect();
        for el in marked {
            doc.remove_attr(el, &self.marker_attr);
        }
    }
}
