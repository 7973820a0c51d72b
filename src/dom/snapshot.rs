use serde::{Deserialize, Serialize};

use crate::dom::document::{Document, Layout, NodeId, Rect};
use crate::error::Result;

// ============================================================================
// Render tree dump (produced by the browser-side extraction script)
// ============================================================================

/// A page as captured by the extraction script: the render tree plus
/// document-level scroll and viewport state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    /// The `<html>` element.
    pub root: RenderNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderNode {
    #[serde(rename_all = "camelCase")]
    Element {
        tag: String,
        #[serde(default)]
        attrs: Vec<(String, String)>,
        #[serde(default)]
        rects: Vec<Rect>,
        #[serde(default)]
        scroll_width: Option<f64>,
        #[serde(default)]
        scroll_height: Option<f64>,
        #[serde(default)]
        z_index: Option<i32>,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        checked: bool,
        #[serde(default)]
        children: Vec<RenderNode>,
    },
    Text {
        text: String,
    },
}

fn default_viewport_width() -> f64 { 1280.0 }
fn default_viewport_height() -> f64 { 720.0 }

impl Document {
    /// Build a document from an extraction dump.
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Result<Self> {
        let mut doc = Document::new();
        doc.set_scroll_offset(snapshot.scroll_x, snapshot.scroll_y);
        doc.set_viewport(snapshot.viewport_width, snapshot.viewport_height);
        let root = doc.root();
        doc.insert_render_node(root, &snapshot.root)?;
        Ok(doc)
    }

    /// Parse a JSON extraction dump.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: PageSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    fn insert_render_node(&mut self, parent: NodeId, node: &RenderNode) -> Result<()> {
        match node {
            RenderNode::Text { text } => {
                let id = self.create_text(text);
                self.append_child(parent, id)
            }
            RenderNode::Element {
                tag,
                attrs,
                rects,
                scroll_width,
                scroll_height,
                z_index,
                value,
                checked,
                children,
            } => {
                let id = self.create_element(tag);
                for (name, value) in attrs {
                    self.set_attr(id, name, value);
                }
                let scroll_size = match (scroll_width, scroll_height) {
                    (Some(w), Some(h)) => Some((*w, *h)),
                    _ => None,
                };
                self.set_layout(
                    id,
                    Layout {
                        rects: rects.clone(),
                        scroll_size,
                        z_index: *z_index,
                    },
                );
                if let Some(el) = self.element_mut(id) {
                    el.value = value.clone();
                    el.checked = *checked;
                }
                self.append_child(parent, id)?;
                for child in children {
                    self.insert_render_node(id, child)?;
                }
                Ok(())
            }
        }
    }
}
