use serde::{Deserialize, Serialize};

use crate::error::{GroundingError, Result};

// ============================================================================
// Handles and geometry
// ============================================================================

/// Handle to a node in a [`Document`].
///
/// Handles are plain arena indices. A node removed from the tree keeps its
/// slot, so a stale handle still points at the same (now detached) node; use
/// [`Document::is_connected`] before trusting one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A client rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Smallest rect containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// Layout facts captured from the renderer for one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    /// Client rects; inline content wrapping over several lines has several.
    pub rects: Vec<Rect>,
    /// Scroll width/height, when the extraction reported them.
    pub scroll_size: Option<(f64, f64)>,
    /// Computed `z-index`, `None` for `auto`.
    pub z_index: Option<i32>,
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    /// Current form value (input, textarea, select).
    pub value: Option<String>,
    pub checked: bool,
    pub layout: Layout,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            value: None,
            checked: false,
            layout: Layout::default(),
        }
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

// ============================================================================
// Document
// ============================================================================

/// In-memory model of a rendered page: the element tree plus the layout
/// state (client rects, scroll sizes, z-indices, scroll offset, viewport)
/// that grounding consults.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    scroll: (f64, f64),
    viewport: (f64, f64),
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            scroll: (0.0, 0.0),
            viewport: (1280.0, 720.0),
        }
    }

    /// The document node itself (not an element).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<html>` element, if any.
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root).into_iter().next()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.top_level("body")
    }

    pub fn head(&self) -> Option<NodeId> {
        self.top_level("head")
    }

    fn top_level(&self, tag: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html)
            .into_iter()
            .find(|&child| self.tag_name(child) == Some(tag))
    }

    // ---- construction ----------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it from its
    /// current position first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insert(parent, child)?;
        self.remove(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Insert `child` before `reference`, which must be a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<()> {
        self.check_insert(parent, child)?;
        if self.parent(reference) != Some(parent) {
            return Err(GroundingError::Hierarchy(format!(
                "node {} is not a child of {}",
                reference.0, parent.0
            )));
        }
        self.remove(child);
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == reference)
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[parent.0].children.insert(pos, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if parent.0 >= self.nodes.len() || child.0 >= self.nodes.len() {
            return Err(GroundingError::Hierarchy("unknown node".into()));
        }
        if matches!(self.nodes[parent.0].kind, NodeKind::Text(_)) {
            return Err(GroundingError::Hierarchy("text nodes cannot have children".into()));
        }
        if child == self.root {
            return Err(GroundingError::Hierarchy("the document node cannot be moved".into()));
        }
        if self.contains(child, parent) {
            return Err(GroundingError::Hierarchy(format!(
                "inserting node {} under {} would create a cycle",
                child.0, parent.0
            )));
        }
        Ok(())
    }

    /// Detach a node from its parent. The node and its subtree stay alive and
    /// may be re-inserted.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(node.0).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != node);
        self.nodes[node.0].parent = None;
    }

    // ---- structure -------------------------------------------------------

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node.0)?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    /// Parent if it is an element; `<html>` has none.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// 1-based position among element siblings.
    pub fn element_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.element_children(parent)
            .iter()
            .position(|&c| c == node)
            .map(|i| i + 1)
    }

    /// Ancestor elements from the parent outwards.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent_element(node);
        while let Some(current) = cursor {
            out.push(current);
            cursor = self.parent_element(current);
        }
        out
    }

    /// Inclusive containment, like DOM `Node.contains`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len() && self.contains(self.root, node)
    }

    /// Number of element ancestors.
    pub fn depth(&self, node: NodeId) -> usize {
        self.ancestors(node).len()
    }

    /// Maximum element depth in the connected tree.
    pub fn max_depth(&self) -> usize {
        self.descendants(self.root)
            .into_iter()
            .map(|n| self.depth(n) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Descendant elements of `node` in document order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.is_element(current) {
                out.push(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    // ---- attributes ------------------------------------------------------

    pub fn attrs(&self, node: NodeId) -> &[(String, String)] {
        self.element(node).map(|el| el.attrs.as_slice()).unwrap_or(&[])
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    /// Set an attribute, keeping its position if it already exists. Silently
    /// ignored on non-element nodes.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        match el.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.attrs.push((name, value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element_mut(node) {
            el.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
    }

    /// Class list in source order, deduplicated.
    pub fn classes(&self, node: NodeId) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for class in self.attr(node, "class").unwrap_or("").split_ascii_whitespace() {
            if !out.contains(&class) {
                out.push(class);
            }
        }
        out
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }

    // ---- text ------------------------------------------------------------

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        if let NodeKind::Text(text) = &n.kind {
            out.push_str(text);
        }
        for &child in &n.children {
            self.collect_text(child, out);
        }
    }

    /// Serialize a subtree back to HTML.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        match &n.kind {
            NodeKind::Document => {
                for &child in &n.children {
                    self.write_html(child, out);
                }
            }
            NodeKind::Text(text) => out.push_str(&escape_html(text, false)),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_html(value, true));
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&el.tag) {
                    return;
                }
                for &child in &n.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    // ---- layout ----------------------------------------------------------

    pub fn layout(&self, node: NodeId) -> Option<&Layout> {
        self.element(node).map(|el| &el.layout)
    }

    pub fn set_layout(&mut self, node: NodeId, layout: Layout) {
        if let Some(el) = self.element_mut(node) {
            el.layout = layout;
        }
    }

    pub fn client_rects(&self, node: NodeId) -> &[Rect] {
        self.layout(node).map(|l| l.rects.as_slice()).unwrap_or(&[])
    }

    pub fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        let mut rects = self.client_rects(node).iter();
        let first = *rects.next()?;
        Some(rects.fold(first, |acc, r| acc.union(r)))
    }

    /// Rendered width/height: the scroll size when known, otherwise the
    /// bounding box of the client rects.
    pub fn rendered_size(&self, node: NodeId) -> (f64, f64) {
        if let Some(size) = self.layout(node).and_then(|l| l.scroll_size) {
            return size;
        }
        self.bounding_rect(node)
            .map(|r| (r.width, r.height))
            .unwrap_or((0.0, 0.0))
    }

    pub fn z_index(&self, node: NodeId) -> Option<i32> {
        self.layout(node).and_then(|l| l.z_index)
    }

    /// Scrollable height of the page: the taller of `<html>` and `<body>`.
    pub fn scroll_height(&self) -> f64 {
        [self.document_element(), self.body()]
            .into_iter()
            .flatten()
            .map(|n| self.rendered_size(n).1)
            .fold(0.0, f64::max)
    }

    pub fn scroll_offset(&self) -> (f64, f64) {
        self.scroll
    }

    pub fn set_scroll_offset(&mut self, x: f64, y: f64) {
        self.scroll = (x, y);
    }

    pub fn viewport(&self) -> Rect {
        Rect::new(0.0, 0.0, self.viewport.0, self.viewport.1)
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
    }
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "source" | "track" | "wbr"
    )
}

fn escape_html(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
