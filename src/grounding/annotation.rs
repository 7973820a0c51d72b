use tracing::{debug, trace};

use crate::config::config::MarkerConfig;
use crate::dom::document::{Document, Layout, NodeId, Rect};
use crate::error::{GroundingError, Result};
use crate::grounding::colors::{ColorSource, MarkerStyle};

/// Visual overlay drawn over grounded elements: one labelled box per client
/// rect, a shared stylesheet and an optional dimming mask.
#[derive(Debug, Clone)]
pub struct AnnotationOverlay {
    marker_attr: String,
    overlay_class: String,
    style_id: String,
    mask_id: String,
    padding: f64,
}

impl AnnotationOverlay {
    pub fn new(config: &MarkerConfig) -> Self {
        Self {
            marker_attr: config.marker_attr.clone(),
            overlay_class: config.overlay_class.clone(),
            style_id: config.style_id.clone(),
            mask_id: config.mask_id.clone(),
            padding: config.padding,
        }
    }

    pub fn overlay_class(&self) -> &str {
        &self.overlay_class
    }

    fn stylesheet(&self) -> String {
        let class = &self.overlay_class;
        format!(
            ".{class} {{ position: absolute; border: 2px solid var(--bg-color); pointer-events: none; \
             box-sizing: border-box; z-index: 1073741825; opacity: 0.9; }}\n\
             .{class}::before {{ content: attr(data-element-id); position: absolute; top: 0; left: 0; \
             padding: 0px 1px; color: var(--text-color); background-color: var(--bg-color); font-size: 8px; }}\n\
             .{class}::after {{ content: ''; position: absolute; top: 0; left: 0; width: 100%; height: 100%; \
             background-color: var(--bg-color); opacity: 0.15; }}"
        )
    }

    fn find_by_id(&self, doc: &Document, tag: &str, id: &str) -> Option<NodeId> {
        doc.descendants(doc.root())
            .into_iter()
            .find(|&n| doc.tag_name(n) == Some(tag) && doc.attr(n, "id") == Some(id))
    }

    /// Insert the overlay stylesheet once per document.
    pub fn ensure_style(&self, doc: &mut Document) -> Result<NodeId> {
        if let Some(existing) = self.find_by_id(doc, "style", &self.style_id) {
            return Ok(existing);
        }

        let host = doc
            .head()
            .or_else(|| doc.document_element())
            .ok_or_else(|| GroundingError::Hierarchy("document has no element to hold the stylesheet".into()))?;

        let style = doc.create_element("style");
        doc.set_attr(style, "id", &self.style_id);
        let text = doc.create_text(&self.stylesheet());
        doc.append_child(style, text)?;
        doc.append_child(host, style)?;
        Ok(style)
    }

    fn overlay_host(&self, doc: &Document) -> Result<NodeId> {
        doc.body()
            .or_else(|| doc.document_element())
            .ok_or_else(|| GroundingError::Hierarchy("document has no body to hold overlays".into()))
    }

    /// Box every non-empty client rect of `el`, labelled with `id`. Returns
    /// how many boxes were drawn.
    pub fn mark(&self, doc: &mut Document, el: NodeId, id: &str, style: &MarkerStyle) -> Result<usize> {
        self.ensure_style(doc)?;
        let host = self.overlay_host(doc)?;

        let (scroll_x, scroll_y) = doc.scroll_offset();
        let z_index = stacking_z_index(doc, el);
        let rects: Vec<Rect> = doc.client_rects(el).iter().copied().filter(|r| !r.is_empty()).collect();

        doc.set_attr(el, &self.marker_attr, id);

        let pad = self.padding;
        for rect in &rects {
            let boxed = Rect::new(
                scroll_x + rect.x - pad,
                scroll_y + rect.y - pad,
                rect.width + 2.0 * pad,
                rect.height + 2.0 * pad,
            );
            let z = z_index.map_or_else(|| "auto".to_string(), |z| z.to_string());
            let css = format!(
                "top: {}px; left: {}px; width: {}px; height: {}px; z-index: {z}; --bg-color: {}; --text-color: {};",
                boxed.y, boxed.x, boxed.width, boxed.height, style.bg_color, style.text_color
            );

            let marker = doc.create_element("div");
            doc.set_attr(marker, "class", &self.overlay_class);
            doc.set_attr(marker, "data-element-id", id);
            doc.set_attr(marker, "style", &css);
            doc.set_layout(
                marker,
                Layout {
                    rects: vec![boxed],
                    scroll_size: None,
                    z_index,
                },
            );
            doc.append_child(host, marker)?;
        }

        trace!(id, boxes = rects.len(), "marked element");
        Ok(rects.len())
    }

    /// Mark each `(element, id)` pair with its own colour.
    pub fn annotate(
        &self,
        doc: &mut Document,
        elements: &[(NodeId, String)],
        page_brightness: f64,
        colors: &mut dyn ColorSource,
    ) -> Result<usize> {
        let mut boxes = 0;
        for (el, id) in elements {
            let style = MarkerStyle::contrasting(colors.next_color(page_brightness), page_brightness);
            boxes += self.mark(doc, *el, id, &style)?;
        }
        debug!(elements = elements.len(), boxes, "annotated page");
        Ok(boxes)
    }

    /// Viewport-sized mask with a hole over each client rect of `elements`.
    /// Replaces any previous mask.
    pub fn add_mask(&self, doc: &mut Document, elements: &[NodeId]) -> Result<NodeId> {
        if let Some(old) = self.find_by_id(doc, "canvas", &self.mask_id) {
            doc.remove(old);
        }
        let host = self.overlay_host(doc)?;
        let viewport = doc.viewport();

        let holes: Vec<String> = elements
            .iter()
            .flat_map(|&el| doc.client_rects(el).to_vec())
            .map(|r| format!("{},{},{},{}", r.x, r.y, r.width, r.height))
            .collect();

        let mask = doc.create_element("canvas");
        doc.set_attr(mask, "id", &self.mask_id);
        doc.set_attr(mask, "width", &viewport.width.to_string());
        doc.set_attr(mask, "height", &viewport.height.to_string());
        doc.set_attr(mask, "data-holes", &holes.join(";"));
        doc.set_layout(
            mask,
            Layout {
                rects: vec![viewport],
                ..Layout::default()
            },
        );
        doc.append_child(host, mask)?;
        Ok(mask)
    }

    /// Overlay boxes currently attached to the document.
    pub fn markers(&self, doc: &Document) -> Vec<NodeId> {
        doc.descendants(doc.root())
            .into_iter()
            .filter(|&n| doc.tag_name(n) == Some("div") && doc.has_class(n, &self.overlay_class))
            .collect()
    }

    /// Remove the mask, every overlay box and every marker attribute. Safe to
    /// call on a clean document.
    pub fn clear(&self, doc: &mut Document) {
        if let Some(mask) = self.find_by_id(doc, "canvas", &self.mask_id) {
            doc.remove(mask);
        }

        let markers = self.markers(doc);
        for marker in &markers {
            doc.remove(*marker);
        }

        let marked: Vec<NodeId> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|&n| doc.has_attr(n, &self.marker_attr))
            .collect();
        for el in &marked {
            doc.remove_attr(*el, &self.marker_attr);
        }

        if !markers.is_empty() || !marked.is_empty() {
            debug!(boxes = markers.len(), marked = marked.len(), "cleared annotations");
        }
    }
}

/// Highest z-index on `el` or its ancestors below `<body>`; `None` reads as
/// `auto`.
pub fn stacking_z_index(doc: &Document, el: NodeId) -> Option<i32> {
    let body = doc.body();
    std::iter::once(el)
        .chain(doc.ancestors(el))
        .take_while(|&n| Some(n) != body)
        .filter_map(|n| doc.z_index(n))
        .max()
}
