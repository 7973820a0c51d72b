use async_trait::async_trait;

use crate::dom::document::{Document, NodeId};
use crate::error::{GroundingError, Result};

// ============================================================================
// Actuator trait: input synthesis and mutation settling
// ============================================================================

/// Dispatches input to resolved elements. The grounding layer never
/// synthesizes events itself; it resolves ids, checks capabilities and hands
/// the element over.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn click(&self, doc: &mut Document, target: NodeId) -> Result<()>;

    /// Set the value of an input, textarea or select.
    async fn input(&self, doc: &mut Document, target: NodeId, value: &str) -> Result<()>;

    /// Replace the text of a contenteditable host.
    async fn input_contenteditable(&self, doc: &mut Document, target: NodeId, value: &str) -> Result<()>;

    async fn enter(&self, doc: &mut Document, target: NodeId) -> Result<()>;

    /// Scroll the page by `(dx, dy)` CSS pixels.
    async fn scroll_by(&self, doc: &mut Document, dx: f64, dy: f64) -> Result<()>;

    /// Resolves once the tree has stopped mutating. May never resolve on a
    /// page that keeps mutating; callers bound it with a timeout.
    async fn dom_stable(&self);
}

// ============================================================================
// DocumentActuator: applies input straight to the in-memory document
// ============================================================================

/// Actuator for offline documents: writes values and checked state into the
/// document model. The model never mutates on its own, so it is always
/// stable.
pub struct DocumentActuator;

#[async_trait]
impl Actuator for DocumentActuator {
    async fn click(&self, doc: &mut Document, target: NodeId) -> Result<()> {
        if !doc.is_element(target) {
            return Err(GroundingError::Actuation("click target is not an element".into()));
        }
        if doc.tag_name(target) != Some("input") {
            return Ok(());
        }

        let input_type = doc.attr(target, "type").unwrap_or("text").to_ascii_lowercase();
        match input_type.as_str() {
            "checkbox" => set_checked(doc, target, |checked| !checked),
            "radio" => {
                for other in radio_group(doc, target) {
                    set_checked(doc, other, |_| false);
                }
                set_checked(doc, target, |_| true);
            }
            _ => {}
        }
        Ok(())
    }

    async fn input(&self, doc: &mut Document, target: NodeId, value: &str) -> Result<()> {
        let Some(el) = doc.element_mut(target) else {
            return Err(GroundingError::Actuation("input target is not an element".into()));
        };
        el.value = Some(value.to_string());
        Ok(())
    }

    async fn input_contenteditable(&self, doc: &mut Document, target: NodeId, value: &str) -> Result<()> {
        for child in doc.children(target).to_vec() {
            doc.remove(child);
        }
        let text = doc.create_text(value);
        doc.append_child(target, text)
    }

    async fn enter(&self, _doc: &mut Document, _target: NodeId) -> Result<()> {
        Ok(())
    }

    /// Clamped to the scrollable area.
    async fn scroll_by(&self, doc: &mut Document, dx: f64, dy: f64) -> Result<()> {
        let (x, y) = doc.scroll_offset();
        let max_y = (doc.scroll_height() - doc.viewport().height).max(0.0);
        doc.set_scroll_offset((x + dx).max(0.0), (y + dy).clamp(0.0, max_y));
        Ok(())
    }

    async fn dom_stable(&self) {}
}

fn set_checked(doc: &mut Document, el: NodeId, update: impl FnOnce(bool) -> bool) {
    if let Some(data) = doc.element_mut(el) {
        data.checked = update(data.checked);
    }
}

/// Other radios sharing `radio`'s name and form owner.
fn radio_group(doc: &Document, radio: NodeId) -> Vec<NodeId> {
    let Some(name) = doc.attr(radio, "name").filter(|n| !n.is_empty()) else {
        return Vec::new();
    };
    let form_of = |n: NodeId| doc.closest(n, "form").ok().flatten();
    let owner = form_of(radio);

    doc.descendants(owner.unwrap_or(doc.root()))
        .into_iter()
        .filter(|&n| {
            n != radio
                && doc.tag_name(n) == Some("input")
                && doc.attr(n, "type").is_some_and(|t| t.eq_ignore_ascii_case("radio"))
                && doc.attr(n, "name") == Some(name)
                && form_of(n) == owner
        })
        .collect()
}
