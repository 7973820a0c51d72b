use serde::Serialize;

use crate::dom::document::{Document, NodeId};

/// Closed classification of an element, computed once per snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    /// `<input>` of any type; `input_type` defaults to `text`.
    Input { input_type: String },
    TextArea,
    Select,
    ContentEditable,
    Other,
}

/// What an element can be asked to do beyond clicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    pub fillable: bool,
    pub selectable: bool,
    pub enterable: bool,
    pub contenteditable: bool,
}

pub fn classify(doc: &Document, el: NodeId) -> ElementKind {
    match doc.tag_name(el) {
        Some("input") => ElementKind::Input {
            input_type: doc
                .attr(el, "type")
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| "text".to_string()),
        },
        Some("textarea") => ElementKind::TextArea,
        Some("select") => ElementKind::Select,
        Some(_) if is_contenteditable(doc, el) => ElementKind::ContentEditable,
        _ => ElementKind::Other,
    }
}

impl ElementKind {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            ElementKind::Input { .. } | ElementKind::TextArea => Capabilities {
                fillable: true,
                selectable: false,
                enterable: true,
                contenteditable: false,
            },
            ElementKind::Select => Capabilities {
                fillable: false,
                selectable: true,
                enterable: false,
                contenteditable: false,
            },
            ElementKind::ContentEditable => Capabilities {
                fillable: true,
                selectable: false,
                enterable: false,
                contenteditable: true,
            },
            ElementKind::Other => Capabilities::default(),
        }
    }

    /// Input, textarea or select: carries a form value.
    pub fn is_form_component(&self) -> bool {
        matches!(
            self,
            ElementKind::Input { .. } | ElementKind::TextArea | ElementKind::Select
        )
    }

    pub fn is_checkable(&self) -> bool {
        matches!(self, ElementKind::Input { input_type } if input_type == "radio" || input_type == "checkbox")
    }

    pub fn is_password(&self) -> bool {
        matches!(self, ElementKind::Input { input_type } if input_type == "password")
    }
}

/// `contenteditable` is inherited; `false` on a nearer ancestor wins.
pub fn is_contenteditable(doc: &Document, el: NodeId) -> bool {
    std::iter::once(el)
        .chain(doc.ancestors(el))
        .find_map(|node| match doc.attr(node, "contenteditable") {
            Some(v) if v.eq_ignore_ascii_case("false") => Some(false),
            Some(v) if v.is_empty()
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("plaintext-only") =>
            {
                Some(true)
            }
            _ => None,
        })
        .unwrap_or(false)
}
