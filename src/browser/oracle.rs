use crate::dom::document::{Document, NodeId};

// ============================================================================
// AccessibilityOracle trait
// ============================================================================

/// Accessibility facts about an element: role, accessible name and
/// description, and whether the element is disabled or hidden from
/// assistive technology.
pub trait AccessibilityOracle: Send + Sync {
    fn role(&self, doc: &Document, el: NodeId) -> Option<String>;
    fn accessible_name(&self, doc: &Document, el: NodeId) -> String;
    fn accessible_description(&self, doc: &Document, el: NodeId) -> String;
    fn is_disabled(&self, doc: &Document, el: NodeId) -> bool;
    fn is_inaccessible(&self, doc: &Document, el: NodeId) -> bool;
}

// ============================================================================
// BasicAccessibilityOracle: attribute and markup driven
// ============================================================================

/// Attribute-driven approximation of the accessible name and role
/// computation. Good enough for offline documents; a live browser should
/// plug in its own accessibility tree.
pub struct BasicAccessibilityOracle;

impl AccessibilityOracle for BasicAccessibilityOracle {
    fn role(&self, doc: &Document, el: NodeId) -> Option<String> {
        if let Some(explicit) = doc.attr(el, "role") {
            if let Some(first) = explicit.split_whitespace().next() {
                return Some(first.to_string());
            }
        }
        implicit_role(doc, el).map(str::to_string)
    }

    fn accessible_name(&self, doc: &Document, el: NodeId) -> String {
        if let Some(ids) = doc.attr(el, "aria-labelledby") {
            let labelled = referenced_text(doc, ids);
            if !labelled.is_empty() {
                return labelled;
            }
        }

        if let Some(label) = non_empty(doc.attr(el, "aria-label")) {
            return label;
        }

        let tag = doc.tag_name(el).unwrap_or("");

        if matches!(tag, "input" | "select" | "textarea") {
            if let Some(label) = label_for(doc, el) {
                return label;
            }
            let input_type = doc.attr(el, "type").unwrap_or("text");
            if tag == "input" && matches!(input_type, "submit" | "button" | "reset") {
                if let Some(value) = non_empty(doc.attr(el, "value")) {
                    return value;
                }
            }
        }

        if tag == "img" || (tag == "input" && doc.attr(el, "type") == Some("image")) {
            if let Some(alt) = non_empty(doc.attr(el, "alt")) {
                return alt;
            }
        }

        let role = self.role(doc, el);
        if role.as_deref().is_some_and(name_from_content) {
            let text = collapse_whitespace(&doc.text_content(el));
            if !text.is_empty() {
                return text;
            }
        }

        non_empty(doc.attr(el, "title"))
            .or_else(|| non_empty(doc.attr(el, "placeholder")))
            .unwrap_or_default()
    }

    fn accessible_description(&self, doc: &Document, el: NodeId) -> String {
        if let Some(ids) = doc.attr(el, "aria-describedby") {
            let described = referenced_text(doc, ids);
            if !described.is_empty() {
                return described;
            }
        }

        if let Some(description) = non_empty(doc.attr(el, "aria-description")) {
            return description;
        }

        match non_empty(doc.attr(el, "title")) {
            Some(title) if title != self.accessible_name(doc, el) => title,
            _ => String::new(),
        }
    }

    fn is_disabled(&self, doc: &Document, el: NodeId) -> bool {
        if doc.attr(el, "aria-disabled") == Some("true") {
            return true;
        }
        let tag = doc.tag_name(el).unwrap_or("");
        if !is_form_control(tag) {
            return false;
        }
        if doc.has_attr(el, "disabled") {
            return true;
        }
        doc.ancestors(el)
            .into_iter()
            .any(|a| doc.tag_name(a) == Some("fieldset") && doc.has_attr(a, "disabled"))
    }

    fn is_inaccessible(&self, doc: &Document, el: NodeId) -> bool {
        std::iter::once(el).chain(doc.ancestors(el)).any(|node| {
            doc.has_attr(node, "hidden")
                || doc.attr(node, "aria-hidden") == Some("true")
                || matches!(doc.tag_name(node), Some("template"))
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn implicit_role(doc: &Document, el: NodeId) -> Option<&'static str> {
    let tag = doc.tag_name(el)?;
    let role = match tag {
        "a" | "area" if doc.has_attr(el, "href") => "link",
        "button" => "button",
        "input" => match doc.attr(el, "type").unwrap_or("text") {
            "checkbox" => "checkbox",
            "radio" => "radio",
            "submit" | "button" | "reset" | "image" => "button",
            "range" => "slider",
            "number" => "spinbutton",
            "search" => "searchbox",
            "hidden" => return None,
            _ => "textbox",
        },
        "select" => {
            let size = doc
                .attr(el, "size")
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(0);
            if doc.has_attr(el, "multiple") || size > 1 {
                "listbox"
            } else {
                "combobox"
            }
        }
        "textarea" => "textbox",
        "option" => "option",
        "img" if doc.attr(el, "alt") == Some("") => "presentation",
        "img" => "img",
        "ul" | "ol" => "list",
        "li" => "listitem",
        "nav" => "navigation",
        "main" => "main",
        "header" => "banner",
        "footer" => "contentinfo",
        "aside" => "complementary",
        "form" => "form",
        "dialog" => "dialog",
        "table" => "table",
        "tr" => "row",
        "td" => "cell",
        "th" => "columnheader",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "article" => "article",
        "hr" => "separator",
        _ => return None,
    };
    Some(role)
}

fn name_from_content(role: &str) -> bool {
    matches!(
        role,
        "button"
            | "link"
            | "heading"
            | "option"
            | "menuitem"
            | "tab"
            | "checkbox"
            | "radio"
            | "switch"
            | "cell"
            | "columnheader"
            | "row"
            | "listitem"
            | "treeitem"
            | "tooltip"
    )
}

fn is_form_control(tag: &str) -> bool {
    matches!(
        tag,
        "button" | "input" | "select" | "textarea" | "optgroup" | "option" | "fieldset"
    )
}

fn label_for(doc: &Document, el: NodeId) -> Option<String> {
    if let Some(label) = doc
        .ancestors(el)
        .into_iter()
        .find(|&a| doc.tag_name(a) == Some("label"))
    {
        let text = collapse_whitespace(&doc.text_content(label));
        if !text.is_empty() {
            return Some(text);
        }
    }

    let id = doc.attr(el, "id")?;
    doc.descendants(doc.root())
        .into_iter()
        .find(|&n| doc.tag_name(n) == Some("label") && doc.attr(n, "for") == Some(id))
        .map(|label| collapse_whitespace(&doc.text_content(label)))
        .filter(|text| !text.is_empty())
}

fn referenced_text(doc: &Document, ids: &str) -> String {
    let all = doc.descendants(doc.root());
    let parts: Vec<String> = ids
        .split_whitespace()
        .filter_map(|id| all.iter().copied().find(|&n| doc.attr(n, "id") == Some(id)))
        .map(|n| collapse_whitespace(&doc.text_content(n)))
        .filter(|text| !text.is_empty())
        .collect();
    parts.join(" ")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(collapse_whitespace)
        .filter(|v| !v.is_empty())
}

/// Trim and collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
