use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::browser::oracle::{collapse_whitespace, AccessibilityOracle};
use crate::config::config::GroundingConfig;
use crate::dom::document::{Document, NodeId};
use crate::error::{GroundingError, Result};
use crate::grounding::capability::{classify, ElementKind};

/// Attribute values keep their JSON type: `checked` is a boolean, markup
/// attributes are strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Serializable description of one grounded element, as handed to a
/// language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub id: String,
    pub tag: String,
    pub role: Option<String>,
    pub accessible_name: String,
    pub accessible_description: String,
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

// ============================================================================
// RecordBuilder
// ============================================================================

pub struct RecordBuilder {
    oracle: Arc<dyn AccessibilityOracle>,
    attrs_to_keep: Regex,
    href_max_len: usize,
    marker_attr: String,
}

impl RecordBuilder {
    pub fn new(oracle: Arc<dyn AccessibilityOracle>, config: &GroundingConfig) -> Result<Self> {
        let attrs_to_keep = Regex::new(&config.records.attrs_to_keep)
            .map_err(|e| GroundingError::Config(format!("attrs_to_keep: {e}")))?;
        Ok(Self {
            oracle,
            attrs_to_keep,
            href_max_len: config.records.href_max_len,
            marker_attr: config.markers.marker_attr.clone(),
        })
    }

    pub fn oracle(&self) -> &Arc<dyn AccessibilityOracle> {
        &self.oracle
    }

    pub fn record(&self, doc: &Document, el: NodeId) -> ElementRecord {
        let kind = classify(doc, el);
        let mut record = ElementRecord {
            id: doc.attr(el, &self.marker_attr).unwrap_or_default().to_string(),
            tag: doc.tag_name(el).unwrap_or_default().to_string(),
            role: self.oracle.role(doc, el),
            accessible_name: self.oracle.accessible_name(doc, el),
            accessible_description: self.oracle.accessible_description(doc, el),
            attributes: BTreeMap::new(),
            options: None,
        };

        if kind == ElementKind::Select {
            record.options = Some(
                doc.descendants(el)
                    .into_iter()
                    .filter(|&d| doc.tag_name(d) == Some("option"))
                    .map(|opt| option_value(doc, opt))
                    .collect(),
            );
        }

        if kind.is_checkable() {
            let checked = doc.element(el).is_some_and(|e| e.checked);
            record.attributes.insert("checked".into(), AttributeValue::Flag(checked));
        }

        for (name, value) in doc.attrs(el) {
            if self.attrs_to_keep.is_match(name) {
                record.attributes.insert(name.clone(), AttributeValue::Text(value.clone()));
            }
        }

        if kind.is_form_component() && !kind.is_password() {
            let value = form_value(doc, el, &kind);
            if !value.is_empty() {
                record.attributes.insert("value".into(), AttributeValue::Text(value));
            }
        }

        if let Some(href) = doc.attr(el, "href") {
            if href.chars().count() > self.href_max_len {
                if record.accessible_name.is_empty() && record.accessible_description.is_empty() {
                    let short: String = href.chars().take(self.href_max_len).collect();
                    record.attributes.insert("href".into(), AttributeValue::Text(short));
                } else {
                    record.attributes.remove("href");
                }
            }
        }

        record
    }
}

/// `value` attribute, else the option's collapsed text.
fn option_value(doc: &Document, opt: NodeId) -> String {
    match doc.attr(opt, "value") {
        Some(v) => v.to_string(),
        None => collapse_whitespace(&doc.text_content(opt)),
    }
}

/// Current form value: the live value when set, otherwise what the markup
/// implies.
fn form_value(doc: &Document, el: NodeId, kind: &ElementKind) -> String {
    if let Some(value) = doc.element(el).and_then(|e| e.value.clone()) {
        return value;
    }
    match kind {
        ElementKind::Input { .. } => doc.attr(el, "value").unwrap_or_default().to_string(),
        ElementKind::TextArea => doc.text_content(el),
        ElementKind::Select => {
            let options: Vec<NodeId> = doc
                .descendants(el)
                .into_iter()
                .filter(|&d| doc.tag_name(d) == Some("option"))
                .collect();
            options
                .iter()
                .find(|&&o| doc.has_attr(o, "selected"))
                .or_else(|| options.first())
                .map(|&o| option_value(doc, o))
                .unwrap_or_default()
        }
        _ => String::new(),
    }
}
