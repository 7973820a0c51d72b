use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `page-grounding.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingConfig {
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default)]
    pub records: RecordConfig,
    #[serde(default)]
    pub content: ContentConfig,

    /// Selector enumerating interactive candidates
    #[serde(default = "default_interactive_selector")]
    pub interactive_selector: String,

    /// Upper bound for `wait_stable` in milliseconds
    #[serde(default = "default_stability_timeout")]
    pub stability_timeout_ms: u64,

    /// Candidate budget for the unique selector finder
    #[serde(default = "default_finder_tries")]
    pub max_finder_tries: usize,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            markers: MarkerConfig::default(),
            records: RecordConfig::default(),
            content: ContentConfig::default(),
            interactive_selector: default_interactive_selector(),
            stability_timeout_ms: default_stability_timeout(),
            max_finder_tries: default_finder_tries(),
        }
    }
}

/// Names used on the page for ids and overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    #[serde(default = "default_marker_attr")]
    pub marker_attr: String,

    #[serde(default = "default_overlay_class")]
    pub overlay_class: String,

    #[serde(default = "default_style_id")]
    pub style_id: String,

    #[serde(default = "default_mask_id")]
    pub mask_id: String,

    /// Outward padding of each marker box, in CSS pixels
    #[serde(default = "default_padding")]
    pub padding: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            marker_attr: default_marker_attr(),
            overlay_class: default_overlay_class(),
            style_id: default_style_id(),
            mask_id: default_mask_id(),
            padding: default_padding(),
        }
    }
}

/// Shape of the records sent to the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Attribute names matching this regex are copied into records
    #[serde(default = "default_attrs_to_keep")]
    pub attrs_to_keep: String,

    #[serde(default = "default_href_max_len")]
    pub href_max_len: usize,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            attrs_to_keep: default_attrs_to_keep(),
            href_max_len: default_href_max_len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Children with more text than this count as substantive
    #[serde(default = "default_text_threshold")]
    pub text_threshold: usize,

    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            text_threshold: default_text_threshold(),
            top_n: default_top_n(),
        }
    }
}

// Serde default helpers
fn default_marker_attr() -> String { "data-marker-id".to_string() }
fn default_overlay_class() -> String { "lc-marker".to_string() }
fn default_style_id() -> String { "lc-style".to_string() }
fn default_mask_id() -> String { "lc-mask".to_string() }
fn default_padding() -> f64 { 2.0 }
fn default_href_max_len() -> usize { 100 }
fn default_text_threshold() -> usize { 20 }
fn default_top_n() -> usize { 3 }
fn default_stability_timeout() -> u64 { 3000 }
fn default_finder_tries() -> usize { 10_000 }

fn default_interactive_selector() -> String {
    [
        "a[href]",
        "button",
        "input:not([type=\"hidden\"])",
        "select",
        "textarea",
        "summary",
        "[role=\"button\"]",
        "[role=\"link\"]",
        "[role=\"checkbox\"]",
        "[role=\"radio\"]",
        "[role=\"tab\"]",
        "[role=\"menuitem\"]",
        "[role=\"option\"]",
        "[role=\"switch\"]",
        "[role=\"textbox\"]",
        "[role=\"combobox\"]",
        "[contenteditable=\"true\"]",
        "[contenteditable=\"\"]",
    ]
    .join(", ")
}

fn default_attrs_to_keep() -> String {
    "^(type|name|placeholder|title|alt|href|for|min|max|step|pattern|maxlength|minlength|\
     required|readonly|disabled|selected|multiple|contenteditable|aria-[a-z-]+)$"
        .to_string()
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing or
/// malformed.
pub fn load_config(path: Option<&str>) -> GroundingConfig {
    let config_path = path.unwrap_or("page-grounding.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "malformed config, using defaults");
            GroundingConfig::default()
        }),
        Err(_) => GroundingConfig::default(),
    }
}

pub fn parse_config(yaml: &str) -> Result<GroundingConfig, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(GroundingConfig::default());
    }
    serde_yaml::from_str(yaml)
}
