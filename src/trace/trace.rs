use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// One line of the grounding trace: what a session operation saw and did.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u64,

    pub operation: String,

    pub element_count: usize,
    pub added_ids: Vec<String>,

    pub target: Option<String>,
    pub outcome: Option<String>,
    pub page_brightness: Option<f64>,
}

impl TraceEvent {
    pub fn now(step: u64, operation: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            step,
            operation: operation.to_string(),
            element_count: 0,
            added_ids: vec![],
            target: None,
            outcome: None,
            page_brightness: None,
        }
    }

    pub fn with_elements(mut self, count: usize) -> Self {
        self.element_count = count;
        self
    }

    pub fn with_added_ids(mut self, ids: &[String]) -> Self {
        self.added_ids = ids.to_vec();
        self
    }

    pub fn with_target(mut self, id: impl ToString) -> Self {
        self.target = Some(id.to_string());
        self
    }

    pub fn with_outcome(mut self, outcome: impl ToString) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }

    pub fn with_brightness(mut self, brightness: f64) -> Self {
        self.page_brightness = Some(brightness);
        self
    }
}
