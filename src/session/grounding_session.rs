use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::browser::actuator::{Actuator, DocumentActuator};
use crate::browser::classifier::{ElementClassifier, Scope, SelectorClassifier};
use crate::browser::oracle::{AccessibilityOracle, BasicAccessibilityOracle};
use crate::browser::sampler::{clamp_brightness, FixedBrightness, VisualSampler};
use crate::config::config::GroundingConfig;
use crate::dom::document::{Document, NodeId};
use crate::error::{GroundingError, Result};
use crate::grounding::anchor::expand_anchor_from;
use crate::grounding::annotation::AnnotationOverlay;
use crate::grounding::colors::{ColorSource, MarkerStyle, RandomColorSource};
use crate::grounding::contentful::{ContentDensityRanker, ContentScore};
use crate::grounding::finder::{MinimalSelectorFinder, UniqueSelector};
use crate::grounding::index::ElementIndex;
use crate::grounding::record::{ElementRecord, RecordBuilder};
use crate::grounding::selector::{ElementFeatures, SelectorSynthesizer};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

// ============================================================================
// Results
// ============================================================================

/// Result of one snapshot cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Grounded elements, each listed once; position `i` carries id `i`.
    pub elements: Vec<NodeId>,
    pub records: Vec<ElementRecord>,
    /// Ids of elements absent from the previous snapshot.
    pub added_ids: Vec<String>,
}

/// One marked child of a content-dense container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub group_id: usize,
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityOutcome {
    Settled,
    TimedOut,
}

// ============================================================================
// Builder
// ============================================================================

/// Collaborators default to the offline implementations: selector-driven
/// classification, attribute-driven accessibility, a light page and input
/// applied straight to the document.
pub struct GroundingSessionBuilder {
    config: GroundingConfig,
    oracle: Option<Arc<dyn AccessibilityOracle>>,
    classifier: Option<Box<dyn ElementClassifier>>,
    sampler: Option<Arc<dyn VisualSampler>>,
    actuator: Option<Arc<dyn Actuator>>,
    finder: Option<Arc<dyn UniqueSelector>>,
    colors: Option<Box<dyn ColorSource>>,
    tracer: Option<TraceLogger>,
}

impl GroundingSessionBuilder {
    pub fn oracle(mut self, oracle: Arc<dyn AccessibilityOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn classifier(mut self, classifier: Box<dyn ElementClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn sampler(mut self, sampler: Arc<dyn VisualSampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn actuator(mut self, actuator: Arc<dyn Actuator>) -> Self {
        self.actuator = Some(actuator);
        self
    }

    pub fn finder(mut self, finder: Arc<dyn UniqueSelector>) -> Self {
        self.finder = Some(finder);
        self
    }

    pub fn colors(mut self, colors: Box<dyn ColorSource>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn trace_to(mut self, tracer: TraceLogger) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Fails on an unparseable interactive selector or allow-list regex.
    pub fn build(self) -> Result<GroundingSession> {
        let config = self.config;

        let oracle = self.oracle.unwrap_or_else(|| Arc::new(BasicAccessibilityOracle));
        let classifier = match self.classifier {
            Some(c) => c,
            None => Box::new(SelectorClassifier::new(&config.interactive_selector)?),
        };
        let finder = self
            .finder
            .unwrap_or_else(|| Arc::new(MinimalSelectorFinder::new(config.max_finder_tries)));

        Ok(GroundingSession {
            index: ElementIndex::new(config.markers.marker_attr.clone()),
            overlay: AnnotationOverlay::new(&config.markers),
            synthesizer: SelectorSynthesizer::new(finder, config.markers.marker_attr.clone()),
            ranker: ContentDensityRanker::new(oracle.clone(), config.content.text_threshold),
            records: RecordBuilder::new(oracle, &config)?,
            classifier,
            sampler: self.sampler.unwrap_or_else(|| Arc::new(FixedBrightness(100.0))),
            actuator: self.actuator.unwrap_or_else(|| Arc::new(DocumentActuator)),
            colors: self.colors.unwrap_or_else(|| Box::new(RandomColorSource::new())),
            tracer: self.tracer,
            previous: Vec::new(),
            config,
        })
    }
}

// ============================================================================
// GroundingSession
// ============================================================================

/// Owns the id index and overlay state for one page. The document itself is
/// borrowed per call.
pub struct GroundingSession {
    config: GroundingConfig,
    index: ElementIndex,
    overlay: AnnotationOverlay,
    synthesizer: SelectorSynthesizer,
    ranker: ContentDensityRanker,
    records: RecordBuilder,
    classifier: Box<dyn ElementClassifier>,
    sampler: Arc<dyn VisualSampler>,
    actuator: Arc<dyn Actuator>,
    colors: Box<dyn ColorSource>,
    tracer: Option<TraceLogger>,
    /// Elements of the last snapshot, for `added_ids`.
    previous: Vec<NodeId>,
}

impl GroundingSession {
    pub fn builder(config: GroundingConfig) -> GroundingSessionBuilder {
        GroundingSessionBuilder {
            config,
            oracle: None,
            classifier: None,
            sampler: None,
            actuator: None,
            finder: None,
            colors: None,
            tracer: None,
        }
    }

    pub fn new(config: GroundingConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &GroundingConfig {
        &self.config
    }

    pub fn index(&self) -> &ElementIndex {
        &self.index
    }

    pub fn overlay(&self) -> &AnnotationOverlay {
        &self.overlay
    }

    pub fn synthesizer(&self) -> &SelectorSynthesizer {
        &self.synthesizer
    }

    fn trace(&self, operation: &str, fill: impl FnOnce(TraceEvent) -> TraceEvent) {
        if let Some(tracer) = &self.tracer {
            tracer.log(&fill(tracer.event(operation)));
        }
    }

    /// Classifier candidates with repeats dropped, first occurrence kept.
    fn candidates(&self, doc: &Document, scope: Scope) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.classifier
            .candidates(doc, scope)
            .into_iter()
            .filter(|el| seen.insert(*el))
            .collect()
    }

    async fn page_brightness(&self, screenshot: Option<&str>) -> f64 {
        clamp_brightness(self.sampler.brightness(screenshot).await)
    }

    // ---- snapshots -------------------------------------------------------

    /// Clear, enumerate, number and annotate the interactive elements.
    pub async fn snapshot(&mut self, doc: &mut Document, screenshot: Option<&str>, scope: Scope) -> Result<Snapshot> {
        self.clear(doc);

        let previous: HashSet<NodeId> = self.previous.iter().copied().collect();
        let elements = self.candidates(doc, scope);
        let brightness = self.page_brightness(screenshot).await;

        let records = self.index.assign(doc, &elements, &self.records);
        for (&el, record) in elements.iter().zip(&records) {
            let style = MarkerStyle::contrasting(self.colors.next_color(brightness), brightness);
            self.overlay.mark(doc, el, &record.id, &style)?;
        }

        let mut added_ids: Vec<String> = Vec::new();
        for (el, record) in elements.iter().zip(&records) {
            if !previous.contains(el) && !added_ids.contains(&record.id) {
                added_ids.push(record.id.clone());
            }
        }

        self.previous = elements.clone();

        info!(
            elements = elements.len(),
            added = added_ids.len(),
            brightness,
            ?scope,
            "snapshot taken"
        );
        self.trace("snapshot", |event| {
            event
                .with_elements(elements.len())
                .with_added_ids(&added_ids)
                .with_brightness(brightness)
        });

        Ok(Snapshot {
            elements,
            records,
            added_ids,
        })
    }

    /// Mark the repeated children of the most content-dense containers, one
    /// colour per container, with ids running across all groups.
    pub async fn contentful_snapshot(
        &mut self,
        doc: &mut Document,
        screenshot: Option<&str>,
        top_n: Option<usize>,
    ) -> Result<Vec<ContentItem>> {
        self.clear(doc);

        let brightness = self.page_brightness(screenshot).await;
        let top_n = top_n.unwrap_or(self.config.content.top_n);
        let ranked = self.ranker.most_contentful_elements(doc, top_n);

        let groups: Vec<Vec<NodeId>> = ranked
            .iter()
            .map(|score| {
                doc.element_children(score.element)
                    .into_iter()
                    .filter(|&child| {
                        score.tag_name.as_deref().is_some_and(|t| doc.tag_name(child) == Some(t))
                            && !self.ranker.is_contentless(doc, child)
                    })
                    .collect()
            })
            .collect();

        let members: Vec<NodeId> = groups.concat();
        let mut ids = self.index.mark_all(doc, &members).into_iter();

        let mut items = Vec::with_capacity(members.len());
        for (group_id, group) in groups.iter().enumerate() {
            let style = MarkerStyle::contrasting(self.colors.next_color(brightness), brightness);
            for &child in group {
                let Some(id) = ids.next() else {
                    break;
                };
                self.overlay.mark(doc, child, &id, &style)?;
                items.push(ContentItem {
                    id,
                    group_id,
                    html: doc.outer_html(child),
                });
            }
        }

        self.previous = members;

        info!(groups = groups.len(), items = items.len(), "contentful snapshot taken");
        self.trace("contentful_snapshot", |event| {
            event.with_elements(items.len()).with_brightness(brightness)
        });
        Ok(items)
    }

    /// Number and annotate the interactive elements without recording them as
    /// the previous snapshot. Returns how many boxes were drawn.
    pub async fn annotate(&mut self, doc: &mut Document, screenshot: Option<&str>, scope: Scope) -> Result<usize> {
        self.overlay.clear(doc);

        let elements = self.candidates(doc, scope);
        let brightness = self.page_brightness(screenshot).await;
        let ids = self.index.mark_all(doc, &elements);
        let pairs: Vec<(NodeId, String)> = elements.into_iter().zip(ids).collect();

        let boxes = self.overlay.annotate(doc, &pairs, brightness, self.colors.as_mut())?;
        self.trace("annotate", |event| {
            event.with_elements(pairs.len()).with_brightness(brightness)
        });
        Ok(boxes)
    }

    /// Dim everything except `elements`.
    pub fn add_mask(&self, doc: &mut Document, elements: &[NodeId]) -> Result<NodeId> {
        self.overlay.add_mask(doc, elements)
    }

    /// Remove overlays, the mask and every marker attribute.
    pub fn clear(&self, doc: &mut Document) {
        self.overlay.clear(doc);
    }

    // ---- structural queries ---------------------------------------------

    pub fn resolve(&self, doc: &Document, id: &str) -> Result<NodeId> {
        self.index.resolve(doc, id)
    }

    pub fn unique_selector(&self, doc: &Document, el: NodeId) -> Option<String> {
        self.synthesizer.unique_selector(doc, el)
    }

    pub fn common_items_and_ancestor(&self, doc: &Document, els: &[NodeId]) -> Option<ElementFeatures> {
        self.synthesizer.common_items_and_ancestor(doc, els)
    }

    pub fn expand_anchor_from(&self, doc: &Document, start: NodeId) -> Option<(NodeId, NodeId)> {
        expand_anchor_from(doc, &self.synthesizer, start)
    }

    pub fn most_contentful_elements(&self, doc: &Document, top_n: Option<usize>) -> Vec<ContentScore> {
        self.ranker
            .most_contentful_elements(doc, top_n.unwrap_or(self.config.content.top_n))
    }

    // ---- actuation -------------------------------------------------------

    pub async fn click(&self, doc: &mut Document, id: &str) -> Result<NodeId> {
        let node = self.index.resolve(doc, id)?;
        self.actuator.click(doc, node).await?;
        self.trace_action("click", id);
        Ok(node)
    }

    /// Type into an input, textarea or contenteditable host.
    pub async fn fill(&self, doc: &mut Document, id: &str, value: &str) -> Result<NodeId> {
        let (node, caps) = self.index.resolve_with_capabilities(doc, id)?;
        if caps.contenteditable {
            self.actuator.input_contenteditable(doc, node, value).await?;
        } else if caps.fillable {
            self.actuator.input(doc, node, value).await?;
        } else {
            return Err(unsupported(doc, "fill", node));
        }
        self.trace_action("fill", id);
        Ok(node)
    }

    pub async fn select(&self, doc: &mut Document, id: &str, value: &str) -> Result<NodeId> {
        let (node, caps) = self.index.resolve_with_capabilities(doc, id)?;
        if !caps.selectable {
            return Err(unsupported(doc, "select", node));
        }
        self.actuator.input(doc, node, value).await?;
        self.trace_action("select", id);
        Ok(node)
    }

    pub async fn enter(&self, doc: &mut Document, id: &str) -> Result<NodeId> {
        let (node, caps) = self.index.resolve_with_capabilities(doc, id)?;
        if !caps.enterable {
            return Err(unsupported(doc, "press enter", node));
        }
        self.actuator.enter(doc, node).await?;
        self.trace_action("enter", id);
        Ok(node)
    }

    fn trace_action(&self, operation: &str, id: &str) {
        debug!(operation, id, "action dispatched");
        self.trace(operation, |event| event.with_target(id).with_outcome("dispatched"));
    }

    /// Wait for the page to stop mutating, at most `timeout` (the configured
    /// default when `None`).
    pub async fn wait_stable(&self, timeout: Option<Duration>) -> StabilityOutcome {
        let limit = timeout.unwrap_or(Duration::from_millis(self.config.stability_timeout_ms));
        let outcome = match tokio::time::timeout(limit, self.actuator.dom_stable()).await {
            Ok(()) => StabilityOutcome::Settled,
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "page did not settle in time");
                StabilityOutcome::TimedOut
            }
        };
        self.trace("wait_stable", |event| event.with_outcome(format!("{outcome:?}")));
        outcome
    }

    // ---- scrolling -------------------------------------------------------

    /// The page is taller than the viewport.
    pub fn is_scrollable(&self, doc: &Document) -> bool {
        doc.scroll_height() > doc.viewport().height
    }

    /// Scroll down by one viewport height. Returns the new vertical offset.
    pub async fn scroll_page_down(&self, doc: &mut Document) -> Result<f64> {
        let step = doc.viewport().height;
        self.actuator.scroll_by(doc, 0.0, step).await?;

        let (_, y) = doc.scroll_offset();
        debug!(scroll_y = y, "scrolled one page down");
        self.trace("scroll_page_down", |event| event.with_outcome(y));
        Ok(y)
    }
}

fn unsupported(doc: &Document, operation: &str, node: NodeId) -> GroundingError {
    GroundingError::unsupported(operation, doc.tag_name(node).unwrap_or("unknown"))
}
