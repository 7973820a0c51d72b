use std::sync::Arc;

use page_grounding::dom::document::{Document, NodeId};
use page_grounding::grounding::finder::{is_unique, FinderOptions, MinimalSelectorFinder, UniqueSelector};
use page_grounding::grounding::selector::{
    closest_element, common_ancestor, is_child_of, outermost_selector, query_ancestor, SelectorSynthesizer,
};

use crate::common::pages::{list_page, Page};
use crate::common::utils::{load_fixture, strictly_contains};

mod common;

fn synthesizer() -> SelectorSynthesizer {
    SelectorSynthesizer::new(Arc::new(MinimalSelectorFinder::default()), "data-marker-id")
}

// =========================================================================
// Unique selectors
// =========================================================================

#[test]
fn unique_selector_round_trips_for_every_element() {
    let fixture = list_page();
    let doc = &fixture.page.doc;
    let synth = synthesizer();

    for el in doc.descendants(doc.root()) {
        let selector = synth.unique_selector(doc, el).expect("every element gets a selector");
        assert_eq!(
            doc.query_selector_all(&selector).unwrap(),
            vec![el],
            "selector {selector} must match exactly its element"
        );
    }
}

#[test]
fn unique_selector_round_trips_on_a_dumped_page() {
    let doc = load_fixture("product_grid.json");
    let synth = synthesizer();

    for el in doc.descendants(doc.root()) {
        let selector = synth.unique_selector(&doc, el).unwrap();
        assert!(is_unique(&doc, doc.root(), &selector, el), "{selector} is not unique");
    }
}

#[test]
fn finder_prefers_short_selectors() {
    let fixture = list_page();
    let doc = &fixture.page.doc;
    let synth = synthesizer();

    assert_eq!(synth.unique_selector(doc, fixture.list).as_deref(), Some("ul"));
    assert_eq!(synth.unique_selector(doc, fixture.items[1]).as_deref(), Some("li:nth-child(2)"));
    assert_eq!(
        synth.unique_selector(doc, fixture.links[2]).as_deref(),
        Some("li:nth-child(3) > a")
    );
}

#[test]
fn finder_uses_ids_unless_told_not_to() {
    let mut page = Page::new();
    let body = page.body;
    let main = page.el(body, "div", &[("id", "main")]);
    page.el(body, "div", &[]);
    let finder = MinimalSelectorFinder::default();

    assert_eq!(
        finder.unique_selector(&page.doc, main, &FinderOptions::default()).as_deref(),
        Some("#main")
    );
    assert_eq!(
        finder
            .unique_selector(&page.doc, main, &FinderOptions::default().without_ids())
            .as_deref(),
        Some("div:nth-child(1)")
    );
}

#[test]
fn finder_checks_uniqueness_under_the_given_root() {
    let fixture = list_page();
    let doc = &fixture.page.doc;
    let finder = MinimalSelectorFinder::default();

    let selector = finder
        .unique_selector(doc, fixture.links[1], &FinderOptions::under(fixture.items[1]))
        .unwrap();
    assert_eq!(selector, "a");
    assert_eq!(doc.query_selector_from(fixture.items[1], &selector).unwrap(), Some(fixture.links[1]));

    assert_eq!(finder.unique_selector(doc, fixture.list, &FinderOptions::under(fixture.items[0])), None);
}

#[test]
fn exhausted_budget_falls_back_to_anchored_path() {
    let fixture = list_page();
    let doc = &fixture.page.doc;
    let finder = MinimalSelectorFinder::new(1);

    let selector = finder
        .unique_selector(doc, fixture.links[0], &FinderOptions::default())
        .unwrap();
    assert!(selector.starts_with("> html:nth-child(1) > body:nth-child(2)"), "{selector}");
    assert_eq!(doc.query_selector_all(&selector).unwrap(), vec![fixture.links[0]]);
}

struct FixedFinder;

impl UniqueSelector for FixedFinder {
    fn unique_selector(&self, _doc: &Document, _el: NodeId, _options: &FinderOptions) -> Option<String> {
        Some(".list".to_string())
    }
}

#[test]
fn synthesizer_delegates_to_the_injected_finder() {
    let fixture = list_page();
    let doc = &fixture.page.doc;
    let synth = SelectorSynthesizer::new(Arc::new(FixedFinder), "data-marker-id");

    assert_eq!(synth.unique_selector(doc, fixture.list).as_deref(), Some(".list"));
    let features = synth.common_items_and_ancestor(doc, &fixture.items[..1]).unwrap();
    assert_eq!(features.ancestor, ".list");
}

// =========================================================================
// Tree helpers
// =========================================================================

#[test]
fn common_ancestor_of_single_element_is_its_parent() {
    let fixture = list_page();
    let doc = &fixture.page.doc;

    assert_eq!(common_ancestor(doc, &[fixture.links[0]]), Some(fixture.items[0]));
    assert_eq!(common_ancestor(doc, &[fixture.links[0], fixture.links[2]]), Some(fixture.list));
    assert_eq!(common_ancestor(doc, &[fixture.items[1], fixture.links[1]]), Some(fixture.items[1]));
    assert_eq!(common_ancestor(doc, &[]), None);
}

#[test]
fn common_ancestor_of_disjoint_elements_is_none() {
    let mut fixture = list_page();
    let orphan = fixture.page.doc.create_element("div");
    let doc = &fixture.page.doc;

    assert_eq!(common_ancestor(doc, &[fixture.links[0], orphan]), None);
}

#[test]
fn ancestor_helpers() {
    let fixture = list_page();
    let doc = &fixture.page.doc;

    assert_eq!(query_ancestor(doc, fixture.links[0], "ul").unwrap(), Some(fixture.list));
    assert!(is_child_of(doc, fixture.links[0], ".list").unwrap());
    assert!(is_child_of(doc, fixture.list, ".list").unwrap());
    assert!(!is_child_of(doc, fixture.page.body, ".list").unwrap());
    assert_eq!(closest_element(doc, fixture.links[1], ".item").unwrap(), Some(fixture.items[1]));
    assert_eq!(closest_element(doc, fixture.page.body, ".item").unwrap(), Some(fixture.items[0]));
    assert!(query_ancestor(doc, fixture.links[0], "li +").is_err());
}

// =========================================================================
// Group selectors
// =========================================================================

#[test]
fn outermost_selector_drops_nested_matches() {
    let doc = load_fixture("nested_rows.json");
    let root = doc.root();

    assert_eq!(doc.query_selector_all(".row").unwrap().len(), 5);

    let tightened = outermost_selector(&doc, root, ".row").unwrap();
    assert_eq!(tightened, ".row:not(.row .row)");
    let outer = doc.query_selector_all(&tightened).unwrap();
    assert_eq!(outer.len(), 2);
    for &a in &outer {
        for &b in &outer {
            assert!(!strictly_contains(&doc, a, b));
        }
    }

    assert_eq!(outermost_selector(&doc, root, "span").unwrap(), "span");
}

#[test]
fn list_items_share_a_group_selector() {
    let fixture = list_page();
    let doc = &fixture.page.doc;
    let synth = synthesizer();

    for &item in &fixture.items {
        let features = synth.common_items_and_ancestor(doc, &[item]).unwrap();
        assert_eq!(doc.query_selector_all(&features.items).unwrap(), fixture.items);
        assert_eq!(doc.query_selector_all(&features.ancestor).unwrap(), vec![fixture.list]);
    }
}

#[test]
fn common_selector_over_nested_groups_is_outermost_only() {
    let doc = load_fixture("nested_rows.json");
    let synth = synthesizer();
    let outer = doc.query_selector_all("#outer-a, #outer-b").unwrap();

    let features = synth.common_items_and_ancestor(&doc, &outer).unwrap();
    let found = doc.query_selector_all(&features.items).unwrap();

    assert_eq!(found, outer);
    for &a in &found {
        for &b in &found {
            assert!(!strictly_contains(&doc, a, b), "{} nests results", features.items);
        }
    }
}

#[test]
fn classless_elements_fall_back_to_tag_paths() {
    let fixture = list_page();
    let doc = &fixture.page.doc;
    let synth = synthesizer();

    let direct = synth.common_selector(doc, fixture.items[0], &[fixture.links[0]]).unwrap();
    assert_eq!(direct, "> a");

    let nested = synth
        .common_selector(doc, fixture.list, &[fixture.links[0], fixture.links[2]])
        .unwrap();
    assert_eq!(nested, ".item > a");

    let features = synth
        .common_items_and_ancestor(doc, &[fixture.links[0], fixture.links[2]])
        .unwrap();
    let found = doc.query_selector_all(&features.items).unwrap();
    assert_eq!(found, fixture.links);
}

#[test]
fn marker_and_identity_attributes_never_describe_a_group() {
    let mut page = Page::new();
    let body = page.body;
    let list = page.el(body, "ul", &[]);
    let a = page.el(list, "li", &[("data-marker-id", "0"), ("data-kind", "row"), ("id", "x")]);
    let b = page.el(list, "li", &[("data-marker-id", "0"), ("data-kind", "row"), ("id", "x")]);
    let synth = synthesizer();

    let selector = synth.common_selector(&page.doc, list, &[a, b]).unwrap();
    assert_eq!(selector, "[data-kind=\"row\"]");
}

#[test]
fn mismatched_tags_without_shared_features_yield_none() {
    let mut page = Page::new();
    let body = page.body;
    let list = page.el(body, "div", &[]);
    let span = page.el(list, "span", &[]);
    let em = page.el(list, "em", &[]);
    let synth = synthesizer();

    assert_eq!(synth.common_selector(&page.doc, list, &[span, em]), None);

    let features = synth.common_items_and_ancestor(&page.doc, &[span, em]).unwrap();
    assert!(features.items.ends_with("> *"), "{}", features.items);
}

/// A grid of `div.card` siblings; `classes[i]` is the class list of card `i`.
fn card_grid(classes: &[&str]) -> (Page, NodeId, Vec<NodeId>) {
    let mut page = Page::new();
    let body = page.body;
    let grid = page.el(body, "div", &[("class", "grid")]);
    let cards = classes
        .iter()
        .map(|&class| page.el(grid, "div", &[("class", class)]))
        .collect();
    (page, grid, cards)
}

#[test]
fn extra_classes_are_kept_while_they_narrow_the_match() {
    let (page, grid, cards) = card_grid(&["card big", "card", "card big", "card"]);
    let synth = synthesizer();

    let selector = synth.common_selector(&page.doc, grid, &[cards[0], cards[2]]).unwrap();
    assert_eq!(selector, ".card.big");
    assert_eq!(page.doc.query_selector_all_from(grid, &selector).unwrap(), vec![cards[0], cards[2]]);
}

#[test]
fn trailing_classes_that_do_not_change_the_count_are_dropped() {
    let (page, grid, cards) = card_grid(&["card red big", "card big", "card red big", "card"]);
    let synth = synthesizer();

    let selector = synth.common_selector(&page.doc, grid, &[cards[0], cards[2]]).unwrap();
    assert_eq!(selector, ".card.red");
}

#[test]
fn redundant_classes_collapse_to_the_first_candidate() {
    let (page, grid, cards) = card_grid(&["card big", "card big", "card big"]);
    let synth = synthesizer();

    let selector = synth.common_selector(&page.doc, grid, &[cards[0], cards[1]]).unwrap();
    assert_eq!(selector, ".card");
}
