use page_grounding::dom::selector::{css_escape, parse_selector, Combinator, Pseudo, SelectorError};

use crate::common::pages::{list_page, Page};
use crate::common::utils::load_fixture;

mod common;

// =========================================================================
// Parser
// =========================================================================

#[test]
fn parses_compounds_and_combinators() {
    let list = parse_selector("ul.list > li.item a[href]").unwrap();
    assert_eq!(list.0.len(), 1);

    let complex = &list.0[0];
    assert!(!complex.scoped);
    assert_eq!(complex.parts.len(), 3);
    assert_eq!(complex.parts[0].compound.tag.as_deref(), Some("ul"));
    assert_eq!(complex.parts[0].compound.classes, vec!["list".to_string()]);
    assert_eq!(complex.parts[1].combinator, Some(Combinator::Child));
    assert_eq!(complex.parts[2].combinator, Some(Combinator::Descendant));
    assert_eq!(complex.parts[2].compound.attrs.len(), 1);
}

#[test]
fn parses_leading_child_combinator_as_scoped() {
    let list = parse_selector("> li:nth-child(2)").unwrap();
    let complex = &list.0[0];
    assert!(complex.scoped);
    assert_eq!(complex.parts[0].compound.pseudos, vec![Pseudo::NthChild(2)]);
}

#[test]
fn parses_not_with_complex_argument() {
    let list = parse_selector(".row:not(.row .row)").unwrap();
    match &list.0[0].parts[0].compound.pseudos[0] {
        Pseudo::Not(inner) => assert_eq!(inner.0[0].parts.len(), 2),
        other => panic!("expected :not, got {other:?}"),
    }
}

#[test]
fn rejects_malformed_and_unsupported_selectors() {
    assert_eq!(parse_selector("   "), Err(SelectorError::Empty));
    assert!(matches!(parse_selector("li >"), Err(SelectorError::UnexpectedEnd { .. })));
    assert!(matches!(parse_selector("a + b"), Err(SelectorError::Unsupported { .. })));
    assert!(matches!(parse_selector("a:hover"), Err(SelectorError::Unsupported { .. })));
    assert!(matches!(parse_selector("[href^=\"/x\"]"), Err(SelectorError::Unsupported { .. })));
    assert!(matches!(parse_selector("div!"), Err(SelectorError::Unexpected { found: '!', .. })));
}

#[test]
fn css_escape_handles_leading_digits_and_punctuation() {
    assert_eq!(css_escape("item"), "item");
    assert_eq!(css_escape("1st"), "\\31 st");
    assert_eq!(css_escape("-2x"), "-\\32 x");
    assert_eq!(css_escape("-"), "\\-");
    assert_eq!(css_escape("a:b.c"), "a\\:b\\.c");
    assert_eq!(css_escape("say \"hi\""), "say\\ \\\"hi\\\"");
}

#[test]
fn escaped_identifiers_round_trip_through_the_parser() {
    let mut page = Page::new();
    let body = page.body;
    let odd = page.el(body, "div", &[("class", "1st a:b"), ("data-key", "x \"y\"")]);

    let by_class = format!(".{}.{}", css_escape("1st"), css_escape("a:b"));
    assert_eq!(page.doc.query_selector_all(&by_class).unwrap(), vec![odd]);

    let by_attr = format!("[data-key=\"{}\"]", css_escape("x \"y\""));
    assert_eq!(page.doc.query_selector_all(&by_attr).unwrap(), vec![odd]);
}

// =========================================================================
// Matching
// =========================================================================

#[test]
fn query_returns_matches_in_document_order() {
    let fixture = list_page();
    let doc = &fixture.page.doc;

    assert_eq!(doc.query_selector_all("li.item").unwrap(), fixture.items);
    assert_eq!(doc.query_selector_all(".list a").unwrap(), fixture.links);
    assert_eq!(doc.query_selector_all("ul > a").unwrap(), vec![]);
    assert_eq!(doc.query_selector("a[href=\"/articles/2\"]").unwrap(), Some(fixture.links[1]));
    assert_eq!(doc.query_selector_all("li:nth-child(3)").unwrap(), vec![fixture.items[2]]);
    assert_eq!(doc.query_selector_all("li:not(:nth-child(1))").unwrap(), fixture.items[1..].to_vec());
}

#[test]
fn selector_lists_union_without_duplicates() {
    let fixture = list_page();
    let doc = &fixture.page.doc;

    let found = doc.query_selector_all("li, .item, ul").unwrap();
    let mut expected = vec![fixture.list];
    expected.extend(&fixture.items);
    assert_eq!(found, expected);
}

#[test]
fn scoped_selector_only_matches_direct_children_of_the_query_root() {
    let fixture = list_page();
    let doc = &fixture.page.doc;

    assert_eq!(doc.query_selector_all_from(fixture.list, "> li").unwrap(), fixture.items);
    assert_eq!(doc.query_selector_all_from(fixture.list, "> a").unwrap(), vec![]);
    assert_eq!(
        doc.query_selector_all_from(fixture.items[0], "> a").unwrap(),
        vec![fixture.links[0]]
    );
}

#[test]
fn scoped_queries_still_match_context_outside_the_root() {
    let fixture = list_page();
    let doc = &fixture.page.doc;

    // The `ul` ancestor lies outside the scope but still satisfies the chain.
    assert_eq!(
        doc.query_selector_all_from(fixture.items[1], "ul a").unwrap(),
        vec![fixture.links[1]]
    );
}

#[test]
fn closest_and_matches_follow_dom_semantics() {
    let fixture = list_page();
    let doc = &fixture.page.doc;

    assert_eq!(doc.closest(fixture.links[0], ".item").unwrap(), Some(fixture.items[0]));
    assert_eq!(doc.closest(fixture.links[0], "a").unwrap(), Some(fixture.links[0]));
    assert_eq!(doc.closest(fixture.links[0], "table").unwrap(), None);
    assert!(doc.matches(fixture.items[2], "ul > li").unwrap());
    assert!(!doc.matches(fixture.items[2], "ol > li").unwrap());
}

#[test]
fn attribute_names_match_case_insensitively() {
    let mut page = Page::new();
    let body = page.body;
    let button = page.el(body, "BUTTON", &[("Data-Test", "go")]);

    assert_eq!(page.doc.query_selector("button[data-test=\"go\"]").unwrap(), Some(button));
    assert_eq!(page.doc.query_selector("BUTTON").unwrap(), Some(button));
}

#[test]
fn document_from_json_dump_preserves_structure_and_layout() {
    let doc = load_fixture("product_grid.json");

    assert_eq!(doc.query_selector_all("article.card").unwrap().len(), 4);
    assert_eq!(doc.scroll_offset(), (0.0, 120.0));
    assert_eq!(doc.viewport().width, 1280.0);

    let card = doc.query_selector(".card").unwrap().unwrap();
    let rect = doc.bounding_rect(card).unwrap();
    assert_eq!((rect.width, rect.height), (600.0, 90.0));
    assert!(doc.text_content(card).contains("Product 1"));
}

#[test]
fn malformed_dump_is_a_snapshot_error() {
    let err = page_grounding::Document::from_json("{\"root\": 5}").unwrap_err();
    assert!(matches!(err, page_grounding::GroundingError::Snapshot(_)));
}
