use std::sync::Arc;

use page_grounding::browser::oracle::BasicAccessibilityOracle;
use page_grounding::grounding::contentful::ContentDensityRanker;

use crate::common::pages::{list_page, Page};
use crate::common::utils::load_fixture;

mod common;

fn ranker() -> ContentDensityRanker {
    ContentDensityRanker::new(Arc::new(BasicAccessibilityOracle), 20)
}

#[test]
fn list_container_ranks_first_with_its_item_tag() {
    let fixture = list_page();
    let ranked = ranker().most_contentful_elements(&fixture.page.doc, 3);

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].element, fixture.list);
    assert_eq!(ranked[0].tag_name.as_deref(), Some("li"));
    assert_eq!(ranked[0].count, 3);
}

#[test]
fn ranking_is_idempotent_on_an_unchanged_tree() {
    let doc = load_fixture("product_grid.json");
    let ranker = ranker();

    let first = ranker.most_contentful_elements(&doc, 3);
    let second = ranker.most_contentful_elements(&doc, 3);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn product_grid_ranks_cards_and_skips_short_navigation() {
    let doc = load_fixture("product_grid.json");
    let grid = doc.query_selector(".grid").unwrap().unwrap();
    let menu = doc.query_selector(".menu").unwrap().unwrap();

    let ranked = ranker().most_contentful_elements(&doc, 3);
    assert_eq!(ranked[0].element, grid);
    assert_eq!(ranked[0].tag_name.as_deref(), Some("article"));
    assert_eq!(ranked[0].count, 4);

    // Short link labels are not substantive on their own.
    assert!(!ranked.iter().any(|s| s.element == menu));
}

#[test]
fn container_dominates_a_weaker_nested_container() {
    let mut page = Page::new();
    let body = page.body;
    let outer = page.el(body, "div", &[("class", "outer")]);

    let mut sections = Vec::new();
    for i in 0..3 {
        let section = page.el(outer, "section", &[]);
        page.text(section, &format!("Section {i} has a paragraph of text inside it"));
        sections.push(section);
    }
    // Two substantive children nested under the first section.
    for i in 0..2 {
        let p = page.el(sections[0], "p", &[]);
        page.text(p, &format!("Nested paragraph {i} is also long enough"));
    }

    let ranked = ranker().most_contentful_elements(&page.doc, 5);
    let elements: Vec<_> = ranked.iter().map(|s| s.element).collect();

    assert!(elements.contains(&outer));
    assert!(!elements.contains(&sections[0]), "dominated by its ancestor");
}

#[test]
fn nested_container_with_more_repetition_dominates_its_ancestor() {
    let mut page = Page::new();
    let body = page.body;
    let outer = page.el(body, "div", &[]);
    let left = page.el(outer, "div", &[]);
    page.text(left, "Left column with a fairly long introduction");
    let right = page.el(outer, "div", &[]);

    for i in 0..5 {
        let row = page.el(right, "p", &[]);
        page.text(row, &format!("Row {i} carries enough text to count"));
    }

    let ranked = ranker().most_contentful_elements(&page.doc, 5);
    let elements: Vec<_> = ranked.iter().map(|s| s.element).collect();

    assert_eq!(ranked[0].element, right);
    assert_eq!(ranked[0].count, 5);
    assert!(!elements.contains(&outer));
}

#[test]
fn equal_scores_do_not_dominate_each_other() {
    let mut page = Page::new();
    let body = page.body;
    let outer = page.el(body, "div", &[]);
    let first = page.el(outer, "article", &[]);
    let second = page.el(outer, "article", &[]);
    for i in 0..2 {
        let p = page.el(first, "p", &[]);
        page.text(p, &format!("Paragraph {i} in the first article"));
    }
    page.text(second, "The second article has plenty of text");

    let ranked = ranker().most_contentful_elements(&page.doc, 5);
    let elements: Vec<_> = ranked.iter().map(|s| s.element).collect();

    assert!(elements.contains(&outer));
    assert!(elements.contains(&first));
}

#[test]
fn contentless_children_are_not_counted() {
    let mut page = Page::new();
    let body = page.body;
    let list = page.el(body, "ul", &[]);
    for (i, attrs) in [
        vec![],
        vec![("aria-hidden", "true")],
        vec![("hidden", "")],
    ]
    .iter()
    .enumerate()
    {
        let li = page.el(list, "li", attrs);
        page.text(li, &format!("List entry {i} with a long description"));
    }
    let zero_area = page.hidden(list, "li", &[]);
    page.text(zero_area, "Collapsed entry with a long description");

    let ranker = ranker();
    assert!(ranker.is_contentless(&page.doc, zero_area));
    assert!(ranker.is_contentless(&page.doc, page.body));

    let score = ranker.score(&page.doc, list);
    assert_eq!(score.count, 1);
    assert!(ranker.most_contentful_elements(&page.doc, 3).is_empty());
}

#[test]
fn links_and_images_count_regardless_of_text_length() {
    let mut page = Page::new();
    let body = page.body;
    let gallery = page.el(body, "div", &[]);
    for i in 0..3 {
        let figure = page.el(gallery, "figure", &[]);
        let src = format!("/p/{i}.jpg");
        page.el(figure, "img", &[("src", src.as_str())]);
    }
    let short = page.el(gallery, "figure", &[]);
    page.text(short, "tiny");

    let score = ranker().score(&page.doc, gallery);
    assert_eq!(score.tag_name.as_deref(), Some("figure"));
    assert_eq!(score.count, 3);
}

#[test]
fn top_n_limits_the_result() {
    let doc = load_fixture("product_grid.json");
    assert_eq!(ranker().most_contentful_elements(&doc, 1).len(), 1);
    assert!(ranker().most_contentful_elements(&doc, 0).is_empty());
}
