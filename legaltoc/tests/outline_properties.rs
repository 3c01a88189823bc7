use legaltoc::dom::{Document, NodeId};
use legaltoc::pipeline::build_document;
use legaltoc::toc::{build_table_of_contents, HeadingLevel, TocError};
use legaltoc::OutlineConfig;

fn items(doc: &Document, list: NodeId) -> Vec<NodeId> {
    doc.children(list)
        .iter()
        .copied()
        .filter(|&child| doc.tag_name(child) == Some("li"))
        .collect()
}

fn entry_text(doc: &Document, item: NodeId) -> String {
    doc.text_content(doc.first_child(item).unwrap())
}

fn sublist(doc: &Document, item: NodeId) -> Option<NodeId> {
    doc.children(item)
        .iter()
        .copied()
        .find(|&child| doc.tag_name(child) == Some("ul"))
}

#[test]
fn test_markdown_sections_are_numbered_in_order() {
    let built = build_document(
        "# Design\n\n## Scope\n\n## Overview\n\n### Context\n\n## Details\n",
        &OutlineConfig::default(),
    )
    .unwrap();
    let doc = &built.document;

    let top = items(doc, built.report.list);
    let texts: Vec<String> = top.iter().map(|&item| entry_text(doc, item)).collect();
    assert_eq!(texts, vec!["1. Scope", "2. Overview", "3. Details"]);

    let nested = items(doc, sublist(doc, top[1]).unwrap());
    assert_eq!(nested.len(), 1);
    assert_eq!(entry_text(doc, nested[0]), "2.1. Context");

    // h1 is not part of the outline and keeps its text
    let h1 = doc.elements_by_tag(doc.body(), "h1")[0];
    assert_eq!(doc.text_content(h1), "Design");
}

#[test]
fn test_document_without_headings_gets_empty_list() {
    let built = build_document("Just a paragraph.\n\n- and\n- a list\n", &OutlineConfig::default())
        .unwrap();
    let doc = &built.document;

    assert!(doc.children(built.report.list).is_empty());
    assert_eq!(doc.elements_by_tag(built.container, "ul"), vec![built.report.list]);
    assert!(doc.text_content(doc.body()).contains("Just a paragraph."));
}

#[test]
fn test_heading_without_id_links_nowhere() {
    let config = OutlineConfig {
        heading_ids: false,
        ..OutlineConfig::default()
    };
    let built = build_document("## Intro\n", &config).unwrap();
    let doc = &built.document;

    let link = doc.first_child(items(doc, built.report.list)[0]).unwrap();
    assert_eq!(doc.attribute(link, "href"), None);
    assert_eq!(doc.text_content(link), "1. Intro");
}

#[test]
fn test_second_pass_does_not_reset_prefixes() {
    let mut built = build_document("## Intro\n\n### Detail\n", &OutlineConfig::default()).unwrap();
    let body = built.document.body();
    let container = built.container;

    let again = build_table_of_contents(&mut built.document, container, body).unwrap();

    let doc = &built.document;
    let headings: Vec<String> = doc
        .children(body)
        .iter()
        .filter(|&&child| doc.tag_name(child).is_some_and(|tag| tag.starts_with('h')))
        .map(|&child| doc.text_content(child))
        .collect();
    assert_eq!(headings, vec!["1. 1. Intro", "1.1. 1.1. Detail"]);
    assert_eq!(again.numbered.len(), 2);
    assert_eq!(doc.elements_by_tag(container, "ul").len(), 4);
}

#[test]
fn test_orphan_h4_is_reported_and_later_headings_still_numbered() {
    let built = build_document(
        "## One\n\n#### Orphan\n\nText\n\n## Two\n\n### Two one\n\n#### Two one a\n",
        &OutlineConfig::default(),
    )
    .unwrap();

    assert_eq!(built.report.failures.len(), 1);
    let failure = &built.report.failures[0];
    assert_eq!(failure.level, HeadingLevel::H4);
    assert!(matches!(
        failure.error,
        TocError::MissingParentSection {
            parent: HeadingLevel::H3,
            ..
        }
    ));

    let labels: Vec<String> = built
        .report
        .numbered
        .iter()
        .map(|heading| heading.label.to_string())
        .collect();
    assert_eq!(labels, vec!["1", "2", "2.1", "2.1.1"]);
}

#[test]
fn test_three_levels_form_a_single_chain() {
    let built = build_document("## A\n\n### B\n\n#### C\n", &OutlineConfig::default()).unwrap();
    let doc = &built.document;

    assert_eq!(doc.elements_by_tag(built.container, "ul").len(), 3);
    let first = items(doc, built.report.list);
    let second = items(doc, sublist(doc, first[0]).unwrap());
    let third = items(doc, sublist(doc, second[0]).unwrap());
    assert_eq!((first.len(), second.len(), third.len()), (1, 1, 1));
    assert_eq!(entry_text(doc, third[0]), "1.1.1. C");
}
