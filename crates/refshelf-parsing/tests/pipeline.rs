//! End-to-end extraction tests: page text in, reference records out, and the
//! records fed to the library matcher.

use std::path::Path;

use refshelf_core::{
    BackendError, Creator, LibraryItem, MatchConfig, PageTextBackend, is_in_library,
    match_references,
};
use refshelf_parsing::{
    LocatorStrategy, ParsingError, ReferenceExtractor, SegmentationStrategy, extract_references,
};

const SCENARIO: &str = "... References\n[1] Smith, J. (2020). A Study of Widgets. Journal of Widgets, 12(3), 1-10. https://doi.org/10.1234/abcd ...";

struct MemoryBackend(Vec<String>);

impl PageTextBackend for MemoryBackend {
    fn page_texts(&self, _path: &Path) -> Result<Vec<String>, BackendError> {
        Ok(self.0.clone())
    }
}

struct FailingBackend;

impl PageTextBackend for FailingBackend {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, BackendError> {
        Err(BackendError::OpenError(path.display().to_string()))
    }
}

fn body_page(topic: &str) -> String {
    format!("Some discussion of {topic} that goes on for a while.\n").repeat(20)
}

#[test]
fn scenario_single_numbered_reference() {
    let result = ReferenceExtractor::new().extract_from_text(SCENARIO);

    assert_eq!(result.section.found_by(), Some(LocatorStrategy::Header));
    assert_eq!(result.references.len(), 1);

    let r = &result.references[0];
    assert_eq!(r.index, 1);
    assert_eq!(r.year.as_deref(), Some("2020"));
    assert_eq!(r.doi.as_deref(), Some("10.1234/abcd"));
    assert!(r.title.as_deref().unwrap().contains("Widgets"));
    assert!(r.authors.as_deref().unwrap().contains("Smith"));

    // A single reference is well under the default threshold of 5
    assert!(result.is_incomplete(5));
}

#[test]
fn multi_page_numbered_bibliography() {
    let pages = vec![
        body_page("widgets"),
        format!(
            "{}References\n[1] Smith, J. (2020). A Study of Widgets. Journal of Widgets, 12(3), 1-10.\n[2] Doe, A. and Roe, B. (2019). Gadgets in Practice. Gadget Review, 4, 5-9.",
            body_page("gadgets")
        ),
        "[3] Clark, E. (2018). On Sprockets. Proc. Sprocket Conf., 33-40.\n[4] Davis, G. (2017). Cogs Revisited. Cog Quarterly, 2, 1-3.\n[5] Evans, H. (2016). Levers at Scale. Lever Journal, 8, 10-20.".to_string(),
    ];

    let result = ReferenceExtractor::new().extract_from_pages(&pages);

    assert_eq!(result.strategy, Some(SegmentationStrategy::Numbered));
    let indices: Vec<usize> = result.references.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    assert_eq!(result.references[2].year.as_deref(), Some("2018"));
    assert_eq!(result.references[4].title.as_deref(), Some("Levers at Scale"));
    assert!(!result.is_incomplete(5));
}

#[test]
fn single_line_page_with_inline_header() {
    let refs: Vec<String> = (1..=10)
        .map(|i| {
            format!(
                "[{i}] Author{i}, J. ({}). Paper number {i} about widgets. Venue, 1-2.",
                2000 + i
            )
        })
        .collect();
    let page = format!(
        "{}References {}",
        "The body of the paper goes on at length. ".repeat(60),
        refs.join(" ")
    );

    let result = ReferenceExtractor::new().extract_from_pages(&[page]);

    assert_eq!(result.section.found_by(), Some(LocatorStrategy::Header));
    let indices: Vec<usize> = result.references.iter().map(|r| r.index).collect();
    assert_eq!(indices, (1..=10).collect::<Vec<_>>());
    assert_eq!(result.references[5].year.as_deref(), Some("2006"));
}

#[test]
fn author_year_bibliography_without_markers() {
    let text = "Bibliography\nAdams, B. (2001). Widgets and things. J. Widg. 3, 1-2.\nBrown, D. (2003). Gadgets in practice. Gadget Rev. 4, 5-6.\nClark, E. (2005). On sprockets. Sprocket Q. 7, 8-9.";

    let result = ReferenceExtractor::new().extract_from_text(text);

    assert_eq!(result.strategy, Some(SegmentationStrategy::AuthorParenYear));
    assert_eq!(result.references.len(), 3);
    let r = &result.references[1];
    assert_eq!(r.index, 2);
    assert_eq!(r.authors.as_deref(), Some("Brown, D."));
    assert_eq!(r.title.as_deref(), Some("Gadgets in practice"));
}

#[test]
fn segmentation_is_idempotent() {
    let extractor = ReferenceExtractor::new();
    assert_eq!(
        extractor.extract_from_text(SCENARIO),
        extractor.extract_from_text(SCENARIO)
    );
}

#[test]
fn emitted_references_respect_bounds() {
    let long_title = "Very ".repeat(80);
    let long_authors = "Longname, A., ".repeat(30);
    let text = format!(
        "References\n[1] {long_authors}(2020). {long_title}. Venue.\n[2] Ab (2021). Short authors case here.\n[3] No year in this one at all, sadly.\n[4] {}",
        "Filler words 2022 ".repeat(10)
    );

    let result = ReferenceExtractor::new().extract_from_text(&text);

    assert!(!result.references.is_empty());
    for r in &result.references {
        assert!(r.year.as_deref().is_some_and(|y| !y.is_empty()));
        assert!(r.text.chars().count() <= 500);
        assert!(r.title.as_ref().is_none_or(|t| t.chars().count() <= 200));
        assert!(r.authors.as_ref().is_none_or(|a| a.chars().count() <= 250));
    }
    let short = result.references.iter().find(|r| r.index == 2).unwrap();
    assert_eq!(short.authors, None);
    assert!(result.references.iter().all(|r| r.index != 3));
}

#[test]
fn empty_and_blank_input_yield_nothing() {
    let extractor = ReferenceExtractor::new();
    assert!(extractor.extract_from_text("").references.is_empty());
    let pages: Vec<&str> = vec!["", "  \n\t "];
    assert!(extractor.extract_from_pages(&pages).references.is_empty());
}

#[test]
fn extraction_through_backend() -> anyhow::Result<()> {
    let backend = MemoryBackend(vec![SCENARIO.to_string()]);
    let result = extract_references(Path::new("paper.pdf"), &backend)?;
    assert_eq!(result.references.len(), 1);
    Ok(())
}

#[test]
fn backend_errors_propagate() {
    let err = extract_references(Path::new("missing.pdf"), &FailingBackend).unwrap_err();
    assert!(matches!(err, ParsingError::Backend(BackendError::OpenError(_))));
}

#[test]
fn extracted_reference_matches_library_by_doi() {
    let result = ReferenceExtractor::new().extract_from_text(SCENARIO);
    let items = vec![
        LibraryItem {
            id: "unrelated".to_string(),
            title: Some("Cooking with Cast Iron".to_string()),
            date: Some("1999".to_string()),
            ..Default::default()
        },
        LibraryItem {
            id: "widgets".to_string(),
            title: Some("A Study of Widgets".to_string()),
            date: Some("2020-03-01".to_string()),
            doi: Some("10.1234/ABCD".to_string()),
            creators: vec![Creator::new("Jane", "Smith")],
        },
    ];

    let config = MatchConfig::default();
    let matches = match_references(&result.references, &items, &config);
    let found = &matches[&1];
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].item_id, "widgets");
    assert!(is_in_library(found, &config));
}
