//! Concurrent use of [`AnalysisSession`] and the matcher from several threads.

use std::sync::Arc;
use std::thread;

use refshelf_core::{
    AnalysisSession, Creator, LibraryItem, MatchConfig, ParsedReference, match_references,
};

fn library() -> Vec<LibraryItem> {
    vec![
        LibraryItem {
            id: "a".to_string(),
            title: Some("A Study of Widgets".to_string()),
            date: Some("2020".to_string()),
            doi: None,
            creators: vec![Creator::new("Jane", "Smith")],
        },
        LibraryItem {
            id: "b".to_string(),
            title: Some("Gadgets in Practice".to_string()),
            date: Some("2019".to_string()),
            doi: Some("10.5555/gadgets".to_string()),
            creators: vec![Creator::new("Alex", "Doe")],
        },
    ]
}

fn references() -> Vec<ParsedReference> {
    vec![
        ParsedReference {
            index: 1,
            text: "Smith, J. (2020). A Study of Widgets.".to_string(),
            doi: None,
            authors: Some("Smith, J.".to_string()),
            title: Some("A Study of Widgets".to_string()),
            year: Some("2020".to_string()),
        },
        ParsedReference {
            index: 2,
            text: "Doe, A. (2019). Gadgets in practice.".to_string(),
            doi: Some("10.5555/GADGETS".to_string()),
            authors: Some("Doe, A.".to_string()),
            title: Some("Gadgets in practice".to_string()),
            year: Some("2019".to_string()),
        },
    ]
}

#[test]
fn parallel_analyses_share_one_session() {
    let session = AnalysisSession::new();
    let items = Arc::new(library());
    let refs = Arc::new(references());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let session = session.clone();
            let items = Arc::clone(&items);
            let refs = Arc::clone(&refs);
            thread::spawn(move || {
                let guard = session.begin(&format!("item-{i}")).unwrap();
                let matches = match_references(&refs, &items, &MatchConfig::default());
                guard.finish();
                matches
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Matching is pure: every thread sees the same ranking
    for matches in &results {
        assert_eq!(matches, &results[0]);
        assert_eq!(matches[&1][0].item_id, "a");
        assert_eq!(matches[&2][0].item_id, "b");
    }
    assert_eq!(session.in_progress_count(), 0);
    assert_eq!(session.stats().count, 8);
    assert!(session.estimate().is_some());

    session.clear();
    assert_eq!(session.stats().count, 0);
}

#[test]
fn same_item_cannot_run_twice_across_threads() {
    let session = AnalysisSession::new();
    let guard = session.begin("shared").unwrap();

    let other = session.clone();
    let rejected = thread::spawn(move || other.begin("shared").is_err())
        .join()
        .unwrap();
    assert!(rejected);
    assert!(session.is_in_progress("shared"));

    drop(guard);
    assert!(!session.is_in_progress("shared"));
    assert!(session.begin("shared").is_ok());
}
