use std::collections::BTreeMap;
use std::io::Write;

use owo_colors::OwoColorize;
use refshelf_core::{MatchConfig, MatchResult, ParsedReference, is_in_library};
use refshelf_parsing::{ExtractionResult, LocatorStrategy};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn located_by(result: &ExtractionResult) -> &'static str {
    match result.section.found_by() {
        Some(LocatorStrategy::Header) => "section header",
        Some(LocatorStrategy::NumberedOpener) => "numbered opener",
        Some(LocatorStrategy::AuthorYearDensity) => "author-year run",
        None => "tail of document",
    }
}

/// Print the extraction summary after page-text parsing.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    doc_name: &str,
    result: &ExtractionResult,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Extracting references from {}...", doc_name)?;
    writeln!(
        w,
        "Found {} references (located by {})",
        result.references.len(),
        located_by(result)
    )?;

    let stats = &result.skip_stats;
    let skipped = stats.too_short + stats.too_long + stats.no_year;
    if skipped > 0 {
        let msg = format!(
            "(Skipped {} of {} segments: {} too short, {} too long, {} without a year)",
            skipped, stats.total_raw, stats.too_short, stats.too_long, stats.no_year
        );
        if color.enabled() {
            writeln!(w, "{}", msg.dimmed())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Warn that the list is probably truncated.
pub fn print_incomplete_warning(
    w: &mut dyn Write,
    count: usize,
    threshold: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let msg = format!(
        "Only {} references found (fewer than {}); the bibliography may be incomplete.",
        count, threshold
    );
    if color.enabled() {
        writeln!(w, "{} {}", "WARNING:".yellow(), msg)?;
    } else {
        writeln!(w, "WARNING: {}", msg)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print one block per reference with its extracted fields.
pub fn print_references(
    w: &mut dyn Write,
    references: &[ParsedReference],
    color: ColorMode,
) -> std::io::Result<()> {
    for r in references {
        let header = format!("[{}]", r.index);
        if color.enabled() {
            writeln!(w, "{} {}", header.bold().cyan(), r.text)?;
        } else {
            writeln!(w, "{} {}", header, r.text)?;
        }
        print_field(w, "Title", r.title.as_deref(), color)?;
        print_field(w, "Authors", r.authors.as_deref(), color)?;
        print_field(w, "Year", r.year.as_deref(), color)?;
        print_field(w, "DOI", r.doi.as_deref(), color)?;
        writeln!(w)?;
    }
    Ok(())
}

fn print_field(
    w: &mut dyn Write,
    label: &str,
    value: Option<&str>,
    color: ColorMode,
) -> std::io::Result<()> {
    match (value, color.enabled()) {
        (Some(v), _) => writeln!(w, "    {:<8} {}", format!("{label}:"), v),
        (None, true) => writeln!(w, "    {:<8} {}", format!("{label}:"), "-".dimmed()),
        (None, false) => writeln!(w, "    {:<8} -", format!("{label}:")),
    }
}

/// Print library matches per reference, marking references already in the
/// library.
pub fn print_matches(
    w: &mut dyn Write,
    references: &[ParsedReference],
    matches: &BTreeMap<usize, Vec<MatchResult>>,
    config: &MatchConfig,
    color: ColorMode,
) -> std::io::Result<()> {
    let mut in_library = 0;
    for r in references {
        let found = matches.get(&r.index).map(Vec::as_slice).unwrap_or(&[]);
        let label = r.title.as_deref().unwrap_or(&r.text);
        let short: String = if label.chars().count() > 70 {
            format!("{}...", label.chars().take(70).collect::<String>())
        } else {
            label.to_string()
        };

        let owned = is_in_library(found, config);
        if owned {
            in_library += 1;
        }
        match (owned, found.is_empty(), color.enabled()) {
            (true, _, true) => writeln!(w, "[{}] {} {}", r.index, "IN LIBRARY".green(), short)?,
            (true, _, false) => writeln!(w, "[{}] IN LIBRARY {}", r.index, short)?,
            (false, false, true) => {
                writeln!(w, "[{}] {} {}", r.index, "CANDIDATES".yellow(), short)?
            }
            (false, false, false) => writeln!(w, "[{}] CANDIDATES {}", r.index, short)?,
            (false, true, true) => writeln!(w, "[{}] {} {}", r.index, "NEW".dimmed(), short)?,
            (false, true, false) => writeln!(w, "[{}] NEW {}", r.index, short)?,
        }

        for m in found {
            let title = m.item.title.as_deref().unwrap_or("(untitled)");
            writeln!(
                w,
                "    {:>5.1}%  {}  {}",
                m.similarity * 100.0,
                m.item_id,
                title
            )?;
        }
    }

    writeln!(w)?;
    let summary = format!(
        "{} of {} references already in library, {} with candidate matches",
        in_library,
        references.len(),
        matches.len()
    );
    if color.enabled() {
        writeln!(w, "{}", summary.bold())?;
    } else {
        writeln!(w, "{}", summary)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use refshelf_core::LibraryItem;
    use refshelf_parsing::{SectionStart, SkipStats};

    fn reference(index: usize, title: &str) -> ParsedReference {
        ParsedReference {
            index,
            text: format!("Someone, A. (2020). {title}."),
            doi: None,
            authors: Some("Someone, A.".to_string()),
            title: Some(title.to_string()),
            year: Some("2020".to_string()),
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) -> String {
        let mut buf: Vec<u8> = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_summary_reports_skips() {
        let result = ExtractionResult {
            references: vec![reference(1, "Widgets")],
            section: SectionStart::TailCutoff,
            strategy: None,
            skip_stats: SkipStats {
                total_raw: 3,
                too_short: 1,
                too_long: 0,
                no_year: 1,
            },
        };
        let out = render(|w| print_extraction_summary(w, "paper.txt", &result, ColorMode(false)));
        assert!(out.contains("Found 1 references (located by tail of document)"));
        assert!(out.contains("Skipped 2 of 3 segments"));
    }

    #[test]
    fn test_references_show_missing_fields() {
        let r = reference(4, "Gadgets");
        let out = render(|w| print_references(w, &[r], ColorMode(false)));
        assert!(out.starts_with("[4] Someone"));
        assert!(out.contains("Title:   Gadgets"));
        assert!(out.contains("DOI:     -"));
    }

    #[test]
    fn test_matches_mark_in_library() {
        let refs = vec![reference(1, "Widgets"), reference(2, "Gadgets")];
        let item = LibraryItem {
            id: "item-1".to_string(),
            title: Some("Widgets".to_string()),
            ..Default::default()
        };
        let mut matches = BTreeMap::new();
        matches.insert(
            1,
            vec![MatchResult {
                item_id: "item-1".to_string(),
                similarity: 0.9,
                item,
            }],
        );
        let out = render(|w| {
            print_matches(w, &refs, &matches, &MatchConfig::default(), ColorMode(false))
        });
        assert!(out.contains("[1] IN LIBRARY Widgets"));
        assert!(out.contains("90.0%  item-1"));
        assert!(out.contains("[2] NEW Gadgets"));
        assert!(out.contains("1 of 2 references already in library"));
    }
}
