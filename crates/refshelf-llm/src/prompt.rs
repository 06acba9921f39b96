use refshelf_core::truncate_chars;

pub(crate) const SYSTEM_PROMPT: &str =
    "You are a research assistant that reads academic papers and answers precisely.";

/// Prompt asking for a short structured summary of the paper.
pub(crate) fn summary_prompt(paper_text: &str, max_chars: usize) -> String {
    format!(
        "Summarize the following paper in at most 200 words. Cover the research \
         question, the method and the main findings.\n\n---\n{}",
        truncate_chars(paper_text, max_chars)
    )
}

/// Prompt asking for the bibliography as a JSON array in a fenced block.
pub(crate) fn references_prompt(paper_text: &str, max_chars: usize) -> String {
    format!(
        "List every entry of the bibliography of the following paper. Reply with a \
         single ```json fenced block holding an array of objects with the keys \
         \"index\" (number as cited), \"text\" (the full reference), \"authors\", \
         \"title\", \"year\" and \"doi\". Use null for anything that is missing.\n\n---\n{}",
        truncate_chars(paper_text, max_chars)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_truncate_paper_text() {
        let paper = "x".repeat(50);
        let prompt = summary_prompt(&paper, 10);
        assert!(prompt.ends_with(&"x".repeat(10)));
        assert!(!prompt.contains(&"x".repeat(11)));

        let prompt = references_prompt(&paper, 20);
        assert!(prompt.ends_with(&"x".repeat(20)));
        assert!(!prompt.contains(&"x".repeat(21)));
    }

    #[test]
    fn test_references_prompt_names_fields() {
        let prompt = references_prompt("paper", 100);
        for key in ["index", "text", "authors", "title", "year", "doi"] {
            assert!(prompt.contains(&format!("\"{key}\"")));
        }
    }
}
