use once_cell::sync::Lazy;
use refshelf_core::ParsedReference;
use refshelf_parsing::{ParsingConfig, ReferenceExtractor};
use regex::Regex;
use serde::Deserialize;

use crate::LlmError;

/// One record as the model writes it. Indices and years come back as numbers
/// or strings, authors as a list or a single string.
#[derive(Debug, Deserialize)]
struct RawReference {
    #[serde(default)]
    index: Option<Index>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    authors: Option<Authors>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<Year>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Index {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Year {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Authors {
    List(Vec<String>),
    Text(String),
}

impl Index {
    /// `"[3]"`, `"3."` and `" 3 "` all read as 3. Anything else is `None`.
    fn value(&self) -> Option<usize> {
        match self {
            Index::Number(n) => usize::try_from(*n).ok(),
            Index::Text(s) => s
                .trim()
                .trim_matches(['[', ']', '(', ')', '.'])
                .trim()
                .parse()
                .ok(),
        }
    }
}

impl Year {
    fn into_string(self) -> String {
        match self {
            Year::Number(n) => n.to_string(),
            Year::Text(s) => s.trim().to_string(),
        }
    }
}

impl Authors {
    fn into_string(self) -> String {
        match self {
            Authors::List(names) => names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Authors::Text(s) => s,
        }
    }
}

/// Find the JSON array in a model response: the first fenced code block if
/// there is one, else the outermost `[...]`.
fn find_block(response: &str) -> Option<&str> {
    static FENCE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap());

    if let Some(caps) = FENCE_RE.captures(response) {
        return caps.get(1).map(|m| m.as_str().trim());
    }
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    (end > start).then(|| &response[start..=end])
}

/// Parse the reference list from a model response.
///
/// Records go through [`ReferenceExtractor::validate_record`] with default
/// settings, so they obey the same length and year rules as heuristic
/// extraction. See [`parse_reference_block_with_config`].
pub fn parse_reference_block(response: &str) -> Result<Vec<ParsedReference>, LlmError> {
    parse_reference_block_with_config(response, &ParsingConfig::default())
}

/// Config-aware version of [`parse_reference_block`].
///
/// Records without a `text`, outside the length bounds, or without a year
/// token in either `year` or `text` are skipped. A missing, zero or
/// unparseable `index` becomes the record's position in the array plus one.
pub fn parse_reference_block_with_config(
    response: &str,
    config: &ParsingConfig,
) -> Result<Vec<ParsedReference>, LlmError> {
    let block = find_block(response)
        .ok_or_else(|| LlmError::MalformedBlock("no JSON array in response".to_string()))?;
    let raw: Vec<RawReference> =
        serde_json::from_str(block).map_err(|e| LlmError::MalformedBlock(e.to_string()))?;

    let validator = ReferenceExtractor::with_config(config.clone());
    let total = raw.len();
    let mut references = Vec::new();
    let mut rejected = 0;
    for (pos, r) in raw.into_iter().enumerate() {
        let Some(text) = r.text else {
            rejected += 1;
            continue;
        };
        let record = ParsedReference {
            index: r
                .index
                .as_ref()
                .and_then(Index::value)
                .filter(|&i| i > 0)
                .unwrap_or(pos + 1),
            text,
            doi: r.doi,
            authors: r.authors.map(Authors::into_string),
            title: r.title,
            year: r.year.map(Year::into_string),
        };
        match validator.validate_record(record) {
            Ok(reference) => references.push(reference),
            Err(reason) => {
                tracing::trace!(pos, ?reason, "dropped LLM record");
                rejected += 1;
            }
        }
    }

    tracing::debug!(
        total,
        accepted = references.len(),
        rejected,
        "parsed LLM reference block"
    );

    if references.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(references)
}
