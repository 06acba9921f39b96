use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::library::MatchConfig;
use crate::matching::SimilarityWeights;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub matching: Option<MatchingConfig>,
    pub extraction: Option<ExtractionConfig>,
    pub llm: Option<LlmFileConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub min_similarity: Option<f64>,
    pub in_library_threshold: Option<f64>,
    pub weights: Option<WeightsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightsConfig {
    pub doi: Option<f64>,
    pub year: Option<f64>,
    pub title: Option<f64>,
    pub first_author: Option<f64>,
    pub authors: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub incomplete_threshold: Option<usize>,
    pub tail_fraction: Option<f64>,
    pub cutoff_fraction: Option<f64>,
    pub min_segments: Option<usize>,
    pub extra_headers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmFileConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub max_input_chars: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Resolve the matching section against [`MatchConfig::default`].
    pub fn match_config(&self) -> MatchConfig {
        let defaults = MatchConfig::default();
        let Some(m) = self.matching.as_ref() else {
            return defaults;
        };
        let w = m.weights.clone().unwrap_or_default();
        let dw = SimilarityWeights::default();
        MatchConfig {
            min_similarity: m.min_similarity.unwrap_or(defaults.min_similarity),
            in_library_threshold: m
                .in_library_threshold
                .unwrap_or(defaults.in_library_threshold),
            weights: SimilarityWeights {
                doi: w.doi.unwrap_or(dw.doi),
                year: w.year.unwrap_or(dw.year),
                title: w.title.unwrap_or(dw.title),
                first_author: w.first_author.unwrap_or(dw.first_author),
                authors: w.authors.unwrap_or(dw.authors),
            },
        }
    }
}

/// Platform config directory path: `<config_dir>/refshelf/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("refshelf").join("config.toml"))
}

/// Load config by cascading CWD `.refshelf.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".refshelf.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        matching: merge_section(base.matching, overlay.matching, |b, o| MatchingConfig {
            min_similarity: o.min_similarity.or(b.min_similarity),
            in_library_threshold: o.in_library_threshold.or(b.in_library_threshold),
            weights: merge_section(b.weights, o.weights, |b, o| WeightsConfig {
                doi: o.doi.or(b.doi),
                year: o.year.or(b.year),
                title: o.title.or(b.title),
                first_author: o.first_author.or(b.first_author),
                authors: o.authors.or(b.authors),
            }),
        }),
        extraction: merge_section(base.extraction, overlay.extraction, |b, o| {
            ExtractionConfig {
                incomplete_threshold: o.incomplete_threshold.or(b.incomplete_threshold),
                tail_fraction: o.tail_fraction.or(b.tail_fraction),
                cutoff_fraction: o.cutoff_fraction.or(b.cutoff_fraction),
                min_segments: o.min_segments.or(b.min_segments),
                extra_headers: o.extra_headers.or(b.extra_headers),
            }
        }),
        llm: merge_section(base.llm, overlay.llm, |b, o| LlmFileConfig {
            endpoint: o.endpoint.or(b.endpoint),
            model: o.model.or(b.model),
            api_key: o.api_key.or(b.api_key),
            max_input_chars: o.max_input_chars.or(b.max_input_chars),
            timeout_secs: o.timeout_secs.or(b.timeout_secs),
        }),
    }
}

fn merge_section<T>(base: Option<T>, overlay: Option<T>, f: impl FnOnce(T, T) -> T) -> Option<T> {
    match (base, overlay) {
        (None, None) => None,
        (Some(b), None) => Some(b),
        (None, Some(o)) => Some(o),
        (Some(b), Some(o)) => Some(f(b, o)),
    }
}
