use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use refshelf_core::config_file::{self, ConfigFile};
use refshelf_core::{AnalysisSession, LibraryItem, MatchConfig, match_references};
use refshelf_llm::{LlmClient, LlmConfig};
use refshelf_parsing::{ExtractionResult, ParsingConfigBuilder, ReferenceExtractor};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod backend;
mod output;

use backend::FilePageBackend;
use output::ColorMode;

/// Extract bibliographies from paper text and match them against a library
#[derive(Parser, Debug)]
#[command(name = "refshelf", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the default cascade
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print JSON instead of a human-readable report
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract references from page text (.json array of pages, or text with form-feed page breaks)
    Extract {
        file_path: PathBuf,

        /// Ask the LLM for the reference list when the heuristic result looks incomplete
        #[arg(long)]
        llm_fallback: bool,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Extract references and match them against a library (JSON array of items)
    Match {
        file_path: PathBuf,

        /// Path to the library JSON file
        #[arg(short, long)]
        library: PathBuf,

        /// Minimum similarity for a candidate match (default 0.5)
        #[arg(long)]
        min_similarity: Option<f64>,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Summarize a paper with the configured LLM
    Summarize {
        file_path: PathBuf,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct MatchReport<'a> {
    references: &'a [refshelf_core::ParsedReference],
    matches: &'a std::collections::BTreeMap<usize, Vec<refshelf_core::MatchResult>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_config = match &cli.config {
        Some(path) => config_file::load_from_path(path)
            .with_context(|| format!("Could not load config file {}", path.display()))?,
        None => config_file::load_config(),
    };

    let session = AnalysisSession::new();
    let outcome = match cli.command {
        Command::Extract {
            file_path,
            llm_fallback,
            out,
        } => extract(&session, &file_config, &file_path, llm_fallback, &out).await,
        Command::Match {
            file_path,
            library,
            min_similarity,
            out,
        } => match_library(
            &session,
            &file_config,
            &file_path,
            &library,
            min_similarity,
            &out,
        ),
        Command::Summarize { file_path, output } => {
            summarize(&file_config, &file_path, output).await
        }
    };
    session.clear();
    outcome
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_writer(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Could not create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_extractor(file_config: &ConfigFile) -> anyhow::Result<ReferenceExtractor> {
    let mut builder = ParsingConfigBuilder::new();
    if let Some(extraction) = &file_config.extraction {
        builder = builder.apply_file_config(extraction);
    }
    let config = builder
        .build()
        .context("Invalid extraction settings in config file")?;
    Ok(ReferenceExtractor::with_config(config))
}

/// Resolve LLM settings: env vars > config file > defaults.
fn llm_config(file_config: &ConfigFile) -> LlmConfig {
    let mut config = LlmConfig::from_file(file_config.llm.as_ref());
    if let Ok(key) = std::env::var("REFSHELF_LLM_API_KEY")
        && !key.is_empty()
    {
        config.api_key = Some(key);
    }
    if let Ok(endpoint) = std::env::var("REFSHELF_LLM_ENDPOINT")
        && !endpoint.is_empty()
    {
        config.endpoint = endpoint;
    }
    config
}

fn read_pages(file_path: &Path) -> anyhow::Result<Vec<String>> {
    use refshelf_core::PageTextBackend;

    FilePageBackend
        .page_texts(file_path)
        .with_context(|| format!("Could not read page text from {}", file_path.display()))
}

/// Read and extract one document, tracked as an analysis in `session`.
fn analyse(
    session: &AnalysisSession,
    extractor: &ReferenceExtractor,
    file_path: &Path,
) -> anyhow::Result<(Vec<String>, ExtractionResult)> {
    let guard = session.begin(&file_path.display().to_string())?;
    let pages = read_pages(file_path)?;
    let result = extractor.extract_from_pages(&pages);
    guard.finish();
    Ok((pages, result))
}

async fn extract(
    session: &AnalysisSession,
    file_config: &ConfigFile,
    file_path: &Path,
    llm_fallback: bool,
    out: &OutputArgs,
) -> anyhow::Result<()> {
    let extractor = build_extractor(file_config)?;
    let (pages, mut result) = analyse(session, &extractor, file_path)?;
    let threshold = extractor.config().incomplete_threshold();

    if llm_fallback && result.is_incomplete(threshold) {
        substitute_llm_references(file_config, &extractor, &pages, &mut result).await;
    }

    let mut writer = open_writer(out.output.as_deref())?;
    if out.json {
        serde_json::to_writer_pretty(&mut writer, &result.references)?;
        writeln!(writer)?;
        return Ok(());
    }

    let color = ColorMode(!out.no_color && out.output.is_none());
    output::print_extraction_summary(&mut writer, &display_name(file_path), &result, color)?;
    if result.is_incomplete(threshold) {
        output::print_incomplete_warning(&mut writer, result.references.len(), threshold, color)?;
    }
    output::print_references(&mut writer, &result.references, color)?;
    Ok(())
}

/// Replace the heuristic references with the LLM's list, but only when the
/// LLM returned a well-formed, longer list.
async fn substitute_llm_references(
    file_config: &ConfigFile,
    extractor: &ReferenceExtractor,
    pages: &[String],
    result: &mut ExtractionResult,
) {
    let client = match LlmClient::new(llm_config(file_config)) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "could not create LLM client");
            return;
        }
    };

    match client
        .extract_references_with_config(&pages.join("\n"), extractor.config())
        .await
    {
        Ok(references) if references.len() > result.references.len() => {
            tracing::info!(
                heuristic = result.references.len(),
                llm = references.len(),
                "using LLM reference list"
            );
            result.references = references;
        }
        Ok(references) => {
            tracing::info!(llm = references.len(), "LLM list not longer, keeping heuristic result");
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM reference extraction failed, keeping heuristic result");
        }
    }
}

fn match_library(
    session: &AnalysisSession,
    file_config: &ConfigFile,
    file_path: &Path,
    library_path: &Path,
    min_similarity: Option<f64>,
    out: &OutputArgs,
) -> anyhow::Result<()> {
    let extractor = build_extractor(file_config)?;
    let (_, result) = analyse(session, &extractor, file_path)?;

    let library_json = std::fs::read_to_string(library_path)
        .with_context(|| format!("Could not read library {}", library_path.display()))?;
    let items: Vec<LibraryItem> = serde_json::from_str(&library_json)
        .with_context(|| format!("Invalid library JSON in {}", library_path.display()))?;

    let mut match_config: MatchConfig = file_config.match_config();
    if let Some(min) = min_similarity {
        if !(0.0..=1.0).contains(&min) {
            anyhow::bail!("--min-similarity must be between 0 and 1, got {}", min);
        }
        match_config.min_similarity = min;
    }

    let matches = match_references(&result.references, &items, &match_config);

    let mut writer = open_writer(out.output.as_deref())?;
    if out.json {
        let report = MatchReport {
            references: &result.references,
            matches: &matches,
        };
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writeln!(writer)?;
        return Ok(());
    }

    let color = ColorMode(!out.no_color && out.output.is_none());
    output::print_extraction_summary(&mut writer, &display_name(file_path), &result, color)?;
    output::print_matches(&mut writer, &result.references, &matches, &match_config, color)?;
    Ok(())
}

async fn summarize(
    file_config: &ConfigFile,
    file_path: &Path,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = llm_config(file_config);
    if config.api_key.is_none() {
        anyhow::bail!(
            "No LLM API key configured. Set REFSHELF_LLM_API_KEY or add api_key to the [llm] table of your config file."
        );
    }

    let pages = read_pages(file_path)?;
    let client = LlmClient::new(config)?;
    let summary = client.summarize(&pages.join("\n")).await?;

    let mut writer = open_writer(output.as_deref())?;
    writeln!(writer, "{}", summary)?;
    Ok(())
}
