//! Outline Reconciler CLI
//!
//! Reconciles a noisy, flat document outline into a validated section tree.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use outline_reconciler::{
    annotate::{attach_text, attach_text_with_labels},
    config::Config,
    document::Document,
    llm::LlmClient,
    outline::RawEntry,
    persistence::{index_exists, load_index, save_index, DocumentIndex},
    summarize::{SummarizeOptions, Summarizer},
    tree::{assign_node_ids, reconcile, strip_text, strip_working_fields},
};
use std::path::PathBuf;
use std::time::Instant;

/// Outline Reconciler - validated section trees from noisy LLM outlines
#[derive(Parser)]
#[command(name = "outline-reconciler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a raw outline into a section tree index
    Reconcile {
        /// Path to the raw outline (JSON array of outline entries)
        outline: PathBuf,

        /// Path to the page texts (JSON array of strings, element i = page i+1)
        #[arg(short, long)]
        pages: Option<PathBuf>,

        /// Total page count (required when --pages is not given)
        #[arg(short, long)]
        total_pages: Option<usize>,

        /// Wrap attached text in physical-index page markers
        #[arg(long)]
        labels: bool,

        /// Emit a structure-only index (drop attached text before saving)
        #[arg(long)]
        strip_text: bool,

        /// Output path for the index file
        #[arg(short, long, default_value = "data/index.json")]
        output: PathBuf,
    },

    /// Display the section tree of an index
    Show {
        /// Path to the index file
        #[arg(default_value = "data/index.json")]
        index: PathBuf,

        /// Output as JSON instead of a formatted tree
        #[arg(long)]
        json: bool,
    },

    /// Show information about an index
    Info {
        /// Path to the index file
        #[arg(default_value = "data/index.json")]
        index: PathBuf,
    },

    /// Generate per-section summaries via the configured LLM
    Summarize {
        /// Path to the index file
        index: PathBuf,

        /// Path to the page texts (needed when the index carries no text)
        #[arg(short, long)]
        pages: Option<PathBuf>,

        /// Output path (defaults to rewriting the index in place)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Test LLM connection
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Reconcile {
            outline,
            pages,
            total_pages,
            labels,
            strip_text,
            output,
        } => cmd_reconcile(outline, pages, total_pages, labels, strip_text, output),
        Commands::Show { index, json } => cmd_show(index, json),
        Commands::Info { index } => cmd_info(index),
        Commands::Summarize {
            index,
            pages,
            output,
        } => cmd_summarize(index, pages, output).await,
        Commands::Test => cmd_test().await,
    }
}

fn cmd_reconcile(
    outline_path: PathBuf,
    pages_path: Option<PathBuf>,
    total_pages: Option<usize>,
    labels: bool,
    strip: bool,
    output: PathBuf,
) -> Result<()> {
    let raw = std::fs::read_to_string(&outline_path)
        .with_context(|| format!("Failed to read outline at '{}'", outline_path.display()))?;
    let entries: Vec<RawEntry> =
        serde_json::from_str(&raw).context("Outline file is not a JSON array of entries")?;

    println!("Reconciling {} outline entries...", entries.len());

    let document = pages_path
        .map(|p| Document::from_pages_file(&p).context("Failed to load page texts"))
        .transpose()?;

    let total_pages = match (&document, total_pages) {
        (Some(doc), _) => doc.page_count(),
        (None, Some(n)) => n,
        (None, None) => anyhow::bail!("Either --pages or --total-pages is required"),
    };

    let start = Instant::now();

    let mut outcome = reconcile(&entries, total_pages).context("Reconciliation failed")?;
    assign_node_ids(outcome.nodes_mut(), 0);

    if let Some(document) = &document {
        if labels {
            attach_text_with_labels(outcome.nodes_mut(), document)
                .context("Failed to attach page text")?;
        } else {
            attach_text(outcome.nodes_mut(), document).context("Failed to attach page text")?;
        }
    }

    strip_working_fields(outcome.nodes_mut());
    if strip {
        strip_text(outcome.nodes_mut());
    }

    if !outcome.is_structured() {
        println!("No usable hierarchy found; emitting the flat outline as-is.");
    }

    let name = outline_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();
    let index = DocumentIndex::from_outcome(name, total_pages, outcome);

    println!("\nIndex built in {:.2?}:", start.elapsed());
    println!("  Sections:   {}", index.node_count());
    println!("  Max depth:  {}", index.max_depth());

    save_index(&index, &output).context("Failed to save index")?;
    println!("\nIndex saved to: {}", output.display());

    Ok(())
}

fn cmd_show(index_path: PathBuf, json: bool) -> Result<()> {
    if !index_exists(&index_path) {
        anyhow::bail!(
            "Index not found at '{}'. Run 'reconcile' first.",
            index_path.display()
        );
    }

    let index = load_index(&index_path).context("Failed to load index")?;

    if json {
        println!("{}", index.to_json().context("Failed to serialize index")?);
    } else {
        println!("{}", index.format());
    }

    Ok(())
}

fn cmd_info(index_path: PathBuf) -> Result<()> {
    if !index_exists(&index_path) {
        anyhow::bail!(
            "Index not found at '{}'. Run 'reconcile' first.",
            index_path.display()
        );
    }

    let index = load_index(&index_path).context("Failed to load index")?;

    println!("Index Information");
    println!("{}", "─".repeat(40));
    println!("  Document:     {}", index.name);
    println!("  Total pages:  {}", index.total_pages);
    println!("  Sections:     {}", index.node_count());
    println!("  Max depth:    {}", index.max_depth());
    println!(
        "  Structured:   {}",
        if index.structured { "yes" } else { "no (flat)" }
    );

    if let Some(desc) = &index.description {
        println!("  Description:  {}", desc);
    }

    Ok(())
}

async fn cmd_summarize(
    index_path: PathBuf,
    pages_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let mut index = load_index(&index_path).context("Failed to load index")?;

    if let Some(pages_path) = pages_path {
        let document = Document::from_pages_file(&pages_path).context("Failed to load pages")?;
        attach_text(&mut index.nodes, &document).context("Failed to attach page text")?;
    }

    let client = LlmClient::new(config.llm);
    let summarizer =
        Summarizer::with_options(client, SummarizeOptions::from(&config.summarize));

    println!("Generating summaries for {} sections...", index.node_count());
    let start = Instant::now();

    let report = summarizer
        .summarize(&mut index.nodes)
        .await
        .context("Summary batch failed")?;

    println!(
        "Summaries: {} succeeded, {} failed ({:.2?})",
        report.succeeded,
        report.failed.len(),
        start.elapsed()
    );
    for failure in &report.failed {
        println!("  failed: '{}' ({})", failure.title, failure.error);
    }

    if index.description.is_none() {
        match summarizer.describe_document(&index.nodes).await {
            Ok(description) => index.description = Some(description),
            Err(e) => println!("Document description skipped: {}", e),
        }
    }

    let output = output.unwrap_or(index_path);
    save_index(&index, &output).context("Failed to save index")?;
    println!("Index saved to: {}", output.display());

    Ok(())
}

async fn cmd_test() -> Result<()> {
    println!("Testing LLM connection...\n");

    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration:");
    println!("  API Base:  {}", config.llm.api_base);
    println!("  Model:     {}", config.llm.model);
    println!(
        "  API Key:   {}...",
        &config.llm.api_key[..config.llm.api_key.len().min(8)]
    );
    println!();

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Ok(());
    }

    let client = LlmClient::new(config.llm);

    println!("Sending test request...");
    match client.test_connection().await {
        Ok(()) => println!("Connection successful!"),
        Err(e) => println!("Connection failed: {}", e),
    }

    Ok(())
}
