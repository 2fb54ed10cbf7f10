//! Batch summary generation over a reconciled tree.
//!
//! One LLM request per node, fanned out concurrently but bounded by a
//! semaphore, with a per-request timeout and retry with exponential
//! backoff. The batch joins on all requests (all-or-wait) and surfaces
//! partial failure in a [`SummaryReport`] instead of failing outright.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::SummarizeConfig;
use crate::error::{ReconcileError, Result};
use crate::llm::{LlmClient, Prompts};
use crate::tree::SectionNode;

/// Scheduling options for a summary batch.
#[derive(Debug, Clone)]
pub struct SummarizeOptions {
    /// Maximum simultaneous outstanding requests.
    pub max_concurrency: usize,
    /// Timeout applied to each attempt independently.
    pub request_timeout: Duration,
    /// Retries per node after the first attempt.
    pub max_retries: usize,
    /// Initial backoff between retries; doubles each retry.
    pub retry_backoff: Duration,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self::from(&SummarizeConfig::default())
    }
}

impl From<&SummarizeConfig> for SummarizeOptions {
    fn from(config: &SummarizeConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// A node whose summary could not be generated.
#[derive(Debug)]
pub struct FailedSummary {
    /// Pre-order position of the node within the batch.
    pub position: usize,
    /// Section title.
    pub title: String,
    /// What went wrong on the final attempt.
    pub error: String,
}

/// Outcome of a summary batch.
#[derive(Debug, Default)]
pub struct SummaryReport {
    /// Number of nodes that received a summary.
    pub succeeded: usize,
    /// Nodes left without a summary.
    pub failed: Vec<FailedSummary>,
}

impl SummaryReport {
    /// Whether every node in the batch received a summary.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Generates summaries for every node of a reconciled tree.
pub struct Summarizer {
    client: LlmClient,
    options: SummarizeOptions,
}

impl Summarizer {
    /// Create a summarizer with default scheduling options.
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            options: SummarizeOptions::default(),
        }
    }

    /// Create with explicit scheduling options.
    pub fn with_options(client: LlmClient, options: SummarizeOptions) -> Self {
        Self { client, options }
    }

    /// Generate and attach a summary for every node with attached text.
    ///
    /// Nodes without text, and nodes whose request ultimately failed, are
    /// reported in the returned [`SummaryReport`] and keep their previous
    /// `summary` value. Structural fields are never touched.
    pub async fn summarize(&self, nodes: &mut [SectionNode]) -> Result<SummaryReport> {
        let texts = collect_texts(nodes);

        let mut report = SummaryReport::default();
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency));
        let mut tasks: JoinSet<(usize, std::result::Result<String, String>)> = JoinSet::new();
        let mut titles: HashMap<usize, String> = HashMap::new();

        for (position, title, text) in texts {
            let Some(text) = text else {
                report.failed.push(FailedSummary {
                    position,
                    title,
                    error: "no text attached".to_string(),
                });
                continue;
            };
            titles.insert(position, title);

            let client = self.client.clone();
            let options = self.options.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("summary semaphore closed");
                let result = request_summary(&client, &options, &text).await;
                (position, result.map_err(|e| e.to_string()))
            });
        }

        let mut summaries: HashMap<usize, String> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (position, result) =
                joined.map_err(|e| ReconcileError::LlmApi(format!("summary task panicked: {e}")))?;
            match result {
                Ok(summary) => {
                    summaries.insert(position, summary);
                    report.succeeded += 1;
                }
                Err(error) => report.failed.push(FailedSummary {
                    position,
                    title: titles.get(&position).cloned().unwrap_or_default(),
                    error,
                }),
            }
        }

        let mut position = 0;
        apply_summaries(nodes, &summaries, &mut position);
        report.failed.sort_by_key(|f| f.position);
        Ok(report)
    }

    /// One-sentence description of the whole document from its structure.
    pub async fn describe_document(&self, nodes: &[SectionNode]) -> Result<String> {
        let mut structure = nodes.to_vec();
        crate::tree::strip_text(&mut structure);

        let prompt = Prompts::doc_description()
            .replace("{structure}", &serde_json::to_string(&structure)?);

        self.client
            .complete(Some(Prompts::system_document_analyzer()), &prompt)
            .await
    }
}

/// One summary request with timeout and retry-with-backoff.
async fn request_summary(
    client: &LlmClient,
    options: &SummarizeOptions,
    text: &str,
) -> Result<String> {
    let prompt = Prompts::node_summary().replace("{text}", text);
    let mut backoff = options.retry_backoff;
    let mut last_error = None;

    for attempt in 0..=options.max_retries {
        if attempt > 0 {
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }

        let request = client.complete(Some(Prompts::system_document_analyzer()), &prompt);
        match tokio::time::timeout(options.request_timeout, request).await {
            Ok(Ok(summary)) => return Ok(summary),
            Ok(Err(e)) => last_error = Some(e),
            Err(_) => {
                last_error = Some(ReconcileError::LlmApi(format!(
                    "request timed out after {:?}",
                    options.request_timeout
                )))
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ReconcileError::LlmApi("no attempts made".to_string())))
}

/// Pre-order (position, title, text) triples for every node.
fn collect_texts(nodes: &[SectionNode]) -> Vec<(usize, String, Option<String>)> {
    fn walk(
        nodes: &[SectionNode],
        position: &mut usize,
        out: &mut Vec<(usize, String, Option<String>)>,
    ) {
        for node in nodes {
            out.push((*position, node.title.clone(), node.text.clone()));
            *position += 1;
            walk(&node.nodes, position, out);
        }
    }

    let mut out = Vec::new();
    let mut position = 0;
    walk(nodes, &mut position, &mut out);
    out
}

/// Write summaries back by pre-order position.
fn apply_summaries(
    nodes: &mut [SectionNode],
    summaries: &HashMap<usize, String>,
    position: &mut usize,
) {
    for node in nodes {
        if let Some(summary) = summaries.get(position) {
            node.summary = Some(summary.clone());
        }
        *position += 1;
        apply_summaries(&mut node.nodes, summaries, position);
    }
}
