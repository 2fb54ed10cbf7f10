//! Outline Reconciler - turns noisy LLM-extracted outlines into validated
//! section trees.
//!
//! An outline-extraction collaborator proposes a flat list of section
//! headings with approximate page locations (dotted structure codes, raw
//! page tags, boundary-appearance hints). This library reconciles that
//! list into a nested table-of-contents tree with exact page ranges,
//! stable node identifiers, and optional per-section text and summaries.
//!
//! # Quick Start
//!
//! ```no_run
//! use outline_reconciler::{
//!     annotate::attach_text,
//!     document::Document,
//!     outline::RawEntry,
//!     persistence::{save_index, DocumentIndex},
//!     tree::{assign_node_ids, reconcile, strip_working_fields},
//! };
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let raw = std::fs::read_to_string("outline.json")?;
//!     let entries: Vec<RawEntry> = serde_json::from_str(&raw)?;
//!
//!     let pages = Document::from_pages_file(Path::new("pages.json"))?;
//!
//!     let mut outcome = reconcile(&entries, pages.page_count())?;
//!     assign_node_ids(outcome.nodes_mut(), 0);
//!     attach_text(outcome.nodes_mut(), &pages)?;
//!     strip_working_fields(outcome.nodes_mut());
//!
//!     let index = DocumentIndex::from_outcome("report", pages.page_count(), outcome);
//!     save_index(&index, Path::new("index.json"))?;
//!     Ok(())
//! }
//! ```
//!
//! # Pipeline
//!
//! raw outline → normalization (`outline`) → range resolution (`resolve`)
//! → tree building + ID assignment (`tree`) → annotation (`annotate`) →
//! optional summaries (`summarize`) → export (`persistence`).
//!
//! Callers must check the [`tree::ReconcileOutcome`] variant: when the
//! proposed outline carries no usable hierarchy, reconciliation degrades
//! to the flat input sequence instead of a forest.

pub mod annotate;
pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod outline;
pub mod persistence;
pub mod resolve;
pub mod summarize;
pub mod tree;

// Re-export commonly used types
pub use config::Config;
pub use document::Document;
pub use error::{ReconcileError, Result};
pub use llm::LlmClient;
pub use outline::RawEntry;
pub use persistence::{load_index, save_index, DocumentIndex};
pub use summarize::{Summarizer, SummaryReport};
pub use tree::{reconcile, ReconcileOutcome, SectionNode};
