//! Raw outline entries and page-tag normalization.
//!
//! The outline-extraction collaborator produces a flat list of candidate
//! section headings in document order. Page locations arrive either as
//! integers or as textual tags like `<physical_index_12>`; this module
//! normalizes them before range resolution.

use serde::{Deserialize, Serialize};

/// One candidate outline item, as proposed by the extraction collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntry {
    /// Hierarchical structure code (e.g., "1", "1.2.3"). Absent when the
    /// extractor could not place the heading in the hierarchy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,

    /// Section title.
    pub title: String,

    /// Physical page index: an integer, a bare numeral string, or a
    /// `<physical_index_N>` / `physical_index_N` token.
    #[serde(default, alias = "page")]
    pub physical_index: Option<serde_json::Value>,

    /// "yes" if the section's heading is believed to start exactly on its
    /// tagged page; anything else means the boundary page is shared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appear_start: Option<String>,
}

impl RawEntry {
    /// Normalize the `physical_index` field to an integer page number.
    ///
    /// Unparsable or missing values become `None`; they are never coerced
    /// to a page number.
    pub fn physical_page(&self) -> Option<usize> {
        match &self.physical_index {
            Some(serde_json::Value::Number(n)) => n.as_u64().map(|n| n as usize),
            Some(serde_json::Value::String(s)) => parse_page_tag(s),
            _ => None,
        }
    }

    /// Whether the following section's heading visibly begins on its own
    /// tagged page.
    pub fn starts_on_tagged_page(&self) -> bool {
        matches!(self.appear_start.as_deref(), Some("yes"))
    }
}

/// Parse a raw page-tag token into a page number.
fn parse_page_tag(s: &str) -> Option<usize> {
    let inner = s.trim().trim_start_matches('<').trim_end_matches('>');
    let digits = inner.strip_prefix("physical_index_").unwrap_or(inner);
    digits.trim().parse().ok()
}

/// A normalized outline entry: page tag resolved to an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub structure: Option<String>,
    pub title: String,
    pub physical_index: Option<usize>,
    pub appear_start: bool,
}

/// Apply the per-item normalization rule over a whole sequence.
pub fn normalize(entries: &[RawEntry]) -> Vec<OutlineEntry> {
    entries
        .iter()
        .map(|e| OutlineEntry {
            structure: e.structure.clone(),
            title: e.title.clone(),
            physical_index: e.physical_page(),
            appear_start: e.starts_on_tagged_page(),
        })
        .collect()
}
