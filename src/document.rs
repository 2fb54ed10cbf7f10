//! Page-indexed document representation.
//!
//! The page-extraction collaborator hands the engine an ordered array of
//! page texts, where element *i* holds the text of page *i+1*. Some
//! extraction modes also attach a pre-computed token count per page; the
//! engine carries it along but never uses it.

use crate::error::{ReconcileError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single page of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed page number.
    pub number: usize,
    /// Text content of the page.
    pub text: String,
    /// Token count supplied by the extraction collaborator, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,
}

impl Page {
    /// Create a new page.
    pub fn new(number: usize, text: String) -> Self {
        Self {
            number,
            text,
            token_count: None,
        }
    }

    /// Page content wrapped in physical-index marker tags, so page numbers
    /// can be recovered from concatenated text.
    pub fn with_index_tags(&self) -> String {
        format!(
            "<physical_index_{}>\n{}\n<physical_index_{}>\n",
            self.number, self.text, self.number
        )
    }
}

/// A document as an ordered collection of pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document name/title.
    pub name: String,
    /// Original file path (if loaded from a file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Pages in reading order.
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a document from pre-extracted page texts.
    ///
    /// Element *i* of `page_texts` becomes page *i+1*.
    pub fn from_pages(name: impl Into<String>, page_texts: Vec<String>) -> Self {
        let pages = page_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page::new(i + 1, text))
            .collect();
        Self {
            name: name.into(),
            path: None,
            pages,
        }
    }

    /// Load a JSON file containing an array of page-text strings.
    pub fn from_pages_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReconcileError::io(path, e))?;
        let page_texts: Vec<String> = serde_json::from_str(&content)?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        let mut doc = Self::from_pages(name, page_texts);
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Total number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a specific page by number (1-indexed).
    pub fn get_page(&self, number: usize) -> Option<&Page> {
        if number == 0 || number > self.pages.len() {
            None
        } else {
            Some(&self.pages[number - 1])
        }
    }
}
