//! Persistence layer for reconciled indexes.
//!
//! Supports both JSON (human-readable) and bincode (compact binary)
//! formats, chosen by file extension.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ReconcileError, Result};
use crate::tree::{ReconcileOutcome, SectionNode};

/// A reconciled index ready for export.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct DocumentIndex {
    /// Document name.
    pub name: String,

    /// Total page count of the source document.
    pub total_pages: usize,

    /// False when reconciliation degraded to the flat, ungrouped sequence.
    pub structured: bool,

    /// Root-level sections in document order.
    pub nodes: Vec<SectionNode>,

    /// Optional one-sentence document description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DocumentIndex {
    /// Wrap a reconciliation outcome for export.
    pub fn from_outcome(
        name: impl Into<String>,
        total_pages: usize,
        outcome: ReconcileOutcome,
    ) -> Self {
        let structured = outcome.is_structured();
        let nodes = match outcome {
            ReconcileOutcome::Forest(nodes) | ReconcileOutcome::Flat(nodes) => nodes,
        };
        Self {
            name: name.into(),
            total_pages,
            structured,
            nodes,
            description: None,
        }
    }

    /// Total node count across the forest.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(|n| n.node_count()).sum()
    }

    /// Maximum nesting depth.
    pub fn max_depth(&self) -> usize {
        fn depth(node: &SectionNode) -> usize {
            1 + node.nodes.iter().map(depth).max().unwrap_or(0)
        }
        self.nodes.iter().map(depth).max().unwrap_or(0)
    }

    /// Format the index as an indented listing.
    pub fn format(&self) -> String {
        let mut result = format!(
            "Document: {} ({} pages, {} sections{})\n",
            self.name,
            self.total_pages,
            self.node_count(),
            if self.structured { "" } else { ", flat" }
        );
        result.push_str(&"─".repeat(50));
        result.push('\n');

        for node in &self.nodes {
            result.push_str(&node.format_tree(0));
        }

        result
    }

    /// Convert to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Save format for indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JSON format (human-readable, larger).
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl SaveFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json,
        }
    }
}

/// Save an index to a file, format chosen by extension.
pub fn save_index(index: &DocumentIndex, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| ReconcileError::io(parent, e))?;
        }
    }

    let data = match SaveFormat::from_path(path) {
        SaveFormat::Json => index.to_json()?.into_bytes(),
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            bincode::encode_to_vec(index, config)
                .map_err(|e| ReconcileError::Serialization(e.to_string()))?
        }
    };

    fs::write(path, &data).map_err(|e| ReconcileError::io(path, e))?;

    Ok(())
}

/// Load an index from a file.
pub fn load_index(path: &Path) -> Result<DocumentIndex> {
    if !path.exists() {
        return Err(ReconcileError::IndexNotFound(path.to_path_buf()));
    }

    let data = fs::read(path).map_err(|e| ReconcileError::io(path, e))?;

    let index = match SaveFormat::from_path(path) {
        SaveFormat::Json => {
            let json_str = String::from_utf8(data)
                .map_err(|e| ReconcileError::Serialization(e.to_string()))?;
            serde_json::from_str(&json_str)?
        }
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            let (index, _): (DocumentIndex, usize) = bincode::decode_from_slice(&data, config)
                .map_err(|e| ReconcileError::Serialization(e.to_string()))?;
            index
        }
    };

    Ok(index)
}

/// Check if an index file exists at the given path.
pub fn index_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_index() -> DocumentIndex {
        let mut ch1 = SectionNode::new("Chapter 1: Introduction", 1, 10).with_structure("1");
        ch1.nodes
            .push(SectionNode::new("Section 1.1", 1, 5).with_structure("1.1"));
        ch1.nodes
            .push(SectionNode::new("Section 1.2", 6, 10).with_structure("1.2"));

        let ch2 = SectionNode::new("Chapter 2: Methods", 11, 20).with_structure("2");

        DocumentIndex::from_outcome("Test Document", 20, ReconcileOutcome::Forest(vec![ch1, ch2]))
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test_index.json");

        let original = create_test_index();
        save_index(&original, &path).unwrap();

        assert!(index_exists(&path));

        let loaded = load_index(&path).unwrap();
        assert_eq!(loaded.name, original.name);
        assert_eq!(loaded.total_pages, original.total_pages);
        assert_eq!(loaded.node_count(), original.node_count());
        assert!(loaded.structured);
    }

    #[test]
    fn test_save_and_load_bincode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test_index.bin");

        let original = create_test_index();
        save_index(&original, &path).unwrap();

        let loaded = load_index(&path).unwrap();
        assert_eq!(loaded.name, original.name);
        assert_eq!(loaded.max_depth(), 2);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            SaveFormat::from_path(Path::new("test.json")),
            SaveFormat::Json
        );
        assert_eq!(
            SaveFormat::from_path(Path::new("test.bin")),
            SaveFormat::Bincode
        );
        assert_eq!(SaveFormat::from_path(Path::new("test")), SaveFormat::Json);
    }

    #[test]
    fn test_load_nonexistent() {
        let result = load_index(Path::new("/nonexistent/index.json"));
        assert!(matches!(result, Err(ReconcileError::IndexNotFound(_))));
    }

    #[test]
    fn test_flat_outcome_marked_unstructured() {
        let flat = ReconcileOutcome::Flat(vec![SectionNode::new("Only", 1, 3)]);
        let index = DocumentIndex::from_outcome("Flat Doc", 3, flat);
        assert!(!index.structured);
        assert!(index.format().contains("flat"));
    }
}
