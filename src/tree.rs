//! Section tree: the reconciled, nested table-of-contents structure.
//!
//! This module holds the core of the reconciliation engine: building the
//! nested tree from a flat dot-numbered outline, assigning stable node IDs,
//! the read-only traversal helpers shared by later stages, and the
//! post-processing passes that strip transient working fields.

use std::collections::HashMap;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::outline::{self, RawEntry};
use crate::resolve::{resolve_ranges, ResolvedEntry};

/// A node in the reconciled section tree.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct SectionNode {
    /// Hierarchical structure code (e.g., "1", "1.2.3").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,

    /// Section title.
    pub title: String,

    /// Starting page (1-indexed, inclusive).
    pub start_index: usize,

    /// Ending page (1-indexed, inclusive).
    pub end_index: usize,

    /// Working field: the normalized page tag this node was built from.
    /// Cleared by [`strip_working_fields`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_index: Option<usize>,

    /// Working field: printed page number carried over from a detected
    /// table-of-contents page. Cleared by [`strip_working_fields`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,

    /// Child sections, in document order. Empty means leaf; an empty list
    /// is never serialized, so leafness is representable by absence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<SectionNode>,

    /// Stable zero-padded identifier assigned by [`assign_node_ids`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,

    /// Extracted section text, attached by the annotator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// LLM-generated section summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl SectionNode {
    /// Create a new node with a resolved page range and no children.
    pub fn new(title: impl Into<String>, start_index: usize, end_index: usize) -> Self {
        Self {
            structure: None,
            title: title.into(),
            start_index,
            end_index,
            physical_index: None,
            page_number: None,
            nodes: Vec::new(),
            node_id: None,
            text: None,
            summary: None,
        }
    }

    /// Set the structure code.
    pub fn with_structure(mut self, structure: impl Into<String>) -> Self {
        self.structure = Some(structure.into());
        self
    }

    /// A node is a leaf iff it has no children.
    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of pages covered by this node.
    pub fn page_span(&self) -> usize {
        if self.end_index >= self.start_index {
            self.end_index - self.start_index + 1
        } else {
            0
        }
    }

    /// Recursively count all nodes in this subtree (including self).
    pub fn node_count(&self) -> usize {
        1 + self.nodes.iter().map(|n| n.node_count()).sum::<usize>()
    }

    /// Copy of this node with children removed, for flat listings.
    fn detached(&self) -> SectionNode {
        let mut copy = self.clone();
        copy.nodes = Vec::new();
        copy
    }

    /// Format the subtree as an indented listing.
    pub fn format_tree(&self, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        let structure_str = self
            .structure
            .as_ref()
            .map(|s| format!("{} ", s))
            .unwrap_or_default();

        let mut result = format!(
            "{}{}{} [pages {}-{}]\n",
            prefix, structure_str, self.title, self.start_index, self.end_index
        );

        for child in &self.nodes {
            result.push_str(&child.format_tree(indent + 1));
        }

        result
    }
}

impl From<ResolvedEntry> for SectionNode {
    fn from(entry: ResolvedEntry) -> Self {
        SectionNode {
            physical_index: Some(entry.start_index),
            structure: entry.structure,
            ..SectionNode::new(entry.title, entry.start_index, entry.end_index)
        }
    }
}

/// Result of reconciliation: a structured forest, or the flat input
/// sequence when no usable hierarchy was found.
///
/// Callers must check which variant they received; the flat variant is the
/// engine's graceful-degradation path, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub enum ReconcileOutcome {
    /// Nested section tree(s), roots in document order.
    Forest(Vec<SectionNode>),
    /// Degraded output: the resolved entries in document order, ungrouped.
    Flat(Vec<SectionNode>),
}

impl ReconcileOutcome {
    /// Whether the outcome carries a nested hierarchy.
    pub fn is_structured(&self) -> bool {
        matches!(self, ReconcileOutcome::Forest(_))
    }

    /// The root-level nodes, regardless of variant.
    pub fn nodes(&self) -> &[SectionNode] {
        match self {
            ReconcileOutcome::Forest(nodes) | ReconcileOutcome::Flat(nodes) => nodes,
        }
    }

    /// Mutable access to the root-level nodes.
    pub fn nodes_mut(&mut self) -> &mut Vec<SectionNode> {
        match self {
            ReconcileOutcome::Forest(nodes) | ReconcileOutcome::Flat(nodes) => nodes,
        }
    }
}

/// Parent structure code: the code with its last dot component removed.
///
/// A single-component code has no parent.
fn parent_code(structure: &str) -> Option<&str> {
    structure.rsplit_once('.').map(|(parent, _)| parent)
}

/// Build a nested forest from flat, range-resolved entries.
///
/// Each entry whose parent code was already seen becomes a child of that
/// parent; everything else (single-component codes, codeless entries, and
/// orphans whose nominal parent never appeared) is promoted to a root.
/// Document order is preserved as sibling order at every level.
pub fn build_forest(entries: Vec<ResolvedEntry>) -> Vec<SectionNode> {
    let mut arena: Vec<Option<SectionNode>> = Vec::with_capacity(entries.len());
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    let mut by_code: HashMap<String, usize> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();

    for (i, entry) in entries.into_iter().enumerate() {
        let code = entry.structure.clone();
        arena.push(Some(SectionNode::from(entry)));

        let parent = code
            .as_deref()
            .and_then(parent_code)
            .and_then(|p| by_code.get(p).copied());

        match parent {
            Some(parent_idx) => children_of[parent_idx].push(i),
            None => roots.push(i),
        }

        if let Some(code) = code {
            by_code.insert(code, i);
        }
    }

    fn assemble(
        idx: usize,
        arena: &mut [Option<SectionNode>],
        children_of: &[Vec<usize>],
    ) -> SectionNode {
        let mut node = arena[idx].take().expect("node assembled twice");
        for &child in &children_of[idx] {
            node.nodes.push(assemble(child, arena, children_of));
        }
        node
    }

    roots
        .into_iter()
        .map(|idx| assemble(idx, &mut arena, &children_of))
        .collect()
}

/// Reconcile a raw outline into a section tree.
///
/// Chains normalization, range resolution (including preface synthesis),
/// and tree building. When no entry carries a structure code there is no
/// hierarchy to reconcile, and the flat resolved sequence is returned
/// instead of a forest.
pub fn reconcile(entries: &[RawEntry], total_pages: usize) -> Result<ReconcileOutcome> {
    let normalized = outline::normalize(entries);
    let resolved = resolve_ranges(&normalized, total_pages)?;

    if resolved.iter().all(|e| e.structure.is_none()) {
        let mut flat: Vec<SectionNode> = resolved.into_iter().map(SectionNode::from).collect();
        strip_working_fields(&mut flat);
        return Ok(ReconcileOutcome::Flat(flat));
    }

    Ok(ReconcileOutcome::Forest(build_forest(resolved)))
}

/// Assign 4-digit zero-padded pre-order IDs starting at `start`.
///
/// Returns the next free counter value, so repeated invocations over
/// disjoint subtrees compose without collisions.
pub fn assign_node_ids(nodes: &mut [SectionNode], start: usize) -> usize {
    let mut counter = start;
    for node in nodes {
        node.node_id = Some(format!("{:04}", counter));
        counter += 1;
        counter = assign_node_ids(&mut node.nodes, counter);
    }
    counter
}

/// Pre-order sequence of all nodes, each copied with its children removed.
pub fn flatten(nodes: &[SectionNode]) -> Vec<SectionNode> {
    let mut out = Vec::new();
    for node in nodes {
        out.push(node.detached());
        out.extend(flatten(&node.nodes));
    }
    out
}

/// Pre-order sequence of all leaf nodes (nodes without children).
pub fn leaf_nodes(nodes: &[SectionNode]) -> Vec<&SectionNode> {
    let mut out = Vec::new();
    for node in nodes {
        if node.is_leaf() {
            out.push(node);
        } else {
            out.extend(leaf_nodes(&node.nodes));
        }
    }
    out
}

/// Depth-first search for a node by its assigned ID.
pub fn find_node<'a>(nodes: &'a [SectionNode], node_id: &str) -> Option<&'a SectionNode> {
    for node in nodes {
        if node.node_id.as_deref() == Some(node_id) {
            return Some(node);
        }
        if let Some(found) = find_node(&node.nodes, node_id) {
            return Some(found);
        }
    }
    None
}

/// Leaf test by node ID.
///
/// `None` means the ID does not exist in the tree, which is distinct from
/// `Some(false)` (found, but has children).
pub fn is_leaf_node(nodes: &[SectionNode], node_id: &str) -> Option<bool> {
    find_node(nodes, node_id).map(SectionNode::is_leaf)
}

/// Clear transient working fields on every node.
///
/// Idempotent; page ranges, structure, and children are untouched.
pub fn strip_working_fields(nodes: &mut [SectionNode]) {
    for node in nodes {
        node.physical_index = None;
        node.page_number = None;
        strip_working_fields(&mut node.nodes);
    }
}

/// Remove attached text from every node, for structure-only output.
///
/// Idempotent; independent of [`strip_working_fields`].
pub fn strip_text(nodes: &mut [SectionNode]) {
    for node in nodes {
        node.text = None;
        strip_text(&mut node.nodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(structure: Option<&str>, title: &str, page: usize, appear_start: &str) -> RawEntry {
        RawEntry {
            structure: structure.map(String::from),
            title: title.to_string(),
            physical_index: Some(serde_json::json!(page)),
            appear_start: Some(appear_start.to_string()),
        }
    }

    fn sample_forest() -> Vec<SectionNode> {
        let entries = vec![
            raw(Some("1"), "Intro", 1, "yes"),
            raw(Some("1.1"), "Motivation", 2, "yes"),
            raw(Some("1.2"), "Scope", 4, "no"),
            raw(Some("2"), "Methods", 6, "yes"),
            raw(Some("2.1"), "Setup", 6, "no"),
        ];
        match reconcile(&entries, 12).unwrap() {
            ReconcileOutcome::Forest(nodes) => nodes,
            ReconcileOutcome::Flat(_) => panic!("expected a forest"),
        }
    }

    #[test]
    fn test_parent_code() {
        assert_eq!(parent_code("1.2.3"), Some("1.2"));
        assert_eq!(parent_code("1.2"), Some("1"));
        assert_eq!(parent_code("1"), None);
    }

    #[test]
    fn test_nesting_and_sibling_order() {
        let forest = sample_forest();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].title, "Intro");
        assert_eq!(forest[0].nodes.len(), 2);
        assert_eq!(forest[0].nodes[0].title, "Motivation");
        assert_eq!(forest[0].nodes[1].title, "Scope");
        assert_eq!(forest[1].nodes[0].title, "Setup");
    }

    #[test]
    fn test_scenario_lookahead_ranges() {
        // Root "1" ends one page before its child because the child's
        // heading starts exactly on page 4.
        let entries = vec![
            raw(Some("1"), "Intro", 3, "no"),
            raw(Some("1.1"), "Background", 4, "yes"),
        ];
        let outcome = reconcile(&entries, 10).unwrap();
        let nodes = outcome.nodes();

        // Pages 1-2 are covered by a synthesized preface root.
        assert_eq!(nodes[0].title, "Preface");
        assert_eq!(nodes[0].structure.as_deref(), Some("0"));
        assert_eq!((nodes[0].start_index, nodes[0].end_index), (1, 2));

        let root = &nodes[1];
        assert_eq!((root.start_index, root.end_index), (3, 3));
        assert_eq!((root.nodes[0].start_index, root.nodes[0].end_index), (4, 10));
    }

    #[test]
    fn test_orphan_promoted_to_root() {
        // "2.1" appears before any "2": it becomes a top-level section
        // rather than being dropped.
        let entries = vec![
            raw(Some("1"), "One", 1, "yes"),
            raw(Some("2.1"), "Orphan", 5, "yes"),
        ];
        let outcome = reconcile(&entries, 8).unwrap();
        assert!(outcome.is_structured());
        let nodes = outcome.nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].title, "Orphan");
        assert!(nodes[1].is_leaf());
    }

    #[test]
    fn test_degraded_flat_output_without_structure() {
        let entries = vec![
            raw(None, "Alpha", 1, "yes"),
            raw(None, "Beta", 4, "no"),
        ];
        let outcome = reconcile(&entries, 9).unwrap();
        assert!(!outcome.is_structured());

        let nodes = outcome.nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].title, "Alpha");
        assert!(nodes.iter().all(|n| n.is_leaf()));
        // Working fields do not survive into the degraded output.
        assert!(nodes.iter().all(|n| n.physical_index.is_none()));
        // Ranges are still resolved on the flat output.
        assert_eq!((nodes[1].start_index, nodes[1].end_index), (4, 9));
    }

    #[test]
    fn test_flatten_preserves_document_order() {
        let forest = sample_forest();
        let flat = flatten(&forest);
        let titles: Vec<&str> = flat.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Intro", "Motivation", "Scope", "Methods", "Setup"]
        );
        assert!(flat.iter().all(|n| n.nodes.is_empty()));
    }

    #[test]
    fn test_node_ids_preorder_and_composable() {
        let mut forest = sample_forest();
        let next = assign_node_ids(&mut forest, 0);
        assert_eq!(next, 5);

        let ids: Vec<String> = flatten(&forest)
            .iter()
            .map(|n| n.node_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["0000", "0001", "0002", "0003", "0004"]);

        // A disjoint subtree numbered from the returned counter does not
        // collide with the first.
        let mut extra = vec![SectionNode::new("Appendix", 13, 14)];
        let next = assign_node_ids(&mut extra, next);
        assert_eq!(extra[0].node_id.as_deref(), Some("0005"));
        assert_eq!(next, 6);
    }

    #[test]
    fn test_leaves_agree_with_leaf_test() {
        let mut forest = sample_forest();
        assign_node_ids(&mut forest, 0);

        let leaf_ids: Vec<String> = leaf_nodes(&forest)
            .iter()
            .map(|n| n.node_id.clone().unwrap())
            .collect();

        for node in flatten(&forest) {
            let id = node.node_id.unwrap();
            let is_leaf = is_leaf_node(&forest, &id).unwrap();
            assert_eq!(is_leaf, leaf_ids.contains(&id));
        }
    }

    #[test]
    fn test_leaf_test_distinguishes_not_found() {
        let mut forest = sample_forest();
        assign_node_ids(&mut forest, 0);

        assert_eq!(is_leaf_node(&forest, "0000"), Some(false));
        assert_eq!(is_leaf_node(&forest, "0001"), Some(true));
        assert_eq!(is_leaf_node(&forest, "9999"), None);
    }

    #[test]
    fn test_strip_working_fields_idempotent() {
        let mut forest = sample_forest();
        assert!(forest[0].physical_index.is_some());

        strip_working_fields(&mut forest);
        let once = serde_json::to_string(&forest).unwrap();
        strip_working_fields(&mut forest);
        let twice = serde_json::to_string(&forest).unwrap();

        assert_eq!(once, twice);
        assert!(flatten(&forest).iter().all(|n| n.physical_index.is_none()));
    }

    #[test]
    fn test_strip_text() {
        let mut forest = sample_forest();
        forest[0].text = Some("body".to_string());
        forest[0].nodes[0].text = Some("body".to_string());

        strip_text(&mut forest);
        assert!(flatten(&forest).iter().all(|n| n.text.is_none()));
    }

    #[test]
    fn test_leaf_serialized_without_children_key() {
        let node = SectionNode::new("Leaf", 1, 2);
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("\"nodes\""));
    }

    #[test]
    fn test_resolved_ranges_are_ordered() {
        for node in flatten(&sample_forest()) {
            assert!(node.start_index <= node.end_index);
        }
    }
}
