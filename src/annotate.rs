//! Text annotation: attach per-section page text to a reconciled tree.
//!
//! Both variants recurse through all children and touch nothing but the
//! `text` field. A range outside the supplied document is a contract
//! violation by the range resolver and fails loudly.

use crate::document::Document;
use crate::error::{ReconcileError, Result};
use crate::tree::SectionNode;

/// Attach to every node the concatenated text of its page range.
pub fn attach_text(nodes: &mut [SectionNode], document: &Document) -> Result<()> {
    attach_with(nodes, document, |page| page.text.clone())
}

/// Attach page text wrapped in `<physical_index_N>` marker pairs, so
/// downstream consumers can recover page numbers from the concatenation.
pub fn attach_text_with_labels(nodes: &mut [SectionNode], document: &Document) -> Result<()> {
    attach_with(nodes, document, |page| page.with_index_tags())
}

fn attach_with(
    nodes: &mut [SectionNode],
    document: &Document,
    render: impl Fn(&crate::document::Page) -> String + Copy,
) -> Result<()> {
    for node in nodes {
        if node.start_index < 1
            || node.end_index > document.page_count()
            || node.start_index > node.end_index
        {
            return Err(ReconcileError::PageOutOfBounds {
                title: node.title.clone(),
                start_index: node.start_index,
                end_index: node.end_index,
                page_count: document.page_count(),
            });
        }

        let mut text = String::new();
        for number in node.start_index..=node.end_index {
            // Bounds were checked above; get_page cannot miss here.
            if let Some(page) = document.get_page(number) {
                text.push_str(&render(page));
            }
        }
        node.text = Some(text);

        attach_with(&mut node.nodes, document, render)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    fn sample_document() -> Document {
        Document::from_pages(
            "Test",
            vec!["alpha".into(), "beta".into(), "gamma".into(), "delta".into()],
        )
    }

    fn sample_tree() -> Vec<SectionNode> {
        let mut root = SectionNode::new("Chapter 1", 1, 4).with_structure("1");
        root.nodes
            .push(SectionNode::new("Section 1.1", 2, 3).with_structure("1.1"));
        vec![root]
    }

    #[test]
    fn test_attach_text_concatenates_range() {
        let mut nodes = sample_tree();
        attach_text(&mut nodes, &sample_document()).unwrap();

        assert_eq!(nodes[0].text.as_deref(), Some("alphabetagammadelta"));
        assert_eq!(nodes[0].nodes[0].text.as_deref(), Some("betagamma"));
    }

    #[test]
    fn test_attach_text_with_labels_marks_every_page() {
        let mut nodes = sample_tree();
        attach_text_with_labels(&mut nodes, &sample_document()).unwrap();

        let text = nodes[0].nodes[0].text.as_deref().unwrap();
        assert!(text.contains("<physical_index_2>"));
        assert!(text.contains("<physical_index_3>"));
        assert!(!text.contains("<physical_index_1>"));
    }

    #[test]
    fn test_structural_fields_untouched() {
        let mut nodes = sample_tree();
        let before = tree::flatten(&nodes)
            .iter()
            .map(|n| (n.title.clone(), n.start_index, n.end_index))
            .collect::<Vec<_>>();

        attach_text(&mut nodes, &sample_document()).unwrap();

        let after = tree::flatten(&nodes)
            .iter()
            .map(|n| (n.title.clone(), n.start_index, n.end_index))
            .collect::<Vec<_>>();
        assert_eq!(before, after);
        assert_eq!(nodes[0].nodes.len(), 1);
    }

    #[test]
    fn test_out_of_bounds_range_fails() {
        let mut nodes = vec![SectionNode::new("Too far", 3, 9)];
        let err = attach_text(&mut nodes, &sample_document()).unwrap_err();
        assert!(matches!(err, ReconcileError::PageOutOfBounds { .. }));
        // Never silently truncated.
        assert!(nodes[0].text.is_none());
    }

    #[test]
    fn test_out_of_bounds_in_child_fails() {
        let mut root = SectionNode::new("Root", 1, 2);
        root.nodes.push(SectionNode::new("Bad child", 0, 2));
        let err = attach_text(&mut [root], &sample_document()).unwrap_err();
        assert!(matches!(err, ReconcileError::PageOutOfBounds { .. }));
    }
}
