//! Range resolution: derive exact page ranges for a flat outline.
//!
//! A single left-to-right pass turns each entry's approximate page tag into
//! a `[start_index, end_index]` span by looking at where the next entry
//! begins. When the next entry's heading visibly starts on its own page,
//! the current section ends one page earlier; otherwise the boundary page
//! is shared by both sections.

use crate::error::{ReconcileError, Result};
use crate::outline::OutlineEntry;

/// An outline entry with its page range resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub structure: Option<String>,
    pub title: String,
    /// 1-based, inclusive.
    pub start_index: usize,
    /// 1-based, inclusive. Always >= `start_index`.
    pub end_index: usize,
}

/// Resolve start/end pages for every entry in document order.
///
/// Fails with [`ReconcileError::MissingPageIndex`] if any entry lacks a
/// usable page number; an unknown page is never coerced to a default.
/// If the first entry starts past page 1, a synthetic "Preface" entry with
/// structure code `"0"` is prepended so page coverage starts at page 1.
pub fn resolve_ranges(entries: &[OutlineEntry], total_pages: usize) -> Result<Vec<ResolvedEntry>> {
    let mut resolved = Vec::with_capacity(entries.len() + 1);

    for (i, entry) in entries.iter().enumerate() {
        let start_index =
            entry
                .physical_index
                .ok_or_else(|| ReconcileError::MissingPageIndex {
                    title: entry.title.clone(),
                })?;

        let end_index = match entries.get(i + 1) {
            Some(next) => {
                let next_start =
                    next.physical_index
                        .ok_or_else(|| ReconcileError::MissingPageIndex {
                            title: next.title.clone(),
                        })?;
                if next.appear_start {
                    next_start.saturating_sub(1)
                } else {
                    next_start
                }
            }
            None => total_pages,
        };

        // A next heading tagged on or before this one would invert the
        // span; a section always covers at least its own start page.
        let end_index = end_index.max(start_index);

        resolved.push(ResolvedEntry {
            structure: entry.structure.clone(),
            title: entry.title.clone(),
            start_index,
            end_index,
        });
    }

    if let Some(first) = resolved.first() {
        if first.start_index > 1 {
            let preface = ResolvedEntry {
                structure: Some("0".to_string()),
                title: "Preface".to_string(),
                start_index: 1,
                end_index: resolved[0].start_index - 1,
            };
            resolved.insert(0, preface);
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        structure: &str,
        title: &str,
        physical_index: usize,
        appear_start: bool,
    ) -> OutlineEntry {
        OutlineEntry {
            structure: Some(structure.to_string()),
            title: title.to_string(),
            physical_index: Some(physical_index),
            appear_start,
        }
    }

    #[test]
    fn test_lookahead_with_appear_start() {
        // Next entry's heading starts exactly on page 4, so "Intro" ends on 3.
        let entries = vec![
            entry("1", "Intro", 3, false),
            entry("1.1", "Background", 4, true),
        ];
        let resolved = resolve_ranges(&entries, 10).unwrap();

        // A preface covers pages 1-2 ahead of the first detected heading.
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].title, "Preface");
        assert_eq!(resolved[0].structure.as_deref(), Some("0"));
        assert_eq!((resolved[0].start_index, resolved[0].end_index), (1, 2));

        assert_eq!((resolved[1].start_index, resolved[1].end_index), (3, 3));
        assert_eq!((resolved[2].start_index, resolved[2].end_index), (4, 10));
    }

    #[test]
    fn test_shared_boundary_page() {
        // Without appear_start, adjacent sections overlap on the boundary page.
        let entries = vec![
            entry("1", "One", 1, false),
            entry("2", "Two", 5, false),
        ];
        let resolved = resolve_ranges(&entries, 9).unwrap();

        assert_eq!((resolved[0].start_index, resolved[0].end_index), (1, 5));
        assert_eq!((resolved[1].start_index, resolved[1].end_index), (5, 9));
    }

    #[test]
    fn test_last_entry_extends_to_final_page() {
        let entries = vec![entry("1", "Only", 1, false)];
        let resolved = resolve_ranges(&entries, 42).unwrap();
        assert_eq!(resolved[0].end_index, 42);
    }

    #[test]
    fn test_no_preface_when_first_page_is_one() {
        let entries = vec![entry("1", "One", 1, false)];
        let resolved = resolve_ranges(&entries, 5).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].title, "One");
    }

    #[test]
    fn test_missing_page_index_is_an_error() {
        let entries = vec![OutlineEntry {
            structure: Some("1".to_string()),
            title: "Unknown".to_string(),
            physical_index: None,
            appear_start: false,
        }];
        let err = resolve_ranges(&entries, 10).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReconcileError::MissingPageIndex { .. }
        ));
    }

    #[test]
    fn test_start_never_exceeds_end() {
        let entries = vec![
            entry("1", "One", 2, false),
            entry("2", "Two", 6, true),
            entry("3", "Three", 6, false),
        ];
        let resolved = resolve_ranges(&entries, 12).unwrap();
        for r in &resolved {
            assert!(r.start_index <= r.end_index, "{:?}", r);
        }
    }

    #[test]
    fn test_same_page_appear_start_clamps_span() {
        // "Two" is tagged on the same page as "One" but claims to start
        // exactly there; the naive lookahead would end "One" on page 4.
        let entries = vec![
            entry("1", "One", 5, false),
            entry("2", "Two", 5, true),
        ];
        let resolved = resolve_ranges(&entries, 10).unwrap();

        assert_eq!(resolved[0].title, "Preface");
        assert_eq!((resolved[1].start_index, resolved[1].end_index), (5, 5));
        assert_eq!((resolved[2].start_index, resolved[2].end_index), (5, 10));
        for r in &resolved {
            assert!(r.start_index <= r.end_index, "{:?}", r);
        }
    }

    #[test]
    fn test_empty_input() {
        let resolved = resolve_ranges(&[], 10).unwrap();
        assert!(resolved.is_empty());
    }
}
