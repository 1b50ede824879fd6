//! Filtering and paging for `list_tiles`.

use serde::{Deserialize, Serialize};

use tessera_core::constants::MAX_PAGE_SIZE;
use tessera_core::tile::{KnowledgeTile, MarkKind};

/// Page size when the caller asks for zero.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Optional predicates; all given ones must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileFilter {
    /// Every listed tag must be present.
    pub tags: Vec<String>,
    pub min_mark: Option<MarkKind>,
    pub min_certainty: Option<f64>,
    /// Case-insensitive substring of the topic.
    pub topic_contains: Option<String>,
    pub contributor_id: Option<String>,
}

impl TileFilter {
    pub fn matches(&self, tile: &KnowledgeTile) -> bool {
        if !self.tags.iter().all(|t| tile.tags.contains(t)) {
            return false;
        }
        if self
            .min_mark
            .is_some_and(|min| tile.verification.kind < min)
        {
            return false;
        }
        if self
            .min_certainty
            .is_some_and(|min| tile.coordinates.certainty < min)
        {
            return false;
        }
        if let Some(needle) = &self.topic_contains {
            if !tile.topic.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(contributor) = &self.contributor_id {
            if tile.contributor_id.as_deref() != Some(contributor.as_str()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: usize,
    /// Clamped to `1..=MAX_PAGE_SIZE`; zero means the default size.
    pub limit: usize,
}

impl PageRequest {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    pub fn first(limit: usize) -> Self {
        Self::new(0, limit)
    }

    pub fn effective_limit(&self) -> usize {
        match self.limit {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching items across all pages.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl<T> Page<T> {
    /// Slice one page out of the full, ordered match list.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len();
        let limit = request.effective_limit();
        let items = all.into_iter().skip(request.offset).take(limit).collect();
        Self {
            items,
            total,
            offset: request.offset,
            limit,
        }
    }

    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.items.len()) < self.total
    }

    pub fn next_page(&self) -> Option<PageRequest> {
        self.has_more()
            .then(|| PageRequest::new(self.offset + self.items.len(), self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::TileBuilder;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(PageRequest::first(0).effective_limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageRequest::first(10_000).effective_limit(), MAX_PAGE_SIZE);
        assert_eq!(PageRequest::first(7).effective_limit(), 7);
    }

    #[test]
    fn pages_walk_to_the_end() {
        let page = Page::from_sorted((0..12).collect::<Vec<_>>(), PageRequest::first(5));
        assert_eq!(page.items, vec![0, 1, 2, 3, 4]);
        assert_eq!(page.total, 12);
        let next = page.next_page().unwrap();
        let page = Page::from_sorted((0..12).collect::<Vec<_>>(), next);
        assert_eq!(page.items, vec![5, 6, 7, 8, 9]);
        let last = Page::from_sorted((0..12).collect::<Vec<_>>(), page.next_page().unwrap());
        assert_eq!(last.items, vec![10, 11]);
        assert!(!last.has_more());
        assert!(last.next_page().is_none());
    }

    #[test]
    fn offset_past_end_is_empty() {
        let page = Page::from_sorted(vec![1, 2, 3], PageRequest::new(10, 5));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn filter_combines_predicates() {
        let tile = TileBuilder::new("t")
            .topic("Beta Blockers")
            .tags(&["cardio", "drug"])
            .coordinates(60.0, 100.0, 50.0)
            .verified_by("dr-a", true)
            .build();

        assert!(TileFilter::default().matches(&tile));
        assert!(TileFilter {
            tags: vec!["cardio".into()],
            min_mark: Some(MarkKind::Expert),
            min_certainty: Some(55.0),
            topic_contains: Some("blocker".into()),
            contributor_id: None,
        }
        .matches(&tile));
        assert!(!TileFilter {
            tags: vec!["oncology".into()],
            ..TileFilter::default()
        }
        .matches(&tile));
        assert!(!TileFilter {
            min_mark: Some(MarkKind::MultiExpert),
            ..TileFilter::default()
        }
        .matches(&tile));
        assert!(!TileFilter {
            min_certainty: Some(90.0),
            ..TileFilter::default()
        }
        .matches(&tile));
    }
}
