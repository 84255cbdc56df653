//! Windowing over the already-filtered, fully resident collection.
//!
//! There is no paged fetch behind this: the window grows by prefix
//! (`(current_page + 1) * page_size` items), which is how an infinite list
//! reveals more rows. Paged remote fetches live in `RemoteTodos::fetch_page`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub is_loading_more: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            current_page: 0,
            page_size: page_size.max(1),
            total_items: 0,
            has_next_page: false,
            has_previous_page: false,
            is_loading_more: false,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    /// Recompute the derived flags for a filtered set of `total_items`.
    pub fn recompute(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.has_next_page = self.current_page + 1 < self.total_pages();
        self.has_previous_page = self.current_page > 0;
    }

    /// Change the page size and go back to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.current_page = 0;
        self.recompute(self.total_items);
    }

    pub fn set_current_page(&mut self, page: usize) {
        self.current_page = page;
        self.recompute(self.total_items);
    }

    pub fn next_page(&mut self) -> bool {
        if !self.has_next_page {
            return false;
        }
        self.set_current_page(self.current_page + 1);
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if !self.has_previous_page {
            return false;
        }
        self.set_current_page(self.current_page - 1);
        true
    }

    /// Number of items from the front of the filtered list that are visible.
    pub fn visible_len(&self) -> usize {
        (self.current_page + 1)
            .saturating_mul(self.page_size)
            .min(self.total_items)
    }

    /// The visible prefix of `items`.
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = (self.current_page + 1).saturating_mul(self.page_size).min(items.len());
        &items[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_total() {
        let mut p = Pagination::default();
        p.recompute(45);
        assert_eq!(p.total_pages(), 3);
        assert!(p.has_next_page);
        assert!(!p.has_previous_page);
        assert_eq!(p.visible_len(), 20);

        assert!(p.next_page());
        assert!(p.next_page());
        assert!(!p.next_page());
        assert_eq!(p.current_page, 2);
        assert!(p.has_previous_page);
        assert_eq!(p.visible_len(), 45);
    }

    #[test]
    fn previous_page_is_guarded() {
        let mut p = Pagination::default();
        p.recompute(5);
        assert!(!p.previous_page());
        assert_eq!(p.current_page, 0);
    }

    #[test]
    fn exact_multiple_has_no_extra_page() {
        let mut p = Pagination::with_page_size(10);
        p.recompute(20);
        p.next_page();
        assert!(!p.has_next_page);
    }

    #[test]
    fn page_size_change_resets_to_first_page() {
        let mut p = Pagination::with_page_size(2);
        p.recompute(10);
        p.set_current_page(3);
        p.set_page_size(4);
        assert_eq!(p.current_page, 0);
        assert_eq!(p.total_pages(), 3);
    }

    #[test]
    fn window_is_a_growing_prefix() {
        let items: Vec<u32> = (0..7).collect();
        let mut p = Pagination::with_page_size(3);
        p.recompute(items.len());
        assert_eq!(p.window(&items), &[0, 1, 2]);
        p.next_page();
        assert_eq!(p.window(&items), &[0, 1, 2, 3, 4, 5]);
        p.next_page();
        assert_eq!(p.window(&items), &items[..]);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let p = Pagination::with_page_size(0);
        assert_eq!(p.page_size, 1);
    }
}
