//! Page-number pagination with lenient page resolution.
//!
//! Missing or garbage page numbers fall back to the first page and numbers
//! past the end clamp to the last page, so a listing never 404s on `?page=`.

use serde::Serialize;

/// Posts shown per listing page.
pub const POSTS_PER_PAGE: u64 = 10;

/// The raw `?page=` value of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub number: Option<String>,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(number: Option<String>) -> Self {
        Self {
            number,
            per_page: POSTS_PER_PAGE,
        }
    }

    pub fn first() -> Self {
        Self::new(None)
    }

    pub fn with_per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page.max(1);
        self
    }
}

/// A resolved page: which slice of a listing to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number.
    pub number: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub total: u64,
}

impl PageWindow {
    /// Resolve a requested page against a listing of `total` items.
    pub fn resolve(total: u64, request: &PageRequest) -> Self {
        let per_page = request.per_page.max(1);
        let num_pages = total.div_ceil(per_page).max(1);

        let number = request
            .number
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|n| if n < 1 { num_pages } else { (n as u64).min(num_pages) })
            .unwrap_or(1);

        Self {
            number,
            num_pages,
            per_page,
            total,
        }
    }

    /// 0-based page index.
    pub fn index(&self) -> u64 {
        self.number - 1
    }

    pub fn offset(&self) -> u64 {
        self.index() * self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

impl<T> Paginated<T> {
    /// Slice an already sorted, fully materialised listing.
    pub fn from_sorted(items: Vec<T>, request: &PageRequest) -> Self {
        let window = PageWindow::resolve(items.len() as u64, request);
        let items = items
            .into_iter()
            .skip(window.offset() as usize)
            .take(window.per_page as usize)
            .collect();
        Self { items, window }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            window: self.window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(raw: &str) -> PageRequest {
        PageRequest::new(Some(raw.to_string()))
    }

    #[test]
    fn test_missing_or_invalid_page_is_first() {
        assert_eq!(PageWindow::resolve(25, &PageRequest::first()).number, 1);
        assert_eq!(PageWindow::resolve(25, &page("abc")).number, 1);
    }

    #[test]
    fn test_out_of_range_page_clamps_to_last() {
        let window = PageWindow::resolve(25, &page("7"));
        assert_eq!(window.number, 3);
        assert_eq!(window.num_pages, 3);
        assert_eq!(window.offset(), 20);
        assert!(!window.has_next());
        assert!(window.has_previous());

        assert_eq!(PageWindow::resolve(25, &page("0")).number, 3);
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let window = PageWindow::resolve(0, &page("2"));
        assert_eq!(window.number, 1);
        assert_eq!(window.num_pages, 1);
        assert!(!window.has_next());
    }

    #[test]
    fn test_from_sorted_caps_page_size() {
        let items: Vec<u32> = (0..23).collect();
        let first = Paginated::from_sorted(items.clone(), &PageRequest::first());
        assert_eq!(first.items.len(), POSTS_PER_PAGE as usize);
        assert_eq!(first.items[0], 0);

        let last = Paginated::from_sorted(items, &page("3"));
        assert_eq!(last.items, vec![20, 21, 22]);
    }
}
