//! Page-number pagination.
//!
//! Pages are 1-indexed. Page `n` covers records `[(n-1)*P, n*P)` of the
//! underlying ordered listing. A listing with no records still has one
//! (empty) page, and asking for a page past the end yields an empty page
//! rather than an error.

use serde::Serialize;

/// Default number of records per page.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Parse a raw `?page=` value.
///
/// Missing, non-numeric and non-positive values all mean page 1.
#[must_use]
pub fn parse_page_number(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|&number| number >= 1)
        .unwrap_or(1)
}

/// Splits a listing into fixed-size pages.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u64,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

impl Paginator {
    /// Create a paginator. A zero page size is treated as one.
    #[must_use]
    pub fn new(per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    /// Records per page.
    #[must_use]
    pub const fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Offset of the first record of page `number`.
    #[must_use]
    pub const fn offset(&self, number: u64) -> u64 {
        number.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Number of pages for `total` records. Never less than one.
    #[must_use]
    pub const fn num_pages(&self, total: u64) -> u64 {
        if total == 0 {
            1
        } else {
            total.div_ceil(self.per_page)
        }
    }

    /// Wrap one page worth of records.
    #[must_use]
    pub fn page<T>(&self, items: Vec<T>, number: u64, total: u64) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(total),
            total,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Records on this page, in listing order.
    pub items: Vec<T>,
    /// 1-indexed page number as requested.
    pub number: u64,
    /// Total number of pages.
    pub num_pages: u64,
    /// Total number of records in the listing.
    pub total: u64,
}

impl<T> Page<T> {
    /// Whether a page precedes this one.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Whether a page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// Number of the previous page, if any.
    #[must_use]
    pub const fn previous_page_number(&self) -> Option<u64> {
        if self.has_previous() {
            Some(self.number - 1)
        } else {
            None
        }
    }

    /// Number of the next page, if any.
    #[must_use]
    pub const fn next_page_number(&self) -> Option<u64> {
        if self.has_next() {
            Some(self.number + 1)
        } else {
            None
        }
    }

    /// Number of records on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the records, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}
