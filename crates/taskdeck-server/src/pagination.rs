//! Fixed-size page envelope for list endpoints.
//!
//! Wire shape is `{count, next, previous, results}` where `next` and
//! `previous` are page numbers or null. Page size defaults to 10 and is
//! client-overridable up to 100.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(count: u64, page: u32, page_size: u32, results: Vec<T>) -> Self {
        let last_page = count
            .div_ceil(u64::from(page_size.max(1)))
            .max(1);
        let next = if u64::from(page) < last_page {
            Some(page + 1)
        } else {
            None
        };
        // A request past the end still points back at a real page.
        let last_page = u32::try_from(last_page).unwrap_or(u32::MAX);
        let previous = if count > 0 && page > 1 {
            Some((page - 1).min(last_page))
        } else {
            None
        };
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Resolve the requested page size against the default and the cap.
#[must_use]
pub fn clamp_page_size(requested: Option<u32>) -> u32 {
    requested.map_or(DEFAULT_PAGE_SIZE, |n| n.clamp(1, MAX_PAGE_SIZE))
}

/// Resolve the requested 1-based page number.
#[must_use]
pub fn page_number(requested: Option<u32>) -> u32 {
    requested.map_or(1, |n| n.max(1))
}

/// Row offset for a page.
#[must_use]
pub const fn offset(page: u32, page_size: u32) -> u32 {
    (page - 1).saturating_mul(page_size)
}
